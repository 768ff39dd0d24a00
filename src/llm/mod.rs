//! LLM 모듈 - 텍스트 완성 클라이언트
//!
//! 로컬 LLM 서버(Ollama generate API)에 프롬프트를 보내고 생성된 텍스트를 받습니다.
//! 실패는 예외가 아닌 [`LlmError`] 값으로 돌려주며, 호출자가 대체 응답을 결정합니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let client = OllamaClient::new(&config.llm)?;
//! let text = client.complete(&CompletionRequest::new(prompt, 0.5, 150, timeout)).await?;
//! ```

mod ollama;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use ollama::OllamaClient;

// ============================================================================
// Types
// ============================================================================

/// 완성 요청 파라미터
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    /// 최대 생성 토큰 수 (Ollama `num_predict`)
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32, max_tokens: u32, timeout: Duration) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            max_tokens,
            timeout,
        }
    }
}

/// 완성 실패 사유
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    Parse(String),
}

// ============================================================================
// CompletionClient Trait
// ============================================================================

/// 텍스트 완성 클라이언트 트레이트
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// 프롬프트 완성 (앞뒤 공백 제거된 텍스트 반환)
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// 모델 이름
    fn model(&self) -> &str;
}
