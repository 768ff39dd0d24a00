//! Chat 모듈 - 질문 응답 오케스트레이션
//!
//! - Filter: 무의미한 모델 응답 필터
//! - Synthesizer: 프롬프트 구성 + LLM 호출
//! - Assistant: 소스 모드(지식/웹)에 따라 위 구성요소를 순서대로 실행

mod assistant;
mod filter;
mod synthesizer;

use serde::Serialize;

pub use assistant::{Assistant, RetrievalReport};
pub use filter::{
    filter_knowledge_answer, filter_web_answer, KNOWLEDGE_GENERIC_PHRASES, UNKNOWN_RESPONSE,
    WEB_GENERIC_PHRASES,
};
pub use synthesizer::{knowledge_prompt, prime_prompt, web_prompt, AnswerSynthesizer};

// ============================================================================
// Types
// ============================================================================

/// 답변 소스 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    #[default]
    Knowledge,
    Web,
}

impl SourceMode {
    /// 문자열 파싱
    ///
    /// 정확히 `"web"` 일 때만 웹 모드입니다. 대소문자나 공백이 다른 값을 포함해
    /// 그 밖의 값은 모두 knowledge 로 정규화합니다.
    pub fn parse(value: &str) -> Self {
        match value {
            "web" => SourceMode::Web,
            _ => SourceMode::Knowledge,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceMode::Knowledge => "knowledge",
            SourceMode::Web => "web",
        }
    }
}

/// 구조화된 답변
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResult {
    pub answer: String,
    /// 사용한 지식 소스 라벨
    pub sources: Vec<String>,
    /// 사용한 웹 URL
    pub web_sources: Vec<String>,
    /// 0.0 ~ 1.0
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnswerResult {
    /// 근거를 찾지 못한 고정 응답
    pub fn unknown() -> Self {
        Self {
            answer: UNKNOWN_RESPONSE.to_string(),
            sources: vec![],
            web_sources: vec![],
            confidence: 0.0,
            error: None,
        }
    }
}
