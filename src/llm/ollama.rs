//! Ollama generate API 클라이언트
//!
//! ref: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-completion

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CompletionClient, CompletionRequest, LlmError};
use crate::config::LlmConfig;

/// Ollama 클라이언트
#[derive(Debug, Clone)]
pub struct OllamaClient {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

/// generate 요청 본문
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

/// generate 응답 (필요한 필드만)
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    /// 설정으로 생성
    ///
    /// 타임아웃은 요청마다 지정하므로 클라이언트 기본 타임아웃은 두지 않습니다.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rag-chat/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        tracing::debug!(
            "Ollama request: model={}, {} chars, temperature={}, num_predict={}",
            self.model,
            request.prompt.len(),
            request.temperature,
            request.max_tokens
        );

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(request.timeout)
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(request.timeout)
                } else {
                    LlmError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(request.timeout)
            } else {
                LlmError::Transport(e.to_string())
            }
        })?;

        if !status.is_success() {
            tracing::warn!("Ollama error ({}): {}", status, body);
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = parse_response(&body)?;
        Ok(parsed.trim().to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn parse_response(body: &str) -> Result<String, LlmError> {
    serde_json::from_str::<GenerateResponse>(body)
        .map(|r| r.response)
        .map_err(|e| LlmError::Parse(e.to_string()))
}
