//! Answer Synthesizer
//!
//! 선택된 컨텍스트와 질문으로 프롬프트를 만들고, 완성 클라이언트를 호출한 뒤
//! 무의미한 응답을 걸러냅니다.

use std::sync::Arc;
use std::time::Duration;

use super::filter::{filter_knowledge_answer, filter_web_answer};
use crate::llm::{CompletionClient, CompletionRequest, LlmError};

/// 생성 온도 (지식/웹 공통)
pub const ANSWER_TEMPERATURE: f32 = 0.5;
/// 지식 기반 답변 최대 토큰
pub const KNOWLEDGE_MAX_TOKENS: u32 = 150;
/// 웹 기반 답변 최대 토큰
pub const WEB_MAX_TOKENS: u32 = 200;
/// 모델 사전 주입 파라미터
pub const PRIME_TEMPERATURE: f32 = 0.1;
pub const PRIME_MAX_TOKENS: u32 = 50;

/// 답변 합성기
#[derive(Clone)]
pub struct AnswerSynthesizer {
    client: Arc<dyn CompletionClient>,
}

impl AnswerSynthesizer {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// 단일 완성 호출
    pub async fn complete(
        &self,
        prompt: String,
        temperature: f32,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest::new(prompt, temperature, max_tokens, timeout);
        let text = self.client.complete(&request).await?;
        Ok(text.trim().to_string())
    }

    /// 지식 컨텍스트로 답변 (지식 필터 적용)
    pub async fn answer_from_knowledge(
        &self,
        knowledge: &str,
        question: &str,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        let prompt = knowledge_prompt(knowledge, question);
        let answer = self
            .complete(prompt, ANSWER_TEMPERATURE, KNOWLEDGE_MAX_TOKENS, timeout)
            .await?;
        Ok(filter_knowledge_answer(&answer))
    }

    /// 웹 컨텍스트로 답변 (웹 필터 적용)
    pub async fn answer_from_web(
        &self,
        web_content: &str,
        question: &str,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        let prompt = web_prompt(web_content, question);
        let answer = self
            .complete(prompt, ANSWER_TEMPERATURE, WEB_MAX_TOKENS, timeout)
            .await?;
        Ok(filter_web_answer(&answer))
    }

    /// 웹 검색이 비었을 때 지식 문서로 답변 (웹 모드이므로 웹 필터 적용)
    pub async fn answer_from_knowledge_fallback(
        &self,
        knowledge: &str,
        question: &str,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        let prompt = knowledge_prompt(knowledge, question);
        let answer = self
            .complete(prompt, ANSWER_TEMPERATURE, WEB_MAX_TOKENS, timeout)
            .await?;
        Ok(filter_web_answer(&answer))
    }

    /// 지식 문서를 모델에 미리 읽힘 (응답은 확인용으로만 사용)
    pub async fn prime(&self, knowledge: &str, timeout: Duration) -> Result<String, LlmError> {
        let prompt = prime_prompt(knowledge);
        self.complete(prompt, PRIME_TEMPERATURE, PRIME_MAX_TOKENS, timeout)
            .await
    }
}

// ============================================================================
// Prompts
// ============================================================================

pub fn knowledge_prompt(knowledge: &str, question: &str) -> String {
    format!(
        "You have been trained with knowledge base information. \
         Here is the relevant information for this question:\n\n\
         {}\n\n\
         Question: {}\n\n\
         Answer based on the knowledge above:",
        knowledge.trim(),
        question
    )
}

pub fn web_prompt(web_content: &str, question: &str) -> String {
    format!(
        "Answer this question using the web sources provided below:\n\n\
         WEB SOURCES:\n{}\n\n\
         Question: {}\n\n\
         Based on the web sources above, provide a helpful answer:",
        web_content, question
    )
}

pub fn prime_prompt(knowledge: &str) -> String {
    format!(
        "You are an AI assistant with access to a knowledge base. \
         Please read and learn this information so you can answer questions about it accurately.\n\n\
         KNOWLEDGE BASE CONTENT:\n\
         {}\n\n\
         Please acknowledge that you have read and understood this information. \
         You will use this knowledge to answer future questions.",
        knowledge.trim()
    )
}
