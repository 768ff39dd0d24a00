//! Assistant - 질문 응답 오케스트레이터
//!
//! 요청마다 지식 스냅샷 하나를 잡고, 소스 모드에 따라:
//!
//! ```text
//! knowledge: 스냅샷 문서 전체 → Synthesizer → 지식 필터 → "(knowledge base only)"
//! web:       WebContextProvider → Synthesizer → 웹 필터 → "(current web sources only)"
//!            └ 웹 컨텍스트 없음 → 지식 문서로 대체 → "Knowledge base (web fallback)"
//! ```
//!
//! 어떤 실패도 에러로 전파하지 않고 항상 `AnswerResult` 를 돌려줍니다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use super::synthesizer::AnswerSynthesizer;
use super::{AnswerResult, SourceMode};
use crate::config::{Config, LlmConfig, RetrievalConfig};
use crate::knowledge::{
    knowledge_confidence, sentence_chunker, ChunkConfig, KnowledgeBase, KnowledgeReader,
    KnowledgeSnapshot, RetrievalResult,
};
use crate::llm::{CompletionClient, LlmError, OllamaClient};
use crate::web::{DuckDuckGoProvider, WebContextProvider};

pub const KNOWLEDGE_SUFFIX: &str = "\n\n(Answer based on knowledge base only)";
pub const WEB_SUFFIX: &str = "\n\n(Answer based on current web sources only)";

pub const SOURCE_KNOWLEDGE: &str = "Knowledge base";
pub const SOURCE_KNOWLEDGE_EMPTY: &str = "Knowledge base (empty)";
pub const SOURCE_WEB_FALLBACK: &str = "Knowledge base (web fallback)";

/// 지식 모드의 신뢰도 (검색 품질과 무관한 고정값)
const KNOWLEDGE_MODE_CONFIDENCE: f32 = 1.0;

/// 검색 진단 결과 (CLI `search` 용)
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalReport {
    pub generation: u64,
    pub results: RetrievalResult,
    pub confidence: f32,
    pub threshold: f32,
}

impl RetrievalReport {
    /// 로컬 지식만으로 충분한지
    pub fn is_sufficient(&self) -> bool {
        self.confidence >= self.threshold
    }
}

/// 질문 응답 오케스트레이터
pub struct Assistant {
    knowledge: Arc<KnowledgeBase>,
    synthesizer: AnswerSynthesizer,
    web: Arc<dyn WebContextProvider>,
    llm: LlmConfig,
    retrieval: RetrievalConfig,
    primed: AtomicBool,
}

impl Assistant {
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        client: Arc<dyn CompletionClient>,
        web: Arc<dyn WebContextProvider>,
        config: &Config,
    ) -> Self {
        Self {
            knowledge,
            synthesizer: AnswerSynthesizer::new(client),
            web,
            llm: config.llm.clone(),
            retrieval: config.retrieval.clone(),
            primed: AtomicBool::new(false),
        }
    }

    /// 설정으로 실제 구성요소(파일 지식 베이스, Ollama, DuckDuckGo) 조립
    pub fn from_config(config: &Config) -> Result<Self> {
        let knowledge = KnowledgeBase::new(
            KnowledgeReader::new(&config.knowledge.path),
            sentence_chunker(ChunkConfig::new(
                config.knowledge.chunk_size,
                config.knowledge.chunk_overlap,
            )),
            config.retrieval.max_features,
        );
        let client = OllamaClient::new(&config.llm)?;
        let web = DuckDuckGoProvider::new(config.web.clone())?;

        Ok(Self::new(
            Arc::new(knowledge),
            Arc::new(client),
            Arc::new(web),
            config,
        ))
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn model(&self) -> &str {
        self.synthesizer.model()
    }

    // ========================================================================
    // Question Answering
    // ========================================================================

    /// 질문에 답변
    pub async fn ask(&self, question: &str, mode: SourceMode) -> AnswerResult {
        let snapshot = self.knowledge.snapshot();
        tracing::info!(
            "Question ({} mode, knowledge generation {}): {}",
            mode.as_str(),
            snapshot.generation,
            question
        );

        match mode {
            SourceMode::Knowledge => self.ask_knowledge(&snapshot, question).await,
            SourceMode::Web => self.ask_web(&snapshot, question).await,
        }
    }

    async fn ask_knowledge(&self, snapshot: &KnowledgeSnapshot, question: &str) -> AnswerResult {
        if !snapshot.has_content() {
            tracing::info!("Knowledge base is empty");
            return AnswerResult {
                sources: vec![SOURCE_KNOWLEDGE_EMPTY.to_string()],
                ..AnswerResult::unknown()
            };
        }

        match self
            .synthesizer
            .answer_from_knowledge(snapshot.text(), question, self.llm.knowledge_timeout())
            .await
        {
            Ok(answer) => AnswerResult {
                answer: answer + KNOWLEDGE_SUFFIX,
                sources: vec![SOURCE_KNOWLEDGE.to_string()],
                web_sources: vec![],
                confidence: KNOWLEDGE_MODE_CONFIDENCE,
                error: None,
            },
            Err(e) => llm_failure(e),
        }
    }

    async fn ask_web(&self, snapshot: &KnowledgeSnapshot, question: &str) -> AnswerResult {
        // 웹 모드에서는 지식 검색을 하지 않으므로 신뢰도는 0 으로 남음
        let knowledge_confidence = 0.0;

        let context = self.web.gather(question).await;
        if !context.is_empty() {
            tracing::info!(
                "Web content retrieved: {} chars from {} sources",
                context.content.len(),
                context.sources.len()
            );

            return match self
                .synthesizer
                .answer_from_web(&context.content, question, self.llm.web_timeout())
                .await
            {
                Ok(answer) => AnswerResult {
                    answer: answer + WEB_SUFFIX,
                    sources: vec![],
                    web_sources: context.sources,
                    confidence: knowledge_confidence,
                    error: None,
                },
                Err(e) => llm_failure(e),
            };
        }

        if snapshot.text().trim().is_empty() {
            tracing::info!("No web content and empty knowledge base");
            return AnswerResult::unknown();
        }

        tracing::info!("Web sources unavailable, replying from knowledge base");
        match self
            .synthesizer
            .answer_from_knowledge_fallback(snapshot.text(), question, self.llm.web_timeout())
            .await
        {
            Ok(answer) => AnswerResult {
                answer: answer + KNOWLEDGE_SUFFIX,
                sources: vec![SOURCE_WEB_FALLBACK.to_string()],
                web_sources: vec![],
                confidence: knowledge_confidence,
                error: None,
            },
            Err(e) => llm_failure(e),
        }
    }

    // ========================================================================
    // Retrieval Diagnostics
    // ========================================================================

    /// TF-IDF 검색 + 신뢰도 계산
    pub fn inspect(&self, question: &str, top_k: Option<usize>) -> RetrievalReport {
        let snapshot = self.knowledge.snapshot();
        let results = snapshot.retrieve(question, top_k.unwrap_or(self.retrieval.top_k));
        let confidence = knowledge_confidence(question, &results);
        tracing::info!("Knowledge Base Confidence: {:.2}", confidence);

        RetrievalReport {
            generation: snapshot.generation,
            results,
            confidence,
            threshold: self.retrieval.confidence_threshold,
        }
    }

    // ========================================================================
    // Model Priming
    // ========================================================================

    /// 지식 문서를 모델에 한 번 주입
    ///
    /// 성공은 프로세스당 한 번만 기록되며, 실패는 로그로만 남깁니다.
    pub async fn prime_model(&self) -> bool {
        if self.primed.load(Ordering::Acquire) {
            tracing::info!("Knowledge already fed to the model");
            return true;
        }

        let snapshot = self.knowledge.snapshot();
        if !snapshot.has_content() {
            tracing::warn!("No knowledge base content to feed to the model");
            return false;
        }

        tracing::info!(
            "Sending {} characters to {} for priming...",
            snapshot.text().len(),
            self.model()
        );

        match self
            .synthesizer
            .prime(snapshot.text(), self.llm.prime_timeout())
            .await
        {
            Ok(ack) => {
                let preview: String = ack.chars().take(100).collect();
                tracing::info!("Model response: {}", preview);
                self.primed.store(true, Ordering::Release);
                true
            }
            Err(e) => {
                tracing::error!("Error feeding knowledge to the model: {}", e);
                false
            }
        }
    }

    pub fn is_primed(&self) -> bool {
        self.primed.load(Ordering::Acquire)
    }
}

fn llm_failure(error: LlmError) -> AnswerResult {
    tracing::error!("LLM request failed: {}", error);
    AnswerResult {
        answer: format!(
            "Error: Could not connect to the language model. Is it running? ({})",
            error
        ),
        sources: vec![],
        web_sources: vec![],
        confidence: 0.0,
        error: Some(error.to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::UNKNOWN_RESPONSE;
    use crate::knowledge::{default_chunker, DEFAULT_MAX_FEATURES};
    use crate::llm::CompletionRequest;
    use crate::web::WebError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    // ------------------------------------------------------------------------
    // Stubs
    // ------------------------------------------------------------------------

    struct StubLlm {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubLlm {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(vec![]),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(vec![]),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for StubLlm {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            self.reply.clone().map_err(LlmError::Transport)
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    #[derive(Default)]
    struct StubWeb {
        urls: Vec<String>,
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl WebContextProvider for StubWeb {
        async fn search(&self, _query: &str) -> Result<Vec<String>, WebError> {
            Ok(self.urls.clone())
        }

        async fn scrape(&self, url: &str) -> Result<String, WebError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or(WebError::NetworkTimeout)
        }

        fn politeness_delay(&self) -> Duration {
            Duration::ZERO
        }
    }

    fn assistant(path: &Path, llm: Arc<StubLlm>, web: StubWeb) -> Assistant {
        let knowledge = KnowledgeBase::new(
            KnowledgeReader::new(path),
            default_chunker(),
            DEFAULT_MAX_FEATURES,
        );
        Assistant::new(Arc::new(knowledge), llm, Arc::new(web), &Config::default())
    }

    fn knowledge_file(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("knowledge.txt");
        std::fs::write(&path, content).unwrap();
        path
    }

    // ------------------------------------------------------------------------
    // Knowledge mode
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_knowledge_mode_answers_from_whole_document() {
        let dir = TempDir::new().unwrap();
        let path = knowledge_file(&dir, "The capital of France is Paris.");
        let llm = StubLlm::replying("Paris is the capital of France.");
        let assistant = assistant(&path, llm.clone(), StubWeb::default());

        let result = assistant
            .ask("What is the capital of France?", SourceMode::Knowledge)
            .await;

        assert_eq!(
            result.answer,
            "Paris is the capital of France.\n\n(Answer based on knowledge base only)"
        );
        assert_eq!(result.sources, vec!["Knowledge base".to_string()]);
        assert!(result.web_sources.is_empty());
        assert_eq!(result.confidence, 1.0);
        assert!(result.error.is_none());

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("The capital of France is Paris."));
        assert!(prompts[0].contains("Question: What is the capital of France?"));
    }

    #[tokio::test]
    async fn test_knowledge_mode_empty_or_tiny_file() {
        let dir = TempDir::new().unwrap();

        for content in [None, Some(""), Some("   \n  "), Some("too short")] {
            let path = match content {
                Some(c) => knowledge_file(&dir, c),
                None => dir.path().join("absent.txt"),
            };
            let llm = StubLlm::replying("should not be called");
            let assistant = assistant(&path, llm.clone(), StubWeb::default());

            let result = assistant.ask("Anything?", SourceMode::Knowledge).await;
            assert_eq!(result.answer, UNKNOWN_RESPONSE);
            assert_eq!(result.sources, vec!["Knowledge base (empty)".to_string()]);
            assert_eq!(result.confidence, 0.0);
            assert!(llm.prompts().is_empty());
        }
    }

    #[tokio::test]
    async fn test_knowledge_mode_filters_generic_reply() {
        let dir = TempDir::new().unwrap();
        let path = knowledge_file(&dir, "The capital of France is Paris.");
        let llm = StubLlm::replying("I understand. Paris is the capital of France.");
        let assistant = assistant(&path, llm, StubWeb::default());

        let result = assistant.ask("Capital?", SourceMode::Knowledge).await;
        assert_eq!(
            result.answer,
            "I don't know.\n\n(Answer based on knowledge base only)"
        );
        assert_eq!(result.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_llm_failure_becomes_error_result() {
        let dir = TempDir::new().unwrap();
        let path = knowledge_file(&dir, "The capital of France is Paris.");
        let assistant = assistant(&path, StubLlm::failing("connection refused"), StubWeb::default());

        let result = assistant.ask("Capital?", SourceMode::Knowledge).await;
        assert!(result.answer.starts_with("Error: Could not connect"));
        assert!(result.answer.contains("connection refused"));
        assert!(result.sources.is_empty());
        assert_eq!(result.confidence, 0.0);
        assert!(result.error.unwrap().contains("connection refused"));
    }

    // ------------------------------------------------------------------------
    // Web mode
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_web_mode_nothing_found_and_empty_knowledge() {
        let dir = TempDir::new().unwrap();
        let path = knowledge_file(&dir, "");
        let llm = StubLlm::replying("unused");
        let assistant = assistant(&path, llm.clone(), StubWeb::default());

        let result = assistant.ask("Who won?", SourceMode::Web).await;
        assert_eq!(result, AnswerResult::unknown());
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_web_mode_answers_from_scraped_page() {
        let dir = TempDir::new().unwrap();
        let path = knowledge_file(&dir, "The capital of France is Paris.");
        let url = "https://example.com/news".to_string();
        let web = StubWeb {
            urls: vec![url.clone()],
            pages: HashMap::from([(url.clone(), "Fresh news content about Paris.".to_string())]),
        };
        let reply = "Paris hosted the event in 2024";
        let llm = StubLlm::replying(reply);
        let assistant = assistant(&path, llm.clone(), web);

        let result = assistant.ask("Where was the event?", SourceMode::Web).await;

        assert!(result.sources.is_empty());
        assert_eq!(result.web_sources, vec![url.clone()]);
        assert!(result
            .answer
            .ends_with("(Answer based on current web sources only)"));
        assert!(result.answer.starts_with(reply));
        assert_eq!(result.confidence, 0.0);

        let prompts = llm.prompts();
        assert!(prompts[0].contains("WEB SOURCES:\nSource: https://example.com/news"));
        assert!(!prompts[0].contains("The capital of France is Paris."));
    }

    #[tokio::test]
    async fn test_web_mode_keeps_long_generic_answer() {
        let dir = TempDir::new().unwrap();
        let path = knowledge_file(&dir, "");
        let url = "https://example.com/a".to_string();
        let web = StubWeb {
            urls: vec![url.clone()],
            pages: HashMap::from([(url, "Some page text.".to_string())]),
        };
        let reply = "I understand. Paris is the capital of France.";
        let assistant = assistant(&path, StubLlm::replying(reply), web);

        let result = assistant.ask("Capital?", SourceMode::Web).await;
        assert!(result.answer.starts_with(reply));
    }

    #[tokio::test]
    async fn test_web_mode_falls_back_to_knowledge() {
        let dir = TempDir::new().unwrap();
        let path = knowledge_file(&dir, "The capital of France is Paris.");
        let web = StubWeb {
            urls: vec!["https://down.example".to_string()],
            pages: HashMap::new(),
        };
        let llm = StubLlm::replying("Paris is the capital.");
        let assistant = assistant(&path, llm.clone(), web);

        let result = assistant.ask("Capital of France?", SourceMode::Web).await;
        assert_eq!(
            result.answer,
            "Paris is the capital.\n\n(Answer based on knowledge base only)"
        );
        assert_eq!(result.sources, vec!["Knowledge base (web fallback)".to_string()]);
        assert!(result.web_sources.is_empty());
        assert_eq!(result.confidence, 0.0);
        assert!(llm.prompts()[0].contains("The capital of France is Paris."));
    }

    // ------------------------------------------------------------------------
    // Retrieval + priming
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_inspect_reports_confidence() {
        let dir = TempDir::new().unwrap();
        let path = knowledge_file(
            &dir,
            "The capital of France is Paris. Rust is a systems programming language.",
        );
        let assistant = assistant(&path, StubLlm::replying(""), StubWeb::default());

        let report = assistant.inspect("capital of France", None);
        assert_eq!(report.generation, 1);
        assert_eq!(report.results.len(), 1);
        assert!(report.confidence > 0.3);
        assert!(report.is_sufficient());

        let report = assistant.inspect("quantum chromodynamics", None);
        assert!(report.results.is_empty());
        assert_eq!(report.confidence, 0.0);
        assert!(!report.is_sufficient());
    }

    #[tokio::test]
    async fn test_prime_model_once() {
        let dir = TempDir::new().unwrap();
        let path = knowledge_file(&dir, "The capital of France is Paris.");
        let llm = StubLlm::replying("I have read it.");
        let assistant = assistant(&path, llm.clone(), StubWeb::default());

        assert!(assistant.prime_model().await);
        assert!(assistant.prime_model().await);
        assert!(assistant.is_primed());
        assert_eq!(llm.prompts().len(), 1);
        assert!(llm.prompts()[0].contains("KNOWLEDGE BASE CONTENT:"));
    }

    #[tokio::test]
    async fn test_prime_model_skips_empty_and_failures() {
        let dir = TempDir::new().unwrap();
        let empty = assistant(&dir.path().join("none.txt"), StubLlm::replying("ok"), StubWeb::default());
        assert!(!empty.prime_model().await);

        let path = knowledge_file(&dir, "The capital of France is Paris.");
        let failing = assistant(&path, StubLlm::failing("down"), StubWeb::default());
        assert!(!failing.prime_model().await);
        assert!(!failing.is_primed());
    }
}
