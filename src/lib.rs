//! rag-chat - 로컬 지식 파일 + 웹 검색 RAG 챗 서비스
//!
//! 단일 텍스트 지식 파일을 TF-IDF 로 검색하거나 DuckDuckGo 결과 페이지를
//! 긁어 모은 뒤, 로컬 Ollama 모델로 답변을 생성합니다.

pub mod chat;
pub mod cli;
pub mod config;
pub mod knowledge;
pub mod llm;
pub mod server;
pub mod web;

// Re-exports
pub use chat::{AnswerResult, Assistant, RetrievalReport, SourceMode, UNKNOWN_RESPONSE};
pub use config::{
    Config, KnowledgeConfig, LlmConfig, RetrievalConfig, ServerConfig, WebConfig,
    default_config_path,
};
pub use knowledge::{
    ChunkConfig, Chunker, IndexState, KnowledgeBase, KnowledgeDocument, KnowledgeReader,
    KnowledgeSnapshot, RetrievalResult, ScoredChunk, SentenceChunker, TfIdfIndex, TrainError,
    default_chunker, knowledge_confidence, sentence_chunker,
};
pub use llm::{CompletionClient, CompletionRequest, LlmError, OllamaClient};
pub use server::{router, run_server};
pub use web::{DuckDuckGoProvider, WebContext, WebContextProvider, WebError};
