//! Knowledge 모듈 - 단일 지식 파일 기반 TF-IDF 검색
//!
//! - Reader: 파일 로드 + mtime 변경 감지
//! - Chunker: 문장 누적 + 단어 오버랩 청킹
//! - Index: unigram/bigram TF-IDF + 코사인 유사도
//! - Confidence: 유사도 + 단어 겹침 신뢰도
//! - Base: 위 결과를 묶은 불변 스냅샷, 변경 시 통째로 교체

mod base;
mod chunker;
mod confidence;
mod index;
mod reader;
mod stopwords;

// Re-exports
pub use base::{IndexState, KnowledgeBase, KnowledgeSnapshot};
pub use chunker::{
    default_chunker, sentence_chunker, ChunkConfig, Chunker, SentenceChunker,
};
pub use confidence::{combine, knowledge_confidence, KEYWORD_WEIGHT, SIMILARITY_WEIGHT};
pub use index::{RetrievalResult, ScoredChunk, TfIdfIndex, TrainError, DEFAULT_MAX_FEATURES};
pub use reader::{KnowledgeDocument, KnowledgeReader, MIN_CONTENT_CHARS};
pub use stopwords::is_stop_word;
