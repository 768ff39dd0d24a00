//! Text Chunking Module
//!
//! 문장 단위로 텍스트를 누적하여 목표 크기 근처의 청크로 나눕니다.
//! 연속된 청크는 이전 청크의 마지막 몇 단어를 공유하여 경계의 문맥을 보존합니다.

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 청킹 설정
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// 목표 청크 크기 (문자 수)
    pub target_characters: usize,
    /// 오버랩 힌트 (문자 수). 실제로는 `overlap_characters / 5` 단어를 이어 붙입니다.
    pub overlap_characters: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            target_characters: 300,
            overlap_characters: 50,
        }
    }
}

impl ChunkConfig {
    pub fn new(target_characters: usize, overlap_characters: usize) -> Self {
        Self {
            target_characters,
            overlap_characters,
        }
    }

    /// 다음 청크로 넘길 단어 수
    pub fn overlap_words(&self) -> usize {
        self.overlap_characters / 5
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할
    fn chunk(&self, text: &str) -> Vec<String>;

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// SentenceChunker
// ============================================================================

/// 문장 누적 청커
///
/// - `.`, `!`, `?` 로 문장 분리
/// - 다음 문장을 붙이면 목표 크기를 넘을 때 현재 버퍼를 청크로 내보냄
/// - 내보낸 청크의 마지막 단어들을 다음 버퍼의 시드로 사용
///
/// 크기 상한을 보장하지는 않습니다. 한 문장이 목표 크기보다 길면 그대로 하나의 청크가 됩니다.
pub struct SentenceChunker {
    config: ChunkConfig,
}

impl SentenceChunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }

    /// 문장 분리 (구두점 연속은 하나의 경계로 취급, 빈 문장 제거)
    fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
        text.split(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// 내보낸 청크의 꼬리 단어로 다음 버퍼 시드 생성
    fn seed_from(&self, emitted: &str, sentence: &str) -> String {
        let keep = self.config.overlap_words();
        let words: Vec<&str> = emitted.split_whitespace().collect();

        if keep == 0 || words.len() <= keep {
            return sentence.to_string();
        }

        let mut seed = words[words.len() - keep..].join(" ");
        seed.push(' ');
        seed.push_str(sentence);
        seed
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return vec![];
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for sentence in Self::split_sentences(text) {
            let sentence_len = sentence.chars().count();

            if current_len + sentence_len > self.config.target_characters {
                if current.is_empty() {
                    current = sentence.to_string();
                } else {
                    let emitted = current.trim().to_string();
                    current = self.seed_from(&emitted, sentence);
                    chunks.push(emitted);
                }
            } else if current.is_empty() {
                current.push_str(sentence);
            } else {
                current.push(' ');
                current.push_str(sentence);
            }

            current_len = current.chars().count();
        }

        let last = current.trim();
        if !last.is_empty() {
            chunks.push(last.to_string());
        }

        chunks
    }

    fn name(&self) -> &'static str {
        "SentenceChunker"
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(SentenceChunker::with_defaults())
}

/// 문장 청커 생성 (설정 지정)
pub fn sentence_chunker(config: ChunkConfig) -> Box<dyn Chunker> {
    Box::new(SentenceChunker::new(config))
}

// ============================================================================
// Tests
// ============================================================================
