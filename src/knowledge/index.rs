//! TF-IDF Retrieval Index
//!
//! 청크 목록 위에 희소 TF-IDF 벡터 공간을 학습하고, 질의를 같은 공간에 투영하여
//! 코사인 유사도로 순위를 매깁니다.
//!
//! - 토큰: 2자 이상의 영숫자/밑줄 연속, 소문자화
//! - 영어 불용어 제거 후 unigram + bigram
//! - 어휘 크기 상한 (코퍼스 전체 빈도 상위)
//! - idf = ln((1 + n) / (1 + df)) + 1, 행 단위 L2 정규화

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::stopwords::is_stop_word;

/// 기본 어휘 크기 상한
pub const DEFAULT_MAX_FEATURES: usize = 1000;

// ============================================================================
// Types
// ============================================================================

/// 학습 실패 사유
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrainError {
    #[error("no chunks to train on")]
    EmptyCorpus,
    #[error("empty vocabulary; the chunks only contain stop words")]
    EmptyVocabulary,
}

/// 검색된 청크 (유사도 + 텍스트)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub score: f32,
    pub text: String,
}

/// 검색 결과: 유사도 내림차순, 양수 유사도만, 최대 top-k
pub type RetrievalResult = Vec<ScoredChunk>;

/// 희소 벡터 (term index 오름차순)
type SparseVector = Vec<(usize, f32)>;

// ============================================================================
// TfIdfIndex
// ============================================================================

/// 학습된 TF-IDF 인덱스
///
/// 학습에 사용한 청크 목록을 함께 소유하므로, 다른 세대의 청크와 섞여 조회될 수 없습니다.
#[derive(Debug, Clone)]
pub struct TfIdfIndex {
    chunks: Arc<[String]>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    rows: Vec<SparseVector>,
}

impl TfIdfIndex {
    /// 청크 목록으로 학습
    pub fn train(chunks: Arc<[String]>, max_features: usize) -> Result<Self, TrainError> {
        if chunks.is_empty() {
            return Err(TrainError::EmptyCorpus);
        }

        // 1. 문서별 term 빈도
        let doc_counts: Vec<HashMap<String, usize>> =
            chunks.iter().map(|c| count_terms(c)).collect();

        // 2. 코퍼스 전체 빈도 + 문서 빈도
        let mut corpus_counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for counts in &doc_counts {
            for (term, &n) in counts {
                let entry = corpus_counts.entry(term.as_str()).or_insert((0, 0));
                entry.0 += n;
                entry.1 += 1;
            }
        }

        if corpus_counts.is_empty() {
            return Err(TrainError::EmptyVocabulary);
        }

        // 3. 어휘 상한 적용 (빈도 내림차순, 동률은 사전순)
        let mut terms: Vec<(&str, usize, usize)> = corpus_counts
            .into_iter()
            .map(|(t, (total, df))| (t, total, df))
            .collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(max_features.max(1));
        terms.sort_by(|a, b| a.0.cmp(b.0));

        // 4. idf (smooth)
        let n_docs = chunks.len() as f32;
        let mut vocabulary = HashMap::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());
        for (i, (term, _, df)) in terms.iter().enumerate() {
            vocabulary.insert(term.to_string(), i);
            idf.push(((1.0 + n_docs) / (1.0 + *df as f32)).ln() + 1.0);
        }

        // 5. 문서 벡터
        let rows = doc_counts
            .iter()
            .map(|counts| weigh(counts, &vocabulary, &idf))
            .collect();

        Ok(Self {
            chunks,
            vocabulary,
            idf,
            rows,
        })
    }

    /// 질의와 유사한 청크 검색
    pub fn query(&self, text: &str, top_k: usize) -> RetrievalResult {
        let query_vec = weigh(&count_terms(text), &self.vocabulary, &self.idf);
        if query_vec.is_empty() || top_k == 0 {
            return vec![];
        }

        let mut scored: Vec<(usize, f32)> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| (i, sparse_dot(&query_vec, row)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                score,
                text: self.chunks[i].clone(),
            })
            .collect()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 토큰화: 소문자, 2자 이상, 불용어 제거
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| w.chars().count() >= 2 && !is_stop_word(w))
        .map(str::to_string)
        .collect()
}

/// unigram + bigram 빈도
fn count_terms(text: &str) -> HashMap<String, usize> {
    let tokens = tokenize(text);
    let mut counts = HashMap::new();

    for token in &tokens {
        *counts.entry(token.clone()).or_insert(0) += 1;
    }
    for pair in tokens.windows(2) {
        *counts.entry(format!("{} {}", pair[0], pair[1])).or_insert(0) += 1;
    }

    counts
}

/// term 빈도 → L2 정규화된 tf-idf 희소 벡터 (어휘 밖 term 은 무시)
fn weigh(
    counts: &HashMap<String, usize>,
    vocabulary: &HashMap<String, usize>,
    idf: &[f32],
) -> SparseVector {
    let mut vec: SparseVector = counts
        .iter()
        .filter_map(|(term, &n)| vocabulary.get(term).map(|&i| (i, n as f32 * idf[i])))
        .collect();

    let norm = vec.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vec![];
    }

    for (_, w) in vec.iter_mut() {
        *w /= norm;
    }
    vec.sort_by_key(|(i, _)| *i);
    vec
}

/// 정렬된 희소 벡터 내적 (정규화되어 있으므로 코사인 유사도)
fn sparse_dot(a: &[(usize, f32)], b: &[(usize, f32)]) -> f32 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;

    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }

    sum
}

// ============================================================================
// Tests
// ============================================================================
