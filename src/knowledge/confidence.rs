//! Confidence Scorer
//!
//! 최고 유사도와 질문-청크 간 단어 겹침을 섞어 "로컬 지식이 관련 있는가"를
//! 0.0 ~ 1.0 값 하나로 추정합니다.

use std::collections::HashSet;

use super::index::ScoredChunk;

/// 최고 유사도 가중치
pub const SIMILARITY_WEIGHT: f32 = 0.7;
/// 단어 겹침 가중치
pub const KEYWORD_WEIGHT: f32 = 0.3;

/// 신뢰도 계산
///
/// `0.7 * max_similarity + 0.3 * keyword_overlap`, 0.0 ~ 1.0 으로 클램프
pub fn knowledge_confidence(question: &str, results: &[ScoredChunk]) -> f32 {
    let max_similarity = results
        .iter()
        .map(|r| r.score)
        .fold(0.0_f32, f32::max);

    let question_words = word_set(question);
    let keyword_overlap = if question_words.is_empty() {
        0.0
    } else {
        let knowledge_words: HashSet<String> =
            results.iter().flat_map(|r| word_set(&r.text)).collect();
        let shared = question_words.intersection(&knowledge_words).count();
        shared as f32 / question_words.len() as f32
    };

    combine(max_similarity, keyword_overlap)
}

/// 두 신호 결합 (양쪽 모두에 대해 단조 증가)
pub fn combine(max_similarity: f32, keyword_overlap: f32) -> f32 {
    (SIMILARITY_WEIGHT * max_similarity + KEYWORD_WEIGHT * keyword_overlap).clamp(0.0, 1.0)
}

/// 단어 집합 (영숫자/밑줄 연속, 소문자)
fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(score: f32, text: &str) -> ScoredChunk {
        ScoredChunk {
            score,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_empty_results_and_no_words_is_zero() {
        assert_eq!(knowledge_confidence("?!", &[]), 0.0);
        assert_eq!(knowledge_confidence("", &[]), 0.0);
    }

    #[test]
    fn test_empty_results_with_words_is_zero() {
        assert_eq!(knowledge_confidence("capital of France", &[]), 0.0);
    }

    #[test]
    fn test_full_overlap() {
        let results = vec![hit(0.5, "The capital of France is Paris")];
        let score = knowledge_confidence("capital of France", &results);
        assert!((score - (0.7 * 0.5 + 0.3)).abs() < 1e-6);
    }

    #[test]
    fn test_partial_overlap_uses_union_of_chunks() {
        let results = vec![hit(0.2, "alpha beta"), hit(0.1, "gamma")];
        // 질문 단어 4개 중 3개 겹침
        let score = knowledge_confidence("Alpha beta gamma delta", &results);
        assert!((score - (0.7 * 0.2 + 0.3 * 0.75)).abs() < 1e-6);
    }

    #[test]
    fn test_clamped_to_one() {
        assert_eq!(combine(1.5, 1.0), 1.0);
        assert_eq!(combine(-1.0, 0.0), 0.0);
    }

    #[test]
    fn test_monotonic() {
        let steps = [0.0_f32, 0.1, 0.3, 0.5, 0.9, 1.0];
        for &k in &steps {
            for pair in steps.windows(2) {
                assert!(combine(pair[0], k) <= combine(pair[1], k));
                assert!(combine(k, pair[0]) <= combine(k, pair[1]));
            }
        }
    }
}
