//! 무의미한 모델 응답 필터
//!
//! 모델이 질문에 답하지 않고 "I understand" 같은 인사말만 돌려주는 경우를 걸러
//! 고정 문구 "I don't know." 로 바꿉니다.

/// 답을 찾지 못했을 때의 고정 응답
pub const UNKNOWN_RESPONSE: &str = "I don't know.";

/// 지식 기반 답변에 적용하는 문구 목록
pub const KNOWLEDGE_GENERIC_PHRASES: &[&str] = &[
    "i understand",
    "i'm ready",
    "okay, i understand",
    "let's start",
    "i will use",
    "based on the provided",
    "i can help",
    "let me help",
    "ready to help",
];

/// 웹 기반 답변에 적용하는 (더 짧은) 문구 목록
pub const WEB_GENERIC_PHRASES: &[&str] = &[
    "i understand",
    "i'm ready",
    "okay, i understand",
    "let's start",
    "ready to help",
];

/// 검사할 앞부분 길이 (문자 수)
const PREFIX_CHARS: usize = 50;
/// 웹 답변에서 필터 대상이 되는 최대 길이 (미만)
const WEB_SHORT_ANSWER_CHARS: usize = 20;

/// 지식 기반 답변 필터
///
/// 비어 있거나 앞 50자에 일반 문구가 있으면 `UNKNOWN_RESPONSE`.
pub fn filter_knowledge_answer(answer: &str) -> String {
    let answer = answer.trim();
    let prefix: String = answer.chars().take(PREFIX_CHARS).collect::<String>().to_lowercase();

    if answer.is_empty() || contains_any(&prefix, KNOWLEDGE_GENERIC_PHRASES) {
        UNKNOWN_RESPONSE.to_string()
    } else {
        answer.to_string()
    }
}

/// 웹 기반 답변 필터
///
/// 20자 미만이면서 일반 문구를 포함할 때만 대체합니다. 긴 답변은 그대로 둡니다.
pub fn filter_web_answer(answer: &str) -> String {
    let answer = answer.trim();
    let short = answer.chars().count() < WEB_SHORT_ANSWER_CHARS;

    if answer.is_empty() || (short && contains_any(&answer.to_lowercase(), WEB_GENERIC_PHRASES)) {
        UNKNOWN_RESPONSE.to_string()
    } else {
        answer.to_string()
    }
}

fn contains_any(haystack: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| haystack.contains(p))
}
