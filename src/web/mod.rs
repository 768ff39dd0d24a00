//! 웹 컨텍스트 모듈 - 검색 + 스크래핑
//!
//! 질문으로 웹 검색 결과 URL 을 얻고, 각 페이지에서 본문 텍스트를 추출해
//! 프롬프트용 컨텍스트 블록과 출처 URL 목록을 만듭니다.
//! 모든 호출은 실패할 수 있지만 치명적이지 않습니다: 실패는 "웹 컨텍스트 없음"으로 수렴합니다.

mod duckduckgo;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use duckduckgo::{extract_page_text, extract_result_links, DuckDuckGoProvider};

// ============================================================================
// Types
// ============================================================================

/// 웹 호출 실패 사유
#[derive(Debug, Error)]
pub enum WebError {
    #[error("network timeout")]
    NetworkTimeout,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("failed to parse page: {0}")]
    ParseFailure(String),
    #[error("HTTP status {0}")]
    Http(u16),
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for WebError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            WebError::NetworkTimeout
        } else if let Some(status) = e.status() {
            WebError::Http(status.as_u16())
        } else {
            WebError::Request(e.to_string())
        }
    }
}

/// 수집된 웹 컨텍스트
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebContext {
    /// "Source: <url>\nContent: <text>" 블록을 빈 줄로 연결한 텍스트
    pub content: String,
    /// 실제로 내용을 제공한 URL
    pub sources: Vec<String>,
}

impl WebContext {
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

// ============================================================================
// WebContextProvider Trait
// ============================================================================

/// 웹 컨텍스트 제공자 트레이트
#[async_trait]
pub trait WebContextProvider: Send + Sync {
    /// 검색 결과 URL 목록
    async fn search(&self, query: &str) -> Result<Vec<String>, WebError>;

    /// 페이지 본문 텍스트 (길이 상한 적용됨)
    async fn scrape(&self, url: &str) -> Result<String, WebError>;

    /// 웹 컨텍스트 사용 여부
    fn enabled(&self) -> bool {
        true
    }

    /// 프롬프트에 넣을 소스당 최대 문자 수
    fn source_char_limit(&self) -> usize {
        600
    }

    /// 스크랩 사이 고정 대기 시간
    fn politeness_delay(&self) -> Duration {
        Duration::from_secs(1)
    }

    /// 검색 + 스크랩하여 컨텍스트 구성
    ///
    /// 실패는 모두 로그로 남기고 빈 컨텍스트로 처리합니다. 재시도는 하지 않습니다.
    async fn gather(&self, question: &str) -> WebContext {
        if !self.enabled() {
            return WebContext::default();
        }

        tracing::info!("Searching web for additional context...");
        let urls = match self.search(question).await {
            Ok(urls) => urls,
            Err(e) => {
                tracing::warn!("Error searching web: {}", e);
                vec![]
            }
        };

        if urls.is_empty() {
            tracing::info!("No web results found or no internet connection");
            return WebContext::default();
        }

        let mut blocks = Vec::new();
        let mut sources = Vec::new();

        for url in urls {
            tracing::info!("Scraping: {}", host_of(&url));
            match self.scrape(&url).await {
                Ok(text) if !text.trim().is_empty() => {
                    let excerpt: String = text.chars().take(self.source_char_limit()).collect();
                    blocks.push(format!("Source: {}\nContent: {}", url, excerpt));
                    sources.push(url);
                }
                Ok(_) => tracing::debug!("Empty page: {}", url),
                Err(e) => tracing::warn!("Error scraping {}: {}", url, e),
            }

            let delay = self.politeness_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        WebContext {
            content: blocks.join("\n\n"),
            sources,
        }
    }
}

/// 로그용 호스트 이름
fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

// ============================================================================
// Tests
// ============================================================================
