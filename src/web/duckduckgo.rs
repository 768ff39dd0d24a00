//! DuckDuckGo HTML 검색 + 페이지 스크래퍼
//!
//! API 키 없이 HTML 결과 페이지를 파싱합니다.
//! 페이지 본문은 script/style/내비게이션 요소를 제외한 보이는 텍스트만 추출합니다.

use std::sync::OnceLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};

use super::{WebContextProvider, WebError};
use crate::config::WebConfig;

/// 텍스트 추출에서 제외할 요소
const EXCLUDED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside",
];

/// DuckDuckGo 기반 웹 컨텍스트 제공자
pub struct DuckDuckGoProvider {
    client: reqwest::Client,
    config: WebConfig,
}

impl DuckDuckGoProvider {
    /// 설정으로 생성 (브라우저 User-Agent, 요청 타임아웃 적용)
    pub fn new(config: WebConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .context("HTTP 클라이언트 생성 실패")?;

        Ok(Self { client, config })
    }

    async fn fetch(&self, url: &str) -> Result<String, WebError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(WebError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(WebError::Http(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl WebContextProvider for DuckDuckGoProvider {
    async fn search(&self, query: &str) -> Result<Vec<String>, WebError> {
        let url = url::Url::parse_with_params(&self.config.search_url, &[("q", query)])
            .map_err(|e| WebError::Request(format!("invalid search url: {}", e)))?;

        tracing::debug!("Web search: {}", url);
        let html = self.fetch(url.as_str()).await?;
        extract_result_links(&html, self.config.max_results)
    }

    async fn scrape(&self, url: &str) -> Result<String, WebError> {
        let html = self.fetch(url).await?;
        Ok(extract_page_text(&html, self.config.page_char_limit))
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn source_char_limit(&self) -> usize {
        self.config.source_char_limit
    }

    fn politeness_delay(&self) -> std::time::Duration {
        self.config.politeness_delay()
    }
}

// ============================================================================
// HTML Parsing
// ============================================================================

/// 검색 결과 페이지에서 결과 링크 추출 (`a.result__a`)
///
/// 절대 URL(`http...`)만 채택하고, DuckDuckGo 리다이렉트 링크(`/l/?uddg=`)는 원래 URL 로 풀어냅니다.
pub fn extract_result_links(html: &str, max_results: usize) -> Result<Vec<String>, WebError> {
    let selector =
        Selector::parse("a.result__a").map_err(|e| WebError::ParseFailure(e.to_string()))?;
    let document = Html::parse_document(html);

    let urls = document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(resolve_result_href)
        .take(max_results)
        .collect();

    Ok(urls)
}

fn resolve_result_href(href: &str) -> Option<String> {
    if href.starts_with("http") {
        return Some(href.to_string());
    }

    // //duckduckgo.com/l/?uddg=https%3A%2F%2F...
    if href.starts_with("//duckduckgo.com/l/") {
        let parsed = url::Url::parse(&format!("https:{}", href)).ok()?;
        return parsed
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())
            .filter(|v| v.starts_with("http"));
    }

    None
}

/// 페이지에서 보이는 텍스트 추출 (공백 정리 + 길이 제한)
pub fn extract_page_text(html: &str, char_limit: usize) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| EXCLUDED_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            raw.push_str(text);
            raw.push(' ');
        }
    }

    // 연속 공백 정리
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap());
    let cleaned = whitespace.replace_all(&raw, " ").trim().to_string();

    cleaned.chars().take(char_limit).collect()
}

// ============================================================================
// Tests
// ============================================================================
