//! 설정 모듈
//!
//! TOML 설정 파일(선택) + 환경변수 오버라이드로 서비스 설정을 구성합니다.
//! 모든 필드에 기본값이 있으므로 설정 파일 없이도 동작합니다.
//!
//! ```toml
//! [knowledge]
//! path = "knowledge.txt"
//!
//! [llm]
//! endpoint = "http://localhost:11434/api/generate"
//! model = "llama3:8b"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// 설정 디렉토리 내 기본 설정 파일 경로 (<config_dir>/rag-chat/config.toml)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rag-chat")
        .join("config.toml")
}

// ============================================================================
// Config
// ============================================================================

/// 전체 서비스 설정
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub knowledge: KnowledgeConfig,
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
    pub web: WebConfig,
    pub server: ServerConfig,
}

/// 지식 파일 + 청킹 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// 지식 파일 경로 (UTF-8 평문)
    pub path: PathBuf,
    /// 청크 목표 크기 (문자 수)
    pub chunk_size: usize,
    /// 오버랩 힌트 (문자 수, 약 1/5 단어 수로 환산)
    pub chunk_overlap: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("knowledge.txt"),
            chunk_size: 300,
            chunk_overlap: 50,
        }
    }
}

/// TF-IDF 검색 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub max_features: usize,
    /// 로컬 지식이 충분하다고 판단하는 신뢰도 하한
    pub confidence_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_features: 1000,
            confidence_threshold: 0.3,
        }
    }
}

/// LLM (Ollama generate API) 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    /// 서버 시작 시 지식 파일을 모델에 미리 주입할지 여부
    pub prime_on_startup: bool,
    pub knowledge_timeout_secs: u64,
    pub web_timeout_secs: u64,
    pub prime_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/generate".to_string(),
            model: "llama3:8b".to_string(),
            prime_on_startup: true,
            knowledge_timeout_secs: 120,
            web_timeout_secs: 60,
            prime_timeout_secs: 180,
        }
    }
}

impl LlmConfig {
    pub fn knowledge_timeout(&self) -> Duration {
        Duration::from_secs(self.knowledge_timeout_secs)
    }

    pub fn web_timeout(&self) -> Duration {
        Duration::from_secs(self.web_timeout_secs)
    }

    pub fn prime_timeout(&self) -> Duration {
        Duration::from_secs(self.prime_timeout_secs)
    }
}

/// 웹 검색/스크래핑 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub enabled: bool,
    /// DuckDuckGo HTML 결과 페이지
    pub search_url: String,
    pub max_results: usize,
    pub timeout_secs: u64,
    /// 페이지당 정제 텍스트 최대 길이
    pub page_char_limit: usize,
    /// 프롬프트에 넣을 소스당 최대 길이
    pub source_char_limit: usize,
    /// 스크랩 사이 고정 대기 시간 (재시도/백오프 아님)
    pub politeness_delay_ms: u64,
    pub user_agent: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            search_url: "https://html.duckduckgo.com/html/".to_string(),
            max_results: 3,
            timeout_secs: 10,
            page_char_limit: 2000,
            source_char_limit: 600,
            politeness_delay_ms: 1000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
        }
    }
}

impl WebConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}

/// HTTP 서버 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl Config {
    /// 설정 로드
    ///
    /// 우선순위:
    /// 1. `path` 인자로 지정한 파일 (없으면 에러)
    /// 2. `<config_dir>/rag-chat/config.toml` (있을 때만)
    /// 3. 기본값
    ///
    /// 마지막으로 환경변수 오버라이드를 적용합니다.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = default_config_path();
                if default_path.is_file() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// TOML 파일에서 로드
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// 환경변수 오버라이드
    ///
    /// `RAG_KNOWLEDGE_FILE`, `OLLAMA_URL`, `OLLAMA_MODEL`, `RAG_BIND`
    fn apply_env_overrides(&mut self) {
        if let Some(path) = non_empty_env("RAG_KNOWLEDGE_FILE") {
            tracing::debug!("Using knowledge file from RAG_KNOWLEDGE_FILE");
            self.knowledge.path = PathBuf::from(path);
        }
        if let Some(endpoint) = non_empty_env("OLLAMA_URL") {
            self.llm.endpoint = endpoint;
        }
        if let Some(model) = non_empty_env("OLLAMA_MODEL") {
            self.llm.model = model;
        }
        if let Some(bind) = non_empty_env("RAG_BIND") {
            self.server.bind = bind;
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

// ============================================================================
// Tests
// ============================================================================
