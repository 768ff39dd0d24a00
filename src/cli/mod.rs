//! CLI 모듈
//!
//! rag-chat CLI 명령어 정의 및 구현

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::chat::{Assistant, SourceMode};
use crate::config::Config;
use crate::knowledge::IndexState;
use crate::server::run_server;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "rag-chat")]
#[command(version, about = "로컬 지식 파일 + 웹 검색 RAG 챗 서비스", long_about = None)]
pub struct Cli {
    /// 설정 파일 경로 (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// HTTP 서버 실행
    Serve {
        /// 바인드 주소 (예: 127.0.0.1:5000)
        #[arg(short, long)]
        bind: Option<String>,

        /// 시작 시 모델에 지식 파일 주입 생략
        #[arg(long)]
        no_prime: bool,
    },

    /// 질문 한 번 하기
    Ask {
        /// 질문
        question: String,

        /// 소스 (knowledge | web)
        #[arg(short, long, default_value = "knowledge")]
        source: String,
    },

    /// 지식 파일 TF-IDF 검색 (LLM 호출 없음)
    Search {
        /// 검색 쿼리
        query: String,

        /// 결과 개수 제한
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("설정 로드 실패")?;

    match cli.command {
        Commands::Serve { bind, no_prime } => cmd_serve(config, bind, no_prime).await,
        Commands::Ask { question, source } => cmd_ask(&config, &question, &source).await,
        Commands::Search { query, limit } => cmd_search(&config, &query, limit),
        Commands::Status => cmd_status(&config),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 서버 명령어 (serve)
///
/// 지식 인덱스를 미리 만들고, 설정에 따라 모델에 지식을 주입한 뒤 서버를 띄웁니다.
async fn cmd_serve(config: Config, bind: Option<String>, no_prime: bool) -> Result<()> {
    let assistant = Arc::new(Assistant::from_config(&config).context("Assistant 초기화 실패")?);

    println!("[*] 챗봇 초기화 중...");
    let snapshot = assistant.knowledge().snapshot();
    println!(
        "[OK] 지식 베이스: {} 청크 ({})",
        snapshot.chunks.len(),
        snapshot.index.label()
    );

    if config.llm.prime_on_startup && !no_prime {
        if assistant.prime_model().await {
            println!("[OK] 모델에 지식 베이스 주입 완료");
        } else {
            println!("[!] 모델에 지식 베이스를 주입하지 못했습니다");
        }
    }

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    println!("[*] 서버 시작: http://{}", bind);
    run_server(assistant, &bind).await
}

/// 질문 명령어 (ask)
async fn cmd_ask(config: &Config, question: &str, source: &str) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        anyhow::bail!("질문을 입력해야 합니다");
    }

    let assistant = Assistant::from_config(config).context("Assistant 초기화 실패")?;
    let mode = SourceMode::parse(source);

    println!("[*] 질문 ({}): \"{}\"\n", mode.as_str(), question);
    let result = assistant.ask(question, mode).await;

    println!("{}\n", result.answer);
    if !result.sources.is_empty() {
        println!("   소스: {}", result.sources.join(", "));
    }
    for url in &result.web_sources {
        println!("   웹: {}", url);
    }
    println!("   신뢰도: {:.2}", result.confidence);

    Ok(())
}

/// 검색 명령어 (search)
///
/// TF-IDF 검색 결과와 신뢰도를 보여줍니다.
fn cmd_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    let assistant = Assistant::from_config(config).context("Assistant 초기화 실패")?;

    println!("[*] 검색 중: \"{}\"", query);
    let report = assistant.inspect(query, limit);

    if report.results.is_empty() {
        println!("\n[!] 검색 결과가 없습니다.");
    } else {
        println!("\n[OK] 검색 결과 ({} 건):\n", report.results.len());
        for (i, hit) in report.results.iter().enumerate() {
            println!("{}. [점수: {:.4}]", i + 1, hit.score);
            println!("   내용: {}", truncate_text(&hit.text, 200));
            println!();
        }
    }

    println!(
        "[*] 신뢰도: {:.2} (기준 {:.2}, 로컬 지식 {})",
        report.confidence,
        report.threshold,
        if report.is_sufficient() { "충분" } else { "부족" }
    );

    Ok(())
}

/// 상태 명령어 (status)
fn cmd_status(config: &Config) -> Result<()> {
    println!("rag-chat v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let assistant = Assistant::from_config(config).context("Assistant 초기화 실패")?;
    let knowledge = assistant.knowledge();
    let path = knowledge.path();

    if path.is_file() {
        println!("[OK] 지식 파일: {}", path.display());
    } else {
        println!("[!] 지식 파일 없음: {}", path.display());
    }

    let snapshot = knowledge.snapshot();
    println!("     세대: {}", snapshot.generation);
    println!(
        "     크기: {} ({} 청크)",
        format_bytes(snapshot.text().len()),
        snapshot.chunks.len()
    );
    match &snapshot.index {
        IndexState::Trained(index) => {
            println!("     인덱스: trained ({} features)", index.vocabulary_size())
        }
        other => println!("     인덱스: {}", other.label()),
    }
    println!("     SHA-256: {}", snapshot.digest);
    println!(
        "     로드 시각: {}",
        snapshot.loaded_at.format("%Y-%m-%d %H:%M:%S")
    );

    println!();
    println!("[*] 모델: {} @ {}", assistant.model(), config.llm.endpoint);
    println!(
        "[*] 웹 검색: {}",
        if config.web.enabled { "사용" } else { "사용 안 함" }
    );

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
