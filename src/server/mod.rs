//! HTTP 서버
//!
//! | Method | Path | 설명 |
//! |--------|------|------|
//! | `POST` | `/ask` | `{question, sourceType}` → 답변 |
//! | `GET`  | `/health` | 헬스 체크 |
//!
//! 빈 질문과 해석할 수 없는 본문은 코어에 도달하기 전에 400 으로 거절합니다.
//! 에러 응답도 답변과 같은 필드(`error`, `answer`, `sources`, `web_sources`)를 가집니다.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::chat::{AnswerResult, Assistant, SourceMode};

/// 라우트 핸들러 공유 상태
#[derive(Clone)]
pub struct AppState {
    assistant: Arc<Assistant>,
}

/// `/ask` 요청 본문
#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default, rename = "sourceType")]
    pub source_type: Option<String>,
}

/// 에러 응답 본문 (답변 필드는 빈 값으로 채움)
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    answer: String,
    sources: Vec<String>,
    web_sources: Vec<String>,
}

impl ErrorBody {
    fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            answer: String::new(),
            sources: vec![],
            web_sources: vec![],
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    message: &'static str,
}

/// 라우터 생성
pub fn router(assistant: Arc<Assistant>) -> Router {
    Router::new()
        .route("/ask", post(handle_ask))
        .route("/health", get(handle_health))
        .with_state(AppState { assistant })
}

/// 서버 실행 (프로세스 종료 시까지)
pub async fn run_server(assistant: Arc<Assistant>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    tracing::info!("Chat server listening on http://{}", bind);
    axum::serve(listener, router(assistant))
        .await
        .context("HTTP server error")?;
    Ok(())
}

async fn handle_ask(
    State(state): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        // 본문이 비었거나 JSON 이 아니면 질문 없음과 같은 응답
        Err(JsonRejection::MissingJsonContentType(_)) => AskRequest::default(),
        Err(rejection) => {
            tracing::debug!("Rejected /ask body: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new(format!(
                    "Invalid request body: {}",
                    rejection.body_text()
                ))),
            )
                .into_response();
        }
    };

    let question = request.question.as_deref().unwrap_or("").trim().to_string();
    if question.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("Please enter a question")),
        )
            .into_response();
    }

    let mode = SourceMode::parse(request.source_type.as_deref().unwrap_or("knowledge"));
    let result: AnswerResult = state.assistant.ask(&question, mode).await;
    Json(result).into_response()
}

async fn handle_health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        message: "Chatbot is running",
    })
}
