use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use super::errors::ApiError;
use super::state::AppState;
use crate::oracle::lang::deserialize_lenient;
use crate::oracle::{Lang, OracleError};

const DEFAULT_NOW: &str = "Yes";
const DEFAULT_PROBE: &str = "Are you awake?";

#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub lang: Lang,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub response: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct KeepAliveBody {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KeepAliveParams {
    #[serde(default)]
    pub now: Option<String>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Liveness probe that echoes its inputs.
pub async fn keep_alive(
    Query(params): Query<KeepAliveParams>,
    body: Option<Json<KeepAliveBody>>,
) -> Json<AnswerResponse> {
    let query = body
        .and_then(|Json(b)| b.query)
        .unwrap_or_else(|| DEFAULT_PROBE.to_string());
    let now = params.now.unwrap_or_else(|| DEFAULT_NOW.to_string());
    Json(AnswerResponse {
        response: format!("I am awake at {now}. You asked: {query}"),
    })
}

/// A missing, unparseable or blank body is answered with 400 before any upstream call.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    body: Option<Json<AskRequest>>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let Json(request) = body.ok_or(OracleError::InvalidInput)?;
    let question = request.question.ok_or(OracleError::InvalidInput)?;
    let lang = request.lang;

    let answer = state.oracle.answer(&question, lang).await?;

    info!(
        path = ?answer.path,
        max_score = answer.decision.max_score,
        "ask complete"
    );
    Ok(Json(AnswerResponse {
        response: answer.text,
    }))
}
