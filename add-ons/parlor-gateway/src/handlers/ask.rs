//! `POST /ask`: one message in, one reply out.
//!
//! The body is parsed as JSON whatever its content type, so plain `fetch`
//! calls without headers work.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub reply: String,
}

pub async fn ask(State(state): State<AppState>, body: Bytes) -> Response {
    let req: AskRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!(target: "parlor::gateway", error = %e, "Rejected malformed /ask body");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": format!("invalid JSON body: {}", e) })),
            )
                .into_response();
        }
    };

    let correlation_id = uuid::Uuid::new_v4();
    let message = req.message.unwrap_or_default();
    tracing::info!(
        target: "parlor::gateway",
        %correlation_id,
        user_id = req.user_id.as_deref().unwrap_or(parlor_core::DEFAULT_USER_ID),
        chars = message.len(),
        "Ask request received"
    );

    let reply = state.pipeline.ask(req.user_id.as_deref(), &message).await;
    tracing::debug!(target: "parlor::gateway", %correlation_id, reply_chars = reply.len(), "Ask answered");
    Json(AskResponse { reply }).into_response()
}
