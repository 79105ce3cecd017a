//! HTTP surface: health/banner endpoints and the Slack slash command.
//!
//! The slash command handler answers within Slack's 3-second window: it
//! verifies the request signature against the raw body, acknowledges
//! immediately, and runs the workflow on a spawned task that posts the
//! terminal result to the caller's `response_url`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use propflow_core::workflow::Orchestrator;
use propflow_slack::{
    commands::{self, SlashCommandPayload},
    notify::SlashResponse,
    signature, ResultNotifier,
};
use secrecy::SecretString;
use serde_json::json;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub notifier: Arc<ResultNotifier>,
    pub signing_secret: SecretString,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/slack/proposal", post(slash_proposal))
        .with_state(state)
}

async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "app": "propflow",
        "status": "running",
        "endpoints": {
            "health": "/health",
            "slash_command": "POST /slack/proposal",
        },
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn slash_proposal(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let timestamp = header_str(&headers, "X-Slack-Request-Timestamp");
    let provided_signature = header_str(&headers, "X-Slack-Signature");
    if !signature::verify_signature(&state.signing_secret, timestamp, &body, provided_signature) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid signature" })))
            .into_response();
    }

    let payload = match commands::parse_slash_payload(&body) {
        Ok(payload) => payload,
        Err(error) => {
            return Json(SlashResponse::ephemeral(error.to_string())).into_response();
        }
    };

    let Some(reference_text) = commands::extract_deal_reference_text(&payload.text) else {
        return Json(SlashResponse::ephemeral(commands::usage_text())).into_response();
    };

    dispatch_run(&state, payload, reference_text);
    Json(SlashResponse::ephemeral(commands::ack_text())).into_response()
}

/// Fire-and-forget: the run proceeds to a terminal state on its own task and
/// reports through the notifier. The handler never awaits it.
fn dispatch_run(state: &AppState, payload: SlashCommandPayload, reference_text: String) {
    let orchestrator = state.orchestrator.clone();
    let notifier = state.notifier.clone();
    info!(user_id = %payload.user_id, channel_id = %payload.channel_id, "proposal run dispatched");

    tokio::spawn(async move {
        let result = orchestrator.run(&reference_text).await;
        if let Err(error) = &result {
            info!(classification = error.classification(), cause = %error, "proposal run failed");
        }
        notifier.deliver(&payload.response_url, &result).await;
    });
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> &'h str {
    headers.get(name).and_then(|value| value.to_str().ok()).unwrap_or_default()
}
