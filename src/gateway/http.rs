//! HTTP chat surface.
//!
//! `POST /chat` answers `{userId, prompt}` with history kept in the history
//! store, or `{prompt, history}` with history kept by the client.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use log::{error, warn};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::core::{ConversationTurn, RelayError, HTTP_FAILURE_MESSAGE};
use crate::features::chat::{HistoryStore, Relay};

const MISSING_FIELDS_MESSAGE: &str = "userId and prompt are required";

/// Shared state for the HTTP server.
pub struct AppState {
    pub relay: Relay,
    pub history: Arc<dyn HistoryStore>,
}

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub prompt: Option<String>,
    pub history: Option<Vec<ConversationTurn>>,
}

/// Create the HTTP router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn chat(State(state): State<Arc<AppState>>, body: Result<Json<ChatBody>, JsonRejection>) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!("Rejected /chat body: {rejection}");
            return bad_request();
        }
    };

    let prompt = body.prompt.as_deref().map(str::trim).unwrap_or_default();
    let user_id = body.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    if prompt.is_empty() || (user_id.is_none() && body.history.is_none()) {
        return bad_request();
    }

    let result = match (user_id, &body.history) {
        (Some(user_id), _) => {
            state
                .relay
                .handle_persisted_prompt(state.history.as_ref(), user_id, prompt)
                .await
        }
        (None, Some(history)) => state.relay.handle_stateless_prompt(prompt, history).await,
        (None, None) => return bad_request(),
    };

    match result {
        Ok(response) => Json(json!({ "response": response })).into_response(),
        Err(e @ RelayError::MissingInput(_)) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.user_message() }))).into_response()
        }
        Err(e) => {
            error!("Error in /chat endpoint: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": HTTP_FAILURE_MESSAGE })),
            )
                .into_response()
        }
    }
}

fn bad_request() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": MISSING_FIELDS_MESSAGE })),
    )
        .into_response()
}
