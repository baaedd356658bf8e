//! Route handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};

use crate::state::AppState;

/// `GET /` - liveness probe.
pub async fn root() -> &'static str {
    "✅ Bot do CIPT está online!"
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub msisdn: String,
    pub text: String,
}

/// `POST /send` - relay a text message to a phone number.
pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> impl IntoResponse {
    let chat_id = format!("{}@s.whatsapp.net", request.msisdn);
    match state.transport.send_text(&chat_id, &request.text).await {
        Ok(()) => {
            info!(msisdn = %request.msisdn, "Message relayed");
            (StatusCode::OK, Json(serde_json::json!({"ok": true})))
        }
        Err(e) => {
            warn!(msisdn = %request.msisdn, error = %e, "Message relay failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"ok": false, "erro": e.to_string()})),
            )
        }
    }
}
