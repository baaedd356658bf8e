//! API authentication via bearer tokens.
//!
//! The token comes from the `WHATSAPP_BOT_TOKEN` environment variable when
//! set; otherwise one is generated and persisted next to the binary so
//! restarts keep the same token.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rand::Rng;

use crate::state::AppState;

const TOKEN_ENV: &str = "WHATSAPP_BOT_TOKEN";

/// Generate a random 32-character hex token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}

/// Resolve the API token: environment variable first, then the token file,
/// generating and saving a fresh one as a last resort.
pub fn resolve_token(token_path: &std::path::Path) -> String {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            tracing::info!("API token loaded from {}", TOKEN_ENV);
            return token.trim().to_string();
        }
    }

    if let Ok(contents) = std::fs::read_to_string(token_path) {
        let token = contents.trim().to_string();
        if !token.is_empty() {
            tracing::info!("API token loaded from {}", token_path.display());
            return token;
        }
    }

    let token = generate_token();
    if let Some(parent) = token_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = std::fs::write(token_path, &token) {
        tracing::warn!(error = %e, "Failed to save API token to {}", token_path.display());
    } else {
        // Restrict token file to owner-only access.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(token_path, std::fs::Permissions::from_mode(0o600));
        }
        tracing::info!("API token saved to {}", token_path.display());
    }
    token
}

/// Middleware validating `Authorization: Bearer <token>` against the state.
pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Some(value) = req.headers().get("authorization") {
        if let Ok(value_str) = value.to_str() {
            if let Some(token) = value_str.strip_prefix("Bearer ") {
                if token == state.api_token.as_str() {
                    return next.run(req).await;
                }
            }
        }
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"erro": "token inválido"})),
        )
            .into_response();
    }
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"erro": "cabeçalho Authorization ausente"})),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_resolve_token_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api-token.txt");
        // Test must not depend on the ambient environment.
        std::env::remove_var(TOKEN_ENV);

        let first = resolve_token(&path);
        assert!(!first.is_empty());
        let second = resolve_token(&path);
        assert_eq!(first, second);
    }
}
