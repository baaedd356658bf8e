//! Router setup.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::handlers;
use crate::state::AppState;

/// Build the router: a public liveness route and the protected relay route.
pub fn create_router(state: AppState) -> Router {
    let public = Router::new().route("/", get(handlers::root));

    let protected = Router::new()
        .route("/send", post(handlers::send_message))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    use cipt_pipeline::{MockTransport, SentItem};

    fn app_with(transport: Arc<MockTransport>) -> Router {
        create_router(AppState::new(transport, "secret".to_string()))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_is_public() {
        let app = app_with(Arc::new(MockTransport::new()));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        assert_eq!(&bytes[..], "✅ Bot do CIPT está online!".as_bytes());
    }

    fn send_request(auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/send")
            .header("content-type", "application/json");
        if let Some(value) = auth {
            builder = builder.header("authorization", value);
        }
        builder
            .body(Body::from(
                r#"{"msisdn": "5511999999999", "text": "Ola"}"#,
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_send_requires_auth() {
        let app = app_with(Arc::new(MockTransport::new()));
        let response = app.oneshot(send_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_send_rejects_wrong_token() {
        let app = app_with(Arc::new(MockTransport::new()));
        let response = app
            .oneshot(send_request(Some("Bearer errado")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    struct BrokenTransport;

    #[async_trait::async_trait]
    impl cipt_pipeline::ChatTransport for BrokenTransport {
        async fn send_text(&self, _: &str, _: &str) -> cipt_core::Result<()> {
            Err(cipt_core::CiptError::Transport("falhou".to_string()))
        }
        async fn send_document(&self, _: &str, _: &str, _: &str) -> cipt_core::Result<()> {
            Err(cipt_core::CiptError::Transport("falhou".to_string()))
        }
        async fn send_contact_card(&self, _: &str, _: &str, _: &str) -> cipt_core::Result<()> {
            Err(cipt_core::CiptError::Transport("falhou".to_string()))
        }
    }

    #[tokio::test]
    async fn test_send_transport_failure_is_500_with_erro() {
        let app = create_router(AppState::new(Arc::new(BrokenTransport), "secret".to_string()));
        let response = app
            .oneshot(send_request(Some("Bearer secret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["ok"], false);
        assert!(body["erro"].as_str().unwrap().contains("falhou"));
    }

    #[tokio::test]
    async fn test_send_relays_to_transport() {
        let transport = Arc::new(MockTransport::new());
        let app = app_with(Arc::clone(&transport));
        let response = app
            .oneshot(send_request(Some("Bearer secret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({"ok": true}));
        assert_eq!(
            transport.sent(),
            vec![SentItem::Text {
                chat_id: "5511999999999@s.whatsapp.net".to_string(),
                text: "Ola".to_string(),
            }]
        );
    }
}
