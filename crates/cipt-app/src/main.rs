//! CIPT assistant binary - composition root.
//!
//! Ties the crates together into a single executable:
//! 1. Load configuration from TOML
//! 2. Build or load the knowledge base (embedding cache)
//! 3. Wire the message pipeline (sessions, classifiers, ledger, billing)
//! 4. Start the session sweeper and the expiry-notice drain task
//! 5. Start the axum control surface
//!
//! The messaging integration is attached from the outside: this binary
//! exposes the pipeline and transport seams, and `LoggingTransport` stands
//! in until a real transport is wired.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use cipt_api::{auth, create_router, AppState};
use cipt_billing::{BillingService, HttpBillingApi};
use cipt_core::config::CiptConfig;
use cipt_knowledge::{KnowledgeStore, RemoteEmbeddingService, Retriever};
use cipt_llm::{AnswerComposer, RemoteChatModel};
use cipt_pipeline::{ChatTransport, MessagePipeline};
use cipt_session::{SessionStore, SessionSweeper};
use cipt_ticket::{InMemoryLedger, TicketLedger};

/// Transport stand-in that logs every outbound item.
struct LoggingTransport;

#[async_trait]
impl ChatTransport for LoggingTransport {
    async fn send_text(&self, chat_id: &str, text: &str) -> cipt_core::Result<()> {
        tracing::info!(chat_id, text, "Outbound text (no transport attached)");
        Ok(())
    }

    async fn send_document(&self, chat_id: &str, url: &str, caption: &str) -> cipt_core::Result<()> {
        tracing::info!(chat_id, url, caption, "Outbound document (no transport attached)");
        Ok(())
    }

    async fn send_contact_card(&self, chat_id: &str, name: &str, phone: &str) -> cipt_core::Result<()> {
        tracing::info!(chat_id, name, phone, "Outbound contact card (no transport attached)");
        Ok(())
    }
}

/// Resolve the config file path (`CIPT_CONFIG` env, or `cipt.toml`).
fn config_path() -> PathBuf {
    std::env::var("CIPT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("cipt.toml"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_file = config_path();
    let config = CiptConfig::load_or_default(&config_file);

    // Tracing: RUST_LOG wins, then the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!(
        path = %config_file.display(),
        "Starting CIPT assistant v{}",
        env!("CARGO_PKG_VERSION")
    );

    let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; hosted model calls will fail");
    }

    // Knowledge base: build-or-load, degrading to an empty store so the
    // assistant still handles tickets and billing when sources are missing.
    let embedder = RemoteEmbeddingService::new(
        &config.llm.api_base,
        &api_key,
        &config.llm.embedding_model,
    );
    let store = match KnowledgeStore::build_or_load(&config.knowledge, &embedder).await {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(error = %e, "Knowledge base unavailable, starting with empty store");
            KnowledgeStore::empty()
        }
    };
    let retriever = Arc::new(Retriever::new(
        Arc::new(store),
        Box::new(embedder),
        config.retrieval.relevance_threshold,
        config.retrieval.max_chunks,
    ));

    let chat_model = RemoteChatModel::new(&config.llm.api_base, &api_key, &config.llm.chat_model);
    let composer = AnswerComposer::new(
        Box::new(chat_model.clone()),
        config.llm.temperature,
        config.llm.max_answer_tokens,
    );

    let sessions = Arc::new(SessionStore::new(config.session.history_limit));
    let ledger: Arc<dyn TicketLedger> = Arc::new(InMemoryLedger::new());
    let transport: Arc<dyn ChatTransport> = Arc::new(LoggingTransport);

    let billing = if config.billing.base_url.is_empty() {
        tracing::info!("Billing flow disabled (no base URL configured)");
        None
    } else {
        Some(BillingService::new(Arc::new(HttpBillingApi::new(
            &config.billing.base_url,
        ))))
    };

    let message_log_path = (!config.general.message_log_path.is_empty())
        .then(|| PathBuf::from(&config.general.message_log_path));

    let pipeline = Arc::new(MessagePipeline::new(
        Arc::clone(&sessions),
        retriever,
        composer,
        Box::new(chat_model),
        ledger,
        billing,
        Arc::clone(&transport),
        config.routing.clone(),
        message_log_path,
    ));

    // Sweeper: expired chat ids flow back through the pipeline as closing
    // notices.
    let sweeper = SessionSweeper::new(
        Arc::clone(&sessions),
        Duration::from_secs(config.session.idle_close_secs),
        Duration::from_secs(config.session.sweep_interval_secs),
    );
    let sweeper_shutdown = sweeper.shutdown_handle();
    let (expired_tx, mut expired_rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(sweeper.run(expired_tx));

    let closer = Arc::clone(&pipeline);
    tokio::spawn(async move {
        while let Some(chat_id) = expired_rx.recv().await {
            if let Err(e) = closer.notify_session_closed(&chat_id).await {
                tracing::warn!(chat_id, error = %e, "Failed to send closing notice");
            }
        }
    });

    // HTTP control surface.
    let token = auth::resolve_token(std::path::Path::new("api-token.txt"));
    let state = AppState::new(Arc::clone(&transport), token);
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.general.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP control surface listening");
    let served = axum::serve(listener, router).await;
    sweeper_shutdown.notify_one();
    served?;
    Ok(())
}
