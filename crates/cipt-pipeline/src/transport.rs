//! Outbound messaging abstraction.
//!
//! The messaging integration itself lives outside this codebase; the
//! pipeline only needs these three sends. The contact-card fallback is
//! implemented here because it is transport policy, not conversation logic.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::warn;

use cipt_core::error::{CiptError, Result};

/// Outbound channel to the chat service.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send plain text to a chat.
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()>;

    /// Send a document by URL with a caption.
    async fn send_document(&self, chat_id: &str, url: &str, caption: &str) -> Result<()>;

    /// Send a contact card (vCard).
    async fn send_contact_card(&self, chat_id: &str, name: &str, phone: &str) -> Result<()>;
}

/// Send a contact card, falling back to a plain-text contact line when the
/// card fails.
pub async fn send_contact_with_fallback(
    transport: &dyn ChatTransport,
    chat_id: &str,
    name: &str,
    phone: &str,
) -> Result<()> {
    if let Err(e) = transport.send_contact_card(chat_id, name, phone).await {
        warn!(chat_id, error = %e, "vCard send failed, falling back to text");
        return transport
            .send_text(chat_id, &format!("📞 Contato de {}: +{}", name, phone))
            .await;
    }
    Ok(())
}

/// One outbound item recorded by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentItem {
    Text { chat_id: String, text: String },
    Document { chat_id: String, url: String, caption: String },
    ContactCard { chat_id: String, name: String, phone: String },
}

/// Transport double that records sends and can be told to fail vCards.
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<SentItem>>,
    fail_contact_cards: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose vCard sends always fail, to exercise the fallback.
    pub fn failing_contact_cards() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_contact_cards: true,
        }
    }

    pub fn sent(&self) -> Vec<SentItem> {
        self.sent.lock().unwrap().clone()
    }

    /// Text messages sent to the given chat, in order.
    pub fn texts_to(&self, chat_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|item| match item {
                SentItem::Text { chat_id: c, text } if c == chat_id => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(SentItem::Text {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_document(&self, chat_id: &str, url: &str, caption: &str) -> Result<()> {
        self.sent.lock().unwrap().push(SentItem::Document {
            chat_id: chat_id.to_string(),
            url: url.to_string(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn send_contact_card(&self, chat_id: &str, name: &str, phone: &str) -> Result<()> {
        if self.fail_contact_cards {
            return Err(CiptError::Transport("vCard rejected".to_string()));
        }
        self.sent.lock().unwrap().push(SentItem::ContactCard {
            chat_id: chat_id.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
        });
        Ok(())
    }
}
