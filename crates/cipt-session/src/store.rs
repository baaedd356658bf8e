//! Per-chat session store.
//!
//! Keyed by chat id, guarded by a single mutex. Every inbound message
//! touches its session; the sweeper removes sessions that stay quiet past
//! the closing window and hands the expired ids back to the caller.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use cipt_core::types::{BillingDocument, ChatMessage, TicketCategory};

/// A ticket draft awaiting the requester's confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketDraft {
    pub description: String,
    pub category: TicketCategory,
}

/// State of one conversation.
#[derive(Debug)]
pub struct Session {
    history: Vec<ChatMessage>,
    pending_ticket: Option<TicketDraft>,
    pending_billing: Option<Vec<BillingDocument>>,
    contact_sent: bool,
    last_active_at: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            history: Vec::new(),
            pending_ticket: None,
            pending_billing: None,
            contact_sent: false,
            last_active_at: Instant::now(),
        }
    }
}

/// Thread-safe map of chat id to [`Session`].
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    history_limit: usize,
}

impl SessionStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            history_limit,
        }
    }

    /// Create the session if absent and stamp its last activity.
    pub fn touch(&self, chat_id: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions
            .entry(chat_id.to_string())
            .or_insert_with(Session::new)
            .last_active_at = Instant::now();
    }

    /// Remove the session entirely. Returns whether one existed.
    pub fn clear(&self, chat_id: &str) -> bool {
        let removed = self.sessions.lock().unwrap().remove(chat_id).is_some();
        if removed {
            debug!(chat_id, "Session cleared");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().unwrap().is_empty()
    }

    /// Append a message to the chat's history, evicting the oldest entries
    /// beyond the configured limit.
    pub fn push_history(&self, chat_id: &str, message: ChatMessage) {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .entry(chat_id.to_string())
            .or_insert_with(Session::new);
        session.history.push(message);
        if session.history.len() > self.history_limit {
            let excess = session.history.len() - self.history_limit;
            session.history.drain(..excess);
        }
    }

    /// Snapshot of the chat's history, oldest first.
    pub fn history(&self, chat_id: &str) -> Vec<ChatMessage> {
        self.sessions
            .lock()
            .unwrap()
            .get(chat_id)
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }

    pub fn set_pending_ticket(&self, chat_id: &str, draft: TicketDraft) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions
            .entry(chat_id.to_string())
            .or_insert_with(Session::new)
            .pending_ticket = Some(draft);
    }

    /// Whether the chat has a ticket draft awaiting confirmation.
    pub fn has_pending_ticket(&self, chat_id: &str) -> bool {
        self.sessions
            .lock()
            .unwrap()
            .get(chat_id)
            .is_some_and(|s| s.pending_ticket.is_some())
    }

    /// Remove and return the pending ticket draft, if any.
    pub fn take_pending_ticket(&self, chat_id: &str) -> Option<TicketDraft> {
        self.sessions
            .lock()
            .unwrap()
            .get_mut(chat_id)
            .and_then(|s| s.pending_ticket.take())
    }

    pub fn set_pending_billing(&self, chat_id: &str, documents: Vec<BillingDocument>) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions
            .entry(chat_id.to_string())
            .or_insert_with(Session::new)
            .pending_billing = Some(documents);
    }

    pub fn has_pending_billing(&self, chat_id: &str) -> bool {
        self.sessions
            .lock()
            .unwrap()
            .get(chat_id)
            .is_some_and(|s| s.pending_billing.is_some())
    }

    /// Remove and return the billing documents awaiting selection, if any.
    pub fn take_pending_billing(&self, chat_id: &str) -> Option<Vec<BillingDocument>> {
        self.sessions
            .lock()
            .unwrap()
            .get_mut(chat_id)
            .and_then(|s| s.pending_billing.take())
    }

    /// Whether a human-contact card was already sent in this session.
    pub fn contact_sent(&self, chat_id: &str) -> bool {
        self.sessions
            .lock()
            .unwrap()
            .get(chat_id)
            .is_some_and(|s| s.contact_sent)
    }

    pub fn mark_contact_sent(&self, chat_id: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions
            .entry(chat_id.to_string())
            .or_insert_with(Session::new)
            .contact_sent = true;
    }

    /// Remove every session quiet for longer than `idle` and return the
    /// affected chat ids.
    pub fn expire_idle(&self, idle: Duration) -> Vec<String> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().unwrap();
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| now.duration_since(s.last_active_at) >= idle)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            sessions.remove(id);
        }
        expired
    }
}
