//! Ticket ledger abstraction.
//!
//! The ledger is an external collaborator (a spreadsheet in production).
//! The trait captures the three operations the assistant needs; the
//! in-memory implementation backs tests and local runs.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use cipt_core::error::Result;
use cipt_core::types::{Ticket, TicketStatus};

/// Persistent record of facility tickets.
#[async_trait]
pub trait TicketLedger: Send + Sync {
    /// Append a newly confirmed ticket.
    async fn append(&self, ticket: &Ticket) -> Result<()>;

    /// Update a ticket's status and record the responder.
    ///
    /// Returns the originating chat id when the protocol is known, `None`
    /// otherwise.
    async fn update_status(
        &self,
        protocol: &str,
        status: TicketStatus,
        responder: &str,
    ) -> Result<Option<String>>;

    /// Tickets that are neither concluded nor rejected.
    async fn open_tickets(&self) -> Result<Vec<Ticket>>;
}

/// Ledger kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    tickets: Mutex<Vec<Ticket>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tickets.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.lock().unwrap().is_empty()
    }

    /// Snapshot of every ticket, in append order.
    pub fn all(&self) -> Vec<Ticket> {
        self.tickets.lock().unwrap().clone()
    }
}

#[async_trait]
impl TicketLedger for InMemoryLedger {
    async fn append(&self, ticket: &Ticket) -> Result<()> {
        info!(protocol = %ticket.protocol, category = %ticket.category, "Ticket appended");
        self.tickets.lock().unwrap().push(ticket.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        protocol: &str,
        status: TicketStatus,
        responder: &str,
    ) -> Result<Option<String>> {
        let mut tickets = self.tickets.lock().unwrap();
        match tickets.iter_mut().find(|t| t.protocol == protocol) {
            Some(ticket) => {
                ticket.status = status;
                ticket.assigned_responder = Some(responder.to_string());
                info!(protocol, status = %status, responder, "Ticket status updated");
                Ok(Some(ticket.origin_chat_id.clone()))
            }
            None => Ok(None),
        }
    }

    async fn open_tickets(&self) -> Result<Vec<Ticket>> {
        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.status.is_open())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cipt_core::types::TicketCategory;

    fn ticket(protocol: &str, status: TicketStatus) -> Ticket {
        Ticket {
            id: uuid::Uuid::new_v4(),
            protocol: protocol.to_string(),
            requester_name: "Maria".to_string(),
            requester_phone: "5582999990000".to_string(),
            description: "internet caiu no 3º andar".to_string(),
            category: TicketCategory::InternetRede,
            status,
            origin_chat_id: "5582999990000@s.whatsapp.net".to_string(),
            assigned_responder: None,
            opened_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_and_list() {
        let ledger = InMemoryLedger::new();
        ledger.append(&ticket("CH-00001", TicketStatus::Aberto)).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.all()[0].protocol, "CH-00001");
    }

    #[tokio::test]
    async fn test_update_status_returns_origin_chat() {
        let ledger = InMemoryLedger::new();
        ledger.append(&ticket("CH-00002", TicketStatus::Aberto)).await.unwrap();

        let origin = ledger
            .update_status("CH-00002", TicketStatus::EmAtendimento, "João")
            .await
            .unwrap();
        assert_eq!(origin.as_deref(), Some("5582999990000@s.whatsapp.net"));

        let stored = &ledger.all()[0];
        assert_eq!(stored.status, TicketStatus::EmAtendimento);
        assert_eq!(stored.assigned_responder.as_deref(), Some("João"));
    }

    #[tokio::test]
    async fn test_update_unknown_protocol_is_none() {
        let ledger = InMemoryLedger::new();
        let origin = ledger
            .update_status("CH-99999", TicketStatus::Concluido, "João")
            .await
            .unwrap();
        assert_eq!(origin, None);
    }

    #[tokio::test]
    async fn test_open_tickets_excludes_closed() {
        let ledger = InMemoryLedger::new();
        ledger.append(&ticket("CH-00003", TicketStatus::Aberto)).await.unwrap();
        ledger.append(&ticket("CH-00004", TicketStatus::Concluido)).await.unwrap();
        ledger.append(&ticket("CH-00005", TicketStatus::EmAtendimento)).await.unwrap();
        ledger.append(&ticket("CH-00006", TicketStatus::Rejeitado)).await.unwrap();

        let open = ledger.open_tickets().await.unwrap();
        let protocols: Vec<&str> = open.iter().map(|t| t.protocol.as_str()).collect();
        assert_eq!(protocols, vec!["CH-00003", "CH-00005"]);
    }
}
