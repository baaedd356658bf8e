//! Shared domain types for the CIPT assistant.
//!
//! Chat messages, facility ticket categories and lifecycle, and billing
//! document (DAR) records exchanged with the billing API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a chat message in a conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single message in a conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Facility support categories a ticket can be filed under.
///
/// Labels are the exact strings the classifier is instructed to emit and the
/// ledger stores, so `label`/`from_label` must stay in sync with the
/// classifier instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketCategory {
    InternetRede,
    EnergiaEletrica,
    Limpeza,
    ManutencaoCivil,
    SegurancaPortaria,
    Elevadores,
    Hidraulica,
    EquipamentosMoveis,
    Administrativo,
}

impl TicketCategory {
    /// All categories, in the order presented to the classifier.
    pub const ALL: [TicketCategory; 9] = [
        TicketCategory::InternetRede,
        TicketCategory::EnergiaEletrica,
        TicketCategory::Limpeza,
        TicketCategory::ManutencaoCivil,
        TicketCategory::SegurancaPortaria,
        TicketCategory::Elevadores,
        TicketCategory::Hidraulica,
        TicketCategory::EquipamentosMoveis,
        TicketCategory::Administrativo,
    ];

    /// Human-readable label used in classifier output and ledger rows.
    pub fn label(&self) -> &'static str {
        match self {
            TicketCategory::InternetRede => "Internet e Rede",
            TicketCategory::EnergiaEletrica => "Energia Elétrica",
            TicketCategory::Limpeza => "Limpeza",
            TicketCategory::ManutencaoCivil => "Manutenção Civil",
            TicketCategory::SegurancaPortaria => "Segurança e Portaria",
            TicketCategory::Elevadores => "Elevadores",
            TicketCategory::Hidraulica => "Hidráulica / Vazamentos",
            TicketCategory::EquipamentosMoveis => "Equipamentos / Móveis",
            TicketCategory::Administrativo => "Administrativo / Outros",
        }
    }

    /// Parse a classifier-emitted label back into a category.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.label() == label.trim())
    }
}

impl std::fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle status of a facility ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Aberto,
    EmAtendimento,
    Concluido,
    Rejeitado,
}

impl TicketStatus {
    /// Ledger label for the status.
    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::Aberto => "Aberto",
            TicketStatus::EmAtendimento => "Em Atendimento",
            TicketStatus::Concluido => "Concluído",
            TicketStatus::Rejeitado => "Rejeitado",
        }
    }

    /// Emoji used in status-change notifications.
    pub fn emoji(&self) -> &'static str {
        match self {
            TicketStatus::Aberto => "🆕",
            TicketStatus::EmAtendimento => "📌",
            TicketStatus::Concluido => "✅",
            TicketStatus::Rejeitado => "❌",
        }
    }

    /// A ticket is open while it is neither concluded nor rejected.
    pub fn is_open(&self) -> bool {
        !matches!(self, TicketStatus::Concluido | TicketStatus::Rejeitado)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A facility support ticket as written to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    /// Protocol string quoted by responders, e.g. `CH-48291`.
    pub protocol: String,
    pub requester_name: String,
    pub requester_phone: String,
    pub description: String,
    pub category: TicketCategory,
    pub status: TicketStatus,
    /// Chat that opened the ticket, used for status-change notifications.
    pub origin_chat_id: String,
    /// Responder who last changed the status, if any.
    pub assigned_responder: Option<String>,
    pub opened_at: DateTime<Utc>,
}

/// A billing document (DAR) listed by the billing API. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingDocument {
    pub id: String,
    pub competence_month: u32,
    pub competence_year: i32,
    /// Due date as reported by the API, e.g. `2024-07-10`.
    pub due_date: String,
    pub amount: f64,
}

impl BillingDocument {
    /// Competence formatted as `MM/YYYY` for display.
    pub fn competence(&self) -> String {
        format!("{:02}/{}", self.competence_month, self.competence_year)
    }
}

/// The payable form of a billing document returned by the emit endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmittedDocument {
    pub payment_line: String,
    pub pdf_url: Option<String>,
    /// Competence formatted as `MM/YYYY`.
    pub competence: String,
    pub due_date: String,
    pub amount: f64,
}
