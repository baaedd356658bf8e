//! Billing document (DAR) lookup for the CIPT assistant.
//!
//! The assistant relays between the tenant and the billing API: list the
//! unpaid documents for the sender's phone number, let them pick one by
//! index, and emit the payable form. DAR is the state revenue payment slip
//! (Documento de Arrecadação).

pub mod client;
pub mod format;
pub mod keywords;
pub mod msisdn;
pub mod service;

pub use client::{BillingApi, HttpBillingApi, MockBillingApi};
pub use format::{format_document_list, format_emitted};
pub use keywords::{mentions_billing, mentions_current, mentions_overdue, narrow_documents};
pub use msisdn::adjust_msisdn;
pub use service::BillingService;
