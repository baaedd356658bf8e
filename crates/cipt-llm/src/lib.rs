//! Hosted language-model integration for the CIPT assistant.
//!
//! A chat completion client against an OpenAI-compatible API, the ticket
//! intent classifier, the human-handoff classifier, and the answer composer
//! that grounds replies in retrieved knowledge-base context.

pub mod classifier;
pub mod client;
pub mod composer;

pub use classifier::{classify_ticket, needs_human_contact, TicketClassification};
pub use client::{ChatModel, DynChatModel, MockChatModel, RemoteChatModel};
pub use composer::{is_follow_up, AnswerComposer};
