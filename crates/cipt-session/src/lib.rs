//! In-memory conversation state for the CIPT assistant.
//!
//! One session per chat id, holding the bounded message history and any
//! pending interaction state (ticket draft awaiting confirmation, billing
//! documents awaiting selection). Sessions live only in memory; a restart
//! starts every conversation fresh.

pub mod store;
pub mod sweeper;

pub use store::{Session, SessionStore, TicketDraft};
pub use sweeper::SessionSweeper;
