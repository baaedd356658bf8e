//! Facility ticket domain: protocol generation, the ledger abstraction, and
//! support-group responder commands.

pub mod command;
pub mod ledger;
pub mod protocol;

pub use command::{extract_protocol, parse_responder_command, ResponderCommand};
pub use ledger::{InMemoryLedger, TicketLedger};
pub use protocol::ProtocolGenerator;
