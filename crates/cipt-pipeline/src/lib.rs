//! The message pipeline: everything between an inbound chat message and the
//! assistant's reply.
//!
//! Routing order is fixed: support-group responder commands, pending ticket
//! confirmation, pending billing selection, the ticket classifier gate,
//! greeting and farewell fast paths, the billing keyword gate, and finally
//! retrieval-grounded answer composition.

pub mod handler;
pub mod messages;
pub mod transport;

pub use handler::{IncomingMessage, MessagePipeline};
pub use transport::{ChatTransport, MockTransport, SentItem};
