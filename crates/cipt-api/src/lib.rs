//! HTTP control surface for the CIPT assistant.
//!
//! A liveness probe and a bearer-token protected relay endpoint that lets
//! other internal systems push messages through the assistant's transport.

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
