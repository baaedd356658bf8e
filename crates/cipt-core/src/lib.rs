//! Core types, configuration, and errors shared by all CIPT assistant crates.

pub mod config;
pub mod error;
pub mod types;

pub use error::{CiptError, Result};
