//! Ticket protocol numbers.
//!
//! Protocols look like `CH-48291`: the prefix plus the last five digits of
//! the epoch-millisecond clock. Two tickets confirmed within the same
//! millisecond would collide, so the generator tracks what it has issued and
//! nudges the suffix forward until it finds a free one.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::Utc;

const PREFIX: &str = "CH-";
const SUFFIX_MOD: i64 = 100_000;

/// Issues protocol strings unique within this process run.
#[derive(Debug, Default)]
pub struct ProtocolGenerator {
    issued: Mutex<HashSet<String>>,
}

impl ProtocolGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next free protocol.
    pub fn generate(&self) -> String {
        let mut issued = self.issued.lock().unwrap();
        let mut suffix = Utc::now().timestamp_millis() % SUFFIX_MOD;
        loop {
            let candidate = format!("{}{:05}", PREFIX, suffix);
            if issued.insert(candidate.clone()) {
                return candidate;
            }
            suffix = (suffix + 1) % SUFFIX_MOD;
        }
    }
}
