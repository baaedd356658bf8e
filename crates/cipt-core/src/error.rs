use thiserror::Error;

/// Top-level error type for the CIPT assistant.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates build
/// these variants directly (or via `From` impls) so the `?` operator works
/// across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CiptError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Knowledge base error: {0}")]
    Knowledge(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Ticket ledger error: {0}")]
    Ledger(String),

    #[error("Billing API error: {0}")]
    Billing(String),

    #[error("MSISDN {0} is not associated with any account")]
    MsisdnNotAssociated(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for CiptError {
    fn from(err: toml::de::Error) -> Self {
        CiptError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CiptError {
    fn from(err: serde_json::Error) -> Self {
        CiptError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for CIPT assistant operations.
pub type Result<T> = std::result::Result<T, CiptError>;
