use thiserror::Error;

/// Error type that captures persistence failures of the ledger snapshot.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Unsupported schema version {0}")]
    UnsupportedSchema(u8),
}
