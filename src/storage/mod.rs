pub mod json_backend;

use crate::{domain::Ledger, errors::LedgerError};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Abstraction over persistence backends capable of storing ledger snapshots.
pub trait StorageBackend: Send + Sync {
    /// Returns `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Ledger>>;
    fn save(&self, ledger: &Ledger) -> Result<()>;
}

/// Backend that keeps nothing; the ledger lives only in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStorage;

impl StorageBackend for MemoryStorage {
    fn load(&self) -> Result<Option<Ledger>> {
        Ok(None)
    }

    fn save(&self, _ledger: &Ledger) -> Result<()> {
        Ok(())
    }
}

pub use json_backend::{ledger_warnings, JsonStorage};
