use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::core::clock::{Clock, SystemClock};
use crate::core::errors::{BillingError, BillingResult};
use crate::domain::Ledger;
use crate::errors::LedgerError;
use crate::storage::{ledger_warnings, MemoryStorage, StorageBackend};

/// Facade that owns the ledger state and provides the atomic-transaction API.
///
/// Every mutating operation runs under the single ledger lock, so two
/// transactions touching the same card or account are always serialized and
/// re-read committed state.
pub struct LedgerManager {
    state: Mutex<Ledger>,
    storage: Box<dyn StorageBackend>,
    clock: Box<dyn Clock>,
}

impl LedgerManager {
    /// Loads the stored snapshot (or starts empty) from `storage`.
    pub fn new(storage: Box<dyn StorageBackend>) -> Result<Self, LedgerError> {
        let ledger = match storage.load()? {
            Some(ledger) => {
                for warning in ledger_warnings(&ledger) {
                    warn!(%warning, "ledger snapshot inconsistency");
                }
                ledger
            }
            None => Ledger::new(),
        };
        Ok(Self {
            state: Mutex::new(ledger),
            storage,
            clock: Box::new(SystemClock),
        })
    }

    /// Manager with no persistence behind it.
    pub fn in_memory() -> Self {
        Self::from_ledger(Ledger::new())
    }

    pub fn from_ledger(ledger: Ledger) -> Self {
        Self {
            state: Mutex::new(ledger),
            storage: Box::new(MemoryStorage),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn lock(&self) -> BillingResult<MutexGuard<'_, Ledger>> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Persistence("ledger lock poisoned".into()).into())
    }

    /// Runs `operation` as one atomic unit.
    ///
    /// On error the ledger is restored to the state it had before the call;
    /// on success the new state is persisted, and a failed save also rolls
    /// the in-memory state back.
    pub fn transaction<T, F>(&self, operation: F) -> BillingResult<T>
    where
        F: FnOnce(&mut Ledger) -> BillingResult<T>,
    {
        let mut guard = self.lock()?;
        let snapshot = guard.clone();
        match operation(&mut *guard) {
            Ok(value) => {
                guard.touch();
                if let Err(err) = self.storage.save(&*guard) {
                    warn!(error = %err, "persisting transaction failed; rolling back");
                    *guard = snapshot;
                    return Err(BillingError::Storage(err));
                }
                debug!("transaction committed");
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "transaction rolled back");
                *guard = snapshot;
                Err(err)
            }
        }
    }

    /// Lock-guarded read access for queries.
    pub fn read<T, F>(&self, query: F) -> BillingResult<T>
    where
        F: FnOnce(&Ledger) -> BillingResult<T>,
    {
        let guard = self.lock()?;
        query(&*guard)
    }

    /// Clone of the current committed state.
    pub fn snapshot(&self) -> BillingResult<Ledger> {
        self.read(|ledger| Ok(ledger.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, AccountKind};
    use uuid::Uuid;

    #[test]
    fn failed_transaction_leaves_no_partial_write() {
        let manager = LedgerManager::in_memory();
        let owner = Uuid::new_v4();

        let result: BillingResult<()> = manager.transaction(|ledger| {
            ledger
                .accounts
                .push(Account::new(owner, "Checking", AccountKind::Bank));
            Err(BillingError::InvalidInput("abort".into()))
        });

        assert!(result.is_err());
        assert!(manager.snapshot().unwrap().accounts.is_empty());
    }

    #[test]
    fn committed_transaction_is_visible_to_readers() {
        let manager = LedgerManager::in_memory();
        let owner = Uuid::new_v4();
        let id = manager
            .transaction(|ledger| {
                let account = Account::new(owner, "Wallet", AccountKind::Wallet);
                let id = account.id;
                ledger.accounts.push(account);
                Ok(id)
            })
            .unwrap();

        let found = manager
            .read(|ledger| Ok(ledger.account(id).is_some()))
            .unwrap();
        assert!(found);
    }
}
