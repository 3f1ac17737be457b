use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use crate::{
    core::utils::{write_atomic, PathResolver},
    domain::{Cents, Ledger, CURRENT_SCHEMA_VERSION},
    errors::LedgerError,
};

use super::{Result, StorageBackend};

/// Stores the whole ledger as one pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at `ledger.json` inside the resolved data directory.
    pub fn in_dir(base: Option<PathBuf>) -> Self {
        let base = PathResolver::resolve_base(base);
        Self::new(PathResolver::ledger_file_in(&base))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for JsonStorage {
    fn load(&self) -> Result<Option<Ledger>> {
        if !self.path.exists() {
            return Ok(None);
        }
        load_ledger_from_path(&self.path).map(Some)
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        save_ledger_to_path(ledger, &self.path)
    }
}

/// Writes the provided ledger to disk atomically by staging to a temporary file.
pub fn save_ledger_to_path(ledger: &Ledger, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(ledger)?;
    write_atomic(path, &json)?;
    Ok(())
}

/// Loads a ledger snapshot from disk, refusing snapshots written by a newer schema.
pub fn load_ledger_from_path(path: &Path) -> Result<Ledger> {
    let data = fs::read_to_string(path)?;
    let ledger: Ledger = serde_json::from_str(&data)?;
    if ledger.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(LedgerError::UnsupportedSchema(ledger.schema_version));
    }
    Ok(ledger)
}

/// Detects dangling references and broken allocation invariants in a snapshot.
pub fn ledger_warnings(ledger: &Ledger) -> Vec<String> {
    let account_ids: HashSet<_> = ledger.accounts.iter().map(|a| a.id).collect();
    let card_ids: HashSet<_> = ledger.credit_cards.iter().map(|c| c.id).collect();
    let statement_ids: HashSet<_> = ledger.statements.iter().map(|s| s.id).collect();
    let mut warnings = Vec::new();

    for movement in &ledger.movements {
        if !account_ids.contains(&movement.account_id) {
            warnings.push(format!(
                "movement {} references unknown account {}",
                movement.id, movement.account_id
            ));
        }
    }
    for card in &ledger.credit_cards {
        if !account_ids.contains(&card.settlement_account_id) {
            warnings.push(format!(
                "card {} references unknown settlement account {}",
                card.id, card.settlement_account_id
            ));
        }
    }

    let mut sums: HashMap<_, Cents> = HashMap::new();
    for installment in &ledger.installments {
        *sums.entry(installment.purchase_id).or_default() += installment.amount_cents;
        if let Some(statement) = installment.statement_id {
            if !statement_ids.contains(&statement) {
                warnings.push(format!(
                    "installment {} references missing statement {}",
                    installment.id, statement
                ));
            }
        }
    }
    for purchase in ledger.purchases.iter().filter(|p| !p.is_deleted) {
        if !card_ids.contains(&purchase.card_id) {
            warnings.push(format!(
                "purchase {} references unknown card {}",
                purchase.id, purchase.card_id
            ));
        }
        let allocated = sums.get(&purchase.id).copied().unwrap_or_default();
        if allocated != purchase.total_amount_cents {
            warnings.push(format!(
                "purchase {} allocates {} of {} cents",
                purchase.id, allocated, purchase.total_amount_cents
            ));
        }
    }
    warnings
}
