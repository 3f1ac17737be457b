mod common;

use std::fs;

use cardledger_core::{
    core::{BillingError, ErrorKind, LedgerManager},
    domain::{Ledger, CURRENT_SCHEMA_VERSION},
    errors::LedgerError,
    storage::{
        json_backend::{load_ledger_from_path, save_ledger_to_path},
        ledger_warnings, JsonStorage, StorageBackend,
    },
};
use common::{at, ym, World};
use tempfile::tempdir;

#[test]
fn committed_state_survives_a_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    let world = World::with_storage(Box::new(JsonStorage::new(&path)), 10_000, 50_000);
    world.open(ym(2024, 3)).unwrap();
    world.purchase(900, 3, at(2024, 3, 9)).unwrap();
    let before = world.manager.snapshot().unwrap();

    let reloaded = LedgerManager::new(Box::new(JsonStorage::new(&path))).unwrap();
    assert_eq!(reloaded.snapshot().unwrap(), before);
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn newer_schema_is_refused() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    let mut ledger = Ledger::new();
    ledger.schema_version = CURRENT_SCHEMA_VERSION + 1;
    save_ledger_to_path(&ledger, &path).unwrap();

    match load_ledger_from_path(&path) {
        Err(LedgerError::UnsupportedSchema(version)) => {
            assert_eq!(version, CURRENT_SCHEMA_VERSION + 1)
        }
        other => panic!("expected schema rejection, got {other:?}"),
    }
}

#[test]
fn missing_fields_default_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    fs::write(&path, r#"{"updated_at":"2024-03-01T00:00:00Z"}"#).unwrap();

    let ledger = load_ledger_from_path(&path).unwrap();
    assert!(ledger.accounts.is_empty());
    assert_eq!(ledger.schema_version, CURRENT_SCHEMA_VERSION);
}

#[test]
fn warnings_flag_broken_allocations() {
    let world = World::new(10_000, 50_000);
    world.open(ym(2024, 3)).unwrap();
    let purchase = world.purchase(1_000, 4, at(2024, 3, 9)).unwrap();

    let mut ledger = world.manager.snapshot().unwrap();
    assert!(ledger_warnings(&ledger).is_empty());

    let index = ledger
        .installments
        .iter()
        .position(|installment| installment.purchase_id == purchase.id)
        .unwrap();
    ledger.installments.remove(index);
    let warnings = ledger_warnings(&ledger);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains(&purchase.id.to_string()));
}

struct BrokenDisk;

impl StorageBackend for BrokenDisk {
    fn load(&self) -> Result<Option<Ledger>, LedgerError> {
        Ok(None)
    }

    fn save(&self, _ledger: &Ledger) -> Result<(), LedgerError> {
        Err(LedgerError::Persistence("disk full".into()))
    }
}

#[test]
fn failed_save_rolls_the_transaction_back() {
    let manager = LedgerManager::new(Box::new(BrokenDisk)).unwrap();
    let result = manager.transaction(|ledger| {
        ledger.accounts.push(cardledger_core::domain::Account::new(
            uuid::Uuid::new_v4(),
            "Wallet",
            cardledger_core::domain::AccountKind::Wallet,
        ));
        Ok(())
    });

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(matches!(err, BillingError::Storage(LedgerError::Persistence(_))));
    assert!(manager.snapshot().unwrap().accounts.is_empty());
}
