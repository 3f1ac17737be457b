use uuid::Uuid;

use super::Fixture;
use crate::core::errors::ErrorKind;
use crate::core::services::{AccountFilter, AccountService, ActivityFilter, NewAccount};
use crate::domain::{AccountKind, Ledger};

fn new_account(name: &str, kind: AccountKind, balance: i64) -> NewAccount {
    NewAccount {
        name: name.into(),
        kind,
        opening_balance_cents: balance,
    }
}

#[test]
fn create_account_keeps_opening_balance() {
    let mut ledger = Ledger::new();
    let owner = Uuid::new_v4();

    let account =
        AccountService::create(&mut ledger, owner, new_account("Cash", AccountKind::Cash, 2_500))
            .unwrap();

    assert_eq!(ledger.accounts.len(), 1);
    assert_eq!(account.current_balance_cents, 2_500);
    assert!(account.is_active);
}

#[test]
fn negative_opening_balance_is_rejected() {
    let mut ledger = Ledger::new();
    let err = AccountService::create(
        &mut ledger,
        Uuid::new_v4(),
        new_account("Cash", AccountKind::Cash, -1),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn duplicate_name_is_rejected_per_owner() {
    let mut ledger = Ledger::new();
    let owner = Uuid::new_v4();
    AccountService::create(&mut ledger, owner, new_account("Wallet", AccountKind::Wallet, 0))
        .unwrap();

    let err =
        AccountService::create(&mut ledger, owner, new_account("wallet", AccountKind::Cash, 0))
            .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    AccountService::create(
        &mut ledger,
        Uuid::new_v4(),
        new_account("Wallet", AccountKind::Wallet, 0),
    )
    .unwrap();
}

#[test]
fn list_filters_by_status_and_kind() {
    let mut fx = Fixture::new();
    let cash = AccountService::create(
        &mut fx.ledger,
        fx.owner,
        new_account("Cash", AccountKind::Cash, 0),
    )
    .unwrap();
    AccountService::set_active(&mut fx.ledger, fx.owner, cash.id, false).unwrap();

    let active = AccountService::list(&fx.ledger, fx.owner, AccountFilter::default());
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, fx.account_id);

    let inactive = AccountService::list(
        &fx.ledger,
        fx.owner,
        AccountFilter {
            status: ActivityFilter::Inactive,
            kind: None,
        },
    );
    assert_eq!(inactive[0].id, cash.id);

    let banks = AccountService::list(
        &fx.ledger,
        fx.owner,
        AccountFilter {
            status: ActivityFilter::All,
            kind: Some(AccountKind::Bank),
        },
    );
    assert_eq!(banks.len(), 1);
}

#[test]
fn set_active_is_idempotent_and_owner_checked() {
    let mut fx = Fixture::new();
    let first = AccountService::set_active(&mut fx.ledger, fx.owner, fx.account_id, true).unwrap();
    assert!(first.is_active);

    let err = AccountService::set_active(&mut fx.ledger, Uuid::new_v4(), fx.account_id, false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = AccountService::set_active(&mut fx.ledger, fx.owner, Uuid::new_v4(), false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn credit_accounts_cannot_settle_payments() {
    let mut fx = Fixture::new();
    let credit = AccountService::create(
        &mut fx.ledger,
        fx.owner,
        new_account("Card mirror", AccountKind::CreditCard, 0),
    )
    .unwrap();

    let err = AccountService::settlement_account(&fx.ledger, fx.owner, credit.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(AccountService::settlement_account(&fx.ledger, fx.owner, fx.account_id).is_ok());
}
