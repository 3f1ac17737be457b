use tracing::info;
use uuid::Uuid;

use crate::core::errors::{BillingError, BillingResult};
use crate::domain::{Account, AccountKind, Cents, Ledger, UserId};

use super::ensure_owned;

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    pub opening_balance_cents: Cents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityFilter {
    #[default]
    Active,
    Inactive,
    All,
}

impl ActivityFilter {
    fn admits(self, is_active: bool) -> bool {
        match self {
            ActivityFilter::Active => is_active,
            ActivityFilter::Inactive => !is_active,
            ActivityFilter::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccountFilter {
    pub status: ActivityFilter,
    pub kind: Option<AccountKind>,
}

/// Thin CRUD over cash-side accounts. Balances change only through
/// `MovementService`.
pub struct AccountService;

impl AccountService {
    pub fn create(ledger: &mut Ledger, owner: UserId, new: NewAccount) -> BillingResult<Account> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(BillingError::InvalidInput("account name is required".into()));
        }
        if new.opening_balance_cents < 0 {
            return Err(BillingError::InvalidInput(
                "initial balance cannot be negative".into(),
            ));
        }
        Self::validate_name(ledger, owner, name)?;

        let account =
            Account::new(owner, name, new.kind).with_balance(new.opening_balance_cents);
        ledger.accounts.push(account.clone());
        info!(account = %account.id, kind = %account.kind, "account created");
        Ok(account)
    }

    /// Owner's accounts in creation order.
    pub fn list<'a>(ledger: &'a Ledger, owner: UserId, filter: AccountFilter) -> Vec<&'a Account> {
        ledger
            .accounts
            .iter()
            .filter(|account| account.owner_id == owner)
            .filter(|account| filter.status.admits(account.is_active))
            .filter(|account| filter.kind.map_or(true, |kind| account.kind == kind))
            .collect()
    }

    /// Idempotent: an account already in the requested state is returned as is.
    pub fn set_active(
        ledger: &mut Ledger,
        owner: UserId,
        id: Uuid,
        is_active: bool,
    ) -> BillingResult<Account> {
        ensure_owned(ledger.account(id), owner, "account", id)?;
        let account = ledger
            .account_mut(id)
            .ok_or_else(|| BillingError::NotFound(format!("account {id} not found")))?;
        if account.is_active != is_active {
            account.is_active = is_active;
            info!(account = %id, is_active, "account activity changed");
        }
        Ok(account.clone())
    }

    pub fn get<'a>(ledger: &'a Ledger, owner: UserId, id: Uuid) -> BillingResult<&'a Account> {
        ensure_owned(ledger.account(id), owner, "account", id)
    }

    /// Case-insensitive lookup among the owner's accounts.
    pub fn find_by_name<'a>(ledger: &'a Ledger, owner: UserId, name: &str) -> Option<&'a Account> {
        let needle = name.trim().to_ascii_lowercase();
        ledger.accounts.iter().find(|account| {
            account.owner_id == owner && account.name.to_ascii_lowercase() == needle
        })
    }

    /// Resolves an account that may fund a payment: owned, active and of a
    /// non-credit kind.
    pub(crate) fn settlement_account<'a>(
        ledger: &'a Ledger,
        owner: UserId,
        id: Uuid,
    ) -> BillingResult<&'a Account> {
        let account = ledger
            .account(id)
            .ok_or_else(|| BillingError::InvalidInput(format!("unknown account {id}")))?;
        if account.owner_id != owner {
            return Err(BillingError::Forbidden(format!(
                "account {id} belongs to another user"
            )));
        }
        if !account.is_active {
            return Err(BillingError::Forbidden(format!("account {id} is inactive")));
        }
        if !account.kind.is_settlement() {
            return Err(BillingError::InvalidInput(
                "payment account must be CASH, BANK or WALLET".into(),
            ));
        }
        Ok(account)
    }

    fn validate_name(ledger: &Ledger, owner: UserId, candidate: &str) -> BillingResult<()> {
        if Self::find_by_name(ledger, owner, candidate).is_some() {
            Err(BillingError::InvalidInput(format!(
                "account `{}` already exists",
                candidate
            )))
        } else {
            Ok(())
        }
    }
}
