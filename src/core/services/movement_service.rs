//! Cash ledger: movements and the running account balances they drive.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::core::errors::{BillingError, BillingResult};
use crate::domain::{Cents, Ledger, Movement, MovementKind, UserId};

use super::{clean_text, ensure_owned, ensure_positive, CategoryService};

#[derive(Debug, Clone)]
pub struct NewMovement {
    pub account_id: Uuid,
    pub category_id: Option<Uuid>,
    pub kind: MovementKind,
    pub amount_cents: Cents,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
}

/// Partial update. The nested options distinguish "leave unchanged" from
/// "clear".
#[derive(Debug, Clone, Default)]
pub struct MovementPatch {
    pub account_id: Option<Uuid>,
    pub category_id: Option<Option<Uuid>>,
    pub kind: Option<MovementKind>,
    pub amount_cents: Option<Cents>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct MovementQuery {
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub kind: Option<MovementKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for MovementQuery {
    fn default() -> Self {
        Self {
            account_id: None,
            category_id: None,
            kind: None,
            from: None,
            to: None,
            page: 1,
            page_size: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub page: u32,
    pub page_size: u32,
    pub total: usize,
    pub total_pages: usize,
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryQuery {
    pub account_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MovementSummary {
    pub total_income_cents: Cents,
    pub total_expense_cents: Cents,
    pub net_balance_cents: Cents,
    pub movements_count: usize,
}

fn within(instant: DateTime<Utc>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    from.map_or(true, |from| instant >= from) && to.map_or(true, |to| instant <= to)
}

fn insufficient(balance_cents: Cents, kind: MovementKind, amount: Cents) -> BillingError {
    let required_cents = match kind {
        MovementKind::Expense => amount,
        MovementKind::Income => balance_cents.saturating_add(amount),
    };
    BillingError::InsufficientFunds {
        balance_cents,
        required_cents,
    }
}

pub struct MovementService;

impl MovementService {
    /// Records a movement and applies it to the account balance.
    pub fn create(ledger: &mut Ledger, owner: UserId, new: NewMovement) -> BillingResult<Movement> {
        ensure_positive(new.amount_cents, "amount")?;
        if let Some(category_id) = new.category_id {
            CategoryService::visible_category(ledger, owner, category_id)?;
        }
        let movement = Self::post(ledger, owner, new)?;
        info!(
            movement = %movement.id,
            account = %movement.account_id,
            kind = %movement.kind,
            amount = movement.amount_cents,
            "movement recorded"
        );
        Ok(movement)
    }

    /// Shared write path for every balance-changing movement, including
    /// statement settlements: validates the account, refuses a negative
    /// balance, stores the snapshot and updates the account exactly once.
    pub(crate) fn post(
        ledger: &mut Ledger,
        owner: UserId,
        new: NewMovement,
    ) -> BillingResult<Movement> {
        let account = ensure_owned(ledger.account(new.account_id), owner, "account", new.account_id)?;
        if !account.is_active {
            return Err(BillingError::Forbidden(format!(
                "account {} is inactive",
                account.id
            )));
        }
        let balance = account.current_balance_cents;
        let new_balance = new
            .kind
            .apply(balance, new.amount_cents)
            .ok_or_else(|| BillingError::overflow("account balance"))?;
        if new_balance < 0 {
            return Err(insufficient(balance, new.kind, new.amount_cents));
        }

        let movement = Movement {
            id: Uuid::new_v4(),
            owner_id: owner,
            account_id: new.account_id,
            category_id: new.category_id,
            kind: new.kind,
            amount_cents: new.amount_cents,
            occurred_at: new.occurred_at,
            description: clean_text(new.description),
            balance_snapshot_cents: new_balance,
            is_deleted: false,
        };
        ledger.movements.push(movement.clone());
        if let Some(account) = ledger.account_mut(new.account_id) {
            account.current_balance_cents = new_balance;
        }
        Ok(movement)
    }

    /// Reverts the original effect and applies the patched movement, possibly
    /// on a different account. Both balances must stay non-negative.
    pub fn update(
        ledger: &mut Ledger,
        owner: UserId,
        id: Uuid,
        patch: MovementPatch,
    ) -> BillingResult<Movement> {
        let original = Self::get(ledger, owner, id)?.clone();

        let next_account_id = patch.account_id.unwrap_or(original.account_id);
        let next_kind = patch.kind.unwrap_or(original.kind);
        let next_amount = patch.amount_cents.unwrap_or(original.amount_cents);
        let next_category = patch.category_id.unwrap_or(original.category_id);
        ensure_positive(next_amount, "amount")?;
        if let Some(category_id) = next_category {
            CategoryService::visible_category(ledger, owner, category_id)?;
        }

        let original_account =
            ensure_owned(ledger.account(original.account_id), owner, "account", original.account_id)?;
        let reverted = original
            .kind
            .revert(original_account.current_balance_cents, original.amount_cents)
            .ok_or_else(|| BillingError::overflow("account balance"))?;
        if reverted < 0 {
            return Err(BillingError::InsufficientFunds {
                balance_cents: original_account.current_balance_cents,
                required_cents: original.amount_cents,
            });
        }

        let next_account =
            ensure_owned(ledger.account(next_account_id), owner, "account", next_account_id)?;
        if !next_account.is_active {
            return Err(BillingError::Forbidden(format!(
                "account {next_account_id} is inactive"
            )));
        }
        let base = if next_account_id == original.account_id {
            reverted
        } else {
            next_account.current_balance_cents
        };
        let next_balance = next_kind
            .apply(base, next_amount)
            .ok_or_else(|| BillingError::overflow("account balance"))?;
        if next_balance < 0 {
            return Err(insufficient(base, next_kind, next_amount));
        }

        if next_account_id != original.account_id {
            if let Some(account) = ledger.account_mut(original.account_id) {
                account.current_balance_cents = reverted;
            }
        }
        if let Some(account) = ledger.account_mut(next_account_id) {
            account.current_balance_cents = next_balance;
        }

        let movement = ledger
            .movement_mut(id)
            .ok_or_else(|| BillingError::NotFound(format!("movement {id} not found")))?;
        movement.account_id = next_account_id;
        movement.category_id = next_category;
        movement.kind = next_kind;
        movement.amount_cents = next_amount;
        if let Some(occurred_at) = patch.occurred_at {
            movement.occurred_at = occurred_at;
        }
        if let Some(description) = patch.description {
            movement.description = clean_text(description);
        }
        movement.balance_snapshot_cents = next_balance;
        info!(movement = %id, "movement updated");
        Ok(movement.clone())
    }

    /// Soft-deletes a movement and undoes its balance effect.
    pub fn reverse(ledger: &mut Ledger, owner: UserId, id: Uuid) -> BillingResult<Movement> {
        let movement = Self::get(ledger, owner, id)?.clone();
        let account =
            ensure_owned(ledger.account(movement.account_id), owner, "account", movement.account_id)?;
        let reverted = movement
            .kind
            .revert(account.current_balance_cents, movement.amount_cents)
            .ok_or_else(|| BillingError::overflow("account balance"))?;
        if reverted < 0 {
            return Err(BillingError::InsufficientFunds {
                balance_cents: account.current_balance_cents,
                required_cents: movement.amount_cents,
            });
        }

        if let Some(account) = ledger.account_mut(movement.account_id) {
            account.current_balance_cents = reverted;
        }
        let stored = ledger
            .movement_mut(id)
            .ok_or_else(|| BillingError::NotFound(format!("movement {id} not found")))?;
        stored.is_deleted = true;
        info!(movement = %id, balance = reverted, "movement reversed");
        Ok(stored.clone())
    }

    /// A live (non-deleted) movement of the owner.
    pub fn get<'a>(ledger: &'a Ledger, owner: UserId, id: Uuid) -> BillingResult<&'a Movement> {
        let live = ledger.movement(id).filter(|movement| !movement.is_deleted);
        ensure_owned(live, owner, "movement", id)
    }

    /// Newest first, ties broken by insertion order (latest first).
    pub fn list(ledger: &Ledger, owner: UserId, query: &MovementQuery) -> Page<Movement> {
        let page = query.page.max(1);
        let page_size = query.page_size.max(1);
        let mut matching: Vec<(usize, &Movement)> = ledger
            .movements
            .iter()
            .enumerate()
            .filter(|(_, movement)| movement.owner_id == owner && !movement.is_deleted)
            .filter(|(_, movement)| query.account_id.map_or(true, |id| movement.account_id == id))
            .filter(|(_, movement)| {
                query
                    .category_id
                    .map_or(true, |id| movement.category_id == Some(id))
            })
            .filter(|(_, movement)| query.kind.map_or(true, |kind| movement.kind == kind))
            .filter(|(_, movement)| within(movement.occurred_at, query.from, query.to))
            .collect();
        matching.sort_by(|(ia, a), (ib, b)| b.occurred_at.cmp(&a.occurred_at).then(ib.cmp(ia)));

        let total = matching.len();
        let skip = (page as usize - 1) * page_size as usize;
        let items = matching
            .into_iter()
            .skip(skip)
            .take(page_size as usize)
            .map(|(_, movement)| movement.clone())
            .collect();
        Page {
            page,
            page_size,
            total,
            total_pages: total.div_ceil(page_size as usize),
            items,
        }
    }

    pub fn summary(ledger: &Ledger, owner: UserId, query: SummaryQuery) -> MovementSummary {
        let mut summary = MovementSummary::default();
        for movement in ledger.movements.iter().filter(|movement| {
            movement.owner_id == owner
                && !movement.is_deleted
                && query.account_id.map_or(true, |id| movement.account_id == id)
                && within(movement.occurred_at, query.from, query.to)
        }) {
            match movement.kind {
                MovementKind::Income => summary.total_income_cents += movement.amount_cents,
                MovementKind::Expense => summary.total_expense_cents += movement.amount_cents,
            }
            summary.movements_count += 1;
        }
        summary.net_balance_cents = summary.total_income_cents - summary.total_expense_cents;
        summary
    }
}
