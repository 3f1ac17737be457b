//! Purchases and their installment schedules.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::core::errors::{BillingError, BillingResult};
use crate::domain::{
    generate_installments, Cents, CreditCard, Installment, Ledger, Purchase, UserId,
};

use super::{clean_text, ensure_owned, ensure_positive, CategoryService, CreditCardService};

#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub card_id: Uuid,
    pub category_id: Option<Uuid>,
    pub total_amount_cents: Cents,
    pub installments_count: u32,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PurchasePatch {
    pub category_id: Option<Option<Uuid>>,
    pub description: Option<Option<String>>,
    pub total_amount_cents: Option<Cents>,
    pub installments_count: Option<u32>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl PurchasePatch {
    fn reschedules(&self) -> bool {
        self.total_amount_cents.is_some()
            || self.installments_count.is_some()
            || self.occurred_at.is_some()
    }
}

pub(crate) fn validate_schedule(total: Cents, count: u32) -> BillingResult<()> {
    ensure_positive(total, "total amount")?;
    if count == 0 {
        return Err(BillingError::InvalidInput(
            "installments count must be at least 1".into(),
        ));
    }
    if total < Cents::from(count) {
        return Err(BillingError::InvalidInput(format!(
            "{total} cents cannot be split into {count} installments"
        )));
    }
    Ok(())
}

/// Fails with `LimitExceeded` when `requested` on top of the committed debt
/// would breach the card limit. Installments of `excluding` are not counted.
pub(crate) fn ensure_within_limit(
    ledger: &Ledger,
    card: &CreditCard,
    requested: Cents,
    excluding: Option<Uuid>,
) -> BillingResult<()> {
    let committed = ledger.committed_debt_excluding(card.id, excluding);
    let exceeds = committed
        .checked_add(requested)
        .map_or(true, |after| after > card.limit_cents);
    if exceeds {
        return Err(BillingError::LimitExceeded {
            limit_cents: card.limit_cents,
            committed_cents: committed,
            requested_cents: requested,
        });
    }
    Ok(())
}

/// Sequence of the OPEN statement covering `occurred_at`, or the next
/// sequence the card will open.
pub(crate) fn anchor_sequence(ledger: &Ledger, card_id: Uuid, occurred_at: DateTime<Utc>) -> u32 {
    ledger
        .open_statement_covering(card_id, occurred_at)
        .map(|statement| statement.sequence_number)
        .unwrap_or_else(|| ledger.last_sequence(card_id) + 1)
}

pub struct PurchaseService;

impl PurchaseService {
    /// Charges a purchase to a card and schedules its installments.
    pub fn create(ledger: &mut Ledger, owner: UserId, new: NewPurchase) -> BillingResult<Purchase> {
        validate_schedule(new.total_amount_cents, new.installments_count)?;
        if let Some(category_id) = new.category_id {
            CategoryService::expense_category(ledger, owner, category_id)?;
        }
        let card = CreditCardService::active_card(ledger, owner, new.card_id)?;
        ensure_within_limit(ledger, card, new.total_amount_cents, None)?;
        let first_statement_sequence = anchor_sequence(ledger, card.id, new.occurred_at);

        let now = Utc::now();
        let purchase = Purchase {
            id: Uuid::new_v4(),
            owner_id: owner,
            card_id: new.card_id,
            category_id: new.category_id,
            description: clean_text(new.description),
            total_amount_cents: new.total_amount_cents,
            installments_count: new.installments_count,
            occurred_at: new.occurred_at,
            first_statement_sequence,
            is_deleted: false,
            is_legacy: false,
            created_at: now,
        };
        ledger.installments.extend(generate_installments(&purchase));
        ledger.purchases.push(purchase.clone());
        info!(
            purchase = %purchase.id,
            card = %purchase.card_id,
            amount = purchase.total_amount_cents,
            installments = purchase.installments_count,
            anchor = first_statement_sequence,
            "purchase created"
        );
        Ok(purchase)
    }

    /// Edits a purchase that has not been billed yet. Changing the amount,
    /// the installment count or the date regenerates the whole schedule.
    pub fn update(
        ledger: &mut Ledger,
        owner: UserId,
        id: Uuid,
        patch: PurchasePatch,
    ) -> BillingResult<Purchase> {
        let current = Self::get(ledger, owner, id)?.clone();
        Self::ensure_unbilled(ledger, id)?;
        if let Some(Some(category_id)) = patch.category_id {
            CategoryService::expense_category(ledger, owner, category_id)?;
        }

        let reschedules = patch.reschedules();
        let total = patch
            .total_amount_cents
            .unwrap_or(current.total_amount_cents);
        let count = patch
            .installments_count
            .unwrap_or(current.installments_count);
        let occurred_at = patch.occurred_at.unwrap_or(current.occurred_at);
        let mut anchor = current.first_statement_sequence;
        if reschedules {
            validate_schedule(total, count)?;
            let card = CreditCardService::active_card(ledger, owner, current.card_id)?;
            ensure_within_limit(ledger, card, total, Some(id))?;
            anchor = anchor_sequence(ledger, current.card_id, occurred_at);
        }

        let purchase = ledger
            .purchase_mut(id)
            .ok_or_else(|| BillingError::NotFound(format!("purchase {id} not found")))?;
        if let Some(category_id) = patch.category_id {
            purchase.category_id = category_id;
        }
        if let Some(description) = patch.description {
            purchase.description = clean_text(description);
        }
        purchase.total_amount_cents = total;
        purchase.installments_count = count;
        purchase.occurred_at = occurred_at;
        purchase.first_statement_sequence = anchor;
        let updated = purchase.clone();

        if reschedules {
            ledger.remove_purchase_installments(id);
            ledger.installments.extend(generate_installments(&updated));
        }
        info!(purchase = %id, rescheduled = reschedules, anchor, "purchase updated");
        Ok(updated)
    }

    /// Flags the purchase deleted and drops its installments.
    pub fn soft_delete(ledger: &mut Ledger, owner: UserId, id: Uuid) -> BillingResult<Purchase> {
        Self::get(ledger, owner, id)?;
        Self::ensure_unbilled(ledger, id)?;
        let removed = ledger.remove_purchase_installments(id);
        let purchase = ledger
            .purchase_mut(id)
            .ok_or_else(|| BillingError::NotFound(format!("purchase {id} not found")))?;
        purchase.is_deleted = true;
        info!(purchase = %id, installments = removed, "purchase deleted");
        Ok(purchase.clone())
    }

    /// A live purchase of the owner.
    pub fn get<'a>(ledger: &'a Ledger, owner: UserId, id: Uuid) -> BillingResult<&'a Purchase> {
        let live = ledger.purchase(id).filter(|purchase| !purchase.is_deleted);
        ensure_owned(live, owner, "purchase", id)
    }

    /// Installments of a purchase ordered by number.
    pub fn installments<'a>(
        ledger: &'a Ledger,
        owner: UserId,
        id: Uuid,
    ) -> BillingResult<Vec<&'a Installment>> {
        Self::get(ledger, owner, id)?;
        let mut installments: Vec<&Installment> = ledger.purchase_installments(id).collect();
        installments.sort_by_key(|installment| installment.installment_number);
        Ok(installments)
    }

    fn ensure_unbilled(ledger: &Ledger, id: Uuid) -> BillingResult<()> {
        if ledger.purchase_is_billed(id) {
            return Err(BillingError::InvalidState(format!(
                "purchase {id} already has billed installments"
            )));
        }
        Ok(())
    }
}
