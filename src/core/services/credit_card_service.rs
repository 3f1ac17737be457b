//! Card registry: credit lines, their settlement accounts and limit headroom.

use tracing::info;
use uuid::Uuid;

use crate::core::errors::{BillingError, BillingResult};
use crate::domain::{Cents, CreditCard, Ledger, Statement, UserId};

use super::{clean_text, ensure_owned, ensure_positive, AccountService};

#[derive(Debug, Clone)]
pub struct NewCreditCard {
    pub name: String,
    pub brand: Option<String>,
    pub card_last4: Option<String>,
    pub limit_cents: Cents,
    pub settlement_account_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct CreditCardPatch {
    pub name: Option<String>,
    pub brand: Option<Option<String>>,
    pub card_last4: Option<Option<String>>,
    pub limit_cents: Option<Cents>,
    pub settlement_account_id: Option<Uuid>,
}

/// Limit headroom of a card at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct CardSummary {
    pub card: CreditCard,
    pub limit_cents: Cents,
    pub committed_cents: Cents,
    pub available_cents: Cents,
    pub open_statement: Option<Statement>,
}

fn validate_last4(raw: Option<String>) -> BillingResult<Option<String>> {
    match clean_text(raw) {
        Some(digits) if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) => Err(
            BillingError::InvalidInput("card last4 must be exactly four digits".into()),
        ),
        other => Ok(other),
    }
}

pub struct CreditCardService;

impl CreditCardService {
    pub fn create(
        ledger: &mut Ledger,
        owner: UserId,
        new: NewCreditCard,
    ) -> BillingResult<CreditCard> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(BillingError::InvalidInput("card name is required".into()));
        }
        ensure_positive(new.limit_cents, "limit")?;
        AccountService::settlement_account(ledger, owner, new.settlement_account_id)?;
        if Self::find_by_name(ledger, owner, name).is_some() {
            return Err(BillingError::InvalidInput(format!(
                "card `{name}` already exists"
            )));
        }

        let mut card = CreditCard::new(owner, name, new.limit_cents, new.settlement_account_id);
        card.brand = clean_text(new.brand);
        card.card_last4 = validate_last4(new.card_last4)?;
        ledger.credit_cards.push(card.clone());
        info!(card = %card.id, limit = card.limit_cents, "credit card created");
        Ok(card)
    }

    /// Lowering the limit below the committed debt is refused.
    pub fn update(
        ledger: &mut Ledger,
        owner: UserId,
        id: Uuid,
        patch: CreditCardPatch,
    ) -> BillingResult<CreditCard> {
        ensure_owned(ledger.card(id), owner, "card", id)?;
        if let Some(limit) = patch.limit_cents {
            ensure_positive(limit, "limit")?;
            let committed = ledger.committed_debt(id);
            if limit < committed {
                return Err(BillingError::InvalidInput(format!(
                    "limit {limit} is below the committed debt {committed}"
                )));
            }
        }
        if let Some(account_id) = patch.settlement_account_id {
            AccountService::settlement_account(ledger, owner, account_id)?;
        }
        let name = match patch.name {
            Some(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(BillingError::InvalidInput("card name is required".into()));
                }
                if Self::find_by_name(ledger, owner, &name).is_some_and(|other| other.id != id) {
                    return Err(BillingError::InvalidInput(format!(
                        "card `{name}` already exists"
                    )));
                }
                Some(name)
            }
            None => None,
        };
        let last4 = patch.card_last4.map(validate_last4).transpose()?;

        let card = ledger
            .card_mut(id)
            .ok_or_else(|| BillingError::NotFound(format!("card {id} not found")))?;
        if let Some(name) = name {
            card.name = name;
        }
        if let Some(brand) = patch.brand {
            card.brand = clean_text(brand);
        }
        if let Some(last4) = last4 {
            card.card_last4 = last4;
        }
        if let Some(limit) = patch.limit_cents {
            card.limit_cents = limit;
        }
        if let Some(account_id) = patch.settlement_account_id {
            card.settlement_account_id = account_id;
        }
        info!(card = %id, "credit card updated");
        Ok(card.clone())
    }

    pub fn set_active(
        ledger: &mut Ledger,
        owner: UserId,
        id: Uuid,
        is_active: bool,
    ) -> BillingResult<CreditCard> {
        ensure_owned(ledger.card(id), owner, "card", id)?;
        let card = ledger
            .card_mut(id)
            .ok_or_else(|| BillingError::NotFound(format!("card {id} not found")))?;
        if card.is_active != is_active {
            card.is_active = is_active;
            info!(card = %id, is_active, "credit card activity changed");
        }
        Ok(card.clone())
    }

    pub fn list(ledger: &Ledger, owner: UserId, include_inactive: bool) -> Vec<&CreditCard> {
        ledger
            .credit_cards
            .iter()
            .filter(|card| card.owner_id == owner && (include_inactive || card.is_active))
            .collect()
    }

    pub fn get<'a>(ledger: &'a Ledger, owner: UserId, id: Uuid) -> BillingResult<&'a CreditCard> {
        ensure_owned(ledger.card(id), owner, "card", id)
    }

    pub fn summary(ledger: &Ledger, owner: UserId, id: Uuid) -> BillingResult<CardSummary> {
        let card = ensure_owned(ledger.card(id), owner, "card", id)?;
        let committed_cents = ledger.committed_debt(id);
        Ok(CardSummary {
            card: card.clone(),
            limit_cents: card.limit_cents,
            committed_cents,
            available_cents: card.limit_cents - committed_cents,
            open_statement: ledger.open_statement(id).cloned(),
        })
    }

    pub fn find_by_name<'a>(
        ledger: &'a Ledger,
        owner: UserId,
        name: &str,
    ) -> Option<&'a CreditCard> {
        let needle = name.trim().to_lowercase();
        ledger
            .credit_cards
            .iter()
            .find(|card| card.owner_id == owner && card.name.to_lowercase() == needle)
    }

    /// Card referenced by a purchase payload: unknown ids are `InvalidInput`,
    /// foreign or inactive cards are `Forbidden`.
    pub(crate) fn active_card<'a>(
        ledger: &'a Ledger,
        owner: UserId,
        id: Uuid,
    ) -> BillingResult<&'a CreditCard> {
        let card = ledger
            .card(id)
            .ok_or_else(|| BillingError::InvalidInput(format!("unknown card {id}")))?;
        if card.owner_id != owner {
            return Err(BillingError::Forbidden(format!(
                "card {id} belongs to another user"
            )));
        }
        if !card.is_active {
            return Err(BillingError::Forbidden(format!("card {id} is inactive")));
        }
        Ok(card)
    }
}
