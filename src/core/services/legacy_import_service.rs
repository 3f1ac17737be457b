//! Imports installment purchases that started in a previous system.
//!
//! Installment `i` (zero-based) lands in `first_statement + i` months. Months
//! before the current one are history, with origin `LegacyImport`:
//!
//! * the first `paid_installments_count` installments arrive PAID on PAID
//!   statements;
//! * later installments in elapsed months arrive BILLED on CLOSED statements,
//!   which are settled through the regular payment flow.
//!
//! The current month is opened when the card has no OPEN statement, and later
//! months are left to the regular cycle. Every schedule stays within the
//! years 2000 to 2100.
//!
//! Synthesized PAID statements never produce a ledger movement; the money
//! left the cash accounts before the import.

use std::ops::RangeInclusive;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::errors::{BillingError, BillingResult};
use crate::domain::{
    allocate_installments, generate_installments, Cents, CreditCard, Installment,
    InstallmentStatus, Ledger, Purchase, Statement, StatementOrigin, StatementStatus, UserId,
    YearMonth,
};

use super::purchase_service::{ensure_within_limit, validate_schedule};
use super::{clean_text, CategoryService, CreditCardService, NewStatement, StatementService};

/// Days between a synthesized statement's closing and due dates.
const LEGACY_DUE_DAYS: i64 = 10;

#[derive(Debug, Clone)]
pub struct LegacyPurchase {
    pub card_id: Uuid,
    pub category_id: Option<Uuid>,
    pub total_amount_cents: Cents,
    pub installments_count: u32,
    pub paid_installments_count: u32,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
    /// Calendar month billed by the first installment.
    pub first_statement: YearMonth,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyImportOutcome {
    pub purchase: Purchase,
    pub installments: Vec<Installment>,
    pub created_statements: Vec<Statement>,
}

/// Years a legacy schedule may touch.
const LEGACY_YEARS: RangeInclusive<i32> = 2000..=2100;

/// Where one installment of the schedule lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Settled before the import, on a PAID statement.
    Paid,
    /// Billed in an elapsed month but still owed, on a CLOSED statement.
    Billed,
    /// Current or future month, billed by the regular cycle.
    Pending,
}

impl Slot {
    fn statement_status(self) -> StatementStatus {
        match self {
            Slot::Paid => StatementStatus::Paid,
            Slot::Billed => StatementStatus::Closed,
            Slot::Pending => StatementStatus::Open,
        }
    }

    fn installment_status(self) -> InstallmentStatus {
        match self {
            Slot::Paid => InstallmentStatus::Paid,
            Slot::Billed => InstallmentStatus::Billed,
            Slot::Pending => InstallmentStatus::Pending,
        }
    }
}

fn sequence_overflow() -> BillingError {
    BillingError::InvalidInput("statement sequence is out of range".into())
}

fn month_window(card_id: Uuid, period: YearMonth) -> BillingResult<NewStatement> {
    let out_of_range = || BillingError::InvalidInput(format!("period {period} is out of range"));
    let period_start_date = period.start_instant().ok_or_else(out_of_range)?;
    let closing_date = period
        .add_months(1)
        .start_instant()
        .ok_or_else(out_of_range)?;
    Ok(NewStatement {
        card_id,
        period,
        period_start_date,
        closing_date,
        due_date: closing_date + Duration::days(LEGACY_DUE_DAYS),
    })
}

/// Sequence number that statement period `first` has, or will have, on the card.
fn anchor_for(
    ledger: &Ledger,
    card_id: Uuid,
    first: YearMonth,
    current: YearMonth,
) -> BillingResult<u32> {
    if let Some(statement) = ledger.statement_for_period(card_id, first) {
        return Ok(statement.sequence_number);
    }
    let offset = |months: i64| u32::try_from(months).map_err(|_| sequence_overflow());
    match ledger.latest_statement(card_id) {
        Some(latest) if latest.period < first => latest
            .sequence_number
            .checked_add(offset(latest.period.months_until(first))?)
            .ok_or_else(sequence_overflow),
        Some(latest) => Err(BillingError::InvalidState(format!(
            "first statement {first} falls inside the card history ending at {}",
            latest.period
        ))),
        None => 1u32
            .checked_add(offset(current.months_until(first).max(0))?)
            .ok_or_else(sequence_overflow),
    }
}

pub struct LegacyImportService;

impl LegacyImportService {
    /// Rebuilds a purchase, its installments and the statements of the months
    /// that already elapsed, in one atomic unit.
    pub fn import(
        ledger: &mut Ledger,
        owner: UserId,
        legacy: LegacyPurchase,
        current: YearMonth,
    ) -> BillingResult<LegacyImportOutcome> {
        validate_schedule(legacy.total_amount_cents, legacy.installments_count)?;
        if legacy.installments_count < 2 {
            return Err(BillingError::InvalidInput(
                "legacy purchases need at least 2 installments".into(),
            ));
        }
        if legacy.paid_installments_count >= legacy.installments_count {
            return Err(BillingError::InvalidInput(
                "paid installments must be fewer than the installment count".into(),
            ));
        }
        let last = legacy
            .first_statement
            .add_months(i64::from(legacy.installments_count) - 1);
        for period in [legacy.first_statement, last, current] {
            if !LEGACY_YEARS.contains(&period.year) {
                return Err(BillingError::InvalidInput(format!(
                    "period {period} is outside {}..={}",
                    LEGACY_YEARS.start(),
                    LEGACY_YEARS.end()
                )));
            }
        }
        if let Some(category_id) = legacy.category_id {
            CategoryService::expense_category(ledger, owner, category_id)?;
        }
        let card = CreditCardService::active_card(ledger, owner, legacy.card_id)?.clone();

        let paid = legacy.paid_installments_count as usize;
        let months: Vec<YearMonth> = (0..legacy.installments_count)
            .map(|offset| legacy.first_statement.add_months(i64::from(offset)))
            .collect();
        if paid > 0 && months[paid - 1] >= current {
            return Err(BillingError::InvalidInput(format!(
                "paid installments must bill before {current}"
            )));
        }

        let amounts =
            allocate_installments(legacy.total_amount_cents, legacy.installments_count)
                .ok_or_else(|| BillingError::InvalidInput("invalid installment schedule".into()))?;
        let unpaid: Cents = amounts[paid..].iter().sum();
        ensure_within_limit(ledger, &card, unpaid, None)?;

        let anchor = anchor_for(ledger, card.id, legacy.first_statement, current)?;
        let mut created = Vec::new();
        let mut linked = Vec::new();
        for (index, period) in months.iter().copied().enumerate() {
            if period > current {
                break;
            }
            let slot = if index < paid {
                Slot::Paid
            } else if period < current {
                Slot::Billed
            } else {
                Slot::Pending
            };
            let expected = u32::try_from(index)
                .ok()
                .and_then(|index| anchor.checked_add(index))
                .ok_or_else(sequence_overflow)?;
            let existing = ledger.statement_for_period(card.id, period).cloned();
            let statement_id = match existing {
                Some(existing) => {
                    Self::check_existing(&existing, expected, slot)?;
                    Some(existing.id)
                }
                None if slot != Slot::Pending || ledger.open_statement(card.id).is_none() => {
                    let id = Self::materialize(ledger, &card, period, expected, slot)?;
                    created.push(id);
                    Some(id)
                }
                None => None,
            };
            if slot != Slot::Pending {
                let statement_id = statement_id.ok_or_else(|| {
                    BillingError::InvalidState(format!("no statement for {period}"))
                })?;
                Self::top_up(ledger, statement_id, amounts[index])?;
                linked.push((index, statement_id, period, slot));
            }
        }

        let now = Utc::now();
        let purchase = Purchase {
            id: Uuid::new_v4(),
            owner_id: owner,
            card_id: card.id,
            category_id: legacy.category_id,
            description: clean_text(legacy.description),
            total_amount_cents: legacy.total_amount_cents,
            installments_count: legacy.installments_count,
            occurred_at: legacy.occurred_at,
            first_statement_sequence: anchor,
            is_deleted: false,
            is_legacy: true,
            created_at: now,
        };
        let mut installments = generate_installments(&purchase);
        for (index, statement_id, period, slot) in linked {
            if let Some(installment) = installments.get_mut(index) {
                installment.status = slot.installment_status();
                installment.statement_id = Some(statement_id);
                installment.period = Some(period);
            }
        }
        let billed = installments
            .iter()
            .filter(|installment| installment.status == InstallmentStatus::Billed)
            .count();

        ledger.purchases.push(purchase.clone());
        ledger.installments.extend(installments.iter().cloned());
        info!(
            purchase = %purchase.id,
            card = %card.id,
            anchor,
            paid,
            billed,
            statements = created.len(),
            "legacy purchase imported"
        );
        let created_statements = created
            .iter()
            .filter_map(|id| ledger.statement(*id).cloned())
            .collect();
        Ok(LegacyImportOutcome {
            purchase,
            installments,
            created_statements,
        })
    }

    fn check_existing(existing: &Statement, expected: u32, slot: Slot) -> BillingResult<()> {
        if existing.sequence_number != expected {
            return Err(BillingError::InvalidState(format!(
                "statement {} has sequence {} but the schedule expects {expected}",
                existing.period, existing.sequence_number
            )));
        }
        let fits = existing.status == slot.statement_status()
            && (slot == Slot::Pending || existing.origin == StatementOrigin::LegacyImport);
        if !fits {
            return Err(BillingError::InvalidState(format!(
                "statement {} is {} and cannot take {} installments",
                existing.period,
                existing.status,
                slot.installment_status()
            )));
        }
        Ok(())
    }

    fn materialize(
        ledger: &mut Ledger,
        card: &CreditCard,
        period: YearMonth,
        expected: u32,
        slot: Slot,
    ) -> BillingResult<Uuid> {
        let window = month_window(card.id, period)?;
        if let Some(latest) = ledger.latest_statement(card.id) {
            if period <= latest.period {
                return Err(BillingError::InvalidState(format!(
                    "cannot insert {period} before the latest statement {}",
                    latest.period
                )));
            }
            if window.period_start_date < latest.closing_date {
                return Err(BillingError::InvalidState(format!(
                    "statement {period} would start before {} closes",
                    latest.period
                )));
            }
            if latest.is_open() && slot != Slot::Pending {
                return Err(BillingError::InvalidState(format!(
                    "cannot settle {period} after the OPEN statement {}",
                    latest.period
                )));
            }
        }
        let next = ledger
            .last_sequence(card.id)
            .checked_add(1)
            .ok_or_else(sequence_overflow)?;
        if expected != next {
            return Err(BillingError::InvalidState(format!(
                "statement {period} would take sequence {expected} but the card continues at {next}"
            )));
        }
        let status = slot.statement_status();
        let statement =
            StatementService::build(card, expected, &window, status, StatementOrigin::LegacyImport);
        let id = statement.id;
        ledger.statements.push(statement);
        debug!(statement = %id, sequence = expected, %period, %status, "legacy statement synthesized");
        Ok(id)
    }

    fn top_up(ledger: &mut Ledger, statement_id: Uuid, amount: Cents) -> BillingResult<()> {
        let statement = ledger.statement_mut(statement_id).ok_or_else(|| {
            BillingError::NotFound(format!("statement {statement_id} not found"))
        })?;
        statement.total_cents = statement
            .total_cents
            .checked_add(amount)
            .ok_or_else(|| BillingError::overflow("statement total"))?;
        Ok(())
    }
}
