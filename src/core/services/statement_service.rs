//! Statement cycle: open, close (bill by effective period) and pay.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::errors::{BillingError, BillingResult};
use crate::domain::{
    Cents, CreditCard, Installment, InstallmentStatus, Ledger, Movement, MovementKind, Purchase,
    Statement, StatementOrigin, StatementStatus, UserId, YearMonth,
};

use super::{clean_text, ensure_owned, AccountService, MovementService, NewMovement};

#[derive(Debug, Clone)]
pub struct NewStatement {
    pub card_id: Uuid,
    pub period: YearMonth,
    pub period_start_date: DateTime<Utc>,
    pub closing_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct StatementDatesPatch {
    pub period_start_date: Option<DateTime<Utc>>,
    pub closing_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

/// How a statement is settled. Without an account the card's settlement
/// account is charged.
#[derive(Debug, Clone, Default)]
pub struct StatementPayment {
    pub account_id: Option<Uuid>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatementLine {
    pub purchase_id: Uuid,
    pub installment_id: Uuid,
    pub description: Option<String>,
    pub installment_number: u32,
    pub installments_count: u32,
    pub amount_cents: Cents,
    pub status: InstallmentStatus,
}

/// A statement with the installments it bills (or, while OPEN, the ones
/// scheduled into it).
#[derive(Debug, Clone, PartialEq)]
pub struct StatementDetail {
    pub statement: Statement,
    pub lines: Vec<StatementLine>,
    pub lines_total_cents: Cents,
}

fn validate_window(
    period_start_date: DateTime<Utc>,
    closing_date: DateTime<Utc>,
    due_date: DateTime<Utc>,
) -> BillingResult<()> {
    if closing_date <= period_start_date {
        return Err(BillingError::InvalidInput(
            "closing date must be after the period start".into(),
        ));
    }
    if due_date < closing_date {
        return Err(BillingError::InvalidInput(
            "due date cannot precede the closing date".into(),
        ));
    }
    Ok(())
}

fn line(purchase: &Purchase, installment: &Installment) -> StatementLine {
    StatementLine {
        purchase_id: purchase.id,
        installment_id: installment.id,
        description: purchase.description.clone(),
        installment_number: installment.installment_number,
        installments_count: purchase.installments_count,
        amount_cents: installment.amount_cents,
        status: installment.status,
    }
}

pub struct StatementService;

impl StatementService {
    /// Idempotent on `(card, period)`: an existing statement is returned
    /// unchanged and the sequence does not advance.
    pub fn open_or_get(
        ledger: &mut Ledger,
        owner: UserId,
        new: NewStatement,
    ) -> BillingResult<Statement> {
        let card = ensure_owned(ledger.card(new.card_id), owner, "card", new.card_id)?;
        if !card.is_active {
            return Err(BillingError::Forbidden(format!(
                "card {} is inactive",
                card.id
            )));
        }
        if let Some(existing) = ledger.statement_for_period(card.id, new.period) {
            debug!(statement = %existing.id, period = %new.period, "statement already exists");
            return Ok(existing.clone());
        }

        validate_window(new.period_start_date, new.closing_date, new.due_date)?;
        if let Some(open) = ledger.open_statement(card.id) {
            return Err(BillingError::InvalidState(format!(
                "card already has the OPEN statement {} for {}",
                open.sequence_number, open.period
            )));
        }
        if let Some(latest) = ledger.latest_statement(card.id) {
            if new.period <= latest.period || new.period_start_date <= latest.period_start_date {
                return Err(BillingError::InvalidInput(format!(
                    "period {} must start after the latest statement {}",
                    new.period, latest.period
                )));
            }
        }

        let sequence = ledger.last_sequence(card.id) + 1;
        let statement = Self::build(
            card,
            sequence,
            &new,
            StatementStatus::Open,
            StatementOrigin::Cycle,
        );
        ledger.statements.push(statement.clone());
        info!(
            statement = %statement.id,
            card = %statement.card_id,
            sequence,
            period = %statement.period,
            "statement opened"
        );
        Ok(statement)
    }

    pub(crate) fn build(
        card: &CreditCard,
        sequence_number: u32,
        new: &NewStatement,
        status: StatementStatus,
        origin: StatementOrigin,
    ) -> Statement {
        Statement {
            id: Uuid::new_v4(),
            card_id: card.id,
            owner_id: card.owner_id,
            sequence_number,
            period: new.period,
            period_start_date: new.period_start_date,
            closing_date: new.closing_date,
            due_date: new.due_date,
            status,
            total_cents: 0,
            origin,
            created_at: Utc::now(),
        }
    }

    /// Bills every PENDING installment whose effective period equals the
    /// statement's sequence and fixes the statement total.
    pub fn close(ledger: &mut Ledger, owner: UserId, id: Uuid) -> BillingResult<Statement> {
        let statement = Self::get(ledger, owner, id)?;
        if statement.status != StatementStatus::Open {
            return Err(BillingError::InvalidState(format!(
                "statement {id} is {} and cannot be closed",
                statement.status
            )));
        }
        let (card_id, sequence, period) =
            (statement.card_id, statement.sequence_number, statement.period);

        let selected: Vec<Uuid> = ledger
            .installments_in_period(card_id, sequence)
            .filter(|(_, installment)| installment.status == InstallmentStatus::Pending)
            .map(|(_, installment)| installment.id)
            .collect();

        let mut total: Cents = 0;
        for installment in ledger
            .installments
            .iter_mut()
            .filter(|installment| selected.contains(&installment.id))
        {
            installment.transition(InstallmentStatus::Billed).map_err(|from| {
                BillingError::InvalidState(format!("installment {} is {from}", installment.id))
            })?;
            installment.statement_id = Some(id);
            installment.period = Some(period);
            total = total
                .checked_add(installment.amount_cents)
                .ok_or_else(|| BillingError::overflow("statement total"))?;
        }
        debug!(statement = %id, billed = selected.len(), total, "installments billed");

        let statement = ledger
            .statement_mut(id)
            .ok_or_else(|| BillingError::NotFound(format!("statement {id} not found")))?;
        statement.total_cents = total;
        statement
            .transition(StatementStatus::Closed)
            .map_err(|from| BillingError::InvalidState(format!("statement {id} is {from}")))?;
        info!(statement = %id, sequence, total, "statement closed");
        Ok(statement.clone())
    }

    /// Settles a CLOSED statement from a cash-side account. The movement, the
    /// balance update and both status transitions commit together.
    pub fn pay(
        ledger: &mut Ledger,
        owner: UserId,
        id: Uuid,
        payment: StatementPayment,
        now: DateTime<Utc>,
    ) -> BillingResult<(Statement, Movement)> {
        let statement = Self::get(ledger, owner, id)?;
        match statement.status {
            StatementStatus::Open => {
                return Err(BillingError::InvalidState(format!(
                    "statement {id} is still OPEN; nothing to pay"
                )))
            }
            StatementStatus::Paid => {
                return Err(BillingError::InvalidState(format!(
                    "statement {id} is already PAID"
                )))
            }
            StatementStatus::Closed => {}
        }
        let total = statement.total_cents;
        if total <= 0 {
            return Err(BillingError::InvalidState(format!(
                "statement {id} has nothing to pay"
            )));
        }
        let card = ledger
            .card(statement.card_id)
            .ok_or_else(|| BillingError::NotFound(format!("card {} not found", statement.card_id)))?;
        let account_id = payment.account_id.unwrap_or(card.settlement_account_id);
        let account = AccountService::settlement_account(ledger, owner, account_id)?;
        let balance = account.current_balance_cents;
        if balance - total < 0 {
            return Err(BillingError::InsufficientFunds {
                balance_cents: balance,
                required_cents: total,
            });
        }
        let description = clean_text(payment.description).unwrap_or_else(|| {
            format!("Credit card statement payment {} {}", card.name, statement.period)
        });

        let movement = MovementService::post(
            ledger,
            owner,
            NewMovement {
                account_id,
                category_id: None,
                kind: MovementKind::Expense,
                amount_cents: total,
                occurred_at: payment.occurred_at.unwrap_or(now),
                description: Some(description),
            },
        )?;

        for installment in ledger.installments.iter_mut().filter(|installment| {
            installment.statement_id == Some(id) && installment.status == InstallmentStatus::Billed
        }) {
            installment.transition(InstallmentStatus::Paid).map_err(|from| {
                BillingError::InvalidState(format!("installment {} is {from}", installment.id))
            })?;
        }
        let statement = ledger
            .statement_mut(id)
            .ok_or_else(|| BillingError::NotFound(format!("statement {id} not found")))?;
        statement
            .transition(StatementStatus::Paid)
            .map_err(|from| BillingError::InvalidState(format!("statement {id} is {from}")))?;
        info!(
            statement = %id,
            account = %account_id,
            amount = total,
            balance = movement.balance_snapshot_cents,
            "statement paid"
        );
        Ok((statement.clone(), movement))
    }

    /// Moves the window of an OPEN statement.
    pub fn update_dates(
        ledger: &mut Ledger,
        owner: UserId,
        id: Uuid,
        patch: StatementDatesPatch,
    ) -> BillingResult<Statement> {
        let statement = Self::get(ledger, owner, id)?;
        if !statement.is_open() {
            return Err(BillingError::InvalidState(format!(
                "statement {id} is {}; only OPEN statements can be rescheduled",
                statement.status
            )));
        }
        let start = patch.period_start_date.unwrap_or(statement.period_start_date);
        let closing = patch.closing_date.unwrap_or(statement.closing_date);
        let due = patch.due_date.unwrap_or(statement.due_date);
        validate_window(start, closing, due)?;
        if let Some(previous) = statement
            .sequence_number
            .checked_sub(1)
            .and_then(|sequence| ledger.statement_by_sequence(statement.card_id, sequence))
        {
            if start <= previous.period_start_date {
                return Err(BillingError::InvalidInput(format!(
                    "period start must be after statement {}",
                    previous.sequence_number
                )));
            }
        }

        let statement = ledger
            .statement_mut(id)
            .ok_or_else(|| BillingError::NotFound(format!("statement {id} not found")))?;
        statement.period_start_date = start;
        statement.closing_date = closing;
        statement.due_date = due;
        info!(statement = %id, "statement dates updated");
        Ok(statement.clone())
    }

    pub fn get<'a>(ledger: &'a Ledger, owner: UserId, id: Uuid) -> BillingResult<&'a Statement> {
        ensure_owned(ledger.statement(id), owner, "statement", id)
    }

    /// Statements of a card, newest sequence first.
    pub fn list_by_card<'a>(
        ledger: &'a Ledger,
        owner: UserId,
        card_id: Uuid,
    ) -> BillingResult<Vec<&'a Statement>> {
        ensure_owned(ledger.card(card_id), owner, "card", card_id)?;
        let mut statements: Vec<&Statement> = ledger.card_statements(card_id).collect();
        statements.sort_by(|a, b| b.sequence_number.cmp(&a.sequence_number));
        Ok(statements)
    }

    pub fn detail(ledger: &Ledger, owner: UserId, id: Uuid) -> BillingResult<StatementDetail> {
        let statement = Self::get(ledger, owner, id)?;
        let lines: Vec<StatementLine> = if statement.is_open() {
            ledger
                .installments_in_period(statement.card_id, statement.sequence_number)
                .filter(|(_, installment)| installment.status == InstallmentStatus::Pending)
                .map(|(purchase, installment)| line(purchase, installment))
                .collect()
        } else {
            ledger
                .card_installments(statement.card_id)
                .filter(|(_, installment)| installment.statement_id == Some(id))
                .map(|(purchase, installment)| line(purchase, installment))
                .collect()
        };
        let lines_total_cents = lines.iter().map(|line| line.amount_cents).sum();
        Ok(StatementDetail {
            statement: statement.clone(),
            lines,
            lines_total_cents,
        })
    }
}
