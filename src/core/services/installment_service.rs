//! Read models over installments. Every period question goes through
//! `effective_period`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::errors::{BillingError, BillingResult};
use crate::domain::{
    Cents, CreditCard, InstallmentStatus, Ledger, Statement, StatementStatus, UserId, YearMonth,
};

use super::ensure_owned;

#[derive(Debug, Clone, PartialEq)]
pub struct OpenStatementRef {
    pub statement_id: Uuid,
    pub sequence_number: u32,
    pub period: YearMonth,
    pub closing_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

impl From<&Statement> for OpenStatementRef {
    fn from(statement: &Statement) -> Self {
        Self {
            statement_id: statement.id,
            sequence_number: statement.sequence_number,
            period: statement.period,
            closing_date: statement.closing_date,
            due_date: statement.due_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardOverview {
    pub card_id: Uuid,
    pub card_name: String,
    pub limit_cents: Cents,
    pub committed_cents: Cents,
    pub available_cents: Cents,
    pub open_statement: Option<OpenStatementRef>,
    /// PENDING installments scheduled into the open statement.
    pub open_statement_accumulated_cents: Cents,
    /// Purchases with at least one unpaid installment.
    pub active_purchases: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InstallmentsOverview {
    pub cards: Vec<CardOverview>,
    pub total_limit_cents: Cents,
    pub total_committed_cents: Cents,
    pub total_available_cents: Cents,
    pub total_open_statement_cents: Cents,
    pub total_active_purchases: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodPurchase {
    pub purchase_id: Uuid,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub total_amount_cents: Cents,
    pub installments_count: u32,
    pub installment_number: u32,
    pub installment_amount_cents: Cents,
    pub status: InstallmentStatus,
    pub paid_count: u32,
    pub remaining_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardPeriodDetail {
    pub card_id: Uuid,
    pub statement: Statement,
    pub purchases: Vec<PeriodPurchase>,
    pub total_cents: Cents,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSummary {
    pub statement_id: Uuid,
    pub sequence_number: u32,
    pub period: YearMonth,
    pub status: StatementStatus,
    pub total_cents: Cents,
}

pub struct InstallmentService;

impl InstallmentService {
    /// Limit usage and the running open statement for every active card.
    pub fn overview(ledger: &Ledger, owner: UserId) -> InstallmentsOverview {
        let mut overview = InstallmentsOverview::default();
        for card in ledger
            .credit_cards
            .iter()
            .filter(|card| card.owner_id == owner && card.is_active)
        {
            let row = Self::card_overview(ledger, card);
            overview.total_limit_cents += row.limit_cents;
            overview.total_committed_cents += row.committed_cents;
            overview.total_available_cents += row.available_cents;
            overview.total_open_statement_cents += row.open_statement_accumulated_cents;
            overview.total_active_purchases += row.active_purchases;
            overview.cards.push(row);
        }
        overview
    }

    fn card_overview(ledger: &Ledger, card: &CreditCard) -> CardOverview {
        let committed_cents = ledger.committed_debt(card.id);
        let open = ledger.open_statement(card.id);
        let open_statement_accumulated_cents = open.map_or(0, |statement| {
            ledger
                .installments_in_period(card.id, statement.sequence_number)
                .filter(|(_, installment)| installment.status == InstallmentStatus::Pending)
                .map(|(_, installment)| installment.amount_cents)
                .sum()
        });
        let active_purchases = ledger
            .active_card_purchases(card.id)
            .filter(|purchase| {
                ledger
                    .purchase_installments(purchase.id)
                    .any(|installment| installment.status.is_committed())
            })
            .count();
        CardOverview {
            card_id: card.id,
            card_name: card.name.clone(),
            limit_cents: card.limit_cents,
            committed_cents,
            available_cents: card.limit_cents - committed_cents,
            open_statement: open.map(OpenStatementRef::from),
            open_statement_accumulated_cents,
            active_purchases,
        }
    }

    /// Purchases with an installment in the statement labelled `period`, or
    /// in the OPEN statement when no period is given.
    pub fn card_period_detail(
        ledger: &Ledger,
        owner: UserId,
        card_id: Uuid,
        period: Option<YearMonth>,
    ) -> BillingResult<CardPeriodDetail> {
        ensure_owned(ledger.card(card_id), owner, "card", card_id)?;
        let statement = match period {
            Some(period) => ledger.statement_for_period(card_id, period).ok_or_else(|| {
                BillingError::NotFound(format!("card {card_id} has no statement for {period}"))
            })?,
            None => ledger.open_statement(card_id).ok_or_else(|| {
                BillingError::NotFound(format!("card {card_id} has no OPEN statement"))
            })?,
        };

        let purchases: Vec<PeriodPurchase> = ledger
            .installments_in_period(card_id, statement.sequence_number)
            .map(|(purchase, installment)| {
                let paid_count = ledger
                    .purchase_installments(purchase.id)
                    .filter(|other| other.status == InstallmentStatus::Paid)
                    .count() as u32;
                PeriodPurchase {
                    purchase_id: purchase.id,
                    description: purchase.description.clone(),
                    occurred_at: purchase.occurred_at,
                    total_amount_cents: purchase.total_amount_cents,
                    installments_count: purchase.installments_count,
                    installment_number: installment.installment_number,
                    installment_amount_cents: installment.amount_cents,
                    status: installment.status,
                    paid_count,
                    remaining_count: purchase.installments_count - paid_count,
                }
            })
            .collect();
        let total_cents = purchases
            .iter()
            .map(|purchase| purchase.installment_amount_cents)
            .sum();
        Ok(CardPeriodDetail {
            card_id,
            statement: statement.clone(),
            purchases,
            total_cents,
        })
    }

    /// Statement periods of a card, newest first.
    pub fn card_periods(
        ledger: &Ledger,
        owner: UserId,
        card_id: Uuid,
    ) -> BillingResult<Vec<PeriodSummary>> {
        ensure_owned(ledger.card(card_id), owner, "card", card_id)?;
        let mut periods: Vec<PeriodSummary> = ledger
            .card_statements(card_id)
            .map(|statement| PeriodSummary {
                statement_id: statement.id,
                sequence_number: statement.sequence_number,
                period: statement.period,
                status: statement.status,
                total_cents: statement.total_cents,
            })
            .collect();
        periods.sort_by(|a, b| b.sequence_number.cmp(&a.sequence_number));
        Ok(periods)
    }
}
