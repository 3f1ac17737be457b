use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    account::Account,
    category::Category,
    common::{Cents, YearMonth},
    credit_card::CreditCard,
    movement::Movement,
    purchase::{effective_period, Installment, InstallmentStatus, Purchase},
    statement::{Statement, StatementStatus},
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// In-memory image of the relational store: one vector per logical table.
///
/// Services mutate it only inside `LedgerManager::transaction`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ledger {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub movements: Vec<Movement>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub credit_cards: Vec<CreditCard>,
    #[serde(default)]
    pub statements: Vec<Statement>,
    #[serde(default)]
    pub purchases: Vec<Purchase>,
    #[serde(default)]
    pub installments: Vec<Installment>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Ledger::schema_version_default")]
    pub schema_version: u8,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            accounts: Vec::new(),
            movements: Vec::new(),
            categories: Vec::new(),
            credit_cards: Vec::new(),
            statements: Vec::new(),
            purchases: Vec::new(),
            installments: Vec::new(),
            updated_at: Utc::now(),
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn account_mut(&mut self, id: Uuid) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| account.id == id)
    }

    pub fn movement(&self, id: Uuid) -> Option<&Movement> {
        self.movements.iter().find(|movement| movement.id == id)
    }

    pub fn movement_mut(&mut self, id: Uuid) -> Option<&mut Movement> {
        self.movements.iter_mut().find(|movement| movement.id == id)
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn category_mut(&mut self, id: Uuid) -> Option<&mut Category> {
        self.categories.iter_mut().find(|category| category.id == id)
    }

    pub fn card(&self, id: Uuid) -> Option<&CreditCard> {
        self.credit_cards.iter().find(|card| card.id == id)
    }

    pub fn card_mut(&mut self, id: Uuid) -> Option<&mut CreditCard> {
        self.credit_cards.iter_mut().find(|card| card.id == id)
    }

    pub fn statement(&self, id: Uuid) -> Option<&Statement> {
        self.statements.iter().find(|statement| statement.id == id)
    }

    pub fn statement_mut(&mut self, id: Uuid) -> Option<&mut Statement> {
        self.statements
            .iter_mut()
            .find(|statement| statement.id == id)
    }

    pub fn purchase(&self, id: Uuid) -> Option<&Purchase> {
        self.purchases.iter().find(|purchase| purchase.id == id)
    }

    pub fn purchase_mut(&mut self, id: Uuid) -> Option<&mut Purchase> {
        self.purchases.iter_mut().find(|purchase| purchase.id == id)
    }

    /// Statements of a card, in table order.
    pub fn card_statements(&self, card_id: Uuid) -> impl Iterator<Item = &Statement> {
        self.statements
            .iter()
            .filter(move |statement| statement.card_id == card_id)
    }

    /// The statement labelled `(year, month)` for a card; unique by construction.
    pub fn statement_for_period(&self, card_id: Uuid, period: YearMonth) -> Option<&Statement> {
        self.card_statements(card_id)
            .find(|statement| statement.period == period)
    }

    pub fn statement_by_sequence(&self, card_id: Uuid, sequence: u32) -> Option<&Statement> {
        self.card_statements(card_id)
            .find(|statement| statement.sequence_number == sequence)
    }

    /// Statement with the highest sequence number, if the card has any.
    pub fn latest_statement(&self, card_id: Uuid) -> Option<&Statement> {
        self.card_statements(card_id)
            .max_by_key(|statement| statement.sequence_number)
    }

    pub fn last_sequence(&self, card_id: Uuid) -> u32 {
        self.latest_statement(card_id)
            .map_or(0, |statement| statement.sequence_number)
    }

    pub fn open_statement(&self, card_id: Uuid) -> Option<&Statement> {
        self.card_statements(card_id)
            .find(|statement| statement.status == StatementStatus::Open)
    }

    /// The OPEN statement whose `[period_start_date, closing_date)` contains
    /// `instant`, earliest closing first.
    pub fn open_statement_covering(
        &self,
        card_id: Uuid,
        instant: DateTime<Utc>,
    ) -> Option<&Statement> {
        self.card_statements(card_id)
            .filter(|statement| statement.is_open() && statement.covers(instant))
            .min_by_key(|statement| statement.closing_date)
    }

    /// Non-deleted purchases charged to a card.
    pub fn active_card_purchases(&self, card_id: Uuid) -> impl Iterator<Item = &Purchase> {
        self.purchases
            .iter()
            .filter(move |purchase| purchase.card_id == card_id && !purchase.is_deleted)
    }

    pub fn purchase_installments(&self, purchase_id: Uuid) -> impl Iterator<Item = &Installment> {
        self.installments
            .iter()
            .filter(move |installment| installment.purchase_id == purchase_id)
    }

    /// Installments of a card's active purchases paired with their purchase.
    pub fn card_installments(
        &self,
        card_id: Uuid,
    ) -> impl Iterator<Item = (&Purchase, &Installment)> {
        self.active_card_purchases(card_id).flat_map(move |purchase| {
            self.purchase_installments(purchase.id)
                .map(move |installment| (purchase, installment))
        })
    }

    /// Installments whose effective period equals `sequence`.
    pub fn installments_in_period(
        &self,
        card_id: Uuid,
        sequence: u32,
    ) -> impl Iterator<Item = (&Purchase, &Installment)> {
        self.card_installments(card_id)
            .filter(move |(purchase, installment)| {
                effective_period(purchase, installment) == sequence
            })
    }

    /// Sum of PENDING and BILLED installment amounts on a card.
    pub fn committed_debt(&self, card_id: Uuid) -> Cents {
        self.committed_debt_excluding(card_id, None)
    }

    /// Committed debt ignoring the installments of `excluded`, the purchase
    /// being rescheduled.
    pub fn committed_debt_excluding(&self, card_id: Uuid, excluded: Option<Uuid>) -> Cents {
        self.card_installments(card_id)
            .filter(|(purchase, installment)| {
                Some(purchase.id) != excluded && installment.status.is_committed()
            })
            .map(|(_, installment)| installment.amount_cents)
            .sum()
    }

    pub fn remove_purchase_installments(&mut self, purchase_id: Uuid) -> usize {
        let before = self.installments.len();
        self.installments
            .retain(|installment| installment.purchase_id != purchase_id);
        before - self.installments.len()
    }

    /// Whether any installment of the purchase is past PENDING or sits on a
    /// statement that is no longer OPEN.
    pub fn purchase_is_billed(&self, purchase_id: Uuid) -> bool {
        self.purchase_installments(purchase_id).any(|installment| {
            installment.status != InstallmentStatus::Pending
                || installment
                    .statement_id
                    .and_then(|id| self.statement(id))
                    .is_some_and(|statement| statement.status != StatementStatus::Open)
        })
    }
}
