use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::core::services::{
    AccountService, CategoryService, CreditCardService, NewAccount, NewCategory, NewCreditCard,
    NewPurchase, NewStatement, PurchaseService, StatementService,
};
use crate::domain::{
    AccountKind, CategoryKind, Cents, Ledger, Purchase, Statement, UserId, YearMonth,
};

mod account_service_tests;
mod installment_service_tests;
mod purchase_service_tests;

pub(super) fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub(super) fn ym(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).unwrap()
}

/// One owner with a funded bank account, a card settled from it and a
/// global expense category.
pub(super) struct Fixture {
    pub ledger: Ledger,
    pub owner: UserId,
    pub account_id: Uuid,
    pub card_id: Uuid,
    pub category_id: Uuid,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with(100_000, 1_000_000)
    }

    pub fn with(balance: Cents, limit: Cents) -> Self {
        let mut ledger = Ledger::new();
        let owner = Uuid::new_v4();
        let account = AccountService::create(
            &mut ledger,
            owner,
            NewAccount {
                name: "Checking".into(),
                kind: AccountKind::Bank,
                opening_balance_cents: balance,
            },
        )
        .unwrap();
        let card = CreditCardService::create(
            &mut ledger,
            owner,
            NewCreditCard {
                name: "Visa".into(),
                brand: Some("VISA".into()),
                card_last4: Some("4242".into()),
                limit_cents: limit,
                settlement_account_id: account.id,
            },
        )
        .unwrap();
        let category = CategoryService::create_global(
            &mut ledger,
            NewCategory {
                name: "Groceries".into(),
                kind: Some(CategoryKind::Expense),
                parent_id: None,
            },
        )
        .unwrap();
        Self {
            ledger,
            owner,
            account_id: account.id,
            card_id: card.id,
            category_id: category.id,
        }
    }

    /// Month-long statement window closing on the first of the next month.
    pub fn window(&self, period: YearMonth) -> NewStatement {
        let closing_date = period.add_months(1).start_instant().unwrap();
        NewStatement {
            card_id: self.card_id,
            period,
            period_start_date: period.start_instant().unwrap(),
            closing_date,
            due_date: closing_date + Duration::days(10),
        }
    }

    pub fn open(&mut self, period: YearMonth) -> Statement {
        let window = self.window(period);
        StatementService::open_or_get(&mut self.ledger, self.owner, window).unwrap()
    }

    pub fn close(&mut self, statement_id: Uuid) -> Statement {
        StatementService::close(&mut self.ledger, self.owner, statement_id).unwrap()
    }

    pub fn new_purchase(&self, total: Cents, count: u32, occurred_at: DateTime<Utc>) -> NewPurchase {
        NewPurchase {
            card_id: self.card_id,
            category_id: Some(self.category_id),
            total_amount_cents: total,
            installments_count: count,
            occurred_at,
            description: Some("Groceries run".into()),
        }
    }

    pub fn purchase(&mut self, total: Cents, count: u32, occurred_at: DateTime<Utc>) -> Purchase {
        let new = self.new_purchase(total, count, occurred_at);
        PurchaseService::create(&mut self.ledger, self.owner, new).unwrap()
    }

    pub fn balance(&self) -> Cents {
        self.ledger
            .account(self.account_id)
            .unwrap()
            .current_balance_cents
    }
}
