#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use cardledger_core::{
    core::{
        services::{
            AccountService, CategoryService, CreditCardService, NewAccount, NewCategory,
            NewCreditCard, NewPurchase, NewStatement, PurchaseService, StatementService,
        },
        BillingResult, FixedClock, LedgerManager,
    },
    domain::{AccountKind, CategoryKind, Cents, Purchase, Statement, UserId, YearMonth},
    storage::StorageBackend,
};

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub fn ym(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).unwrap()
}

/// One owner with a bank account, a card settled from it and an expense
/// category, all behind a `LedgerManager`.
pub struct World {
    pub manager: LedgerManager,
    pub owner: UserId,
    pub account_id: Uuid,
    pub card_id: Uuid,
    pub category_id: Uuid,
}

impl World {
    pub fn new(balance: Cents, limit: Cents) -> Self {
        Self::build(LedgerManager::in_memory(), balance, limit)
    }

    pub fn with_storage(storage: Box<dyn StorageBackend>, balance: Cents, limit: Cents) -> Self {
        let manager = LedgerManager::new(storage).expect("load storage");
        Self::build(manager, balance, limit)
    }

    fn build(manager: LedgerManager, balance: Cents, limit: Cents) -> Self {
        let manager = manager.with_clock(FixedClock(at(2024, 3, 15)));
        let owner = Uuid::new_v4();
        let (account_id, card_id, category_id) = manager
            .transaction(|ledger| {
                let account = AccountService::create(
                    ledger,
                    owner,
                    NewAccount {
                        name: "Checking".into(),
                        kind: AccountKind::Bank,
                        opening_balance_cents: balance,
                    },
                )?;
                let card = CreditCardService::create(
                    ledger,
                    owner,
                    NewCreditCard {
                        name: "Visa".into(),
                        brand: Some("Visa".into()),
                        card_last4: Some("4242".into()),
                        limit_cents: limit,
                        settlement_account_id: account.id,
                    },
                )?;
                let category = CategoryService::create(
                    ledger,
                    owner,
                    NewCategory {
                        name: "Groceries".into(),
                        kind: Some(CategoryKind::Expense),
                        parent_id: None,
                    },
                )?;
                Ok((account.id, card.id, category.id))
            })
            .expect("seed world");
        Self {
            manager,
            owner,
            account_id,
            card_id,
            category_id,
        }
    }

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

    pub fn open(&self, period: YearMonth) -> BillingResult<Statement> {
        let new = self.window(period);
        let owner = self.owner;
        self.manager
            .transaction(|ledger| StatementService::open_or_get(ledger, owner, new))
    }

    pub fn close(&self, id: Uuid) -> BillingResult<Statement> {
        let owner = self.owner;
        self.manager
            .transaction(|ledger| StatementService::close(ledger, owner, id))
    }

    pub fn purchase(
        &self,
        total: Cents,
        count: u32,
        occurred_at: DateTime<Utc>,
    ) -> BillingResult<Purchase> {
        let new = NewPurchase {
            card_id: self.card_id,
            category_id: Some(self.category_id),
            total_amount_cents: total,
            installments_count: count,
            occurred_at,
            description: Some("test purchase".into()),
        };
        let owner = self.owner;
        self.manager
            .transaction(|ledger| PurchaseService::create(ledger, owner, new))
    }

    pub fn balance(&self) -> Cents {
        let id = self.account_id;
        self.manager
            .read(|ledger| Ok(ledger.account(id).map(|a| a.current_balance_cents)))
            .unwrap()
            .unwrap()
    }

    pub fn committed(&self) -> Cents {
        let id = self.card_id;
        self.manager
            .read(|ledger| Ok(ledger.committed_debt(id)))
            .unwrap()
    }
}
