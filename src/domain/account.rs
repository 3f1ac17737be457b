use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

/// Represents a cash-side account whose running balance the ledger maintains.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub owner_id: UserId,
    pub name: String,
    pub kind: AccountKind,
    pub current_balance_cents: Cents,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Creates an active account with a zero balance.
    pub fn new(owner_id: UserId, name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            kind,
            current_balance_cents: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_balance(mut self, balance_cents: Cents) -> Self {
        self.current_balance_cents = balance_cents;
        self
    }

    /// Whether the account may fund a movement or settle a card statement.
    pub fn can_settle(&self) -> bool {
        self.is_active && self.kind.is_settlement()
    }
}

impl Identifiable for Account {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for Account {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

impl Displayable for Account {
    fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.kind)
    }
}

/// Enumerates the supported account classifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AccountKind {
    Cash,
    Bank,
    CreditCard,
    Wallet,
}

impl AccountKind {
    /// Non-credit accounts hold real money and can pay statements.
    pub fn is_settlement(self) -> bool {
        !matches!(self, AccountKind::CreditCard)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cash" => Some(AccountKind::Cash),
            "bank" => Some(AccountKind::Bank),
            "credit" | "credit-card" | "credit_card" => Some(AccountKind::CreditCard),
            "wallet" => Some(AccountKind::Wallet),
            _ => None,
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AccountKind::Cash => "Cash",
            AccountKind::Bank => "Bank",
            AccountKind::CreditCard => "Credit card",
            AccountKind::Wallet => "Wallet",
        };
        f.write_str(label)
    }
}
