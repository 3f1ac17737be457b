use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

/// A cash movement against one account. Immutable once recorded apart from
/// the soft-delete flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movement {
    pub id: Uuid,
    pub owner_id: UserId,
    pub account_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    pub kind: MovementKind,
    pub amount_cents: Cents,
    pub occurred_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Account balance right after this movement was applied.
    pub balance_snapshot_cents: Cents,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Identifiable for Movement {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for Movement {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

impl Displayable for Movement {
    fn display_label(&self) -> String {
        format!(
            "{} {} on {}",
            self.kind,
            format_cents(self.amount_cents),
            self.occurred_at.date_naive()
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MovementKind {
    Income,
    Expense,
}

impl MovementKind {
    /// Balance after applying a movement of this kind. `None` on overflow.
    pub fn apply(self, balance: Cents, amount: Cents) -> Option<Cents> {
        match self {
            MovementKind::Income => balance.checked_add(amount),
            MovementKind::Expense => balance.checked_sub(amount),
        }
    }

    /// Balance after undoing a movement of this kind.
    pub fn revert(self, balance: Cents, amount: Cents) -> Option<Cents> {
        match self {
            MovementKind::Income => balance.checked_sub(amount),
            MovementKind::Expense => balance.checked_add(amount),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "income" | "in" => Some(MovementKind::Income),
            "expense" | "out" => Some(MovementKind::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementKind::Income => f.write_str("Income"),
            MovementKind::Expense => f.write_str("Expense"),
        }
    }
}
