//! Monthly credit-card statements and their lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

/// One billing cycle of a card.
///
/// `sequence_number` is the canonical period identifier: it starts at 1 per
/// card, never skips and never repeats. `period` is only a calendar label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Statement {
    pub id: Uuid,
    pub card_id: Uuid,
    pub owner_id: UserId,
    pub sequence_number: u32,
    pub period: YearMonth,
    pub period_start_date: DateTime<Utc>,
    pub closing_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub status: StatementStatus,
    /// Sum of billed installments; fixed once the statement is closed.
    pub total_cents: Cents,
    #[serde(default)]
    pub origin: StatementOrigin,
    pub created_at: DateTime<Utc>,
}

impl Statement {
    /// Whether `instant` falls in `[period_start_date, closing_date)`.
    pub fn covers(&self, instant: DateTime<Utc>) -> bool {
        self.period_start_date <= instant && instant < self.closing_date
    }

    pub fn is_open(&self) -> bool {
        self.status == StatementStatus::Open
    }

    /// Moves the statement to `next`, refusing transitions outside the table.
    pub fn transition(&mut self, next: StatementStatus) -> Result<(), StatementStatus> {
        if self.status.can_transition_to(next) {
            self.status = next;
            Ok(())
        } else {
            Err(self.status)
        }
    }
}

impl Identifiable for Statement {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for Statement {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

impl Displayable for Statement {
    fn display_label(&self) -> String {
        format!(
            "#{} {} [{}] {}",
            self.sequence_number,
            self.period,
            self.status,
            format_cents(self.total_cents)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StatementStatus {
    Open,
    Closed,
    Paid,
}

impl StatementStatus {
    /// OPEN → CLOSED → PAID. Legacy synthesis creates PAID statements
    /// directly and never transitions them.
    pub fn can_transition_to(self, next: StatementStatus) -> bool {
        matches!(
            (self, next),
            (StatementStatus::Open, StatementStatus::Closed)
                | (StatementStatus::Closed, StatementStatus::Paid)
        )
    }
}

impl fmt::Display for StatementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatementStatus::Open => "OPEN",
            StatementStatus::Closed => "CLOSED",
            StatementStatus::Paid => "PAID",
        };
        f.write_str(label)
    }
}

/// How a statement came to exist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StatementOrigin {
    /// Opened by the regular monthly cycle.
    #[default]
    Cycle,
    /// Synthesized while importing history from a previous system.
    LegacyImport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_only_moves_forward() {
        use StatementStatus::*;
        assert!(Open.can_transition_to(Closed));
        assert!(Closed.can_transition_to(Paid));
        assert!(!Open.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Open));
        assert!(!Closed.can_transition_to(Closed));
    }
}
