//! Credit-card purchases and the installments they are split into.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

/// A purchase charged to a card, repaid over `installments_count` statements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Purchase {
    pub id: Uuid,
    pub owner_id: UserId,
    pub card_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub total_amount_cents: Cents,
    pub installments_count: u32,
    pub occurred_at: DateTime<Utc>,
    /// Sequence number of the statement that bills installment 1.
    pub first_statement_sequence: u32,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub is_legacy: bool,
    pub created_at: DateTime<Utc>,
}

impl Identifiable for Purchase {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for Purchase {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

impl Displayable for Purchase {
    fn display_label(&self) -> String {
        format!(
            "{} in {}x from #{}",
            format_cents(self.total_amount_cents),
            self.installments_count,
            self.first_statement_sequence
        )
    }
}

/// One slice of a purchase, billed by exactly one statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Installment {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub owner_id: UserId,
    /// 1-based ordinal inside the purchase.
    pub installment_number: u32,
    /// `installment_number - 1`; drives period arithmetic.
    pub billing_cycle_offset: u32,
    pub amount_cents: Cents,
    pub status: InstallmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<YearMonth>,
}

impl Installment {
    /// Moves the installment to `next`, refusing transitions outside the table.
    pub fn transition(&mut self, next: InstallmentStatus) -> Result<(), InstallmentStatus> {
        if self.status.can_transition_to(next) {
            self.status = next;
            Ok(())
        } else {
            Err(self.status)
        }
    }
}

impl Identifiable for Installment {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for Installment {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum InstallmentStatus {
    Pending,
    Billed,
    Paid,
}

impl InstallmentStatus {
    /// PENDING → BILLED → PAID.
    pub fn can_transition_to(self, next: InstallmentStatus) -> bool {
        matches!(
            (self, next),
            (InstallmentStatus::Pending, InstallmentStatus::Billed)
                | (InstallmentStatus::Billed, InstallmentStatus::Paid)
        )
    }

    /// Pending and billed installments count against the card limit.
    pub fn is_committed(self) -> bool {
        matches!(self, InstallmentStatus::Pending | InstallmentStatus::Billed)
    }
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstallmentStatus::Pending => "PENDING",
            InstallmentStatus::Billed => "BILLED",
            InstallmentStatus::Paid => "PAID",
        };
        f.write_str(label)
    }
}

/// Statement sequence an installment bills into.
///
/// This is the only periodization rule: closing, overviews and per-card
/// period queries all go through it.
pub fn effective_period(purchase: &Purchase, installment: &Installment) -> u32 {
    purchase.first_statement_sequence + installment.billing_cycle_offset
}

/// Splits `total` into `count` amounts. Every slice gets `total / count` and
/// the first one also absorbs the remainder, so the sum is exact.
///
/// Returns `None` for a zero count or a negative total.
pub fn allocate_installments(total: Cents, count: u32) -> Option<Vec<Cents>> {
    if count == 0 || total < 0 {
        return None;
    }
    let divisor = Cents::from(count);
    let base = total / divisor;
    let remainder = total % divisor;
    let mut amounts = vec![base; count as usize];
    amounts[0] += remainder;
    Some(amounts)
}

/// Builds the PENDING installment rows for `purchase` from the allocation rule.
pub fn generate_installments(purchase: &Purchase) -> Vec<Installment> {
    allocate_installments(purchase.total_amount_cents, purchase.installments_count)
        .unwrap_or_default()
        .into_iter()
        .zip(1u32..)
        .map(|(amount_cents, installment_number)| Installment {
            id: Uuid::new_v4(),
            purchase_id: purchase.id,
            owner_id: purchase.owner_id,
            installment_number,
            billing_cycle_offset: installment_number - 1,
            amount_cents,
            status: InstallmentStatus::Pending,
            statement_id: None,
            period: None,
        })
        .collect()
}
