use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

/// A revolving credit line. The card never stores a balance: committed debt
/// is always derived from its installments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreditCard {
    pub id: Uuid,
    pub owner_id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_last4: Option<String>,
    pub limit_cents: Cents,
    /// Non-credit account the statements are usually settled from.
    pub settlement_account_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl CreditCard {
    pub fn new(
        owner_id: UserId,
        name: impl Into<String>,
        limit_cents: Cents,
        settlement_account_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            brand: None,
            card_last4: None,
            limit_cents,
            settlement_account_id,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

impl Identifiable for CreditCard {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for CreditCard {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

impl Displayable for CreditCard {
    fn display_label(&self) -> String {
        match &self.card_last4 {
            Some(last4) => format!("{} •••• {}", self.name, last4),
            None => self.name.clone(),
        }
    }
}
