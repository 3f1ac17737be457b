//! Domain types representing movement and purchase categories.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

/// Categorises ledger activity. Categories without an owner are global and
/// visible to everyone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
    pub name: String,
    pub kind: CategoryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    pub is_active: bool,
}

impl Category {
    pub fn new(owner_id: Option<UserId>, name: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            kind,
            parent_id: None,
            is_active: true,
        }
    }

    pub fn is_global(&self) -> bool {
        self.owner_id.is_none()
    }

    pub fn is_visible_to(&self, owner: UserId) -> bool {
        self.owner_id.map_or(true, |id| id == owner)
    }
}

impl Identifiable for Category {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Category {
    fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.kind)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "income" => Some(CategoryKind::Income),
            "expense" => Some(CategoryKind::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKind::Income => f.write_str("Income"),
            CategoryKind::Expense => f.write_str("Expense"),
        }
    }
}
