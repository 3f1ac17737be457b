//! Ledger domain models, persistence-friendly types, and period arithmetic.

pub mod account;
pub mod category;
pub mod common;
pub mod credit_card;
pub mod ledger;
pub mod movement;
pub mod purchase;
pub mod statement;

pub use account::{Account, AccountKind};
pub use category::{Category, CategoryKind};
pub use common::{
    format_cents, parse_cents, Cents, Displayable, Identifiable, Owned, UserId, YearMonth,
};
pub use credit_card::CreditCard;
pub use ledger::{Ledger, CURRENT_SCHEMA_VERSION};
pub use movement::{Movement, MovementKind};
pub use purchase::{
    allocate_installments, effective_period, generate_installments, Installment,
    InstallmentStatus, Purchase,
};
pub use statement::{Statement, StatementOrigin, StatementStatus};
