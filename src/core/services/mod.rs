pub mod account_service;
pub mod category_service;
pub mod credit_card_service;
pub mod installment_service;
pub mod legacy_import_service;
pub mod movement_service;
pub mod purchase_service;
pub mod statement_service;

pub use account_service::{AccountFilter, AccountService, ActivityFilter, NewAccount};
pub use category_service::{CategoryService, NewCategory};
pub use credit_card_service::{CardSummary, CreditCardPatch, CreditCardService, NewCreditCard};
pub use installment_service::{
    CardOverview, CardPeriodDetail, InstallmentService, InstallmentsOverview, OpenStatementRef,
    PeriodPurchase, PeriodSummary,
};
pub use legacy_import_service::{LegacyImportOutcome, LegacyImportService, LegacyPurchase};
pub use movement_service::{
    MovementPatch, MovementQuery, MovementService, MovementSummary, NewMovement, Page,
    SummaryQuery,
};
pub use purchase_service::{NewPurchase, PurchasePatch, PurchaseService};
pub use statement_service::{
    NewStatement, StatementDatesPatch, StatementDetail, StatementLine, StatementPayment,
    StatementService,
};

use uuid::Uuid;

use crate::core::errors::{BillingError, BillingResult};
use crate::domain::{Cents, Owned, UserId};

/// Resolves a row addressed by id: absent is `NotFound`, owned by someone
/// else is `Forbidden`.
pub(crate) fn ensure_owned<'a, T: Owned>(
    row: Option<&'a T>,
    owner: UserId,
    entity: &str,
    id: Uuid,
) -> BillingResult<&'a T> {
    let row = row.ok_or_else(|| BillingError::NotFound(format!("{entity} {id} not found")))?;
    if !row.is_owned_by(owner) {
        return Err(BillingError::Forbidden(format!(
            "{entity} {id} belongs to another user"
        )));
    }
    Ok(row)
}

pub(crate) fn ensure_positive(amount: Cents, field: &str) -> BillingResult<()> {
    if amount <= 0 {
        return Err(BillingError::InvalidInput(format!(
            "{field} must be positive, got {amount}"
        )));
    }
    Ok(())
}

/// Trims free text and maps blank input to `None`.
pub(crate) fn clean_text(raw: Option<String>) -> Option<String> {
    raw.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests;
