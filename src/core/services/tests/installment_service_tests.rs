use uuid::Uuid;

use super::{at, ym, Fixture};
use crate::core::errors::ErrorKind;
use crate::core::services::{
    CreditCardService, InstallmentService, LegacyImportService, LegacyPurchase,
};
use crate::domain::{InstallmentStatus, StatementStatus};

#[test]
fn overview_accumulates_only_the_open_period() {
    let mut fx = Fixture::with(10_000, 5_000);
    let march = fx.open(ym(2024, 3));
    fx.purchase(900, 3, at(2024, 3, 4));
    fx.purchase(100, 1, at(2024, 3, 5));
    fx.purchase(400, 2, at(2024, 4, 5));

    let overview = InstallmentService::overview(&fx.ledger, fx.owner);

    assert_eq!(overview.cards.len(), 1);
    let card = &overview.cards[0];
    assert_eq!(card.committed_cents, 1_400);
    assert_eq!(card.available_cents, 3_600);
    assert_eq!(card.open_statement_accumulated_cents, 400);
    assert_eq!(card.active_purchases, 3);
    assert_eq!(
        card.open_statement.as_ref().map(|s| s.statement_id),
        Some(march.id)
    );
    assert_eq!(overview.total_committed_cents, 1_400);
    assert_eq!(overview.total_open_statement_cents, 400);
}

#[test]
fn overview_skips_inactive_cards() {
    let mut fx = Fixture::new();
    CreditCardService::set_active(&mut fx.ledger, fx.owner, fx.card_id, false).unwrap();

    let overview = InstallmentService::overview(&fx.ledger, fx.owner);
    assert!(overview.cards.is_empty());
    assert_eq!(overview.total_limit_cents, 0);
}

#[test]
fn period_detail_defaults_to_open_statement() {
    let mut fx = Fixture::new();
    let march = fx.open(ym(2024, 3));
    let spread = fx.purchase(900, 3, at(2024, 3, 4));
    fx.close(march.id);
    let april = fx.open(ym(2024, 4));
    fx.purchase(50, 1, at(2024, 4, 2));

    let detail =
        InstallmentService::card_period_detail(&fx.ledger, fx.owner, fx.card_id, None).unwrap();

    assert_eq!(detail.statement.id, april.id);
    assert_eq!(detail.purchases.len(), 2);
    assert_eq!(detail.total_cents, 350);
    let row = detail
        .purchases
        .iter()
        .find(|row| row.purchase_id == spread.id)
        .unwrap();
    assert_eq!(row.installment_number, 2);
    assert_eq!(row.status, InstallmentStatus::Pending);
    assert_eq!(row.paid_count, 0);
    assert_eq!(row.remaining_count, 3);
}

#[test]
fn period_detail_by_month_counts_paid_installments() {
    let mut fx = Fixture::new();
    let legacy = LegacyPurchase {
        card_id: fx.card_id,
        category_id: None,
        total_amount_cents: 600,
        installments_count: 3,
        paid_installments_count: 2,
        occurred_at: at(2024, 1, 3),
        description: None,
        first_statement: ym(2024, 1),
    };
    LegacyImportService::import(&mut fx.ledger, fx.owner, legacy, ym(2024, 3)).unwrap();

    let february =
        InstallmentService::card_period_detail(&fx.ledger, fx.owner, fx.card_id, Some(ym(2024, 2)))
            .unwrap();
    assert_eq!(february.purchases[0].status, InstallmentStatus::Paid);
    assert_eq!(february.purchases[0].paid_count, 2);
    assert_eq!(february.purchases[0].remaining_count, 1);

    let err =
        InstallmentService::card_period_detail(&fx.ledger, fx.owner, fx.card_id, Some(ym(2023, 12)))
            .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn periods_are_listed_newest_first() {
    let mut fx = Fixture::new();
    let march = fx.open(ym(2024, 3));
    fx.close(march.id);
    fx.open(ym(2024, 4));

    let periods = InstallmentService::card_periods(&fx.ledger, fx.owner, fx.card_id).unwrap();
    let labels: Vec<_> = periods.iter().map(|p| (p.period, p.status)).collect();
    assert_eq!(
        labels,
        vec![
            (ym(2024, 4), StatementStatus::Open),
            (ym(2024, 3), StatementStatus::Closed),
        ]
    );

    let err = InstallmentService::card_periods(&fx.ledger, Uuid::new_v4(), fx.card_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}
