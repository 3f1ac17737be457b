use uuid::Uuid;

use super::{at, ym, Fixture};
use crate::core::errors::{BillingError, ErrorKind};
use crate::core::services::{
    CategoryService, NewCategory, PurchasePatch, PurchaseService,
};
use crate::domain::{CategoryKind, InstallmentStatus};

#[test]
fn thousand_cents_in_three_installments() {
    let mut fx = Fixture::new();
    fx.open(ym(2024, 3));
    let purchase = fx.purchase(1_000, 3, at(2024, 3, 10));

    let amounts: Vec<_> = PurchaseService::installments(&fx.ledger, fx.owner, purchase.id)
        .unwrap()
        .iter()
        .map(|installment| installment.amount_cents)
        .collect();
    assert_eq!(amounts, vec![334, 333, 333]);
    assert_eq!(purchase.first_statement_sequence, 1);
}

#[test]
fn purchase_over_the_limit_is_refused() {
    let mut fx = Fixture::with(10_000, 900);
    fx.open(ym(2024, 3));

    let new = fx.new_purchase(1_000, 3, at(2024, 3, 10));
    let err = PurchaseService::create(&mut fx.ledger, fx.owner, new).unwrap_err();

    assert!(matches!(
        err,
        BillingError::LimitExceeded {
            limit_cents: 900,
            committed_cents: 0,
            requested_cents: 1_000
        }
    ));
    assert!(fx.ledger.purchases.is_empty());
    assert!(fx.ledger.installments.is_empty());
}

#[test]
fn limit_counts_billed_but_not_paid_installments() {
    let mut fx = Fixture::with(10_000, 1_000);
    let march = fx.open(ym(2024, 3));
    fx.purchase(600, 1, at(2024, 3, 2));
    fx.close(march.id);

    let new = fx.new_purchase(500, 1, at(2024, 4, 2));
    let err = PurchaseService::create(&mut fx.ledger, fx.owner, new.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LimitExceeded);

    crate::core::services::StatementService::pay(
        &mut fx.ledger,
        fx.owner,
        march.id,
        Default::default(),
        at(2024, 4, 5),
    )
    .unwrap();
    PurchaseService::create(&mut fx.ledger, fx.owner, new).unwrap();
}

#[test]
fn invalid_schedules_are_rejected() {
    let mut fx = Fixture::new();
    for (total, count) in [(0, 1), (100, 0), (2, 3)] {
        let new = fx.new_purchase(total, count, at(2024, 3, 1));
        let err = PurchaseService::create(&mut fx.ledger, fx.owner, new).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput, "{total}/{count}");
    }
}

#[test]
fn category_and_card_are_validated() {
    let mut fx = Fixture::new();
    let salary = CategoryService::create(
        &mut fx.ledger,
        fx.owner,
        NewCategory {
            name: "Salary".into(),
            kind: Some(CategoryKind::Income),
            parent_id: None,
        },
    )
    .unwrap();

    let mut new = fx.new_purchase(100, 1, at(2024, 3, 1));
    new.category_id = Some(salary.id);
    let err = PurchaseService::create(&mut fx.ledger, fx.owner, new.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    new.category_id = None;
    new.card_id = Uuid::new_v4();
    let err = PurchaseService::create(&mut fx.ledger, fx.owner, new.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    new.card_id = fx.card_id;
    let err = PurchaseService::create(&mut fx.ledger, Uuid::new_v4(), new).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[test]
fn purchase_outside_open_window_is_queued_for_next_sequence() {
    let mut fx = Fixture::new();
    fx.open(ym(2024, 3));

    let late = fx.purchase(500, 1, at(2024, 4, 15));
    assert_eq!(late.first_statement_sequence, 2);

    let unopened = Fixture::new().purchase(500, 1, at(2024, 4, 15));
    assert_eq!(unopened.first_statement_sequence, 1);
}

#[test]
fn future_purchases_in_different_skipped_months_share_the_next_sequence() {
    // Both anchor to last + 1 because neither month has a statement yet;
    // the first statement opened afterwards bills both.
    let mut fx = Fixture::new();
    let march = fx.open(ym(2024, 3));
    fx.close(march.id);

    let may = fx.purchase(100, 1, at(2024, 5, 10));
    let june = fx.purchase(200, 1, at(2024, 6, 10));
    assert_eq!(may.first_statement_sequence, 2);
    assert_eq!(june.first_statement_sequence, 2);

    let next = fx.open(ym(2024, 5));
    let closed = fx.close(next.id);
    assert_eq!(closed.total_cents, 300);
}

#[test]
fn rescheduling_update_regenerates_installments() {
    let mut fx = Fixture::new();
    fx.open(ym(2024, 3));
    let purchase = fx.purchase(1_000, 3, at(2024, 3, 10));
    let before: Vec<Uuid> = fx
        .ledger
        .purchase_installments(purchase.id)
        .map(|installment| installment.id)
        .collect();

    let updated = PurchaseService::update(
        &mut fx.ledger,
        fx.owner,
        purchase.id,
        PurchasePatch {
            total_amount_cents: Some(1_001),
            installments_count: Some(4),
            ..PurchasePatch::default()
        },
    )
    .unwrap();

    let after: Vec<_> = fx.ledger.purchase_installments(purchase.id).collect();
    assert_eq!(updated.installments_count, 4);
    assert_eq!(after.len(), 4);
    assert_eq!(
        after.iter().map(|i| i.amount_cents).collect::<Vec<_>>(),
        vec![251, 250, 250, 250]
    );
    assert!(after.iter().all(|installment| !before.contains(&installment.id)));
}

#[test]
fn description_update_keeps_schedule() {
    let mut fx = Fixture::new();
    fx.open(ym(2024, 3));
    let purchase = fx.purchase(1_000, 2, at(2024, 3, 10));
    let before: Vec<Uuid> = fx
        .ledger
        .purchase_installments(purchase.id)
        .map(|installment| installment.id)
        .collect();

    PurchaseService::update(
        &mut fx.ledger,
        fx.owner,
        purchase.id,
        PurchasePatch {
            description: Some(Some("Supermarket".into())),
            ..PurchasePatch::default()
        },
    )
    .unwrap();

    let after: Vec<Uuid> = fx
        .ledger
        .purchase_installments(purchase.id)
        .map(|installment| installment.id)
        .collect();
    assert_eq!(before, after);
}

#[test]
fn update_respects_limit_without_double_counting_itself() {
    let mut fx = Fixture::with(10_000, 1_000);
    fx.open(ym(2024, 3));
    let purchase = fx.purchase(800, 2, at(2024, 3, 10));

    PurchaseService::update(
        &mut fx.ledger,
        fx.owner,
        purchase.id,
        PurchasePatch {
            total_amount_cents: Some(1_000),
            ..PurchasePatch::default()
        },
    )
    .unwrap();

    let err = PurchaseService::update(
        &mut fx.ledger,
        fx.owner,
        purchase.id,
        PurchasePatch {
            total_amount_cents: Some(1_001),
            ..PurchasePatch::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LimitExceeded);
}

#[test]
fn committed_debt_can_leave_one_purchase_out() {
    let mut fx = Fixture::with(10_000, 5_000);
    fx.open(ym(2024, 3));
    let first = fx.purchase(900, 3, at(2024, 3, 10));
    let second = fx.purchase(400, 2, at(2024, 3, 12));

    assert_eq!(fx.ledger.committed_debt(fx.card_id), 1_300);
    assert_eq!(
        fx.ledger.committed_debt_excluding(fx.card_id, Some(first.id)),
        400
    );
    assert_eq!(
        fx.ledger.committed_debt_excluding(fx.card_id, Some(second.id)),
        900
    );
    assert_eq!(
        fx.ledger.committed_debt_excluding(fx.card_id, Some(Uuid::new_v4())),
        1_300
    );
}

#[test]
fn billed_purchase_is_immutable() {
    let mut fx = Fixture::new();
    let march = fx.open(ym(2024, 3));
    let purchase = fx.purchase(1_000, 3, at(2024, 3, 10));
    fx.close(march.id);

    let err = PurchaseService::update(
        &mut fx.ledger,
        fx.owner,
        purchase.id,
        PurchasePatch {
            description: Some(None),
            ..PurchasePatch::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let err = PurchaseService::soft_delete(&mut fx.ledger, fx.owner, purchase.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(fx.ledger.purchase_installments(purchase.id).count(), 3);
}

#[test]
fn soft_delete_frees_the_limit() {
    let mut fx = Fixture::with(10_000, 1_000);
    fx.open(ym(2024, 3));
    let purchase = fx.purchase(1_000, 2, at(2024, 3, 10));

    let deleted = PurchaseService::soft_delete(&mut fx.ledger, fx.owner, purchase.id).unwrap();

    assert!(deleted.is_deleted);
    assert_eq!(fx.ledger.committed_debt(fx.card_id), 0);
    assert_eq!(fx.ledger.purchase_installments(purchase.id).count(), 0);
    let err = PurchaseService::get(&fx.ledger, fx.owner, purchase.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    fx.purchase(1_000, 1, at(2024, 3, 11));
    assert!(fx
        .ledger
        .installments
        .iter()
        .all(|installment| installment.status == InstallmentStatus::Pending));
}
