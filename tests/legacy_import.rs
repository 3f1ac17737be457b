mod common;

use cardledger_core::core::services::{LegacyImportService, LegacyPurchase, StatementService};
use cardledger_core::core::ErrorKind;
use cardledger_core::domain::{InstallmentStatus, StatementOrigin, StatementStatus};
use common::{at, ym, World};

fn legacy(world: &World, total: i64, count: u32, paid: u32, first: (i32, u32)) -> LegacyPurchase {
    LegacyPurchase {
        card_id: world.card_id,
        category_id: None,
        total_amount_cents: total,
        installments_count: count,
        paid_installments_count: paid,
        occurred_at: at(first.0, first.1, 1),
        description: Some("notebook".into()),
        first_statement: ym(first.0, first.1),
    }
}

#[test]
fn history_is_rebuilt_without_touching_cash() {
    let world = World::new(50_000, 1_000_000);
    let owner = world.owner;
    let import = legacy(&world, 1_200, 6, 2, (2024, 1));

    let outcome = world
        .manager
        .transaction(|ledger| LegacyImportService::import(ledger, owner, import, ym(2024, 3)))
        .unwrap();

    let statuses: Vec<_> = outcome
        .created_statements
        .iter()
        .map(|s| (s.period, s.sequence_number, s.status, s.origin))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (ym(2024, 1), 1, StatementStatus::Paid, StatementOrigin::LegacyImport),
            (ym(2024, 2), 2, StatementStatus::Paid, StatementOrigin::LegacyImport),
            (ym(2024, 3), 3, StatementStatus::Open, StatementOrigin::LegacyImport),
        ]
    );
    let paid: Vec<_> = outcome
        .installments
        .iter()
        .map(|installment| installment.status)
        .collect();
    assert_eq!(&paid[..3], &[
        InstallmentStatus::Paid,
        InstallmentStatus::Paid,
        InstallmentStatus::Pending
    ]);
    assert!(outcome.purchase.is_legacy);
    assert_eq!(world.balance(), 50_000);
    assert_eq!(world.committed(), 800);
    let movements = world.manager.read(|ledger| Ok(ledger.movements.len())).unwrap();
    assert_eq!(movements, 0);
}

#[test]
fn imported_open_statement_closes_like_any_other() {
    let world = World::new(50_000, 1_000_000);
    let owner = world.owner;
    let import = legacy(&world, 900, 3, 1, (2024, 2));

    world
        .manager
        .transaction(|ledger| LegacyImportService::import(ledger, owner, import, ym(2024, 3)))
        .unwrap();
    let open = world
        .manager
        .read(|ledger| Ok(ledger.open_statement(world.card_id).cloned()))
        .unwrap()
        .expect("march is open");
    assert_eq!(open.period, ym(2024, 3));

    let closed = world.close(open.id).unwrap();
    assert_eq!(closed.total_cents, 300);

    let next = world.open(ym(2024, 4)).unwrap();
    assert_eq!(next.sequence_number, open.sequence_number + 1);
    let detail = world
        .manager
        .read(|ledger| StatementService::detail(ledger, owner, next.id))
        .unwrap();
    assert_eq!(detail.lines_total_cents, 300);
}

#[test]
fn paid_count_must_leave_something_to_bill() {
    let world = World::new(50_000, 1_000_000);
    let owner = world.owner;
    let import = legacy(&world, 900, 3, 3, (2024, 1));

    let err = world
        .manager
        .transaction(|ledger| LegacyImportService::import(ledger, owner, import, ym(2024, 3)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let statements = world.manager.read(|ledger| Ok(ledger.statements.len())).unwrap();
    assert_eq!(statements, 0);
}
