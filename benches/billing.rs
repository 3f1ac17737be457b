use cardledger_core::core::services::{
    AccountService, CreditCardService, InstallmentService, NewAccount, NewCreditCard,
    NewPurchase, NewStatement, PurchaseService, StatementService,
};
use cardledger_core::domain::{AccountKind, Ledger, UserId, YearMonth};
use cardledger_core::storage::json_backend::{load_ledger_from_path, save_ledger_to_path};
use chrono::Duration;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::tempdir;
use uuid::Uuid;

fn window(card_id: Uuid, period: YearMonth) -> NewStatement {
    let closing_date = period.add_months(1).start_instant().expect("window");
    NewStatement {
        card_id,
        period,
        period_start_date: period.start_instant().expect("window"),
        closing_date,
        due_date: closing_date + Duration::days(10),
    }
}

/// A card with `months` closed statements behind it, `per_month` purchases
/// charged each month, and the last statement left OPEN.
fn build_card_history(months: u32, per_month: u32) -> (Ledger, UserId, Uuid) {
    let mut ledger = Ledger::new();
    let owner = Uuid::new_v4();
    let account = AccountService::create(
        &mut ledger,
        owner,
        NewAccount {
            name: "Checking".into(),
            kind: AccountKind::Bank,
            opening_balance_cents: 0,
        },
    )
    .expect("account");
    let card = CreditCardService::create(
        &mut ledger,
        owner,
        NewCreditCard {
            name: "Visa".into(),
            brand: None,
            card_last4: None,
            limit_cents: i64::MAX / 4,
            settlement_account_id: account.id,
        },
    )
    .expect("card");

    let first = YearMonth::new(2022, 1).expect("period");
    let mut open = None;
    for month in 0..months {
        let period = first.add_months(i64::from(month));
        let statement = StatementService::open_or_get(&mut ledger, owner, window(card.id, period))
            .expect("open");
        for index in 0..per_month {
            PurchaseService::create(
                &mut ledger,
                owner,
                NewPurchase {
                    card_id: card.id,
                    category_id: None,
                    total_amount_cents: 10_000 + i64::from(index),
                    installments_count: 1 + index % 12,
                    occurred_at: statement.period_start_date + Duration::hours(i64::from(index)),
                    description: None,
                },
            )
            .expect("purchase");
        }
        if month + 1 < months {
            StatementService::close(&mut ledger, owner, statement.id).expect("close");
        } else {
            open = Some(statement.id);
        }
    }
    (ledger, owner, open.expect("open statement"))
}

fn bench_close(c: &mut Criterion) {
    let (ledger, owner, open) = build_card_history(black_box(36), black_box(100));

    c.bench_function("close_statement_36_months", |b| {
        b.iter_batched(
            || ledger.clone(),
            |mut ledger| {
                let closed = StatementService::close(&mut ledger, owner, open).expect("close");
                black_box(closed);
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("installments_overview", |b| {
        b.iter(|| black_box(InstallmentService::overview(&ledger, owner)))
    });
}

fn bench_ledger_io(c: &mut Criterion) {
    let (ledger, _, _) = build_card_history(black_box(36), black_box(100));
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ledger.json");

    c.bench_function("ledger_save_36_months", |b| {
        b.iter(|| save_ledger_to_path(&ledger, &path).expect("save ledger"))
    });

    save_ledger_to_path(&ledger, &path).expect("seed");
    c.bench_function("ledger_load_36_months", |b| {
        b.iter(|| black_box(load_ledger_from_path(&path).expect("load ledger")))
    });
}

criterion_group!(benches, bench_close, bench_ledger_io);
criterion_main!(benches);
