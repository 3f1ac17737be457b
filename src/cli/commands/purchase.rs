//! `purchase`, `overview` and `period` commands.

use uuid::Uuid;

use crate::cli::context::{
    parse_amount, parse_count, parse_date, parse_period, short_id, CommandError, CommandResult,
    ShellContext,
};
use crate::cli::output;
use crate::core::services::{
    InstallmentService, LegacyImportService, LegacyPurchase, NewPurchase, PurchasePatch,
    PurchaseService,
};

use super::{arg, options, positional, subcommand, usage, CommandDefinition};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "purchase",
            "Charge purchases to a card",
            &[
                "purchase add <card> <amount> <installments> [YYYY-MM-DD] [description] [category=<name>]",
                "purchase update <id> [amount=<n>] [installments=<n>] [date=<YYYY-MM-DD>] [description=<text>]",
                "purchase delete <id>",
                "purchase show <id>",
                "purchase import <card> <amount> <installments> <paid> <first YYYY-MM> [description]",
            ],
            cmd_purchase,
        ),
        CommandDefinition::new(
            "overview",
            "Limit usage and open statements of every active card",
            &["overview"],
            cmd_overview,
        ),
        CommandDefinition::new(
            "period",
            "Purchases billed in one statement period",
            &["period <card> [YYYY-MM]", "period <card> list"],
            cmd_period,
        ),
    ]
}

fn purchase_id(context: &ShellContext, prefix: &str) -> Result<Uuid, CommandError> {
    let ids = context.read(|ledger, owner| {
        Ok(ledger
            .purchases
            .iter()
            .filter(|purchase| purchase.owner_id == owner && !purchase.is_deleted)
            .map(|purchase| purchase.id)
            .collect::<Vec<_>>())
    })?;
    context.resolve_id(prefix, ids)
}

fn cmd_purchase(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (sub, rest) = subcommand(args, "purchase")?;
    let opts = options(rest);
    let rest = positional(rest);
    match sub.as_str() {
        "add" => {
            let card_id = context.card_id(arg(&rest, 0, "purchase")?)?;
            let total_amount_cents = parse_amount(arg(&rest, 1, "purchase")?)?;
            let installments_count = parse_count(arg(&rest, 2, "purchase")?)?;
            let occurred_at = match rest.get(3) {
                Some(raw) => parse_date(raw)?,
                None => context.now(),
            };
            let category_id = match opts.get("category") {
                Some(name) => Some(context.category_id(name)?),
                None => None,
            };
            let new = NewPurchase {
                card_id,
                category_id,
                total_amount_cents,
                installments_count,
                occurred_at,
                description: rest.get(4).map(|text| text.to_string()),
            };
            let purchase = context.write(|ledger, owner| PurchaseService::create(ledger, owner, new))?;
            output::success(format!(
                "Purchase {} of {} in {} installments (first statement #{})",
                short_id(purchase.id),
                context.money(purchase.total_amount_cents),
                purchase.installments_count,
                purchase.first_statement_sequence
            ));
        }
        "update" => {
            let id = purchase_id(context, arg(&rest, 0, "purchase")?)?;
            let mut patch = PurchasePatch::default();
            if let Some(raw) = opts.get("amount") {
                patch.total_amount_cents = Some(parse_amount(raw)?);
            }
            if let Some(raw) = opts.get("installments") {
                patch.installments_count = Some(parse_count(raw)?);
            }
            if let Some(raw) = opts.get("date") {
                patch.occurred_at = Some(parse_date(raw)?);
            }
            if let Some(text) = opts.get("description") {
                patch.description = Some(Some(text.to_string()));
            }
            if let Some(name) = opts.get("category") {
                patch.category_id = Some(Some(context.category_id(name)?));
            }
            let purchase =
                context.write(|ledger, owner| PurchaseService::update(ledger, owner, id, patch))?;
            output::success(format!(
                "Purchase {} now {} in {} installments",
                short_id(purchase.id),
                context.money(purchase.total_amount_cents),
                purchase.installments_count
            ));
        }
        "delete" => {
            let id = purchase_id(context, arg(&rest, 0, "purchase")?)?;
            context.write(|ledger, owner| PurchaseService::soft_delete(ledger, owner, id))?;
            output::success(format!("Purchase {} deleted", short_id(id)));
        }
        "show" => {
            let id = purchase_id(context, arg(&rest, 0, "purchase")?)?;
            let rows = context.read(|ledger, owner| {
                let purchase = PurchaseService::get(ledger, owner, id)?;
                Ok(PurchaseService::installments(ledger, owner, id)?
                    .into_iter()
                    .map(|installment| {
                        vec![
                            format!(
                                "{}/{}",
                                installment.installment_number, purchase.installments_count
                            ),
                            (purchase.first_statement_sequence
                                + installment.billing_cycle_offset)
                                .to_string(),
                            context.money(installment.amount_cents),
                            installment.status.to_string(),
                            installment
                                .period
                                .map(|period| period.to_string())
                                .unwrap_or_default(),
                        ]
                    })
                    .collect::<Vec<_>>())
            })?;
            output::table(&["INST", "STATEMENT #", "AMOUNT", "STATUS", "BILLED IN"], &rows);
        }
        "import" => {
            let card_id = context.card_id(arg(&rest, 0, "purchase")?)?;
            let total_amount_cents = parse_amount(arg(&rest, 1, "purchase")?)?;
            let installments_count = parse_count(arg(&rest, 2, "purchase")?)?;
            let paid_installments_count = parse_count(arg(&rest, 3, "purchase")?)?;
            let first_statement = parse_period(arg(&rest, 4, "purchase")?)?;
            let current = context.manager.clock().current_month();
            let occurred_at = first_statement.start_instant().ok_or_else(|| {
                CommandError::Message(format!("period {first_statement} is out of range"))
            })?;
            let legacy = LegacyPurchase {
                card_id,
                category_id: None,
                total_amount_cents,
                installments_count,
                paid_installments_count,
                occurred_at,
                description: rest.get(5).map(|text| text.to_string()),
                first_statement,
            };
            let outcome = context
                .write(|ledger, owner| LegacyImportService::import(ledger, owner, legacy, current))?;
            output::success(format!(
                "Imported purchase {} ({} of {} installments paid, {} statements created)",
                short_id(outcome.purchase.id),
                paid_installments_count,
                installments_count,
                outcome.created_statements.len()
            ));
        }
        _ => return Err(usage("purchase")),
    }
    Ok(())
}

fn cmd_overview(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let overview = context.read(|ledger, owner| Ok(InstallmentService::overview(ledger, owner)))?;
    let rows: Vec<Vec<String>> = overview
        .cards
        .iter()
        .map(|card| {
            vec![
                card.card_name.clone(),
                context.money(card.limit_cents),
                context.money(card.committed_cents),
                context.money(card.available_cents),
                card.open_statement
                    .as_ref()
                    .map(|open| open.period.to_string())
                    .unwrap_or_else(|| "-".into()),
                context.money(card.open_statement_accumulated_cents),
                card.active_purchases.to_string(),
            ]
        })
        .collect();
    output::table(
        &["CARD", "LIMIT", "COMMITTED", "AVAILABLE", "OPEN", "ACCUMULATED", "PURCHASES"],
        &rows,
    );
    output::info(format!(
        "committed {} of {}; open statements {}",
        context.money(overview.total_committed_cents),
        context.money(overview.total_limit_cents),
        context.money(overview.total_open_statement_cents)
    ));
    Ok(())
}

fn cmd_period(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let card_id = context.card_id(arg(args, 0, "period")?)?;
    if args.get(1).is_some_and(|raw| raw.eq_ignore_ascii_case("list")) {
        let rows = context.read(|ledger, owner| {
            Ok(InstallmentService::card_periods(ledger, owner, card_id)?
                .into_iter()
                .map(|period| {
                    vec![
                        period.sequence_number.to_string(),
                        period.period.to_string(),
                        period.status.to_string(),
                        context.money(period.total_cents),
                    ]
                })
                .collect::<Vec<_>>())
        })?;
        output::table(&["#", "PERIOD", "STATUS", "TOTAL"], &rows);
        return Ok(());
    }
    let period = match args.get(1) {
        Some(raw) => Some(parse_period(raw)?),
        None => None,
    };
    let detail = context.read(|ledger, owner| {
        InstallmentService::card_period_detail(ledger, owner, card_id, period)
    })?;
    output::section(&format!(
        "{} (#{}) {}",
        detail.statement.period, detail.statement.sequence_number, detail.statement.status
    ));
    let rows: Vec<Vec<String>> = detail
        .purchases
        .iter()
        .map(|row| {
            vec![
                short_id(row.purchase_id),
                row.description.clone().unwrap_or_default(),
                format!("{}/{}", row.installment_number, row.installments_count),
                context.money(row.installment_amount_cents),
                row.status.to_string(),
                row.remaining_count.to_string(),
            ]
        })
        .collect();
    output::table(
        &["PURCHASE", "DESCRIPTION", "INST", "AMOUNT", "STATUS", "REMAINING"],
        &rows,
    );
    output::info(format!("period total {}", context.money(detail.total_cents)));
    Ok(())
}
