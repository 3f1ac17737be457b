//! `card` and `statement` commands.

use chrono::Duration;

use crate::cli::context::{
    parse_amount, parse_date, parse_period, short_id, CommandError, CommandResult, ShellContext,
};
use crate::cli::output;
use crate::core::services::{
    CreditCardPatch, CreditCardService, NewCreditCard, NewStatement, StatementDatesPatch,
    StatementPayment, StatementService,
};
use crate::domain::{Displayable, YearMonth};

use super::{arg, options, positional, subcommand, usage, CommandDefinition};

/// Days from closing to due date when `statement open` gets no dates.
const DEFAULT_DUE_DAYS: i64 = 10;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "card",
            "Manage credit cards",
            &[
                "card add <name> <limit> <settlement-account> [last4] [brand=<brand>]",
                "card list [all]",
                "card summary <card>",
                "card limit <card> <limit>",
                "card activate <card>",
                "card deactivate <card>",
            ],
            cmd_card,
        ),
        CommandDefinition::new(
            "statement",
            "Open, close and pay card statements",
            &[
                "statement open <card> <YYYY-MM> [start closing due]",
                "statement close <card> <YYYY-MM>",
                "statement pay <card> <YYYY-MM> [account=<name>] [date=<YYYY-MM-DD>]",
                "statement dates <card> <YYYY-MM> <start> <closing> <due>",
                "statement list <card>",
                "statement show <card> <YYYY-MM>",
            ],
            cmd_statement,
        ),
    ]
}

fn cmd_card(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (sub, rest) = subcommand(args, "card")?;
    let opts = options(rest);
    let rest = positional(rest);
    match sub.as_str() {
        "add" => {
            let name = arg(&rest, 0, "card")?.to_string();
            let limit_cents = parse_amount(arg(&rest, 1, "card")?)?;
            let settlement_account_id = context.account_id(arg(&rest, 2, "card")?)?;
            let new = NewCreditCard {
                name,
                brand: opts.get("brand").map(|brand| brand.to_string()),
                card_last4: rest.get(3).map(|last4| last4.to_string()),
                limit_cents,
                settlement_account_id,
            };
            let card = context.write(|ledger, owner| CreditCardService::create(ledger, owner, new))?;
            output::success(format!(
                "Card `{}` created with limit {}",
                card.name,
                context.money(card.limit_cents)
            ));
        }
        "list" => {
            let include_inactive = rest.first().is_some_and(|raw| raw.eq_ignore_ascii_case("all"));
            let rows = context.read(|ledger, owner| {
                Ok(CreditCardService::list(ledger, owner, include_inactive)
                    .into_iter()
                    .map(|card| {
                        let committed = ledger.committed_debt(card.id);
                        vec![
                            card.name.clone(),
                            card.card_last4.clone().unwrap_or_default(),
                            context.money(card.limit_cents),
                            context.money(committed),
                            context.money(card.limit_cents - committed),
                            if card.is_active { "yes" } else { "no" }.to_string(),
                        ]
                    })
                    .collect::<Vec<_>>())
            })?;
            output::table(
                &["NAME", "LAST4", "LIMIT", "COMMITTED", "AVAILABLE", "ACTIVE"],
                &rows,
            );
        }
        "summary" => {
            let id = context.card_id(arg(&rest, 0, "card")?)?;
            let summary =
                context.read(|ledger, owner| CreditCardService::summary(ledger, owner, id))?;
            output::section(summary.card.display_label());
            println!("  limit      {}", context.money(summary.limit_cents));
            println!("  committed  {}", context.money(summary.committed_cents));
            println!("  available  {}", context.money(summary.available_cents));
            match summary.open_statement {
                Some(statement) => println!(
                    "  open       {} (#{}, closes {})",
                    statement.period,
                    statement.sequence_number,
                    statement.closing_date.format("%Y-%m-%d")
                ),
                None => println!("  open       none"),
            }
        }
        "limit" => {
            let id = context.card_id(arg(&rest, 0, "card")?)?;
            let limit_cents = parse_amount(arg(&rest, 1, "card")?)?;
            let patch = CreditCardPatch {
                limit_cents: Some(limit_cents),
                ..CreditCardPatch::default()
            };
            let card =
                context.write(|ledger, owner| CreditCardService::update(ledger, owner, id, patch))?;
            output::success(format!(
                "Card `{}` limit set to {}",
                card.name,
                context.money(card.limit_cents)
            ));
        }
        "activate" | "deactivate" => {
            let id = context.card_id(arg(&rest, 0, "card")?)?;
            let is_active = sub == "activate";
            let card = context
                .write(|ledger, owner| CreditCardService::set_active(ledger, owner, id, is_active))?;
            output::success(format!("Card `{}` is now {sub}d", card.name));
        }
        _ => return Err(usage("card")),
    }
    Ok(())
}

/// Calendar-month window: starts on the 1st, closes on the 1st of the next
/// month and falls due ten days later.
fn month_window(card_id: uuid::Uuid, period: YearMonth) -> Result<NewStatement, CommandError> {
    let out_of_range = || CommandError::Message(format!("period {period} is out of range"));
    let period_start_date = period.start_instant().ok_or_else(out_of_range)?;
    let closing_date = period.add_months(1).start_instant().ok_or_else(out_of_range)?;
    Ok(NewStatement {
        card_id,
        period,
        period_start_date,
        closing_date,
        due_date: closing_date + Duration::days(DEFAULT_DUE_DAYS),
    })
}

fn cmd_statement(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (sub, rest) = subcommand(args, "statement")?;
    let opts = options(rest);
    let rest = positional(rest);
    match sub.as_str() {
        "open" => {
            let card_id = context.card_id(arg(&rest, 0, "statement")?)?;
            let period = parse_period(arg(&rest, 1, "statement")?)?;
            let new = match rest.get(2..5) {
                Some([start, closing, due]) => NewStatement {
                    card_id,
                    period,
                    period_start_date: parse_date(start)?,
                    closing_date: parse_date(closing)?,
                    due_date: parse_date(due)?,
                },
                _ if rest.len() == 2 => month_window(card_id, period)?,
                _ => return Err(usage("statement")),
            };
            let statement =
                context.write(|ledger, owner| StatementService::open_or_get(ledger, owner, new))?;
            output::success(format!(
                "Statement {} (#{}) is {}",
                statement.period, statement.sequence_number, statement.status
            ));
        }
        "close" => {
            let statement =
                context.statement(arg(&rest, 0, "statement")?, arg(&rest, 1, "statement")?)?;
            let closed =
                context.write(|ledger, owner| StatementService::close(ledger, owner, statement.id))?;
            output::success(format!(
                "Statement {} closed with total {}",
                closed.period,
                context.money(closed.total_cents)
            ));
        }
        "pay" => {
            let card_name = arg(&rest, 0, "statement")?;
            let statement = context.statement(card_name, arg(&rest, 1, "statement")?)?;
            let account_id = match opts.get("account") {
                Some(name) => Some(context.account_id(name)?),
                None => None,
            };
            let occurred_at = match opts.get("date") {
                Some(raw) => Some(parse_date(raw)?),
                None => None,
            };
            let card_label = context.read(|ledger, owner| {
                Ok(CreditCardService::get(ledger, owner, statement.card_id)?.name.clone())
            })?;
            let payment = StatementPayment {
                account_id,
                occurred_at,
                description: Some(
                    context
                        .config
                        .render_payment_description(&card_label, statement.period),
                ),
            };
            let now = context.now();
            let (paid, movement) = context.write(|ledger, owner| {
                StatementService::pay(ledger, owner, statement.id, payment, now)
            })?;
            output::success(format!(
                "Statement {} paid: {} (movement {}, balance {})",
                paid.period,
                context.money(paid.total_cents),
                short_id(movement.id),
                context.money(movement.balance_snapshot_cents)
            ));
        }
        "dates" => {
            let statement =
                context.statement(arg(&rest, 0, "statement")?, arg(&rest, 1, "statement")?)?;
            let patch = StatementDatesPatch {
                period_start_date: Some(parse_date(arg(&rest, 2, "statement")?)?),
                closing_date: Some(parse_date(arg(&rest, 3, "statement")?)?),
                due_date: Some(parse_date(arg(&rest, 4, "statement")?)?),
            };
            let updated = context.write(|ledger, owner| {
                StatementService::update_dates(ledger, owner, statement.id, patch)
            })?;
            output::success(format!(
                "Statement {} now closes {} and is due {}",
                updated.period,
                updated.closing_date.format("%Y-%m-%d"),
                updated.due_date.format("%Y-%m-%d")
            ));
        }
        "list" => {
            let card_id = context.card_id(arg(&rest, 0, "statement")?)?;
            let rows = context.read(|ledger, owner| {
                Ok(StatementService::list_by_card(ledger, owner, card_id)?
                    .into_iter()
                    .map(|statement| {
                        vec![
                            statement.sequence_number.to_string(),
                            statement.period.to_string(),
                            statement.status.to_string(),
                            statement.closing_date.format("%Y-%m-%d").to_string(),
                            statement.due_date.format("%Y-%m-%d").to_string(),
                            context.money(statement.total_cents),
                        ]
                    })
                    .collect::<Vec<_>>())
            })?;
            output::table(&["#", "PERIOD", "STATUS", "CLOSING", "DUE", "TOTAL"], &rows);
        }
        "show" => {
            let statement =
                context.statement(arg(&rest, 0, "statement")?, arg(&rest, 1, "statement")?)?;
            let detail =
                context.read(|ledger, owner| StatementService::detail(ledger, owner, statement.id))?;
            output::section(&format!(
                "Statement {} (#{}) {}",
                detail.statement.period, detail.statement.sequence_number, detail.statement.status
            ));
            let rows: Vec<Vec<String>> = detail
                .lines
                .iter()
                .map(|line| {
                    vec![
                        short_id(line.purchase_id),
                        line.description.clone().unwrap_or_default(),
                        format!("{}/{}", line.installment_number, line.installments_count),
                        context.money(line.amount_cents),
                        line.status.to_string(),
                    ]
                })
                .collect();
            output::table(&["PURCHASE", "DESCRIPTION", "INST", "AMOUNT", "STATUS"], &rows);
            output::info(format!("lines total {}", context.money(detail.lines_total_cents)));
        }
        _ => return Err(usage("statement")),
    }
    Ok(())
}
