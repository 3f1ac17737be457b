//! `account`, `movement` and `category` commands.

use crate::cli::context::{
    parse_amount, parse_date, short_id, CommandError, CommandResult, ShellContext,
};
use crate::cli::output;
use crate::core::services::{
    AccountFilter, AccountService, ActivityFilter, CategoryService, MovementQuery,
    MovementService, NewAccount, NewCategory, NewMovement, SummaryQuery,
};
use crate::domain::{AccountKind, CategoryKind, MovementKind};

use super::{arg, options, positional, subcommand, usage, CommandDefinition};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "account",
            "Manage cash, bank and wallet accounts",
            &[
                "account add <name> <cash|bank|wallet|credit> [opening]",
                "account list [active|inactive|all]",
                "account activate <name>",
                "account deactivate <name>",
            ],
            cmd_account,
        ),
        CommandDefinition::new(
            "movement",
            "Record income and expenses",
            &[
                "movement add <account> <income|expense> <amount> [YYYY-MM-DD] [description] [category=<name>]",
                "movement list [account] [page=<n>]",
                "movement delete <id>",
                "movement summary [account]",
            ],
            cmd_movement,
        ),
        CommandDefinition::new(
            "category",
            "Manage categories",
            &[
                "category add <name> <income|expense>",
                "category add <name> parent=<name>",
                "category list",
            ],
            cmd_category,
        ),
    ]
}

fn cmd_account(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (sub, rest) = subcommand(args, "account")?;
    match sub.as_str() {
        "add" => {
            let name = arg(rest, 0, "account")?.to_string();
            let kind_raw = arg(rest, 1, "account")?;
            let kind = AccountKind::parse(kind_raw)
                .ok_or_else(|| CommandError::Message(format!("unknown account type `{kind_raw}`")))?;
            let opening_balance_cents = match rest.get(2) {
                Some(raw) => parse_amount(raw)?,
                None => 0,
            };
            let account = context.write(|ledger, owner| {
                AccountService::create(
                    ledger,
                    owner,
                    NewAccount {
                        name,
                        kind,
                        opening_balance_cents,
                    },
                )
            })?;
            output::success(format!(
                "Account `{}` created with balance {}",
                account.name,
                context.money(account.current_balance_cents)
            ));
        }
        "list" => {
            let status = match rest.first().map(|raw| raw.to_ascii_lowercase()) {
                None => ActivityFilter::Active,
                Some(raw) if raw == "active" => ActivityFilter::Active,
                Some(raw) if raw == "inactive" => ActivityFilter::Inactive,
                Some(raw) if raw == "all" => ActivityFilter::All,
                Some(_) => return Err(usage("account")),
            };
            let rows = context.read(|ledger, owner| {
                Ok(AccountService::list(ledger, owner, AccountFilter { status, kind: None })
                    .into_iter()
                    .map(|account| {
                        vec![
                            account.name.clone(),
                            account.kind.to_string(),
                            context.money(account.current_balance_cents),
                            if account.is_active { "yes" } else { "no" }.to_string(),
                        ]
                    })
                    .collect::<Vec<_>>())
            })?;
            output::table(&["NAME", "TYPE", "BALANCE", "ACTIVE"], &rows);
        }
        "activate" | "deactivate" => {
            let id = context.account_id(arg(rest, 0, "account")?)?;
            let is_active = sub == "activate";
            let account = context
                .write(|ledger, owner| AccountService::set_active(ledger, owner, id, is_active))?;
            output::success(format!("Account `{}` is now {sub}d", account.name));
        }
        _ => return Err(usage("account")),
    }
    Ok(())
}

fn cmd_movement(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (sub, rest) = subcommand(args, "movement")?;
    let opts = options(rest);
    let rest = positional(rest);
    match sub.as_str() {
        "add" => {
            let account_id = context.account_id(arg(&rest, 0, "movement")?)?;
            let kind_raw = arg(&rest, 1, "movement")?;
            let kind = MovementKind::parse(kind_raw)
                .ok_or_else(|| CommandError::Message(format!("unknown movement type `{kind_raw}`")))?;
            let amount_cents = parse_amount(arg(&rest, 2, "movement")?)?;
            let occurred_at = match rest.get(3) {
                Some(raw) => parse_date(raw)?,
                None => context.now(),
            };
            let description = rest.get(4).map(|text| text.to_string());
            let category_id = match opts.get("category") {
                Some(name) => Some(context.category_id(name)?),
                None => None,
            };
            let movement = context.write(|ledger, owner| {
                MovementService::create(
                    ledger,
                    owner,
                    NewMovement {
                        account_id,
                        category_id,
                        kind,
                        amount_cents,
                        occurred_at,
                        description,
                    },
                )
            })?;
            output::success(format!(
                "Movement {} recorded; balance {}",
                short_id(movement.id),
                context.money(movement.balance_snapshot_cents)
            ));
        }
        "list" => {
            let account_id = match rest.first() {
                Some(name) => Some(context.account_id(name)?),
                None => None,
            };
            let page = match opts.get("page") {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| CommandError::Message(format!("invalid page `{raw}`")))?,
                None => 1,
            };
            let query = MovementQuery {
                account_id,
                page,
                ..MovementQuery::default()
            };
            let page = context.read(|ledger, owner| Ok(MovementService::list(ledger, owner, &query)))?;
            let rows: Vec<Vec<String>> = page
                .items
                .iter()
                .map(|movement| {
                    vec![
                        short_id(movement.id),
                        movement.occurred_at.format("%Y-%m-%d").to_string(),
                        movement.kind.to_string(),
                        context.money(movement.amount_cents),
                        context.money(movement.balance_snapshot_cents),
                        movement.description.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            output::table(&["ID", "DATE", "TYPE", "AMOUNT", "BALANCE", "DESCRIPTION"], &rows);
            output::info(format!(
                "page {} of {} ({} movements)",
                page.page,
                page.total_pages.max(1),
                page.total
            ));
        }
        "delete" => {
            let prefix = arg(&rest, 0, "movement")?;
            let ids = context.read(|ledger, owner| {
                Ok(ledger
                    .movements
                    .iter()
                    .filter(|m| m.owner_id == owner && !m.is_deleted)
                    .map(|m| m.id)
                    .collect::<Vec<_>>())
            })?;
            let id = context.resolve_id(prefix, ids)?;
            context.write(|ledger, owner| MovementService::reverse(ledger, owner, id))?;
            output::success(format!("Movement {} reversed", short_id(id)));
        }
        "summary" => {
            let account_id = match rest.first() {
                Some(name) => Some(context.account_id(name)?),
                None => None,
            };
            let summary = context.read(|ledger, owner| {
                Ok(MovementService::summary(
                    ledger,
                    owner,
                    SummaryQuery {
                        account_id,
                        ..SummaryQuery::default()
                    },
                ))
            })?;
            output::section("Movement summary");
            println!("  income   {}", context.money(summary.total_income_cents));
            println!("  expense  {}", context.money(summary.total_expense_cents));
            println!("  net      {}", context.money(summary.net_balance_cents));
            println!("  count    {}", summary.movements_count);
        }
        _ => return Err(usage("movement")),
    }
    Ok(())
}

fn cmd_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (sub, rest) = subcommand(args, "category")?;
    let opts = options(rest);
    let rest = positional(rest);
    match sub.as_str() {
        "add" => {
            let name = arg(&rest, 0, "category")?.to_string();
            let parent_id = match opts.get("parent") {
                Some(parent) => Some(context.category_id(parent)?),
                None => None,
            };
            let kind = match (rest.get(1), parent_id) {
                (Some(raw), _) => Some(CategoryKind::parse(raw).ok_or_else(|| {
                    CommandError::Message(format!("unknown category type `{raw}`"))
                })?),
                (None, Some(_)) => None,
                (None, None) => return Err(usage("category")),
            };
            let category = context.write(|ledger, owner| {
                CategoryService::create(
                    ledger,
                    owner,
                    NewCategory {
                        name,
                        kind,
                        parent_id,
                    },
                )
            })?;
            output::success(format!("Category `{}` created ({})", category.name, category.kind));
        }
        "list" => {
            let rows = context.read(|ledger, owner| {
                Ok(CategoryService::list(ledger, owner, true)
                    .into_iter()
                    .map(|category| {
                        let name = if category.parent_id.is_some() {
                            format!("  {}", category.name)
                        } else {
                            category.name.clone()
                        };
                        vec![
                            name,
                            category.kind.to_string(),
                            if category.is_global() { "global" } else { "own" }.to_string(),
                            if category.is_active { "yes" } else { "no" }.to_string(),
                        ]
                    })
                    .collect::<Vec<_>>())
            })?;
            output::table(&["NAME", "TYPE", "SCOPE", "ACTIVE"], &rows);
        }
        _ => return Err(usage("category")),
    }
    Ok(())
}
