//! Shell state, error types and command dispatch.

use std::io;

use chrono::{DateTime, NaiveDate, Utc};
use rustyline::error::ReadlineError;
use strsim::levenshtein;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::{Config, ConfigManager},
    core::{
        services::{AccountService, CategoryService, CreditCardService},
        BillingError, BillingResult, LedgerManager,
    },
    core::utils::PathResolver,
    domain::{format_cents, parse_cents, Cents, Ledger, Statement, UserId, YearMonth},
    errors::LedgerError,
    storage::JsonStorage,
};

use super::commands::{CommandRegistry, REGISTRY};
use super::output;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Storage(#[from] LedgerError),
}

/// Failure of a single command; reported and the shell keeps running.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("usage: {0}")]
    Usage(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Billing(#[from] BillingError),
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub struct ShellContext {
    pub(crate) mode: CliMode,
    pub(crate) manager: LedgerManager,
    pub(crate) config: Config,
    pub(crate) running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let base = PathResolver::base_dir();
        let config = ConfigManager::with_base_dir(base.clone())?.load_or_init()?;
        crate::init_with_filter(&config.log_filter);
        let manager = LedgerManager::new(Box::new(JsonStorage::in_dir(Some(base))))?;
        Ok(Self {
            mode,
            manager,
            config,
            running: true,
        })
    }

    pub(crate) fn registry(&self) -> &'static CommandRegistry {
        &REGISTRY
    }

    pub(crate) fn owner(&self) -> UserId {
        self.config.owner_id
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.manager.clock().now()
    }

    pub(crate) fn prompt(&self) -> String {
        match self.mode {
            CliMode::Interactive => format!("cardledger[{}]> ", self.config.currency),
            CliMode::Script => String::new(),
        }
    }

    pub(crate) fn money(&self, cents: Cents) -> String {
        format!("{} {}", format_cents(cents), self.config.currency)
    }

    /// Runs a mutating service call inside one ledger transaction.
    pub(crate) fn write<T, F>(&self, operation: F) -> Result<T, CommandError>
    where
        F: FnOnce(&mut Ledger, UserId) -> BillingResult<T>,
    {
        let owner = self.owner();
        Ok(self.manager.transaction(|ledger| operation(ledger, owner))?)
    }

    pub(crate) fn read<T, F>(&self, query: F) -> Result<T, CommandError>
    where
        F: FnOnce(&Ledger, UserId) -> BillingResult<T>,
    {
        let owner = self.owner();
        Ok(self.manager.read(|ledger| query(ledger, owner))?)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        match command {
            "exit" | "quit" => return Ok(LoopControl::Exit),
            _ => {}
        }
        match self.registry().get(command) {
            Some(definition) => {
                (definition.handler)(self, args)?;
                Ok(LoopControl::Continue)
            }
            None => {
                self.suggest_command(raw);
                Ok(LoopControl::Continue)
            }
        }
    }

    fn suggest_command(&self, input: &str) {
        output::warning(format!("unknown command `{input}`"));
        let needle = input.to_ascii_lowercase();
        let best = self
            .registry()
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .min_by_key(|(distance, _)| *distance);
        if let Some((distance, name)) = best {
            if distance <= 3 {
                output::info(format!("Suggestion: `{name}`?"));
            }
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        output::error(err);
    }

    // Name-based lookups for shell arguments.

    pub(crate) fn account_id(&self, name: &str) -> Result<Uuid, CommandError> {
        self.read(|ledger, owner| {
            Ok(AccountService::find_by_name(ledger, owner, name).map(|account| account.id))
        })?
        .ok_or_else(|| CommandError::Message(format!("no account named `{name}`")))
    }

    pub(crate) fn card_id(&self, name: &str) -> Result<Uuid, CommandError> {
        self.read(|ledger, owner| {
            Ok(CreditCardService::find_by_name(ledger, owner, name).map(|card| card.id))
        })?
        .ok_or_else(|| CommandError::Message(format!("no card named `{name}`")))
    }

    pub(crate) fn category_id(&self, name: &str) -> Result<Uuid, CommandError> {
        self.read(|ledger, owner| {
            Ok(CategoryService::find_by_name(ledger, owner, name).map(|category| category.id))
        })?
        .ok_or_else(|| CommandError::Message(format!("no category named `{name}`")))
    }

    /// Statement addressed as `<card> <YYYY-MM>`.
    pub(crate) fn statement(&self, card: &str, period: &str) -> Result<Statement, CommandError> {
        let card_id = self.card_id(card)?;
        let period = parse_period(period)?;
        self.read(|ledger, _| Ok(ledger.statement_for_period(card_id, period).cloned()))?
            .ok_or_else(|| CommandError::Message(format!("`{card}` has no statement for {period}")))
    }

    /// Resolves a full id or a unique prefix of one.
    pub(crate) fn resolve_id<I>(&self, prefix: &str, ids: I) -> Result<Uuid, CommandError>
    where
        I: IntoIterator<Item = Uuid>,
    {
        let needle = prefix.trim().to_ascii_lowercase();
        let mut matches = ids
            .into_iter()
            .filter(|id| id.to_string().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(id), None) => Ok(id),
            (Some(_), Some(_)) => Err(CommandError::Message(format!(
                "id prefix `{prefix}` is ambiguous"
            ))),
            (None, _) => Err(CommandError::Message(format!("no row matches `{prefix}`"))),
        }
    }
}

pub(crate) fn parse_amount(raw: &str) -> Result<Cents, CommandError> {
    parse_cents(raw).ok_or_else(|| CommandError::Message(format!("invalid amount `{raw}`")))
}

pub(crate) fn parse_period(raw: &str) -> Result<YearMonth, CommandError> {
    YearMonth::parse(raw)
        .ok_or_else(|| CommandError::Message(format!("invalid period `{raw}`, expected YYYY-MM")))
}

/// `YYYY-MM-DD`, taken at noon UTC so the day never shifts.
pub(crate) fn parse_date(raw: &str) -> Result<DateTime<Utc>, CommandError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CommandError::Message(format!("invalid date `{raw}`, expected YYYY-MM-DD")))
}

pub(crate) fn parse_count(raw: &str) -> Result<u32, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::Message(format!("invalid count `{raw}`")))
}

pub(crate) fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}
