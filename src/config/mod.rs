use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    core::utils::{ensure_dir, write_atomic, PathResolver},
    domain::YearMonth,
    errors::LedgerError,
    utils::DEFAULT_LOG_FILTER,
};

const DEFAULT_PAYMENT_DESCRIPTION: &str = "Credit card payment {card} {month}/{year}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Owner the shell acts as; generated on first run.
    pub owner_id: Uuid,
    pub currency: String,
    #[serde(default = "Config::default_log_filter")]
    pub log_filter: String,
    /// Template for payments without a description. Supports `{card}`,
    /// `{month}` and `{year}`.
    #[serde(default = "Config::default_payment_description")]
    pub payment_description: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner_id: Uuid::new_v4(),
            currency: "ARS".into(),
            log_filter: Self::default_log_filter(),
            payment_description: Self::default_payment_description(),
        }
    }
}

impl Config {
    fn default_log_filter() -> String {
        DEFAULT_LOG_FILTER.into()
    }

    fn default_payment_description() -> String {
        DEFAULT_PAYMENT_DESCRIPTION.into()
    }

    pub fn render_payment_description(&self, card: &str, period: YearMonth) -> String {
        self.payment_description
            .replace("{card}", card)
            .replace("{month}", &format!("{:02}", period.month))
            .replace("{year}", &period.year.to_string())
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, LedgerError> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, LedgerError> {
        ensure_dir(&base)?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
        })
    }

    /// Stored configuration, or defaults when nothing was saved yet.
    pub fn load(&self) -> Result<Config, LedgerError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    /// Loads the configuration and persists it if it was freshly generated,
    /// so the owner id stays stable across runs.
    pub fn load_or_init(&self) -> Result<Config, LedgerError> {
        let existed = self.path.exists();
        let config = self.load()?;
        if !existed {
            self.save(&config)?;
        }
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
