//! Line-oriented operator shell over the billing services.

pub mod commands;
mod context;
pub mod output;
mod shell;

pub use context::{CliError, CliMode, CommandError, ShellContext};
pub use shell::{run_cli, SCRIPT_ENV};
