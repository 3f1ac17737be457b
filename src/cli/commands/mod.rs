use std::collections::HashMap;

use once_cell::sync::Lazy;

mod card;
mod cash;
mod purchase;
mod system;

use super::context::{CommandError, CommandResult, ShellContext};

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static [&'static str],
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static [&'static str],
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDefinition>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            order.push(definition.name);
            commands.insert(definition.name, definition);
        }
        Self { commands, order }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }
}

pub(crate) static REGISTRY: Lazy<CommandRegistry> = Lazy::new(|| {
    let mut definitions = Vec::new();
    definitions.extend(system::definitions());
    definitions.extend(cash::definitions());
    definitions.extend(card::definitions());
    definitions.extend(purchase::definitions());
    CommandRegistry::new(definitions)
});

/// Splits `args` into the sub-command and its arguments.
pub(crate) fn subcommand<'a, 'b>(
    args: &'a [&'b str],
    definition: &str,
) -> Result<(String, &'a [&'b str]), CommandError> {
    match args.split_first() {
        Some((sub, rest)) => Ok((sub.to_ascii_lowercase(), rest)),
        None => Err(usage(definition)),
    }
}

/// Usage error listing every form of `command`.
pub(crate) fn usage(command: &str) -> CommandError {
    let forms = REGISTRY
        .get(command)
        .map(|definition| definition.usage.join(" | "))
        .unwrap_or_else(|| command.to_string());
    CommandError::Usage(forms)
}

/// Argument at `index`, or the command's usage error.
pub(crate) fn arg<'a>(args: &[&'a str], index: usize, command: &str) -> Result<&'a str, CommandError> {
    args.get(index).copied().ok_or_else(|| usage(command))
}

/// `key=value` options that follow the positional arguments.
pub(crate) fn options<'a>(args: &[&'a str]) -> HashMap<String, &'a str> {
    args.iter()
        .filter_map(|arg| arg.split_once('='))
        .map(|(key, value)| (key.to_ascii_lowercase(), value))
        .collect()
}

/// Positional arguments, i.e. everything that is not a `key=value` option.
pub(crate) fn positional<'a>(args: &[&'a str]) -> Vec<&'a str> {
    args.iter().copied().filter(|arg| !arg.contains('=')).collect()
}
