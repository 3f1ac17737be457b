use crate::cli::context::{CommandResult, ShellContext};
use crate::cli::output;

use super::CommandDefinition;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("help", "Show available commands", &["help [command]"], cmd_help),
        CommandDefinition::new("exit", "Leave the shell", &["exit"], cmd_exit),
    ]
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        match context.registry().get(&name.to_ascii_lowercase()) {
            Some(definition) => {
                output::section(definition.name);
                output::info(definition.description);
                for form in definition.usage {
                    println!("  {form}");
                }
            }
            None => output::warning(format!("no help for `{name}`")),
        }
        return Ok(());
    }
    output::section("Commands");
    for definition in context.registry().iter() {
        println!("  {:<10} {}", definition.name, definition.description);
    }
    Ok(())
}

fn cmd_exit(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.running = false;
    Ok(())
}
