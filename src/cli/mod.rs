//! Terminal front end: flags, commands, table output and the interactive loop.

pub mod args;
pub mod commands;
pub mod outputformatter;
mod repl;

pub use args::{print_usage, CliArgs, ENV_EMAIL, ENV_PASSWORD, ENV_TOKEN};
pub use commands::{execute, Command, GenealogyCommand, COMMAND_HELP};
pub use outputformatter::{print_table, render_table};
pub use repl::run_repl;
