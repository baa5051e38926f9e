//! CLI argument parsing and command dispatch.

mod args;
mod commands;

pub use args::{Cli, Commands, LogLevel};
pub use commands::execute;
