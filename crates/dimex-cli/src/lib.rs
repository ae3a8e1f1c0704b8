//! Dimex CLI library.
//!
//! Configuration, model provider selection, text sources, result sinks and
//! the command implementations behind the `dimex` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod provider;
pub mod sink;
pub mod source;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
