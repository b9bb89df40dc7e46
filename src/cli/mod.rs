//! CLI command implementations

pub mod commands;
pub mod error;

pub use commands::{Cli, Commands, OutputFormat};
pub use error::CliError;
