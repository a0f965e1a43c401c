//! Docket CLI library.
//!
//! Configuration loading, logging setup, run orchestration, and output
//! formatting for the `docket` binary.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod interactive;
pub mod logging;
pub mod output;

pub use cli::Cli;
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
