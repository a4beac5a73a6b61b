//! Library entry point for fleet-cli components.
//!
//! Exposes the reusable modules (config, formatter, presenter, session) so
//! integration tests can drive a session without going through the binary
//! entry point.

pub mod config;
pub mod error;
pub mod formatter;
pub mod parser;
pub mod presenter;
pub mod session;

pub use config::CLIConfiguration;
pub use error::{CLIError, Result};
pub use formatter::OutputFormatter;
pub use parser::{Command, CommandParser};
pub use presenter::TerminalPresenter;
pub use session::{Reply, WatchSession};
