//! Command parser for the operator console
//!
//! Lines may be typed bare (`handle 42 dispatch_staff`) or with a leading
//! backslash (`\handle 42 dispatch_staff`).

use crate::error::{CLIError, Result};
use fleet_link::BikeId;

/// Parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Resolve the alert for a bike on the backend
    Handle {
        bike_id: BikeId,
        action: String,
        note: Option<String>,
    },
    /// Show unread count, connection state and the active alert
    Status,
    /// Clear the active alert locally without resolving it
    Dismiss,
    /// Poll suspicious movements now
    Poll,
    Help,
    Quit,
    Unknown(String),
}

/// Command parser
#[derive(Debug, Default)]
pub struct CommandParser;

impl CommandParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a command line
    pub fn parse(&self, line: &str) -> Result<Command> {
        let trimmed = line.trim();
        let trimmed = trimmed.strip_prefix('\\').unwrap_or(trimmed);

        if trimmed.is_empty() {
            return Err(CLIError::ParseError("Empty command".into()));
        }

        let (command, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (trimmed, ""),
        };

        match command.to_ascii_lowercase().as_str() {
            "handle" | "h" => self.parse_handle(rest),
            "status" | "s" => Ok(Command::Status),
            "dismiss" | "d" => Ok(Command::Dismiss),
            "poll" | "p" => Ok(Command::Poll),
            "help" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            _ => Ok(Command::Unknown(command.to_string())),
        }
    }

    /// `handle <bikeId> <action> [note...]`
    fn parse_handle(&self, args: &str) -> Result<Command> {
        let mut parts = args.splitn(3, char::is_whitespace);
        let bike_id = parts.next().filter(|s| !s.is_empty());
        let action = parts.next().map(str::trim).filter(|s| !s.is_empty());

        let (bike_id, action) = match (bike_id, action) {
            (Some(bike_id), Some(action)) => (bike_id, action),
            _ => {
                return Err(CLIError::ParseError(
                    "Usage: handle <bikeId> <action> [note]".into(),
                ))
            },
        };

        let note = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Command::Handle {
            bike_id: BikeId::new(bike_id),
            action: action.to_string(),
            note,
        })
    }
}

/// Help text for the interactive console
pub const HELP_TEXT: &str = "\
Commands:
  handle <bikeId> <action> [note]   Resolve the alert for a bike
  status                            Show unread count, stream state and active alert
  dismiss                           Hide the active alert without resolving it
  poll                              Check for suspicious movements now
  help                              Show this help
  quit                              Exit";
