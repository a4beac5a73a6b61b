//! Error types for fleet-watch
//!
//! Provides user-friendly error messages for the failures an operator can
//! actually act on: bad configuration, unreachable backend, rejected alert
//! resolution and malformed console commands.

use fleet_link::FleetLinkError;
use std::fmt;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CLIError>;

/// Errors that can occur in the CLI
#[derive(Debug)]
pub enum CLIError {
    /// Error from fleet-link library
    LinkError(FleetLinkError),

    /// Configuration file error
    ConfigurationError(String),

    /// File I/O error
    FileError(String),

    /// Invalid console command
    ParseError(String),

    /// User cancelled operation
    Cancelled,
}

impl CLIError {
    fn format_link_error(err: &FleetLinkError) -> String {
        match err {
            FleetLinkError::NetworkError(msg) => Self::clean_nested_message(msg),
            FleetLinkError::StreamError(msg) => Self::clean_nested_message(msg),
            FleetLinkError::AuthenticationError(msg) => {
                format!("Not authorized: {} (check --token)", msg)
            },
            FleetLinkError::ConfigurationError(msg) => msg.clone(),
            FleetLinkError::TimeoutError(msg) => msg.clone(),
            FleetLinkError::SerializationError(msg) => msg.clone(),
            FleetLinkError::InternalError(msg) => msg.clone(),
            FleetLinkError::ServerError {
                status_code,
                message,
            } => format!("Server error ({}): {}", status_code, message),
            FleetLinkError::Cancelled => "Operation cancelled".to_string(),
        }
    }

    fn clean_nested_message(message: &str) -> String {
        let mut cleaned = message.trim();
        let prefixes = [
            "Connection failed:",
            "connection failed:",
            "Network error:",
            "network error:",
        ];

        loop {
            let mut stripped = false;
            for prefix in &prefixes {
                if let Some(rest) = cleaned.strip_prefix(prefix) {
                    cleaned = rest.trim_start();
                    stripped = true;
                    break;
                }
            }

            if !stripped {
                break;
            }
        }

        cleaned.to_string()
    }
}

impl fmt::Display for CLIError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CLIError::LinkError(e) => write!(f, "{}", Self::format_link_error(e)),
            CLIError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            CLIError::FileError(msg) => write!(f, "File error: {}", msg),
            CLIError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            CLIError::Cancelled => write!(f, "Operation cancelled"),
        }
    }
}

impl std::error::Error for CLIError {}

impl From<FleetLinkError> for CLIError {
    fn from(err: FleetLinkError) -> Self {
        CLIError::LinkError(err)
    }
}

impl From<std::io::Error> for CLIError {
    fn from(err: std::io::Error) -> Self {
        CLIError::FileError(err.to_string())
    }
}

impl From<toml::de::Error> for CLIError {
    fn from(err: toml::de::Error) -> Self {
        CLIError::ConfigurationError(format!("TOML parse error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CLIError::ParseError("Unknown command 'foo'".into());
        assert_eq!(err.to_string(), "Parse error: Unknown command 'foo'");

        let err = CLIError::Cancelled;
        assert_eq!(err.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_link_error_display() {
        let err: CLIError =
            FleetLinkError::NetworkError("Network error: connection failed: refused".into()).into();
        assert_eq!(err.to_string(), "refused");

        let err: CLIError = FleetLinkError::ServerError {
            status_code: 409,
            message: "alert already handled".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Server error (409): alert already handled");
    }
}
