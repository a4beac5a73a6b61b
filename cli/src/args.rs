use clap::Parser;
use std::path::PathBuf;

// Macro to create the version string at compile time
macro_rules! version_string {
    () => {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nCommit: ",
            env!("GIT_COMMIT_HASH"),
            " (",
            env!("GIT_BRANCH"),
            ")\nBuilt: ",
            env!("BUILD_DATE")
        )
    };
}

/// fleet-watch - live notifications and security alerts for fleet operators
#[derive(Parser, Debug)]
#[command(name = "fleet-watch")]
#[command(author = "Fleet Console Team")]
#[command(version = version_string!())]
#[command(about = "Live unread count and suspicious-movement alerts", long_about = None)]
pub struct Cli {
    /// Backend API base URL (e.g., http://localhost:8080/api)
    #[arg(short = 'u', long = "url")]
    pub url: Option<String>,

    /// JWT authentication token
    #[arg(long = "token")]
    pub token: Option<String>,

    /// Configuration file path
    #[arg(long = "config", default_value = "~/.fleet/config.toml")]
    pub config: PathBuf,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Do not ring the terminal bell on new alerts
    #[arg(long = "no-bell")]
    pub no_bell: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// HTTP request timeout in seconds (overrides the config file)
    #[arg(long = "timeout", value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Connection timeout in seconds (TCP + TLS handshake, default: 10)
    #[arg(
        long = "connection-timeout",
        value_name = "SECONDS",
        default_value_t = 10
    )]
    pub connection_timeout: u64,

    /// Use fast timeout preset (optimized for local development)
    #[arg(long = "fast-timeouts", conflicts_with = "relaxed_timeouts")]
    pub fast_timeouts: bool,

    /// Use relaxed timeout preset (optimized for high-latency networks)
    #[arg(long = "relaxed-timeouts")]
    pub relaxed_timeouts: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["fleet-watch"]);
        assert!(cli.url.is_none());
        assert_eq!(cli.config, PathBuf::from("~/.fleet/config.toml"));
        assert_eq!(cli.connection_timeout, 10);
        assert!(!cli.no_bell);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "fleet-watch",
            "-u",
            "https://fleet.example.com/api",
            "--token",
            "abc",
            "--no-color",
            "--no-bell",
            "-v",
            "--timeout",
            "5",
        ]);
        assert_eq!(cli.url.as_deref(), Some("https://fleet.example.com/api"));
        assert_eq!(cli.token.as_deref(), Some("abc"));
        assert!(cli.no_color && cli.no_bell && cli.verbose);
        assert_eq!(cli.timeout, Some(5));
    }

    #[test]
    fn test_timeout_presets_conflict() {
        let result = Cli::try_parse_from(["fleet-watch", "--fast-timeouts", "--relaxed-timeouts"]);
        assert!(result.is_err());
    }
}
