//! fleet-watch - terminal console for fleet notifications and security alerts
//!
//! # Usage
//!
//! ```bash
//! # Watch the local backend
//! fleet-watch -u http://localhost:8080/api --token <JWT>
//!
//! # Use ~/.fleet/config.toml, no bell
//! fleet-watch --no-bell
//! ```

use clap::Parser;

use fleet_cli::{CLIConfiguration, Result};

mod args;
mod connect;

use args::Cli;
use connect::create_session;

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = CLIConfiguration::load(&cli.config)?;
    let session = create_session(&cli, &config)?;

    let result = session.run_interactive().await;
    session.shutdown().await;
    result
}
