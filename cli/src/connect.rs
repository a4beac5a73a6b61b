use crate::args::Cli;
use fleet_cli::{CLIConfiguration, OutputFormatter, Result, WatchSession};
use fleet_link::{AuthProvider, FleetLinkClient, FleetLinkTimeouts};

/// Build timeouts configuration from CLI arguments and the config file
fn build_timeouts(cli: &Cli, config: &CLIConfiguration) -> FleetLinkTimeouts {
    if cli.fast_timeouts {
        return FleetLinkTimeouts::fast();
    }
    if cli.relaxed_timeouts {
        return FleetLinkTimeouts::relaxed();
    }

    let request_timeout = cli.timeout.unwrap_or(config.resolved_server().timeout);
    FleetLinkTimeouts::builder()
        .connection_timeout_secs(cli.connection_timeout)
        .request_timeout_secs(request_timeout)
        .build()
}

pub fn create_session(cli: &Cli, config: &CLIConfiguration) -> Result<WatchSession> {
    // Priority: CLI args > config file > localhost default
    let server_url = cli
        .url
        .clone()
        .or_else(|| config.resolved_server().url)
        .unwrap_or_else(|| "http://localhost:8080/api".to_string());

    let auth = match cli.token.clone().or_else(|| config.jwt_token().map(str::to_string)) {
        Some(token) => AuthProvider::jwt_token(token),
        None => {
            log::warn!("[fleet-watch] No token configured; connecting anonymously");
            AuthProvider::none()
        },
    };

    let client = FleetLinkClient::builder()
        .base_url(server_url)
        .auth(auth)
        .timeouts(build_timeouts(cli, config))
        .connection_options(config.to_connection_options())
        .build()?;

    let color = !cli.no_color && config.resolved_ui().color;
    let bell = !cli.no_bell && config.resolved_monitoring().bell;

    log::info!(
        "[fleet-watch] Watching {} (request timeout {:?})",
        client.base_url(),
        client.timeouts().request_timeout
    );

    WatchSession::connect(&client, OutputFormatter::new(color), bell)
}
