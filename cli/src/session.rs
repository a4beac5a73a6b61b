//! Interactive operator session
//!
//! Owns the shared connection registry, one mounted unread counter and one
//! alert monitor. Console commands run against them while count and state
//! changes are echoed as they happen.

use colored::Colorize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use fleet_link::{AlertMonitor, ConnectionRegistry, FleetLinkClient, UnreadCounter};

use crate::{
    error::{CLIError, Result},
    formatter::OutputFormatter,
    parser::{Command, CommandParser, HELP_TEXT},
    presenter::TerminalPresenter,
};

/// Outcome of one console command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Message(String),
    Quit,
}

pub struct WatchSession {
    server_url: String,
    registry: ConnectionRegistry,
    counter: UnreadCounter,
    monitor: AlertMonitor,
    formatter: OutputFormatter,
    parser: CommandParser,
}

impl WatchSession {
    /// Mount the counter and the monitor for `client`.
    ///
    /// Must be called within a tokio runtime.
    pub fn connect(client: &FleetLinkClient, formatter: OutputFormatter, bell: bool) -> Result<Self> {
        let registry = client.connection_registry()?;
        let counter = client.mount_unread_counter(&registry);
        let monitor = client.mount_alert_monitor(Arc::new(TerminalPresenter::stdout(formatter, bell)));

        Ok(Self::from_parts(
            client.base_url().to_string(),
            registry,
            counter,
            monitor,
            formatter,
        ))
    }

    /// Assemble a session from already mounted parts.
    pub fn from_parts(
        server_url: String,
        registry: ConnectionRegistry,
        counter: UnreadCounter,
        monitor: AlertMonitor,
        formatter: OutputFormatter,
    ) -> Self {
        Self {
            server_url,
            registry,
            counter,
            monitor,
            formatter,
            parser: CommandParser::new(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn counter(&self) -> &UnreadCounter {
        &self.counter
    }

    pub fn monitor(&self) -> &AlertMonitor {
        &self.monitor
    }

    /// Current count and state as one line
    pub fn status_line(&self) -> String {
        self.formatter
            .format_count(self.counter.count(), self.counter.state())
    }

    /// Parse and run one console line
    pub async fn execute_line(&self, line: &str) -> Result<Reply> {
        let command = self.parser.parse(line)?;
        self.execute(command).await
    }

    pub async fn execute(&self, command: Command) -> Result<Reply> {
        match command {
            Command::Handle {
                bike_id,
                action,
                note,
            } => {
                let removed = self
                    .monitor
                    .mark_handled(&bike_id, &action, note)
                    .await?;
                Ok(Reply::Message(self.formatter.format_handled(&bike_id, removed)))
            },
            Command::Status => {
                let mut lines = vec![self.status_line()];
                match self.monitor.active_alert() {
                    Some(event) => lines.push(self.formatter.format_alert(&event)),
                    None => lines.push(self.formatter.format_info("No active alert")),
                }
                Ok(Reply::Message(lines.join("\n")))
            },
            Command::Dismiss => {
                let message = match self.monitor.dismiss().await {
                    Some(event) => format!("Alert for bike {} dismissed (not resolved)", event.bike_id),
                    None => "No active alert".to_string(),
                };
                Ok(Reply::Message(self.formatter.format_info(&message)))
            },
            Command::Poll => {
                let surfaced = self.monitor.poll_now().await?;
                Ok(Reply::Message(self.formatter.format_info(&format!(
                    "{} new suspicious movement(s)",
                    surfaced
                ))))
            },
            Command::Help => Ok(Reply::Message(HELP_TEXT.to_string())),
            Command::Quit => Ok(Reply::Quit),
            Command::Unknown(name) => Err(CLIError::ParseError(format!(
                "Unknown command '{}'. Type help for the command list",
                name
            ))),
        }
    }

    fn print_banner(&self) {
        println!();
        println!("{}", "fleet-watch".bright_blue().bold());
        println!(
            "  {}",
            format!("Backend: {}", self.server_url).cyan()
        );
        println!(
            "  {}",
            format!(
                "Version: {} (built: {})",
                env!("CARGO_PKG_VERSION"),
                env!("BUILD_DATE")
            )
            .dimmed()
        );
        println!(
            "  Type {} for commands, {} to exit",
            "help".cyan().bold(),
            "quit".cyan().bold()
        );
        println!();
    }

    /// Read commands from stdin until `quit`, end of input or Ctrl-C.
    pub async fn run_interactive(&self) -> Result<()> {
        self.print_banner();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut count = self.counter.watch_count();
        let mut state = self.counter.watch_state();

        println!("{}", self.status_line());

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match self.execute_line(&line).await {
                        Ok(Reply::Quit) => break,
                        Ok(Reply::Message(message)) => println!("{}", message),
                        Err(e) => eprintln!("{}", self.formatter.format_error(&e.to_string())),
                    }
                },
                changed = count.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    println!("{}", self.status_line());
                },
                changed = state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    println!("{}", self.status_line());
                },
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    break;
                },
            }
        }

        Ok(())
    }

    /// Stop the pollers, release the stream and close the shared connection.
    pub async fn shutdown(self) {
        self.counter.unmount().await;
        self.monitor.unmount().await;
        self.registry.shutdown();
        log::debug!("[fleet-watch] Session for {} closed", self.server_url);
    }
}
