//! Terminal side effects of security alerts.

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

use fleet_link::{AlertNotice, AlertPresenter, BikeId, FleetLinkError, SuspiciousMovementEvent};

use crate::formatter::OutputFormatter;

const BELL: &[u8] = b"\x07";

/// Presents alerts on a terminal. The audible cue is the terminal bell.
pub struct TerminalPresenter<W: Write + Send + 'static = io::Stdout> {
    formatter: OutputFormatter,
    bell: bool,
    out: Mutex<W>,
}

impl TerminalPresenter<io::Stdout> {
    pub fn stdout(formatter: OutputFormatter, bell: bool) -> Self {
        Self::new(io::stdout(), formatter, bell)
    }
}

impl<W: Write + Send + 'static> TerminalPresenter<W> {
    pub fn new(out: W, formatter: OutputFormatter, bell: bool) -> Self {
        Self {
            formatter,
            bell,
            out: Mutex::new(out),
        }
    }

    fn out(&self) -> MutexGuard<'_, W> {
        self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn print(&self, text: &str) {
        let mut out = self.out();
        if let Err(e) = writeln!(out, "{}", text).and_then(|_| out.flush()) {
            log::debug!("[ALERTS] Terminal write failed: {}", e);
        }
    }

    /// Consume the presenter and return its writer.
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send + 'static> AlertPresenter for TerminalPresenter<W> {
    fn play_cue(&self) -> fleet_link::Result<()> {
        if !self.bell {
            return Ok(());
        }
        let mut out = self.out();
        out.write_all(BELL)
            .and_then(|_| out.flush())
            .map_err(|e| FleetLinkError::InternalError(format!("Terminal bell failed: {}", e)))
    }

    fn show_notice(&self, notice: &AlertNotice) {
        self.print(&self.formatter.format_notice(notice));
    }

    fn show_alert(&self, event: &SuspiciousMovementEvent) {
        self.print(&self.formatter.format_alert(event));
    }

    fn clear_alert(&self, bike_id: &BikeId) {
        self.print(&self.formatter.format_info(&format!("Alert for bike {} cleared", bike_id)));
    }
}
