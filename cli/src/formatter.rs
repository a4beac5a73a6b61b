//! Output formatting for the operator console
//!
//! Renders the unread counter, the stream state and security alerts, with
//! ANSI colors when enabled.

use colored::{ColoredString, Colorize};
use fleet_link::{AlertNotice, BikeId, ConnectionState, SuspiciousMovementEvent};

/// Formats console output
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    color: bool,
}

impl OutputFormatter {
    /// Create a new formatter
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn color(&self) -> bool {
        self.color
    }

    fn paint<F>(&self, text: &str, style: F) -> String
    where
        F: FnOnce(ColoredString) -> ColoredString,
    {
        if self.color {
            style(text.normal()).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn format_state(&self, state: ConnectionState) -> String {
        let label = state.to_string();
        match state {
            ConnectionState::Open => self.paint(&label, |s| s.green().bold()),
            ConnectionState::Connecting | ConnectionState::Reconnecting => {
                self.paint(&label, |s| s.yellow())
            },
            ConnectionState::Error => self.paint(&label, |s| s.red().bold()),
            ConnectionState::Polling => self.paint(&label, |s| s.cyan()),
        }
    }

    /// One status line: `Unread: 8 [OPEN]`
    pub fn format_count(&self, count: u64, state: ConnectionState) -> String {
        let value = count.to_string();
        let value = if count > 0 {
            self.paint(&value, |s| s.bold())
        } else {
            value
        };
        format!("Unread: {} [{}]", value, self.format_state(state))
    }

    pub fn format_notice(&self, notice: &AlertNotice) -> String {
        let headline = format!("!! {}", notice.headline);
        if notice.outside_zone > 0 {
            self.paint(&headline, |s| s.red().bold())
        } else {
            self.paint(&headline, |s| s.yellow().bold())
        }
    }

    /// Multi-line alert card for the active alert
    pub fn format_alert(&self, event: &SuspiciousMovementEvent) -> String {
        let mut lines = Vec::with_capacity(6);

        let title = format!("ALERT bike {} (id {})", event.bike_code, event.bike_id);
        lines.push(self.paint(&title, |s| s.red().bold()));
        lines.push(format!(
            "  moved {:.0} m at {}",
            event.distance_moved,
            event.detection_timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        lines.push(format!(
            "  from ({:.5}, {:.5}) to ({:.5}, {:.5})",
            event.last_known_location.latitude,
            event.last_known_location.longitude,
            event.current_location.latitude,
            event.current_location.longitude
        ));
        if event.outside_authorized_zone {
            lines.push(format!(
                "  {}",
                self.paint("OUTSIDE AUTHORIZED ZONE", |s| s.red().bold())
            ));
        }
        lines.push(format!("  status: {}", event.bike_status));
        if let Some(rider) = &event.last_rider {
            let name = rider.full_name.as_deref().unwrap_or("unknown rider");
            match &rider.phone {
                Some(phone) => lines.push(format!("  last rider: {} ({})", name, phone)),
                None => lines.push(format!("  last rider: {}", name)),
            }
        }
        lines.push(self.paint(
            &format!("  resolve with: handle {} <action> [note]", event.bike_id),
            |s| s.dimmed(),
        ));

        lines.join("\n")
    }

    pub fn format_handled(&self, bike_id: &BikeId, removed: usize) -> String {
        self.paint(
            &format!(
                "Alert for bike {} handled ({} occurrence(s) cleared)",
                bike_id, removed
            ),
            |s| s.green(),
        )
    }

    pub fn format_error(&self, message: &str) -> String {
        self.paint(&format!("ERROR: {}", message), |s| s.red())
    }

    pub fn format_info(&self, message: &str) -> String {
        self.paint(message, |s| s.dimmed())
    }
}
