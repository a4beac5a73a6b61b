use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;

/// Data frame pushed on the notification stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    /// Full authoritative unread count.
    UnreadCount { count: u64 },

    /// A single new notification. The payload is opaque: any shape of
    /// `id` or `title` still counts as one.
    Notification {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<JsonValue>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<JsonValue>,
    },
}

/// Effect of a data frame on the unread counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountUpdate {
    /// Replace the counter.
    Snapshot(u64),
    /// Add one, pending the next snapshot.
    Increment,
}

impl StreamFrame {
    pub fn count_update(&self) -> CountUpdate {
        match self {
            StreamFrame::UnreadCount { count } => CountUpdate::Snapshot(*count),
            StreamFrame::Notification { .. } => CountUpdate::Increment,
        }
    }

    /// Parse one line of the stream body.
    ///
    /// Returns `Ok(None)` for blank lines, `:` comments (keep-alives) and SSE
    /// bookkeeping fields. Data may arrive bare or behind a `data:` prefix.
    pub fn parse_line(line: &str) -> Result<Option<StreamFrame>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with(':') {
            return Ok(None);
        }

        let payload = match line.split_once(':') {
            Some(("data", rest)) => rest.trim_start(),
            Some(("event" | "id" | "retry", _)) => return Ok(None),
            _ => line,
        };
        if payload.is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str::<StreamFrame>(payload)?))
    }
}
