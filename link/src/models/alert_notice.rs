use super::suspicious_movement::SuspiciousMovementEvent;

/// One transient, high-visibility summary for a batch of new alerts.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertNotice {
    /// Number of new occurrences in the batch.
    pub new_events: usize,
    /// How many of them were detected outside an authorized zone.
    pub outside_zone: usize,
    /// Short operator-facing headline.
    pub headline: String,
}

impl AlertNotice {
    pub fn summarize(batch: &[SuspiciousMovementEvent]) -> Self {
        let outside_zone = batch.iter().filter(|e| e.outside_authorized_zone).count();
        let headline = match batch {
            [single] => format!(
                "Suspicious movement: bike {} moved {:.0} m",
                single.bike_code, single.distance_moved
            ),
            _ if outside_zone > 0 => format!(
                "{} suspicious movements detected ({} outside authorized zone)",
                batch.len(),
                outside_zone
            ),
            _ => format!("{} suspicious movements detected", batch.len()),
        };
        Self {
            new_events: batch.len(),
            outside_zone,
            headline,
        }
    }
}
