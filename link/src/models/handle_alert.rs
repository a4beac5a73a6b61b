use serde::{Deserialize, Serialize};

use super::suspicious_movement::BikeId;

/// Body of `POST /monitoring/handle-alert`.
///
/// `action` is forwarded verbatim; the backend owns the vocabulary of
/// operator actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleAlertRequest {
    pub bike_id: BikeId,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl HandleAlertRequest {
    pub fn new(bike_id: BikeId, action: impl Into<String>, note: Option<String>) -> Self {
        Self {
            bike_id,
            action: action.into(),
            note: note.filter(|n| !n.trim().is_empty()),
        }
    }
}
