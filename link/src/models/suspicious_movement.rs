use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Backend identifier of a bicycle.
///
/// The monitoring endpoint emits numeric ids for some deployments and string
/// ids for others; both normalize to the same textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BikeId(String);

impl BikeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BikeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BikeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BikeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for BikeId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for BikeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => BikeId(s),
            RawId::Number(n) => BikeId(n.to_string()),
        })
    }
}

/// A WGS84 coordinate as reported by the bike's tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// The rider of the last authorized trip, when the backend knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderInfo {
    #[serde(default)]
    pub user_id: Option<BikeId>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub trip_ended_at: Option<DateTime<Utc>>,
}

/// A backend-detected relocation of a bike without an active authorized trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspiciousMovementEvent {
    pub bike_id: BikeId,
    pub bike_code: String,
    pub current_location: GeoPoint,
    pub last_known_location: GeoPoint,
    /// Distance between the two locations, in meters.
    pub distance_moved: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub detection_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub outside_authorized_zone: bool,
    pub bike_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_rider: Option<RiderInfo>,
}

impl SuspiciousMovementEvent {
    /// Decode a poll response one element at a time.
    ///
    /// Elements that do not decode are logged and skipped so a single bad
    /// record cannot hide the rest of the batch.
    pub fn from_batch(values: Vec<JsonValue>) -> Vec<Self> {
        let total = values.len();
        let events: Vec<Self> = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value::<Self>(value) {
                Ok(event) => Some(event),
                Err(e) => {
                    log::warn!("[ALERTS] Skipping undecodable suspicious movement #{}: {}", index, e);
                    None
                },
            })
            .collect();
        if events.len() < total {
            log::warn!(
                "[ALERTS] Decoded {} of {} suspicious movements",
                events.len(),
                total
            );
        }
        events
    }

    /// Identity of the real-world occurrence behind this observation.
    pub fn key(&self) -> AlertKey {
        AlertKey {
            bike_id: self.bike_id.clone(),
            detected_at: self.detection_timestamp,
        }
    }
}

/// Two observations describe the same occurrence iff both fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertKey {
    pub bike_id: BikeId,
    pub detected_at: DateTime<Utc>,
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.bike_id, self.detected_at.to_rfc3339())
    }
}

/// Parse an ISO-8601 timestamp. A value without an offset is taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 timestamp '{}'", raw)))
}

fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 timestamp '{}'", raw))),
        None => Ok(None),
    }
}
