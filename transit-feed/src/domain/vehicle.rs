//! Canonical vehicle record.

use serde::{Deserialize, Serialize};

/// One tracked vehicle as of the most recent successful fetch.
///
/// Fields the upstream omits stay `None`; numeric fields are never defaulted
/// to zero so consumers cannot mistake "unknown" for a real position or delay.
/// Field names serialize the way the upstream spells them, so records can be
/// forwarded to existing clients unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Upstream-assigned identifier (the key of the raw record).
    pub id: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub route_id: Option<String>,
    #[serde(rename = "vehicleNo")]
    pub vehicle_no: Option<String>,
    /// Heading in degrees.
    pub angle: Option<f64>,
    /// Delay in seconds; negative means early.
    pub delay: Option<i64>,
    /// Upstream status code, passed through untouched.
    pub current_status: Option<serde_json::Value>,
    pub trip_headsign: Option<String>,
    pub stop_name: Option<String>,
    pub speed: Option<f64>,
}

impl Vehicle {
    /// Create a vehicle with only its identifier known.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Position as `(lat, lon)`, only when both coordinates are known.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lon?))
    }
}
