//! Canonical stop record.

use serde::{Deserialize, Serialize};

/// One transit stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Display name, `"{name} - {id}"`.
    pub stop_name: String,
    /// Empty when the upstream sends no headsign.
    pub trip_headsign: String,
}

impl Stop {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        lat: f64,
        lon: f64,
        trip_headsign: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let name = name.into();
        let stop_name = format!("{name} - {id}");

        Self {
            id,
            name,
            lat,
            lon,
            stop_name,
            trip_headsign: trip_headsign.into(),
        }
    }
}
