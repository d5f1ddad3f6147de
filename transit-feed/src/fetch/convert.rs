//! Conversion from upstream JSON shapes to domain records.
//!
//! The upstream is loosely typed: ids and route numbers arrive as strings or
//! numbers, coordinates are sometimes missing. Conversion is a field
//! projection. Nothing is computed except the stop display name, and nothing
//! numeric is defaulted.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::{Stop, Vehicle};
use crate::socketio::RawVehicles;

/// Stop-list REST response: `{"stops": [[id, name, lat, lon, headsign?], ...]}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopListResponse {
    #[serde(default)]
    pub stops: Vec<Value>,
}

/// Convert every raw vehicle record, dropping records that are not objects.
pub fn convert_vehicles(raw: RawVehicles) -> HashMap<String, Vehicle> {
    let total = raw.len();
    let vehicles: HashMap<String, Vehicle> = raw
        .into_iter()
        .filter_map(|(id, record)| {
            let vehicle = convert_vehicle(&id, &record)?;
            Some((id, vehicle))
        })
        .collect();

    if vehicles.len() < total {
        debug!(
            dropped = total - vehicles.len(),
            "Dropped vehicle records that are not objects"
        );
    }
    vehicles
}

/// Project one raw vehicle record onto [`Vehicle`].
pub fn convert_vehicle(id: &str, record: &Value) -> Option<Vehicle> {
    let record = record.as_object()?;

    Some(Vehicle {
        id: id.to_string(),
        lat: number(record.get("lat")),
        lon: number(record.get("lon")),
        route_id: text(record.get("route_id")),
        vehicle_no: text(record.get("vehicleNo")),
        angle: number(record.get("angle")),
        delay: integer(record.get("delay")),
        current_status: record.get("current_status").filter(|v| !v.is_null()).cloned(),
        trip_headsign: text(record.get("trip_headsign")),
        stop_name: text(record.get("stop_name")),
        speed: number(record.get("speed")),
    })
}

/// Convert the stop list, silently dropping malformed entries.
pub fn convert_stops(response: &StopListResponse) -> Vec<Stop> {
    response.stops.iter().filter_map(convert_stop).collect()
}

/// Convert one positional stop entry.
///
/// Needs at least `[id, name, lat, lon]` with numeric coordinates; the fifth
/// element, when present, is the trip headsign.
pub fn convert_stop(entry: &Value) -> Option<Stop> {
    let fields = entry.as_array()?;
    if fields.len() < 4 {
        return None;
    }

    let id = text(fields.first())?;
    let name = text(fields.get(1)).unwrap_or_default();
    let lat = number(fields.get(2))?;
    let lon = number(fields.get(3))?;
    let headsign = text(fields.get(4)).unwrap_or_default();

    Some(Stop::new(id, name, lat, lon, headsign))
}

/// A number, or a string holding one.
fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// An integer; fractional numbers are rounded.
fn integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    }
}

/// A string, or a number rendered as one.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
