// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Farmer record data model.
//!
//! Records arrive from the API in a loosely typed wire shape
//! ([`RawFarmerRecord`]): every field may be missing and coordinates may be
//! numbers or numeric strings. [`RawFarmerRecord::normalize`] is the single
//! place where that shape is validated and converted into a [`FarmerRecord`]
//! with finite numeric coordinates.

mod lenient;
mod timestamp;

pub use timestamp::parse_timestamp;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Server-assigned record identifier.
pub type RecordId = u64;

/// A coordinate as sent by the server: JSON number or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateValue {
    Number(f64),
    Text(String),
}

impl CoordinateValue {
    /// Parse into a finite `f64`, or `None` if the value is not usable.
    #[must_use]
    pub fn to_finite(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for CoordinateValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for CoordinateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Farmer record exactly as the API returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFarmerRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub id: Option<RecordId>,
    #[serde(deserialize_with = "lenient::text")]
    pub farmer_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub farmer_id: Option<String>,
    #[serde(deserialize_with = "coordinate")]
    pub latitude: Option<CoordinateValue>,
    #[serde(deserialize_with = "coordinate")]
    pub longitude: Option<CoordinateValue>,
    #[serde(deserialize_with = "lenient::number")]
    pub elevation: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub accuracy: Option<f64>,
    #[serde(deserialize_with = "lenient::text")]
    pub plant_type: Option<String>,
    #[serde(deserialize_with = "lenient::count")]
    pub plant_count: Option<i64>,
    #[serde(deserialize_with = "lenient::text")]
    pub timestamp: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub image: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub other_details: Option<String>,
}

/// Coordinates keep their wire form; anything but a number or string is absent.
fn coordinate<'de, D>(deserializer: D) -> std::result::Result<Option<CoordinateValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().map(CoordinateValue::Number),
        Value::String(s) => Some(CoordinateValue::Text(s)),
        _ => None,
    })
}

impl RawFarmerRecord {
    /// Latitude as a finite number, if present and parseable.
    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        self.latitude.as_ref().and_then(CoordinateValue::to_finite)
    }

    /// Longitude as a finite number, if present and parseable.
    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        self.longitude.as_ref().and_then(CoordinateValue::to_finite)
    }

    /// Convert into a validated record.
    ///
    /// Returns `None` when the id is missing or either coordinate is absent
    /// or not a finite number.
    #[must_use]
    pub fn normalize(self) -> Option<FarmerRecord> {
        let id = self.id?;
        let latitude = self.latitude()?;
        let longitude = self.longitude()?;
        let timestamp = self.timestamp.as_deref().and_then(parse_timestamp);

        Some(FarmerRecord {
            id,
            farmer_name: self.farmer_name,
            farmer_id: self.farmer_id,
            latitude,
            longitude,
            elevation: self.elevation,
            accuracy: self.accuracy,
            plant_type: self.plant_type,
            plant_count: self.plant_count,
            timestamp,
            image: self.image,
            other_details: self.other_details,
        })
    }
}

/// A validated farmer record suitable for placing on a map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmerRecord {
    /// Stable server id, used as the dedupe and selection key.
    pub id: RecordId,
    pub farmer_name: Option<String>,
    pub farmer_id: Option<String>,
    /// Latitude in degrees, always finite.
    pub latitude: f64,
    /// Longitude in degrees, always finite.
    pub longitude: f64,
    /// Elevation in meters.
    pub elevation: Option<f64>,
    /// GPS accuracy in meters.
    pub accuracy: Option<f64>,
    pub plant_type: Option<String>,
    pub plant_count: Option<i64>,
    /// Capture time, used only for display and ordering.
    pub timestamp: Option<DateTime<Utc>>,
    /// URL of the uploaded image.
    pub image: Option<String>,
    pub other_details: Option<String>,
}

/// Parse a listing response body.
///
/// The body must be a JSON array. Elements that are not JSON objects are
/// skipped so a single bad row does not hide the rest of the listing; fields
/// of an unexpected type inside an object are read leniently.
pub fn parse_listing(body: &[u8]) -> Result<Vec<RawFarmerRecord>> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| Error::Data(format!("invalid JSON: {e}")))?;

    let Value::Array(items) = value else {
        return Err(Error::Data("expected a JSON array of records".to_string()));
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<RawFarmerRecord>(item) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping malformed record at index {index}: {e}"),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: RecordId, lat: CoordinateValue, lon: CoordinateValue) -> RawFarmerRecord {
        RawFarmerRecord {
            id: Some(id),
            latitude: Some(lat),
            longitude: Some(lon),
            ..Default::default()
        }
    }

    #[test]
    fn test_string_coordinates_are_coerced() {
        let record = raw(1, "12.5".into(), " 77.5 ".into()).normalize().unwrap();
        assert!((record.latitude - 12.5).abs() < f64::EPSILON);
        assert!((record.longitude - 77.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_is_a_valid_coordinate() {
        assert!(raw(1, 0.0.into(), 0.0.into()).normalize().is_some());
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        assert!(raw(1, "".into(), 77.0.into()).normalize().is_none());
        assert!(raw(1, "abc".into(), 77.0.into()).normalize().is_none());
        assert!(raw(1, "NaN".into(), 77.0.into()).normalize().is_none());
        assert!(raw(1, "inf".into(), 77.0.into()).normalize().is_none());
        assert!(raw(1, 12.0.into(), f64::INFINITY.into()).normalize().is_none());

        let missing = RawFarmerRecord {
            id: Some(2),
            latitude: Some(12.0.into()),
            ..Default::default()
        };
        assert!(missing.normalize().is_none());
    }

    #[test]
    fn test_missing_id_rejected() {
        let record = RawFarmerRecord {
            id: None,
            latitude: Some(12.0.into()),
            longitude: Some(77.0.into()),
            ..Default::default()
        };
        assert!(record.normalize().is_none());
    }

    #[test]
    fn test_parse_listing_mixed_shapes() {
        let body = br#"[
            {"id": 1, "latitude": "12.5", "longitude": 77.5, "farmer_name": "Ravi",
             "plant_count": 40, "timestamp": "2024-06-24T08:30:00Z"},
            {"id": 2, "latitude": null, "longitude": null},
            "not a record",
            {"id": 3, "latitude": 13.0, "longitude": 78.0, "unknown_field": true}
        ]"#;

        let records = parse_listing(body).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].farmer_name.as_deref(), Some("Ravi"));
        assert_eq!(records[0].plant_count, Some(40));
        assert_eq!(records[1].latitude, None);
        assert_eq!(records[2].id, Some(3));
    }

    #[test]
    fn test_mistyped_display_fields_keep_record() {
        let body = br#"[
            {"id": 1, "latitude": 12.5, "longitude": 77.5, "farmer_id": 1001},
            {"id": 2, "latitude": "13.0", "longitude": "78.0", "plant_count": "40"},
            {"id": 3, "latitude": 14.0, "longitude": 79.0, "elevation": "920.5",
             "accuracy": {"value": 3}, "farmer_name": ["x"], "plant_count": 12.0},
            {"id": "4", "latitude": 15.0, "longitude": 80.0, "plant_count": "many"}
        ]"#;

        let records = parse_listing(body).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].farmer_id.as_deref(), Some("1001"));
        assert_eq!(records[1].plant_count, Some(40));
        assert_eq!(records[2].elevation, Some(920.5));
        assert_eq!(records[2].accuracy, None);
        assert_eq!(records[2].farmer_name, None);
        assert_eq!(records[2].plant_count, Some(12));
        assert_eq!(records[3].id, Some(4));
        assert_eq!(records[3].plant_count, None);

        let ids: Vec<RecordId> = records
            .into_iter()
            .filter_map(RawFarmerRecord::normalize)
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_non_scalar_coordinate_is_absent() {
        let records = parse_listing(br#"[{"id": 1, "latitude": [12.5], "longitude": 77.5}]"#).unwrap();
        assert_eq!(records[0].latitude, None);
        assert!(records[0].clone().normalize().is_none());
    }

    #[test]
    fn test_parse_listing_rejects_non_array() {
        let err = parse_listing(br#"{"detail": "Not found."}"#).unwrap_err();
        assert!(matches!(err, Error::Data(_)));

        let err = parse_listing(b"<html>").unwrap_err();
        assert!(matches!(err, Error::Data(_)));
    }
}
