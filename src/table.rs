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

//! Text rendering of markers, marker details and upload results.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use farm_client::{FarmerRecord, RawFarmerRecord, Viewport};

/// Shown in place of the table when there are no markers.
pub const EMPTY_STATE: &str = "No farmer records to display.";

const NOT_AVAILABLE: &str = "N/A";
const HEADERS: [&str; 8] = [
    "ID",
    "Farmer Name",
    "Farmer ID",
    "Plant Type",
    "Plant Count",
    "Latitude",
    "Longitude",
    "Captured",
];

fn or_na(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(NOT_AVAILABLE)
}

fn format_coordinate(value: f64) -> String {
    format!("{value:.6}")
}

fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp.map_or_else(
        || NOT_AVAILABLE.to_string(),
        |ts| ts.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}

fn format_count(count: Option<i64>) -> String {
    count.map_or_else(|| NOT_AVAILABLE.to_string(), |c| c.to_string())
}

fn row(marker: &FarmerRecord) -> [String; 8] {
    [
        marker.id.to_string(),
        or_na(marker.farmer_name.as_deref()).to_string(),
        or_na(marker.farmer_id.as_deref()).to_string(),
        or_na(marker.plant_type.as_deref()).to_string(),
        format_count(marker.plant_count),
        format_coordinate(marker.latitude),
        format_coordinate(marker.longitude),
        format_timestamp(marker.timestamp),
    ]
}

/// Render the marker table, or the empty-state line.
pub fn render_markers(markers: &[FarmerRecord]) -> String {
    if markers.is_empty() {
        return format!("{EMPTY_STATE}\n");
    }

    let rows: Vec<[String; 8]> = markers.iter().map(row).collect();
    let mut widths = HEADERS.map(str::len);
    for r in &rows {
        for (width, cell) in widths.iter_mut().zip(r) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    write_row(&mut out, &HEADERS.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for r in &rows {
        write_row(&mut out, r, &widths);
    }
    let _ = writeln!(out, "Total markers: {}", markers.len());
    out
}

fn write_row(out: &mut String, cells: &[String; 8], widths: &[usize; 8]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}

/// Render every attribute of one marker.
pub fn render_detail(marker: &FarmerRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", or_na(marker.farmer_name.as_deref()));
    let _ = writeln!(out, "  Record ID:    {}", marker.id);
    let _ = writeln!(out, "  Farmer ID:    {}", or_na(marker.farmer_id.as_deref()));
    let _ = writeln!(out, "  Plant Type:   {}", or_na(marker.plant_type.as_deref()));
    let _ = writeln!(out, "  Plant Count:  {}", format_count(marker.plant_count));
    let _ = writeln!(out, "  Latitude:     {}", format_coordinate(marker.latitude));
    let _ = writeln!(out, "  Longitude:    {}", format_coordinate(marker.longitude));
    if let Some(elevation) = marker.elevation {
        let _ = writeln!(out, "  Elevation:    {elevation:.1} m");
    }
    if let Some(accuracy) = marker.accuracy {
        let _ = writeln!(out, "  Accuracy:     {accuracy:.1} m");
    }
    let _ = writeln!(out, "  Timestamp:    {}", format_timestamp(marker.timestamp));
    if let Some(details) = marker.other_details.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "  Details:      {details}");
    }
    if let Some(image) = marker.image.as_deref() {
        let _ = writeln!(out, "  Image:        {image}");
    }
    out
}

/// Render the record the server stored for an upload.
pub fn render_upload(record: &RawFarmerRecord) -> String {
    let coordinate = |value: Option<f64>| value.map_or_else(|| NOT_AVAILABLE.to_string(), format_coordinate);

    let mut out = String::from("Upload successful!\n");
    if let Some(id) = record.id {
        let _ = writeln!(out, "  Record ID:    {id}");
    }
    let _ = writeln!(out, "  Farmer Name:  {}", or_na(record.farmer_name.as_deref()));
    let _ = writeln!(out, "  Farmer ID:    {}", or_na(record.farmer_id.as_deref()));
    let _ = writeln!(out, "  Latitude:     {}", coordinate(record.latitude()));
    let _ = writeln!(out, "  Longitude:    {}", coordinate(record.longitude()));
    let _ = writeln!(out, "  Plant Type:   {}", or_na(record.plant_type.as_deref()));
    let _ = writeln!(out, "  Plant Count:  {}", format_count(record.plant_count));
    out
}

/// One-line summary of the map viewport.
pub fn render_viewport(viewport: &Viewport) -> String {
    let mut out = format!(
        "Map center: {}, {} (zoom {})",
        format_coordinate(viewport.center.lat),
        format_coordinate(viewport.center.lng),
        viewport.zoom
    );
    if let Some(b) = viewport.bounds {
        let _ = write!(
            out,
            ", bounds {:.4},{:.4} to {:.4},{:.4}",
            b.south, b.west, b.north, b.east
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use farm_client::record::CoordinateValue;
    use farm_client::viewport::{compute_viewport, ViewportStrategy};

    fn marker(id: u64, name: Option<&str>) -> FarmerRecord {
        RawFarmerRecord {
            id: Some(id),
            farmer_name: name.map(str::to_string),
            latitude: Some(CoordinateValue::from("12.5")),
            longitude: Some(CoordinateValue::Number(77.123_456_789)),
            timestamp: Some("2024-06-24T08:30:00Z".to_string()),
            ..Default::default()
        }
        .normalize()
        .unwrap()
    }

    #[test]
    fn test_empty_state() {
        assert_eq!(render_markers(&[]), format!("{EMPTY_STATE}\n"));
    }

    #[test]
    fn test_table_rows_and_fallbacks() {
        let table = render_markers(&[marker(1, Some("Ravi Kumar")), marker(2, None)]);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].starts_with("ID | Farmer Name"));
        assert!(lines[2].contains("Ravi Kumar"));
        assert!(lines[2].contains("12.500000"));
        assert!(lines[2].contains("77.123457"));
        assert!(lines[2].contains("2024-06-24 08:30 UTC"));
        assert!(lines[3].contains("N/A"));
        assert_eq!(lines.last(), Some(&"Total markers: 2"));
    }

    #[test]
    fn test_detail_shows_longitude() {
        let detail = render_detail(&marker(7, Some("Lakshmi")));
        assert!(detail.starts_with("Lakshmi\n"));
        assert!(detail.contains("Latitude:     12.500000"));
        assert!(detail.contains("Longitude:    77.123457"));
        assert!(!detail.contains("Image:"));
    }

    #[test]
    fn test_upload_details() {
        let record = RawFarmerRecord {
            id: Some(3),
            farmer_name: Some("Ravi".into()),
            latitude: Some(CoordinateValue::Number(12.0)),
            ..Default::default()
        };
        let text = render_upload(&record);
        assert!(text.contains("Farmer Name:  Ravi"));
        assert!(text.contains("Latitude:     12.000000"));
        assert!(text.contains("Longitude:    N/A"));
    }

    #[test]
    fn test_viewport_line() {
        let line = render_viewport(&compute_viewport(&[], ViewportStrategy::Centroid));
        assert_eq!(line, "Map center: 20.593700, 78.962900 (zoom 5)");
    }
}
