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

//! Map viewport derivation from the current marker set.

use serde::{Deserialize, Serialize};

use crate::record::FarmerRecord;

/// Fallback center when there is nothing to show (center of India).
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 20.5937,
    lng: 78.9629,
};

/// Zoom used for an empty marker set.
pub const EMPTY_ZOOM: u8 = 5;
const SINGLE_MARKER_ZOOM: u8 = 10;
const FEW_MARKERS_ZOOM: u8 = 8;
const MANY_MARKERS_ZOOM: u8 = 7;
const FEW_MARKERS_MAX: usize = 5;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Axis-aligned box containing every marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    #[must_use]
    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.south + self.north) / 2.0,
            lng: (self.west + self.east) / 2.0,
        }
    }

    /// Whether `point` lies inside the box, edges included.
    #[must_use]
    pub fn contains(&self, point: LatLng) -> bool {
        (self.south..=self.north).contains(&point.lat)
            && (self.west..=self.east).contains(&point.lng)
    }
}

/// How the viewport center is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportStrategy {
    /// Arithmetic mean of all marker coordinates.
    #[default]
    Centroid,
    /// Middle of the box containing every marker.
    FitBounds,
}

/// Center and zoom directive for the map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: u8,
    /// Present for non-empty sets under [`ViewportStrategy::FitBounds`].
    pub bounds: Option<Bounds>,
}

/// Zoom tier for a marker count. Never increases as the count grows.
#[must_use]
pub fn zoom_for_count(count: usize) -> u8 {
    match count {
        0 => EMPTY_ZOOM,
        1 => SINGLE_MARKER_ZOOM,
        n if n <= FEW_MARKERS_MAX => FEW_MARKERS_ZOOM,
        _ => MANY_MARKERS_ZOOM,
    }
}

/// Smallest box containing every marker, or `None` for an empty slice.
#[must_use]
pub fn bounding_box(markers: &[FarmerRecord]) -> Option<Bounds> {
    let first = markers.first()?;
    let init = Bounds {
        south: first.latitude,
        west: first.longitude,
        north: first.latitude,
        east: first.longitude,
    };
    Some(markers.iter().skip(1).fold(init, |b, m| Bounds {
        south: b.south.min(m.latitude),
        west: b.west.min(m.longitude),
        north: b.north.max(m.latitude),
        east: b.east.max(m.longitude),
    }))
}

/// Derive the viewport for a marker set.
#[must_use]
pub fn compute_viewport(markers: &[FarmerRecord], strategy: ViewportStrategy) -> Viewport {
    let zoom = zoom_for_count(markers.len());

    let Some(bounds) = bounding_box(markers) else {
        return Viewport {
            center: DEFAULT_CENTER,
            zoom,
            bounds: None,
        };
    };

    match strategy {
        ViewportStrategy::Centroid => {
            #[allow(clippy::cast_precision_loss, reason = "marker counts are far below 2^52")]
            let count = markers.len() as f64;
            let (lat_sum, lng_sum) = markers
                .iter()
                .fold((0.0, 0.0), |(lat, lng), m| (lat + m.latitude, lng + m.longitude));
            Viewport {
                center: LatLng {
                    lat: lat_sum / count,
                    lng: lng_sum / count,
                },
                zoom,
                bounds: None,
            }
        }
        ViewportStrategy::FitBounds => Viewport {
            center: bounds.center(),
            zoom,
            bounds: Some(bounds),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawFarmerRecord;

    fn marker(id: u64, lat: f64, lng: f64) -> FarmerRecord {
        RawFarmerRecord {
            id: Some(id),
            latitude: Some(lat.into()),
            longitude: Some(lng.into()),
            ..Default::default()
        }
        .normalize()
        .unwrap()
    }

    #[test]
    fn test_empty_uses_default_center() {
        let viewport = compute_viewport(&[], ViewportStrategy::Centroid);
        assert_eq!(viewport.center, DEFAULT_CENTER);
        assert_eq!(viewport.zoom, EMPTY_ZOOM);
        assert!(viewport.bounds.is_none());

        let viewport = compute_viewport(&[], ViewportStrategy::FitBounds);
        assert_eq!(viewport.center, DEFAULT_CENTER);
        assert!(viewport.bounds.is_none());
    }

    #[test]
    fn test_centroid_is_mean() {
        let markers = [
            marker(1, 10.0, 70.0),
            marker(2, 12.0, 74.0),
            marker(3, 17.0, 80.0),
        ];
        let viewport = compute_viewport(&markers, ViewportStrategy::Centroid);
        assert!((viewport.center.lat - 13.0).abs() < 1e-9);
        assert!((viewport.center.lng - 74.666_666_666_7).abs() < 1e-6);
    }

    #[test]
    fn test_fit_bounds_contains_every_marker() {
        let markers = [
            marker(1, 10.0, 70.0),
            marker(2, -5.0, 90.0),
            marker(3, 17.0, 80.0),
        ];
        let viewport = compute_viewport(&markers, ViewportStrategy::FitBounds);
        let bounds = viewport.bounds.unwrap();
        assert_eq!(
            bounds,
            Bounds {
                south: -5.0,
                west: 70.0,
                north: 17.0,
                east: 90.0
            }
        );
        for m in &markers {
            assert!(bounds.contains(LatLng {
                lat: m.latitude,
                lng: m.longitude
            }));
        }
        assert!((viewport.center.lat - 6.0).abs() < 1e-9);
        assert!((viewport.center.lng - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_non_increasing_with_count() {
        let zooms: Vec<u8> = (1..=50).map(zoom_for_count).collect();
        assert!(zooms.windows(2).all(|w| w[0] >= w[1]));
        assert!(zoom_for_count(1) >= zoom_for_count(6));
        assert!(zoom_for_count(6) >= zoom_for_count(20));
    }
}
