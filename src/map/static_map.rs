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

use std::fmt;
use std::fmt::Write;

use farm_client::{FarmerRecord, Viewport};

const STATIC_MAP_BASE: &str = "https://maps.googleapis.com/maps/api/staticmap";
const BROWSE_BASE: &str = "https://www.google.com/maps/@";
const SEARCH_BASE: &str = "https://www.google.com/maps/search/?api=1&query=";

/// Static map requests have a URL length limit, so only the first markers
/// are drawn.
pub const MAX_STATIC_MARKERS: usize = 50;

const STATIC_MAP_SIZE: &str = "640x480";

/// Builds map URLs for a viewport and its markers.
#[derive(Clone, Default)]
pub struct MapLinks {
    api_key: Option<String>,
}

impl fmt::Debug for MapLinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapLinks")
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl MapLinks {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key }
    }

    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Static image of the viewport with one pin per marker. Needs an API key.
    pub fn static_map_url(&self, viewport: &Viewport, markers: &[FarmerRecord]) -> Option<String> {
        let key = self.api_key.as_deref()?;
        let mut url = format!(
            "{STATIC_MAP_BASE}?center={:.6},{:.6}&zoom={}&size={STATIC_MAP_SIZE}",
            viewport.center.lat, viewport.center.lng, viewport.zoom
        );
        if !markers.is_empty() {
            url.push_str("&markers=color:red");
            for marker in markers.iter().take(MAX_STATIC_MARKERS) {
                let _ = write!(url, "%7C{:.6},{:.6}", marker.latitude, marker.longitude);
            }
        }
        let _ = write!(url, "&key={key}");
        Some(url)
    }

    /// Interactive map at the viewport center and zoom.
    pub fn browse_url(viewport: &Viewport) -> String {
        format!(
            "{BROWSE_BASE}{:.6},{:.6},{}z",
            viewport.center.lat, viewport.center.lng, viewport.zoom
        )
    }

    /// Interactive map pinned on one marker.
    pub fn marker_url(marker: &FarmerRecord) -> String {
        format!("{SEARCH_BASE}{:.6},{:.6}", marker.latitude, marker.longitude)
    }

    /// Best URL for the whole marker layer: the static map when a key is
    /// configured, otherwise the interactive map.
    pub fn overview_url(&self, viewport: &Viewport, markers: &[FarmerRecord]) -> String {
        self.static_map_url(viewport, markers)
            .unwrap_or_else(|| Self::browse_url(viewport))
    }
}
