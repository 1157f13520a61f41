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

//! Client library for geotagged farmer records.
//!
//! Fetches farmer records from a farm survey API, turns them into a
//! validated, deduplicated marker set, and derives map viewport parameters.
//! The layers can be used independently or together:
//!
//! - **Record layer**: wire shape, coordinate coercion and timestamp parsing
//! - **Marker layer**: filtering, dedupe by id, ordering and selection
//! - **Viewport**: center and zoom derivation for a marker set
//! - **API layer**: the [`FarmApi`] seam and its reqwest implementation
//! - **Sync layer**: [`MarkerSync`] state owner and the cancellable [`Poller`]
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use farm_client::{ApiConfig, HttpFarmApi, MarkerSync, Poller, SyncConfig, SyncEvent};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), farm_client::Error> {
//!     let api = Arc::new(HttpFarmApi::new(ApiConfig {
//!         base_url: "http://127.0.0.1:8000".to_string(),
//!         ..Default::default()
//!     })?);
//!     let sync = Arc::new(MarkerSync::new(api, SyncConfig::default()));
//!     let mut events = sync.subscribe();
//!
//!     let _poller = Poller::spawn(Arc::clone(&sync), Some(Duration::from_secs(30)));
//!
//!     while let Ok(event) = events.recv().await {
//!         if let SyncEvent::MarkersReplaced { count } = event {
//!             let viewport = sync.viewport();
//!             println!("{count} markers around {:?}", viewport.center);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Marker Layer Only
//!
//! ```
//! use farm_client::markers::MarkerSet;
//! use farm_client::record::parse_listing;
//! use farm_client::viewport::{compute_viewport, ViewportStrategy};
//!
//! let body = br#"[
//!     {"id": 1, "latitude": "12.5", "longitude": "77.5", "timestamp": "2024-01-01"},
//!     {"id": 1, "latitude": "12.6", "longitude": "77.6", "timestamp": "2024-01-02"}
//! ]"#;
//! let set = MarkerSet::from_records(parse_listing(body).unwrap(), true);
//! assert_eq!(set.len(), 1);
//!
//! let viewport = compute_viewport(set.markers(), ViewportStrategy::Centroid);
//! assert!((viewport.center.lat - 12.6).abs() < 1e-9);
//! ```

pub mod api;
pub mod error;
pub mod markers;
pub mod record;
pub mod status;
pub mod sync;
pub mod upload;
pub mod viewport;

pub use api::{ApiConfig, FarmApi, HttpFarmApi};
pub use error::{Error, ErrorKind, NetworkError, Result, ValidationError};
pub use markers::{MarkerSet, Selection};
pub use record::{FarmerRecord, RawFarmerRecord, RecordId};
pub use status::{Operation, OperationStatus, SyncPhase};
pub use sync::{FetchOutcome, MarkerSync, PollHandle, Poller, SyncConfig, SyncEvent};
pub use upload::{UploadFile, UploadResponse, MAX_UPLOAD_BYTES};
pub use viewport::{compute_viewport, Bounds, LatLng, Viewport, ViewportStrategy};
