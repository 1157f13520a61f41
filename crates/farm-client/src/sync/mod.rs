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

//! Marker synchronization with the remote API.
//!
//! [`MarkerSync`] owns the marker set, the selection and the per-operation
//! status. Views read snapshots and change state only through its
//! operations. Fetches are tagged with a sequence number when they start;
//! a completion older than the last applied one is discarded, so a slow
//! request can never overwrite fresher data.

mod poller;

pub use poller::{PollHandle, Poller};

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info, warn};
use tokio::sync::broadcast;

use crate::api::FarmApi;
use crate::error::{Error, Result};
use crate::markers::{MarkerSet, Selection};
use crate::record::{FarmerRecord, RawFarmerRecord, RecordId};
use crate::status::{user_message, Operation, OperationStatus, OperationStatuses, SyncPhase};
use crate::upload::UploadFile;
use crate::viewport::{compute_viewport, Viewport, ViewportStrategy};

/// Behavior switches for [`MarkerSync`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Order markers newest first by timestamp.
    pub sort_by_timestamp: bool,
    /// Empty the marker set when a fetch fails instead of keeping the last one.
    pub clear_on_error: bool,
    /// How [`MarkerSync::viewport`] derives the map center.
    pub viewport_strategy: ViewportStrategy,
    /// Broadcast channel capacity for events.
    pub event_channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sort_by_timestamp: true,
            clear_on_error: false,
            viewport_strategy: ViewportStrategy::default(),
            event_channel_capacity: 64,
        }
    }
}

/// Events emitted when synchronized state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A fetch was applied and the marker set replaced.
    MarkersReplaced { count: usize },
    /// A fetch failed; holds the user-facing message.
    FetchFailed(String),
    /// A record was deleted on the server and removed locally.
    MarkerRemoved(RecordId),
    /// The selected marker changed.
    SelectionChanged(Option<RecordId>),
    /// An image was uploaded; holds the id the server assigned, if any.
    Uploaded(Option<RecordId>),
}

/// Result of a fetch that reached the server successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response replaced the marker set.
    Applied { count: usize },
    /// A newer fetch had already been applied; this response was dropped.
    Superseded,
}

#[derive(Debug, Default)]
struct SyncState {
    markers: MarkerSet,
    selection: Selection,
    phase: SyncPhase,
    statuses: OperationStatuses,
    next_seq: u64,
    applied_seq: u64,
    in_flight: usize,
    settled_phase: SyncPhase,
    settled_fetch: OperationStatus,
}

/// Owner of the synchronized marker set.
pub struct MarkerSync<A> {
    api: Arc<A>,
    config: SyncConfig,
    state: RwLock<SyncState>,
    event_tx: broadcast::Sender<SyncEvent>,
}

impl<A> std::fmt::Debug for MarkerSync<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("MarkerSync")
            .field("marker_count", &state.markers.len())
            .field("phase", &state.phase)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<A: FarmApi> MarkerSync<A> {
    /// Create a sync with an empty marker set.
    #[must_use]
    pub fn new(api: Arc<A>, config: SyncConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));
        Self {
            api,
            config,
            state: RwLock::new(SyncState::default()),
            event_tx,
        }
    }

    /// The underlying API client.
    #[must_use]
    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Fetch every record and replace the marker set.
    ///
    /// On failure the previous set is kept (or emptied with
    /// [`SyncConfig::clear_on_error`]) and the error is also recorded in the
    /// fetch status.
    pub async fn fetch_markers(&self) -> Result<FetchOutcome> {
        let seq = {
            let mut state = self.write();
            state.next_seq += 1;
            state.in_flight += 1;
            state.phase = SyncPhase::Loading;
            state.statuses.set(Operation::Fetch, OperationStatus::Loading);
            state.next_seq
        };
        debug!("Fetch #{seq} started");
        let _in_flight = InFlightFetch { sync: self };

        let result = self.api.list_records().await;

        let mut state = self.write();
        if seq <= state.applied_seq {
            debug!(
                "Dropping fetch #{seq}, #{} already applied",
                state.applied_seq
            );
            return match result {
                Ok(_) => Ok(FetchOutcome::Superseded),
                Err(e) => Err(e),
            };
        }
        state.applied_seq = seq;

        match result {
            Ok(records) => {
                let markers = MarkerSet::from_records(records, self.config.sort_by_timestamp);
                let count = markers.len();
                state.markers = markers;
                let selection_cleared = state.retain_selection();
                state.settle_fetch(SyncPhase::Ready, OperationStatus::Succeeded);
                drop(state);

                info!("Loaded {count} markers");
                if selection_cleared {
                    self.emit(SyncEvent::SelectionChanged(None));
                }
                self.emit(SyncEvent::MarkersReplaced { count });
                Ok(FetchOutcome::Applied { count })
            }
            Err(e) => {
                let message = user_message(Operation::Fetch, &e);
                let mut selection_cleared = false;
                if self.config.clear_on_error {
                    state.markers = MarkerSet::new();
                    selection_cleared = state.retain_selection();
                }
                state.settle_fetch(
                    SyncPhase::Error(message.clone()),
                    OperationStatus::Failed(message.clone()),
                );
                drop(state);

                warn!("Error fetching markers: {e}");
                if selection_cleared {
                    self.emit(SyncEvent::SelectionChanged(None));
                }
                self.emit(SyncEvent::FetchFailed(message));
                Err(e)
            }
        }
    }

    /// Delete a record on the server, then drop it locally.
    ///
    /// The local set only changes after the server confirms.
    pub async fn delete_record(&self, id: RecordId) -> Result<()> {
        self.write()
            .statuses
            .set(Operation::Delete, OperationStatus::Loading);

        match self.api.delete_record(id).await {
            Ok(()) => {
                let mut state = self.write();
                let removed = state.markers.remove(id).is_some();
                let selection_cleared = state.selection.id() == Some(id) && state.selection.clear();
                state
                    .statuses
                    .set(Operation::Delete, OperationStatus::Succeeded);
                drop(state);

                info!("Deleted record {id}");
                if selection_cleared {
                    self.emit(SyncEvent::SelectionChanged(None));
                }
                if removed {
                    self.emit(SyncEvent::MarkerRemoved(id));
                }
                Ok(())
            }
            Err(e) => {
                self.fail(Operation::Delete, &e);
                warn!("Error deleting record {id}: {e}");
                Err(e)
            }
        }
    }

    /// Validate and upload an image, returning the record the server stored.
    ///
    /// Files that fail validation are rejected without calling the API.
    pub async fn upload_image(&self, file: &UploadFile) -> Result<RawFarmerRecord> {
        if let Err(e) = file.validate() {
            let err = Error::from(e);
            self.fail(Operation::Upload, &err);
            warn!("Rejected upload of {}: {err}", file.file_name);
            return Err(err);
        }

        self.write()
            .statuses
            .set(Operation::Upload, OperationStatus::Loading);

        let result = self.api.upload_image(file).await.and_then(|response| {
            response
                .data
                .ok_or_else(|| Error::Data("upload response has no data".to_string()))
        });

        match result {
            Ok(record) => {
                self.write()
                    .statuses
                    .set(Operation::Upload, OperationStatus::Succeeded);
                info!("Uploaded {} as record {:?}", file.file_name, record.id);
                self.emit(SyncEvent::Uploaded(record.id));
                Ok(record)
            }
            Err(e) => {
                self.fail(Operation::Upload, &e);
                warn!("Upload of {} failed: {e}", file.file_name);
                Err(e)
            }
        }
    }
}

impl<A> MarkerSync<A> {
    /// Select a marker for detail display.
    ///
    /// Returns the selected record, or `None` (selection unchanged) when
    /// `id` is not in the current set.
    pub fn select_marker(&self, id: RecordId) -> Option<FarmerRecord> {
        let (changed, record) = {
            let mut guard = self.write();
            let state = &mut *guard;
            (
                state.selection.select(&state.markers, id),
                state.markers.get(id).cloned(),
            )
        };
        if changed {
            self.emit(SyncEvent::SelectionChanged(Some(id)));
        }
        record
    }

    /// Clear the selection. Safe to call repeatedly.
    pub fn clear_selection(&self) {
        let cleared = self.write().selection.clear();
        if cleared {
            self.emit(SyncEvent::SelectionChanged(None));
        }
    }

    /// The selected record with all of its attributes.
    #[must_use]
    pub fn selected(&self) -> Option<FarmerRecord> {
        let state = self.read();
        state.selection.resolve(&state.markers).cloned()
    }

    /// Snapshot of the markers in display order.
    #[must_use]
    pub fn markers(&self) -> Vec<FarmerRecord> {
        self.read().markers.markers().to_vec()
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.read().markers.len()
    }

    /// Viewport for the current marker set.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        compute_viewport(self.read().markers.markers(), self.config.viewport_strategy)
    }

    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        self.read().phase.clone()
    }

    /// Status of the most recent attempt of `op`.
    #[must_use]
    pub fn status(&self, op: Operation) -> OperationStatus {
        self.read().statuses.get(op).clone()
    }

    /// Subscribe to state change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }

    fn fail(&self, op: Operation, err: &Error) {
        debug!("Recording failed {} ({:?})", op.as_str(), err.kind());
        self.write()
            .statuses
            .set(op, OperationStatus::Failed(user_message(op, err)));
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.event_tx.send(event);
    }

    fn read(&self) -> RwLockReadGuard<'_, SyncState> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SyncState> {
        self.state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SyncState {
    fn retain_selection(&mut self) -> bool {
        self.selection.retain_in(&self.markers)
    }

    fn settle_fetch(&mut self, phase: SyncPhase, status: OperationStatus) {
        self.settled_phase = phase.clone();
        self.settled_fetch = status.clone();
        self.phase = phase;
        self.statuses.set(Operation::Fetch, status);
    }
}

/// Tracks one running [`MarkerSync::fetch_markers`] call.
///
/// If the last in-flight fetch is dropped before it completes, the phase and
/// fetch status go back to the last settled values instead of staying
/// `Loading`.
struct InFlightFetch<'a, A> {
    sync: &'a MarkerSync<A>,
}

impl<A> Drop for InFlightFetch<'_, A> {
    fn drop(&mut self) {
        let mut state = self.sync.write();
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.in_flight == 0 && state.phase == SyncPhase::Loading {
            state.phase = state.settled_phase.clone();
            let settled = state.settled_fetch.clone();
            state.statuses.set(Operation::Fetch, settled);
            debug!("Fetch abandoned, phase back to {:?}", state.phase);
        }
    }
}
