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

//! Marker set construction and selection.
//!
//! A [`MarkerSet`] is built from one listing response: invalid records are
//! dropped, duplicates collapse by id, and the result is optionally ordered
//! newest first. It is always replaced wholesale, never merged.

use std::cmp::Ordering;
use std::collections::HashMap;

use log::debug;

use crate::record::{FarmerRecord, RawFarmerRecord, RecordId};

/// Ordered, deduplicated set of valid farmer records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerSet {
    markers: Vec<FarmerRecord>,
}

impl MarkerSet {
    /// Create an empty marker set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a marker set from one listing response.
    ///
    /// Invalid records are dropped. When an id repeats, the later record's
    /// data wins and keeps the slot of the first occurrence. With
    /// `sort_by_timestamp`, records are stably ordered newest first and
    /// records without a timestamp go last.
    #[must_use]
    pub fn from_records(records: Vec<RawFarmerRecord>, sort_by_timestamp: bool) -> Self {
        let total = records.len();
        let mut markers: Vec<FarmerRecord> = Vec::with_capacity(total);
        let mut slots: HashMap<RecordId, usize> = HashMap::with_capacity(total);

        for record in records.into_iter().filter_map(RawFarmerRecord::normalize) {
            if let Some(&slot) = slots.get(&record.id) {
                markers[slot] = record;
            } else {
                slots.insert(record.id, markers.len());
                markers.push(record);
            }
        }

        if total != markers.len() {
            debug!(
                "Kept {} of {} records after validation and dedupe",
                markers.len(),
                total
            );
        }

        if sort_by_timestamp {
            markers.sort_by(|a, b| newest_first(a, b));
        }

        Self { markers }
    }

    /// All markers in display order.
    #[must_use]
    pub fn markers(&self) -> &[FarmerRecord] {
        &self.markers
    }

    /// Look up a marker by id.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&FarmerRecord> {
        self.markers.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.get(id).is_some()
    }

    /// Remove a marker by id, keeping the others in order.
    ///
    /// Returns the removed record, if it was present.
    pub fn remove(&mut self, id: RecordId) -> Option<FarmerRecord> {
        let pos = self.markers.iter().position(|m| m.id == id)?;
        Some(self.markers.remove(pos))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

fn newest_first(a: &FarmerRecord, b: &FarmerRecord) -> Ordering {
    match (a.timestamp, b.timestamp) {
        (Some(ta), Some(tb)) => tb.cmp(&ta),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Transient reference to the marker shown in the detail view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<RecordId>,
}

impl Selection {
    /// Select `id` if it is in `set`. Returns whether the selection changed.
    pub fn select(&mut self, set: &MarkerSet, id: RecordId) -> bool {
        if !set.contains(id) || self.selected == Some(id) {
            return false;
        }
        self.selected = Some(id);
        true
    }

    /// Clear the selection. Returns whether anything was selected.
    pub fn clear(&mut self) -> bool {
        self.selected.take().is_some()
    }

    /// Drop the selection if `set` no longer holds it.
    pub fn retain_in(&mut self, set: &MarkerSet) -> bool {
        match self.selected {
            Some(id) if !set.contains(id) => self.clear(),
            _ => false,
        }
    }

    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        self.selected
    }

    /// The selected record, resolved against the current set.
    #[must_use]
    pub fn resolve<'a>(&self, set: &'a MarkerSet) -> Option<&'a FarmerRecord> {
        self.selected.and_then(|id| set.get(id))
    }
}
