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

//! Periodic marker refresh.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::MarkerSync;
use crate::api::FarmApi;

/// Spawns the background refresh task for a [`MarkerSync`].
#[derive(Debug)]
pub struct Poller;

impl Poller {
    /// Fetch immediately, then every `interval`.
    ///
    /// Each tick runs its fetch as a separate task, so a slow response does
    /// not delay the next tick; ordering is handled by the sync's sequence
    /// guard. With `interval` of `None` (or zero) only the initial fetch
    /// runs. Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn<A>(sync: Arc<MarkerSync<A>>, interval: Option<Duration>) -> PollHandle
    where
        A: FarmApi + 'static,
    {
        let cancel_token = CancellationToken::new();
        let interval = interval.filter(|period| !period.is_zero());
        let task_cancel = cancel_token.clone();

        tokio::spawn(async move {
            match interval {
                Some(period) => poll_loop(sync, period, task_cancel).await,
                None => {
                    info!("Marker polling disabled, fetching once");
                    spawn_fetch(sync, task_cancel);
                }
            }
        });

        PollHandle {
            cancel_token,
            interval,
        }
    }
}

async fn poll_loop<A>(sync: Arc<MarkerSync<A>>, period: Duration, cancel_token: CancellationToken)
where
    A: FarmApi + 'static,
{
    info!("Polling markers every {} ms", period.as_millis());

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                spawn_fetch(Arc::clone(&sync), cancel_token.clone());
            }
            () = cancel_token.cancelled() => {
                info!("Marker polling stopped");
                return;
            }
        }
    }
}

fn spawn_fetch<A>(sync: Arc<MarkerSync<A>>, cancel_token: CancellationToken)
where
    A: FarmApi + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            result = sync.fetch_markers() => {
                if let Err(e) = result {
                    warn!("Scheduled fetch failed: {e}");
                }
            }
            () = cancel_token.cancelled() => {
                debug!("Abandoning in-flight fetch after cancellation");
            }
        }
    });
}

/// Handle to a running poller.
///
/// Polling stops when [`PollHandle::cancel`] is called or the handle is
/// dropped. Responses of in-flight fetches are never applied, and the sync's
/// phase and fetch status fall back to their last settled values.
pub struct PollHandle {
    cancel_token: CancellationToken,
    interval: Option<Duration>,
}

impl std::fmt::Debug for PollHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollHandle")
            .field("interval", &self.interval)
            .field("cancelled", &self.cancel_token.is_cancelled())
            .finish()
    }
}

impl PollHandle {
    /// Stop polling.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Effective polling period, `None` when polling is disabled.
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
