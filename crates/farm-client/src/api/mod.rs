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

//! Remote API layer.
//!
//! [`FarmApi`] is the seam between marker state and the network. The
//! production implementation is [`HttpFarmApi`]; tests substitute their own.

mod http;

pub use http::{ApiConfig, HttpFarmApi};

use async_trait::async_trait;

use crate::error::Result;
use crate::record::{RawFarmerRecord, RecordId};
use crate::upload::{UploadFile, UploadResponse};

/// Operations offered by the farm records API.
#[async_trait]
pub trait FarmApi: Send + Sync {
    /// `GET /api/post-data/`: every stored record.
    async fn list_records(&self) -> Result<Vec<RawFarmerRecord>>;

    /// `DELETE /api/post-data/{id}/`.
    async fn delete_record(&self, id: RecordId) -> Result<()>;

    /// `POST /api/upload/` with the file as multipart field `image`.
    ///
    /// Callers are expected to have validated the file already.
    async fn upload_image(&self, file: &UploadFile) -> Result<UploadResponse>;
}
