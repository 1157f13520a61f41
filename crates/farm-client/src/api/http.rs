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

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde_json::Value;

use super::FarmApi;
use crate::error::{Error, NetworkError, Result};
use crate::record::{parse_listing, RawFarmerRecord, RecordId};
use crate::upload::{UploadFile, UploadResponse};

const USER_AGENT: &str = concat!("farm-client/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`HttpFarmApi`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Scheme, host and optional prefix, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Upper bound for list and delete requests.
    pub request_timeout: Duration,
    /// Upper bound for image uploads.
    pub upload_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout: Duration::from_secs(15),
            upload_timeout: Duration::from_secs(30),
        }
    }
}

/// reqwest-backed implementation of [`FarmApi`].
#[derive(Debug, Clone)]
pub struct HttpFarmApi {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpFarmApi {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        info!("Using farm API at {}", config.base_url);
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn records_url(&self) -> String {
        self.endpoint("post-data/")
    }

    fn record_url(&self, id: RecordId) -> String {
        self.endpoint(&format!("post-data/{id}/"))
    }

    fn upload_url(&self) -> String {
        self.endpoint("upload/")
    }
}

/// Turn a non-success response into [`NetworkError::Status`], keeping any
/// `error` or `message` text from the body.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::Network(NetworkError::Status {
        status: status.as_u16(),
        message: server_message(&body),
    }))
}

fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message", "detail"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl FarmApi for HttpFarmApi {
    async fn list_records(&self) -> Result<Vec<RawFarmerRecord>> {
        let url = self.records_url();
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .timeout(self.config.request_timeout)
            .send()
            .await?;
        let body = ensure_success(response).await?.bytes().await?;
        parse_listing(&body)
    }

    async fn delete_record(&self, id: RecordId) -> Result<()> {
        let url = self.record_url(id);
        debug!("DELETE {url}");

        let response = self
            .client
            .delete(&url)
            .timeout(self.config.request_timeout)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn upload_image(&self, file: &UploadFile) -> Result<UploadResponse> {
        let url = self.upload_url();
        debug!("POST {url} ({}, {} bytes)", file.file_name, file.size());

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(self.config.upload_timeout)
            .send()
            .await?;
        let parsed = ensure_success(response)
            .await?
            .json::<UploadResponse>()
            .await?;
        Ok(parsed)
    }
}
