//! Shared mock API for integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use farm_client::error::Result;
use farm_client::record::CoordinateValue;
use farm_client::{Error, FarmApi, RawFarmerRecord, RecordId, UploadFile, UploadResponse};
use tokio::sync::oneshot;

/// Canned reply for a `list_records` call.
pub enum ListReply {
    Ready(Result<Vec<RawFarmerRecord>>),
    /// Held until the test sends the result.
    Gated(oneshot::Receiver<Result<Vec<RawFarmerRecord>>>),
}

#[derive(Default)]
struct MockApiInner {
    list_calls: usize,
    delete_calls: Vec<RecordId>,
    upload_calls: Vec<String>,
    list_replies: VecDeque<ListReply>,
    default_list: Vec<RawFarmerRecord>,
    delete_error: Option<Error>,
    upload_reply: Option<Result<UploadResponse>>,
}

#[derive(Default)]
pub struct MockApi {
    inner: Mutex<MockApiInner>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply used once the queued replies run out.
    pub fn set_default_list(&self, records: Vec<RawFarmerRecord>) {
        self.inner.lock().unwrap().default_list = records;
    }

    pub fn push_list(&self, reply: Result<Vec<RawFarmerRecord>>) {
        self.inner
            .lock()
            .unwrap()
            .list_replies
            .push_back(ListReply::Ready(reply));
    }

    pub fn push_gated_list(&self) -> oneshot::Sender<Result<Vec<RawFarmerRecord>>> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .lock()
            .unwrap()
            .list_replies
            .push_back(ListReply::Gated(rx));
        tx
    }

    pub fn fail_deletes_with(&self, err: Error) {
        self.inner.lock().unwrap().delete_error = Some(err);
    }

    pub fn set_upload_reply(&self, reply: Result<UploadResponse>) {
        self.inner.lock().unwrap().upload_reply = Some(reply);
    }

    pub fn list_calls(&self) -> usize {
        self.inner.lock().unwrap().list_calls
    }

    pub fn delete_calls(&self) -> Vec<RecordId> {
        self.inner.lock().unwrap().delete_calls.clone()
    }

    pub fn upload_calls(&self) -> usize {
        self.inner.lock().unwrap().upload_calls.len()
    }
}

#[async_trait]
impl FarmApi for MockApi {
    async fn list_records(&self) -> Result<Vec<RawFarmerRecord>> {
        let reply = {
            let mut inner = self.inner.lock().unwrap();
            inner.list_calls += 1;
            match inner.list_replies.pop_front() {
                Some(reply) => reply,
                None => ListReply::Ready(Ok(inner.default_list.clone())),
            }
        };

        match reply {
            ListReply::Ready(result) => result,
            ListReply::Gated(rx) => rx
                .await
                .unwrap_or_else(|_| Err(Error::Data("gate dropped".to_string()))),
        }
    }

    async fn delete_record(&self, id: RecordId) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.delete_calls.push(id);
        match &inner.delete_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn upload_image(&self, file: &UploadFile) -> Result<UploadResponse> {
        let mut inner = self.inner.lock().unwrap();
        inner.upload_calls.push(file.file_name.clone());
        inner.upload_reply.clone().unwrap_or_else(|| Ok(UploadResponse::default()))
    }
}

pub fn record(id: RecordId, lat: f64, lon: f64) -> RawFarmerRecord {
    RawFarmerRecord {
        id: Some(id),
        latitude: Some(CoordinateValue::Number(lat)),
        longitude: Some(CoordinateValue::Number(lon)),
        ..Default::default()
    }
}

pub fn record_at(id: RecordId, lat: &str, lon: &str, timestamp: &str) -> RawFarmerRecord {
    RawFarmerRecord {
        id: Some(id),
        latitude: Some(CoordinateValue::from(lat)),
        longitude: Some(CoordinateValue::from(lon)),
        timestamp: Some(timestamp.to_string()),
        ..Default::default()
    }
}
