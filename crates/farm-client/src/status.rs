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

//! Operation status tracking and user-facing messages.

use crate::error::{Error, NetworkError, ValidationError};

/// Lifecycle of the marker set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncPhase {
    /// No fetch has been attempted yet.
    #[default]
    Uninitialized,
    /// A fetch is in flight.
    Loading,
    /// The last applied fetch succeeded.
    Ready,
    /// The last fetch failed; holds the user-facing message.
    Error(String),
}

/// Operations whose outcome is tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Fetch,
    Delete,
    Upload,
}

impl Operation {
    /// Human-readable name for logs and status lines.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Fetch => "fetch",
            Operation::Delete => "delete",
            Operation::Upload => "upload",
        }
    }
}

/// Outcome of the most recent attempt of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OperationStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    /// Holds the user-facing message.
    Failed(String),
}

impl OperationStatus {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Per-operation statuses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationStatuses {
    pub fetch: OperationStatus,
    pub delete: OperationStatus,
    pub upload: OperationStatus,
}

impl OperationStatuses {
    #[must_use]
    pub fn get(&self, op: Operation) -> &OperationStatus {
        match op {
            Operation::Fetch => &self.fetch,
            Operation::Delete => &self.delete,
            Operation::Upload => &self.upload,
        }
    }

    pub fn set(&mut self, op: Operation, status: OperationStatus) {
        match op {
            Operation::Fetch => self.fetch = status,
            Operation::Delete => self.delete = status,
            Operation::Upload => self.upload = status,
        }
    }
}

/// Message shown to the user when `op` fails with `err`.
#[must_use]
pub fn user_message(op: Operation, err: &Error) -> String {
    match err {
        Error::Validation(v) => validation_message(v).to_string(),
        Error::Network(n) => network_message(op, n),
        Error::Data(_) => match op {
            Operation::Fetch => "Received malformed marker data from the server.".to_string(),
            Operation::Delete => "Unexpected response while deleting farmer data.".to_string(),
            Operation::Upload => "Invalid response from server.".to_string(),
        },
    }
}

fn validation_message(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::UnsupportedType(_) => "Please select a valid image file (JPEG, PNG).",
        ValidationError::TooLarge { .. } => "File size must be less than 5MB.",
        ValidationError::Empty => "Please select an image first.",
    }
}

fn network_message(op: Operation, err: &NetworkError) -> String {
    if let NetworkError::Status {
        message: Some(server_message),
        ..
    } = err
    {
        if op == Operation::Upload {
            return server_message.clone();
        }
    }

    let base = match op {
        Operation::Fetch => "Failed to fetch markers. Please check your backend connection.",
        Operation::Delete => "Failed to delete farmer data. Please try again later.",
        Operation::Upload => "Upload failed. Please check your connection and try again.",
    };

    if matches!(err, NetworkError::Timeout) {
        format!("{base} (request timed out)")
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_distinct_per_kind() {
        let validation = user_message(
            Operation::Upload,
            &Error::from(ValidationError::UnsupportedType("text/plain".into())),
        );
        let network = user_message(Operation::Upload, &Error::from(NetworkError::Timeout));
        let data = user_message(Operation::Upload, &Error::Data("no data".into()));

        assert_ne!(validation, network);
        assert_ne!(network, data);
        assert_ne!(validation, data);
    }

    #[test]
    fn test_upload_surfaces_server_message() {
        let err = Error::from(NetworkError::Status {
            status: 400,
            message: Some("Incomplete location data".into()),
        });
        assert_eq!(
            user_message(Operation::Upload, &err),
            "Incomplete location data"
        );
        assert_eq!(
            user_message(Operation::Fetch, &err),
            "Failed to fetch markers. Please check your backend connection."
        );
    }

    #[test]
    fn test_statuses_tracked_independently() {
        let mut statuses = OperationStatuses::default();
        statuses.set(Operation::Fetch, OperationStatus::Failed("x".into()));
        statuses.set(Operation::Delete, OperationStatus::Loading);

        assert_eq!(statuses.get(Operation::Fetch).error_message(), Some("x"));
        assert!(statuses.get(Operation::Delete).is_loading());
        assert_eq!(statuses.get(Operation::Upload), &OperationStatus::Idle);
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::Fetch.as_str(), "fetch");
        assert_eq!(Operation::Delete.as_str(), "delete");
        assert_eq!(Operation::Upload.as_str(), "upload");
    }
}
