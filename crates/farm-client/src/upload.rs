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

//! Image upload payloads and local validation.
//!
//! Files are checked for type and size before any request is built, so a
//! rejected file never reaches the network.

use std::path::Path;

use image::ImageFormat;
use serde::Deserialize;

use crate::error::ValidationError;
use crate::record::RawFarmerRecord;

/// Largest accepted upload, in bytes (5 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// MIME types the server accepts for geotagged images.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

/// An image file ready to be posted as the multipart `image` field.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl UploadFile {
    /// Create an upload from in-memory bytes with a known MIME type.
    #[must_use]
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, detecting its MIME type from the contents.
    ///
    /// Falls back to the file extension when the contents are not a
    /// recognized image, so that validation can report the real type.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());
        let mime_type = detect_mime_type(&bytes, path);
        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Check type and size limits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mime = self.mime_type.to_ascii_lowercase();
        if !ACCEPTED_MIME_TYPES.contains(&mime.as_str()) {
            return Err(ValidationError::UnsupportedType(self.mime_type.clone()));
        }
        if self.bytes.is_empty() {
            return Err(ValidationError::Empty);
        }
        if self.size() > MAX_UPLOAD_BYTES {
            return Err(ValidationError::TooLarge {
                size: self.size(),
                limit: MAX_UPLOAD_BYTES,
            });
        }
        Ok(())
    }
}

fn detect_mime_type(bytes: &[u8], path: &Path) -> String {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type().to_string();
    }
    ImageFormat::from_path(path).map_or_else(
        |_| "application/octet-stream".to_string(),
        |format| format.to_mime_type().to_string(),
    )
}

/// Body returned by the upload endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UploadResponse {
    pub message: Option<String>,
    /// The stored record; absent when the server could not process the image.
    pub data: Option<RawFarmerRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn test_accepts_jpeg_and_png() {
        assert!(UploadFile::new("a.jpg", "image/jpeg", vec![0xff; 1024])
            .validate()
            .is_ok());
        assert!(UploadFile::new("a.png", "image/png", vec![1; 1024])
            .validate()
            .is_ok());
        assert!(UploadFile::new("a.jpg", "IMAGE/JPG", vec![1; 10])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_rejects_text_file() {
        let err = UploadFile::new("notes.txt", "text/plain", b"hello".to_vec())
            .validate()
            .unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedType("text/plain".into()));
    }

    #[test]
    fn test_size_limit() {
        let exact = usize::try_from(MAX_UPLOAD_BYTES).unwrap();
        assert!(UploadFile::new("a.jpg", "image/jpeg", vec![0; exact])
            .validate()
            .is_ok());

        let err = UploadFile::new("big.jpg", "image/jpeg", vec![0; 6 * 1024 * 1024])
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLarge {
                size: 6 * 1024 * 1024,
                limit: MAX_UPLOAD_BYTES
            }
        );
    }

    #[test]
    fn test_empty_file_rejected() {
        let err = UploadFile::new("a.png", "image/png", Vec::new())
            .validate()
            .unwrap_err();
        assert_eq!(err, ValidationError::Empty);
    }

    #[test]
    fn test_detect_mime_from_contents() {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(&[0; 16]);
        // Contents win over a misleading extension.
        assert_eq!(detect_mime_type(&bytes, Path::new("photo.jpg")), "image/png");
        assert_eq!(
            detect_mime_type(b"plain text", Path::new("photo.jpeg")),
            "image/jpeg"
        );
        assert_eq!(
            detect_mime_type(b"plain text", Path::new("notes.txt")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_response_without_data() {
        let response: UploadResponse =
            serde_json::from_str(r#"{"error": "Failed to extract text from image"}"#).unwrap();
        assert!(response.data.is_none());
    }
}
