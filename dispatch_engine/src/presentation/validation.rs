// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Upload Validation
//!
//! spec.md §6's "validation rules applied before enqueue": file extension,
//! declared MIME type, and size, checked against the `ALLOWED_EXTENSIONS` /
//! `ALLOWED_MIME_TYPES` / `MAX_FILE_SIZE_BYTES` configuration keys. A
//! violation is a [`DispatchError::Validation`] and never results in a job
//! record being created (§7.1) - the caller maps it to HTTP 400 before any
//! enqueue happens.

use dispatch_domain::DispatchError;
use std::collections::HashSet;

/// Validation thresholds resolved once at startup from [`AppConfig`] and
/// shared by every upload route.
///
/// [`AppConfig`]: dispatch_bootstrap::config::AppConfig
#[derive(Debug, Clone)]
pub struct UploadValidationConfig {
    allowed_extensions: HashSet<String>,
    allowed_mime_types: HashSet<String>,
    max_file_size_bytes: u64,
}

impl UploadValidationConfig {
    pub fn new(
        allowed_extensions: impl IntoIterator<Item = String>,
        allowed_mime_types: impl IntoIterator<Item = String>,
        max_file_size_bytes: u64,
    ) -> Self {
        Self {
            allowed_extensions: allowed_extensions.into_iter().map(|e| e.to_lowercase()).collect(),
            allowed_mime_types: allowed_mime_types.into_iter().map(|m| m.to_lowercase()).collect(),
            max_file_size_bytes,
        }
    }

    /// Check extension, declared MIME type, and size, in that order - the
    /// first violation found is the one reported, matching the original
    /// adapter's fail-fast validation order.
    pub fn validate(&self, filename: &str, content_type: Option<&str>, size: u64) -> Result<(), DispatchError> {
        let extension = match filename.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext.to_lowercase(),
            _ => return Err(DispatchError::Validation("filename has no extension".to_string())),
        };
        if !self.allowed_extensions.contains(&extension) {
            return Err(DispatchError::Validation(format!("file extension '{extension}' is not allowed")));
        }

        let mime = content_type.unwrap_or("").to_lowercase();
        if !self.allowed_mime_types.contains(&mime) {
            return Err(DispatchError::Validation(format!("mime type '{mime}' is not allowed")));
        }

        if size > self.max_file_size_bytes {
            return Err(DispatchError::Validation(format!(
                "file size {size} exceeds the maximum of {} bytes",
                self.max_file_size_bytes
            )));
        }

        Ok(())
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation() -> UploadValidationConfig {
        UploadValidationConfig::new(
            vec!["png".to_string(), "jpg".to_string()],
            vec!["image/png".to_string(), "image/jpeg".to_string()],
            1024,
        )
    }

    #[test]
    fn accepts_a_conforming_upload() {
        assert!(validation().validate("scan.png", Some("image/png"), 512).is_ok());
    }

    #[test]
    fn rejects_disallowed_extension() {
        let err = validation().validate("scan.exe", Some("image/png"), 512).unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
    }

    #[test]
    fn rejects_missing_extension() {
        let err = validation().validate("scan", Some("image/png"), 512).unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
    }

    #[test]
    fn rejects_disallowed_mime_type() {
        let err = validation().validate("scan.png", Some("application/octet-stream"), 512).unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
    }

    #[test]
    fn rejects_oversized_upload() {
        let err = validation().validate("scan.png", Some("image/png"), 2048).unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(validation().validate("SCAN.PNG", Some("image/png"), 512).is_ok());
    }
}
