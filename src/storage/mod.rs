// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persistence of uploaded radiographs
//!
//! The analysis pipeline writes each upload once, before inference, and then
//! only needs the returned path (for the backend) and URL (for the client).

pub mod local;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::vision::image_utils::{detect_format, format_to_extension};

pub use local::LocalImageStore;

/// Extension used when neither the filename nor the content tells us one
pub const FALLBACK_EXTENSION: &str = "bin";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create upload directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where an upload ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Filesystem location, handed to the inference backend
    pub path: PathBuf,
    /// Client-facing URL of the same bytes
    pub url: String,
}

/// Durable storage for uploaded images
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `bytes` under `<id>.<extension>`
    ///
    /// Completes only once the bytes are fully written.
    async fn store(&self, id: &str, extension: &str, bytes: &[u8]) -> Result<StoredImage, StorageError>;
}

/// Work out the file extension for an upload
///
/// Uses the text after the last `.` in the client filename when it is a
/// plain ASCII alphanumeric token, otherwise sniffs the content.
pub fn recover_extension(filename: &str, bytes: &[u8]) -> String {
    let from_name = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    if let Some(ext) = from_name {
        return ext;
    }

    detect_format(bytes)
        .ok()
        .and_then(format_to_extension)
        .unwrap_or(FALLBACK_EXTENSION)
        .to_string()
}
