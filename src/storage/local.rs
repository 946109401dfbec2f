// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload storage on the local filesystem

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{ImageStore, StorageError, StoredImage};

/// URL prefix under which stored uploads are served
pub const DEFAULT_URL_PREFIX: &str = "/uploads";

/// Writes uploads into a directory that is also served over HTTP
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalImageStore {
    /// Open (creating if needed) the upload directory
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: root.display().to_string(),
                source,
            })?;

        Ok(Self {
            root,
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
        })
    }

    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, id: &str, extension: &str, bytes: &[u8]) -> Result<StoredImage, StorageError> {
        let filename = format!("{}.{}", id, extension);
        let path = self.root.join(&filename);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StorageError::Write {
                path: path.display().to_string(),
                source,
            })?;

        debug!("Stored {} bytes at {}", bytes.len(), path.display());

        Ok(StoredImage {
            path,
            url: format!("{}/{}", self.url_prefix, filename),
        })
    }
}
