// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end analysis of one uploaded radiograph
//!
//! Received -> Classified -> Detected -> Assembled. A failure in any stage
//! ends the request with that stage's error; results are all-or-nothing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::classification::classify;
use super::detection::detect;
use super::error::AnalysisError;
use super::normalizer::Finding;
use super::registry::ModelRegistry;
use super::types::TypeLabel;
use crate::storage::{recover_extension, ImageStore};

/// Pipeline position, reported in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Received,
    Classified,
    Detected,
    Assembled,
}

/// Final answer for one upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub image_id: String,
    pub image_url: String,
    #[serde(rename = "type")]
    pub image_type: String,
    /// Detector emission order
    pub issues: Vec<Finding>,
}

/// Classification plus detection for an image already on disk
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosis {
    pub image_type: TypeLabel,
    pub findings: Vec<Finding>,
}

/// Run both inference stages synchronously
pub fn diagnose(registry: &ModelRegistry, image: &Path) -> Result<Diagnosis, AnalysisError> {
    let image_type = classify(registry, image)?;
    debug!("Stage {:?}: {}", AnalysisStage::Classified, image_type);

    let findings = detect(registry, image, &image_type)?;
    debug!("Stage {:?}: {} findings", AnalysisStage::Detected, findings.len());

    Ok(Diagnosis {
        image_type,
        findings,
    })
}

/// The analysis service: a read-only registry plus an upload store
#[derive(Clone)]
pub struct XrayPipeline {
    registry: Arc<ModelRegistry>,
    store: Arc<dyn ImageStore>,
}

impl XrayPipeline {
    pub fn new(registry: Arc<ModelRegistry>, store: Arc<dyn ImageStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Store, classify, detect and assemble
    ///
    /// `filename` is only used to recover an extension for the stored copy.
    /// Inference runs on the blocking pool so other requests keep moving.
    pub async fn analyze(&self, bytes: &[u8], filename: &str) -> Result<AnalysisResult, AnalysisError> {
        let image_id = Uuid::new_v4().to_string();
        let extension = recover_extension(filename, bytes);

        let stored = self.store.store(&image_id, &extension, bytes).await?;
        debug!(
            "Stage {:?}: {} stored at {}",
            AnalysisStage::Received,
            image_id,
            stored.path.display()
        );

        let diagnosis = self.run_inference(stored.path.clone()).await.map_err(|e| {
            warn!("Analysis of {} failed: {}", image_id, e);
            e
        })?;

        info!(
            "Analyzed {} as {} with {} findings",
            image_id,
            diagnosis.image_type,
            diagnosis.findings.len()
        );
        debug!("Stage {:?}: {}", AnalysisStage::Assembled, image_id);

        Ok(AnalysisResult {
            image_id,
            image_url: stored.url,
            image_type: diagnosis.image_type.to_string(),
            issues: diagnosis.findings,
        })
    }

    async fn run_inference(&self, image: PathBuf) -> Result<Diagnosis, AnalysisError> {
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || diagnose(&registry, &image))
            .await
            .map_err(|e| AnalysisError::InferenceFailure(format!("Inference task failed: {}", e)))?
    }
}
