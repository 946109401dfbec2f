// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model registry: one optional model per role
//!
//! Built once during startup and then shared read-only behind an `Arc`.
//! A role without a model is a normal state: the classifier being absent
//! fails requests, a detector being absent switches to mock findings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::backend::{OnnxModelOptions, OnnxYoloModel, VisionModel};
use super::types::ModelRole;

/// Shared handle to a loaded model
pub type ModelHandle = Arc<dyn VisionModel>;

/// Where the startup probe looks for weights
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    /// Directory holding generic and per-type weights
    pub weights_dir: PathBuf,
    /// Output directory of a trained classifier run
    pub classifier_run_dir: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            weights_dir: PathBuf::from("./weights"),
            classifier_run_dir: PathBuf::from("./models/xray_type_classifier/weights"),
        }
    }
}

impl ModelPaths {
    /// Candidate files for a role, most preferred first
    pub fn candidates(&self, role: ModelRole) -> Vec<PathBuf> {
        match role {
            ModelRole::Classifier => vec![
                self.classifier_run_dir.join("best.onnx"),
                self.weights_dir.join("yolov8n-cls.onnx"),
            ],
            ModelRole::Opg => vec![self.weights_dir.join("opg.onnx")],
            ModelRole::Periapical => vec![self.weights_dir.join("periapical.onnx")],
            ModelRole::Bitewing => vec![self.weights_dir.join("bitewing.onnx")],
        }
    }
}

/// Per-role load state, as reported by the status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub classifier: bool,
    #[serde(rename = "OPG")]
    pub opg: bool,
    #[serde(rename = "Periapical")]
    pub periapical: bool,
    #[serde(rename = "Bitewing")]
    pub bitewing: bool,
}

/// Loaded models keyed by role
#[derive(Clone, Default)]
pub struct ModelRegistry {
    classifier: Option<ModelHandle>,
    opg: Option<ModelHandle>,
    periapical: Option<ModelHandle>,
    bitewing: Option<ModelHandle>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = |slot: &Option<ModelHandle>| slot.as_ref().map(|m| m.name().to_string());
        f.debug_struct("ModelRegistry")
            .field("classifier", &name(&self.classifier))
            .field("opg", &name(&self.opg))
            .field("periapical", &name(&self.periapical))
            .field("bitewing", &name(&self.bitewing))
            .finish()
    }
}

impl ModelRegistry {
    /// A registry with every role unset
    pub fn empty() -> Self {
        Self::default()
    }

    /// Probe every role's candidates and load ONNX exports
    pub fn load_onnx(paths: &ModelPaths, options: OnnxModelOptions) -> Self {
        let mut registry = Self::empty();
        for role in ModelRole::ALL {
            registry.load(role, &paths.candidates(role), |path| {
                let model = OnnxYoloModel::load(path, options)?;
                Ok(Arc::new(model) as ModelHandle)
            });
        }
        registry
    }

    /// Load the first existing candidate into `role`
    ///
    /// Returns the path that was loaded. When no candidate exists the role is
    /// left unset. A file that exists but fails to load is logged and also
    /// leaves the role unset; later candidates are not tried.
    pub fn load<F>(&mut self, role: ModelRole, candidates: &[PathBuf], loader: F) -> Option<PathBuf>
    where
        F: FnOnce(&Path) -> anyhow::Result<ModelHandle>,
    {
        let Some(path) = candidates.iter().find(|p| p.exists()) else {
            debug!(
                "No weights for {} (tried {})",
                role,
                candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            return None;
        };

        match loader(path) {
            Ok(model) => {
                info!("✅ Loaded {} model from {}", role, path.display());
                *self.slot_mut(role) = Some(model);
                Some(path.clone())
            }
            Err(e) => {
                warn!("⚠️ Failed to load {} model from {}: {:#}", role, path.display(), e);
                None
            }
        }
    }

    /// Install a model directly
    pub fn insert(&mut self, role: ModelRole, model: ModelHandle) {
        *self.slot_mut(role) = Some(model);
    }

    /// Builder form of [`ModelRegistry::insert`]
    pub fn with_model(mut self, role: ModelRole, model: ModelHandle) -> Self {
        self.insert(role, model);
        self
    }

    pub fn get(&self, role: ModelRole) -> Option<ModelHandle> {
        self.slot(role).clone()
    }

    pub fn is_loaded(&self, role: ModelRole) -> bool {
        self.slot(role).is_some()
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            classifier: self.is_loaded(ModelRole::Classifier),
            opg: self.is_loaded(ModelRole::Opg),
            periapical: self.is_loaded(ModelRole::Periapical),
            bitewing: self.is_loaded(ModelRole::Bitewing),
        }
    }

    fn slot(&self, role: ModelRole) -> &Option<ModelHandle> {
        match role {
            ModelRole::Classifier => &self.classifier,
            ModelRole::Opg => &self.opg,
            ModelRole::Periapical => &self.periapical,
            ModelRole::Bitewing => &self.bitewing,
        }
    }

    fn slot_mut(&mut self, role: ModelRole) -> &mut Option<ModelHandle> {
        match role {
            ModelRole::Classifier => &mut self.classifier,
            ModelRole::Opg => &mut self.opg,
            ModelRole::Periapical => &mut self.periapical,
            ModelRole::Bitewing => &mut self.bitewing,
        }
    }
}
