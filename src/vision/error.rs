// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Failures of the analysis pipeline

use thiserror::Error;

use super::types::ModelRole;
use crate::storage::StorageError;

/// Any of these ends the request; nothing is retried and no partial result
/// is returned.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{role} model not loaded. Ensure its weights exist.")]
    ModelUnavailable { role: ModelRole },

    #[error("Classifier predicted '{predicted}' outside allowed set [OPG, Periapical, Bitewing]. Check your trained weights.")]
    InvalidClassification { predicted: String },

    #[error("Classifier returned no probabilities.")]
    EmptyPrediction,

    #[error("Inference failed: {0}")]
    InferenceFailure(String),

    #[error("Failed to store uploaded image: {0}")]
    StorageFailure(#[from] StorageError),
}

impl AnalysisError {
    /// Wrap an opaque backend error, keeping its context chain
    pub fn inference(err: anyhow::Error) -> Self {
        AnalysisError::InferenceFailure(format!("{:#}", err))
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::ModelUnavailable { .. } => "model_unavailable",
            AnalysisError::InvalidClassification { .. } => "invalid_classification",
            AnalysisError::EmptyPrediction => "empty_prediction",
            AnalysisError::InferenceFailure(_) => "inference_failure",
            AnalysisError::StorageFailure(_) => "storage_failure",
        }
    }
}
