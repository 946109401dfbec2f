// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inference backend seam
//!
//! The pipeline only ever talks to models through [`VisionModel`]. The ONNX
//! Runtime implementation lives in [`onnx`]; tests inject their own.

pub mod onnx;
pub mod postprocess;
pub mod preprocessing;

use anyhow::Result;
use std::path::Path;

pub use onnx::{OnnxModelOptions, OnnxYoloModel};

/// Class-index to class-name table supplied by a model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    names: Vec<String>,
}

impl LabelTable {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for LabelTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Probability distribution produced by a classifier
#[derive(Debug, Clone, PartialEq)]
pub struct ClassProbabilities {
    /// One entry per class, indexed like `labels`
    pub probabilities: Vec<f32>,
    pub labels: LabelTable,
}

/// A single detection as reported by a detector, center-origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    pub class_index: usize,
}

/// Detections from one inference call plus the labels they index into
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionOutput {
    pub detections: Vec<RawDetection>,
    pub labels: LabelTable,
}

/// A loaded inference model
///
/// Implementations must be shareable across concurrent requests. Errors are
/// opaque to the pipeline and surface as inference failures.
pub trait VisionModel: Send + Sync {
    /// Human readable identifier, used in logs
    fn name(&self) -> &str;

    /// Run classification on the image stored at `image`
    ///
    /// `Ok(None)` means the model produced no probability distribution.
    fn classify(&self, image: &Path) -> Result<Option<ClassProbabilities>>;

    /// Run detection on the image stored at `image`
    fn detect(&self, image: &Path) -> Result<DetectionOutput>;
}
