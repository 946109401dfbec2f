// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Dental radiograph analysis
//!
//! This module provides:
//! - Type classification (OPG, Periapical, Bitewing)
//! - Type-specific finding detection, with demo fallback
//! - Normalization of detector output into display-ready boxes
//!
//! Models run on CPU through ONNX Runtime and are loaded once at startup.

pub mod backend;
pub mod classification;
pub mod detection;
pub mod error;
pub mod image_utils;
pub mod normalizer;
pub mod pipeline;
pub mod registry;
pub mod types;

pub use backend::{
    ClassProbabilities, DetectionOutput, LabelTable, OnnxModelOptions, OnnxYoloModel,
    RawDetection, VisionModel,
};
pub use classification::classify;
pub use detection::{detect, mock_findings};
pub use error::AnalysisError;
pub use normalizer::{label_color, normalize, Finding, DEFAULT_COLOR};
pub use pipeline::{diagnose, AnalysisResult, AnalysisStage, Diagnosis, XrayPipeline};
pub use registry::{ModelHandle, ModelPaths, ModelRegistry, ModelStatus};
pub use types::{ModelRole, TypeLabel, XrayType};
