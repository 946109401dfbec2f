// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 models exported to ONNX
//!
//! One wrapper serves both the type classifier and the per-type detectors;
//! which entry point is used depends on the registry role.

use anyhow::{anyhow, Context, Result};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::postprocess::{
    decode_detections, non_max_suppression, parse_names_file, parse_names_metadata,
    to_probabilities,
};
use super::preprocessing::{
    preprocess_for_classification, preprocess_for_detection, CLASSIFY_INPUT_SIZE,
    DETECT_INPUT_SIZE,
};
use super::{ClassProbabilities, DetectionOutput, LabelTable, VisionModel};
use crate::vision::image_utils::load_image;

/// Runtime knobs shared by every loaded model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnnxModelOptions {
    /// Minimum class score for a detection to be kept
    pub confidence_threshold: f32,
    /// IoU above which overlapping boxes of one class are suppressed
    pub iou_threshold: f32,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for OnnxModelOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            intra_threads: 4,
        }
    }
}

/// An Ultralytics YOLO export running on ONNX Runtime (CPU)
#[derive(Clone)]
pub struct OnnxYoloModel {
    name: String,
    session: Arc<Mutex<Session>>,
    input_name: String,
    labels: LabelTable,
    /// Square input size from export metadata, if recorded
    input_size: Option<u32>,
    options: OnnxModelOptions,
}

impl std::fmt::Debug for OnnxYoloModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxYoloModel")
            .field("name", &self.name)
            .field("input_name", &self.input_name)
            .field("labels", &self.labels.len())
            .field("input_size", &self.input_size)
            .finish_non_exhaustive()
    }
}

impl OnnxYoloModel {
    /// Load a model file
    ///
    /// Class names come from the `names` metadata entry written by the
    /// Ultralytics exporter, or from a sidecar `<model>.names.txt`.
    pub fn load(model_path: &Path, options: OnnxModelOptions) -> Result<Self> {
        if !model_path.exists() {
            anyhow::bail!("Model file not found: {}", model_path.display());
        }

        debug!("Loading ONNX model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(options.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        let (names_meta, imgsz_meta) = match session.metadata() {
            Ok(metadata) => (
                metadata.custom("names").ok().flatten(),
                metadata.custom("imgsz").ok().flatten(),
            ),
            Err(e) => {
                debug!("No metadata on {}: {}", model_path.display(), e);
                (None, None)
            }
        };

        let labels = match names_meta.map(|raw| parse_names_metadata(&raw)) {
            Some(labels) if !labels.is_empty() => labels,
            _ => load_sidecar_labels(model_path)?,
        };
        let input_size = imgsz_meta.as_deref().and_then(parse_imgsz);

        let name = model_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| model_path.display().to_string());

        info!(
            "ONNX model {} ready: {} classes, input {}",
            name,
            labels.len(),
            input_name
        );

        Ok(Self {
            name,
            session: Arc::new(Mutex::new(session)),
            input_name,
            labels,
            input_size,
            options,
        })
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Run the session on one tensor and return the first output, flattened
    fn run(&self, input: ndarray::Array4<f32>) -> Result<(Vec<usize>, Vec<f32>)> {
        let input_value = Value::from_array(input).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("ONNX session lock poisoned for {}", self.name))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .with_context(|| format!("Inference failed for {}", self.name))?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let shape = output.shape().to_vec();
        let values: Vec<f32> = output.iter().copied().collect();
        Ok((shape, values))
    }
}

impl VisionModel for OnnxYoloModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, image: &Path) -> Result<Option<ClassProbabilities>> {
        let img = load_image(image)?;
        let size = self.input_size.unwrap_or(CLASSIFY_INPUT_SIZE);
        let (shape, values) = self.run(preprocess_for_classification(&img, size))?;
        debug!("{} classification output shape: {:?}", self.name, shape);

        Ok(to_probabilities(&values).map(|probabilities| ClassProbabilities {
            probabilities,
            labels: self.labels.clone(),
        }))
    }

    fn detect(&self, image: &Path) -> Result<DetectionOutput> {
        let img = load_image(image)?;
        let size = self.input_size.unwrap_or(DETECT_INPUT_SIZE);
        let (tensor, letterbox) = preprocess_for_detection(&img, size);
        let (shape, values) = self.run(tensor)?;
        debug!("{} detection output shape: {:?}", self.name, shape);

        let candidates = decode_detections(&values, &shape, self.options.confidence_threshold)?;
        let detections = non_max_suppression(candidates, self.options.iou_threshold)
            .into_iter()
            .map(|mut det| {
                let (cx, cy, w, h) = letterbox.unmap(det.center_x, det.center_y, det.width, det.height);
                det.center_x = cx;
                det.center_y = cy;
                det.width = w;
                det.height = h;
                det
            })
            .collect();

        Ok(DetectionOutput {
            detections,
            labels: self.labels.clone(),
        })
    }
}

fn sidecar_labels_path(model_path: &Path) -> PathBuf {
    model_path.with_extension("names.txt")
}

fn load_sidecar_labels(model_path: &Path) -> Result<LabelTable> {
    let path = sidecar_labels_path(model_path);
    if !path.exists() {
        debug!("No class names for {}", model_path.display());
        return Ok(LabelTable::default());
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read labels from {}", path.display()))?;
    Ok(parse_names_file(&contents))
}

/// First integer of the `imgsz` metadata entry, e.g. `[640, 640]`
fn parse_imgsz(raw: &str) -> Option<u32> {
    raw.split(|c: char| !c.is_ascii_digit())
        .find(|part| !part.is_empty())
        .and_then(|part| part.parse().ok())
        .filter(|size| *size > 0)
}
