// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decoding of raw YOLO output tensors

use anyhow::{bail, Result};
use regex::Regex;
use std::sync::OnceLock;

use super::{LabelTable, RawDetection};

/// Largest class index accepted from model metadata
pub const MAX_CLASS_INDEX: usize = 4096;

/// Parse the Ultralytics `names` metadata entry
///
/// Exports store the class table as a Python dict literal, e.g.
/// `{0: 'OPG', 1: 'Periapical', 2: 'Bitewing'}`. Gaps in the index range are
/// filled with the index itself so lookups stay positional. Entries with an
/// index above [`MAX_CLASS_INDEX`] are dropped.
pub fn parse_names_metadata(raw: &str) -> LabelTable {
    static ENTRY: OnceLock<Regex> = OnceLock::new();
    let entry = ENTRY.get_or_init(|| {
        Regex::new(r#"(\d+)\s*:\s*(?:'([^']*)'|"([^"]*)")"#).expect("static regex")
    });

    let mut pairs: Vec<(usize, String)> = entry
        .captures_iter(raw)
        .filter_map(|caps| {
            let index = caps
                .get(1)?
                .as_str()
                .parse::<usize>()
                .ok()
                .filter(|index| *index <= MAX_CLASS_INDEX)?;
            let name = caps.get(2).or_else(|| caps.get(3))?.as_str().to_string();
            Some((index, name))
        })
        .collect();

    let Some(max_index) = pairs.iter().map(|(i, _)| *i).max() else {
        return LabelTable::default();
    };

    let mut names: Vec<String> = (0..=max_index).map(|i| i.to_string()).collect();
    for (index, name) in pairs.drain(..) {
        names[index] = name;
    }
    LabelTable::new(names)
}

/// Parse a sidecar label file, one class name per line
pub fn parse_names_file(contents: &str) -> LabelTable {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Turn raw classifier output into a probability distribution
///
/// Exports that already end in softmax are passed through unchanged.
/// Returns `None` when there is nothing to normalise.
pub fn to_probabilities(values: &[f32]) -> Option<Vec<f32>> {
    if values.is_empty() {
        return None;
    }

    let sum: f32 = values.iter().sum();
    let is_distribution = values.iter().all(|v| *v >= 0.0) && (sum - 1.0).abs() <= 1e-3;
    if is_distribution {
        return Some(values.to_vec());
    }

    Some(softmax(values))
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_values: Vec<f32> = logits.iter().map(|&x| (x - max_logit).exp()).collect();
    let sum: f32 = exp_values.iter().sum();
    exp_values.iter().map(|&x| x / sum).collect()
}

/// Decode a YOLOv8 detection head output
///
/// Accepts `[1, 4 + nc, N]` (the standard export) or the transposed
/// `[1, N, 4 + nc]`. Boxes stay center-origin in model input space.
pub fn decode_detections(
    data: &[f32],
    shape: &[usize],
    confidence_threshold: f32,
) -> Result<Vec<RawDetection>> {
    let (channels, anchors, channels_first) = match shape {
        [1, a, b] if a <= b => (*a, *b, true),
        [1, a, b] => (*b, *a, false),
        _ => bail!("Unexpected detection output shape: {:?}", shape),
    };

    if channels < 5 {
        bail!("Detection output has no class scores: {:?}", shape);
    }
    if data.len() != channels * anchors {
        bail!(
            "Detection output length {} does not match shape {:?}",
            data.len(),
            shape
        );
    }

    let at = |anchor: usize, channel: usize| -> f32 {
        if channels_first {
            data[channel * anchors + anchor]
        } else {
            data[anchor * channels + channel]
        }
    };

    let mut detections = Vec::new();
    for anchor in 0..anchors {
        let mut best_class = 0;
        let mut best_score = f32::NEG_INFINITY;
        for class in 0..channels - 4 {
            let score = at(anchor, 4 + class);
            if score > best_score {
                best_score = score;
                best_class = class;
            }
        }

        if best_score > confidence_threshold {
            detections.push(RawDetection {
                center_x: at(anchor, 0),
                center_y: at(anchor, 1),
                width: at(anchor, 2),
                height: at(anchor, 3),
                confidence: best_score,
                class_index: best_class,
            });
        }
    }

    Ok(detections)
}

/// Greedy per-class non-maximum suppression
///
/// Survivors come back in descending confidence order.
pub fn non_max_suppression(mut detections: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<RawDetection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let suppressed = keep.iter().any(|kept| {
            kept.class_index == candidate.class_index && iou(kept, &candidate) > iou_threshold
        });
        if !suppressed {
            keep.push(candidate);
        }
    }
    keep
}

fn iou(a: &RawDetection, b: &RawDetection) -> f32 {
    let (ax1, ay1) = (a.center_x - a.width / 2.0, a.center_y - a.height / 2.0);
    let (bx1, by1) = (b.center_x - b.width / 2.0, b.center_y - b.height / 2.0);
    let x1 = ax1.max(bx1);
    let y1 = ay1.max(by1);
    let x2 = (ax1 + a.width).min(bx1 + b.width);
    let y2 = (ay1 + a.height).min(by1 + b.height);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.width * a.height + b.width * b.height - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}
