// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Conversion of raw detections into client-facing findings

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::backend::{DetectionOutput, LabelTable, RawDetection};

/// Color for labels missing from [`LABEL_COLORS`]
pub const DEFAULT_COLOR: &str = "#ef4444";

/// Display color per finding label
pub const LABEL_COLORS: &[(&str, &str)] = &[
    ("Caries", "#ef4444"),
    ("Restoration", "#3b82f6"),
    ("Root Canal", "#eab308"),
    ("Impacted", "#a855f7"),
];

/// Look up the display color for a label (exact match)
pub fn label_color(label: &str) -> &'static str {
    LABEL_COLORS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_COLOR)
}

/// A labeled bounding box in source image pixels, top-left origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub label: String,
    pub confidence: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: String,
}

impl Finding {
    /// Build a finding with a freshly generated id
    pub fn new(
        label: impl Into<String>,
        confidence: f32,
        (x, y): (f32, f32),
        (width, height): (f32, f32),
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.into(),
            confidence,
            x,
            y,
            width,
            height,
            color: color.into(),
        }
    }

    /// Center of the box
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Normalize one detection against the label table of the call that produced it
///
/// A class index outside the table is labeled with the index itself.
pub fn normalize(raw: &RawDetection, labels: &LabelTable) -> Finding {
    let label = labels
        .get(raw.class_index)
        .map(str::to_string)
        .unwrap_or_else(|| raw.class_index.to_string());
    let color = label_color(&label);

    Finding::new(
        label,
        raw.confidence,
        (
            raw.center_x - raw.width / 2.0,
            raw.center_y - raw.height / 2.0,
        ),
        (raw.width, raw.height),
        color,
    )
}

/// Normalize every detection, keeping emission order
pub fn normalize_all(output: &DetectionOutput) -> Vec<Finding> {
    output
        .detections
        .iter()
        .map(|raw| normalize(raw, &output.labels))
        .collect()
}
