// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Second stage: type-specific finding detection
//!
//! Each radiograph type has its own detector. When a type's detector is not
//! loaded, a fixed set of demo findings is returned instead so the service
//! stays usable without trained weights.

use std::path::Path;
use tracing::debug;

use super::error::AnalysisError;
use super::normalizer::{normalize_all, Finding};
use super::registry::ModelRegistry;
use super::types::{TypeLabel, XrayType};

/// One row of the demo fallback table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockFinding {
    pub label: &'static str,
    pub confidence: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: &'static str,
}

impl MockFinding {
    fn to_finding(self) -> Finding {
        Finding::new(
            self.label,
            self.confidence,
            (self.x, self.y),
            (self.width, self.height),
            self.color,
        )
    }
}

const OPG_MOCK: &[MockFinding] = &[
    MockFinding {
        label: "Caries",
        confidence: 0.92,
        x: 100.0,
        y: 100.0,
        width: 50.0,
        height: 50.0,
        color: "#ef4444",
    },
    MockFinding {
        label: "Impacted Tooth",
        confidence: 0.88,
        x: 300.0,
        y: 200.0,
        width: 60.0,
        height: 80.0,
        color: "#eab308",
    },
];

const PERIAPICAL_MOCK: &[MockFinding] = &[MockFinding {
    label: "Root Canal Treatment",
    confidence: 0.95,
    x: 50.0,
    y: 50.0,
    width: 100.0,
    height: 100.0,
    color: "#3b82f6",
}];

const BITEWING_MOCK: &[MockFinding] = &[MockFinding {
    label: "Interproximal Caries",
    confidence: 0.85,
    x: 150.0,
    y: 120.0,
    width: 40.0,
    height: 40.0,
    color: "#ef4444",
}];

/// Fixed demo rows for a radiograph type
pub fn mock_table(xray_type: XrayType) -> &'static [MockFinding] {
    match xray_type {
        XrayType::Opg => OPG_MOCK,
        XrayType::Periapical => PERIAPICAL_MOCK,
        XrayType::Bitewing => BITEWING_MOCK,
    }
}

/// Demo findings with fresh ids; empty for unrecognized types
pub fn mock_findings(label: &TypeLabel) -> Vec<Finding> {
    match label {
        TypeLabel::Known(xray_type) => mock_table(*xray_type)
            .iter()
            .map(|row| row.to_finding())
            .collect(),
        TypeLabel::Unrecognized(_) => Vec::new(),
    }
}

/// Detect findings on the stored image for the classified type
pub fn detect(
    registry: &ModelRegistry,
    image: &Path,
    label: &TypeLabel,
) -> Result<Vec<Finding>, AnalysisError> {
    let detector = match label {
        TypeLabel::Known(xray_type) => registry.get(xray_type.detector_role()),
        TypeLabel::Unrecognized(_) => None,
    };

    let Some(detector) = detector else {
        debug!("No detector for {}, using demo findings", label);
        return Ok(mock_findings(label));
    };

    let output = detector.detect(image).map_err(AnalysisError::inference)?;
    debug!(
        "{} reported {} detections for {}",
        detector.name(),
        output.detections.len(),
        label
    );
    Ok(normalize_all(&output))
}
