// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! First stage: decide which kind of radiograph was uploaded

use std::path::Path;
use tracing::debug;

use super::backend::ClassProbabilities;
use super::error::AnalysisError;
use super::registry::ModelRegistry;
use super::types::{ModelRole, TypeLabel, XrayType};

/// Classify the stored image with the registry's classifier
pub fn classify(registry: &ModelRegistry, image: &Path) -> Result<TypeLabel, AnalysisError> {
    let classifier = registry
        .get(ModelRole::Classifier)
        .ok_or(AnalysisError::ModelUnavailable {
            role: ModelRole::Classifier,
        })?;

    let prediction = classifier
        .classify(image)
        .map_err(AnalysisError::inference)?
        .ok_or(AnalysisError::EmptyPrediction)?;

    let label = select_label(&prediction)?;
    debug!("Classified as: {} (model {})", label, classifier.name());
    Ok(label)
}

/// Pick the top class and check it against the allowed taxonomy
///
/// The allowed-set check only applies when the classifier knows at least one
/// allowed label. A classifier with a disjoint taxonomy is trusted as-is.
pub fn select_label(prediction: &ClassProbabilities) -> Result<TypeLabel, AnalysisError> {
    let top = argmax(&prediction.probabilities).ok_or(AnalysisError::EmptyPrediction)?;
    let name = prediction.labels.get(top).ok_or_else(|| {
        AnalysisError::InferenceFailure(format!(
            "Top class index {} missing from classifier labels ({} known)",
            top,
            prediction.labels.len()
        ))
    })?;

    let label = TypeLabel::from_label(name);
    let knows_allowed = prediction
        .labels
        .iter()
        .any(|known| XrayType::from_label(known).is_some());

    match label {
        TypeLabel::Unrecognized(predicted) if knows_allowed => {
            Err(AnalysisError::InvalidClassification { predicted })
        }
        label => Ok(label),
    }
}

/// Index of the highest probability; on exact ties the lowest index wins.
/// NaN entries are never selected.
fn argmax(probabilities: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &p) in probabilities.iter().enumerate() {
        if p.is_nan() {
            continue;
        }
        match best {
            Some((_, best_p)) if p <= best_p => {}
            _ => best = Some((index, p)),
        }
    }
    best.map(|(index, _)| index)
}
