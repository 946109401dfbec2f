// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Classification stage through the registry

use crate::common::{handle, FailingModel, FakeClassifier};
use orthoai_xray_node::vision::{
    classify, AnalysisError, ModelRegistry, ModelRole, TypeLabel, XrayType,
};
use std::path::Path;

fn registry_with(classifier: FakeClassifier) -> ModelRegistry {
    ModelRegistry::empty().with_model(ModelRole::Classifier, handle(classifier))
}

#[test]
fn test_each_allowed_type_is_returned() {
    for xray_type in XrayType::ALL {
        let registry = registry_with(FakeClassifier::predicting(xray_type.as_str()));
        let label = classify(&registry, Path::new("scan.png")).unwrap();
        assert_eq!(label, TypeLabel::Known(xray_type));
    }
}

#[test]
fn test_missing_classifier_is_model_unavailable() {
    let registry = ModelRegistry::empty();
    let err = classify(&registry, Path::new("scan.png")).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::ModelUnavailable {
            role: ModelRole::Classifier
        }
    ));
}

#[test]
fn test_detectors_alone_do_not_classify() {
    let registry = ModelRegistry::empty()
        .with_model(ModelRole::Opg, handle(FakeClassifier::predicting("OPG")));
    let err = classify(&registry, Path::new("scan.png")).unwrap_err();
    assert_eq!(err.kind(), "model_unavailable");
}

#[test]
fn test_label_outside_allowed_set_is_rejected() {
    let registry = registry_with(FakeClassifier::new(
        &["OPG", "Periapical", "Bitewing", "Cephalometric"],
        &[0.1, 0.1, 0.1, 0.7],
    ));
    match classify(&registry, Path::new("scan.png")) {
        Err(AnalysisError::InvalidClassification { predicted }) => {
            assert_eq!(predicted, "Cephalometric")
        }
        other => panic!("expected InvalidClassification, got {:?}", other),
    }
}

#[test]
fn test_disjoint_taxonomy_passes_through() {
    // A generic ImageNet-style classifier knows none of the allowed labels
    let registry = registry_with(FakeClassifier::new(&["cat", "dog"], &[0.2, 0.8]));
    let label = classify(&registry, Path::new("scan.png")).unwrap();
    assert_eq!(label, TypeLabel::Unrecognized("dog".to_string()));
}

#[test]
fn test_no_distribution_is_empty_prediction() {
    let registry = registry_with(FakeClassifier::silent());
    let err = classify(&registry, Path::new("scan.png")).unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyPrediction));
}

#[test]
fn test_zero_length_distribution_is_empty_prediction() {
    let registry = registry_with(FakeClassifier::new(&["OPG"], &[]));
    let err = classify(&registry, Path::new("scan.png")).unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyPrediction));
}

#[test]
fn test_backend_error_is_inference_failure() {
    let registry = ModelRegistry::empty().with_model(ModelRole::Classifier, handle(FailingModel));
    let err = classify(&registry, Path::new("scan.png")).unwrap_err();
    match err {
        AnalysisError::InferenceFailure(message) => {
            assert!(message.contains("onnx runtime exploded"))
        }
        other => panic!("expected InferenceFailure, got {:?}", other),
    }
}

#[test]
fn test_ties_pick_first_class() {
    let registry = registry_with(FakeClassifier::new(
        &["Periapical", "OPG", "Bitewing"],
        &[0.4, 0.4, 0.2],
    ));
    let label = classify(&registry, Path::new("scan.png")).unwrap();
    assert_eq!(label, TypeLabel::Known(XrayType::Periapical));
}
