// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Detection stage: real detectors and the demo fallback

use crate::common::{handle, raw, FailingModel, FakeDetector};
use orthoai_xray_node::vision::{
    detect, mock_findings, AnalysisError, ModelRegistry, ModelRole, TypeLabel, XrayType,
};
use std::collections::HashSet;
use std::path::Path;

#[test]
fn test_fallback_tables_match_demo_data() {
    let registry = ModelRegistry::empty();

    let opg = detect(&registry, Path::new("a.png"), &TypeLabel::Known(XrayType::Opg)).unwrap();
    assert_eq!(opg.len(), 2);
    assert_eq!(opg[0].label, "Caries");
    assert_eq!(opg[0].confidence, 0.92);
    assert_eq!((opg[0].x, opg[0].y, opg[0].width, opg[0].height), (100.0, 100.0, 50.0, 50.0));
    assert_eq!(opg[0].color, "#ef4444");
    assert_eq!(opg[1].label, "Impacted Tooth");
    assert_eq!(opg[1].confidence, 0.88);
    assert_eq!((opg[1].x, opg[1].y, opg[1].width, opg[1].height), (300.0, 200.0, 60.0, 80.0));
    assert_eq!(opg[1].color, "#eab308");

    let periapical = detect(
        &registry,
        Path::new("a.png"),
        &TypeLabel::Known(XrayType::Periapical),
    )
    .unwrap();
    assert_eq!(periapical.len(), 1);
    assert_eq!(periapical[0].label, "Root Canal Treatment");
    assert_eq!(periapical[0].color, "#3b82f6");

    let bitewing = detect(
        &registry,
        Path::new("a.png"),
        &TypeLabel::Known(XrayType::Bitewing),
    )
    .unwrap();
    assert_eq!(bitewing.len(), 1);
    assert_eq!(bitewing[0].label, "Interproximal Caries");
    assert_eq!(bitewing[0].confidence, 0.85);
    assert_eq!(
        (bitewing[0].x, bitewing[0].y, bitewing[0].width, bitewing[0].height),
        (150.0, 120.0, 40.0, 40.0)
    );
}

#[test]
fn test_fallback_ids_are_fresh_per_call() {
    let label = TypeLabel::Known(XrayType::Opg);
    let first = mock_findings(&label);
    let second = mock_findings(&label);

    let ids: HashSet<_> = first.iter().chain(second.iter()).map(|f| f.id.clone()).collect();
    assert_eq!(ids.len(), 4);
}

#[test]
fn test_unrecognized_type_has_no_findings() {
    let registry = ModelRegistry::empty();
    let findings = detect(
        &registry,
        Path::new("a.png"),
        &TypeLabel::Unrecognized("dog".to_string()),
    )
    .unwrap();
    assert!(findings.is_empty());
}

#[test]
fn test_loaded_detector_is_used_and_normalized() {
    let detector = FakeDetector::new(
        &["Caries", "Restoration"],
        vec![
            raw((120.0, 80.0), (40.0, 20.0), 0.81, 1),
            raw((30.0, 30.0), (10.0, 10.0), 0.40, 0),
        ],
    );
    let registry = ModelRegistry::empty().with_model(ModelRole::Periapical, handle(detector));

    let findings = detect(
        &registry,
        Path::new("a.png"),
        &TypeLabel::Known(XrayType::Periapical),
    )
    .unwrap();

    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].label, "Restoration");
    assert_eq!(findings[0].color, "#3b82f6");
    assert_eq!((findings[0].x, findings[0].y), (100.0, 70.0));
    assert_eq!((findings[0].width, findings[0].height), (40.0, 20.0));
    assert_eq!(findings[1].label, "Caries");
    assert_eq!((findings[1].x, findings[1].y), (25.0, 25.0));
    assert_ne!(findings[0].id, findings[1].id);
}

#[test]
fn test_detector_for_other_type_is_ignored() {
    let detector = FakeDetector::new(&["Caries"], vec![raw((10.0, 10.0), (4.0, 4.0), 0.9, 0)]);
    let registry = ModelRegistry::empty().with_model(ModelRole::Opg, handle(detector));

    let findings = detect(
        &registry,
        Path::new("a.png"),
        &TypeLabel::Known(XrayType::Bitewing),
    )
    .unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].label, "Interproximal Caries");
}

#[test]
fn test_detector_with_no_detections_is_empty_not_mock() {
    let detector = FakeDetector::new(&["Caries"], vec![]);
    let registry = ModelRegistry::empty().with_model(ModelRole::Opg, handle(detector));

    let findings = detect(&registry, Path::new("a.png"), &TypeLabel::Known(XrayType::Opg)).unwrap();
    assert!(findings.is_empty());
}

#[test]
fn test_unknown_class_index_and_label_colors() {
    let detector = FakeDetector::new(
        &["Impacted", "Mystery"],
        vec![
            raw((50.0, 50.0), (10.0, 10.0), 0.7, 0),
            raw((50.0, 50.0), (10.0, 10.0), 0.6, 1),
            raw((50.0, 50.0), (10.0, 10.0), 0.5, 7),
        ],
    );
    let registry = ModelRegistry::empty().with_model(ModelRole::Bitewing, handle(detector));

    let findings = detect(
        &registry,
        Path::new("a.png"),
        &TypeLabel::Known(XrayType::Bitewing),
    )
    .unwrap();
    assert_eq!(findings[0].color, "#a855f7");
    assert_eq!(findings[1].color, "#ef4444");
    assert_eq!(findings[2].label, "7");
}

#[test]
fn test_detector_failure_propagates() {
    let registry = ModelRegistry::empty().with_model(ModelRole::Opg, handle(FailingModel));
    let err = detect(&registry, Path::new("a.png"), &TypeLabel::Known(XrayType::Opg)).unwrap_err();
    assert!(matches!(err, AnalysisError::InferenceFailure(_)));
}
