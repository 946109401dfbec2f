// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the OrthoAI X-ray node

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Full version string with feature description
pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"), "-xray-two-stage");

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "type-classification",
    "type-specific-detection",
    "demo-fallback",
    "onnx-runtime-cpu",
];
