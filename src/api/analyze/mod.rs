// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze API endpoint module
//!
//! Provides POST /analyze for dental X-ray diagnosis.

pub mod handler;

pub use handler::{analyze_handler, FILE_FIELD};
