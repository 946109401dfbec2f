// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Radiograph taxonomy and model roles

use std::fmt;

/// The radiograph types the classifier is trained to recognise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum XrayType {
    /// Panoramic (orthopantomogram)
    Opg,
    Periapical,
    Bitewing,
}

impl XrayType {
    /// Every allowed type, in registry order
    pub const ALL: [XrayType; 3] = [XrayType::Opg, XrayType::Periapical, XrayType::Bitewing];

    /// Label as emitted by the classifier and returned to clients
    pub fn as_str(&self) -> &'static str {
        match self {
            XrayType::Opg => "OPG",
            XrayType::Periapical => "Periapical",
            XrayType::Bitewing => "Bitewing",
        }
    }

    /// Exact, case-sensitive match against the allowed label set
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == label)
    }

    /// Registry role holding this type's detector
    pub fn detector_role(&self) -> ModelRole {
        match self {
            XrayType::Opg => ModelRole::Opg,
            XrayType::Periapical => ModelRole::Periapical,
            XrayType::Bitewing => ModelRole::Bitewing,
        }
    }
}

impl fmt::Display for XrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the classification stage
///
/// A classifier whose label table has no overlap with [`XrayType::ALL`] is
/// trusted as-is, so its labels travel through the pipeline as
/// `Unrecognized` and detection yields no findings for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeLabel {
    Known(XrayType),
    Unrecognized(String),
}

impl TypeLabel {
    pub fn from_label(label: &str) -> Self {
        match XrayType::from_label(label) {
            Some(known) => TypeLabel::Known(known),
            None => TypeLabel::Unrecognized(label.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TypeLabel::Known(known) => known.as_str(),
            TypeLabel::Unrecognized(label) => label,
        }
    }
}

impl fmt::Display for TypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A slot in the model registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelRole {
    Classifier,
    Opg,
    Periapical,
    Bitewing,
}

impl ModelRole {
    pub const ALL: [ModelRole; 4] = [
        ModelRole::Classifier,
        ModelRole::Opg,
        ModelRole::Periapical,
        ModelRole::Bitewing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Classifier => "classifier",
            ModelRole::Opg => "OPG",
            ModelRole::Periapical => "Periapical",
            ModelRole::Bitewing => "Bitewing",
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
