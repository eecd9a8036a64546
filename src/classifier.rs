//! Document type detection from OCR text.
//!
//! Classification is a fixed, ordered list of keyword groups tested against the
//! lower-cased text. The first group with any substring match wins, so text that
//! could satisfy several groups resolves by list order rather than specificity.
//! Matching is plain containment: short keywords such as "nin" also match inside
//! longer words.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of identity document recognised from extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    NinSlip,
    InternationalPassport,
    DriversLicense,
    VotersCard,
    #[default]
    Unknown,
}

impl DocumentType {
    /// Label sent to the verification service as `id_type`.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::NinSlip => "NIN Slip",
            DocumentType::InternationalPassport => "International Passport",
            DocumentType::DriversLicense => "Driver's License",
            DocumentType::VotersCard => "Voter's Card",
            DocumentType::Unknown => "Unknown ID",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DocumentType::Unknown)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Keyword groups in priority order.
const KEYWORD_GROUPS: &[(DocumentType, &[&str])] = &[
    (
        DocumentType::NinSlip,
        &["national identification number", "nin"],
    ),
    (
        DocumentType::InternationalPassport,
        &["passport", "federal republic of nigeria"],
    ),
    (DocumentType::DriversLicense, &["driver", "frsc"]),
    (DocumentType::VotersCard, &["voter"]),
];

/// Classify a document from its recognised text.
pub fn classify(text: &str) -> DocumentType {
    let lower = text.to_lowercase();

    KEYWORD_GROUPS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(doc_type, _)| *doc_type)
        .unwrap_or(DocumentType::Unknown)
}
