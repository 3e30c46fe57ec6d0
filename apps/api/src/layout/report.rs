//! Output records shared by the column engine, the overflow detector and the prioritizer.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Suggestions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionType {
    ReduceContent,
    IncreasePages,
    SmallerText,
    MoreColumns,
}

/// How much a suggestion changes the document. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverflowSuggestion {
    #[serde(rename = "type")]
    pub suggestion_type: SuggestionType,
    pub description: String,
    pub impact: Impact,
    /// Vertical space (px) the suggestion is expected to recover.
    pub estimated_reduction: f64,
}

impl OverflowSuggestion {
    pub fn new(
        suggestion_type: SuggestionType,
        description: impl Into<String>,
        impact: Impact,
        estimated_reduction: f64,
    ) -> Self {
        Self {
            suggestion_type,
            description: description.into(),
            impact,
            estimated_reduction: estimated_reduction.max(0.0),
        }
    }
}

/// Merges two suggestion lists keeping one entry per type.
///
/// `primary` order is preserved; a `secondary` entry replaces a primary one of the same
/// type only if it promises a strictly larger reduction. Types only present in
/// `secondary` are appended in their original order.
pub fn merge_suggestions(
    primary: Vec<OverflowSuggestion>,
    secondary: Vec<OverflowSuggestion>,
) -> Vec<OverflowSuggestion> {
    let mut merged: Vec<OverflowSuggestion> = Vec::with_capacity(primary.len() + secondary.len());

    for suggestion in primary.into_iter().chain(secondary) {
        match merged
            .iter_mut()
            .find(|s| s.suggestion_type == suggestion.suggestion_type)
        {
            Some(existing) => {
                if suggestion.estimated_reduction > existing.estimated_reduction {
                    *existing = suggestion;
                }
            }
            None => merged.push(suggestion),
        }
    }
    merged
}

// ────────────────────────────────────────────────────────────────────────────
// Overflow analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverflowAnalysis {
    pub has_overflow: bool,
    /// Excess height in px; 0 when everything fits.
    pub overflow_amount: f64,
    pub affected_blocks: Vec<String>,
    pub suggestions: Vec<OverflowSuggestion>,
}

impl OverflowAnalysis {
    pub fn empty() -> Self {
        Self {
            has_overflow: false,
            overflow_amount: 0.0,
            affected_blocks: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Warnings
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningType {
    Overflow,
    Readability,
    Spacing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Advisory, non-fatal signal about the layout or its configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutWarning {
    #[serde(rename = "type")]
    pub warning_type: WarningType,
    pub severity: Severity,
    pub message: String,
    pub affected_elements: Vec<String>,
}
