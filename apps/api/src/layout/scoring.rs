//! Educational value scoring — pluggable, trait-based topic classifier.
//!
//! Default: `KeywordValueScorer` (keyword hits plus structural signals). The prioritizer
//! holds an `Arc<dyn EducationalValueScorer>`, so another scorer can be plugged in with
//! `ContentPrioritizer::with_scorer`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::Topic;

/// Pedagogical importance of a topic. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EducationalValue {
    Low,
    Medium,
    High,
}

impl EducationalValue {
    /// Priority adjustment applied by the prioritizer.
    pub fn priority_adjustment(&self) -> f64 {
        match self {
            EducationalValue::High => 2.0,
            EducationalValue::Medium => 1.0,
            EducationalValue::Low => -1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueAssessment {
    pub value: EducationalValue,
    /// Raw signal strength behind the classification; higher is more valuable.
    pub score: f64,
}

/// Implement this to replace the keyword heuristic.
pub trait EducationalValueScorer: Send + Sync {
    fn assess(&self, topic: &Topic) -> ValueAssessment;

    /// Short backend name, surfaced in logs.
    fn name(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordValueScorer
// ────────────────────────────────────────────────────────────────────────────

const HIGH_VALUE_KEYWORDS: &[&str] = &[
    "definition",
    "theorem",
    "formula",
    "equation",
    "law",
    "principle",
    "proof",
    "fundamental",
    "key",
    "important",
    "essential",
    "concept",
];

const MEDIUM_VALUE_KEYWORDS: &[&str] = &[
    "method",
    "process",
    "procedure",
    "technique",
    "step",
    "rule",
    "property",
    "application",
    "summary",
    "note",
    "approach",
    "strategy",
];

/// Keyword and structure heuristic.
///
/// - high: has worked examples AND (≥ 2 distinct high-value keywords OR has subtopics)
/// - medium: ≥ 1 high-value keyword OR ≥ 2 medium-value keywords OR has subtopics
/// - low: otherwise
///
/// Keywords match whole words case-insensitively (a trailing plural `s` is ignored)
/// across the title, body and subtopics.
pub struct KeywordValueScorer;

impl EducationalValueScorer for KeywordValueScorer {
    fn assess(&self, topic: &Topic) -> ValueAssessment {
        let words = topic_words(topic);
        let high_hits = count_hits(&words, HIGH_VALUE_KEYWORDS);
        let medium_hits = count_hits(&words, MEDIUM_VALUE_KEYWORDS);
        let has_examples = !topic.examples.is_empty();
        let has_subtopics = !topic.subtopics.is_empty();

        let value = if has_examples && (high_hits >= 2 || has_subtopics) {
            EducationalValue::High
        } else if high_hits >= 1 || medium_hits >= 2 || has_subtopics {
            EducationalValue::Medium
        } else {
            EducationalValue::Low
        };

        let score = 2.0 * high_hits as f64
            + medium_hits as f64
            + if has_examples { 2.0 } else { 0.0 }
            + if has_subtopics { 1.0 } else { 0.0 };

        ValueAssessment { value, score }
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

fn topic_words(topic: &Topic) -> HashSet<String> {
    let mut words = HashSet::new();
    let mut add = |text: &str| {
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            if word.is_empty() {
                continue;
            }
            let lower = word.to_lowercase();
            if let Some(singular) = lower.strip_suffix('s') {
                words.insert(singular.to_string());
            }
            words.insert(lower);
        }
    };
    add(&topic.title);
    add(&topic.content);
    for sub in &topic.subtopics {
        add(&sub.title);
        add(&sub.content);
    }
    words
}

fn count_hits(words: &HashSet<String>, keywords: &[&str]) -> usize {
    keywords.iter().filter(|kw| words.contains(**kw)).count()
}
