//! Content Prioritizer — ranks topics and plans what to drop or condense on overflow.
//!
//! # Priority score (clamped to 1–10)
//! - base 5
//! - +4 when the topic is user-selected
//! - +round(confidence × 2)
//! - +2 / +1 / −1 for high / medium / low educational value
//! - −1 when unselected and longer than 1000 characters
//! - +0.5 per dependency that is itself user-selected
//!
//! # Reduction plan
//! 1. Remove whole blocks, lowest priority first. Priority ≥ 7 is never removed.
//! 2. If still short, compress blocks with priority 3–8 by
//!    `min(0.6, max(0.2, (10 − p) / 10) × type_factor)`.
//!
//! Savings never exceed `max_content_reduction`% of the content height plus a 20%
//! rounding allowance; candidates that would cross that line are skipped.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::layout::overflow::MeasuredBlock;
use crate::layout::report::{Impact, OverflowSuggestion, SuggestionType};
use crate::layout::scoring::{EducationalValue, EducationalValueScorer, KeywordValueScorer};
use crate::models::{BlockType, ContentBlock, Topic};

/// Priority assumed for blocks that cannot be tied to a topic.
pub const BASELINE_PRIORITY: f64 = 5.0;
/// Blocks whose topic reaches this priority are never removed.
pub const PROTECTED_PRIORITY: f64 = 7.0;
/// The removal target overshoots the overflow by this factor.
const TARGET_OVERSHOOT: f64 = 1.2;
/// Allowance over the configured reduction cap.
const CAP_TOLERANCE: f64 = 0.2;
const MAX_COMPRESSION_RATIO: f64 = 0.6;
/// Compressions saving this share of a block or less are not worth recording.
const MIN_COMPRESSION_SAVING: f64 = 0.05;
const LONG_TOPIC_CHARS: usize = 1000;
const DEPENDENCY_PROBE_WORDS: usize = 5;

const SMALLER_TEXT_SAVING: f64 = 0.15;
const MORE_COLUMNS_SAVING: f64 = 0.1;
const MERGE_SAVING: f64 = 0.3;
/// Content lengths within this ratio count as "similar" for merge suggestions.
const MERGE_LENGTH_SIMILARITY: f64 = 0.8;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizationConfig {
    #[serde(default)]
    pub user_selected_topics: Vec<String>,
    /// Upper bound on space a plan may reclaim, as a percentage of content height.
    #[serde(default = "default_max_content_reduction")]
    pub max_content_reduction: f64,
    /// Never remove blocks of topics assessed as high educational value.
    #[serde(default = "default_true")]
    pub preserve_high_value_content: bool,
    /// Take equal-priority removal candidates round-robin across topics.
    #[serde(default = "default_true")]
    pub maintain_topic_balance: bool,
}

fn default_max_content_reduction() -> f64 {
    50.0
}

fn default_true() -> bool {
    true
}

impl Default for PrioritizationConfig {
    fn default() -> Self {
        Self {
            user_selected_topics: Vec::new(),
            max_content_reduction: default_max_content_reduction(),
            preserve_high_value_content: true,
            maintain_topic_balance: true,
        }
    }
}

impl PrioritizationConfig {
    pub fn is_selected(&self, topic_id: &str) -> bool {
        self.user_selected_topics.iter().any(|t| t == topic_id)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPriority {
    pub topic_id: String,
    pub priority: f64,
    pub user_selected: bool,
    pub content_length: usize,
    pub educational_value: EducationalValue,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressibleBlock {
    pub block_id: String,
    pub original_length: usize,
    pub target_length: usize,
    /// Share of the block to cut, in `(0, 0.6]`.
    pub compression_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EducationalValueLoss {
    Minimal,
    Moderate,
    Significant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCoherence {
    Maintained,
    Reduced,
    Compromised,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactAssessment {
    pub topics_affected: Vec<String>,
    pub educational_value_loss: EducationalValueLoss,
    pub content_coherence: ContentCoherence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentReductionPlan {
    pub removable_blocks: Vec<String>,
    pub compressible_blocks: Vec<CompressibleBlock>,
    /// Reclaimed height in px. Check it against the overflow; reaching it is not guaranteed.
    pub estimated_space_saved: f64,
    pub impact_assessment: ImpactAssessment,
}

impl ContentReductionPlan {
    pub fn empty() -> Self {
        Self {
            removable_blocks: Vec::new(),
            compressible_blocks: Vec::new(),
            estimated_space_saved: 0.0,
            impact_assessment: ImpactAssessment {
                topics_affected: Vec::new(),
                educational_value_loss: EducationalValueLoss::Minimal,
                content_coherence: ContentCoherence::Maintained,
            },
        }
    }
}

/// A block as seen by the planner.
struct Candidate<'a> {
    block: &'a ContentBlock,
    height: f64,
    topic_id: Option<&'a str>,
    priority: f64,
    educational_value: Option<EducationalValue>,
}

// ────────────────────────────────────────────────────────────────────────────
// Prioritizer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ContentPrioritizer {
    config: PrioritizationConfig,
    scorer: Arc<dyn EducationalValueScorer>,
    /// Body-text px per character, used to turn topic lengths into space estimates.
    height_per_char: f64,
}

impl fmt::Debug for ContentPrioritizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentPrioritizer")
            .field("config", &self.config)
            .field("scorer", &self.scorer.name())
            .field("height_per_char", &self.height_per_char)
            .finish()
    }
}

impl ContentPrioritizer {
    pub fn new(config: PrioritizationConfig, height_per_char: f64) -> Self {
        Self::with_scorer(config, height_per_char, Arc::new(KeywordValueScorer))
    }

    pub fn with_scorer(
        config: PrioritizationConfig,
        height_per_char: f64,
        scorer: Arc<dyn EducationalValueScorer>,
    ) -> Self {
        Self {
            config,
            scorer,
            height_per_char: height_per_char.max(0.0),
        }
    }

    /// Same scorer, new settings.
    pub fn reconfigure(&self, config: PrioritizationConfig, height_per_char: f64) -> Self {
        Self::with_scorer(config, height_per_char, Arc::clone(&self.scorer))
    }

    pub fn config(&self) -> &PrioritizationConfig {
        &self.config
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    // ── Priorities ──────────────────────────────────────────────────────────

    /// Scores every topic. Sorted: user-selected first, then priority, then value.
    pub fn analyze_priorities(&self, topics: &[Topic], blocks: &[ContentBlock]) -> Vec<ContentPriority> {
        let known_ids = topics.iter().map(|t| t.id.as_str());
        let block_topics: Vec<(&ContentBlock, String)> = blocks
            .iter()
            .filter_map(|b| b.resolve_topic(known_ids.clone()).map(|t| (b, t)))
            .collect();

        let mut priorities: Vec<ContentPriority> = topics
            .iter()
            .map(|topic| {
                let assessment = self.scorer.assess(topic);
                let user_selected = self.config.is_selected(&topic.id);
                let content_length = topic.content_length();
                let dependencies = detect_dependencies(topic, &block_topics);

                let mut priority = BASELINE_PRIORITY;
                if user_selected {
                    priority += 4.0;
                }
                priority += (topic.confidence.clamp(0.0, 1.0) * 2.0).round();
                priority += assessment.value.priority_adjustment();
                if !user_selected && content_length > LONG_TOPIC_CHARS {
                    priority -= 1.0;
                }
                let selected_deps = dependencies
                    .iter()
                    .filter(|d| self.config.is_selected(d))
                    .count();
                priority += 0.5 * selected_deps as f64;

                ContentPriority {
                    topic_id: topic.id.clone(),
                    priority: priority.clamp(1.0, 10.0),
                    user_selected,
                    content_length,
                    educational_value: assessment.value,
                    dependencies,
                }
            })
            .collect();

        priorities.sort_by(|a, b| {
            b.user_selected
                .cmp(&a.user_selected)
                .then_with(|| b.priority.total_cmp(&a.priority))
                .then_with(|| b.educational_value.cmp(&a.educational_value))
                .then_with(|| a.topic_id.cmp(&b.topic_id))
        });

        debug!(
            topics = priorities.len(),
            scorer = self.scorer.name(),
            "Topic priorities analyzed"
        );
        priorities
    }

    // ── Reduction plan ──────────────────────────────────────────────────────

    /// Plans removals and compressions to recover `overflow_amount` px.
    pub fn create_reduction_plan(
        &self,
        overflow_amount: f64,
        blocks: &[MeasuredBlock<'_>],
        priorities: &[ContentPriority],
    ) -> ContentReductionPlan {
        let total_height: f64 = blocks.iter().map(|m| m.height).sum();
        if overflow_amount <= 0.0 || total_height <= 0.0 {
            return ContentReductionPlan::empty();
        }

        let cap = total_height * self.config.max_content_reduction.clamp(0.0, 100.0) / 100.0;
        let limit = cap * (1.0 + CAP_TOLERANCE);
        let target_reduction = (overflow_amount * TARGET_OVERSHOOT).min(cap);

        let by_topic: HashMap<&str, &ContentPriority> = priorities
            .iter()
            .map(|p| (p.topic_id.as_str(), p))
            .collect();
        let known_ids = priorities.iter().map(|p| p.topic_id.as_str());

        let mut candidates: Vec<Candidate<'_>> = blocks
            .iter()
            .map(|m| {
                let topic = m
                    .block
                    .resolve_topic(known_ids.clone())
                    .and_then(|id| by_topic.get(id.as_str()).copied());
                Candidate {
                    block: m.block,
                    height: m.height,
                    topic_id: topic.map(|p| p.topic_id.as_str()),
                    priority: topic.map_or(BASELINE_PRIORITY, |p| p.priority),
                    educational_value: topic.map(|p| p.educational_value),
                }
            })
            .collect();
        candidates.sort_by(|a, b| a.priority.total_cmp(&b.priority));

        let mut saved = 0.0;
        let mut removable_blocks: Vec<String> = Vec::new();
        let mut topics_affected: Vec<String> = Vec::new();

        // Phase 1: removal
        let removal_order: Vec<&Candidate<'_>> = if self.config.maintain_topic_balance {
            balance_by_topic(&candidates)
        } else {
            candidates.iter().collect()
        };
        for candidate in removal_order {
            if saved >= target_reduction {
                break;
            }
            if candidate.priority >= PROTECTED_PRIORITY {
                continue;
            }
            if self.config.preserve_high_value_content
                && candidate.educational_value == Some(EducationalValue::High)
            {
                continue;
            }
            if saved + candidate.height > limit {
                continue;
            }
            saved += candidate.height;
            removable_blocks.push(candidate.block.id.clone());
            note_topic(&mut topics_affected, candidate.topic_id);
        }

        // Phase 2: compression
        let mut compressible_blocks: Vec<CompressibleBlock> = Vec::new();
        for candidate in &candidates {
            if saved >= target_reduction {
                break;
            }
            if !(3.0..=8.0).contains(&candidate.priority)
                || candidate.height <= 0.0
                || removable_blocks.contains(&candidate.block.id)
            {
                continue;
            }
            let headroom = (limit - saved).max(0.0);
            let saving = (candidate.height
                * compression_ratio(candidate.priority, candidate.block.block_type))
            .min(headroom);
            let ratio = saving / candidate.height;
            if ratio <= MIN_COMPRESSION_SAVING {
                continue;
            }

            let original_length = candidate.block.content.chars().count();
            compressible_blocks.push(CompressibleBlock {
                block_id: candidate.block.id.clone(),
                original_length,
                target_length: (original_length as f64 * (1.0 - ratio)).round() as usize,
                compression_ratio: ratio,
            });
            saved += saving;
            note_topic(&mut topics_affected, candidate.topic_id);
        }

        if saved < target_reduction {
            warn!(
                target_reduction,
                estimated_space_saved = saved,
                "Reduction plan cannot reach its target with removable content"
            );
        }

        let impact_assessment = self.assess_impact(
            &removable_blocks,
            &compressible_blocks,
            topics_affected,
            priorities,
        );

        debug!(
            removed = removable_blocks.len(),
            compressed = compressible_blocks.len(),
            estimated_space_saved = saved,
            "Reduction plan created"
        );

        ContentReductionPlan {
            removable_blocks,
            compressible_blocks,
            estimated_space_saved: saved,
            impact_assessment,
        }
    }

    /// Grades a plan by the topics it touches and how much of it is outright removal.
    pub fn assess_impact(
        &self,
        removable_blocks: &[String],
        compressible_blocks: &[CompressibleBlock],
        topics_affected: Vec<String>,
        priorities: &[ContentPriority],
    ) -> ImpactAssessment {
        let affected: Vec<&ContentPriority> = priorities
            .iter()
            .filter(|p| topics_affected.contains(&p.topic_id))
            .collect();
        let high_value = affected
            .iter()
            .filter(|p| p.educational_value == EducationalValue::High)
            .count();
        let user_selected = affected.iter().filter(|p| p.user_selected).count();

        let educational_value_loss = if high_value > 2 || user_selected > 1 {
            EducationalValueLoss::Significant
        } else if !topics_affected.is_empty() {
            EducationalValueLoss::Moderate
        } else {
            EducationalValueLoss::Minimal
        };

        let touched = removable_blocks.len() + compressible_blocks.len();
        let removed_ratio = if touched > 0 {
            removable_blocks.len() as f64 / touched as f64
        } else {
            0.0
        };
        let content_coherence = if removed_ratio > 0.4 {
            ContentCoherence::Compromised
        } else if removed_ratio > 0.2 {
            ContentCoherence::Reduced
        } else {
            ContentCoherence::Maintained
        };

        ImpactAssessment {
            topics_affected,
            educational_value_loss,
            content_coherence,
        }
    }

    // ── Suggestions ─────────────────────────────────────────────────────────

    /// Human-readable options, ordered from least to most disruptive.
    pub fn generate_intelligent_suggestions(
        &self,
        overflow_amount: f64,
        priorities: &[ContentPriority],
        plan: &ContentReductionPlan,
    ) -> Vec<OverflowSuggestion> {
        if overflow_amount <= 0.0 {
            return Vec::new();
        }
        let px_for = |chars: usize| chars as f64 * self.height_per_char;
        let total_chars: usize = priorities.iter().map(|p| p.content_length).sum();
        let mut suggestions = Vec::new();

        if overflow_amount > 200.0 {
            suggestions.push(OverflowSuggestion::new(
                SuggestionType::IncreasePages,
                "Add a page so every topic keeps its full content",
                Impact::Low,
                overflow_amount,
            ));
        }

        suggestions.push(OverflowSuggestion::new(
            SuggestionType::SmallerText,
            "Use a smaller text size to fit more per column",
            Impact::Medium,
            px_for(total_chars) * SMALLER_TEXT_SAVING,
        ));

        suggestions.push(OverflowSuggestion::new(
            SuggestionType::MoreColumns,
            "Add a column to use horizontal space more densely",
            Impact::Medium,
            px_for(total_chars) * MORE_COLUMNS_SAVING,
        ));

        let low_priority: Vec<&ContentPriority> = priorities
            .iter()
            .filter(|p| !p.user_selected && p.priority < BASELINE_PRIORITY)
            .collect();
        if !low_priority.is_empty() {
            let chars: usize = low_priority.iter().map(|p| p.content_length).sum();
            suggestions.push(OverflowSuggestion::new(
                SuggestionType::ReduceContent,
                format!(
                    "Trim low-priority topics you did not select: {}",
                    list_ids(low_priority.iter().map(|p| p.topic_id.as_str()))
                ),
                Impact::Medium,
                px_for(chars),
            ));
        }

        if let Some((a, b)) = find_merge_pair(priorities) {
            suggestions.push(OverflowSuggestion::new(
                SuggestionType::ReduceContent,
                format!(
                    "Merge '{}' and '{}'; they cover related ground",
                    a.topic_id, b.topic_id
                ),
                Impact::Low,
                px_for(a.content_length.min(b.content_length)) * MERGE_SAVING,
            ));
        }

        if !plan.compressible_blocks.is_empty() {
            let chars: usize = plan
                .compressible_blocks
                .iter()
                .map(|c| c.original_length.saturating_sub(c.target_length))
                .sum();
            let impact = match plan.impact_assessment.educational_value_loss {
                EducationalValueLoss::Minimal => Impact::Low,
                EducationalValueLoss::Moderate => Impact::Medium,
                EducationalValueLoss::Significant => Impact::High,
            };
            suggestions.push(OverflowSuggestion::new(
                SuggestionType::ReduceContent,
                format!(
                    "Condense {} block{} to their key points",
                    plan.compressible_blocks.len(),
                    if plan.compressible_blocks.len() == 1 { "" } else { "s" }
                ),
                impact,
                px_for(chars),
            ));
        }

        // Stable: equal impacts keep emission order.
        suggestions.sort_by_key(|s| s.impact);
        suggestions
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Share of a block to cut when compressing it.
pub fn compression_ratio(priority: f64, block_type: BlockType) -> f64 {
    let priority_factor = ((10.0 - priority) / 10.0).max(0.2);
    let type_factor = match block_type {
        BlockType::Paragraph => 0.5,
        BlockType::List => 0.4,
        BlockType::Table => 0.25,
        BlockType::Heading => 0.15,
        BlockType::Image => 0.1,
    };
    (priority_factor * type_factor).min(MAX_COMPRESSION_RATIO)
}

/// Topics (other than `topic`) whose blocks open with a word found in `topic`'s text.
fn detect_dependencies(topic: &Topic, block_topics: &[(&ContentBlock, String)]) -> Vec<String> {
    let mut dependencies: Vec<String> = Vec::new();
    for (block, other) in block_topics {
        if *other == topic.id || dependencies.contains(other) {
            continue;
        }
        let referenced = block
            .content
            .split_whitespace()
            .take(DEPENDENCY_PROBE_WORDS)
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| w.chars().count() > 3)
            .any(|w| topic.content.contains(w));
        if referenced {
            dependencies.push(other.clone());
        }
    }
    dependencies
}

/// Interleaves equal-priority runs across topics, one block per topic per round.
fn balance_by_topic<'c, 'a>(candidates: &'c [Candidate<'a>]) -> Vec<&'c Candidate<'a>> {
    let mut ordered = Vec::with_capacity(candidates.len());
    let mut start = 0;

    while start < candidates.len() {
        let priority = candidates[start].priority;
        let end = candidates[start..]
            .iter()
            .position(|c| c.priority != priority)
            .map_or(candidates.len(), |offset| start + offset);

        let mut queues: Vec<(Option<&str>, VecDeque<&Candidate<'a>>)> = Vec::new();
        for candidate in &candidates[start..end] {
            match queues.iter_mut().find(|(t, _)| *t == candidate.topic_id) {
                Some((_, queue)) => queue.push_back(candidate),
                None => queues.push((candidate.topic_id, VecDeque::from([candidate]))),
            }
        }
        while queues.iter().any(|(_, q)| !q.is_empty()) {
            for (_, queue) in queues.iter_mut() {
                if let Some(candidate) = queue.pop_front() {
                    ordered.push(candidate);
                }
            }
        }
        start = end;
    }
    ordered
}

fn note_topic(topics: &mut Vec<String>, topic_id: Option<&str>) {
    if let Some(id) = topic_id {
        if !topics.iter().any(|t| t == id) {
            topics.push(id.to_string());
        }
    }
}

/// First pair of topics with similar length that share a dependency.
fn find_merge_pair(priorities: &[ContentPriority]) -> Option<(&ContentPriority, &ContentPriority)> {
    for (i, a) in priorities.iter().enumerate() {
        for b in &priorities[i + 1..] {
            let (short, long) = if a.content_length <= b.content_length {
                (a.content_length, b.content_length)
            } else {
                (b.content_length, a.content_length)
            };
            if short == 0 || (short as f64 / long as f64) < MERGE_LENGTH_SIMILARITY {
                continue;
            }
            if a.dependencies.iter().any(|d| b.dependencies.contains(d)) {
                return Some((a, b));
            }
        }
    }
    None
}

fn list_ids<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    let ids: Vec<&str> = ids.collect();
    if ids.len() <= 3 {
        ids.join(", ")
    } else {
        format!("{} and {} more", ids[..3].join(", "), ids.len() - 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(id: &str, content: &str, confidence: f64) -> Topic {
        Topic {
            id: id.to_string(),
            title: id.to_string(),
            content: content.to_string(),
            subtopics: vec![],
            confidence,
            examples: vec![],
            source_files: vec![],
        }
    }

    fn prioritizer(selected: &[&str]) -> ContentPrioritizer {
        ContentPrioritizer::new(
            PrioritizationConfig {
                user_selected_topics: selected.iter().map(|s| s.to_string()).collect(),
                ..PrioritizationConfig::default()
            },
            0.2,
        )
    }

    fn priority(id: &str, p: f64) -> ContentPriority {
        ContentPriority {
            topic_id: id.to_string(),
            priority: p,
            user_selected: false,
            content_length: 500,
            educational_value: EducationalValue::Medium,
            dependencies: vec![],
        }
    }

    fn measured(blocks: &[ContentBlock], height: f64) -> Vec<MeasuredBlock<'_>> {
        blocks.iter().map(|block| MeasuredBlock { block, height }).collect()
    }

    fn para(id: &str, topic: &str) -> ContentBlock {
        ContentBlock::new(id, BlockType::Paragraph, "x".repeat(200)).with_topic(topic)
    }

    // ── priorities ──────────────────────────────────────────────────────────

    #[test]
    fn test_selected_topic_scores_higher() {
        let topics = vec![topic("a", "plain words", 0.5), topic("b", "plain words", 0.5)];
        let priorities = prioritizer(&["b"]).analyze_priorities(&topics, &[]);
        assert_eq!(priorities[0].topic_id, "b");
        assert!(priorities[0].user_selected);
        // 5 + 4 + round(1.0) − 1 (low value)
        assert_eq!(priorities[0].priority, 9.0);
        // 5 + 1 − 1
        assert_eq!(priorities[1].priority, 5.0);
    }

    #[test]
    fn test_priority_clamped_to_range() {
        let mut t = topic("a", "definition theorem formula", 1.0);
        t.examples = vec!["worked".into()];
        let top = prioritizer(&["a"]).analyze_priorities(&[t], &[]);
        // 5 + 4 + 2 + 2 = 13 → 10
        assert_eq!(top[0].priority, 10.0);

        let long = topic("b", &"z ".repeat(800), 0.0);
        let bottom = prioritizer(&[]).analyze_priorities(&[long], &[]);
        // 5 + 0 − 1 − 1 = 3
        assert_eq!(bottom[0].priority, 3.0);
    }

    #[test]
    fn test_dependency_on_selected_topic_adds_half_point() {
        let topics = vec![
            topic("topic-1", "Derivatives build on limits and continuity", 0.0),
            topic("topic-2", "unrelated", 0.0),
        ];
        let blocks = vec![ContentBlock::new(
            "topic-2-intro",
            BlockType::Paragraph,
            "Limits describe behaviour near a point",
        )];
        // "Limits" (capitalised) is not in topic-1's text; "behaviour" is not either.
        let none = prioritizer(&["topic-2"]).analyze_priorities(&topics, &blocks);
        let t1 = none.iter().find(|p| p.topic_id == "topic-1").unwrap();
        assert!(t1.dependencies.is_empty());

        let blocks = vec![ContentBlock::new(
            "topic-2-intro",
            BlockType::Paragraph,
            "The limits of a function",
        )];
        let with = prioritizer(&["topic-2"]).analyze_priorities(&topics, &blocks);
        let t1 = with.iter().find(|p| p.topic_id == "topic-1").unwrap();
        assert_eq!(t1.dependencies, vec!["topic-2".to_string()]);
        // 5 + 0 − 1 + 0.5
        assert_eq!(t1.priority, 4.5);
    }

    #[test]
    fn test_own_blocks_are_not_dependencies() {
        let topics = vec![topic("topic-1", "limits everywhere", 0.0)];
        let blocks = vec![ContentBlock::new("topic-1-a", BlockType::Paragraph, "limits")];
        let p = prioritizer(&[]).analyze_priorities(&topics, &blocks);
        assert!(p[0].dependencies.is_empty());
    }

    // ── reduction plan ──────────────────────────────────────────────────────

    #[test]
    fn test_no_overflow_empty_plan() {
        let blocks = vec![para("b", "a")];
        let plan = prioritizer(&[]).create_reduction_plan(0.0, &measured(&blocks, 100.0), &[]);
        assert_eq!(plan, ContentReductionPlan::empty());
    }

    #[test]
    fn test_protected_topics_never_removed() {
        let blocks = vec![para("hi", "high"), para("lo", "low")];
        let priorities = vec![priority("high", 9.0), priority("low", 2.0)];
        let plan = prioritizer(&[]).create_reduction_plan(
            90.0,
            &measured(&blocks, 100.0),
            &priorities,
        );
        assert_eq!(plan.removable_blocks, vec!["lo".to_string()]);
        assert!(!plan.removable_blocks.contains(&"hi".to_string()));
        assert_eq!(plan.estimated_space_saved, 100.0);
    }

    #[test]
    fn test_unmapped_blocks_treated_as_baseline() {
        let blocks = vec![ContentBlock::new("orphan", BlockType::Paragraph, "text")];
        let plan = prioritizer(&[]).create_reduction_plan(10.0, &measured(&blocks, 50.0), &[]);
        // cap = 25, limit = 30: the whole 50px block is too big to remove
        assert!(plan.removable_blocks.is_empty());
        // compression at priority 5: 0.5 × 0.5 = 0.25 → 12.5px ≤ 30
        assert_eq!(plan.compressible_blocks.len(), 1);
        assert!((plan.compressible_blocks[0].compression_ratio - 0.25).abs() < 1e-9);
        assert!((plan.estimated_space_saved - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_savings_respect_cap() {
        let blocks: Vec<ContentBlock> = (0..10).map(|i| para(&format!("b{i}"), "t")).collect();
        let priorities = vec![priority("t", 2.0)];
        let p = ContentPrioritizer::new(
            PrioritizationConfig {
                max_content_reduction: 20.0,
                ..PrioritizationConfig::default()
            },
            0.2,
        );
        let plan = p.create_reduction_plan(10_000.0, &measured(&blocks, 100.0), &priorities);
        // cap 200, limit 240
        assert!(plan.estimated_space_saved <= 240.0 + 1e-9);
        assert_eq!(plan.removable_blocks.len(), 2);
    }

    #[test]
    fn test_compression_phase_fills_gap() {
        let blocks = vec![para("a", "mid")];
        let priorities = vec![priority("mid", 7.0)];
        let plan = prioritizer(&[]).create_reduction_plan(10.0, &measured(&blocks, 100.0), &priorities);
        assert!(plan.removable_blocks.is_empty(), "priority 7 is protected");
        let c = &plan.compressible_blocks[0];
        // max(0.2, 0.3) × 0.5 = 0.15
        assert!((c.compression_ratio - 0.15).abs() < 1e-9);
        assert_eq!(c.original_length, 200);
        assert_eq!(c.target_length, 170);
    }

    #[test]
    fn test_high_value_topics_preserved_when_configured() {
        let blocks = vec![para("a", "gold"), para("b", "plain")];
        let mut gold = priority("gold", 4.0);
        gold.educational_value = EducationalValue::High;
        let priorities = vec![gold, priority("plain", 5.0)];

        let plan = prioritizer(&[]).create_reduction_plan(50.0, &measured(&blocks, 100.0), &priorities);
        assert_eq!(plan.removable_blocks, vec!["b".to_string()]);

        let permissive = ContentPrioritizer::new(
            PrioritizationConfig {
                preserve_high_value_content: false,
                ..PrioritizationConfig::default()
            },
            0.2,
        );
        let plan = permissive.create_reduction_plan(50.0, &measured(&blocks, 100.0), &priorities);
        assert_eq!(plan.removable_blocks, vec!["a".to_string()]);
    }

    #[test]
    fn test_topic_balance_interleaves_equal_priorities() {
        let blocks = vec![para("a1", "a"), para("a2", "a"), para("b1", "b"), para("b2", "b")];
        let priorities = vec![priority("a", 3.0), priority("b", 3.0)];
        let heights = measured(&blocks, 10.0);

        let balanced = prioritizer(&[]).create_reduction_plan(15.0, &heights, &priorities);
        assert_eq!(balanced.removable_blocks, vec!["a1".to_string(), "b1".to_string()]);

        let unbalanced = ContentPrioritizer::new(
            PrioritizationConfig {
                maintain_topic_balance: false,
                ..PrioritizationConfig::default()
            },
            0.2,
        );
        let plan = unbalanced.create_reduction_plan(15.0, &heights, &priorities);
        assert_eq!(plan.removable_blocks, vec!["a1".to_string(), "a2".to_string()]);
    }

    #[test]
    fn test_compression_ratio_table() {
        assert!((compression_ratio(3.0, BlockType::Paragraph) - 0.35).abs() < 1e-9);
        assert!((compression_ratio(8.0, BlockType::Image) - 0.02).abs() < 1e-9);
        assert!((compression_ratio(1.0, BlockType::Paragraph) - 0.45).abs() < 1e-9);
        assert!(compression_ratio(-50.0, BlockType::Paragraph) <= MAX_COMPRESSION_RATIO);
    }

    // ── impact ──────────────────────────────────────────────────────────────

    #[test]
    fn test_impact_grades() {
        let p = prioritizer(&[]);
        let mut selected_a = priority("a", 9.0);
        selected_a.user_selected = true;
        let mut selected_b = priority("b", 9.0);
        selected_b.user_selected = true;
        let priorities = vec![selected_a, selected_b, priority("c", 3.0)];

        let none = p.assess_impact(&[], &[], vec![], &priorities);
        assert_eq!(none.educational_value_loss, EducationalValueLoss::Minimal);
        assert_eq!(none.content_coherence, ContentCoherence::Maintained);

        let one = p.assess_impact(&["x".into()], &[], vec!["c".into()], &priorities);
        assert_eq!(one.educational_value_loss, EducationalValueLoss::Moderate);
        assert_eq!(one.content_coherence, ContentCoherence::Compromised);

        let compressed = |id: &str| CompressibleBlock {
            block_id: id.to_string(),
            original_length: 10,
            target_length: 8,
            compression_ratio: 0.2,
        };
        let both = p.assess_impact(
            &["x".into()],
            &[compressed("y"), compressed("z"), compressed("w")],
            vec!["a".into(), "b".into()],
            &priorities,
        );
        assert_eq!(both.educational_value_loss, EducationalValueLoss::Significant);
        // 1 of 4 removed = 25%
        assert_eq!(both.content_coherence, ContentCoherence::Reduced);
    }

    // ── suggestions ─────────────────────────────────────────────────────────

    #[test]
    fn test_intelligent_suggestions_sorted_low_to_high() {
        let p = prioritizer(&[]);
        let mut a = priority("a", 3.0);
        a.dependencies = vec!["z".into()];
        let mut b = priority("b", 4.0);
        b.dependencies = vec!["z".into()];
        let priorities = vec![a, b];
        let mut plan = ContentReductionPlan::empty();
        plan.compressible_blocks.push(CompressibleBlock {
            block_id: "x".into(),
            original_length: 100,
            target_length: 50,
            compression_ratio: 0.5,
        });
        plan.impact_assessment.educational_value_loss = EducationalValueLoss::Significant;

        let suggestions = p.generate_intelligent_suggestions(500.0, &priorities, &plan);
        let impacts: Vec<Impact> = suggestions.iter().map(|s| s.impact).collect();
        let mut sorted = impacts.clone();
        sorted.sort();
        assert_eq!(impacts, sorted);

        assert_eq!(suggestions[0].suggestion_type, SuggestionType::IncreasePages);
        assert!(suggestions
            .iter()
            .any(|s| s.description.contains("Merge 'a' and 'b'")));
        assert!(suggestions
            .iter()
            .any(|s| s.description.contains("Trim low-priority topics") && s.description.contains("a, b")));
        let last = suggestions.last().unwrap();
        assert_eq!(last.impact, Impact::High);
        assert!((last.estimated_reduction - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_page_suggestion_for_small_overflow() {
        let suggestions = prioritizer(&[]).generate_intelligent_suggestions(
            100.0,
            &[priority("a", 6.0)],
            &ContentReductionPlan::empty(),
        );
        assert!(suggestions
            .iter()
            .all(|s| s.suggestion_type != SuggestionType::IncreasePages));
        assert!(suggestions
            .iter()
            .any(|s| s.suggestion_type == SuggestionType::SmallerText));
    }

    #[test]
    fn test_no_suggestions_without_overflow() {
        let suggestions = prioritizer(&[]).generate_intelligent_suggestions(
            0.0,
            &[priority("a", 6.0)],
            &ContentReductionPlan::empty(),
        );
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_list_ids_truncates() {
        assert_eq!(list_ids(["a", "b"].into_iter()), "a, b");
        assert_eq!(list_ids(["a", "b", "c", "d", "e"].into_iter()), "a, b, c and 2 more");
    }
}
