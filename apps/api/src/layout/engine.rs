//! LayoutEngine — the facade callers hold.
//!
//! Owns one [`LayoutConfig`] and the collaborators derived from it. Every `update_*`
//! call swaps the configuration and rebuilds the collaborators from scratch; analysis
//! methods take `&self` and never mutate.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::columns::{ColumnEngine, LayoutCalculation};
use crate::layout::geometry::{self, column_width, dimensions_mm, PageGeometryConfig, MAX_COLUMNS};
use crate::layout::overflow::{DetailedOverflowInfo, OverflowDetector, SpaceUtilization};
use crate::layout::prioritizer::{
    ContentPrioritizer, ContentPriority, ContentReductionPlan, PrioritizationConfig,
};
use crate::layout::report::{LayoutWarning, OverflowAnalysis, OverflowSuggestion, Severity, WarningType};
use crate::layout::scoring::EducationalValueScorer;
use crate::layout::typography::{
    self, height_per_char, suggest_optimal_text_size, validate_readability, TextSize,
    TypographyProfile,
};
use crate::models::{ContentBlock, Topic};

const FIT_EPSILON: f64 = 1e-6;
const MAX_RECOMMENDED_PAGES: u32 = 10;
const MIN_COLUMN_WIDTH_PX: f64 = 100.0;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub page: PageGeometryConfig,
    #[serde(default = "default_text_size")]
    pub text_size: TextSize,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default)]
    pub prioritization: PrioritizationConfig,
}

fn default_text_size() -> TextSize {
    TextSize::Medium
}

fn default_max_pages() -> u32 {
    2
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page: PageGeometryConfig::default(),
            text_size: default_text_size(),
            max_pages: default_max_pages(),
            prioritization: PrioritizationConfig::default(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Results
// ────────────────────────────────────────────────────────────────────────────

/// Plain overflow analysis plus the topic-aware extras when topics were supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizedOverflowAnalysis {
    #[serde(flatten)]
    pub analysis: OverflowAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priorities: Option<Vec<ContentPriority>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduction_plan: Option<ContentReductionPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intelligent_suggestions: Option<Vec<OverflowSuggestion>>,
}

/// Result of the topic-blind greedy trim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedLayout {
    /// Kept blocks in their original order.
    pub blocks: Vec<ContentBlock>,
    pub removed_block_ids: Vec<String>,
    /// First-pass height of the kept blocks.
    pub estimated_height: f64,
    /// Column capacity across all pages.
    pub available_height: f64,
    /// Largest text size at which the kept blocks still fit.
    pub recommended_text_size: TextSize,
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: LayoutConfig,
    typography: TypographyProfile,
    columns: ColumnEngine,
    detector: OverflowDetector,
    prioritizer: ContentPrioritizer,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        let prioritizer = ContentPrioritizer::new(config.prioritization.clone(), 0.0);
        Self::assemble(config, &prioritizer)
    }

    /// Engine whose prioritizer classifies topics with `scorer`.
    pub fn with_scorer(config: LayoutConfig, scorer: Arc<dyn EducationalValueScorer>) -> Self {
        let prioritizer = ContentPrioritizer::with_scorer(config.prioritization.clone(), 0.0, scorer);
        Self::assemble(config, &prioritizer)
    }

    fn assemble(config: LayoutConfig, previous: &ContentPrioritizer) -> Self {
        let typography = TypographyProfile::for_size(config.text_size);
        let columns = ColumnEngine::new(config.page.clone(), typography.clone());
        let detector = OverflowDetector::new(config.page.clone(), typography.clone(), config.max_pages);
        let prioritizer = previous.reconfigure(
            config.prioritization.clone(),
            height_per_char(&typography, column_width(&config.page)),
        );
        Self {
            config,
            typography,
            columns,
            detector,
            prioritizer,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn typography(&self) -> &TypographyProfile {
        &self.typography
    }

    // ── Reconfiguration ─────────────────────────────────────────────────────

    pub fn update_config(&mut self, config: LayoutConfig) {
        *self = Self::assemble(config, &self.prioritizer);
        debug!(
            paper = self.config.page.paper_size.as_str(),
            columns = self.config.page.columns,
            text_size = self.config.text_size.as_str(),
            max_pages = self.config.max_pages,
            scorer = self.prioritizer.scorer_name(),
            "Layout configuration replaced"
        );
    }

    pub fn update_page_config(&mut self, page: PageGeometryConfig) {
        let config = LayoutConfig {
            page,
            ..self.config.clone()
        };
        self.update_config(config);
    }

    pub fn update_text_config(&mut self, text_size: TextSize) {
        let config = LayoutConfig {
            text_size,
            ..self.config.clone()
        };
        self.update_config(config);
    }

    // ── Analysis ────────────────────────────────────────────────────────────

    pub fn calculate_layout(&self, blocks: &[ContentBlock]) -> LayoutCalculation {
        self.columns.calculate_layout(blocks, self.config.max_pages)
    }

    pub fn analyze_overflow(&self, blocks: &[ContentBlock]) -> OverflowAnalysis {
        self.detector.analyze_overflow(blocks)
    }

    /// Adds priorities, a reduction plan and ranked suggestions when topics are given.
    /// Without topics (or with an empty list) only the plain analysis is returned.
    pub fn analyze_overflow_with_prioritization(
        &self,
        blocks: &[ContentBlock],
        topics: Option<&[Topic]>,
    ) -> PrioritizedOverflowAnalysis {
        let analysis = self.analyze_overflow(blocks);
        let topics = match topics {
            Some(t) if !t.is_empty() => t,
            _ => {
                return PrioritizedOverflowAnalysis {
                    analysis,
                    priorities: None,
                    reduction_plan: None,
                    intelligent_suggestions: None,
                }
            }
        };

        let priorities = self.prioritizer.analyze_priorities(topics, blocks);
        let measured = self.detector.measure_blocks(blocks);
        let plan = self
            .prioritizer
            .create_reduction_plan(analysis.overflow_amount, &measured, &priorities);
        let suggestions = self.prioritizer.generate_intelligent_suggestions(
            analysis.overflow_amount,
            &priorities,
            &plan,
        );

        debug!(
            topics = topics.len(),
            overflow_amount = analysis.overflow_amount,
            removable = plan.removable_blocks.len(),
            compressible = plan.compressible_blocks.len(),
            estimated_space_saved = plan.estimated_space_saved,
            "Prioritized overflow analysis complete"
        );

        PrioritizedOverflowAnalysis {
            analysis,
            priorities: Some(priorities),
            reduction_plan: Some(plan),
            intelligent_suggestions: Some(suggestions),
        }
    }

    pub fn get_detailed_overflow_info(&self, blocks: &[ContentBlock]) -> DetailedOverflowInfo {
        self.detector.get_detailed_overflow_info(blocks)
    }

    pub fn space_utilization(&self, blocks: &[ContentBlock]) -> SpaceUtilization {
        self.detector.space_utilization(blocks)
    }

    /// Detector warnings followed by readability warnings for the active profile.
    pub fn generate_warnings(&self, blocks: &[ContentBlock]) -> Vec<LayoutWarning> {
        if blocks.is_empty() {
            return Vec::new();
        }
        let mut warnings = self.detector.generate_layout_warnings(blocks);
        warnings.extend(validate_readability(&self.typography));
        warnings
    }

    /// Keeps the highest-priority blocks that fit the column capacity and drops the rest.
    ///
    /// Topic-blind: use the prioritized analysis when topic metadata is available.
    pub fn optimize_layout(&self, blocks: &[ContentBlock]) -> OptimizedLayout {
        let layout = self.calculate_layout(blocks);
        let available_height = layout.available_height;

        let (kept, removed_block_ids, estimated_height) = if layout.has_overflow {
            let mut order: Vec<usize> = (0..blocks.len()).collect();
            order.sort_by(|a, b| blocks[*b].priority.cmp(&blocks[*a].priority));

            let mut keep = vec![false; blocks.len()];
            let mut cumulative = 0.0;
            for index in order {
                let height = self.columns.block_height(&blocks[index]);
                if cumulative + height > available_height + FIT_EPSILON {
                    break;
                }
                cumulative += height;
                keep[index] = true;
            }

            let mut kept = Vec::new();
            let mut removed = Vec::new();
            for (block, keep) in blocks.iter().zip(keep) {
                if keep {
                    kept.push(block.clone());
                } else {
                    removed.push(block.id.clone());
                }
            }
            (kept, removed, cumulative)
        } else {
            (blocks.to_vec(), Vec::new(), layout.total_height)
        };

        let content_length: usize = kept.iter().map(|b| b.content.chars().count()).sum();
        let recommended_text_size =
            suggest_optimal_text_size(content_length, available_height, self.columns.column_width());

        debug!(
            kept = kept.len(),
            removed = removed_block_ids.len(),
            estimated_height,
            available_height,
            "Layout optimized"
        );

        OptimizedLayout {
            blocks: kept,
            removed_block_ids,
            estimated_height,
            available_height,
            recommended_text_size,
        }
    }

    // ── CSS ─────────────────────────────────────────────────────────────────

    /// Geometry and typography custom properties in one map.
    pub fn generate_css_variables(&self) -> BTreeMap<String, String> {
        let mut vars = geometry::css_variables(&self.config.page);
        vars.extend(typography::css_variables(&self.typography));
        vars
    }

    /// `@page` rule, `:root` variables and the multi-column container rule.
    pub fn generate_print_stylesheet(&self) -> String {
        const COLUMNS_RULE: &str = "\
.layout-columns {
  column-count: var(--column-count);
  column-gap: var(--column-gap);
  column-fill: auto;
  font-family: var(--font-family);
  font-size: var(--font-size-body);
  line-height: var(--line-height);
}
";
        let page = &self.config.page;
        let size = dimensions_mm(page.paper_size, page.orientation);
        let m = &page.margins;

        let root_vars: String = self
            .generate_css_variables()
            .into_iter()
            .map(|(name, value)| format!("  {name}: {value};\n"))
            .collect();

        format!(
            "@page {{\n  size: {width} {height};\n  margin: {top} {right} {bottom} {left};\n}}\n\n\
             :root {{\n{root_vars}}}\n\n{COLUMNS_RULE}",
            width = mm(size.width),
            height = mm(size.height),
            top = geometry::px(m.top),
            right = geometry::px(m.right),
            bottom = geometry::px(m.bottom),
            left = geometry::px(m.left),
        )
    }

    // ── Validation ──────────────────────────────────────────────────────────

    /// Advisory configuration smells, independent of content.
    pub fn validate_config(&self) -> Vec<LayoutWarning> {
        let page = &self.config.page;
        let mut warnings = Vec::new();

        if page.columns == 0 {
            warnings.push(config_warning(
                WarningType::Spacing,
                Severity::High,
                "Column count is 0; one column will be used".to_string(),
                "columns",
            ));
        } else if page.columns > MAX_COLUMNS {
            warnings.push(config_warning(
                WarningType::Spacing,
                Severity::Medium,
                format!(
                    "{} columns is more than the {MAX_COLUMNS} supported; text will be cramped",
                    page.columns
                ),
                "columns",
            ));
        }

        if self.config.max_pages == 0 {
            warnings.push(config_warning(
                WarningType::Overflow,
                Severity::High,
                "Page budget is 0; every block will overflow".to_string(),
                "max_pages",
            ));
        } else if self.config.max_pages > MAX_RECOMMENDED_PAGES {
            warnings.push(config_warning(
                WarningType::Overflow,
                Severity::Low,
                format!(
                    "A {}-page budget is unusually large for a study sheet",
                    self.config.max_pages
                ),
                "max_pages",
            ));
        }

        let width = column_width(page);
        if width < MIN_COLUMN_WIDTH_PX {
            warnings.push(config_warning(
                WarningType::Spacing,
                Severity::High,
                format!("Columns are only {width:.0}px wide"),
                "column_width",
            ));
        }

        warnings
    }
}

fn config_warning(
    warning_type: WarningType,
    severity: Severity,
    message: String,
    element: &str,
) -> LayoutWarning {
    LayoutWarning {
        warning_type,
        severity,
        message,
        affected_elements: vec![element.to_string()],
    }
}

/// Millimetre length for the `@page` rule, at most one decimal.
fn mm(value: f64) -> String {
    let formatted = format!("{value:.1}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}mm")
}
