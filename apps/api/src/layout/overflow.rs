//! Overflow Detector — second, type-aware pass over the content blocks.
//!
//! # Height formulas
//! - heading: wrapped text at h1/h2/h3 size + 0.5em above + 0.3em below
//! - paragraph: wrapped body text + 0.5 body em
//! - list: each non-blank line wrapped at 90% width + 0.2 body em per item
//! - table: header + `max(3, ceil(len / 100))` rows
//! - image: `min(column_width × 0.6, 150)` + wrapped caption when text is present
//!
//! The precise budget is `content_area.height × max_pages`: blocks are stacked as one
//! flow in document order. This is deliberately stricter than the column engine's
//! grid capacity; `analyze_overflow` reports whichever pass sees more overflow.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::columns::{smaller_size, ColumnEngine};
use crate::layout::geometry::{column_width, content_area, PageGeometryConfig};
use crate::layout::report::{
    merge_suggestions, Impact, LayoutWarning, OverflowAnalysis, OverflowSuggestion, Severity,
    SuggestionType, WarningType,
};
use crate::layout::typography::{estimate_text_height, font_size_table, TypographyProfile};
use crate::models::{BlockType, ContentBlock};

const FIT_EPSILON: f64 = 1e-6;
const PREVIEW_CHARS: usize = 100;
/// A sentence boundary is used for the cutoff only if it keeps this share of the raw cut.
const SENTENCE_CUTOFF_RATIO: f64 = 0.8;
/// Body text under this size draws a readability warning.
const READABLE_BODY_PX: f64 = 10.0;
/// Columns narrower than this draw a spacing warning.
const MIN_COLUMN_WIDTH_PX: f64 = 100.0;

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// A block paired with its precise height.
#[derive(Debug, Clone, Copy)]
pub struct MeasuredBlock<'a> {
    pub block: &'a ContentBlock,
    pub height: f64,
}

/// How much of the first straddling block still fits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialFit {
    pub fitting_height: f64,
    /// 0–100.
    pub fitting_percentage: f64,
    /// Character index at which the block's text should be cut.
    pub cutoff_point: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockOverflowDetail {
    pub block_id: String,
    pub block_type: BlockType,
    pub height: f64,
    /// Flow height after this block.
    pub cumulative_height: f64,
    pub fits: bool,
    pub preview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_fit: Option<PartialFit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpaceUtilization {
    pub used_height: f64,
    pub available_height: f64,
    pub wasted_height: f64,
    /// `used / available` in `[0, 1]`.
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedOverflowInfo {
    pub total_height: f64,
    pub available_height: f64,
    pub overflow_amount: f64,
    pub blocks: Vec<BlockOverflowDetail>,
    pub utilization: SpaceUtilization,
}

/// Result of the cumulative fit simulation.
struct PrecisePass {
    total_height: f64,
    overflow_amount: f64,
    affected_blocks: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Detector
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OverflowDetector {
    page: PageGeometryConfig,
    typography: TypographyProfile,
    max_pages: u32,
    columns: ColumnEngine,
}

impl OverflowDetector {
    pub fn new(page: PageGeometryConfig, typography: TypographyProfile, max_pages: u32) -> Self {
        let columns = ColumnEngine::new(page.clone(), typography.clone());
        Self {
            page,
            typography,
            max_pages,
            columns,
        }
    }

    pub fn available_height(&self) -> f64 {
        content_area(&self.page).height * f64::from(self.max_pages)
    }

    pub fn column_width(&self) -> f64 {
        column_width(&self.page)
    }

    // ── Heights ─────────────────────────────────────────────────────────────

    /// Precise height of one block; a positive `estimated_height` always wins.
    pub fn calculate_block_height(&self, block: &ContentBlock) -> f64 {
        if let Some(h) = block.height_override() {
            return h;
        }
        match block.block_type {
            BlockType::Heading => self.heading_height(&block.content),
            BlockType::Paragraph => self.paragraph_height(&block.content),
            BlockType::List => self.list_height(&block.content),
            BlockType::Table => self.table_height(&block.content),
            BlockType::Image => self.image_height(&block.content),
        }
    }

    fn heading_height(&self, content: &str) -> f64 {
        let table = font_size_table(&self.typography);
        let trimmed = content.trim_start();
        let (font_size, text) = if let Some(rest) = trimmed.strip_prefix("### ") {
            (table.h3, rest)
        } else if let Some(rest) = trimmed.strip_prefix("## ") {
            (table.h2, rest)
        } else if let Some(rest) = trimmed.strip_prefix("# ") {
            (table.h1, rest)
        } else {
            (table.h2, trimmed)
        };
        let base = estimate_text_height(
            text,
            font_size,
            self.typography.line_height,
            self.column_width(),
        );
        base + font_size * 0.5 + font_size * 0.3
    }

    fn paragraph_height(&self, content: &str) -> f64 {
        let body = font_size_table(&self.typography).body;
        estimate_text_height(content, body, self.typography.line_height, self.column_width())
            + body * 0.5
    }

    fn list_height(&self, content: &str) -> f64 {
        let body = font_size_table(&self.typography).body;
        let indented_width = self.column_width() * 0.9;
        let mut items: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(strip_list_marker)
            .collect();
        if items.is_empty() {
            items.push("");
        }
        items
            .iter()
            .map(|item| {
                estimate_text_height(item, body, self.typography.line_height, indented_width)
                    + body * 0.2
            })
            .sum()
    }

    fn table_height(&self, content: &str) -> f64 {
        let body = font_size_table(&self.typography).body;
        let line = body * self.typography.line_height;
        let header_height = line * 1.2;
        let row_height = line + 4.0;
        let estimated_rows = (content.chars().count() as f64 / 100.0).ceil().max(3.0);
        header_height + estimated_rows * row_height
    }

    fn image_height(&self, content: &str) -> f64 {
        let width = self.column_width();
        let image = (width * 0.6).min(150.0);
        if content.trim().is_empty() {
            return image;
        }
        let caption = font_size_table(&self.typography).caption;
        image + estimate_text_height(content.trim(), caption, self.typography.line_height, width)
    }

    pub fn measure_blocks<'a>(&self, blocks: &'a [ContentBlock]) -> Vec<MeasuredBlock<'a>> {
        blocks
            .iter()
            .map(|block| MeasuredBlock {
                block,
                height: self.calculate_block_height(block),
            })
            .collect()
    }

    pub fn total_content_height(&self, blocks: &[ContentBlock]) -> f64 {
        blocks.iter().map(|b| self.calculate_block_height(b)).sum()
    }

    // ── Analysis ────────────────────────────────────────────────────────────

    /// Stacks blocks in document order and flags every block whose addition ends past
    /// the budget.
    fn precise_pass(&self, blocks: &[ContentBlock]) -> PrecisePass {
        let available = self.available_height();
        let mut cumulative = 0.0;
        let mut affected_blocks = Vec::new();

        for block in blocks {
            cumulative += self.calculate_block_height(block);
            if cumulative > available + FIT_EPSILON {
                affected_blocks.push(block.id.clone());
            }
        }

        let overflow = cumulative - available;
        PrecisePass {
            total_height: cumulative,
            overflow_amount: if overflow > FIT_EPSILON { overflow } else { 0.0 },
            affected_blocks,
        }
    }

    fn precise_suggestions(&self, blocks: &[ContentBlock], pass: &PrecisePass) -> Vec<OverflowSuggestion> {
        if pass.overflow_amount <= 0.0 {
            return Vec::new();
        }
        let mut suggestions = vec![OverflowSuggestion::new(
            SuggestionType::ReduceContent,
            format!(
                "Content runs {:.0}px past the page budget; trim lower-priority blocks",
                pass.overflow_amount
            ),
            Impact::High,
            pass.overflow_amount,
        )];

        let page_height = content_area(&self.page).height;
        if page_height > 0.0 {
            let extra = (pass.overflow_amount / page_height).ceil().max(1.0) as u32;
            suggestions.push(OverflowSuggestion::new(
                SuggestionType::IncreasePages,
                format!(
                    "Allow {} more page{} ({} total)",
                    extra,
                    if extra == 1 { "" } else { "s" },
                    self.max_pages.saturating_add(extra)
                ),
                Impact::Low,
                pass.overflow_amount,
            ));
        }

        if let Some(smaller) = smaller_size(self.typography.size_class) {
            let resized = OverflowDetector::new(
                self.page.clone(),
                TypographyProfile::for_size(smaller),
                self.max_pages,
            );
            let saving = pass.total_height - resized.total_content_height(blocks);
            if saving > 0.0 {
                suggestions.push(OverflowSuggestion::new(
                    SuggestionType::SmallerText,
                    format!("Use {} text to recover about {saving:.0}px", smaller.as_str()),
                    Impact::Medium,
                    saving,
                ));
            }
        }

        suggestions
    }

    /// Merged first-pass and precise-pass overflow analysis.
    pub fn analyze_overflow(&self, blocks: &[ContentBlock]) -> OverflowAnalysis {
        if blocks.is_empty() {
            return OverflowAnalysis::empty();
        }

        let layout = self.columns.calculate_layout(blocks, self.max_pages);
        let pass = self.precise_pass(blocks);

        let has_overflow = pass.overflow_amount > 0.0 || layout.has_overflow;
        let overflow_amount = pass.overflow_amount.max(layout.overflow_amount);
        let affected_blocks = if pass.overflow_amount > 0.0 {
            pass.affected_blocks.clone()
        } else {
            layout.overflowing_blocks()
        };
        let suggestions = merge_suggestions(
            self.precise_suggestions(blocks, &pass),
            layout.suggestions,
        );

        debug!(
            blocks = blocks.len(),
            total_height = pass.total_height,
            available_height = self.available_height(),
            overflow_amount,
            affected = affected_blocks.len(),
            "Overflow analysis complete"
        );

        OverflowAnalysis {
            has_overflow,
            overflow_amount,
            affected_blocks,
            suggestions,
        }
    }

    /// Per-block fit report including the cutoff estimate for the straddling block.
    pub fn get_detailed_overflow_info(&self, blocks: &[ContentBlock]) -> DetailedOverflowInfo {
        let available = self.available_height();
        let mut cumulative = 0.0;
        let mut partial_assigned = false;
        let mut details = Vec::with_capacity(blocks.len());

        for block in blocks {
            let height = self.calculate_block_height(block);
            let before = cumulative;
            cumulative += height;
            let fits = cumulative <= available + FIT_EPSILON;

            let partial_fit = if !fits && !partial_assigned && before < available && height > 0.0 {
                partial_assigned = true;
                let fitting_height = available - before;
                let fraction = (fitting_height / height).clamp(0.0, 1.0);
                Some(PartialFit {
                    fitting_height,
                    fitting_percentage: fraction * 100.0,
                    cutoff_point: estimate_cutoff_point(&block.content, fraction),
                })
            } else {
                None
            };

            details.push(BlockOverflowDetail {
                block_id: block.id.clone(),
                block_type: block.block_type,
                height,
                cumulative_height: cumulative,
                fits,
                preview: preview(&block.content),
                partial_fit,
            });
        }

        DetailedOverflowInfo {
            total_height: cumulative,
            available_height: available,
            overflow_amount: (cumulative - available).max(0.0),
            blocks: details,
            utilization: utilization(cumulative, available),
        }
    }

    pub fn space_utilization(&self, blocks: &[ContentBlock]) -> SpaceUtilization {
        utilization(self.total_content_height(blocks), self.available_height())
    }

    /// Overflow, readability and spacing warnings. Empty input yields no warnings.
    pub fn generate_layout_warnings(&self, blocks: &[ContentBlock]) -> Vec<LayoutWarning> {
        if blocks.is_empty() {
            return Vec::new();
        }
        let mut warnings = Vec::new();

        let analysis = self.analyze_overflow(blocks);
        if analysis.has_overflow {
            let available = self.available_height();
            let ratio = if available > 0.0 {
                analysis.overflow_amount / available
            } else {
                f64::INFINITY
            };
            let severity = if ratio > 0.5 {
                Severity::High
            } else if ratio > 0.2 {
                Severity::Medium
            } else {
                Severity::Low
            };
            warnings.push(LayoutWarning {
                warning_type: WarningType::Overflow,
                severity,
                message: format!(
                    "Content exceeds the {}-page budget by {:.0}px",
                    self.max_pages, analysis.overflow_amount
                ),
                affected_elements: analysis.affected_blocks,
            });
        }

        let body = font_size_table(&self.typography).body;
        if body < READABLE_BODY_PX {
            warnings.push(LayoutWarning {
                warning_type: WarningType::Readability,
                severity: Severity::Medium,
                message: format!("Body text at {body}px may be hard to read when printed"),
                affected_elements: vec!["body".to_string()],
            });
        }

        let width = self.column_width();
        if width < MIN_COLUMN_WIDTH_PX {
            warnings.push(LayoutWarning {
                warning_type: WarningType::Spacing,
                severity: Severity::High,
                message: format!("Columns are only {width:.0}px wide"),
                affected_elements: vec!["columns".to_string()],
            });
        }

        warnings
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn strip_list_marker(line: &str) -> &str {
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
    {
        return rest;
    }
    let digits = line.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix(". ") {
            return rest;
        }
    }
    line
}

fn utilization(total: f64, available: f64) -> SpaceUtilization {
    let used = total.min(available).max(0.0);
    SpaceUtilization {
        used_height: used,
        available_height: available,
        wasted_height: (available - used).max(0.0),
        efficiency: if available > 0.0 {
            (used / available).clamp(0.0, 1.0)
        } else {
            0.0
        },
    }
}

/// First 100 characters, with an ellipsis when truncated.
fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Character index at which to cut `content` so roughly `fraction` of it is kept.
///
/// Prefers the last sentence end before the raw cut if it keeps at least 80% of it,
/// then the whitespace nearest the raw cut on either side (the earlier one on a tie),
/// then the raw character position.
pub fn estimate_cutoff_point(content: &str, fraction: f64) -> usize {
    let chars: Vec<char> = content.chars().collect();
    let len = chars.len();
    let raw = ((len as f64) * fraction.clamp(0.0, 1.0)).floor() as usize;
    if raw == 0 || raw >= len {
        return raw.min(len);
    }

    let sentence_end = (0..raw)
        .rev()
        .find(|&i| {
            matches!(chars[i], '.' | '!' | '?')
                && chars.get(i + 1).map_or(true, |c| c.is_whitespace())
        })
        .map(|i| i + 1);
    if let Some(end) = sentence_end {
        if end as f64 >= raw as f64 * SENTENCE_CUTOFF_RATIO {
            return end;
        }
    }

    let before = (1..=raw).rev().find(|&i| chars[i].is_whitespace());
    let after = (raw + 1..len).find(|&i| chars[i].is_whitespace());
    match (before, after) {
        (Some(b), Some(a)) if a - raw < raw - b => a,
        (Some(b), _) => b,
        (None, Some(a)) => a,
        (None, None) => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::typography::TextSize;

    const SENTENCE: &str = "The quick brown fox jumps over the lazy dog. ";

    fn detector(max_pages: u32) -> OverflowDetector {
        OverflowDetector::new(
            PageGeometryConfig::default(),
            TypographyProfile::default(),
            max_pages,
        )
    }

    fn paragraphs(n: usize, text: &str) -> Vec<ContentBlock> {
        (0..n)
            .map(|i| ContentBlock::new(format!("p{i}"), BlockType::Paragraph, text))
            .collect()
    }

    // ── heights ─────────────────────────────────────────────────────────────

    #[test]
    fn test_override_height_wins_for_every_type() {
        let d = detector(2);
        for t in [
            BlockType::Heading,
            BlockType::Paragraph,
            BlockType::List,
            BlockType::Table,
            BlockType::Image,
        ] {
            let block = ContentBlock::new("b", t, "anything").with_height(42.0);
            assert_eq!(d.calculate_block_height(&block), 42.0, "{t:?}");
        }
    }

    #[test]
    fn test_heading_levels_scale() {
        let d = detector(2);
        let h1 = d.calculate_block_height(&ContentBlock::new("a", BlockType::Heading, "# Limits"));
        let h2 = d.calculate_block_height(&ContentBlock::new("b", BlockType::Heading, "## Limits"));
        let h3 = d.calculate_block_height(&ContentBlock::new("c", BlockType::Heading, "### Limits"));
        let plain = d.calculate_block_height(&ContentBlock::new("d", BlockType::Heading, "Limits"));
        assert!(h1 > h2 && h2 > h3, "h1={h1} h2={h2} h3={h3}");
        assert_eq!(plain, h2);
        // h1 at medium = 16px: one line 16 × 1.3 + 0.8 × 16
        assert!((h1 - (16.0 * 1.3 + 16.0 * 0.8)).abs() < 1e-9);
    }

    #[test]
    fn test_paragraph_adds_spacing() {
        let d = detector(2);
        let h = d.calculate_block_height(&ContentBlock::new("p", BlockType::Paragraph, "short"));
        assert!((h - (13.0 + 5.0)).abs() < 1e-9, "got {h}");
    }

    #[test]
    fn test_list_counts_non_blank_items() {
        let d = detector(2);
        let h = d.calculate_block_height(&ContentBlock::new(
            "l",
            BlockType::List,
            "- one\n\n- two\n   \n3. three",
        ));
        // three single-line items: 3 × (13 + 2)
        assert!((h - 45.0).abs() < 1e-9, "got {h}");
    }

    #[test]
    fn test_table_has_minimum_three_rows() {
        let d = detector(2);
        let small = d.calculate_block_height(&ContentBlock::new("t", BlockType::Table, "a|b"));
        let header = 13.0 * 1.2;
        let row = 13.0 + 4.0;
        assert!((small - (header + 3.0 * row)).abs() < 1e-9);

        let big = d.calculate_block_height(&ContentBlock::new("t", BlockType::Table, "x".repeat(550)));
        assert!((big - (header + 6.0 * row)).abs() < 1e-9);
    }

    #[test]
    fn test_image_capped_and_caption_added() {
        let d = detector(2);
        let bare = d.calculate_block_height(&ContentBlock::new("i", BlockType::Image, ""));
        assert_eq!(bare, 150.0, "0.6 × 346px exceeds the 150px cap");
        let captioned =
            d.calculate_block_height(&ContentBlock::new("i", BlockType::Image, "Figure 1"));
        assert!((captioned - (150.0 + 8.0 * 1.3)).abs() < 1e-9);
    }

    // ── analysis ────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_blocks_no_overflow() {
        let analysis = detector(2).analyze_overflow(&[]);
        assert_eq!(analysis, OverflowAnalysis::empty());
        assert!(detector(2).generate_layout_warnings(&[]).is_empty());
    }

    #[test]
    fn test_two_short_paragraphs_fit() {
        let blocks = paragraphs(2, "A short paragraph about limits.");
        let analysis = detector(2).analyze_overflow(&blocks);
        assert!(!analysis.has_overflow);
        assert_eq!(analysis.overflow_amount, 0.0);
        assert!(analysis.affected_blocks.is_empty());
        assert!(analysis.suggestions.is_empty());
    }

    #[test]
    fn test_thirty_long_paragraphs_overflow_two_pages() {
        let blocks = paragraphs(30, &SENTENCE.repeat(7));
        let analysis = detector(2).analyze_overflow(&blocks);
        assert!(analysis.has_overflow);
        assert!(analysis.overflow_amount > 0.0);
        assert!(!analysis.affected_blocks.is_empty());
        assert_eq!(analysis.affected_blocks.last().map(String::as_str), Some("p29"));
        let types: Vec<_> = analysis.suggestions.iter().map(|s| s.suggestion_type).collect();
        assert!(types.contains(&SuggestionType::IncreasePages));
        assert!(types.contains(&SuggestionType::SmallerText));
        assert!(types.contains(&SuggestionType::ReduceContent));
    }

    #[test]
    fn test_huge_override_height_does_not_overflow_page_count() {
        let blocks = vec![ContentBlock::new("huge", BlockType::Paragraph, "x").with_height(1e18)];
        let analysis = detector(2).analyze_overflow(&blocks);
        assert!(analysis.has_overflow);
        assert_eq!(analysis.affected_blocks, vec!["huge".to_string()]);

        let pages = analysis
            .suggestions
            .iter()
            .find(|s| s.suggestion_type == SuggestionType::IncreasePages)
            .expect("huge overflow suggests more pages");
        assert!(pages.description.contains(&u32::MAX.to_string()));
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let blocks = paragraphs(30, &SENTENCE.repeat(7));
        let d = detector(2);
        assert_eq!(d.analyze_overflow(&blocks), d.analyze_overflow(&blocks));
    }

    #[test]
    fn test_more_pages_never_more_overflow() {
        let blocks = paragraphs(60, &SENTENCE.repeat(7));
        let one = detector(1).analyze_overflow(&blocks);
        let three = detector(3).analyze_overflow(&blocks);
        assert!(three.overflow_amount <= one.overflow_amount);
    }

    #[test]
    fn test_affected_blocks_start_at_crossing() {
        let d = detector(1);
        let available = d.available_height();
        let blocks = vec![
            ContentBlock::new("a", BlockType::Paragraph, "").with_height(available - 10.0),
            ContentBlock::new("b", BlockType::Paragraph, "").with_height(20.0),
            ContentBlock::new("c", BlockType::Paragraph, "").with_height(5.0),
        ];
        let analysis = d.analyze_overflow(&blocks);
        assert_eq!(analysis.affected_blocks, vec!["b".to_string(), "c".to_string()]);
        assert!((analysis.overflow_amount - 15.0).abs() < 1e-6);
    }

    // ── detailed info ───────────────────────────────────────────────────────

    #[test]
    fn test_detailed_info_partial_fit_on_first_straddler_only() {
        let d = detector(1);
        let available = d.available_height();
        let text = SENTENCE.repeat(4);
        let blocks = vec![
            ContentBlock::new("a", BlockType::Paragraph, "").with_height(available - 50.0),
            ContentBlock::new("b", BlockType::Paragraph, text.clone()).with_height(100.0),
            ContentBlock::new("c", BlockType::Paragraph, text).with_height(100.0),
        ];
        let info = d.get_detailed_overflow_info(&blocks);
        assert!(info.blocks[0].fits);
        assert!(!info.blocks[1].fits);
        assert!(info.blocks[2].partial_fit.is_none());

        let partial = info.blocks[1].partial_fit.as_ref().unwrap();
        assert!((partial.fitting_percentage - 50.0).abs() < 1e-6);
        assert!((partial.fitting_height - 50.0).abs() < 1e-6);
        // 180 chars × 0.5 = 90; the second sentence ends at 89
        assert_eq!(partial.cutoff_point, 89);
        assert!((info.overflow_amount - 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_preview_truncates_with_ellipsis() {
        assert_eq!(preview("short"), "short");
        let long = "x".repeat(150);
        let p = preview(&long);
        assert_eq!(p.chars().count(), 103);
        assert!(p.ends_with("..."));
        assert_eq!(preview(&"y".repeat(100)), "y".repeat(100));
    }

    #[test]
    fn test_cutoff_prefers_sentence_within_eighty_percent() {
        let text = "First sentence here. Second sentence goes on and on";
        // 51 chars → raw = 25; sentence end at 20 ≥ 0.8 × 25
        assert_eq!(estimate_cutoff_point(text, 0.5), 20);
    }

    #[test]
    fn test_cutoff_falls_back_to_word_boundary() {
        let text = "Hi. averyveryverylongword another word here";
        // raw = 28; sentence end at 3 is far below 80%; space at 25 beats space at 33
        let cut = estimate_cutoff_point(text, 28.5 / text.chars().count() as f64);
        assert_eq!(cut, 25);
        assert!(text.chars().nth(cut).unwrap().is_whitespace());
    }

    #[test]
    fn test_cutoff_takes_nearest_word_boundary_either_side() {
        let text = "Hi. averyveryverylongword another word here";
        // raw = 31: the space at 33 is two away, the one at 25 is six away
        let cut = estimate_cutoff_point(text, 31.5 / text.chars().count() as f64);
        assert_eq!(cut, 33);

        // no whitespace before the raw cut at all
        let cut = estimate_cutoff_point("abcdefghij klm", 0.5);
        assert_eq!(cut, 10);
    }

    #[test]
    fn test_cutoff_hard_cut_without_boundaries() {
        assert_eq!(estimate_cutoff_point(&"z".repeat(40), 0.5), 20);
        assert_eq!(estimate_cutoff_point("", 0.5), 0);
        assert_eq!(estimate_cutoff_point("abc", 1.0), 3);
    }

    #[test]
    fn test_cutoff_handles_multibyte_text() {
        let text = "Ünïcödé wörds ärë fïnë. Möré tëxt föllöws hërë";
        let cut = estimate_cutoff_point(text, 0.5);
        assert!(cut <= text.chars().count());
    }

    // ── utilization and warnings ────────────────────────────────────────────

    #[test]
    fn test_space_utilization_bounds() {
        let d = detector(1);
        let available = d.available_height();
        let half = vec![ContentBlock::new("a", BlockType::Paragraph, "").with_height(available / 2.0)];
        let u = d.space_utilization(&half);
        assert!((u.efficiency - 0.5).abs() < 1e-9);
        assert!((u.wasted_height - available / 2.0).abs() < 1e-6);

        let over = vec![ContentBlock::new("a", BlockType::Paragraph, "").with_height(available * 3.0)];
        let u = d.space_utilization(&over);
        assert_eq!(u.efficiency, 1.0);
        assert_eq!(u.wasted_height, 0.0);
    }

    #[test]
    fn test_overflow_warning_severity_scales() {
        let d = detector(1);
        let available = d.available_height();
        let severity_for = |extra: f64| {
            let blocks = vec![ContentBlock::new("a", BlockType::Paragraph, "")
                .with_height(available + extra)];
            d.generate_layout_warnings(&blocks)
                .into_iter()
                .find(|w| w.warning_type == WarningType::Overflow)
                .map(|w| w.severity)
        };
        assert_eq!(severity_for(available * 0.1), Some(Severity::Low));
        assert_eq!(severity_for(available * 0.3), Some(Severity::Medium));
        assert_eq!(severity_for(available * 0.8), Some(Severity::High));
        assert_eq!(severity_for(-10.0), None);
    }

    #[test]
    fn test_small_text_and_narrow_columns_warn() {
        let narrow = PageGeometryConfig {
            columns: 3,
            margins: crate::layout::geometry::Margins::uniform(300.0),
            ..PageGeometryConfig::default()
        };
        let d = OverflowDetector::new(narrow, TypographyProfile::for_size(TextSize::Small), 2);
        let blocks = paragraphs(1, "x");
        let warnings = d.generate_layout_warnings(&blocks);
        assert!(warnings
            .iter()
            .any(|w| w.warning_type == WarningType::Readability));
        assert!(warnings
            .iter()
            .any(|w| w.warning_type == WarningType::Spacing && w.severity == Severity::High));
    }
}
