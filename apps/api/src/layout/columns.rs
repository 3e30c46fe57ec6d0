//! Column Engine — first-pass distribution of blocks over the column/page grid.
//!
//! Greedy "shortest column first" in priority order. Each of the `columns × max_pages`
//! slots is one column on one page with `content_area.height` of room. This is not an
//! optimal packing; blocks are coarse and priority order matters more than density.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::geometry::{column_width, content_area, PageGeometryConfig};
use crate::layout::report::{Impact, OverflowSuggestion, SuggestionType};
use crate::layout::typography::{estimate_text_height, font_size_table, TextSize, TypographyProfile};
use crate::models::ContentBlock;

/// Floating-point slack when comparing cumulative heights against a column.
const FIT_EPSILON: f64 = 1e-6;
/// Page breaks reported past this count are dropped.
const MAX_PAGE_BREAKS: u32 = 1000;

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// Where a block landed. Slots are numbered page-major: `slot = page × columns + column`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockPlacement {
    pub block_id: String,
    pub page: u32,
    pub column: u32,
    /// Top of the block within its column (px).
    pub y_offset: f64,
    pub height: f64,
    /// True when the block runs past the bottom of its column.
    pub overflowing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpaceSummary {
    pub used: f64,
    pub available: f64,
    pub remaining: f64,
    /// `used / available`, clamped to `[0, 1]`.
    pub utilization: f64,
}

impl SpaceSummary {
    pub fn new(used: f64, available: f64) -> Self {
        let utilization = if available > 0.0 {
            (used / available).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            used,
            available,
            remaining: (available - used).max(0.0),
            utilization,
        }
    }
}

/// Result of the first-pass layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutCalculation {
    /// One entry per block, in placement (priority) order.
    pub placements: Vec<BlockPlacement>,
    /// Used height per slot, page-major.
    pub column_heights: Vec<f64>,
    /// Content offsets at which each additional page begins, at most `MAX_PAGE_BREAKS`.
    pub page_breaks: Vec<f64>,
    pub total_height: f64,
    pub available_height: f64,
    pub space: SpaceSummary,
    pub has_overflow: bool,
    pub overflow_amount: f64,
    pub suggestions: Vec<OverflowSuggestion>,
}

impl LayoutCalculation {
    /// Ids of blocks that ran past the bottom of their column.
    pub fn overflowing_blocks(&self) -> Vec<String> {
        self.placements
            .iter()
            .filter(|p| p.overflowing)
            .map(|p| p.block_id.clone())
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ColumnEngine {
    page: PageGeometryConfig,
    typography: TypographyProfile,
}

impl ColumnEngine {
    pub fn new(page: PageGeometryConfig, typography: TypographyProfile) -> Self {
        Self { page, typography }
    }

    /// Room in a single column on a single page.
    pub fn column_height(&self) -> f64 {
        content_area(&self.page).height
    }

    pub fn column_width(&self) -> f64 {
        column_width(&self.page)
    }

    /// First-pass height: caller override, else wrapped body text at column width.
    pub fn block_height(&self, block: &ContentBlock) -> f64 {
        block.height_override().unwrap_or_else(|| {
            let body = font_size_table(&self.typography).body;
            estimate_text_height(
                &block.content,
                body,
                self.typography.line_height,
                self.column_width(),
            )
        })
    }

    fn total_height(&self, blocks: &[ContentBlock]) -> f64 {
        blocks.iter().map(|b| self.block_height(b)).sum()
    }

    /// Distributes `blocks` over `columns × max_pages` slots.
    pub fn calculate_layout(&self, blocks: &[ContentBlock], max_pages: u32) -> LayoutCalculation {
        let columns = self.page.effective_columns();
        let column_height = self.column_height();
        let slot_count = (columns as usize * max_pages as usize).max(1);

        // Stable sort: equal priorities keep input order.
        let mut order: Vec<&ContentBlock> = blocks.iter().collect();
        order.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut heights = vec![0.0_f64; slot_count];
        let mut placements = Vec::with_capacity(blocks.len());

        for block in order {
            let height = self.block_height(block);
            // The shortest slot has the most room, so if it cannot take the block no
            // slot can; the block goes there anyway and registers as overflow.
            let slot = shortest_slot(&heights);
            let y_offset = heights[slot];
            let overflowing = y_offset + height > column_height + FIT_EPSILON;
            heights[slot] += height;

            placements.push(BlockPlacement {
                block_id: block.id.clone(),
                page: (slot as u32) / columns,
                column: (slot as u32) % columns,
                y_offset,
                height,
                overflowing,
            });
        }

        let total_height: f64 = placements.iter().map(|p| p.height).sum();
        let page_capacity = column_height * f64::from(columns);
        let available_height = page_capacity * f64::from(max_pages);
        let overflow_amount = (total_height - available_height).max(0.0);
        let has_overflow = overflow_amount > FIT_EPSILON;

        let suggestions = if has_overflow {
            self.baseline_suggestions(blocks, total_height, available_height, overflow_amount, max_pages)
        } else {
            Vec::new()
        };

        debug!(
            blocks = blocks.len(),
            total_height,
            available_height,
            overflow_amount,
            "Column layout calculated"
        );

        LayoutCalculation {
            placements,
            column_heights: heights,
            page_breaks: page_breaks(total_height, page_capacity),
            total_height,
            available_height,
            space: SpaceSummary::new(total_height, available_height),
            has_overflow,
            overflow_amount: if has_overflow { overflow_amount } else { 0.0 },
            suggestions,
        }
    }

    /// Threshold-driven suggestions: > 50% over budget → pages, > 20% → smaller text,
    /// fewer than 3 columns → more columns, any overflow → reduce content.
    fn baseline_suggestions(
        &self,
        blocks: &[ContentBlock],
        total_height: f64,
        available_height: f64,
        overflow_amount: f64,
        max_pages: u32,
    ) -> Vec<OverflowSuggestion> {
        let ratio = if available_height > 0.0 {
            overflow_amount / available_height
        } else {
            f64::INFINITY
        };
        let mut suggestions = Vec::new();

        if ratio > 0.5 {
            let page_capacity = self.column_height() * f64::from(self.page.effective_columns());
            let extra_pages = if page_capacity > 0.0 {
                (overflow_amount / page_capacity).ceil().max(1.0) as u32
            } else {
                1
            };
            suggestions.push(OverflowSuggestion::new(
                SuggestionType::IncreasePages,
                format!(
                    "Increase the page limit from {max_pages} to {}",
                    max_pages.saturating_add(extra_pages)
                ),
                Impact::Low,
                overflow_amount,
            ));
        }

        if ratio > 0.2 {
            if let Some(smaller) = smaller_size(self.typography.size_class) {
                let resized = ColumnEngine::new(
                    self.page.clone(),
                    TypographyProfile::for_size(smaller),
                );
                let saving = total_height - resized.total_height(blocks);
                if saving > 0.0 {
                    suggestions.push(OverflowSuggestion::new(
                        SuggestionType::SmallerText,
                        format!("Switch to {} text", smaller.as_str()),
                        Impact::Medium,
                        saving,
                    ));
                }
            }
        }

        if self.page.effective_columns() < 3 {
            let wider = PageGeometryConfig {
                columns: self.page.effective_columns() as u8 + 1,
                ..self.page.clone()
            };
            let widened = ColumnEngine::new(wider.clone(), self.typography.clone());
            let extra_capacity = widened.column_height() * f64::from(max_pages);
            let growth = widened.total_height(blocks) - total_height;
            suggestions.push(OverflowSuggestion::new(
                SuggestionType::MoreColumns,
                format!("Use {} columns", wider.columns),
                Impact::Low,
                extra_capacity - growth,
            ));
        }

        suggestions.push(OverflowSuggestion::new(
            SuggestionType::ReduceContent,
            format!("Remove or condense about {overflow_amount:.0}px of lower-priority content"),
            Impact::High,
            overflow_amount,
        ));

        suggestions
    }
}

/// Next size class down, if any.
pub(crate) fn smaller_size(size: TextSize) -> Option<TextSize> {
    match size {
        TextSize::Large => Some(TextSize::Medium),
        TextSize::Medium => Some(TextSize::Small),
        TextSize::Small => None,
    }
}

/// Index of the least-filled slot; ties go to the lowest index.
fn shortest_slot(heights: &[f64]) -> usize {
    heights
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best, best_h), (i, &h)| {
            if h < best_h {
                (i, h)
            } else {
                (best, best_h)
            }
        })
        .0
}

fn page_breaks(total_height: f64, page_capacity: f64) -> Vec<f64> {
    if page_capacity <= 0.0 || total_height <= 0.0 {
        return Vec::new();
    }
    let pages_needed = ((total_height / page_capacity).ceil() as u32).min(MAX_PAGE_BREAKS + 1);
    (1..pages_needed)
        .map(|k| f64::from(k) * page_capacity)
        .collect()
}
