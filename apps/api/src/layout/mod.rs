// Pagination and overflow management for multi-column printable sheets.
// Engine code is synchronous and CPU-bound; handlers run it inside
// tokio::task::spawn_blocking.

pub mod columns;
pub mod engine;
pub mod geometry;
pub mod handlers;
pub mod overflow;
pub mod prioritizer;
pub mod report;
pub mod scoring;
pub mod typography;

// Re-export the public API consumed by other modules (handlers, state, config).
pub use columns::{BlockPlacement, ColumnEngine, LayoutCalculation, SpaceSummary};
pub use engine::{LayoutConfig, LayoutEngine, OptimizedLayout, PrioritizedOverflowAnalysis};
pub use geometry::{Dimensions, Margins, Orientation, PageGeometryConfig, PaperSize};
pub use overflow::{DetailedOverflowInfo, OverflowDetector, SpaceUtilization};
pub use prioritizer::{
    ContentPrioritizer, ContentPriority, ContentReductionPlan, PrioritizationConfig,
};
pub use report::{
    Impact, LayoutWarning, OverflowAnalysis, OverflowSuggestion, Severity, SuggestionType,
    WarningType,
};
pub use scoring::{EducationalValue, EducationalValueScorer, KeywordValueScorer};
pub use typography::{TextSize, TypographyProfile};
