//! Axum route handlers for the Layout API.
//!
//! Every handler validates the request, builds a fresh engine from the request's
//! configuration (or the service default), and runs it under `spawn_blocking`.

use std::collections::{BTreeMap, HashSet};

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::errors::AppError;
use crate::layout::geometry::MAX_COLUMNS;
use crate::layout::{
    DetailedOverflowInfo, LayoutCalculation, LayoutConfig, LayoutEngine, LayoutWarning,
    OptimizedLayout, OverflowAnalysis, PrioritizedOverflowAnalysis,
};
use crate::models::{ContentBlock, Topic};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LayoutRequest {
    #[serde(default)]
    pub config: Option<LayoutConfig>,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
    #[serde(default)]
    pub topics: Option<Vec<Topic>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigRequest {
    #[serde(default)]
    pub config: Option<LayoutConfig>,
}

#[derive(Debug, Serialize)]
pub struct WarningsResponse {
    pub warnings: Vec<LayoutWarning>,
}

#[derive(Debug, Serialize)]
pub struct CssResponse {
    pub variables: BTreeMap<String, String>,
    pub print_css: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/layout/calculate
pub async fn handle_calculate(
    State(state): State<AppState>,
    Json(request): Json<LayoutRequest>,
) -> Result<Json<LayoutCalculation>, AppError> {
    let (engine, blocks, _) = prepare(&state, request)?;
    let layout = run_engine(move || engine.calculate_layout(&blocks)).await?;

    info!(
        placements = layout.placements.len(),
        overflow_amount = layout.overflow_amount,
        "Layout calculated"
    );
    Ok(Json(layout))
}

/// POST /api/v1/layout/overflow
pub async fn handle_overflow(
    State(state): State<AppState>,
    Json(request): Json<LayoutRequest>,
) -> Result<Json<OverflowAnalysis>, AppError> {
    let (engine, blocks, _) = prepare(&state, request)?;
    let analysis = run_engine(move || engine.analyze_overflow(&blocks)).await?;

    info!(
        has_overflow = analysis.has_overflow,
        overflow_amount = analysis.overflow_amount,
        "Overflow analyzed"
    );
    Ok(Json(analysis))
}

/// POST /api/v1/layout/overflow/details
pub async fn handle_overflow_details(
    State(state): State<AppState>,
    Json(request): Json<LayoutRequest>,
) -> Result<Json<DetailedOverflowInfo>, AppError> {
    let (engine, blocks, _) = prepare(&state, request)?;
    let details = run_engine(move || engine.get_detailed_overflow_info(&blocks)).await?;

    info!(
        blocks = details.blocks.len(),
        overflow_amount = details.overflow_amount,
        "Overflow details computed"
    );
    Ok(Json(details))
}

/// POST /api/v1/layout/overflow/prioritized
///
/// Falls back to the plain analysis when no topics are supplied.
pub async fn handle_prioritized_overflow(
    State(state): State<AppState>,
    Json(request): Json<LayoutRequest>,
) -> Result<Json<PrioritizedOverflowAnalysis>, AppError> {
    let (engine, blocks, topics) = prepare(&state, request)?;
    let analysis = run_engine(move || {
        engine.analyze_overflow_with_prioritization(&blocks, topics.as_deref())
    })
    .await?;

    info!(
        has_overflow = analysis.analysis.has_overflow,
        planned = analysis.reduction_plan.is_some(),
        "Prioritized overflow analyzed"
    );
    Ok(Json(analysis))
}

/// POST /api/v1/layout/warnings
pub async fn handle_warnings(
    State(state): State<AppState>,
    Json(request): Json<LayoutRequest>,
) -> Result<Json<WarningsResponse>, AppError> {
    let (engine, blocks, _) = prepare(&state, request)?;
    let warnings = run_engine(move || engine.generate_warnings(&blocks)).await?;

    info!(warnings = warnings.len(), "Layout warnings generated");
    Ok(Json(WarningsResponse { warnings }))
}

/// POST /api/v1/layout/optimize
///
/// Topic-blind trim to the column capacity.
pub async fn handle_optimize(
    State(state): State<AppState>,
    Json(request): Json<LayoutRequest>,
) -> Result<Json<OptimizedLayout>, AppError> {
    let (engine, blocks, _) = prepare(&state, request)?;
    let optimized = run_engine(move || engine.optimize_layout(&blocks)).await?;

    info!(
        kept = optimized.blocks.len(),
        removed = optimized.removed_block_ids.len(),
        "Layout optimized"
    );
    Ok(Json(optimized))
}

/// POST /api/v1/layout/css
pub async fn handle_css(
    State(state): State<AppState>,
    Json(request): Json<ConfigRequest>,
) -> Result<Json<CssResponse>, AppError> {
    if let Some(config) = &request.config {
        validate_layout_config(&state.config, config)?;
    }
    let engine = state.engine(request.config);

    Ok(Json(CssResponse {
        variables: engine.generate_css_variables(),
        print_css: engine.generate_print_stylesheet(),
    }))
}

/// POST /api/v1/layout/validate-config
///
/// Structural problems are rejected with 400; configuration smells come back as warnings.
pub async fn handle_validate_config(
    State(state): State<AppState>,
    Json(request): Json<ConfigRequest>,
) -> Result<Json<WarningsResponse>, AppError> {
    if let Some(config) = &request.config {
        validate_layout_config(&state.config, config)?;
    }
    let warnings = state.engine(request.config).validate_config();
    Ok(Json(WarningsResponse { warnings }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Runs a CPU-bound engine call off the async executor.
async fn run_engine<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in layout engine: {e}")))
}

/// Validates the request and splits it into an engine, the blocks and the topics.
fn prepare(
    state: &AppState,
    request: LayoutRequest,
) -> Result<(LayoutEngine, Vec<ContentBlock>, Option<Vec<Topic>>), AppError> {
    validate_request(&state.config, &request)?;
    let engine = state.engine(request.config);
    Ok((engine, request.blocks, request.topics))
}

fn validate_request(config: &Config, request: &LayoutRequest) -> Result<(), AppError> {
    if request.blocks.len() > config.max_blocks_per_request {
        return Err(AppError::UnprocessableEntity(format!(
            "{} blocks exceeds the limit of {}",
            request.blocks.len(),
            config.max_blocks_per_request
        )));
    }

    let mut seen = HashSet::with_capacity(request.blocks.len());
    for block in &request.blocks {
        if block.id.trim().is_empty() {
            return Err(AppError::Validation("block id cannot be empty".to_string()));
        }
        if !seen.insert(block.id.as_str()) {
            return Err(AppError::Validation(format!("duplicate block id '{}'", block.id)));
        }
        if !(1..=10).contains(&block.priority) {
            return Err(AppError::Validation(format!(
                "block '{}' has priority {}; expected 1-10",
                block.id, block.priority
            )));
        }
        if !block.estimated_height.is_finite() || block.estimated_height < 0.0 {
            return Err(AppError::Validation(format!(
                "block '{}' has an invalid estimated_height",
                block.id
            )));
        }
    }

    if let Some(topics) = &request.topics {
        if topics.len() > config.max_topics_per_request {
            return Err(AppError::UnprocessableEntity(format!(
                "{} topics exceeds the limit of {}",
                topics.len(),
                config.max_topics_per_request
            )));
        }
        for topic in topics {
            if topic.id.trim().is_empty() {
                return Err(AppError::Validation("topic id cannot be empty".to_string()));
            }
            if !(0.0..=1.0).contains(&topic.confidence) {
                return Err(AppError::Validation(format!(
                    "topic '{}' has confidence {}; expected 0-1",
                    topic.id, topic.confidence
                )));
            }
        }
    }

    if let Some(layout) = &request.config {
        validate_layout_config(config, layout)?;
    }
    Ok(())
}

fn validate_layout_config(limits: &Config, config: &LayoutConfig) -> Result<(), AppError> {
    let page = &config.page;
    if !(1..=MAX_COLUMNS).contains(&page.columns) {
        return Err(AppError::Validation(format!(
            "columns {} must lie in 1-{MAX_COLUMNS}",
            page.columns
        )));
    }
    if config.max_pages == 0 {
        return Err(AppError::Validation("max_pages must be at least 1".to_string()));
    }
    if config.max_pages > limits.max_pages_per_request {
        return Err(AppError::UnprocessableEntity(format!(
            "max_pages {} exceeds the limit of {}",
            config.max_pages, limits.max_pages_per_request
        )));
    }
    let m = &page.margins;
    let lengths = [m.top, m.right, m.bottom, m.left, page.column_gap];
    if lengths.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(AppError::Validation(
            "margins and column_gap must be non-negative".to_string(),
        ));
    }
    let reduction = config.prioritization.max_content_reduction;
    if !(0.0..=100.0).contains(&reduction) {
        return Err(AppError::Validation(format!(
            "max_content_reduction {reduction} must lie in 0-100"
        )));
    }
    Ok(())
}
