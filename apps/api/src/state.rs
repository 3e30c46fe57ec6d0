use crate::config::Config;
use crate::layout::{LayoutConfig, LayoutEngine};

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Holds configuration only. Engines are built per request, so nothing computed
/// survives between calls.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Engine for a request's layout, or the configured default when it has none.
    pub fn engine(&self, layout: Option<LayoutConfig>) -> LayoutEngine {
        LayoutEngine::new(layout.unwrap_or_else(|| self.config.default_layout.clone()))
    }
}
