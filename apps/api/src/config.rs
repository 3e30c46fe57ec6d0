use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::layout::{LayoutConfig, Orientation, PageGeometryConfig, PaperSize, TextSize};

/// Application configuration loaded from environment variables.
/// Every variable is optional; unparsable values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Requests carrying more blocks than this are rejected.
    pub max_blocks_per_request: usize,
    pub max_topics_per_request: usize,
    /// Upper bound on a request's `max_pages`; layout work grows with the page count.
    pub max_pages_per_request: u32,
    /// Layout used when a request does not carry its own.
    pub default_layout: LayoutConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            max_blocks_per_request: 2000,
            max_topics_per_request: 500,
            max_pages_per_request: 20,
            default_layout: LayoutConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        let layout = defaults.default_layout;

        let default_layout = LayoutConfig {
            page: PageGeometryConfig {
                paper_size: env_or::<PaperSize>("LAYOUT_PAPER_SIZE", layout.page.paper_size)?,
                orientation: env_or::<Orientation>("LAYOUT_ORIENTATION", layout.page.orientation)?,
                columns: env_or("LAYOUT_COLUMNS", layout.page.columns)?,
                ..layout.page
            },
            text_size: env_or::<TextSize>("LAYOUT_TEXT_SIZE", layout.text_size)?,
            max_pages: env_or("LAYOUT_MAX_PAGES", layout.max_pages)?,
            prioritization: layout.prioritization,
        };

        if default_layout.page.columns == 0 || default_layout.max_pages == 0 {
            anyhow::bail!("LAYOUT_COLUMNS and LAYOUT_MAX_PAGES must be at least 1");
        }
        let max_pages_per_request =
            env_or("MAX_PAGES_PER_REQUEST", defaults.max_pages_per_request)?;
        if default_layout.max_pages > max_pages_per_request {
            anyhow::bail!(
                "LAYOUT_MAX_PAGES ({}) exceeds MAX_PAGES_PER_REQUEST ({max_pages_per_request})",
                default_layout.max_pages
            );
        }

        Ok(Config {
            port: env_or("PORT", defaults.port).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            max_blocks_per_request: env_or("MAX_BLOCKS_PER_REQUEST", defaults.max_blocks_per_request)?,
            max_topics_per_request: env_or("MAX_TOPICS_PER_REQUEST", defaults.max_topics_per_request)?,
            max_pages_per_request,
            default_layout,
        })
    }
}

/// Parses `key` if set, else returns `default`.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_when_unset() {
        let value: u32 = env_or("STUDYSHEET_TEST_SURELY_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_env_or_reports_key_on_bad_value() {
        std::env::set_var("STUDYSHEET_TEST_BAD_PAPER", "folio");
        let err = env_or::<PaperSize>("STUDYSHEET_TEST_BAD_PAPER", PaperSize::A4).unwrap_err();
        assert!(format!("{err:#}").contains("STUDYSHEET_TEST_BAD_PAPER"));
        std::env::remove_var("STUDYSHEET_TEST_BAD_PAPER");
    }

    #[test]
    fn test_defaults_match_engine_defaults() {
        let config = Config::default();
        assert_eq!(config.default_layout, LayoutConfig::default());
        assert_eq!(config.max_blocks_per_request, 2000);
        assert!(config.default_layout.max_pages <= config.max_pages_per_request);
    }
}
