//! Page geometry — paper sizes, margins, content area and column widths.
//!
//! Everything here is a pure function of a [`PageGeometryConfig`]. Internal units are
//! CSS pixels at 96 DPI; millimetres are only used for paper definitions and the
//! `@page` rule.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// CSS reference resolution.
pub const DPI: f64 = 96.0;
const MM_PER_INCH: f64 = 25.4;
const PT_PER_INCH: f64 = 72.0;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A4,
    Letter,
    Legal,
    A3,
}

impl PaperSize {
    pub const ALL: [PaperSize; 4] = [
        PaperSize::A4,
        PaperSize::Letter,
        PaperSize::Legal,
        PaperSize::A3,
    ];

    /// Portrait (width, height) in millimetres.
    pub fn portrait_mm(&self) -> (f64, f64) {
        match self {
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::A3 => (297.0, 420.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaperSize::A4 => "a4",
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
            PaperSize::A3 => "a3",
        }
    }
}

impl std::str::FromStr for PaperSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PaperSize::A4),
            "letter" => Ok(PaperSize::Letter),
            "legal" => Ok(PaperSize::Legal),
            "a3" => Ok(PaperSize::A3),
            other => Err(format!("unknown paper size '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl std::str::FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            other => Err(format!("unknown orientation '{other}'")),
        }
    }
}

/// Page margins in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    pub fn uniform(px: f64) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(40.0)
    }
}

/// Widest supported column count.
pub const MAX_COLUMNS: u8 = 3;

/// Immutable per-session page setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageGeometryConfig {
    pub paper_size: PaperSize,
    pub orientation: Orientation,
    #[serde(default)]
    pub margins: Margins,
    /// Supported range is 1–3; 0 is treated as 1 in all arithmetic.
    pub columns: u8,
    /// Gap between adjacent columns in CSS pixels.
    #[serde(default = "default_column_gap")]
    pub column_gap: f64,
}

fn default_column_gap() -> f64 {
    20.0
}

impl Default for PageGeometryConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            orientation: Orientation::Portrait,
            margins: Margins::default(),
            columns: 2,
            column_gap: default_column_gap(),
        }
    }
}

impl PageGeometryConfig {
    /// Column count used for arithmetic (never zero).
    pub fn effective_columns(&self) -> u32 {
        u32::from(self.columns.max(1))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Px,
    Mm,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
}

// ────────────────────────────────────────────────────────────────────────────
// Conversions
// ────────────────────────────────────────────────────────────────────────────

pub fn mm_to_px(mm: f64) -> f64 {
    mm * DPI / MM_PER_INCH
}

pub fn px_to_mm(px: f64) -> f64 {
    px * MM_PER_INCH / DPI
}

pub fn pt_to_px(pt: f64) -> f64 {
    pt * DPI / PT_PER_INCH
}

// ────────────────────────────────────────────────────────────────────────────
// Geometry functions
// ────────────────────────────────────────────────────────────────────────────

/// Paper dimensions in millimetres. Landscape swaps the portrait width and height.
pub fn dimensions_mm(paper_size: PaperSize, orientation: Orientation) -> Dimensions {
    let (w, h) = paper_size.portrait_mm();
    let (width, height) = match orientation {
        Orientation::Portrait => (w, h),
        Orientation::Landscape => (h, w),
    };
    Dimensions {
        width,
        height,
        unit: Unit::Mm,
    }
}

/// Paper dimensions in CSS pixels.
pub fn dimensions(paper_size: PaperSize, orientation: Orientation) -> Dimensions {
    let mm = dimensions_mm(paper_size, orientation);
    Dimensions {
        width: mm_to_px(mm.width),
        height: mm_to_px(mm.height),
        unit: Unit::Px,
    }
}

/// Printable area: page dimensions minus margins, clamped at zero.
pub fn content_area(config: &PageGeometryConfig) -> Dimensions {
    let page = dimensions(config.paper_size, config.orientation);
    let m = &config.margins;
    Dimensions {
        width: (page.width - m.left - m.right).max(0.0),
        height: (page.height - m.top - m.bottom).max(0.0),
        unit: Unit::Px,
    }
}

/// Width of a single column after distributing the gaps.
pub fn column_width(config: &PageGeometryConfig) -> f64 {
    let columns = f64::from(config.effective_columns());
    let area = content_area(config);
    ((area.width - (columns - 1.0) * config.column_gap) / columns).max(0.0)
}

/// CSS custom properties describing the page grid, keyed by property name.
pub fn css_variables(config: &PageGeometryConfig) -> BTreeMap<String, String> {
    let page = dimensions(config.paper_size, config.orientation);
    let area = content_area(config);
    let m = &config.margins;

    BTreeMap::from([
        ("--page-width".to_string(), px(page.width)),
        ("--page-height".to_string(), px(page.height)),
        ("--content-width".to_string(), px(area.width)),
        ("--content-height".to_string(), px(area.height)),
        ("--margin-top".to_string(), px(m.top)),
        ("--margin-right".to_string(), px(m.right)),
        ("--margin-bottom".to_string(), px(m.bottom)),
        ("--margin-left".to_string(), px(m.left)),
        (
            "--column-count".to_string(),
            config.effective_columns().to_string(),
        ),
        ("--column-gap".to_string(), px(config.column_gap)),
        ("--column-width".to_string(), px(column_width(config))),
    ])
}

/// Formats a pixel length with two decimals, dropping trailing zeros.
pub(crate) fn px(value: f64) -> String {
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}px")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_a4_portrait_in_pixels() {
        let d = dimensions(PaperSize::A4, Orientation::Portrait);
        assert_eq!(d.unit, Unit::Px);
        assert!((d.width - 793.7).abs() < 0.1, "A4 width was {}", d.width);
        assert!((d.height - 1122.5).abs() < 0.1, "A4 height was {}", d.height);
    }

    #[test]
    fn test_landscape_swaps_every_size() {
        for size in PaperSize::ALL {
            let p = dimensions(size, Orientation::Portrait);
            let l = dimensions(size, Orientation::Landscape);
            assert!(approx(l.width, p.height), "{size:?} landscape width");
            assert!(approx(l.height, p.width), "{size:?} landscape height");
        }
    }

    #[test]
    fn test_content_area_subtracts_margins() {
        let config = PageGeometryConfig {
            margins: Margins {
                top: 10.0,
                right: 20.0,
                bottom: 30.0,
                left: 40.0,
            },
            ..PageGeometryConfig::default()
        };
        let page = dimensions(PaperSize::A4, Orientation::Portrait);
        let area = content_area(&config);
        assert!(approx(area.width, page.width - 60.0));
        assert!(approx(area.height, page.height - 40.0));
    }

    #[test]
    fn test_content_area_never_negative() {
        let config = PageGeometryConfig {
            margins: Margins::uniform(5000.0),
            ..PageGeometryConfig::default()
        };
        let area = content_area(&config);
        assert_eq!(area.width, 0.0);
        assert_eq!(area.height, 0.0);
        assert_eq!(column_width(&config), 0.0);
    }

    #[test]
    fn test_column_width_accounts_for_gaps() {
        let config = PageGeometryConfig {
            columns: 3,
            column_gap: 15.0,
            ..PageGeometryConfig::default()
        };
        let area = content_area(&config);
        let expected = (area.width - 30.0) / 3.0;
        assert!(approx(column_width(&config), expected));
    }

    #[test]
    fn test_zero_columns_treated_as_one() {
        let config = PageGeometryConfig {
            columns: 0,
            ..PageGeometryConfig::default()
        };
        assert!(approx(column_width(&config), content_area(&config).width));
    }

    #[test]
    fn test_unit_conversions_round_trip_inch() {
        assert!(approx(mm_to_px(25.4), 96.0));
        assert!(approx(px_to_mm(96.0), 25.4));
        assert!(approx(pt_to_px(72.0), 96.0));
    }

    #[test]
    fn test_css_variables_cover_grid() {
        let vars = css_variables(&PageGeometryConfig::default());
        assert_eq!(vars.get("--column-count").map(String::as_str), Some("2"));
        assert_eq!(vars.get("--margin-top").map(String::as_str), Some("40px"));
        assert_eq!(vars.get("--column-gap").map(String::as_str), Some("20px"));
        assert!(vars.contains_key("--column-width"));
        assert!(vars["--page-width"].ends_with("px"));
    }

    #[test]
    fn test_px_formatting() {
        assert_eq!(px(12.0), "12px");
        assert_eq!(px(12.5), "12.5px");
        assert_eq!(px(793.7007), "793.7px");
    }

    #[test]
    fn test_paper_size_from_str() {
        assert_eq!("Letter".parse::<PaperSize>(), Ok(PaperSize::Letter));
        assert!("b5".parse::<PaperSize>().is_err());
        assert_eq!("landscape".parse::<Orientation>(), Ok(Orientation::Landscape));
    }
}
