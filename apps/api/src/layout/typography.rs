//! Typography profiles and text-height estimation.
//!
//! Height estimation is an intentional approximation: an average glyph is taken as
//! `0.6em` wide, so characters-per-line is `column_width / (font_size × 0.6)`. It does
//! not shape text or break at words; it only has to be good enough to plan a page.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::layout::geometry::px;
use crate::layout::report::{LayoutWarning, Severity, WarningType};

/// Average glyph advance as a fraction of the font size.
pub const AVERAGE_CHAR_WIDTH_EM: f64 = 0.6;
/// Line heights under this value are flagged as cramped.
pub const MIN_LINE_HEIGHT: f64 = 1.1;

pub const DEFAULT_FONT_FAMILY: &str = "Inter, Arial, sans-serif";

// ────────────────────────────────────────────────────────────────────────────
// Size classes and profile
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSize {
    Small,
    Medium,
    Large,
}

impl TextSize {
    /// Largest first; used when searching for the biggest size that fits.
    pub const DESCENDING: [TextSize; 3] = [TextSize::Large, TextSize::Medium, TextSize::Small];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextSize::Small => "small",
            TextSize::Medium => "medium",
            TextSize::Large => "large",
        }
    }
}

impl std::str::FromStr for TextSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(TextSize::Small),
            "medium" => Ok(TextSize::Medium),
            "large" => Ok(TextSize::Large),
            other => Err(format!("unknown text size '{other}'")),
        }
    }
}

/// Base font settings for a layout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypographyProfile {
    pub size_class: TextSize,
    pub line_height: f64,
    pub font_family: String,
    /// Body font size in CSS pixels before the readability floors are applied.
    pub base_font_size: f64,
}

impl TypographyProfile {
    pub fn for_size(size_class: TextSize) -> Self {
        let (base_font_size, line_height) = match size_class {
            TextSize::Small => (8.0, 1.2),
            TextSize::Medium => (10.0, 1.3),
            TextSize::Large => (12.0, 1.4),
        };
        Self {
            size_class,
            line_height,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            base_font_size,
        }
    }

    pub fn font_sizes(&self) -> FontSizeTable {
        font_size_table(self)
    }
}

impl Default for TypographyProfile {
    fn default() -> Self {
        Self::for_size(TextSize::Medium)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font size table
// ────────────────────────────────────────────────────────────────────────────

/// Resolved pixel sizes per element class. Every entry respects its floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontSizeTable {
    pub h1: f64,
    pub h2: f64,
    pub h3: f64,
    pub body: f64,
    pub small: f64,
    pub caption: f64,
}

/// Element classes with their scale ratio and minimum readable size (px).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementClass {
    H1,
    H2,
    H3,
    Body,
    Small,
    Caption,
}

impl ElementClass {
    pub const ALL: [ElementClass; 6] = [
        ElementClass::H1,
        ElementClass::H2,
        ElementClass::H3,
        ElementClass::Body,
        ElementClass::Small,
        ElementClass::Caption,
    ];

    pub fn ratio(&self) -> f64 {
        match self {
            ElementClass::H1 => 1.6,
            ElementClass::H2 => 1.4,
            ElementClass::H3 => 1.2,
            ElementClass::Body => 1.0,
            ElementClass::Small => 0.85,
            ElementClass::Caption => 0.75,
        }
    }

    pub fn floor(&self) -> f64 {
        match self {
            ElementClass::H1 => 14.0,
            ElementClass::H2 => 12.0,
            ElementClass::H3 => 11.0,
            ElementClass::Body => 9.0,
            ElementClass::Small | ElementClass::Caption => 8.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementClass::H1 => "h1",
            ElementClass::H2 => "h2",
            ElementClass::H3 => "h3",
            ElementClass::Body => "body",
            ElementClass::Small => "small",
            ElementClass::Caption => "caption",
        }
    }
}

impl FontSizeTable {
    pub fn get(&self, class: ElementClass) -> f64 {
        match class {
            ElementClass::H1 => self.h1,
            ElementClass::H2 => self.h2,
            ElementClass::H3 => self.h3,
            ElementClass::Body => self.body,
            ElementClass::Small => self.small,
            ElementClass::Caption => self.caption,
        }
    }
}

/// Scales the base size per element class and clamps each result to its floor.
pub fn font_size_table(profile: &TypographyProfile) -> FontSizeTable {
    let base = if profile.base_font_size.is_finite() {
        profile.base_font_size
    } else {
        0.0
    };
    let size = |class: ElementClass| (base * class.ratio()).max(class.floor());
    FontSizeTable {
        h1: size(ElementClass::H1),
        h2: size(ElementClass::H2),
        h3: size(ElementClass::H3),
        body: size(ElementClass::Body),
        small: size(ElementClass::Small),
        caption: size(ElementClass::Caption),
    }
}

/// CSS custom properties for the typography profile.
pub fn css_variables(profile: &TypographyProfile) -> BTreeMap<String, String> {
    let table = font_size_table(profile);
    let mut vars: BTreeMap<String, String> = ElementClass::ALL
        .iter()
        .map(|class| (format!("--font-size-{}", class.as_str()), px(table.get(*class))))
        .collect();
    vars.insert("--base-font-size".to_string(), px(table.body));
    vars.insert("--line-height".to_string(), format!("{}", profile.line_height));
    vars.insert("--font-family".to_string(), profile.font_family.clone());
    vars
}

// ────────────────────────────────────────────────────────────────────────────
// Height estimation
// ────────────────────────────────────────────────────────────────────────────

/// Characters that fit on one line of `column_width` at `font_size`. At least 1.
pub fn chars_per_line(font_size: f64, column_width: f64) -> f64 {
    let glyph = font_size * AVERAGE_CHAR_WIDTH_EM;
    if glyph <= 0.0 || column_width <= 0.0 {
        return 1.0;
    }
    (column_width / glyph).max(1.0)
}

/// Estimated wrapped height of `text`. Empty text still costs one line.
pub fn estimate_text_height(text: &str, font_size: f64, line_height: f64, column_width: f64) -> f64 {
    let length = text.chars().count() as f64;
    let lines = (length / chars_per_line(font_size, column_width)).ceil().max(1.0);
    lines * font_size * line_height
}

/// Average vertical space one body character occupies at this column width.
pub fn height_per_char(profile: &TypographyProfile, column_width: f64) -> f64 {
    let body = font_size_table(profile).body;
    body * profile.line_height / chars_per_line(body, column_width)
}

// ────────────────────────────────────────────────────────────────────────────
// Readability
// ────────────────────────────────────────────────────────────────────────────

/// Checks the profile against the readability floors. Empty when everything is fine.
pub fn validate_readability(profile: &TypographyProfile) -> Vec<LayoutWarning> {
    let mut warnings = Vec::new();
    let body_floor = ElementClass::Body.floor();

    if profile.base_font_size < body_floor {
        warnings.push(LayoutWarning {
            warning_type: WarningType::Readability,
            severity: Severity::Medium,
            message: format!(
                "Body text of {}px is below the {}px minimum; it will be raised to {}px",
                profile.base_font_size, body_floor, body_floor
            ),
            affected_elements: vec!["body".to_string()],
        });
    }

    if profile.line_height < MIN_LINE_HEIGHT {
        warnings.push(LayoutWarning {
            warning_type: WarningType::Readability,
            severity: Severity::Low,
            message: format!(
                "Line height {} is cramped; use at least {MIN_LINE_HEIGHT}",
                profile.line_height
            ),
            affected_elements: vec!["line-height".to_string()],
        });
    }

    let caption_raw = profile.base_font_size * ElementClass::Caption.ratio();
    if caption_raw < ElementClass::Caption.floor() {
        warnings.push(LayoutWarning {
            warning_type: WarningType::Readability,
            severity: Severity::Low,
            message: format!(
                "Captions are held at the {}px floor",
                ElementClass::Caption.floor()
            ),
            affected_elements: vec!["caption".to_string()],
        });
    }

    warnings
}

/// Largest size class whose body text of `content_length` characters fits in
/// `available_height`. Falls back to `Small` when nothing fits.
pub fn suggest_optimal_text_size(
    content_length: usize,
    available_height: f64,
    column_width: f64,
) -> TextSize {
    TextSize::DESCENDING
        .into_iter()
        .find(|size| {
            let profile = TypographyProfile::for_size(*size);
            let body = font_size_table(&profile).body;
            let length = content_length as f64;
            let lines = (length / chars_per_line(body, column_width)).ceil().max(1.0);
            lines * body * profile.line_height <= available_height
        })
        .unwrap_or(TextSize::Small)
}
