//! Text styling and the text measurement seam used by layout.
//!
//! # Overview
//!
//! - [`TextDefinition`] - Reusable text style configuration (font, size, color)
//! - [`TextMeasure`] - Pluggable width measurement for labels
//! - [`GlyphCountMeasure`] - Deterministic estimate from the glyph count
//! - [`FontMeasure`] - Real shaping through `cosmic-text`
//!
//! Layout never assumes a particular font. Every label width goes through a
//! [`TextMeasure`], so a caller can trade accuracy for determinism.
//!
//! # Quick Start
//!
//! ```
//! # use trestle_core::draw::{GlyphCountMeasure, TextDefinition, TextMeasure};
//! let mut style = TextDefinition::new();
//! style.set_font_family("monospace");
//! style.set_font_size(14);
//!
//! let width = GlyphCountMeasure::default().text_width("SELECT", &style).unwrap();
//! assert!(width > 0.0);
//! ```

use std::{fmt, sync::Mutex};

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Style};
use log::info;

use crate::color::Color;

/// Text style configuration.
///
/// # Examples
///
/// ```
/// # use trestle_core::draw::TextDefinition;
/// # use trestle_core::color::Color;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut style = TextDefinition::new();
/// style.set_font_family("Helvetica");
/// style.set_font_size(12);
/// style.set_color(Some(Color::new("navy")?));
/// style.set_italic(true);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TextDefinition {
    font_family: String,
    font_size: u16,
    color: Option<Color>,
    italic: bool,
}

impl TextDefinition {
    /// Creates a new text definition with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the font size in pixels.
    pub fn set_font_size(&mut self, size: u16) {
        self.font_size = size;
    }

    /// Sets the font family for the text.
    ///
    /// # Arguments
    ///
    /// * `family` - The font family name (e.g., "Arial", "monospace")
    pub fn set_font_family(&mut self, family: &str) {
        self.font_family = family.to_string();
    }

    /// Sets the text color. `None` leaves the renderer's default in place.
    pub fn set_color(&mut self, color: Option<Color>) {
        self.color = color;
    }

    /// Sets whether the text is rendered in italics.
    pub fn set_italic(&mut self, italic: bool) {
        self.italic = italic;
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// Returns a reference to the text color, if set.
    pub fn color(&self) -> Option<&Color> {
        self.color.as_ref()
    }

    pub fn italic(&self) -> bool {
        self.italic
    }
}

impl Default for TextDefinition {
    fn default() -> Self {
        Self {
            font_family: "monospace".to_string(),
            font_size: 14,
            color: None,
            italic: false,
        }
    }
}

/// Measures the rendered width of a single-line label.
///
/// Implementations must be safe to share between threads: independent diagrams
/// may be rendered concurrently against the same measure.
///
/// Returning `Err` (or a non-finite or negative width) makes the enclosing
/// layout call fail with
/// [`DiagramError::UnmeasurableText`](crate::DiagramError::UnmeasurableText).
pub trait TextMeasure: Send + Sync + fmt::Debug {
    /// Returns the width in pixels of `text` rendered with `font`.
    fn text_width(&self, text: &str, font: &TextDefinition) -> Result<f32, String>;
}

/// Width estimate from the glyph count: `chars × font_size × advance_ratio`.
///
/// Fully deterministic and independent of installed fonts. An advance ratio of
/// `0.6` matches common monospace faces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphCountMeasure {
    advance_ratio: f32,
}

impl GlyphCountMeasure {
    /// Creates an estimate with a custom per-glyph advance, relative to the font size.
    pub fn new(advance_ratio: f32) -> Self {
        Self { advance_ratio }
    }
}

impl Default for GlyphCountMeasure {
    fn default() -> Self {
        Self::new(0.6)
    }
}

impl TextMeasure for GlyphCountMeasure {
    fn text_width(&self, text: &str, font: &TextDefinition) -> Result<f32, String> {
        Ok(text.chars().count() as f32 * f32::from(font.font_size()) * self.advance_ratio)
    }
}

/// Shaped text measurement backed by `cosmic-text`.
///
/// Each instance owns its `FontSystem`; loading system fonts is expensive, so
/// build one measure and share it (behind an `Arc`) across renders.
pub struct FontMeasure {
    font_system: Mutex<FontSystem>,
    fallback: GlyphCountMeasure,
}

impl FontMeasure {
    /// Creates a measure with the system font database loaded.
    pub fn new() -> Self {
        info!("Initializing FontSystem");
        Self {
            font_system: Mutex::new(FontSystem::new()),
            fallback: GlyphCountMeasure::default(),
        }
    }
}

impl Default for FontMeasure {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FontMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontMeasure")
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl TextMeasure for FontMeasure {
    fn text_width(&self, text: &str, font: &TextDefinition) -> Result<f32, String> {
        if text.is_empty() {
            return Ok(0.0);
        }

        let mut font_system = self
            .font_system
            .lock()
            .map_err(|err| format!("font system unavailable: {err}"))?;

        let font_size_px = f32::from(font.font_size());
        let metrics = Metrics::new(font_size_px, font_size_px * 1.15);

        let mut buffer = Buffer::new(&mut font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut font_system);

        let mut attrs = Attrs::new().family(Family::Name(font.font_family()));
        if font.italic() {
            attrs = attrs.style(Style::Italic);
        }

        buffer.set_size(None, None);
        buffer.set_text(text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        let width = buffer
            .layout_runs()
            .filter_map(|run| run.glyphs.last().map(|glyph| glyph.x + glyph.w))
            .fold(0.0_f32, f32::max);

        // No usable font for this family: estimate instead of collapsing the box.
        if width <= 0.0 {
            return self.fallback.text_width(text, font);
        }

        Ok(width)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_text_definition_default() {
        let def = TextDefinition::default();
        assert_eq!(def.font_family(), "monospace");
        assert_eq!(def.font_size(), 14);
        assert!(def.color().is_none());
        assert!(!def.italic());
    }

    #[test]
    fn test_text_definition_setters() {
        let mut def = TextDefinition::new();
        def.set_font_family("serif");
        def.set_font_size(20);
        def.set_color(Some(Color::new("red").unwrap()));
        def.set_italic(true);

        assert_eq!(def.font_family(), "serif");
        assert_eq!(def.font_size(), 20);
        assert_eq!(def.color().unwrap().to_string(), "red");
        assert!(def.italic());
    }

    #[test]
    fn test_glyph_count_measure() {
        let measure = GlyphCountMeasure::default();
        let def = TextDefinition::default();

        let width = measure.text_width("SELECT", &def).unwrap();
        assert_approx_eq!(f32, width, 6.0 * 14.0 * 0.6);

        assert_approx_eq!(f32, measure.text_width("", &def).unwrap(), 0.0);
    }

    #[test]
    fn test_glyph_count_measure_counts_chars_not_bytes() {
        let measure = GlyphCountMeasure::new(1.0);
        let mut def = TextDefinition::default();
        def.set_font_size(10);

        assert_approx_eq!(f32, measure.text_width("ε", &def).unwrap(), 10.0);
        assert_approx_eq!(f32, measure.text_width("ab", &def).unwrap(), 20.0);
    }

    #[test]
    fn test_glyph_count_measure_is_deterministic() {
        let measure = GlyphCountMeasure::default();
        let def = TextDefinition::default();
        let a = measure.text_width("column_name", &def).unwrap();
        let b = measure.text_width("column_name", &def).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_font_measure_widths() {
        let measure = FontMeasure::new();
        let def = TextDefinition::default();

        assert_approx_eq!(f32, measure.text_width("", &def).unwrap(), 0.0);

        let short = measure.text_width("a", &def).unwrap();
        let long = measure.text_width("aaaaaaaaaa", &def).unwrap();
        assert!(short > 0.0);
        assert!(long > short);
    }
}
