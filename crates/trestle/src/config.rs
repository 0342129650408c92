//! Configuration types for Trestle diagram rendering.
//!
//! This module provides configuration structures that control how diagrams
//! are laid out and styled. All types implement [`serde::Deserialize`] with a
//! default for every field, so a configuration file only needs to mention the
//! values it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout and style settings.
//! - [`LayoutConfig`] - Spacing, alignment, terminators and text measurement.
//! - [`StyleConfig`] - Fonts, stroke, corner radius, padding and colors.
//!
//! # Example
//!
//! ```
//! # use trestle::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.style().arc_radius(), 10.0);
//! ```

use serde::Deserialize;

use trestle_core::{
    color::Color,
    document::DocumentStyle,
    draw::{StrokeCap, StrokeDefinition, StrokeJoin, TextDefinition},
    geometry::{Alignment, Insets},
};

use crate::TrestleError;

/// Top-level application configuration combining layout and style settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified layout and style configurations.
    pub fn new(layout: LayoutConfig, style: StyleConfig) -> Self {
        Self { layout, style }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn layout_mut(&mut self) -> &mut LayoutConfig {
        &mut self.layout
    }

    pub fn style_mut(&mut self) -> &mut StyleConfig {
        &mut self.style
    }

    /// Checks every value before any layout work is done.
    ///
    /// # Errors
    ///
    /// Returns [`TrestleError::Config`] naming the first invalid value.
    pub fn validate(&self) -> Result<(), TrestleError> {
        self.layout.validate()?;
        self.style.validate()
    }
}

/// Which [`TextMeasure`](trestle_core::draw::TextMeasure) backs label widths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextMeasureKind {
    /// Deterministic estimate from the glyph count.
    #[default]
    Glyph,
    /// Shaping with the installed system fonts.
    Font,
}

/// Layout configuration section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Minimum vertical gap between stacked branches and rows.
    vertical_separation: f32,

    /// Length of the rail stub on each side of a boxed node in a sequence.
    connector_length: f32,

    /// Width of the rail drawn for an empty path.
    min_stub: f32,

    /// Placement of a narrow item inside a wider slot.
    alignment: Alignment,

    /// Whether the root is framed by start and end markers.
    terminators: bool,

    text_measure: TextMeasureKind,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            vertical_separation: 8.0,
            connector_length: 10.0,
            min_stub: 10.0,
            alignment: Alignment::default(),
            terminators: true,
            text_measure: TextMeasureKind::default(),
        }
    }
}

impl LayoutConfig {
    pub fn vertical_separation(&self) -> f32 {
        self.vertical_separation
    }

    pub fn connector_length(&self) -> f32 {
        self.connector_length
    }

    pub fn min_stub(&self) -> f32 {
        self.min_stub
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn terminators(&self) -> bool {
        self.terminators
    }

    pub fn text_measure(&self) -> TextMeasureKind {
        self.text_measure
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment;
    }

    pub fn set_terminators(&mut self, terminators: bool) {
        self.terminators = terminators;
    }

    pub fn set_text_measure(&mut self, text_measure: TextMeasureKind) {
        self.text_measure = text_measure;
    }

    fn validate(&self) -> Result<(), TrestleError> {
        non_negative("layout.vertical_separation", self.vertical_separation)?;
        non_negative("layout.connector_length", self.connector_length)?;
        positive("layout.min_stub", self.min_stub)
    }
}

/// Visual styling configuration for rendered diagrams.
///
/// Colors are kept as strings until [`StyleConfig::document_style`] parses
/// them, so a bad color is reported as a configuration error rather than a
/// deserialization failure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    font_family: String,

    /// Label font size in pixels; comments use a slightly smaller size.
    font_size: u16,

    /// Rail and box outline thickness.
    stroke_width: f32,

    /// Radius of every rail corner and of Terminal box corners.
    arc_radius: f32,

    /// Outer margin around the diagram.
    padding: f32,

    background_color: Option<String>,
    stroke_color: String,
    text_color: String,
    terminal_fill: String,
    non_terminal_fill: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_family: "monospace".to_string(),
            font_size: 14,
            stroke_width: 3.0,
            arc_radius: 10.0,
            padding: 20.0,
            background_color: None,
            stroke_color: "black".to_string(),
            text_color: "black".to_string(),
            terminal_fill: "hsl(120, 100%, 90%)".to_string(),
            non_terminal_fill: "hsl(120, 100%, 90%)".to_string(),
        }
    }
}

impl StyleConfig {
    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn arc_radius(&self) -> f32 {
        self.arc_radius
    }

    pub fn padding(&self) -> Insets {
        Insets::uniform(self.padding)
    }

    pub fn set_font_family(&mut self, family: impl Into<String>) {
        self.font_family = family.into();
    }

    pub fn set_font_size(&mut self, size: u16) {
        self.font_size = size;
    }

    pub fn set_arc_radius(&mut self, radius: f32) {
        self.arc_radius = radius;
    }

    pub fn set_padding(&mut self, padding: f32) {
        self.padding = padding;
    }

    pub fn set_background_color(&mut self, color: Option<String>) {
        self.background_color = color;
    }

    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_ref()
            .map(|color| Color::new(color))
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }

    /// Font of Terminal and NonTerminal labels.
    pub fn label_text(&self) -> TextDefinition {
        let mut text = TextDefinition::new();
        text.set_font_family(&self.font_family);
        text.set_font_size(self.font_size);
        text
    }

    /// Font of comments: italic, two pixels smaller than labels.
    pub fn comment_text(&self) -> TextDefinition {
        let mut text = self.label_text();
        text.set_font_size(self.font_size.saturating_sub(2).max(1));
        text.set_italic(true);
        text
    }

    /// Builds the style every primitive of a rendered document is drawn with.
    ///
    /// # Errors
    ///
    /// Returns [`TrestleError::Config`] if a color cannot be parsed.
    pub fn document_style(&self) -> Result<DocumentStyle, TrestleError> {
        let text_color = parse_color("style.text_color", &self.text_color)?;

        let mut rail = StrokeDefinition::new(
            parse_color("style.stroke_color", &self.stroke_color)?,
            self.stroke_width,
        );
        rail.set_cap(StrokeCap::Round);
        rail.set_join(StrokeJoin::Round);

        let mut label = self.label_text();
        label.set_color(Some(text_color));
        let mut comment = self.comment_text();
        comment.set_color(Some(text_color));

        Ok(DocumentStyle::new(
            rail,
            label,
            comment,
            parse_color("style.terminal_fill", &self.terminal_fill)?,
            parse_color("style.non_terminal_fill", &self.non_terminal_fill)?,
            self.background_color().map_err(TrestleError::Config)?,
        ))
    }

    fn validate(&self) -> Result<(), TrestleError> {
        if self.font_family.trim().is_empty() {
            return Err(TrestleError::Config(
                "style.font_family must not be empty".to_string(),
            ));
        }
        if self.font_size == 0 {
            return Err(TrestleError::Config(
                "style.font_size must be positive".to_string(),
            ));
        }
        positive("style.stroke_width", self.stroke_width)?;
        positive("style.arc_radius", self.arc_radius)?;
        non_negative("style.padding", self.padding)?;
        self.document_style().map(|_| ())
    }
}

fn parse_color(key: &str, value: &str) -> Result<Color, TrestleError> {
    Color::new(value).map_err(|err| TrestleError::Config(format!("{key}: {err}")))
}

fn positive(key: &str, value: f32) -> Result<(), TrestleError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TrestleError::Config(format!(
            "{key} must be a positive number, got {value}"
        )))
    }
}

fn non_negative(key: &str, value: f32) -> Result<(), TrestleError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TrestleError::Config(format!(
            "{key} must be a non-negative number, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let layout = config.layout();
        assert_approx_eq!(f32, layout.vertical_separation(), 8.0);
        assert_approx_eq!(f32, layout.connector_length(), 10.0);
        assert_approx_eq!(f32, layout.min_stub(), 10.0);
        assert_eq!(layout.alignment(), Alignment::Center);
        assert!(layout.terminators());
        assert_eq!(layout.text_measure(), TextMeasureKind::Glyph);

        let style = config.style();
        assert_eq!(style.font_family(), "monospace");
        assert_eq!(style.font_size(), 14);
        assert_approx_eq!(f32, style.stroke_width(), 3.0);
        assert_approx_eq!(f32, style.arc_radius(), 10.0);
        assert_approx_eq!(f32, style.padding().left(), 20.0);
        assert!(style.background_color().unwrap().is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [layout]
            alignment = "left"
            terminators = false
            text_measure = "font"

            [style]
            font_size = 16
            background_color = "white"
            "#,
        )
        .unwrap();

        assert_eq!(config.layout().alignment(), Alignment::Left);
        assert!(!config.layout().terminators());
        assert_eq!(config.layout().text_measure(), TextMeasureKind::Font);
        assert_approx_eq!(f32, config.layout().vertical_separation(), 8.0);
        assert_eq!(config.style().font_size(), 16);
        assert_eq!(
            config.style().background_color().unwrap().unwrap().to_string(),
            "white"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_color_is_config_error() {
        let config: AppConfig = toml::from_str(
            r#"
            [style]
            terminal_fill = "not-a-color"
            "#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, TrestleError::Config(_)));
        assert!(err.to_string().contains("style.terminal_fill"));
    }

    #[test]
    fn test_invalid_sizes_are_config_errors() {
        let mut style = StyleConfig::default();
        style.set_arc_radius(0.0);
        assert!(matches!(
            AppConfig::new(LayoutConfig::default(), style).validate(),
            Err(TrestleError::Config(_))
        ));

        let mut style = StyleConfig::default();
        style.set_padding(f32::NAN);
        assert!(AppConfig::new(LayoutConfig::default(), style).validate().is_err());

        let mut style = StyleConfig::default();
        style.set_font_size(0);
        assert!(AppConfig::new(LayoutConfig::default(), style).validate().is_err());

        let layout: LayoutConfig = toml::from_str("min_stub = -1.0").unwrap();
        assert!(AppConfig::new(layout, StyleConfig::default()).validate().is_err());
    }

    #[test]
    fn test_comment_text_is_smaller_and_italic() {
        let style = StyleConfig::default();
        let comment = style.comment_text();
        assert_eq!(comment.font_size(), 12);
        assert!(comment.italic());
        assert!(!style.label_text().italic());
    }

    #[test]
    fn test_document_style_colors() {
        let document_style = StyleConfig::default().document_style().unwrap();
        assert_eq!(document_style.rail().color().to_string(), "black");
        assert_approx_eq!(f32, document_style.rail().width(), 3.0);
        assert!(document_style.label().color().is_some());
        assert!(document_style.background().is_none());
    }
}
