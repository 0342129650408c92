//! Layout engine: bottom-up measurement of diagram trees.
//!
//! Every node is reduced to a [`Geometry`]: its width, the extent above its
//! entry rail, the extent below its exit rail, and how far the exit rail sits
//! below the entry rail. A node's geometry is computed from its children's
//! geometry alone, so measurement is a single post-order walk and placement
//! (see [`render`](crate::render)) a single pre-order walk.
//!
//! # Pipeline Position
//!
//! ```text
//! Node tree
//!     ↓ measure (this module)
//! Measured tree
//!     ↓ render
//! Document
//!     ↓ export
//! SVG
//! ```
//!
//! Label widths come from the [`TextMeasure`] of the [`LayoutContext`]; the
//! engine never assumes a font.

mod measure;

pub(crate) use measure::{
    Measured, MeasuredKind, branch_distances, loop_distance, measure_tree, sequence_geometry,
    transition_height,
};

use trestle_core::{
    DiagramError,
    diagram::Node,
    draw::{TextDefinition, TextMeasure},
    geometry::Alignment,
};

use crate::config::AppConfig;

/// Measured extent of a node, relative to its entry rail.
///
/// ```text
///          ┬            ┐
///          │ up         │
/// entry ──►┼────┐       │ height
///          │    │ drop  │
///          │    └──► exit
///          │ down       │
///          ┴            ┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Geometry {
    width: f32,
    up: f32,
    down: f32,
    rail_drop: f32,
    needs_space: bool,
}

impl Geometry {
    pub(crate) fn new(width: f32, up: f32, down: f32, rail_drop: f32, needs_space: bool) -> Self {
        Self {
            width,
            up,
            down,
            rail_drop,
            needs_space,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    /// Extent above the entry rail.
    pub fn up(&self) -> f32 {
        self.up
    }

    /// Extent below the exit rail.
    pub fn down(&self) -> f32 {
        self.down
    }

    /// Vertical distance from the entry rail down to the exit rail.
    pub fn rail_drop(&self) -> f32 {
        self.rail_drop
    }

    /// Total height of the bounding box.
    pub fn height(&self) -> f32 {
        self.up + self.rail_drop + self.down
    }

    /// Offset of the entry rail from the top of the bounding box.
    pub fn entry_offset(&self) -> f32 {
        self.up
    }

    /// Offset of the exit rail from the top of the bounding box.
    pub fn exit_offset(&self) -> f32 {
        self.up + self.rail_drop
    }

    /// Whether a sequence must put connector stubs around this node.
    pub fn needs_space(&self) -> bool {
        self.needs_space
    }
}

/// Spacing rules shared by measurement and placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    /// Radius of every rail turn.
    pub arc_radius: f32,
    /// Minimum gap between vertically adjacent items.
    pub vertical_separation: f32,
    /// Rail stub on each side of a boxed node inside a sequence.
    pub connector_length: f32,
    /// Width of an empty path.
    pub min_stub: f32,
    pub alignment: Alignment,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl LayoutOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            arc_radius: config.style().arc_radius(),
            vertical_separation: config.layout().vertical_separation(),
            connector_length: config.layout().connector_length(),
            min_stub: config.layout().min_stub(),
            alignment: config.layout().alignment(),
        }
    }
}

/// Everything measurement depends on besides the tree itself.
#[derive(Debug, Clone)]
pub struct LayoutContext<'a> {
    options: LayoutOptions,
    label_font: TextDefinition,
    comment_font: TextDefinition,
    text_measure: &'a dyn TextMeasure,
}

impl<'a> LayoutContext<'a> {
    pub fn new(
        options: LayoutOptions,
        label_font: TextDefinition,
        comment_font: TextDefinition,
        text_measure: &'a dyn TextMeasure,
    ) -> Self {
        Self {
            options,
            label_font,
            comment_font,
            text_measure,
        }
    }

    /// Creates a context from the layout and style sections of `config`.
    pub fn from_config(config: &AppConfig, text_measure: &'a dyn TextMeasure) -> Self {
        Self::new(
            LayoutOptions::from_config(config),
            config.style().label_text(),
            config.style().comment_text(),
            text_measure,
        )
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn label_font(&self) -> &TextDefinition {
        &self.label_font
    }

    pub fn comment_font(&self) -> &TextDefinition {
        &self.comment_font
    }

    /// Measures `text`, rejecting failures and unusable widths.
    pub(crate) fn text_width(
        &self,
        text: &str,
        font: &TextDefinition,
    ) -> Result<f32, DiagramError> {
        let width = self
            .text_measure
            .text_width(text, font)
            .map_err(|reason| DiagramError::unmeasurable(text, reason))?;

        if !width.is_finite() || width < 0.0 {
            return Err(DiagramError::unmeasurable(
                text,
                format!("measured width {width} is not a finite non-negative number"),
            ));
        }
        Ok(width)
    }
}

/// Measures a diagram tree.
///
/// This is a pure function of the tree and the context: repeated calls yield
/// identical geometry.
///
/// # Errors
///
/// - [`DiagramError::MalformedDiagram`] if a choice or repetition violates its
///   structural preconditions.
/// - [`DiagramError::UnmeasurableText`] if a label cannot be measured.
pub fn measure(root: &Node, context: &LayoutContext<'_>) -> Result<Geometry, DiagramError> {
    measure_tree(root, context).map(|measured| measured.geometry())
}
