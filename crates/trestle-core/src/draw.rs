//! Visual definitions shared by the layout engine and the serializers.
//!
//! - [`StrokeDefinition`] for rails and box outlines
//! - [`TextDefinition`] and the [`TextMeasure`] seam for labels
//! - [`LayeredOutput`] for z-ordered SVG output

mod layer;
mod stroke;
mod text;

pub use layer::{LayeredOutput, RenderLayer, SvgNode};
pub use stroke::{StrokeCap, StrokeDefinition, StrokeJoin};
pub use text::{FontMeasure, GlyphCountMeasure, TextDefinition, TextMeasure};
