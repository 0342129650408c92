//! Format-independent rendered diagram.
//!
//! A [`Document`] is the output of rendering: a canvas size, a flat list of
//! absolutely positioned [`Primitive`]s and the hyperlink regions of linked
//! non-terminals. It knows nothing about SVG; serializers walk it.
//!
//! # Overview
//!
//! - [`RailPath`] - A connected polyline of horizontal, vertical and arc segments
//! - [`NodeBox`] - The rectangle of a Terminal or NonTerminal
//! - [`TextLabel`] - A label centered on a point
//! - [`LinkRegion`] - A hyperlink target covering a node's box
//! - [`DocumentStyle`] - The visual style the primitives are drawn with
//!
//! Rail segments are relative moves, so a path is fully described by its
//! start point and segment list:
//!
//! ```
//! # use trestle_core::document::{RailPath, RailSegment};
//! # use trestle_core::geometry::Point;
//! let mut rail = RailPath::new(Point::new(0.0, 10.0));
//! rail.push(RailSegment::Horizontal(20.0));
//! rail.push(RailSegment::arc(10.0, 10.0, -10.0, false));
//! assert_eq!(rail.end(), Point::new(30.0, 0.0));
//! ```

use std::ops::Range;

use crate::{
    color::Color,
    draw::{StrokeDefinition, TextDefinition},
    geometry::{Bounds, Point, Size},
};

/// One relative move along a rail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RailSegment {
    /// Straight horizontal line by `dx`.
    Horizontal(f32),
    /// Straight vertical line by `dy`.
    Vertical(f32),
    /// Quarter-circle arc ending `(dx, dy)` away from the current point.
    Arc {
        radius: f32,
        dx: f32,
        dy: f32,
        clockwise: bool,
    },
}

impl RailSegment {
    /// Creates an arc segment.
    pub fn arc(radius: f32, dx: f32, dy: f32, clockwise: bool) -> Self {
        Self::Arc {
            radius,
            dx,
            dy,
            clockwise,
        }
    }

    /// Returns the displacement of this segment.
    pub fn delta(&self) -> (f32, f32) {
        match *self {
            Self::Horizontal(dx) => (dx, 0.0),
            Self::Vertical(dy) => (0.0, dy),
            Self::Arc { dx, dy, .. } => (dx, dy),
        }
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        let close = |a: f32, b: f32| (a - b).abs() <= epsilon;
        match (self, other) {
            (Self::Horizontal(a), Self::Horizontal(b)) | (Self::Vertical(a), Self::Vertical(b)) => {
                close(*a, *b)
            }
            (
                Self::Arc {
                    radius: r1,
                    dx: x1,
                    dy: y1,
                    clockwise: c1,
                },
                Self::Arc {
                    radius: r2,
                    dx: x2,
                    dy: y2,
                    clockwise: c2,
                },
            ) => close(*r1, *r2) && close(*x1, *x2) && close(*y1, *y2) && c1 == c2,
            _ => false,
        }
    }
}

/// A connected rail starting at an absolute point.
#[derive(Debug, Clone, PartialEq)]
pub struct RailPath {
    start: Point,
    segments: Vec<RailSegment>,
}

impl RailPath {
    /// Creates an empty rail at `start`.
    pub fn new(start: Point) -> Self {
        Self {
            start,
            segments: Vec::new(),
        }
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn segments(&self) -> &[RailSegment] {
        &self.segments
    }

    /// Appends a segment.
    pub fn push(&mut self, segment: RailSegment) {
        self.segments.push(segment);
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the absolute point the rail ends at.
    pub fn end(&self) -> Point {
        self.segments.iter().fold(self.start, |point, segment| {
            let (dx, dy) = segment.delta();
            point.add_point(Point::new(dx, dy))
        })
    }

    /// Returns the bounding box of the rail's corner points.
    ///
    /// Quarter arcs never leave the box spanned by their end points, so this is
    /// the exact extent of the stroke center line.
    pub fn bounds(&self) -> Bounds {
        let mut point = self.start;
        let mut bounds = Bounds::new_from_top_left(point, Size::default());
        for segment in &self.segments {
            let (dx, dy) = segment.delta();
            point = point.add_point(Point::new(dx, dy));
            bounds = bounds.merge(&Bounds::new_from_top_left(point, Size::default()));
        }
        bounds
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.start.approx_eq(other.start, epsilon)
            && self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.approx_eq(b, epsilon))
    }
}

/// Which kind of leaf a box or label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    Terminal,
    NonTerminal,
    Comment,
}

/// The rectangle drawn around a Terminal or NonTerminal label.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBox {
    bounds: Bounds,
    corner_radius: f32,
    kind: LeafKind,
}

impl NodeBox {
    pub fn new(bounds: Bounds, corner_radius: f32, kind: LeafKind) -> Self {
        Self {
            bounds,
            corner_radius,
            kind,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn corner_radius(&self) -> f32 {
        self.corner_radius
    }

    pub fn kind(&self) -> LeafKind {
        self.kind
    }
}

/// A single-line label centered on `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    position: Point,
    content: String,
    kind: LeafKind,
}

impl TextLabel {
    pub fn new(position: Point, content: impl Into<String>, kind: LeafKind) -> Self {
        Self {
            position,
            content: content.into(),
            kind,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn kind(&self) -> LeafKind {
        self.kind
    }
}

/// A drawing primitive in absolute document coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Rail(RailPath),
    Box(NodeBox),
    Text(TextLabel),
}

impl Primitive {
    /// Compares two primitives allowing `epsilon` of drift in every coordinate.
    ///
    /// Text content and kinds must match exactly.
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        match (self, other) {
            (Self::Rail(a), Self::Rail(b)) => a.approx_eq(b, epsilon),
            (Self::Box(a), Self::Box(b)) => {
                a.kind == b.kind
                    && a.bounds.approx_eq(&b.bounds, epsilon)
                    && (a.corner_radius - b.corner_radius).abs() <= epsilon
            }
            (Self::Text(a), Self::Text(b)) => {
                a.kind == b.kind
                    && a.content == b.content
                    && a.position.approx_eq(b.position, epsilon)
            }
            _ => false,
        }
    }
}

/// A hyperlink covering the box of a linked NonTerminal.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRegion {
    target: String,
    bounds: Bounds,
    primitives: Range<usize>,
}

impl LinkRegion {
    /// Creates a link region over `primitives`, indices into the owning
    /// document's primitive list.
    pub fn new(target: impl Into<String>, bounds: Bounds, primitives: Range<usize>) -> Self {
        Self {
            target: target.into(),
            bounds,
            primitives,
        }
    }

    /// The opaque locator the link points at.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Indices of the primitives wrapped by this link.
    pub fn primitives(&self) -> Range<usize> {
        self.primitives.clone()
    }
}

/// Visual style shared by all primitives of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStyle {
    rail: StrokeDefinition,
    label: TextDefinition,
    comment: TextDefinition,
    terminal_fill: Color,
    non_terminal_fill: Color,
    background: Option<Color>,
}

impl DocumentStyle {
    pub fn new(
        rail: StrokeDefinition,
        label: TextDefinition,
        comment: TextDefinition,
        terminal_fill: Color,
        non_terminal_fill: Color,
        background: Option<Color>,
    ) -> Self {
        Self {
            rail,
            label,
            comment,
            terminal_fill,
            non_terminal_fill,
            background,
        }
    }

    /// Stroke used for rails and box outlines.
    pub fn rail(&self) -> &StrokeDefinition {
        &self.rail
    }

    /// Font used for Terminal and NonTerminal labels.
    pub fn label(&self) -> &TextDefinition {
        &self.label
    }

    /// Font used for comments.
    pub fn comment(&self) -> &TextDefinition {
        &self.comment
    }

    /// Returns the text style for labels of `kind`.
    pub fn text_for(&self, kind: LeafKind) -> &TextDefinition {
        match kind {
            LeafKind::Comment => &self.comment,
            LeafKind::Terminal | LeafKind::NonTerminal => &self.label,
        }
    }

    /// Returns the box fill for `kind`.
    pub fn fill_for(&self, kind: LeafKind) -> Color {
        match kind {
            LeafKind::NonTerminal => self.non_terminal_fill,
            LeafKind::Terminal | LeafKind::Comment => self.terminal_fill,
        }
    }

    pub fn background(&self) -> Option<Color> {
        self.background
    }
}

/// A self-contained rendered diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    size: Size,
    style: DocumentStyle,
    primitives: Vec<Primitive>,
    links: Vec<LinkRegion>,
}

impl Document {
    /// Creates an empty document of the given canvas size.
    pub fn new(size: Size, style: DocumentStyle) -> Self {
        Self {
            size,
            style,
            primitives: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// The canvas rectangle, anchored at the origin.
    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_top_left(Point::default(), self.size)
    }

    pub fn style(&self) -> &DocumentStyle {
        &self.style
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn links(&self) -> &[LinkRegion] {
        &self.links
    }

    /// Appends a primitive and returns its index.
    pub fn push(&mut self, primitive: Primitive) -> usize {
        self.primitives.push(primitive);
        self.primitives.len() - 1
    }

    /// Registers a hyperlink region.
    pub fn add_link(&mut self, link: LinkRegion) {
        self.links.push(link);
    }

    /// Iterates over the boxes of every Terminal and NonTerminal.
    pub fn boxes(&self) -> impl Iterator<Item = &NodeBox> {
        self.primitives.iter().filter_map(|primitive| match primitive {
            Primitive::Box(node_box) => Some(node_box),
            _ => None,
        })
    }

    /// Iterates over every label.
    pub fn labels(&self) -> impl Iterator<Item = &TextLabel> {
        self.primitives.iter().filter_map(|primitive| match primitive {
            Primitive::Text(label) => Some(label),
            _ => None,
        })
    }

    /// Iterates over every rail.
    pub fn rails(&self) -> impl Iterator<Item = &RailPath> {
        self.primitives.iter().filter_map(|primitive| match primitive {
            Primitive::Rail(rail) => Some(rail),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn style() -> DocumentStyle {
        DocumentStyle::new(
            StrokeDefinition::default(),
            TextDefinition::default(),
            TextDefinition::default(),
            Color::new("white").unwrap(),
            Color::new("lightgreen").unwrap(),
            None,
        )
    }

    #[test]
    fn test_rail_path_end_and_bounds() {
        let mut rail = RailPath::new(Point::new(10.0, 50.0));
        rail.push(RailSegment::arc(10.0, 10.0, -10.0, false));
        rail.push(RailSegment::Vertical(-20.0));
        rail.push(RailSegment::arc(10.0, 10.0, -10.0, true));
        rail.push(RailSegment::Horizontal(30.0));

        let end = rail.end();
        assert_approx_eq!(f32, end.x(), 60.0);
        assert_approx_eq!(f32, end.y(), 10.0);

        let bounds = rail.bounds();
        assert_approx_eq!(f32, bounds.min_x(), 10.0);
        assert_approx_eq!(f32, bounds.min_y(), 10.0);
        assert_approx_eq!(f32, bounds.max_x(), 60.0);
        assert_approx_eq!(f32, bounds.max_y(), 50.0);
    }

    #[test]
    fn test_empty_rail() {
        let rail = RailPath::new(Point::new(1.0, 2.0));
        assert!(rail.is_empty());
        assert_eq!(rail.end(), Point::new(1.0, 2.0));
    }

    #[test]
    fn test_primitive_approx_eq() {
        let a = Primitive::Text(TextLabel::new(Point::new(1.0, 2.0), "x", LeafKind::Terminal));
        let b = Primitive::Text(TextLabel::new(Point::new(1.0005, 2.0), "x", LeafKind::Terminal));
        let c = Primitive::Text(TextLabel::new(Point::new(1.0, 2.0), "y", LeafKind::Terminal));

        assert!(a.approx_eq(&b, 0.01));
        assert!(!a.approx_eq(&c, 0.01));

        let rail = Primitive::Rail(RailPath::new(Point::new(1.0, 2.0)));
        assert!(!a.approx_eq(&rail, 0.01));
    }

    #[test]
    fn test_document_push_and_links() {
        let mut doc = Document::new(Size::new(100.0, 40.0), style());
        let bounds = Bounds::new_from_top_left(Point::new(10.0, 10.0), Size::new(30.0, 20.0));

        let first = doc.push(Primitive::Box(NodeBox::new(bounds, 0.0, LeafKind::NonTerminal)));
        let second = doc.push(Primitive::Text(TextLabel::new(
            bounds.center(),
            "expr",
            LeafKind::NonTerminal,
        )));
        doc.add_link(LinkRegion::new("#expr", bounds, first..second + 1));

        assert_eq!(doc.primitives().len(), 2);
        assert_eq!(doc.boxes().count(), 1);
        assert_eq!(doc.labels().count(), 1);
        assert_eq!(doc.links().len(), 1);
        assert_eq!(doc.links()[0].primitives(), 0..2);
        assert!(doc.bounds().contains(&bounds));
    }

    #[test]
    fn test_style_lookup_by_kind() {
        let mut comment = TextDefinition::default();
        comment.set_italic(true);
        let style = DocumentStyle::new(
            StrokeDefinition::default(),
            TextDefinition::default(),
            comment,
            Color::new("white").unwrap(),
            Color::new("lightgreen").unwrap(),
            None,
        );

        assert!(style.text_for(LeafKind::Comment).italic());
        assert!(!style.text_for(LeafKind::Terminal).italic());
        assert_eq!(
            style.fill_for(LeafKind::NonTerminal).to_string(),
            Color::new("lightgreen").unwrap().to_string()
        );
    }
}
