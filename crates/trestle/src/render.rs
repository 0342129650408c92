//! Render engine: absolute placement of a measured tree.
//!
//! Placement is a single pre-order walk. Each node is handed the point where
//! its entry rail starts and the width of the slot it must fill; it emits its
//! own primitives and places its children at offsets derived from their
//! [`Geometry`]. A node narrower than its slot is positioned by the configured
//! [`Alignment`](trestle_core::geometry::Alignment) and the spare room is
//! filled with plain rail.
//!
//! The result is a [`Document`]: nothing here knows about SVG.

mod rails;

use log::{debug, trace};

use trestle_core::{
    DiagramError,
    diagram::Node,
    document::{Document, DocumentStyle, LeafKind, LinkRegion, NodeBox, Primitive, TextLabel},
    geometry::{Bounds, Insets, Point, Size},
};

use crate::{
    config::AppConfig,
    error::TrestleError,
    layout::{
        Geometry, LayoutContext, LayoutOptions, Measured, MeasuredKind, branch_distances,
        loop_distance, measure_tree, sequence_geometry, transition_height,
    },
};

use rails::{Heading, RailBuilder};

/// Canvas-level settings for [`render`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    style: DocumentStyle,
    padding: Insets,
    terminators: bool,
}

impl RenderOptions {
    pub fn new(style: DocumentStyle, padding: Insets, terminators: bool) -> Self {
        Self {
            style,
            padding,
            terminators,
        }
    }

    /// Builds render options from the style and layout sections of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TrestleError::Config`] if a configured color cannot be parsed.
    pub fn from_config(config: &AppConfig) -> Result<Self, TrestleError> {
        Ok(Self::new(
            config.style().document_style()?,
            config.style().padding(),
            config.layout().terminators(),
        ))
    }

    pub fn style(&self) -> &DocumentStyle {
        &self.style
    }

    /// Outer margin between the diagram and the canvas edge.
    pub fn padding(&self) -> Insets {
        self.padding
    }

    /// Whether the root is framed by start and end markers.
    pub fn terminators(&self) -> bool {
        self.terminators
    }
}

/// Measures and places `root`, producing a self-contained document.
///
/// Either the whole document is produced or an error is returned; there is no
/// partial output.
///
/// # Errors
///
/// Propagates the [`DiagramError`]s of [`measure`](crate::layout::measure).
pub fn render(
    root: &Node,
    context: &LayoutContext<'_>,
    options: &RenderOptions,
) -> Result<Document, DiagramError> {
    let measured = measure_tree(root, context)?;
    let layout = context.options();
    let ar = layout.arc_radius;
    let connector = layout.connector_length;
    let inner = measured.geometry();

    let terminator = Geometry::new(2.0 * ar, ar, ar, 0.0, false);
    let outer = if options.terminators {
        sequence_geometry(&[terminator, inner, terminator], connector)
    } else {
        inner
    };

    let padding = options.padding;
    let size = Size::new(outer.width(), outer.height()).add_padding(padding);
    let mut painter = Painter::new(Document::new(size, options.style.clone()), layout);

    let x = padding.left();
    let y = padding.top() + outer.up();

    if options.terminators {
        let stub = if inner.needs_space() { connector } else { 0.0 };
        painter.start_marker(x, y);
        let mut x = x + 2.0 * ar;
        painter.horizontal(x, y, stub);
        x += stub;
        painter.place(&measured, x, y, inner.width());
        x += inner.width();
        let y = y + inner.rail_drop();
        painter.horizontal(x, y, stub);
        painter.end_marker(x + stub, y);
    } else {
        painter.place(&measured, x, y, inner.width());
    }

    let document = painter.finish();
    debug!(
        primitives = document.primitives().len(),
        links = document.links().len(),
        width = size.width(),
        height = size.height();
        "Rendered document"
    );
    Ok(document)
}

/// Accumulates the primitives of one document.
struct Painter<'a> {
    document: Document,
    options: &'a LayoutOptions,
}

impl<'a> Painter<'a> {
    fn new(document: Document, options: &'a LayoutOptions) -> Self {
        Self { document, options }
    }

    fn finish(self) -> Document {
        self.document
    }

    fn rail(&self, x: f32, y: f32) -> RailBuilder {
        RailBuilder::new(Point::new(x, y), self.options.arc_radius)
    }

    fn commit(&mut self, rail: RailBuilder) {
        let path = rail.finish();
        if !path.is_empty() {
            self.document.push(Primitive::Rail(path));
        }
    }

    fn horizontal(&mut self, x: f32, y: f32, dx: f32) {
        let rail = self.rail(x, y).horizontal(dx);
        self.commit(rail);
    }

    fn vertical(&mut self, x: f32, y: f32, dy: f32) {
        let rail = self.rail(x, y).vertical(dy);
        self.commit(rail);
    }

    /// Places `node` with its entry rail at `(x, y)` inside a slot `slot` wide.
    fn place(&mut self, node: &Measured<'_>, x: f32, y: f32, slot: f32) {
        let geometry = node.geometry();

        if let MeasuredKind::Skip = node.kind() {
            self.horizontal(x, y, slot.max(geometry.width()));
            return;
        }

        let (left, right) = self.options.alignment.gaps(slot, geometry.width());
        self.horizontal(x, y, left);
        self.horizontal(
            x + left + geometry.width(),
            y + geometry.rail_drop(),
            right,
        );
        self.draw(node, x + left, y);
    }

    fn draw(&mut self, node: &Measured<'_>, x: f32, y: f32) {
        let geometry = node.geometry();
        trace!(x, y, width = geometry.width(); "Placing node");

        match node.kind() {
            MeasuredKind::Leaf { kind, text, link } => {
                self.leaf(geometry, *kind, text, *link, x, y);
            }
            MeasuredKind::Skip => self.horizontal(x, y, geometry.width()),
            MeasuredKind::Sequence(children) => self.sequence(children, x, y),
            MeasuredKind::Stack(rows) => self.stack(geometry, rows, x, y),
            MeasuredKind::Choice { default, branches } => {
                self.choice(geometry, branches, *default, x, y);
            }
            MeasuredKind::Repeat { item, separator } => {
                self.repeat(geometry, item, separator, x, y);
            }
        }
    }

    fn leaf(
        &mut self,
        geometry: Geometry,
        kind: LeafKind,
        text: &str,
        link: Option<&str>,
        x: f32,
        y: f32,
    ) {
        let label = TextLabel::new(Point::new(x + geometry.width() / 2.0, y), text, kind);

        // Comments interrupt the rail and get no outline
        if kind == LeafKind::Comment {
            self.document.push(Primitive::Text(label));
            return;
        }

        let bounds = Bounds::new_from_top_left(
            Point::new(x, y - geometry.up()),
            Size::new(geometry.width(), geometry.up() + geometry.down()),
        );
        let corner_radius = match kind {
            LeafKind::Terminal => self.options.arc_radius,
            LeafKind::NonTerminal | LeafKind::Comment => 0.0,
        };

        let first = self
            .document
            .push(Primitive::Box(NodeBox::new(bounds, corner_radius, kind)));
        let last = self.document.push(Primitive::Text(label));

        if let Some(target) = link {
            trace!(target; "Linked non-terminal");
            self.document
                .add_link(LinkRegion::new(target, bounds, first..last + 1));
        }
    }

    fn sequence(&mut self, children: &[Measured<'_>], mut x: f32, mut y: f32) {
        let connector = self.options.connector_length;
        let last = children.len().saturating_sub(1);

        for (i, child) in children.iter().enumerate() {
            let geometry = child.geometry();
            if geometry.needs_space() && i > 0 {
                self.horizontal(x, y, connector);
                x += connector;
            }
            self.place(child, x, y, geometry.width());
            x += geometry.width();
            y += geometry.rail_drop();
            if geometry.needs_space() && i < last {
                self.horizontal(x, y, connector);
                x += connector;
            }
        }
    }

    fn stack(&mut self, geometry: Geometry, rows: &[Measured<'_>], x: f32, mut y: f32) {
        let ar = self.options.arc_radius;
        let vs = self.options.vertical_separation;
        let connector = self.options.connector_length;
        let multi_row = rows.len() > 1;

        let inner = if multi_row {
            geometry.width() - 2.0 * ar
        } else {
            geometry.width()
        };
        let row_start = if multi_row {
            self.horizontal(x, y, ar);
            x + ar
        } else {
            x
        };

        for (i, row) in rows.iter().enumerate() {
            let row_geometry = row.geometry();
            if row_geometry.needs_space() {
                self.horizontal(row_start, y, connector);
                self.place(row, row_start + connector, y, inner - 2.0 * connector);
                self.horizontal(
                    row_start + inner - connector,
                    y + row_geometry.rail_drop(),
                    connector,
                );
            } else {
                self.place(row, row_start, y, inner);
            }
            y += row_geometry.rail_drop();

            if let Some(next) = rows.get(i + 1) {
                let next_geometry = next.geometry();
                let rail = self
                    .rail(row_start + inner, y)
                    .turn(Heading::East, Heading::South)
                    .vertical((row_geometry.down() + vs - 2.0 * ar).max(0.0))
                    .turn(Heading::South, Heading::West)
                    .horizontal(-inner)
                    .turn(Heading::West, Heading::South)
                    .vertical((next_geometry.up() + vs - 2.0 * ar).max(0.0))
                    .turn(Heading::South, Heading::East);
                self.commit(rail);
                y += transition_height(row_geometry, next_geometry, self.options);
            }
        }

        if multi_row {
            self.horizontal(row_start + inner, y, ar);
        }
    }

    fn choice(
        &mut self,
        geometry: Geometry,
        branches: &[Measured<'_>],
        default: usize,
        x: f32,
        y: f32,
    ) {
        let ar = self.options.arc_radius;
        let inner = geometry.width() - 4.0 * ar;
        let geometries: Vec<Geometry> = branches.iter().map(Measured::geometry).collect();
        let straight = geometries[default];

        // Straight-through branch
        self.horizontal(x, y, 2.0 * ar);
        self.place(&branches[default], x + 2.0 * ar, y, inner);
        self.horizontal(x + 2.0 * ar + inner, y + straight.rail_drop(), 2.0 * ar);

        let distances = branch_distances(&geometries, default, self.options);

        for i in (0..default).rev() {
            let distance = distances[i];
            let item = geometries[i];

            let rail = self
                .rail(x, y)
                .turn(Heading::East, Heading::North)
                .vertical(-(distance - 2.0 * ar))
                .turn(Heading::North, Heading::East);
            self.commit(rail);

            self.place(&branches[i], x + 2.0 * ar, y - distance, inner);

            let rail = self
                .rail(x + 2.0 * ar + inner, y - distance + item.rail_drop())
                .turn(Heading::East, Heading::South)
                .vertical(distance - item.rail_drop() + straight.rail_drop() - 2.0 * ar)
                .turn(Heading::South, Heading::East);
            self.commit(rail);
        }

        for i in default + 1..branches.len() {
            let distance = distances[i];
            let item = geometries[i];

            let rail = self
                .rail(x, y)
                .turn(Heading::East, Heading::South)
                .vertical(distance - 2.0 * ar)
                .turn(Heading::South, Heading::East);
            self.commit(rail);

            self.place(&branches[i], x + 2.0 * ar, y + distance, inner);

            let rail = self
                .rail(x + 2.0 * ar + inner, y + distance + item.rail_drop())
                .turn(Heading::East, Heading::North)
                .vertical(-(distance - 2.0 * ar + item.rail_drop() - straight.rail_drop()))
                .turn(Heading::North, Heading::East);
            self.commit(rail);
        }
    }

    fn repeat(
        &mut self,
        geometry: Geometry,
        item: &Measured<'_>,
        separator: &Measured<'_>,
        x: f32,
        y: f32,
    ) {
        let ar = self.options.arc_radius;
        let inner = geometry.width() - 2.0 * ar;
        let forward = item.geometry();
        let back = separator.geometry();
        let distance = loop_distance(forward, back, self.options);

        self.horizontal(x, y, ar);
        self.place(item, x + ar, y, inner);
        self.horizontal(x + ar + inner, y + forward.rail_drop(), ar);

        let rail = self
            .rail(x + ar, y)
            .turn(Heading::West, Heading::South)
            .vertical(distance - 2.0 * ar)
            .turn(Heading::South, Heading::East);
        self.commit(rail);

        self.place(separator, x + ar, y + distance, inner);

        let rail = self
            .rail(x + ar + inner, y + distance + back.rail_drop())
            .turn(Heading::East, Heading::North)
            .vertical(-(distance - 2.0 * ar + back.rail_drop() - forward.rail_drop()))
            .turn(Heading::North, Heading::West);
        self.commit(rail);
    }

    /// Double bar followed by a stub, entry rail at `(x, y)`.
    fn start_marker(&mut self, x: f32, y: f32) {
        let ar = self.options.arc_radius;
        self.vertical(x, y - ar, 2.0 * ar);
        self.vertical(x + ar, y - ar, 2.0 * ar);
        self.horizontal(x, y, 2.0 * ar);
    }

    /// Stub followed by a double bar, exit rail at `(x, y)`.
    fn end_marker(&mut self, x: f32, y: f32) {
        let ar = self.options.arc_radius;
        self.horizontal(x, y, 2.0 * ar);
        self.vertical(x + ar, y - ar, 2.0 * ar);
        self.vertical(x + 2.0 * ar, y - ar, 2.0 * ar);
    }
}
