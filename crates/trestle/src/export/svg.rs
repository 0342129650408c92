//! SVG serialization of rendered documents.
//!
//! Every primitive becomes one SVG element, grouped by [`RenderLayer`] so that
//! rails are never painted over box fills and labels sit on top:
//!
//! | Primitive | Element | Layer |
//! |-----------|---------|-------|
//! | background color | `<rect class="background">` | background |
//! | [`RailPath`] | `<path class="rail">` with relative `h`/`v`/`a` commands | rail |
//! | [`NodeBox`] | `<rect class="terminal">` / `<rect class="nonterminal">` | node |
//! | [`TextLabel`] | `<text>` centered on its position | text |
//! | [`LinkRegion`] | `<a href>` wrapping the node's rect and text | node |
//!
//! Whitespace at the edges of a label is written as character references so
//! that [`read_primitives`] restores it.
//!
//! The svg crate writes attributes in sorted order, so equal documents
//! serialize to identical bytes.

mod read;

pub use read::{ParsedDocument, read_primitives};

use std::{
    collections::HashMap,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, error, info};
use svg::{
    Node as _,
    node::{Blob, element as svg_element},
};

use trestle_core::{
    apply_stroke,
    document::{
        Document, DocumentStyle, LeafKind, LinkRegion, NodeBox, Primitive, RailPath, RailSegment,
        TextLabel,
    },
    draw::{LayeredOutput, RenderLayer, StrokeDefinition},
};

use crate::export;

/// Writes documents to an SVG file.
#[derive(Debug, Clone)]
pub struct Svg {
    path: PathBuf,
}

impl Svg {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes an SVG document to the configured file.
    fn write_document(&self, doc: &svg::Document) -> Result<(), export::Error> {
        info!(path:? = self.path; "Creating SVG file");
        let mut file = match File::create(&self.path) {
            Ok(file) => file,
            Err(err) => {
                error!(path:? = self.path, err:err; "Failed to create SVG file");
                return Err(export::Error::Io(err));
            }
        };

        if let Err(err) = write!(file, "{doc}") {
            error!(path:? = self.path, err:err; "Failed to write SVG content");
            return Err(export::Error::Io(err));
        }

        Ok(())
    }
}

impl export::Exporter for Svg {
    fn export_document(&mut self, document: &Document) -> Result<(), export::Error> {
        let doc = to_svg_document(document);
        debug!("SVG document rendered");

        self.write_document(&doc)
    }
}

/// Converts a rendered document into an SVG document.
pub fn to_svg_document(document: &Document) -> svg::Document {
    let size = document.size();
    let style = document.style();
    let mut output = LayeredOutput::new();

    if let Some(background) = style.background() {
        let rect = svg_element::Rectangle::new()
            .set("class", "background")
            .set("x", 0)
            .set("y", 0)
            .set("width", size.width())
            .set("height", size.height())
            .set("fill", background.to_string())
            .set("fill-opacity", background.alpha());
        output.add_to_layer(RenderLayer::Background, Box::new(rect));
    }

    let primitives = document.primitives();
    let links: HashMap<usize, &LinkRegion> = document
        .links()
        .iter()
        .filter(|link| !link.primitives().is_empty())
        .map(|link| (link.primitives().start, link))
        .collect();
    let mut index = 0;
    while index < primitives.len() {
        if let Some(link) = links.get(&index) {
            let range = link.primitives();
            let anchor = range.clone().filter_map(|i| primitives.get(i)).fold(
                svg_element::Anchor::new().set("href", link.target()),
                |anchor, primitive| anchor.add(primitive_node(primitive, style)),
            );
            output.add_to_layer(RenderLayer::Node, Box::new(anchor));
            index = range.end.max(index + 1);
            continue;
        }

        let primitive = &primitives[index];
        let layer = match primitive {
            Primitive::Rail(_) => RenderLayer::Rail,
            Primitive::Box(_) => RenderLayer::Node,
            Primitive::Text(_) => RenderLayer::Text,
        };
        output.add_to_layer(layer, primitive_node(primitive, style));
        index += 1;
    }

    let doc = svg::Document::new()
        .set(
            "viewBox",
            format!("0 0 {} {}", size.width(), size.height()),
        )
        .set("width", size.width())
        .set("height", size.height());

    output
        .render()
        .into_iter()
        .fold(doc, |doc, group| doc.add(group))
}

/// Serializes a rendered document to SVG text.
pub fn to_string(document: &Document) -> String {
    to_svg_document(document).to_string()
}

/// Serializes a rendered document into `writer`.
///
/// # Errors
///
/// Returns [`export::Error::Io`] if writing fails.
pub fn write_to(document: &Document, mut writer: impl Write) -> Result<(), export::Error> {
    write!(writer, "{}", to_svg_document(document))?;
    Ok(())
}

fn primitive_node(primitive: &Primitive, style: &DocumentStyle) -> Box<dyn svg::Node> {
    match primitive {
        Primitive::Rail(rail) => Box::new(rail_node(rail, style.rail())),
        Primitive::Box(node_box) => Box::new(box_node(node_box, style)),
        Primitive::Text(label) => Box::new(label_node(label, style)),
    }
}

fn rail_node(rail: &RailPath, stroke: &StrokeDefinition) -> svg_element::Path {
    let path = svg_element::Path::new()
        .set("class", "rail")
        .set("d", path_data(rail))
        .set("fill", "none");
    apply_stroke!(path, stroke)
}

/// Path data of a rail: an absolute move followed by relative commands.
fn path_data(rail: &RailPath) -> String {
    let start = rail.start();
    let mut data = format!("M {} {}", start.x(), start.y());
    for segment in rail.segments() {
        match *segment {
            RailSegment::Horizontal(dx) => data.push_str(&format!(" h {dx}")),
            RailSegment::Vertical(dy) => data.push_str(&format!(" v {dy}")),
            RailSegment::Arc {
                radius,
                dx,
                dy,
                clockwise,
            } => data.push_str(&format!(
                " a {radius} {radius} 0 0 {} {dx} {dy}",
                u8::from(clockwise)
            )),
        }
    }
    data
}

fn box_node(node_box: &NodeBox, style: &DocumentStyle) -> svg_element::Rectangle {
    let bounds = node_box.bounds();
    let fill = style.fill_for(node_box.kind());
    let rect = svg_element::Rectangle::new()
        .set("class", kind_class(node_box.kind()))
        .set("x", bounds.min_x())
        .set("y", bounds.min_y())
        .set("width", bounds.width())
        .set("height", bounds.height())
        .set("rx", node_box.corner_radius())
        .set("fill", fill.to_string())
        .set("fill-opacity", fill.alpha());
    apply_stroke!(rect, style.rail())
}

fn label_node(label: &TextLabel, style: &DocumentStyle) -> svg_element::Element {
    let font = style.text_for(label.kind());
    let position = label.position();
    let mut text = svg_element::Element::new("text");
    text.assign("class", kind_class(label.kind()));
    text.assign("x", position.x());
    text.assign("y", position.y());
    text.assign("font-family", font.font_family());
    text.assign("font-size", font.font_size());
    text.assign("text-anchor", "middle");
    text.assign("dominant-baseline", "central");
    text.assign("xml:space", "preserve");

    if let Some(color) = font.color() {
        text.assign("fill", color.to_string());
        text.assign("fill-opacity", color.alpha());
    }
    if font.italic() {
        text.assign("font-style", "italic");
    }
    text.append(Blob::new(escape_label(label.content())));
    text
}

/// Escapes label text for element content.
///
/// Leading and trailing whitespace is written as character references, since
/// XML readers trim text content at element boundaries.
fn escape_label(content: &str) -> String {
    let body_start = content.len() - content.trim_start().len();
    let (leading, rest) = content.split_at(body_start);
    let body = rest.trim_end();
    let trailing = &rest[body.len()..];

    let mut escaped = String::with_capacity(content.len());
    for c in leading.chars() {
        escaped.push_str(&format!("&#x{:X};", u32::from(c)));
    }
    for c in body.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    for c in trailing.chars() {
        escaped.push_str(&format!("&#x{:X};", u32::from(c)));
    }
    escaped
}

pub(super) fn kind_class(kind: LeafKind) -> &'static str {
    match kind {
        LeafKind::Terminal => "terminal",
        LeafKind::NonTerminal => "nonterminal",
        LeafKind::Comment => "comment",
    }
}
