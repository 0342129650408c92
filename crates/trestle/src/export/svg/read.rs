//! Reading serialized documents back into primitives.
//!
//! Only the elements written by [`to_svg_document`](super::to_svg_document) are
//! understood. Layer groups are transparent, the background rectangle is
//! skipped and every other element must carry one of the classes the writer
//! assigns.

use std::ops::Range;

use log::trace;
use svg::{
    node::{
        Attributes,
        element::{
            path::{Command, Data, Position},
            tag::Type,
        },
    },
    parser::Event,
};

use trestle_core::{
    document::{
        Document, LeafKind, LinkRegion, NodeBox, Primitive, RailPath, RailSegment, TextLabel,
    },
    geometry::{Bounds, Point, Size},
};

use crate::export::Error;

/// Primitives and link regions recovered from serialized SVG.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    size: Size,
    primitives: Vec<Primitive>,
    links: Vec<LinkRegion>,
}

impl ParsedDocument {
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn links(&self) -> &[LinkRegion] {
        &self.links
    }

    /// Returns true if this holds the same primitives as `document`, in any
    /// order, with every coordinate within `epsilon`.
    ///
    /// The writer groups elements by layer, so element order differs from the
    /// document's primitive order.
    pub fn matches(&self, document: &Document, epsilon: f32) -> bool {
        if !self.size.width().is_finite()
            || (self.size.width() - document.size().width()).abs() > epsilon
            || (self.size.height() - document.size().height()).abs() > epsilon
            || self.primitives.len() != document.primitives().len()
        {
            return false;
        }

        let mut unmatched: Vec<&Primitive> = self.primitives.iter().collect();
        document.primitives().iter().all(|expected| {
            match unmatched
                .iter()
                .position(|candidate| candidate.approx_eq(expected, epsilon))
            {
                Some(found) => {
                    unmatched.swap_remove(found);
                    true
                }
                None => false,
            }
        })
    }
}

/// An `<a>` element whose content is still being read.
struct OpenLink {
    target: String,
    first: usize,
}

/// A `<text>` element whose content is still being read.
struct OpenText {
    position: Point,
    kind: LeafKind,
    content: String,
}

/// Parses SVG produced by this crate back into primitives and links.
///
/// Character references in label text are decoded, so whitespace the writer
/// encodes at the edges of a label is restored.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the input is not well-formed or contains an
/// element the writer never produces, and [`Error::Io`] if the input cannot be
/// read at all.
pub fn read_primitives(content: &str) -> Result<ParsedDocument, Error> {
    let mut size = None;
    let mut primitives = Vec::new();
    let mut links = Vec::new();
    let mut open_link: Option<OpenLink> = None;
    let mut open_text: Option<OpenText> = None;

    for event in svg::read(content)? {
        match event {
            Event::Error(err) => return Err(Error::Parse(err.to_string())),
            Event::Tag("svg", Type::Start, attributes) => {
                size = Some(Size::new(
                    number(&attributes, "width")?,
                    number(&attributes, "height")?,
                ));
            }
            Event::Tag("path", Type::Start | Type::Empty, attributes) => {
                expect_class(&attributes, "rail")?;
                primitives.push(Primitive::Rail(rail(&attributes)?));
            }
            Event::Tag("rect", Type::Start | Type::Empty, attributes) => {
                if class(&attributes)? == "background" {
                    continue;
                }
                primitives.push(Primitive::Box(node_box(&attributes)?));
            }
            Event::Tag("text", Type::Start, attributes) => {
                open_text = Some(OpenText {
                    position: Point::new(number(&attributes, "x")?, number(&attributes, "y")?),
                    kind: leaf_kind(class(&attributes)?)?,
                    content: String::new(),
                });
            }
            Event::Text(text) => {
                if let Some(open) = open_text.as_mut() {
                    open.content.push_str(text);
                }
            }
            Event::Tag("text", Type::End, _) => {
                let open = open_text
                    .take()
                    .ok_or_else(|| Error::Parse("unbalanced `</text>`".to_string()))?;
                let content = unescape(&open.content);
                primitives.push(Primitive::Text(TextLabel::new(
                    open.position,
                    content,
                    open.kind,
                )));
            }
            Event::Tag("a", Type::Start, attributes) => {
                let target = attributes
                    .get("href")
                    .ok_or_else(|| Error::Parse("`<a>` without `href`".to_string()))?;
                open_link = Some(OpenLink {
                    target: unescape(&target.to_string()),
                    first: primitives.len(),
                });
            }
            Event::Tag("a", Type::End, _) => {
                let open = open_link
                    .take()
                    .ok_or_else(|| Error::Parse("unbalanced `</a>`".to_string()))?;
                let range = open.first..primitives.len();
                let bounds = link_bounds(&primitives, range.clone())?;
                links.push(LinkRegion::new(open.target, bounds, range));
            }
            Event::Tag("svg" | "g" | "a" | "text", _, _) => {}
            Event::Tag(name, _, _) => {
                return Err(Error::Parse(format!("unexpected `<{name}>` element")));
            }
            _ => {}
        }
    }

    let size = size.ok_or_else(|| Error::Parse("missing `<svg>` root element".to_string()))?;
    trace!(primitives = primitives.len(), links = links.len(); "Read SVG document");

    Ok(ParsedDocument {
        size,
        primitives,
        links,
    })
}

fn class(attributes: &Attributes) -> Result<String, Error> {
    attributes
        .get("class")
        .map(|value| value.to_string())
        .ok_or_else(|| Error::Parse("element without `class`".to_string()))
}

fn expect_class(attributes: &Attributes, expected: &str) -> Result<(), Error> {
    let found = class(attributes)?;
    if found == expected {
        Ok(())
    } else {
        Err(Error::Parse(format!(
            "expected class `{expected}`, found `{found}`"
        )))
    }
}

fn leaf_kind(class: String) -> Result<LeafKind, Error> {
    match class.as_str() {
        "terminal" => Ok(LeafKind::Terminal),
        "nonterminal" => Ok(LeafKind::NonTerminal),
        "comment" => Ok(LeafKind::Comment),
        other => Err(Error::Parse(format!("unknown element class `{other}`"))),
    }
}

fn number(attributes: &Attributes, name: &str) -> Result<f32, Error> {
    let value = attributes
        .get(name)
        .ok_or_else(|| Error::Parse(format!("missing `{name}` attribute")))?
        .to_string();
    value
        .trim()
        .parse()
        .map_err(|_| Error::Parse(format!("invalid `{name}` value `{value}`")))
}

fn node_box(attributes: &Attributes) -> Result<NodeBox, Error> {
    let kind = leaf_kind(class(attributes)?)?;
    let bounds = Bounds::new_from_top_left(
        Point::new(number(attributes, "x")?, number(attributes, "y")?),
        Size::new(number(attributes, "width")?, number(attributes, "height")?),
    );
    let corner_radius = if attributes.contains_key("rx") {
        number(attributes, "rx")?
    } else {
        0.0
    };
    Ok(NodeBox::new(bounds, corner_radius, kind))
}

fn rail(attributes: &Attributes) -> Result<RailPath, Error> {
    let d = attributes
        .get("d")
        .ok_or_else(|| Error::Parse("rail without path data".to_string()))?
        .to_string();
    let data = Data::parse(&d).map_err(|err| Error::Parse(err.to_string()))?;

    let mut commands = data.iter();
    let mut rail = match commands.next() {
        Some(Command::Move(Position::Absolute, parameters)) if parameters.len() == 2 => {
            RailPath::new(Point::new(parameters[0], parameters[1]))
        }
        _ => {
            return Err(Error::Parse(format!(
                "rail `{d}` does not start with an absolute move"
            )));
        }
    };

    for command in commands {
        match command {
            Command::HorizontalLine(Position::Relative, parameters) => {
                for dx in parameters.iter() {
                    rail.push(RailSegment::Horizontal(*dx));
                }
            }
            Command::VerticalLine(Position::Relative, parameters) => {
                for dy in parameters.iter() {
                    rail.push(RailSegment::Vertical(*dy));
                }
            }
            Command::EllipticalArc(Position::Relative, parameters) if parameters.len() % 7 == 0 => {
                for arc in parameters.chunks(7) {
                    rail.push(RailSegment::arc(arc[0], arc[5], arc[6], arc[4] != 0.0));
                }
            }
            other => {
                return Err(Error::Parse(format!(
                    "unsupported rail command {other:?}"
                )));
            }
        }
    }
    Ok(rail)
}

/// Bounds of the box wrapped by a link.
fn link_bounds(primitives: &[Primitive], range: Range<usize>) -> Result<Bounds, Error> {
    primitives[range]
        .iter()
        .find_map(|primitive| match primitive {
            Primitive::Box(node_box) => Some(node_box.bounds()),
            _ => None,
        })
        .ok_or_else(|| Error::Parse("link without a node box".to_string()))
}

/// Decodes the predefined entities and numeric character references.
///
/// An `&` that does not start a known reference is kept as is.
fn unescape(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        unescaped.push_str(&rest[..start]);
        rest = &rest[start..];
        let reference = rest
            .find(';')
            .and_then(|end| decode_reference(&rest[1..end]).map(|c| (c, end)));
        match reference {
            Some((c, end)) => {
                unescaped.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                unescaped.push('&');
                rest = &rest[1..];
            }
        }
    }
    unescaped.push_str(rest);
    unescaped
}

fn decode_reference(reference: &str) -> Option<char> {
    match reference {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let number = reference.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    const SAMPLE: &str = r##"<svg height="62" viewBox="0 0 120 62" width="120"
xmlns="http://www.w3.org/2000/svg">
<g data-layer="rail">
<path class="rail" d="M 20 31 h 10 a 10 10 0 0 1 10 10 v -4.5" fill="none" stroke="black"/>
</g>
<g data-layer="node">
<a href="Expr.html#expr">
<rect class="nonterminal" height="22" rx="0" width="44" x="40" y="20"/>
<text class="nonterminal" x="62" y="31">
expr
</text>
</a>
</g>
<g data-layer="text">
<text class="comment" x="90" y="31">
a &amp; b
</text>
</g>
</svg>"##;

    #[test]
    fn test_read_sample() {
        let parsed = read_primitives(SAMPLE).unwrap();

        assert_approx_eq!(f32, parsed.size().width(), 120.0);
        assert_approx_eq!(f32, parsed.size().height(), 62.0);
        assert_eq!(parsed.primitives().len(), 4);

        let Primitive::Rail(rail) = &parsed.primitives()[0] else {
            panic!("expected a rail first");
        };
        assert_eq!(
            rail.segments(),
            [
                RailSegment::Horizontal(10.0),
                RailSegment::arc(10.0, 10.0, 10.0, true),
                RailSegment::Vertical(-4.5),
            ]
        );

        let Primitive::Text(comment) = &parsed.primitives()[3] else {
            panic!("expected the comment last");
        };
        assert_eq!(comment.content(), "a & b");
        assert_eq!(comment.kind(), LeafKind::Comment);

        assert_eq!(parsed.links().len(), 1);
        let link = &parsed.links()[0];
        assert_eq!(link.target(), "Expr.html#expr");
        assert_eq!(link.primitives(), 1..3);
        assert_approx_eq!(f32, link.bounds().max_x(), 84.0);
    }

    #[test]
    fn test_rejects_unknown_class() {
        let svg = r#"<svg height="1" width="1">
<rect class="shape" x="0" y="0" width="1" height="1"/>
</svg>"#;
        let err = read_primitives(svg).unwrap_err();
        assert_eq!(err.to_string(), "Parse error: unknown element class `shape`");
    }

    #[test]
    fn test_rejects_absolute_rail_commands() {
        let svg = r#"<svg height="1" width="1"><path class="rail" d="M 0 0 L 10 10"/></svg>"#;
        assert!(matches!(read_primitives(svg), Err(Error::Parse(_))));
    }

    #[test]
    fn test_rejects_missing_root() {
        let err = read_primitives("").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("&lt;a&gt; &amp;lt;"), "<a> &lt;");
        assert_eq!(unescape("&#x20;a&#9;&#XA;"), " a\t\n");
        assert_eq!(unescape("a & b &bogus; &#xZZ;"), "a & b &bogus; &#xZZ;");
    }

    #[test]
    fn test_read_keeps_encoded_edge_whitespace() {
        let svg = r#"<svg height="10" width="10">
<text class="terminal" x="5" y="5" xml:space="preserve">
&#x20;&#x20;
</text>
<text class="comment" x="5" y="5" xml:space="preserve">
&#x20;a  b&#x9;
</text>
</svg>"#;
        let parsed = read_primitives(svg).unwrap();

        let contents: Vec<_> = parsed
            .primitives()
            .iter()
            .filter_map(|primitive| match primitive {
                Primitive::Text(label) => Some(label.content()),
                _ => None,
            })
            .collect();
        assert_eq!(contents, ["  ", " a  b\t"]);
    }
}
