//! Per-variant measurement rules.

use log::trace;

use trestle_core::{
    DiagramError,
    diagram::{Choice, Node, Repeat},
    document::LeafKind,
    draw::TextDefinition,
};

use super::{Geometry, LayoutContext, LayoutOptions};

/// Horizontal padding between a box outline and its label, per side.
const LABEL_PADDING: f32 = 10.0;

/// Horizontal room around a comment, per side.
const COMMENT_PADDING: f32 = 5.0;

/// A node together with its geometry and the measured form of its children.
#[derive(Debug, Clone)]
pub(crate) struct Measured<'n> {
    geometry: Geometry,
    kind: MeasuredKind<'n>,
}

#[derive(Debug, Clone)]
pub(crate) enum MeasuredKind<'n> {
    Leaf {
        kind: LeafKind,
        text: &'n str,
        link: Option<&'n str>,
    },
    Skip,
    Sequence(Vec<Measured<'n>>),
    Stack(Vec<Measured<'n>>),
    Choice {
        default: usize,
        branches: Vec<Measured<'n>>,
    },
    Repeat {
        item: Box<Measured<'n>>,
        separator: Box<Measured<'n>>,
    },
}

impl<'n> Measured<'n> {
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn kind(&self) -> &MeasuredKind<'n> {
        &self.kind
    }
}

/// Measures `root` and all of its descendants, children first.
pub(crate) fn measure_tree<'n>(
    root: &'n Node,
    context: &LayoutContext<'_>,
) -> Result<Measured<'n>, DiagramError> {
    let options = context.options();

    let measured = match root {
        Node::Terminal(text) => leaf(context, LeafKind::Terminal, text, None)?,
        Node::NonTerminal(reference) => leaf(
            context,
            LeafKind::NonTerminal,
            reference.text(),
            reference.link(),
        )?,
        Node::Comment(text) => leaf(context, LeafKind::Comment, text, None)?,
        Node::Skip => skip(options),
        Node::Sequence(children) if children.is_empty() => skip(options),
        Node::Stack(rows) if rows.is_empty() => skip(options),
        Node::Sequence(children) => {
            let children = measure_all(children, context)?;
            let geometries: Vec<Geometry> = children.iter().map(Measured::geometry).collect();
            Measured {
                geometry: sequence_geometry(&geometries, options.connector_length),
                kind: MeasuredKind::Sequence(children),
            }
        }
        Node::Stack(rows) => {
            let rows = measure_all(rows, context)?;
            Measured {
                geometry: stack_geometry(&rows, options),
                kind: MeasuredKind::Stack(rows),
            }
        }
        Node::Choice(choice) => return measure_choice(choice, context),
        Node::OneOrMore(repeat) => measure_repeat(repeat, context)?,
    };

    trace!(geometry:? = measured.geometry; "Measured node");
    Ok(measured)
}

fn measure_all<'n>(
    nodes: &'n [Node],
    context: &LayoutContext<'_>,
) -> Result<Vec<Measured<'n>>, DiagramError> {
    nodes.iter().map(|node| measure_tree(node, context)).collect()
}

fn leaf<'n>(
    context: &LayoutContext<'_>,
    kind: LeafKind,
    text: &'n str,
    link: Option<&'n str>,
) -> Result<Measured<'n>, DiagramError> {
    let (font, padding) = match kind {
        LeafKind::Comment => (context.comment_font(), COMMENT_PADDING),
        LeafKind::Terminal | LeafKind::NonTerminal => (context.label_font(), LABEL_PADDING),
    };
    let text_width = context.text_width(text, font)?;
    let half_height = half_height(kind, font);

    Ok(Measured {
        geometry: Geometry::new(text_width + 2.0 * padding, half_height, half_height, 0.0, true),
        kind: MeasuredKind::Leaf { kind, text, link },
    })
}

/// Extent of a leaf above (and below) its rail.
fn half_height(kind: LeafKind, font: &TextDefinition) -> f32 {
    let font_size = f32::from(font.font_size());
    match kind {
        LeafKind::Comment => font_size / 2.0 + 2.0,
        LeafKind::Terminal | LeafKind::NonTerminal => font_size / 2.0 + 4.0,
    }
}

fn skip<'n>(options: &LayoutOptions) -> Measured<'n> {
    Measured {
        geometry: Geometry::new(options.min_stub, 0.0, 0.0, 0.0, false),
        kind: MeasuredKind::Skip,
    }
}

/// Chains geometries on one rail, each child entering where the previous one exits.
///
/// Children that need space get a connector on both sides, except on the
/// outer ends of the chain, which are left to the parent.
pub(crate) fn sequence_geometry(children: &[Geometry], connector: f32) -> Geometry {
    let mut width = 0.0_f32;
    let mut up = 0.0_f32;
    let mut down = 0.0_f32;
    let mut drop = 0.0_f32;

    for child in children {
        width += child.width + if child.needs_space { 2.0 * connector } else { 0.0 };
        up = up.max(child.up - drop);
        drop += child.rail_drop;
        down = (down - child.rail_drop).max(child.down);
    }

    if children.first().is_some_and(|child| child.needs_space) {
        width -= connector;
    }
    if children.last().is_some_and(|child| child.needs_space) {
        width -= connector;
    }

    Geometry::new(width, up, down, drop, false)
}

fn stack_geometry(rows: &[Measured<'_>], options: &LayoutOptions) -> Geometry {
    let mut width = rows
        .iter()
        .map(|row| row_width(row.geometry, options.connector_length))
        .fold(0.0_f32, f32::max);
    if rows.len() > 1 {
        width += 2.0 * options.arc_radius;
    }

    let mut drop = 0.0_f32;
    for (row, next) in rows.iter().zip(rows.iter().skip(1)) {
        drop += row.geometry.rail_drop + transition_height(row.geometry, next.geometry, options);
    }
    let (first, last) = match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => (first.geometry, last.geometry),
        _ => return Geometry::new(options.min_stub, 0.0, 0.0, 0.0, false),
    };
    drop += last.rail_drop;

    Geometry::new(width, first.up, last.down, drop, false)
}

/// Width of a stack row including its connectors.
pub(crate) fn row_width(row: Geometry, connector: f32) -> f32 {
    row.width + if row.needs_space { 2.0 * connector } else { 0.0 }
}

/// Vertical distance from a row's exit rail to the next row's entry rail.
pub(crate) fn transition_height(row: Geometry, next: Geometry, options: &LayoutOptions) -> f32 {
    let two_arcs = 2.0 * options.arc_radius;
    (row.down + options.vertical_separation).max(two_arcs)
        + (next.up + options.vertical_separation).max(two_arcs)
}

fn measure_choice<'n>(
    choice: &'n Choice,
    context: &LayoutContext<'_>,
) -> Result<Measured<'n>, DiagramError> {
    choice.validate()?;

    let options = context.options();
    let default = choice.default_index();
    let mut branches = measure_all(choice.branches(), context)?;

    if branches.len() == 1 {
        trace!("Single-branch choice drawn as its branch");
        return Ok(branches.remove(0));
    }

    let geometries: Vec<Geometry> = branches.iter().map(Measured::geometry).collect();
    let geometry = choice_geometry(&geometries, default, options);
    trace!(geometry:?, default; "Measured choice");

    Ok(Measured {
        geometry,
        kind: MeasuredKind::Choice { default, branches },
    })
}

fn choice_geometry(branches: &[Geometry], default: usize, options: &LayoutOptions) -> Geometry {
    let ar = options.arc_radius;
    let last = branches.len() - 1;
    let straight = branches[default];

    let width = branches.iter().map(|branch| branch.width).fold(0.0_f32, f32::max) + 4.0 * ar;

    let distances = branch_distances(branches, default, options);
    let up = branches[0].up + distances[0];
    let down =
        distances[last] + branches[last].down + branches[last].rail_drop - straight.rail_drop;

    Geometry::new(width, up, down, straight.rail_drop, false)
}

/// Distance of each branch's entry rail from the default branch's entry rail,
/// measured upwards before the default and downwards after it.
///
/// Every branch leaves room for two arcs on both its entry and its return
/// rail, so neither rail doubles back on itself.
pub(crate) fn branch_distances(
    branches: &[Geometry],
    default: usize,
    options: &LayoutOptions,
) -> Vec<f32> {
    let two_arcs = 2.0 * options.arc_radius;
    let straight = branches[default];
    let mut distances = vec![0.0; branches.len()];

    for i in (0..default).rev() {
        let stacked = distances[i + 1] + branch_gap_above(branches, i, default, options);
        distances[i] = stacked.max(two_arcs + branches[i].rail_drop - straight.rail_drop);
    }
    for i in default + 1..branches.len() {
        let stacked = distances[i - 1] + branch_gap_below(branches, i, default, options);
        distances[i] = stacked.max(two_arcs + straight.rail_drop - branches[i].rail_drop);
    }

    distances
}

/// Vertical distance between the entry rails of branch `i` and branch `i + 1`,
/// both above or at the default branch.
fn branch_gap_above(
    branches: &[Geometry],
    i: usize,
    default: usize,
    options: &LayoutOptions,
) -> f32 {
    let arcs = if i + 1 == default {
        2.0 * options.arc_radius
    } else {
        options.arc_radius
    };
    let upper = branches[i];
    let lower = branches[i + 1];
    arcs.max(upper.rail_drop + upper.down + options.vertical_separation + lower.up)
}

/// Vertical distance between the entry rails of branch `i - 1` and branch `i`,
/// both below or at the default branch.
fn branch_gap_below(
    branches: &[Geometry],
    i: usize,
    default: usize,
    options: &LayoutOptions,
) -> f32 {
    let arcs = if i == default + 1 {
        2.0 * options.arc_radius
    } else {
        options.arc_radius
    };
    let upper = branches[i - 1];
    let lower = branches[i];
    arcs.max(upper.rail_drop + upper.down + options.vertical_separation + lower.up)
}

fn measure_repeat<'n>(
    repeat: &'n Repeat,
    context: &LayoutContext<'_>,
) -> Result<Measured<'n>, DiagramError> {
    repeat.validate()?;

    let options = context.options();
    let item = measure_tree(repeat.item(), context)?;
    let separator = match repeat.separator() {
        Some(separator) => measure_tree(separator, context)?,
        None => skip(options),
    };

    let ar = options.arc_radius;
    let forward = item.geometry;
    let back = separator.geometry;

    let width = forward.width.max(back.width) + 2.0 * ar;
    let distance = loop_distance(forward, back, options);
    let down = forward
        .down
        .max(distance - forward.rail_drop + back.rail_drop + back.down);

    Ok(Measured {
        geometry: Geometry::new(width, forward.up, down, forward.rail_drop, false),
        kind: MeasuredKind::Repeat {
            item: Box::new(item),
            separator: Box::new(separator),
        },
    })
}

/// Distance from the forward entry rail down to the loop-back rail.
///
/// The return rail climbs from the separator's exit to the item's exit and
/// needs room for its two arcs.
pub(crate) fn loop_distance(item: Geometry, separator: Geometry, options: &LayoutOptions) -> f32 {
    let two_arcs = 2.0 * options.arc_radius;
    two_arcs
        .max(two_arcs + item.rail_drop - separator.rail_drop)
        .max(item.rail_drop + item.down + options.vertical_separation + separator.up)
}
