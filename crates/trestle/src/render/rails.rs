//! Incremental construction of rail paths.

use trestle_core::{
    document::{RailPath, RailSegment},
    geometry::Point,
};

/// Direction of travel along a rail, in SVG coordinates (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Heading {
    East,
    North,
    South,
    West,
}

impl Heading {
    fn vector(self) -> (f32, f32) {
        match self {
            Self::East => (1.0, 0.0),
            Self::North => (0.0, -1.0),
            Self::South => (0.0, 1.0),
            Self::West => (-1.0, 0.0),
        }
    }
}

/// Builds one [`RailPath`] from relative moves.
///
/// Moves of zero length are dropped so that degenerate spacing never shows up
/// as empty segments.
#[derive(Debug)]
pub(crate) struct RailBuilder {
    path: RailPath,
    arc_radius: f32,
}

impl RailBuilder {
    pub fn new(start: Point, arc_radius: f32) -> Self {
        Self {
            path: RailPath::new(start),
            arc_radius,
        }
    }

    pub fn horizontal(mut self, dx: f32) -> Self {
        if dx != 0.0 {
            self.path.push(RailSegment::Horizontal(dx));
        }
        self
    }

    pub fn vertical(mut self, dy: f32) -> Self {
        if dy != 0.0 {
            self.path.push(RailSegment::Vertical(dy));
        }
        self
    }

    /// Quarter turn from heading `from` to heading `to`.
    pub fn turn(mut self, from: Heading, to: Heading) -> Self {
        let (fx, fy) = from.vector();
        let (tx, ty) = to.vector();
        let r = self.arc_radius;
        let clockwise = fx * ty - fy * tx > 0.0;
        self.path
            .push(RailSegment::arc(r, r * (fx + tx), r * (fy + ty), clockwise));
        self
    }

    pub fn finish(self) -> RailPath {
        self.path
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_zero_moves_are_dropped() {
        let rail = RailBuilder::new(Point::new(0.0, 0.0), 10.0)
            .horizontal(0.0)
            .vertical(0.0)
            .finish();
        assert!(rail.is_empty());
    }

    #[test]
    fn test_turn_displacement_and_direction() {
        let up = RailBuilder::new(Point::new(0.0, 0.0), 10.0)
            .turn(Heading::East, Heading::North)
            .finish();
        assert_eq!(up.segments(), [RailSegment::arc(10.0, 10.0, -10.0, false)]);

        let down = RailBuilder::new(Point::new(0.0, 0.0), 10.0)
            .turn(Heading::East, Heading::South)
            .finish();
        assert_eq!(down.segments(), [RailSegment::arc(10.0, 10.0, 10.0, true)]);

        let back = RailBuilder::new(Point::new(0.0, 0.0), 10.0)
            .turn(Heading::West, Heading::South)
            .finish();
        assert_eq!(back.segments(), [RailSegment::arc(10.0, -10.0, 10.0, false)]);
    }

    #[test]
    fn test_detour_returns_to_rail() {
        // Up and over a branch 40 above the rail, then back down
        let rail = RailBuilder::new(Point::new(0.0, 50.0), 10.0)
            .turn(Heading::East, Heading::North)
            .vertical(-20.0)
            .turn(Heading::North, Heading::East)
            .horizontal(30.0)
            .turn(Heading::East, Heading::South)
            .vertical(20.0)
            .turn(Heading::South, Heading::East)
            .finish();

        let end = rail.end();
        assert_approx_eq!(f32, end.x(), 70.0);
        assert_approx_eq!(f32, end.y(), 50.0);
        assert_approx_eq!(f32, rail.bounds().min_y(), 10.0);
    }
}
