//! Floating-edge endpoints.
//!
//! An edge drawn between two nodes ends where the straight line between the
//! node centers crosses each node's bounding rectangle, so edges meet node
//! borders whatever size the layout assigned.
//!
//! See <https://math.stackexchange.com/questions/1724792> for the closed form.

use crate::{diagram::DiagramNode, geometry::Point, geometry::Size};

/// Footprint used when a node has neither a measured nor a styled size.
pub const FALLBACK_SIZE: Size = Size::new(150.0, 60.0);

/// Share of the half-extent used when nodes nearly overlap.
const OVERLAP_OFFSET: f32 = 0.8;

/// Endpoints of a floating edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeParams {
    pub source: Point,
    pub target: Point,
}

impl EdgeParams {
    pub fn sx(&self) -> f32 {
        self.source.x()
    }

    pub fn sy(&self) -> f32 {
        self.source.y()
    }

    pub fn tx(&self) -> f32 {
        self.target.x()
    }

    pub fn ty(&self) -> f32 {
        self.target.y()
    }
}

/// Point on the border of `node` facing the center of `other`.
///
/// Both rectangles are given by their top-left corner and size.
pub fn rect_intersection(
    node_position: Point,
    node_size: Size,
    other_position: Point,
    other_size: Size,
) -> Point {
    let half = node_size.half();
    let (w, h) = (half.width(), half.height());
    let center = node_position.add_point(Point::new(w, h));
    let other_half = other_size.half();
    let other_center = other_position.add_point(Point::new(other_half.width(), other_half.height()));

    let delta = other_center.sub_point(center);
    let distance = delta.hypot();
    let reach = w.max(h).max(other_half.width()).max(other_half.height());

    if distance < reach {
        let angle = delta.y().atan2(delta.x());
        return center.add_point(Point::new(
            angle.cos() * w * OVERLAP_OFFSET,
            angle.sin() * h * OVERLAP_OFFSET,
        ));
    }

    let xx1 = delta.x() / (2.0 * w) - delta.y() / (2.0 * h);
    let yy1 = delta.x() / (2.0 * w) + delta.y() / (2.0 * h);
    let denominator = xx1.abs() + yy1.abs();
    if denominator == 0.0 || !denominator.is_finite() {
        return center;
    }

    let a = 1.0 / denominator;
    let xx3 = a * xx1;
    let yy3 = a * yy1;
    Point::new(w * (xx3 + yy3), h * (-xx3 + yy3)).add_point(center)
}

/// Border point of `node` on the line towards `other`.
pub fn node_intersection(node: &DiagramNode, other: &DiagramNode) -> Point {
    rect_intersection(
        node.position,
        node.footprint(FALLBACK_SIZE),
        other.position,
        other.footprint(FALLBACK_SIZE),
    )
}

/// Source and target endpoints of an edge between two nodes.
pub fn edge_params(source: &DiagramNode, target: &DiagramNode) -> EdgeParams {
    EdgeParams {
        source: node_intersection(source, target),
        target: node_intersection(target, source),
    }
}
