//! Rendered node and edge records.
//!
//! These are the flat, position-bearing records handed to the presentation
//! layer. They serialize in the camelCase shape a node-link renderer expects.

use serde::{Deserialize, Serialize};

use crate::{color::Color, geometry::Point, geometry::Size, tree::NodeData};

/// Side of a node where edges attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlePosition {
    Left,
    Top,
    Right,
    Bottom,
}

/// Explicit footprint of a node, usually assigned by the layout stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
}

impl NodeStyle {
    pub fn from_size(size: Size) -> Self {
        Self {
            width: Some(size.width()),
            height: Some(size.height()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramNode {
    pub id: String,
    pub data: NodeData,
    #[serde(rename = "type")]
    pub node_type: String,
    pub class_name: String,
    #[serde(default)]
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_position: Option<HandlePosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_position: Option<HandlePosition>,
    /// Measured width reported by the renderer, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// Measured height reported by the renderer, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "NodeStyle::is_empty")]
    pub style: NodeStyle,
}

impl DiagramNode {
    /// Creates a node at the origin with no handles and no footprint.
    pub fn new(
        id: impl Into<String>,
        data: NodeData,
        node_type: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            data,
            node_type: node_type.into(),
            class_name: class_name.into(),
            position: Point::default(),
            source_position: None,
            target_position: None,
            width: None,
            height: None,
            style: NodeStyle::default(),
        }
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.style = NodeStyle::from_size(size);
        self
    }

    /// Resolved footprint: measured size first, then style, then `fallback`.
    /// Zero and non-finite values count as unset.
    pub fn footprint(&self, fallback: Size) -> Size {
        let pick = |values: [Option<f32>; 2], default: f32| {
            values
                .into_iter()
                .flatten()
                .find(|v| v.is_finite() && *v != 0.0)
                .unwrap_or(default)
        };
        Size::new(
            pick([self.width, self.style.width], fallback.width()),
            pick([self.height, self.style.height], fallback.height()),
        )
    }

    /// Center of the node given its top-left position and footprint.
    pub fn center(&self, fallback: Size) -> Point {
        let half = self.footprint(fallback).half();
        self.position
            .add_point(Point::new(half.width(), half.height()))
    }
}

/// Arrowhead shape at an edge end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerKind {
    Arrow,
    ArrowClosed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeMarker {
    #[serde(rename = "type")]
    pub kind: MarkerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl EdgeMarker {
    pub fn arrow_closed(width: f32, height: f32) -> Self {
        Self {
            kind: MarkerKind::ArrowClosed,
            width: Some(width),
            height: Some(height),
            color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke: Color,
    pub stroke_width: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_dasharray: Option<String>,
}

impl EdgeStyle {
    pub fn new(stroke: Color, stroke_width: f32) -> Self {
        Self {
            stroke,
            stroke_width,
            stroke_dasharray: None,
        }
    }

    pub fn dashed(mut self, pattern: impl Into<String>) -> Self {
        self.stroke_dasharray = Some(pattern.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<EdgeStyle>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub animated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_start: Option<EdgeMarker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<EdgeMarker>,
}

impl DiagramEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            edge_type: None,
            style: None,
            animated: false,
            marker_start: None,
            marker_end: None,
        }
    }

    pub fn with_style(mut self, style: Option<EdgeStyle>) -> Self {
        self.style = style;
        self
    }
}
