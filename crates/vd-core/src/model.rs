//! Core data model: the abstract diagram graph and the positioned shape
//! batch handed to the canvas engine.
//!
//! The `Graph` is transient: it lives only between parsing and layout.
//! Nodes are unique labels in first-seen order; edges keep input order and
//! may repeat. The `ShapeBatch` is what the canvas engine consumes: boxes and
//! labels first, connectors after the boxes they bind.

use crate::id::ShapeId;
use kurbo::{Point, Rect};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Graph ───────────────────────────────────────────────────────────────

/// Node/edge graph produced by the edge-list parser or a template.
///
/// Backed by a petgraph `DiGraph`, whose node and edge indices follow
/// insertion order, which the layout relies on.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(source, target)` pairs.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut graph = Self::new();
        for (source, target) in edges {
            graph.add_edge(source, target);
        }
        graph
    }

    /// Return the index of `label`, inserting it if unseen.
    pub fn add_node(&mut self, label: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(label) {
            return idx;
        }
        let idx = self.graph.add_node(label.to_string());
        self.index.insert(label.to_string(), idx);
        idx
    }

    /// Append an edge. Duplicates are kept: each produces its own connector.
    pub fn add_edge(&mut self, source: &str, target: &str) {
        let a = self.add_node(source);
        let b = self.add_node(target);
        self.graph.add_edge(a, b, ());
    }

    /// Node labels in first-occurrence order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_indices().map(|idx| self.graph[idx].as_str())
    }

    /// Edges in input order, as node positions into `nodes()`.
    pub fn edge_positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.graph
            .raw_edges()
            .iter()
            .map(|e| (e.source().index(), e.target().index()))
    }

    /// Edges in input order, as label pairs.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.graph.raw_edges().iter().map(|e| {
            (
                self.graph[e.source()].as_str(),
                self.graph[e.target()].as_str(),
            )
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// An empty graph means "nothing to draw".
    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }
}

// ─── Shape props ─────────────────────────────────────────────────────────

/// Geometric outline of a box shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Geo {
    #[default]
    Rectangle,
    Ellipse,
}

/// Connector end decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arrowhead {
    #[default]
    None,
    Arrow,
}

/// Label alignment relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Start,
    #[default]
    Middle,
    End,
}

/// Normalized anchor at the centre of a bound shape.
pub const CENTER_ANCHOR: Point = Point::new(0.5, 0.5);

/// One end of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Terminal {
    /// Live binding to another shape; follows it when it moves.
    Binding {
        #[serde(rename = "boundShapeId")]
        bound_shape_id: ShapeId,
        #[serde(rename = "normalizedAnchor")]
        normalized_anchor: Point,
    },
    /// Page coordinates baked in at creation time.
    Point { x: f64, y: f64 },
}

impl Terminal {
    pub fn bound_to(id: ShapeId) -> Self {
        Terminal::Binding {
            bound_shape_id: id,
            normalized_anchor: CENTER_ANCHOR,
        }
    }

    pub fn at(p: Point) -> Self {
        Terminal::Point { x: p.x, y: p.y }
    }

    /// The shape this end is bound to, if any.
    pub fn bound_shape(&self) -> Option<ShapeId> {
        match self {
            Terminal::Binding { bound_shape_id, .. } => Some(*bound_shape_id),
            Terminal::Point { .. } => None,
        }
    }
}

// ─── Shapes ──────────────────────────────────────────────────────────────

/// What a shape is, serialized as `{ "type": ..., "props": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "props", rename_all = "lowercase")]
pub enum ShapeKind {
    /// A box outlining a node.
    #[serde(rename = "geo")]
    Box { geo: Geo, w: f64, h: f64 },

    /// Auto-sized text centred on the shape position.
    #[serde(rename = "text", rename_all = "camelCase")]
    Label {
        text: String,
        auto_size: bool,
        align: TextAlign,
    },

    /// A line between two boxes.
    #[serde(rename = "arrow", rename_all = "camelCase")]
    Connector {
        start: Terminal,
        end: Terminal,
        arrowhead_start: Arrowhead,
        arrowhead_end: Arrowhead,
    },
}

/// A single shape ready for `createShapes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    pub id: ShapeId,
    pub x: f64,
    pub y: f64,
    #[serde(flatten)]
    pub kind: ShapeKind,
}

impl Shape {
    /// Page-space bounds for boxes; `None` for labels and connectors.
    pub fn bounds(&self) -> Option<Rect> {
        match self.kind {
            ShapeKind::Box { w, h, .. } => {
                Some(Rect::from_origin_size((self.x, self.y), (w, h)))
            }
            _ => None,
        }
    }

    pub fn is_box(&self) -> bool {
        matches!(self.kind, ShapeKind::Box { .. })
    }

    pub fn is_connector(&self) -> bool {
        matches!(self.kind, ShapeKind::Connector { .. })
    }

    /// Bound endpoints of a connector, `(start, end)`.
    pub fn bound_ends(&self) -> SmallVec<[ShapeId; 2]> {
        match &self.kind {
            ShapeKind::Connector { start, end, .. } => {
                start.bound_shape().into_iter().chain(end.bound_shape()).collect()
            }
            _ => SmallVec::new(),
        }
    }
}

/// An ordered shape-creation batch plus the shape to select afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShapeBatch {
    pub shapes: Vec<Shape>,
    pub focus: Option<ShapeId>,
}

impl ShapeBatch {
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn boxes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|s| s.is_box())
    }

    pub fn labels(&self) -> impl Iterator<Item = &Shape> {
        self.shapes
            .iter()
            .filter(|s| matches!(s.kind, ShapeKind::Label { .. }))
    }

    pub fn connectors(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|s| s.is_connector())
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn graph_dedups_nodes_in_first_seen_order() {
        let g = Graph::from_edges([("A", "B"), ("C", "A"), ("B", "D")]);
        assert_eq!(g.nodes().collect::<Vec<_>>(), vec!["A", "B", "C", "D"]);
        assert_eq!(g.edge_positions().collect::<Vec<_>>(), vec![(0, 1), (2, 0), (1, 3)]);
    }

    #[test]
    fn graph_keeps_duplicate_edges() {
        let g = Graph::from_edges([("A", "B"), ("A", "B")]);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn box_serializes_with_props() {
        let shape = Shape {
            id: ShapeId::intern("shape:box"),
            x: 10.0,
            y: 20.0,
            kind: ShapeKind::Box {
                geo: Geo::Rectangle,
                w: 200.0,
                h: 80.0,
            },
        };
        assert_eq!(
            serde_json::to_value(&shape).unwrap(),
            json!({
                "id": "shape:box",
                "x": 10.0,
                "y": 20.0,
                "type": "geo",
                "props": { "geo": "rectangle", "w": 200.0, "h": 80.0 }
            })
        );
    }

    #[test]
    fn bound_connector_serializes_binding() {
        let a = ShapeId::intern("shape:a");
        let shape = Shape {
            id: ShapeId::intern("shape:arrow"),
            x: 0.0,
            y: 0.0,
            kind: ShapeKind::Connector {
                start: Terminal::bound_to(a),
                end: Terminal::at(Point::new(1.0, 2.0)),
                arrowhead_start: Arrowhead::None,
                arrowhead_end: Arrowhead::Arrow,
            },
        };
        let value = serde_json::to_value(&shape).unwrap();
        assert_eq!(value["type"], "arrow");
        assert_eq!(value["props"]["start"]["type"], "binding");
        assert_eq!(value["props"]["start"]["boundShapeId"], "shape:a");
        assert_eq!(value["props"]["end"], json!({ "type": "point", "x": 1.0, "y": 2.0 }));
        assert_eq!(value["props"]["arrowheadEnd"], "arrow");
        assert_eq!(shape.bound_ends().as_slice(), &[a]);
    }
}
