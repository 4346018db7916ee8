//! Deterministic diagram layout.
//!
//! Converts a `Graph` into a `Layout`: placed node boxes plus the links
//! between them, with no shape ids attached yet. Layout is a pure function
//! of its input, so the same node order always yields
//! bit-identical geometry. The emitter turns a `Layout` into
//! a `ShapeBatch` afterwards.

use crate::model::{Geo, Graph};
use kurbo::{Point, Rect, Size};

/// How connectors attach to their boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectorMode {
    /// Bind to the boxes' centre anchors; lines follow boxes when moved.
    #[default]
    Bound,
    /// Bake box centres into the connector at creation time.
    Fixed,
}

/// Layout constants. `Default` gives the reference geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Size of every node box in grid and flow layouts.
    pub box_size: Size,
    /// Horizontal distance between grid columns (origin to origin).
    pub gap_x: f64,
    /// Vertical distance between grid rows (origin to origin).
    pub gap_y: f64,
    /// Horizontal distance between flow steps.
    pub flow_gap: f64,
    /// Size of the mind-map centre ellipse.
    pub center_size: Size,
    /// Distance from the mind-map centre to each branch centre.
    pub ring_radius: f64,
    pub connector_mode: ConnectorMode,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            box_size: Size::new(200.0, 80.0),
            gap_x: 260.0,
            gap_y: 220.0,
            flow_gap: 260.0,
            center_size: Size::new(220.0, 100.0),
            ring_radius: 420.0,
            connector_mode: ConnectorMode::Bound,
        }
    }
}

impl LayoutConfig {
    /// Gaps must exceed the box size or neighbouring boxes overlap.
    pub fn is_overlap_free(&self) -> bool {
        self.gap_x > self.box_size.width
            && self.gap_y > self.box_size.height
            && self.flow_gap > self.box_size.width
    }
}

/// A node box with its page-space rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    pub label: String,
    pub geo: Geo,
    pub rect: Rect,
}

/// A directed link between two placed nodes, by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub from: usize,
    pub to: usize,
}

/// Placed nodes and links, ready for emission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub nodes: Vec<PlacedNode>,
    pub links: Vec<Link>,
    /// Node to select once the shapes exist.
    pub focus: Option<usize>,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Centre of node `i`, where connectors attach.
    pub fn center(&self, i: usize) -> Option<Point> {
        self.nodes.get(i).map(|n| n.rect.center())
    }

    pub(crate) fn push_node(&mut self, label: &str, geo: Geo, rect: Rect) -> usize {
        self.nodes.push(PlacedNode {
            label: label.to_string(),
            geo,
            rect,
        });
        self.nodes.len() - 1
    }
}

/// Number of grid columns for `n` nodes: `max(1, ceil(sqrt(n)))`.
///
/// Integer arithmetic keeps perfect squares exact.
pub fn grid_columns(n: usize) -> usize {
    let mut cols = 1;
    while cols * cols < n {
        cols += 1;
    }
    cols
}

/// Top-left corner of grid cell `i`.
pub fn grid_origin(i: usize, cols: usize, config: &LayoutConfig) -> Point {
    let column = i % cols;
    let row = i / cols;
    Point::new(column as f64 * config.gap_x, row as f64 * config.gap_y)
}

/// Lay out a parsed graph on a square-ish grid in node-set order.
///
/// The last node becomes the focus so the user lands on the end of the
/// chain they just typed.
#[must_use]
pub fn grid_layout(graph: &Graph, config: &LayoutConfig) -> Layout {
    let mut layout = Layout::default();
    let count = graph.node_count();
    if count == 0 {
        return layout;
    }

    let cols = grid_columns(count);
    for (i, label) in graph.nodes().enumerate() {
        let origin = grid_origin(i, cols, config);
        layout.push_node(
            label,
            Geo::Rectangle,
            Rect::from_origin_size(origin, config.box_size),
        );
    }

    layout.links = graph
        .edge_positions()
        .map(|(from, to)| Link { from, to })
        .collect();
    layout.focus = Some(count - 1);

    log::debug!(
        "grid layout: {count} nodes in {cols} columns, {} links",
        layout.links.len()
    );
    layout
}
