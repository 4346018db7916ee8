//! Built-in diagram templates.
//!
//! Templates skip parsing: their topology is fixed, and they share the box
//! and link primitives of the grid layout.

use crate::layout::{Layout, LayoutConfig, Link};
use crate::model::Geo;
use kurbo::{Point, Rect, Vec2};
use std::fmt;
use std::str::FromStr;

/// Steps of the flow template, left to right.
pub const FLOW_STEPS: [&str; 4] = ["Start", "Validate", "Save", "Finish"];

/// Label of the mind-map centre node.
pub const MIND_MAP_TOPIC: &str = "Topic";

/// Mind-map branches, placed clockwise from the positive x axis.
pub const MIND_MAP_BRANCHES: [&str; 6] = ["Idea A", "Idea B", "Idea C", "Idea D", "Idea E", "Idea F"];

/// A parameterless diagram seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Horizontal chain of steps.
    Flow,
    /// Centre topic with a ring of branches.
    MindMap,
}

impl Template {
    pub const ALL: [Template; 2] = [Template::Flow, Template::MindMap];

    pub fn name(self) -> &'static str {
        match self {
            Template::Flow => "flow",
            Template::MindMap => "mindmap",
        }
    }

    #[must_use]
    pub fn layout(self, config: &LayoutConfig) -> Layout {
        match self {
            Template::Flow => flow_layout(&FLOW_STEPS, config),
            Template::MindMap => ring_layout(MIND_MAP_TOPIC, &MIND_MAP_BRANCHES, config),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Template {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flow" => Ok(Template::Flow),
            "mindmap" | "mind-map" | "mind_map" => Ok(Template::MindMap),
            other => Err(format!("unknown template '{other}' (expected flow or mindmap)")),
        }
    }
}

/// One row of boxes, each linked to the next.
pub fn flow_layout(steps: &[&str], config: &LayoutConfig) -> Layout {
    let mut layout = Layout::default();
    for (i, step) in steps.iter().enumerate() {
        let origin = Point::new(i as f64 * config.flow_gap, 0.0);
        layout.push_node(
            step,
            Geo::Rectangle,
            Rect::from_origin_size(origin, config.box_size),
        );
    }
    layout.links = (1..steps.len())
        .map(|i| Link { from: i - 1, to: i })
        .collect();
    layout
}

/// A centre ellipse with branches at equal angular steps around it.
///
/// Node 0 is the centre; every link starts there.
pub fn ring_layout(topic: &str, branches: &[&str], config: &LayoutConfig) -> Layout {
    let mut layout = Layout::default();
    let center_rect = Rect::from_origin_size(Point::ORIGIN, config.center_size);
    let center = center_rect.center();
    let hub = layout.push_node(topic, Geo::Ellipse, center_rect);

    if branches.is_empty() {
        return layout;
    }

    let step = 360.0 / branches.len() as f64;
    for (i, branch) in branches.iter().enumerate() {
        let angle = (i as f64 * step).to_radians();
        let offset = Vec2::new(angle.cos(), angle.sin()) * config.ring_radius;
        let rect = Rect::from_center_size(center + offset, config.box_size);
        let idx = layout.push_node(branch, Geo::Rectangle, rect);
        layout.links.push(Link { from: hub, to: idx });
    }
    layout
}
