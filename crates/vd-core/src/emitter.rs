//! Emitter: Layout → ShapeBatch.
//!
//! Allocates shape ids and writes shapes in creation order: a box and its
//! label per node, then one connector per link. Connectors therefore always
//! come after the boxes they reference.

use crate::id::ShapeId;
use crate::layout::{ConnectorMode, Layout, LayoutConfig};
use crate::model::*;
use crate::parser::parse_edge_list;
use crate::template::Template;

/// Emit a layout as a creation-ordered shape batch.
#[must_use]
pub fn emit_batch(layout: &Layout, mode: ConnectorMode) -> ShapeBatch {
    let mut shapes = Vec::with_capacity(layout.nodes.len() * 2 + layout.links.len());
    let mut box_ids = Vec::with_capacity(layout.nodes.len());

    for node in &layout.nodes {
        let box_id = ShapeId::fresh();
        box_ids.push(box_id);

        shapes.push(Shape {
            id: box_id,
            x: node.rect.x0,
            y: node.rect.y0,
            kind: ShapeKind::Box {
                geo: node.geo,
                w: node.rect.width(),
                h: node.rect.height(),
            },
        });

        let center = node.rect.center();
        shapes.push(Shape {
            id: ShapeId::fresh(),
            x: center.x,
            y: center.y,
            kind: ShapeKind::Label {
                text: node.label.clone(),
                auto_size: true,
                align: TextAlign::Middle,
            },
        });
    }

    for link in &layout.links {
        let (Some(&from_id), Some(&to_id)) = (box_ids.get(link.from), box_ids.get(link.to)) else {
            log::warn!("skipping link {}→{}: node out of range", link.from, link.to);
            continue;
        };
        let (start, end) = match mode {
            ConnectorMode::Bound => (Terminal::bound_to(from_id), Terminal::bound_to(to_id)),
            ConnectorMode::Fixed => {
                let (Some(a), Some(b)) = (layout.center(link.from), layout.center(link.to)) else {
                    continue;
                };
                (Terminal::at(a), Terminal::at(b))
            }
        };
        shapes.push(Shape {
            id: ShapeId::fresh(),
            x: 0.0,
            y: 0.0,
            kind: ShapeKind::Connector {
                start,
                end,
                arrowhead_start: Arrowhead::None,
                arrowhead_end: Arrowhead::Arrow,
            },
        });
    }

    ShapeBatch {
        shapes,
        focus: layout.focus.and_then(|i| box_ids.get(i).copied()),
    }
}

/// Parse an edge list, lay it out on a grid, and emit the batch.
///
/// Returns `None` when the text holds no valid arrow: the caller must not
/// touch the canvas.
#[must_use]
pub fn generate_batch(input: &str, config: &LayoutConfig) -> Option<ShapeBatch> {
    let graph = parse_edge_list(input);
    if graph.is_empty() {
        log::debug!("edge list produced no edges; nothing to generate");
        return None;
    }
    let layout = crate::layout::grid_layout(&graph, config);
    Some(emit_batch(&layout, config.connector_mode))
}

/// Emit the batch for a built-in template.
#[must_use]
pub fn template_batch(template: Template, config: &LayoutConfig) -> ShapeBatch {
    emit_batch(&template.layout(config), config.connector_mode)
}
