//! Integration tests: edge list → layout → verify geometry.
//!
//! Exercises the full `vd-core` pipeline: text → Graph → Layout → ShapeBatch.

use pretty_assertions::assert_eq;
use vd_core::layout::{LayoutConfig, grid_layout};
use vd_core::model::*;
use vd_core::parser::parse_edge_list;
use vd_core::{Rect, ShapeId, Template, generate_batch, template_batch};

/// Geometry of a batch with shape ids stripped, for cross-run comparison.
fn geometry(batch: &ShapeBatch) -> Vec<(f64, f64, Option<Rect>, Vec<usize>)> {
    let position = |id: ShapeId| batch.shapes.iter().position(|s| s.id == id).unwrap();
    batch
        .shapes
        .iter()
        .map(|s| {
            let ends = s.bound_ends().into_iter().map(position).collect();
            (s.x, s.y, s.bounds(), ends)
        })
        .collect()
}

// ─── Determinism ─────────────────────────────────────────────────────────

#[test]
fn grid_layout_is_reproducible() {
    let input = "Browser -> Gateway, Gateway -> Auth, Gateway -> Orders, Orders -> Db, Auth -> Db";
    let config = LayoutConfig::default();

    let first = grid_layout(&parse_edge_list(input), &config);
    let second = grid_layout(&parse_edge_list(input), &config);
    assert_eq!(first, second);

    for (a, b) in first.nodes.iter().zip(&second.nodes) {
        assert_eq!(a.rect.x0.to_bits(), b.rect.x0.to_bits());
        assert_eq!(a.rect.y0.to_bits(), b.rect.y0.to_bits());
    }
}

#[test]
fn generated_batches_match_apart_from_ids() {
    let config = LayoutConfig::default();
    let a = generate_batch("A -> B, B -> C, C -> D", &config).unwrap();
    let b = generate_batch("A -> B, B -> C, C -> D", &config).unwrap();
    assert_ne!(a.shapes[0].id, b.shapes[0].id, "ids are freshly allocated");
    assert_eq!(geometry(&a), geometry(&b));
}

#[test]
fn templates_are_reproducible() {
    let config = LayoutConfig::default();
    for template in Template::ALL {
        assert_eq!(
            geometry(&template_batch(template, &config)),
            geometry(&template_batch(template, &config)),
            "{template} differs between runs"
        );
    }
}

// ─── Templates ───────────────────────────────────────────────────────────

#[test]
fn flow_template_has_four_boxes_three_links() {
    let batch = template_batch(Template::Flow, &LayoutConfig::default());
    assert_eq!(batch.boxes().count(), 4);
    assert_eq!(batch.connectors().count(), 3);

    let boxes: Vec<_> = batch.boxes().map(|s| s.id).collect();
    for (i, connector) in batch.connectors().enumerate() {
        assert_eq!(connector.bound_ends().as_slice(), &[boxes[i], boxes[i + 1]]);
    }
}

#[test]
fn mind_map_connectors_all_start_at_center() {
    let batch = template_batch(Template::MindMap, &LayoutConfig::default());
    let boxes: Vec<_> = batch.boxes().map(|s| s.id).collect();
    let center = boxes[0];
    let branches = &boxes[1..];

    assert_eq!(batch.connectors().count(), branches.len());
    for connector in batch.connectors() {
        let ends = connector.bound_ends();
        assert_eq!(ends[0], center);
        assert!(branches.contains(&ends[1]));
    }
}

// ─── Grid ────────────────────────────────────────────────────────────────

#[test]
fn generated_labels_follow_node_order() {
    let batch = generate_batch("Login -> Validate, Validate -> Home", &LayoutConfig::default()).unwrap();
    let labels: Vec<String> = batch
        .labels()
        .map(|s| match &s.kind {
            ShapeKind::Label { text, .. } => text.clone(),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(labels, vec!["Login", "Validate", "Home"]);
}

#[test]
fn duplicate_edges_yield_duplicate_connectors() {
    let batch = generate_batch("A -> B, A -> B", &LayoutConfig::default()).unwrap();
    assert_eq!(batch.boxes().count(), 2);
    assert_eq!(batch.connectors().count(), 2);
}
