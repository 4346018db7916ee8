//! Lint diagnostics for shape batches.
//!
//! Reports structural issues without modifying the batch. A batch that
//! lints clean can be handed to the canvas engine in a single call.

use crate::id::ShapeId;
use crate::model::ShapeBatch;
use std::collections::HashMap;

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// The canvas engine will reject or misdraw this batch.
    Error,
    /// Drawable, but probably not what was intended.
    Warning,
}

/// A single lint diagnostic for a shape.
#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    /// The shape this diagnostic refers to.
    pub shape_id: ShapeId,
    /// Human-readable message.
    pub message: String,
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "dangling-connector").
    pub rule: &'static str,
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run all lint rules over the batch and return diagnostics.
#[must_use]
pub fn lint_batch(batch: &ShapeBatch) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    lint_connector_targets(batch, &mut diags);
    lint_box_overlap(batch, &mut diags);
    lint_focus(batch, &mut diags);
    diags
}

/// `true` if no rule reports an error.
pub fn is_creatable(batch: &ShapeBatch) -> bool {
    lint_batch(batch)
        .iter()
        .all(|d| d.severity != LintSeverity::Error)
}

// ─── Rules ────────────────────────────────────────────────────────────────

/// Every bound end must name a box that appears earlier in the batch.
fn lint_connector_targets(batch: &ShapeBatch, diags: &mut Vec<LintDiagnostic>) {
    let positions: HashMap<ShapeId, (usize, bool)> = batch
        .shapes
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id, (i, s.is_box())))
        .collect();

    for (i, shape) in batch.shapes.iter().enumerate() {
        for target in shape.bound_ends() {
            let (rule, message) = match positions.get(&target) {
                None => ("dangling-connector", format!("binds to unknown shape {target}")),
                Some(&(_, false)) => ("non-box-binding", format!("binds to {target}, which is not a box")),
                Some(&(at, true)) if at > i => (
                    "forward-binding",
                    format!("binds to {target}, which is created after the connector"),
                ),
                Some(_) => continue,
            };
            diags.push(LintDiagnostic {
                shape_id: shape.id,
                message,
                severity: LintSeverity::Error,
                rule,
            });
        }
    }
}

/// Boxes placed on top of each other hide their labels.
fn lint_box_overlap(batch: &ShapeBatch, diags: &mut Vec<LintDiagnostic>) {
    let boxes: Vec<_> = batch
        .shapes
        .iter()
        .filter_map(|s| s.bounds().map(|b| (s.id, b)))
        .collect();

    for (i, (a_id, a)) in boxes.iter().enumerate() {
        for (b_id, b) in &boxes[i + 1..] {
            if a.intersect(*b).area() > 0.0 {
                diags.push(LintDiagnostic {
                    shape_id: *b_id,
                    message: format!("overlaps box {a_id}"),
                    severity: LintSeverity::Warning,
                    rule: "box-overlap",
                });
            }
        }
    }
}

/// The focus shape must be part of the batch.
fn lint_focus(batch: &ShapeBatch, diags: &mut Vec<LintDiagnostic>) {
    if let Some(focus) = batch.focus
        && batch.get(focus).is_none()
    {
        diags.push(LintDiagnostic {
            shape_id: focus,
            message: "focus shape is not in the batch".to_string(),
            severity: LintSeverity::Error,
            rule: "missing-focus",
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::{generate_batch, template_batch};
    use crate::layout::{ConnectorMode, LayoutConfig};
    use crate::model::*;
    use crate::template::Template;

    fn rules(batch: &ShapeBatch) -> Vec<&'static str> {
        lint_batch(batch).into_iter().map(|d| d.rule).collect()
    }

    #[test]
    fn generated_batches_lint_clean() {
        for mode in [ConnectorMode::Bound, ConnectorMode::Fixed] {
            let config = LayoutConfig {
                connector_mode: mode,
                ..LayoutConfig::default()
            };
            let batch = generate_batch("A -> B, B -> C, C -> A, D -> A", &config).unwrap();
            assert!(rules(&batch).is_empty(), "{mode:?}: {:?}", rules(&batch));
            for template in Template::ALL {
                assert!(rules(&template_batch(template, &config)).is_empty());
            }
        }
    }

    #[test]
    fn connector_before_its_box_is_flagged() {
        let mut batch = generate_batch("A -> B", &LayoutConfig::default()).unwrap();
        let connector = batch.shapes.pop().unwrap();
        batch.shapes.insert(0, connector);
        assert_eq!(rules(&batch), vec!["forward-binding", "forward-binding"]);
        assert!(!is_creatable(&batch));
    }

    #[test]
    fn dangling_and_label_bindings_are_flagged() {
        let mut batch = generate_batch("A -> B", &LayoutConfig::default()).unwrap();
        let label_id = batch.shapes[1].id;
        if let ShapeKind::Connector { start, end, .. } = &mut batch.shapes[4].kind {
            *start = Terminal::bound_to(ShapeId::intern("shape:missing"));
            *end = Terminal::bound_to(label_id);
        }
        assert_eq!(rules(&batch), vec!["dangling-connector", "non-box-binding"]);
    }

    #[test]
    fn overlapping_boxes_warn() {
        let config = LayoutConfig {
            gap_x: 50.0,
            ..LayoutConfig::default()
        };
        let batch = generate_batch("A -> B", &config).unwrap();
        let diags = lint_batch(&batch);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].rule, "box-overlap");
        assert_eq!(diags[0].severity, LintSeverity::Warning);
        assert!(is_creatable(&batch));
    }

    #[test]
    fn missing_focus_is_flagged() {
        let mut batch = generate_batch("A -> B", &LayoutConfig::default()).unwrap();
        batch.focus = Some(ShapeId::intern("shape:elsewhere"));
        assert_eq!(rules(&batch), vec!["missing-focus"]);
    }
}
