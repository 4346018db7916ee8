//! Canvas-facing diagram operations: generate, templates, export.

use crate::canvas::Canvas;
use vd_core::lint::{LintSeverity, lint_batch};
use vd_core::{LayoutConfig, ShapeBatch, ShapeId, Template, generate_batch, template_batch};

/// What applying a batch did to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    /// Number of shapes created.
    pub created: usize,
    /// Shape that was selected afterwards, if any.
    pub focus: Option<ShapeId>,
}

/// Create a batch's shapes in one call, then select its focus.
///
/// The focus is only selected if the canvas reports it on the current page.
/// Lint errors are logged; the batch is still handed over unchanged.
pub fn apply_batch<C: Canvas>(canvas: &mut C, batch: &ShapeBatch) -> Applied {
    if batch.is_empty() {
        return Applied {
            created: 0,
            focus: None,
        };
    }

    for diag in lint_batch(batch) {
        match diag.severity {
            LintSeverity::Error => log::error!("[{}] {}: {}", diag.rule, diag.shape_id, diag.message),
            LintSeverity::Warning => log::warn!("[{}] {}: {}", diag.rule, diag.shape_id, diag.message),
        }
    }

    canvas.create_shapes(&batch.shapes);

    let focus = batch.focus.filter(|id| {
        let present = canvas.current_page_shape_ids().contains(id);
        if !present {
            log::warn!("focus shape {id} is not on the current page; leaving selection alone");
        }
        present
    });
    if let Some(id) = focus {
        canvas.select(id);
    }

    Applied {
        created: batch.len(),
        focus,
    }
}

/// Parse `input` as an edge list and draw it on a grid.
///
/// Returns `None` without touching the canvas when the text has no valid
/// `A -> B` pair.
pub fn generate_from_text<C: Canvas>(
    canvas: &mut C,
    input: &str,
    config: &LayoutConfig,
) -> Option<Applied> {
    let batch = generate_batch(input, config)?;
    log::info!(
        "generating {} boxes, {} connectors",
        batch.boxes().count(),
        batch.connectors().count()
    );
    Some(apply_batch(canvas, &batch))
}

/// Draw a built-in template.
pub fn apply_template<C: Canvas>(canvas: &mut C, template: Template, config: &LayoutConfig) -> Applied {
    log::info!("inserting {template} template");
    apply_batch(canvas, &template_batch(template, config))
}

/// Pretty-printed JSON of the canvas snapshot, or `None` when the current
/// page has no shapes.
pub fn export_snapshot_json<C: Canvas>(canvas: &C) -> Option<String> {
    if canvas.current_page_shape_ids().is_empty() {
        return None;
    }
    match serde_json::to_string_pretty(&canvas.snapshot()) {
        Ok(json) => Some(json),
        Err(e) => {
            log::error!("snapshot export failed: {e}");
            None
        }
    }
}
