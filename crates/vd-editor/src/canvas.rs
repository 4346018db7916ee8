//! The canvas engine boundary.
//!
//! The drawing surface (shape rendering, selection, undo, camera) belongs to
//! the host. The editor core only needs the handful of operations in
//! [`Canvas`]; everything else about the engine stays opaque.
//!
//! [`MemoryCanvas`] is a headless implementation that keeps shapes as JSON
//! records. It backs the tests and any host without a real drawing surface.

use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;
use vd_core::{Shape, ShapeId, Snapshot};

/// Which store changes a listener wants to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeScope {
    /// Persisted document records (shapes, pages, bindings).
    Document,
    /// Per-session state such as the current selection.
    Session,
    /// Everything.
    All,
}

impl ChangeScope {
    fn accepts(self, change: ChangeScope) -> bool {
        self == ChangeScope::All || self == change
    }
}

/// Callback invoked with a fresh snapshot after each matching change.
pub type ChangeListener = Box<dyn FnMut(Snapshot)>;

/// Handle returned by [`Canvas::listen`]. Dropping it unsubscribes.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// Operations the editor core needs from the host's canvas engine.
pub trait Canvas {
    /// Create shapes in the given order.
    fn create_shapes(&mut self, shapes: &[Shape]);

    /// Replace the selection with a single shape.
    fn select(&mut self, id: ShapeId);

    /// Ids of every shape on the current page.
    fn current_page_shape_ids(&self) -> Vec<ShapeId>;

    /// Register a change listener for `scope`.
    fn listen(&mut self, scope: ChangeScope, listener: ChangeListener) -> Subscription;

    /// Serialize the whole document.
    fn snapshot(&self) -> Snapshot;

    /// Replace the whole document with a snapshot.
    fn load_snapshot(&mut self, snapshot: &Snapshot);
}

// ─── Headless canvas ─────────────────────────────────────────────────────

type ListenerTable = Rc<RefCell<Vec<(u64, ChangeScope, ChangeListener)>>>;

/// In-memory canvas keeping one JSON record per shape.
///
/// Snapshots have the form `{ "shapes": [record, ...] }`.
#[derive(Default)]
pub struct MemoryCanvas {
    records: Vec<Value>,
    selection: Option<ShapeId>,
    listeners: ListenerTable,
    next_listener: u64,
}

impl MemoryCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<ShapeId> {
        self.selection
    }

    /// Raw shape records, in creation order.
    pub fn records(&self) -> &[Value] {
        &self.records
    }

    /// Move a shape by `(dx, dy)`, as a user drag would.
    pub fn nudge(&mut self, id: ShapeId, dx: f64, dy: f64) -> bool {
        let Some(record) = self
            .records
            .iter_mut()
            .find(|r| r["id"].as_str() == Some(id.as_str()))
        else {
            return false;
        };
        for (axis, delta) in [("x", dx), ("y", dy)] {
            let current = record[axis].as_f64().unwrap_or(0.0);
            record[axis] = json!(current + delta);
        }
        self.notify(ChangeScope::Document);
        true
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn notify(&mut self, change: ChangeScope) {
        let snapshot = self.snapshot();
        for (_, scope, listener) in self.listeners.borrow_mut().iter_mut() {
            if scope.accepts(change) {
                listener(snapshot.clone());
            }
        }
    }
}

impl Canvas for MemoryCanvas {
    fn create_shapes(&mut self, shapes: &[Shape]) {
        if shapes.is_empty() {
            return;
        }
        for shape in shapes {
            match serde_json::to_value(shape) {
                Ok(record) => self.records.push(record),
                Err(e) => log::warn!("dropping unserializable shape {}: {e}", shape.id),
            }
        }
        self.notify(ChangeScope::Document);
    }

    fn select(&mut self, id: ShapeId) {
        self.selection = Some(id);
        self.notify(ChangeScope::Session);
    }

    fn current_page_shape_ids(&self) -> Vec<ShapeId> {
        self.records
            .iter()
            .filter_map(|r| r["id"].as_str().map(ShapeId::intern))
            .collect()
    }

    fn listen(&mut self, scope: ChangeScope, listener: ChangeListener) -> Subscription {
        let key = self.next_listener;
        self.next_listener += 1;
        self.listeners.borrow_mut().push((key, scope, listener));

        let table = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(table) = table.upgrade() {
                table.borrow_mut().retain(|(k, _, _)| *k != key);
            }
        })
    }

    fn snapshot(&self) -> Snapshot {
        json!({ "shapes": self.records })
    }

    fn load_snapshot(&mut self, snapshot: &Snapshot) {
        self.records = snapshot["shapes"].as_array().cloned().unwrap_or_default();
        self.selection = None;
        self.notify(ChangeScope::Document);
    }
}
