//! WASM bridge for Videtz Draft: exposes diagram generation and the
//! autosave state machine to the browser canvas host.
//!
//! Compiled via `wasm-pack build --target web`. Values cross the boundary
//! as JSON strings. The page owns timers and the network: it polls
//! [`VdAutosave`] with `Date.now()` and reports save outcomes back.

mod host;

pub use host::{CanvasHost, HostCanvas};

use std::cell::RefCell;
use std::ops::Add;
use std::rc::Rc;
use std::time::Duration;
use vd_core::{Document, LayoutConfig, SaveAck, SyncError, Template, generate_batch, template_batch};
use vd_editor::{Autosave, AutosaveConfig, Canvas, ChangeScope, SaveStatus, Subscription};
use vd_editor::{apply_template, export_snapshot_json, generate_from_text};
use wasm_bindgen::prelude::*;

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("vd-wasm panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Clock ───────────────────────────────────────────────────────────────

/// Epoch milliseconds as handed over by JS (`Date.now()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Millis(u64);

impl Millis {
    pub fn from_js(ms: f64) -> Self {
        Millis(if ms.is_finite() && ms > 0.0 { ms as u64 } else { 0 })
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

impl Add<Duration> for Millis {
    type Output = Millis;

    fn add(self, rhs: Duration) -> Millis {
        Millis(self.0.saturating_add(rhs.as_millis() as u64))
    }
}

// ─── Standalone generation (no canvas needed) ────────────────────────────

/// Shape batch JSON for an edge list, or `undefined` if it has no valid
/// `A -> B` pair.
#[wasm_bindgen]
pub fn generate(input: &str) -> Option<String> {
    let batch = generate_batch(input, &LayoutConfig::default())?;
    serde_json::to_string(&batch).ok()
}

/// Shape batch JSON for a built-in template (`"flow"` or `"mindmap"`).
#[wasm_bindgen]
pub fn template(name: &str) -> Result<String, JsError> {
    let template: Template = name.parse().map_err(|e: String| JsError::new(&e))?;
    serde_json::to_string(&template_batch(template, &LayoutConfig::default()))
        .map_err(|e| JsError::new(&e.to_string()))
}

/// Names accepted by [`template`].
#[wasm_bindgen]
pub fn template_names() -> Vec<String> {
    Template::ALL.iter().map(|t| t.name().to_string()).collect()
}

// ─── Canvas operations ───────────────────────────────────────────────────

/// Draw an edge list on the host canvas. Returns `false` (and leaves the
/// canvas alone) when the text has no valid pair.
#[wasm_bindgen(js_name = generateOnCanvas)]
pub fn generate_on_canvas(host: &CanvasHost, input: &str) -> bool {
    console_error_panic_hook_setup();
    generate_from_text(&mut HostCanvas::new(host), input, &LayoutConfig::default()).is_some()
}

/// Insert a built-in template on the host canvas.
#[wasm_bindgen(js_name = insertTemplate)]
pub fn insert_template(host: &CanvasHost, name: &str) -> Result<(), JsError> {
    let template: Template = name.parse().map_err(|e: String| JsError::new(&e))?;
    apply_template(&mut HostCanvas::new(host), template, &LayoutConfig::default());
    Ok(())
}

/// Pretty snapshot JSON, or `undefined` when the page has no shapes.
#[wasm_bindgen(js_name = exportSnapshot)]
pub fn export_snapshot(host: &CanvasHost) -> Option<String> {
    export_snapshot_json(&HostCanvas::new(host))
}

// ─── Autosave ────────────────────────────────────────────────────────────

/// Autosave state for one document, driven by the page.
///
/// Typical loop: `mount(host, stored)` once, then on each tick call
/// `poll(Date.now())`; if it returns a document, send it to the server and
/// report the result with `completeOk` / `completeErr`.
#[wasm_bindgen]
pub struct VdAutosave {
    state: Rc<RefCell<Autosave<Millis>>>,
    subscription: Option<Subscription>,
    loaded: bool,
    /// Reads the page clock for changes arriving through the host listener.
    clock: fn() -> f64,
}

#[wasm_bindgen]
impl VdAutosave {
    #[wasm_bindgen(constructor)]
    pub fn new(document_id: Option<String>, quiet_ms: Option<f64>) -> Self {
        console_error_panic_hook_setup();
        let mut config = AutosaveConfig::default();
        if let Some(id) = document_id.filter(|id| !id.is_empty()) {
            config.document_id = id;
        }
        if let Some(ms) = quiet_ms.filter(|ms| ms.is_finite() && *ms >= 0.0) {
            config.quiet_window = Duration::from_millis(ms as u64);
        }
        Self {
            state: Rc::new(RefCell::new(Autosave::new(&config))),
            subscription: None,
            loaded: false,
            clock: js_sys::Date::now,
        }
    }

    #[wasm_bindgen(getter, js_name = documentId)]
    pub fn document_id(&self) -> String {
        self.state.borrow().document_id().to_string()
    }

    /// `"idle"`, `"saving"` or `"error"`.
    pub fn status(&self) -> String {
        self.state.borrow().status().to_string()
    }

    /// Install the stored document (JSON `{ id, store, updatedAt }`, or
    /// `undefined` if there is none), then subscribe to the host's document
    /// changes. The document is installed on the first call only; later
    /// calls just replace the subscription. Returns whether a snapshot was
    /// installed.
    pub fn mount(&mut self, host: &CanvasHost, document_json: Option<String>) -> Result<bool, JsError> {
        let stored: Option<Document> = document_json
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(self.mount_on(&mut HostCanvas::new(host), stored))
    }

    /// Drop the host subscription.
    pub fn detach(&mut self) {
        self.subscription = None;
    }

    /// Feed a change by hand instead of through `mount`.
    #[wasm_bindgen(js_name = onMutation)]
    pub fn on_mutation(&mut self, snapshot_json: &str, now_ms: f64) -> Result<(), JsError> {
        let snapshot = serde_json::from_str(snapshot_json).map_err(|e| JsError::new(&e.to_string()))?;
        self.state.borrow_mut().on_mutation(snapshot, Millis::from_js(now_ms));
        Ok(())
    }

    /// Manual save: make the pending (or last failed) snapshot due now.
    #[wasm_bindgen(js_name = requestSave)]
    pub fn request_save(&mut self, now_ms: f64) -> bool {
        self.state.borrow_mut().request_save(Millis::from_js(now_ms))
    }

    /// Epoch ms at which `poll` will next return a document.
    pub fn deadline(&self) -> Option<f64> {
        self.state.borrow().deadline().map(Millis::as_f64)
    }

    /// Document JSON to save now, if one is due.
    pub fn poll(&mut self, now_ms: f64) -> Option<String> {
        let doc = self
            .state
            .borrow_mut()
            .poll(Millis::from_js(now_ms), now_ms as i64)?;
        self.hand_off(serde_json::to_string(&doc))
    }

    /// Document JSON for any pending snapshot, ignoring the quiet window.
    pub fn flush(&mut self, now_ms: f64) -> Option<String> {
        let doc = self.state.borrow_mut().flush(now_ms as i64)?;
        self.hand_off(serde_json::to_string(&doc))
    }

    #[wasm_bindgen(js_name = completeOk)]
    pub fn complete_ok(&mut self, updated_at: f64) -> String {
        let ack = SaveAck {
            ok: true,
            updated_at: updated_at as i64,
        };
        self.complete(Ok(ack))
    }

    #[wasm_bindgen(js_name = completeErr)]
    pub fn complete_err(&mut self, message: &str) -> String {
        self.complete(Err(SyncError::Transport(message.to_string())))
    }
}

impl VdAutosave {
    /// Install `stored` into `canvas` (first call only), then listen.
    ///
    /// The snapshot goes in before the listener so the restore itself is
    /// never queued as an edit.
    fn mount_on<C: Canvas>(&mut self, canvas: &mut C, stored: Option<Document>) -> bool {
        self.subscription = None;
        let installed = if self.loaded {
            false
        } else {
            self.loaded = true;
            match stored.and_then(|doc| doc.store) {
                Some(snapshot) => {
                    canvas.load_snapshot(&snapshot);
                    true
                }
                None => false,
            }
        };

        let state = Rc::clone(&self.state);
        let clock = self.clock;
        self.subscription = Some(canvas.listen(
            ChangeScope::Document,
            Box::new(move |snapshot| {
                state.borrow_mut().on_mutation(snapshot, Millis::from_js(clock()));
            }),
        ));
        installed
    }

    /// Pass an encoded save to the page. A save that cannot be encoded is
    /// completed as failed so the in-flight slot is released.
    fn hand_off(&mut self, encoded: serde_json::Result<String>) -> Option<String> {
        match encoded {
            Ok(json) => Some(json),
            Err(e) => {
                self.complete(Err(SyncError::Transport(format!("cannot encode document: {e}"))));
                None
            }
        }
    }

    fn complete(&mut self, outcome: Result<SaveAck, SyncError>) -> String {
        let status: SaveStatus = self.state.borrow_mut().complete(&outcome);
        status.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use vd_editor::MemoryCanvas;

    fn page_clock() -> f64 {
        1_000.0
    }

    fn autosave() -> VdAutosave {
        let mut autosave = VdAutosave::new(None, Some(500.0));
        autosave.clock = page_clock;
        autosave
    }

    #[test]
    fn millis_clamps_and_adds() {
        assert_eq!(Millis::from_js(-5.0), Millis(0));
        assert_eq!(Millis::from_js(f64::NAN), Millis(0));
        assert_eq!(Millis::from_js(1_000.9) + Duration::from_millis(500), Millis(1_500));
    }

    #[test]
    fn generate_returns_batch_json() {
        let json: Value = serde_json::from_str(&generate("A -> B").unwrap()).unwrap();
        assert_eq!(json["shapes"].as_array().unwrap().len(), 5);
        assert_eq!(generate("nothing here"), None);
    }

    #[test]
    fn template_names_round_trip() {
        for name in template_names() {
            assert!(template(&name).is_ok());
        }
    }

    #[test]
    fn autosave_cycle_with_page_clock() {
        let mut autosave = VdAutosave::new(Some("board".into()), Some(500.0));
        assert_eq!(autosave.document_id(), "board");
        autosave.on_mutation(r#"{"rev":1}"#, 1_000.0).unwrap();
        autosave.on_mutation(r#"{"rev":2}"#, 1_200.0).unwrap();
        assert_eq!(autosave.deadline(), Some(1_700.0));
        assert_eq!(autosave.poll(1_699.0), None);

        let doc: Value = serde_json::from_str(&autosave.poll(1_700.0).unwrap()).unwrap();
        assert_eq!(doc, json!({ "id": "board", "store": { "rev": 2 }, "updatedAt": 1700 }));
        assert_eq!(autosave.status(), "saving");

        assert_eq!(autosave.complete_err("offline"), "error");
        assert!(autosave.request_save(2_000.0));
        assert!(autosave.poll(2_000.0).is_some());
        assert_eq!(autosave.complete_ok(2_001.0), "idle");
    }

    #[test]
    fn mount_restores_before_listening() {
        let mut source = MemoryCanvas::new();
        generate_from_text(&mut source, "A -> B", &LayoutConfig::default());
        let stored = Document::new("main", Some(source.snapshot()), 5);

        let mut autosave = autosave();
        let mut canvas = MemoryCanvas::new();
        assert!(autosave.mount_on(&mut canvas, Some(stored.clone())));
        assert_eq!(canvas.snapshot(), source.snapshot());
        // The restore is not an edit.
        assert_eq!(autosave.deadline(), None);
        assert_eq!(autosave.poll(10_000.0), None);

        // Remounting keeps one listener and does not reinstall.
        assert!(!autosave.mount_on(&mut canvas, Some(stored)));
        assert_eq!(canvas.listener_count(), 1);

        generate_from_text(&mut canvas, "C -> D", &LayoutConfig::default());
        assert_eq!(autosave.deadline(), Some(1_500.0));
        let doc: Document = serde_json::from_str(&autosave.poll(1_500.0).unwrap()).unwrap();
        assert_eq!(doc.store, Some(canvas.snapshot()));

        autosave.detach();
        assert_eq!(canvas.listener_count(), 0);
    }

    #[test]
    fn unencodable_save_is_completed_as_failed() {
        let mut autosave = autosave();
        autosave.on_mutation(r#"{"rev":2}"#, 10.0).unwrap();
        autosave.state.borrow_mut().flush(10).unwrap();
        assert_eq!(autosave.status(), "saving");

        let encode_error = serde_json::from_str::<Value>("{").unwrap_err();
        assert_eq!(autosave.hand_off(Err(encode_error)), None);
        assert_eq!(autosave.status(), "error");
        // The slot is free again, so a retry can go out.
        assert!(autosave.request_save(20.0));
        assert!(autosave.poll(20.0).is_some());
    }
}
