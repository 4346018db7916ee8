//! The page's canvas engine, seen through the [`Canvas`] trait.
//!
//! The host object is any JS value with these methods (JSON strings cross
//! the boundary in both directions):
//!
//! ```text
//! createShapes(shapesJson)
//! select(id)
//! currentPageShapeIds(): string[]
//! getSnapshot(): string
//! loadSnapshot(snapshotJson)
//! listen(scope, callback(snapshotJson)): () => void
//! ```

use js_sys::{Array, Function};
use vd_core::{Shape, ShapeId, Snapshot};
use vd_editor::{Canvas, ChangeListener, ChangeScope, Subscription};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    pub type CanvasHost;

    #[wasm_bindgen(method, js_name = createShapes)]
    fn create_shapes(this: &CanvasHost, shapes_json: &str);

    #[wasm_bindgen(method)]
    fn select(this: &CanvasHost, id: &str);

    #[wasm_bindgen(method, js_name = currentPageShapeIds)]
    fn current_page_shape_ids(this: &CanvasHost) -> Array;

    #[wasm_bindgen(method, js_name = getSnapshot)]
    fn get_snapshot(this: &CanvasHost) -> String;

    #[wasm_bindgen(method, js_name = loadSnapshot)]
    fn load_snapshot(this: &CanvasHost, snapshot_json: &str);

    #[wasm_bindgen(method)]
    fn listen(this: &CanvasHost, scope: &str, callback: &Closure<dyn FnMut(String)>) -> Function;
}

/// Borrowed [`CanvasHost`] implementing [`Canvas`].
pub struct HostCanvas<'a> {
    host: &'a CanvasHost,
}

impl<'a> HostCanvas<'a> {
    pub fn new(host: &'a CanvasHost) -> Self {
        Self { host }
    }
}

fn scope_name(scope: ChangeScope) -> &'static str {
    match scope {
        ChangeScope::Document => "document",
        ChangeScope::Session => "session",
        ChangeScope::All => "all",
    }
}

impl Canvas for HostCanvas<'_> {
    fn create_shapes(&mut self, shapes: &[Shape]) {
        match serde_json::to_string(shapes) {
            Ok(json) => self.host.create_shapes(&json),
            Err(e) => log::error!("cannot encode shapes for host: {e}"),
        }
    }

    fn select(&mut self, id: ShapeId) {
        self.host.select(id.as_str());
    }

    // Host ids are interned for good; repeats cost a lookup, new ids a slot.
    fn current_page_shape_ids(&self) -> Vec<ShapeId> {
        self.host
            .current_page_shape_ids()
            .iter()
            .filter_map(|v| v.as_string())
            .map(|s| ShapeId::intern(&s))
            .collect()
    }

    fn listen(&mut self, scope: ChangeScope, mut listener: ChangeListener) -> Subscription {
        let callback = Closure::<dyn FnMut(String)>::new(move |json: String| {
            match serde_json::from_str(&json) {
                Ok(snapshot) => listener(snapshot),
                Err(e) => log::warn!("ignoring unparseable snapshot from host: {e}"),
            }
        });
        let unsubscribe = self.host.listen(scope_name(scope), &callback);
        Subscription::new(move || {
            if let Err(e) = unsubscribe.call0(&JsValue::NULL) {
                log::warn!("host unsubscribe threw: {e:?}");
            }
            drop(callback);
        })
    }

    fn snapshot(&self) -> Snapshot {
        let json = self.host.get_snapshot();
        serde_json::from_str(&json).unwrap_or_else(|e| {
            log::error!("host returned an unparseable snapshot: {e}");
            Snapshot::Null
        })
    }

    fn load_snapshot(&mut self, snapshot: &Snapshot) {
        self.host.load_snapshot(&snapshot.to_string());
    }
}
