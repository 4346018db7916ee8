pub mod autosave;
pub mod canvas;
#[cfg(feature = "runtime")]
pub mod coordinator;
pub mod debounce;
pub mod generate;

pub use autosave::{Autosave, AutosaveConfig, SaveStatus};
pub use canvas::{Canvas, ChangeListener, ChangeScope, MemoryCanvas, Subscription};
#[cfg(feature = "runtime")]
pub use coordinator::{AutosaveCoordinator, AutosaveEvent, AutosaveSession};
pub use debounce::Debouncer;
pub use generate::{Applied, apply_batch, apply_template, export_snapshot_json, generate_from_text};
