pub mod document;
pub mod emitter;
pub mod error;
pub mod id;
pub mod layout;
pub mod lint;
pub mod model;
pub mod parser;
pub mod template;

pub use document::{DEFAULT_DOCUMENT_ID, Document, DocumentApi, SaveAck, Snapshot, now_millis};
pub use emitter::{emit_batch, generate_batch, template_batch};
pub use error::{StoreError, SyncError, ValidationError};
pub use id::ShapeId;
pub use layout::{ConnectorMode, Layout, LayoutConfig, grid_layout};
pub use lint::{LintDiagnostic, LintSeverity, lint_batch};
pub use model::*;
pub use parser::parse_edge_list;
pub use template::Template;

// Re-export kurbo geometry so downstream crates don't need a direct dependency
pub use kurbo::{Point, Rect, Size};
