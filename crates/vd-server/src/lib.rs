//! Videtz Draft document server.
//!
//! Serves `document.get` / `document.save` as JSON-RPC over stdio, backed by
//! an in-memory or file store. The same [`DocumentService`] implements
//! [`vd_core::DocumentApi`] for in-process use.

pub mod config;
pub mod rpc;
pub mod service;
pub mod store;

pub use config::{ConfigError, Mode, ServerConfig};
pub use service::DocumentService;
pub use store::{DocumentStore, FileStore, MemoryStore};
