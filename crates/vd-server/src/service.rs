//! Document sync service: `get` / `save` over a [`DocumentStore`].
//!
//! The service owns timestamp policy. Client-supplied `updatedAt` values
//! are ignored; every save is stamped with `max(now, previous)` so readers
//! never see a document's time go backwards, even if the wall clock does.

use crate::store::{DocumentStore, MemoryStore};
use serde_json::Value;
use std::sync::Mutex;
use vd_core::{Document, DocumentApi, SaveAck, StoreError, SyncError, now_millis};

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

pub struct DocumentService {
    store: Box<dyn DocumentStore>,
    clock: Clock,
    /// Serializes the read-stamp-write sequence of `save`.
    writes: Mutex<()>,
}

impl Default for DocumentService {
    fn default() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl DocumentService {
    pub fn new(store: impl DocumentStore + 'static) -> Self {
        Self::with_clock(store, now_millis)
    }

    /// A service reading time from `clock` (epoch milliseconds).
    pub fn with_clock(
        store: impl DocumentStore + 'static,
        clock: impl Fn() -> i64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            store: Box::new(store),
            clock: Box::new(clock),
            writes: Mutex::new(()),
        }
    }

    /// Fetch `id`. An id never saved yields an empty document stamped now.
    pub fn get_document(&self, id: &str) -> Result<Document, SyncError> {
        match self.store.get(id)? {
            Some(doc) => Ok(doc),
            None => Ok(Document::empty(id, (self.clock)())),
        }
    }

    /// Validate and persist `doc`, returning the authoritative timestamp.
    pub fn save_document(&self, doc: Document) -> Result<SaveAck, SyncError> {
        doc.validate()?;

        let _guard = self.writes.lock().map_err(|_| StoreError::Poisoned)?;
        let now = (self.clock)();
        let updated_at = match self.store.get(&doc.id)? {
            Some(prev) if prev.updated_at > now => {
                log::debug!(
                    "clock for {} behind stored time by {}ms; keeping {}",
                    doc.id,
                    prev.updated_at - now,
                    prev.updated_at
                );
                prev.updated_at
            }
            _ => now,
        };

        let doc = Document { updated_at, ..doc };
        self.store.put(&doc)?;
        log::debug!("saved {} at {updated_at}", doc.id);
        Ok(SaveAck {
            ok: true,
            updated_at,
        })
    }

    /// Validate an untyped payload, then save it.
    pub fn save_json(&self, payload: Value) -> Result<SaveAck, SyncError> {
        let doc = Document::from_json(payload, (self.clock)())?;
        self.save_document(doc)
    }
}

impl DocumentApi for DocumentService {
    async fn get(&self, id: &str) -> Result<Document, SyncError> {
        self.get_document(id)
    }

    async fn save(&self, doc: Document) -> Result<SaveAck, SyncError> {
        self.save_document(doc)
    }
}
