//! The persisted unit of work and the RPC boundary that moves it.
//!
//! A `Document` pairs an opaque canvas snapshot with its id and a
//! server-assigned timestamp. The snapshot is never inspected: it is
//! whatever JSON the canvas engine produced.

use crate::error::{SyncError, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Document id used when the caller does not name one.
pub const DEFAULT_DOCUMENT_ID: &str = "main";

/// Opaque, engine-defined serialization of the whole canvas.
pub type Snapshot = Value;

/// One persisted record: `{ id, store, updatedAt }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub store: Option<Snapshot>,
    /// Epoch milliseconds. Authoritative only when assigned by the service.
    pub updated_at: i64,
}

impl Document {
    pub fn new(id: impl Into<String>, store: Option<Snapshot>, updated_at: i64) -> Self {
        Self {
            id: id.into(),
            store,
            updated_at,
        }
    }

    /// The placeholder returned for an id that has never been saved.
    pub fn empty(id: impl Into<String>, now: i64) -> Self {
        Self::new(id, None, now)
    }

    /// Check the invariants the typed representation cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::new("id", "must not be empty"));
        }
        Ok(())
    }

    /// Validate an untyped save payload.
    ///
    /// `store` may be missing or `null`; a missing `updatedAt` defaults to
    /// `now`. Every other deviation is a `ValidationError` naming the field.
    pub fn from_json(value: Value, now: i64) -> Result<Self, ValidationError> {
        let Value::Object(mut map) = value else {
            return Err(ValidationError::new("document", "expected an object"));
        };

        let id = match map.remove("id") {
            Some(Value::String(id)) => id,
            Some(_) => return Err(ValidationError::new("id", "expected a string")),
            None => return Err(ValidationError::new("id", "required")),
        };

        let store = match map.remove("store") {
            None | Some(Value::Null) => None,
            Some(other) => Some(other),
        };

        let updated_at = match map.remove("updatedAt") {
            None => now,
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
                .ok_or_else(|| ValidationError::new("updatedAt", "out of range"))?,
            Some(_) => return Err(ValidationError::new("updatedAt", "expected a number")),
        };

        let doc = Self::new(id, store, updated_at);
        doc.validate()?;
        Ok(doc)
    }
}

/// Response to a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAck {
    pub ok: bool,
    pub updated_at: i64,
}

/// The request/response boundary between the autosave coordinator and
/// whatever serves documents (in-process service, RPC client, test stub).
pub trait DocumentApi {
    /// Fetch a document. Unknown ids yield an empty document, not an error.
    fn get(&self, id: &str) -> impl Future<Output = Result<Document, SyncError>>;

    /// Overwrite a document. The returned timestamp is authoritative.
    fn save(&self, doc: Document) -> impl Future<Output = Result<SaveAck, SyncError>>;
}

impl<T: DocumentApi + ?Sized> DocumentApi for &T {
    fn get(&self, id: &str) -> impl Future<Output = Result<Document, SyncError>> {
        (**self).get(id)
    }

    fn save(&self, doc: Document) -> impl Future<Output = Result<SaveAck, SyncError>> {
        (**self).save(doc)
    }
}

impl<T: DocumentApi + ?Sized> DocumentApi for Arc<T> {
    fn get(&self, id: &str) -> impl Future<Output = Result<Document, SyncError>> {
        (**self).get(id)
    }

    fn save(&self, doc: Document) -> impl Future<Output = Result<SaveAck, SyncError>> {
        (**self).save(doc)
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
