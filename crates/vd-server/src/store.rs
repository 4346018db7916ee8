//! Document stores: last-write-wins key/value persistence.
//!
//! A store only moves whole [`Document`] records; timestamp policy and
//! validation live in the service above it.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use vd_core::{Document, StoreError};

/// Extension of the per-document files written by [`FileStore`].
pub const FILE_EXTENSION: &str = "mpk";

/// Longest hex run used as a single path component. Leaves room for the
/// extension and temp suffix under the usual 255-byte name limit.
const MAX_COMPONENT: usize = 200;

pub trait DocumentStore: Send + Sync {
    /// The stored record, or `None` for an id never written.
    fn get(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Unconditionally overwrite the record for `doc.id`.
    fn put(&self, doc: &Document) -> Result<(), StoreError>;
}

// ─── Memory ──────────────────────────────────────────────────────────────

/// Process-local store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let docs = self.docs.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(docs.get(id).cloned())
    }

    fn put(&self, doc: &Document) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().map_err(|_| StoreError::Poisoned)?;
        docs.insert(doc.id.clone(), doc.clone());
        Ok(())
    }
}

// ─── File ────────────────────────────────────────────────────────────────

/// One MessagePack file per document under a directory.
///
/// File names are the hex-encoded id, so any id maps to a safe name. Ids
/// whose hex form is too long for one name are split into nested
/// directories of [`MAX_COMPONENT`] characters each. Writes go to a temp
/// file that is renamed over the target.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        log::debug!("file store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `id`.
    pub fn path_for(&self, id: &str) -> PathBuf {
        let hex = hex_name(id);
        let mut path = self.dir.clone();
        let mut rest = hex.as_str();
        while rest.len() > MAX_COMPONENT {
            let (head, tail) = rest.split_at(MAX_COMPONENT);
            path.push(head);
            rest = tail;
        }
        path.push(format!("{rest}.{FILE_EXTENSION}"));
        path
    }
}

fn hex_name(id: &str) -> String {
    let mut name = String::with_capacity(id.len() * 2);
    for byte in id.bytes() {
        let _ = write!(name, "{byte:02x}");
    }
    name
}

impl DocumentStore for FileStore {
    fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let bytes = match fs::read(self.path_for(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let doc = rmp_serde::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Some(doc))
    }

    fn put(&self, doc: &Document) -> Result<(), StoreError> {
        let bytes = rmp_serde::to_vec_named(doc).map_err(|e| StoreError::Encode(e.to_string()))?;
        let target = self.path_for(&doc.id);
        if let Some(parent) = target.parent().filter(|p| *p != self.dir.as_path()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = target.with_extension(format!("{FILE_EXTENSION}.tmp"));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}
