//! Debounced autosave state machine.
//!
//! [`Autosave`] is sans-io. It is fed mutations and clock readings, hands
//! back the [`Document`] to save once the quiet window elapses, and is told
//! how the save went. It never sleeps or performs I/O, so hosts with their
//! own event loop (the WASM bridge) drive it directly; tokio hosts use
//! `AutosaveCoordinator`.

use crate::debounce::{Debouncer, Moment};
use std::fmt;
use std::time::Duration;
use vd_core::{DEFAULT_DOCUMENT_ID, Document, SaveAck, Snapshot, SyncError};

/// Quiet period a burst of edits must observe before it is saved.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(500);

/// Persistence state shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Error,
}

impl SaveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SaveStatus::Idle => "idle",
            SaveStatus::Saving => "saving",
            SaveStatus::Error => "error",
        }
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    pub document_id: String,
    pub quiet_window: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            document_id: DEFAULT_DOCUMENT_ID.to_string(),
            quiet_window: DEFAULT_QUIET_WINDOW,
        }
    }
}

// ─── State machine ───────────────────────────────────────────────────────

/// Sans-io autosave state for one document.
///
/// At most one save is in flight. Mutations observed meanwhile are held by
/// the debouncer and become due after the save completes.
#[derive(Debug)]
pub struct Autosave<I> {
    document_id: String,
    debounce: Debouncer<Snapshot, I>,
    status: SaveStatus,
    in_flight: Option<Snapshot>,
    /// Snapshot of the last failed save, kept for a manual retry.
    failed: Option<Snapshot>,
}

impl<I: Moment> Autosave<I> {
    pub fn new(config: &AutosaveConfig) -> Self {
        Self {
            document_id: config.document_id.clone(),
            debounce: Debouncer::new(config.quiet_window),
            status: SaveStatus::Idle,
            in_flight: None,
            failed: None,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn has_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Record a document change at `now`, superseding any pending snapshot.
    pub fn on_mutation(&mut self, snapshot: Snapshot, now: I) {
        self.failed = None;
        if self.debounce.schedule(snapshot, now) {
            log::trace!("autosave {}: coalesced pending snapshot", self.document_id);
        }
    }

    /// Ask for an immediate save of the pending snapshot, or a retry of the
    /// last failed one. Returns `false` when there is nothing to save.
    pub fn request_save(&mut self, now: I) -> bool {
        if self.debounce.expedite(now) {
            return true;
        }
        match self.failed.take() {
            Some(snapshot) => {
                self.debounce.schedule_now(snapshot, now);
                true
            }
            None => false,
        }
    }

    /// When the next save becomes due. `None` while idle or while a save
    /// is in flight.
    pub fn deadline(&self) -> Option<I> {
        if self.in_flight.is_some() {
            return None;
        }
        self.debounce.deadline()
    }

    /// Start a save if one is due at `now`.
    ///
    /// `wall_ms` stamps the outgoing document; the service replaces it with
    /// its own authoritative time.
    pub fn poll(&mut self, now: I, wall_ms: i64) -> Option<Document> {
        if self.in_flight.is_some() {
            return None;
        }
        let snapshot = self.debounce.take_due(now)?;
        Some(self.begin(snapshot, wall_ms))
    }

    /// Start a save of the pending snapshot without waiting for its deadline.
    pub fn flush(&mut self, wall_ms: i64) -> Option<Document> {
        if self.in_flight.is_some() {
            return None;
        }
        let snapshot = self.debounce.flush()?;
        Some(self.begin(snapshot, wall_ms))
    }

    fn begin(&mut self, snapshot: Snapshot, wall_ms: i64) -> Document {
        self.status = SaveStatus::Saving;
        self.in_flight = Some(snapshot.clone());
        Document::new(self.document_id.clone(), Some(snapshot), wall_ms)
    }

    /// Record the outcome of the in-flight save and return the new status.
    pub fn complete(&mut self, outcome: &Result<SaveAck, SyncError>) -> SaveStatus {
        let Some(snapshot) = self.in_flight.take() else {
            log::warn!("autosave {}: completion without a save in flight", self.document_id);
            return self.status;
        };
        match outcome {
            Ok(ack) => {
                log::debug!("autosave {}: saved at {}", self.document_id, ack.updated_at);
                self.status = SaveStatus::Idle;
            }
            Err(e) => {
                log::warn!("autosave {}: save failed: {e}", self.document_id);
                self.status = SaveStatus::Error;
                // A newer pending snapshot supersedes the failed one.
                if !self.debounce.is_pending() {
                    self.failed = Some(snapshot);
                }
            }
        }
        self.status
    }
}
