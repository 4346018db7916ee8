//! Tokio driver for [`Autosave`].
//!
//! Loads the stored snapshot into the canvas once, subscribes to document
//! changes, and runs the debounce loop against a [`DocumentApi`],
//! publishing [`SaveStatus`] on a watch channel.

use crate::autosave::{Autosave, AutosaveConfig, SaveStatus};
use crate::canvas::{Canvas, ChangeScope, Subscription};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use vd_core::{Document, DocumentApi, Snapshot, SyncError, now_millis};

/// Input to [`AutosaveCoordinator::run`].
#[derive(Debug, Clone)]
pub enum AutosaveEvent {
    /// The document changed; carries the new snapshot.
    Changed(Snapshot),
    /// Manual save trigger.
    SaveNow,
}

/// Everything [`AutosaveCoordinator::mount`] sets up.
///
/// The event stream stays open while either the subscription or the
/// trigger is alive. Dropping both lets `run` flush and return.
pub struct AutosaveSession {
    pub subscription: Subscription,
    pub events: mpsc::UnboundedReceiver<AutosaveEvent>,
    pub trigger: mpsc::UnboundedSender<AutosaveEvent>,
}

pub struct AutosaveCoordinator<A> {
    api: A,
    state: Autosave<Instant>,
    status: watch::Sender<SaveStatus>,
    loaded: bool,
}

impl<A: DocumentApi> AutosaveCoordinator<A> {
    pub fn new(api: A, config: AutosaveConfig) -> Self {
        let (status, _) = watch::channel(SaveStatus::Idle);
        Self {
            api,
            state: Autosave::new(&config),
            status,
            loaded: false,
        }
    }

    pub fn document_id(&self) -> &str {
        self.state.document_id()
    }

    pub fn status(&self) -> SaveStatus {
        self.state.status()
    }

    /// Watch status transitions.
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.subscribe()
    }

    /// Fetch the stored document and install its snapshot into the canvas.
    ///
    /// Runs at most once per coordinator; later calls return `Ok(false)`.
    /// Returns `Ok(true)` when a snapshot was installed.
    pub async fn load<C: Canvas>(&mut self, canvas: &mut C) -> Result<bool, SyncError> {
        if self.loaded {
            return Ok(false);
        }
        let doc = self.api.get(self.state.document_id()).await?;
        self.loaded = true;
        match doc.store {
            Some(snapshot) => {
                canvas.load_snapshot(&snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Load the stored document, then start listening for document changes.
    ///
    /// A failed load is logged and the canvas keeps its current content.
    pub async fn mount<C: Canvas>(&mut self, canvas: &mut C) -> AutosaveSession {
        match self.load(canvas).await {
            Ok(true) => log::info!("autosave {}: restored stored snapshot", self.document_id()),
            Ok(false) => log::debug!("autosave {}: nothing to restore", self.document_id()),
            Err(e) => log::warn!("autosave {}: load failed: {e}", self.document_id()),
        }

        let (trigger, events) = mpsc::unbounded_channel();
        let changes = trigger.clone();
        let subscription = canvas.listen(
            ChangeScope::Document,
            Box::new(move |snapshot| {
                let _ = changes.send(AutosaveEvent::Changed(snapshot));
            }),
        );
        AutosaveSession {
            subscription,
            events,
            trigger,
        }
    }

    /// Debounce loop. Returns once the event stream closes, after flushing
    /// any pending snapshot.
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<AutosaveEvent>) {
        loop {
            let deadline = self.state.deadline();
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Some(AutosaveEvent::Changed(snapshot)) => {
                        self.state.on_mutation(snapshot, Instant::now());
                    }
                    Some(AutosaveEvent::SaveNow) => {
                        if !self.state.request_save(Instant::now()) {
                            log::debug!("autosave {}: nothing to save", self.document_id());
                        }
                    }
                    None => break,
                },
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(doc) = self.state.poll(Instant::now(), now_millis()) {
                        self.dispatch(doc).await;
                    }
                }
            }
        }

        if let Some(doc) = self.state.flush(now_millis()) {
            log::debug!("autosave {}: flushing on close", self.document_id());
            self.dispatch(doc).await;
        }
    }

    async fn dispatch(&mut self, doc: Document) {
        self.status.send_replace(self.state.status());
        let outcome = self.api.save(doc).await;
        let status = self.state.complete(&outcome);
        self.status.send_replace(status);
    }
}
