//! Integration tests: canvas edits → autosave coordinator → document API.
//!
//! Runs on a paused tokio clock so the quiet window is exact.

use pretty_assertions::assert_eq;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use vd_core::{Document, DocumentApi, LayoutConfig, SaveAck, SyncError};
use vd_editor::{
    AutosaveConfig, AutosaveCoordinator, AutosaveEvent, AutosaveSession, Canvas, MemoryCanvas,
    SaveStatus, generate_from_text,
};

/// In-process document API that records every save attempt.
#[derive(Clone, Default)]
struct RecordingApi {
    stored: Rc<RefCell<Option<Document>>>,
    attempts: Rc<RefCell<Vec<(Instant, Document)>>>,
    fail_saves: Rc<Cell<usize>>,
    fail_get: Rc<Cell<bool>>,
    latency: Duration,
}

impl RecordingApi {
    fn attempts(&self) -> Vec<Document> {
        self.attempts.borrow().iter().map(|(_, d)| d.clone()).collect()
    }
}

impl DocumentApi for RecordingApi {
    async fn get(&self, id: &str) -> Result<Document, SyncError> {
        if self.fail_get.get() {
            return Err(SyncError::Transport("unreachable".into()));
        }
        Ok(self
            .stored
            .borrow()
            .clone()
            .unwrap_or_else(|| Document::empty(id, 0)))
    }

    async fn save(&self, doc: Document) -> Result<SaveAck, SyncError> {
        self.attempts.borrow_mut().push((Instant::now(), doc.clone()));
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        if self.fail_saves.get() > 0 {
            self.fail_saves.set(self.fail_saves.get() - 1);
            return Err(SyncError::Transport("connection reset".into()));
        }
        let updated_at = doc.updated_at;
        *self.stored.borrow_mut() = Some(doc);
        Ok(SaveAck {
            ok: true,
            updated_at,
        })
    }
}

fn coordinator(api: &RecordingApi) -> AutosaveCoordinator<RecordingApi> {
    AutosaveCoordinator::new(api.clone(), AutosaveConfig::default())
}

// ─── Debounce ────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn burst_of_edits_saves_once_with_final_snapshot() {
    let api = RecordingApi::default();
    let mut coordinator = coordinator(&api);
    let mut canvas = MemoryCanvas::new();
    let AutosaveSession {
        subscription,
        events,
        trigger,
    } = coordinator.mount(&mut canvas).await;
    drop(trigger);

    let start = Instant::now();
    let canvas = &mut canvas;
    let probe = api.clone();
    let editing = async move {
        generate_from_text(canvas, "A -> B", &LayoutConfig::default()).unwrap();
        let first = canvas.current_page_shape_ids()[0];
        for _ in 1..10 {
            sleep(Duration::from_millis(40)).await;
            canvas.nudge(first, 5.0, 0.0);
        }
        sleep(Duration::from_secs(2)).await;

        let attempts = probe.attempts.borrow().clone();
        assert_eq!(attempts.len(), 1);
        let (at, doc) = &attempts[0];
        // Last edit lands at 360ms; the save waits out the full quiet window.
        let elapsed = *at - start;
        assert!(elapsed >= Duration::from_millis(860), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(900), "{elapsed:?}");
        assert_eq!(doc.store.as_ref(), Some(&canvas.snapshot()));
        assert_eq!(doc.id, "main");
        drop(subscription);
    };

    tokio::join!(coordinator.run(events), editing);
    assert_eq!(api.attempts().len(), 1);
    assert_eq!(coordinator.status(), SaveStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn separate_bursts_save_separately() {
    let api = RecordingApi::default();
    let mut coordinator = coordinator(&api);
    let mut canvas = MemoryCanvas::new();
    let session = coordinator.mount(&mut canvas).await;
    drop(session.trigger);
    let subscription = session.subscription;

    let canvas = &mut canvas;
    let editing = async move {
        generate_from_text(canvas, "A -> B", &LayoutConfig::default());
        sleep(Duration::from_millis(800)).await;
        generate_from_text(canvas, "C -> D", &LayoutConfig::default());
        sleep(Duration::from_millis(800)).await;
        drop(subscription);
    };

    tokio::join!(coordinator.run(session.events), editing);
    assert_eq!(api.attempts().len(), 2);
}

// ─── Failure and retry ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn failed_save_reports_error_then_manual_retry_recovers() {
    let api = RecordingApi::default();
    api.fail_saves.set(1);
    let mut coordinator = coordinator(&api);
    let mut status = coordinator.subscribe();
    let mut canvas = MemoryCanvas::new();
    let AutosaveSession {
        subscription,
        events,
        trigger,
    } = coordinator.mount(&mut canvas).await;

    let canvas = &mut canvas;
    let probe = api.clone();
    let editing = async move {
        generate_from_text(canvas, "A -> B", &LayoutConfig::default());
        sleep(Duration::from_secs(1)).await;
        assert_eq!(*status.borrow_and_update(), SaveStatus::Error);
        assert!(probe.stored.borrow().is_none());

        trigger.send(AutosaveEvent::SaveNow).unwrap();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(*status.borrow_and_update(), SaveStatus::Idle);

        let attempts = probe.attempts();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].store, attempts[1].store);
        drop(subscription);
        drop(trigger);
        canvas.snapshot()
    };

    let ((), expected) = tokio::join!(coordinator.run(events), editing);
    assert_eq!(
        api.stored.borrow().as_ref().and_then(|d| d.store.clone()),
        Some(expected)
    );
}

#[tokio::test(start_paused = true)]
async fn next_edit_after_failure_saves_and_recovers() {
    let api = RecordingApi::default();
    api.fail_saves.set(1);
    let mut coordinator = coordinator(&api);
    let mut status = coordinator.subscribe();
    let mut canvas = MemoryCanvas::new();
    let session = coordinator.mount(&mut canvas).await;
    drop(session.trigger);
    let subscription = session.subscription;

    let canvas = &mut canvas;
    let recorder = api.clone();
    let editing = async move {
        generate_from_text(canvas, "A -> B", &LayoutConfig::default());
        sleep(Duration::from_secs(1)).await;
        assert_eq!(*status.borrow_and_update(), SaveStatus::Error);

        // No manual trigger: the next edit goes through the normal debounce.
        generate_from_text(canvas, "C -> D", &LayoutConfig::default());
        sleep(Duration::from_millis(400)).await;
        assert_eq!(recorder.attempts().len(), 1);
        sleep(Duration::from_millis(600)).await;
        assert_eq!(*status.borrow_and_update(), SaveStatus::Idle);
        assert_eq!(recorder.attempts().len(), 2);

        let expected = canvas.snapshot();
        drop(subscription);
        expected
    };

    let ((), expected) = tokio::join!(coordinator.run(session.events), editing);
    assert_eq!(coordinator.status(), SaveStatus::Idle);
    assert_eq!(
        api.stored.borrow().as_ref().and_then(|d| d.store.clone()),
        Some(expected)
    );
}

// ─── Lifecycle ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn closing_the_stream_flushes_pending_edit() {
    let api = RecordingApi::default();
    let mut coordinator = coordinator(&api);
    let mut canvas = MemoryCanvas::new();
    let session = coordinator.mount(&mut canvas).await;

    let start = Instant::now();
    generate_from_text(&mut canvas, "A -> B", &LayoutConfig::default());
    drop(session.subscription);
    drop(session.trigger);
    coordinator.run(session.events).await;

    let attempts = api.attempts.borrow();
    assert_eq!(attempts.len(), 1);
    assert!(attempts[0].0 - start < Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn edits_during_a_slow_save_are_saved_afterwards() {
    let api = RecordingApi {
        latency: Duration::from_millis(300),
        ..RecordingApi::default()
    };
    let mut coordinator = coordinator(&api);
    let mut canvas = MemoryCanvas::new();
    let session = coordinator.mount(&mut canvas).await;
    drop(session.trigger);
    let subscription = session.subscription;

    let canvas = &mut canvas;
    let editing = async move {
        generate_from_text(canvas, "A -> B", &LayoutConfig::default());
        // First save starts at 500ms and is in flight until 800ms.
        sleep(Duration::from_millis(600)).await;
        generate_from_text(canvas, "C -> D", &LayoutConfig::default());
        sleep(Duration::from_secs(2)).await;
        let expected = canvas.snapshot();
        drop(subscription);
        expected
    };

    let ((), expected) = tokio::join!(coordinator.run(session.events), editing);
    let attempts = api.attempts();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[1].store, Some(expected));
}

#[tokio::test(start_paused = true)]
async fn mount_restores_stored_snapshot_without_saving() {
    let mut source = MemoryCanvas::new();
    generate_from_text(&mut source, "A -> B", &LayoutConfig::default());

    let api = RecordingApi::default();
    *api.stored.borrow_mut() = Some(Document::new("main", Some(source.snapshot()), 5));

    let mut coordinator = coordinator(&api);
    let mut canvas = MemoryCanvas::new();
    let session = coordinator.mount(&mut canvas).await;
    assert_eq!(canvas.current_page_shape_ids(), source.current_page_shape_ids());

    // A second load is a no-op.
    assert!(!coordinator.load(&mut canvas).await.unwrap());

    drop(session.subscription);
    drop(session.trigger);
    coordinator.run(session.events).await;
    assert!(api.attempts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_load_keeps_canvas_and_still_autosaves() {
    let api = RecordingApi::default();
    api.fail_get.set(true);
    let mut coordinator = coordinator(&api);
    let mut canvas = MemoryCanvas::new();
    let session = coordinator.mount(&mut canvas).await;
    assert!(canvas.current_page_shape_ids().is_empty());

    generate_from_text(&mut canvas, "A -> B", &LayoutConfig::default());
    drop(session.subscription);
    drop(session.trigger);
    coordinator.run(session.events).await;

    assert_eq!(api.attempts().len(), 1);
    assert_eq!(api.attempts()[0].id, "main");
}
