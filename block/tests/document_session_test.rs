//! Document session actor tests
//!
//! Each test spawns a session against an in-memory store wrapped with
//! switches for slow saves and failures, uses short quiet windows and
//! settles with `tokio::time::sleep`.
//!
//! Run:
//!   cargo test -p block --test document_session_test

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use block::actors::{
    apply_command, close, edit, get_view, reload, set_status, DocumentSessionActor,
    DocumentSessionArguments, DocumentSessionMsg, SessionError,
};
use block::store::{DocumentStore, InMemoryDocumentStore, SaveAck, StoreError};
use ractor::{Actor, ActorRef};
use shared_types::{BlockStatus, DisplayMode, DocumentSnapshot, SaveStatus, VersionCommand};
use tokio::task::JoinHandle;
use tokio::time::sleep;

const DOC: &str = "doc-1";
const QUIET_MS: u64 = 50;

// ─── Store harness ───────────────────────────────────────────────────────────

struct ScriptedStore {
    inner: InMemoryDocumentStore,
    save_delay: Duration,
    fail_saves: AtomicBool,
    fail_fetches: AtomicBool,
    save_attempts: Mutex<Vec<String>>,
}

impl ScriptedStore {
    async fn seeded(contents: &[&str]) -> Arc<Self> {
        Self::seeded_with_delay(contents, Duration::ZERO).await
    }

    async fn seeded_with_delay(contents: &[&str], save_delay: Duration) -> Arc<Self> {
        let inner = InMemoryDocumentStore::new("user-1");
        inner.seed(DOC, "Notes", contents.iter().copied()).await;
        Arc::new(Self {
            inner,
            save_delay,
            fail_saves: AtomicBool::new(false),
            fail_fetches: AtomicBool::new(false),
            save_attempts: Mutex::new(Vec::new()),
        })
    }

    fn attempts(&self) -> Vec<String> {
        self.save_attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    async fn fetch_version_history(
        &self,
        document_id: &str,
    ) -> Result<Vec<DocumentSnapshot>, StoreError> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("fetch refused".to_string()));
        }
        self.inner.fetch_version_history(document_id).await
    }

    async fn save_content(
        &self,
        document_id: &str,
        title: &str,
        content: &str,
    ) -> Result<SaveAck, StoreError> {
        self.save_attempts.lock().unwrap().push(content.to_string());
        if !self.save_delay.is_zero() {
            sleep(self.save_delay).await;
        }
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("disk full".to_string()));
        }
        self.inner.save_content(document_id, title, content).await
    }
}

async fn open_session(
    store: &Arc<ScriptedStore>,
    quiet: Duration,
    flush_on_close: bool,
) -> (ActorRef<DocumentSessionMsg>, JoinHandle<()>) {
    Actor::spawn(
        None,
        DocumentSessionActor,
        DocumentSessionArguments {
            document_id: DOC.to_string(),
            title: "Notes".to_string(),
            store: store.clone(),
            save_debounce: quiet,
            flush_on_close,
        },
    )
    .await
    .unwrap()
}

fn quiet() -> Duration {
    Duration::from_millis(QUIET_MS)
}

// ─── Loading and navigation ──────────────────────────────────────────────────

#[tokio::test]
async fn test_session_starts_on_latest_version() {
    let store = ScriptedStore::seeded(&["a", "ab", "abc"]).await;
    let (session, _handle) = open_session(&store, quiet(), true).await;

    let view = get_view(&session).await.unwrap();
    assert!(view.loaded);
    assert_eq!(view.cursor, Some(2));
    assert_eq!(view.version_count, 3);
    assert!(view.is_current_version);
    assert_eq!(view.content, "abc");
    assert_eq!(view.save_status, SaveStatus::Clean);
    assert!(view.updated_at.is_some());

    session.stop(None);
}

#[tokio::test]
async fn test_diff_view_and_latest_returns_to_edit() {
    let store = ScriptedStore::seeded(&["a", "ab", "abc"]).await;
    let (session, _handle) = open_session(&store, quiet(), true).await;

    apply_command(&session, VersionCommand::Prev).await.unwrap();
    let view = apply_command(&session, VersionCommand::Toggle).await.unwrap();
    assert_eq!(view.cursor, Some(1));
    assert_eq!(view.mode, DisplayMode::Diff);
    assert!(!view.is_current_version);
    let diff = view.diff.expect("diff pair at cursor 1");
    assert_eq!(diff.previous, "a");
    assert_eq!(diff.current, "ab");

    let view = apply_command(&session, VersionCommand::Latest).await.unwrap();
    assert_eq!(view.cursor, Some(2));
    assert_eq!(view.mode, DisplayMode::Edit);
    assert!(view.diff.is_none());
    assert_eq!(view.content, "abc");

    session.stop(None);
}

#[tokio::test]
async fn test_edit_ignored_while_viewing_older_version() {
    let store = ScriptedStore::seeded(&["a", "ab", "abc"]).await;
    let (session, _handle) = open_session(&store, quiet(), true).await;

    apply_command(&session, VersionCommand::Prev).await.unwrap();
    edit(&session, "rewritten", false).unwrap();
    sleep(Duration::from_millis(QUIET_MS * 2)).await;

    assert!(store.attempts().is_empty());
    let view = apply_command(&session, VersionCommand::Latest).await.unwrap();
    assert_eq!(view.content, "abc");
    assert_eq!(view.save_status, SaveStatus::Clean);

    session.stop(None);
}

// ─── Debounced saves ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_debounced_burst_sends_single_save() {
    let store = ScriptedStore::seeded(&["a", "ab", "abc"]).await;
    let (session, _handle) = open_session(&store, quiet(), true).await;

    for content in ["abcd", "abcde", "abcdef"] {
        edit(&session, content, true).unwrap();
        sleep(Duration::from_millis(10)).await;
    }
    let view = get_view(&session).await.unwrap();
    assert_eq!(view.save_status, SaveStatus::Dirty);
    assert_eq!(view.content, "abcdef");
    assert!(store.attempts().is_empty());

    sleep(Duration::from_millis(QUIET_MS * 4)).await;

    assert_eq!(store.attempts(), vec!["abcdef".to_string()]);
    let view = get_view(&session).await.unwrap();
    assert_eq!(view.save_status, SaveStatus::Clean);
    assert_eq!(view.version_count, 4);
    assert_eq!(view.cursor, Some(3));
    assert_eq!(store.inner.snapshot_count(DOC).await, 4);

    session.stop(None);
}

#[tokio::test]
async fn test_identical_content_is_noop() {
    let store = ScriptedStore::seeded(&["a", "ab", "abc"]).await;
    let (session, _handle) = open_session(&store, quiet(), true).await;

    edit(&session, "abc", true).unwrap();
    let view = get_view(&session).await.unwrap();
    assert_eq!(view.save_status, SaveStatus::Clean);

    sleep(Duration::from_millis(QUIET_MS * 3)).await;
    assert!(store.attempts().is_empty());

    session.stop(None);
}

#[tokio::test]
async fn test_reader_keeps_place_when_slow_save_lands() {
    let store = ScriptedStore::seeded_with_delay(&["a", "ab", "abc"], Duration::from_millis(100)).await;
    let (session, _handle) = open_session(&store, quiet(), true).await;

    edit(&session, "abcd", false).unwrap();
    let view = apply_command(&session, VersionCommand::Prev).await.unwrap();
    assert_eq!(view.cursor, Some(1));
    assert_eq!(view.save_status, SaveStatus::Saving);

    sleep(Duration::from_millis(250)).await;

    let view = get_view(&session).await.unwrap();
    assert_eq!(view.version_count, 4);
    assert_eq!(view.cursor, Some(1));
    assert!(!view.is_current_version);
    assert_eq!(view.content, "ab");
    assert_eq!(view.save_status, SaveStatus::Clean);

    session.stop(None);
}

#[tokio::test]
async fn test_failed_save_stays_dirty_without_retry() {
    let store = ScriptedStore::seeded(&["a"]).await;
    store.fail_saves.store(true, Ordering::SeqCst);
    let (session, _handle) = open_session(&store, quiet(), true).await;

    edit(&session, "ab", false).unwrap();
    sleep(Duration::from_millis(QUIET_MS)).await;

    let view = get_view(&session).await.unwrap();
    assert!(matches!(view.save_status, SaveStatus::Error(ref message) if message.contains("disk full")));
    assert!(view.save_status.is_dirty());
    assert_eq!(view.content, "ab");

    sleep(Duration::from_millis(QUIET_MS * 3)).await;
    assert_eq!(store.attempts().len(), 1);
    assert_eq!(store.inner.snapshot_count(DOC).await, 1);

    session.stop(None);
}

// ─── Refetching ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reload_follows_latest() {
    let store = ScriptedStore::seeded(&["a", "ab", "abc"]).await;
    let (session, _handle) = open_session(&store, quiet(), true).await;

    store.inner.save_content(DOC, "Notes", "external").await.unwrap();
    let view = reload(&session).await.unwrap();

    assert_eq!(view.version_count, 4);
    assert_eq!(view.cursor, Some(3));
    assert_eq!(view.content, "external");
    assert_eq!(view.save_status, SaveStatus::Clean);

    session.stop(None);
}

#[tokio::test]
async fn test_streaming_finished_refetches_history() {
    let store = ScriptedStore::seeded(&["a"]).await;
    let (session, _handle) = open_session(&store, quiet(), true).await;

    set_status(&session, BlockStatus::Streaming).unwrap();
    store.inner.save_content(DOC, "Notes", "streamed").await.unwrap();
    let view = get_view(&session).await.unwrap();
    assert_eq!(view.block_status, BlockStatus::Streaming);
    assert_eq!(view.version_count, 1);

    set_status(&session, BlockStatus::Idle).unwrap();
    sleep(Duration::from_millis(QUIET_MS)).await;

    let view = get_view(&session).await.unwrap();
    assert_eq!(view.block_status, BlockStatus::Idle);
    assert_eq!(view.version_count, 2);
    assert_eq!(view.content, "streamed");

    session.stop(None);
}

#[tokio::test]
async fn test_unavailable_history_until_reload() {
    let store = ScriptedStore::seeded(&["a", "ab"]).await;
    store.fail_fetches.store(true, Ordering::SeqCst);
    let (session, _handle) = open_session(&store, quiet(), true).await;

    let view = get_view(&session).await.unwrap();
    assert!(!view.loaded);
    assert!(view.is_current_version);
    assert_eq!(view.cursor, None);

    edit(&session, "typed too early", false).unwrap();
    let err = reload(&session).await.unwrap_err();
    assert!(matches!(err, SessionError::Store(StoreError::Unavailable(_))));

    store.fail_fetches.store(false, Ordering::SeqCst);
    let view = reload(&session).await.unwrap();
    assert!(view.loaded);
    assert_eq!(view.cursor, Some(1));
    assert_eq!(view.content, "ab");
    assert!(store.attempts().is_empty());

    session.stop(None);
}

// ─── Closing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_close_flushes_pending_edit() {
    let store = ScriptedStore::seeded(&["a", "ab", "abc"]).await;
    let (session, handle) = open_session(&store, Duration::from_secs(10), true).await;

    edit(&session, "abcd", true).unwrap();
    let summary = close(&session).await.unwrap();

    assert!(!summary.dirty);
    assert_eq!(summary.save_status, SaveStatus::Clean);
    assert_eq!(summary.version_count, 4);
    assert_eq!(store.attempts(), vec!["abcd".to_string()]);
    handle.await.unwrap();
}

#[tokio::test]
async fn test_close_without_flush_reports_dirty() {
    let store = ScriptedStore::seeded(&["a", "ab", "abc"]).await;
    let (session, handle) = open_session(&store, Duration::from_secs(10), false).await;

    edit(&session, "abcd", true).unwrap();
    let summary = close(&session).await.unwrap();

    assert!(summary.dirty);
    assert_eq!(summary.save_status, SaveStatus::Dirty);
    assert_eq!(summary.version_count, 3);
    assert!(store.attempts().is_empty());
    handle.await.unwrap();
}
