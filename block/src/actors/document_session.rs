//! DocumentSessionActor - one open document block
//!
//! Owns everything the document panel needs to stay consistent:
//! - the fetched version history (absent until the first fetch succeeds)
//! - the version cursor and display mode
//! - the dirty/save state and the debounce timer
//!
//! All transitions happen on the actor's mailbox. Store calls and the quiet
//! window run on spawned tasks that report back with a message, so a slow
//! store never holds up navigation or further edits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use serde::{Deserialize, Serialize};
use shared_types::{
    BlockStatus, DisplayMode, DocumentSnapshot, DocumentView, SaveStatus, VersionCommand,
};
use tokio::task::JoinHandle;

use crate::navigator::{content_at, VersionNavigator};
use crate::save_tracker::{EditOutcome, SaveMode, SaveRequest, SaveTracker};
use crate::store::{DocumentStore, SaveAck, StoreError};

/// Actor that owns one document session
#[derive(Debug, Default)]
pub struct DocumentSessionActor;

/// Arguments for spawning DocumentSessionActor
#[derive(Clone)]
pub struct DocumentSessionArguments {
    pub document_id: String,
    pub title: String,
    pub store: Arc<dyn DocumentStore>,
    /// Quiet window for debounced edits
    pub save_debounce: Duration,
    /// Send pending content when the session closes instead of dropping it
    pub flush_on_close: bool,
}

/// State for DocumentSessionActor
pub struct DocumentSessionState {
    document_id: String,
    title: String,
    store: Arc<dyn DocumentStore>,
    save_debounce: Duration,
    flush_on_close: bool,
    history: Option<Vec<DocumentSnapshot>>,
    navigator: VersionNavigator,
    tracker: SaveTracker,
    block_status: BlockStatus,
    debounce_timer: Option<JoinHandle<()>>,
    closing: bool,
    close_waiters: Vec<RpcReplyPort<CloseSummary>>,
}

// ============================================================================
// Messages
// ============================================================================

/// Messages handled by DocumentSessionActor
#[derive(Debug)]
pub enum DocumentSessionMsg {
    /// Editor content changed
    Edit { content: String, debounce: bool },
    /// Toolbar version command
    Version {
        command: VersionCommand,
        reply: RpcReplyPort<DocumentView>,
    },
    /// The assistant started or stopped streaming into the block
    SetStatus { status: BlockStatus },
    /// Refetch the version history
    Reload {
        reply: RpcReplyPort<Result<DocumentView, SessionError>>,
    },
    /// Current projection for the view
    GetView { reply: RpcReplyPort<DocumentView> },
    /// Close the block; replies once outstanding saves settle
    Close { reply: RpcReplyPort<CloseSummary> },
    /// Quiet window elapsed (internal)
    DebounceElapsed { generation: u64 },
    /// Store answered a save (internal)
    SaveFinished {
        request_id: u64,
        result: Result<SaveAck, StoreError>,
    },
    /// Store answered a history fetch (internal)
    HistoryFetched {
        result: Result<Vec<DocumentSnapshot>, StoreError>,
        reply: Option<RpcReplyPort<Result<DocumentView, SessionError>>>,
    },
}

/// Final state reported when a session closes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CloseSummary {
    pub document_id: String,
    /// `true` when content never reached the store
    pub dirty: bool,
    pub save_status: SaveStatus,
    pub version_count: usize,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error, Clone)]
pub enum SessionError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Session is closing")]
    Closing,

    #[error("Actor RPC failed: {0}")]
    Rpc(String),
}

// ============================================================================
// Actor Implementation
// ============================================================================

#[async_trait]
impl Actor for DocumentSessionActor {
    type Msg = DocumentSessionMsg;
    type State = DocumentSessionState;
    type Arguments = DocumentSessionArguments;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            actor_id = %myself.get_id(),
            document_id = %args.document_id,
            debounce_ms = args.save_debounce.as_millis() as u64,
            "DocumentSessionActor starting"
        );

        let mut state = DocumentSessionState {
            document_id: args.document_id,
            title: args.title,
            store: args.store,
            save_debounce: args.save_debounce,
            flush_on_close: args.flush_on_close,
            history: None,
            navigator: VersionNavigator::new(),
            tracker: SaveTracker::new(),
            block_status: BlockStatus::Idle,
            debounce_timer: None,
            closing: false,
            close_waiters: Vec::new(),
        };

        let fetched = state.store.fetch_version_history(&state.document_id).await;
        match fetched {
            Ok(history) => state.apply_history(history),
            Err(e) => {
                tracing::warn!(
                    document_id = %state.document_id,
                    error = %e,
                    "Version history unavailable; session starts without it"
                );
            }
        }

        Ok(state)
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.abort_timer();
        tracing::info!(document_id = %state.document_id, "DocumentSessionActor stopped");
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DocumentSessionMsg::Edit { content, debounce } => {
                self.handle_edit(&myself, state, content, debounce);
            }
            DocumentSessionMsg::Version { command, reply } => {
                let len = state.history_len();
                if state.navigator.apply(command, len) {
                    tracing::debug!(
                        document_id = %state.document_id,
                        command = ?command,
                        cursor = ?state.navigator.cursor(),
                        mode = ?state.navigator.mode(),
                        "Version selection changed"
                    );
                }
                let _ = reply.send(state.view());
            }
            DocumentSessionMsg::SetStatus { status } => {
                let finished_streaming =
                    state.block_status == BlockStatus::Streaming && status == BlockStatus::Idle;
                state.block_status = status;
                if finished_streaming && !state.closing {
                    state.spawn_fetch(&myself, None);
                }
            }
            DocumentSessionMsg::Reload { reply } => {
                if state.closing {
                    let _ = reply.send(Err(SessionError::Closing));
                } else {
                    state.spawn_fetch(&myself, Some(reply));
                }
            }
            DocumentSessionMsg::GetView { reply } => {
                let _ = reply.send(state.view());
            }
            DocumentSessionMsg::Close { reply } => {
                self.handle_close(&myself, state, reply);
            }
            DocumentSessionMsg::DebounceElapsed { generation } => {
                if generation == state.tracker.generation() {
                    state.debounce_timer = None;
                }
                if let Some(request) = state.tracker.timer_fired(generation) {
                    state.spawn_save(&myself, request);
                }
            }
            DocumentSessionMsg::SaveFinished { request_id, result } => {
                self.handle_save_finished(&myself, state, request_id, result);
            }
            DocumentSessionMsg::HistoryFetched { result, reply } => {
                let result = match result {
                    Ok(history) => {
                        state.apply_history(history);
                        Ok(state.view())
                    }
                    Err(e) => {
                        tracing::warn!(
                            document_id = %state.document_id,
                            error = %e,
                            "Failed to refetch version history"
                        );
                        Err(SessionError::from(e))
                    }
                };
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Client helpers
// ============================================================================

/// Send editor content to the session.
pub fn edit(
    session: &ActorRef<DocumentSessionMsg>,
    content: impl Into<String>,
    debounce: bool,
) -> Result<(), SessionError> {
    session
        .cast(DocumentSessionMsg::Edit {
            content: content.into(),
            debounce,
        })
        .map_err(|e| SessionError::Rpc(e.to_string()))
}

pub async fn apply_command(
    session: &ActorRef<DocumentSessionMsg>,
    command: VersionCommand,
) -> Result<DocumentView, SessionError> {
    ractor::call!(session, |reply| DocumentSessionMsg::Version { command, reply })
        .map_err(|e| SessionError::Rpc(e.to_string()))
}

pub fn set_status(
    session: &ActorRef<DocumentSessionMsg>,
    status: BlockStatus,
) -> Result<(), SessionError> {
    session
        .cast(DocumentSessionMsg::SetStatus { status })
        .map_err(|e| SessionError::Rpc(e.to_string()))
}

pub async fn reload(session: &ActorRef<DocumentSessionMsg>) -> Result<DocumentView, SessionError> {
    ractor::call!(session, |reply| DocumentSessionMsg::Reload { reply })
        .map_err(|e| SessionError::Rpc(e.to_string()))?
}

pub async fn get_view(session: &ActorRef<DocumentSessionMsg>) -> Result<DocumentView, SessionError> {
    ractor::call!(session, |reply| DocumentSessionMsg::GetView { reply })
        .map_err(|e| SessionError::Rpc(e.to_string()))
}

/// Close the session, waiting for outstanding saves to settle.
pub async fn close(session: &ActorRef<DocumentSessionMsg>) -> Result<CloseSummary, SessionError> {
    ractor::call!(session, |reply| DocumentSessionMsg::Close { reply })
        .map_err(|e| SessionError::Rpc(e.to_string()))
}

impl DocumentSessionActor {
    fn handle_edit(
        &self,
        myself: &ActorRef<DocumentSessionMsg>,
        state: &mut DocumentSessionState,
        content: String,
        debounce: bool,
    ) {
        if state.closing {
            tracing::warn!(document_id = %state.document_id, "Ignoring edit on closing session");
            return;
        }
        if !state.navigator.is_current_version(state.history_len()) {
            tracing::warn!(
                document_id = %state.document_id,
                cursor = ?state.navigator.cursor(),
                "Ignoring edit while an older version is displayed"
            );
            return;
        }

        let mode = if debounce {
            SaveMode::Debounced
        } else {
            SaveMode::Immediate
        };
        let outcome = state.tracker.edit(content, mode);
        tracing::debug!(document_id = %state.document_id, outcome = ?outcome, "Content edited");

        match outcome {
            EditOutcome::NotLoaded => {
                tracing::debug!(
                    document_id = %state.document_id,
                    "Edit dropped; version history not loaded"
                );
            }
            EditOutcome::Armed { generation } => state.arm_timer(myself, generation),
            EditOutcome::Issue(request) => {
                state.abort_timer();
                state.spawn_save(myself, request);
            }
            EditOutcome::Unchanged | EditOutcome::Coalesced | EditOutcome::Queued => {
                state.abort_timer();
            }
        }
    }

    fn handle_save_finished(
        &self,
        myself: &ActorRef<DocumentSessionMsg>,
        state: &mut DocumentSessionState,
        request_id: u64,
        result: Result<SaveAck, StoreError>,
    ) {
        let next = match result {
            Ok(ack) => {
                tracing::info!(
                    document_id = %state.document_id,
                    request_id,
                    appended = ack.appended,
                    "Document saved"
                );
                let next = state
                    .tracker
                    .acknowledged(request_id, ack.snapshot.content.clone());
                if ack.appended {
                    state.append_snapshot(ack.snapshot);
                }
                next
            }
            Err(e) => {
                tracing::warn!(
                    document_id = %state.document_id,
                    request_id,
                    error = %e,
                    "Document save failed; content stays unsaved"
                );
                state.tracker.failed(request_id, e.to_string())
            }
        };

        if let Some(request) = next {
            state.spawn_save(myself, request);
        }
        state.settle_close(myself);
    }

    fn handle_close(
        &self,
        myself: &ActorRef<DocumentSessionMsg>,
        state: &mut DocumentSessionState,
        reply: RpcReplyPort<CloseSummary>,
    ) {
        state.closing = true;
        state.abort_timer();
        if state.flush_on_close {
            if let Some(request) = state.tracker.flush() {
                tracing::info!(
                    document_id = %state.document_id,
                    request_id = request.request_id,
                    "Flushing pending content on close"
                );
                state.spawn_save(myself, request);
            }
        } else {
            state.tracker.hold();
        }
        state.close_waiters.push(reply);
        state.settle_close(myself);
    }
}

impl DocumentSessionState {
    fn history_len(&self) -> usize {
        self.history.as_ref().map(Vec::len).unwrap_or(0)
    }

    fn arm_timer(&mut self, myself: &ActorRef<DocumentSessionMsg>, generation: u64) {
        self.abort_timer();
        let timer_ref = myself.clone();
        let window = self.save_debounce;
        self.debounce_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = timer_ref.cast(DocumentSessionMsg::DebounceElapsed { generation });
        }));
    }

    fn abort_timer(&mut self) {
        if let Some(timer) = self.debounce_timer.take() {
            timer.abort();
        }
    }

    fn spawn_save(&self, myself: &ActorRef<DocumentSessionMsg>, request: SaveRequest) {
        tracing::debug!(
            document_id = %self.document_id,
            request_id = request.request_id,
            bytes = request.content.len(),
            "Issuing save"
        );
        let store = Arc::clone(&self.store);
        let document_id = self.document_id.clone();
        let title = self.title.clone();
        let reply_ref = myself.clone();
        tokio::spawn(async move {
            let result = store
                .save_content(&document_id, &title, &request.content)
                .await;
            let _ = reply_ref.cast(DocumentSessionMsg::SaveFinished {
                request_id: request.request_id,
                result,
            });
        });
    }

    fn spawn_fetch(
        &self,
        myself: &ActorRef<DocumentSessionMsg>,
        reply: Option<RpcReplyPort<Result<DocumentView, SessionError>>>,
    ) {
        let store = Arc::clone(&self.store);
        let document_id = self.document_id.clone();
        let reply_ref = myself.clone();
        tokio::spawn(async move {
            let result = store.fetch_version_history(&document_id).await;
            let _ = reply_ref.cast(DocumentSessionMsg::HistoryFetched { result, reply });
        });
    }

    /// Replace the local history with a fetched one, unless the fetch is
    /// older than what local saves already appended.
    fn apply_history(&mut self, history: Vec<DocumentSnapshot>) {
        let local_latest = self
            .history
            .as_ref()
            .and_then(|local| local.last())
            .map(|snapshot| snapshot.created_at);
        let fetched_latest = history.last().map(|snapshot| snapshot.created_at);
        if local_latest > fetched_latest {
            tracing::debug!(document_id = %self.document_id, "Discarding stale history fetch");
            return;
        }

        let previous_len = self.history_len();
        let new_len = history.len();
        let latest_content = history
            .last()
            .map(|snapshot| snapshot.content.clone())
            .unwrap_or_default();
        if let Some(latest) = history.last() {
            self.title = latest.title.clone();
        }
        self.history = Some(history);
        self.navigator.sync(previous_len, new_len);
        self.tracker.set_persisted(latest_content);
        tracing::debug!(
            document_id = %self.document_id,
            versions = new_len,
            cursor = ?self.navigator.cursor(),
            "Version history loaded"
        );
    }

    fn append_snapshot(&mut self, snapshot: DocumentSnapshot) {
        let Some(history) = self.history.as_mut() else {
            return;
        };
        if history
            .iter()
            .any(|existing| existing.created_at == snapshot.created_at)
        {
            return;
        }
        let previous_len = history.len();
        history.push(snapshot);
        let new_len = history.len();
        self.navigator.sync(previous_len, new_len);
        tracing::debug!(
            document_id = %self.document_id,
            versions = new_len,
            cursor = ?self.navigator.cursor(),
            "Snapshot appended"
        );
    }

    fn settle_close(&mut self, myself: &ActorRef<DocumentSessionMsg>) {
        if !self.closing || self.tracker.has_in_flight() {
            return;
        }
        let summary = CloseSummary {
            document_id: self.document_id.clone(),
            dirty: self.tracker.is_dirty(),
            save_status: self.tracker.status(),
            version_count: self.history_len(),
        };
        if summary.dirty {
            tracing::warn!(document_id = %self.document_id, "Session closed with unsaved content");
        }
        for waiter in self.close_waiters.drain(..) {
            let _ = waiter.send(summary.clone());
        }
        myself.stop(Some("closed".to_string()));
    }

    fn view(&self) -> DocumentView {
        let history = self.history.as_deref();
        let len = self.history_len();
        let cursor = self.navigator.cursor();
        let is_current_version = self.navigator.is_current_version(len);
        let selected = cursor
            .map(|index| content_at(history, index))
            .unwrap_or("");
        let content = if is_current_version {
            self.tracker.working_content().unwrap_or(selected)
        } else {
            selected
        };
        let mode = self.navigator.mode();

        DocumentView {
            document_id: self.document_id.clone(),
            title: self.title.clone(),
            loaded: self.history.is_some(),
            cursor,
            version_count: len,
            is_current_version,
            mode,
            content: content.to_string(),
            diff: match mode {
                DisplayMode::Diff => self.navigator.diff_pair(history),
                DisplayMode::Edit => None,
            },
            save_status: self.tracker.status(),
            updated_at: history
                .and_then(|snapshots| snapshots.last())
                .map(|snapshot| snapshot.created_at),
            block_status: self.block_status,
        }
    }
}
