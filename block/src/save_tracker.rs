//! Dirty/save tracking for the document editor.
//!
//! The tracker decides *when* content must be persisted; it never touches a
//! clock or a store. The owner arms a timer whenever [`EditOutcome::Armed`]
//! comes back and reports it with [`SaveTracker::timer_fired`]; it runs every
//! [`SaveRequest`] it is handed and reports the result with
//! [`SaveTracker::acknowledged`] or [`SaveTracker::failed`].
//!
//! At most one request is in flight. Edits made meanwhile collapse into a
//! single queued payload, so saves leave in edit order and only the last
//! edit of a burst is guaranteed to be sent.

use shared_types::SaveStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Wait for the quiet window; every new edit restarts it
    Debounced,
    /// Persist right away
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub request_id: u64,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// No baseline yet, the edit is ignored
    NotLoaded,
    /// Content equals the persisted snapshot; nothing to save
    Unchanged,
    /// Content equals the save already in flight
    Coalesced,
    /// (Re)arm the quiet window for this generation
    Armed { generation: u64 },
    /// Persist now
    Issue(SaveRequest),
    /// Persist once the in-flight save settles
    Queued,
}

#[derive(Debug, Clone)]
struct InFlight {
    request_id: u64,
    content: String,
}

#[derive(Debug, Clone)]
struct FailedSave {
    content: String,
    error: String,
}

#[derive(Debug, Clone, Default)]
pub struct SaveTracker {
    persisted: Option<String>,
    pending: Option<String>,
    in_flight: Option<InFlight>,
    failure: Option<FailedSave>,
    generation: u64,
    armed: bool,
    held: bool,
    next_request_id: u64,
}

impl SaveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the content of the latest snapshot fetched from the store.
    pub fn set_persisted(&mut self, content: impl Into<String>) {
        let content = content.into();
        if self.pending.as_deref() == Some(content.as_str()) && self.in_flight.is_none() {
            self.pending = None;
            self.disarm();
        }
        self.persisted = Some(content);
    }

    pub fn is_loaded(&self) -> bool {
        self.persisted.is_some()
    }

    pub fn persisted(&self) -> Option<&str> {
        self.persisted.as_deref()
    }

    pub fn edit(&mut self, content: impl Into<String>, mode: SaveMode) -> EditOutcome {
        let content = content.into();
        let Some(persisted) = self.persisted.as_deref() else {
            return EditOutcome::NotLoaded;
        };
        let matches_persisted = content == persisted;
        let matches_in_flight = self
            .in_flight
            .as_ref()
            .map(|in_flight| in_flight.content == content);

        match matches_in_flight {
            Some(true) => {
                self.pending = None;
                self.disarm();
                return EditOutcome::Coalesced;
            }
            None if matches_persisted => {
                self.pending = None;
                self.failure = None;
                self.disarm();
                return EditOutcome::Unchanged;
            }
            _ => {}
        }

        self.failure = None;
        self.pending = Some(content);
        match mode {
            SaveMode::Debounced => {
                self.generation += 1;
                self.armed = true;
                EditOutcome::Armed {
                    generation: self.generation,
                }
            }
            SaveMode::Immediate => {
                self.disarm();
                match self.issue_queued() {
                    Some(request) => EditOutcome::Issue(request),
                    None => EditOutcome::Queued,
                }
            }
        }
    }

    /// The quiet window of `generation` elapsed.
    ///
    /// Fires from superseded generations are ignored. A fire while a save
    /// is in flight leaves the content queued behind it.
    pub fn timer_fired(&mut self, generation: u64) -> Option<SaveRequest> {
        if !self.armed || generation != self.generation {
            return None;
        }
        self.armed = false;
        self.issue_queued()
    }

    /// The store accepted `request_id`; `content` is what it now holds as
    /// the latest snapshot. Returns the queued request to run next, if any.
    pub fn acknowledged(&mut self, request_id: u64, content: impl Into<String>) -> Option<SaveRequest> {
        if !self.is_in_flight(request_id) {
            return None;
        }
        let content = content.into();
        self.in_flight = None;
        self.failure = None;
        if self.pending.as_deref() == Some(content.as_str()) {
            self.pending = None;
            self.disarm();
        }
        self.persisted = Some(content);
        self.issue_queued()
    }

    /// The store rejected `request_id`. The content stays unsaved and is
    /// not retried; a newer queued edit is still sent.
    pub fn failed(&mut self, request_id: u64, error: impl Into<String>) -> Option<SaveRequest> {
        if !self.is_in_flight(request_id) {
            return None;
        }
        if let Some(in_flight) = self.in_flight.take() {
            self.failure = Some(FailedSave {
                content: in_flight.content,
                error: error.into(),
            });
        }
        self.issue_queued()
    }

    /// Cut the quiet window short and send pending content now.
    pub fn flush(&mut self) -> Option<SaveRequest> {
        self.disarm();
        self.held = false;
        self.issue_queued()
    }

    /// Drop the quiet window and stop sending pending content. It stays
    /// dirty; the save already in flight still completes.
    pub fn hold(&mut self) {
        self.disarm();
        self.held = true;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.pending.is_some() || self.in_flight.is_some() || self.failure.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.failure.as_ref().map(|failure| failure.error.as_str())
    }

    pub fn status(&self) -> SaveStatus {
        if self.in_flight.is_some() {
            SaveStatus::Saving
        } else if let Some(failure) = &self.failure {
            SaveStatus::Error(failure.error.clone())
        } else if self.pending.is_some() {
            SaveStatus::Dirty
        } else {
            SaveStatus::Clean
        }
    }

    /// Newest content the user produced, saved or not.
    pub fn working_content(&self) -> Option<&str> {
        self.pending
            .as_deref()
            .or_else(|| self.in_flight.as_ref().map(|in_flight| in_flight.content.as_str()))
            .or_else(|| self.failure.as_ref().map(|failure| failure.content.as_str()))
            .or(self.persisted.as_deref())
    }

    fn is_in_flight(&self, request_id: u64) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.request_id == request_id)
    }

    fn disarm(&mut self) {
        if self.armed {
            self.armed = false;
            self.generation += 1;
        }
    }

    fn issue_queued(&mut self) -> Option<SaveRequest> {
        if self.armed || self.held || self.in_flight.is_some() {
            return None;
        }
        let content = self.pending.take()?;
        self.next_request_id += 1;
        let request = SaveRequest {
            request_id: self.next_request_id,
            content,
        };
        self.in_flight = Some(InFlight {
            request_id: request.request_id,
            content: request.content.clone(),
        });
        Some(request)
    }
}
