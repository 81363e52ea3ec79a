//! Persistence boundary for document history.
//!
//! The session never talks to a database directly; it goes through a
//! [`DocumentStore`]. Both calls are single-outcome async operations.

mod memory;

use async_trait::async_trait;
use shared_types::DocumentSnapshot;

pub use memory::InMemoryDocumentStore;

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveAck {
    /// Latest snapshot after the save
    pub snapshot: DocumentSnapshot,
    /// `false` when the content matched the latest snapshot and the
    /// history did not grow
    pub appended: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Save rejected: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All snapshots of `document_id`, oldest first. Unknown documents
    /// have an empty history.
    async fn fetch_version_history(
        &self,
        document_id: &str,
    ) -> Result<Vec<DocumentSnapshot>, StoreError>;

    /// Append `content` as a new snapshot unless it equals the latest one.
    async fn save_content(
        &self,
        document_id: &str,
        title: &str,
        content: &str,
    ) -> Result<SaveAck, StoreError>;
}
