use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use shared_types::DocumentSnapshot;
use tokio::sync::RwLock;

use super::{DocumentStore, SaveAck, StoreError};

/// Process-local, append-only document history.
pub struct InMemoryDocumentStore {
    user_id: String,
    documents: RwLock<HashMap<String, Vec<DocumentSnapshot>>>,
}

impl InMemoryDocumentStore {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Append each entry of `contents` as a snapshot, skipping repeats.
    pub async fn seed<I, S>(&self, document_id: &str, title: &str, contents: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut documents = self.documents.write().await;
        let history = documents.entry(document_id.to_string()).or_default();
        for content in contents {
            self.append(history, document_id, title, content.as_ref());
        }
    }

    pub async fn snapshot_count(&self, document_id: &str) -> usize {
        self.documents
            .read()
            .await
            .get(document_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn append(
        &self,
        history: &mut Vec<DocumentSnapshot>,
        document_id: &str,
        title: &str,
        content: &str,
    ) -> SaveAck {
        if let Some(latest) = history.last() {
            if latest.content == content {
                return SaveAck {
                    snapshot: latest.clone(),
                    appended: false,
                };
            }
        }

        // Keep creation times strictly increasing so ordering by time
        // matches append order.
        let now = Utc::now();
        let created_at = match history.last() {
            Some(latest) if latest.created_at >= now => latest.created_at + Duration::milliseconds(1),
            _ => now,
        };

        let snapshot = DocumentSnapshot {
            id: document_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at,
            user_id: self.user_id.clone(),
        };
        history.push(snapshot.clone());
        SaveAck {
            snapshot,
            appended: true,
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn fetch_version_history(
        &self,
        document_id: &str,
    ) -> Result<Vec<DocumentSnapshot>, StoreError> {
        Ok(self
            .documents
            .read()
            .await
            .get(document_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_content(
        &self,
        document_id: &str,
        title: &str,
        content: &str,
    ) -> Result<SaveAck, StoreError> {
        if document_id.trim().is_empty() {
            return Err(StoreError::Rejected("document id is empty".to_string()));
        }

        let mut documents = self.documents.write().await;
        let history = documents.entry(document_id.to_string()).or_default();
        let ack = self.append(history, document_id, title, content);
        tracing::debug!(
            document_id = %document_id,
            appended = ack.appended,
            versions = history.len(),
            "Document content saved"
        );
        Ok(ack)
    }
}
