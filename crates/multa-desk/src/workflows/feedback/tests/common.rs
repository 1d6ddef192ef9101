use std::sync::Mutex;

use async_trait::async_trait;

use crate::workflows::feedback::domain::FeedbackEntry;
use crate::workflows::feedback::service::FeedbackStore;
use crate::workflows::CollaboratorError;

#[derive(Default)]
pub(super) struct MemoryStore {
    pub(super) entries: Mutex<Vec<FeedbackEntry>>,
    pub(super) offline: bool,
}

impl MemoryStore {
    pub(super) fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub(super) fn entries(&self) -> Vec<FeedbackEntry> {
        self.entries.lock().expect("store mutex").clone()
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn insert(&self, entry: FeedbackEntry) -> Result<(), CollaboratorError> {
        if self.offline {
            return Err(CollaboratorError::unavailable("feedback", "connection refused"));
        }
        self.entries.lock().expect("store mutex").push(entry);
        Ok(())
    }
}
