//! Single-slot persistence of the conversation handle.

use std::sync::Arc;

use crate::config::PREVIOUS_RESPONSE_KEY;
use crate::models::ConversationHandle;
use crate::storage::{KeyValueStore, StoreError};

/// Holds at most one conversation handle, surviving restarts.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The stored handle, or `None` if never set, cleared, or blank.
    pub fn get(&self) -> Result<Option<ConversationHandle>, StoreError> {
        Ok(self
            .store
            .get(PREVIOUS_RESPONSE_KEY)?
            .and_then(ConversationHandle::new))
    }

    /// Replace the stored handle.
    pub fn set(&self, handle: &ConversationHandle) -> Result<(), StoreError> {
        self.store.set(PREVIOUS_RESPONSE_KEY, handle.as_str())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(PREVIOUS_RESPONSE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};

    #[test]
    fn set_get_clear() {
        let session = SessionStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(session.get().unwrap(), None);

        let handle = ConversationHandle::new("resp_1").unwrap();
        session.set(&handle).unwrap();
        session.set(&handle).unwrap();
        assert_eq!(session.get().unwrap(), Some(handle));

        session.clear().unwrap();
        assert_eq!(session.get().unwrap(), None);
    }

    #[test]
    fn blank_stored_value_reads_as_absent() {
        let store = Arc::new(MemoryStore::new());
        store.set(PREVIOUS_RESPONSE_KEY, "   ").unwrap();
        assert_eq!(SessionStore::new(store).get().unwrap(), None);
    }

    #[test]
    fn handle_survives_restart_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let handle = ConversationHandle::new("resp_42").unwrap();
        SessionStore::new(Arc::new(FileStore::open_at(dir.path()).unwrap()))
            .set(&handle)
            .unwrap();

        let reopened = SessionStore::new(Arc::new(FileStore::open_at(dir.path()).unwrap()));
        assert_eq!(reopened.get().unwrap(), Some(handle));
    }

    #[test]
    fn storage_errors_propagate() {
        let store = Arc::new(MemoryStore::new());
        store.set_failing(true);
        let session = SessionStore::new(store);
        assert!(session.get().is_err());
        assert!(session.clear().is_err());
    }
}
