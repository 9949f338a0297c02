use std::collections::HashMap;
use std::sync::Mutex;

use super::{DraftError, DraftKey, DraftRecord, DraftStore};

/// Process-local draft backend
#[derive(Default)]
pub struct MemoryDraftStore {
    records: Mutex<HashMap<DraftKey, DraftRecord>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<DraftKey, DraftRecord>>, DraftError> {
        self.records
            .lock()
            .map_err(|_| DraftError::Unavailable("draft store lock poisoned".into()))
    }
}

impl DraftStore for MemoryDraftStore {
    fn read(&self, key: &DraftKey) -> Result<Option<DraftRecord>, DraftError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, record: &DraftRecord) -> Result<(), DraftError> {
        self.lock()?.insert(record.key(), record.clone());
        Ok(())
    }

    fn remove(&self, key: &DraftKey) -> Result<(), DraftError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn list(&self) -> Result<Vec<DraftRecord>, DraftError> {
        Ok(self.lock()?.values().cloned().collect())
    }
}
