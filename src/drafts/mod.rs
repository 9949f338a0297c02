//! Draft persistence for in-progress forms.
//!
//! A draft is the full `FormData` snapshot of an unfinished form, addressed by
//! `(form_type, owner_id)`. Backends implement the fallible [`DraftStore`];
//! the [`Drafts`] facade is what the wizard talks to and never surfaces a
//! persistence failure: saves log and continue, loads degrade to "no draft".

mod autosave;
mod file;
mod memory;

pub use autosave::DraftAutosave;
pub use file::FileDraftStore;
pub use memory::MemoryDraftStore;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form_data::FormData;

/// Composite draft address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DraftKey {
    pub form_type: String,
    pub owner_id: String,
}

impl DraftKey {
    pub fn new(form_type: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            form_type: form_type.into(),
            owner_id: owner_id.into(),
        }
    }
}

impl std::fmt::Display for DraftKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.form_type, self.owner_id)
    }
}

/// A persisted draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRecord {
    pub form_type: String,
    pub owner_id: String,
    pub data: FormData,
    pub saved_at: DateTime<Utc>,
}

impl DraftRecord {
    pub fn new(key: &DraftKey, data: FormData) -> Self {
        Self {
            form_type: key.form_type.clone(),
            owner_id: key.owner_id.clone(),
            data,
            saved_at: Utc::now(),
        }
    }

    pub fn key(&self) -> DraftKey {
        DraftKey::new(&self.form_type, &self.owner_id)
    }
}

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("draft I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("draft serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("draft storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage backend for drafts
pub trait DraftStore: Send + Sync {
    /// Read the record for `key`, `Ok(None)` if there is none
    fn read(&self, key: &DraftKey) -> Result<Option<DraftRecord>, DraftError>;

    /// Insert or replace the record for its key
    fn write(&self, record: &DraftRecord) -> Result<(), DraftError>;

    /// Delete the record for `key`; deleting a missing record succeeds
    fn remove(&self, key: &DraftKey) -> Result<(), DraftError>;

    /// All stored records
    fn list(&self) -> Result<Vec<DraftRecord>, DraftError>;
}

/// Infallible draft facade used by the wizard shell and the CLI
#[derive(Clone)]
pub struct Drafts {
    store: Arc<dyn DraftStore>,
}

impl Drafts {
    pub fn new(store: Arc<dyn DraftStore>) -> Self {
        Self { store }
    }

    /// In-memory drafts, mostly for tests and embedding
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryDraftStore::new()))
    }

    fn read(&self, form_type: &str, owner_id: &str) -> Option<DraftRecord> {
        let key = DraftKey::new(form_type, owner_id);
        match self.store.read(&key) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(draft = %key, error = %e, "Failed to load draft, treating as absent");
                None
            }
        }
    }

    pub fn has_draft(&self, form_type: &str, owner_id: &str) -> bool {
        self.read(form_type, owner_id).is_some()
    }

    pub fn draft_timestamp(&self, form_type: &str, owner_id: &str) -> Option<DateTime<Utc>> {
        self.read(form_type, owner_id).map(|r| r.saved_at)
    }

    pub fn load_draft(&self, form_type: &str, owner_id: &str) -> Option<FormData> {
        self.read(form_type, owner_id).map(|r| r.data)
    }

    pub fn save_draft(&self, form_type: &str, owner_id: &str, data: &FormData) {
        let key = DraftKey::new(form_type, owner_id);
        let record = DraftRecord::new(&key, data.clone());
        match self.store.write(&record) {
            Ok(()) => tracing::trace!(draft = %key, fields = data.len(), "Draft saved"),
            Err(e) => tracing::warn!(draft = %key, error = %e, "Failed to save draft"),
        }
    }

    pub fn clear_draft(&self, form_type: &str, owner_id: &str) {
        let key = DraftKey::new(form_type, owner_id);
        if let Err(e) = self.store.remove(&key) {
            tracing::warn!(draft = %key, error = %e, "Failed to clear draft");
        }
    }

    /// All drafts, newest first
    pub fn list_drafts(&self) -> Vec<DraftRecord> {
        match self.store.list() {
            Ok(mut records) => {
                records.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
                records
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list drafts");
                Vec::new()
            }
        }
    }
}
