//! JSON-file draft backend: one file per `(form_type, owner_id)`

use std::fs;
use std::path::{Path, PathBuf};

use super::{DraftError, DraftKey, DraftRecord, DraftStore};

/// Stores each draft as `<dir>/<form_type>__<owner_id>.json`, each part escaped
/// so distinct keys never share a file
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the draft file for a key
    pub fn draft_path(&self, key: &DraftKey) -> PathBuf {
        self.dir.join(format!(
            "{}__{}.json",
            escape(&key.form_type),
            escape(&key.owner_id)
        ))
    }

    fn ensure_dir(&self) -> Result<(), DraftError> {
        fs::create_dir_all(&self.dir).map_err(|source| DraftError::Io {
            path: self.dir.clone(),
            source,
        })
    }
}

/// Portable, reversible file-name part: `[A-Za-z0-9-]` passes through, every
/// other byte (`_` included) becomes `_XX`. An escaped part never contains `__`.
fn escape(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for byte in part.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("_{byte:02X}"));
        }
    }
    out
}

impl DraftStore for FileDraftStore {
    fn read(&self, key: &DraftKey) -> Result<Option<DraftRecord>, DraftError> {
        let path = self.draft_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(|source| DraftError::Io {
            path: path.clone(),
            source,
        })?;
        let record: DraftRecord = serde_json::from_str(&contents)?;

        // A hand-edited or misplaced file may hold another key
        if record.key() != *key {
            return Ok(None);
        }
        Ok(Some(record))
    }

    fn write(&self, record: &DraftRecord) -> Result<(), DraftError> {
        self.ensure_dir()?;
        let path = self.draft_path(&record.key());
        let contents = serde_json::to_string_pretty(record)?;

        // Sibling temp file, then rename over the target
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, contents).map_err(|source| DraftError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| DraftError::Io { path, source })
    }

    fn remove(&self, key: &DraftKey) -> Result<(), DraftError> {
        let path = self.draft_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(DraftError::Io { path, source }),
        }
    }

    fn list(&self) -> Result<Vec<DraftRecord>, DraftError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|source| DraftError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut records = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str::<DraftRecord>(&s).map_err(|e| e.to_string()))
            {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(path = ?path, error = %e, "Skipping unreadable draft"),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form_data::FormData;
    use tempfile::TempDir;

    #[test]
    fn test_write_read_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = FileDraftStore::new(temp.path().join("drafts"));
        let key = DraftKey::new("event", "u1");
        let record = DraftRecord::new(&key, FormData::with("title", "X"));

        store.write(&record).unwrap();

        assert_eq!(store.read(&key).unwrap(), Some(record));
    }

    #[test]
    fn test_read_missing_is_none() {
        let temp = TempDir::new().unwrap();
        let store = FileDraftStore::new(temp.path());

        assert!(store.read(&DraftKey::new("event", "u1")).unwrap().is_none());
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let temp = TempDir::new().unwrap();
        let store = FileDraftStore::new(temp.path());
        let key = DraftKey::new("event", "u1");

        store.remove(&key).unwrap();
        store.remove(&key).unwrap();
    }

    #[test]
    fn test_owner_ids_are_escaped_into_file_names() {
        let temp = TempDir::new().unwrap();
        let store = FileDraftStore::new(temp.path());

        let path = store.draft_path(&DraftKey::new("event", "../alice@example.com"));

        assert_eq!(path.parent(), Some(temp.path()));
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "event___2E_2E_2Falice_40example_2Ecom.json"
        );
    }

    #[test]
    fn test_keys_differing_only_in_escaped_characters_keep_separate_files() {
        let temp = TempDir::new().unwrap();
        let store = FileDraftStore::new(temp.path());
        let dotted = DraftKey::new("event", "a.b");
        let underscored = DraftKey::new("event", "a_b");
        let split = DraftKey::new("event_a", "b");

        assert_ne!(store.draft_path(&dotted), store.draft_path(&underscored));
        assert_ne!(store.draft_path(&underscored), store.draft_path(&split));

        for (key, title) in [(&dotted, "dot"), (&underscored, "underscore"), (&split, "split")] {
            store
                .write(&DraftRecord::new(key, FormData::with("title", title)))
                .unwrap();
        }

        let title = |key: &DraftKey| {
            store
                .read(key)
                .unwrap()
                .and_then(|r| r.data.get_str("title").map(str::to_string))
        };
        assert_eq!(title(&dotted).as_deref(), Some("dot"));
        assert_eq!(title(&underscored).as_deref(), Some("underscore"));
        assert_eq!(title(&split).as_deref(), Some("split"));

        store.remove(&dotted).unwrap();
        assert!(store.read(&dotted).unwrap().is_none());
        assert_eq!(title(&underscored).as_deref(), Some("underscore"));
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn test_corrupt_file_is_an_error_and_skipped_in_list() {
        let temp = TempDir::new().unwrap();
        let store = FileDraftStore::new(temp.path());
        let key = DraftKey::new("event", "u1");
        fs::write(store.draft_path(&key), "{not json").unwrap();

        assert!(store.read(&key).is_err());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_returns_all_drafts() {
        let temp = TempDir::new().unwrap();
        let store = FileDraftStore::new(temp.path());
        for owner in ["u1", "u2"] {
            let key = DraftKey::new("event", owner);
            store
                .write(&DraftRecord::new(&key, FormData::with("title", owner)))
                .unwrap();
        }

        assert_eq!(store.list().unwrap().len(), 2);
    }
}
