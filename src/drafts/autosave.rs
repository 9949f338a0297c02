//! Debounced draft writes for keystroke-frequency updates

use std::time::{Duration, Instant};

use super::{DraftKey, Drafts};
use crate::form_data::FormData;

type SaveCallback = Box<dyn FnMut(&FormData) + Send>;

/// Batches draft saves for one draft slot.
///
/// The first change after a quiet period is written straight away; changes
/// that arrive within `debounce` of the previous write are held and written
/// by [`tick`](Self::tick) or [`flush`](Self::flush). Only the latest full
/// snapshot is kept, so the newest edit always wins.
pub struct DraftAutosave {
    drafts: Drafts,
    key: DraftKey,
    debounce: Duration,
    pending: Option<FormData>,
    last_write: Option<Instant>,
    on_save: Option<SaveCallback>,
}

impl DraftAutosave {
    pub fn new(drafts: Drafts, key: DraftKey, debounce: Duration) -> Self {
        Self {
            drafts,
            key,
            debounce,
            pending: None,
            last_write: None,
            on_save: None,
        }
    }

    /// Callback invoked with the snapshot after every write
    pub fn set_on_save(&mut self, callback: SaveCallback) {
        self.on_save = Some(callback);
    }

    pub fn key(&self) -> &DraftKey {
        &self.key
    }

    pub fn drafts(&self) -> &Drafts {
        &self.drafts
    }

    /// Whether a snapshot is waiting to be written
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn window_elapsed(&self, now: Instant) -> bool {
        self.last_write
            .map(|last| now.duration_since(last) >= self.debounce)
            .unwrap_or(true)
    }

    /// Record a new snapshot, writing it now if the debounce window allows
    pub fn record(&mut self, data: &FormData) {
        if self.window_elapsed(Instant::now()) {
            self.pending = None;
            self.write(data);
        } else {
            self.pending = Some(data.clone());
        }
    }

    /// Write the held snapshot once the debounce window has passed
    pub fn tick(&mut self) {
        if self.pending.is_some() && self.window_elapsed(Instant::now()) {
            self.flush();
        }
    }

    /// Write the held snapshot immediately
    pub fn flush(&mut self) {
        if let Some(data) = self.pending.take() {
            self.write(&data);
        }
    }

    /// Drop the held snapshot without writing it
    pub fn discard(&mut self) {
        self.pending = None;
    }

    fn write(&mut self, data: &FormData) {
        self.drafts
            .save_draft(&self.key.form_type, &self.key.owner_id, data);
        self.last_write = Some(Instant::now());
        if let Some(callback) = self.on_save.as_mut() {
            callback(data);
        }
    }
}
