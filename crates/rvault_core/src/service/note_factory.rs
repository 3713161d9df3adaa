//! Note construction with injected identity and time sources.

use crate::clock::{Clock, SystemClock};
use crate::model::note::{Note, NoteId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Produces fresh note identities.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> NoteId;
}

/// Random UUID v4 identities.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> NoteId {
        Uuid::new_v4().to_string()
    }
}

/// Predictable `<prefix>-<n>` identities, starting at 1.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> NoteId {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}-{n}", self.prefix)
    }
}

/// Builds new notes. Inserting them into a vault is the caller's job.
#[derive(Clone)]
pub struct NoteFactory {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl NoteFactory {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { ids, clock }
    }

    /// UUID identities and wall-clock timestamps.
    pub fn system() -> Self {
        Self::new(Arc::new(UuidGenerator), Arc::new(SystemClock))
    }

    /// Creates a note with `created_at == updated_at == now` and no tags.
    pub fn create_note(&self, content: impl Into<String>) -> Note {
        let now = self.clock.now_ms();
        Note {
            id: self.ids.next_id(),
            content: content.into(),
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
        }
    }
}
