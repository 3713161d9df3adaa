//! Vault record model.
//!
//! # Responsibility
//! - Own the ordered note collection for one access code.
//! - Validate records read back from storage.
//!
//! # Invariants
//! - Note ids are unique within a vault.
//! - Notes are ordered newest-created first; new notes are prepended.
//! - `code` is the only identity of a vault.

use super::access_code::AccessCode;
use super::note::{Note, NoteId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// All notes stored under one access code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vault {
    pub code: String,
    pub notes: Vec<Note>,
    /// Unix epoch milliseconds, stamped on every save.
    pub last_access: i64,
}

/// Reasons a stored vault record is rejected on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultValidationError {
    CodeMismatch { expected: String, found: String },
    EmptyNoteId,
    DuplicateNoteId(NoteId),
    UpdatedBeforeCreated(NoteId),
}

impl Display for VaultValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CodeMismatch { expected, found } => {
                write!(f, "vault code mismatch: expected `{expected}`, found `{found}`")
            }
            Self::EmptyNoteId => write!(f, "note id cannot be empty"),
            Self::DuplicateNoteId(id) => write!(f, "duplicate note id: {id}"),
            Self::UpdatedBeforeCreated(id) => {
                write!(f, "note {id} has updatedAt earlier than createdAt")
            }
        }
    }
}

impl Error for VaultValidationError {}

impl Vault {
    /// Creates an empty vault for `code`.
    pub fn empty(code: &AccessCode, now_ms: i64) -> Self {
        Self {
            code: code.as_str().to_string(),
            notes: Vec::new(),
            last_access: now_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn note_mut(&mut self, id: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|note| note.id == id)
    }

    /// Inserts a note at the front of the collection.
    pub fn prepend(&mut self, note: Note) {
        self.notes.insert(0, note);
    }

    /// Removes the note with `id`, leaving every other note untouched.
    ///
    /// Returns `None` when no such note exists.
    pub fn remove(&mut self, id: &str) -> Option<Note> {
        let index = self.notes.iter().position(|note| note.id == id)?;
        Some(self.notes.remove(index))
    }

    /// Checks record invariants for data that came from outside core.
    ///
    /// # Errors
    /// - `CodeMismatch` when the record was stored under another code.
    /// - `EmptyNoteId` / `DuplicateNoteId` on identity violations.
    /// - `UpdatedBeforeCreated` when timestamps are inverted.
    pub fn validate(&self, expected: &AccessCode) -> Result<(), VaultValidationError> {
        if self.code != expected.as_str() {
            return Err(VaultValidationError::CodeMismatch {
                expected: expected.as_str().to_string(),
                found: self.code.clone(),
            });
        }

        let mut seen = HashSet::with_capacity(self.notes.len());
        for note in &self.notes {
            if note.id.is_empty() {
                return Err(VaultValidationError::EmptyNoteId);
            }
            if !seen.insert(note.id.as_str()) {
                return Err(VaultValidationError::DuplicateNoteId(note.id.clone()));
            }
            if note.updated_at < note.created_at {
                return Err(VaultValidationError::UpdatedBeforeCreated(note.id.clone()));
            }
        }
        Ok(())
    }
}
