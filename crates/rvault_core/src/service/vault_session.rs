//! Vault controller: one unlocked vault held in memory.
//!
//! # Responsibility
//! - Own the loaded vault, the note selection and the summary panel.
//! - Persist the whole vault after every mutation.
//! - Route AI helpers to the right note and guard against overlapping calls.
//!
//! # Invariants
//! - Exactly one vault per session; locking hands the storage back.
//! - Selection is either empty or names a note that exists in the vault.
//! - A failed save keeps the in-memory change and is reported through
//!   `take_save_warning`, never as a hard error.
//! - At most one AI request per note, and one summary, is in flight.

use crate::ai::completion::{AiError, TextCompletion};
use crate::clock::{Clock, SystemClock};
use crate::model::access_code::AccessCode;
use crate::model::note::{Note, NoteId};
use crate::model::vault::Vault;
use crate::repo::storage::KeyValueStorage;
use crate::repo::vault_store::{StoreError, VaultStore};
use crate::search::filter::filter_notes;
use crate::service::ai_service::AiTextService;
use crate::service::note_factory::{IdGenerator, NoteFactory, UuidGenerator};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Notes at or below this many characters are left out of summaries.
pub const SUMMARY_MIN_CHARS: usize = 10;

/// Session-level failure.
#[derive(Debug)]
pub enum SessionError {
    /// Operation needs a selected note.
    NoActiveNote,
    NoteNotFound(NoteId),
    /// An AI request for this note has not finished yet.
    AiBusy(NoteId),
    /// A vault summary request has not finished yet.
    SummaryBusy,
    Ai(AiError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoActiveNote => write!(f, "no note selected"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::AiBusy(id) => write!(f, "an AI request for note {id} is already running"),
            Self::SummaryBusy => write!(f, "a vault summary is already being generated"),
            Self::Ai(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Ai(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AiError> for SessionError {
    fn from(value: AiError) -> Self {
        Self::Ai(value)
    }
}

/// Result of a confirmation-gated delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The confirmation callback said no; nothing changed.
    Declined,
    /// No note with that id; nothing changed and nobody was asked.
    NotFound,
}

/// Result of an AI helper call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiOutcome {
    /// The result was merged into the note or the summary panel.
    Applied,
    /// Nothing to send (blank note, no summarizable notes).
    Skipped,
    /// The target note was deleted while the request was running.
    Discarded,
}

/// Snapshot of one note handed to an AI helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteAiRequest {
    note_id: NoteId,
    text: String,
}

impl NoteAiRequest {
    pub fn note_id(&self) -> &str {
        &self.note_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Snapshot of the note bodies handed to the summarizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    texts: Vec<String>,
}

impl SummaryRequest {
    pub fn texts(&self) -> &[String] {
        &self.texts
    }
}

/// In-memory controller over one unlocked vault.
pub struct VaultSession<S: KeyValueStorage> {
    store: VaultStore<S>,
    factory: NoteFactory,
    clock: Arc<dyn Clock>,
    vault: Vault,
    active: Option<NoteId>,
    summary: Option<String>,
    notes_in_flight: HashSet<NoteId>,
    summary_in_flight: bool,
    save_warning: Option<StoreError>,
}

impl<S: KeyValueStorage> VaultSession<S> {
    /// Loads (or creates) the vault for `code` with UUID ids and wall time.
    pub fn unlock(storage: S, code: &AccessCode) -> Self {
        Self::unlock_with(storage, code, Arc::new(UuidGenerator), Arc::new(SystemClock))
    }

    /// Loads (or creates) the vault for `code` with injected ports.
    ///
    /// Nothing is written until the first mutation.
    pub fn unlock_with(
        storage: S,
        code: &AccessCode,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = VaultStore::with_clock(storage, clock.clone());
        let vault = store.load(code);
        info!(
            "event=vault_unlock module=session status=ok notes={}",
            vault.len()
        );
        Self {
            store,
            factory: NoteFactory::new(ids, clock.clone()),
            clock,
            vault,
            active: None,
            summary: None,
            notes_in_flight: HashSet::new(),
            summary_in_flight: false,
            save_warning: None,
        }
    }

    /// Closes the session and returns the storage backend.
    pub fn lock(self) -> S {
        info!(
            "event=vault_lock module=session status=ok notes={}",
            self.vault.len()
        );
        self.store.into_storage()
    }

    pub fn code(&self) -> &str {
        &self.vault.code
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// All notes, newest-created first.
    pub fn notes(&self) -> &[Note] {
        &self.vault.notes
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.vault.note(id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_note(&self) -> Option<&Note> {
        self.active.as_deref().and_then(|id| self.vault.note(id))
    }

    /// Text currently shown in the summary panel.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn dismiss_summary(&mut self) {
        self.summary = None;
    }

    /// Returns (and clears) the last save failure, if one happened.
    pub fn take_save_warning(&mut self) -> Option<StoreError> {
        self.save_warning.take()
    }

    /// Whether an AI request for `id` is still running.
    pub fn is_ai_busy(&self, id: &str) -> bool {
        self.notes_in_flight.contains(id)
    }

    /// Notes whose content or tags contain `term`, case-insensitively.
    pub fn filter(&self, term: &str) -> Vec<&Note> {
        filter_notes(&self.vault.notes, term)
    }

    /// Creates an empty note at the top of the list and selects it.
    pub fn add_note(&mut self) -> NoteId {
        let note = self.factory.create_note("");
        let id = note.id.clone();
        self.vault.prepend(note);
        self.active = Some(id.clone());
        info!(
            "event=note_add module=session status=ok note_id={} notes={}",
            id,
            self.vault.len()
        );
        self.persist();
        id
    }

    /// Selects an existing note.
    ///
    /// # Errors
    /// `NoteNotFound` when `id` is not in the vault; the selection is kept.
    pub fn select(&mut self, id: &str) -> Result<(), SessionError> {
        if self.vault.note(id).is_none() {
            return Err(SessionError::NoteNotFound(id.to_string()));
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.active = None;
    }

    /// Deletes a note after `confirm` approves it.
    ///
    /// Unknown ids are a no-op and `confirm` is not called.
    pub fn delete_note(
        &mut self,
        id: &str,
        confirm: impl FnOnce(&Note) -> bool,
    ) -> DeleteOutcome {
        let Some(note) = self.vault.note(id) else {
            return DeleteOutcome::NotFound;
        };
        if !confirm(note) {
            return DeleteOutcome::Declined;
        }

        self.vault.remove(id);
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        info!(
            "event=note_delete module=session status=ok note_id={} notes={}",
            id,
            self.vault.len()
        );
        self.persist();
        DeleteOutcome::Deleted
    }

    /// Replaces the selected note's content.
    ///
    /// # Errors
    /// `NoActiveNote` when nothing is selected.
    pub fn edit_active(&mut self, content: impl Into<String>) -> Result<(), SessionError> {
        let now = self.clock.now_ms();
        let note = self.active_note_mut()?;
        note.set_content(content, now);
        self.persist();
        Ok(())
    }

    /// Merges tags into the selected note. Returns how many were new.
    ///
    /// # Errors
    /// `NoActiveNote` when nothing is selected.
    pub fn add_tags_to_active<I, T>(&mut self, tags: I) -> Result<usize, SessionError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let added = self.active_note_mut()?.merge_tags(tags);
        if added > 0 {
            self.persist();
        }
        Ok(added)
    }

    /// Starts an enhance request for the selected note.
    ///
    /// Returns `Ok(None)` when the note is blank.
    ///
    /// # Errors
    /// `NoActiveNote`, or `AiBusy` when the note already has a request running.
    pub fn begin_enhance(&mut self) -> Result<Option<NoteAiRequest>, SessionError> {
        self.begin_note_request()
    }

    /// Applies an enhance result to the note it was requested for.
    ///
    /// # Errors
    /// Provider failures are returned as `SessionError::Ai`.
    pub fn finish_enhance(
        &mut self,
        request: NoteAiRequest,
        result: Result<String, AiError>,
    ) -> Result<AiOutcome, SessionError> {
        self.notes_in_flight.remove(&request.note_id);
        let improved = result?;

        let now = self.clock.now_ms();
        let Some(note) = self.vault.note_mut(&request.note_id) else {
            return Ok(AiOutcome::Discarded);
        };
        note.set_content(improved, now);
        info!(
            "event=note_enhance module=session status=ok note_id={}",
            request.note_id
        );
        self.persist();
        Ok(AiOutcome::Applied)
    }

    /// Starts a tag suggestion request for the selected note.
    ///
    /// Same contract as `begin_enhance`.
    pub fn begin_tagging(&mut self) -> Result<Option<NoteAiRequest>, SessionError> {
        self.begin_note_request()
    }

    /// Merges suggested tags into the note they were requested for.
    pub fn finish_tagging(&mut self, request: NoteAiRequest, tags: Vec<String>) -> AiOutcome {
        self.notes_in_flight.remove(&request.note_id);
        let Some(note) = self.vault.note_mut(&request.note_id) else {
            return AiOutcome::Discarded;
        };
        let added = note.merge_tags(&tags);
        info!(
            "event=note_tag module=session status=ok note_id={} added={}",
            request.note_id, added
        );
        if added > 0 {
            self.persist();
        }
        AiOutcome::Applied
    }

    /// Drops a note request that never reached the provider.
    ///
    /// Only the in-flight mark is cleared; the note is left as it was.
    pub fn cancel_request(&mut self, request: NoteAiRequest) {
        self.notes_in_flight.remove(&request.note_id);
        debug!(
            "event=ai_cancel module=session status=ok note_id={}",
            request.note_id
        );
    }

    /// Collects summarizable note bodies.
    ///
    /// Returns `Ok(None)` when no note is longer than `SUMMARY_MIN_CHARS`.
    ///
    /// # Errors
    /// `SummaryBusy` while another summary is being generated.
    pub fn begin_summary(&mut self) -> Result<Option<SummaryRequest>, SessionError> {
        if self.summary_in_flight {
            return Err(SessionError::SummaryBusy);
        }
        let texts: Vec<String> = self
            .vault
            .notes
            .iter()
            .filter(|note| note.content.chars().count() > SUMMARY_MIN_CHARS)
            .map(|note| note.content.clone())
            .collect();
        if texts.is_empty() {
            return Ok(None);
        }
        self.summary_in_flight = true;
        Ok(Some(SummaryRequest { texts }))
    }

    /// Shows a finished summary in the summary panel.
    pub fn finish_summary(&mut self, _request: SummaryRequest, summary: String) -> AiOutcome {
        self.summary_in_flight = false;
        self.summary = Some(summary);
        AiOutcome::Applied
    }

    /// Enhances the selected note in place.
    ///
    /// # Errors
    /// Guard errors from `begin_enhance` and provider failures.
    pub async fn enhance_active<C: TextCompletion>(
        &mut self,
        ai: &AiTextService<C>,
    ) -> Result<AiOutcome, SessionError> {
        let Some(request) = self.begin_enhance()? else {
            return Ok(AiOutcome::Skipped);
        };
        let result = ai.enhance(request.text()).await;
        self.finish_enhance(request, result)
    }

    /// Adds AI-suggested tags to the selected note.
    ///
    /// Provider failures yield no tags rather than an error.
    pub async fn tag_active<C: TextCompletion>(
        &mut self,
        ai: &AiTextService<C>,
    ) -> Result<AiOutcome, SessionError> {
        let Some(request) = self.begin_tagging()? else {
            return Ok(AiOutcome::Skipped);
        };
        let tags = ai.suggest_tags(request.text()).await;
        Ok(self.finish_tagging(request, tags))
    }

    /// Summarizes the vault into the summary panel.
    ///
    /// Provider failures show a placeholder rather than an error.
    pub async fn summarize<C: TextCompletion>(
        &mut self,
        ai: &AiTextService<C>,
    ) -> Result<AiOutcome, SessionError> {
        let Some(request) = self.begin_summary()? else {
            return Ok(AiOutcome::Skipped);
        };
        let summary = ai.summarize(request.texts()).await;
        Ok(self.finish_summary(request, summary))
    }

    fn begin_note_request(&mut self) -> Result<Option<NoteAiRequest>, SessionError> {
        let note = self.active_note().ok_or(SessionError::NoActiveNote)?;
        if self.notes_in_flight.contains(&note.id) {
            return Err(SessionError::AiBusy(note.id.clone()));
        }
        if note.is_blank() {
            return Ok(None);
        }
        let request = NoteAiRequest {
            note_id: note.id.clone(),
            text: note.content.clone(),
        };
        self.notes_in_flight.insert(request.note_id.clone());
        Ok(Some(request))
    }

    fn active_note_mut(&mut self) -> Result<&mut Note, SessionError> {
        let id = self.active.as_deref().ok_or(SessionError::NoActiveNote)?;
        self.vault
            .notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or(SessionError::NoActiveNote)
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(&mut self.vault) {
            warn!(
                "event=vault_save module=session status=error notes={} error={}",
                self.vault.len(),
                err
            );
            self.save_warning = Some(err);
        }
    }
}
