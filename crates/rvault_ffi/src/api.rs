//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Drive the lock screen and the single unlocked vault session from Dart.
//! - Run AI helpers without holding the session lock across provider calls.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - At most one vault is unlocked per process.
//! - Save failures are reported in `warning`, never as `ok = false`.

use log::{info, warn};
use once_cell::sync::{Lazy, OnceCell};
use rvault_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, AccessCode,
    AiOutcome, AiTextService, CodeEntry, DeleteOutcome, GeminiClient, Note, NoteAiRequest,
    SessionError, SqliteStorage, VaultConfig, VaultSession,
};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tokio::runtime::Runtime;

const FFI_DB_FILE_NAME: &str = "rvault_ffi.sqlite3";

type Session = VaultSession<SqliteStorage>;

static SESSION: Lazy<Mutex<Option<Session>>> = Lazy::new(|| Mutex::new(None));
static CODE_ENTRY: Lazy<Mutex<CodeEntry>> = Lazy::new(|| Mutex::new(CodeEntry::new()));
static CONFIG: OnceCell<VaultConfig> = OnceCell::new();
static AI: OnceCell<AiTextService<GeminiClient>> = OnceCell::new();
static RUNTIME: OnceCell<Runtime> = OnceCell::new();
static DB_PATH: OnceCell<PathBuf> = OnceCell::new();

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.trim()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Lock screen state after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockScreenState {
    /// Entered digits followed by `_` for open slots.
    pub display: String,
    /// Whether all digits are entered and `vault_unlock_entered` may run.
    pub complete: bool,
}

/// Note projection for list and editor panes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub active: bool,
}

/// Generic action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultActionResponse {
    pub ok: bool,
    /// Note affected by the action, when there is one.
    pub note_id: Option<String>,
    /// Human-readable outcome for the UI.
    pub message: String,
    /// Non-fatal save failure; the change is kept in memory.
    pub warning: Option<String>,
}

impl VaultActionResponse {
    fn success(message: impl Into<String>, note_id: Option<String>) -> Self {
        Self {
            ok: true,
            note_id,
            message: message.into(),
            warning: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            note_id: None,
            message: message.into(),
            warning: None,
        }
    }

    fn with_warning(mut self, session: &mut Session) -> Self {
        self.warning = session.take_save_warning().map(|err| err.to_string());
        self
    }
}

/// Vault overview for the list pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultListResponse {
    pub ok: bool,
    pub code: String,
    /// Total notes in the vault, ignoring the search filter.
    pub total: u32,
    pub items: Vec<NoteItem>,
    pub summary: Option<String>,
    pub message: String,
}

/// Appends one digit to the lock screen code.
#[flutter_rust_bridge::frb(sync)]
pub fn lock_push_digit(digit: String) -> LockScreenState {
    with_code_entry(|entry| {
        for ch in digit.chars() {
            entry.push_digit(ch);
        }
    })
}

/// Removes the last entered digit.
#[flutter_rust_bridge::frb(sync)]
pub fn lock_backspace() -> LockScreenState {
    with_code_entry(|entry| {
        entry.backspace();
    })
}

/// Unlocks the vault for the digits entered on the lock screen.
///
/// The entry is cleared whether or not the code is complete.
#[flutter_rust_bridge::frb(sync)]
pub fn vault_unlock_entered() -> VaultActionResponse {
    let code = {
        let mut entry = lock_or_recover(&CODE_ENTRY);
        let code = entry.submit();
        entry.clear();
        code
    };
    match code {
        Ok(code) => unlock(&code),
        Err(err) => VaultActionResponse::failure(err.to_string()),
    }
}

/// Unlocks the vault for a complete code string.
#[flutter_rust_bridge::frb(sync)]
pub fn vault_unlock(code: String) -> VaultActionResponse {
    match AccessCode::parse(code.trim()) {
        Ok(code) => unlock(&code),
        Err(err) => VaultActionResponse::failure(err.to_string()),
    }
}

/// Locks the vault and returns to the lock screen.
#[flutter_rust_bridge::frb(sync)]
pub fn vault_lock() -> VaultActionResponse {
    let session = lock_or_recover(&SESSION).take();
    match session {
        Some(session) => {
            drop(session.lock());
            VaultActionResponse::success("Vault locked.", None)
        }
        None => VaultActionResponse::success("Vault already locked.", None),
    }
}

/// Lists notes, optionally filtered by content or tag.
#[flutter_rust_bridge::frb(sync)]
pub fn vault_list(search: Option<String>) -> VaultListResponse {
    let guard = lock_or_recover(&SESSION);
    let Some(session) = guard.as_ref() else {
        return VaultListResponse {
            ok: false,
            code: String::new(),
            total: 0,
            items: Vec::new(),
            summary: None,
            message: "Vault is locked.".to_string(),
        };
    };

    let term = search.unwrap_or_default();
    let items = session
        .filter(&term)
        .into_iter()
        .map(|note| to_note_item(note, session.active_id()))
        .collect::<Vec<_>>();
    let message = if items.is_empty() {
        "No notes found.".to_string()
    } else {
        format!("{} note(s).", items.len())
    };
    VaultListResponse {
        ok: true,
        code: session.code().to_string(),
        total: u32::try_from(session.notes().len()).unwrap_or(u32::MAX),
        items,
        summary: session.summary().map(str::to_string),
        message,
    }
}

/// Returns the note open in the editor, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn note_active() -> Option<NoteItem> {
    let guard = lock_or_recover(&SESSION);
    let session = guard.as_ref()?;
    session
        .active_note()
        .map(|note| to_note_item(note, session.active_id()))
}

/// Creates an empty note at the top of the list and opens it.
#[flutter_rust_bridge::frb(sync)]
pub fn note_create() -> VaultActionResponse {
    with_session(|session| {
        let id = session.add_note();
        VaultActionResponse::success("Note created.", Some(id)).with_warning(session)
    })
}

/// Opens a note in the editor.
#[flutter_rust_bridge::frb(sync)]
pub fn note_select(note_id: String) -> VaultActionResponse {
    with_session(|session| match session.select(&note_id) {
        Ok(()) => VaultActionResponse::success("Note selected.", Some(note_id)),
        Err(err) => VaultActionResponse::failure(err.to_string()),
    })
}

/// Closes the editor without changing any note.
#[flutter_rust_bridge::frb(sync)]
pub fn note_deselect() -> VaultActionResponse {
    with_session(|session| {
        session.deselect();
        VaultActionResponse::success("No note selected.", None)
    })
}

/// Replaces the open note's content; called on every editor change.
#[flutter_rust_bridge::frb(sync)]
pub fn note_update_content(content: String) -> VaultActionResponse {
    with_session(|session| match session.edit_active(content) {
        Ok(()) => {
            let id = session.active_id().map(str::to_string);
            VaultActionResponse::success("Saved.", id).with_warning(session)
        }
        Err(err) => VaultActionResponse::failure(err.to_string()),
    })
}

/// Adds tags to the open note.
#[flutter_rust_bridge::frb(sync)]
pub fn note_add_tags(tags: Vec<String>) -> VaultActionResponse {
    with_session(|session| match session.add_tags_to_active(&tags) {
        Ok(added) => {
            let id = session.active_id().map(str::to_string);
            VaultActionResponse::success(format!("{added} tag(s) added."), id)
                .with_warning(session)
        }
        Err(err) => VaultActionResponse::failure(err.to_string()),
    })
}

/// Deletes a note once the UI has confirmed it.
///
/// `confirmed = false` leaves the vault untouched.
#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(note_id: String, confirmed: bool) -> VaultActionResponse {
    with_session(|session| match session.delete_note(&note_id, |_| confirmed) {
        DeleteOutcome::Deleted => {
            VaultActionResponse::success("Note deleted.", Some(note_id)).with_warning(session)
        }
        DeleteOutcome::Declined => VaultActionResponse::success("Delete cancelled.", None),
        DeleteOutcome::NotFound => VaultActionResponse::success("Note already gone.", None),
    })
}

/// Hides the summary panel.
#[flutter_rust_bridge::frb(sync)]
pub fn summary_dismiss() -> VaultActionResponse {
    with_session(|session| {
        session.dismiss_summary();
        VaultActionResponse::success("Summary dismissed.", None)
    })
}

/// Rewrites the open note with the AI provider.
///
/// # FFI contract
/// - Blocking call; run off the UI thread.
/// - Provider failures return `ok = false` with the error message.
pub fn ai_enhance_active() -> VaultActionResponse {
    let request = match with_session_result(|session| session.begin_enhance()) {
        Ok(Some(request)) => request,
        Ok(None) => return VaultActionResponse::success("Nothing to enhance.", None),
        Err(response) => return response,
    };
    let note_id = request.note_id().to_string();
    let result = match runtime() {
        Ok(runtime) => runtime.block_on(ai().enhance(request.text())),
        Err(message) => {
            release_note_request(request);
            return VaultActionResponse::failure(message);
        }
    };

    with_session(|session| match session.finish_enhance(request, result) {
        Ok(AiOutcome::Applied) => {
            VaultActionResponse::success("Note enhanced.", Some(note_id)).with_warning(session)
        }
        Ok(_) => VaultActionResponse::success("Note was deleted meanwhile.", None),
        Err(SessionError::Ai(err)) => {
            VaultActionResponse::failure(format!("Failed to enhance note: {err}"))
        }
        Err(err) => VaultActionResponse::failure(err.to_string()),
    })
}

/// Adds AI-suggested tags to the open note.
///
/// # FFI contract
/// - Blocking call; run off the UI thread.
/// - Provider failures add no tags and still return `ok = true`.
pub fn ai_tag_active() -> VaultActionResponse {
    let request = match with_session_result(|session| session.begin_tagging()) {
        Ok(Some(request)) => request,
        Ok(None) => return VaultActionResponse::success("Nothing to tag.", None),
        Err(response) => return response,
    };
    let note_id = request.note_id().to_string();
    let tags = match runtime() {
        Ok(runtime) => runtime.block_on(ai().suggest_tags(request.text())),
        Err(message) => {
            release_note_request(request);
            return VaultActionResponse::failure(message);
        }
    };

    with_session(|session| match session.finish_tagging(request, tags) {
        AiOutcome::Applied => {
            VaultActionResponse::success("Tags updated.", Some(note_id)).with_warning(session)
        }
        _ => VaultActionResponse::success("Note was deleted meanwhile.", None),
    })
}

/// Summarizes the vault into the summary panel.
///
/// # FFI contract
/// - Blocking call; run off the UI thread.
/// - Provider failures show a placeholder summary and return `ok = true`.
pub fn ai_summarize() -> VaultActionResponse {
    let request = match with_session_result(|session| session.begin_summary()) {
        Ok(Some(request)) => request,
        Ok(None) => return VaultActionResponse::success("No notes long enough to summarize.", None),
        Err(response) => return response,
    };
    let summary = match runtime() {
        Ok(runtime) => runtime.block_on(ai().summarize(request.texts())),
        Err(message) => message,
    };

    with_session(|session| {
        session.finish_summary(request, summary);
        VaultActionResponse::success("Summary ready.", None)
    })
}

fn unlock(code: &AccessCode) -> VaultActionResponse {
    let db_path = resolve_db_path();
    let storage = match SqliteStorage::open(&db_path) {
        Ok(storage) => storage,
        Err(err) => {
            warn!("event=ffi_unlock module=ffi status=error error={}", err);
            return VaultActionResponse::failure(format!("vault storage unavailable: {err}"));
        }
    };

    let session = VaultSession::unlock(storage, code);
    let count = session.notes().len();
    // Replacing an open session locks it implicitly.
    *lock_or_recover(&SESSION) = Some(session);
    info!("event=ffi_unlock module=ffi status=ok notes={}", count);
    VaultActionResponse::success(format!("Vault unlocked: {count} note(s)."), None)
}

fn with_code_entry(f: impl FnOnce(&mut CodeEntry)) -> LockScreenState {
    let mut entry = lock_or_recover(&CODE_ENTRY);
    f(&mut entry);
    LockScreenState {
        display: entry.display(),
        complete: entry.is_complete(),
    }
}

fn with_session(f: impl FnOnce(&mut Session) -> VaultActionResponse) -> VaultActionResponse {
    let mut guard = lock_or_recover(&SESSION);
    match guard.as_mut() {
        Some(session) => f(session),
        None => VaultActionResponse::failure("Vault is locked."),
    }
}

fn with_session_result<T>(
    f: impl FnOnce(&mut Session) -> Result<T, SessionError>,
) -> Result<T, VaultActionResponse> {
    let mut guard = lock_or_recover(&SESSION);
    let session = guard
        .as_mut()
        .ok_or_else(|| VaultActionResponse::failure("Vault is locked."))?;
    f(session).map_err(|err| VaultActionResponse::failure(err.to_string()))
}

/// Clears the in-flight mark when a request never reached the provider.
fn release_note_request(request: NoteAiRequest) {
    let mut guard = lock_or_recover(&SESSION);
    if let Some(session) = guard.as_mut() {
        session.cancel_request(request);
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn config() -> &'static VaultConfig {
    CONFIG.get_or_init(|| match VaultConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            warn!("event=ffi_config module=ffi status=degraded error={}", err);
            let home = std::env::temp_dir().join("rvault");
            VaultConfig {
                ai: Default::default(),
                db_path: home.join(FFI_DB_FILE_NAME),
                log_dir: home.join("logs"),
                log_level: rvault_core::default_log_level(),
            }
        }
    })
}

/// Database file for every unlock in this process; resolved once from
/// `VaultConfig`, the same source the CLI uses.
fn resolve_db_path() -> PathBuf {
    DB_PATH.get_or_init(|| config().db_path.clone()).clone()
}

fn ai() -> &'static AiTextService<GeminiClient> {
    AI.get_or_init(|| AiTextService::new(GeminiClient::new(&config().ai)))
}

fn runtime() -> Result<&'static Runtime, String> {
    RUNTIME
        .get_or_try_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
        })
        .map_err(|err| format!("failed to start async runtime: {err}"))
}

fn to_note_item(note: &Note, active_id: Option<&str>) -> NoteItem {
    NoteItem {
        id: note.id.clone(),
        title: note.title().to_string(),
        content: note.content.clone(),
        tags: note.tags.clone(),
        created_at: note.created_at,
        updated_at: note.updated_at,
        active: active_id == Some(note.id.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ai_enhance_active, core_version, init_logging, lock_backspace, lock_push_digit,
        note_active, note_add_tags, note_create, note_delete, note_deselect, note_select,
        note_update_content, release_note_request, vault_list, vault_lock, vault_unlock,
        vault_unlock_entered, with_session_result, DB_PATH, SESSION,
    };
    use once_cell::sync::Lazy;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Tests share the process-wide session.
    static SERIAL: Mutex<()> = Mutex::new(());
    static DB_DIR: Lazy<TempDir> = Lazy::new(|| tempfile::tempdir().expect("temp dir"));

    fn serial() -> std::sync::MutexGuard<'static, ()> {
        let guard = SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let path = DB_PATH.get_or_init(|| DB_DIR.path().join("vaults.sqlite3"));
        assert!(path.starts_with(DB_DIR.path()));
        guard
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/rvault-logs".to_string()).is_empty());
    }

    #[test]
    fn lock_screen_collects_three_digits_with_backspace() {
        let _guard = serial();
        lock_push_digit("1".to_string());
        lock_push_digit("9".to_string());
        let state = lock_backspace();
        assert_eq!(state.display, "1__");
        lock_push_digit("2".to_string());
        let state = lock_push_digit("3".to_string());
        assert!(state.complete);
        assert_eq!(state.display, "123");
        let state = lock_push_digit("4".to_string());
        assert_eq!(state.display, "123");

        let response = vault_unlock_entered();
        assert!(response.ok, "{}", response.message);
        assert!(vault_list(None).ok);
        assert!(vault_lock().ok);
        assert!(!vault_list(None).ok);
    }

    #[test]
    fn unlock_rejects_malformed_codes() {
        let _guard = serial();
        assert!(!vault_unlock("12".to_string()).ok);
        assert!(!vault_unlock("abc".to_string()).ok);
    }

    #[test]
    fn note_flow_create_edit_tag_and_delete() {
        let _guard = serial();
        assert!(vault_unlock("808".to_string()).ok);

        let created = note_create();
        assert!(created.ok, "{}", created.message);
        let note_id = created.note_id.clone().expect("note_create returns id");

        assert!(note_update_content("Ffi note\nbody".to_string()).ok);
        assert!(note_add_tags(vec!["ffi".to_string()]).ok);
        let active = note_active().expect("created note is active");
        assert_eq!(active.id, note_id);
        assert_eq!(active.title, "Ffi note");
        assert_eq!(active.tags, vec!["ffi".to_string()]);

        let listed = vault_list(Some("FFI NOTE".to_string()));
        assert!(listed.items.iter().any(|item| item.id == note_id));

        assert!(note_deselect().ok);
        assert!(note_active().is_none());
        assert!(note_select(note_id.clone()).ok);

        let declined = note_delete(note_id.clone(), false);
        assert!(declined.ok);
        assert!(note_active().is_some());

        let deleted = note_delete(note_id.clone(), true);
        assert!(deleted.ok);
        assert!(note_active().is_none());
        assert!(!vault_list(None)
            .items
            .iter()
            .any(|item| item.id == note_id));

        vault_lock();
    }

    #[test]
    fn actions_fail_while_locked() {
        let _guard = serial();
        vault_lock();
        assert!(!note_create().ok);
        assert!(!note_update_content("x".to_string()).ok);
        assert!(!ai_enhance_active().ok);
    }

    #[test]
    fn released_request_frees_the_note_for_another_ai_call() {
        let _guard = serial();
        assert!(vault_unlock("404".to_string()).ok);
        let note_id = note_create().note_id.expect("note_create returns id");
        assert!(note_update_content("pending rewrite".to_string()).ok);

        let request = with_session_result(|session| session.begin_enhance())
            .unwrap()
            .expect("non-blank note yields a request");
        let busy = |id: &str| {
            SESSION
                .lock()
                .unwrap()
                .as_ref()
                .map(|session| session.is_ai_busy(id))
        };
        assert_eq!(busy(&note_id), Some(true));

        release_note_request(request);
        assert_eq!(busy(&note_id), Some(false));
        let active = note_active().expect("note stays open");
        assert_eq!(active.content, "pending rewrite");
        assert!(active.tags.is_empty());

        vault_lock();
    }
}
