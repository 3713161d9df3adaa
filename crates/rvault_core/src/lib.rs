//! Core domain logic for RV Vault.
//! This crate is the single source of truth for vault invariants.

pub mod ai;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use ai::completion::{AiError, TextCompletion};
pub use ai::gemini::GeminiClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AiConfig, ConfigError, VaultConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::access_code::{AccessCode, CodeError, ACCESS_CODE_LEN};
pub use model::note::{Note, NoteId};
pub use model::vault::{Vault, VaultValidationError};
pub use repo::storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageError};
pub use repo::vault_store::{storage_key, StoreError, VaultStore};
pub use search::filter::filter_notes;
pub use service::ai_service::{
    parse_tag_list, AiTextService, SUMMARY_EMPTY, SUMMARY_SEPARATOR, SUMMARY_UNAVAILABLE,
};
pub use service::lock_screen::{CodeEntry, UNLOCK_DELAY};
pub use service::note_factory::{IdGenerator, NoteFactory, SequentialIds, UuidGenerator};
pub use service::vault_session::{
    AiOutcome, DeleteOutcome, NoteAiRequest, SessionError, SummaryRequest, VaultSession,
    SUMMARY_MIN_CHARS,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
