//! Core use-case services.
//!
//! # Responsibility
//! - Build notes, run AI helpers, and drive the unlocked vault session.
//! - Keep CLI/FFI shells decoupled from storage and provider details.

pub mod ai_service;
pub mod lock_screen;
pub mod note_factory;
pub mod vault_session;
