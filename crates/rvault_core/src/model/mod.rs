//! Vault domain model.
//!
//! # Responsibility
//! - Define the stored record shapes (`Vault`, `Note`).
//! - Define the validated `AccessCode` used as the vault selector.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Deleting a note removes it from the record; there are no tombstones.

pub mod access_code;
pub mod note;
pub mod vault;
