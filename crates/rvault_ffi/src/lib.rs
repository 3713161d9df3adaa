//! Flutter-facing bindings for RV Vault core.
//!
//! # Responsibility
//! - Expose lock screen and vault use-cases to Dart via FRB.
//! - Own the single process-wide vault session.

pub mod api;
