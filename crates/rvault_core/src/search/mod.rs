//! Note search entry points.
//!
//! # Responsibility
//! - Filter the loaded vault for the list pane without touching storage.

pub mod filter;
