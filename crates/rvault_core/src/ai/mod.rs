//! Text-generation provider boundary.
//!
//! # Responsibility
//! - Define the `TextCompletion` port the AI text service talks to.
//! - Provide the Gemini HTTP adapter used by the shells.
//!
//! # Invariants
//! - Calls are single-shot: no streaming, no retries.
//! - Prompts and completions are never written to logs.

pub mod completion;
pub mod gemini;
