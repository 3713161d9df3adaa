//! AI-assisted text helpers over a `TextCompletion` provider.
//!
//! # Responsibility
//! - Own the prompts for enhance, tag suggestion and summarization.
//! - Apply the per-operation failure policy.
//!
//! # Invariants
//! - `enhance` propagates provider failures.
//! - `suggest_tags` degrades to an empty list and `summarize` to a fixed
//!   placeholder; neither returns an error.

use crate::ai::completion::{AiError, TextCompletion};
use log::warn;

/// Separator placed between note bodies in a summary prompt.
pub const SUMMARY_SEPARATOR: &str = "\n---\n";
/// Returned by `summarize` when the provider call fails.
pub const SUMMARY_UNAVAILABLE: &str = "AI Service currently unavailable.";
/// Returned by `summarize` when the provider answers with nothing.
pub const SUMMARY_EMPTY: &str = "Could not generate summary.";

const ENHANCE_PROMPT: &str = "Improve the clarity, grammar, and tone of the following note. \
Keep it concise but professional. Return ONLY the improved text, no explanations.";
const TAGS_PROMPT: &str = "Generate 3 to 5 short, relevant tags for this note. \
Return them as a comma-separated list (e.g., \"work, meeting, urgent\"). No extra text.";
const SUMMARY_PROMPT: &str = "Summarize the key themes and important information from the \
following collection of notes into a single cohesive paragraph.";

/// Stateless AI text operations.
pub struct AiTextService<C: TextCompletion> {
    completion: C,
}

impl<C: TextCompletion> AiTextService<C> {
    pub fn new(completion: C) -> Self {
        Self { completion }
    }

    pub fn completion(&self) -> &C {
        &self.completion
    }

    /// Rewrites `text` for clarity, grammar and tone.
    ///
    /// An empty completion leaves the text as it was.
    ///
    /// # Errors
    /// Any provider failure is returned unchanged.
    pub async fn enhance(&self, text: &str) -> Result<String, AiError> {
        let prompt = format!("{ENHANCE_PROMPT}\n\nNote:\n{text}");
        match self.completion.complete(&prompt).await {
            Ok(improved) if improved.trim().is_empty() => Ok(text.to_string()),
            Ok(improved) => Ok(improved),
            Err(err) => {
                warn!("event=ai_enhance module=ai status=error error={}", err);
                Err(err)
            }
        }
    }

    /// Suggests a handful of short tags. Empty on any provider failure.
    pub async fn suggest_tags(&self, text: &str) -> Vec<String> {
        let prompt = format!("{TAGS_PROMPT}\n\nNote:\n{text}");
        match self.completion.complete(&prompt).await {
            Ok(raw) => parse_tag_list(&raw),
            Err(err) => {
                warn!("event=ai_tags module=ai status=degraded error={}", err);
                Vec::new()
            }
        }
    }

    /// Summarizes several note bodies into one paragraph.
    ///
    /// Falls back to `SUMMARY_UNAVAILABLE` on provider failure and to
    /// `SUMMARY_EMPTY` when the provider returns nothing.
    pub async fn summarize<T: AsRef<str>>(&self, texts: &[T]) -> String {
        let combined = texts
            .iter()
            .map(|text| text.as_ref())
            .collect::<Vec<_>>()
            .join(SUMMARY_SEPARATOR);
        let prompt = format!("{SUMMARY_PROMPT}\n\nNotes:\n{combined}");
        match self.completion.complete(&prompt).await {
            Ok(summary) if summary.trim().is_empty() => SUMMARY_EMPTY.to_string(),
            Ok(summary) => summary,
            Err(err) => {
                warn!("event=ai_summary module=ai status=degraded error={}", err);
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }
}

/// Splits a comma-separated tag answer into trimmed, unique, non-empty tags.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|tag| !tag.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}
