//! Note domain model.
//!
//! # Invariants
//! - `id` is assigned once at creation and never changes.
//! - `updated_at >= created_at` for every note produced by core.
//! - `tags` never contains blank or duplicate values.

use serde::{Deserialize, Serialize};

/// Opaque note identity, unique within one vault.
pub type NoteId = String;

/// A single text entry inside a vault.
///
/// Serialized with camelCase keys to match the stored vault record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Never earlier than `created_at`.
    pub updated_at: i64,
    /// Short labels in insertion order. Missing in older records.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Note {
    /// Replaces the body and bumps `updated_at`.
    ///
    /// `updated_at` never moves backwards, even if the clock does.
    pub fn set_content(&mut self, content: impl Into<String>, now_ms: i64) {
        self.content = content.into();
        self.updated_at = now_ms.max(self.updated_at);
    }

    /// Merges tags into this note, keeping first-seen order.
    ///
    /// Values are trimmed; blanks and exact duplicates are skipped.
    /// Returns how many tags were actually added.
    pub fn merge_tags<I, T>(&mut self, tags: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let before = self.tags.len();
        for tag in tags {
            let trimmed = tag.as_ref().trim();
            if trimmed.is_empty() || self.tags.iter().any(|existing| existing == trimmed) {
                continue;
            }
            self.tags.push(trimmed.to_string());
        }
        self.tags.len() - before
    }

    /// Returns whether content is blank (nothing for AI helpers to work on).
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// First line of the body, used as a list title.
    pub fn title(&self) -> &str {
        self.content.lines().next().unwrap_or("").trim()
    }
}

#[cfg(test)]
mod tests {
    use super::Note;

    fn note() -> Note {
        Note {
            id: "n1".to_string(),
            content: "body".to_string(),
            created_at: 1_000,
            updated_at: 1_000,
            tags: Vec::new(),
        }
    }

    #[test]
    fn set_content_never_moves_updated_at_backwards() {
        let mut note = note();
        note.set_content("later", 2_000);
        assert_eq!(note.updated_at, 2_000);

        note.set_content("skewed clock", 1_500);
        assert_eq!(note.content, "skewed clock");
        assert_eq!(note.updated_at, 2_000);
    }

    #[test]
    fn merge_tags_trims_and_skips_duplicates_and_blanks() {
        let mut note = note();
        let added = note.merge_tags([" work ", "", "urgent", "work"]);
        assert_eq!(added, 2);
        assert_eq!(note.tags, vec!["work".to_string(), "urgent".to_string()]);

        assert_eq!(note.merge_tags(["urgent"]), 0);
    }

    #[test]
    fn missing_tags_field_deserializes_as_empty() {
        let note: Note = serde_json::from_str(
            r#"{"id":"a","content":"x","createdAt":1,"updatedAt":2}"#,
        )
        .unwrap();
        assert!(note.tags.is_empty());
    }

    #[test]
    fn title_is_first_line() {
        let mut note = note();
        note.content = "Groceries\nmilk\neggs".to_string();
        assert_eq!(note.title(), "Groceries");
    }
}
