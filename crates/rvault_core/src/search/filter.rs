//! In-memory note filtering for the list pane.
//!
//! # Invariants
//! - Matching is a case-insensitive substring test on content and tags.
//! - Filtering is read-only and keeps the vault's note order.

use crate::model::note::Note;

/// Returns the notes matching `term`; a blank term matches everything.
pub fn filter_notes<'a>(notes: &'a [Note], term: &str) -> Vec<&'a Note> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return notes.iter().collect();
    }
    notes
        .iter()
        .filter(|note| note_matches(note, &needle))
        .collect()
}

/// `needle` must already be lowercase.
fn note_matches(note: &Note, needle: &str) -> bool {
    note.content.to_lowercase().contains(needle)
        || note
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::filter_notes;
    use crate::model::note::Note;

    fn note(id: &str, content: &str, tags: &[&str]) -> Note {
        Note {
            id: id.to_string(),
            content: content.to_string(),
            created_at: 0,
            updated_at: 0,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    #[test]
    fn matches_content_and_tags_case_insensitively() {
        let notes = vec![
            note("a", "Weekly Meeting notes", &[]),
            note("b", "groceries", &["Errands"]),
            note("c", "unrelated", &["misc"]),
        ];

        let hits: Vec<_> = filter_notes(&notes, "MEETING")
            .iter()
            .map(|note| note.id.as_str())
            .collect();
        assert_eq!(hits, vec!["a"]);

        let hits: Vec<_> = filter_notes(&notes, "errand")
            .iter()
            .map(|note| note.id.as_str())
            .collect();
        assert_eq!(hits, vec!["b"]);
    }

    #[test]
    fn blank_term_returns_all_in_order() {
        let notes = vec![note("a", "x", &[]), note("b", "y", &[])];
        assert_eq!(filter_notes(&notes, "  ").len(), 2);
        assert!(filter_notes(&notes, "zzz").is_empty());
    }
}
