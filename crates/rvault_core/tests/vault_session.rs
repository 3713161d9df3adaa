mod common;

use common::ReadOnlyStorage;
use rvault_core::{
    AccessCode, DeleteOutcome, ManualClock, MemoryStorage, SequentialIds, SessionError,
    StoreError, VaultSession, VaultStore,
};
use std::cell::Cell;
use std::collections::HashSet;
use std::sync::Arc;

fn code(raw: &str) -> AccessCode {
    AccessCode::parse(raw).unwrap()
}

fn session_at(
    storage: MemoryStorage,
    raw_code: &str,
    clock: &Arc<ManualClock>,
) -> VaultSession<MemoryStorage> {
    VaultSession::unlock_with(
        storage,
        &code(raw_code),
        Arc::new(SequentialIds::new("note")),
        clock.clone(),
    )
}

#[test]
fn hello_note_lifecycle_scenario() {
    let clock = Arc::new(ManualClock::new(1_000));
    let storage = MemoryStorage::new();
    let mut session = VaultSession::unlock_with(
        storage.clone(),
        &code("123"),
        Arc::new(SequentialIds::new("note")),
        clock.clone(),
    );
    assert_eq!(session.code(), "123");
    assert!(session.notes().is_empty());
    assert_eq!(session.vault().last_access, 1_000);

    let id = session.add_note();
    session.edit_active("Hello").unwrap();
    assert_eq!(session.notes().len(), 1);
    assert_eq!(session.notes()[0].content, "Hello");
    assert!(!session.notes()[0].id.is_empty());
    let first_updated = session.notes()[0].updated_at;
    let created = session.notes()[0].created_at;

    clock.advance(50);
    session.edit_active("Hello world").unwrap();
    let note = session.note(&id).unwrap();
    assert_eq!(note.id, id);
    assert_eq!(note.content, "Hello world");
    assert_eq!(note.created_at, created);
    assert!(note.updated_at > first_updated);

    assert_eq!(session.delete_note(&id, |_| true), DeleteOutcome::Deleted);
    assert!(session.notes().is_empty());

    let storage = session.lock();
    let reloaded = VaultStore::new(storage).load(&code("123"));
    assert_eq!(reloaded.code, "123");
    assert!(reloaded.notes.is_empty());
}

#[test]
fn add_note_prepends_selects_and_persists() {
    let clock = Arc::new(ManualClock::new(10));
    let storage = MemoryStorage::new();
    let mut session = session_at(storage.clone(), "555", &clock);

    let first = session.add_note();
    let second = session.add_note();
    assert_eq!(session.active_id(), Some(second.as_str()));
    let ids: Vec<_> = session.notes().iter().map(|note| note.id.clone()).collect();
    assert_eq!(ids, vec![second.clone(), first.clone()]);

    let reloaded = VaultStore::new(storage).load(&code("555"));
    assert_eq!(reloaded.notes.len(), 2);
    assert_eq!(reloaded.notes[0].id, second);
}

#[test]
fn note_ids_stay_unique_with_uuid_generator() {
    let mut session = VaultSession::unlock(MemoryStorage::new(), &code("001"));
    for _ in 0..50 {
        session.add_note();
    }
    let ids: HashSet<_> = session.notes().iter().map(|note| note.id.as_str()).collect();
    assert_eq!(ids.len(), 50);
}

#[test]
fn delete_removes_exactly_one_note_and_keeps_others_intact() {
    let clock = Arc::new(ManualClock::new(0));
    let mut session = session_at(MemoryStorage::new(), "777", &clock);
    let keep = session.add_note();
    session.edit_active("keep me").unwrap();
    session.add_tags_to_active(["stay"]).unwrap();
    let drop_id = session.add_note();
    session.edit_active("drop me").unwrap();

    let before = session.note(&keep).unwrap().clone();
    assert_eq!(session.delete_note(&drop_id, |_| true), DeleteOutcome::Deleted);
    assert_eq!(session.notes().len(), 1);
    assert_eq!(session.notes()[0], before);
    assert_eq!(session.active_id(), None);
}

#[test]
fn delete_of_unknown_id_is_noop_and_does_not_ask() {
    let clock = Arc::new(ManualClock::new(0));
    let mut session = session_at(MemoryStorage::new(), "777", &clock);
    session.add_note();
    let asked = Cell::new(false);

    let outcome = session.delete_note("missing", |_| {
        asked.set(true);
        true
    });
    assert_eq!(outcome, DeleteOutcome::NotFound);
    assert!(!asked.get());
    assert_eq!(session.notes().len(), 1);
}

#[test]
fn declined_delete_changes_nothing() {
    let clock = Arc::new(ManualClock::new(0));
    let mut session = session_at(MemoryStorage::new(), "777", &clock);
    let id = session.add_note();

    assert_eq!(session.delete_note(&id, |_| false), DeleteOutcome::Declined);
    assert_eq!(session.notes().len(), 1);
    assert_eq!(session.active_id(), Some(id.as_str()));
}

#[test]
fn deleting_unselected_note_keeps_selection() {
    let clock = Arc::new(ManualClock::new(0));
    let mut session = session_at(MemoryStorage::new(), "777", &clock);
    let other = session.add_note();
    let selected = session.add_note();

    session.delete_note(&other, |_| true);
    assert_eq!(session.active_id(), Some(selected.as_str()));
}

#[test]
fn edit_requires_selection_and_only_touches_active_note() {
    let clock = Arc::new(ManualClock::new(100));
    let mut session = session_at(MemoryStorage::new(), "808", &clock);
    let untouched = session.add_note();
    let edited = session.add_note();

    clock.advance(10);
    session.edit_active("changed").unwrap();
    assert_eq!(session.note(&edited).unwrap().content, "changed");
    assert_eq!(session.note(&edited).unwrap().updated_at, 110);
    assert_eq!(session.note(&untouched).unwrap().updated_at, 100);

    session.deselect();
    assert!(matches!(
        session.edit_active("nope"),
        Err(SessionError::NoActiveNote)
    ));
}

#[test]
fn edit_never_moves_updated_at_backwards() {
    let clock = Arc::new(ManualClock::new(5_000));
    let mut session = session_at(MemoryStorage::new(), "808", &clock);
    let id = session.add_note();

    clock.set(4_000);
    session.edit_active("clock went back").unwrap();
    let note = session.note(&id).unwrap();
    assert_eq!(note.updated_at, 5_000);
    assert!(note.updated_at >= note.created_at);
}

#[test]
fn select_unknown_note_fails_and_keeps_selection() {
    let clock = Arc::new(ManualClock::new(0));
    let mut session = session_at(MemoryStorage::new(), "808", &clock);
    let id = session.add_note();

    assert!(matches!(
        session.select("ghost"),
        Err(SessionError::NoteNotFound(_))
    ));
    assert_eq!(session.active_id(), Some(id.as_str()));

    session.deselect();
    session.select(&id).unwrap();
    assert_eq!(session.active_note().unwrap().id, id);
}

#[test]
fn filter_matches_content_and_tags_without_mutating() {
    let clock = Arc::new(ManualClock::new(0));
    let storage = MemoryStorage::new();
    let mut session = session_at(storage.clone(), "246", &clock);
    session.add_note();
    session.edit_active("Quarterly Planning").unwrap();
    session.add_note();
    session.edit_active("shopping list").unwrap();
    session.add_tags_to_active(["Errands"]).unwrap();

    let before = session.vault().clone();
    let hits: Vec<_> = session
        .filter("planning")
        .iter()
        .map(|note| note.content.clone())
        .collect();
    assert_eq!(hits, vec!["Quarterly Planning".to_string()]);
    assert_eq!(session.filter("ERRAND").len(), 1);
    assert_eq!(session.filter("").len(), 2);
    assert_eq!(session.vault(), &before);
}

#[test]
fn manual_tags_are_merged_and_persisted() {
    let clock = Arc::new(ManualClock::new(0));
    let storage = MemoryStorage::new();
    let mut session = session_at(storage.clone(), "135", &clock);
    session.add_note();

    assert_eq!(session.add_tags_to_active(["work", " urgent ", ""]).unwrap(), 2);
    assert_eq!(session.add_tags_to_active(["work"]).unwrap(), 0);

    let reloaded = VaultStore::new(storage).load(&code("135"));
    assert_eq!(
        reloaded.notes[0].tags,
        vec!["work".to_string(), "urgent".to_string()]
    );
}

#[test]
fn every_mutation_is_saved_immediately() {
    let clock = Arc::new(ManualClock::new(0));
    let storage = MemoryStorage::new();
    let mut session = session_at(storage.clone(), "999", &clock);
    let id = session.add_note();

    for text in ["H", "He", "Hel"] {
        session.edit_active(text).unwrap();
        let stored = VaultStore::new(storage.clone()).load(&code("999"));
        assert_eq!(stored.note(&id).unwrap().content, text);
    }
}

#[test]
fn save_failure_is_a_warning_and_keeps_memory_state() {
    let mut session = VaultSession::unlock(ReadOnlyStorage, &code("321"));
    let id = session.add_note();

    assert_eq!(session.active_id(), Some(id.as_str()));
    assert_eq!(session.notes().len(), 1);
    let warning = session.take_save_warning().unwrap();
    assert!(matches!(warning, StoreError::Storage(_)));
    assert!(session.take_save_warning().is_none());

    session.edit_active("still editable").unwrap();
    assert_eq!(session.active_note().unwrap().content, "still editable");
    assert!(session.take_save_warning().is_some());
}

#[test]
fn unlock_does_not_write_until_first_mutation() {
    let storage = MemoryStorage::new();
    let session = VaultSession::unlock(storage.clone(), &code("404"));
    drop(session);
    assert!(!storage.contains_key("rv_vault_404"));
}
