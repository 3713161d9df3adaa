mod common;

use common::ReadOnlyStorage;
use rvault_core::{
    storage_key, AccessCode, KeyValueStorage, ManualClock, MemoryStorage, Note, SqliteStorage,
    StoreError, VaultStore,
};
use std::sync::Arc;

fn code(raw: &str) -> AccessCode {
    AccessCode::parse(raw).unwrap()
}

fn note(id: &str, content: &str, created_at: i64, updated_at: i64, tags: &[&str]) -> Note {
    Note {
        id: id.to_string(),
        content: content.to_string(),
        created_at,
        updated_at,
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
    }
}

#[test]
fn load_without_record_returns_empty_vault_for_code() {
    let clock = Arc::new(ManualClock::new(777));
    let storage = MemoryStorage::new();
    let store = VaultStore::with_clock(storage.clone(), clock);

    let vault = store.load(&code("123"));
    assert_eq!(vault.code, "123");
    assert!(vault.notes.is_empty());
    assert_eq!(vault.last_access, 777);
    assert!(!storage.contains_key("rv_vault_123"));
}

#[test]
fn save_then_load_roundtrips_notes_exactly() {
    let clock = Arc::new(ManualClock::new(1_000));
    let store = VaultStore::with_clock(MemoryStorage::new(), clock.clone());

    let mut vault = store.load(&code("042"));
    vault.prepend(note("a", "first", 10, 20, &["work"]));
    vault.prepend(note("b", "second\nline", 30, 30, &[]));
    store.save(&mut vault).unwrap();

    clock.advance(60_000);
    let loaded = store.load(&code("042"));
    assert_eq!(loaded.notes, vault.notes);
    assert_eq!(loaded.code, "042");
    assert_eq!(loaded.last_access, 1_000);
}

#[test]
fn codes_never_share_a_vault() {
    let store = VaultStore::new(MemoryStorage::new());

    let mut first = store.load(&code("111"));
    first.prepend(note("a", "only in 111", 1, 1, &[]));
    store.save(&mut first).unwrap();

    assert!(store.load(&code("222")).notes.is_empty());
    assert_eq!(store.load(&code("111")).notes.len(), 1);
}

#[test]
fn malformed_record_loads_as_empty_and_survives_until_next_save() {
    let storage = MemoryStorage::new();
    storage.insert_raw(storage_key("123"), b"{not json".to_vec());
    let store = VaultStore::new(storage.clone());

    let mut vault = store.load(&code("123"));
    assert!(vault.notes.is_empty());
    assert_eq!(
        storage.load("rv_vault_123").unwrap().as_deref(),
        Some(&b"{not json"[..])
    );

    store.save(&mut vault).unwrap();
    let raw = storage.load("rv_vault_123").unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(json["code"], "123");
}

#[test]
fn record_with_duplicate_ids_or_foreign_code_is_treated_as_absent() {
    let storage = MemoryStorage::new();
    storage.insert_raw(
        storage_key("123"),
        br#"{"code":"123","lastAccess":1,"notes":[
            {"id":"x","content":"a","createdAt":1,"updatedAt":1,"tags":[]},
            {"id":"x","content":"b","createdAt":1,"updatedAt":1,"tags":[]}
        ]}"#
        .to_vec(),
    );
    storage.insert_raw(
        storage_key("456"),
        br#"{"code":"999","lastAccess":1,"notes":[]}"#.to_vec(),
    );
    let store = VaultStore::new(storage);

    assert!(store.load(&code("123")).notes.is_empty());
    assert_eq!(store.load(&code("456")).code, "456");
}

#[test]
fn record_without_tags_field_loads_with_empty_tags() {
    let storage = MemoryStorage::new();
    storage.insert_raw(
        storage_key("321"),
        br#"{"code":"321","lastAccess":5,"notes":[
            {"id":"x","content":"legacy","createdAt":1,"updatedAt":2}
        ]}"#
        .to_vec(),
    );
    let vault = VaultStore::new(storage).load(&code("321"));
    assert_eq!(vault.notes.len(), 1);
    assert!(vault.notes[0].tags.is_empty());
}

#[test]
fn sqlite_storage_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vaults.sqlite3");

    {
        let store = VaultStore::new(SqliteStorage::open(&path).unwrap());
        let mut vault = store.load(&code("900"));
        vault.prepend(note("a", "persisted", 5, 6, &["kept"]));
        store.save(&mut vault).unwrap();
    }

    let store = VaultStore::new(SqliteStorage::open(&path).unwrap());
    let vault = store.load(&code("900"));
    assert_eq!(vault.notes.len(), 1);
    assert_eq!(vault.notes[0].content, "persisted");
    assert_eq!(vault.notes[0].tags, vec!["kept".to_string()]);
}

#[test]
fn failed_write_is_reported_as_storage_error() {
    let store = VaultStore::new(ReadOnlyStorage);
    let mut vault = store.load(&code("123"));
    let err = store.save(&mut vault).unwrap_err();
    assert!(matches!(err, StoreError::Storage(_)));
    assert!(err.to_string().contains("quota exceeded"));
}
