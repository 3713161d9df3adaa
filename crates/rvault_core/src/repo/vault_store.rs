//! Vault persistence over a key-value storage port.
//!
//! # Responsibility
//! - Map an access code to its namespaced storage key.
//! - Load-or-create vault records and overwrite them wholesale on save.
//!
//! # Invariants
//! - `load` never fails: missing, unreadable or malformed records yield an
//!   empty vault for the requested code.
//! - A malformed record is left in storage until the next successful save.
//! - `save` stamps `last_access` before serializing.

use crate::clock::{Clock, SystemClock};
use crate::model::access_code::AccessCode;
use crate::model::vault::Vault;
use crate::repo::storage::{KeyValueStorage, StorageError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Prefix shared by every vault record key.
pub const STORAGE_PREFIX: &str = "rv_vault_";

/// Returns the storage key for one access code.
pub fn storage_key(code: &str) -> String {
    format!("{STORAGE_PREFIX}{code}")
}

/// Save-path failure.
#[derive(Debug)]
pub enum StoreError {
    Encode(serde_json::Error),
    Storage(StorageError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode vault record: {err}"),
            Self::Storage(err) => write!(f, "failed to write vault record: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Reads and writes whole vault records.
pub struct VaultStore<S: KeyValueStorage> {
    storage: S,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStorage> VaultStore<S> {
    /// Creates a store stamping times from the system clock.
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: S, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Loads the vault for `code`, or a fresh empty one.
    pub fn load(&self, code: &AccessCode) -> Vault {
        let key = storage_key(code.as_str());
        let raw = match self.storage.load(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("event=vault_load module=store status=created reason=absent");
                return Vault::empty(code, self.clock.now_ms());
            }
            Err(err) => {
                warn!(
                    "event=vault_load module=store status=created reason=read_failed error={}",
                    err
                );
                return Vault::empty(code, self.clock.now_ms());
            }
        };

        match decode_record(&raw, code) {
            Ok(vault) => {
                info!(
                    "event=vault_load module=store status=ok notes={} bytes={}",
                    vault.len(),
                    raw.len()
                );
                vault
            }
            Err(reason) => {
                warn!(
                    "event=vault_load module=store status=created reason=malformed error={}",
                    reason
                );
                Vault::empty(code, self.clock.now_ms())
            }
        }
    }

    /// Stamps `last_access` and overwrites the stored record.
    ///
    /// # Errors
    /// - `Encode` if the record cannot be serialized.
    /// - `Storage` if the backend rejects the write; the previous record is
    ///   left as the backend left it.
    pub fn save(&self, vault: &mut Vault) -> Result<(), StoreError> {
        vault.last_access = self.clock.now_ms();
        let bytes = serde_json::to_vec(vault)?;
        self.storage.save(&storage_key(&vault.code), &bytes)?;
        debug!(
            "event=vault_save module=store status=ok notes={} bytes={}",
            vault.len(),
            bytes.len()
        );
        Ok(())
    }

    /// Gives the storage backend back, e.g. to open another vault with it.
    pub fn into_storage(self) -> S {
        self.storage
    }
}

fn decode_record(raw: &[u8], code: &AccessCode) -> Result<Vault, String> {
    let vault: Vault = serde_json::from_slice(raw).map_err(|err| err.to_string())?;
    vault.validate(code).map_err(|err| err.to_string())?;
    Ok(vault)
}
