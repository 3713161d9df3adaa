//! Persistence layer.
//!
//! # Responsibility
//! - Define the key-value storage port and its adapters.
//! - Translate between vault records and stored bytes.
//!
//! # Invariants
//! - Only `VaultStore` knows the record encoding and key layout.
//! - Storage adapters deal in opaque bytes.

pub mod storage;
pub mod vault_store;
