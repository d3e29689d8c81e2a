// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

//! Read-only view over the global key-value state.

use displaydoc::Display;
use thiserror::Error;

/// Errors raised by global state lookups
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// key not found in the global state: {0}
    KeyNotFound(String),
    /// malformed record: {0}
    MalformedRecord(String),
}

/// One stored record. For contract instances the first value is the opaque
/// state blob and the second is the contract kind as UTF-8.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Record {
    values: Vec<Vec<u8>>,
}

impl Record {
    /// Creates a record from its value columns
    pub fn new(values: Vec<Vec<u8>>) -> Self {
        Self { values }
    }

    /// The value columns of this record
    pub fn values(&self) -> &[Vec<u8>] {
        &self.values
    }
}

/// Read access to the global state, keyed by object id bytes.
pub trait CollectionView {
    /// Look up the record stored under the given key.
    fn get(&self, key: &[u8]) -> Result<Record, CollectionError>;
}
