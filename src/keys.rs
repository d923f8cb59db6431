// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! The set of keys the store is responsible for.

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::config::RESERVED_KEY;
use crate::error::{EepromError, Result};

/// Ordered list of live keys, injected at construction.
///
/// Compaction and recovery walk this table to decide what survives; a key
/// missing from it is dropped at the next page transfer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u16>", into = "Vec<u16>")]
pub struct KeyTable {
    keys: Vec<u16>,
}

impl KeyTable {
    pub fn new(keys: impl IntoIterator<Item = u16>) -> Result<Self> {
        let mut table = Vec::new();
        for key in keys {
            if key == RESERVED_KEY {
                return Err(EepromError::ReservedKey);
            }
            if table.contains(&key) {
                return Err(EepromError::DuplicateKey(key));
            }
            table.push(key);
        }
        Ok(Self { keys: table })
    }

    /// `count` consecutive keys starting at `first`.
    pub fn sequential(first: u16, count: u16) -> Result<Self> {
        Self::new((0..count).map(|i| first.wrapping_add(i)))
    }

    pub fn contains(&self, key: u16) -> bool {
        self.keys.contains(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.keys.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl TryFrom<Vec<u16>> for KeyTable {
    type Error = EepromError;

    fn try_from(keys: Vec<u16>) -> Result<Self> {
        KeyTable::new(keys)
    }
}

impl From<KeyTable> for Vec<u16> {
    fn from(table: KeyTable) -> Self {
        table.keys
    }
}
