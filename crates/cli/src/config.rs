// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use flashvar::{KeyTable, Layout};

/// First key of the firmware's variable table.
pub const FIRST_KEY: u16 = 0xDF01;
/// Number of variables the firmware defines.
pub const KEY_COUNT: u16 = 18;

/// Where the pages live and which keys survive compaction.
///
/// ```json
/// { "layout": { "base_address": 134344704 }, "keys": [57089, 57090] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub layout: Layout,
    pub keys: KeyTable,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            keys: KeyTable::sequential(FIRST_KEY, KEY_COUNT).unwrap_or_default(),
        }
    }
}

impl StoreConfig {
    /// Reads a JSON config, or the firmware defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }
}

/// Parses a key given as `0x`-prefixed hex or as decimal.
pub fn parse_key(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid key {s:?}: {e}"))
}
