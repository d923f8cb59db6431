// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::{Context, Result};
use std::path::Path;

use crate::config::StoreConfig;
use crate::engine::Engine;

/// Stores `value` under `key`, recovering the image first as a boot would.
/// With `from_hex`, `value` is hex text instead of raw UTF-8.
pub fn run(image: &Path, config: &StoreConfig, key: u16, value: &str, from_hex: bool) -> Result<()> {
    let data = if from_hex {
        hex::decode(value.trim_start_matches("0x")).context("Value is not valid hex")?
    } else {
        value.as_bytes().to_vec()
    };

    let engine = &mut Engine::open(image, config)?;
    engine.recover()?;
    engine
        .eeprom
        .write_variable(key, &data)
        .with_context(|| format!("Failed to write key {key:#06x}"))?;
    engine.flush()?;

    tracing::info!(key, len = data.len(), "variable stored");
    println!("Stored {} bytes under {key:#06x}", data.len());
    Ok(())
}
