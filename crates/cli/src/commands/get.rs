// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::{Context, Result};
use std::path::Path;

use flashvar::config::VARIABLE_MAX_SIZE;

use super::render_value;
use crate::config::StoreConfig;
use crate::engine::Engine;

/// Current value of `key`. Does not run recovery, so the image is not touched.
pub fn read(image: &Path, config: &StoreConfig, key: u16) -> Result<Vec<u8>> {
    let engine = &mut Engine::open(image, config)?;
    engine
        .eeprom
        .read_variable(key, VARIABLE_MAX_SIZE as u16)
        .with_context(|| format!("Failed to read key {key:#06x}"))
}

pub fn run(image: &Path, config: &StoreConfig, key: u16, as_hex: bool) -> Result<()> {
    let value = read(image, config, key)?;
    if as_hex {
        println!("{}", hex::encode(&value));
    } else {
        println!("{}", render_value(&value));
    }
    Ok(())
}
