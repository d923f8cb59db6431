// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::{Context, Result};
use std::path::Path;

use crate::config::StoreConfig;
use crate::engine::Engine;

/// Erases both pages and starts an empty log. Creates the image if needed.
pub fn run(image: &Path, config: &StoreConfig) -> Result<()> {
    let engine = &mut Engine::open_or_create(image, config)?;
    engine.eeprom.format().context("Format failed")?;
    engine.flush()?;

    println!("Formatted {}", image.display());
    Ok(())
}
