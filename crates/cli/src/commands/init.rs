// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::Result;
use std::path::Path;

use crate::config::StoreConfig;
use crate::engine::Engine;

/// Replays startup recovery on an image, e.g. a dump taken after a brown-out.
pub fn run(image: &Path, config: &StoreConfig) -> Result<()> {
    let engine = &mut Engine::open(image, config)?;
    let [before0, before1] = engine.eeprom.page_states()?;

    engine.recover()?;
    engine.flush()?;

    let [after0, after1] = engine.eeprom.page_states()?;
    println!("PAGE0 {before0} -> {after0}");
    println!("PAGE1 {before1} -> {after1}");
    Ok(())
}
