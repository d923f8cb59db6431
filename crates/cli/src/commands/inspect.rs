// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::Path;

use flashvar::{Page, PageStatus};

use super::render_value;
use crate::config::StoreConfig;
use crate::engine::Engine;

/// Prints both page headers and every intact record. Read-only.
pub fn run(image: &Path, config: &StoreConfig) -> anyhow::Result<()> {
    let engine = &mut Engine::open(image, config)?;
    let eeprom = &mut engine.eeprom;
    let states = eeprom.page_states()?;
    let active = eeprom.active_page().ok();

    println!("\nflashvar Image Report");
    println!("---------------------");

    let mut pages = Table::new();
    pages
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Page", "Base", "Status", "Records", "Role"]);

    let mut listing = Vec::new();
    for (page, status) in Page::ALL.into_iter().zip(states) {
        let records = eeprom.records(page)?;
        let role = match status {
            _ if active == Some(page) => "serving reads",
            PageStatus::Receiving => "transfer target",
            PageStatus::Corrupt { .. } => "needs recovery",
            _ => "",
        };
        pages.add_row(vec![
            page.to_string(),
            format!("{:#010x}", eeprom.layout().page_base(page)),
            status.to_string(),
            records.len().to_string(),
            role.to_string(),
        ]);
        listing.push((page, records));
    }
    println!("{pages}");

    match eeprom.free_bytes() {
        Ok(free) => println!("Free space in write page: {free} bytes"),
        Err(e) => println!("No write page: {e}"),
    }

    let mut records = Table::new();
    records
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Page", "Address", "Key", "Len", "State", "Value"]);

    for (page, list) in listing {
        // Newest first, so the first hit per key is its current value.
        let mut seen = Vec::new();
        for record in list {
            let state = if !config.keys.contains(record.key) {
                "unknown key"
            } else if seen.contains(&record.key) {
                "stale"
            } else {
                seen.push(record.key);
                "current"
            };
            let value = eeprom.record_payload(&record)?;
            records.add_row(vec![
                page.to_string(),
                format!("{:#010x}", record.address),
                format!("{:#06x}", record.key),
                record.len.to_string(),
                state.to_string(),
                render_value(&value),
            ]);
        }
    }
    println!("{records}\n");

    Ok(())
}
