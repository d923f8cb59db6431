// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use flashvar::Page;

use crate::config::StoreConfig;

/// Lists the key table and page placement in effect.
pub fn run(config: &StoreConfig) -> anyhow::Result<()> {
    let layout = &config.layout;
    println!(
        "\nPAGE0 at {:#010x}, PAGE1 at {:#010x}",
        layout.page_base(Page::Page0),
        layout.page_base(Page::Page1)
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Key"]);
    for (i, key) in config.keys.iter().enumerate() {
        table.add_row(vec![i.to_string(), format!("{key:#06x}")]);
    }

    println!("{table}\n");
    Ok(())
}
