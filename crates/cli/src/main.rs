// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use flashvar_cli::commands::{format, get, init, inspect, keys, set};
use flashvar_cli::config::{parse_key, StoreConfig};
use flashvar_cli::telemetry;

#[derive(Parser)]
#[command(name = "flashvar")]
#[command(about = "flashvar image tool - provision and inspect emulated EEPROM dumps", long_about = None)]
struct Cli {
    /// JSON file with the page layout and key table. Firmware defaults otherwise.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Erase both pages and start an empty log (creates the image if missing)
    Format {
        image: PathBuf,
    },
    /// Run startup recovery on the image
    Init {
        image: PathBuf,
    },
    /// Print the current value of a key
    Get {
        image: PathBuf,

        /// Key, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_key)]
        key: u16,

        /// Always print hex
        #[arg(long)]
        hex: bool,
    },
    /// Store a new value for a key
    Set {
        image: PathBuf,

        #[arg(value_parser = parse_key)]
        key: u16,

        value: String,

        /// Treat VALUE as hex bytes
        #[arg(long)]
        hex: bool,
    },
    /// Show page headers and every record in the image
    Inspect {
        image: PathBuf,
    },
    /// List the configured key table
    Keys,
}

fn main() -> anyhow::Result<()> {
    telemetry::init_telemetry();

    let cli = Cli::parse();
    let config = StoreConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Format { image } => format::run(&image, &config),
        Commands::Init { image } => init::run(&image, &config),
        Commands::Get { image, key, hex } => get::run(&image, &config, key, hex),
        Commands::Set {
            image,
            key,
            value,
            hex,
        } => set::run(&image, &config, key, &value, hex),
        Commands::Inspect { image } => inspect::run(&image, &config),
        Commands::Keys => keys::run(&config),
    }
}
