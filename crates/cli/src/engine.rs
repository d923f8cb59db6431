// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::{Context, Result};
use std::path::Path;

use flashvar::Eeprom;

use crate::config::StoreConfig;
use crate::image::ImageFlash;

/// A store opened over an image file.
pub struct Engine {
    pub eeprom: Eeprom<ImageFlash>,
}

impl Engine {
    pub fn open(image: &Path, config: &StoreConfig) -> Result<Self> {
        let flash = ImageFlash::open(image, &config.layout)?;
        Ok(Self::wrap(flash, config))
    }

    /// Opens `image`, creating an erased one first if it does not exist.
    pub fn open_or_create(image: &Path, config: &StoreConfig) -> Result<Self> {
        if image.exists() {
            return Self::open(image, config);
        }
        tracing::info!(path = %image.display(), "creating erased image");
        let flash = ImageFlash::create(image, &config.layout)?;
        Ok(Self::wrap(flash, config))
    }

    /// Runs the same recovery the firmware runs after a reset.
    pub fn recover(&mut self) -> Result<()> {
        self.eeprom.init().context("Recovery failed")
    }

    pub fn flush(&self) -> Result<()> {
        self.eeprom.device().flush()
    }

    fn wrap(flash: ImageFlash, config: &StoreConfig) -> Self {
        Self {
            eeprom: Eeprom::new(flash, config.layout, config.keys.clone()),
        }
    }
}
