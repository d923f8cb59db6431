// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Flash image files.
//!
//! An image is a raw dump of both pages, PAGE0 first, exactly as the part's
//! memory holds it. Byte 0 of the file sits at the layout's base address.

use anyhow::{bail, Context, Result};
use memmap2::MmapMut;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use flashvar::config::{PAGE_SIZE, WORD_SIZE};
use flashvar::{BlockDevice, DeviceError, Layout};

/// Length of an image file in bytes.
pub const IMAGE_SIZE: u64 = 2 * PAGE_SIZE as u64;

/// NOR semantics over a memory-mapped image file.
pub struct ImageFlash {
    map: MmapMut,
    base: u32,
}

impl ImageFlash {
    pub fn open(path: &Path, layout: &Layout) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open image {}", path.display()))?;
        let len = file.metadata()?.len();
        if len != IMAGE_SIZE {
            bail!("{} is {} bytes, expected {}", path.display(), len, IMAGE_SIZE);
        }

        // SAFETY: the mapping lives no longer than this struct and the file is
        // not resized while mapped.
        let map = unsafe { MmapMut::map_mut(&file) }
            .with_context(|| format!("Failed to map image {}", path.display()))?;
        Ok(Self {
            map,
            base: layout.base_address,
        })
    }

    /// Creates a new, fully erased image. Fails if `path` already exists.
    pub fn create(path: &Path, layout: &Layout) -> Result<Self> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("Failed to create image {}", path.display()))?;
        file.write_all(&vec![0xFF; IMAGE_SIZE as usize])?;
        file.sync_all()?;
        drop(file);
        Self::open(path, layout)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.map
    }

    pub fn flush(&self) -> Result<()> {
        self.map.flush().context("Failed to flush image")
    }

    fn offset(&self, address: u32, len: usize) -> Result<usize, DeviceError> {
        let offset = address.checked_sub(self.base).ok_or(DeviceError::OutOfBounds)? as usize;
        if offset + len > self.map.len() {
            return Err(DeviceError::OutOfBounds);
        }
        Ok(offset)
    }
}

impl BlockDevice for ImageFlash {
    fn read_word(&mut self, address: u32) -> Result<u32, DeviceError> {
        let offset = self.offset(address, WORD_SIZE as usize)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.map[offset..offset + 4]);
        Ok(u32::from_le_bytes(word))
    }

    fn read_byte(&mut self, address: u32) -> Result<u8, DeviceError> {
        let offset = self.offset(address, 1)?;
        Ok(self.map[offset])
    }

    fn program_word(&mut self, address: u32, word: u32) -> Result<(), DeviceError> {
        if address % WORD_SIZE != 0 {
            return Err(DeviceError::NotAligned);
        }
        let offset = self.offset(address, WORD_SIZE as usize)?;
        let cell = &mut self.map[offset..offset + 4];
        let mut current = [0u8; 4];
        current.copy_from_slice(cell);
        if u32::from_le_bytes(current) & word != word {
            return Err(DeviceError::ProgramFailed { address });
        }
        cell.copy_from_slice(&word.to_le_bytes());
        Ok(())
    }

    fn erase_block(&mut self, address: u32) -> Result<(), DeviceError> {
        let relative = address.checked_sub(self.base).ok_or(DeviceError::OutOfBounds)?;
        let start = relative - relative % PAGE_SIZE;
        let offset = self.offset(self.base + start, PAGE_SIZE as usize)?;
        self.map[offset..offset + PAGE_SIZE as usize].fill(0xFF);
        Ok(())
    }
}
