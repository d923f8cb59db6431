// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Range-checked byte access over the two-page window.
//!
//! Turns arbitrary byte ranges into the word-granular operations the device
//! supports, and refuses anything outside `[page0_base, page1_end)`.

use byteorder::{ByteOrder, LittleEndian};

use crate::config::{Layout, Page, ERASED_WORD, PAGE_SIZE, WORD_SIZE};
use crate::error::{EepromError, Result};
use crate::flash::BlockDevice;

pub struct BoundedFlash<D> {
    device: D,
    layout: Layout,
}

impl<D: BlockDevice> BoundedFlash<D> {
    pub fn new(device: D, layout: Layout) -> Self {
        Self { device, layout }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    fn check(&self, address: u32, len: usize) -> Result<()> {
        if !self.layout.contains(address, len) {
            return Err(EepromError::AddressInvalid { address, len });
        }
        Ok(())
    }

    /// Reads one aligned word.
    pub fn read_word(&mut self, address: u32) -> Result<u32> {
        self.check(address, WORD_SIZE as usize)?;
        if address % WORD_SIZE != 0 {
            return Err(EepromError::Misaligned { address });
        }
        Ok(self.device.read_word(address)?)
    }

    /// Fills `buf` from `address`, byte by byte.
    pub fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.check(address, buf.len())?;
        for (addr, byte) in (address..).zip(buf.iter_mut()) {
            *byte = self.device.read_byte(addr)?;
        }
        Ok(())
    }

    /// Programs `data` starting at the aligned `address`.
    ///
    /// Full words go first; a trailing partial word is zero-padded in its
    /// unused high-order bytes. An empty slice is a no-op.
    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        self.check(address, data.len())?;
        if address % WORD_SIZE != 0 {
            return Err(EepromError::Misaligned { address });
        }

        let mut addr = address;
        let mut chunks = data.chunks_exact(WORD_SIZE as usize);
        for chunk in &mut chunks {
            self.device.program_word(addr, LittleEndian::read_u32(chunk))?;
            addr += WORD_SIZE;
        }

        let tail = chunks.remainder();
        if !tail.is_empty() {
            let mut word = [0u8; 4];
            word[..tail.len()].copy_from_slice(tail);
            self.device.program_word(addr, LittleEndian::read_u32(&word))?;
        }
        Ok(())
    }

    /// Erases `page` unless every word already reads all-ones.
    pub fn erase(&mut self, page: Page) -> Result<()> {
        let base = self.layout.page_base(page);
        for offset in (0..PAGE_SIZE).step_by(WORD_SIZE as usize) {
            if self.device.read_word(base + offset)? != ERASED_WORD {
                self.device.erase_block(base)?;
                return Ok(());
            }
        }
        Ok(())
    }

    /// Erase by absolute address; the address must be a page base.
    pub fn erase_at(&mut self, address: u32) -> Result<()> {
        match self.layout.page_at(address) {
            Some(page) => self.erase(page),
            None => Err(EepromError::AddressInvalid {
                address,
                len: PAGE_SIZE as usize,
            }),
        }
    }
}
