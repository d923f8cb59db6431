// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! In-memory NOR flash simulator.
//!
//! Behaves like real NOR: erase sets a whole block to 0xFF, program can only
//! clear bits. A program that would need to set a bit fails with
//! [`DeviceError::ProgramFailed`] and leaves the word untouched, like the
//! PGERR check on STM32/GD32 parts.
//!
//! Power loss is simulated with an operation budget: once it is spent, every
//! program or erase fails with [`DeviceError::PowerLoss`] before changing
//! anything. The image at that point is exactly what a reset would find.

use alloc::vec;
use alloc::vec::Vec;
use byteorder::{ByteOrder, LittleEndian};

use crate::config::{Layout, PAGE_SIZE, WORD_SIZE};
use crate::flash::{BlockDevice, DeviceError};

#[derive(Clone, Debug)]
pub struct SimFlash {
    base: u32,
    block_size: u32,
    data: Vec<u8>,
    budget: Option<usize>,
    programs: usize,
    erases: usize,
}

impl SimFlash {
    /// Fully erased flash of `len` bytes starting at `base`.
    pub fn new(base: u32, len: usize, block_size: u32) -> Self {
        Self::from_image(base, vec![0xFF; len], block_size)
    }

    /// Erased flash covering exactly the two pages of `layout`.
    pub fn for_layout(layout: &Layout) -> Self {
        Self::new(layout.base_address, 2 * PAGE_SIZE as usize, PAGE_SIZE)
    }

    /// Flash pre-loaded with `image`, e.g. a snapshot taken from another instance.
    pub fn from_image(base: u32, image: Vec<u8>, block_size: u32) -> Self {
        Self {
            base,
            block_size,
            data: image,
            budget: None,
            programs: 0,
            erases: 0,
        }
    }

    pub fn image(&self) -> &[u8] {
        &self.data
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    /// Allow `ops` more program/erase operations, then fail every one after.
    pub fn cut_power_after(&mut self, ops: usize) {
        self.budget = Some(ops);
    }

    pub fn restore_power(&mut self) {
        self.budget = None;
    }

    pub fn program_count(&self) -> usize {
        self.programs
    }

    pub fn erase_count(&self) -> usize {
        self.erases
    }

    /// Program plus erase operations that actually reached the array.
    pub fn op_count(&self) -> usize {
        self.programs + self.erases
    }

    pub fn reset_counters(&mut self) {
        self.programs = 0;
        self.erases = 0;
    }

    fn offset(&self, address: u32, len: u32) -> Result<usize, DeviceError> {
        let offset = address.checked_sub(self.base).ok_or(DeviceError::OutOfBounds)? as usize;
        if offset + len as usize > self.data.len() {
            return Err(DeviceError::OutOfBounds);
        }
        Ok(offset)
    }

    fn consume_budget(&mut self) -> Result<(), DeviceError> {
        match self.budget.as_mut() {
            Some(0) => Err(DeviceError::PowerLoss),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl BlockDevice for SimFlash {
    fn read_word(&mut self, address: u32) -> Result<u32, DeviceError> {
        let offset = self.offset(address, WORD_SIZE)?;
        Ok(LittleEndian::read_u32(&self.data[offset..offset + 4]))
    }

    fn read_byte(&mut self, address: u32) -> Result<u8, DeviceError> {
        let offset = self.offset(address, 1)?;
        Ok(self.data[offset])
    }

    fn program_word(&mut self, address: u32, word: u32) -> Result<(), DeviceError> {
        if address % WORD_SIZE != 0 {
            return Err(DeviceError::NotAligned);
        }
        let offset = self.offset(address, WORD_SIZE)?;
        self.consume_budget()?;

        let cell = &mut self.data[offset..offset + 4];
        let current = LittleEndian::read_u32(cell);
        if current & word != word {
            return Err(DeviceError::ProgramFailed { address });
        }
        LittleEndian::write_u32(cell, word);
        self.programs += 1;
        Ok(())
    }

    fn erase_block(&mut self, address: u32) -> Result<(), DeviceError> {
        let relative = address.checked_sub(self.base).ok_or(DeviceError::OutOfBounds)?;
        let start = self.base + relative - relative % self.block_size;
        let offset = self.offset(start, self.block_size)?;
        self.consume_budget()?;

        self.data[offset..offset + self.block_size as usize].fill(0xFF);
        self.erases += 1;
        Ok(())
    }
}
