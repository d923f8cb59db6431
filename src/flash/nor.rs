// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Adapter from `embedded-storage` NOR drivers to [`BlockDevice`].

use byteorder::{ByteOrder, LittleEndian};
use embedded_storage::nor_flash::{NorFlash, NorFlashError, NorFlashErrorKind};

use crate::config::{PAGE_SIZE, WORD_SIZE};
use crate::flash::{BlockDevice, DeviceError};

impl From<NorFlashErrorKind> for DeviceError {
    fn from(kind: NorFlashErrorKind) -> Self {
        match kind {
            NorFlashErrorKind::NotAligned => DeviceError::NotAligned,
            NorFlashErrorKind::OutOfBounds => DeviceError::OutOfBounds,
            _ => DeviceError::Other,
        }
    }
}

fn map_err<E: NorFlashError>(e: E) -> DeviceError {
    e.kind().into()
}

/// Wraps any HAL `NorFlash` so the store can run on it.
///
/// `origin` is the absolute address of driver offset 0. The driver's erase
/// size must divide the EEPROM page size, so erasing one page never touches
/// the other.
pub struct NorFlashDevice<F> {
    flash: F,
    origin: u32,
}

impl<F: NorFlash> NorFlashDevice<F> {
    pub fn new(flash: F, origin: u32) -> Result<Self, DeviceError> {
        let word = WORD_SIZE as usize;
        if F::ERASE_SIZE == 0 || PAGE_SIZE as usize % F::ERASE_SIZE != 0 {
            return Err(DeviceError::NotAligned);
        }
        if word % F::WRITE_SIZE != 0 || word % F::READ_SIZE != 0 {
            return Err(DeviceError::NotAligned);
        }
        Ok(Self { flash, origin })
    }

    pub fn inner(&self) -> &F {
        &self.flash
    }

    pub fn into_inner(self) -> F {
        self.flash
    }

    fn offset(&self, address: u32) -> Result<u32, DeviceError> {
        address.checked_sub(self.origin).ok_or(DeviceError::OutOfBounds)
    }
}

impl<F: NorFlash> BlockDevice for NorFlashDevice<F> {
    fn read_word(&mut self, address: u32) -> Result<u32, DeviceError> {
        let offset = self.offset(address)?;
        let mut buf = [0u8; 4];
        self.flash.read(offset, &mut buf).map_err(map_err)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    fn read_byte(&mut self, address: u32) -> Result<u8, DeviceError> {
        let aligned = address & !(WORD_SIZE - 1);
        let word = self.read_word(aligned)?;
        Ok(word.to_le_bytes()[(address - aligned) as usize])
    }

    fn program_word(&mut self, address: u32, word: u32) -> Result<(), DeviceError> {
        let offset = self.offset(address)?;
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, word);
        self.flash.write(offset, &buf).map_err(map_err)
    }

    fn erase_block(&mut self, address: u32) -> Result<(), DeviceError> {
        let offset = self.offset(address)?;
        let start = offset - offset % PAGE_SIZE;
        self.flash
            .erase(start, start + PAGE_SIZE)
            .map_err(map_err)
    }
}
