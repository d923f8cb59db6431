// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Block primitives consumed by the store.
//!
//! The store never touches memory-mapped flash directly; everything goes through
//! [`BlockDevice`]. Addresses are absolute, the same ones the store's [`Layout`]
//! uses.
//!
//! [`Layout`]: crate::config::Layout

use thiserror::Error;

pub mod nor;
pub mod sim;

pub use nor::NorFlashDevice;
pub use sim::SimFlash;

/// Errors raised by a flash driver. Never retried by the store.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// Program did not leave the requested pattern (tried to set a cleared bit).
    #[error("program failed at {address:#010x}")]
    ProgramFailed { address: u32 },

    #[error("erase failed at {address:#010x}")]
    EraseFailed { address: u32 },

    #[error("operation not aligned to the device granularity")]
    NotAligned,

    #[error("operation outside the device")]
    OutOfBounds,

    /// Supply dropped before the operation started; nothing was changed.
    #[error("power lost")]
    PowerLoss,

    #[error("device error")]
    Other,
}

/// Word-program / block-erase flash.
///
/// `program_word` may only clear bits and is atomic per word. `erase_block`
/// resets the whole block containing `address` to all-ones and is atomic per
/// block. Reads take `&mut self` because most HAL drivers need it.
pub trait BlockDevice {
    fn read_word(&mut self, address: u32) -> Result<u32, DeviceError>;

    fn read_byte(&mut self, address: u32) -> Result<u8, DeviceError>;

    fn program_word(&mut self, address: u32, word: u32) -> Result<(), DeviceError>;

    fn erase_block(&mut self, address: u32) -> Result<(), DeviceError>;
}

impl<T: BlockDevice + ?Sized> BlockDevice for &mut T {
    fn read_word(&mut self, address: u32) -> Result<u32, DeviceError> {
        (**self).read_word(address)
    }

    fn read_byte(&mut self, address: u32) -> Result<u8, DeviceError> {
        (**self).read_byte(address)
    }

    fn program_word(&mut self, address: u32, word: u32) -> Result<(), DeviceError> {
        (**self).program_word(address, word)
    }

    fn erase_block(&mut self, address: u32) -> Result<(), DeviceError> {
        (**self).erase_block(address)
    }
}
