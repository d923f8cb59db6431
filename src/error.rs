// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use thiserror::Error;

use crate::config::Page;
use crate::flash::DeviceError;
use crate::status::PageStatus;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EepromError {
    /// Access outside the two-page window.
    #[error("address range {address:#010x}+{len} is outside the EEPROM window")]
    AddressInvalid { address: u32, len: usize },

    /// Word program requested at an address that is not word aligned.
    #[error("address {address:#010x} is not word aligned")]
    Misaligned { address: u32 },

    /// Neither page holds an authoritative log; run init().
    #[error("no valid page")]
    NoValidPage,

    /// The record does not fit in the active page.
    #[error("page full")]
    PageFull,

    #[error("variable size {size} exceeds maximum of {max} bytes")]
    SizeOverflow { size: usize, max: usize },

    #[error("key 0xFFFF is reserved")]
    ReservedKey,

    #[error("key {0:#06x} is not in the key table")]
    UnknownKey(u16),

    #[error("key {0:#06x} appears twice in the key table")]
    DuplicateKey(u16),

    /// The status header cannot reach `target` without setting bits.
    #[error("cannot mark {page} as {target:?}")]
    MarkInvalid { page: Page, target: PageStatus },

    #[error("key {0:#06x} not found")]
    NotFound(u16),

    #[error("flash device error: {0}")]
    Device(#[from] DeviceError),
}

pub type Result<T> = core::result::Result<T, EepromError>;
