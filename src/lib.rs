// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
#![no_std]

//! flashvar: EEPROM emulation on two erase pages of NOR flash.
//!
//! A small keyed variable store (`read(key)`, `write(key, bytes)`) laid out as an
//! append-only log in one page, compacted into the other page when full. Crash
//! consistency comes from write ordering alone; [`Eeprom::init`] rolls any
//! interrupted operation forward after a reset.

extern crate alloc;

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod config;
pub mod error;
pub mod flash;
pub mod access;
pub mod status;
pub mod keys;
pub mod record;
pub mod transfer;
pub mod recovery;
pub mod store;

pub use config::{Layout, Page};
pub use error::{EepromError, Result};
pub use flash::{BlockDevice, DeviceError};
pub use keys::KeyTable;
pub use status::PageStatus;
pub use store::Eeprom;

#[cfg(test)]
pub mod tests;
