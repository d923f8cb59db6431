#[cfg(test)]
// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod access_tests;
pub mod status_tests;

use std::format;
use std::vec::Vec;

use crate::access::BoundedFlash;
use crate::config::Layout;
use crate::flash::SimFlash;
use crate::keys::KeyTable;
use crate::store::Eeprom;

/// Page0 at the start of a 128KB part; keeps addresses easy to read in failures.
pub const BASE: u32 = 0x0800_0000;

pub fn layout() -> Layout {
    Layout::new(BASE)
}

pub fn sim() -> SimFlash {
    SimFlash::for_layout(&layout())
}

pub fn bounded() -> BoundedFlash<SimFlash> {
    BoundedFlash::new(sim(), layout())
}

/// Keys `1..=n`.
pub fn keys(n: u16) -> KeyTable {
    KeyTable::sequential(1, n).unwrap()
}

/// Initialized store over blank flash with keys `1..=n`, counters cleared.
pub fn store(n: u16) -> Eeprom<SimFlash> {
    let mut eeprom = Eeprom::new(sim(), layout(), keys(n));
    eeprom.init().unwrap();
    eeprom.device_mut().reset_counters();
    eeprom
}

/// Printable payload of exactly `len` bytes, distinct per (key, generation).
pub fn value(key: u16, generation: u32, len: usize) -> Vec<u8> {
    format!("k{key:04x}g{generation:06}.")
        .into_bytes()
        .into_iter()
        .cycle()
        .take(len)
        .collect()
}
