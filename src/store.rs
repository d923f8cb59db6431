// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Public store API.

use alloc::vec;
use alloc::vec::Vec;

use crate::access::BoundedFlash;
use crate::config::{Layout, Page, HEADER_SIZE, PAGE_SIZE, RESERVED_KEY, TRAILER_SIZE, VARIABLE_MAX_SIZE};
use crate::error::{EepromError, Result};
use crate::flash::BlockDevice;
use crate::keys::KeyTable;
use crate::record::{self, RecordRef};
use crate::recovery;
use crate::status::{read_status, PageStatus};
use crate::transfer;

/// Emulated EEPROM over two flash pages.
///
/// Every call takes `&mut self`; callers on more than one task must serialize
/// access themselves. Call [`Eeprom::init`] once after every reset before
/// reading or writing.
pub struct Eeprom<D> {
    flash: BoundedFlash<D>,
    keys: KeyTable,
    scratch: [u8; VARIABLE_MAX_SIZE],
}

impl<D: BlockDevice> Eeprom<D> {
    pub fn new(device: D, layout: Layout, keys: KeyTable) -> Self {
        let worst_case = keys.len() * (VARIABLE_MAX_SIZE + TRAILER_SIZE as usize);
        let capacity = (PAGE_SIZE - HEADER_SIZE) as usize;
        if worst_case > capacity {
            tracing::warn!(
                keys = keys.len(),
                worst_case,
                capacity,
                "key table can outgrow one page if every value is maximum size"
            );
        }
        Self {
            flash: BoundedFlash::new(device, layout),
            keys,
            scratch: [0; VARIABLE_MAX_SIZE],
        }
    }

    /// Recovers from whatever state the last reset left. Idempotent.
    pub fn init(&mut self) -> Result<()> {
        recovery::init(&mut self.flash, &self.keys, &mut self.scratch)
    }

    /// Erases both pages and starts an empty log. All values are lost.
    pub fn format(&mut self) -> Result<()> {
        tracing::warn!("formatting EEPROM");
        recovery::format(&mut self.flash)
    }

    /// Current value of `key`, truncated to `max_size` bytes.
    pub fn read_variable(&mut self, key: u16, max_size: u16) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; (max_size as usize).min(VARIABLE_MAX_SIZE)];
        let n = self.read_into(key, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Copies the current value of `key` into `buf`, returning the length copied.
    pub fn read_into(&mut self, key: u16, buf: &mut [u8]) -> Result<usize> {
        record::read(&mut self.flash, key, buf)
    }

    /// Stores `data` as the new value of `key`.
    ///
    /// Runs one page transfer if the active page is full. `PageFull` is only
    /// returned if the write still does not fit afterwards.
    pub fn write_variable(&mut self, key: u16, data: &[u8]) -> Result<()> {
        if data.len() > VARIABLE_MAX_SIZE {
            return Err(EepromError::SizeOverflow {
                size: data.len(),
                max: VARIABLE_MAX_SIZE,
            });
        }
        if key == RESERVED_KEY {
            return Err(EepromError::ReservedKey);
        }
        if !self.keys.contains(key) {
            return Err(EepromError::UnknownKey(key));
        }

        match record::verify_and_write(&mut self.flash, key, data) {
            Err(EepromError::PageFull) => {
                transfer::page_transfer(&mut self.flash, &self.keys, &mut self.scratch, key, data)
            }
            other => other,
        }
    }

    /// Status of both pages, `[PAGE0, PAGE1]`.
    pub fn page_states(&mut self) -> Result<[PageStatus; 2]> {
        Ok([
            read_status(&mut self.flash, Page::Page0)?,
            read_status(&mut self.flash, Page::Page1)?,
        ])
    }

    /// The VALID page serving reads.
    pub fn active_page(&mut self) -> Result<Page> {
        record::read_page(&mut self.flash)
    }

    /// Intact records of `page`, newest first.
    pub fn records(&mut self, page: Page) -> Result<Vec<RecordRef>> {
        record::records(&mut self.flash, page).collect()
    }

    /// Raw payload bytes of a record returned by [`Eeprom::records`].
    pub fn record_payload(&mut self, record: &RecordRef) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; record.len as usize];
        self.flash.read(record.address, &mut buf)?;
        Ok(buf)
    }

    /// Bytes left in the page currently accepting writes.
    pub fn free_bytes(&mut self) -> Result<u32> {
        let page = record::write_page(&mut self.flash)?;
        record::free_bytes(&mut self.flash, page)
    }

    pub fn keys(&self) -> &KeyTable {
        &self.keys
    }

    pub fn layout(&self) -> &Layout {
        self.flash.layout()
    }

    pub fn device(&self) -> &D {
        self.flash.device()
    }

    pub fn device_mut(&mut self) -> &mut D {
        self.flash.device_mut()
    }

    pub fn into_device(self) -> D {
        self.flash.into_device()
    }
}
