// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Record log: append path and backward scan.
//!
//! ```text
//! page_end  +--------------------+
//!           | FFFFFFFF ...       |  free
//!           | trailer (newest)   |  (key << 16) | len
//!           | payload, padded    |
//!           | ...                |
//!           | trailer (oldest)   |
//!           | payload, padded    |
//! base + 8  +--------------------+
//!           | status header      |
//! base      +--------------------+
//! ```
//!
//! Records are appended upward from the header; the scan walks down from the
//! page end, so the first trailer met for a key is its current value.

use serde::{Deserialize, Serialize};

use crate::access::BoundedFlash;
use crate::config::{
    round_up, Page, ERASED_WORD, HEADER_SIZE, RESERVED_KEY, TRAILER_SIZE, VARIABLE_MAX_SIZE,
    WORD_SIZE,
};
use crate::error::{EepromError, Result};
use crate::flash::BlockDevice;
use crate::status::{read_status, PageStatus};

const FREE_LEN: u16 = 0xFFFF;

/// 4-byte footer stored directly above a record's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trailer {
    pub key: u16,
    pub len: u16,
}

impl Trailer {
    pub fn new(key: u16, len: u16) -> Self {
        Self { key, len }
    }

    pub fn decode(word: u32) -> Self {
        Self {
            key: (word >> 16) as u16,
            len: (word & 0xFFFF) as u16,
        }
    }

    pub fn encode(self) -> u32 {
        ((self.key as u32) << 16) | self.len as u32
    }

    /// Bytes the record occupies including the trailer.
    pub fn footprint(self) -> u32 {
        round_up(self.len as usize) as u32 + TRAILER_SIZE
    }
}

/// Location of one intact record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub key: u16,
    pub len: u16,
    /// Address of the first payload byte.
    pub address: u32,
}

/// Page accepting writes: the RECEIVING page while a transfer is running,
/// otherwise the VALID page.
pub fn write_page<D: BlockDevice>(flash: &mut BoundedFlash<D>) -> Result<Page> {
    let p0 = read_status(flash, Page::Page0)?;
    let p1 = read_status(flash, Page::Page1)?;
    match (p0, p1) {
        (PageStatus::Receiving, PageStatus::Valid) => Ok(Page::Page0),
        (_, PageStatus::Valid) => Ok(Page::Page1),
        (PageStatus::Valid, PageStatus::Receiving) => Ok(Page::Page1),
        (PageStatus::Valid, _) => Ok(Page::Page0),
        _ => Err(EepromError::NoValidPage),
    }
}

/// Page serving reads. Strictly VALID; a RECEIVING page is never read.
pub fn read_page<D: BlockDevice>(flash: &mut BoundedFlash<D>) -> Result<Page> {
    if read_status(flash, Page::Page0)? == PageStatus::Valid {
        Ok(Page::Page0)
    } else if read_status(flash, Page::Page1)? == PageStatus::Valid {
        Ok(Page::Page1)
    } else {
        Err(EepromError::NoValidPage)
    }
}

/// First free address of `page`: one word above the highest programmed word.
/// `None` if nothing above the header base word is programmed.
pub fn write_cursor<D: BlockDevice>(flash: &mut BoundedFlash<D>, page: Page) -> Result<Option<u32>> {
    let base = flash.layout().page_base(page);
    let mut addr = flash.layout().page_end(page) - WORD_SIZE;
    while addr >= base + WORD_SIZE {
        if flash.read_word(addr)? != ERASED_WORD {
            return Ok(Some(addr + WORD_SIZE));
        }
        addr -= WORD_SIZE;
    }
    Ok(None)
}

/// Bytes left between the write cursor and the end of `page`.
pub fn free_bytes<D: BlockDevice>(flash: &mut BoundedFlash<D>, page: Page) -> Result<u32> {
    let end = flash.layout().page_end(page);
    Ok(write_cursor(flash, page)?.map_or(0, |cursor| end - cursor))
}

/// Appends `(key, data)` to the page accepting writes.
pub fn verify_and_write<D: BlockDevice>(flash: &mut BoundedFlash<D>, key: u16, data: &[u8]) -> Result<()> {
    let page = write_page(flash)?;
    append(flash, page, key, data)
}

/// Appends `(key, data)` at the write cursor of `page`.
///
/// Payload first, trailer last: a record only exists once its trailer is
/// programmed. Returns `PageFull` without programming anything if the record
/// does not fit. Empty data is stored as a bare trailer.
pub fn append<D: BlockDevice>(flash: &mut BoundedFlash<D>, page: Page, key: u16, data: &[u8]) -> Result<()> {
    if data.len() > VARIABLE_MAX_SIZE {
        return Err(EepromError::SizeOverflow {
            size: data.len(),
            max: VARIABLE_MAX_SIZE,
        });
    }

    let end = flash.layout().page_end(page);
    let cursor = write_cursor(flash, page)?.ok_or(EepromError::PageFull)?;

    let trailer = Trailer::new(key, data.len() as u16);
    if end - cursor < trailer.footprint() {
        return Err(EepromError::PageFull);
    }

    flash.write(cursor, data)?;
    let trailer_addr = cursor + round_up(data.len()) as u32;
    flash.write(trailer_addr, &trailer.encode().to_le_bytes())?;

    tracing::debug!(key, len = data.len(), address = trailer_addr, %page, "record appended");
    Ok(())
}

/// Walks the records of one page from newest to oldest.
///
/// Free words are skipped one at a time. A slot that does not parse as a
/// trailer is skipped one word at a time too. A trailer with a real length
/// but the reserved key ends the scan.
pub struct RecordScan<'a, D> {
    flash: &'a mut BoundedFlash<D>,
    floor: u32,
    cursor: u32,
    done: bool,
}

impl<'a, D: BlockDevice> RecordScan<'a, D> {
    pub fn new(flash: &'a mut BoundedFlash<D>, page: Page) -> Self {
        let floor = flash.layout().page_base(page) + HEADER_SIZE;
        let cursor = flash.layout().page_end(page) - WORD_SIZE;
        Self {
            flash,
            floor,
            cursor,
            done: false,
        }
    }

    fn step(&mut self, by: u32) {
        match self.cursor.checked_sub(by) {
            Some(next) if next >= self.floor => self.cursor = next,
            _ => self.done = true,
        }
    }
}

impl<D: BlockDevice> Iterator for RecordScan<'_, D> {
    type Item = Result<RecordRef>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done && self.cursor >= self.floor {
            let word = match self.flash.read_word(self.cursor) {
                Ok(word) => word,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            let trailer = Trailer::decode(word);

            if trailer.len == FREE_LEN {
                self.step(WORD_SIZE);
                continue;
            }
            if trailer.key == RESERVED_KEY {
                tracing::debug!(address = self.cursor, "reserved key in trailer, end of log");
                self.done = true;
                return None;
            }

            let payload = round_up(trailer.len as usize) as u32;
            let fits = trailer.len as usize <= VARIABLE_MAX_SIZE
                && self.cursor >= self.floor + payload;
            if !fits {
                self.step(WORD_SIZE);
                continue;
            }

            let record = RecordRef {
                key: trailer.key,
                len: trailer.len,
                address: self.cursor - payload,
            };
            self.step(trailer.footprint());
            return Some(Ok(record));
        }
        None
    }
}

/// Iterates every intact record of `page`, newest first.
pub fn records<D: BlockDevice>(flash: &mut BoundedFlash<D>, page: Page) -> RecordScan<'_, D> {
    RecordScan::new(flash, page)
}

/// Newest record for `key` in `page`, if any.
pub fn locate<D: BlockDevice>(flash: &mut BoundedFlash<D>, page: Page, key: u16) -> Result<Option<RecordRef>> {
    for record in records(flash, page) {
        let record = record?;
        if record.key == key {
            return Ok(Some(record));
        }
    }
    Ok(None)
}

/// Copies the current value of `key` in `page` into `buf`.
///
/// Returns the number of bytes copied, truncated to `buf.len()`.
pub fn find<D: BlockDevice>(flash: &mut BoundedFlash<D>, page: Page, key: u16, buf: &mut [u8]) -> Result<usize> {
    let record = locate(flash, page, key)?.ok_or(EepromError::NotFound(key))?;
    let n = buf.len().min(record.len as usize);
    flash.read(record.address, &mut buf[..n])?;
    Ok(n)
}

/// Reads `key` from the VALID page.
pub fn read<D: BlockDevice>(flash: &mut BoundedFlash<D>, key: u16, buf: &mut [u8]) -> Result<usize> {
    let page = read_page(flash)?;
    find(flash, page, key, buf)
}
