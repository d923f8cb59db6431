// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Page status header protocol.
//!
//! ```text
//!               word A      word B
//! ERASED        FFFFFFFF    FFFFFFFF
//! RECEIVING     FFFFFFFF    EEEEEEEE
//! VALID         00000000    EEEEEEEE
//! ```
//!
//! Every legal transition only clears bits, so a mark is always a plain word
//! program. Going back to ERASED takes a page erase.

use serde::{Deserialize, Serialize};

use crate::access::BoundedFlash;
use crate::config::{Page, ERASED_WORD, RECEIVE_MARK, VALID_MARK, WORD_SIZE};
use crate::error::{EepromError, Result};
use crate::flash::BlockDevice;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageStatus {
    Erased,
    Receiving,
    Valid,
    /// Header matches none of the three patterns.
    Corrupt { word_a: u32, word_b: u32 },
}

impl PageStatus {
    pub fn decode(word_a: u32, word_b: u32) -> Self {
        match (word_a, word_b) {
            (ERASED_WORD, ERASED_WORD) => PageStatus::Erased,
            (ERASED_WORD, RECEIVE_MARK) => PageStatus::Receiving,
            (VALID_MARK, RECEIVE_MARK) => PageStatus::Valid,
            (word_a, word_b) => PageStatus::Corrupt { word_a, word_b },
        }
    }

    /// Header words `(A, B)` for this state.
    pub fn encode(self) -> (u32, u32) {
        match self {
            PageStatus::Erased => (ERASED_WORD, ERASED_WORD),
            PageStatus::Receiving => (ERASED_WORD, RECEIVE_MARK),
            PageStatus::Valid => (VALID_MARK, RECEIVE_MARK),
            PageStatus::Corrupt { word_a, word_b } => (word_a, word_b),
        }
    }

    pub fn is_corrupt(self) -> bool {
        matches!(self, PageStatus::Corrupt { .. })
    }
}

impl core::fmt::Display for PageStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PageStatus::Erased => f.write_str("ERASED"),
            PageStatus::Receiving => f.write_str("RECEIVING"),
            PageStatus::Valid => f.write_str("VALID"),
            PageStatus::Corrupt { word_a, word_b } => {
                write!(f, "CORRUPT({word_a:08X} {word_b:08X})")
            }
        }
    }
}

fn header_words<D: BlockDevice>(flash: &mut BoundedFlash<D>, page: Page) -> Result<(u32, u32)> {
    let base = flash.layout().page_base(page);
    Ok((flash.read_word(base)?, flash.read_word(base + WORD_SIZE)?))
}

pub fn read_status<D: BlockDevice>(flash: &mut BoundedFlash<D>, page: Page) -> Result<PageStatus> {
    let (a, b) = header_words(flash, page)?;
    Ok(PageStatus::decode(a, b))
}

/// Moves `page` forward to `target`.
///
/// Word B is programmed before word A, so a page that skipped RECEIVING still
/// ends up with a well-formed VALID header. Words already at their target are
/// left alone. If either word would need a bit set, nothing is programmed and
/// `MarkInvalid` is returned.
pub fn mark<D: BlockDevice>(flash: &mut BoundedFlash<D>, page: Page, target: PageStatus) -> Result<()> {
    let invalid = EepromError::MarkInvalid { page, target };
    let (want_a, want_b) = match target {
        PageStatus::Erased => return Ok(()),
        PageStatus::Corrupt { .. } => return Err(invalid),
        PageStatus::Receiving | PageStatus::Valid => target.encode(),
    };

    let (a, b) = header_words(flash, page)?;
    if a & want_a != want_a || b & want_b != want_b {
        return Err(invalid);
    }

    let base = flash.layout().page_base(page);
    if b != want_b {
        flash.write(base + WORD_SIZE, &want_b.to_le_bytes())?;
    }
    if a != want_a {
        flash.write(base, &want_a.to_le_bytes())?;
    }
    Ok(())
}
