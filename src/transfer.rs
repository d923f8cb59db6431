// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Page transfer (compaction).
//!
//! Step order, each step must succeed before the next starts:
//!
//! 1. mark target RECEIVING
//! 2. write the incoming record into the target
//! 3. copy the current value of every other table key from source to target
//! 4. erase source
//! 5. mark target VALID
//!
//! After a reset at any point, the two status headers tell [`crate::recovery`]
//! which of these steps still have to run.
//!
//! If the live set does not fit in one page, steps 2 or 3 hit `PageFull`. The
//! target is then erased and the source stays VALID and untouched.

use crate::access::BoundedFlash;
use crate::config::{Page, VARIABLE_MAX_SIZE};
use crate::error::{EepromError, Result};
use crate::flash::BlockDevice;
use crate::keys::KeyTable;
use crate::record;
use crate::status::{mark, PageStatus};

/// Copies every table key accepted by `include` from `source` into `target`.
///
/// Keys with no record in `source` are skipped. `scratch` carries one value
/// at a time. Returns how many records were copied.
pub fn rehome<D, F>(
    flash: &mut BoundedFlash<D>,
    keys: &KeyTable,
    scratch: &mut [u8; VARIABLE_MAX_SIZE],
    source: Page,
    target: Page,
    mut include: F,
) -> Result<usize>
where
    D: BlockDevice,
    F: FnMut(u16) -> bool,
{
    let mut copied = 0;
    for key in keys.iter().filter(|&k| include(k)) {
        let n = match record::find(flash, source, key, scratch) {
            Ok(n) => n,
            Err(EepromError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        };
        record::append(flash, target, key, &scratch[..n])?;
        tracing::debug!(key, len = n, %source, %target, "variable re-homed");
        copied += 1;
    }
    Ok(copied)
}

/// Moves the live data of the full VALID page into the other page, with
/// `(key, data)` as the first record of the new page.
pub fn page_transfer<D: BlockDevice>(
    flash: &mut BoundedFlash<D>,
    keys: &KeyTable,
    scratch: &mut [u8; VARIABLE_MAX_SIZE],
    key: u16,
    data: &[u8],
) -> Result<()> {
    let source = record::read_page(flash)?;
    let target = source.other();
    tracing::info!(%source, %target, key, "page full, transferring");

    mark(flash, target, PageStatus::Receiving)?;
    let filled = record::verify_and_write(flash, key, data)
        .and_then(|()| rehome(flash, keys, scratch, source, target, |k| k != key));
    let copied = match filled {
        Err(EepromError::PageFull) => {
            abandon(flash, target)?;
            return Err(EepromError::PageFull);
        }
        other => other?,
    };
    flash.erase(source)?;
    mark(flash, target, PageStatus::Valid)?;

    tracing::info!(%target, copied, "page transfer complete");
    Ok(())
}

/// Erases a half-built `target` so the untouched source is the only log again.
pub fn abandon<D: BlockDevice>(flash: &mut BoundedFlash<D>, target: Page) -> Result<()> {
    tracing::warn!(%target, "live data does not fit in one page, abandoning transfer");
    flash.erase(target)
}
