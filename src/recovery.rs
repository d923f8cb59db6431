// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Startup recovery.
//!
//! ```text
//!  PAGE0      | PAGE1      | action
//! ------------+------------+---------------------------------------------
//!  ERASED     | VALID      | erase PAGE0
//!  ERASED     | RECEIVING  | erase PAGE0, mark PAGE1 VALID
//!  ERASED     | ERASED     | format
//!  RECEIVING  | VALID      | finish transfer PAGE1 -> PAGE0
//!  RECEIVING  | ERASED     | erase PAGE1, mark PAGE0 VALID
//!  RECEIVING  | RECEIVING  | format
//!  VALID      | ERASED     | erase PAGE1
//!  VALID      | RECEIVING  | finish transfer PAGE0 -> PAGE1
//!  VALID      | VALID      | format
//!  VALID      | CORRUPT    | erase the corrupt page
//!  anything else           | format
//! ```
//!
//! Every row ends in the steady state (one VALID, one ERASED). A failed step
//! returns immediately with flash left as that step left it, so the next
//! `init` lands on the same row or a later one.

use alloc::vec::Vec;

use crate::access::BoundedFlash;
use crate::config::{Page, VARIABLE_MAX_SIZE};
use crate::error::{EepromError, Result};
use crate::flash::BlockDevice;
use crate::keys::KeyTable;
use crate::record;
use crate::status::{mark, read_status, PageStatus};
use crate::transfer::{abandon, rehome};

/// Drives both pages back to the steady state.
pub fn init<D: BlockDevice>(
    flash: &mut BoundedFlash<D>,
    keys: &KeyTable,
    scratch: &mut [u8; VARIABLE_MAX_SIZE],
) -> Result<()> {
    use PageStatus::*;

    let page0 = read_status(flash, Page::Page0)?;
    let page1 = read_status(flash, Page::Page1)?;
    tracing::info!(%page0, %page1, "recovering page states");

    match (page0, page1) {
        (Erased, Valid) => flash.erase(Page::Page0),
        (Valid, Erased) => flash.erase(Page::Page1),
        (Erased, Receiving) => {
            flash.erase(Page::Page0)?;
            mark(flash, Page::Page1, Valid)
        }
        (Receiving, Erased) => {
            flash.erase(Page::Page1)?;
            mark(flash, Page::Page0, Valid)
        }
        (Receiving, Valid) => finish_transfer(flash, keys, scratch, Page::Page1, Page::Page0),
        (Valid, Receiving) => finish_transfer(flash, keys, scratch, Page::Page0, Page::Page1),
        (Valid, Corrupt { .. }) => {
            tracing::warn!(page = %Page::Page1, status = %page1, "corrupt header, erasing");
            flash.erase(Page::Page1)
        }
        (Corrupt { .. }, Valid) => {
            tracing::warn!(page = %Page::Page0, status = %page0, "corrupt header, erasing");
            flash.erase(Page::Page0)
        }
        (Erased, Erased) => {
            tracing::info!("blank flash, formatting");
            format(flash)
        }
        _ => {
            tracing::warn!(%page0, %page1, "invalid page state pair, formatting");
            format(flash)
        }
    }
}

/// Erases both pages and makes PAGE0 the empty VALID log.
pub fn format<D: BlockDevice>(flash: &mut BoundedFlash<D>) -> Result<()> {
    flash.erase(Page::Page0)?;
    mark(flash, Page::Page0, PageStatus::Valid)?;
    flash.erase(Page::Page1)
}

/// Completes a transfer interrupted after `target` was marked RECEIVING.
///
/// Keys that already have a record in `target` stay as they are. That covers
/// the incoming write, which is always the first record of the target, and any
/// key copied before the reset. Everything else is copied from `source`.
/// The source is erased before the target is marked VALID, the same order the
/// transfer itself uses, so a reset in between lands on the
/// RECEIVING/ERASED row. If the copy does not fit, the target is erased and
/// the source stays the VALID page.
fn finish_transfer<D: BlockDevice>(
    flash: &mut BoundedFlash<D>,
    keys: &KeyTable,
    scratch: &mut [u8; VARIABLE_MAX_SIZE],
    source: Page,
    target: Page,
) -> Result<()> {
    let present = record::records(flash, target)
        .map(|r| r.map(|r| r.key))
        .collect::<Result<Vec<u16>>>()?;
    tracing::info!(%source, %target, already = present.len(), "resuming page transfer");

    let copied = match rehome(flash, keys, scratch, source, target, |k| !present.contains(&k)) {
        // The source still holds every value; drop the copy and keep it.
        Err(EepromError::PageFull) => return abandon(flash, target),
        other => other?,
    };
    flash.erase(source)?;
    mark(flash, target, PageStatus::Valid)?;

    tracing::info!(%target, copied, "page transfer resumed and complete");
    Ok(())
}
