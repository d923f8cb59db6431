// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::config::{Page, PAGE_SIZE};
use crate::error::EepromError;
use crate::flash::BlockDevice;
use crate::tests::{bounded, BASE};

#[test]
fn test_write_pads_partial_word_with_zeros() {
    let mut flash = bounded();
    flash.write(BASE + 8, &[1, 2, 3, 4, 5]).unwrap();

    assert_eq!(flash.read_word(BASE + 8).unwrap(), 0x0403_0201);
    assert_eq!(flash.read_word(BASE + 12).unwrap(), 0x0000_0005);
    assert_eq!(flash.device().program_count(), 2);

    let mut buf = [0u8; 5];
    flash.read(BASE + 8, &mut buf).unwrap();
    assert_eq!(buf, [1, 2, 3, 4, 5]);
}

#[test]
fn test_empty_write_programs_nothing() {
    let mut flash = bounded();
    flash.write(BASE + 8, &[]).unwrap();
    assert_eq!(flash.device().program_count(), 0);
}

#[test]
fn test_rejects_ranges_outside_window() {
    let mut flash = bounded();
    let end = BASE + 2 * PAGE_SIZE;

    assert_eq!(
        flash.write(BASE - 4, &[0; 4]),
        Err(EepromError::AddressInvalid { address: BASE - 4, len: 4 })
    );
    assert_eq!(
        flash.write(end - 4, &[0; 8]),
        Err(EepromError::AddressInvalid { address: end - 4, len: 8 })
    );
    assert_eq!(
        flash.read(end, &mut [0u8; 1]),
        Err(EepromError::AddressInvalid { address: end, len: 1 })
    );
    assert_eq!(
        flash.read_word(end),
        Err(EepromError::AddressInvalid { address: end, len: 4 })
    );
    assert_eq!(
        flash.erase_at(BASE + 4),
        Err(EepromError::AddressInvalid { address: BASE + 4, len: PAGE_SIZE as usize })
    );
    assert_eq!(flash.device().op_count(), 0);
}

#[test]
fn test_last_word_of_window_is_usable() {
    let mut flash = bounded();
    let last = BASE + 2 * PAGE_SIZE - 4;
    flash.write(last, &[0xAB]).unwrap();
    assert_eq!(flash.read_word(last).unwrap(), 0x0000_00AB);
}

#[test]
fn test_misaligned_write_rejected() {
    let mut flash = bounded();
    assert_eq!(
        flash.write(BASE + 9, &[1]),
        Err(EepromError::Misaligned { address: BASE + 9 })
    );
}

#[test]
fn test_erase_skips_blank_page() {
    let mut flash = bounded();
    flash.erase(Page::Page1).unwrap();
    assert_eq!(flash.device().erase_count(), 0);
}

#[test]
fn test_erase_dirty_page_only() {
    let mut flash = bounded();
    flash.write(BASE + 16, &[0; 4]).unwrap();
    flash.write(BASE + PAGE_SIZE + 1020, &[0; 4]).unwrap();

    flash.erase_at(BASE + PAGE_SIZE).unwrap();
    assert_eq!(flash.device().erase_count(), 1);
    assert_eq!(flash.read_word(BASE + PAGE_SIZE + 1020).unwrap(), 0xFFFF_FFFF);
    assert_eq!(flash.read_word(BASE + 16).unwrap(), 0);

    // Direct device access sees the same image.
    assert_eq!(flash.device_mut().read_byte(BASE + 16).unwrap(), 0);
}
