// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::config::{Page, PAGE_SIZE};
use crate::error::EepromError;
use crate::status::{mark, read_status, PageStatus};
use crate::tests::{bounded, BASE};

#[test]
fn test_decode_header_patterns() {
    assert_eq!(PageStatus::decode(0xFFFF_FFFF, 0xFFFF_FFFF), PageStatus::Erased);
    assert_eq!(PageStatus::decode(0xFFFF_FFFF, 0xEEEE_EEEE), PageStatus::Receiving);
    assert_eq!(PageStatus::decode(0x0000_0000, 0xEEEE_EEEE), PageStatus::Valid);
    assert_eq!(
        PageStatus::decode(0x0000_0000, 0xFFFF_FFFF),
        PageStatus::Corrupt { word_a: 0, word_b: 0xFFFF_FFFF }
    );
    for status in [PageStatus::Erased, PageStatus::Receiving, PageStatus::Valid] {
        let (a, b) = status.encode();
        assert_eq!(PageStatus::decode(a, b), status);
    }
}

#[test]
fn test_mark_receiving_then_valid_bit_patterns() {
    let mut flash = bounded();
    let base = PAGE_SIZE as usize;

    mark(&mut flash, Page::Page1, PageStatus::Receiving).unwrap();
    assert_eq!(read_status(&mut flash, Page::Page1).unwrap(), PageStatus::Receiving);
    assert_eq!(
        &flash.device().image()[base..base + 8],
        &[0xFF, 0xFF, 0xFF, 0xFF, 0xEE, 0xEE, 0xEE, 0xEE]
    );

    mark(&mut flash, Page::Page1, PageStatus::Valid).unwrap();
    assert_eq!(read_status(&mut flash, Page::Page1).unwrap(), PageStatus::Valid);
    assert_eq!(
        &flash.device().image()[base..base + 8],
        &[0x00, 0x00, 0x00, 0x00, 0xEE, 0xEE, 0xEE, 0xEE]
    );
    // Receiving -> Valid only needed word A.
    assert_eq!(flash.device().program_count(), 2);

    // Page0 untouched.
    assert_eq!(read_status(&mut flash, Page::Page0).unwrap(), PageStatus::Erased);
}

#[test]
fn test_mark_valid_straight_from_erased() {
    let mut flash = bounded();
    mark(&mut flash, Page::Page0, PageStatus::Valid).unwrap();
    assert_eq!(read_status(&mut flash, Page::Page0).unwrap(), PageStatus::Valid);
    assert_eq!(flash.read_word(BASE + 4).unwrap(), 0xEEEE_EEEE);
    assert_eq!(flash.device().program_count(), 2);

    // Already there: nothing to program.
    mark(&mut flash, Page::Page0, PageStatus::Valid).unwrap();
    assert_eq!(flash.device().program_count(), 2);
}

#[test]
fn test_mark_cannot_set_bits() {
    let mut flash = bounded();
    mark(&mut flash, Page::Page0, PageStatus::Valid).unwrap();
    let before = flash.device().program_count();

    assert_eq!(
        mark(&mut flash, Page::Page0, PageStatus::Receiving),
        Err(EepromError::MarkInvalid {
            page: Page::Page0,
            target: PageStatus::Receiving,
        })
    );
    assert_eq!(flash.device().program_count(), before);
    assert_eq!(read_status(&mut flash, Page::Page0).unwrap(), PageStatus::Valid);
}

#[test]
fn test_mark_erased_is_noop() {
    let mut flash = bounded();
    mark(&mut flash, Page::Page0, PageStatus::Valid).unwrap();
    mark(&mut flash, Page::Page0, PageStatus::Erased).unwrap();
    assert_eq!(read_status(&mut flash, Page::Page0).unwrap(), PageStatus::Valid);
}

#[test]
fn test_mark_corrupt_target_rejected() {
    let mut flash = bounded();
    let target = PageStatus::Corrupt { word_a: 1, word_b: 2 };
    assert_eq!(
        mark(&mut flash, Page::Page1, target),
        Err(EepromError::MarkInvalid { page: Page::Page1, target })
    );
    assert_eq!(flash.device().op_count(), 0);
}

#[test]
fn test_corrupt_header_decoded() {
    let mut flash = bounded();
    flash.write(BASE + PAGE_SIZE, &0x1234_5678u32.to_le_bytes()).unwrap();
    let status = read_status(&mut flash, Page::Page1).unwrap();
    assert!(status.is_corrupt());
    assert_eq!(
        status,
        PageStatus::Corrupt { word_a: 0x1234_5678, word_b: 0xFFFF_FFFF }
    );
}
