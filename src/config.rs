// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Geometry and on-flash constants.

use serde::{Deserialize, Serialize};

/// Size of one erase page in bytes.
pub const PAGE_SIZE: u32 = 1024;

/// Program granularity of the flash in bytes.
pub const WORD_SIZE: u32 = 4;

/// Status header at the base of every page (word A, word B).
pub const HEADER_SIZE: u32 = 8;

/// Record trailer: `(key << 16) | length`.
pub const TRAILER_SIZE: u32 = 4;

/// Largest payload a single variable may hold.
pub const VARIABLE_MAX_SIZE: usize = 64;

/// Value of a word that has not been programmed since the last erase.
pub const ERASED_WORD: u32 = 0xFFFF_FFFF;

/// Word B of a Receiving or Valid page.
pub const RECEIVE_MARK: u32 = 0xEEEE_EEEE;

/// Word A of a Valid page.
pub const VALID_MARK: u32 = 0x0000_0000;

/// Key value that can never be stored; it reads back from erased flash.
pub const RESERVED_KEY: u16 = 0xFFFF;

/// Pages 124 and 125 of a 128KB part mapped at 0x0800_0000.
pub const DEFAULT_BASE_ADDRESS: u32 = 0x0800_0000 + 124 * 1024;

/// One of the two erase pages owned by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Page {
    Page0,
    Page1,
}

impl Page {
    pub const ALL: [Page; 2] = [Page::Page0, Page::Page1];

    /// The alternate page.
    pub fn other(self) -> Page {
        match self {
            Page::Page0 => Page::Page1,
            Page::Page1 => Page::Page0,
        }
    }

    pub fn index(self) -> u32 {
        match self {
            Page::Page0 => 0,
            Page::Page1 => 1,
        }
    }
}

impl core::fmt::Display for Page {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PAGE{}", self.index())
    }
}

/// Physical placement of the two pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Absolute address of Page0; Page1 follows immediately.
    pub base_address: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            base_address: DEFAULT_BASE_ADDRESS,
        }
    }
}

impl Layout {
    pub const fn new(base_address: u32) -> Self {
        Self { base_address }
    }

    /// First address of `page` (its status header).
    pub fn page_base(&self, page: Page) -> u32 {
        self.base_address + page.index() * PAGE_SIZE
    }

    /// One past the last byte of `page`.
    pub fn page_end(&self, page: Page) -> u32 {
        self.page_base(page) + PAGE_SIZE
    }

    /// One past the last byte of the two-page window.
    pub fn window_end(&self) -> u32 {
        self.base_address + 2 * PAGE_SIZE
    }

    /// True when `[address, address + len)` lies inside the window.
    pub fn contains(&self, address: u32, len: usize) -> bool {
        let end = address as u64 + len as u64;
        address >= self.base_address && end <= self.window_end() as u64
    }

    /// Page whose base is exactly `address`, if any.
    pub fn page_at(&self, address: u32) -> Option<Page> {
        Page::ALL
            .into_iter()
            .find(|&page| self.page_base(page) == address)
    }
}

/// Rounds a payload length up to whole words.
pub const fn round_up(len: usize) -> usize {
    (len + WORD_SIZE as usize - 1) & !(WORD_SIZE as usize - 1)
}
