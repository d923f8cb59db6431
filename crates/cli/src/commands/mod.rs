// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod format;
pub mod get;
pub mod init;
pub mod inspect;
pub mod keys;
pub mod set;

/// Printable text as-is, anything else as hex.
pub fn render_value(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) if !text.chars().any(char::is_control) => text.to_string(),
        _ => format!("0x{}", hex::encode(bytes)),
    }
}
