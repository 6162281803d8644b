//! ANSI (single/double-byte code page) string decoding.
//!
//! Grounded on the teacher crate's use of the `encoding` crate for this
//! exact concern (see the historical `binxml.rs`, which decodes UTF-16LE
//! through `encoding::all::UTF_16LE`); here it decodes `AnsiString` typed
//! values through whichever code page [`crate::DecodeConfig::code_page`]
//! names, defaulting to Windows-1252 per §6's `io_handle` description.

use encoding::label::encoding_from_windows_code_page;
use encoding::{DecoderTrap, Encoding};

pub(crate) const DEFAULT_CODE_PAGE: u16 = 1252;

/// Decode `bytes` using the Windows code page `code_page`, falling back to
/// CP-1252 if the code page is not recognized. Malformed byte sequences
/// are replaced rather than rejected, matching the decoder's practice of
/// never failing a whole record over one string field.
pub(crate) fn decode_ansi_string(bytes: &[u8], code_page: u16) -> String {
    let encoding = encoding_from_windows_code_page(code_page as usize)
        .or_else(|| encoding_from_windows_code_page(DEFAULT_CODE_PAGE as usize))
        .expect("Windows-1252 is always a registered code page");

    encoding
        .decode(bytes, DecoderTrap::Replace)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_ascii_under_default_code_page() {
        assert_eq!(decode_ansi_string(b"hello", DEFAULT_CODE_PAGE), "hello");
    }

    #[test]
    fn falls_back_to_default_for_unknown_code_page() {
        assert_eq!(decode_ansi_string(b"hi", 0), "hi");
    }
}
