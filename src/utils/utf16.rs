//! UTF-16LE decoding helpers.
//!
//! Grounded on the teacher crate's `utils/utf16_opt.rs::decode_utf16_trim`:
//! decode code units to a `String`, stopping early at an embedded NUL.
//! Unlike the teacher, lossy replacement is used for unpaired surrogates
//! instead of erroring — EVTX binxml string values are not validated by
//! the Windows event log infrastructure and truncating the whole record on
//! a single bad surrogate would be out of proportion to the problem.

use std::char::decode_utf16;

/// Decode little-endian UTF-16 bytes to a `String`, stopping at an
/// embedded NUL code unit if one is present. `bytes.len()` is assumed to
/// be even; a trailing odd byte is ignored.
pub(crate) fn decode_utf16le(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]));

    let mut out = String::with_capacity(bytes.len() / 2);
    for r in decode_utf16(units) {
        match r {
            Ok('\0') => break,
            Ok(ch) => out.push(ch),
            Err(_) => out.push('\u{FFFD}'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_ascii() {
        let bytes: Vec<u8> = "hi".encode_utf16().flat_map(u16::to_le_bytes).collect();
        assert_eq!(decode_utf16le(&bytes), "hi");
    }

    #[test]
    fn stops_at_embedded_nul() {
        let mut bytes: Vec<u8> = "ab".encode_utf16().flat_map(u16::to_le_bytes).collect();
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&('c' as u16).to_le_bytes());
        assert_eq!(decode_utf16le(&bytes), "ab");
    }

    #[test]
    fn replaces_unpaired_surrogate() {
        let bytes = 0xD800u16.to_le_bytes();
        assert_eq!(decode_utf16le(&bytes), "\u{FFFD}");
    }
}
