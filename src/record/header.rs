//! Record header parsing.
//!
//! Grounded on the teacher crate's `evtx_record.rs`
//! (`EvtxRecordHeader::from_reader`): fixed-layout, little-endian, magic
//! `2A 2A 00 00`. This version validates bounds and the trailing
//! `size_copy` explicitly rather than relying on a panicking `assert_eq!`,
//! per §4.1 and §7 (§9's resolved open question on `strict_size_copy`).

use crate::err::EvtxError;
use crate::utils::byte_cursor::ByteCursor;
use crate::DecodeConfig;

const SIGNATURE: [u8; 4] = [0x2a, 0x2a, 0x00, 0x00];

/// Fixed header length: 4 (signature) + 4 (size) + 8 (identifier) +
/// 8 (written_time).
pub(crate) const HEADER_LEN: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecordHeader {
    pub(crate) chunk_data_offset: usize,
    pub(crate) size: u32,
    pub(crate) identifier: u64,
    pub(crate) written_time: u64,
    pub(crate) size_copy: u32,
    pub(crate) size_copy_mismatch: bool,
}

impl RecordHeader {
    /// Byte range of the binary-XML payload that follows this header.
    pub(crate) fn xml_range(&self) -> (usize, usize) {
        let start = self.chunk_data_offset + HEADER_LEN as usize;
        let end = self.chunk_data_offset + self.size as usize - 4;
        (start, end)
    }
}

/// Parse a record header at `offset` in `buf`, per §4.1.
pub(crate) fn parse(
    buf: &[u8],
    offset: usize,
    config: DecodeConfig,
) -> crate::err::Result<RecordHeader> {
    let n = buf.len();
    let fits = match offset.checked_add(HEADER_LEN as usize + 4) {
        Some(end) => end <= n,
        None => false,
    };
    if !fits {
        return Err(EvtxError::truncated(
            offset as u64,
            HEADER_LEN as usize + 4,
            n.saturating_sub(offset),
        ));
    }

    let mut cursor = ByteCursor::with_pos(buf, offset)?;
    let signature = cursor.array::<4>()?;
    if signature != SIGNATURE {
        return Err(EvtxError::UnsupportedSignature { found: signature });
    }

    let size = cursor.u32()?;
    let identifier = cursor.u64()?;
    let written_time = cursor.u64()?;

    if size < HEADER_LEN + 4 || (offset as u64 + u64::from(size)) > n as u64 {
        return Err(EvtxError::SizeOutOfBounds {
            offset: offset as u64,
            size,
            header_len: HEADER_LEN,
            chunk_len: n,
        });
    }

    let size_copy_offset = offset + size as usize - 4;
    let mut copy_cursor = ByteCursor::with_pos(buf, size_copy_offset)?;
    let size_copy = copy_cursor.u32()?;

    let size_copy_mismatch = size_copy != size;
    if size_copy_mismatch && config.strict_size_copy {
        return Err(EvtxError::SizeCopyMismatch {
            offset: offset as u64,
            size,
            size_copy,
        });
    }
    if size_copy_mismatch {
        log::warn!(
            "record at offset {}: size_copy ({}) does not match size ({})",
            offset,
            size_copy,
            size
        );
    }

    Ok(RecordHeader {
        chunk_data_offset: offset,
        size,
        identifier,
        written_time,
        size_copy,
        size_copy_mismatch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_record(body: &[u8]) -> Vec<u8> {
        let total_size = HEADER_LEN as usize + body.len() + 4;
        let mut buf = Vec::new();
        buf.extend_from_slice(&SIGNATURE);
        buf.extend_from_slice(&(total_size as u32).to_le_bytes());
        buf.extend_from_slice(&42u64.to_le_bytes());
        buf.extend_from_slice(&1_000_000u64.to_le_bytes());
        buf.extend_from_slice(body);
        buf.extend_from_slice(&(total_size as u32).to_le_bytes());
        buf
    }

    #[test]
    fn parses_valid_header() {
        let buf = build_record(&[0u8; 8]);
        let header = parse(&buf, 0, DecodeConfig::default()).unwrap();
        assert_eq!(header.identifier, 42);
        assert_eq!(header.written_time, 1_000_000);
        assert!(!header.size_copy_mismatch);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut buf = build_record(&[0u8; 8]);
        buf[0] = 0x00;
        let err = parse(&buf, 0, DecodeConfig::default()).unwrap_err();
        assert!(matches!(err, EvtxError::UnsupportedSignature { .. }));
    }

    #[test]
    fn rejects_truncated_buffer() {
        let buf = build_record(&[0u8; 8]);
        let err = parse(&buf[..buf.len() - 1], 0, DecodeConfig::default()).unwrap_err();
        assert!(matches!(err, EvtxError::SizeOutOfBounds { .. } | EvtxError::OutOfBounds { .. }));
    }

    #[test]
    fn warns_but_accepts_size_copy_mismatch_by_default() {
        let mut buf = build_record(&[0u8; 8]);
        let len = buf.len();
        buf[len - 1] = 0xff;
        let header = parse(&buf, 0, DecodeConfig::default()).unwrap();
        assert!(header.size_copy_mismatch);
    }

    #[test]
    fn strict_mode_rejects_size_copy_mismatch() {
        let mut buf = build_record(&[0u8; 8]);
        let len = buf.len();
        buf[len - 1] = 0xff;
        let config = DecodeConfig {
            strict_size_copy: true,
            ..DecodeConfig::default()
        };
        let err = parse(&buf, 0, config).unwrap_err();
        assert!(matches!(err, EvtxError::SizeCopyMismatch { .. }));
    }
}
