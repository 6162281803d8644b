//! A lightweight cursor over an immutable byte slice.
//!
//! Grounded on the teacher crate's `utils/byte_cursor.rs`: the slice/offset
//! equivalent of `Cursor<&[u8]>`, for hot-path parsing where the data is
//! already resident and we want explicit bounds control without IO-style
//! error plumbing. All reads are little-endian and advance the cursor on
//! success; nothing here allocates except the UTF-16 decode helpers, which
//! return owned `String`s (this crate's tree is fully owned, see
//! `model::tree`, so there is no arena to intern into).

use crate::err::EvtxError;
use crate::utils::utf16::decode_utf16le;

#[derive(Clone, Copy, Debug)]
pub(crate) struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    #[inline]
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        ByteCursor { buf, pos: 0 }
    }

    #[inline]
    pub(crate) fn with_pos(buf: &'a [u8], pos: usize) -> crate::err::Result<Self> {
        if pos > buf.len() {
            return Err(EvtxError::truncated(pos as u64, 0, 0));
        }
        Ok(ByteCursor { buf, pos })
    }

    #[inline]
    pub(crate) fn buf(&self) -> &'a [u8] {
        self.buf
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    #[inline]
    pub(crate) fn set_pos(&mut self, pos: usize) -> crate::err::Result<()> {
        if pos > self.buf.len() {
            return Err(EvtxError::truncated(pos as u64, 0, self.buf.len()));
        }
        self.pos = pos;
        Ok(())
    }

    #[inline]
    pub(crate) fn advance(&mut self, n: usize) -> crate::err::Result<()> {
        let new_pos = self
            .pos
            .checked_add(n)
            .ok_or_else(|| EvtxError::truncated(self.pos as u64, n, self.remaining()))?;
        self.set_pos(new_pos)
    }

    #[inline]
    pub(crate) fn take_bytes(&mut self, len: usize) -> crate::err::Result<&'a [u8]> {
        let start = self.pos;
        let end = start
            .checked_add(len)
            .ok_or_else(|| EvtxError::truncated(start as u64, len, self.remaining()))?;
        let out = self
            .buf
            .get(start..end)
            .ok_or_else(|| EvtxError::truncated(start as u64, len, self.remaining()))?;
        self.pos = end;
        Ok(out)
    }

    #[inline]
    pub(crate) fn array<const N: usize>(&mut self) -> crate::err::Result<[u8; N]> {
        let slice = self.take_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    #[inline]
    pub(crate) fn u8(&mut self) -> crate::err::Result<u8> {
        Ok(self.take_bytes(1)?[0])
    }

    #[inline]
    pub(crate) fn i8(&mut self) -> crate::err::Result<i8> {
        Ok(self.u8()? as i8)
    }

    #[inline]
    pub(crate) fn u16(&mut self) -> crate::err::Result<u16> {
        let b = self.array::<2>()?;
        Ok(u16::from_le_bytes(b))
    }

    #[inline]
    pub(crate) fn i16(&mut self) -> crate::err::Result<i16> {
        Ok(self.u16()? as i16)
    }

    #[inline]
    pub(crate) fn u32(&mut self) -> crate::err::Result<u32> {
        let b = self.array::<4>()?;
        Ok(u32::from_le_bytes(b))
    }

    #[inline]
    pub(crate) fn i32(&mut self) -> crate::err::Result<i32> {
        Ok(self.u32()? as i32)
    }

    #[inline]
    pub(crate) fn u64(&mut self) -> crate::err::Result<u64> {
        let b = self.array::<8>()?;
        Ok(u64::from_le_bytes(b))
    }

    #[inline]
    pub(crate) fn i64(&mut self) -> crate::err::Result<i64> {
        Ok(self.u64()? as i64)
    }

    #[inline]
    pub(crate) fn f32(&mut self) -> crate::err::Result<f32> {
        let b = self.array::<4>()?;
        Ok(f32::from_le_bytes(b))
    }

    #[inline]
    pub(crate) fn f64(&mut self) -> crate::err::Result<f64> {
        let b = self.array::<8>()?;
        Ok(f64::from_le_bytes(b))
    }

    /// Read a `u16`-count-prefixed UTF-16LE string, decoding until an
    /// embedded NUL if one is present, optionally skipping a trailing NUL
    /// code unit (EVTX binxml names are NUL-terminated; most string values
    /// are not).
    pub(crate) fn len_prefixed_utf16_string(
        &mut self,
        is_null_terminated: bool,
    ) -> crate::err::Result<String> {
        let char_count = self.u16()? as usize;
        let s = self.utf16_by_char_count(char_count)?;
        if is_null_terminated {
            let _ = self.u16()?;
        }
        Ok(s)
    }

    /// Read exactly `char_count` UTF-16 code units and decode to UTF-8,
    /// stopping early at an embedded NUL.
    pub(crate) fn utf16_by_char_count(&mut self, char_count: usize) -> crate::err::Result<String> {
        if char_count == 0 {
            return Ok(String::new());
        }
        let byte_len = char_count
            .checked_mul(2)
            .ok_or_else(|| EvtxError::truncated(self.pos as u64, usize::MAX, self.remaining()))?;
        let bytes = self.take_bytes(byte_len)?;
        Ok(decode_utf16le(bytes))
    }

    /// Read UTF-16LE code units up to an embedded NUL or `limit` (an
    /// absolute position), consuming the terminating NUL if one was found
    /// before `limit`. For string-array elements, which are packed
    /// back-to-back with no per-element length prefix, unlike a standalone
    /// `String` value (see `len_prefixed_utf16_string`).
    pub(crate) fn nul_terminated_utf16_string(&mut self, limit: usize) -> crate::err::Result<String> {
        let limit = limit.min(self.buf.len());
        let start = self.pos;
        let mut i = start;
        while i + 1 < limit {
            let unit = u16::from_le_bytes([self.buf[i], self.buf[i + 1]]);
            if unit == 0 {
                let text = decode_utf16le(&self.buf[start..i]);
                self.pos = i + 2;
                return Ok(text);
            }
            i += 2;
        }
        let text = decode_utf16le(&self.buf[start..limit]);
        self.pos = limit;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16_bytes(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    #[test]
    fn nul_terminated_string_stops_at_nul_and_consumes_it() {
        let mut buf = utf16_bytes("ab");
        buf.extend_from_slice(&0u16.to_le_bytes());
        let limit = buf.len();
        let mut cursor = ByteCursor::new(&buf);
        let s = cursor.nul_terminated_utf16_string(limit).unwrap();
        assert_eq!(s, "ab");
        assert_eq!(cursor.pos(), limit);
    }

    #[test]
    fn back_to_back_nul_terminated_strings_read_independently() {
        let mut buf = utf16_bytes("ab");
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&utf16_bytes("cde"));
        buf.extend_from_slice(&0u16.to_le_bytes());
        let limit = buf.len();
        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(cursor.nul_terminated_utf16_string(limit).unwrap(), "ab");
        assert_eq!(cursor.nul_terminated_utf16_string(limit).unwrap(), "cde");
        assert_eq!(cursor.pos(), limit);
    }

    #[test]
    fn reads_to_limit_when_no_nul_present() {
        let buf = utf16_bytes("xy");
        let limit = buf.len();
        let mut cursor = ByteCursor::new(&buf);
        let s = cursor.nul_terminated_utf16_string(limit).unwrap();
        assert_eq!(s, "xy");
        assert_eq!(cursor.pos(), limit);
    }
}
