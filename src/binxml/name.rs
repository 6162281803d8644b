//! Binary-XML name references.
//!
//! Grounded on the teacher crate's `binxml/name.rs` (`BinXmlName::from_binxml_stream`):
//! a name reference is a 4-byte offset into the chunk. If that offset equals
//! the cursor's current position the name definition is inline and decoding
//! continues in place; otherwise the cursor seeks to the offset, decodes the
//! definition there, and restores its original position. Names carry a
//! 16-bit hash "used to accelerate equality" per §4.2, but decoded names are
//! plain `String`s here and compared byte-exact, so the hash is read and
//! discarded rather than used as a shortcut — correctness over micro-
//! optimisation for a crate this size.

use hashbrown::HashMap;

use crate::err::{DecodeErrorKind, EvtxError};
use crate::utils::byte_cursor::ByteCursor;

pub(crate) type Offset = u32;

/// Per-chunk cache of already-decoded names, keyed by their chunk offset.
///
/// Grounded on the teacher's `Context::cached_string_at_offset`. Kept as a
/// plain `HashMap` (ahash via hashbrown's default hasher, matching the
/// teacher's `ahash`-backed `hashbrown` dependency) rather than the
/// teacher's arena-backed string cache, since this crate's tree owns
/// `String`s outright.
#[derive(Debug, Default)]
pub(crate) struct NameCache {
    by_offset: HashMap<Offset, String>,
}

impl NameCache {
    pub(crate) fn new() -> Self {
        NameCache {
            by_offset: HashMap::new(),
        }
    }

    fn get(&self, offset: Offset) -> Option<&str> {
        self.by_offset.get(&offset).map(String::as_str)
    }

    fn insert(&mut self, offset: Offset, name: String) {
        self.by_offset.insert(offset, name);
    }
}

/// Read a name reference at the cursor's current position: a 4-byte chunk
/// offset, followed inline by the name definition if the offset points at
/// the current position, or a seek-decode-restore round trip otherwise.
pub(crate) fn read_name_ref(
    cursor: &mut ByteCursor<'_>,
    cache: &mut NameCache,
) -> crate::err::Result<String> {
    let name_offset = cursor.u32()?;

    if let Some(cached) = cache.get(name_offset) {
        let cached = cached.to_owned();
        if name_offset as usize == cursor.pos() {
            let (_, consumed) = read_name_definition(cursor)?;
            let _ = consumed;
        }
        return Ok(cached);
    }

    if name_offset as usize == cursor.pos() {
        let (name, _) = read_name_definition(cursor)?;
        cache.insert(name_offset, name.clone());
        return Ok(name);
    }

    let full = cursor.buf();
    if name_offset as usize > full.len() {
        return Err(EvtxError::decode(
            DecodeErrorKind::BadNameRef,
            cursor.pos() as u64,
        ));
    }

    let return_to = cursor.pos();
    let mut at_offset = ByteCursor::with_pos(full, name_offset as usize)?;
    let (name, _) = read_name_definition(&mut at_offset)?;
    cache.insert(name_offset, name.clone());
    cursor.set_pos(return_to)?;

    Ok(name)
}

/// Read a name *definition* at the cursor's current position:
/// `unused:u32, hash:u16, char_count:u16, chars[char_count], nul:u16`.
/// Returns the decoded name and the number of bytes consumed.
fn read_name_definition(cursor: &mut ByteCursor<'_>) -> crate::err::Result<(String, usize)> {
    let start = cursor.pos();
    let _next_name_offset = cursor.u32()?;
    let _hash = cursor.u16()?;
    let name = cursor.len_prefixed_utf16_string(true)?;
    Ok((name, cursor.pos() - start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_name_definition(name: &str) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // hash, unused by this implementation
        out.extend_from_slice(&(name.encode_utf16().count() as u16).to_le_bytes());
        for unit in name.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out.extend_from_slice(&0u16.to_le_bytes()); // trailing NUL
        out
    }

    #[test]
    fn reads_inline_name() {
        let def = encode_name_definition("System");
        let mut buf = vec![0u8; 4];
        buf[0..4].copy_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(&def);

        let mut cursor = ByteCursor::with_pos(&buf, 0).unwrap();
        let mut cache = NameCache::new();
        let name = read_name_ref(&mut cursor, &mut cache).unwrap();
        assert_eq!(name, "System");
    }

    #[test]
    fn reads_back_referenced_name() {
        let def = encode_name_definition("EventID");
        // Layout: [ref @0..4 -> 10][padding to 10][definition @10..][ref @N -> 10]
        let mut buf = vec![0u8; 4];
        buf[0..4].copy_from_slice(&10u32.to_le_bytes());
        buf.resize(10, 0);
        buf.extend_from_slice(&def);
        let second_ref_pos = buf.len();
        buf.extend_from_slice(&10u32.to_le_bytes());

        let mut cache = NameCache::new();
        let mut first = ByteCursor::with_pos(&buf, 0).unwrap();
        let name1 = read_name_ref(&mut first, &mut cache).unwrap();
        assert_eq!(name1, "EventID");

        let mut second = ByteCursor::with_pos(&buf, second_ref_pos).unwrap();
        let name2 = read_name_ref(&mut second, &mut cache).unwrap();
        assert_eq!(name2, "EventID");
        // The cache hit must not have moved the second cursor past the 4-byte ref.
        assert_eq!(second.pos(), second_ref_pos + 4);
    }
}
