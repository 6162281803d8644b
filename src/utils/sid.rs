//! Windows security identifier (SID) rendering.
//!
//! Grounded on the teacher crate's `ntsid.rs` shape (parse from a byte
//! cursor, render via `Display`), but computing the identifier authority
//! as the 48-bit big-endian value the binary format actually encodes
//! (the teacher's historical implementation XORs the high/low halves,
//! which does not match `S-1-5-...`-style well-known SIDs).

use std::fmt::{self, Display, Write};

use crate::utils::byte_cursor::ByteCursor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sid {
    version: u8,
    authority: u64,
    sub_authorities: Vec<u32>,
}

impl Sid {
    /// Parse a SID from the cursor: `version:u8`, `sub_authority_count:u8`,
    /// `authority:u48 BE`, then `sub_authority_count` little-endian `u32`s.
    pub(crate) fn from_cursor(cursor: &mut ByteCursor<'_>) -> crate::err::Result<Self> {
        let version = cursor.u8()?;
        let sub_authority_count = cursor.u8()? as usize;
        let authority_bytes = cursor.array::<6>()?;

        let mut authority = 0u64;
        for b in authority_bytes {
            authority = (authority << 8) | u64::from(b);
        }

        let mut sub_authorities = Vec::with_capacity(sub_authority_count);
        for _ in 0..sub_authority_count {
            sub_authorities.push(cursor.u32()?);
        }

        Ok(Sid {
            version,
            authority,
            sub_authorities,
        })
    }
}

impl Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::new();
        write!(s, "S-{}-{}", self.version, self.authority).expect("String write cannot fail");
        for sub in &self.sub_authorities {
            write!(s, "-{}", sub).expect("String write cannot fail");
        }
        f.write_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_well_known_local_system_sid() {
        // S-1-5-18 (LocalSystem): version 1, authority 5, one sub-authority 18.
        let mut bytes = vec![1u8, 1, 0, 0, 0, 0, 0, 5];
        bytes.extend_from_slice(&18u32.to_le_bytes());
        let mut cursor = ByteCursor::new(&bytes);
        let sid = Sid::from_cursor(&mut cursor).unwrap();
        assert_eq!(sid.to_string(), "S-1-5-18");
    }
}
