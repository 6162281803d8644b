//! Windows GUID rendering.
//!
//! Grounded on the teacher crate's `guid.rs`, adapted to the brace-wrapped
//! uppercase rendering this specification requires
//! (`{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}`) rather than the teacher's
//! bare, unbraced form.

use std::fmt::{self, Display, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guid {
    data1: u32,
    data2: u16,
    data3: u16,
    data4: [u8; 8],
}

impl Guid {
    pub(crate) fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Guid {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Parse a GUID from its 16-byte on-disk representation
    /// (`data1` LE, `data2` LE, `data3` LE, `data4` as 8 raw bytes).
    pub(crate) fn from_bytes(bytes: &[u8; 16]) -> Self {
        let data1 = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let data2 = u16::from_le_bytes(bytes[4..6].try_into().unwrap());
        let data3 = u16::from_le_bytes(bytes[6..8].try_into().unwrap());
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&bytes[8..16]);
        Guid::new(data1, data2, data3, data4)
    }
}

impl Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::with_capacity(38);
        write!(
            s,
            "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}}}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7]
        )
        .expect("writing to a String cannot fail");
        f.write_str(&s)
    }
}
