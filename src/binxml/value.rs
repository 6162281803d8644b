//! Typed binary-XML values.
//!
//! Grounded on the teacher crate's `binxml/value_variant.rs`
//! (`BinXMLValueType`/`BinXMLValue`): a type-byte-tagged enum, decoded from
//! a self-delimiting wire representation (length-prefixed strings, fixed-
//! width scalars) and rendered to text by a second, independent pass (§4.3)
//! rather than during decode, so the same `Value` can be rendered as UTF-8
//! or UTF-16 without re-parsing.

use std::fmt::Write as _;

use crate::err::EvtxError;
use crate::model::tree::Tree;
use crate::utils::ansi::decode_ansi_string;
use crate::utils::byte_cursor::ByteCursor;
use crate::utils::guid::Guid;
use crate::utils::sid::Sid;
use crate::utils::time::filetime_to_iso8601;

/// The low 7 bits of a value's type byte; bit 0x80 marks an array of this
/// base type (§3).
pub(crate) const ARRAY_FLAG: u8 = 0x80;

#[derive(Debug, Clone)]
pub(crate) enum Value {
    Null,
    String(String),
    AnsiString(String),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Real32(f32),
    Real64(f64),
    Bool(bool),
    Binary(Vec<u8>),
    Guid(Guid),
    Size(u64),
    FileTime(u64),
    SysTime(SysTime),
    Sid(Sid),
    HexInt32(i32),
    HexInt64(i64),
    EvtHandle(u64),
    BinXml(Tree),
    EvtXml(Tree),
    Array(Vec<Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SysTime {
    pub year: u16,
    pub month: u16,
    pub day_of_week: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub milliseconds: u16,
}

/// Base (array-bit-stripped) value type byte, per §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueType {
    Null,
    String,
    AnsiString,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Real32,
    Real64,
    Bool,
    Binary,
    Guid,
    Size,
    FileTime,
    SysTime,
    Sid,
    HexInt32,
    HexInt64,
    EvtHandle,
    BinXml,
    EvtXml,
}

impl ValueType {
    pub(crate) fn from_byte(byte: u8) -> Option<ValueType> {
        match byte {
            0x00 => Some(ValueType::Null),
            0x01 => Some(ValueType::String),
            0x02 => Some(ValueType::AnsiString),
            0x03 => Some(ValueType::Int8),
            0x04 => Some(ValueType::UInt8),
            0x05 => Some(ValueType::Int16),
            0x06 => Some(ValueType::UInt16),
            0x07 => Some(ValueType::Int32),
            0x08 => Some(ValueType::UInt32),
            0x09 => Some(ValueType::Int64),
            0x0a => Some(ValueType::UInt64),
            0x0b => Some(ValueType::Real32),
            0x0c => Some(ValueType::Real64),
            0x0d => Some(ValueType::Bool),
            0x0e => Some(ValueType::Binary),
            0x0f => Some(ValueType::Guid),
            0x10 => Some(ValueType::Size),
            0x11 => Some(ValueType::FileTime),
            0x12 => Some(ValueType::SysTime),
            0x13 => Some(ValueType::Sid),
            0x14 => Some(ValueType::HexInt32),
            0x15 => Some(ValueType::HexInt64),
            0x20 => Some(ValueType::EvtHandle),
            0x21 => Some(ValueType::BinXml),
            0x23 => Some(ValueType::EvtXml),
            _ => None,
        }
    }
}

/// Decode one scalar (non-array, non-BinXml/EvtXml) value of `value_type`
/// from the cursor. `BinXml`/`EvtXml` are handled by the decoder, which
/// alone can recurse back into the token stream; reaching either of those
/// types here is an internal error.
pub(crate) fn decode_scalar(
    value_type: ValueType,
    cursor: &mut ByteCursor<'_>,
    code_page: u16,
) -> crate::err::Result<Value> {
    match value_type {
        ValueType::Null => Ok(Value::Null),
        ValueType::String => Ok(Value::String(cursor.len_prefixed_utf16_string(false)?)),
        ValueType::AnsiString => {
            let len = cursor.u16()? as usize;
            let bytes = cursor.take_bytes(len)?;
            Ok(Value::AnsiString(decode_ansi_string(bytes, code_page)))
        }
        ValueType::Int8 => Ok(Value::Int8(cursor.i8()?)),
        ValueType::UInt8 => Ok(Value::UInt8(cursor.u8()?)),
        ValueType::Int16 => Ok(Value::Int16(cursor.i16()?)),
        ValueType::UInt16 => Ok(Value::UInt16(cursor.u16()?)),
        ValueType::Int32 => Ok(Value::Int32(cursor.i32()?)),
        ValueType::UInt32 => Ok(Value::UInt32(cursor.u32()?)),
        ValueType::Int64 => Ok(Value::Int64(cursor.i64()?)),
        ValueType::UInt64 => Ok(Value::UInt64(cursor.u64()?)),
        ValueType::Real32 => Ok(Value::Real32(cursor.f32()?)),
        ValueType::Real64 => Ok(Value::Real64(cursor.f64()?)),
        ValueType::Bool => {
            let raw = cursor.u32()?;
            Ok(Value::Bool(raw != 0))
        }
        ValueType::Binary => {
            let len = cursor.u32()? as usize;
            Ok(Value::Binary(cursor.take_bytes(len)?.to_vec()))
        }
        ValueType::Guid => Ok(Value::Guid(Guid::from_bytes(&cursor.array::<16>()?))),
        ValueType::Size => {
            // Pointer-sized; this crate targets 64-bit EVTX producers.
            Ok(Value::Size(cursor.u64()?))
        }
        ValueType::FileTime => Ok(Value::FileTime(cursor.u64()?)),
        ValueType::SysTime => {
            let year = cursor.u16()?;
            let month = cursor.u16()?;
            let day_of_week = cursor.u16()?;
            let day = cursor.u16()?;
            let hour = cursor.u16()?;
            let minute = cursor.u16()?;
            let second = cursor.u16()?;
            let milliseconds = cursor.u16()?;
            Ok(Value::SysTime(SysTime {
                year,
                month,
                day_of_week,
                day,
                hour,
                minute,
                second,
                milliseconds,
            }))
        }
        ValueType::Sid => Ok(Value::Sid(Sid::from_cursor(cursor)?)),
        ValueType::HexInt32 => Ok(Value::HexInt32(cursor.i32()?)),
        ValueType::HexInt64 => Ok(Value::HexInt64(cursor.i64()?)),
        ValueType::EvtHandle => Ok(Value::EvtHandle(cursor.u64()?)),
        ValueType::BinXml | ValueType::EvtXml => Err(EvtxError::InternalError {
            message: "BinXml/EvtXml values must be decoded by the binxml decoder, not decode_scalar",
        }),
    }
}

impl Value {
    /// Render this value's text form, per §4.3. Arrays join their elements
    /// with a single space; `BinXml`/`EvtXml` render their nested tree's
    /// root element.
    pub(crate) fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) | Value::AnsiString(s) => s.clone(),
            Value::Int8(n) => n.to_string(),
            Value::UInt8(n) => n.to_string(),
            Value::Int16(n) => n.to_string(),
            Value::UInt16(n) => n.to_string(),
            Value::Int32(n) => n.to_string(),
            Value::UInt32(n) => n.to_string(),
            Value::Int64(n) => n.to_string(),
            Value::UInt64(n) => n.to_string(),
            Value::Real32(n) => n.to_string(),
            Value::Real64(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Binary(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2);
                for b in bytes {
                    write!(out, "{:02X}", b).expect("String write cannot fail");
                }
                out
            }
            Value::Guid(guid) => guid.to_string(),
            Value::Size(n) => n.to_string(),
            Value::FileTime(ft) => filetime_to_iso8601(*ft),
            Value::SysTime(st) => format!(
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
                st.year, st.month, st.day, st.hour, st.minute, st.second, st.milliseconds
            ),
            Value::Sid(sid) => sid.to_string(),
            Value::HexInt32(n) => format!("0x{:08X}", *n as u32),
            Value::HexInt64(n) => format!("0x{:016X}", *n as u64),
            Value::EvtHandle(n) => n.to_string(),
            Value::BinXml(tree) | Value::EvtXml(tree) => tree.to_utf8_string(),
            Value::Array(items) => items
                .iter()
                .map(Value::render)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Coerce this value to an unsigned integer of width `W` bits,
    /// returning [`EvtxError::Overflow`] if the value does not fit, per
    /// §4.3's `OverflowOrTruncation` rule.
    pub(crate) fn as_u64(&self) -> crate::err::Result<u64> {
        let raw: i128 = match self {
            Value::Int8(n) => *n as i128,
            Value::UInt8(n) => *n as i128,
            Value::Int16(n) => *n as i128,
            Value::UInt16(n) => *n as i128,
            Value::Int32(n) => *n as i128,
            Value::UInt32(n) => *n as i128,
            Value::Int64(n) => *n as i128,
            Value::UInt64(n) => *n as i128,
            Value::HexInt32(n) => *n as i128,
            Value::HexInt64(n) => *n as i128,
            Value::Size(n) => *n as i128,
            Value::EvtHandle(n) => *n as i128,
            Value::Bool(b) => *b as i128,
            Value::String(s) | Value::AnsiString(s) => s
                .trim()
                .parse::<i128>()
                .map_err(|_| EvtxError::Overflow { type_name: "u64" })?,
            _ => {
                return Err(EvtxError::Overflow {
                    type_name: "u64",
                })
            }
        };

        if raw < 0 || raw > i128::from(u64::MAX) {
            return Err(EvtxError::Overflow { type_name: "u64" });
        }
        Ok(raw as u64)
    }

    pub(crate) fn as_u32(&self) -> crate::err::Result<u32> {
        let v = self.as_u64()?;
        u32::try_from(v).map_err(|_| EvtxError::Overflow { type_name: "u32" })
    }

    pub(crate) fn as_u16(&self) -> crate::err::Result<u16> {
        let v = self.as_u64()?;
        u16::try_from(v).map_err(|_| EvtxError::Overflow { type_name: "u16" })
    }

    pub(crate) fn as_u8(&self) -> crate::err::Result<u8> {
        let v = self.as_u64()?;
        u8::try_from(v).map_err(|_| EvtxError::Overflow { type_name: "u8" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_hex_int32_zero_padded_uppercase() {
        assert_eq!(Value::HexInt32(0x2a).render(), "0x0000002A");
    }

    #[test]
    fn renders_binary_as_uppercase_hex_no_separators() {
        assert_eq!(Value::Binary(vec![0xde, 0xad, 0xbe, 0xef]).render(), "DEADBEEF");
    }

    #[test]
    fn renders_array_space_joined() {
        let v = Value::Array(vec![Value::UInt32(1), Value::UInt32(2), Value::UInt32(3)]);
        assert_eq!(v.render(), "1 2 3");
    }

    #[test]
    fn coerces_string_digits_to_u32() {
        assert_eq!(Value::String("4624".to_string()).as_u32().unwrap(), 4624);
    }

    #[test]
    fn overflow_is_reported_on_truncation() {
        let v = Value::UInt32(0x1_0000);
        assert!(v.as_u8().is_err());
    }
}
