#![allow(dead_code)]
//! Hand-built binary-XML byte buffers, used instead of `.evtx` sample
//! files since none ship with this crate (see `src/tests` for the
//! unit-level equivalent in `binxml::decoder`).
//!
//! Every name/template offset the binary-XML format uses is absolute
//! within the *whole record buffer*, header included — so [`RecordBuilder`]
//! writes the header first and every helper below appends directly to
//! that same growing buffer, rather than composing a standalone
//! fragment and splicing it in afterwards (the latter would make every
//! inline name reference off by the 24-byte header length).

use std::sync::Once;

static LOGGER_INIT: Once = Once::new();

pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}

const SIGNATURE: [u8; 4] = [0x2a, 0x2a, 0x00, 0x00];

/// Builds a full record buffer (header + binary-XML body + trailing
/// `size_copy`) by appending directly to one growing `Vec<u8>`, so that
/// every position recorded while writing the body is already the
/// absolute offset the decoder will see.
pub struct RecordBuilder {
    buf: Vec<u8>,
}

impl RecordBuilder {
    pub fn new(identifier: u64, written_time: u64) -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(&SIGNATURE);
        buf.extend_from_slice(&0u32.to_le_bytes()); // size, patched in on finish()
        buf.extend_from_slice(&identifier.to_le_bytes());
        buf.extend_from_slice(&written_time.to_le_bytes());
        RecordBuilder { buf }
    }

    /// The buffer to append binary-XML tokens to. Its current length is
    /// always the absolute position the next byte will occupy in the
    /// finished record.
    pub fn body(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }

    pub fn finish(mut self) -> Vec<u8> {
        let total_size = self.buf.len() as u32 + 4;
        self.buf[4..8].copy_from_slice(&total_size.to_le_bytes());
        self.buf.extend_from_slice(&total_size.to_le_bytes());
        self.buf
    }
}

pub fn fragment_header(buf: &mut Vec<u8>) {
    buf.extend_from_slice(&[0x0f, 0x01, 0x00, 0x00]);
}

pub fn end_of_stream(buf: &mut Vec<u8>) {
    buf.push(0x00);
}

/// An inline name reference: the 4-byte offset field (pointing at the
/// definition that immediately follows) plus the definition itself
/// (`next_name_offset:u32, hash:u16, char_count:u16, chars, nul:u16`).
pub fn push_name_inline(buf: &mut Vec<u8>, name: &str) {
    let pos = buf.len();
    let name_offset = (pos + 4) as u32;
    buf.extend_from_slice(&name_offset.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    let units: Vec<u16> = name.encode_utf16().collect();
    buf.extend_from_slice(&(units.len() as u16).to_le_bytes());
    for unit in &units {
        buf.extend_from_slice(&unit.to_le_bytes());
    }
    buf.extend_from_slice(&0u16.to_le_bytes());
}

/// `OpenStartElement`, with the `HAS_MORE` flag set when `has_attrs`.
pub fn push_open_element(buf: &mut Vec<u8>, name: &str, has_attrs: bool) {
    buf.push(if has_attrs { 0x41 } else { 0x01 });
    buf.extend_from_slice(&0u16.to_le_bytes()); // reserved
    buf.extend_from_slice(&0u32.to_le_bytes()); // data_size, unused by this decoder
    push_name_inline(buf, name);
    if has_attrs {
        buf.extend_from_slice(&0u32.to_le_bytes()); // attribute_list_data_size, unused
    }
}

pub fn push_close_start(buf: &mut Vec<u8>) {
    buf.push(0x02);
}

pub fn push_end_element(buf: &mut Vec<u8>) {
    buf.push(0x04);
}

/// A `String`-typed value token: type byte `0x01` then a `u16` char
/// count and the UTF-16LE units, matching
/// `binxml::value::decode_scalar(ValueType::String, ..)`.
pub fn push_string_value(buf: &mut Vec<u8>, text: &str) {
    buf.push(0x05);
    buf.push(0x01);
    push_utf16_text(buf, text);
}

pub fn push_attribute(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.push(0x06);
    push_name_inline(buf, name);
    push_string_value(buf, value);
}

fn push_utf16_text(buf: &mut Vec<u8>, text: &str) {
    let units: Vec<u16> = text.encode_utf16().collect();
    buf.extend_from_slice(&(units.len() as u16).to_le_bytes());
    for unit in &units {
        buf.extend_from_slice(&unit.to_le_bytes());
    }
}

/// A leaf element with a single `String`-typed text child, e.g.
/// `<EventID>4624</EventID>` with no attributes.
pub fn push_leaf(buf: &mut Vec<u8>, name: &str, text: &str) {
    push_open_element(buf, name, false);
    push_close_start(buf);
    push_string_value(buf, text);
    push_end_element(buf);
}

/// An empty element carrying only attributes, e.g.
/// `<Provider Name="X"/>`.
pub fn push_empty_with_attrs(buf: &mut Vec<u8>, name: &str, attrs: &[(&str, &str)]) {
    push_open_element(buf, name, !attrs.is_empty());
    for (attr_name, attr_value) in attrs {
        push_attribute(buf, attr_name, attr_value);
    }
    push_close_start(buf);
    push_end_element(buf);
}
