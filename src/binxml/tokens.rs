//! Token-level data definitions for the binary-XML stream.
//!
//! Grounded on the teacher crate's `model/deserialized.rs`
//! (`BinXMLDeserializedTokens` and friends), trimmed to what this crate
//! needs: the decoder in `binxml::decoder` reads these directly off a
//! [`crate::utils::byte_cursor::ByteCursor`] rather than building an
//! intermediate owned token vector, but the wire shapes are identical.
//!
//! Only `TemplateValueDescriptor` is kept here: the fragment header and
//! inline substitution reference are each read as plain scalars directly
//! in `binxml::decoder`, with nothing else in the crate needing the
//! intermediate struct a teacher-style token vector would.

use crate::binxml::value::ValueType;

/// `size:u16, type:u8, padding:u8` preceding each substitution value in a
/// template instance's value array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TemplateValueDescriptor {
    pub(crate) size: u16,
    pub(crate) value_type: ValueType,
}
