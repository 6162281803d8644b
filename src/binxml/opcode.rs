//! Binary-XML token opcodes.
//!
//! Grounded on the teacher crate's token dispatch in
//! `binxml/deserializer.rs` (matched there as a raw `u8`): the low nibble
//! names the token, bit `0x40` marks "more data follows" on element-opening
//! tokens (`OpenStartElement` gaining an attribute list, `TemplateInstance`
//! chaining), per §3.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct TokenFlags: u8 {
        const HAS_MORE = 0x40;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Opcode {
    EndOfStream,
    OpenStartElement,
    CloseStartElement,
    CloseEmptyElement,
    EndElement,
    Value,
    Attribute,
    CDataSection,
    CharRef,
    EntityRef,
    PITarget,
    PIData,
    TemplateInstance,
    NormalSubstitution,
    OptionalSubstitution,
    FragmentHeader,
}

impl Opcode {
    /// Split a raw token byte into its opcode and flag bits.
    pub(crate) fn decode(byte: u8) -> Option<(Opcode, TokenFlags)> {
        let flags = TokenFlags::from_bits_truncate(byte & 0xc0);
        let opcode = match byte & 0x3f {
            0x00 => Opcode::EndOfStream,
            0x01 => Opcode::OpenStartElement,
            0x02 => Opcode::CloseStartElement,
            0x03 => Opcode::CloseEmptyElement,
            0x04 => Opcode::EndElement,
            0x05 => Opcode::Value,
            0x06 => Opcode::Attribute,
            0x07 => Opcode::CDataSection,
            0x08 => Opcode::CharRef,
            0x09 => Opcode::EntityRef,
            0x0a => Opcode::PITarget,
            0x0b => Opcode::PIData,
            0x0c => Opcode::TemplateInstance,
            0x0d => Opcode::NormalSubstitution,
            0x0e => Opcode::OptionalSubstitution,
            0x0f => Opcode::FragmentHeader,
            _ => return None,
        };
        Some((opcode, flags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_start_with_attributes_sets_has_more() {
        let (opcode, flags) = Opcode::decode(0x41).unwrap();
        assert_eq!(opcode, Opcode::OpenStartElement);
        assert!(flags.contains(TokenFlags::HAS_MORE));
    }

    #[test]
    fn plain_end_of_stream_has_no_flags() {
        let (opcode, flags) = Opcode::decode(0x00).unwrap();
        assert_eq!(opcode, Opcode::EndOfStream);
        assert!(flags.is_empty());
    }

    #[test]
    fn unknown_opcode_is_none() {
        assert!(Opcode::decode(0x3a).is_none());
    }
}
