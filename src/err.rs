//! The error taxonomy used throughout the crate.
//!
//! Grounded on the teacher crate's `err.rs`: a single flat `thiserror`-derived
//! enum rather than a tree of nested kinds, because callers overwhelmingly
//! match on "what do I log" and "what do I tell the caller" rather than on
//! a structural hierarchy.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvtxError>;

/// Why a decode, a header parse, or an accessor failed.
///
/// Unlike the teacher's `EvtxError`, no variant here wraps an opaque
/// `std::io::Error` or other non-`Clone` source: the core never performs
/// I/O, so every variant is plain data and the whole enum derives `Clone`.
/// That lets [`crate::record::EvtxRecord`] memoise a field's `Result` and
/// replay it byte-for-byte on every subsequent call (idempotence).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvtxError {
    #[error("invalid argument: {message}")]
    ArgumentError { message: &'static str },

    #[error("offset {offset}: out of bounds, need {need} bytes, have {have}")]
    OutOfBounds {
        offset: u64,
        need: usize,
        have: usize,
    },

    #[error("invalid EVTX record header signature, expected `2a2a0000`, found `{found:02x?}`")]
    UnsupportedSignature { found: [u8; 4] },

    #[error("record size {size} is out of bounds for a {header_len}-byte header (offset {offset}, chunk len {chunk_len})")]
    SizeOutOfBounds {
        offset: u64,
        size: u32,
        header_len: u32,
        chunk_len: usize,
    },

    #[error("record size_copy ({size_copy}) does not match size ({size}) at offset {offset}")]
    SizeCopyMismatch {
        offset: u64,
        size: u32,
        size_copy: u32,
    },

    #[error("offset {offset}: unsupported binxml value type byte 0x{value:02x}")]
    UnsupportedValue { value: u8, offset: u64 },

    #[error("binxml decode error at offset {offset}: {kind}")]
    DecodeError { kind: DecodeErrorKind, offset: u64 },

    #[error("value of type {type_name} cannot be represented in the requested width")]
    Overflow { type_name: &'static str },

    #[error("internal invariant violated: {message}")]
    InternalError { message: &'static str },
}

/// Sub-kinds of [`EvtxError::DecodeError`], one per failure mode called out
/// in the binary-XML decoder's error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    #[error("token stream truncated")]
    TruncatedStream,
    #[error("unknown opcode 0x{0:02x}")]
    UnknownOpcode(u8),
    #[error("bad name reference")]
    BadNameRef,
    #[error("bad value type byte 0x{0:02x}")]
    BadValueType(u8),
    #[error("substitution index {0} has no matching descriptor")]
    BadSubstitutionIndex(u16),
    #[error("template expansion cycle detected")]
    TemplateCycle,
    #[error("nesting too deep (max {0})")]
    NestingTooDeep(usize),
    #[error("EventData contains a non-contiguous `Data` child")]
    NonContiguousData,
}

impl EvtxError {
    pub(crate) fn decode(kind: DecodeErrorKind, offset: u64) -> Self {
        EvtxError::DecodeError { kind, offset }
    }

    pub(crate) fn truncated(offset: u64, need: usize, have: usize) -> Self {
        EvtxError::OutOfBounds {
            offset,
            need,
            have,
        }
    }
}
