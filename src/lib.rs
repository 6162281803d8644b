//! A safe, read-only decoder for Windows EVTX event records.
//!
//! Turns a raw chunk buffer and a record offset into a materialised XML
//! tree and a set of lazily-resolved, memoised accessors (event id,
//! level, provider, computer, numbered strings, binary payload), per the
//! three-stage pipeline this crate is built around: [`utils::byte_cursor`]
//! → [`binxml`] → [`record`].

mod binxml;
mod capi;
mod err;
mod model;
mod record;
mod utils;

pub use err::{DecodeErrorKind, EvtxError};
pub use record::{EvtxRecord, FieldOutcome};

/// Caller-supplied decode configuration, threaded through header parsing
/// and binary-XML decoding in place of the source's process-wide mutable
/// state (§4.5 / §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Windows code page used to decode `AnsiString` typed values.
    pub code_page: u16,
    /// When `true`, a `size_copy != size` mismatch at header-parse time is
    /// a hard error instead of a logged warning.
    pub strict_size_copy: bool,
    /// Bounds recursive BinXml-in-BinXml and template-in-template
    /// expansion.
    pub max_nesting_depth: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        DecodeConfig {
            code_page: utils::ansi::DEFAULT_CODE_PAGE,
            strict_size_copy: false,
            max_nesting_depth: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = DecodeConfig::default();
        assert_eq!(config.code_page, 1252);
        assert!(!config.strict_size_copy);
        assert_eq!(config.max_nesting_depth, 256);
    }
}
