//! Per-chunk template definition cache.
//!
//! Grounded on the teacher crate's `template_cache.rs`
//! (`TemplateCache<'a>(HashMap<Offset, BinXMLTemplateDefinition<'a>>)`), but
//! caching the template body's byte span rather than a parsed token vector:
//! this crate's decoder walks the token stream directly off the chunk
//! buffer (see `binxml::decoder`), so re-entering the same span on a cache
//! hit is just as cheap as replaying a cached token vector would be, without
//! needing a second, parallel token representation to keep in sync with the
//! live decoder.

use hashbrown::HashMap;

use crate::binxml::name::Offset;
use crate::utils::guid::Guid;

#[derive(Debug, Clone, Copy)]
pub(crate) struct TemplateDefinition {
    pub(crate) guid: Guid,
    /// Offset of the first token of the template body (just past the
    /// `next_template_offset`/GUID/`data_size` header).
    pub(crate) body_offset: usize,
    pub(crate) body_len: usize,
}

#[derive(Debug, Default)]
pub(crate) struct TemplateCache {
    by_offset: HashMap<Offset, TemplateDefinition>,
}

impl TemplateCache {
    pub(crate) fn new() -> Self {
        TemplateCache {
            by_offset: HashMap::new(),
        }
    }

    pub(crate) fn get(&self, offset: Offset) -> Option<TemplateDefinition> {
        self.by_offset.get(&offset).copied()
    }

    pub(crate) fn insert(&mut self, offset: Offset, definition: TemplateDefinition) {
        self.by_offset.insert(offset, definition);
    }
}
