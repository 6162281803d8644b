pub(crate) mod header;
pub(crate) mod values;

pub use values::{EvtxRecord, FieldOutcome};
