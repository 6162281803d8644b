pub(crate) mod ansi;
pub(crate) mod byte_cursor;
pub(crate) mod escape;
pub(crate) mod guid;
pub(crate) mod sid;
pub(crate) mod time;
pub(crate) mod utf16;
