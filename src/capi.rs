//! Thin `extern "C"` wrapper over the safe core.
//!
//! Grounded on the wire-level shape §6 specifies (an opaque handle, the
//! `{1 ok, 0 not-available, -1 error}` convention) rather than on a
//! teacher file — the teacher crate's own FFI-adjacent code
//! (`evtx-wasm/src/lib.rs`) targets `wasm_bindgen`, not a raw C ABI, so
//! only the general shape (a boxed value behind a raw pointer, collapsing
//! `Result<FieldOutcome<T>, EvtxError>` to `i32` at the boundary) carries
//! over. Every function here does the minimum: validate pointers, call
//! into `record::EvtxRecord`, translate the result.

use std::slice;

use crate::record::{EvtxRecord, FieldOutcome};
use crate::DecodeConfig;

const OK: i32 = 1;
const NOT_AVAILABLE: i32 = 0;
const ERROR: i32 = -1;

/// Allocate a fresh, empty record handle. Never returns null.
#[unsafe(no_mangle)]
pub extern "C" fn evtx_record_new() -> *mut EvtxRecord {
    Box::into_raw(Box::new(EvtxRecord::new(DecodeConfig::default())))
}

/// Free a handle returned by [`evtx_record_new`] or [`evtx_record_clone`].
/// Passing null is a no-op.
///
/// # Safety
/// `record` must be a pointer this module produced, not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_free(record: *mut EvtxRecord) {
    if record.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(record) });
}

/// Clone `src` into a freshly allocated handle. A null `src` yields a null
/// result (an explicit allowed no-op per §3's clone semantics).
///
/// # Safety
/// `src`, if non-null, must be a live pointer this module produced.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_clone(src: *const EvtxRecord) -> *mut EvtxRecord {
    if src.is_null() {
        return std::ptr::null_mut();
    }
    let src = unsafe { &*src };
    Box::into_raw(Box::new(src.clone()))
}

/// # Safety
/// `record` must be live; `chunk` must point at `chunk_size` readable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_read_header(
    record: *mut EvtxRecord,
    chunk: *const u8,
    chunk_size: usize,
    offset: usize,
) -> i32 {
    let (Some(record), Some(buf)) = (as_mut(record), as_slice(chunk, chunk_size)) else {
        return ERROR;
    };
    match record.read_header(buf, offset) {
        Ok(()) => OK,
        Err(_) => ERROR,
    }
}

/// # Safety
/// `record` must be live and already headed via [`evtx_record_read_header`];
/// `chunk` must point at `chunk_size` readable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_read_xml(
    record: *mut EvtxRecord,
    chunk: *const u8,
    chunk_size: usize,
) -> i32 {
    let (Some(record), Some(buf)) = (as_mut(record), as_slice(chunk, chunk_size)) else {
        return ERROR;
    };
    match record.read_xml(buf) {
        Ok(()) => OK,
        Err(_) => ERROR,
    }
}

/// # Safety
/// `record` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_identifier(record: *const EvtxRecord, out: *mut u64) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    match record.identifier() {
        Some(v) => write_scalar(out, v),
        None => NOT_AVAILABLE,
    }
}

/// # Safety
/// `record` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_written_time(record: *const EvtxRecord, out: *mut u64) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    match record.written_time() {
        Some(v) => write_scalar(out, v),
        None => NOT_AVAILABLE,
    }
}

/// # Safety
/// `record` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_event_identifier(
    record: *const EvtxRecord,
    out: *mut u32,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    outcome_to_status(record.event_identifier(), |v| write_scalar(out, v))
}

/// # Safety
/// `record` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_event_level(record: *const EvtxRecord, out: *mut u8) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    outcome_to_status(record.event_level(), |v| write_scalar(out, v))
}

/// # Safety
/// `record` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf8_source_name_size(
    record: *const EvtxRecord,
    out_len: *mut usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    outcome_to_status(record.source_name(), |s| write_scalar(out_len, s.len() + 1))
}

/// # Safety
/// `record` must be live; `buf` must point at `buf_size` writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf8_source_name(
    record: *const EvtxRecord,
    buf: *mut u8,
    buf_size: usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    outcome_to_status(record.source_name(), |s| write_utf8(&s, buf, buf_size))
}

/// # Safety
/// `record` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf16_source_name_size(
    record: *const EvtxRecord,
    out_len: *mut usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    outcome_to_status(record.source_name(), |s| {
        write_scalar(out_len, s.encode_utf16().count() + 1)
    })
}

/// # Safety
/// `record` must be live; `buf` must point at `buf_size` writable `u16`s.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf16_source_name(
    record: *const EvtxRecord,
    buf: *mut u16,
    buf_size: usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    outcome_to_status(record.source_name(), |s| write_utf16(&s, buf, buf_size))
}

/// # Safety
/// `record` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf8_computer_name_size(
    record: *const EvtxRecord,
    out_len: *mut usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    outcome_to_status(record.computer_name(), |s| write_scalar(out_len, s.len() + 1))
}

/// # Safety
/// `record` must be live; `buf` must point at `buf_size` writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf8_computer_name(
    record: *const EvtxRecord,
    buf: *mut u8,
    buf_size: usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    outcome_to_status(record.computer_name(), |s| write_utf8(&s, buf, buf_size))
}

/// # Safety
/// `record` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf16_computer_name_size(
    record: *const EvtxRecord,
    out_len: *mut usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    outcome_to_status(record.computer_name(), |s| {
        write_scalar(out_len, s.encode_utf16().count() + 1)
    })
}

/// # Safety
/// `record` must be live; `buf` must point at `buf_size` writable `u16`s.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf16_computer_name(
    record: *const EvtxRecord,
    buf: *mut u16,
    buf_size: usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    outcome_to_status(record.computer_name(), |s| write_utf16(&s, buf, buf_size))
}

/// # Safety
/// `record` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_number_of_strings(record: *const EvtxRecord) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    match record.number_of_strings() {
        Ok(n) => n as i32,
        Err(_) => ERROR,
    }
}

/// # Safety
/// `record` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf8_string_size(
    record: *const EvtxRecord,
    index: usize,
    out_len: *mut usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    outcome_to_status(record.string(index), |s| write_scalar(out_len, s.len() + 1))
}

/// # Safety
/// `record` must be live; `buf` must point at `buf_size` writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf8_string(
    record: *const EvtxRecord,
    index: usize,
    buf: *mut u8,
    buf_size: usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    outcome_to_status(record.string(index), |s| write_utf8(&s, buf, buf_size))
}

/// # Safety
/// `record` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf16_string_size(
    record: *const EvtxRecord,
    index: usize,
    out_len: *mut usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    outcome_to_status(record.string(index), |s| {
        write_scalar(out_len, s.encode_utf16().count() + 1)
    })
}

/// # Safety
/// `record` must be live; `buf` must point at `buf_size` writable `u16`s.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf16_string(
    record: *const EvtxRecord,
    index: usize,
    buf: *mut u16,
    buf_size: usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    outcome_to_status(record.string(index), |s| write_utf16(&s, buf, buf_size))
}

/// # Safety
/// `record` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_data_size(record: *const EvtxRecord) -> usize {
    let Some(record) = as_ref(record) else {
        return 0;
    };
    match record.binary_data() {
        Ok(FieldOutcome::Present(bytes)) => bytes.len(),
        _ => 0,
    }
}

/// # Safety
/// `record` must be live; `buf` must point at `buf_size` writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_data(
    record: *const EvtxRecord,
    buf: *mut u8,
    buf_size: usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    outcome_to_status(record.binary_data(), |bytes| {
        if bytes.len() > buf_size || buf.is_null() {
            return ERROR;
        }
        let dest = unsafe { slice::from_raw_parts_mut(buf, bytes.len()) };
        dest.copy_from_slice(&bytes);
        OK
    })
}

/// # Safety
/// `record` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf8_xml_string_size(
    record: *const EvtxRecord,
    out_len: *mut usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    match record.full_xml() {
        Ok(s) => write_scalar(out_len, s.len() + 1),
        Err(_) => ERROR,
    }
}

/// # Safety
/// `record` must be live; `buf` must point at `buf_size` writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf8_xml_string(
    record: *const EvtxRecord,
    buf: *mut u8,
    buf_size: usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    match record.full_xml() {
        Ok(s) => write_utf8(&s, buf, buf_size),
        Err(_) => ERROR,
    }
}

/// # Safety
/// `record` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf16_xml_string_size(
    record: *const EvtxRecord,
    out_len: *mut usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    match record.full_xml() {
        Ok(s) => write_scalar(out_len, s.encode_utf16().count() + 1),
        Err(_) => ERROR,
    }
}

/// # Safety
/// `record` must be live; `buf` must point at `buf_size` writable `u16`s.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evtx_record_utf16_xml_string(
    record: *const EvtxRecord,
    buf: *mut u16,
    buf_size: usize,
) -> i32 {
    let Some(record) = as_ref(record) else {
        return ERROR;
    };
    match record.full_xml() {
        Ok(s) => write_utf16(&s, buf, buf_size),
        Err(_) => ERROR,
    }
}

fn outcome_to_status<T>(
    result: crate::err::Result<FieldOutcome<T>>,
    write: impl FnOnce(T) -> i32,
) -> i32 {
    match result {
        Ok(FieldOutcome::Present(v)) => write(v),
        Ok(FieldOutcome::NotAvailable) => NOT_AVAILABLE,
        Err(_) => ERROR,
    }
}

/// Converts a possibly-null pointer produced by this module into a shared
/// reference. The caller-facing `unsafe extern "C"` functions document the
/// pointer validity precondition this relies on; this helper itself just
/// centralizes the null check.
fn as_ref<'a>(ptr: *const EvtxRecord) -> Option<&'a EvtxRecord> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { &*ptr })
    }
}

fn as_mut<'a>(ptr: *mut EvtxRecord) -> Option<&'a mut EvtxRecord> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { &mut *ptr })
    }
}

fn as_slice<'a>(ptr: *const u8, len: usize) -> Option<&'a [u8]> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { slice::from_raw_parts(ptr, len) })
    }
}

fn write_scalar<T>(out: *mut T, value: T) -> i32 {
    if out.is_null() {
        return ERROR;
    }
    unsafe { *out = value };
    OK
}

fn write_utf8(text: &str, buf: *mut u8, buf_size: usize) -> i32 {
    let needed = text.len() + 1;
    if buf.is_null() || buf_size < needed {
        return ERROR;
    }
    let dest = unsafe { slice::from_raw_parts_mut(buf, needed) };
    dest[..text.len()].copy_from_slice(text.as_bytes());
    dest[text.len()] = 0;
    OK
}

fn write_utf16(text: &str, buf: *mut u16, buf_size: usize) -> i32 {
    let units: Vec<u16> = text.encode_utf16().collect();
    let needed = units.len() + 1;
    if buf.is_null() || buf_size < needed {
        return ERROR;
    }
    let dest = unsafe { slice::from_raw_parts_mut(buf, needed) };
    dest[..units.len()].copy_from_slice(&units);
    dest[units.len()] = 0;
    OK
}
