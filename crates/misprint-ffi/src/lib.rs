// FFI functions are inherently unsafe; callers must ensure pointer validity.
// Safety contracts are documented per-function in the public API comments.
#![allow(clippy::missing_safety_doc)]

// misprint-ffi: C-compatible FFI layer for MisprintDetector.
//
// Lets a host interpreter (Python via ctypes, for one) hand over module
// source, ask for keyword vocabularies and have call keywords classified,
// without re-implementing either.
//
// Memory management rules:
// - Opaque `MisprintHandle` pointer: created by `misprint_new`, freed by `misprint_free`.
// - Returned strings: caller must free with `misprint_free_str`.
// - Returned string arrays: caller must free with `misprint_free_str_array`.
// - All input strings are UTF-8 encoded, null-terminated C strings.
// - Input string arrays are NULL-terminated.

use std::ffi::{CStr, CString, c_char, c_int};
use std::ptr;
use std::sync::Arc;

use misprint_core::{CollectingSink, KeywordVocabulary, damerau_levenshtein};
use misprint_py::{CheckOptions, MisprintDetector, check_misprints};

/// A detector whose diagnostics are buffered so they can be returned to the
/// caller instead of logged.
pub struct MisprintHandle {
    detector: MisprintDetector,
    messages: Arc<CollectingSink>,
}

// ── Handle lifecycle ─────────────────────────────────────────────

/// Parse Python module source and create a detector for it.
///
/// Syntax errors do not fail: definitions that cannot be parsed fall back to
/// a text scan. Returns NULL only when `source` is NULL or not UTF-8; then,
/// if `error_out` is non-NULL, it receives a heap-allocated error string
/// that the caller must free with `misprint_free_str`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn misprint_new(
    source: *const c_char,
    error_out: *mut *mut c_char,
) -> *mut MisprintHandle {
    let Some(source) = cstr_to_str(source) else {
        set_error(error_out, "source is null or not valid UTF-8");
        return ptr::null_mut();
    };

    let messages = Arc::new(CollectingSink::new());
    let detector = MisprintDetector::from_source(source).with_sink(messages.clone());
    Box::into_raw(Box::new(MisprintHandle { detector, messages }))
}

/// Free a MisprintHandle created by `misprint_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn misprint_free(handle: *mut MisprintHandle) {
    if !handle.is_null() {
        drop(unsafe { Box::from_raw(handle) });
    }
}

// ── Vocabularies ────────────────────────────────────────────────

/// Keyword vocabulary of a function (by qualified name) or class.
///
/// Returns a sorted, NULL-terminated array of C strings. Caller must free
/// with `misprint_free_str_array`. Returns NULL if the name is unknown.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn misprint_vocabulary(
    handle: *const MisprintHandle,
    name: *const c_char,
) -> *mut *mut c_char {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return ptr::null_mut();
    };
    let Some(name) = cstr_to_str(name) else {
        return ptr::null_mut();
    };
    match handle.detector.vocabulary(name) {
        Some(vocabulary) => {
            let names: Vec<String> = vocabulary.iter().map(String::from).collect();
            strings_to_c_array(&names)
        }
        None => ptr::null_mut(),
    }
}

// ── Checking ────────────────────────────────────────────────────

/// Check the keyword names of one call to `callee`.
///
/// `names` is a NULL-terminated array of keyword names. Returns the
/// diagnostic messages, prefixed with `Calling <fn>(): ` or
/// `Creating <Type>: `, as a NULL-terminated array (empty when the call is
/// clean). Caller must free with `misprint_free_str_array`. Returns NULL if
/// the callee is unknown.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn misprint_check(
    handle: *const MisprintHandle,
    callee: *const c_char,
    names: *const *const c_char,
) -> *mut *mut c_char {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return ptr::null_mut();
    };
    let Some(callee) = cstr_to_str(callee) else {
        return ptr::null_mut();
    };
    let Some(names) = c_array_to_strs(names) else {
        return ptr::null_mut();
    };

    handle.messages.take();
    match handle.detector.check_call(callee, names) {
        Ok(_) => strings_to_c_array(&handle.messages.take()),
        Err(_) => ptr::null_mut(),
    }
}

/// Statically check every call site in the module.
///
/// Returns one line per diagnostic, `line N: callee(): message`, as a
/// NULL-terminated array. Caller must free with `misprint_free_str_array`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn misprint_check_calls(handle: *const MisprintHandle) -> *mut *mut c_char {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return ptr::null_mut();
    };
    let lines: Vec<String> = handle
        .detector
        .check_calls()
        .iter()
        .flat_map(|report| {
            report
                .to_string()
                .lines()
                .map(String::from)
                .collect::<Vec<_>>()
        })
        .collect();
    strings_to_c_array(&lines)
}

/// Classify `supplied` against an explicit `vocabulary`, no module needed.
///
/// Both inputs are NULL-terminated arrays. A negative `tolerance` selects
/// the default. Returns the unprefixed diagnostic messages as a
/// NULL-terminated array; caller must free with `misprint_free_str_array`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn misprint_classify(
    vocabulary: *const *const c_char,
    supplied: *const *const c_char,
    tolerance: c_int,
) -> *mut *mut c_char {
    let Some(vocabulary) = c_array_to_strs(vocabulary) else {
        return ptr::null_mut();
    };
    let Some(supplied) = c_array_to_strs(supplied) else {
        return ptr::null_mut();
    };
    let vocabulary: KeywordVocabulary = vocabulary.into_iter().collect();
    let mut options = CheckOptions::default();
    if let Ok(tolerance) = usize::try_from(tolerance) {
        options.tolerance = tolerance;
    }

    let sink = CollectingSink::new();
    check_misprints(&vocabulary, supplied, &options, &sink);
    strings_to_c_array(&sink.take())
}

/// Damerau–Levenshtein distance between two strings. Returns -1 on error.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn misprint_distance(a: *const c_char, b: *const c_char) -> c_int {
    let (Some(a), Some(b)) = (cstr_to_str(a), cstr_to_str(b)) else {
        return -1;
    };
    c_int::try_from(damerau_levenshtein(a, b)).unwrap_or(c_int::MAX)
}

// ── Option setters ──────────────────────────────────────────────

/// Set the misprint tolerance. Negative values are ignored.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn misprint_set_tolerance(handle: *mut MisprintHandle, value: c_int) {
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return;
    };
    if let Ok(tolerance) = usize::try_from(value) {
        let options = handle.detector.options().with_tolerance(tolerance);
        handle.detector.set_options(options);
    }
}

/// Whether checks are skipped for callables with an empty vocabulary.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn misprint_set_skip_empty_vocabulary(
    handle: *mut MisprintHandle,
    value: c_int,
) {
    if let Some(handle) = unsafe { handle.as_mut() } {
        let options = handle.detector.options().with_skip_empty_vocabulary(value != 0);
        handle.detector.set_options(options);
    }
}

// ── Utility functions ───────────────────────────────────────────

/// Return the library version string.
///
/// The returned pointer is valid for the lifetime of the library (static).
/// Do NOT free this pointer.
#[unsafe(no_mangle)]
pub extern "C" fn misprint_version() -> *const c_char {
    static VERSION: std::sync::LazyLock<CString> =
        std::sync::LazyLock::new(|| CString::new(env!("CARGO_PKG_VERSION")).unwrap_or_default());
    VERSION.as_ptr()
}

/// Free a heap-allocated C string returned by misprint functions.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn misprint_free_str(s: *mut c_char) {
    free_c_str(s);
}

/// Free a NULL-terminated array of C strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn misprint_free_str_array(arr: *mut *mut c_char) {
    free_null_terminated_array(arr);
}

// ── Internal helpers ────────────────────────────────────────────

fn cstr_to_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

/// Read a NULL-terminated array of C strings. Fails if any entry is not UTF-8.
fn c_array_to_strs<'a>(arr: *const *const c_char) -> Option<Vec<&'a str>> {
    if arr.is_null() {
        return None;
    }
    let mut out = Vec::new();
    let mut i = 0;
    loop {
        let p = unsafe { *arr.add(i) };
        if p.is_null() {
            break;
        }
        out.push(cstr_to_str(p)?);
        i += 1;
    }
    Some(out)
}

fn str_to_c(s: &str) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

fn set_error(out: *mut *mut c_char, msg: &str) {
    if !out.is_null() {
        unsafe {
            *out = str_to_c(msg);
        }
    }
}

fn free_c_str(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

fn strings_to_c_array(strings: &[String]) -> *mut *mut c_char {
    let mut ptrs: Vec<*mut c_char> = strings.iter().map(|s| str_to_c(s)).collect();
    ptrs.push(ptr::null_mut()); // NULL terminator
    Box::into_raw(ptrs.into_boxed_slice()).cast()
}

fn free_null_terminated_array(arr: *mut *mut c_char) {
    if arr.is_null() {
        return;
    }
    let mut i = 0;
    loop {
        let p = unsafe { *arr.add(i) };
        if p.is_null() {
            break;
        }
        free_c_str(p);
        i += 1;
    }
    // Allocated as a boxed slice of exactly i + 1 entries.
    drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(arr, i + 1)) });
}
