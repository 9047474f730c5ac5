//! FFI bindings for Precept Motion
//!
//! This module provides C-compatible functions for embedding the motion engine
//! in a host app that owns the sensor callbacks and permission prompt. All
//! functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `precept_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde::Serialize;

use crate::config::TrackerConfig;
use crate::motion::analyzer::MotionAnalyzer;
use crate::motion::stream::MotionStream;
use crate::motion::types::{MotionAnalysis, MotionEvent, MotionSample};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn json_to_cstr<T: Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze a JSON array of motion samples and return the unrounded metrics.
///
/// # Safety
/// - `window_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `precept_free_string`.
/// - Returns NULL on error; call `precept_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn precept_analyze_window(window_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(window_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match serde_json::from_str::<Vec<MotionSample>>(&json_str) {
        Ok(window) => json_to_cstr(&MotionAnalyzer::analyze(&window)),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Stream API
// ============================================================================

/// Opaque handle to a MotionStream
pub struct MotionStreamHandle {
    stream: MotionStream,
}

#[derive(Serialize)]
struct IngestResult<'a> {
    accepted: bool,
    analysis: &'a MotionAnalysis,
}

/// Create a new motion stream.
///
/// A negative `sample_interval_ms` or non-positive `analysis_window_ms`
/// selects the default (50 ms / 2000 ms).
///
/// # Safety
/// - Returns a pointer to a newly allocated stream.
/// - Must be freed with `precept_stream_free`.
#[no_mangle]
pub unsafe extern "C" fn precept_stream_new(
    sample_interval_ms: i64,
    analysis_window_ms: i64,
) -> *mut MotionStreamHandle {
    clear_last_error();

    let config = TrackerConfig {
        sample_interval_ms,
        analysis_window_ms,
    }
    .sanitized();

    let handle = Box::new(MotionStreamHandle {
        stream: MotionStream::with_config(config),
    });
    Box::into_raw(handle)
}

/// Free a motion stream.
///
/// # Safety
/// - `stream` must be a valid pointer returned by `precept_stream_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn precept_stream_free(stream: *mut MotionStreamHandle) {
    if !stream.is_null() {
        drop(Box::from_raw(stream));
    }
}

/// Feed one motion event captured at `now_ms`.
///
/// Returns `{"accepted": bool, "analysis": {...}}`; when the event was
/// throttled, `analysis` is the previously published one.
///
/// # Safety
/// - `stream` must be a valid pointer returned by `precept_stream_new`.
/// - `event_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `precept_free_string`.
/// - Returns NULL on error; call `precept_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn precept_stream_ingest(
    stream: *mut MotionStreamHandle,
    event_json: *const c_char,
    now_ms: i64,
) -> *mut c_char {
    clear_last_error();

    if stream.is_null() {
        set_last_error("Null stream pointer");
        return ptr::null_mut();
    }
    let handle = &mut *stream;

    let json_str = match cstr_to_string(event_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let event: MotionEvent = match serde_json::from_str(&json_str) {
        Ok(event) => event,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let accepted = handle.stream.ingest(&event, now_ms).is_some();
    let analysis = handle.stream.analysis();
    json_to_cstr(&IngestResult {
        accepted,
        analysis: &analysis,
    })
}

/// Current published analysis of a stream.
///
/// # Safety
/// - `stream` must be a valid pointer returned by `precept_stream_new`.
/// - Returns a newly allocated string that must be freed with `precept_free_string`.
/// - Returns NULL on error; call `precept_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn precept_stream_analysis(stream: *const MotionStreamHandle) -> *mut c_char {
    clear_last_error();

    if stream.is_null() {
        set_last_error("Null stream pointer");
        return ptr::null_mut();
    }
    let handle = &*stream;
    json_to_cstr(&handle.stream.analysis())
}

/// Clear a stream's window and publish the zero state.
///
/// # Safety
/// - `stream` must be a valid pointer returned by `precept_stream_new`.
/// - Returns 0 on success, -1 on a null pointer.
#[no_mangle]
pub unsafe extern "C" fn precept_stream_reset(stream: *mut MotionStreamHandle) -> i32 {
    clear_last_error();

    if stream.is_null() {
        set_last_error("Null stream pointer");
        return -1;
    }
    let handle = &mut *stream;
    handle.stream.reset();
    0
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Precept functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Precept function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn precept_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Precept function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn precept_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn precept_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn gravity_event() -> CString {
        CString::new(r#"{"acceleration_including_gravity": {"x": 0.0, "y": 0.0, "z": 9.8}}"#)
            .unwrap()
    }

    unsafe fn take_json(ptr: *mut c_char) -> serde_json::Value {
        assert!(!ptr.is_null());
        let value = serde_json::from_str(CStr::from_ptr(ptr).to_str().unwrap()).unwrap();
        precept_free_string(ptr);
        value
    }

    #[test]
    fn test_ffi_analyze_window() {
        let samples: Vec<serde_json::Value> = (0..12)
            .map(|i| {
                serde_json::json!({
                    "acceleration": {"x": 3.0, "y": 4.0, "z": 0.0},
                    "rotation_rate": {"alpha": 0.0, "beta": 0.0, "gamma": 0.0},
                    "timestamp": i * 50
                })
            })
            .collect();
        let json = CString::new(serde_json::to_string(&samples).unwrap()).unwrap();

        unsafe {
            let metrics = take_json(precept_analyze_window(json.as_ptr()));
            assert_eq!(metrics["fluidity_score"], 100.0);
            assert_eq!(metrics["direction_changes"], 0);
            assert_eq!(metrics["is_active"], true);
        }
    }

    #[test]
    fn test_ffi_stream_lifecycle() {
        unsafe {
            let stream = precept_stream_new(-1, 0);
            assert!(!stream.is_null());

            let event = gravity_event();
            let first = take_json(precept_stream_ingest(stream, event.as_ptr(), 0));
            assert_eq!(first["accepted"], true);

            let throttled = take_json(precept_stream_ingest(stream, event.as_ptr(), 10));
            assert_eq!(throttled["accepted"], false);
            assert_eq!(throttled["analysis"]["raw_data"].as_array().unwrap().len(), 1);

            for i in 1..12 {
                precept_free_string(precept_stream_ingest(stream, event.as_ptr(), i * 50));
            }
            let analysis = take_json(precept_stream_analysis(stream));
            assert_eq!(analysis["fluidity_score"], 100);
            assert_eq!(analysis["is_active"], true);

            assert_eq!(precept_stream_reset(stream), 0);
            let analysis = take_json(precept_stream_analysis(stream));
            assert_eq!(analysis["fluidity_score"], 0);
            assert!(analysis["raw_data"].as_array().unwrap().is_empty());

            precept_stream_free(stream);
        }
    }

    #[test]
    fn test_ffi_extreme_timestamps() {
        let mut timestamps = vec![i64::MIN, i64::MAX];
        timestamps.extend((2..10).map(|i| i * 50));
        let samples: Vec<serde_json::Value> = timestamps
            .iter()
            .map(|t| {
                serde_json::json!({
                    "acceleration": {"x": 0.0, "y": 0.0, "z": 9.8},
                    "rotation_rate": {"alpha": 0.0, "beta": 0.0, "gamma": 0.0},
                    "timestamp": t
                })
            })
            .collect();
        let json = CString::new(serde_json::to_string(&samples).unwrap()).unwrap();

        unsafe {
            let metrics = take_json(precept_analyze_window(json.as_ptr()));
            assert_eq!(metrics["fluidity_score"], 100.0);

            let stream = precept_stream_new(50, 2000);
            let event = gravity_event();
            let first = take_json(precept_stream_ingest(stream, event.as_ptr(), i64::MIN));
            assert_eq!(first["accepted"], true);
            let second = take_json(precept_stream_ingest(stream, event.as_ptr(), i64::MAX));
            assert_eq!(second["accepted"], true);
            assert_eq!(second["analysis"]["raw_data"].as_array().unwrap().len(), 1);
            precept_stream_free(stream);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = precept_analyze_window(invalid_json.as_ptr());
            assert!(result.is_null());

            let error = precept_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());

            assert_eq!(precept_stream_reset(ptr::null_mut()), -1);
            assert!(precept_stream_analysis(ptr::null()).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = precept_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
