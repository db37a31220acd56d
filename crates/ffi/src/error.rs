use cyberfire_core::FireError;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Common interface for FFI error types.
///
/// - `code()` - Returns the error code passed across the FFI boundary
/// - `msg()` - Returns the message stored for `cyberfire_get_last_error`
pub(crate) trait CyberFireError {
    fn code(&self) -> CyberFireErrorCode;

    fn msg(&self) -> &str;
}

/// Default implementation of `CyberFireError` with constructors for each failure kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultCyberFireError {
    code: CyberFireErrorCode,
    msg: String,
}

impl DefaultCyberFireError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"out_instance"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: CyberFireErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for poisoned lock.
    ///
    /// # Arguments
    /// * `lock_name` - The name of the lock that was poisoned
    pub fn lock_poisoned(lock_name: &str) -> Self {
        Self {
            code: CyberFireErrorCode::LockPoisoned,
            msg: format!("Lock '{lock_name}' was poisoned by a panic in another thread"),
        }
    }

    /// Create error for invalid parameter.
    pub fn invalid_parameter(message: String) -> Self {
        Self {
            code: CyberFireErrorCode::InvalidParameter,
            msg: message,
        }
    }

    /// Create error for an output buffer shorter than the frame.
    pub fn buffer_too_small(expected: usize, actual: usize) -> Self {
        Self {
            code: CyberFireErrorCode::BufferTooSmall,
            msg: format!("Output buffer holds {actual} bytes, frame needs {expected}"),
        }
    }
}

impl From<FireError> for DefaultCyberFireError {
    fn from(error: FireError) -> Self {
        let code = match error {
            FireError::InvalidDimensions { .. } => CyberFireErrorCode::InvalidDimensions,
            FireError::BufferSize { .. } => CyberFireErrorCode::BufferTooSmall,
            _ => CyberFireErrorCode::InvalidParameter,
        };
        Self {
            code,
            msg: error.to_string(),
        }
    }
}

impl CyberFireError for DefaultCyberFireError {
    fn code(&self) -> CyberFireErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

/// FFI error codes returned by cyberfire functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyberFireErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Lock poisoned: internal synchronization primitive was poisoned by a panic.
    LockPoisoned = 2,

    /// Grid dimensions are zero, too small, or overflow the cell count.
    InvalidDimensions = 3,

    /// Invalid parameter passed to function (radius, multiplier, camera, palette, ...).
    InvalidParameter = 4,

    /// Output buffer is shorter than the rendered frame.
    BufferTooSmall = 5,
}

impl From<DefaultCyberFireError> for CyberFireErrorCode {
    fn from(error: DefaultCyberFireError) -> Self {
        error.code
    }
}

thread_local! {
    /// Thread-local storage for the most recent FFI error (C string, error code).
    /// The CString is owned here so the pointer handed to C stays valid until the next call.
    static LAST_ERROR: RefCell<(Option<CString>, CyberFireErrorCode)> = const { RefCell::new((None, CyberFireErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, CyberFireErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, CyberFireErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if the last call on this thread failed.
/// - `null` if the last call succeeded or the message cannot be converted to a C string.
///
/// # Lifetime
/// The returned pointer is valid until the next cyberfire call on this thread.
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```cpp
/// CyberFire2DInstance* sim = nullptr;
/// if (cyberfire2d_new(640, 480, 0, &sim) != CyberFireErrorCode::Ok) {
///     const char* error = cyberfire_get_last_error();
///     if (error) {
///         printf("Fire creation failed: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn cyberfire_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code, `Ok` if the last call succeeded.
#[no_mangle]
pub extern "C" fn cyberfire_get_last_error_code() -> CyberFireErrorCode {
    with_last_error(|(_cstring, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_codes() {
        let dims = DefaultCyberFireError::from(FireError::InvalidDimensions {
            width: 0,
            height: 1,
            depth: 1,
        });
        assert_eq!(dims.code(), CyberFireErrorCode::InvalidDimensions);

        let radius = DefaultCyberFireError::from(FireError::InvalidRadius(0));
        assert_eq!(radius.code(), CyberFireErrorCode::InvalidParameter);
        assert_eq!(radius.msg(), "invalid brush radius 0");

        let buffer = DefaultCyberFireError::from(FireError::BufferSize {
            expected: 12,
            actual: 3,
        });
        assert_eq!(buffer.code(), CyberFireErrorCode::BufferTooSmall);
    }

    #[test]
    fn test_null_pointer_message() {
        let err = DefaultCyberFireError::null_pointer("ptr");
        assert_eq!(err.code(), CyberFireErrorCode::NullPointer);
        assert_eq!(err.msg(), "Parameter 'ptr' cannot be null");
    }
}
