use crate::error::{with_last_error_mut, CyberFireError, CyberFireErrorCode, DefaultCyberFireError};
use std::ffi::CString;
use std::sync::RwLock;

/// Set the thread-local error message and code.
pub(crate) fn set_last_error(error: &impl CyberFireError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Track an error by setting it in thread-local storage and returning its code.
#[inline]
pub(crate) fn track_error(error: &impl CyberFireError) -> CyberFireErrorCode {
    set_last_error(error);
    error.code()
}

/// Clear the thread-local error message and code.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = CyberFireErrorCode::Ok;
    });
}

/// Record the outcome of a fallible operation and return its error code.
pub(crate) fn track_result<T>(
    result: Result<T, DefaultCyberFireError>,
) -> Result<T, CyberFireErrorCode> {
    match result {
        Ok(value) => {
            clear_last_error();
            Ok(value)
        }
        Err(error) => Err(track_error(&error)),
    }
}

/// Run an FFI body and fold its result into a status code.
pub(crate) fn run_ffi<F>(body: F) -> CyberFireErrorCode
where
    F: FnOnce() -> Result<(), DefaultCyberFireError>,
{
    match track_result(body()) {
        Ok(()) => CyberFireErrorCode::Ok,
        Err(code) => code,
    }
}

/// Borrow an instance behind a caller-supplied pointer.
///
/// # Safety
///
/// `ptr` must be null or point to a live instance created by this library.
pub(crate) unsafe fn instance_ref<'a, T>(
    ptr: *const T,
    name: &str,
) -> Result<&'a T, DefaultCyberFireError> {
    // SAFETY: caller guarantees `ptr` is null or valid for the returned lifetime.
    unsafe { ptr.as_ref() }.ok_or_else(|| DefaultCyberFireError::null_pointer(name))
}

/// Run `f` under the write lock.
pub(crate) fn with_write<T, R>(
    lock: &RwLock<T>,
    f: impl FnOnce(&mut T) -> R,
) -> Result<R, DefaultCyberFireError> {
    let mut guard = lock
        .write()
        .map_err(|_| DefaultCyberFireError::lock_poisoned("RwLock"))?;
    Ok(f(&mut guard))
}

/// Run `f` under the read lock.
pub(crate) fn with_read<T, R>(
    lock: &RwLock<T>,
    f: impl FnOnce(&T) -> R,
) -> Result<R, DefaultCyberFireError> {
    let guard = lock
        .read()
        .map_err(|_| DefaultCyberFireError::lock_poisoned("RwLock"))?;
    Ok(f(&guard))
}
