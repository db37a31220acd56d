//! C ABI for the 2D fire simulation.

use cyberfire_core::{FireConfig2D, FireSimulation2D, Palette, SpreadParams};
use std::sync::RwLock;
use std::{ptr, slice};

use crate::error::{CyberFireErrorCode, DefaultCyberFireError};
use crate::helpers::{instance_ref, run_ffi, track_error, track_result, with_read, with_write};

/// Opaque 2D simulation handle.
///
/// The simulation sits behind an `RwLock`, so tool edits issued from an input thread
/// serialize with `cyberfire2d_step` on the frame thread.
pub struct CyberFire2DInstance {
    pub(crate) sim: RwLock<FireSimulation2D>,
}

/// Create a 2D simulation with its source row lit.
///
/// Returns `InvalidDimensions` for a zero width or a height below 2; `out_instance` is
/// set to null on failure.
///
/// # Safety
///
/// - `out_instance` must be a valid, non-null pointer to writable memory.
/// - The caller owns the instance and must release it with `cyberfire2d_destroy`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_new(
    width: u32,
    height: u32,
    seed: u64,
    out_instance: *mut *mut CyberFire2DInstance,
) -> CyberFireErrorCode {
    if out_instance.is_null() {
        return track_error(&DefaultCyberFireError::null_pointer("out_instance"));
    }

    let config = FireConfig2D {
        width: width as usize,
        height: height as usize,
        seed,
        ..FireConfig2D::default()
    };
    let created = FireSimulation2D::new(&config).map_err(DefaultCyberFireError::from);
    match track_result(created) {
        Ok(sim) => {
            let instance = Box::new(CyberFire2DInstance {
                sim: RwLock::new(sim),
            });
            unsafe {
                *out_instance = Box::into_raw(instance);
            }
            CyberFireErrorCode::Ok
        }
        Err(code) => {
            unsafe {
                *out_instance = ptr::null_mut();
            }
            code
        }
    }
}

/// Destroy an instance created by `cyberfire2d_new`. Null is a no-op.
///
/// # Safety
///
/// `ptr` must come from `cyberfire2d_new` and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_destroy(ptr: *mut CyberFire2DInstance) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: pointer was produced by `Box::into_raw` in `cyberfire2d_new`.
    unsafe {
        drop(Box::from_raw(ptr));
    }
}

/// Advance the automaton one frame; `time` drives the flicker noise.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire2d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_step(
    ptr: *const CyberFire2DInstance,
    time: f32,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        with_write(&instance.sim, |sim| sim.step(time))
    })
}

/// Zero the field, clear the fixed mask and relight the source row.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire2d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_reset(ptr: *const CyberFire2DInstance) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        with_write(&instance.sim, FireSimulation2D::reset)
    })
}

/// Zero the field, source row included.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire2d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_clear(ptr: *const CyberFire2DInstance) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        with_write(&instance.sim, FireSimulation2D::clear)
    })
}

/// Relight the source row.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire2d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_initialize(
    ptr: *const CyberFire2DInstance,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        with_write(&instance.sim, FireSimulation2D::initialize)
    })
}

/// Set the automaton spread multipliers (both must be at least 1).
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire2d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_set_spread(
    ptr: *const CyberFire2DInstance,
    decay_mult: u32,
    add_mult: u32,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        let spread = SpreadParams::new(decay_mult, add_mult)?;
        with_write(&instance.sim, |sim| sim.set_spread(spread))??;
        Ok(())
    })
}

/// Radial heat brush. A negative multiplier erases.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire2d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_apply_heat(
    ptr: *const CyberFire2DInstance,
    x: i32,
    y: i32,
    radius: u32,
    multiplier: f32,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        with_write(&instance.sim, |sim| sim.apply_heat(x, y, radius, multiplier))??;
        Ok(())
    })
}

/// Mark (`state = true`) or unmark cells within `radius` as fixed.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire2d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_set_fixed(
    ptr: *const CyberFire2DInstance,
    x: i32,
    y: i32,
    radius: u32,
    state: bool,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        with_write(&instance.sim, |sim| sim.set_fixed(x, y, radius, state))
    })
}

/// Heat brush along the Bresenham line between two points.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire2d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_fire_line(
    ptr: *const CyberFire2DInstance,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    radius: u32,
    multiplier: f32,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        with_write(&instance.sim, |sim| {
            sim.fire_line((x0, y0), (x1, y1), radius, multiplier)
        })??;
        Ok(())
    })
}

/// Fill an inclusive rectangle. A negative `intensity` means full intensity.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire2d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_fire_rect(
    ptr: *const CyberFire2DInstance,
    x_min: i32,
    x_max: i32,
    y_min: i32,
    y_max: i32,
    intensity: i32,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        let level = if intensity < 0 {
            None
        } else {
            Some(u8::try_from(intensity).map_err(|_| {
                DefaultCyberFireError::invalid_parameter(format!(
                    "intensity must be at most 255, got {intensity}"
                ))
            })?)
        };
        with_write(&instance.sim, |sim| {
            sim.fire_rect(x_min, x_max, y_min, y_max, level)
        })??;
        Ok(())
    })
}

/// Replace the palette with 256 packed RGB triples (`len` must be 768).
///
/// # Safety
///
/// - `ptr` must be null or a live instance from `cyberfire2d_new`.
/// - `rgb` must be null or point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_set_palette(
    ptr: *const CyberFire2DInstance,
    rgb: *const u8,
    len: usize,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        if rgb.is_null() {
            return Err(DefaultCyberFireError::null_pointer("rgb"));
        }
        // SAFETY: caller guarantees `len` readable bytes at `rgb`.
        let bytes = unsafe { slice::from_raw_parts(rgb, len) };
        let palette = Palette::from_rgb_bytes(bytes)?;
        with_write(&instance.sim, |sim| sim.set_palette(palette))
    })
}

/// Toggle the fixed-cell highlight overlay.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire2d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_set_highlight(
    ptr: *const CyberFire2DInstance,
    on: bool,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        with_write(&instance.sim, |sim| sim.set_highlight_fixed(on))
    })
}

/// Render the current frame as bottom-up RGB rows (`width * height * 3` bytes).
///
/// # Safety
///
/// - `ptr` must be null or a live instance from `cyberfire2d_new`.
/// - `out` must be null or point to `len` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_render_frame(
    ptr: *const CyberFire2DInstance,
    out: *mut u8,
    len: usize,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        if out.is_null() {
            return Err(DefaultCyberFireError::null_pointer("out"));
        }
        // SAFETY: caller guarantees `len` writable bytes at `out`.
        let buffer = unsafe { slice::from_raw_parts_mut(out, len) };
        with_write(&instance.sim, |sim| {
            let expected = sim.width() * sim.height() * 3;
            if len < expected {
                return Err(DefaultCyberFireError::buffer_too_small(expected, len));
            }
            sim.render_into(&mut buffer[..expected])
                .map_err(DefaultCyberFireError::from)
        })?
    })
}

/// Field width in cells, 0 on error.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire2d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_width(ptr: *const CyberFire2DInstance) -> u32 {
    let result = unsafe { instance_ref(ptr, "ptr") }
        .and_then(|instance| with_read(&instance.sim, |sim| sim.width() as u32));
    track_result(result).unwrap_or(0)
}

/// Field height in cells, 0 on error.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire2d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire2d_height(ptr: *const CyberFire2DInstance) -> u32 {
    let result = unsafe { instance_ref(ptr, "ptr") }
        .and_then(|instance| with_read(&instance.sim, |sim| sim.height() as u32));
    track_result(result).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{cyberfire_get_last_error, cyberfire_get_last_error_code};

    fn create(width: u32, height: u32) -> *mut CyberFire2DInstance {
        let mut instance = ptr::null_mut();
        let code = unsafe { cyberfire2d_new(width, height, 1, &mut instance) };
        assert_eq!(code, CyberFireErrorCode::Ok);
        instance
    }

    #[test]
    fn test_lifecycle() {
        let sim = create(16, 8);
        unsafe {
            assert_eq!(cyberfire2d_width(sim), 16);
            assert_eq!(cyberfire2d_height(sim), 8);
            assert_eq!(cyberfire2d_step(sim, 0.05), CyberFireErrorCode::Ok);
            assert_eq!(
                cyberfire2d_apply_heat(sim, 4, 4, 2, 1.0),
                CyberFireErrorCode::Ok
            );
            assert_eq!(
                cyberfire2d_fire_rect(sim, 0, 3, 0, 3, -1),
                CyberFireErrorCode::Ok
            );
            let mut frame = vec![0u8; 16 * 8 * 3];
            assert_eq!(
                cyberfire2d_render_frame(sim, frame.as_mut_ptr(), frame.len()),
                CyberFireErrorCode::Ok
            );
            // Bottom image row is field row 0, filled by fire_rect
            assert_eq!(frame[(7 * 16) * 3], 255);
            assert_eq!(cyberfire2d_reset(sim), CyberFireErrorCode::Ok);
            cyberfire2d_destroy(sim);
        }
    }

    #[test]
    fn test_invalid_dimensions() {
        let mut instance = ptr::null_mut();
        let code = unsafe { cyberfire2d_new(8, 1, 0, &mut instance) };
        assert_eq!(code, CyberFireErrorCode::InvalidDimensions);
        assert!(instance.is_null());
        assert_eq!(
            cyberfire_get_last_error_code(),
            CyberFireErrorCode::InvalidDimensions
        );
        assert!(!cyberfire_get_last_error().is_null());
    }

    #[test]
    fn test_null_pointers() {
        unsafe {
            assert_eq!(
                cyberfire2d_new(8, 8, 0, ptr::null_mut()),
                CyberFireErrorCode::NullPointer
            );
            assert_eq!(
                cyberfire2d_step(ptr::null(), 0.0),
                CyberFireErrorCode::NullPointer
            );
            assert_eq!(cyberfire2d_width(ptr::null()), 0);
            cyberfire2d_destroy(ptr::null_mut());
        }
    }

    #[test]
    fn test_parameter_errors() {
        let sim = create(8, 8);
        unsafe {
            assert_eq!(
                cyberfire2d_apply_heat(sim, 1, 1, 0, 1.0),
                CyberFireErrorCode::InvalidParameter
            );
            assert_eq!(
                cyberfire2d_fire_rect(sim, 5, 1, 0, 0, -1),
                CyberFireErrorCode::InvalidParameter
            );
            assert_eq!(
                cyberfire2d_fire_rect(sim, 0, 1, 0, 1, 300),
                CyberFireErrorCode::InvalidParameter
            );
            let short = [0u8; 12];
            assert_eq!(
                cyberfire2d_set_palette(sim, short.as_ptr(), short.len()),
                CyberFireErrorCode::InvalidParameter
            );
            let mut small = vec![0u8; 10];
            assert_eq!(
                cyberfire2d_render_frame(sim, small.as_mut_ptr(), small.len()),
                CyberFireErrorCode::BufferTooSmall
            );
            assert_eq!(cyberfire2d_step(sim, 0.0), CyberFireErrorCode::Ok);
            assert!(cyberfire_get_last_error().is_null());
            cyberfire2d_destroy(sim);
        }
    }
}
