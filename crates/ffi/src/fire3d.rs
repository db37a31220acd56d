//! C ABI for the 3D fire simulation.

use cyberfire_core::{
    FireConfig3D, FireSimulation3D, OrbitCamera, Palette, RenderPath, TracerSettings, Vec3,
};
use std::sync::RwLock;
use std::{ptr, slice};

use crate::error::{CyberFireErrorCode, DefaultCyberFireError};
use crate::helpers::{instance_ref, run_ffi, track_error, track_result, with_write};

/// Opaque 3D simulation handle.
pub struct CyberFire3DInstance {
    pub(crate) sim: RwLock<FireSimulation3D>,
}

/// C-compatible 3-component vector.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CyberFireVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<CyberFireVec3> for Vec3 {
    fn from(v: CyberFireVec3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Renderer used by `cyberfire3d_render_frame`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyberFireRenderPath {
    /// Voxel grid traced by the progressive path tracer.
    VoxelTrace = 0,
    /// Marching-cubes isosurface rasterized through the camera.
    MarchingCubes = 1,
}

impl From<CyberFireRenderPath> for RenderPath {
    fn from(path: CyberFireRenderPath) -> Self {
        match path {
            CyberFireRenderPath::VoxelTrace => RenderPath::VoxelTrace,
            CyberFireRenderPath::MarchingCubes => RenderPath::MarchingCubes,
        }
    }
}

/// Create a 3D simulation rendering `image_width x image_height` frames.
///
/// # Safety
///
/// - `out_instance` must be a valid, non-null pointer to writable memory.
/// - The caller owns the instance and must release it with `cyberfire3d_destroy`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire3d_new(
    width: u32,
    height: u32,
    depth: u32,
    image_width: u32,
    image_height: u32,
    seed: u64,
    out_instance: *mut *mut CyberFire3DInstance,
) -> CyberFireErrorCode {
    if out_instance.is_null() {
        return track_error(&DefaultCyberFireError::null_pointer("out_instance"));
    }

    let config = FireConfig3D {
        width: width as usize,
        height: height as usize,
        depth: depth as usize,
        seed,
        tracer: TracerSettings {
            image_width: image_width as usize,
            image_height: image_height as usize,
            ..TracerSettings::default()
        },
        ..FireConfig3D::default()
    };
    let created = FireSimulation3D::new(&config).map_err(DefaultCyberFireError::from);
    match track_result(created) {
        Ok(sim) => {
            let instance = Box::new(CyberFire3DInstance {
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

/// Destroy an instance created by `cyberfire3d_new`. Null is a no-op.
///
/// # Safety
///
/// `ptr` must come from `cyberfire3d_new` and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn cyberfire3d_destroy(ptr: *mut CyberFire3DInstance) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: pointer was produced by `Box::into_raw` in `cyberfire3d_new`.
    unsafe {
        drop(Box::from_raw(ptr));
    }
}

/// Advance the automaton one frame.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire3d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire3d_step(
    ptr: *const CyberFire3DInstance,
    time: f32,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        with_write(&instance.sim, |sim| sim.step(time))
    })
}

/// Relight the source plane, zero everything else and restore the home camera.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire3d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire3d_reset(ptr: *const CyberFire3DInstance) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        with_write(&instance.sim, FireSimulation3D::reset)
    })
}

/// Zero the volume, source plane included.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire3d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire3d_clear(ptr: *const CyberFire3DInstance) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        with_write(&instance.sim, FireSimulation3D::clear)
    })
}

/// Spherical heat brush in volume coordinates.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire3d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire3d_apply_heat(
    ptr: *const CyberFire3DInstance,
    x: i32,
    y: i32,
    z: i32,
    radius: u32,
    multiplier: f32,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        with_write(&instance.sim, |sim| sim.apply_heat(x, y, z, radius, multiplier))??;
        Ok(())
    })
}

/// Fill the inclusive box `[x0, x1] x [y0, y1] x [z0, z1]` with brush stamps.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire3d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire3d_fire_box(
    ptr: *const CyberFire3DInstance,
    x0: i32,
    y0: i32,
    z0: i32,
    x1: i32,
    y1: i32,
    z1: i32,
    radius: u32,
    multiplier: f32,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        with_write(&instance.sim, |sim| {
            sim.fire_box([x0, y0, z0], [x1, y1, z1], radius, multiplier)
        })??;
        Ok(())
    })
}

/// Replace the palette with 256 packed RGB triples (`len` must be 768).
///
/// # Safety
///
/// - `ptr` must be null or a live instance from `cyberfire3d_new`.
/// - `rgb` must be null or point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn cyberfire3d_set_palette(
    ptr: *const CyberFire3DInstance,
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

/// Set the camera directly. An invalid camera keeps the previous one.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire3d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire3d_set_camera(
    ptr: *const CyberFire3DInstance,
    position: CyberFireVec3,
    look_at: CyberFireVec3,
    up: CyberFireVec3,
    fov: f32,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        with_write(&instance.sim, |sim| {
            sim.set_camera(position.into(), look_at.into(), up.into(), fov)
        })??;
        Ok(())
    })
}

/// Set the camera from orbit controls around `target`.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire3d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire3d_set_orbit(
    ptr: *const CyberFire3DInstance,
    yaw: f32,
    pitch: f32,
    distance: f32,
    target: CyberFireVec3,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        let orbit = OrbitCamera {
            yaw,
            pitch,
            distance,
            target: target.into(),
        };
        with_write(&instance.sim, |sim| sim.set_orbit(&orbit))??;
        Ok(())
    })
}

/// Select the renderer for subsequent frames.
///
/// # Safety
///
/// `ptr` must be null or a live instance from `cyberfire3d_new`.
#[no_mangle]
pub unsafe extern "C" fn cyberfire3d_set_render_path(
    ptr: *const CyberFire3DInstance,
    path: CyberFireRenderPath,
) -> CyberFireErrorCode {
    run_ffi(|| {
        let instance = unsafe { instance_ref(ptr, "ptr") }?;
        with_write(&instance.sim, |sim| sim.set_render_path(path.into()))
    })
}

/// Render the current state as bottom-up RGB rows of the configured image size.
///
/// # Safety
///
/// - `ptr` must be null or a live instance from `cyberfire3d_new`.
/// - `out` must be null or point to `len` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn cyberfire3d_render_frame(
    ptr: *const CyberFire3DInstance,
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
            let settings = sim.tracer().settings();
            let expected = settings.image_width * settings.image_height * 3;
            if len < expected {
                return Err(DefaultCyberFireError::buffer_too_small(expected, len));
            }
            buffer[..expected].copy_from_slice(sim.render_frame().as_bytes());
            Ok(())
        })?
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::cyberfire_get_last_error_code;

    fn create() -> *mut CyberFire3DInstance {
        let mut instance = ptr::null_mut();
        let code = unsafe { cyberfire3d_new(10, 10, 10, 16, 12, 4, &mut instance) };
        assert_eq!(code, CyberFireErrorCode::Ok);
        instance
    }

    #[test]
    fn test_lifecycle() {
        let sim = create();
        let mut frame = vec![0u8; 16 * 12 * 3];
        unsafe {
            assert_eq!(cyberfire3d_step(sim, 0.0), CyberFireErrorCode::Ok);
            assert_eq!(
                cyberfire3d_fire_box(sim, 3, 3, 3, 6, 6, 6, 1, 1.0),
                CyberFireErrorCode::Ok
            );
            assert_eq!(
                cyberfire3d_render_frame(sim, frame.as_mut_ptr(), frame.len()),
                CyberFireErrorCode::Ok
            );
            assert_eq!(
                cyberfire3d_set_render_path(sim, CyberFireRenderPath::MarchingCubes),
                CyberFireErrorCode::Ok
            );
            assert_eq!(
                cyberfire3d_render_frame(sim, frame.as_mut_ptr(), frame.len()),
                CyberFireErrorCode::Ok
            );
            assert_eq!(cyberfire3d_reset(sim), CyberFireErrorCode::Ok);
            cyberfire3d_destroy(sim);
        }
    }

    #[test]
    fn test_camera_validation() {
        let sim = create();
        let origin = CyberFireVec3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        };
        let up = CyberFireVec3 {
            x: 0.0,
            y: 1.0,
            z: 0.0,
        };
        unsafe {
            assert_eq!(
                cyberfire3d_set_camera(sim, origin, origin, up, 0.23),
                CyberFireErrorCode::InvalidParameter
            );
            assert_eq!(
                cyberfire_get_last_error_code(),
                CyberFireErrorCode::InvalidParameter
            );
            assert_eq!(
                cyberfire3d_set_orbit(sim, 0.3, 0.2, 2.0, origin),
                CyberFireErrorCode::Ok
            );
            assert_eq!(
                cyberfire3d_set_orbit(sim, 0.3, 0.2, 0.0, origin),
                CyberFireErrorCode::InvalidParameter
            );
            cyberfire3d_destroy(sim);
        }
    }

    #[test]
    fn test_render_buffer_checked() {
        let sim = create();
        let mut small = vec![0u8; 16];
        unsafe {
            assert_eq!(
                cyberfire3d_render_frame(sim, small.as_mut_ptr(), small.len()),
                CyberFireErrorCode::BufferTooSmall
            );
            assert_eq!(
                cyberfire3d_render_frame(sim, ptr::null_mut(), 0),
                CyberFireErrorCode::NullPointer
            );
            cyberfire3d_destroy(sim);
        }
    }
}
