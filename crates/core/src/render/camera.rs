//! Pinhole camera and orbit controller.

use crate::core_types::Vec3;
use crate::error::{FireError, Result};
use crate::render::geometry::Aabb;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, FRAC_PI_6};

/// Largest accepted field-of-view scale.
pub const MAX_FOV: f32 = 4.0;

/// Offset keeping rays off the exact image-plane edges.
const PLANE_EPSILON: f32 = 1e-5;

/// Camera state read by the renderers during a frame.
///
/// `fov` is the half-height of the image plane at unit distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
    pub fov: f32,
}

/// Orthonormal view frame: forward, right, up.
#[derive(Debug, Clone, Copy)]
pub struct ViewBasis {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Camera {
    /// # Errors
    ///
    /// Returns `FireError::InvalidCamera` if the fov is outside `(0, MAX_FOV]`, any
    /// vector is non-finite, the eye coincides with the target, or `up` is parallel
    /// to the view direction.
    pub fn new(position: Vec3, look_at: Vec3, up: Vec3, fov: f32) -> Result<Self> {
        let camera = Self {
            position,
            look_at,
            up,
            fov,
        };
        camera.validate()?;
        Ok(camera)
    }

    /// Check that the camera can produce a view basis.
    ///
    /// # Errors
    ///
    /// See [`Camera::new`].
    pub fn validate(&self) -> Result<()> {
        if !(self.fov.is_finite() && self.fov > 0.0 && self.fov <= MAX_FOV) {
            return Err(FireError::InvalidCamera(format!(
                "fov must be in (0, {MAX_FOV}], got {}",
                self.fov
            )));
        }
        let finite = |v: &Vec3| v.iter().all(|c| c.is_finite());
        if !(finite(&self.position) && finite(&self.look_at) && finite(&self.up)) {
            return Err(FireError::InvalidCamera(
                "position, look_at and up must be finite".to_string(),
            ));
        }
        if self.basis().is_none() {
            return Err(FireError::InvalidCamera(
                "view direction is zero or parallel to up".to_string(),
            ));
        }
        Ok(())
    }

    /// View frame, `None` when degenerate.
    #[must_use]
    pub fn basis(&self) -> Option<ViewBasis> {
        let forward = (self.look_at - self.position).try_normalize(f32::EPSILON)?;
        let up = self.up.try_normalize(f32::EPSILON)?;
        let right = forward.cross(&up).try_normalize(1e-6)?;
        let up = right.cross(&forward).try_normalize(f32::EPSILON)?;
        Some(ViewBasis { forward, right, up })
    }

    /// Ray direction through image position `(u, v)` (pixel units, `v` from the
    /// bottom row) on an image `height` pixels tall with the given aspect ratio.
    #[must_use]
    pub fn ray_direction(
        &self,
        basis: &ViewBasis,
        u: f32,
        v: f32,
        height: f32,
        aspect: f32,
    ) -> Option<Vec3> {
        let fu = 2.0 * self.fov * u / height - self.fov * aspect - PLANE_EPSILON;
        let fv = 2.0 * self.fov * v / height - self.fov - PLANE_EPSILON;
        (basis.forward + basis.right * fu + basis.up * fv).try_normalize(f32::EPSILON)
    }

    /// Inverse of [`Camera::ray_direction`]: image position and view depth of a
    /// world point, `None` for points behind the eye.
    #[must_use]
    pub fn project(
        &self,
        basis: &ViewBasis,
        point: Vec3,
        height: f32,
        aspect: f32,
    ) -> Option<(f32, f32, f32)> {
        let rel = point - self.position;
        let depth = rel.dot(&basis.forward);
        if depth <= 1e-4 {
            return None;
        }
        let fu = rel.dot(&basis.right) / depth;
        let fv = rel.dot(&basis.up) / depth;
        let u = (fu + self.fov * aspect) * height / (2.0 * self.fov);
        let v = (fv + self.fov) * height / (2.0 * self.fov);
        Some((u, v, depth))
    }
}

/// Spherical-coordinate camera controller around a target point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub target: Vec3,
}

impl OrbitCamera {
    const MIN_DISTANCE: f32 = 0.1;
    const MAX_DISTANCE: f32 = 100.0;
    const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.05;

    #[must_use]
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance,
            target,
        }
    }

    /// Orbit that fits a bounding box, seen from an isometric-like angle.
    #[must_use]
    pub fn framing(bbox: &Aabb) -> Self {
        Self {
            yaw: -FRAC_PI_4,
            pitch: FRAC_PI_6,
            distance: bbox.size().norm() * 0.7 + 2.0,
            target: bbox.center(),
        }
    }

    /// Eye position for the current angles.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        let (sp, cp) = self.pitch.sin_cos();
        let (sy, cy) = self.yaw.sin_cos();
        self.target + Vec3::new(cp * cy, sp, cp * sy) * self.distance
    }

    /// Camera looking at the target with an up vector orthogonal to the view.
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidCamera` for a degenerate orbit (zero distance,
    /// non-finite values) or an invalid fov.
    pub fn camera(&self, fov: f32) -> Result<Camera> {
        let position = self.position();
        let view = (self.target - position)
            .try_normalize(f32::EPSILON)
            .ok_or_else(|| FireError::InvalidCamera("orbit distance is zero".to_string()))?;
        let right = Vec3::y()
            .cross(&view)
            .try_normalize(1e-6)
            .ok_or_else(|| FireError::InvalidCamera("orbit looks straight up or down".to_string()))?;
        let up = view.cross(&right);
        Camera::new(position, self.target, up, fov)
    }

    /// Rotate by mouse deltas in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * 0.01;
        self.pitch = (self.pitch + dy * 0.01).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    /// Zoom by wheel steps (positive moves closer).
    pub fn zoom(&mut self, steps: f32) {
        self.distance =
            (self.distance * (-steps * 0.1).exp()).clamp(Self::MIN_DISTANCE, Self::MAX_DISTANCE);
    }

    /// Move the target in the view plane by mouse deltas in pixels.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let Some(forward) = (self.target - self.position()).try_normalize(f32::EPSILON) else {
            return;
        };
        let Some(right) = forward.cross(&Vec3::y()).try_normalize(1e-6) else {
            return;
        };
        let up = right.cross(&forward);
        let speed = self.distance * 0.002;
        self.target += right * (-dx * speed) + up * (dy * speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        Camera::new(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::zeros(),
            Vec3::y(),
            0.23,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_cameras() {
        let eye = Vec3::new(0.0, 0.0, -5.0);
        assert!(Camera::new(eye, Vec3::zeros(), Vec3::y(), 0.0).is_err());
        assert!(Camera::new(eye, Vec3::zeros(), Vec3::y(), f32::NAN).is_err());
        assert!(Camera::new(eye, Vec3::zeros(), Vec3::y(), 10.0).is_err());
        assert!(Camera::new(eye, eye, Vec3::y(), 0.23).is_err());
        assert!(Camera::new(eye, Vec3::zeros(), Vec3::z(), 0.23).is_err());
    }

    #[test]
    fn test_center_ray_points_forward() {
        let cam = camera();
        let basis = cam.basis().unwrap();
        let dir = cam.ray_direction(&basis, 64.0, 36.0, 72.0, 128.0 / 72.0).unwrap();
        assert_relative_eq!(dir, Vec3::z(), epsilon = 1e-4);
    }

    #[test]
    fn test_project_inverts_ray_direction() {
        let cam = camera();
        let basis = cam.basis().unwrap();
        let aspect = 1.5;
        let dir = cam.ray_direction(&basis, 20.0, 50.0, 80.0, aspect).unwrap();
        let point = cam.position + dir * 7.0;
        let (u, v, depth) = cam.project(&basis, point, 80.0, aspect).unwrap();
        assert_relative_eq!(u, 20.0, epsilon = 1e-2);
        assert_relative_eq!(v, 50.0, epsilon = 1e-2);
        assert!(depth > 0.0);
        assert!(cam.project(&basis, Vec3::new(0.0, 0.0, -9.0), 80.0, aspect).is_none());
    }

    #[test]
    fn test_orbit_camera_looks_at_target() {
        let orbit = OrbitCamera::new(Vec3::new(1.0, 2.0, 3.0), 4.0);
        let cam = orbit.camera(0.23).unwrap();
        assert_relative_eq!((cam.position - orbit.target).norm(), 4.0, epsilon = 1e-4);
        assert_relative_eq!(cam.up.dot(&(cam.look_at - cam.position)), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_orbit_controls_clamp() {
        let mut orbit = OrbitCamera::new(Vec3::zeros(), 2.5);
        orbit.orbit(0.0, 10_000.0);
        assert!(orbit.pitch < FRAC_PI_2);
        orbit.zoom(-1000.0);
        assert_eq!(orbit.distance, 100.0);
        orbit.pan(10.0, 0.0);
        assert!(orbit.target.norm() > 0.0);
    }

    #[test]
    fn test_framing_fits_box() {
        let bbox = Aabb {
            min: Vec3::zeros(),
            max: Vec3::new(2.0, 2.0, 1.0),
        };
        let orbit = OrbitCamera::framing(&bbox);
        assert_relative_eq!(orbit.target, Vec3::new(1.0, 1.0, 0.5));
        assert_relative_eq!(orbit.distance, 3.0 * 0.7 + 2.0);
        assert!(orbit.camera(0.23).is_ok());
    }
}
