//! Ray and sampling helpers for the voxel tracer.

use crate::core_types::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Small offset used to step off surfaces.
pub const EPS: f32 = 1e-4;
/// Distance reported for rays that hit nothing.
pub const INF: f32 = 1e10;

/// Axis-aligned bounding box in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Whether `p` lies in `[min, max)` on every axis.
    #[must_use]
    pub fn contains_half_open(&self, p: Vec3) -> bool {
        (0..3).all(|i| self.min[i] <= p[i] && p[i] < self.max[i])
    }
}

/// Slab test of a ray against a box.
///
/// # Returns
///
/// `(near, far)` parametric distances when the ray's line crosses the box in front
/// of or around the origin, `None` otherwise
#[must_use]
pub fn ray_aabb_intersection(aabb: &Aabb, origin: Vec3, dir: Vec3) -> Option<(f32, f32)> {
    let mut near = -INF;
    let mut far = INF;
    for i in 0..3 {
        if dir[i] == 0.0 {
            if origin[i] < aabb.min[i] || origin[i] > aabb.max[i] {
                return None;
            }
        } else {
            let t1 = (aabb.min[i] - origin[i]) / dir[i];
            let t2 = (aabb.max[i] - origin[i]) / dir[i];
            near = near.max(t1.min(t2));
            far = far.min(t1.max(t2));
        }
    }
    (near <= far && far >= 0.0).then_some((near, far))
}

/// Cosine-weighted random direction in the hemisphere around `normal`.
pub fn cosine_hemisphere(normal: Vec3, rng: &mut impl Rng) -> Vec3 {
    let u = if normal.y.abs() < 1.0 - EPS {
        normal.cross(&Vec3::y()).normalize()
    } else {
        Vec3::x()
    };
    let v = normal.cross(&u);
    let phi = TAU * rng.random::<f32>();
    let ay = rng.random::<f32>().sqrt();
    let ax = (1.0 - ay * ay).max(0.0).sqrt();
    (u * phi.cos() + v * phi.sin()) * ax + normal * ay
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn unit_box() -> Aabb {
        Aabb {
            min: Vec3::zeros(),
            max: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    #[test]
    fn test_ray_hits_box() {
        let (near, far) = ray_aabb_intersection(
            &unit_box(),
            Vec3::new(-1.0, 0.5, 0.5),
            Vec3::new(1.0, 0.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(near, 1.0);
        assert_relative_eq!(far, 2.0);
    }

    #[test]
    fn test_ray_misses_box() {
        assert!(ray_aabb_intersection(
            &unit_box(),
            Vec3::new(-1.0, 2.0, 0.5),
            Vec3::new(1.0, 0.0, 0.0),
        )
        .is_none());
        // Box entirely behind the origin
        assert!(ray_aabb_intersection(
            &unit_box(),
            Vec3::new(3.0, 0.5, 0.5),
            Vec3::new(1.0, 0.0, 0.0),
        )
        .is_none());
    }

    #[test]
    fn test_origin_inside_box() {
        let (near, far) = ray_aabb_intersection(
            &unit_box(),
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert!(near < 0.0);
        assert_relative_eq!(far, 0.5);
    }

    #[test]
    fn test_cosine_hemisphere_stays_above_surface() {
        let mut rng = SmallRng::seed_from_u64(5);
        for normal in [Vec3::y(), Vec3::x(), -Vec3::z(), Vec3::new(1.0, 1.0, 0.0).normalize()] {
            for _ in 0..200 {
                let d = cosine_hemisphere(normal, &mut rng);
                assert!(d.dot(&normal) >= -1e-5);
                assert_relative_eq!(d.norm(), 1.0, epsilon = 1e-4);
            }
        }
    }
}
