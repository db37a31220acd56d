//! Voxel scene mirrored from the 3D heat volume.
//!
//! Voxel rows are flipped against the field (`voxel_y = height - 1 - field_y`) so the
//! source plane sits at the bottom of world space and flames rise along +y. World
//! position of voxel `(x, y, z)` is `(x, y, z) * dx`.

use crate::core_types::{IVec3, Palette, Vec3};
use crate::error::{FireError, Result};
use crate::grid::HeatVolume;
use crate::render::geometry::Aabb;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Surface type of a voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Material {
    #[default]
    Empty,
    /// Diffuse surface lit by the directional light.
    Lambertian,
    /// Emissive: terminates paths and adds its color.
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Voxel {
    pub material: Material,
    pub color: [u8; 3],
    /// Probability that a ray crossing the voxel stops in it.
    pub alpha: f32,
}

/// Floor voxel laid over the row just above the source.
const FLOOR_VOXEL: Voxel = Voxel {
    material: Material::Lambertian,
    color: [0, 0, 0],
    alpha: 1.0,
};

/// Dense voxel array with the bounding box of its occupied cells.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    voxels: Vec<Voxel>,
    width: usize,
    height: usize,
    depth: usize,
    dx: f32,
    bbox: Option<Aabb>,
}

impl VoxelGrid {
    /// Create an empty grid.
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidDimensions` if any dimension is zero or the cell
    /// count overflows, `FireError::InvalidSettings` for a non-positive `dx`.
    pub fn new(width: usize, height: usize, depth: usize, dx: f32) -> Result<Self> {
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(depth))
            .filter(|&n| n > 0)
            .ok_or(FireError::InvalidDimensions {
                width,
                height,
                depth,
            })?;
        if !(dx.is_finite() && dx > 0.0) {
            return Err(FireError::InvalidSettings(format!(
                "voxel size must be positive, got {dx}"
            )));
        }
        Ok(Self {
            voxels: vec![Voxel::default(); len],
            width,
            height,
            depth,
            dx,
            bbox: None,
        })
    }

    #[must_use]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.width, self.height, self.depth)
    }

    #[must_use]
    pub fn dx(&self) -> f32 {
        self.dx
    }

    /// Bounding box from the last [`VoxelGrid::recompute_bbox`].
    #[must_use]
    pub fn bbox(&self) -> Option<Aabb> {
        self.bbox
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.depth + z) * self.width + x
    }

    /// Voxel at an integer position, `None` outside the array.
    #[inline]
    #[must_use]
    pub fn get(&self, pos: IVec3) -> Option<&Voxel> {
        let inside = pos.x >= 0
            && pos.y >= 0
            && pos.z >= 0
            && (pos.x as usize) < self.width
            && (pos.y as usize) < self.height
            && (pos.z as usize) < self.depth;
        inside.then(|| &self.voxels[self.index(pos.x as usize, pos.y as usize, pos.z as usize)])
    }

    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn set(&mut self, x: usize, y: usize, z: usize, voxel: Voxel) {
        assert!(
            x < self.width && y < self.height && z < self.depth,
            "Coordinates out of bounds"
        );
        let idx = self.index(x, y, z);
        self.voxels[idx] = voxel;
    }

    /// Number of non-empty voxels.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.voxels
            .par_iter()
            .filter(|v| v.material != Material::Empty)
            .count()
    }

    /// Rebuild every voxel from the heat volume.
    ///
    /// The outermost layer on each axis stays empty. Hot cells become light voxels
    /// colored through `palette` with `alpha = (v / 255)² / 2`. The row just above the
    /// source is an opaque black diffuse floor, hot or not.
    ///
    /// # Panics
    ///
    /// Panics if the volume dimensions differ from the grid.
    pub fn sync_from_volume(&mut self, volume: &HeatVolume, palette: &Palette) {
        assert!(
            volume.width() == self.width
                && volume.height() == self.height
                && volume.depth() == self.depth,
            "Volume size does not match voxel grid"
        );
        let (w, h, d) = (self.width, self.height, self.depth);
        self.voxels
            .par_chunks_mut(w * d)
            .enumerate()
            .for_each(|(vy, plane)| {
                plane.fill(Voxel::default());
                if vy == 0 || vy + 1 >= h {
                    return;
                }
                let fy = h - 1 - vy;
                let heat = volume.plane(fy);
                let floor = fy + 2 == h;
                for z in 1..d.saturating_sub(1) {
                    for x in 1..w.saturating_sub(1) {
                        let voxel = &mut plane[z * w + x];
                        if floor {
                            *voxel = FLOOR_VOXEL;
                            continue;
                        }
                        let value = heat[z * w + x];
                        if value > 0 {
                            let t = f32::from(value) / 255.0;
                            *voxel = Voxel {
                                material: Material::Light,
                                color: palette.color(value),
                                alpha: t * t / 2.0,
                            };
                        }
                    }
                }
            });
    }

    /// Recompute the box around non-empty voxels, padded by one voxel below and two
    /// above in index space. `None` when the grid is empty.
    pub fn recompute_bbox(&mut self) -> Option<Aabb> {
        self.bbox = self.bounds_where(|voxel| voxel.material != Material::Empty);
        self.bbox
    }

    /// Box around light voxels only, padded like [`VoxelGrid::recompute_bbox`].
    #[must_use]
    pub fn light_bbox(&self) -> Option<Aabb> {
        self.bounds_where(|voxel| voxel.material == Material::Light)
    }

    fn bounds_where(&self, keep: impl Fn(&Voxel) -> bool + Sync) -> Option<Aabb> {
        let (w, d) = (self.width, self.depth);
        let bounds = self
            .voxels
            .par_chunks(w * d)
            .enumerate()
            .filter_map(|(y, plane)| {
                let mut lo = [usize::MAX, y, usize::MAX];
                let mut hi = [0, y, 0];
                let mut any = false;
                for (i, voxel) in plane.iter().enumerate() {
                    if keep(voxel) {
                        let (x, z) = (i % w, i / w);
                        lo[0] = lo[0].min(x);
                        lo[2] = lo[2].min(z);
                        hi[0] = hi[0].max(x);
                        hi[2] = hi[2].max(z);
                        any = true;
                    }
                }
                any.then_some((lo, hi))
            })
            .reduce_with(|(alo, ahi), (blo, bhi)| {
                (
                    [alo[0].min(blo[0]), alo[1].min(blo[1]), alo[2].min(blo[2])],
                    [ahi[0].max(bhi[0]), ahi[1].max(bhi[1]), ahi[2].max(bhi[2])],
                )
            });
        let dx = self.dx;
        bounds.map(|(lo, hi)| Aabb {
            min: Vec3::new(lo[0] as f32 - 1.0, lo[1] as f32 - 1.0, lo[2] as f32 - 1.0) * dx,
            max: Vec3::new(hi[0] as f32 + 2.0, hi[1] as f32 + 2.0, hi[2] as f32 + 2.0) * dx,
        })
    }
}
