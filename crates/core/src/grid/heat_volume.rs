//! 3D intensity grid and its per-frame automaton step.

use crate::config::SpreadParams;
use crate::core_types::{clamp_intensity, MAX_INTENSITY};
use crate::error::{FireError, Result};
use crate::solver::automaton;
use rayon::prelude::*;

/// 3D heat field of integer intensities in `[0, MAX_INTENSITY]`.
///
/// Cells are laid out plane by plane along y: index = (y * depth + z) * width + x,
/// so every y-plane is one contiguous chunk. Plane `height - 1` is the fire source.
#[derive(Debug, Clone)]
pub struct HeatVolume {
    cells: Vec<u8>,
    scratch: Vec<u8>,
    width: usize,
    height: usize,
    depth: usize,
}

impl HeatVolume {
    /// Create a zeroed volume.
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidDimensions` if `width` or `depth` is zero, `height`
    /// is below 2, or the cell count overflows.
    pub fn new(width: usize, height: usize, depth: usize) -> Result<Self> {
        let invalid = FireError::InvalidDimensions {
            width,
            height,
            depth,
        };
        if width == 0 || depth == 0 || height < 2 {
            return Err(invalid);
        }
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(depth))
            .ok_or(invalid)?;
        Ok(Self {
            cells: vec![0; len],
            scratch: vec![0; len],
            width,
            height,
            depth,
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn source_plane(&self) -> usize {
        self.height - 1
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && (z as usize) < self.depth
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.depth + z) * self.width + x
    }

    /// Intensity at a cell.
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        assert!(
            x < self.width && y < self.height && z < self.depth,
            "Coordinates out of bounds"
        );
        self.cells[self.index(x, y, z)]
    }

    /// Overwrite one cell.
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: u8) {
        assert!(
            x < self.width && y < self.height && z < self.depth,
            "Coordinates out of bounds"
        );
        let i = self.index(x, y, z);
        self.cells[i] = value;
    }

    #[inline]
    pub(crate) fn add_clamped(&mut self, x: usize, y: usize, z: usize, delta: i32) {
        let i = self.index(x, y, z);
        self.cells[i] = clamp_intensity(i32::from(self.cells[i]) + delta);
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Pin the source plane to `MAX_INTENSITY`.
    pub fn initialize_source(&mut self) {
        let start = self.source_plane() * self.width * self.depth;
        self.cells[start..].fill(MAX_INTENSITY);
    }

    /// One y-plane, z-major then x.
    #[must_use]
    pub fn plane(&self, y: usize) -> &[u8] {
        let plane = self.width * self.depth;
        &self.cells[y * plane..(y + 1) * plane]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }

    /// Advance the automaton one frame.
    ///
    /// Same rule as the 2D field, with the destination displaced along both x and z
    /// inside the cell's own y-plane. Planes run in parallel.
    pub fn step(&mut self, params: &SpreadParams, time: f32, frame_seed: u64) {
        let (width, height, depth) = (self.width, self.height, self.depth);
        let plane = width * depth;
        self.scratch.copy_from_slice(&self.cells);
        let prev = &self.scratch;

        self.cells[..plane * (height - 1)]
            .par_chunks_mut(plane)
            .enumerate()
            .for_each(|(y, out)| {
                automaton::spread_plane(
                    prev,
                    (width, height, depth),
                    y,
                    out,
                    params,
                    time,
                    frame_seed,
                );
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_degenerate_sizes() {
        assert!(HeatVolume::new(4, 1, 4).is_err());
        assert!(HeatVolume::new(0, 4, 4).is_err());
        assert!(HeatVolume::new(4, 4, 0).is_err());
        assert!(HeatVolume::new(2, 2, 2).is_ok());
    }

    #[test]
    fn test_plane_layout() {
        let mut volume = HeatVolume::new(3, 4, 2).unwrap();
        volume.set(2, 1, 1, 9);
        // plane 1, row z=1, column x=2
        assert_eq!(volume.plane(1)[3 + 2], 9);
    }

    #[test]
    fn test_step_keeps_source_plane_and_clamps() {
        let mut volume = HeatVolume::new(8, 8, 8).unwrap();
        volume.initialize_source();
        let params = SpreadParams::default();
        for frame in 0..10 {
            volume.step(&params, frame as f32 * 0.05, frame);
        }
        assert!(volume.plane(7).iter().all(|&v| v == MAX_INTENSITY));
        assert!(volume.plane(6).iter().any(|&v| v > 0));
    }
}
