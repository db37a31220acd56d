//! 2D intensity grid and its per-frame automaton step.

use crate::config::SpreadParams;
use crate::core_types::{clamp_intensity, MAX_INTENSITY};
use crate::error::{FireError, Result};
use crate::grid::FixedMask;
use crate::solver::automaton;
use rayon::prelude::*;

/// 2D heat field of integer intensities in `[0, MAX_INTENSITY]`.
///
/// Stored as a flat `Vec<u8>` in row-major order (y * width + x). Row `height - 1`
/// is the fire source: [`HeatField::initialize_source`] pins it to `MAX_INTENSITY`
/// and [`HeatField::step`] never writes it.
#[derive(Debug, Clone)]
pub struct HeatField {
    cells: Vec<u8>,
    /// Previous-frame snapshot reused across steps
    scratch: Vec<u8>,
    width: usize,
    height: usize,
}

impl HeatField {
    /// Create a zeroed field.
    ///
    /// # Arguments
    ///
    /// * `width` - Grid width in cells (at least 1)
    /// * `height` - Grid height in cells (at least 2: one source row plus one simulated row)
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidDimensions` if an axis is too small or the cell
    /// count overflows.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let invalid = FireError::InvalidDimensions {
            width,
            height,
            depth: 1,
        };
        if width == 0 || height < 2 {
            return Err(invalid);
        }
        let len = width.checked_mul(height).ok_or(invalid)?;
        Ok(Self {
            cells: vec![0; len],
            scratch: vec![0; len],
            width,
            height,
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

    /// Index of the source row.
    #[must_use]
    pub fn source_row(&self) -> usize {
        self.height - 1
    }

    /// Whether signed coordinates fall inside the grid.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Intensity at a cell.
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.cells[y * self.width + x]
    }

    /// Overwrite one cell.
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.cells[y * self.width + x] = value;
    }

    /// Add a signed delta to one cell, clamping into `[0, MAX_INTENSITY]`.
    #[inline]
    pub(crate) fn add_clamped(&mut self, x: usize, y: usize, delta: i32) {
        let i = y * self.width + x;
        self.cells[i] = clamp_intensity(i32::from(self.cells[i]) + delta);
    }

    /// Zero every cell, the source row included.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Pin the source row to `MAX_INTENSITY`.
    pub fn initialize_source(&mut self) {
        let start = self.source_row() * self.width;
        self.cells[start..].fill(MAX_INTENSITY);
    }

    /// One row of intensities.
    #[must_use]
    pub fn row(&self, y: usize) -> &[u8] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }

    /// Advance the automaton one frame.
    ///
    /// Every non-source cell samples a cell 1-3 rows below it in the previous-frame
    /// snapshot, decays it, and writes the result to a noise-displaced column of the
    /// same row. Rows are independent, so they run in parallel; each row draws from
    /// its own random stream derived from `frame_seed`, which makes the step
    /// reproducible for a given seed.
    ///
    /// # Arguments
    ///
    /// * `mask` - Cells to protect from writes (must match the field size)
    /// * `params` - Decay/add-back ranges
    /// * `time` - Animation time driving the flicker noise
    /// * `frame_seed` - Seed for this frame's random streams
    pub fn step(
        &mut self,
        mask: Option<&FixedMask>,
        params: &SpreadParams,
        time: f32,
        frame_seed: u64,
    ) {
        if let Some(mask) = mask {
            assert!(
                mask.width() == self.width && mask.height() == self.height,
                "Fixed mask size does not match heat field"
            );
        }

        let width = self.width;
        let height = self.height;
        self.scratch.copy_from_slice(&self.cells);
        let prev = &self.scratch;

        self.cells[..width * (height - 1)]
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let fixed = mask.map(|m| m.row(y));
                automaton::spread_row(prev, width, height, y, row, fixed, params, time, frame_seed);
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_degenerate_sizes() {
        assert!(HeatField::new(0, 10).is_err());
        assert!(HeatField::new(10, 1).is_err());
        assert!(HeatField::new(usize::MAX, 2).is_err());
        assert!(HeatField::new(1, 2).is_ok());
    }

    #[test]
    fn test_initialize_source_sets_last_row_only() {
        let mut field = HeatField::new(4, 3).unwrap();
        field.initialize_source();
        assert!(field.row(2).iter().all(|&v| v == MAX_INTENSITY));
        assert!(field.row(0).iter().chain(field.row(1)).all(|&v| v == 0));
    }

    #[test]
    fn test_add_clamped_saturates() {
        let mut field = HeatField::new(2, 2).unwrap();
        field.add_clamped(0, 0, 300);
        assert_eq!(field.get(0, 0), MAX_INTENSITY);
        field.add_clamped(0, 0, -1000);
        assert_eq!(field.get(0, 0), 0);
    }

    #[test]
    fn test_step_keeps_source_row() {
        let mut field = HeatField::new(16, 12).unwrap();
        field.initialize_source();
        let params = SpreadParams::default();
        for frame in 0..20 {
            field.step(None, &params, frame as f32 * 0.05, frame);
        }
        assert!(field.row(11).iter().all(|&v| v == MAX_INTENSITY));
    }

    #[test]
    fn test_step_is_reproducible_for_same_seed() {
        let params = SpreadParams::default();
        let mut a = HeatField::new(24, 16).unwrap();
        a.initialize_source();
        let mut b = a.clone();
        for frame in 0..5 {
            a.step(None, &params, 0.1, 42 + frame);
            b.step(None, &params, 0.1, 42 + frame);
        }
        assert_eq!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn test_fire_rises_from_source() {
        let params = SpreadParams::default();
        let mut field = HeatField::new(32, 8).unwrap();
        field.initialize_source();
        field.step(None, &params, 0.0, 7);
        // Row just above the source samples only the source row (offset clamps to it)
        assert!(field.row(6).iter().any(|&v| v > 0));
    }
}
