//! Boolean mask of cells frozen against automaton writes (2D only).

use crate::error::{FireError, Result};

/// Dense boolean grid with the same extent as the 2D heat field.
///
/// A set cell is never overwritten by [`crate::HeatField::step`]; brush tools still
/// paint it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedMask {
    /// Flags in row-major order (y * width + x)
    cells: Vec<bool>,
    width: usize,
    height: usize,
}

impl FixedMask {
    /// Create an all-false mask.
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidDimensions` for a zero-sized axis.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let len = width
            .checked_mul(height)
            .filter(|&len| len > 0)
            .ok_or(FireError::InvalidDimensions {
                width,
                height,
                depth: 1,
            })?;
        Ok(Self {
            cells: vec![false; len],
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

    /// Whether the cell is frozen.
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[inline]
    #[must_use]
    pub fn is_fixed(&self, x: usize, y: usize) -> bool {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.cells[y * self.width + x]
    }

    /// Set or clear one cell.
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, state: bool) {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.cells[y * self.width + x] = state;
    }

    /// Flags of one row.
    #[must_use]
    pub fn row(&self, y: usize) -> &[bool] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    /// Reset every cell to unfixed.
    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    /// Number of frozen cells.
    #[must_use]
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_mask_is_empty() {
        let mask = FixedMask::new(8, 4).unwrap();
        assert_eq!(mask.count(), 0);
        assert!(FixedMask::new(0, 4).is_err());
    }

    #[test]
    fn test_set_and_clear() {
        let mut mask = FixedMask::new(8, 4).unwrap();
        mask.set(3, 2, true);
        assert!(mask.is_fixed(3, 2));
        assert!(mask.row(2)[3]);
        assert_eq!(mask.count(), 1);

        mask.clear();
        assert_eq!(mask.count(), 0);
    }
}
