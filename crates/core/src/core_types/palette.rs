//! Intensity to color lookup table.

use crate::core_types::MAX_INTENSITY;
use crate::error::{FireError, Result};

/// Number of entries in a palette (one per intensity level).
pub const PALETTE_LEN: usize = MAX_INTENSITY as usize + 1;

/// Ordered table of 256 RGB triples indexed by intensity.
///
/// Palettes are generated outside the core and handed in through `set_palette`;
/// the renderers only read them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<[u8; 3]>,
}

impl Palette {
    /// Build a palette by evaluating `f` for every intensity.
    pub fn from_fn(f: impl Fn(u8) -> [u8; 3]) -> Self {
        Self {
            colors: (0..=MAX_INTENSITY).map(f).collect(),
        }
    }

    /// Build a palette from exactly 256 RGB triples.
    ///
    /// # Errors
    ///
    /// Returns `FireError::PaletteSize` if `colors` does not have 256 entries.
    pub fn from_colors(colors: &[[u8; 3]]) -> Result<Self> {
        if colors.len() != PALETTE_LEN {
            return Err(FireError::PaletteSize(colors.len()));
        }
        Ok(Self {
            colors: colors.to_vec(),
        })
    }

    /// Build a palette from a packed `r, g, b, r, g, b, ...` byte table (768 bytes).
    ///
    /// # Errors
    ///
    /// Returns `FireError::PaletteSize` if `bytes` is not 768 bytes long.
    pub fn from_rgb_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PALETTE_LEN * 3 {
            return Err(FireError::PaletteSize(bytes.len() / 3));
        }
        Ok(Self {
            colors: bytes.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect(),
        })
    }

    /// Linear black to white ramp.
    #[must_use]
    pub fn grayscale() -> Self {
        Self::from_fn(|i| [i, i, i])
    }

    /// Color for an intensity.
    #[inline]
    #[must_use]
    pub fn color(&self, intensity: u8) -> [u8; 3] {
        self.colors[usize::from(intensity)]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[[u8; 3]] {
        &self.colors
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::grayscale()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_colors_requires_256_entries() {
        assert_eq!(
            Palette::from_colors(&[[0, 0, 0]; 10]),
            Err(FireError::PaletteSize(10))
        );
        assert!(Palette::from_colors(&[[1, 2, 3]; 256]).is_ok());
    }

    #[test]
    fn test_from_rgb_bytes() {
        let mut bytes = vec![0u8; 768];
        bytes[765] = 10;
        bytes[766] = 20;
        bytes[767] = 30;
        let palette = Palette::from_rgb_bytes(&bytes).unwrap();
        assert_eq!(palette.color(255), [10, 20, 30]);
        assert!(Palette::from_rgb_bytes(&bytes[..300]).is_err());
    }

    #[test]
    fn test_grayscale_ramp() {
        let palette = Palette::grayscale();
        assert_eq!(palette.color(0), [0, 0, 0]);
        assert_eq!(palette.color(128), [128, 128, 128]);
    }
}
