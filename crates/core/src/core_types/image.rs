//! 8-bit RGB image buffer produced by the renderers.

/// Packed RGB image, 3 bytes per pixel.
///
/// Rows are stored bottom-up: row 0 is the bottom scanline of the displayed image.
/// The 2D rasterizer therefore writes field row `y` to image row `height - 1 - y`,
/// which puts the fire source (the last field row) at image row 0. Use
/// [`RgbImage::to_top_down`] for formats that expect the top scanline first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl RgbImage {
    /// Black image of the given size.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 3],
        }
    }

    /// Image filled with one color.
    #[must_use]
    pub fn filled(width: usize, height: usize, color: [u8; 3]) -> Self {
        let mut image = Self::new(width, height);
        image.fill(color);
        image
    }

    pub(crate) fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width * height * 3);
        Self {
            width,
            height,
            data,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel at column `x` of bottom-up row `row`.
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn pixel(&self, x: usize, row: usize) -> [u8; 3] {
        assert!(x < self.width && row < self.height, "Coordinates out of bounds");
        let i = (row * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Set pixel at column `x` of bottom-up row `row`.
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set_pixel(&mut self, x: usize, row: usize, color: [u8; 3]) {
        assert!(x < self.width && row < self.height, "Coordinates out of bounds");
        let i = (row * self.width + x) * 3;
        self.data[i..i + 3].copy_from_slice(&color);
    }

    pub fn fill(&mut self, color: [u8; 3]) {
        for px in self.data.chunks_exact_mut(3) {
            px.copy_from_slice(&color);
        }
    }

    /// Raw bytes, bottom-up rows.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Copy of the pixel data with the top scanline first.
    #[must_use]
    pub fn to_top_down(&self) -> Vec<u8> {
        let stride = self.width * 3;
        let mut out = Vec::with_capacity(self.data.len());
        if stride == 0 {
            return out;
        }
        for row in self.data.chunks_exact(stride).rev() {
            out.extend_from_slice(row);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_roundtrip_and_flip() {
        let mut image = RgbImage::new(2, 3);
        image.set_pixel(1, 0, [9, 8, 7]);
        assert_eq!(image.pixel(1, 0), [9, 8, 7]);

        let top_down = image.to_top_down();
        // Bottom row becomes the last scanline
        let last = &top_down[2 * 2 * 3..];
        assert_eq!(&last[3..6], &[9, 8, 7]);
    }

    #[test]
    fn test_filled() {
        let image = RgbImage::filled(4, 4, [1, 2, 3]);
        assert!(image.as_bytes().chunks_exact(3).all(|p| p == [1, 2, 3]));
    }
}
