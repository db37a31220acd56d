//! Palette rasterization of the 2D heat field.
//!
//! Image rows are stored bottom-up like the field itself, so image row `r` shows
//! field row `height - 1 - r` and the source row ends up at the bottom of the picture.

use crate::core_types::{Palette, RgbImage};
use crate::grid::{FixedMask, HeatField};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Color painted over fixed cells while the highlight is on.
pub const HIGHLIGHT_COLOR: [u8; 3] = [0, 255, 255];

/// Grey the brush preview blends toward.
const CURSOR_GREY: u32 = 128;

/// Circular brush preview in field coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrushCursor {
    pub x: i32,
    pub y: i32,
    pub radius: u32,
    /// Blend weight toward grey, 0 (invisible) to 255 (solid).
    pub alpha: u8,
}

/// Extra layers drawn on top of the palette image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Overlay {
    pub highlight_fixed: bool,
    pub cursor: Option<BrushCursor>,
}

/// Render the field through the palette, then draw the overlay.
#[must_use]
pub fn render_field(
    field: &HeatField,
    mask: &FixedMask,
    palette: &Palette,
    overlay: &Overlay,
) -> RgbImage {
    let mut image = RgbImage::new(field.width(), field.height());
    rasterize_field(field, palette, &mut image);
    if overlay.highlight_fixed {
        highlight_fixed(mask, &mut image);
    }
    if let Some(cursor) = overlay.cursor {
        blend_cursor(&mut image, &cursor);
    }
    image
}

/// Palette lookup of every cell.
///
/// # Panics
///
/// Panics if the image and field sizes differ.
pub fn rasterize_field(field: &HeatField, palette: &Palette, image: &mut RgbImage) {
    assert!(
        image.width() == field.width() && image.height() == field.height(),
        "Image size does not match field"
    );
    let width = field.width();
    let height = field.height();
    image
        .as_bytes_mut()
        .par_chunks_mut(width * 3)
        .enumerate()
        .for_each(|(row, out)| {
            let cells = field.row(height - 1 - row);
            for (px, &heat) in out.chunks_exact_mut(3).zip(cells) {
                px.copy_from_slice(&palette.color(heat));
            }
        });
}

/// Paint fixed cells with [`HIGHLIGHT_COLOR`].
pub fn highlight_fixed(mask: &FixedMask, image: &mut RgbImage) {
    let width = mask.width();
    let height = mask.height();
    image
        .as_bytes_mut()
        .par_chunks_mut(width * 3)
        .enumerate()
        .for_each(|(row, out)| {
            let fixed = mask.row(height - 1 - row);
            for (px, &is_fixed) in out.chunks_exact_mut(3).zip(fixed) {
                if is_fixed {
                    px.copy_from_slice(&HIGHLIGHT_COLOR);
                }
            }
        });
}

/// Blend the disk `dx² + dy² <= r²` around the cursor toward grey.
pub fn blend_cursor(image: &mut RgbImage, cursor: &BrushCursor) {
    let r = i64::from(cursor.radius);
    let alpha = u32::from(cursor.alpha);
    let height = image.height() as i64;
    let width = image.width() as i64;
    for dy in -r..=r {
        let y = i64::from(cursor.y) + dy;
        if y < 0 || y >= height {
            continue;
        }
        let row = (height - 1 - y) as usize;
        for dx in -r..=r {
            let x = i64::from(cursor.x) + dx;
            if x < 0 || x >= width || dx * dx + dy * dy > r * r {
                continue;
            }
            let [red, green, blue] = image.pixel(x as usize, row);
            let mix = |c: u8| ((u32::from(c) * (255 - alpha) + CURSOR_GREY * alpha) / 255) as u8;
            image.set_pixel(x as usize, row, [mix(red), mix(green), mix(blue)]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> HeatField {
        let mut field = HeatField::new(4, 3).unwrap();
        field.initialize_source();
        field.set(1, 0, 10);
        field
    }

    #[test]
    fn test_rows_are_flipped_onto_image() {
        let field = field();
        let mask = FixedMask::new(4, 3).unwrap();
        let image = render_field(&field, &mask, &Palette::grayscale(), &Overlay::default());
        // Source row (field y = 2) sits at image row 0
        assert_eq!(image.pixel(0, 0), [255, 255, 255]);
        assert_eq!(image.pixel(1, 2), [10, 10, 10]);
        assert_eq!(image.pixel(0, 2), [0, 0, 0]);
    }

    #[test]
    fn test_highlight_paints_fixed_cells() {
        let field = field();
        let mut mask = FixedMask::new(4, 3).unwrap();
        mask.set(3, 0, true);
        let overlay = Overlay {
            highlight_fixed: true,
            cursor: None,
        };
        let image = render_field(&field, &mask, &Palette::grayscale(), &overlay);
        assert_eq!(image.pixel(3, 2), HIGHLIGHT_COLOR);
        assert_eq!(image.pixel(2, 2), [0, 0, 0]);
    }

    #[test]
    fn test_cursor_blends_disk_toward_grey() {
        let mut image = RgbImage::new(5, 5);
        let cursor = BrushCursor {
            x: 2,
            y: 2,
            radius: 1,
            alpha: 255,
        };
        blend_cursor(&mut image, &cursor);
        assert_eq!(image.pixel(2, 2), [128, 128, 128]);
        assert_eq!(image.pixel(3, 2), [128, 128, 128]);
        // Diagonal neighbour is outside r²
        assert_eq!(image.pixel(3, 3), [0, 0, 0]);
    }

    #[test]
    fn test_cursor_off_image_is_clipped() {
        let mut image = RgbImage::new(3, 3);
        let cursor = BrushCursor {
            x: -1,
            y: 0,
            radius: 1,
            alpha: 100,
        };
        blend_cursor(&mut image, &cursor);
        let touched = (0..3)
            .flat_map(|x| (0..3).map(move |r| (x, r)))
            .filter(|&(x, r)| image.pixel(x, r) != [0, 0, 0])
            .count();
        assert_eq!(touched, 1);
    }
}
