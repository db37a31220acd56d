//! Brush primitives: radial heat, fixed-mask painting, lines and rectangles.
//!
//! Parameter-domain problems (zero heat radius, non-finite multiplier, inverted
//! rectangle) are rejected. Cells outside the grid are clipped silently.

use crate::core_types::MAX_INTENSITY;
use crate::error::{FireError, Result};
use crate::grid::{FixedMask, HeatField, HeatVolume};
use crate::tools::BresenhamLine;

/// Inclusive 2D cell rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRect {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl GridRect {
    /// # Errors
    ///
    /// Returns `FireError::InvalidRect` if `x_min > x_max` or `y_min > y_max`.
    pub fn new(x_min: i32, x_max: i32, y_min: i32, y_max: i32) -> Result<Self> {
        if x_min > x_max || y_min > y_max {
            return Err(FireError::InvalidRect {
                min: (x_min, y_min),
                max: (x_max, y_max),
            });
        }
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    /// Rectangle spanned by two opposite corners in any order.
    #[must_use]
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        Self {
            x_min: a.0.min(b.0),
            x_max: a.0.max(b.0),
            y_min: a.1.min(b.1),
            y_max: a.1.max(b.1),
        }
    }

    /// Intersection with a `width` x `height` grid as inclusive index ranges.
    fn clip(&self, width: usize, height: usize) -> Option<((usize, usize), (usize, usize))> {
        let x0 = i64::from(self.x_min).max(0);
        let x1 = i64::from(self.x_max).min(width as i64 - 1);
        let y0 = i64::from(self.y_min).max(0);
        let y1 = i64::from(self.y_max).min(height as i64 - 1);
        if x0 > x1 || y0 > y1 {
            return None;
        }
        Some(((x0 as usize, x1 as usize), (y0 as usize, y1 as usize)))
    }
}

/// Inclusive 3D cell box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBox {
    pub min: [i32; 3],
    pub max: [i32; 3],
}

impl GridBox {
    /// # Errors
    ///
    /// Returns `FireError::InvalidRect` if `min` exceeds `max` on any axis.
    pub fn new(min: [i32; 3], max: [i32; 3]) -> Result<Self> {
        if min.iter().zip(&max).any(|(lo, hi)| lo > hi) {
            return Err(FireError::InvalidRect {
                min: (min[0], min[1]),
                max: (max[0], max[1]),
            });
        }
        Ok(Self { min, max })
    }
}

/// Heat added at distance `dist` from a brush of `radius` and `multiplier`.
///
/// Linear falloff in distance, quadratic in the multiplier with its sign kept, so a
/// multiplier of 0.5 adds a quarter of the full-strength heat and a negative one
/// erases. The result is truncated toward zero.
#[inline]
#[must_use]
pub fn heat_delta(dist: f32, radius: f32, multiplier: f32) -> i32 {
    (f32::from(MAX_INTENSITY) * (1.0 - dist / radius) * multiplier * multiplier.abs()) as i32
}

fn validate_brush(radius: u32, multiplier: f32) -> Result<()> {
    if radius == 0 {
        return Err(FireError::InvalidRadius(radius));
    }
    if !multiplier.is_finite() {
        return Err(FireError::InvalidMultiplier(multiplier));
    }
    Ok(())
}

/// Inclusive index range `[center - radius, center + radius]` clipped to `[0, extent)`.
fn clip_axis(center: i32, radius: u32, extent: usize) -> Option<(usize, usize)> {
    let lo = (i64::from(center) - i64::from(radius)).max(0);
    let hi = (i64::from(center) + i64::from(radius)).min(extent as i64 - 1);
    (lo <= hi).then(|| (lo as usize, hi as usize))
}

/// Add radial heat around `(cx, cy)`.
///
/// Every cell within Euclidean `radius` receives [`heat_delta`], clamped into
/// `[0, MAX_INTENSITY]`. The center may lie outside the grid.
///
/// # Errors
///
/// Returns `FireError::InvalidRadius` for a zero radius and
/// `FireError::InvalidMultiplier` for a non-finite multiplier.
pub fn apply_heat(
    field: &mut HeatField,
    cx: i32,
    cy: i32,
    radius: u32,
    multiplier: f32,
) -> Result<()> {
    validate_brush(radius, multiplier)?;
    let (Some((x0, x1)), Some((y0, y1))) = (
        clip_axis(cx, radius, field.width()),
        clip_axis(cy, radius, field.height()),
    ) else {
        return Ok(());
    };

    let r = radius as f32;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = (x as i64 - i64::from(cx)) as f32;
            let dy = (y as i64 - i64::from(cy)) as f32;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist <= r {
                field.add_clamped(x, y, heat_delta(dist, r, multiplier));
            }
        }
    }
    Ok(())
}

/// 3D counterpart of [`apply_heat`], acting on a sphere.
///
/// # Errors
///
/// Same as [`apply_heat`].
pub fn apply_heat_3d(
    volume: &mut HeatVolume,
    center: [i32; 3],
    radius: u32,
    multiplier: f32,
) -> Result<()> {
    validate_brush(radius, multiplier)?;
    let [cx, cy, cz] = center;
    let (Some((x0, x1)), Some((y0, y1)), Some((z0, z1))) = (
        clip_axis(cx, radius, volume.width()),
        clip_axis(cy, radius, volume.height()),
        clip_axis(cz, radius, volume.depth()),
    ) else {
        return Ok(());
    };

    let r = radius as f32;
    for y in y0..=y1 {
        for z in z0..=z1 {
            for x in x0..=x1 {
                let dx = (x as i64 - i64::from(cx)) as f32;
                let dy = (y as i64 - i64::from(cy)) as f32;
                let dz = (z as i64 - i64::from(cz)) as f32;
                let dist = (dx * dx + dy * dy + dz * dz).sqrt();
                if dist <= r {
                    volume.add_clamped(x, y, z, heat_delta(dist, r, multiplier));
                }
            }
        }
    }
    Ok(())
}

/// Set the fixed flag of every cell within Euclidean `radius` of `(cx, cy)`.
///
/// A zero radius touches only the center cell.
pub fn set_fixed(mask: &mut FixedMask, cx: i32, cy: i32, radius: u32, state: bool) {
    let (Some((x0, x1)), Some((y0, y1))) = (
        clip_axis(cx, radius, mask.width()),
        clip_axis(cy, radius, mask.height()),
    ) else {
        return;
    };

    let r2 = i64::from(radius) * i64::from(radius);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as i64 - i64::from(cx);
            let dy = y as i64 - i64::from(cy);
            if dx * dx + dy * dy <= r2 {
                mask.set(x, y, state);
            }
        }
    }
}

/// Set the fixed flag of every cell in `rect`.
pub fn set_fixed_rect(mask: &mut FixedMask, rect: GridRect, state: bool) {
    if let Some(((x0, x1), (y0, y1))) = rect.clip(mask.width(), mask.height()) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                mask.set(x, y, state);
            }
        }
    }
}

/// Apply [`apply_heat`] at every point of the Bresenham line from `from` to `to`.
///
/// # Errors
///
/// Same as [`apply_heat`]; nothing is painted when the brush is invalid.
pub fn fire_line(
    field: &mut HeatField,
    from: (i32, i32),
    to: (i32, i32),
    radius: u32,
    multiplier: f32,
) -> Result<()> {
    validate_brush(radius, multiplier)?;
    for (x, y) in BresenhamLine::new(from, to) {
        apply_heat(field, x, y, radius, multiplier)?;
    }
    Ok(())
}

/// Overwrite every cell of `rect` with `intensity` (default `MAX_INTENSITY`).
pub fn fire_rect(field: &mut HeatField, rect: GridRect, intensity: Option<u8>) {
    let value = intensity.unwrap_or(MAX_INTENSITY);
    if let Some(((x0, x1), (y0, y1))) = rect.clip(field.width(), field.height()) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                field.set(x, y, value);
            }
        }
    }
}

/// Fill a 3D box by stamping [`apply_heat_3d`] on a lattice with spacing
/// `max(radius, 1)`, the box's max corner always included.
///
/// # Errors
///
/// Same as [`apply_heat_3d`].
pub fn fire_box(
    volume: &mut HeatVolume,
    bounds: GridBox,
    radius: u32,
    multiplier: f32,
) -> Result<()> {
    validate_brush(radius, multiplier)?;
    let step = radius.max(1) as usize;
    let axis = |a: usize| -> Vec<i32> {
        let mut points: Vec<i32> = (bounds.min[a]..=bounds.max[a]).step_by(step).collect();
        if points.last() != Some(&bounds.max[a]) {
            points.push(bounds.max[a]);
        }
        points
    };
    let (xs, ys, zs) = (axis(0), axis(1), axis(2));
    for &y in &ys {
        for &z in &zs {
            for &x in &xs {
                apply_heat_3d(volume, [x, y, z], radius, multiplier)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> HeatField {
        HeatField::new(16, 12).unwrap()
    }

    #[test]
    fn test_heat_delta_quadratic_in_multiplier() {
        assert_eq!(heat_delta(0.0, 4.0, 1.0), 255);
        assert_eq!(heat_delta(0.0, 4.0, 0.5), 63);
        assert_eq!(heat_delta(0.0, 4.0, -1.0), -255);
        assert_eq!(heat_delta(0.0, 4.0, 0.0), 0);
        assert_eq!(heat_delta(4.0, 4.0, 1.0), 0);
    }

    #[test]
    fn test_apply_heat_center_and_falloff() {
        let mut f = field();
        apply_heat(&mut f, 8, 6, 4, 1.0).unwrap();
        assert_eq!(f.get(8, 6), 255);
        // dist 2 of radius 4: 255 * 0.5
        assert_eq!(f.get(10, 6), 127);
        assert_eq!(f.get(13, 6), 0);
    }

    #[test]
    fn test_apply_heat_negative_erases() {
        let mut f = field();
        apply_heat(&mut f, 8, 6, 3, 1.0).unwrap();
        apply_heat(&mut f, 8, 6, 3, -1.0).unwrap();
        assert!(f.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_apply_heat_rejects_bad_parameters() {
        let mut f = field();
        assert_eq!(
            apply_heat(&mut f, 1, 1, 0, 1.0),
            Err(FireError::InvalidRadius(0))
        );
        assert!(matches!(
            apply_heat(&mut f, 1, 1, 2, f32::NAN),
            Err(FireError::InvalidMultiplier(_))
        ));
    }

    #[test]
    fn test_apply_heat_off_grid_is_clipped() {
        let mut f = field();
        apply_heat(&mut f, -2, -2, 3, 1.0).unwrap();
        assert!(f.get(0, 0) > 0);
        apply_heat(&mut f, 500, 500, 3, 1.0).unwrap();
    }

    #[test]
    fn test_set_fixed_circle() {
        let mut mask = FixedMask::new(16, 12).unwrap();
        set_fixed(&mut mask, 5, 5, 2, true);
        assert!(mask.is_fixed(5, 5));
        assert!(mask.is_fixed(7, 5));
        assert!(!mask.is_fixed(7, 7));
        // 13 cells within a radius-2 disc
        assert_eq!(mask.count(), 13);

        set_fixed(&mut mask, 5, 5, 0, false);
        assert!(!mask.is_fixed(5, 5));
        assert_eq!(mask.count(), 12);
    }

    #[test]
    fn test_fire_line_touches_only_line_cells() {
        let mut f = field();
        fire_line(&mut f, (0, 0), (5, 0), 1, 1.0).unwrap();
        for x in 0..16 {
            for y in 0..12 {
                let expected = if y == 0 && x <= 5 { 255 } else { 0 };
                assert_eq!(f.get(x, y), expected, "cell ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_fire_rect_sets_max_and_clips() {
        let mut f = field();
        fire_rect(&mut f, GridRect::new(14, 20, 10, 20).unwrap(), None);
        assert_eq!(f.get(15, 11), MAX_INTENSITY);
        assert_eq!(f.get(13, 11), 0);

        fire_rect(&mut f, GridRect::from_corners((3, 4), (1, 2)), Some(40));
        assert_eq!(f.get(1, 2), 40);
        assert_eq!(f.get(3, 4), 40);
        assert!(GridRect::new(3, 1, 0, 0).is_err());
    }

    #[test]
    fn test_set_fixed_rect_and_erase() {
        let mut mask = FixedMask::new(8, 8).unwrap();
        set_fixed_rect(&mut mask, GridRect::from_corners((1, 1), (3, 2)), true);
        assert_eq!(mask.count(), 6);
        set_fixed_rect(&mut mask, GridRect::from_corners((1, 1), (1, 2)), false);
        assert_eq!(mask.count(), 4);
    }

    #[test]
    fn test_apply_heat_3d_sphere() {
        let mut volume = HeatVolume::new(9, 9, 9).unwrap();
        apply_heat_3d(&mut volume, [4, 4, 4], 2, 1.0).unwrap();
        assert_eq!(volume.get(4, 4, 4), 255);
        assert_eq!(volume.get(4, 4, 6), 0);
        assert!(volume.get(4, 5, 4) > 0);
        assert_eq!(volume.get(6, 6, 6), 0);
    }

    #[test]
    fn test_fire_box_covers_corners() {
        let mut volume = HeatVolume::new(12, 12, 12).unwrap();
        let bounds = GridBox::new([2, 2, 2], [7, 7, 7]).unwrap();
        fire_box(&mut volume, bounds, 3, 1.0).unwrap();
        assert_eq!(volume.get(2, 2, 2), 255);
        assert_eq!(volume.get(7, 7, 7), 255);
        assert_eq!(volume.get(11, 11, 11), 0);
        assert!(GridBox::new([3, 0, 0], [1, 1, 1]).is_err());
    }
}
