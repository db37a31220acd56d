//! Per-row (2D) and per-plane (3D) kernels of the fire automaton.
//!
//! Each kernel reads only from the previous-frame snapshot and writes only inside
//! its own output row or plane, so the callers can hand disjoint chunks to rayon.

use crate::config::SpreadParams;
use crate::core_types::clamp_intensity;
use crate::solver::noise::perlin_noise;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Spatial frequency of the flicker noise.
pub const NOISE_SCALE: f32 = 0.05;

/// Largest sideways displacement in cells.
pub const MAX_SHIFT: i32 = 2;

/// Rows a cell may sample below itself (1 to this value).
pub const MAX_SAMPLE_OFFSET: usize = 3;

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Combine two values into a well-mixed seed.
#[inline]
#[must_use]
pub fn mix_seed(a: u64, b: u64) -> u64 {
    splitmix64(a ^ splitmix64(b))
}

/// Map a noise sample in `[0, 1]` to a displacement in `[-2, 2]`.
#[inline]
#[must_use]
pub fn flicker_offset(noise: f32) -> i32 {
    ((noise * 5.0) as i32 - MAX_SHIFT).clamp(-MAX_SHIFT, MAX_SHIFT)
}

#[inline]
fn displace(coord: usize, shift: i32, extent: usize) -> usize {
    (coord as i64 + i64::from(shift)).clamp(0, extent as i64 - 1) as usize
}

/// Random draws for one cell: sample offset, decay, add-back.
#[inline]
fn draw(rng: &mut SmallRng, params: &SpreadParams) -> (usize, i32, i32) {
    let offset = rng.random_range(1..=MAX_SAMPLE_OFFSET);
    let decay = rng.random_range(1..=params.decay_mult.max(1)) as i32;
    let add = rng.random_range(0..params.add_mult.max(1)) as i32;
    (offset, decay, add)
}

/// Update one row `y` of a 2D field.
///
/// # Arguments
///
/// * `prev` - Previous-frame snapshot of the whole field
/// * `out` - Output row `y`, pre-filled with the previous values
/// * `fixed` - Fixed-mask flags of row `y`; flagged destinations are skipped
pub(crate) fn spread_row(
    prev: &[u8],
    width: usize,
    height: usize,
    y: usize,
    out: &mut [u8],
    fixed: Option<&[bool]>,
    params: &SpreadParams,
    time: f32,
    frame_seed: u64,
) {
    let mut rng = SmallRng::seed_from_u64(mix_seed(frame_seed, y as u64));
    let ny = y as f32 * NOISE_SCALE + time;
    let nz = time * 0.5;

    for x in 0..width {
        let (offset, decay, add) = draw(&mut rng, params);
        let sample_y = (y + offset).min(height - 1);
        let below = i32::from(prev[sample_y * width + x]);

        let noise = perlin_noise(x as f32 * NOISE_SCALE + time, ny, nz);
        let dst_x = displace(x, flicker_offset(noise), width);

        if fixed.is_some_and(|f| f[dst_x]) {
            continue;
        }
        out[dst_x] = clamp_intensity(below - decay + add);
    }
}

/// Update one y-plane of a 3D volume.
///
/// The x and z displacements come from two decorrelated noise lookups (the z lookup
/// rotates the coordinate order).
pub(crate) fn spread_plane(
    prev: &[u8],
    (width, height, depth): (usize, usize, usize),
    y: usize,
    out: &mut [u8],
    params: &SpreadParams,
    time: f32,
    frame_seed: u64,
) {
    let plane = width * depth;
    let mut rng = SmallRng::seed_from_u64(mix_seed(frame_seed, y as u64));
    let ny = y as f32 * NOISE_SCALE + time;

    for z in 0..depth {
        let nz = z as f32 * NOISE_SCALE + time;
        for x in 0..width {
            let (offset, decay, add) = draw(&mut rng, params);
            let sample_y = (y + offset).min(height - 1);
            let below = i32::from(prev[sample_y * plane + z * width + x]);

            let nx = x as f32 * NOISE_SCALE + time;
            let dst_x = displace(x, flicker_offset(perlin_noise(nx, ny, nz)), width);
            let dst_z = displace(z, flicker_offset(perlin_noise(nz, nx, ny)), depth);

            out[dst_z * width + dst_x] = clamp_intensity(below - decay + add);
        }
    }
}
