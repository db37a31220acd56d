//! 3D gradient noise driving the flame flicker.
//!
//! Classic improved-Perlin structure (quintic fade, 12 edge gradients folded into a
//! 16-entry hash), except the lattice hash uses the permutation polynomial
//! `(34x² + x) mod 289` instead of a shuffled table. The polynomial needs no state,
//! so every worker thread can evaluate the noise without sharing a table.

/// Permutation polynomial modulus.
const PERM_MOD: i64 = 289;

/// Lattice wrap mask (coordinates repeat every 256 cells).
const LATTICE_MASK: i64 = 255;

#[inline]
fn permute(x: i64) -> i64 {
    ((34 * x + 1) * x).rem_euclid(PERM_MOD)
}

/// Quintic smoothstep (6t^5 - 15t^4 + 10t^3).
#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Dot product of a hashed edge gradient with the offset vector.
#[inline]
fn grad(hash: i64, x: f32, y: f32, z: f32) -> f32 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

/// Sample 3D gradient noise, remapped to roughly `[0, 1]`.
///
/// Non-finite input yields the neutral value 0.5.
///
/// # Arguments
///
/// * `x`, `y`, `z` - Sample position in lattice units
#[must_use]
pub fn perlin_noise(x: f32, y: f32, z: f32) -> f32 {
    if !(x.is_finite() && y.is_finite() && z.is_finite()) {
        return 0.5;
    }

    let (fx, fy, fz) = (x.floor(), y.floor(), z.floor());
    let xi = (fx as i64) & LATTICE_MASK;
    let yi = (fy as i64) & LATTICE_MASK;
    let zi = (fz as i64) & LATTICE_MASK;
    let (xf, yf, zf) = (x - fx, y - fy, z - fz);
    let (u, v, w) = (fade(xf), fade(yf), fade(zf));

    let a = permute(xi) + yi;
    let aa = permute(a) + zi;
    let ab = permute(a + 1) + zi;
    let b = permute(xi + 1) + yi;
    let ba = permute(b) + zi;
    let bb = permute(b + 1) + zi;

    let n000 = grad(permute(aa), xf, yf, zf);
    let n100 = grad(permute(ba), xf - 1.0, yf, zf);
    let n010 = grad(permute(ab), xf, yf - 1.0, zf);
    let n110 = grad(permute(bb), xf - 1.0, yf - 1.0, zf);
    let n001 = grad(permute(aa + 1), xf, yf, zf - 1.0);
    let n101 = grad(permute(ba + 1), xf - 1.0, yf, zf - 1.0);
    let n011 = grad(permute(ab + 1), xf, yf - 1.0, zf - 1.0);
    let n111 = grad(permute(bb + 1), xf - 1.0, yf - 1.0, zf - 1.0);

    let y1 = lerp(lerp(n000, n100, u), lerp(n010, n110, u), v);
    let y2 = lerp(lerp(n001, n101, u), lerp(n011, n111, u), v);
    (lerp(y1, y2, w) + 1.0) * 0.5
}
