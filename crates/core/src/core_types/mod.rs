//! Core types shared by the simulation and the renderers

pub mod image;
pub mod palette;
pub mod vec3;

pub use image::RgbImage;
pub use palette::Palette;
pub use vec3::{IVec3, Vec3};

/// Highest intensity a heat cell can hold.
pub const MAX_INTENSITY: u8 = 255;

/// Clamp an intermediate intensity into the valid cell range.
#[inline]
pub(crate) fn clamp_intensity(value: i32) -> u8 {
    value.clamp(0, i32::from(MAX_INTENSITY)) as u8
}
