//! Dense grids owned by the simulations

pub mod fixed_mask;
pub mod heat_field;
pub mod heat_volume;

pub use fixed_mask::FixedMask;
pub use heat_field::HeatField;
pub use heat_volume::HeatVolume;
