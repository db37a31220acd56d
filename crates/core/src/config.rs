//! Configuration for the fire simulations and the voxel path tracer.
//!
//! Every tuning constant of the pipeline lives here as a named default so callers can
//! override it without touching the kernels. Values marked as visual tuning have no
//! deeper meaning than "this looks right".

use crate::core_types::{Vec3, MAX_INTENSITY};
use crate::error::{FireError, Result};
use serde::{Deserialize, Serialize};

/// Default 2D grid width in cells.
pub const DEFAULT_WIDTH_2D: usize = 1440;
/// Default 2D grid height in cells.
pub const DEFAULT_HEIGHT_2D: usize = 960;
/// Default edge length of the 3D grid in cells.
pub const DEFAULT_EXTENT_3D: usize = 500;

/// Maximum number of bounces per traced path.
pub const MAX_RAY_DEPTH: u32 = 4;
/// Shadow rays travelling further than this are considered unoccluded.
pub const DIS_LIMIT: f32 = 100.0;
/// Default vertical half field-of-view (visual tuning).
pub const DEFAULT_FOV: f32 = 0.23;
/// Default exposure multiplier applied on fetch (visual tuning).
pub const DEFAULT_EXPOSURE: f32 = 3.0;
/// Fraction of a voxel face treated as an edge for darkening (visual tuning).
pub const DEFAULT_VOXEL_EDGES: f32 = 0.06;
/// World size of one voxel.
pub const VOXEL_DX: f32 = 1.0 / 16.0;
/// Default traced image size.
pub const DEFAULT_IMAGE_RES: (usize, usize) = (1280, 720);
/// Default marching-cubes iso-level: half of `MAX_INTENSITY`.
pub const DEFAULT_ISO_LEVEL: f32 = (MAX_INTENSITY / 2) as f32;
/// Default cap on marching-cubes triangles per frame.
pub const DEFAULT_MAX_TRIANGLES: usize = 100_000;

/// Named decay/add-back pairs for the automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpreadPreset {
    /// Steady flame (decay 5, add 4).
    #[default]
    Normal,
    /// Tall flickering fire that detaches into sparks (decay 11, add 10).
    FloatingSparks,
    /// Fire that barely decays and fills most of the grid (decay 5, add 5).
    BigFire,
}

/// Random decay and add-back ranges used by the automaton step.
///
/// Per cell and step the sampled intensity loses a uniform integer in
/// `[1, decay_mult]` and regains a uniform integer in `[0, add_mult)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadParams {
    pub decay_mult: u32,
    pub add_mult: u32,
}

impl SpreadParams {
    /// Create spread parameters, rejecting empty random ranges.
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidSettings` if either multiplier is zero.
    pub fn new(decay_mult: u32, add_mult: u32) -> Result<Self> {
        let params = Self {
            decay_mult,
            add_mult,
        };
        params.validate()?;
        Ok(params)
    }

    /// Parameters for a named preset.
    #[must_use]
    pub fn preset(preset: SpreadPreset) -> Self {
        match preset {
            SpreadPreset::Normal => Self {
                decay_mult: 5,
                add_mult: 4,
            },
            SpreadPreset::FloatingSparks => Self {
                decay_mult: 11,
                add_mult: 10,
            },
            SpreadPreset::BigFire => Self {
                decay_mult: 5,
                add_mult: 5,
            },
        }
    }

    /// Check that both random ranges are non-empty.
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidSettings` if either multiplier is zero.
    pub fn validate(&self) -> Result<()> {
        if self.decay_mult == 0 {
            return Err(FireError::InvalidSettings(
                "decay_mult must be at least 1".to_string(),
            ));
        }
        if self.add_mult == 0 {
            return Err(FireError::InvalidSettings(
                "add_mult must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self::preset(SpreadPreset::Normal)
    }
}

/// Construction parameters for [`crate::FireSimulation2D`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireConfig2D {
    pub width: usize,
    pub height: usize,
    pub spread: SpreadParams,
    /// Seed for the automaton's random streams.
    pub seed: u64,
}

impl Default for FireConfig2D {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH_2D,
            height: DEFAULT_HEIGHT_2D,
            spread: SpreadParams::default(),
            seed: 0,
        }
    }
}

/// How the 3D simulation turns its heat volume into an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RenderPath {
    /// Voxel sync followed by the progressive path tracer.
    #[default]
    VoxelTrace,
    /// Marching-cubes isosurface rasterized through the same camera.
    MarchingCubes,
}

/// Construction parameters for [`crate::FireSimulation3D`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireConfig3D {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub spread: SpreadParams,
    pub seed: u64,
    pub render_path: RenderPath,
    pub tracer: TracerSettings,
    /// Marching-cubes surface threshold in intensity units.
    pub iso_level: f32,
    pub max_triangles: usize,
}

impl Default for FireConfig3D {
    fn default() -> Self {
        Self {
            width: DEFAULT_EXTENT_3D,
            height: DEFAULT_EXTENT_3D,
            depth: DEFAULT_EXTENT_3D,
            spread: SpreadParams::default(),
            seed: 0,
            render_path: RenderPath::default(),
            tracer: TracerSettings::default(),
            iso_level: DEFAULT_ISO_LEVEL,
            max_triangles: DEFAULT_MAX_TRIANGLES,
        }
    }
}

/// Settings for the voxel path tracer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracerSettings {
    pub image_width: usize,
    pub image_height: usize,
    pub max_ray_depth: u32,
    pub exposure: f32,
    pub voxel_dx: f32,
    pub voxel_edges: f32,
    /// Distance past which a shadow ray counts as reaching the light.
    pub dis_limit: f32,
    pub light_direction: Vec3,
    pub light_color: Vec3,
    /// Scale of the per-sample jitter added to the light direction.
    pub light_noise: f32,
    pub background_color: Vec3,
    pub vignette_strength: f32,
    pub vignette_radius: f32,
    /// Number of `accumulate` passes per rendered frame.
    pub samples_per_frame: u32,
}

impl Default for TracerSettings {
    fn default() -> Self {
        Self {
            image_width: DEFAULT_IMAGE_RES.0,
            image_height: DEFAULT_IMAGE_RES.1,
            max_ray_depth: MAX_RAY_DEPTH,
            exposure: DEFAULT_EXPOSURE,
            voxel_dx: VOXEL_DX,
            voxel_edges: DEFAULT_VOXEL_EDGES,
            dis_limit: DIS_LIMIT,
            light_direction: Vec3::new(1.0, 1.0, 1.0).normalize(),
            light_color: Vec3::new(1.0, 1.0, 1.0),
            light_noise: 0.2,
            background_color: Vec3::zeros(),
            vignette_strength: 0.0,
            vignette_radius: 0.0,
            samples_per_frame: 1,
        }
    }
}

impl TracerSettings {
    /// Validate image size, voxel size and light direction.
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidSettings` describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(FireError::InvalidSettings(format!(
                "image size {}x{} must be positive",
                self.image_width, self.image_height
            )));
        }
        if !(self.voxel_dx.is_finite() && self.voxel_dx > 0.0) {
            return Err(FireError::InvalidSettings(format!(
                "voxel_dx must be finite and positive, got {}",
                self.voxel_dx
            )));
        }
        if !self.exposure.is_finite() || self.exposure < 0.0 {
            return Err(FireError::InvalidSettings(format!(
                "exposure must be finite and non-negative, got {}",
                self.exposure
            )));
        }
        if !(0.0..0.5).contains(&self.voxel_edges) {
            return Err(FireError::InvalidSettings(format!(
                "voxel_edges must be in [0, 0.5), got {}",
                self.voxel_edges
            )));
        }
        let len = self.light_direction.norm();
        if !len.is_finite() || len == 0.0 {
            return Err(FireError::InvalidSettings(
                "light_direction must be a non-zero vector".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(SpreadParams::default(), SpreadParams::preset(SpreadPreset::Normal));
        let sparks = SpreadParams::preset(SpreadPreset::FloatingSparks);
        assert_eq!((sparks.decay_mult, sparks.add_mult), (11, 10));
        let big = SpreadParams::preset(SpreadPreset::BigFire);
        assert_eq!((big.decay_mult, big.add_mult), (5, 5));
    }

    #[test]
    fn test_spread_params_reject_empty_ranges() {
        assert!(SpreadParams::new(0, 4).is_err());
        assert!(SpreadParams::new(5, 0).is_err());
        assert!(SpreadParams::new(1, 1).is_ok());
    }

    #[test]
    fn test_default_dimensions() {
        let cfg = FireConfig2D::default();
        assert_eq!((cfg.width, cfg.height), (1440, 960));
        let cfg = FireConfig3D::default();
        assert_eq!((cfg.width, cfg.height, cfg.depth), (500, 500, 500));
    }

    #[test]
    fn test_default_iso_level_is_half_intensity() {
        assert_eq!(FireConfig3D::default().iso_level, 127.0);
        assert_eq!(DEFAULT_ISO_LEVEL, crate::solver::default_iso_level());
    }

    #[test]
    fn test_tracer_settings_validation() {
        assert!(TracerSettings::default().validate().is_ok());

        let mut settings = TracerSettings::default();
        settings.image_width = 0;
        assert!(settings.validate().is_err());

        let mut settings = TracerSettings::default();
        settings.light_direction = Vec3::zeros();
        assert!(settings.validate().is_err());
    }
}
