//! 2D fire simulation: heat field, fixed mask and palette rasterizer.

use crate::config::{FireConfig2D, SpreadParams};
use crate::core_types::{Palette, RgbImage};
use crate::error::{FireError, Result};
use crate::grid::{FixedMask, HeatField};
use crate::render::{render_field, BrushCursor, Overlay};
use crate::solver::{mix_seed, FrameTimer, ProfilerScope};
use crate::tools::{self, Canvas, GridRect};
use tracing::{debug, info};

/// Interactive 2D fire.
///
/// Owns the heat field with its fixed mask and everything needed to draw a frame.
/// The host drives it with [`FireSimulation2D::step`] and
/// [`FireSimulation2D::render_frame`] once per display frame and routes input through
/// the brush methods or [`FireSimulation2D::canvas`].
#[derive(Debug, Clone)]
pub struct FireSimulation2D {
    field: HeatField,
    mask: FixedMask,
    spread: SpreadParams,
    palette: Palette,
    overlay: Overlay,
    seed: u64,
    frame: u64,
    timer: FrameTimer,
}

impl FireSimulation2D {
    /// Create a simulation with its source row lit.
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidDimensions` for a width of zero or a height below 2,
    /// or an error from [`SpreadParams::validate`].
    pub fn new(config: &FireConfig2D) -> Result<Self> {
        config.spread.validate()?;
        let mut field = HeatField::new(config.width, config.height)?;
        let mask = FixedMask::new(config.width, config.height)?;
        field.initialize_source();
        info!(
            "Created 2D fire simulation {}x{} (decay {}, add {})",
            config.width, config.height, config.spread.decay_mult, config.spread.add_mult
        );
        Ok(Self {
            field,
            mask,
            spread: config.spread,
            palette: Palette::default(),
            overlay: Overlay::default(),
            seed: config.seed,
            frame: 0,
            timer: FrameTimer::new(),
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.field.width()
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.field.height()
    }

    #[must_use]
    pub fn field(&self) -> &HeatField {
        &self.field
    }

    #[must_use]
    pub fn mask(&self) -> &FixedMask {
        &self.mask
    }

    /// Number of automaton steps since construction or the last reset.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[must_use]
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    #[must_use]
    pub fn spread(&self) -> SpreadParams {
        self.spread
    }

    /// # Errors
    ///
    /// Returns `FireError::InvalidSettings` for an empty decay or add range.
    pub fn set_spread(&mut self, spread: SpreadParams) -> Result<()> {
        spread.validate()?;
        debug!(
            "Spread set to decay {}, add {}",
            spread.decay_mult, spread.add_mult
        );
        self.spread = spread;
        Ok(())
    }

    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        info!("2D palette replaced");
        self.palette = palette;
    }

    #[must_use]
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn set_highlight_fixed(&mut self, on: bool) {
        self.overlay.highlight_fixed = on;
    }

    /// Show or hide the brush preview.
    pub fn set_cursor(&mut self, cursor: Option<BrushCursor>) {
        self.overlay.cursor = cursor;
    }

    /// Set the source row to `MAX_INTENSITY`.
    pub fn initialize(&mut self) {
        self.field.initialize_source();
    }

    /// Zero the field, source row included, and restart the frame count. The fixed
    /// mask is kept.
    pub fn clear(&mut self) {
        self.field.clear();
        self.frame = 0;
    }

    /// Return to the freshly constructed state: empty mask, lit source, frame 0.
    pub fn reset(&mut self) {
        self.field.clear();
        self.mask.clear();
        self.field.initialize_source();
        self.frame = 0;
        info!("2D simulation reset");
    }

    /// Advance the automaton one frame. `time` drives the flicker noise.
    pub fn step(&mut self, time: f32) {
        let scope = ProfilerScope::new("fire2d step");
        self.field.step(
            Some(&self.mask),
            &self.spread,
            time,
            mix_seed(self.seed, self.frame),
        );
        self.frame += 1;
        self.timer.record_step(scope.elapsed_ms());
    }

    /// Radial heat brush, see [`tools::apply_heat`].
    ///
    /// # Errors
    ///
    /// Returns an error for a zero radius or a non-finite multiplier.
    pub fn apply_heat(&mut self, x: i32, y: i32, radius: u32, multiplier: f32) -> Result<()> {
        tools::apply_heat(&mut self.field, x, y, radius, multiplier)
    }

    /// Mark or unmark cells within `radius` as fixed.
    pub fn set_fixed(&mut self, x: i32, y: i32, radius: u32, state: bool) {
        tools::set_fixed(&mut self.mask, x, y, radius, state);
    }

    /// Mark or unmark a rectangle as fixed. Corners may be given in any order.
    pub fn set_fixed_rect(&mut self, a: (i32, i32), b: (i32, i32), state: bool) {
        tools::set_fixed_rect(&mut self.mask, GridRect::from_corners(a, b), state);
    }

    /// Heat brush stamped along a Bresenham line.
    ///
    /// # Errors
    ///
    /// Same as [`FireSimulation2D::apply_heat`].
    pub fn fire_line(
        &mut self,
        from: (i32, i32),
        to: (i32, i32),
        radius: u32,
        multiplier: f32,
    ) -> Result<()> {
        tools::fire_line(&mut self.field, from, to, radius, multiplier)
    }

    /// Fill the inclusive rectangle with `intensity` (default `MAX_INTENSITY`).
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidRect` if a min bound exceeds its max.
    pub fn fire_rect(
        &mut self,
        x_min: i32,
        x_max: i32,
        y_min: i32,
        y_max: i32,
        intensity: Option<u8>,
    ) -> Result<()> {
        let rect = GridRect::new(x_min, x_max, y_min, y_max)?;
        tools::fire_rect(&mut self.field, rect, intensity);
        Ok(())
    }

    /// Mutable view for [`crate::tools::Toolbox`] dispatch.
    pub fn canvas(&mut self) -> Canvas<'_> {
        Canvas {
            field: &mut self.field,
            mask: &mut self.mask,
        }
    }

    /// Draw the current field with the palette and overlay.
    pub fn render_frame(&mut self) -> RgbImage {
        let scope = ProfilerScope::new("fire2d render");
        let image = render_field(&self.field, &self.mask, &self.palette, &self.overlay);
        self.timer.record_render(scope.elapsed_ms());
        image
    }

    /// Render into a caller-provided bottom-up RGB buffer.
    ///
    /// # Errors
    ///
    /// Returns `FireError::BufferSize` if `out` is not exactly `width * height * 3`
    /// bytes.
    pub fn render_into(&mut self, out: &mut [u8]) -> Result<()> {
        let expected = self.width() * self.height() * 3;
        if out.len() != expected {
            return Err(FireError::BufferSize {
                expected,
                actual: out.len(),
            });
        }
        out.copy_from_slice(self.render_frame().as_bytes());
        Ok(())
    }
}
