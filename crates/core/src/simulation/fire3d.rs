//! 3D fire simulation: heat volume plus the voxel tracer and marching-cubes views.
//!
//! Tool coordinates are volume coordinates, with `y = height - 1` on the source plane.
//! World space flips y so flames rise along +y; see [`crate::render::voxel`].

use crate::config::{FireConfig3D, RenderPath, SpreadParams, TracerSettings, DEFAULT_FOV};
use crate::core_types::{Palette, RgbImage, Vec3, MAX_INTENSITY};
use crate::error::{FireError, Result};
use crate::grid::HeatVolume;
use crate::render::{rasterize_mesh, Aabb, Camera, OrbitCamera, PathTracer, VoxelGrid};
use crate::solver::{extract_isosurface, mix_seed, FrameTimer, ProfilerScope};
use crate::tools::{self, GridBox};
use tracing::{debug, info, warn};

/// Interactive 3D fire.
#[derive(Debug, Clone)]
pub struct FireSimulation3D {
    volume: HeatVolume,
    spread: SpreadParams,
    palette: Palette,
    seed: u64,
    frame: u64,
    voxels: VoxelGrid,
    tracer: PathTracer,
    render_path: RenderPath,
    iso_level: f32,
    max_triangles: usize,
    /// Triangles kept and dropped by the last marching-cubes frame
    mesh_stats: (usize, usize),
    timer: FrameTimer,
}

impl FireSimulation3D {
    /// Create a simulation with its source plane lit and the camera framing the
    /// whole volume.
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidDimensions` for degenerate sizes,
    /// `FireError::InvalidSettings` for bad tracer settings or an iso-level outside
    /// `[0, MAX_INTENSITY]`.
    pub fn new(config: &FireConfig3D) -> Result<Self> {
        config.spread.validate()?;
        if !(0.0..=f32::from(MAX_INTENSITY)).contains(&config.iso_level) {
            return Err(FireError::InvalidSettings(format!(
                "iso_level must be in [0, {MAX_INTENSITY}], got {}",
                config.iso_level
            )));
        }
        let mut volume = HeatVolume::new(config.width, config.height, config.depth)?;
        volume.initialize_source();
        let voxels = VoxelGrid::new(
            config.width,
            config.height,
            config.depth,
            config.tracer.voxel_dx,
        )?;
        let camera = Self::home_orbit(&voxels).camera(DEFAULT_FOV)?;
        let tracer = PathTracer::new(config.tracer.clone(), camera, config.seed)?;

        info!(
            "Created 3D fire simulation {}x{}x{} ({:?}, image {}x{})",
            config.width,
            config.height,
            config.depth,
            config.render_path,
            config.tracer.image_width,
            config.tracer.image_height
        );
        Ok(Self {
            volume,
            spread: config.spread,
            palette: Palette::default(),
            seed: config.seed,
            frame: 0,
            voxels,
            tracer,
            render_path: config.render_path,
            iso_level: config.iso_level,
            max_triangles: config.max_triangles,
            mesh_stats: (0, 0),
            timer: FrameTimer::new(),
        })
    }

    /// Orbit framing the full volume in world space.
    fn home_orbit(voxels: &VoxelGrid) -> OrbitCamera {
        let (w, h, d) = voxels.dims();
        OrbitCamera::framing(&Aabb {
            min: Vec3::zeros(),
            max: Vec3::new(w as f32, h as f32, d as f32) * voxels.dx(),
        })
    }

    #[must_use]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.volume.width(), self.volume.height(), self.volume.depth())
    }

    #[must_use]
    pub fn volume(&self) -> &HeatVolume {
        &self.volume
    }

    #[must_use]
    pub fn voxels(&self) -> &VoxelGrid {
        &self.voxels
    }

    #[must_use]
    pub fn tracer(&self) -> &PathTracer {
        &self.tracer
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        self.tracer.camera()
    }

    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[must_use]
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    #[must_use]
    pub fn render_path(&self) -> RenderPath {
        self.render_path
    }

    pub fn set_render_path(&mut self, path: RenderPath) {
        info!("Render path set to {path:?}");
        self.render_path = path;
    }

    /// Triangles kept and dropped by the last marching-cubes frame.
    #[must_use]
    pub fn mesh_stats(&self) -> (usize, usize) {
        self.mesh_stats
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

    pub fn set_palette(&mut self, palette: Palette) {
        info!("3D palette replaced");
        self.palette = palette;
    }

    /// Replace the tracer settings. The voxel size is fixed at construction.
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidSettings` if validation fails or `voxel_dx` differs
    /// from the grid's.
    pub fn set_tracer_settings(&mut self, settings: TracerSettings) -> Result<()> {
        if settings.voxel_dx != self.voxels.dx() {
            return Err(FireError::InvalidSettings(
                "voxel_dx cannot change after construction".to_string(),
            ));
        }
        self.tracer.set_settings(settings)
    }

    /// Point the camera. Invalid input leaves the current camera in place.
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidCamera` for a bad fov or degenerate view.
    pub fn set_camera(&mut self, position: Vec3, look_at: Vec3, up: Vec3, fov: f32) -> Result<()> {
        self.tracer
            .set_camera(Camera::new(position, look_at, up, fov)?)
    }

    /// Place the camera from orbit controls, keeping the current fov.
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidCamera` for a degenerate orbit.
    pub fn set_orbit(&mut self, orbit: &OrbitCamera) -> Result<()> {
        let camera = orbit.camera(self.tracer.camera().fov)?;
        self.tracer.set_camera(camera)
    }

    /// Aim the camera at the burning region.
    ///
    /// # Returns
    ///
    /// The orbit now in use, or `None` (camera unchanged) when nothing is burning
    pub fn frame_fire(&mut self) -> Option<OrbitCamera> {
        self.sync_scene();
        let bbox = self.voxels.light_bbox()?;
        let orbit = OrbitCamera::framing(&bbox);
        match self.set_orbit(&orbit) {
            Ok(()) => Some(orbit),
            Err(e) => {
                warn!("Could not frame fire: {e}");
                None
            }
        }
    }

    /// Set the source plane to `MAX_INTENSITY`.
    pub fn initialize(&mut self) {
        self.volume.initialize_source();
    }

    /// Zero the volume, source plane included, and restart the frame count.
    pub fn clear(&mut self) {
        self.volume.clear();
        self.frame = 0;
    }

    /// Fresh state: lit source, frame 0, camera back to the home orbit.
    pub fn reset(&mut self) {
        self.volume.clear();
        self.volume.initialize_source();
        self.frame = 0;
        let home = Self::home_orbit(&self.voxels);
        if let Err(e) = self.set_orbit(&home) {
            warn!("Could not restore home camera: {e}");
        }
        info!("3D simulation reset");
    }

    /// Advance the automaton one frame.
    pub fn step(&mut self, time: f32) {
        let scope = ProfilerScope::new("fire3d step");
        self.volume
            .step(&self.spread, time, mix_seed(self.seed, self.frame));
        self.frame += 1;
        self.timer.record_step(scope.elapsed_ms());
    }

    /// Spherical heat brush, see [`tools::apply_heat_3d`].
    ///
    /// # Errors
    ///
    /// Returns an error for a zero radius or a non-finite multiplier.
    pub fn apply_heat(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        radius: u32,
        multiplier: f32,
    ) -> Result<()> {
        tools::apply_heat_3d(&mut self.volume, [x, y, z], radius, multiplier)
    }

    /// Heat brush stamped over an inclusive box, see [`tools::fire_box`].
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidRect` for an inverted box or the brush errors of
    /// [`FireSimulation3D::apply_heat`].
    pub fn fire_box(
        &mut self,
        min: [i32; 3],
        max: [i32; 3],
        radius: u32,
        multiplier: f32,
    ) -> Result<()> {
        tools::fire_box(&mut self.volume, GridBox::new(min, max)?, radius, multiplier)
    }

    /// Mirror the volume into the voxel grid and refresh its bounding box.
    pub fn sync_scene(&mut self) -> Option<Aabb> {
        let _scope = ProfilerScope::new("voxel sync");
        self.voxels.sync_from_volume(&self.volume, &self.palette);
        let bbox = self.voxels.recompute_bbox();
        debug!("Voxel bounding box: {bbox:?}");
        bbox
    }

    /// Render the current state through the active render path.
    pub fn render_frame(&mut self) -> RgbImage {
        let scope = ProfilerScope::new("fire3d render");
        let image = match self.render_path {
            RenderPath::VoxelTrace => self.trace_frame(),
            RenderPath::MarchingCubes => self.mesh_frame(),
        };
        self.timer.record_render(scope.elapsed_ms());
        image
    }

    /// Add one more sample to the last traced frame without resyncing the scene.
    pub fn refine(&mut self) -> RgbImage {
        self.tracer.accumulate(&self.voxels);
        self.tracer.fetch_image()
    }

    fn trace_frame(&mut self) -> RgbImage {
        if self.sync_scene().is_none() {
            warn!("Voxel scene is empty, rendering background only");
        }
        self.tracer.set_seed(mix_seed(self.seed, self.frame));
        self.tracer.reset_framebuffer();
        for _ in 0..self.tracer.settings().samples_per_frame.max(1) {
            self.tracer.accumulate(&self.voxels);
        }
        self.tracer.fetch_image()
    }

    fn mesh_frame(&mut self) -> RgbImage {
        let mesh = extract_isosurface(
            &self.volume,
            &self.palette,
            self.iso_level,
            self.max_triangles,
        );
        self.mesh_stats = (mesh.triangle_count(), mesh.dropped);

        let settings = self.tracer.settings();
        let background = settings
            .background_color
            .map(|c| (c.clamp(0.0, 1.0) * 255.0) as u8);
        let top = (self.volume.height() - 1) as f32;
        let dx = self.voxels.dx();
        rasterize_mesh(
            &mesh,
            move |p: Vec3| Vec3::new(p.x, top - p.y, p.z) * dx,
            self.tracer.camera(),
            settings.image_width,
            settings.image_height,
            [background.x, background.y, background.z],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FireConfig3D {
        FireConfig3D {
            width: 12,
            height: 12,
            depth: 12,
            seed: 3,
            tracer: TracerSettings {
                image_width: 32,
                image_height: 24,
                ..TracerSettings::default()
            },
            ..FireConfig3D::default()
        }
    }

    #[test]
    fn test_new_lights_source_plane() {
        let sim = FireSimulation3D::new(&config()).unwrap();
        assert!(sim.volume().plane(11).iter().all(|&v| v == MAX_INTENSITY));
        assert!(sim.volume().plane(0).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_rejects_bad_iso_level() {
        let cfg = FireConfig3D {
            iso_level: 300.0,
            ..config()
        };
        assert!(matches!(
            FireSimulation3D::new(&cfg),
            Err(FireError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_traced_fire_is_visible() {
        let mut sim = FireSimulation3D::new(&config()).unwrap();
        for i in 0..4 {
            sim.step(i as f32 * 0.05);
        }
        let image = sim.render_frame();
        assert_eq!((image.width(), image.height()), (32, 24));
        assert!(image.as_bytes().iter().any(|&b| b > 0));
        assert_eq!(sim.tracer().samples(), 1);
    }

    #[test]
    fn test_same_seed_same_frame() {
        let mut a = FireSimulation3D::new(&config()).unwrap();
        let mut b = FireSimulation3D::new(&config()).unwrap();
        for i in 0..3 {
            a.step(i as f32 * 0.05);
            b.step(i as f32 * 0.05);
        }
        assert_eq!(a.render_frame(), b.render_frame());
    }

    #[test]
    fn test_tracer_seed_follows_frame() {
        let mut sim = FireSimulation3D::new(&config()).unwrap();
        sim.render_frame();
        assert_eq!(sim.tracer().seed(), mix_seed(3, 0));
        let first = sim.tracer().seed();
        sim.step(0.0);
        sim.render_frame();
        assert_eq!(sim.tracer().seed(), mix_seed(3, 1));
        assert_ne!(sim.tracer().seed(), first);
    }

    #[test]
    fn test_cleared_scene_keeps_floor() {
        let mut sim = FireSimulation3D::new(&config()).unwrap();
        sim.clear();
        assert!(sim.sync_scene().is_some());
        assert!(sim.voxels().light_bbox().is_none());
        assert_eq!(sim.voxels().occupied_count(), 10 * 10);
    }

    #[test]
    fn test_marching_cubes_path() {
        let mut sim = FireSimulation3D::new(&config()).unwrap();
        sim.clear();
        sim.apply_heat(6, 6, 6, 3, 1.0).unwrap();
        sim.set_render_path(RenderPath::MarchingCubes);
        let image = sim.render_frame();
        let (kept, dropped) = sim.mesh_stats();
        assert!(kept > 0);
        assert_eq!(dropped, 0);
        assert_eq!(image.width(), 32);
    }

    #[test]
    fn test_invalid_camera_keeps_previous() {
        let mut sim = FireSimulation3D::new(&config()).unwrap();
        let before = *sim.camera();
        let eye = Vec3::new(1.0, 1.0, 1.0);
        assert!(sim.set_camera(eye, eye, Vec3::y(), 0.23).is_err());
        assert_eq!(*sim.camera(), before);
    }

    #[test]
    fn test_frame_fire_needs_burning_cells() {
        let mut sim = FireSimulation3D::new(&config()).unwrap();
        sim.clear();
        assert!(sim.frame_fire().is_none());
        sim.apply_heat(6, 6, 6, 2, 1.0).unwrap();
        let orbit = sim.frame_fire().unwrap();
        assert!((sim.camera().look_at - orbit.target).norm() < 1e-5);
    }

    #[test]
    fn test_fire_box_and_reset() {
        let mut sim = FireSimulation3D::new(&config()).unwrap();
        assert!(sim.fire_box([5, 0, 0], [2, 3, 3], 1, 1.0).is_err());
        sim.fire_box([2, 2, 2], [4, 4, 4], 1, 1.0).unwrap();
        assert_eq!(sim.volume().get(3, 3, 3), MAX_INTENSITY);
        sim.step(0.0);
        sim.reset();
        let fresh = FireSimulation3D::new(&config()).unwrap();
        assert_eq!(sim.volume().as_slice(), fresh.volume().as_slice());
        assert_eq!(sim.camera(), fresh.camera());
    }
}
