//! Progressive voxel path tracer.
//!
//! Each [`PathTracer::accumulate`] call adds one jittered sample per pixel into a
//! floating-point buffer; [`PathTracer::fetch_image`] divides by the sample count and
//! applies exposure, a square-root tone curve and the optional vignette.
//!
//! Rays walk the voxel grid with a 3D DDA restricted to the grid's bounding box. A
//! voxel stops the ray with probability equal to its alpha. Diffuse hits bounce in a
//! cosine-weighted direction and sample the directional light through a shadow ray;
//! light voxels end the path and add their color.

use crate::config::TracerSettings;
use crate::core_types::{IVec3, RgbImage, Vec3};
use crate::error::Result;
use crate::render::camera::Camera;
use crate::render::geometry::{cosine_hemisphere, ray_aabb_intersection, Aabb, EPS, INF};
use crate::render::voxel::{Material, VoxelGrid};
use crate::solver::mix_seed;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

/// Smallest direction component used by the DDA.
const MIN_DIR_COMPONENT: f32 = 1e-6;

/// Progressive path tracer with its accumulation buffer.
#[derive(Debug, Clone)]
pub struct PathTracer {
    settings: TracerSettings,
    camera: Camera,
    seed: u64,
    /// Linear radiance sums, rows bottom-up.
    color_buffer: Vec<Vec3>,
    samples: u32,
}

/// Result of a DDA walk that stopped in a voxel.
#[derive(Debug, Clone, Copy)]
struct Hit {
    distance: f32,
    /// Face normal of the entry side, zero if the ray started inside the voxel.
    normal: Vec3,
    color: Vec3,
    light: bool,
}

/// Read-only view of the scene shared by all rows of one pass.
struct Scene<'a> {
    grid: &'a VoxelGrid,
    bbox: Aabb,
    settings: &'a TracerSettings,
    dx: f32,
    inv_dx: f32,
    max_steps: usize,
}

impl PathTracer {
    /// # Errors
    ///
    /// Returns an error if the settings or the camera fail validation.
    pub fn new(settings: TracerSettings, camera: Camera, seed: u64) -> Result<Self> {
        settings.validate()?;
        camera.validate()?;
        let len = settings.image_width * settings.image_height;
        Ok(Self {
            settings,
            camera,
            seed,
            color_buffer: vec![Vec3::zeros(); len],
            samples: 0,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &TracerSettings {
        &self.settings
    }

    /// Replace the settings and clear the accumulation buffer.
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidSettings` and keeps the old settings on failure.
    pub fn set_settings(&mut self, settings: TracerSettings) -> Result<()> {
        settings.validate()?;
        self.color_buffer = vec![Vec3::zeros(); settings.image_width * settings.image_height];
        self.settings = settings;
        self.samples = 0;
        Ok(())
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Replace the camera and clear the accumulation buffer.
    ///
    /// # Errors
    ///
    /// Returns `FireError::InvalidCamera` and keeps the old camera on failure.
    pub fn set_camera(&mut self, camera: Camera) -> Result<()> {
        camera.validate()?;
        self.camera = camera;
        self.reset_framebuffer();
        Ok(())
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Replace the base seed of the random streams. Takes effect on the next
    /// [`PathTracer::accumulate`].
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    /// Samples accumulated per pixel since the last reset.
    #[must_use]
    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn reset_framebuffer(&mut self) {
        self.color_buffer.fill(Vec3::zeros());
        self.samples = 0;
    }

    /// Trace one sample per pixel against `grid` using its current bounding box.
    ///
    /// The random stream depends only on the seed, the sample index and the row, so
    /// the result is independent of thread scheduling.
    pub fn accumulate(&mut self, grid: &VoxelGrid) {
        let width = self.settings.image_width;
        let height = self.settings.image_height as f32;
        let aspect = width as f32 / height;
        let camera = &self.camera;
        let Some(basis) = camera.basis() else {
            self.samples += 1;
            return;
        };
        let scene = grid.bbox().map(|bbox| {
            let (w, h, d) = grid.dims();
            Scene {
                grid,
                bbox,
                settings: &self.settings,
                dx: grid.dx(),
                inv_dx: 1.0 / grid.dx(),
                max_steps: 2 * (w + h + d) + 8,
            }
        });
        let background = self.settings.background_color;
        let frame_seed = mix_seed(self.seed, u64::from(self.samples));

        self.color_buffer
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, pixels)| {
                let mut rng = SmallRng::seed_from_u64(mix_seed(frame_seed, row as u64));
                for (col, pixel) in pixels.iter_mut().enumerate() {
                    let u = col as f32 + rng.random::<f32>();
                    let v = row as f32 + rng.random::<f32>();
                    let Some(dir) = camera.ray_direction(&basis, u, v, height, aspect) else {
                        continue;
                    };
                    *pixel += match &scene {
                        Some(scene) => scene.trace(camera.position, dir, &mut rng),
                        None => background,
                    };
                }
            });
        self.samples += 1;
        debug!("Accumulated sample {}", self.samples);
    }

    /// Tone-mapped image of the accumulated samples, black before the first sample.
    #[must_use]
    pub fn fetch_image(&self) -> RgbImage {
        let width = self.settings.image_width;
        let height = self.settings.image_height;
        let mut image = RgbImage::new(width, height);
        if self.samples == 0 {
            return image;
        }
        let scale = self.settings.exposure / self.samples as f32;
        let strength = self.settings.vignette_strength;
        let radius = self.settings.vignette_radius;

        image
            .as_bytes_mut()
            .par_chunks_mut(width * 3)
            .zip(self.color_buffer.par_chunks(width))
            .enumerate()
            .for_each(|(row, (out, pixels))| {
                let v = row as f32 / height as f32;
                for (col, (px, color)) in out.chunks_exact_mut(3).zip(pixels).enumerate() {
                    let u = col as f32 / width as f32;
                    let center_dist = ((u - 0.5).powi(2) + (v - 0.5).powi(2)).sqrt();
                    let darken = (1.0 - strength * (center_dist - radius).max(0.0)).max(0.0);
                    for (channel, &c) in px.iter_mut().zip(color.iter()) {
                        let value = (c * darken * scale).max(0.0).sqrt().clamp(0.0, 1.0);
                        *channel = (value * 255.0) as u8;
                    }
                }
            });
        image
    }
}

impl Scene<'_> {
    /// Whether the voxel lies inside the current bounding box.
    fn inside(&self, ipos: IVec3) -> bool {
        self.bbox.contains_half_open(ipos.cast::<f32>() * self.dx)
    }

    /// Walk the grid from `origin` along `dir` until a voxel stops the ray.
    fn next_hit(&self, origin: Vec3, dir: Vec3, rng: &mut SmallRng) -> Option<Hit> {
        let d = dir.map(|c| {
            if c.abs() < MIN_DIR_COMPONENT {
                MIN_DIR_COMPONENT
            } else {
                c
            }
        });
        let rinv = d.map(|c| 1.0 / c);
        let rsign = d.map(|c| if c > 0.0 { 1 } else { -1 });
        let rsign_f = rsign.cast::<f32>();

        let (near, _) = ray_aabb_intersection(&self.bbox, origin, d)?;
        let near = near.max(0.0);
        let pos = origin + d * (near + 5.0 * EPS);
        let o = pos * self.inv_dx;
        let mut ipos: IVec3 = o.map(|c| c.floor() as i32);
        let mut dis =
            (ipos.cast::<f32>() - o + Vec3::repeat(0.5) + rsign_f * 0.5).component_mul(&rinv);
        let mut normal = Vec3::zeros();

        for _ in 0..self.max_steps {
            if !self.inside(ipos) {
                return None;
            }
            // Padding cells of the box may lie outside the array; they are empty.
            let stops = self.grid.get(ipos).is_some_and(|voxel| {
                voxel.material != Material::Empty && rng.random::<f32>() < voxel.alpha
            });
            if stops {
                let mini = (ipos.cast::<f32>() - o + Vec3::repeat(0.5) - rsign_f * 0.5)
                    .component_mul(&rinv);
                let distance = mini.x.max(mini.y).max(mini.z) * self.dx + near;
                let (color, light) = self.surface_color(origin + d * (distance + 1e-3));
                return Some(Hit {
                    distance,
                    normal,
                    color,
                    light,
                });
            }
            let axis = if dis.x <= dis.y && dis.x < dis.z {
                0
            } else if dis.y <= dis.x && dis.y <= dis.z {
                1
            } else {
                2
            };
            dis[axis] += rsign_f[axis] * rinv[axis];
            ipos[axis] += rsign[axis];
            normal = Vec3::zeros();
            normal[axis] = -rsign_f[axis];
        }
        None
    }

    /// Voxel color at a surface point, darkened along voxel edges.
    fn surface_color(&self, pos: Vec3) -> (Vec3, bool) {
        let p = pos * self.inv_dx;
        let edges = self.settings.voxel_edges;
        let on_edge = p
            .iter()
            .filter(|&&c| {
                let frac = c - c.floor();
                frac < edges || frac > 1.0 - edges
            })
            .count();
        let edge_factor = if on_edge >= 2 { 1.0 } else { 0.0 };

        let ipos: IVec3 = p.map(|c| c.floor() as i32);
        let voxel = if self.inside(ipos) {
            self.grid.get(ipos)
        } else {
            None
        };
        match voxel {
            Some(voxel) => {
                let [r, g, b] = voxel.color;
                let color = Vec3::new(f32::from(r), f32::from(g), f32::from(b)) / 255.0;
                (
                    color * (1.3 - 1.2 * edge_factor),
                    voxel.material == Material::Light,
                )
            }
            None => (Vec3::zeros(), false),
        }
    }

    /// Radiance carried back along one camera ray.
    fn trace(&self, origin: Vec3, dir: Vec3, rng: &mut SmallRng) -> Vec3 {
        let settings = self.settings;
        let mut pos = origin;
        let mut d = dir;
        let mut contrib = Vec3::zeros();
        let mut throughput = Vec3::repeat(1.0);
        let mut color = Vec3::repeat(1.0);
        let mut depth = 0;
        let mut hit_light = false;
        let mut hit_background = false;

        while depth < settings.max_ray_depth {
            depth += 1;
            let hit = self.next_hit(pos, d, rng);
            match hit {
                Some(h) if !h.light && h.normal != Vec3::zeros() && h.distance < 1e8 => {
                    let hit_pos = pos + d * h.distance;
                    d = cosine_hemisphere(h.normal, rng);
                    pos = hit_pos + d * 1e-4;
                    throughput.component_mul_assign(&h.color);

                    let jitter = Vec3::new(
                        rng.random::<f32>() - 0.5,
                        rng.random::<f32>() - 0.5,
                        rng.random::<f32>() - 0.5,
                    ) * settings.light_noise;
                    if let Some(light_dir) =
                        (settings.light_direction + jitter).try_normalize(f32::EPSILON)
                    {
                        let dot = light_dir.dot(&h.normal);
                        if dot > 0.0 {
                            let shadow = self
                                .next_hit(pos, light_dir, rng)
                                .map_or(INF, |s| s.distance);
                            if shadow > settings.dis_limit {
                                contrib += throughput.component_mul(&settings.light_color) * dot;
                            }
                        }
                    }
                }
                other => {
                    if let Some(h) = other {
                        color = h.color;
                        hit_light = h.light;
                    }
                    hit_background = true;
                    break;
                }
            }
        }

        if hit_light {
            contrib += throughput.component_mul(&color);
        } else if depth == 1 && hit_background {
            contrib = settings.background_color;
        }
        contrib
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::voxel::Voxel;
    use std::ops::Range;

    fn settings() -> TracerSettings {
        TracerSettings {
            image_width: 16,
            image_height: 16,
            voxel_dx: 1.0,
            ..TracerSettings::default()
        }
    }

    fn camera() -> Camera {
        Camera::new(
            Vec3::new(4.0, 4.0, -20.0),
            Vec3::new(4.0, 4.0, 4.0),
            Vec3::y(),
            0.23,
        )
        .unwrap()
    }

    fn red_cube() -> VoxelGrid {
        let mut grid = VoxelGrid::new(8, 8, 8, 1.0).unwrap();
        let light = Voxel {
            material: Material::Light,
            color: [255, 0, 0],
            alpha: 1.0,
        };
        for y in 2..6 {
            for z in 2..6 {
                for x in 2..6 {
                    grid.set(x, y, z, light);
                }
            }
        }
        grid.recompute_bbox();
        grid
    }

    fn fill(
        grid: &mut VoxelGrid,
        x: Range<usize>,
        y: Range<usize>,
        z: Range<usize>,
        voxel: Voxel,
    ) {
        for vy in y {
            for vz in z.clone() {
                for vx in x.clone() {
                    grid.set(vx, vy, vz, voxel);
                }
            }
        }
    }

    const WHITE_DIFFUSE: Voxel = Voxel {
        material: Material::Lambertian,
        color: [255, 255, 255],
        alpha: 1.0,
    };

    /// White diffuse plane at y = 2 seen from straight above.
    fn lit_plane(light_direction: Vec3, wall: bool) -> RgbImage {
        let mut grid = VoxelGrid::new(8, 8, 8, 1.0).unwrap();
        fill(&mut grid, 0..8, 2..3, 0..8, WHITE_DIFFUSE);
        if wall {
            fill(&mut grid, 6..7, 3..8, 0..8, WHITE_DIFFUSE);
        }
        grid.recompute_bbox();
        let s = TracerSettings {
            light_direction: light_direction.normalize(),
            light_noise: 0.0,
            ..settings()
        };
        let top = Camera::new(
            Vec3::new(4.0, 20.0, 4.0),
            Vec3::new(4.0, 2.0, 4.0),
            Vec3::z(),
            0.23,
        )
        .unwrap();
        let mut tracer = PathTracer::new(s, top, 11).unwrap();
        for _ in 0..8 {
            tracer.accumulate(&grid);
        }
        tracer.fetch_image()
    }

    #[test]
    fn test_diffuse_plane_is_lit() {
        let image = lit_plane(Vec3::new(1.0, 1.0, 1.0), false);
        let [r, g, b] = image.pixel(8, 8);
        assert!(r > 80, "plane too dark: {r}");
        assert_eq!((r, r), (g, b));
    }

    #[test]
    fn test_light_behind_surface_leaves_it_dark() {
        let image = lit_plane(Vec3::new(1.0, -1.0, 0.0), false);
        assert_eq!(image.pixel(8, 8), [0, 0, 0]);
    }

    #[test]
    fn test_occluder_casts_shadow() {
        let light = Vec3::new(1.0, 0.3, 0.0);
        let open = lit_plane(light, false).pixel(8, 8);
        let shadowed = lit_plane(light, true).pixel(8, 8);
        assert!(open[0] > 0);
        assert!(shadowed[0] < open[0], "shadowed {shadowed:?}, open {open:?}");
    }

    #[test]
    fn test_voxels_on_grid_border_are_visible() {
        let mut grid = VoxelGrid::new(8, 8, 8, 1.0).unwrap();
        let light = Voxel {
            material: Material::Light,
            color: [255, 0, 0],
            alpha: 1.0,
        };
        fill(&mut grid, 0..4, 2..6, 2..6, light);
        grid.recompute_bbox();
        let side = Camera::new(
            Vec3::new(-20.0, 4.0, 4.0),
            Vec3::new(2.0, 4.0, 4.0),
            Vec3::y(),
            0.23,
        )
        .unwrap();
        let mut tracer = PathTracer::new(settings(), side, 5).unwrap();
        tracer.accumulate(&grid);
        let [r, g, b] = tracer.fetch_image().pixel(8, 8);
        assert!(r > 100, "border block not hit: {r}");
        assert_eq!((g, b), (0, 0));
    }

    #[test]
    fn test_set_seed_changes_samples() {
        let grid = red_cube();
        let mut a = PathTracer::new(settings(), camera(), 1).unwrap();
        let mut b = PathTracer::new(settings(), camera(), 1).unwrap();
        b.set_seed(2);
        assert_eq!(b.seed(), 2);
        a.accumulate(&grid);
        b.accumulate(&grid);
        assert_ne!(a.fetch_image(), b.fetch_image());

        b.reset_framebuffer();
        b.set_seed(1);
        b.accumulate(&grid);
        assert_eq!(a.fetch_image(), b.fetch_image());
    }

    #[test]
    fn test_no_samples_is_black() {
        let tracer = PathTracer::new(settings(), camera(), 1).unwrap();
        assert_eq!(tracer.samples(), 0);
        assert!(tracer.fetch_image().as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_scene_shows_background() {
        let mut s = settings();
        s.background_color = Vec3::new(0.2, 0.0, 0.0);
        let mut tracer = PathTracer::new(s, camera(), 1).unwrap();
        let mut grid = VoxelGrid::new(8, 8, 8, 1.0).unwrap();
        assert!(grid.recompute_bbox().is_none());
        tracer.accumulate(&grid);
        let image = tracer.fetch_image();
        // sqrt(0.2 * 3) * 255
        assert!(image.as_bytes().chunks(3).all(|px| px == [197, 0, 0]));
    }

    #[test]
    fn test_light_voxels_are_visible() {
        let grid = red_cube();
        let mut tracer = PathTracer::new(settings(), camera(), 7).unwrap();
        tracer.accumulate(&grid);
        let image = tracer.fetch_image();
        let [r, g, b] = image.pixel(8, 8);
        assert!(r > 100);
        assert_eq!((g, b), (0, 0));
        assert_eq!(image.pixel(0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_same_seed_same_image() {
        let grid = red_cube();
        let mut a = PathTracer::new(settings(), camera(), 42).unwrap();
        let mut b = PathTracer::new(settings(), camera(), 42).unwrap();
        for _ in 0..3 {
            a.accumulate(&grid);
            b.accumulate(&grid);
        }
        assert_eq!(a.fetch_image(), b.fetch_image());

        let first = a.fetch_image();
        a.reset_framebuffer();
        for _ in 0..3 {
            a.accumulate(&grid);
        }
        assert_eq!(a.fetch_image(), first);
    }

    #[test]
    fn test_set_camera_resets_samples() {
        let grid = red_cube();
        let mut tracer = PathTracer::new(settings(), camera(), 3).unwrap();
        tracer.accumulate(&grid);
        assert_eq!(tracer.samples(), 1);
        let mut moved = *tracer.camera();
        moved.position.z = -30.0;
        tracer.set_camera(moved).unwrap();
        assert_eq!(tracer.samples(), 0);

        moved.fov = -1.0;
        assert!(tracer.set_camera(moved).is_err());
        assert_eq!(tracer.camera().position.z, -30.0);
    }

    #[test]
    fn test_vignette_darkens_corners() {
        let mut s = settings();
        s.background_color = Vec3::new(0.3, 0.3, 0.3);
        s.vignette_strength = 2.0;
        let mut tracer = PathTracer::new(s, camera(), 1).unwrap();
        let mut grid = VoxelGrid::new(8, 8, 8, 1.0).unwrap();
        grid.recompute_bbox();
        tracer.accumulate(&grid);
        let image = tracer.fetch_image();
        assert!(image.pixel(0, 0)[0] < image.pixel(8, 8)[0]);
    }
}
