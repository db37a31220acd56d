//! Marching cubes isosurface extraction from the 3D heat volume
//!
//! Each unit cube of eight neighbouring cells is classified by which corners exceed
//! the iso-level; the lookup tables in `mc_tables` give the crossed edges and the
//! triangles joining them. Output is capped: once the buffer is full the remaining
//! triangles of the frame are dropped and counted.

use super::mc_tables::{CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};
use crate::config::DEFAULT_ISO_LEVEL;
use crate::core_types::{Palette, Vec3};
use crate::grid::HeatVolume;
use rayon::prelude::*;
use tracing::debug;

/// Values closer than this are treated as equal during interpolation.
const INTERP_EPSILON: f32 = 1e-5;

/// One extracted triangle in grid coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vec3; 3],
    /// Palette color of the cube's first corner
    pub color: [u8; 3],
}

/// Triangle buffer regenerated every frame.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
    /// Triangles discarded because the buffer was full
    pub dropped: usize,
}

impl Mesh {
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Default iso-level: half of `MAX_INTENSITY`.
#[must_use]
pub fn default_iso_level() -> f32 {
    DEFAULT_ISO_LEVEL
}

/// Configuration index of a cube: bit `i` set when corner `i` exceeds `iso_level`.
#[must_use]
pub fn cube_index(corners: &[f32; 8], iso_level: f32) -> usize {
    let mut index = 0;
    for (i, &value) in corners.iter().enumerate() {
        if value > iso_level {
            index |= 1 << i;
        }
    }
    index
}

/// Point on the edge `p1`-`p2` where the linear ramp between the two values meets
/// `iso_level`. Near-equal values fall back to an endpoint.
#[must_use]
pub fn vertex_interp(iso_level: f32, p1: Vec3, p2: Vec3, v1: f32, v2: f32) -> Vec3 {
    if (iso_level - v1).abs() < INTERP_EPSILON {
        return p1;
    }
    if (iso_level - v2).abs() < INTERP_EPSILON {
        return p2;
    }
    if (v1 - v2).abs() < INTERP_EPSILON {
        return p1;
    }
    let mu = (iso_level - v1) / (v2 - v1);
    p1 + (p2 - p1) * mu
}

/// Triangulate a single cube.
///
/// # Arguments
///
/// * `origin` - Grid position of corner 0
/// * `corners` - Corner values in table order
/// * `iso_level` - Surface threshold
/// * `out` - Receives the triangles' vertices
///
/// # Returns
///
/// Number of triangles appended (0 for configurations 0x00 and 0xFF)
pub fn polygonise(
    origin: Vec3,
    corners: &[f32; 8],
    iso_level: f32,
    out: &mut Vec<[Vec3; 3]>,
) -> usize {
    let config = cube_index(corners, iso_level);
    let edges = EDGE_TABLE[config];
    if edges == 0 {
        return 0;
    }

    let mut vertlist = [Vec3::zeros(); 12];
    for (edge, &[a, b]) in EDGE_CORNERS.iter().enumerate() {
        if edges & (1 << edge) != 0 {
            let pa = origin + corner_offset(a);
            let pb = origin + corner_offset(b);
            vertlist[edge] = vertex_interp(iso_level, pa, pb, corners[a], corners[b]);
        }
    }

    let before = out.len();
    for tri in TRI_TABLE[config].chunks_exact(3) {
        if tri[0] < 0 {
            break;
        }
        out.push([
            vertlist[tri[0] as usize],
            vertlist[tri[1] as usize],
            vertlist[tri[2] as usize],
        ]);
    }
    out.len() - before
}

fn corner_offset(corner: usize) -> Vec3 {
    let [dx, dy, dz] = CORNER_OFFSETS[corner];
    Vec3::new(dx as f32, dy as f32, dz as f32)
}

/// Extract the isosurface of `volume` at `iso_level`.
///
/// Slabs of cubes (one per y) are triangulated in parallel and concatenated in y
/// order, so the kept triangles are deterministic when the cap is hit.
///
/// # Arguments
///
/// * `volume` - Heat volume to polygonise
/// * `palette` - Source of per-triangle colors
/// * `iso_level` - Surface threshold in intensity units
/// * `max_triangles` - Buffer capacity; extra triangles are dropped
#[must_use]
pub fn extract_isosurface(
    volume: &HeatVolume,
    palette: &Palette,
    iso_level: f32,
    max_triangles: usize,
) -> Mesh {
    let (width, height, depth) = (volume.width(), volume.height(), volume.depth());
    if width < 2 || depth < 2 {
        return Mesh::default();
    }

    let slabs: Vec<(Vec<Triangle>, usize)> = (0..height - 1)
        .into_par_iter()
        .map(|y| extract_slab(volume, palette, y, iso_level, max_triangles))
        .collect();

    let mut mesh = Mesh::default();
    for (triangles, slab_dropped) in slabs {
        mesh.dropped += slab_dropped;
        let room = max_triangles - mesh.triangles.len();
        if triangles.len() > room {
            mesh.dropped += triangles.len() - room;
            mesh.triangles.extend(triangles.into_iter().take(room));
        } else {
            mesh.triangles.extend(triangles);
        }
    }

    if mesh.dropped > 0 {
        debug!(
            "Marching cubes buffer full: kept {} triangles, dropped {}",
            mesh.triangles.len(),
            mesh.dropped
        );
    }
    mesh
}

fn extract_slab(
    volume: &HeatVolume,
    palette: &Palette,
    y: usize,
    iso_level: f32,
    cap: usize,
) -> (Vec<Triangle>, usize) {
    let mut triangles = Vec::new();
    let mut dropped = 0;
    let mut scratch = Vec::with_capacity(5);

    for z in 0..volume.depth() - 1 {
        for x in 0..volume.width() - 1 {
            let mut corners = [0.0f32; 8];
            for (i, [dx, dy, dz]) in CORNER_OFFSETS.iter().enumerate() {
                corners[i] = f32::from(volume.get(x + dx, y + dy, z + dz));
            }

            scratch.clear();
            let origin = Vec3::new(x as f32, y as f32, z as f32);
            if polygonise(origin, &corners, iso_level, &mut scratch) == 0 {
                continue;
            }

            let color = palette.color(volume.get(x, y, z));
            for &vertices in &scratch {
                if triangles.len() < cap {
                    triangles.push(Triangle { vertices, color });
                } else {
                    dropped += 1;
                }
            }
        }
    }
    (triangles, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::MAX_INTENSITY;
    use approx::assert_relative_eq;

    fn hot_center_volume() -> HeatVolume {
        let mut volume = HeatVolume::new(3, 3, 3).unwrap();
        volume.set(1, 1, 1, MAX_INTENSITY);
        volume
    }

    #[test]
    fn test_uniform_cold_field_has_no_triangles() {
        let mut volume = HeatVolume::new(6, 6, 6).unwrap();
        for z in 0..6 {
            for x in 0..6 {
                volume.set(x, 2, z, 100);
            }
        }
        let mesh = extract_isosurface(&volume, &Palette::default(), default_iso_level(), 1000);
        assert!(mesh.is_empty());
        assert_eq!(mesh.dropped, 0);
    }

    #[test]
    fn test_single_hot_corner_matches_table_row() {
        let corners = [255.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(cube_index(&corners, 127.0), 1);

        let mut out = Vec::new();
        let n = polygonise(Vec3::zeros(), &corners, 127.0, &mut out);
        assert_eq!(n, 1);

        // Row 1 is edges [0, 8, 3]: along x, along z, along y from corner 0
        let t = (127.0 - 255.0) / (0.0 - 255.0);
        let [a, b, c] = out[0];
        assert_relative_eq!(a, Vec3::new(t, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(b, Vec3::new(0.0, 0.0, t), epsilon = 1e-6);
        assert_relative_eq!(c, Vec3::new(0.0, t, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_full_cube_is_skipped() {
        let corners = [255.0; 8];
        let mut out = Vec::new();
        assert_eq!(polygonise(Vec3::zeros(), &corners, 127.0, &mut out), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_isolated_hot_cell_gives_one_triangle_per_cube() {
        let mesh = extract_isosurface(
            &hot_center_volume(),
            &Palette::default(),
            default_iso_level(),
            1000,
        );
        assert_eq!(mesh.triangle_count(), 8);
        for tri in &mesh.triangles {
            for v in &tri.vertices {
                assert!((0.0..=2.0).contains(&v.x));
                assert!((0.0..=2.0).contains(&v.y));
                assert!((0.0..=2.0).contains(&v.z));
            }
        }
    }

    #[test]
    fn test_cap_drops_extra_triangles() {
        let mesh = extract_isosurface(
            &hot_center_volume(),
            &Palette::default(),
            default_iso_level(),
            3,
        );
        assert_eq!(mesh.triangle_count(), 3);
        assert_eq!(mesh.dropped, 5);
    }

    #[test]
    fn test_vertex_interp_degenerate_values() {
        let p1 = Vec3::new(0.0, 0.0, 0.0);
        let p2 = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(vertex_interp(10.0, p1, p2, 10.0, 50.0), p1);
        assert_eq!(vertex_interp(50.0, p1, p2, 10.0, 50.0), p2);
        assert_eq!(vertex_interp(30.0, p1, p2, 20.0, 20.0), p1);
        assert_relative_eq!(vertex_interp(30.0, p1, p2, 10.0, 50.0).x, 0.5);
    }
}
