//! Depth-tested triangle fill for marching-cubes meshes.

use crate::core_types::{RgbImage, Vec3};
use crate::render::camera::Camera;
use crate::solver::Mesh;
use rayon::prelude::*;
use tracing::warn;

/// Triangle in image space: `(u, v, depth)` per vertex.
struct ScreenTriangle {
    vertices: [(f32, f32, f32); 3],
    inv_denom: f32,
    color: [u8; 3],
    v_min: f32,
    v_max: f32,
}

/// Project `mesh` through `camera` and fill it into a `width x height` image.
///
/// `to_world` maps mesh vertices (grid coordinates) into world space. Triangles with
/// a vertex behind the camera or with zero screen area are skipped; pixels not
/// covered by any triangle keep `background`.
#[must_use]
pub fn rasterize_mesh<F>(
    mesh: &Mesh,
    to_world: F,
    camera: &Camera,
    width: usize,
    height: usize,
    background: [u8; 3],
) -> RgbImage
where
    F: Fn(Vec3) -> Vec3 + Sync,
{
    let mut image = RgbImage::filled(width, height, background);
    let Some(basis) = camera.basis() else {
        warn!("Degenerate camera, mesh not drawn");
        return image;
    };
    let h = height as f32;
    let aspect = width as f32 / h;

    let triangles: Vec<ScreenTriangle> = mesh
        .triangles
        .par_iter()
        .filter_map(|tri| {
            let mut projected = [(0.0, 0.0, 0.0); 3];
            for (slot, vertex) in projected.iter_mut().zip(&tri.vertices) {
                *slot = camera.project(&basis, to_world(*vertex), h, aspect)?;
            }
            let [(u0, v0, _), (u1, v1, _), (u2, v2, _)] = projected;
            let denom = (v1 - v2) * (u0 - u2) + (u2 - u1) * (v0 - v2);
            if denom.abs() <= f32::EPSILON {
                return None;
            }
            Some(ScreenTriangle {
                vertices: projected,
                inv_denom: 1.0 / denom,
                color: tri.color,
                v_min: v0.min(v1).min(v2),
                v_max: v0.max(v1).max(v2),
            })
        })
        .collect();

    image
        .as_bytes_mut()
        .par_chunks_mut(width * 3)
        .enumerate()
        .for_each(|(row, out)| {
            let pv = row as f32 + 0.5;
            let mut depth = vec![f32::INFINITY; width];
            for tri in triangles.iter().filter(|t| t.v_min <= pv && pv <= t.v_max) {
                let [(u0, v0, z0), (u1, v1, z1), (u2, v2, z2)] = tri.vertices;
                let u_min = u0.min(u1).min(u2).floor().max(0.0) as usize;
                let u_max = (u0.max(u1).max(u2).ceil().max(0.0) as usize).min(width);
                for col in u_min..u_max {
                    let pu = col as f32 + 0.5;
                    let w0 = ((v1 - v2) * (pu - u2) + (u2 - u1) * (pv - v2)) * tri.inv_denom;
                    let w1 = ((v2 - v0) * (pu - u2) + (u0 - u2) * (pv - v2)) * tri.inv_denom;
                    let w2 = 1.0 - w0 - w1;
                    if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                        continue;
                    }
                    let z = w0 * z0 + w1 * z1 + w2 * z2;
                    if z < depth[col] {
                        depth[col] = z;
                        out[col * 3..col * 3 + 3].copy_from_slice(&tri.color);
                    }
                }
            }
        });
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Triangle;

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, -5.0), Vec3::zeros(), Vec3::y(), 0.5).unwrap()
    }

    fn quad(z: f32, color: [u8; 3]) -> Vec<Triangle> {
        let a = Vec3::new(-1.0, -1.0, z);
        let b = Vec3::new(1.0, -1.0, z);
        let c = Vec3::new(1.0, 1.0, z);
        let d = Vec3::new(-1.0, 1.0, z);
        vec![
            Triangle {
                vertices: [a, b, c],
                color,
            },
            Triangle {
                vertices: [a, c, d],
                color,
            },
        ]
    }

    #[test]
    fn test_empty_mesh_is_background() {
        let image = rasterize_mesh(&Mesh::default(), |p| p, &camera(), 8, 8, [1, 2, 3]);
        assert!(image.as_bytes().chunks(3).all(|px| px == [1, 2, 3]));
    }

    #[test]
    fn test_nearest_triangle_wins() {
        let mut triangles = quad(1.0, [200, 0, 0]);
        triangles.extend(quad(0.0, [0, 200, 0]));
        let mesh = Mesh {
            triangles,
            dropped: 0,
        };
        let image = rasterize_mesh(&mesh, |p| p, &camera(), 16, 16, [0, 0, 0]);
        assert_eq!(image.pixel(8, 8), [0, 200, 0]);
        assert_eq!(image.pixel(0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_degenerate_triangle_skipped() {
        let p = Vec3::zeros();
        let mesh = Mesh {
            triangles: vec![Triangle {
                vertices: [p, p, p],
                color: [255, 255, 255],
            }],
            dropped: 0,
        };
        let image = rasterize_mesh(&mesh, |p| p, &camera(), 8, 8, [0, 0, 0]);
        assert!(image.as_bytes().iter().all(|&b| b == 0));
    }
}
