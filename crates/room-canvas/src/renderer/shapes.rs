//! Procedural meshes for probes, sensor cuboids and the legend plane.

use crate::scene::MeshVertex;
use glam::{Vec2, Vec3};
use std::collections::HashMap;

fn vertex(position: Vec3, normal: Vec3, uv: Vec2) -> MeshVertex {
    MeshVertex {
        position: position.to_array(),
        normal: normal.to_array(),
        uv: uv.to_array(),
    }
}

/// Axis-aligned cube spanning [-1, 1]^3, counter-clockwise outward faces.
pub fn cube() -> (Vec<MeshVertex>, Vec<u32>) {
    let faces = [
        (Vec3::X, Vec3::Y),
        (Vec3::NEG_X, Vec3::Y),
        (Vec3::Y, Vec3::Z),
        (Vec3::NEG_Y, Vec3::Z),
        (Vec3::Z, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y),
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, up) in faces {
        let right = up.cross(normal);
        let base = vertices.len() as u32;
        for (u, v) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = normal + right * u + up * v;
            vertices.push(vertex(p, normal, Vec2::new(0.5 * (u + 1.0), 0.5 * (v + 1.0))));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (vertices, indices)
}

/// Unit icosphere, each face split `subdivisions` times.
pub fn icosphere(subdivisions: u32) -> (Vec<MeshVertex>, Vec<u32>) {
    let t = (1.0 + 5f32.sqrt()) / 2.0;
    let mut positions: Vec<Vec3> = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Vec3::new(x, y, z).normalize())
    .collect();

    let mut faces: Vec<[u32; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                let p = (positions[a as usize] + positions[b as usize]).normalize();
                positions.push(p);
                positions.len() as u32 - 1
            })
        };
        faces = faces
            .iter()
            .flat_map(|&[a, b, c]| {
                let ab = midpoint(a, b, &mut positions);
                let bc = midpoint(b, c, &mut positions);
                let ca = midpoint(c, a, &mut positions);
                [[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]
            })
            .collect();
    }

    let vertices = positions
        .iter()
        .map(|p| {
            let uv = Vec2::new(
                0.5 + p.z.atan2(p.x) / std::f32::consts::TAU,
                0.5 - p.y.asin() / std::f32::consts::PI,
            );
            vertex(*p, *p, uv)
        })
        .collect();
    (vertices, faces.into_iter().flatten().collect())
}

/// Quad on the XZ plane over [0, 1]^2 facing +Y; uv follows x and z.
pub fn quad_xz() -> (Vec<MeshVertex>, Vec<u32>) {
    let vertices = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
        .iter()
        .map(|&(x, z)| vertex(Vec3::new(x, 0.0, z), Vec3::Y, Vec2::new(x, z)))
        .collect();
    (vertices, vec![0, 2, 1, 0, 3, 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winding_is_outward(vertices: &[MeshVertex], indices: &[u32]) -> bool {
        indices.chunks(3).all(|tri| {
            let p = |i: u32| Vec3::from_array(vertices[i as usize].position);
            let (a, b, c) = (p(tri[0]), p(tri[1]), p(tri[2]));
            let n = (b - a).cross(c - a);
            n.dot((a + b + c) / 3.0) > 0.0
        })
    }

    #[test]
    fn cube_spans_unit_box() {
        let (vertices, indices) = cube();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        assert!(vertices
            .iter()
            .all(|v| v.position.iter().all(|c| (c.abs() - 1.0).abs() < 1e-6)));
        assert!(winding_is_outward(&vertices, &indices));
    }

    #[test]
    fn icosphere_shares_midpoints() {
        let (vertices, indices) = icosphere(2);
        // 10 * 4^n + 2 vertices, 20 * 4^n faces.
        assert_eq!(vertices.len(), 162);
        assert_eq!(indices.len(), 320 * 3);
        for v in &vertices {
            assert!((Vec3::from_array(v.position).length() - 1.0).abs() < 1e-5);
        }
        assert!(winding_is_outward(&vertices, &indices));
    }

    #[test]
    fn quad_faces_up() {
        let (vertices, indices) = quad_xz();
        let p = |i: u32| Vec3::from_array(vertices[i as usize].position);
        for tri in indices.chunks(3) {
            let n = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(n.y > 0.0);
        }
    }
}
