//! Procedural CPU meshes.
//!
//! Builders record through a private [`DrawSession`] and return meshes that
//! still need `RenderContext::upload_mesh`.

use std::f32::consts::{PI, TAU};

use super::immediate::DrawSession;
use super::mesh::{MAX_MESH_VERTICES, Mesh, MeshFlags};
use super::topology::DrawMode;

const SOLID: MeshFlags = MeshFlags::POS3.union(MeshFlags::NORM).union(MeshFlags::TEX2);

/// Axis-aligned box between two corners: 6 faces of 4 vertices, per-face
/// normals, drawn as quads.
pub fn mesh_box(x1: f32, y1: f32, z1: f32, x2: f32, y2: f32, z2: f32) -> Option<Mesh> {
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([0.0, 0.0, -1.0], [[x2, y1, z1], [x1, y1, z1], [x1, y2, z1], [x2, y2, z1]]),
        ([0.0, 1.0, 0.0], [[x2, y2, z1], [x1, y2, z1], [x1, y2, z2], [x2, y2, z2]]),
        ([0.0, -1.0, 0.0], [[x2, y1, z2], [x1, y1, z2], [x1, y1, z1], [x2, y1, z1]]),
        ([-1.0, 0.0, 0.0], [[x1, y2, z2], [x1, y2, z1], [x1, y1, z1], [x1, y1, z2]]),
        ([1.0, 0.0, 0.0], [[x2, y2, z1], [x2, y2, z2], [x2, y1, z2], [x2, y1, z1]]),
        ([0.0, 0.0, 1.0], [[x2, y2, z2], [x1, y2, z2], [x1, y1, z2], [x2, y1, z2]]),
    ];
    const UV: [[f32; 2]; 4] = [[1.0, 0.0], [0.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

    let mut s = DrawSession::new();
    s.begin(Mesh::new(SOLID, 24, 36)?, DrawMode::Quads).ok()?;
    for (n, corners) in faces {
        s.normal(n[0], n[1], n[2]);
        for (p, uv) in corners.iter().zip(UV) {
            s.tex_coord(uv[0], uv[1]);
            s.vertex3(p[0], p[1], p[2]);
        }
    }
    s.end()
}

/// Unit cube centered on the origin.
pub fn mesh_cube() -> Option<Mesh> {
    mesh_box(-0.5, -0.5, -0.5, 0.5, 0.5, 0.5)
}

/// Closed cylinder along +Z from `z = 0` to `z = height`.
///
/// Vertices 0 and 1 are the cap centers; each slice adds a bottom and top
/// rim vertex with cap normals and a bottom and top body vertex with the
/// radial normal.
pub fn mesh_cylinder(radius: f32, height: f32, slices: usize) -> Option<Mesh> {
    if slices < 3 {
        log::warn!("cylinder needs at least 3 slices, got {slices}");
        return None;
    }
    let mut s = DrawSession::new();
    s.begin(Mesh::new(SOLID, 2 + slices * 4, slices * 12)?, DrawMode::Triangles)
        .ok()?;

    s.normal(0.0, 0.0, -1.0);
    s.vertex3(0.0, 0.0, 0.0)?;
    s.normal(0.0, 0.0, 1.0);
    s.vertex3(0.0, 0.0, height)?;

    // Previous slice, starting from the last one so the seam closes.
    let last = ((slices - 1) * 4) as u16;
    let (mut prev_bottom, mut prev_top) = (last + 2, last + 3);
    let (mut prev_side_bottom, mut prev_side_top) = (last + 4, last + 5);

    for i in 0..slices {
        let t = i as f32 / slices as f32 * TAU;
        let (st, ct) = t.sin_cos();
        let (x, y) = (st * radius, ct * radius);

        s.normal(0.0, 0.0, -1.0);
        let bottom = s.vertex3(x, y, 0.0)?;
        s.normal(0.0, 0.0, 1.0);
        let top = s.vertex3(x, y, height)?;

        s.normal(st, ct, 0.0);
        let side_bottom = s.vertex3(x, y, 0.0)?;
        let side_top = s.vertex3(x, y, height)?;

        for ix in [
            0,
            bottom,
            prev_bottom,
            1,
            top,
            prev_top,
            side_bottom,
            prev_side_bottom,
            side_top,
            side_top,
            prev_side_bottom,
            prev_side_top,
        ] {
            s.index(ix);
        }

        (prev_bottom, prev_top) = (bottom, top);
        (prev_side_bottom, prev_side_top) = (side_bottom, side_top);
    }
    s.end()
}

/// UV sphere centered on the origin with normals and texture coordinates.
pub fn mesh_sphere(radius: f32, slices: usize, stacks: usize) -> Option<Mesh> {
    if slices < 3 || stacks < 2 {
        log::warn!("sphere needs at least 3 slices and 2 stacks, got {slices}x{stacks}");
        return None;
    }
    let vertex_count = (slices + 1) * (stacks + 1);
    if vertex_count > MAX_MESH_VERTICES {
        log::warn!("sphere of {slices}x{stacks} needs {vertex_count} vertices");
        return None;
    }

    let mut s = DrawSession::new();
    s.begin(Mesh::new(SOLID, vertex_count, slices * stacks * 6)?, DrawMode::Triangles)
        .ok()?;

    for j in 0..=stacks {
        let v = j as f32 / stacks as f32;
        let (sp, cp) = (v * PI).sin_cos();
        for i in 0..=slices {
            let u = i as f32 / slices as f32;
            let (st, ct) = (u * TAU).sin_cos();
            let n = [ct * sp, cp, st * sp];
            s.normal(n[0], n[1], n[2]);
            s.tex_coord(u, v);
            s.vertex3(n[0] * radius, n[1] * radius, n[2] * radius)?;
        }
    }

    let row = slices + 1;
    for j in 0..stacks {
        for i in 0..slices {
            let a = (j * row + i) as u16;
            let b = a + row as u16;
            for ix in [a, a + 1, b, b, a + 1, b + 1] {
                s.index(ix);
            }
        }
    }
    s.end()
}

/// The 12 edges of an axis-aligned box, drawn as lines.
pub fn mesh_wire_box(x1: f32, y1: f32, z1: f32, x2: f32, y2: f32, z2: f32) -> Option<Mesh> {
    #[rustfmt::skip]
    const EDGES: [u16; 24] = [
        0, 1, 1, 2, 2, 3, 3, 0, // z1
        4, 5, 5, 6, 6, 7, 7, 4, // z2
        0, 4, 1, 5, 2, 6, 3, 7,
    ];
    let mut s = DrawSession::new();
    s.begin(Mesh::new(MeshFlags::POS3, 8, EDGES.len())?, DrawMode::Lines)
        .ok()?;
    for z in [z1, z2] {
        s.vertex3(x1, y1, z);
        s.vertex3(x2, y1, z);
        s.vertex3(x2, y2, z);
        s.vertex3(x1, y2, z);
    }
    for ix in EDGES {
        s.index(ix);
    }
    s.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcgl_math::Vec3;

    #[test]
    fn box_is_24_vertices_and_36_indices() {
        let m = mesh_box(0.0, 0.0, 0.0, 1.0, 2.0, 3.0).unwrap();
        assert_eq!(m.vertex_count(), 24);
        assert_eq!(m.draw_count(), 36);
        assert_eq!(m.draw_mode(), DrawMode::Quads);
        assert_eq!(&m.indices()[..6], &[0, 1, 2, 0, 2, 3]);
        assert_eq!(m.aabb(), Some((Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0))));

        // First face looks down -Z.
        let v = m.vertex(0).unwrap();
        assert_eq!(&v[3..6], &[0.0, 0.0, -1.0]);
    }

    #[test]
    fn cube_spans_unit_extent() {
        let m = mesh_cube().unwrap();
        let (lo, hi) = m.aabb().unwrap();
        assert_eq!(lo, Vec3::splat(-0.5));
        assert_eq!(hi, Vec3::splat(0.5));
    }

    #[test]
    fn cylinder_indices_close_the_seam() {
        let slices = 8;
        let m = mesh_cylinder(1.0, 2.0, slices).unwrap();
        assert_eq!(m.vertex_count(), 2 + slices * 4);
        assert_eq!(m.draw_count(), slices * 12);

        let last = ((slices - 1) * 4) as u16;
        assert_eq!(&m.indices()[..3], &[0, 2, last + 2]);
        assert_eq!(&m.indices()[3..6], &[1, 3, last + 3]);
        assert!(m.indices().iter().all(|&i| (i as usize) < m.vertex_count()));

        let (lo, hi) = m.aabb().unwrap();
        assert!((lo.z, hi.z) == (0.0, 2.0));
    }

    #[test]
    fn cylinder_rejects_degenerate_slices() {
        assert!(mesh_cylinder(1.0, 1.0, 2).is_none());
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let m = mesh_sphere(2.0, 12, 6).unwrap();
        assert_eq!(m.draw_count(), 12 * 6 * 6);
        for i in 0..m.vertex_count() {
            let p = m.position(i).unwrap();
            assert!((p.length() - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn sphere_vertex_limit() {
        assert!(mesh_sphere(1.0, 400, 400).is_none());
    }

    #[test]
    fn wire_box_has_twelve_edges() {
        let m = mesh_wire_box(0.0, 0.0, 0.0, 1.0, 1.0, 1.0).unwrap();
        assert_eq!(m.draw_mode(), DrawMode::Lines);
        assert_eq!(m.draw_count(), 24);
    }
}
