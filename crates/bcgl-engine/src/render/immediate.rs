//! Begin / vertex / end recording into a mesh.
//!
//! A [`DrawSession`] is either idle or recording into a mesh it owns for the
//! duration of the recording. Attribute setters are sticky: each vertex
//! copies whatever was last set.

use crate::paint::Color;

use super::mesh::Mesh;
use super::topology::{DrawMode, auto_indices};

/// Sticky per-vertex attribute values.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Staging {
    position: [f32; 4],
    normal: [f32; 4],
    texcoord: [f32; 4],
    color: [f32; 4],
}

impl Default for Staging {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0, 0.0],
            texcoord: [0.0, 0.0, 0.0, 0.0],
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug)]
struct Recording {
    mesh: Mesh,
    mode: DrawMode,
    vertices: usize,
    indices: usize,
    staging: Staging,
}

/// Immediate-mode recorder.
#[derive(Debug, Default)]
pub struct DrawSession {
    active: Option<Recording>,
}

impl DrawSession {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Mesh being recorded, if any.
    pub fn mesh(&self) -> Option<&Mesh> {
        self.active.as_ref().map(|r| &r.mesh)
    }

    /// Vertices written since `begin`.
    pub fn vertex_counter(&self) -> usize {
        self.active.as_ref().map_or(0, |r| r.vertices)
    }

    /// Starts recording into `mesh`.
    ///
    /// Fails and hands the mesh back if a recording is already open.
    pub fn begin(&mut self, mut mesh: Mesh, mode: DrawMode) -> Result<(), Mesh> {
        if self.active.is_some() {
            log::warn!("mesh already locked");
            return Err(mesh);
        }
        if mode == DrawMode::Quads && !mesh.is_indexed() {
            log::error!("Quads recorded into a mesh without indices; it cannot be drawn as quads");
        }

        mesh.set_draw(mode, 0);
        self.active = Some(Recording {
            mesh,
            mode,
            vertices: 0,
            indices: 0,
            staging: Staging::default(),
        });
        Ok(())
    }

    /// Appends a vertex built from the staging values and returns its index.
    pub fn vertex3(&mut self, x: f32, y: f32, z: f32) -> Option<u16> {
        let Some(rec) = self.active.as_mut() else {
            log::warn!("mesh not locked");
            return None;
        };
        if rec.vertices == rec.mesh.vertex_count() {
            log::warn!("mesh limit reached ({} vertices)", rec.vertices);
            return None;
        }

        rec.staging.position = [x, y, z, 0.0];
        let layout = rec.mesh.layout();
        let total = layout.total();
        let index = rec.vertices;
        let dst = &mut rec.mesh.vertices_mut()[index * total..(index + 1) * total];

        let attrs = [
            (layout.position, &rec.staging.position),
            (layout.normal, &rec.staging.normal),
            (layout.texcoord, &rec.staging.texcoord),
            (layout.color, &rec.staging.color),
        ];
        let mut at = 0;
        for (comps, value) in attrs {
            let n = comps as usize;
            dst[at..at + n].copy_from_slice(&value[..n]);
            at += n;
        }

        rec.vertices += 1;
        // vertex_count <= MAX_MESH_VERTICES, so the index fits.
        Some(index as u16)
    }

    #[inline]
    pub fn vertex2(&mut self, x: f32, y: f32) -> Option<u16> {
        self.vertex3(x, y, 0.0)
    }

    pub fn tex_coord(&mut self, u: f32, v: f32) {
        if let Some(rec) = self.active.as_mut() {
            rec.staging.texcoord = [u, v, 0.0, 0.0];
        }
    }

    pub fn normal(&mut self, x: f32, y: f32, z: f32) {
        if let Some(rec) = self.active.as_mut() {
            rec.staging.normal = [x, y, z, 0.0];
        }
    }

    pub fn color4(&mut self, r: f32, g: f32, b: f32, a: f32) {
        if let Some(rec) = self.active.as_mut() {
            rec.staging.color = [r, g, b, a];
        }
    }

    #[inline]
    pub fn color3(&mut self, r: f32, g: f32, b: f32) {
        self.color4(r, g, b, 1.0);
    }

    #[inline]
    pub fn color(&mut self, c: Color) {
        self.color4(c.r, c.g, c.b, c.a);
    }

    /// Appends an index. Returns `false` when idle, unindexed or full.
    pub fn index(&mut self, i: u16) -> bool {
        let Some(rec) = self.active.as_mut() else {
            log::warn!("mesh not locked");
            return false;
        };
        push_index(rec, i)
    }

    /// Finishes recording and returns the mesh.
    ///
    /// An indexed mesh with no appended indices gets generated ones; see
    /// [`auto_indices`].
    pub fn end(&mut self) -> Option<Mesh> {
        let Some(mut rec) = self.active.take() else {
            log::warn!("end without begin");
            return None;
        };

        if rec.mesh.is_indexed() && rec.indices == 0 {
            if rec.mode == DrawMode::Quads && rec.vertices % 4 != 0 {
                log::warn!(
                    "Quads recording of {} vertices leaves {} unpaired",
                    rec.vertices,
                    rec.vertices % 4
                );
            }
            for i in auto_indices(rec.mode, rec.vertices) {
                if !push_index(&mut rec, i as u16) {
                    break;
                }
            }
        }

        let count = if rec.mesh.is_indexed() { rec.indices } else { rec.vertices };
        rec.mesh.set_draw(rec.mode, count);
        Some(rec.mesh)
    }
}

fn push_index(rec: &mut Recording, i: u16) -> bool {
    if !rec.mesh.is_indexed() {
        log::warn!("mesh has no index buffer");
        return false;
    }
    if rec.indices == rec.mesh.index_count() {
        log::warn!("mesh limit reached ({} indices)", rec.indices);
        return false;
    }
    rec.mesh.indices_mut()[rec.indices] = i;
    rec.indices += 1;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MeshFlags;

    fn mesh(flags: MeshFlags, v: usize, i: usize) -> Mesh {
        Mesh::new(flags, v, i).unwrap()
    }

    // ── protocol ──────────────────────────────────────────────────────────

    #[test]
    fn quad_generates_two_triangles() {
        let mut s = DrawSession::new();
        s.begin(mesh(MeshFlags::DEFAULT, 4, 6), DrawMode::Quads).unwrap();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            s.vertex2(x, y);
        }
        let m = s.end().unwrap();
        assert_eq!(m.indices(), &[0, 1, 2, 0, 2, 3]);
        assert_eq!(m.draw_count(), 6);
        assert_eq!(m.draw_mode(), DrawMode::Quads);
        assert!(!s.is_recording());
    }

    #[test]
    fn double_begin_hands_mesh_back() {
        let mut s = DrawSession::new();
        s.begin(mesh(MeshFlags::POS3, 3, 0), DrawMode::Triangles).unwrap();
        let rejected = s.begin(mesh(MeshFlags::POS2, 5, 0), DrawMode::Lines).unwrap_err();
        assert_eq!(rejected.vertex_count(), 5);
        assert_eq!(s.mesh().unwrap().vertex_count(), 3);
    }

    #[test]
    fn calls_while_idle_are_rejected() {
        let mut s = DrawSession::new();
        assert_eq!(s.vertex3(1.0, 2.0, 3.0), None);
        assert!(!s.index(0));
        assert!(s.end().is_none());
        s.color3(1.0, 0.0, 0.0);
    }

    #[test]
    fn explicit_indices_suppress_generation() {
        let mut s = DrawSession::new();
        s.begin(mesh(MeshFlags::POS2, 3, 6), DrawMode::Triangles).unwrap();
        s.vertex2(0.0, 0.0);
        s.vertex2(1.0, 0.0);
        s.vertex2(0.0, 1.0);
        assert!(s.index(2));
        assert!(s.index(1));
        assert!(s.index(0));
        let m = s.end().unwrap();
        assert_eq!(&m.indices()[..3], &[2, 1, 0]);
        assert_eq!(m.draw_count(), 3);
    }

    // ── capacity ──────────────────────────────────────────────────────────

    #[test]
    fn vertex_beyond_capacity_is_a_noop() {
        let mut s = DrawSession::new();
        s.begin(mesh(MeshFlags::POS2, 2, 0), DrawMode::Lines).unwrap();
        assert_eq!(s.vertex2(0.0, 0.0), Some(0));
        assert_eq!(s.vertex2(1.0, 1.0), Some(1));
        assert_eq!(s.vertex2(2.0, 2.0), None);
        let m = s.end().unwrap();
        assert_eq!(m.draw_count(), 2);
        assert_eq!(m.vertices(), &[0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn generated_indices_stop_at_capacity() {
        let mut s = DrawSession::new();
        s.begin(mesh(MeshFlags::POS2, 8, 6), DrawMode::Quads).unwrap();
        for i in 0..8 {
            s.vertex2(i as f32, 0.0);
        }
        let m = s.end().unwrap();
        assert_eq!(m.draw_count(), 6);
    }

    #[test]
    fn index_on_unindexed_mesh_fails() {
        let mut s = DrawSession::new();
        s.begin(mesh(MeshFlags::POS2, 4, 0), DrawMode::Quads).unwrap();
        assert!(!s.index(0));
    }

    // ── staging ───────────────────────────────────────────────────────────

    #[test]
    fn color_is_sticky_until_changed() {
        let mut s = DrawSession::new();
        s.begin(mesh(MeshFlags::POS3 | MeshFlags::COL4, 3, 0), DrawMode::Triangles)
            .unwrap();
        s.color4(1.0, 0.0, 0.0, 1.0);
        s.vertex3(0.0, 0.0, 0.0);
        s.vertex3(1.0, 0.0, 0.0);
        s.color(Color::BLUE);
        s.vertex3(0.0, 1.0, 0.0);
        let m = s.end().unwrap();

        assert_eq!(&m.vertex(0).unwrap()[3..], &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(&m.vertex(1).unwrap()[3..], &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(&m.vertex(2).unwrap()[3..], &[0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn staging_defaults_fill_enabled_attributes() {
        let mut s = DrawSession::new();
        s.begin(mesh(MeshFlags::DEFAULT, 1, 0), DrawMode::Triangles).unwrap();
        s.vertex3(4.0, 5.0, 6.0);
        let m = s.end().unwrap();
        assert_eq!(
            m.vertex(0).unwrap(),
            &[4.0, 5.0, 6.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]
        );
    }

    #[test]
    fn begin_resets_staging() {
        let mut s = DrawSession::new();
        s.begin(mesh(MeshFlags::POS2 | MeshFlags::COL3, 1, 0), DrawMode::Lines).unwrap();
        s.color3(0.5, 0.5, 0.5);
        s.end();
        s.begin(mesh(MeshFlags::POS2 | MeshFlags::COL3, 1, 0), DrawMode::Lines).unwrap();
        s.vertex2(0.0, 0.0);
        assert_eq!(&s.end().unwrap().vertices()[2..], &[1.0, 1.0, 1.0]);
    }
}
