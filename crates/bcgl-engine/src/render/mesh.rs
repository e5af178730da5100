//! CPU mesh storage and its GPU upload state.

use std::io;

use bcgl_math::{Mat4, Vec3, Vec4};
use bitflags::bitflags;

use super::backend::{BufferId, Owned};
use super::topology::DrawMode;

/// Largest vertex count addressable by `u16` indices.
pub const MAX_MESH_VERTICES: usize = 1 << 16;

bitflags! {
    /// Vertex attributes present in a mesh.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct MeshFlags: u32 {
        const POS2 = 0x1;
        const POS3 = 0x2;
        const POS4 = 0x4;
        const NORM = 0x8;
        const TEX2 = 0x10;
        const TEX3 = 0x20;
        const COL1 = 0x40;
        const COL3 = 0x80;
        const COL4 = 0x100;

        const DEFAULT =
            Self::POS3.bits() | Self::NORM.bits() | Self::TEX2.bits() | Self::COL4.bits();
    }
}

/// Float counts per attribute, in interleaving order.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct VertexLayout {
    pub position: u8,
    pub normal: u8,
    pub texcoord: u8,
    pub color: u8,
}

impl VertexLayout {
    pub fn from_flags(flags: MeshFlags) -> Self {
        let position = if flags.contains(MeshFlags::POS2) {
            2
        } else if flags.contains(MeshFlags::POS3) {
            3
        } else if flags.contains(MeshFlags::POS4) {
            4
        } else {
            0
        };
        let normal = if flags.contains(MeshFlags::NORM) { 3 } else { 0 };
        let texcoord = if flags.contains(MeshFlags::TEX2) {
            2
        } else if flags.contains(MeshFlags::TEX3) {
            3
        } else {
            0
        };
        let color = if flags.contains(MeshFlags::COL3) {
            3
        } else if flags.contains(MeshFlags::COL4) {
            4
        } else {
            0
        };
        Self {
            position,
            normal,
            texcoord,
            color,
        }
    }

    /// Floats per vertex.
    #[inline]
    pub const fn total(self) -> usize {
        (self.position + self.normal + self.texcoord + self.color) as usize
    }

    #[inline]
    pub const fn stride_bytes(self) -> usize {
        self.total() * std::mem::size_of::<f32>()
    }

    #[inline]
    pub const fn normal_offset(self) -> usize {
        self.position as usize
    }

    #[inline]
    pub const fn texcoord_offset(self) -> usize {
        (self.position + self.normal) as usize
    }

    #[inline]
    pub const fn color_offset(self) -> usize {
        (self.position + self.normal + self.texcoord) as usize
    }
}

/// GPU residency of a mesh.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VboStatus {
    Empty,
    Static,
    Dynamic,
}

/// Expected update frequency, passed to the first upload.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UploadHint {
    Static,
    Dynamic,
}

/// Named sub-range of a mesh's draw range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshPart {
    pub name: Option<String>,
    pub start: usize,
    pub count: usize,
}

impl MeshPart {
    pub fn whole(mesh: &Mesh) -> Self {
        Self {
            name: None,
            start: 0,
            count: mesh.draw_count(),
        }
    }
}

/// Interleaved vertex data, optional `u16` indices and their GPU buffers.
///
/// CPU buffers are sized at creation and never grow, so GPU updates always
/// fit the allocation made by the first upload. GPU buffers are released
/// when the mesh is dropped.
#[derive(Debug)]
pub struct Mesh {
    flags: MeshFlags,
    layout: VertexLayout,
    vertices: Vec<f32>,
    indices: Vec<u16>,
    draw_mode: DrawMode,
    draw_count: usize,

    pub(crate) status: VboStatus,
    pub(crate) vbo: Option<Owned<BufferId>>,
    pub(crate) ibo: Option<Owned<BufferId>>,
}

impl Mesh {
    /// Allocates a zeroed mesh.
    ///
    /// Returns `None` (with a warning) for an empty or oversized vertex count
    /// or a layout without positions.
    pub fn new(flags: MeshFlags, vertex_count: usize, index_count: usize) -> Option<Mesh> {
        let layout = VertexLayout::from_flags(flags);
        if vertex_count == 0 {
            log::warn!("mesh must have at least one vertex");
            return None;
        }
        if vertex_count > MAX_MESH_VERTICES {
            log::warn!("mesh of {vertex_count} vertices exceeds {MAX_MESH_VERTICES}");
            return None;
        }
        if layout.position == 0 {
            log::warn!("mesh format {flags:?} has no position attribute");
            return None;
        }

        let draw_count = if index_count > 0 { index_count } else { vertex_count };
        Some(Mesh {
            flags,
            layout,
            vertices: vec![0.0; vertex_count * layout.total()],
            indices: vec![0; index_count],
            draw_mode: DrawMode::Triangles,
            draw_count,
            status: VboStatus::Empty,
            vbo: None,
            ibo: None,
        })
    }

    /// Builds a mesh from existing data.
    pub fn from_data(flags: MeshFlags, vertices: &[f32], indices: &[u16]) -> Option<Mesh> {
        let total = VertexLayout::from_flags(flags).total();
        if total == 0 || vertices.len() % total != 0 {
            log::warn!(
                "vertex data of {} floats is not a multiple of the {total}-float stride",
                vertices.len()
            );
            return None;
        }
        let mut mesh = Mesh::new(flags, vertices.len() / total, indices.len())?;
        mesh.vertices.copy_from_slice(vertices);
        mesh.indices.copy_from_slice(indices);
        Some(mesh)
    }

    /// CPU copy with the same draw settings; not uploaded.
    pub fn copy(&self) -> Mesh {
        Mesh {
            flags: self.flags,
            layout: self.layout,
            vertices: self.vertices.clone(),
            indices: self.indices.clone(),
            draw_mode: self.draw_mode,
            draw_count: self.draw_count,
            status: VboStatus::Empty,
            vbo: None,
            ibo: None,
        }
    }

    #[inline]
    pub fn flags(&self) -> MeshFlags {
        self.flags
    }

    #[inline]
    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    #[inline]
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    #[inline]
    pub fn vertices_mut(&mut self) -> &mut [f32] {
        &mut self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    #[inline]
    pub fn indices_mut(&mut self) -> &mut [u16] {
        &mut self.indices
    }

    /// Vertex capacity.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.layout.total()
    }

    /// Index capacity.
    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    #[inline]
    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    /// Elements drawn: indices if indexed, else vertices.
    #[inline]
    pub fn draw_count(&self) -> usize {
        self.draw_count
    }

    pub fn set_draw(&mut self, mode: DrawMode, count: usize) {
        let cap = if self.is_indexed() { self.index_count() } else { self.vertex_count() };
        if count > cap {
            log::warn!("draw count {count} clamped to {cap}");
        }
        self.draw_mode = mode;
        self.draw_count = count.min(cap);
    }

    #[inline]
    pub fn status(&self) -> VboStatus {
        self.status
    }

    #[inline]
    pub fn is_uploaded(&self) -> bool {
        self.vbo.is_some()
    }

    /// Size of the vertex data in bytes.
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.vertices.len() * std::mem::size_of::<f32>()
    }

    /// Drops GPU buffers; CPU data is kept.
    pub fn release_gpu(&mut self) {
        self.vbo = None;
        self.ibo = None;
        self.status = VboStatus::Empty;
    }

    /// Floats of vertex `i`.
    pub fn vertex(&self, i: usize) -> Option<&[f32]> {
        let n = self.layout.total();
        self.vertices.get(i * n..(i + 1) * n)
    }

    /// Position of vertex `i`, missing components zero.
    pub fn position(&self, i: usize) -> Option<Vec3> {
        let v = self.vertex(i)?;
        let p = self.layout.position as usize;
        Some(Vec3::new(v[0], v[1], if p > 2 { v[2] } else { 0.0 }))
    }

    /// Applies `m` to positions (w = 1) and normals (w = 0).
    pub fn transform(&mut self, m: &Mat4) {
        let total = self.layout.total();
        let p = self.layout.position as usize;
        let has_normal = self.layout.normal == 3;
        let n = self.layout.normal_offset();

        for v in self.vertices.chunks_exact_mut(total) {
            let z = if p > 2 { v[2] } else { 0.0 };
            let out = *m * Vec4::new(v[0], v[1], z, 1.0);
            v[0] = out.x;
            v[1] = out.y;
            if p > 2 {
                v[2] = out.z;
            }

            if has_normal {
                let nv = *m * Vec4::new(v[n], v[n + 1], v[n + 2], 0.0);
                v[n] = nv.x;
                v[n + 1] = nv.y;
                v[n + 2] = nv.z;
            }
        }
    }

    /// Bounding box of all vertex positions.
    pub fn aabb(&self) -> Option<(Vec3, Vec3)> {
        let first = self.position(0)?;
        let bounds = (1..self.vertex_count())
            .filter_map(|i| self.position(i))
            .fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(bounds)
    }

    /// Writes the mesh as a Wavefront OBJ object.
    ///
    /// Faces are emitted only when the index count is a multiple of three.
    pub fn write_obj<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let l = self.layout;
        let (p, t, n) = (l.position as usize, l.texcoord as usize, l.normal as usize);

        writeln!(out, "o Dump")?;
        let line = |tag: &str, offset: usize, comps: usize, out: &mut W| -> io::Result<()> {
            for v in self.vertices.chunks_exact(l.total()) {
                write!(out, "{tag}")?;
                for c in &v[offset..offset + comps] {
                    write!(out, " {c:.6}")?;
                }
                writeln!(out)?;
            }
            Ok(())
        };
        line("v", 0, p, out)?;
        if t > 0 {
            line("vt", l.texcoord_offset(), t, out)?;
        }
        if n > 0 {
            line("vn", l.normal_offset(), n, out)?;
        }

        if self.indices.is_empty() {
            return Ok(());
        }
        if self.indices.len() % 3 != 0 {
            log::warn!("index count {} is not a multiple of 3; faces skipped", self.indices.len());
            return Ok(());
        }
        for tri in self.indices.chunks_exact(3) {
            write!(out, "f")?;
            for &i in tri {
                let i = i as usize + 1;
                match (t > 0, n > 0) {
                    (false, false) => write!(out, " {i}")?,
                    (true, false) => write!(out, " {i}/{i}")?,
                    (false, true) => write!(out, " {i}//{i}")?,
                    (true, true) => write!(out, " {i}/{i}/{i}")?,
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Concatenates same-format meshes into one, with a part per source.
    ///
    /// Sources must agree on format and on being indexed. The result takes
    /// the first source's draw mode.
    pub fn merge(sources: &[(&str, &Mesh)]) -> Option<(Mesh, Vec<MeshPart>)> {
        let (_, first) = sources.first()?;
        if let Some((name, _)) = sources.iter().find(|(_, m)| m.flags != first.flags) {
            log::warn!("cannot merge mesh '{name}': format differs from {:?}", first.flags);
            return None;
        }
        if sources.iter().any(|(_, m)| m.is_indexed() != first.is_indexed()) {
            log::warn!("cannot merge indexed and non-indexed meshes");
            return None;
        }

        let vertex_total: usize = sources.iter().map(|(_, m)| m.vertex_count()).sum();
        let index_total: usize = sources.iter().map(|(_, m)| m.index_count()).sum();
        let mut merged = Mesh::new(first.flags, vertex_total, index_total)?;

        let stride = first.layout.total();
        let mut parts = Vec::with_capacity(sources.len());
        let (mut vbase, mut ibase, mut draw_count) = (0usize, 0usize, 0usize);

        for (name, m) in sources {
            merged.vertices[vbase * stride..(vbase + m.vertex_count()) * stride]
                .copy_from_slice(&m.vertices);
            for (dst, src) in merged.indices[ibase..ibase + m.index_count()]
                .iter_mut()
                .zip(&m.indices)
            {
                // vertex_total <= MAX_MESH_VERTICES keeps this in u16 range.
                *dst = (*src as usize + vbase) as u16;
            }

            parts.push(MeshPart {
                name: Some((*name).to_owned()),
                start: if first.is_indexed() { ibase } else { vbase },
                count: m.draw_count,
            });

            vbase += m.vertex_count();
            ibase += m.index_count();
            draw_count += m.draw_count;
        }

        merged.draw_mode = first.draw_mode;
        merged.draw_count = draw_count;
        Some((merged, parts))
    }
}
