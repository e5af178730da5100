//! Headless backend.
//!
//! Keeps buffer contents and a log of draws in memory. Used by tests and by
//! applications that run without a window.

use std::collections::HashMap;

use anyhow::{Result, bail, ensure};

use crate::paint::Color;

use super::backend::{
    BufferId, BufferKind, DrawCall, DrawIndices, Primitive, ProgramId, RenderBackend, TextureDesc,
    TextureId,
};
use super::mesh::UploadHint;
use super::shader::ShaderUniforms;
use super::state::RenderState;
use super::texture::MipLevel;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NullStats {
    pub live_buffers: usize,
    pub live_textures: usize,
    pub live_programs: usize,
    pub buffer_updates: usize,
    pub clears: usize,
    /// Destroy or update calls naming an id that is not live.
    pub invalid_frees: usize,
}

/// One recorded draw, with its index stream resolved.
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub program: ProgramId,
    pub primitive: Primitive,
    /// Indices read by the draw; `None` for non-indexed draws.
    pub indices: Option<Vec<u16>>,
    /// Vertices or indices consumed.
    pub count: u32,
    pub state: RenderState,
    pub texture: Option<TextureId>,
    pub uniforms: ShaderUniforms,
}

#[derive(Debug)]
struct NullBuffer {
    kind: BufferKind,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct NullBackend {
    next_id: u32,
    buffers: HashMap<BufferId, NullBuffer>,
    textures: HashMap<TextureId, (u32, u32)>,
    programs: HashMap<ProgramId, String>,
    stats: NullStats,
    draws: Vec<DrawRecord>,
    wireframe: bool,
}

impl NullBackend {
    pub fn new() -> Self {
        Self {
            wireframe: true,
            ..Self::default()
        }
    }

    /// Backend that reports no line polygon mode.
    pub fn without_wireframe() -> Self {
        Self {
            wireframe: false,
            ..Self::default()
        }
    }

    pub fn stats(&self) -> NullStats {
        NullStats {
            live_buffers: self.buffers.len(),
            live_textures: self.textures.len(),
            live_programs: self.programs.len(),
            ..self.stats.clone()
        }
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn take_draws(&mut self) -> Vec<DrawRecord> {
        std::mem::take(&mut self.draws)
    }

    /// Contents of a live buffer.
    pub fn buffer_data(&self, id: BufferId) -> Option<&[u8]> {
        self.buffers.get(&id).map(|b| b.data.as_slice())
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn index_slice(&self, id: BufferId, range: std::ops::Range<u32>) -> Option<Vec<u16>> {
        let buf = self.buffers.get(&id)?;
        if buf.kind != BufferKind::Index {
            return None;
        }
        let all: Vec<u16> = buf
            .data
            .chunks_exact(2)
            .map(|c| u16::from_ne_bytes([c[0], c[1]]))
            .collect();
        all.get(range.start as usize..range.end as usize).map(<[u16]>::to_vec)
    }
}

impl RenderBackend for NullBackend {
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        data: &[u8],
        hint: UploadHint,
    ) -> Result<BufferId> {
        ensure!(!data.is_empty(), "zero-sized buffer");
        let id = BufferId(self.next());
        log::trace!("NullBackend: buffer {id:?} {kind:?} {} bytes ({hint:?})", data.len());
        self.buffers.insert(
            id,
            NullBuffer {
                kind,
                data: data.to_vec(),
            },
        );
        Ok(id)
    }

    fn update_buffer(&mut self, id: BufferId, data: &[u8]) {
        let Some(buf) = self.buffers.get_mut(&id) else {
            log::warn!("NullBackend: update of unknown buffer {id:?}");
            self.stats.invalid_frees += 1;
            return;
        };
        let n = data.len().min(buf.data.len());
        buf.data[..n].copy_from_slice(&data[..n]);
        self.stats.buffer_updates += 1;
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        if self.buffers.remove(&id).is_none() {
            log::warn!("NullBackend: destroy of unknown buffer {id:?}");
            self.stats.invalid_frees += 1;
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId> {
        let Some(base) = desc.levels.first() else {
            bail!("texture '{}' has no data", desc.label);
        };
        let id = TextureId(self.next());
        self.textures.insert(id, (base.width, base.height));
        Ok(id)
    }

    fn update_texture(&mut self, id: TextureId, levels: &[MipLevel]) {
        match (self.textures.get(&id), levels.first()) {
            (Some(&(w, h)), Some(base)) if base.width == w && base.height == h => {}
            (Some(_), _) => log::warn!("NullBackend: texture {id:?} update with mismatched size"),
            (None, _) => {
                log::warn!("NullBackend: update of unknown texture {id:?}");
                self.stats.invalid_frees += 1;
            }
        }
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if self.textures.remove(&id).is_none() {
            log::warn!("NullBackend: destroy of unknown texture {id:?}");
            self.stats.invalid_frees += 1;
        }
    }

    fn create_program(&mut self, label: &str, source: &str) -> Result<ProgramId> {
        ensure!(
            source.contains("fn vs_main") && source.contains("fn fs_main"),
            "shader '{label}' must define vs_main and fs_main"
        );
        let id = ProgramId(self.next());
        self.programs.insert(id, label.to_owned());
        Ok(id)
    }

    fn destroy_program(&mut self, id: ProgramId) {
        if self.programs.remove(&id).is_none() {
            log::warn!("NullBackend: destroy of unknown program {id:?}");
            self.stats.invalid_frees += 1;
        }
    }

    fn clear(&mut self, _color: Color) {
        self.stats.clears += 1;
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        let (indices, count) = match &call.indices {
            DrawIndices::Vertices(r) => (None, r.end - r.start),
            DrawIndices::Buffer(id, r) => (self.index_slice(*id, r.clone()), r.end - r.start),
            DrawIndices::Inline(ix) => (Some(ix.to_vec()), ix.len() as u32),
        };
        self.draws.push(DrawRecord {
            program: call.program,
            primitive: call.primitive,
            indices,
            count,
            state: call.state,
            texture: call.texture,
            uniforms: *call.uniforms,
        });
    }

    fn supports_wireframe(&self) -> bool {
        self.wireframe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_live_handles() {
        let mut b = NullBackend::new();
        let v = b.create_buffer(BufferKind::Vertex, &[1, 2, 3, 4], UploadHint::Dynamic).unwrap();
        let p = b.create_program("p", "fn vs_main() {} fn fs_main() {}").unwrap();
        assert_eq!(b.stats().live_buffers, 1);
        assert_eq!(b.stats().live_programs, 1);

        b.update_buffer(v, &[9, 9]);
        assert_eq!(b.buffer_data(v), Some(&[9u8, 9, 3, 4][..]));

        b.destroy_buffer(v);
        b.destroy_buffer(v);
        b.destroy_program(p);
        let s = b.stats();
        assert_eq!((s.live_buffers, s.live_programs), (0, 0));
        assert_eq!(s.invalid_frees, 1);
    }

    #[test]
    fn program_without_entry_points_fails() {
        let mut b = NullBackend::new();
        assert!(b.create_program("bad", "fn main() {}").is_err());
        assert!(b.create_buffer(BufferKind::Index, &[], UploadHint::Static).is_err());
    }
}
