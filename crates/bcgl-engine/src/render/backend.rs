//! GPU backend seam.
//!
//! The render context talks to the GPU only through [`RenderBackend`].
//! Resource values (meshes, textures, shaders) hold [`Owned`] handles that
//! push their id onto a [`ReleaseQueue`] when dropped; the context drains the
//! queue into the backend, so every handle is destroyed exactly once.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::{Rc, Weak};

use anyhow::Result;

use crate::paint::Color;

use super::mesh::{UploadHint, VertexLayout};
use super::shader::ShaderUniforms;
use super::state::RenderState;
use super::texture::{MipLevel, TextureSampling};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// GPU pixel format of a texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PixelFormat {
    /// One channel, sampled as alpha.
    Alpha8,
    Rgba8,
}

impl PixelFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Alpha8 => 1,
            PixelFormat::Rgba8 => 4,
        }
    }
}

#[derive(Debug)]
pub struct TextureDesc<'a> {
    pub label: &'a str,
    pub format: PixelFormat,
    pub sampling: TextureSampling,
    /// Level 0 first; one entry unless mipmapped.
    pub levels: &'a [MipLevel],
}

/// Primitive assembly after loop/fan/quad lowering.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Primitive {
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

/// What a draw reads its vertices through.
#[derive(Debug, Clone)]
pub enum DrawIndices<'a> {
    /// Vertices `range` in order.
    Vertices(Range<u32>),
    /// Indices `range` of an index buffer.
    Buffer(BufferId, Range<u32>),
    /// Indices generated on the CPU for this draw only.
    Inline(&'a [u16]),
}

#[derive(Debug, Clone)]
pub struct DrawCall<'a> {
    pub program: ProgramId,
    pub vertex_buffer: BufferId,
    pub layout: VertexLayout,
    pub primitive: Primitive,
    pub indices: DrawIndices<'a>,
    pub state: RenderState,
    pub texture: Option<TextureId>,
    pub uniforms: &'a ShaderUniforms,
}

/// GPU operations needed by the render context.
///
/// Creation is fallible; updates and destruction of unknown ids log and
/// return.
pub trait RenderBackend {
    fn create_buffer(&mut self, kind: BufferKind, data: &[u8], hint: UploadHint)
    -> Result<BufferId>;
    fn update_buffer(&mut self, id: BufferId, data: &[u8]);
    fn destroy_buffer(&mut self, id: BufferId);

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId>;
    fn update_texture(&mut self, id: TextureId, levels: &[MipLevel]);
    fn destroy_texture(&mut self, id: TextureId);

    fn create_program(&mut self, label: &str, source: &str) -> Result<ProgramId>;
    fn destroy_program(&mut self, id: ProgramId);

    /// Clears color and depth of the current target.
    fn clear(&mut self, color: Color);
    fn draw(&mut self, call: &DrawCall<'_>);

    /// Whether `RenderState::wireframe` is honored.
    fn supports_wireframe(&self) -> bool {
        true
    }
}

/// GPU handle awaiting destruction.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Resource {
    Buffer(BufferId),
    Texture(TextureId),
    Program(ProgramId),
}

/// Shared list of handles whose owners were dropped.
#[derive(Debug, Clone, Default)]
pub struct ReleaseQueue(Rc<RefCell<Vec<Resource>>>);

impl ReleaseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, r: Resource) {
        self.0.borrow_mut().push(r);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Destroys every queued handle on `backend`.
    pub fn drain_into<B: RenderBackend + ?Sized>(&self, backend: &mut B) {
        let pending = std::mem::take(&mut *self.0.borrow_mut());
        for r in pending {
            match r {
                Resource::Buffer(id) => backend.destroy_buffer(id),
                Resource::Texture(id) => backend.destroy_texture(id),
                Resource::Program(id) => backend.destroy_program(id),
            }
        }
    }
}

/// Owning wrapper around a backend id; queues the id for release on drop.
///
/// Holds the queue weakly: once every `ReleaseQueue` clone is gone the
/// backend has been dropped with it, and dropping the handle does nothing.
#[derive(Debug)]
pub struct Owned<T: Copy + Into<Resource>> {
    id: T,
    release: Weak<RefCell<Vec<Resource>>>,
}

impl<T: Copy + Into<Resource>> Owned<T> {
    pub fn new(id: T, release: &ReleaseQueue) -> Self {
        Self {
            id,
            release: Rc::downgrade(&release.0),
        }
    }

    #[inline]
    pub fn id(&self) -> T {
        self.id
    }
}

impl<T: Copy + Into<Resource>> Drop for Owned<T> {
    fn drop(&mut self) {
        if let Some(queue) = self.release.upgrade() {
            queue.borrow_mut().push(self.id.into());
        }
    }
}

impl From<BufferId> for Resource {
    fn from(id: BufferId) -> Self {
        Resource::Buffer(id)
    }
}

impl From<TextureId> for Resource {
    fn from(id: TextureId) -> Self {
        Resource::Texture(id)
    }
}

impl From<ProgramId> for Resource {
    fn from(id: ProgramId) -> Self {
        Resource::Program(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::NullBackend;

    #[test]
    fn dropping_owned_queues_exactly_once() {
        let mut backend = NullBackend::new();
        let release = ReleaseQueue::new();

        let id = backend
            .create_buffer(BufferKind::Vertex, &[0u8; 16], UploadHint::Static)
            .unwrap();
        let owned = Owned::new(id, &release);
        assert_eq!(owned.id(), id);
        drop(owned);

        assert_eq!(release.len(), 1);
        release.drain_into(&mut backend);
        release.drain_into(&mut backend);

        assert!(release.is_empty());
        assert_eq!(backend.stats().live_buffers, 0);
        assert_eq!(backend.stats().invalid_frees, 0);
    }

    #[test]
    fn owned_outliving_its_queue_is_inert() {
        let release = ReleaseQueue::new();
        let owned = Owned::new(BufferId(7), &release);
        let orphan = Owned::new(BufferId(8), &release);

        drop(owned);
        assert_eq!(release.len(), 1);

        drop(release);
        assert_eq!(orphan.release.strong_count(), 0);
        drop(orphan);
    }
}
