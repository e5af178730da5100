//! Rendering subsystem.
//!
//! [`RenderContext`] holds the current transform, render state and material
//! and turns mesh draws into backend [`DrawCall`]s. Meshes are filled either
//! directly or through the begin / vertex / end protocol of [`DrawSession`].
//!
//! Convention:
//! - Matrices are column-major; transforms compose on the right.
//! - Clip depth is `0..1`; the GUI preset puts the origin top-left, Y down.

mod backend;
mod ctx;
mod geometry;
mod gpu;
mod immediate;
mod mesh;
mod model;
mod null;
mod shader;
mod shapes;
mod state;
mod texture;
mod topology;

pub use backend::{
    BufferId, BufferKind, DrawCall, DrawIndices, Owned, PixelFormat, Primitive, ProgramId,
    ReleaseQueue, RenderBackend, Resource, TextureDesc, TextureId,
};
pub use ctx::{DEFAULT_BACKGROUND, REUSABLE_MESH_INDICES, REUSABLE_MESH_VERTICES, RenderContext};
pub use geometry::{mesh_box, mesh_cube, mesh_cylinder, mesh_sphere, mesh_wire_box};
pub use gpu::{WgpuBackend, WgpuBackendInit};
pub use immediate::DrawSession;
pub use mesh::{MAX_MESH_VERTICES, Mesh, MeshFlags, MeshPart, UploadHint, VboStatus, VertexLayout};
pub use model::Model;
pub use null::{DrawRecord, NullBackend, NullStats};
pub use shader::{
    DEFAULT_SHADER_SOURCE, SAMPLER_BINDING, Shader, ShaderUniform, ShaderUniforms, TEXTURE_BINDING,
    UNIFORM_BINDING, VertexAttribute, preamble, with_preamble,
};
pub use state::{ColorType, Material, RenderState};
pub use texture::{
    FilterMode, Image, MipLevel, Texture, TextureFlags, TextureFormat, TextureSampling, WrapMode,
};
pub use topology::{DrawMode, auto_indices, line_loop_to_list, triangle_fan_to_list};

/// Render context on the wgpu backend, as handed to applications.
pub type Gfx = RenderContext<WgpuBackend>;
