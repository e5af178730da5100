//! Render context: current state, resources and the draw entry points.
//!
//! The context owns the backend, the matrix stack, the render state, the
//! bound material and shader, and the immediate-mode [`DrawSession`]. Draws
//! snapshot all of it into a [`DrawCall`].

use anyhow::{Context as _, Result};
use bcgl_math::{Mat4, MatrixStack, Vec2, Vec3, Viewport, mat4};

use crate::paint::Color;

use super::backend::{
    BufferId, BufferKind, DrawCall, DrawIndices, Owned, ReleaseQueue, RenderBackend, TextureDesc,
};
use super::immediate::DrawSession;
use super::mesh::{Mesh, MeshFlags, MeshPart, UploadHint, VboStatus, VertexLayout};
use super::shader::{DEFAULT_SHADER_SOURCE, Shader, ShaderUniforms, with_preamble};
use super::state::{ColorType, Material, RenderState};
use super::texture::{Image, Texture, TextureFlags, TextureFormat, TextureSampling, build_levels};
use super::topology::DrawMode;

/// Capacity of the mesh behind `bc_begin` / `bc_end`.
pub const REUSABLE_MESH_VERTICES: usize = 1024;
pub const REUSABLE_MESH_INDICES: usize = 1024;

/// Clear color used until `set_background` is called.
pub const DEFAULT_BACKGROUND: Color = Color::GRAY;

pub struct RenderContext<B: RenderBackend> {
    backend: B,
    release: ReleaseQueue,

    default_shader: Shader,
    shader: Option<Shader>,

    projection: Mat4,
    stack: MatrixStack,
    viewport: Viewport,

    state: RenderState,
    material: Material,
    alpha_test: bool,
    light_position: Vec3,
    light_color: Color,
    background: Color,

    session: DrawSession,
    reusable: Option<Mesh>,
    /// The reusable mesh is the one `session` is recording into.
    reusable_recording: bool,
    pub(super) cube: Option<Mesh>,

    warned_wireframe: bool,
}

impl<B: RenderBackend> RenderContext<B> {
    /// Wraps `backend` and compiles the default shader.
    pub fn new(mut backend: B, width: u32, height: u32) -> Result<Self> {
        let release = ReleaseQueue::new();
        let program = backend
            .create_program("bcgl default", &with_preamble(DEFAULT_SHADER_SOURCE))
            .context("failed to compile the default shader")?;
        let default_shader = Shader::new("bcgl default".to_owned(), Owned::new(program, &release));

        Ok(Self {
            backend,
            release,
            default_shader,
            shader: None,
            projection: Mat4::IDENTITY,
            stack: MatrixStack::new(),
            viewport: Viewport::from_size(width as f32, height as f32),
            state: RenderState::default(),
            material: Material::default(),
            alpha_test: false,
            light_position: Vec3::ZERO,
            light_color: Color::WHITE,
            background: DEFAULT_BACKGROUND,
            session: DrawSession::new(),
            reusable: None,
            reusable_recording: false,
            cube: None,
            warned_wireframe: false,
        })
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Destroys every GPU handle whose owner has been dropped.
    pub fn collect_garbage(&mut self) {
        if !self.release.is_empty() {
            log::trace!("releasing {} GPU handles", self.release.len());
            self.release.drain_into(&mut self.backend);
        }
    }

    // ── meshes ────────────────────────────────────────────────────────────

    /// Sends the mesh's CPU data to the GPU.
    ///
    /// The first call allocates the buffers and fixes the status from `hint`;
    /// later calls overwrite them in place.
    pub fn upload_mesh(&mut self, mesh: &mut Mesh, hint: UploadHint) {
        if mesh.status == VboStatus::Static {
            log::warn!("updating a static mesh; upload it with UploadHint::Dynamic instead");
        }

        let vbo = mesh.vbo.as_ref().map(Owned::id);
        let data = bytemuck::cast_slice(mesh.vertices());
        let Some(vbo) = self.upload_buffer(BufferKind::Vertex, vbo, data, hint) else {
            return;
        };
        if mesh.vbo.is_none() {
            mesh.vbo = Some(Owned::new(vbo, &self.release));
        }

        if mesh.is_indexed() {
            let ibo = mesh.ibo.as_ref().map(Owned::id);
            let data = bytemuck::cast_slice(mesh.indices());
            let Some(ibo) = self.upload_buffer(BufferKind::Index, ibo, data, hint) else {
                return;
            };
            if mesh.ibo.is_none() {
                mesh.ibo = Some(Owned::new(ibo, &self.release));
            }
        }

        if mesh.status == VboStatus::Empty {
            mesh.status = match hint {
                UploadHint::Static => VboStatus::Static,
                UploadHint::Dynamic => VboStatus::Dynamic,
            };
        }
    }

    fn upload_buffer(
        &mut self,
        kind: BufferKind,
        existing: Option<BufferId>,
        data: &[u8],
        hint: UploadHint,
    ) -> Option<BufferId> {
        if data.is_empty() {
            return None;
        }
        if let Some(id) = existing {
            self.backend.update_buffer(id, data);
            return Some(id);
        }
        match self.backend.create_buffer(kind, data, hint) {
            Ok(id) => Some(id),
            Err(e) => {
                log::error!("failed to create {kind:?} buffer: {e:#}");
                None
            }
        }
    }

    /// Drops the mesh and releases its GPU buffers now.
    pub fn destroy_mesh(&mut self, mesh: Mesh) {
        drop(mesh);
        self.collect_garbage();
    }

    pub fn draw_mesh(&mut self, mesh: &Mesh) {
        self.draw_mesh_range(mesh, 0, mesh.draw_count());
    }

    pub fn draw_mesh_part(&mut self, mesh: &Mesh, part: &MeshPart) {
        self.draw_mesh_range(mesh, part.start, part.count);
    }

    /// Draws elements `[start, start + count)`: indices for an indexed mesh,
    /// vertices otherwise.
    pub fn draw_mesh_range(&mut self, mesh: &Mesh, start: usize, count: usize) {
        if count == 0 {
            return;
        }
        let Some(vbo) = mesh.vbo.as_ref().map(Owned::id) else {
            log::warn!("mesh drawn before upload; skipped");
            return;
        };
        let mode = mesh.draw_mode();
        if mode == DrawMode::Quads && !mesh.is_indexed() {
            log::warn!("Quads needs an indexed mesh; draw skipped");
            return;
        }

        let cap = if mesh.is_indexed() { mesh.index_count() } else { mesh.vertex_count() };
        let end = start.saturating_add(count);
        if end > cap {
            log::warn!("draw range {start}..{end} clamped to {cap}");
        }
        let (start, end) = (start.min(cap), end.min(cap));
        if start == end {
            return;
        }

        let expanded: Vec<u16>;
        let indices = if mode.needs_expansion() {
            let seq: Vec<u16> = if mesh.is_indexed() {
                mesh.indices()[start..end].to_vec()
            } else {
                (start..end).map(|i| i as u16).collect()
            };
            expanded = mode.expand(&seq);
            if expanded.is_empty() {
                return;
            }
            DrawIndices::Inline(&expanded)
        } else if mesh.is_indexed() {
            let Some(ibo) = mesh.ibo.as_ref() else {
                log::warn!("indexed mesh has no index buffer on the GPU; draw skipped");
                return;
            };
            DrawIndices::Buffer(ibo.id(), start as u32..end as u32)
        } else {
            DrawIndices::Vertices(start as u32..end as u32)
        };

        let state = self.effective_state();
        let uniforms = self.uniforms(mesh.layout());
        let call = DrawCall {
            program: self.current_shader().id(),
            vertex_buffer: vbo,
            layout: mesh.layout(),
            primitive: mode.primitive(),
            indices,
            state,
            texture: self.material.texture.as_ref().map(Texture::id),
            uniforms: &uniforms,
        };
        self.backend.draw(&call);
    }

    fn effective_state(&mut self) -> RenderState {
        let mut state = self.state;
        if state.wireframe && !self.backend.supports_wireframe() {
            if !self.warned_wireframe {
                log::warn!("wireframe not supported by this adapter; drawing filled");
                self.warned_wireframe = true;
            }
            state.wireframe = false;
        }
        state
    }

    fn uniforms(&self, layout: VertexLayout) -> ShaderUniforms {
        let texture = self.material.texture.as_ref();
        let light = self.light_position;
        ShaderUniforms {
            projection: self.projection.to_cols_array(),
            model_view: self.stack.get_raw(),
            object_color: self.material.object_color.to_array(),
            diffuse_color: self.material.diffuse_color.to_array(),
            ambient_color: self.material.ambient_color.to_array(),
            light_position: [light.x, light.y, light.z, 1.0],
            light_color: self.light_color.to_array(),
            use_texture: texture.is_some() as u32,
            alpha_only_texture: texture.is_some_and(Texture::is_alpha_only) as u32,
            alpha_test: self.alpha_test as u32,
            vertex_color_enabled: (layout.color > 0) as u32,
            light_enabled: self.state.lighting as u32,
            _pad: [0; 3],
        }
    }

    // ── immediate mode ────────────────────────────────────────────────────

    #[inline]
    pub fn session(&self) -> &DrawSession {
        &self.session
    }

    /// Starts recording into `mesh`; hands it back if a recording is open.
    pub fn begin_mesh(&mut self, mesh: Mesh, mode: DrawMode) -> Result<(), Mesh> {
        self.session.begin(mesh, mode)
    }

    pub fn vertex3(&mut self, x: f32, y: f32, z: f32) -> Option<u16> {
        self.session.vertex3(x, y, z)
    }

    pub fn vertex2(&mut self, x: f32, y: f32) -> Option<u16> {
        self.session.vertex2(x, y)
    }

    pub fn tex_coord(&mut self, u: f32, v: f32) {
        self.session.tex_coord(u, v);
    }

    pub fn normal(&mut self, x: f32, y: f32, z: f32) {
        self.session.normal(x, y, z);
    }

    pub fn color4(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.session.color4(r, g, b, a);
    }

    pub fn color3(&mut self, r: f32, g: f32, b: f32) {
        self.session.color3(r, g, b);
    }

    pub fn color(&mut self, c: Color) {
        self.session.color(c);
    }

    pub fn index(&mut self, i: u16) -> bool {
        self.session.index(i)
    }

    /// Finishes a recording started with [`begin_mesh`](Self::begin_mesh).
    pub fn end_mesh(&mut self) -> Option<Mesh> {
        if self.reusable_recording {
            log::error!("the reusable mesh is recording; finish it with bc_end");
            return None;
        }
        self.session.end()
    }

    /// Starts recording into the shared dynamic mesh.
    pub fn bc_begin(&mut self, mode: DrawMode) -> bool {
        if self.session.is_recording() {
            log::warn!("mesh already locked");
            return false;
        }
        let mesh = match self.reusable.take() {
            Some(mesh) => mesh,
            None => {
                let mesh =
                    Mesh::new(MeshFlags::DEFAULT, REUSABLE_MESH_VERTICES, REUSABLE_MESH_INDICES);
                let Some(mesh) = mesh else {
                    return false;
                };
                mesh
            }
        };
        match self.session.begin(mesh, mode) {
            Ok(()) => {
                self.reusable_recording = true;
                true
            }
            Err(mesh) => {
                self.reusable = Some(mesh);
                false
            }
        }
    }

    /// Ends the shared mesh recording, uploads it and draws it.
    pub fn bc_end(&mut self) {
        if !self.reusable_recording {
            if self.session.is_recording() {
                log::error!("bc_end called while a user mesh is recording");
            } else {
                log::warn!("bc_end without bc_begin");
            }
            return;
        }
        self.reusable_recording = false;
        let Some(mut mesh) = self.session.end() else {
            return;
        };
        self.upload_mesh(&mut mesh, UploadHint::Dynamic);
        self.draw_mesh(&mesh);
        self.reusable = Some(mesh);
    }

    // ── shaders & textures ────────────────────────────────────────────────

    /// Compiles `source` (without preamble) into a program.
    pub fn create_shader(&mut self, label: &str, source: &str) -> Option<Shader> {
        match self.backend.create_program(label, &with_preamble(source)) {
            Ok(id) => Some(Shader::new(label.to_owned(), Owned::new(id, &self.release))),
            Err(e) => {
                log::error!("failed to compile shader '{label}': {e:#}");
                None
            }
        }
    }

    /// Binds `shader`, or the default shader for `None`.
    pub fn bind_shader(&mut self, shader: Option<&Shader>) {
        self.shader = shader.cloned();
    }

    pub fn current_shader(&self) -> &Shader {
        self.shader.as_ref().unwrap_or(&self.default_shader)
    }

    pub fn default_shader(&self) -> &Shader {
        &self.default_shader
    }

    pub fn create_texture(&mut self, image: &Image, flags: TextureFlags) -> Option<Texture> {
        let Some(format) = TextureFormat::from_comps(image.comps) else {
            log::error!("unsupported image with {} components", image.comps);
            return None;
        };
        if image.width == 0 || image.height == 0 {
            log::error!("cannot create a {}x{} texture", image.width, image.height);
            return None;
        }
        if !image.has_valid_data() {
            log::error!(
                "image data is {} bytes, {}x{}x{} needs {}",
                image.data.len(),
                image.width,
                image.height,
                image.comps,
                image.expected_len()
            );
            return None;
        }
        let sampling = TextureSampling::from_flags(flags);
        let levels = build_levels(image, format, sampling.mipmap);
        let desc = TextureDesc {
            label: "bcgl texture",
            format: format.pixel_format(),
            sampling,
            levels: &levels,
        };
        match self.backend.create_texture(&desc) {
            Ok(id) => Some(Texture::new(
                Owned::new(id, &self.release),
                image.width,
                image.height,
                format,
                sampling,
            )),
            Err(e) => {
                log::error!("failed to create texture: {e:#}");
                None
            }
        }
    }

    /// Decodes an encoded image (PNG, JPEG, BMP, TGA) and uploads it.
    pub fn load_texture(&mut self, bytes: &[u8], flags: TextureFlags) -> Option<Texture> {
        let image = Image::from_memory(bytes)?;
        self.create_texture(&image, flags)
    }

    /// Re-uploads same-size, same-format data into `texture`.
    pub fn update_texture(&mut self, texture: &Texture, image: &Image) -> bool {
        if (image.width, image.height) != (texture.width(), texture.height())
            || TextureFormat::from_comps(image.comps) != Some(texture.format())
        {
            log::warn!(
                "texture update of {}x{}x{} does not match {}x{} {:?}",
                image.width,
                image.height,
                image.comps,
                texture.width(),
                texture.height(),
                texture.format()
            );
            return false;
        }
        if !image.has_valid_data() {
            log::error!(
                "texture update data is {} bytes, needs {}",
                image.data.len(),
                image.expected_len()
            );
            return false;
        }
        let levels = build_levels(image, texture.format(), texture.sampling().mipmap);
        self.backend.update_texture(texture.id(), &levels);
        true
    }

    // ── render state ──────────────────────────────────────────────────────

    #[inline]
    pub fn render_state(&self) -> RenderState {
        self.state
    }

    pub fn set_blend(&mut self, on: bool) {
        self.state.blend = on;
    }

    pub fn set_depth_test(&mut self, on: bool) {
        self.state.depth_test = on;
    }

    pub fn set_culling(&mut self, on: bool) {
        self.state.culling = on;
    }

    pub fn set_wireframe(&mut self, on: bool) {
        self.state.wireframe = on;
    }

    /// Enabling also resets the light color to white.
    pub fn set_lighting(&mut self, on: bool) {
        self.state.lighting = on;
        if on {
            self.light_color = Color::WHITE;
        }
    }

    /// Light position in view space.
    pub fn set_light_position(&mut self, x: f32, y: f32, z: f32) {
        self.light_position = Vec3::new(x, y, z);
    }

    /// Discards fragments whose texel alpha is below 0.1.
    pub fn set_alpha_test(&mut self, on: bool) {
        self.alpha_test = on;
    }

    #[inline]
    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn set_material(&mut self, material: &Material) {
        self.material = material.clone();
    }

    pub fn reset_material(&mut self) {
        self.material = Material::default();
    }

    pub fn set_object_color(&mut self, color: Color) {
        self.material.object_color = color;
    }

    pub fn set_color(&mut self, color: Color, which: ColorType) {
        match which {
            ColorType::Object => self.material.object_color = color,
            ColorType::Diffuse => self.material.diffuse_color = color,
            ColorType::Ambient => self.material.ambient_color = color,
            ColorType::Light => self.light_color = color,
        }
    }

    pub fn bind_texture(&mut self, texture: Option<&Texture>) {
        self.material.texture = texture.cloned();
    }

    // ── matrices ──────────────────────────────────────────────────────────

    #[inline]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn set_projection(&mut self, m: Mat4) {
        self.projection = m;
    }

    /// `fov_y` in degrees, aspect from the viewport.
    pub fn set_perspective(&mut self, fov_y: f32, near: f32, far: f32) {
        let aspect = self.viewport.height / self.viewport.width.max(1.0);
        self.projection = mat4::perspective(fov_y.to_radians(), aspect, near, far);
    }

    pub fn set_ortho(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.projection = mat4::ortho(left, right, bottom, top, near, far);
    }

    #[inline]
    pub fn model_view(&self) -> Mat4 {
        self.stack.get()
    }

    #[inline]
    pub fn matrix_stack(&self) -> &MatrixStack {
        &self.stack
    }

    #[inline]
    pub fn matrix_stack_mut(&mut self) -> &mut MatrixStack {
        &mut self.stack
    }

    pub fn push_matrix(&mut self) -> bool {
        self.stack.push()
    }

    pub fn pop_matrix(&mut self) -> bool {
        self.stack.pop()
    }

    pub fn identity(&mut self) {
        self.stack.identity();
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.stack.translate(x, y, z);
    }

    /// Rotates by `deg` degrees around `(x, y, z)`.
    pub fn rotate(&mut self, deg: f32, x: f32, y: f32, z: f32) {
        self.stack.rotate(deg, x, y, z);
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.stack.scale(x, y, z);
    }

    pub fn multiply_matrix(&mut self, m: Mat4) {
        self.stack.multiply(m);
    }

    // ── viewport & frame ──────────────────────────────────────────────────

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn width(&self) -> u32 {
        self.viewport.width as u32
    }

    pub fn height(&self) -> u32 {
        self.viewport.height as u32
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::from_size(width as f32, height as f32);
    }

    /// Clears color and depth of the current frame.
    pub fn clear(&mut self, color: Color) {
        self.backend.clear(color);
    }

    #[inline]
    pub fn background(&self) -> Color {
        self.background
    }

    /// Color each frame starts from.
    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    // ── scene presets ─────────────────────────────────────────────────────

    /// Perspective projection (`fov` degrees, near 0.1, far 10000), depth
    /// test and lighting on, blending off.
    pub fn prepare_scene_3d(&mut self, fov: f32) {
        self.set_perspective(fov, 0.1, 10000.0);
        self.stack.identity();
        self.set_blend(false);
        self.set_depth_test(true);
        self.set_lighting(true);
    }

    /// Orthographic projection `height` units tall, Y up, width from the
    /// aspect ratio; origin at the center when `centered`, else bottom-left.
    pub fn prepare_scene_2d(&mut self, height: f32, centered: bool) {
        let width = self.viewport.aspect_ratio() * height;
        if centered {
            self.set_ortho(-width / 2.0, width / 2.0, -height / 2.0, height / 2.0, -1.0, 1.0);
        } else {
            self.set_ortho(0.0, width, 0.0, height, -1.0, 1.0);
        }
        self.set_flat_state();
    }

    /// Pixel projection with the origin at the top-left, Y down.
    pub fn prepare_scene_gui(&mut self) {
        let (w, h) = (self.viewport.width, self.viewport.height);
        self.set_ortho(0.0, w, h, 0.0, -1.0, 1.0);
        self.set_flat_state();
    }

    fn set_flat_state(&mut self) {
        self.stack.identity();
        self.set_blend(true);
        self.set_depth_test(false);
        self.set_lighting(false);
    }

    /// Window position (top-left origin) of an object-space point under the
    /// current projection and model-view.
    pub fn world_to_screen(&self, x: f32, y: f32, z: f32) -> Option<Vec2> {
        let mvp = self.projection * self.stack.get();
        let p = mat4::project(mvp, Vec3::new(x, y, z), self.viewport)?;
        Some(Vec2::new(p.x, self.viewport.height - p.y))
    }

    /// Object-space point under window position `(x, y)` (top-left origin)
    /// at clip `depth` in `0..1`.
    pub fn screen_to_world(&self, x: f32, y: f32, depth: f32) -> Option<Vec3> {
        let mvp = self.projection * self.stack.get();
        mat4::unproject(mvp, Vec3::new(x, self.viewport.height - y, depth), self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{NullBackend, Primitive};

    fn ctx() -> RenderContext<NullBackend> {
        RenderContext::new(NullBackend::new(), 800, 600).unwrap()
    }

    fn quad_mesh(ctx: &mut RenderContext<NullBackend>) -> Mesh {
        let mesh = Mesh::new(MeshFlags::DEFAULT, 4, 6).unwrap();
        ctx.begin_mesh(mesh, DrawMode::Quads).unwrap();
        ctx.vertex2(0.0, 0.0);
        ctx.vertex2(1.0, 0.0);
        ctx.vertex2(1.0, 1.0);
        ctx.vertex2(0.0, 1.0);
        ctx.end_mesh().unwrap()
    }

    // ── upload / destroy ──────────────────────────────────────────────────

    #[test]
    fn upload_then_destroy_releases_each_buffer_once() {
        let mut ctx = ctx();
        let mut mesh = quad_mesh(&mut ctx);
        ctx.upload_mesh(&mut mesh, UploadHint::Static);
        assert_eq!(mesh.status(), VboStatus::Static);
        assert_eq!(ctx.backend().stats().live_buffers, 2);

        ctx.destroy_mesh(mesh);
        ctx.collect_garbage();

        let stats = ctx.backend().stats();
        assert_eq!(stats.live_buffers, 0);
        assert_eq!(stats.invalid_frees, 0);
    }

    #[test]
    fn mesh_dropped_after_context_is_harmless() {
        let mut ctx = ctx();
        let mut mesh = quad_mesh(&mut ctx);
        ctx.upload_mesh(&mut mesh, UploadHint::Static);
        let texture = ctx.create_texture(&Image::new(2, 2, 4), TextureFlags::empty());

        drop(ctx);
        drop(mesh);
        drop(texture);
    }

    #[test]
    fn second_upload_updates_in_place() {
        let mut ctx = ctx();
        let mut mesh = Mesh::new(MeshFlags::POS3 | MeshFlags::COL4, 10, 0).unwrap();
        assert_eq!(mesh.vertices().len(), 70);

        ctx.upload_mesh(&mut mesh, UploadHint::Dynamic);
        let id = mesh.vbo.as_ref().unwrap().id();
        mesh.vertices_mut()[0] = 5.0;
        ctx.upload_mesh(&mut mesh, UploadHint::Dynamic);

        assert_eq!(mesh.vbo.as_ref().unwrap().id(), id);
        assert_eq!(mesh.status(), VboStatus::Dynamic);
        assert_eq!(ctx.backend().stats().buffer_updates, 1);
        assert_eq!(ctx.backend().buffer_data(id).unwrap().len(), mesh.byte_size());
        assert_eq!(&ctx.backend().buffer_data(id).unwrap()[..4], &5.0f32.to_ne_bytes());
    }

    #[test]
    fn static_reupload_still_applies() {
        let mut ctx = ctx();
        let mut mesh = quad_mesh(&mut ctx);
        ctx.upload_mesh(&mut mesh, UploadHint::Static);
        ctx.upload_mesh(&mut mesh, UploadHint::Static);
        assert_eq!(ctx.backend().stats().buffer_updates, 2);
        assert_eq!(mesh.status(), VboStatus::Static);
    }

    // ── draw ──────────────────────────────────────────────────────────────

    #[test]
    fn drawing_without_upload_is_skipped() {
        let mut ctx = ctx();
        let mesh = quad_mesh(&mut ctx);
        ctx.draw_mesh(&mesh);
        assert!(ctx.backend().draws().is_empty());
    }

    #[test]
    fn indexed_quad_draws_two_triangles() {
        let mut ctx = ctx();
        let mut mesh = quad_mesh(&mut ctx);
        ctx.upload_mesh(&mut mesh, UploadHint::Static);
        ctx.draw_mesh(&mesh);

        let draws = ctx.backend().draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].primitive, Primitive::TriangleList);
        assert_eq!(draws[0].indices.as_deref(), Some(&[0u16, 1, 2, 0, 2, 3][..]));
        assert_eq!(draws[0].uniforms.vertex_color_enabled, 1);
    }

    #[test]
    fn range_is_clamped_to_the_buffer() {
        let mut ctx = ctx();
        let mut mesh = quad_mesh(&mut ctx);
        ctx.upload_mesh(&mut mesh, UploadHint::Static);
        ctx.draw_mesh_range(&mesh, 3, 100);
        assert_eq!(ctx.backend().draws()[0].indices.as_deref(), Some(&[0u16, 2, 3][..]));

        ctx.draw_mesh_range(&mesh, 6, 1);
        ctx.draw_mesh_range(&mesh, 0, 0);
        assert_eq!(ctx.backend().draws().len(), 1);
    }

    #[test]
    fn quads_without_indices_are_refused() {
        let mut ctx = ctx();
        let mut mesh = Mesh::new(MeshFlags::POS2, 4, 0).unwrap();
        mesh.set_draw(DrawMode::Quads, 4);
        ctx.upload_mesh(&mut mesh, UploadHint::Static);
        ctx.draw_mesh(&mesh);
        assert!(ctx.backend().draws().is_empty());
    }

    #[test]
    fn line_loop_is_closed_on_the_cpu() {
        let mut ctx = ctx();
        let mut mesh = Mesh::new(MeshFlags::POS2, 3, 0).unwrap();
        mesh.set_draw(DrawMode::LineLoop, 3);
        ctx.upload_mesh(&mut mesh, UploadHint::Static);
        ctx.draw_mesh(&mesh);

        let d = &ctx.backend().draws()[0];
        assert_eq!(d.primitive, Primitive::LineList);
        assert_eq!(d.indices.as_deref(), Some(&[0u16, 1, 1, 2, 2, 0][..]));
        assert_eq!(d.uniforms.vertex_color_enabled, 0);
    }

    #[test]
    fn draw_part_draws_its_subrange() {
        let mut ctx = ctx();
        let mut mesh = Mesh::new(MeshFlags::POS3, 6, 0).unwrap();
        mesh.set_draw(DrawMode::Triangles, 6);
        ctx.upload_mesh(&mut mesh, UploadHint::Static);
        let part = MeshPart {
            name: Some("second".into()),
            start: 3,
            count: 3,
        };
        ctx.draw_mesh_part(&mesh, &part);
        assert_eq!(ctx.backend().draws()[0].count, 3);
        assert_eq!(ctx.backend().draws()[0].indices, None);
    }

    #[test]
    fn wireframe_falls_back_to_fill() {
        let mut ctx = RenderContext::new(NullBackend::without_wireframe(), 64, 64).unwrap();
        ctx.set_wireframe(true);
        let mut mesh = quad_mesh(&mut ctx);
        ctx.upload_mesh(&mut mesh, UploadHint::Static);
        ctx.draw_mesh(&mesh);
        ctx.draw_mesh(&mesh);
        assert!(ctx.backend().draws().iter().all(|d| !d.state.wireframe));
        assert!(ctx.render_state().wireframe);
    }

    // ── reusable mesh ─────────────────────────────────────────────────────

    #[test]
    fn bc_begin_end_uploads_and_draws() {
        let mut ctx = ctx();
        assert!(ctx.bc_begin(DrawMode::Quads));
        ctx.color(Color::RED);
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            ctx.vertex2(x, y);
        }
        ctx.bc_end();

        assert!(!ctx.session().is_recording());
        let d = &ctx.backend().draws()[0];
        assert_eq!(d.indices.as_deref(), Some(&[0u16, 1, 2, 0, 2, 3][..]));

        // Second use reuses the same buffers.
        assert!(ctx.bc_begin(DrawMode::Lines));
        ctx.vertex2(0.0, 0.0);
        ctx.vertex2(1.0, 1.0);
        ctx.bc_end();
        assert_eq!(ctx.backend().stats().live_buffers, 2);
        assert_eq!(ctx.backend().draws()[1].count, 2);
    }

    #[test]
    fn bc_end_leaves_a_user_recording_alone() {
        let mut ctx = ctx();
        ctx.begin_mesh(Mesh::new(MeshFlags::POS3, 3, 0).unwrap(), DrawMode::Triangles)
            .unwrap();
        assert!(!ctx.bc_begin(DrawMode::Triangles));
        ctx.bc_end();
        assert!(ctx.session().is_recording());
        assert!(ctx.end_mesh().is_some());
        assert!(ctx.backend().draws().is_empty());
    }

    #[test]
    fn end_mesh_refuses_the_reusable_mesh() {
        let mut ctx = ctx();
        assert!(ctx.bc_begin(DrawMode::Triangles));
        assert!(ctx.end_mesh().is_none());
        assert!(ctx.session().is_recording());
        ctx.bc_end();
        assert!(!ctx.session().is_recording());
    }

    // ── resources ─────────────────────────────────────────────────────────

    #[test]
    fn invalid_shader_yields_none() {
        let mut ctx = ctx();
        assert!(ctx.create_shader("broken", "fn main() {}").is_none());

        let body = "fn vs_main() {}\nfn fs_main() {}";
        let shader = ctx.create_shader("custom", body).unwrap();
        ctx.bind_shader(Some(&shader));
        assert_eq!(ctx.current_shader(), &shader);
        ctx.bind_shader(None);
        assert_eq!(ctx.current_shader(), ctx.default_shader());
    }

    #[test]
    fn shader_released_after_last_clone() {
        let mut ctx = ctx();
        let shader = ctx.create_shader("s", "fn vs_main() {}\nfn fs_main() {}").unwrap();
        ctx.bind_shader(Some(&shader));
        drop(shader);
        ctx.collect_garbage();
        assert_eq!(ctx.backend().stats().live_programs, 2);

        ctx.bind_shader(None);
        ctx.collect_garbage();
        assert_eq!(ctx.backend().stats().live_programs, 1);
    }

    #[test]
    fn alpha_texture_sets_uniform_flags() {
        let mut ctx = ctx();
        let tex = ctx.create_texture(&Image::new(4, 4, 1), TextureFlags::empty()).unwrap();
        assert!(tex.is_alpha_only());
        ctx.bind_texture(Some(&tex));

        let mut mesh = quad_mesh(&mut ctx);
        ctx.upload_mesh(&mut mesh, UploadHint::Static);
        ctx.draw_mesh(&mesh);

        let d = &ctx.backend().draws()[0];
        assert_eq!(d.texture, Some(tex.id()));
        assert_eq!((d.uniforms.use_texture, d.uniforms.alpha_only_texture), (1, 1));
    }

    #[test]
    fn texture_rejects_two_channel_images() {
        let mut ctx = ctx();
        assert!(ctx.create_texture(&Image::new(2, 2, 2), TextureFlags::empty()).is_none());
        assert_eq!(ctx.backend().stats().live_textures, 0);
    }

    #[test]
    fn update_texture_checks_size() {
        let mut ctx = ctx();
        let tex = ctx.create_texture(&Image::new(4, 4, 4), TextureFlags::MIPMAP).unwrap();
        assert!(ctx.update_texture(&tex, &Image::new(4, 4, 4)));
        assert!(!ctx.update_texture(&tex, &Image::new(8, 4, 4)));
        assert!(!ctx.update_texture(&tex, &Image::new(4, 4, 3)));
    }

    #[test]
    fn short_image_data_is_rejected() {
        let mut ctx = ctx();
        let short = Image {
            width: 4,
            height: 4,
            comps: 4,
            data: vec![0; 3],
        };
        assert!(ctx.create_texture(&short, TextureFlags::NEAREST).is_none());
        assert_eq!(ctx.backend().stats().live_textures, 0);

        let tex = ctx.create_texture(&Image::new(4, 4, 4), TextureFlags::NEAREST).unwrap();
        assert!(!ctx.update_texture(&tex, &short));

        let mut long = Image::new(4, 4, 4);
        long.data.push(0);
        assert!(!ctx.update_texture(&tex, &long));
    }

    // ── state ─────────────────────────────────────────────────────────────

    #[test]
    fn lighting_resets_light_color() {
        let mut ctx = ctx();
        ctx.set_color(Color::RED, ColorType::Light);
        ctx.set_lighting(true);
        assert_eq!(ctx.uniforms(VertexLayout::default()).light_color, Color::WHITE.to_array());
        assert_eq!(ctx.uniforms(VertexLayout::default()).light_enabled, 1);
    }

    #[test]
    fn set_color_targets_material_slots() {
        let mut ctx = ctx();
        ctx.set_color(Color::BLUE, ColorType::Diffuse);
        ctx.set_color(Color::GREEN, ColorType::Ambient);
        ctx.set_object_color(Color::YELLOW);
        assert_eq!(ctx.material().diffuse_color, Color::BLUE);
        assert_eq!(ctx.material().ambient_color, Color::GREEN);
        assert_eq!(ctx.material().object_color, Color::YELLOW);

        ctx.reset_material();
        assert_eq!(ctx.material(), &Material::default());
    }

    // ── scene presets ─────────────────────────────────────────────────────

    #[test]
    fn scene_3d_state() {
        let mut ctx = ctx();
        ctx.translate(1.0, 2.0, 3.0);
        ctx.prepare_scene_3d(60.0);
        let s = ctx.render_state();
        assert!(!s.blend && s.depth_test && s.lighting);
        assert_eq!(ctx.model_view(), Mat4::IDENTITY);

        let p = ctx.projection().to_cols_array();
        let f = 1.0 / (30.0f32.to_radians()).tan();
        assert!((p[5] - f).abs() < 1e-5);
        assert!((p[0] - f * 600.0 / 800.0).abs() < 1e-5);
    }

    #[test]
    fn gui_scene_maps_pixels_to_pixels() {
        let mut ctx = ctx();
        ctx.prepare_scene_gui();
        let s = ctx.render_state();
        assert!(s.blend && !s.depth_test && !s.lighting);

        let p = ctx.world_to_screen(10.0, 20.0, 0.0).unwrap();
        assert!((p - Vec2::new(10.0, 20.0)).length() < 1e-3);

        // Clip depth 0.5 is z = 0 under ortho(-1, 1).
        let w = ctx.screen_to_world(400.0, 150.0, 0.5).unwrap();
        assert!((w - Vec3::new(400.0, 150.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn centered_2d_scene_puts_origin_mid_screen() {
        let mut ctx = ctx();
        ctx.prepare_scene_2d(10.0, true);
        let p = ctx.world_to_screen(0.0, 0.0, 0.0).unwrap();
        assert!((p - Vec2::new(400.0, 300.0)).length() < 1e-3);

        ctx.prepare_scene_2d(10.0, false);
        let p = ctx.world_to_screen(0.0, 0.0, 0.0).unwrap();
        assert!((p - Vec2::new(0.0, 600.0)).length() < 1e-3);
    }

    #[test]
    fn matrix_calls_reach_the_stack() {
        let mut ctx = ctx();
        assert!(ctx.push_matrix());
        ctx.translate(1.0, 0.0, 0.0);
        ctx.scale(2.0, 2.0, 2.0);
        assert_eq!(ctx.matrix_stack().depth(), 1);
        assert!(ctx.pop_matrix());
        assert!(!ctx.pop_matrix());
        assert_eq!(ctx.model_view(), Mat4::IDENTITY);
    }
}
