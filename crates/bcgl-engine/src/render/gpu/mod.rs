//! wgpu implementation of [`RenderBackend`].
//!
//! Every draw is encoded into its own render pass and submitted right away,
//! so buffer writes made between two draws (the reusable mesh, the uniform
//! block) are observed in call order.

mod pipeline;

use std::collections::HashMap;

use anyhow::{Context as _, Result, anyhow, ensure};
use wgpu::util::DeviceExt;

use crate::paint::Color;

use super::backend::{
    BufferId, BufferKind, DrawCall, DrawIndices, PixelFormat, ProgramId, RenderBackend, TextureDesc,
    TextureId,
};
use super::mesh::UploadHint;
use super::shader::ShaderUniforms;
use super::texture::{FilterMode, MipLevel, TextureSampling, WrapMode};

use pipeline::{DEPTH_FORMAT, PipelineKey, Targets};

/// Construction parameters for [`WgpuBackend`].
#[derive(Debug, Clone)]
pub struct WgpuBackendInit {
    pub color_format: wgpu::TextureFormat,
    /// MSAA sample count; 1 disables multisampling.
    pub sample_count: u32,
    pub width: u32,
    pub height: u32,
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    size: u64,
}

struct GpuTexture {
    texture: wgpu::Texture,
    format: PixelFormat,
    bind_group: wgpu::BindGroup,
}

/// Frame attachments sized to the surface.
struct Attachments {
    depth: wgpu::TextureView,
    msaa: Option<wgpu::TextureView>,
    width: u32,
    height: u32,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    targets: Targets,
    wireframe: bool,

    next_id: u32,
    buffers: HashMap<BufferId, GpuBuffer>,
    textures: HashMap<TextureId, GpuTexture>,
    programs: HashMap<ProgramId, wgpu::ShaderModule>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    uniform_buffer: wgpu::Buffer,
    defaults_vbo: wgpu::Buffer,
    white_bind_group: wgpu::BindGroup,

    scratch_ibo: Option<wgpu::Buffer>,
    scratch_capacity: usize,

    attachments: Attachments,
    /// Color view of the frame being rendered.
    target: Option<wgpu::TextureView>,

    warned_no_target: bool,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, init: WgpuBackendInit) -> Self {
        let targets = Targets {
            color_format: init.color_format,
            sample_count: init.sample_count.max(1),
        };
        let wireframe = device.features().contains(wgpu::Features::POLYGON_MODE_LINE);

        let bind_group_layout = pipeline::bind_group_layout(&device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bcgl pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bcgl uniforms"),
            size: std::mem::size_of::<ShaderUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let defaults_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bcgl attribute defaults"),
            contents: bytemuck::cast_slice(&pipeline::default_attribute_data()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let white = device.create_texture_with_data(
            &queue,
            &texture_descriptor("bcgl white", wgpu::TextureFormat::Rgba8Unorm, 1, 1, 1),
            wgpu::util::TextureDataOrder::LayerMajor,
            &[255, 255, 255, 255],
        );
        let white_sampler =
            create_sampler(&device, TextureSampling::from_flags(Default::default()));
        let white_bind_group = create_bind_group(
            &device,
            &bind_group_layout,
            &uniform_buffer,
            &white.create_view(&wgpu::TextureViewDescriptor::default()),
            &white_sampler,
        );

        let attachments = create_attachments(&device, targets, init.width, init.height);

        log::info!(
            "wgpu backend ready: {:?}, {}x MSAA, wireframe {}",
            targets.color_format,
            targets.sample_count,
            if wireframe { "available" } else { "unavailable" }
        );

        Self {
            device,
            queue,
            targets,
            wireframe,
            next_id: 0,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            programs: HashMap::new(),
            pipelines: HashMap::new(),
            bind_group_layout,
            pipeline_layout,
            uniform_buffer,
            defaults_vbo,
            white_bind_group,
            scratch_ibo: None,
            scratch_capacity: 0,
            attachments,
            target: None,
            warned_no_target: false,
        }
    }

    #[inline]
    pub fn sample_count(&self) -> u32 {
        self.targets.sample_count
    }

    /// Recreates depth and MSAA attachments for a new surface size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if (width, height) != (self.attachments.width, self.attachments.height) {
            self.attachments = create_attachments(&self.device, self.targets, width, height);
        }
    }

    /// Directs subsequent clears and draws at `view` (the surface texture).
    pub fn begin_frame(&mut self, view: wgpu::TextureView) {
        self.target = Some(view);
    }

    pub fn end_frame(&mut self) {
        self.target = None;
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) -> bool {
        if self.pipelines.contains_key(&key) {
            return true;
        }
        let Some(module) = self.programs.get(&key.program) else {
            log::warn!("draw with unknown program {:?}", key.program);
            return false;
        };
        log::debug!("building pipeline for {key:?}");
        let p = pipeline::build(&self.device, &self.pipeline_layout, module, key, self.targets);
        self.pipelines.insert(key, p);
        true
    }

    fn ensure_scratch_capacity(&mut self, indices: usize) {
        if self.scratch_capacity >= indices && self.scratch_ibo.is_some() {
            return;
        }
        let capacity = indices.next_power_of_two().max(64);
        self.scratch_ibo = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bcgl scratch indices"),
            size: (capacity * std::mem::size_of::<u16>()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.scratch_capacity = capacity;
    }

    /// Color and resolve views for a pass over the current target.
    fn color_attachment<'a>(
        &'a self,
        target: &'a wgpu::TextureView,
        load: wgpu::LoadOp<wgpu::Color>,
    ) -> wgpu::RenderPassColorAttachment<'a> {
        let (view, resolve_target) = match &self.attachments.msaa {
            Some(msaa) => (msaa, Some(target)),
            None => (target, None),
        };
        wgpu::RenderPassColorAttachment {
            view,
            resolve_target,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        }
    }

    fn depth_attachment(
        &self,
        load: wgpu::LoadOp<f32>,
    ) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.attachments.depth,
            depth_ops: Some(wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }

    fn current_target(&mut self) -> Option<wgpu::TextureView> {
        if self.target.is_none() && !self.warned_no_target {
            log::warn!("draw outside of a frame; ignored");
            self.warned_no_target = true;
        }
        self.target.clone()
    }
}

impl RenderBackend for WgpuBackend {
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        data: &[u8],
        hint: UploadHint,
    ) -> Result<BufferId> {
        ensure!(!data.is_empty(), "zero-sized buffer");
        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        } | wgpu::BufferUsages::COPY_DST;
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(match (kind, hint) {
                (BufferKind::Vertex, UploadHint::Static) => "bcgl static vertices",
                (BufferKind::Vertex, UploadHint::Dynamic) => "bcgl dynamic vertices",
                (BufferKind::Index, UploadHint::Static) => "bcgl static indices",
                (BufferKind::Index, UploadHint::Dynamic) => "bcgl dynamic indices",
            }),
            contents: data,
            usage,
        });
        let id = BufferId(self.next());
        self.buffers.insert(
            id,
            GpuBuffer {
                size: buffer.size(),
                buffer,
            },
        );
        Ok(id)
    }

    fn update_buffer(&mut self, id: BufferId, data: &[u8]) {
        let Some(buf) = self.buffers.get(&id) else {
            log::warn!("update of unknown buffer {id:?}");
            return;
        };
        let data = &data[..data.len().min(buf.size as usize)];
        write_padded(&self.queue, &buf.buffer, data);
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        match self.buffers.remove(&id) {
            Some(buf) => buf.buffer.destroy(),
            None => log::warn!("destroy of unknown buffer {id:?}"),
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId> {
        let base = desc
            .levels
            .first()
            .ok_or_else(|| anyhow!("texture '{}' has no data", desc.label))?;
        let limit = self.device.limits().max_texture_dimension_2d;
        ensure!(
            base.width <= limit && base.height <= limit,
            "texture '{}' of {}x{} exceeds the {limit} limit",
            desc.label,
            base.width,
            base.height
        );

        let format = wgpu_format(desc.format);
        let texture = self.device.create_texture(&texture_descriptor(
            desc.label,
            format,
            base.width,
            base.height,
            desc.levels.len() as u32,
        ));
        write_levels(&self.queue, &texture, desc.format, desc.levels);

        let sampler = create_sampler(&self.device, desc.sampling);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = create_bind_group(
            &self.device,
            &self.bind_group_layout,
            &self.uniform_buffer,
            &view,
            &sampler,
        );

        let id = TextureId(self.next());
        self.textures.insert(
            id,
            GpuTexture {
                texture,
                format: desc.format,
                bind_group,
            },
        );
        Ok(id)
    }

    fn update_texture(&mut self, id: TextureId, levels: &[MipLevel]) {
        let Some(tex) = self.textures.get(&id) else {
            log::warn!("update of unknown texture {id:?}");
            return;
        };
        let count = levels.len().min(tex.texture.mip_level_count() as usize);
        write_levels(&self.queue, &tex.texture, tex.format, &levels[..count]);
    }

    fn destroy_texture(&mut self, id: TextureId) {
        match self.textures.remove(&id) {
            Some(tex) => tex.texture.destroy(),
            None => log::warn!("destroy of unknown texture {id:?}"),
        }
    }

    fn create_program(&mut self, label: &str, source: &str) -> Result<ProgramId> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|e| anyhow!("{}", e.emit_to_string(source)))
            .with_context(|| format!("failed to parse shader '{label}'"))?;
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| anyhow!("{}", e.emit_to_string(source)))
            .with_context(|| format!("failed to validate shader '{label}'"))?;
        for entry in ["vs_main", "fs_main"] {
            ensure!(
                module.entry_points.iter().any(|ep| ep.name == entry),
                "shader '{label}' has no `{entry}` entry point"
            );
        }

        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let id = ProgramId(self.next());
        self.programs.insert(id, module);
        Ok(id)
    }

    fn destroy_program(&mut self, id: ProgramId) {
        if self.programs.remove(&id).is_none() {
            log::warn!("destroy of unknown program {id:?}");
            return;
        }
        self.pipelines.retain(|key, _| key.program != id);
    }

    fn clear(&mut self, color: Color) {
        let Some(target) = self.current_target() else { return };
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("bcgl clear") });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("bcgl clear pass"),
                color_attachments: &[Some(
                    self.color_attachment(&target, wgpu::LoadOp::Clear(color.to_wgpu())),
                )],
                depth_stencil_attachment: Some(self.depth_attachment(wgpu::LoadOp::Clear(1.0))),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        let Some(target) = self.current_target() else { return };

        let mut state = call.state;
        state.wireframe &= self.wireframe;
        let key = PipelineKey::new(call.program, call.layout, call.primitive, state);
        if !self.ensure_pipeline(key) {
            return;
        }

        if let DrawIndices::Inline(ix) = &call.indices {
            self.ensure_scratch_capacity(ix.len());
            if let Some(scratch) = self.scratch_ibo.as_ref() {
                write_padded(&self.queue, scratch, bytemuck::cast_slice(ix));
            }
        }
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(call.uniforms));

        // Now take immutable borrows.
        let Some(pipeline) = self.pipelines.get(&key) else { return };
        let Some(vbo) = self.buffers.get(&call.vertex_buffer) else {
            log::warn!("draw with unknown vertex buffer {:?}", call.vertex_buffer);
            return;
        };
        let bind_group = match call.texture {
            Some(id) => match self.textures.get(&id) {
                Some(tex) => &tex.bind_group,
                None => {
                    log::warn!("draw with unknown texture {id:?}");
                    &self.white_bind_group
                }
            },
            None => &self.white_bind_group,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("bcgl draw") });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("bcgl draw pass"),
                color_attachments: &[Some(self.color_attachment(&target, wgpu::LoadOp::Load))],
                depth_stencil_attachment: Some(self.depth_attachment(wgpu::LoadOp::Load)),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, bind_group, &[]);
            rpass.set_vertex_buffer(0, vbo.buffer.slice(..));
            rpass.set_vertex_buffer(1, self.defaults_vbo.slice(..));

            match &call.indices {
                DrawIndices::Vertices(range) => rpass.draw(range.clone(), 0..1),
                DrawIndices::Buffer(id, range) => {
                    let Some(ibo) = self.buffers.get(id) else {
                        log::warn!("draw with unknown index buffer {id:?}");
                        return;
                    };
                    rpass.set_index_buffer(ibo.buffer.slice(..), wgpu::IndexFormat::Uint16);
                    rpass.draw_indexed(range.clone(), 0, 0..1);
                }
                DrawIndices::Inline(ix) => {
                    let Some(scratch) = self.scratch_ibo.as_ref() else { return };
                    rpass.set_index_buffer(scratch.slice(..), wgpu::IndexFormat::Uint16);
                    rpass.draw_indexed(0..ix.len() as u32, 0, 0..1);
                }
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn supports_wireframe(&self) -> bool {
        self.wireframe
    }
}

// ── helpers ───────────────────────────────────────────────────────────────

/// `write_buffer` sizes must be a multiple of `COPY_BUFFER_ALIGNMENT`.
fn write_padded(queue: &wgpu::Queue, buffer: &wgpu::Buffer, data: &[u8]) {
    let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
    if data.len() % align == 0 {
        queue.write_buffer(buffer, 0, data);
        return;
    }
    let mut padded = data.to_vec();
    padded.resize(data.len().next_multiple_of(align).min(buffer.size() as usize), 0);
    queue.write_buffer(buffer, 0, &padded);
}

fn wgpu_format(format: PixelFormat) -> wgpu::TextureFormat {
    match format {
        PixelFormat::Alpha8 => wgpu::TextureFormat::R8Unorm,
        PixelFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
    }
}

fn texture_descriptor(
    label: &str,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    mip_level_count: u32,
) -> wgpu::TextureDescriptor<'_> {
    wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    }
}

fn write_levels(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    format: PixelFormat,
    levels: &[MipLevel],
) {
    for (mip, level) in levels.iter().enumerate() {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: mip as u32,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &level.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(level.width * format.bytes_per_pixel()),
                rows_per_image: Some(level.height),
            },
            wgpu::Extent3d {
                width: level.width,
                height: level.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

fn create_sampler(device: &wgpu::Device, sampling: TextureSampling) -> wgpu::Sampler {
    let filter = match sampling.filter {
        FilterMode::Linear => wgpu::FilterMode::Linear,
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
    };
    let address = match sampling.wrap {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::Clamp => wgpu::AddressMode::ClampToEdge,
    };
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("bcgl sampler"),
        address_mode_u: address,
        address_mode_v: address,
        address_mode_w: address,
        mag_filter: filter,
        min_filter: filter,
        // Nearest level selection; mipmapped textures carry the full chain.
        ..Default::default()
    })
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniforms: &wgpu::Buffer,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("bcgl bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: super::shader::UNIFORM_BINDING,
                resource: uniforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: super::shader::TEXTURE_BINDING,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: super::shader::SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn create_attachments(
    device: &wgpu::Device,
    targets: Targets,
    width: u32,
    height: u32,
) -> Attachments {
    let size = wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    };
    let attachment = |label, format| {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: targets.sample_count,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    };
    Attachments {
        depth: attachment("bcgl depth", DEPTH_FORMAT),
        msaa: (targets.sample_count > 1)
            .then(|| attachment("bcgl msaa color", targets.color_format)),
        width: size.width,
        height: size.height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_formats_map_to_unorm() {
        assert_eq!(wgpu_format(PixelFormat::Alpha8), wgpu::TextureFormat::R8Unorm);
        assert_eq!(wgpu_format(PixelFormat::Rgba8), wgpu::TextureFormat::Rgba8Unorm);
    }
}
