//! Pipeline keys and construction for the wgpu backend.

use crate::render::backend::{Primitive, ProgramId};
use crate::render::mesh::VertexLayout;
use crate::render::shader::{
    SAMPLER_BINDING, ShaderUniforms, TEXTURE_BINDING, UNIFORM_BINDING, VertexAttribute,
};
use crate::render::state::RenderState;

pub(super) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Everything a render pipeline is specialized on.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(super) struct PipelineKey {
    pub program: ProgramId,
    pub layout: VertexLayout,
    pub primitive: Primitive,
    pub blend: bool,
    pub depth_test: bool,
    pub culling: bool,
    pub wireframe: bool,
}

impl PipelineKey {
    pub fn new(
        program: ProgramId,
        layout: VertexLayout,
        primitive: Primitive,
        state: RenderState,
    ) -> Self {
        Self {
            program,
            layout,
            primitive,
            blend: state.blend,
            depth_test: state.depth_test,
            culling: state.culling,
            wireframe: state.wireframe,
        }
    }
}

/// Target formats shared by every pipeline.
#[derive(Debug, Copy, Clone)]
pub(super) struct Targets {
    pub color_format: wgpu::TextureFormat,
    pub sample_count: u32,
}

/// Floats per attribute of `layout`, in location order.
fn attribute_comps(layout: VertexLayout) -> [(VertexAttribute, u8, usize); 4] {
    [
        (VertexAttribute::Position, layout.position, 0),
        (VertexAttribute::Normal, layout.normal, layout.normal_offset()),
        (VertexAttribute::TexCoord, layout.texcoord, layout.texcoord_offset()),
        (VertexAttribute::Color, layout.color, layout.color_offset()),
    ]
}

fn float_format(comps: u8) -> Option<wgpu::VertexFormat> {
    match comps {
        1 => Some(wgpu::VertexFormat::Float32),
        2 => Some(wgpu::VertexFormat::Float32x2),
        3 => Some(wgpu::VertexFormat::Float32x3),
        4 => Some(wgpu::VertexFormat::Float32x4),
        _ => None,
    }
}

/// Attributes read from the mesh buffer, and attributes read from the
/// per-instance defaults buffer (one `vec4` per location).
pub(super) fn vertex_attributes(
    layout: VertexLayout,
) -> (Vec<wgpu::VertexAttribute>, Vec<wgpu::VertexAttribute>) {
    let float = std::mem::size_of::<f32>() as u64;
    let mut mesh = Vec::with_capacity(4);
    let mut defaults = Vec::new();
    for (attr, comps, offset) in attribute_comps(layout) {
        match float_format(comps) {
            Some(format) => mesh.push(wgpu::VertexAttribute {
                format,
                offset: offset as u64 * float,
                shader_location: attr.location(),
            }),
            None => defaults.push(wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: attr.location() as u64 * 4 * float,
                shader_location: attr.location(),
            }),
        }
    }
    (mesh, defaults)
}

/// Contents of the defaults buffer.
pub(super) fn default_attribute_data() -> [[f32; 4]; 4] {
    VertexAttribute::ALL.map(VertexAttribute::default_value)
}

pub(super) fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("bcgl bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: UNIFORM_BINDING,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ShaderUniforms>() as u64,
                    ),
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: TEXTURE_BINDING,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: SAMPLER_BINDING,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

fn topology(p: Primitive) -> wgpu::PrimitiveTopology {
    match p {
        Primitive::LineList => wgpu::PrimitiveTopology::LineList,
        Primitive::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        Primitive::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        Primitive::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

pub(super) fn build(
    device: &wgpu::Device,
    pipeline_layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    key: PipelineKey,
    targets: Targets,
) -> wgpu::RenderPipeline {
    let (mesh_attrs, default_attrs) = vertex_attributes(key.layout);
    let buffers = [
        wgpu::VertexBufferLayout {
            array_stride: key.layout.stride_bytes() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &mesh_attrs,
        },
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[[f32; 4]; 4]>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &default_attrs,
        },
    ];

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("bcgl pipeline"),
        layout: Some(pipeline_layout),

        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &buffers,
        },

        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: targets.color_format,
                blend: key.blend.then_some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: topology(key.primitive),
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: key.culling.then_some(wgpu::Face::Back),
            polygon_mode: if key.wireframe {
                wgpu::PolygonMode::Line
            } else {
                wgpu::PolygonMode::Fill
            },
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: key.depth_test,
            depth_compare: if key.depth_test {
                wgpu::CompareFunction::LessEqual
            } else {
                wgpu::CompareFunction::Always
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: targets.sample_count,
            ..Default::default()
        },

        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MeshFlags;

    #[test]
    fn missing_attributes_come_from_defaults() {
        let layout = VertexLayout::from_flags(MeshFlags::POS2 | MeshFlags::TEX2);
        let (mesh, defaults) = vertex_attributes(layout);

        let mesh_locs: Vec<u32> = mesh.iter().map(|a| a.shader_location).collect();
        let default_locs: Vec<u32> = defaults.iter().map(|a| a.shader_location).collect();
        assert_eq!(
            mesh_locs,
            [VertexAttribute::Position.location(), VertexAttribute::TexCoord.location()]
        );
        assert_eq!(
            default_locs,
            [VertexAttribute::Normal.location(), VertexAttribute::Color.location()]
        );

        assert_eq!(mesh[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(mesh[1].offset, 8);
    }

    #[test]
    fn default_layout_reads_everything_from_the_mesh() {
        let (mesh, defaults) = vertex_attributes(VertexLayout::from_flags(MeshFlags::DEFAULT));
        assert!(defaults.is_empty());
        assert_eq!(mesh.last().unwrap().offset, 8 * 4);
        assert_eq!(mesh.last().unwrap().format, wgpu::VertexFormat::Float32x4);
    }

    #[test]
    fn defaults_start_from_attribute_defaults() {
        let d = default_attribute_data();
        assert_eq!(d[VertexAttribute::Color.location() as usize], [1.0, 1.0, 1.0, 1.0]);
    }
}
