//! Shader programs and the uniform block they share.
//!
//! User shaders are WGSL with `vs_main` and `fs_main` entry points. The
//! engine prepends a preamble declaring the uniform block `u`, the texture
//! and sampler bindings, `VertexInput` and `Varyings`, all generated from the
//! [`VertexAttribute`] and [`ShaderUniform`] tables below.

use std::fmt::Write as _;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use super::backend::{Owned, ProgramId};

/// WGSL source of the built-in material shader (without preamble).
pub const DEFAULT_SHADER_SOURCE: &str = include_str!("shaders/default.wgsl");

/// Per-vertex inputs, in interleaving order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexAttribute {
    Position,
    Normal,
    TexCoord,
    Color,
}

impl VertexAttribute {
    pub const ALL: [VertexAttribute; 4] = [
        VertexAttribute::Position,
        VertexAttribute::Normal,
        VertexAttribute::TexCoord,
        VertexAttribute::Color,
    ];

    #[inline]
    pub const fn location(self) -> u32 {
        self as u32
    }

    pub const fn name(self) -> &'static str {
        match self {
            VertexAttribute::Position => "a_Position",
            VertexAttribute::Normal => "a_Normal",
            VertexAttribute::TexCoord => "a_TexCoord",
            VertexAttribute::Color => "a_Color",
        }
    }

    /// Value fed when a mesh lacks the attribute.
    pub const fn default_value(self) -> [f32; 4] {
        match self {
            VertexAttribute::Position => [0.0, 0.0, 0.0, 1.0],
            VertexAttribute::Normal => [0.0, 0.0, 1.0, 0.0],
            VertexAttribute::TexCoord => [0.0, 0.0, 0.0, 0.0],
            VertexAttribute::Color => [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Uniforms visible to every shader.
///
/// `Texture` is a separate binding; the rest are fields of the uniform block
/// `u`, declared in [`ShaderUniforms`] memory order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderUniform {
    ProjectionMatrix,
    ModelViewMatrix,
    ObjectColor,
    DiffuseColor,
    AmbientColor,
    LightPosition,
    LightColor,
    UseTexture,
    AlphaOnlyTexture,
    AlphaTest,
    VertexColorEnabled,
    LightEnabled,
    Texture,
}

impl ShaderUniform {
    pub const ALL: [ShaderUniform; 13] = [
        ShaderUniform::ProjectionMatrix,
        ShaderUniform::ModelViewMatrix,
        ShaderUniform::ObjectColor,
        ShaderUniform::DiffuseColor,
        ShaderUniform::AmbientColor,
        ShaderUniform::LightPosition,
        ShaderUniform::LightColor,
        ShaderUniform::UseTexture,
        ShaderUniform::AlphaOnlyTexture,
        ShaderUniform::AlphaTest,
        ShaderUniform::VertexColorEnabled,
        ShaderUniform::LightEnabled,
        ShaderUniform::Texture,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ShaderUniform::ProjectionMatrix => "u_ProjectionMatrix",
            ShaderUniform::ModelViewMatrix => "u_ModelViewMatrix",
            ShaderUniform::ObjectColor => "u_ObjectColor",
            ShaderUniform::DiffuseColor => "u_DiffuseColor",
            ShaderUniform::AmbientColor => "u_AmbientColor",
            ShaderUniform::LightPosition => "u_LightPosition",
            ShaderUniform::LightColor => "u_LightColor",
            ShaderUniform::UseTexture => "u_UseTexture",
            ShaderUniform::AlphaOnlyTexture => "u_AlphaOnlyTexture",
            ShaderUniform::AlphaTest => "u_AlphaTest",
            ShaderUniform::VertexColorEnabled => "u_VertexColorEnabled",
            ShaderUniform::LightEnabled => "u_LightEnabled",
            ShaderUniform::Texture => "u_Texture",
        }
    }

    /// WGSL type inside the uniform block; `None` for bindings.
    const fn wgsl_type(self) -> Option<&'static str> {
        match self {
            ShaderUniform::ProjectionMatrix | ShaderUniform::ModelViewMatrix => {
                Some("mat4x4<f32>")
            }
            ShaderUniform::ObjectColor
            | ShaderUniform::DiffuseColor
            | ShaderUniform::AmbientColor
            | ShaderUniform::LightPosition
            | ShaderUniform::LightColor => Some("vec4<f32>"),
            ShaderUniform::UseTexture
            | ShaderUniform::AlphaOnlyTexture
            | ShaderUniform::AlphaTest
            | ShaderUniform::VertexColorEnabled
            | ShaderUniform::LightEnabled => Some("u32"),
            ShaderUniform::Texture => None,
        }
    }

    /// Byte offset in [`ShaderUniforms`]; `None` for bindings.
    pub const fn offset(self) -> Option<usize> {
        use std::mem::offset_of;
        let off = match self {
            ShaderUniform::ProjectionMatrix => offset_of!(ShaderUniforms, projection),
            ShaderUniform::ModelViewMatrix => offset_of!(ShaderUniforms, model_view),
            ShaderUniform::ObjectColor => offset_of!(ShaderUniforms, object_color),
            ShaderUniform::DiffuseColor => offset_of!(ShaderUniforms, diffuse_color),
            ShaderUniform::AmbientColor => offset_of!(ShaderUniforms, ambient_color),
            ShaderUniform::LightPosition => offset_of!(ShaderUniforms, light_position),
            ShaderUniform::LightColor => offset_of!(ShaderUniforms, light_color),
            ShaderUniform::UseTexture => offset_of!(ShaderUniforms, use_texture),
            ShaderUniform::AlphaOnlyTexture => offset_of!(ShaderUniforms, alpha_only_texture),
            ShaderUniform::AlphaTest => offset_of!(ShaderUniforms, alpha_test),
            ShaderUniform::VertexColorEnabled => offset_of!(ShaderUniforms, vertex_color_enabled),
            ShaderUniform::LightEnabled => offset_of!(ShaderUniforms, light_enabled),
            ShaderUniform::Texture => return None,
        };
        Some(off)
    }
}

/// Uniform block contents, laid out for WGSL uniform address space rules.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ShaderUniforms {
    pub projection: [f32; 16],
    pub model_view: [f32; 16],
    pub object_color: [f32; 4],
    pub diffuse_color: [f32; 4],
    pub ambient_color: [f32; 4],
    pub light_position: [f32; 4],
    pub light_color: [f32; 4],
    pub use_texture: u32,
    pub alpha_only_texture: u32,
    pub alpha_test: u32,
    pub vertex_color_enabled: u32,
    pub light_enabled: u32,
    pub _pad: [u32; 3],
}

/// Bind group slots shared by the preamble and the backend.
pub const UNIFORM_BINDING: u32 = 0;
pub const TEXTURE_BINDING: u32 = 1;
pub const SAMPLER_BINDING: u32 = 2;

/// Declarations prepended to every shader.
pub fn preamble() -> String {
    let mut s = String::new();

    s.push_str("struct Uniforms {\n");
    for u in ShaderUniform::ALL {
        if let Some(ty) = u.wgsl_type() {
            let _ = writeln!(s, "    {}: {},", u.name(), ty);
        }
    }
    s.push_str("    _pad0: u32,\n    _pad1: u32,\n    _pad2: u32,\n}\n\n");

    let _ = writeln!(s, "@group(0) @binding({UNIFORM_BINDING}) var<uniform> u: Uniforms;");
    let _ = writeln!(
        s,
        "@group(0) @binding({TEXTURE_BINDING}) var {}: texture_2d<f32>;",
        ShaderUniform::Texture.name()
    );
    let _ = writeln!(s, "@group(0) @binding({SAMPLER_BINDING}) var u_Sampler: sampler;\n");

    s.push_str("struct VertexInput {\n");
    for a in VertexAttribute::ALL {
        let _ = writeln!(s, "    @location({}) {}: vec4<f32>,", a.location(), a.name());
    }
    s.push_str("}\n\n");

    s.push_str(
        "struct Varyings {\n    \
         @builtin(position) clip: vec4<f32>,\n    \
         @location(0) v_Position: vec3<f32>,\n    \
         @location(1) v_Normal: vec3<f32>,\n    \
         @location(2) v_TexCoord: vec2<f32>,\n    \
         @location(3) v_Color: vec4<f32>,\n\
         }\n\n",
    );
    s
}

/// Full program source: preamble followed by `body`.
pub fn with_preamble(body: &str) -> String {
    let mut s = preamble();
    s.push_str(body);
    s
}

#[derive(Debug)]
struct ShaderInner {
    label: String,
    program: Owned<ProgramId>,
}

/// Compiled shader program.
///
/// Cheap to clone; the program is released when the last clone drops.
#[derive(Debug, Clone)]
pub struct Shader(Rc<ShaderInner>);

impl Shader {
    pub(crate) fn new(label: String, program: Owned<ProgramId>) -> Self {
        Self(Rc::new(ShaderInner { label, program }))
    }

    #[inline]
    pub fn id(&self) -> ProgramId {
        self.0.program.id()
    }

    pub fn label(&self) -> &str {
        &self.0.label
    }
}

impl PartialEq for Shader {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_matches_wgsl_size() {
        assert_eq!(std::mem::size_of::<ShaderUniforms>(), 240);
        assert_eq!(std::mem::size_of::<ShaderUniforms>() % 16, 0);
    }

    #[test]
    fn uniform_table_follows_memory_order() {
        let offsets: Vec<usize> = ShaderUniform::ALL.iter().filter_map(|u| u.offset()).collect();
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(offsets.len(), ShaderUniform::ALL.len() - 1);
    }

    #[test]
    fn preamble_declares_every_name() {
        let p = preamble();
        for a in VertexAttribute::ALL {
            assert!(p.contains(a.name()), "missing {}", a.name());
        }
        for u in ShaderUniform::ALL {
            assert!(p.contains(u.name()), "missing {}", u.name());
        }
        assert!(p.contains("@location(3) a_Color: vec4<f32>"));
    }

    #[test]
    fn default_shader_has_entry_points() {
        let src = with_preamble(DEFAULT_SHADER_SOURCE);
        assert!(src.contains("fn vs_main"));
        assert!(src.contains("fn fs_main"));
        assert!(src.starts_with("struct Uniforms"));
    }
}
