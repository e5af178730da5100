use crate::paint::Color;

use super::texture::Texture;

/// Fixed-function switches applied to each draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RenderState {
    pub blend: bool,
    pub depth_test: bool,
    pub culling: bool,
    pub wireframe: bool,
    pub lighting: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            blend: true,
            depth_test: false,
            culling: false,
            wireframe: false,
            lighting: false,
        }
    }
}

/// Target of `RenderContext::set_color`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColorType {
    Object,
    Diffuse,
    Ambient,
    Light,
}

/// Surface colors and optional texture for a draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub object_color: Color,
    pub diffuse_color: Color,
    pub ambient_color: Color,
    pub texture: Option<Texture>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            object_color: Color::WHITE,
            diffuse_color: Color::WHITE,
            ambient_color: Color::new(0.2, 0.2, 0.2, 1.0),
            texture: None,
        }
    }
}

impl Material {
    pub fn with_color(object_color: Color) -> Self {
        Self {
            object_color,
            ..Self::default()
        }
    }

    pub fn with_texture(texture: Texture) -> Self {
        Self {
            texture: Some(texture),
            ..Self::default()
        }
    }
}
