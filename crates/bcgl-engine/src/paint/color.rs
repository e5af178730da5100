/// Straight-alpha RGBA color.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0, 1.0);
    pub const YELLOW: Self = Self::new(1.0, 1.0, 0.0, 1.0);
    pub const CYAN: Self = Self::new(0.0, 1.0, 1.0, 1.0);
    pub const MAGENTA: Self = Self::new(1.0, 0.0, 1.0, 1.0);
    pub const GRAY: Self = Self::new(0.3, 0.3, 0.3, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from `0xRRGGBB`.
    #[inline]
    pub fn rgb(hex: u32) -> Self {
        Self::new(channel(hex, 16), channel(hex, 8), channel(hex, 0), 1.0)
    }

    /// Color from `0xRRGGBBAA`.
    #[inline]
    pub fn rgba(hex: u32) -> Self {
        Self::new(channel(hex, 24), channel(hex, 16), channel(hex, 8), channel(hex, 0))
    }

    /// Color from `0xAARRGGBB`.
    #[inline]
    pub fn argb(hex: u32) -> Self {
        Self::new(channel(hex, 16), channel(hex, 8), channel(hex, 0), channel(hex, 24))
    }

    /// Color from straight sRGB bytes.
    #[inline]
    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
    }

    #[inline]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

impl From<[f32; 4]> for Color {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

#[inline]
fn channel(hex: u32, shift: u32) -> f32 {
    ((hex >> shift) & 0xff) as f32 / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_hex_is_opaque() {
        assert_eq!(Color::rgb(0xff0000), Color::RED);
        assert_eq!(Color::rgb(0x00ff00).a, 1.0);
    }

    #[test]
    fn rgba_and_argb_place_alpha_differently() {
        let a = Color::rgba(0x0000ff80);
        let b = Color::argb(0x800000ff);
        assert_eq!(a, b);
        assert_eq!(a.b, 1.0);
        assert!((a.a - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn with_alpha_keeps_rgb() {
        let c = Color::CYAN.with_alpha(0.5);
        assert_eq!(c.to_array(), [0.0, 1.0, 1.0, 0.5]);
    }
}
