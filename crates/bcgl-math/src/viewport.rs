/// Window rectangle in pixels.
///
/// Used as the target space for [`mat4::project`](crate::mat4::project) and the
/// source space for [`mat4::unproject`](crate::mat4::unproject). The origin is
/// bottom-left, matching clip-space +Y up.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Viewport anchored at the origin.
    #[inline]
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Width over height; `1.0` for a degenerate viewport.
    #[inline]
    pub fn aspect_ratio(self) -> f32 {
        if self.is_valid() { self.width / self.height } else { 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_invalid() {
        assert!(!Viewport::from_size(0.0, 10.0).is_valid());
        assert!(!Viewport::from_size(10.0, f32::INFINITY).is_valid());
        assert!(Viewport::from_size(10.0, 10.0).is_valid());
    }

    #[test]
    fn aspect_ratio_of_degenerate_viewport_is_one() {
        assert_eq!(Viewport::from_size(0.0, 0.0).aspect_ratio(), 1.0);
        assert_eq!(Viewport::from_size(800.0, 400.0).aspect_ratio(), 2.0);
    }
}
