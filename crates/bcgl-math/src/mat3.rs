//! 3x3 helpers for 2D affine transforms.
//!
//! Same convention as [`crate::mat4`]: column-major, composition on the right.

use glam::{Mat3, Vec2};

#[inline]
pub fn identity() -> Mat3 {
    Mat3::IDENTITY
}

#[inline]
pub fn translation(x: f32, y: f32) -> Mat3 {
    Mat3::from_translation(Vec2::new(x, y))
}

#[inline]
pub fn rotation(rad: f32) -> Mat3 {
    Mat3::from_angle(rad)
}

#[inline]
pub fn scaling(x: f32, y: f32) -> Mat3 {
    Mat3::from_scale(Vec2::new(x, y))
}

#[inline]
pub fn translate(m: Mat3, x: f32, y: f32) -> Mat3 {
    m * translation(x, y)
}

#[inline]
pub fn rotate(m: Mat3, rad: f32) -> Mat3 {
    m * rotation(rad)
}

#[inline]
pub fn scale(m: Mat3, x: f32, y: f32) -> Mat3 {
    m * scaling(x, y)
}

/// Transforms `v` as a point (`z = 1`).
#[inline]
pub fn transform_point(m: Mat3, v: Vec2) -> Vec2 {
    m.transform_point2(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_then_translate_order() {
        let m = rotate(translate(identity(), 5.0, 0.0), std::f32::consts::FRAC_PI_2);
        let p = transform_point(m, Vec2::new(1.0, 0.0));
        assert!((p - Vec2::new(5.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn scaling_is_applied_per_axis() {
        let p = transform_point(scaling(2.0, 3.0), Vec2::new(1.0, 1.0));
        assert_eq!(p, Vec2::new(2.0, 3.0));
    }
}
