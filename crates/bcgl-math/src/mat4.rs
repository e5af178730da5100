//! 4x4 matrix helpers.
//!
//! Matrices are column-major (`glam` storage). Every `translate`/`rotate`/`scale`
//! helper composes the new transform on the right: `m * T`, so the last call
//! is the first one applied to a vertex.
//!
//! Projections produce a zero-to-one clip depth range.

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::Viewport;

#[inline]
pub fn from_array(v: &[f32; 16]) -> Mat4 {
    Mat4::from_cols_array(v)
}

#[inline]
pub fn to_array(m: Mat4) -> [f32; 16] {
    m.to_cols_array()
}

#[inline]
pub fn identity() -> Mat4 {
    Mat4::IDENTITY
}

#[inline]
pub fn multiply(a: Mat4, b: Mat4) -> Mat4 {
    a * b
}

// ── projections ───────────────────────────────────────────────────────────

/// Right-handed perspective projection.
///
/// `aspect` scales X and is expected as `height / width`.
#[rustfmt::skip]
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y * 0.5).tan();
    Mat4::from_cols_array(&[
        aspect * f, 0.0, 0.0, 0.0,
        0.0, f, 0.0, 0.0,
        0.0, 0.0, far / (near - far), -1.0,
        0.0, 0.0, -(far * near) / (far - near), 0.0,
    ])
}

/// Orthographic projection mapping `near..far` to clip depth `0..1`.
#[rustfmt::skip]
pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let tx = -((right + left) / (right - left));
    let ty = -((top + bottom) / (top - bottom));
    let tz = -(near / (far - near));
    Mat4::from_cols_array(&[
        2.0 / (right - left), 0.0, 0.0, 0.0,
        0.0, 2.0 / (top - bottom), 0.0, 0.0,
        0.0, 0.0, -1.0 / (far - near), 0.0,
        tx, ty, tz, 1.0,
    ])
}

// ── constructors ──────────────────────────────────────────────────────────

#[inline]
pub fn translation(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(x, y, z))
}

#[inline]
pub fn scaling(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_scale(Vec3::new(x, y, z))
}

#[inline]
pub fn rotation_x(rad: f32) -> Mat4 {
    Mat4::from_rotation_x(rad)
}

#[inline]
pub fn rotation_y(rad: f32) -> Mat4 {
    Mat4::from_rotation_y(rad)
}

#[inline]
pub fn rotation_z(rad: f32) -> Mat4 {
    Mat4::from_rotation_z(rad)
}

#[inline]
pub fn rotation_quat(q: Quat) -> Mat4 {
    Mat4::from_quat(q)
}

/// Rotation of `rad` around the axis `(x, y, z)`.
///
/// The axis does not have to be normalized. A zero axis yields identity.
#[rustfmt::skip]
pub fn rotation_axis(rad: f32, x: f32, y: f32, z: f32) -> Mat4 {
    let l = x * x + y * y + z * z;
    if l == 0.0 {
        return Mat4::IDENTITY;
    }

    let (s, c) = rad.sin_cos();
    let one_c = 1.0 - c;
    let (xx, xy, xz) = (x * x, x * y, x * z);
    let (yy, yz, zz) = (y * y, y * z, z * z);
    let sl = l.sqrt() * s;

    Mat4::from_cols_array(&[
        (xx + (yy + zz) * c) / l, (xy * one_c + z * sl) / l, (xz * one_c - y * sl) / l, 0.0,
        (xy * one_c - z * sl) / l, (yy + (xx + zz) * c) / l, (yz * one_c + x * sl) / l, 0.0,
        (xz * one_c + y * sl) / l, (yz * one_c - x * sl) / l, (zz + (xx + yy) * c) / l, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ])
}

// ── composition (right-hand side) ─────────────────────────────────────────

#[inline]
pub fn translate(m: Mat4, x: f32, y: f32, z: f32) -> Mat4 {
    m * translation(x, y, z)
}

#[inline]
pub fn scale(m: Mat4, x: f32, y: f32, z: f32) -> Mat4 {
    m * scaling(x, y, z)
}

#[inline]
pub fn rotate_x(m: Mat4, rad: f32) -> Mat4 {
    m * rotation_x(rad)
}

#[inline]
pub fn rotate_y(m: Mat4, rad: f32) -> Mat4 {
    m * rotation_y(rad)
}

#[inline]
pub fn rotate_z(m: Mat4, rad: f32) -> Mat4 {
    m * rotation_z(rad)
}

#[inline]
pub fn rotate_axis(m: Mat4, rad: f32, x: f32, y: f32, z: f32) -> Mat4 {
    m * rotation_axis(rad, x, y, z)
}

#[inline]
pub fn rotate_quat(m: Mat4, q: Quat) -> Mat4 {
    m * rotation_quat(q)
}

// ── queries ───────────────────────────────────────────────────────────────

#[inline]
pub fn transpose(m: Mat4) -> Mat4 {
    m.transpose()
}

/// Inverse of `m`. The result is not finite when `m` is singular; use
/// [`try_inverse`] when that matters.
#[inline]
pub fn inverse(m: Mat4) -> Mat4 {
    m.inverse()
}

pub fn try_inverse(m: Mat4) -> Option<Mat4> {
    let det = m.determinant();
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    Some(m.inverse())
}

#[inline]
pub fn determinant(m: Mat4) -> f32 {
    m.determinant()
}

#[inline]
pub fn is_zero(m: Mat4) -> bool {
    m.to_cols_array().iter().all(|v| *v == 0.0)
}

/// Transforms `v` by `m` (column vector on the right).
#[inline]
pub fn transform(m: Mat4, v: Vec4) -> Vec4 {
    m * v
}

// ── window projection ─────────────────────────────────────────────────────

/// Maps an object-space point to window coordinates (origin bottom-left,
/// depth `0..1`).
///
/// Returns `None` when the point projects to `w == 0` or the viewport is empty.
pub fn project(mvp: Mat4, point: Vec3, viewport: Viewport) -> Option<Vec3> {
    if !viewport.is_valid() {
        return None;
    }
    let clip = mvp * point.extend(1.0);
    if clip.w == 0.0 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(Vec3::new(
        viewport.x + (ndc.x + 1.0) * 0.5 * viewport.width,
        viewport.y + (ndc.y + 1.0) * 0.5 * viewport.height,
        ndc.z,
    ))
}

/// Inverse of [`project`]: maps window coordinates plus depth back into
/// object space.
pub fn unproject(mvp: Mat4, window: Vec3, viewport: Viewport) -> Option<Vec3> {
    if !viewport.is_valid() {
        return None;
    }
    let inv = try_inverse(mvp)?;
    let ndc = Vec4::new(
        (window.x - viewport.x) / viewport.width * 2.0 - 1.0,
        (window.y - viewport.y) / viewport.height * 2.0 - 1.0,
        window.z,
        1.0,
    );
    let obj = inv * ndc;
    if obj.w == 0.0 {
        return None;
    }
    Some(obj.truncate() / obj.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Mat4, b: Mat4, eps: f32) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() <= eps)
    }

    fn sample() -> Mat4 {
        let m = translation(1.0, -2.0, 3.5);
        let m = rotate_axis(m, 0.7, 1.0, 2.0, 0.5);
        scale(m, 2.0, 0.5, 3.0)
    }

    // ── identity / multiply ───────────────────────────────────────────────

    #[test]
    fn multiply_by_identity_is_exact() {
        let m = sample();
        assert_eq!(multiply(m, identity()), m);
        assert_eq!(multiply(identity(), m), m);
    }

    #[test]
    fn array_round_trip_is_column_major() {
        let m = translation(4.0, 5.0, 6.0);
        let a = to_array(m);
        assert_eq!(&a[12..15], &[4.0, 5.0, 6.0]);
        assert_eq!(from_array(&a), m);
    }

    // ── inverse ───────────────────────────────────────────────────────────

    #[test]
    fn double_inverse_returns_original() {
        let m = sample();
        assert!(approx(inverse(inverse(m)), m, 1e-4));
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert!(try_inverse(scaling(1.0, 0.0, 1.0)).is_none());
        assert!(try_inverse(sample()).is_some());
    }

    // ── rotation ──────────────────────────────────────────────────────────

    #[test]
    fn rotation_axis_accepts_unnormalized_axis() {
        let a = rotation_axis(0.4, 0.0, 0.0, 5.0);
        let b = rotation_z(0.4);
        assert!(approx(a, b, 1e-6));
    }

    #[test]
    fn rotation_axis_with_zero_axis_is_identity() {
        assert_eq!(rotation_axis(1.0, 0.0, 0.0, 0.0), Mat4::IDENTITY);
    }

    #[test]
    fn transforms_compose_on_the_right() {
        // Scale first, then translate: the vertex is scaled before it moves.
        let m = scale(translate(identity(), 10.0, 0.0, 0.0), 2.0, 2.0, 2.0);
        let p = transform(m, Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(p, Vec4::new(12.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let m = translation(1.0, 2.0, 3.0);
        let t = to_array(transpose(m));
        assert_eq!(t[3], 1.0);
        assert_eq!(t[7], 2.0);
        assert_eq!(t[11], 3.0);
    }

    // ── projections ───────────────────────────────────────────────────────

    #[test]
    fn perspective_maps_near_and_far_to_unit_depth() {
        let p = perspective(60f32.to_radians(), 1.0, 0.1, 100.0);
        let near = p * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = p * Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ortho_maps_corners_to_ndc() {
        let o = ortho(0.0, 800.0, 600.0, 0.0, -1.0, 1.0);
        let top_left = o * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let bottom_right = o * Vec4::new(800.0, 600.0, 0.0, 1.0);
        assert!(approx(
            Mat4::from_cols(top_left, bottom_right, Vec4::ZERO, Vec4::ZERO),
            Mat4::from_cols(
                Vec4::new(-1.0, 1.0, 0.5, 1.0),
                Vec4::new(1.0, -1.0, 0.5, 1.0),
                Vec4::ZERO,
                Vec4::ZERO,
            ),
            1e-6,
        ));
    }

    // ── project / unproject ───────────────────────────────────────────────

    #[test]
    fn project_then_unproject_round_trips() {
        let vp = Viewport::from_size(640.0, 480.0);
        let mvp = perspective(1.0, 480.0 / 640.0, 0.1, 100.0) * translation(0.0, 0.0, -5.0);
        let world = Vec3::new(0.5, -0.25, 1.0);

        let win = project(mvp, world, vp).unwrap();
        let back = unproject(mvp, win, vp).unwrap();
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn project_rejects_empty_viewport() {
        assert!(project(identity(), Vec3::ZERO, Viewport::default()).is_none());
    }

    #[test]
    fn project_center_lands_mid_viewport() {
        let vp = Viewport::from_size(200.0, 100.0);
        let win = project(identity(), Vec3::ZERO, vp).unwrap();
        assert_eq!((win.x, win.y), (100.0, 50.0));
    }
}
