//! bcgl math crate.
//!
//! Column-major vector/matrix helpers on top of `glam`, window projection
//! helpers and the fixed-depth [`MatrixStack`] used by the render context.

pub mod mat3;
pub mod mat4;
mod stack;
mod viewport;

pub use glam;
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

pub use stack::{MATRIX_STACK_SIZE, MatrixStack};
pub use viewport::Viewport;
