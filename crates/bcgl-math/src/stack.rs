use glam::Mat4;

use crate::mat4;

/// Default number of slots in a [`MatrixStack`].
pub const MATRIX_STACK_SIZE: usize = 32;

/// Fixed-depth stack of model-view matrices.
///
/// The top slot is the current transform. Every transform call rewrites the
/// top by composing on the right, so nested transforms read in the order they
/// are issued (parent first, child last).
///
/// Invariant: `depth` is always in `[0, capacity - 1]`. Overflow and underflow
/// are reported through `log::warn!` and leave the stack untouched.
#[derive(Debug, Clone)]
pub struct MatrixStack {
    slots: Vec<Mat4>,
    depth: usize,
}

impl MatrixStack {
    /// Creates a stack with [`MATRIX_STACK_SIZE`] slots, top set to identity.
    pub fn new() -> Self {
        Self::with_depth(MATRIX_STACK_SIZE)
    }

    /// Creates a stack with `capacity` slots (at least one).
    pub fn with_depth(capacity: usize) -> Self {
        Self {
            slots: vec![Mat4::IDENTITY; capacity.max(1)],
            depth: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns to depth 0 with an identity top.
    pub fn reset(&mut self) {
        self.depth = 0;
        self.slots[0] = Mat4::IDENTITY;
    }

    /// Duplicates the top onto a new slot.
    ///
    /// Returns `false` (and changes nothing) when the stack is full.
    pub fn push(&mut self) -> bool {
        if self.depth + 1 >= self.slots.len() {
            log::warn!("max matrix stack reached ({} slots)", self.slots.len());
            return false;
        }
        self.slots[self.depth + 1] = self.slots[self.depth];
        self.depth += 1;
        true
    }

    /// Discards the top, restoring the matrix saved by the matching `push`.
    ///
    /// Returns `false` (and changes nothing) at depth 0.
    pub fn pop(&mut self) -> bool {
        if self.depth == 0 {
            log::warn!("min matrix stack reached");
            return false;
        }
        self.depth -= 1;
        true
    }

    #[inline]
    pub fn get(&self) -> Mat4 {
        self.slots[self.depth]
    }

    /// Current top as a column-major array, ready for upload.
    #[inline]
    pub fn get_raw(&self) -> [f32; 16] {
        self.get().to_cols_array()
    }

    #[inline]
    pub fn set(&mut self, m: Mat4) {
        self.slots[self.depth] = m;
    }

    pub fn identity(&mut self) {
        self.set(Mat4::IDENTITY);
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.set(mat4::translate(self.get(), x, y, z));
    }

    /// Rotates by `deg` degrees around `(x, y, z)` (axis need not be unit length).
    pub fn rotate(&mut self, deg: f32, x: f32, y: f32, z: f32) {
        self.set(mat4::rotate_axis(self.get(), deg.to_radians(), x, y, z));
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.set(mat4::scale(self.get(), x, y, z));
    }

    pub fn multiply(&mut self, m: Mat4) {
        self.set(mat4::multiply(self.get(), m));
    }
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(m: Mat4) -> [u32; 16] {
        m.to_cols_array().map(f32::to_bits)
    }

    // ── push / pop ────────────────────────────────────────────────────────

    #[test]
    fn push_pop_restores_exact_bits_at_every_depth() {
        let mut stack = MatrixStack::new();
        stack.translate(0.3, 0.1, -7.0);

        for depth in 0..MATRIX_STACK_SIZE - 1 {
            assert_eq!(stack.depth(), depth);
            let before = bits(stack.get());

            assert!(stack.push());
            stack.rotate(33.0, 1.0, 1.0, 0.0);
            stack.scale(1.1, 0.9, 2.0);
            stack.translate(-1.0, 4.0, 0.25);
            assert!(stack.pop());

            assert_eq!(bits(stack.get()), before);

            // Leave a different matrix at the next depth for the next round.
            stack.push();
            stack.rotate(depth as f32, 0.0, 1.0, 0.0);
        }
    }

    #[test]
    fn pop_at_depth_zero_is_noop() {
        let mut stack = MatrixStack::new();
        stack.translate(1.0, 2.0, 3.0);
        let before = stack.get();

        assert!(!stack.pop());
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.get(), before);
    }

    #[test]
    fn push_at_last_slot_is_noop() {
        let mut stack = MatrixStack::with_depth(4);
        for _ in 0..3 {
            assert!(stack.push());
        }
        stack.scale(2.0, 2.0, 2.0);
        let before = stack.get();

        assert!(!stack.push());
        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.get(), before);
    }

    #[test]
    fn zero_capacity_still_has_one_slot() {
        let mut stack = MatrixStack::with_depth(0);
        assert_eq!(stack.capacity(), 1);
        assert!(!stack.push());
    }

    // ── transforms ────────────────────────────────────────────────────────

    #[test]
    fn rotate_takes_degrees() {
        let mut stack = MatrixStack::new();
        stack.rotate(90.0, 0.0, 0.0, 1.0);
        let expected = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2);
        assert!(stack.get().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn get_raw_matches_get() {
        let mut stack = MatrixStack::new();
        stack.translate(9.0, 8.0, 7.0);
        assert_eq!(stack.get_raw(), stack.get().to_cols_array());
        assert_eq!(&stack.get_raw()[12..15], &[9.0, 8.0, 7.0]);
    }

    #[test]
    fn reset_returns_to_identity() {
        let mut stack = MatrixStack::new();
        stack.push();
        stack.translate(1.0, 0.0, 0.0);
        stack.reset();
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.get(), Mat4::IDENTITY);
    }
}
