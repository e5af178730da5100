//! Immediate-mode draw helpers built on `bc_begin` / `bc_end`.

use std::f32::consts::TAU;

use super::backend::RenderBackend;
use super::ctx::RenderContext;
use super::geometry::mesh_cube;
use super::mesh::UploadHint;
use super::texture::Texture;
use super::topology::DrawMode;

impl<B: RenderBackend> RenderContext<B> {
    /// Draws the `(sx, sy, sw, sh)` texture-coordinate window of `texture`
    /// over the rectangle `(x, y, w, h)`. Leaves `texture` bound.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_texture_2d(
        &mut self,
        texture: &Texture,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        sx: f32,
        sy: f32,
        sw: f32,
        sh: f32,
    ) {
        self.bind_texture(Some(texture));
        if !self.bc_begin(DrawMode::Triangles) {
            return;
        }
        for (u, v, px, py) in [
            (sx, sy, x, y),
            (sx + sw, sy, x + w, y),
            (sx + sw, sy + sh, x + w, y + h),
            (sx + sw, sy + sh, x + w, y + h),
            (sx, sy + sh, x, y + h),
            (sx, sy, x, y),
        ] {
            self.tex_coord(u, v);
            self.vertex2(px, py);
        }
        self.bc_end();
    }

    /// Filled quad, or its outline.
    pub fn draw_rect_2d(&mut self, x: f32, y: f32, w: f32, h: f32, fill: bool) {
        let mode = if fill { DrawMode::Quads } else { DrawMode::LineLoop };
        if !self.bc_begin(mode) {
            return;
        }
        for (u, v, px, py) in [
            (0.0, 0.0, x, y),
            (1.0, 0.0, x + w, y),
            (1.0, 1.0, x + w, y + h),
            (0.0, 1.0, x, y + h),
        ] {
            self.tex_coord(u, v);
            self.vertex2(px, py);
        }
        self.bc_end();
    }

    /// Filled disc (center plus `segments + 1` rim vertices), or its outline.
    pub fn draw_circle_2d(&mut self, x: f32, y: f32, r: f32, segments: usize, fill: bool) {
        if segments == 0 {
            return;
        }
        let mode = if fill { DrawMode::TriangleFan } else { DrawMode::LineLoop };
        if !self.bc_begin(mode) {
            return;
        }
        let mut n = segments;
        if fill {
            self.vertex2(x, y);
            n += 1;
        }
        for i in 0..n {
            let t = i as f32 / segments as f32 * TAU;
            self.vertex2(x + t.cos() * r, y + t.sin() * r);
        }
        self.bc_end();
    }

    /// Unit grid of `size_x` by `size_y` cells in the XY plane.
    pub fn draw_grid(&mut self, size_x: u32, size_y: u32) {
        if !self.bc_begin(DrawMode::Lines) {
            return;
        }
        let (w, h) = (size_x as f32, size_y as f32);
        for x in 0..=size_x {
            self.vertex2(x as f32, 0.0);
            self.vertex2(x as f32, h);
        }
        for y in 0..=size_y {
            self.vertex2(0.0, y as f32);
            self.vertex2(w, y as f32);
        }
        self.bc_end();
    }

    pub fn draw_plane(&mut self, size_x: u32, size_y: u32) {
        if !self.bc_begin(DrawMode::Quads) {
            return;
        }
        let (w, h) = (size_x as f32, size_y as f32);
        self.vertex2(0.0, 0.0);
        self.vertex2(w, 0.0);
        self.vertex2(w, h);
        self.vertex2(0.0, h);
        self.bc_end();
    }

    /// Unit cube scaled to `size_*` and moved to `(x, y, z)`.
    pub fn draw_cube(&mut self, x: f32, y: f32, z: f32, size_x: f32, size_y: f32, size_z: f32) {
        let cube = match self.cube.take() {
            Some(cube) => cube,
            None => {
                let Some(mut cube) = mesh_cube() else {
                    return;
                };
                self.upload_mesh(&mut cube, UploadHint::Static);
                cube
            }
        };
        self.push_matrix();
        self.translate(x, y, z);
        self.scale(size_x, size_y, size_z);
        self.draw_mesh(&cube);
        self.pop_matrix();
        self.cube = Some(cube);
    }
}
