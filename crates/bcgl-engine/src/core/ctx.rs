use winit::window::{CursorIcon, Window};

use crate::input::InputState;
use crate::render::Gfx;
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

/// Window handle exposed to callbacks.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Drawable size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    pub fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }

    pub fn set_cursor(&self, cursor: CursorIcon) {
        self.window.set_cursor(cursor);
    }

    pub fn set_cursor_visible(&self, visible: bool) {
        self.window.set_cursor_visible(visible);
    }
}

/// Per-frame context passed to `App::on_update` and `App::on_event`.
///
/// `'a` is the duration of the callback invocation.
pub struct FrameCtx<'a> {
    pub window: WindowCtx<'a>,
    pub gfx: &'a mut Gfx,
    pub input: &'a InputState,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_> {
    /// Ends the main loop after this frame with `code`.
    pub fn quit(&mut self, code: i32) {
        self.runtime.quit(code);
    }
}
