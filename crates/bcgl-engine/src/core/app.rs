use crate::input::Event;
use crate::render::Gfx;
use crate::window::Config;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime::run`](crate::window::Runtime::run).
///
/// Call order: `on_config`, `on_create`, then the window and render context
/// are created and `on_start` runs. Each frame delivers queued events through
/// `on_event` and then calls `on_update`. On shutdown `on_stop` runs while the
/// render context is still alive, and `on_destroy` after it is gone.
pub trait App {
    /// Adjusts the configuration before the window exists.
    fn on_config(&mut self, config: &mut Config) {
        let _ = config;
    }

    fn on_create(&mut self) {}

    fn on_destroy(&mut self) {}

    /// Render context is ready; create meshes, shaders and textures here.
    fn on_start(&mut self, gfx: &mut Gfx) {
        let _ = gfx;
    }

    /// Last chance to release GPU resources.
    fn on_stop(&mut self, gfx: &mut Gfx) {
        let _ = gfx;
    }

    /// Called once per frame after events, with the frame already cleared.
    fn on_update(&mut self, ctx: &mut FrameCtx<'_>, dt: f32) -> AppControl;

    /// Called for each event pulled from the queue this frame.
    fn on_event(&mut self, ctx: &mut FrameCtx<'_>, event: Event) -> AppControl {
        let _ = (ctx, event);
        AppControl::Continue
    }
}
