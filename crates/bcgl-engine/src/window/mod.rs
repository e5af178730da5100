//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and wires them to the GPU layer,
//! the event queue and the application callbacks.

mod config;
mod runtime;

pub use config::{Config, DisplayMode};
pub use runtime::{Runtime, RuntimeCtx};
pub use winit::window::CursorIcon;
