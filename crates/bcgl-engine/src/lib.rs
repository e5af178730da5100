//! bcgl engine crate.
//!
//! A small 3D/2D rendering layer over wgpu and winit:
//! - [`render`]: matrices, meshes, the begin/vertex/end protocol, render
//!   state, materials, shaders and textures behind a backend seam
//! - [`input`]: the double-buffered event queue and polled input state
//! - [`window`] + [`core`]: the runtime loop and the [`App`] callbacks
//!
//! Math types live in `bcgl-math` and are re-exported as [`math`].

pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod paint;
pub mod render;
pub mod time;
pub mod window;

pub use bcgl_math as math;

pub use crate::core::{App, AppControl, FrameCtx, WindowCtx};
pub use crate::input::{Event, EventType, InputState, Key, MouseButton};
pub use crate::paint::Color;
pub use crate::render::{DrawMode, Gfx, Mesh, MeshFlags, RenderContext, UploadHint};
pub use crate::window::{Config, DisplayMode, Runtime, RuntimeCtx};
