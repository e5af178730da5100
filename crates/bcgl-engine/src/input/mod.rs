//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The runtime translates platform events into [`Event`]s, sends them through
//! the [`EventQueue`], and applies each pulled event to [`InputState`] before
//! the application sees it.

pub(crate) mod platform;
mod queue;
mod state;
mod types;

pub use queue::{EventQueue, EventSender, MAX_EVENTS};
pub use state::{InputState, MAX_MOUSE_BUTTONS, MAX_TOUCHES, TouchPoint};
pub use types::{Event, EventType, Key, MouseButton};
