//! Application-facing contracts.
//!
//! The interface between the runtime loop and user code: the [`App`]
//! callbacks and the per-frame [`FrameCtx`].

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
