//! Frame timing.
//!
//! The runtime owns one [`FrameClock`] and ticks it once per presented frame;
//! the resulting `dt` is what `App::on_update` receives.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
