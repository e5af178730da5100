//! Color model shared by materials, draw helpers and the immediate-mode API.
//!
//! Colors are straight (non-premultiplied) RGBA in `[0, 1]`, blended with
//! `src_alpha / one_minus_src_alpha`.

mod color;

pub use color::Color;
