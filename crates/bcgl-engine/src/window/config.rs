use winit::dpi::LogicalSize;
use winit::window::{Fullscreen, WindowAttributes};

use crate::device::GpuInit;
use crate::logging::LoggingConfig;

/// How the window is presented.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum DisplayMode {
    /// Fixed-size window.
    Normal,
    /// Borderless fullscreen on the current monitor, at `width` x `height`
    /// where the platform allows it.
    Fullscreen,
    /// Borderless fullscreen at the desktop resolution.
    Desktop,
    /// Window the user can resize.
    #[default]
    Resizable,
}

/// Application configuration, adjusted by `App::on_config` before anything
/// is created.
#[derive(Debug, Clone)]
pub struct Config {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub mode: DisplayMode,
    pub vsync: bool,
    /// MSAA sample count; 1 disables multisampling.
    pub msaa: u32,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "bcgl".to_string(),
            width: 800,
            height: 600,
            mode: DisplayMode::default(),
            vsync: true,
            msaa: 1,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// GPU parameters implied by this configuration.
    pub fn gpu_init(&self) -> GpuInit {
        GpuInit {
            present_mode: if self.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            sample_count: self.msaa.max(1),
            ..GpuInit::default()
        }
    }

    pub(crate) fn window_attributes(&self) -> WindowAttributes {
        let attrs = winit::window::Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(
                self.width.max(1) as f64,
                self.height.max(1) as f64,
            ));
        match self.mode {
            DisplayMode::Normal => attrs.with_resizable(false),
            DisplayMode::Resizable => attrs.with_resizable(true),
            DisplayMode::Fullscreen | DisplayMode::Desktop => {
                attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.title, "bcgl");
        assert_eq!((c.width, c.height), (800, 600));
        assert_eq!(c.mode, DisplayMode::Resizable);
        assert!(c.vsync);
        assert_eq!(c.msaa, 1);
    }

    #[test]
    fn gpu_init_follows_vsync_and_msaa() {
        let mut c = Config::default();
        c.vsync = false;
        c.msaa = 4;
        let init = c.gpu_init();
        assert_eq!(init.present_mode, wgpu::PresentMode::AutoNoVsync);
        assert_eq!(init.sample_count, 4);
        assert!(!init.prefer_srgb);

        c.msaa = 0;
        assert_eq!(c.gpu_init().sample_count, 1);
    }

    #[test]
    fn fullscreen_modes_are_borderless() {
        let mut c = Config::default();
        c.mode = DisplayMode::Desktop;
        assert!(matches!(c.window_attributes().fullscreen, Some(Fullscreen::Borderless(None))));

        c.mode = DisplayMode::Normal;
        let attrs = c.window_attributes();
        assert!(attrs.fullscreen.is_none());
        assert!(!attrs.resizable);
    }
}
