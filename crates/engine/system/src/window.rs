//! Window description, tracked state and deferred commands
//!
//! The native window itself lives in `battery-app`; this module holds the
//! platform-independent parts: how a window should be created
//! ([`WindowConfig`]), what is known about it ([`WindowState`]) and what
//! callbacks may ask of it ([`WindowCommand`]).

use glam::{IVec2, UVec2};

use crate::event::Event;

/// Window configuration for creating new windows
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub vsync: bool,
    /// OpenGL major version
    pub gl_major: u8,
    /// OpenGL minor version
    pub gl_minor: u8,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: String::from("Battery"),
            width: 1280,
            height: 720,
            resizable: true,
            vsync: true,
            gl_major: 3,
            gl_minor: 3,
        }
    }
}

impl WindowConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_gl_version(mut self, major: u8, minor: u8) -> Self {
        self.gl_major = major;
        self.gl_minor = minor;
        self
    }
}

/// Last known window geometry and status
#[derive(Debug, Clone, PartialEq)]
pub struct WindowState {
    pub size: UVec2,
    pub position: IVec2,
    pub scale_factor: f64,
    pub focused: bool,
    /// Native resources exist and are usable
    pub valid: bool,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            size: UVec2::ZERO,
            position: IVec2::ZERO,
            scale_factor: 1.0,
            focused: false,
            valid: false,
        }
    }
}

impl WindowState {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            size: UVec2::new(width, height),
            ..Self::default()
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.size.y
    }

    /// Width / height, 1.0 for a zero-height window
    pub fn aspect_ratio(&self) -> f32 {
        if self.size.y > 0 {
            self.size.x as f32 / self.size.y as f32
        } else {
            1.0
        }
    }

    /// Update geometry and focus from a framework event
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::WindowResize { size, position } => {
                self.size = *size;
                self.position = *position;
            }
            Event::WindowMoved { position } => self.position = *position,
            Event::WindowFocus => self.focused = true,
            Event::WindowLostFocus => self.focused = false,
            _ => {}
        }
    }
}

/// Window change requested from inside a callback
///
/// Commands are queued on the context and applied by the runtime after the
/// update phase, so the native window is never touched mid-dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowCommand {
    SetTitle(String),
    SetSize(UVec2),
    SetPosition(IVec2),
    Maximize,
    Minimize,
    Restore,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_config_builder() {
        let config = WindowConfig::new("Demo")
            .with_size(800, 600)
            .with_vsync(false)
            .with_gl_version(4, 1);
        assert_eq!(config.title, "Demo");
        assert_eq!((config.width, config.height), (800, 600));
        assert!(!config.vsync);
        assert_eq!((config.gl_major, config.gl_minor), (4, 1));
        assert!(config.resizable);
    }

    #[test]
    fn test_window_state_tracks_events() {
        let mut state = WindowState::with_size(800, 600);
        assert!((state.aspect_ratio() - 4.0 / 3.0).abs() < 1e-6);

        state.apply(&Event::WindowResize {
            size: UVec2::new(1024, 768),
            position: IVec2::new(5, 6),
        });
        assert_eq!(state.width(), 1024);
        assert_eq!(state.position, IVec2::new(5, 6));

        state.apply(&Event::WindowFocus);
        assert!(state.focused);
        state.apply(&Event::WindowLostFocus);
        assert!(!state.focused);
    }

    #[test]
    fn test_zero_height_aspect() {
        assert_eq!(WindowState::default().aspect_ratio(), 1.0);
    }
}
