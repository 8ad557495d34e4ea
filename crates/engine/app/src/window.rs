//! Native window with its OpenGL context, event queue and GUI
//!
//! A [`Window`] can only be created from inside a running event loop.
//! Resources are released in field order: GUI (and its fonts), pending
//! events, GL surface, GL context, native window.

use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use battery_system::{
    Event, EventTranslator, FrameworkError, FrameworkResult, WindowCommand, WindowConfig,
    WindowState,
};
use glam::{IVec2, UVec2};
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasWindowHandle;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;

use crate::egui_integration::EguiIntegration;
use crate::engine::WindowHost;

const NO_GL_CONFIG: &str = "display offered no matching GL config";

#[derive(Default)]
pub struct Window {
    egui: Option<EguiIntegration>,
    queue: VecDeque<WindowEvent>,
    gl_surface: Option<Surface<WindowSurface>>,
    gl_context: Option<PossiblyCurrentContext>,
    gl: Option<Arc<glow::Context>>,
    native: Option<winit::window::Window>,
    translator: EventTranslator,
    valid: bool,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Create the native window, GL context and surface, and the GUI
    ///
    /// On failure everything created so far is released before the error is
    /// returned. Creating an already valid window only logs a warning.
    pub fn create(
        &mut self,
        event_loop: &ActiveEventLoop,
        config: &WindowConfig,
    ) -> FrameworkResult<()> {
        if self.valid {
            tracing::warn!("Window '{}' already created", config.title);
            return Ok(());
        }

        let attributes = winit::window::Window::default_attributes()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_resizable(config.resizable);

        let template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .with_transparency(false);

        // The picker must hand back a config, so an empty set can only
        // surface as a panic inside it
        let built = panic::catch_unwind(AssertUnwindSafe(|| {
            DisplayBuilder::new()
                .with_window_attributes(Some(attributes))
                .build(event_loop, template, |configs| {
                    configs
                        .reduce(|best, config| {
                            if config.num_samples() > best.num_samples() {
                                config
                            } else {
                                best
                            }
                        })
                        .expect(NO_GL_CONFIG)
                })
        }))
        .map_err(|_| FrameworkError::Context(NO_GL_CONFIG.to_string()))?;
        let (native, gl_config) = built.map_err(|e| FrameworkError::Context(e.to_string()))?;

        let native = native.ok_or_else(|| {
            FrameworkError::WindowCreation("display builder returned no window".to_string())
        })?;
        let raw_handle = native
            .window_handle()
            .map_err(|e| FrameworkError::WindowCreation(e.to_string()))?
            .as_raw();
        let gl_display = gl_config.display();

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(
                config.gl_major,
                config.gl_minor,
            ))))
            .build(Some(raw_handle));

        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .map_err(|e| FrameworkError::Context(e.to_string()))?;

        let size = native.inner_size();
        let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_handle,
            non_zero(size.width),
            non_zero(size.height),
        );
        let gl_surface =
            unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes) }
                .map_err(|e| FrameworkError::Surface(e.to_string()))?;

        let gl_context = not_current
            .make_current(&gl_surface)
            .map_err(|e| FrameworkError::Context(e.to_string()))?;

        let interval = if config.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(err) = gl_surface.set_swap_interval(&gl_context, interval) {
            tracing::warn!("Failed to set swap interval: {}", err);
        }

        let gl = Arc::new(unsafe {
            glow::Context::from_loader_function_cstr(|s| gl_display.get_proc_address(s))
        });

        let egui = unsafe { EguiIntegration::new(&native, Arc::clone(&gl))? };

        tracing::info!(
            "Created window '{}' ({}x{}, OpenGL {}.{})",
            config.title,
            size.width,
            size.height,
            config.gl_major,
            config.gl_minor
        );

        self.egui = Some(egui);
        self.queue.clear();
        self.gl_surface = Some(gl_surface);
        self.gl_context = Some(gl_context);
        self.gl = Some(gl);
        let position = native
            .outer_position()
            .map_or(IVec2::ZERO, |p| IVec2::new(p.x, p.y));
        self.native = Some(native);
        self.translator = EventTranslator::with_position(position);
        self.valid = true;
        Ok(())
    }

    /// Release every resource of the window, in creation-reverse order
    pub fn destroy(&mut self) {
        if !self.valid {
            tracing::error!("Can't destroy window: it was not created or is already destroyed");
            return;
        }
        self.egui = None;
        self.queue.clear();
        self.gl_surface = None;
        self.gl_context = None;
        self.gl = None;
        self.native = None;
        self.valid = false;
        tracing::info!("Window destroyed");
    }

    pub fn gl(&self) -> Option<Arc<glow::Context>> {
        self.gl.clone()
    }

    pub fn size(&self) -> UVec2 {
        self.native
            .as_ref()
            .map(|w| {
                let size = w.inner_size();
                UVec2::new(size.width, size.height)
            })
            .unwrap_or(UVec2::ZERO)
    }

    pub fn position(&self) -> IVec2 {
        self.native
            .as_ref()
            .and_then(|w| w.outer_position().ok())
            .map(|p| IVec2::new(p.x, p.y))
            .unwrap_or(IVec2::ZERO)
    }

    pub fn is_focused(&self) -> bool {
        self.native.as_ref().is_some_and(|w| w.has_focus())
    }

    pub fn scale_factor(&self) -> f64 {
        self.native.as_ref().map_or(1.0, |w| w.scale_factor())
    }

    /// Snapshot of the current geometry for the application context
    pub fn state(&self) -> WindowState {
        WindowState {
            size: self.size(),
            position: self.position(),
            scale_factor: self.scale_factor(),
            focused: self.is_focused(),
            valid: self.valid,
        }
    }

    /// Queue a native event, offering it to the GUI first
    ///
    /// Events the GUI consumes never reach the layers, except key and
    /// button releases, which always pass so held state can't get stuck.
    pub fn push_event(&mut self, event: WindowEvent) {
        if let (Some(native), Some(egui)) = (self.native.as_ref(), self.egui.as_mut()) {
            let release = match &event {
                WindowEvent::KeyboardInput { event, .. } => event.state == ElementState::Released,
                WindowEvent::MouseInput { state, .. } => *state == ElementState::Released,
                _ => false,
            };
            if egui.on_window_event(native, &event) && !release {
                return;
            }
        }
        self.queue.push_back(event);
    }

    /// Drain the queue into framework events
    ///
    /// A resize is applied to the GL surface before it is forwarded.
    pub fn handle_events(&mut self) -> Vec<Event> {
        let mut events = Vec::with_capacity(self.queue.len());
        while let Some(native_event) = self.queue.pop_front() {
            if let WindowEvent::Resized(size) = &native_event {
                self.resize_surface(size.width, size.height);
            }
            events.extend(self.translator.translate(&native_event));
        }
        events
    }

    fn resize_surface(&self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let (Some(surface), Some(context)) = (&self.gl_surface, &self.gl_context) {
            surface.resize(context, non_zero(width), non_zero(height));
        }
    }

    pub fn swap_buffers(&self) -> FrameworkResult<()> {
        match (&self.gl_surface, &self.gl_context) {
            (Some(surface), Some(context)) => surface
                .swap_buffers(context)
                .map_err(|e| FrameworkError::Surface(e.to_string())),
            _ => Ok(()),
        }
    }

    /// Run one GUI pass over the rendered frame
    pub fn run_ui(&mut self, run_ui: impl FnMut(&egui::Context)) {
        let size = self.size();
        if let (Some(native), Some(egui)) = (self.native.as_ref(), self.egui.as_mut()) {
            egui.run(native, [size.x, size.y], run_ui);
        }
    }
}

impl WindowHost for Window {
    fn apply(&mut self, command: WindowCommand, state: &mut WindowState) {
        let Some(native) = self.native.as_ref() else {
            tracing::error!("Can't apply {:?}: window not created", command);
            return;
        };
        match command {
            WindowCommand::SetTitle(title) => native.set_title(&title),
            WindowCommand::SetSize(size) => {
                let requested = PhysicalSize::new(size.x, size.y);
                if let Some(applied) = native.request_inner_size(requested) {
                    state.size = UVec2::new(applied.width, applied.height);
                    self.resize_surface(applied.width, applied.height);
                }
            }
            WindowCommand::SetPosition(position) => {
                native.set_outer_position(PhysicalPosition::new(position.x, position.y));
                state.position = position;
            }
            WindowCommand::Maximize => native.set_maximized(true),
            WindowCommand::Minimize => native.set_minimized(true),
            WindowCommand::Restore => {
                native.set_minimized(false);
                native.set_maximized(false);
            }
        }
    }
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}
