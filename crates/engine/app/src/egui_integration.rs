//! egui on top of the native window
//!
//! Wraps `egui_winit` (input) and `egui_glow` (painting). The painter holds
//! the GUI font atlas, so dropping the integration releases the fonts.

use std::sync::Arc;

use battery_system::{FrameworkError, FrameworkResult};
use egui::Context as EguiContext;
use egui_glow::Painter;
use egui_winit::State as EguiState;
use winit::window::Window;

pub struct EguiIntegration {
    ctx: EguiContext,
    state: EguiState,
    painter: Painter,
}

impl EguiIntegration {
    /// Create the GUI state and painter for `window`
    ///
    /// # Safety
    /// The GL context behind `gl` must be current.
    pub unsafe fn new(window: &Window, gl: Arc<glow::Context>) -> FrameworkResult<Self> {
        let ctx = EguiContext::default();
        let state = EguiState::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let painter =
            Painter::new(gl, "", None, false).map_err(|e| FrameworkError::Gui(e.to_string()))?;

        Ok(Self {
            ctx,
            state,
            painter,
        })
    }

    pub fn context(&self) -> &EguiContext {
        &self.ctx
    }

    /// Feed a native event to egui
    ///
    /// Returns true if egui consumed it and it should not reach the layers.
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Run one GUI pass and paint it over the current framebuffer
    pub fn run(&mut self, window: &Window, size: [u32; 2], run_ui: impl FnMut(&EguiContext)) {
        let raw_input = self.state.take_egui_input(window);
        let full_output = self.ctx.run(raw_input, run_ui);

        self.state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        self.painter.paint_and_update_textures(
            size,
            full_output.pixels_per_point,
            &primitives,
            &full_output.textures_delta,
        );
    }
}

impl Drop for EguiIntegration {
    fn drop(&mut self) {
        self.painter.destroy();
    }
}
