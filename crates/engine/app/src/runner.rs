//! winit runner
//!
//! Creates the window once the event loop is resumed, then drives the
//! [`Engine`] at its fixed rate by sleeping the event loop until the next
//! frame deadline.

use std::time::Instant;

use battery_renderer::GlBackend;
use battery_system::FrameworkError;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

#[cfg(target_os = "linux")]
use winit::platform::x11::EventLoopBuilderExtX11;

use crate::application::Application;
use crate::config::AppConfig;
use crate::engine::{with_shutdown_failure, Engine, FrameOutcome, LoopState};
use crate::window::Window;

/// Event loop handler owning the engine and the native window
pub struct AppRuntime<A: Application> {
    config: AppConfig,
    engine: Engine<A>,
    window: Window,
    failure: Option<anyhow::Error>,
}

impl<A: Application> AppRuntime<A> {
    pub fn new(app: A, config: AppConfig, args: Vec<String>) -> Self {
        Self {
            engine: Engine::new(app, &config, args),
            config,
            window: Window::new(),
            failure: None,
        }
    }

    pub fn engine(&self) -> &Engine<A> {
        &self.engine
    }

    /// First error that stopped the loop, if any
    pub fn take_failure(&mut self) -> Option<anyhow::Error> {
        self.failure.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{:#}", err);
        if self.failure.is_none() {
            self.failure = Some(err);
        }
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        self.window.create(event_loop, &self.config.window_config())?;

        let gl = self
            .window
            .gl()
            .ok_or_else(|| FrameworkError::Context("window has no GL context".to_string()))?;
        let backend = unsafe { GlBackend::new(gl)? };

        let ctx = self.engine.context_mut();
        ctx.renderer.set_backend(Box::new(backend));
        ctx.window = self.window.state();

        self.engine.startup()
    }

    /// Run one frame if it is due and present it
    fn step(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let now = Instant::now();
        if !self.engine.is_frame_due(now) {
            return Ok(());
        }

        let events = self.window.handle_events();
        let outcome = self.engine.frame(events, now, &mut self.window)?;
        if outcome == FrameOutcome::Presented {
            let engine = &mut self.engine;
            self.window.run_ui(|ui| engine.run_ui(ui));
            self.window.swap_buffers()?;
        }
        self.engine.finish_frame(Instant::now());

        if self.engine.should_close() {
            event_loop.exit();
        }
        Ok(())
    }
}

impl<A: Application> ApplicationHandler for AppRuntime<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_valid() || self.engine.state() != LoopState::NotRunning {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            self.fail(event_loop, err.context("Startup failed"));
            return;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.engine.pacer().deadline()));
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::RedrawRequested) {
            return;
        }
        self.window.push_event(event);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.engine.state() != LoopState::Running {
            return;
        }
        if let Err(err) = self.step(event_loop) {
            self.fail(event_loop, err);
            return;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.engine.pacer().deadline()));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Err(err) = self.engine.shutdown() {
            self.failure = Some(match self.failure.take() {
                Some(failure) => with_shutdown_failure(failure, err),
                None => err.context("Shutdown failed"),
            });
        }
        if self.window.is_valid() {
            self.window.destroy();
        }
    }
}

/// Create an event loop (X11 on Linux)
pub fn create_event_loop() -> Result<EventLoop<()>, FrameworkError> {
    #[cfg(target_os = "linux")]
    let event_loop = {
        let mut builder = EventLoop::builder();
        builder.with_x11();
        builder.build()
    };

    #[cfg(not(target_os = "linux"))]
    let event_loop = EventLoop::new();

    event_loop.map_err(|e| FrameworkError::EventLoop(e.to_string()))
}

/// Run `app` in a native window until it closes
///
/// Returns the first error that stopped the loop.
pub fn run_app<A: Application>(
    app: A,
    config: AppConfig,
    args: Vec<String>,
) -> anyhow::Result<()> {
    let event_loop = create_event_loop()?;
    let mut runtime = AppRuntime::new(app, config, args);

    event_loop
        .run_app(&mut runtime)
        .map_err(|e| FrameworkError::EventLoop(e.to_string()))?;

    match runtime.take_failure() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
