//! Platform-independent application loop
//!
//! [`Engine`] owns the application, its context and the layer stack and
//! runs one frame at a time. The native runtime feeds it translated events
//! and presents what it drew; [`Engine::run_headless`] drives it without a
//! window.

use std::time::Instant;

use battery_system::{Event, EventFlow, FramePacer, WindowCommand, WindowState};

use crate::application::Application;
use crate::config::AppConfig;
use crate::context::{AppContext, StackCommand};
use crate::layer::LayerStack;

/// Lifecycle of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    NotRunning,
    Running,
    ShuttingDown,
    Stopped,
}

/// What the caller should do with the frame that was just run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Rendered; swap buffers
    Presented,
    /// Discarded; skip the swap
    Discarded,
}

/// Applies deferred window commands to whatever stands in for the window
pub trait WindowHost {
    fn apply(&mut self, command: WindowCommand, state: &mut WindowState);
}

/// Host for runs without a native window; records geometry changes only
#[derive(Debug, Default)]
pub struct HeadlessHost;

impl WindowHost for HeadlessHost {
    fn apply(&mut self, command: WindowCommand, state: &mut WindowState) {
        match command {
            WindowCommand::SetSize(size) => state.size = size,
            WindowCommand::SetPosition(position) => state.position = position,
            other => tracing::trace!("Headless window ignores {:?}", other),
        }
    }
}

pub struct Engine<A: Application> {
    app: A,
    ctx: AppContext,
    layers: LayerStack,
    state: LoopState,
    pacer: FramePacer,
    max_frames: Option<u64>,
}

impl<A: Application> Engine<A> {
    pub fn new(app: A, config: &AppConfig, args: Vec<String>) -> Self {
        let mut ctx = AppContext::new(
            args,
            WindowState::with_size(config.width, config.height),
            config.paths(),
        );
        ctx.background = config.background_color();
        ctx.set_framerate(config.framerate);

        Self {
            app,
            pacer: FramePacer::new(ctx.desired_framerate(), Instant::now()),
            ctx,
            layers: LayerStack::new(),
            state: LoopState::NotRunning,
            max_frames: config.max_frames,
        }
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut A {
        &mut self.app
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut AppContext {
        &mut self.ctx
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    /// Close requested, or the frame limit reached
    pub fn should_close(&self) -> bool {
        self.ctx.should_close()
            || self
                .max_frames
                .is_some_and(|max| self.ctx.frame_count() >= max)
    }

    /// Run the startup hook and apply the layers it pushed
    pub fn startup(&mut self) -> anyhow::Result<()> {
        if self.state != LoopState::NotRunning {
            tracing::warn!("Engine already started ({:?})", self.state);
            return Ok(());
        }
        tracing::info!(
            "Starting up ({}x{}, {} fps, renderer: {})",
            self.ctx.window.width(),
            self.ctx.window.height(),
            self.ctx.desired_framerate(),
            self.ctx.renderer.backend_name()
        );

        self.app.on_startup(&mut self.ctx)?;
        self.apply_stack_commands();

        let now = Instant::now();
        self.pacer = FramePacer::new(self.ctx.desired_framerate(), now);
        self.ctx.timer = battery_system::FrameTimer::starting_at(now);
        self.state = LoopState::Running;
        Ok(())
    }

    /// Offer one event to the layers (topmost first), then to the application
    ///
    /// A `WindowClose` nobody handles requests close.
    pub fn handle_event(&mut self, event: &Event) -> EventFlow {
        self.ctx.input.apply(event);
        self.ctx.window.apply(event);

        let mut flow = self.layers.dispatch(&mut self.ctx, event);
        if !flow.is_handled() {
            flow = self.app.on_event(&mut self.ctx, event);
        }
        if !flow.is_handled() && matches!(event, Event::WindowClose) {
            self.ctx.close();
        }
        flow
    }

    /// Whether the pacer says the next frame should run
    pub fn is_frame_due(&self, now: Instant) -> bool {
        self.pacer.is_due(now)
    }

    /// Advance the pacing deadline after a frame ran
    pub fn finish_frame(&mut self, now: Instant) {
        self.pacer.set_framerate(self.ctx.desired_framerate());
        self.pacer.finish_frame(now);
    }

    /// Run one iteration: dispatch `events`, update, apply deferred commands, render
    ///
    /// Errors from update or render hooks are returned as-is; the caller
    /// stops the loop.
    pub fn frame(
        &mut self,
        events: impl IntoIterator<Item = Event>,
        now: Instant,
        host: &mut dyn WindowHost,
    ) -> anyhow::Result<FrameOutcome> {
        self.ctx.begin_frame();

        // Pre-update
        for event in events {
            self.handle_event(&event);
        }
        let delta = self.ctx.timer.tick_at(now);
        let delta = if self.ctx.timer.frame_count() == 1 { 0.0 } else { delta };
        self.ctx.record_frame_time(delta);
        tracing::trace!(
            "Frame {} ({:.2} ms)",
            self.ctx.frame_count(),
            delta * 1000.0
        );

        // Update
        self.app.on_update(&mut self.ctx)?;
        self.layers.update_all(&mut self.ctx)?;

        // Post-update
        self.apply_stack_commands();
        for command in self.ctx.take_window_commands() {
            host.apply(command, &mut self.ctx.window);
        }
        self.ctx.input.clear_deltas();

        if self.ctx.is_frame_discarded() {
            tracing::trace!("Frame {} discarded after update", self.ctx.frame_count());
            return Ok(FrameOutcome::Discarded);
        }

        // Pre-render
        self.ctx.renderer.reset_stats();
        let scene = self.ctx.window_scene();
        if self.ctx.renderer.begin_scene(scene).is_ok() {
            let background = self.ctx.background;
            self.ctx.renderer.draw_background(background);
            self.ctx.renderer.end_scene()?;
        }

        // Render
        self.app.on_render(&mut self.ctx)?;
        if !self.ctx.is_frame_discarded() {
            self.layers.render_all(&mut self.ctx)?;
        }

        // Post-render
        self.ctx.renderer.end_unfinished_scene();

        if self.ctx.is_frame_discarded() {
            tracing::trace!("Frame {} discarded during render", self.ctx.frame_count());
            return Ok(FrameOutcome::Discarded);
        }
        Ok(FrameOutcome::Presented)
    }

    /// Build the GUI for this frame: application first, then layers bottom to top
    pub fn run_ui(&mut self, ui: &egui::Context) {
        self.app.on_ui(&mut self.ctx, ui);
        self.layers.ui_all(&mut self.ctx, ui);
    }

    fn apply_stack_commands(&mut self) {
        for command in self.ctx.take_stack_commands() {
            match command {
                StackCommand::PushLayer(layer) => {
                    self.layers.push_layer(layer, &mut self.ctx);
                }
                StackCommand::PushOverlay(layer) => {
                    self.layers.push_overlay(layer, &mut self.ctx);
                }
                StackCommand::Pop(id) => {
                    if self.layers.pop_layer(id, &mut self.ctx).is_none() {
                        tracing::warn!("Can't pop {:?}: not on the layer stack", id);
                    }
                }
                StackCommand::Clear => self.layers.clear(&mut self.ctx),
            }
        }
    }

    /// Run the shutdown hook, clear the layer stack and release the renderer backend
    ///
    /// Teardown always completes; an error from the shutdown hook is
    /// returned afterwards. The native window is destroyed by the caller.
    pub fn shutdown(&mut self) -> anyhow::Result<()> {
        if self.state == LoopState::Stopped {
            tracing::warn!("Engine already stopped");
            return Ok(());
        }
        tracing::info!("Shutting down after {} frames", self.ctx.frame_count());
        self.state = LoopState::ShuttingDown;

        let result = self.app.on_shutdown(&mut self.ctx);
        if let Err(err) = &result {
            tracing::error!("Shutdown hook failed: {:#}", err);
        }

        // Layers pushed but never applied were never attached
        drop(self.ctx.take_stack_commands());
        self.layers.clear(&mut self.ctx);
        self.ctx.renderer.shutdown();

        self.state = LoopState::Stopped;
        result
    }

    /// Drive the loop without a native window until close or `max_frames`
    ///
    /// Returns the number of frames run. Shutdown runs even when startup or
    /// a frame fails.
    pub fn run_headless(&mut self, max_frames: Option<u64>) -> anyhow::Result<u64> {
        if let Some(max) = max_frames {
            self.max_frames = Some(max);
        }
        self.ctx.window.valid = true;
        self.ctx.window.focused = true;

        let result = self.startup().and_then(|()| self.headless_loop());
        match (result, self.shutdown()) {
            (Ok(frames), Ok(())) => Ok(frames),
            (Err(err), Ok(())) => Err(err),
            (Ok(_), Err(shutdown)) => Err(shutdown.context("Shutdown failed")),
            (Err(err), Err(shutdown)) => Err(with_shutdown_failure(err, shutdown)),
        }
    }

    fn headless_loop(&mut self) -> anyhow::Result<u64> {
        let mut host = HeadlessHost;
        let mut frames = 0;
        while !self.should_close() {
            self.pacer.wait();
            self.frame(std::iter::empty(), Instant::now(), &mut host)?;
            self.finish_frame(Instant::now());
            frames += 1;
        }
        Ok(frames)
    }
}

/// Report a shutdown error alongside the failure that ended the loop
pub(crate) fn with_shutdown_failure(
    failure: anyhow::Error,
    shutdown: anyhow::Error,
) -> anyhow::Error {
    anyhow::anyhow!("{:#}\nShutdown failed as well: {:#}", failure, shutdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Layer;
    use battery_renderer::{DrawCall, HeadlessBackend, Renderer2D};
    use glam::{UVec2, Vec2, Vec4};
    use std::time::Duration;

    #[derive(Default)]
    struct Counter {
        updates: u32,
        renders: u32,
        events: u32,
    }

    impl Application for Counter {
        fn on_update(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
            self.updates += 1;
            Ok(())
        }
        fn on_render(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
            self.renders += 1;
            let scene = ctx.window_scene();
            ctx.renderer.begin_scene(scene)?;
            ctx.renderer.draw_quad(Vec2::ZERO, Vec2::splat(10.0), Vec4::ONE);
            ctx.renderer.end_scene()?;
            Ok(())
        }
        fn on_event(&mut self, _ctx: &mut AppContext, _event: &Event) -> EventFlow {
            self.events += 1;
            EventFlow::Passed
        }
    }

    fn engine<A: Application>(app: A) -> Engine<A> {
        let config = AppConfig::new("Test").with_size(800, 600);
        let mut engine = Engine::new(app, &config, vec!["test".into()]);
        engine.context_mut().window.valid = true;
        engine
    }

    #[test]
    fn test_frame_clears_then_renders() {
        let backend = HeadlessBackend::new();
        let log = backend.log();
        let mut engine = engine(Counter::default());
        engine.context_mut().renderer = Renderer2D::new(Box::new(backend));
        engine.startup().unwrap();

        let outcome = engine
            .frame(std::iter::empty(), Instant::now(), &mut HeadlessHost)
            .unwrap();
        assert_eq!(outcome, FrameOutcome::Presented);
        assert_eq!(engine.app().updates, 1);
        assert_eq!(engine.app().renders, 1);

        let calls = log.calls();
        assert_eq!(calls[1], DrawCall::Clear(battery_renderer::DEFAULT_BACKGROUND));
        assert_eq!(log.quads().len(), 1);
        engine.shutdown().unwrap();
    }

    #[test]
    fn test_first_frame_has_zero_frametime() {
        let mut engine = engine(Counter::default());
        engine.startup().unwrap();
        let start = Instant::now();
        engine
            .frame(std::iter::empty(), start, &mut HeadlessHost)
            .unwrap();
        assert_eq!(engine.context().frametime(), 0.0);
        assert_eq!(engine.context().frame_count(), 1);

        engine
            .frame(
                std::iter::empty(),
                start + Duration::from_millis(20),
                &mut HeadlessHost,
            )
            .unwrap();
        assert!((engine.context().framerate() - 50.0).abs() < 0.5);
        engine.shutdown().unwrap();
    }

    #[test]
    fn test_unhandled_window_close_requests_close() {
        let mut engine = engine(Counter::default());
        engine.startup().unwrap();
        assert_eq!(engine.handle_event(&Event::WindowClose), EventFlow::Passed);
        assert!(engine.should_close());
        assert_eq!(engine.app().events, 1);
        engine.shutdown().unwrap();
    }

    struct Veto;
    impl Layer for Veto {
        fn name(&self) -> &str {
            "veto"
        }
        fn on_event(&mut self, _ctx: &mut AppContext, event: &Event) -> EventFlow {
            EventFlow::from_handled(matches!(event, Event::WindowClose))
        }
    }

    #[test]
    fn test_handled_window_close_keeps_running() {
        let mut engine = engine(Counter::default());
        engine.context_mut().push_layer(Box::new(Veto));
        engine.startup().unwrap();
        assert_eq!(engine.layers().len(), 1);

        assert_eq!(engine.handle_event(&Event::WindowClose), EventFlow::Handled);
        assert!(!engine.should_close());
        assert_eq!(engine.app().events, 0);
        engine.shutdown().unwrap();
    }

    #[test]
    fn test_window_commands_reach_host() {
        struct Resizer;
        impl Application for Resizer {
            fn on_update(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
                ctx.set_window_size(320, 200);
                Ok(())
            }
        }

        let mut engine = engine(Resizer);
        engine.startup().unwrap();
        engine
            .frame(std::iter::empty(), Instant::now(), &mut HeadlessHost)
            .unwrap();
        assert_eq!(engine.context().window.size, UVec2::new(320, 200));
        engine.shutdown().unwrap();
    }

    #[test]
    fn test_update_error_is_returned() {
        struct Failing;
        impl Application for Failing {
            fn on_update(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
                anyhow::bail!("boom")
            }
        }

        let mut engine = engine(Failing);
        let err = engine.run_headless(Some(3)).unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(engine.state(), LoopState::Stopped);
    }

    #[test]
    fn test_shutdown_error_reported_with_update_error() {
        struct FailingTwice;
        impl Application for FailingTwice {
            fn on_update(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
                anyhow::bail!("update broke")
            }
            fn on_shutdown(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
                anyhow::bail!("shutdown broke")
            }
        }

        let mut engine = engine(FailingTwice);
        let message = engine.run_headless(Some(3)).unwrap_err().to_string();
        assert!(message.contains("update broke"), "{message}");
        assert!(message.contains("shutdown broke"), "{message}");
        assert_eq!(engine.state(), LoopState::Stopped);
    }

    #[test]
    fn test_shutdown_error_alone_is_returned() {
        struct FailingShutdown;
        impl Application for FailingShutdown {
            fn on_shutdown(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
                anyhow::bail!("shutdown broke")
            }
        }

        let mut engine = engine(FailingShutdown);
        let err = engine.run_headless(Some(2)).unwrap_err();
        assert!(format!("{err:#}").contains("shutdown broke"));
    }

    #[test]
    fn test_pacer_follows_framerate_changes() {
        let mut engine = engine(Counter::default());
        engine.startup().unwrap();
        engine.context_mut().set_framerate(30.0);
        let now = Instant::now();
        engine.finish_frame(now);
        assert_eq!(engine.pacer().framerate(), 30.0);
        engine.shutdown().unwrap();
    }
}
