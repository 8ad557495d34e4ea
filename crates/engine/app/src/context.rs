//! Per-application state handed to every hook

use battery_renderer::{DEFAULT_BACKGROUND, RenderTarget, Renderer2D, Scene};
use battery_system::{
    AppPaths, FrameTimer, FrameworkResult, InputState, UpdateChecker, VersionFile, WindowCommand,
    WindowState, DEFAULT_FRAMERATE,
};
use glam::{IVec2, UVec2, Vec4};

use crate::layer::{Layer, LayerId};

/// Layer stack change requested from inside a callback
///
/// Applied by the engine after the update phase, when no layer is borrowed.
pub(crate) enum StackCommand {
    PushLayer(Box<dyn Layer>),
    PushOverlay(Box<dyn Layer>),
    Pop(LayerId),
    Clear,
}

/// Shared state of a running application
///
/// Passed explicitly to the application and to every layer callback.
pub struct AppContext {
    /// Command line arguments, program name first
    pub args: Vec<String>,
    pub renderer: Renderer2D,
    /// Last known window geometry and focus
    pub window: WindowState,
    pub input: InputState,
    pub timer: FrameTimer,
    pub paths: AppPaths,
    /// Colour the window is cleared to before rendering
    pub background: Vec4,

    desired_framerate: f64,
    frametime: f32,
    framerate: f32,
    close_requested: bool,
    discard_frame: bool,
    window_commands: Vec<WindowCommand>,
    stack_commands: Vec<StackCommand>,
}

impl AppContext {
    pub fn new(args: Vec<String>, window: WindowState, paths: AppPaths) -> Self {
        Self {
            args,
            renderer: Renderer2D::headless(),
            window,
            input: InputState::new(),
            timer: FrameTimer::new(),
            paths,
            background: DEFAULT_BACKGROUND,
            desired_framerate: DEFAULT_FRAMERATE,
            frametime: 0.0,
            framerate: 0.0,
            close_requested: false,
            discard_frame: false,
            window_commands: Vec::new(),
            stack_commands: Vec::new(),
        }
    }

    /// Context with a headless renderer and a window of the given size
    pub fn headless(width: u32, height: u32) -> Self {
        let window = WindowState {
            valid: true,
            focused: true,
            ..WindowState::with_size(width, height)
        };
        Self::new(Vec::new(), window, AppPaths::new("", ""))
    }

    // Loop control

    /// Ask the loop to stop after the current iteration
    pub fn close(&mut self) {
        if !self.close_requested {
            tracing::info!("Close requested");
        }
        self.close_requested = true;
    }

    pub fn should_close(&self) -> bool {
        self.close_requested
    }

    /// Skip the remaining render phases and the buffer swap of this frame
    pub fn discard_frame(&mut self) {
        self.discard_frame = true;
    }

    pub fn is_frame_discarded(&self) -> bool {
        self.discard_frame
    }

    pub(crate) fn begin_frame(&mut self) {
        self.discard_frame = false;
    }

    pub fn desired_framerate(&self) -> f64 {
        self.desired_framerate
    }

    /// Change the target update rate; non-positive rates fall back to the default
    pub fn set_framerate(&mut self, framerate: f64) {
        self.desired_framerate = if framerate.is_finite() && framerate > 0.0 {
            framerate
        } else {
            tracing::warn!("Invalid framerate {}, using {}", framerate, DEFAULT_FRAMERATE);
            DEFAULT_FRAMERATE
        };
    }

    /// Seconds between the last two frames (0 on the first frame)
    pub fn frametime(&self) -> f32 {
        self.frametime
    }

    /// Instantaneous frames per second (0 on the first frame)
    pub fn framerate(&self) -> f32 {
        self.framerate
    }

    pub fn frame_count(&self) -> u64 {
        self.timer.frame_count()
    }

    pub(crate) fn record_frame_time(&mut self, delta: f32) {
        self.frametime = delta;
        self.framerate = if delta > 0.0 { 1.0 / delta } else { 0.0 };
    }

    // Deferred layer stack commands

    pub fn push_layer(&mut self, layer: Box<dyn Layer>) {
        self.stack_commands.push(StackCommand::PushLayer(layer));
    }

    pub fn push_overlay(&mut self, layer: Box<dyn Layer>) {
        self.stack_commands.push(StackCommand::PushOverlay(layer));
    }

    pub fn pop_layer(&mut self, id: LayerId) {
        self.stack_commands.push(StackCommand::Pop(id));
    }

    pub fn clear_layers(&mut self) {
        self.stack_commands.push(StackCommand::Clear);
    }

    pub(crate) fn take_stack_commands(&mut self) -> Vec<StackCommand> {
        std::mem::take(&mut self.stack_commands)
    }

    // Deferred window commands

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.window_commands.push(WindowCommand::SetTitle(title.into()));
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_commands
            .push(WindowCommand::SetSize(UVec2::new(width, height)));
    }

    pub fn set_window_position(&mut self, x: i32, y: i32) {
        self.window_commands
            .push(WindowCommand::SetPosition(IVec2::new(x, y)));
    }

    pub fn maximize(&mut self) {
        self.window_commands.push(WindowCommand::Maximize);
    }

    pub fn minimize(&mut self) {
        self.window_commands.push(WindowCommand::Minimize);
    }

    pub fn restore(&mut self) {
        self.window_commands.push(WindowCommand::Restore);
    }

    pub(crate) fn take_window_commands(&mut self) -> Vec<WindowCommand> {
        std::mem::take(&mut self.window_commands)
    }

    // Helpers

    /// Scene drawing into the window at its current size
    pub fn window_scene(&self) -> Scene {
        if self.window.valid {
            Scene::new(RenderTarget::new(self.window.width(), self.window.height()))
        } else {
            Scene::detached()
        }
    }

    /// Version file in this application's settings directory
    pub fn version_file(&self) -> FrameworkResult<VersionFile> {
        VersionFile::for_app(&self.paths)
    }

    /// Whether `user/repo` has a latest release newer than the stored version
    ///
    /// Blocks on the network request. Any failure counts as "no update".
    pub fn check_for_update(&self, user: &str, repo: &str) -> bool {
        match self.version_file() {
            Ok(file) => UpdateChecker::new().check_for_github_update(&file, user, repo),
            Err(err) => {
                tracing::warn!("Update check skipped: {}", err);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_commands_are_queued_in_order() {
        let mut ctx = AppContext::headless(800, 600);
        ctx.set_title("Hello");
        ctx.set_window_size(640, 480);
        ctx.maximize();

        let commands = ctx.take_window_commands();
        assert_eq!(
            commands,
            vec![
                WindowCommand::SetTitle("Hello".into()),
                WindowCommand::SetSize(UVec2::new(640, 480)),
                WindowCommand::Maximize,
            ]
        );
        assert!(ctx.take_window_commands().is_empty());
    }

    #[test]
    fn test_set_framerate_rejects_invalid() {
        let mut ctx = AppContext::headless(1, 1);
        ctx.set_framerate(30.0);
        assert_eq!(ctx.desired_framerate(), 30.0);
        ctx.set_framerate(0.0);
        assert_eq!(ctx.desired_framerate(), DEFAULT_FRAMERATE);
        ctx.set_framerate(f64::NAN);
        assert_eq!(ctx.desired_framerate(), DEFAULT_FRAMERATE);
    }

    #[test]
    fn test_record_frame_time() {
        let mut ctx = AppContext::headless(1, 1);
        ctx.record_frame_time(0.0);
        assert_eq!(ctx.framerate(), 0.0);
        ctx.record_frame_time(0.02);
        assert!((ctx.framerate() - 50.0).abs() < 1e-3);
        assert_eq!(ctx.frametime(), 0.02);
    }

    #[test]
    fn test_window_scene_follows_window_size() {
        let ctx = AppContext::headless(800, 600);
        let scene = ctx.window_scene();
        assert_eq!(scene.target, Some(RenderTarget::new(800, 600)));

        let mut closed = AppContext::headless(800, 600);
        closed.window.valid = false;
        assert!(closed.window_scene().target.is_none());
    }

    #[test]
    fn test_version_file_requires_identity() {
        let ctx = AppContext::headless(1, 1);
        assert!(ctx.version_file().is_err());
        assert!(!ctx.check_for_update("user", "repo"));
    }
}
