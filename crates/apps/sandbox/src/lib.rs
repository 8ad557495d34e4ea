//! Battery sandbox
//!
//! A base layer drawing every primitive, an overlay handling keyboard
//! shortcuts, and a small GUI with framerate, dialogs and the clipboard.

use battery_app::{AppContext, Application, Layer};
use battery_renderer::image::{Rgba, RgbaImage};
use battery_renderer::{rgba8, Texture2D, TextureFlags, DEFAULT_FALLOFF};
use battery_system::{
    platform, Clipboard, Event, EventFlow, FileFilter, FrameworkResult, KeyCode,
};
use glam::{Vec2, Vec4};

/// Degrees per second the arc sweeps
const ARC_SPEED: f32 = 90.0;

/// Cells per side of the checkerboard texture
const CHECKER_CELLS: u32 = 8;

/// Draws lines, an animated arc, circles, rectangles, a quad and a texture
pub struct ShapesLayer {
    angle: f32,
    radius: f32,
    paused: bool,
    checker: Texture2D,
}

impl Default for ShapesLayer {
    fn default() -> Self {
        Self {
            angle: 0.0,
            radius: 60.0,
            paused: false,
            checker: checkerboard(),
        }
    }
}

fn checkerboard() -> Texture2D {
    let image = RgbaImage::from_fn(CHECKER_CELLS, CHECKER_CELLS, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([235, 235, 235, 255])
        } else {
            Rgba([60, 60, 70, 255])
        }
    });
    Texture2D::from_image(image, TextureFlags::default())
}

impl ShapesLayer {
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Layer for ShapesLayer {
    fn name(&self) -> &str {
        "shapes"
    }

    fn on_update(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        // Holding space freezes the arc like the pause toggle
        if !self.paused && !ctx.input.is_key_pressed(KeyCode::Space) {
            self.angle = (self.angle + ARC_SPEED * ctx.frametime()) % 360.0;
        }
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        let scene = ctx.window_scene();
        let size = ctx.window.size.as_vec2();
        let center = size / 2.0;
        let r = &mut ctx.renderer;

        r.begin_scene(scene)?;

        r.draw_line(
            Vec2::new(20.0, 20.0),
            Vec2::new(size.x - 20.0, 20.0),
            3.0,
            rgba8(230, 230, 230, 255),
            DEFAULT_FALLOFF,
        );
        r.draw_rectangle(
            Vec2::new(40.0, 60.0),
            Vec2::new(240.0, 180.0),
            4.0,
            rgba8(255, 200, 0, 255),
            rgba8(40, 40, 120, 255),
            DEFAULT_FALLOFF,
        );
        r.draw_quad(
            Vec2::new(size.x - 180.0, 60.0),
            Vec2::new(140.0, 120.0),
            rgba8(0, 160, 90, 200),
        );
        r.draw_texture(
            &mut self.checker,
            Vec2::new(40.0, size.y - 160.0),
            Vec2::splat(120.0),
            Vec4::ONE,
        );
        r.draw_circle(
            center,
            self.radius,
            5.0,
            Vec4::ONE,
            rgba8(200, 60, 60, 255),
            DEFAULT_FALLOFF,
        );
        r.draw_arc(
            center,
            self.radius + 30.0,
            self.angle,
            self.angle + 120.0,
            8.0,
            rgba8(90, 180, 255, 255),
            DEFAULT_FALLOFF,
        );

        r.end_scene()?;
        Ok(())
    }

    fn on_detach(&mut self, _ctx: &mut AppContext) {
        // Before the renderer shuts down
        if let Err(err) = self.checker.unload() {
            tracing::warn!("Checkerboard texture: {}", err);
        }
    }

    fn on_event(&mut self, _ctx: &mut AppContext, event: &Event) -> EventFlow {
        match event {
            Event::MouseScrolled { delta, .. } => {
                self.radius = (self.radius + delta.y * 5.0).clamp(10.0, 300.0);
                EventFlow::Handled
            }
            Event::KeyPressed {
                key: KeyCode::KeyP,
                repeat: false,
                ..
            } => {
                self.paused = !self.paused;
                EventFlow::Handled
            }
            _ => EventFlow::Passed,
        }
    }
}

/// Keyboard shortcuts; sees events before the shapes
#[derive(Default)]
pub struct ShortcutOverlay {
    maximized: bool,
}

impl Layer for ShortcutOverlay {
    fn name(&self) -> &str {
        "shortcuts"
    }

    fn on_event(&mut self, ctx: &mut AppContext, event: &Event) -> EventFlow {
        let Event::KeyPressed {
            key, repeat: false, ..
        } = event
        else {
            return EventFlow::Passed;
        };
        match key {
            KeyCode::Escape => ctx.close(),
            KeyCode::F11 => {
                if self.maximized {
                    ctx.restore();
                } else {
                    ctx.maximize();
                }
                self.maximized = !self.maximized;
            }
            _ => return EventFlow::Passed,
        }
        EventFlow::Handled
    }
}

/// Root of the demo
#[derive(Default)]
pub struct Sandbox {
    last_file: Option<String>,
    status: String,
    // X11 serves the selection from the owning process, so it stays alive
    clipboard: Option<Clipboard>,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clipboard opened on first use and kept for the rest of the run
    fn clipboard(&mut self) -> FrameworkResult<&mut Clipboard> {
        match &mut self.clipboard {
            Some(clipboard) => Ok(clipboard),
            slot @ None => Ok(slot.insert(Clipboard::new()?)),
        }
    }

    fn copy_stats(&mut self, ctx: &AppContext) {
        let stats = format!(
            "frame {} at {:.1} fps ({} quads)",
            ctx.frame_count(),
            ctx.framerate(),
            ctx.renderer.stats().quads
        );
        let clipboard = match self.clipboard() {
            Ok(clipboard) => clipboard,
            Err(err) => {
                tracing::warn!("Clipboard unavailable: {}", err);
                self.status = format!("Clipboard unavailable: {err}");
                return;
            }
        };
        self.status = match clipboard.set_text(&stats) {
            Ok(()) => "Copied stats to the clipboard".to_string(),
            Err(err) => {
                tracing::warn!("Copy failed: {}", err);
                format!("Copy failed: {err}")
            }
        };
    }
}

impl Application for Sandbox {
    fn on_startup(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        ctx.background = rgba8(30, 30, 36, 255);
        ctx.push_layer(Box::new(ShapesLayer::default()));
        ctx.push_overlay(Box::new(ShortcutOverlay::default()));

        if let Ok(file) = ctx.version_file() {
            let version = file.application_version();
            if !version.is_empty() {
                ctx.set_title(format!("Battery Sandbox {version}"));
            }
        }
        Ok(())
    }

    fn on_event(&mut self, _ctx: &mut AppContext, event: &Event) -> EventFlow {
        if let Event::WindowResize { .. } = event {
            tracing::debug!("{}", event);
        }
        EventFlow::Passed
    }

    fn on_ui(&mut self, ctx: &mut AppContext, ui: &egui::Context) {
        egui::Window::new("Sandbox").show(ui, |ui| {
            ui.label(format!("{:.1} fps", ctx.framerate()));
            ui.label(format!("{:.2} ms", ctx.frametime() * 1000.0));
            ui.label(format!("frame {}", ctx.frame_count()));
            if let Some(pos) = ctx.input.mouse_position() {
                ui.label(format!("mouse {:.0}, {:.0}", pos.x, pos.y));
            }

            ui.separator();
            if ui.button("Open file...").clicked() {
                let filters = [FileFilter::new("Text", &["txt", "md"]), FileFilter::all_files()];
                self.last_file = platform::open_file_dialog(&filters, None)
                    .map(|p| p.display().to_string());
            }
            if let Some(file) = &self.last_file {
                ui.label(file.as_str());
            }
            if ui.button("Copy stats").clicked() {
                self.copy_stats(ctx);
            }
            if !self.status.is_empty() {
                ui.label(self.status.as_str());
            }
            if ui.button("Quit").clicked() {
                ctx.close();
            }
        });
    }

    fn on_shutdown(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        tracing::info!(
            "Sandbox ran {} frames, {:.1} fps on average",
            ctx.frame_count(),
            ctx.timer.average_fps()
        );
        Ok(())
    }
}
