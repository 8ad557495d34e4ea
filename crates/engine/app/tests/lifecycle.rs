//! Layer lifecycle, deferred commands, discarded frames and headless runs

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use battery_app::{
    AppConfig, AppContext, Application, Engine, FrameOutcome, HeadlessHost, Layer, LoopState,
};
use battery_renderer::{DrawCall, HeadlessBackend, PrimitiveShader, Renderer2D};
use glam::{Vec2, Vec4};

#[derive(Default)]
struct Counts {
    attached: u32,
    detached: u32,
    updates: u32,
    renders: u32,
    order: Vec<String>,
}

type Shared = Rc<RefCell<Counts>>;

struct Tracked {
    name: String,
    counts: Shared,
    discard: bool,
}

impl Tracked {
    fn boxed(name: &str, counts: &Shared) -> Box<Self> {
        Box::new(Self {
            name: name.to_string(),
            counts: counts.clone(),
            discard: false,
        })
    }
}

impl Layer for Tracked {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_attach(&mut self, _ctx: &mut AppContext) {
        self.counts.borrow_mut().attached += 1;
    }

    fn on_detach(&mut self, _ctx: &mut AppContext) {
        let mut counts = self.counts.borrow_mut();
        counts.detached += 1;
        counts.order.push(self.name.clone());
    }

    fn on_update(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        self.counts.borrow_mut().updates += 1;
        if self.discard {
            ctx.discard_frame();
        }
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        self.counts.borrow_mut().renders += 1;
        let scene = ctx.window_scene();
        ctx.renderer.begin_scene(scene)?;
        ctx.renderer.draw_circle(
            Vec2::new(100.0, 100.0),
            20.0,
            2.0,
            Vec4::ONE,
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            3.0,
        );
        // Left open on purpose; post-render closes it
        Ok(())
    }
}

struct Host {
    counts: Shared,
    layers: Vec<Box<Tracked>>,
    spawn_on_frame: Option<u64>,
}

impl Application for Host {
    fn on_startup(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        for layer in self.layers.drain(..) {
            ctx.push_layer(layer);
        }
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        if self.spawn_on_frame == Some(ctx.frame_count()) {
            ctx.push_overlay(Tracked::boxed("spawned", &self.counts));
        }
        Ok(())
    }
}

fn engine(host: Host) -> (Engine<Host>, battery_renderer::DrawLog) {
    let backend = HeadlessBackend::new();
    let log = backend.log();
    let config = AppConfig::new("Lifecycle").with_size(640, 480);
    let mut engine = Engine::new(host, &config, Vec::new());
    let ctx = engine.context_mut();
    ctx.renderer = Renderer2D::new(Box::new(backend));
    ctx.window.valid = true;
    (engine, log)
}

#[test]
fn test_attach_and_detach_exactly_once() {
    let counts = Shared::default();
    let host = Host {
        counts: counts.clone(),
        layers: vec![
            Tracked::boxed("a", &counts),
            Tracked::boxed("b", &counts),
            Tracked::boxed("c", &counts),
        ],
        spawn_on_frame: Some(1),
    };
    let (mut engine, _) = engine(host);
    engine.startup().unwrap();
    assert_eq!(counts.borrow().attached, 3);

    let now = Instant::now();
    engine.frame(std::iter::empty(), now, &mut HeadlessHost).unwrap();
    // Pushed during update, attached after it
    assert_eq!(counts.borrow().attached, 4);
    assert_eq!(counts.borrow().updates, 3);
    assert_eq!(engine.layers().names(), vec!["a", "b", "c", "spawned"]);

    engine.shutdown().unwrap();
    let counts = counts.borrow();
    assert_eq!(counts.detached, 4);
    assert_eq!(counts.order, vec!["spawned", "c", "b", "a"]);
    assert_eq!(engine.state(), LoopState::Stopped);
}

#[test]
fn test_discarded_frame_skips_render() {
    let counts = Shared::default();
    let mut discarding = Tracked::boxed("discarding", &counts);
    discarding.discard = true;
    let host = Host {
        counts: counts.clone(),
        layers: vec![discarding, Tracked::boxed("plain", &counts)],
        spawn_on_frame: None,
    };
    let (mut engine, log) = engine(host);
    engine.startup().unwrap();

    let outcome = engine
        .frame(std::iter::empty(), Instant::now(), &mut HeadlessHost)
        .unwrap();
    assert_eq!(outcome, FrameOutcome::Discarded);
    assert_eq!(counts.borrow().updates, 2);
    assert_eq!(counts.borrow().renders, 0);
    assert!(log.is_empty());
    engine.shutdown().unwrap();
}

#[test]
fn test_unfinished_scene_is_closed_after_render() {
    let counts = Shared::default();
    let host = Host {
        counts: counts.clone(),
        layers: vec![Tracked::boxed("only", &counts)],
        spawn_on_frame: None,
    };
    let (mut engine, log) = engine(host);
    engine.startup().unwrap();

    let outcome = engine
        .frame(std::iter::empty(), Instant::now(), &mut HeadlessHost)
        .unwrap();
    assert_eq!(outcome, FrameOutcome::Presented);
    assert!(!engine.context().renderer.is_scene_open());

    let shaders: Vec<_> = log.quads().iter().filter_map(DrawCall::shader).collect();
    assert_eq!(shaders, vec![PrimitiveShader::Circle, PrimitiveShader::Arc]);
    engine.shutdown().unwrap();
}

#[test]
fn test_headless_run_stops_at_frame_limit() {
    let counts = Shared::default();
    let host = Host {
        counts: counts.clone(),
        layers: vec![Tracked::boxed("only", &counts)],
        spawn_on_frame: None,
    };
    let config = AppConfig::new("Headless")
        .with_framerate(200.0)
        .with_max_frames(10);
    let mut engine = Engine::new(host, &config, Vec::new());

    let started = Instant::now();
    let frames = engine.run_headless(None).unwrap();
    let elapsed = started.elapsed();

    assert_eq!(frames, 10);
    assert_eq!(counts.borrow().updates, 10);
    assert_eq!(counts.borrow().detached, 1);
    // Ten frames at 200 fps, the first one immediate
    assert!(elapsed >= Duration::from_millis(40), "ran too fast: {elapsed:?}");
}

#[test]
fn test_close_from_update_ends_headless_run() {
    struct Quitter;
    impl Application for Quitter {
        fn on_update(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
            if ctx.frame_count() == 3 {
                ctx.close();
            }
            Ok(())
        }
    }

    let config = AppConfig::new("Quit").with_framerate(1000.0);
    let mut engine = Engine::new(Quitter, &config, Vec::new());
    assert_eq!(engine.run_headless(Some(100)).unwrap(), 3);
}
