//! Event propagation through the engine: layers top to bottom, then the application

use std::cell::RefCell;
use std::rc::Rc;

use battery_app::{AppConfig, AppContext, Application, Engine, Layer};
use battery_system::{Event, EventFlow, KeyCode, Modifiers};

type Trace = Rc<RefCell<Vec<&'static str>>>;

struct Recorder {
    name: &'static str,
    trace: Trace,
    handle: bool,
}

impl Layer for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn on_event(&mut self, _ctx: &mut AppContext, _event: &Event) -> EventFlow {
        self.trace.borrow_mut().push(self.name);
        EventFlow::from_handled(self.handle)
    }
}

struct Root {
    trace: Trace,
    stop_at: Option<&'static str>,
}

impl Application for Root {
    fn on_startup(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        for name in ["L1", "L2"] {
            ctx.push_layer(Box::new(Recorder {
                name,
                trace: self.trace.clone(),
                handle: self.stop_at == Some(name),
            }));
        }
        ctx.push_overlay(Box::new(Recorder {
            name: "O",
            trace: self.trace.clone(),
            handle: self.stop_at == Some("O"),
        }));
        Ok(())
    }

    fn on_event(&mut self, _ctx: &mut AppContext, _event: &Event) -> EventFlow {
        self.trace.borrow_mut().push("root");
        EventFlow::Handled
    }
}

fn key_event() -> Event {
    Event::KeyPressed {
        key: KeyCode::Space,
        modifiers: Modifiers::NONE,
        repeat: false,
    }
}

fn run_dispatch(stop_at: Option<&'static str>) -> (Vec<&'static str>, EventFlow) {
    let trace = Trace::default();
    let root = Root {
        trace: trace.clone(),
        stop_at,
    };
    let config = AppConfig::new("Dispatch").with_size(800, 600);
    let mut engine = Engine::new(root, &config, Vec::new());
    engine.startup().unwrap();

    assert_eq!(engine.layers().names(), vec!["L1", "L2", "O"]);
    assert_eq!(engine.context().window.width(), 800);
    assert_eq!(engine.context().window.height(), 600);

    let flow = engine.handle_event(&key_event());
    engine.shutdown().unwrap();
    let order = trace.borrow().clone();
    (order, flow)
}

#[test]
fn test_key_event_reaches_every_layer_then_root() {
    let (order, flow) = run_dispatch(None);
    assert_eq!(order, vec!["O", "L2", "L1", "root"]);
    assert_eq!(flow, EventFlow::Handled);
}

#[test]
fn test_overlay_stops_propagation() {
    let (order, _) = run_dispatch(Some("O"));
    assert_eq!(order, vec!["O"]);
}

#[test]
fn test_middle_layer_stops_propagation() {
    let (order, _) = run_dispatch(Some("L2"));
    assert_eq!(order, vec!["O", "L2"]);
}

#[test]
fn test_bottom_layer_keeps_event_from_root() {
    let (order, _) = run_dispatch(Some("L1"));
    assert_eq!(order, vec!["O", "L2", "L1"]);
}

#[test]
fn test_dispatch_updates_input_state() {
    let trace = Trace::default();
    let root = Root {
        trace,
        stop_at: Some("O"),
    };
    let mut engine = Engine::new(root, &AppConfig::default(), Vec::new());
    engine.startup().unwrap();

    engine.handle_event(&key_event());
    assert!(engine.context().input.is_key_pressed(KeyCode::Space));

    engine.handle_event(&Event::WindowLostFocus);
    assert!(!engine.context().input.is_key_pressed(KeyCode::Space));
    engine.shutdown().unwrap();
}
