//! Layers and the layer stack
//!
//! Base layers (pushed with [`LayerStack::push_layer`]) always sit below
//! overlays ([`LayerStack::push_overlay`]). Update, render and UI traverse
//! the stack bottom to top; events traverse it top to bottom so the topmost
//! overlay sees them first and can stop propagation.

use battery_system::{Event, EventFlow};

use crate::context::AppContext;

/// Handle returned when a layer is pushed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

/// A named unit of update/render/event handling
///
/// Every callback receives the application context. All methods except
/// [`name`](Layer::name) have empty defaults.
pub trait Layer {
    fn name(&self) -> &str;

    /// Called once when the layer is pushed
    fn on_attach(&mut self, _ctx: &mut AppContext) {}

    /// Called once before the layer is dropped
    fn on_detach(&mut self, _ctx: &mut AppContext) {}

    fn on_update(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_render(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_event(&mut self, _ctx: &mut AppContext, _event: &Event) -> EventFlow {
        EventFlow::Passed
    }

    /// Immediate-mode GUI, drawn on top of everything rendered this frame
    fn on_ui(&mut self, _ctx: &mut AppContext, _ui: &egui::Context) {}
}

struct Entry {
    id: LayerId,
    attach_order: u64,
    layer: Box<dyn Layer>,
}

/// Ordered stack of layers and overlays
#[derive(Default)]
pub struct LayerStack {
    entries: Vec<Entry>,
    /// Index of the first overlay
    insert_index: usize,
    next_id: u64,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of base layers (below the overlays)
    pub fn layer_count(&self) -> usize {
        self.insert_index
    }

    pub fn overlay_count(&self) -> usize {
        self.entries.len() - self.insert_index
    }

    /// Layer names, bottom to top
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.layer.name()).collect()
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Insert a base layer above the other base layers, below all overlays
    pub fn push_layer(&mut self, layer: Box<dyn Layer>, ctx: &mut AppContext) -> LayerId {
        let index = self.insert_index;
        self.insert_index += 1;
        self.insert(index, layer, ctx)
    }

    /// Insert an overlay on top of the stack
    pub fn push_overlay(&mut self, layer: Box<dyn Layer>, ctx: &mut AppContext) -> LayerId {
        let index = self.entries.len();
        self.insert(index, layer, ctx)
    }

    fn insert(&mut self, index: usize, mut layer: Box<dyn Layer>, ctx: &mut AppContext) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;

        tracing::debug!("Attaching layer '{}'", layer.name());
        layer.on_attach(ctx);
        self.entries.insert(
            index,
            Entry {
                id,
                attach_order: id.0,
                layer,
            },
        );
        id
    }

    /// Detach and remove one layer; `None` if it is not on the stack
    pub fn pop_layer(&mut self, id: LayerId, ctx: &mut AppContext) -> Option<Box<dyn Layer>> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        if index < self.insert_index {
            self.insert_index -= 1;
        }
        let mut entry = self.entries.remove(index);
        tracing::debug!("Detaching layer '{}'", entry.layer.name());
        entry.layer.on_detach(ctx);
        Some(entry.layer)
    }

    /// Detach every layer in reverse attach order, then drop them
    pub fn clear(&mut self, ctx: &mut AppContext) {
        let mut entries = std::mem::take(&mut self.entries);
        self.insert_index = 0;

        entries.sort_by_key(|e| std::cmp::Reverse(e.attach_order));
        for entry in &mut entries {
            tracing::debug!("Detaching layer '{}'", entry.layer.name());
            entry.layer.on_detach(ctx);
        }
    }

    /// Run every layer's update, bottom to top
    pub fn update_all(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        for entry in &mut self.entries {
            entry.layer.on_update(ctx)?;
        }
        Ok(())
    }

    /// Run every layer's render, bottom to top
    pub fn render_all(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        for entry in &mut self.entries {
            entry.layer.on_render(ctx)?;
        }
        Ok(())
    }

    pub fn ui_all(&mut self, ctx: &mut AppContext, ui: &egui::Context) {
        for entry in &mut self.entries {
            entry.layer.on_ui(ctx, ui);
        }
    }

    /// Offer `event` top to bottom until a layer handles it
    pub fn dispatch(&mut self, ctx: &mut AppContext, event: &Event) -> EventFlow {
        self.entries
            .iter_mut()
            .rev()
            .try_fold((), |(), entry| match entry.layer.on_event(ctx, event) {
                EventFlow::Handled => {
                    tracing::trace!("{} handled by '{}'", event, entry.layer.name());
                    Err(())
                }
                EventFlow::Passed => Ok(()),
            })
            .map_or(EventFlow::Handled, |()| EventFlow::Passed)
    }
}

impl Drop for LayerStack {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            tracing::warn!(
                "Layer stack dropped with {} attached layers; call clear() first",
                self.entries.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Probe {
        name: &'static str,
        log: Log,
        handles: bool,
    }

    impl Probe {
        fn boxed(name: &'static str, log: &Log, handles: bool) -> Box<dyn Layer> {
            Box::new(Self {
                name,
                log: log.clone(),
                handles,
            })
        }
    }

    impl Layer for Probe {
        fn name(&self) -> &str {
            self.name
        }
        fn on_attach(&mut self, _ctx: &mut AppContext) {
            self.log.borrow_mut().push(format!("attach {}", self.name));
        }
        fn on_detach(&mut self, _ctx: &mut AppContext) {
            self.log.borrow_mut().push(format!("detach {}", self.name));
        }
        fn on_update(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
            self.log.borrow_mut().push(format!("update {}", self.name));
            Ok(())
        }
        fn on_event(&mut self, _ctx: &mut AppContext, _event: &Event) -> EventFlow {
            self.log.borrow_mut().push(format!("event {}", self.name));
            EventFlow::from_handled(self.handles)
        }
    }

    fn drain(log: &Log) -> Vec<String> {
        log.borrow_mut().drain(..).collect()
    }

    #[test]
    fn test_layers_below_overlays() {
        let log = Log::default();
        let mut ctx = AppContext::headless(800, 600);
        let mut stack = LayerStack::new();

        stack.push_overlay(Probe::boxed("O", &log, false), &mut ctx);
        stack.push_layer(Probe::boxed("L1", &log, false), &mut ctx);
        stack.push_layer(Probe::boxed("L2", &log, false), &mut ctx);

        assert_eq!(stack.names(), vec!["L1", "L2", "O"]);
        assert_eq!(stack.layer_count(), 2);
        assert_eq!(stack.overlay_count(), 1);

        stack.update_all(&mut ctx).unwrap();
        assert_eq!(
            drain(&log)[3..],
            ["update L1", "update L2", "update O"].map(String::from)
        );
        stack.clear(&mut ctx);
    }

    #[test]
    fn test_dispatch_stops_when_handled() {
        let log = Log::default();
        let mut ctx = AppContext::headless(800, 600);
        let mut stack = LayerStack::new();
        stack.push_layer(Probe::boxed("L1", &log, false), &mut ctx);
        stack.push_layer(Probe::boxed("L2", &log, true), &mut ctx);
        stack.push_overlay(Probe::boxed("O", &log, false), &mut ctx);
        drain(&log);

        let flow = stack.dispatch(&mut ctx, &Event::WindowFocus);
        assert_eq!(flow, EventFlow::Handled);
        assert_eq!(drain(&log), ["event O", "event L2"].map(String::from));
        stack.clear(&mut ctx);
    }

    #[test]
    fn test_dispatch_passes_through_empty_stack() {
        let mut ctx = AppContext::headless(1, 1);
        let mut stack = LayerStack::new();
        assert_eq!(stack.dispatch(&mut ctx, &Event::WindowClose), EventFlow::Passed);
    }

    #[test]
    fn test_pop_layer_detaches_once() {
        let log = Log::default();
        let mut ctx = AppContext::headless(1, 1);
        let mut stack = LayerStack::new();
        let id = stack.push_layer(Probe::boxed("L1", &log, false), &mut ctx);
        stack.push_overlay(Probe::boxed("O", &log, false), &mut ctx);
        drain(&log);

        assert!(stack.pop_layer(id, &mut ctx).is_some());
        assert!(stack.pop_layer(id, &mut ctx).is_none());
        assert_eq!(drain(&log), vec!["detach L1".to_string()]);
        assert_eq!(stack.layer_count(), 0);

        // Base layers still go below the remaining overlay
        stack.push_layer(Probe::boxed("L3", &log, false), &mut ctx);
        assert_eq!(stack.names(), vec!["L3", "O"]);
        stack.clear(&mut ctx);
    }

    #[test]
    fn test_clear_detaches_in_reverse_attach_order() {
        let log = Log::default();
        let mut ctx = AppContext::headless(1, 1);
        let mut stack = LayerStack::new();
        stack.push_overlay(Probe::boxed("O", &log, false), &mut ctx);
        stack.push_layer(Probe::boxed("L1", &log, false), &mut ctx);
        stack.push_layer(Probe::boxed("L2", &log, false), &mut ctx);
        drain(&log);

        stack.clear(&mut ctx);
        assert_eq!(
            drain(&log),
            ["detach L2", "detach L1", "detach O"].map(String::from)
        );
        assert!(stack.is_empty());
    }
}
