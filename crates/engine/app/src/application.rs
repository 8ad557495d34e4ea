//! The root application object

use battery_system::{Event, EventFlow};

use crate::context::AppContext;

/// Root handler of a Battery application
///
/// The engine calls the application before the layers for update and
/// render, and after them for events. Every hook has a default, so an
/// application only implements what it needs.
pub trait Application {
    /// Called once the window and renderer exist, before the first frame
    ///
    /// Typical work: push the initial layers, set the background colour.
    /// An error stops the application before the loop starts.
    fn on_startup(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_render(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Receives events no layer handled
    fn on_event(&mut self, _ctx: &mut AppContext, _event: &Event) -> EventFlow {
        EventFlow::Passed
    }

    fn on_ui(&mut self, _ctx: &mut AppContext, _ui: &egui::Context) {}

    /// Called once before the layers are cleared and the window destroyed
    fn on_shutdown(&mut self, _ctx: &mut AppContext) -> anyhow::Result<()> {
        Ok(())
    }
}
