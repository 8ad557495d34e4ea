//! Battery platform services
//!
//! Everything the application loop needs from the platform that is not the
//! window itself: the event taxonomy and its translation from native window
//! events, polled input state, frame timing and pacing, the settings
//! directory, the persisted version file and update check, native dialogs,
//! the clipboard and logging setup.

pub mod clipboard;
pub mod error;
pub mod event;
pub mod input;
pub mod logging;
pub mod path;
pub mod platform;
pub mod timer;
pub mod updater;
pub mod version;
pub mod window;

pub use clipboard::{Clipboard, PackedImage, PackedPixelFormat};
pub use error::{FrameworkError, FrameworkResult};
pub use event::{Event, EventFlow, EventPair, EventTranslator, EventType, Modifiers, MouseButton};
pub use input::InputState;
pub use path::AppPaths;
pub use platform::{FileFilter, MessageChoice, MessageKind};
pub use timer::{parse_timestamp, sleep_micros, FramePacer, FrameTimer, DEFAULT_FRAMERATE};
pub use updater::{check_for_github_update, ReleaseInfo, UpdateChecker};
pub use version::VersionFile;
pub use window::{WindowCommand, WindowConfig, WindowState};

// Re-export for consumers that match on key codes
pub use winit::keyboard::KeyCode;
