//! Event taxonomy
//!
//! Native window events are translated into [`Event`] values by an
//! [`EventTranslator`]. One native event produces zero, one or two events
//! (see [`EventPair`]): modifier changes only update the translator, while a
//! key press that also carries text yields a `KeyPressed` followed by a
//! `TextInput`.
//!
//! Handlers report whether they consumed an event with [`EventFlow`]; the
//! dispatcher stops at the first `Handled`.

use std::fmt;

use glam::{IVec2, UVec2, Vec2};
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

/// Pixels per wheel "line" when a device reports pixel deltas.
const PIXELS_PER_SCROLL_LINE: f32 = 10.0;

/// Result of offering an event to a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFlow {
    /// Event was consumed, stop propagation
    Handled,
    /// Event was not consumed, keep propagating
    #[default]
    Passed,
}

impl EventFlow {
    #[inline]
    pub fn is_handled(self) -> bool {
        matches!(self, Self::Handled)
    }

    /// `Handled` when `handled` is true
    #[inline]
    pub fn from_handled(handled: bool) -> Self {
        if handled {
            Self::Handled
        } else {
            Self::Passed
        }
    }
}

/// Keyboard modifier flags held when an event was produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub logo: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        logo: false,
    };

    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.logo
    }
}

impl From<ModifiersState> for Modifiers {
    fn from(state: ModifiersState) -> Self {
        Self {
            shift: state.shift_key(),
            ctrl: state.control_key(),
            alt: state.alt_key(),
            logo: state.super_key(),
        }
    }
}

/// Mouse button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

impl MouseButton {
    /// Numeric button id (1 = left, 2 = right, 3 = middle)
    pub fn id(&self) -> u32 {
        match self {
            Self::Left => 1,
            Self::Right => 2,
            Self::Middle => 3,
            Self::Back => 4,
            Self::Forward => 5,
            Self::Other(n) => 6 + *n as u32,
        }
    }
}

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        use winit::event::MouseButton as W;
        match button {
            W::Left => Self::Left,
            W::Right => Self::Right,
            W::Middle => Self::Middle,
            W::Back => Self::Back,
            W::Forward => Self::Forward,
            W::Other(n) => Self::Other(n),
        }
    }
}

/// Framework event
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Native event without a framework counterpart
    None,
    WindowClose,
    WindowResize {
        size: UVec2,
        position: IVec2,
    },
    WindowMoved {
        position: IVec2,
    },
    WindowFocus,
    WindowLostFocus,
    KeyPressed {
        key: KeyCode,
        modifiers: Modifiers,
        repeat: bool,
    },
    KeyReleased {
        key: KeyCode,
        modifiers: Modifiers,
    },
    TextInput {
        codepoint: char,
        modifiers: Modifiers,
    },
    MouseMoved {
        position: Vec2,
        delta: Vec2,
    },
    MouseButtonPressed {
        button: MouseButton,
        position: Vec2,
        modifiers: Modifiers,
    },
    MouseButtonReleased {
        button: MouseButton,
        position: Vec2,
        modifiers: Modifiers,
    },
    MouseScrolled {
        position: Vec2,
        delta: Vec2,
    },
}

/// Payload-free discriminant of [`Event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    None,
    WindowClose,
    WindowResize,
    WindowMoved,
    WindowFocus,
    WindowLostFocus,
    KeyPressed,
    KeyReleased,
    TextInput,
    MouseMoved,
    MouseButtonPressed,
    MouseButtonReleased,
    MouseScrolled,
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::None => EventType::None,
            Self::WindowClose => EventType::WindowClose,
            Self::WindowResize { .. } => EventType::WindowResize,
            Self::WindowMoved { .. } => EventType::WindowMoved,
            Self::WindowFocus => EventType::WindowFocus,
            Self::WindowLostFocus => EventType::WindowLostFocus,
            Self::KeyPressed { .. } => EventType::KeyPressed,
            Self::KeyReleased { .. } => EventType::KeyReleased,
            Self::TextInput { .. } => EventType::TextInput,
            Self::MouseMoved { .. } => EventType::MouseMoved,
            Self::MouseButtonPressed { .. } => EventType::MouseButtonPressed,
            Self::MouseButtonReleased { .. } => EventType::MouseButtonReleased,
            Self::MouseScrolled { .. } => EventType::MouseScrolled,
        }
    }

    pub fn is_keyboard(&self) -> bool {
        matches!(
            self,
            Self::KeyPressed { .. } | Self::KeyReleased { .. } | Self::TextInput { .. }
        )
    }

    pub fn is_mouse(&self) -> bool {
        matches!(
            self,
            Self::MouseMoved { .. }
                | Self::MouseButtonPressed { .. }
                | Self::MouseButtonReleased { .. }
                | Self::MouseScrolled { .. }
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:", self.event_type())?;
        match self {
            Self::None | Self::WindowClose | Self::WindowFocus | Self::WindowLostFocus => Ok(()),
            Self::WindowResize { size, position } => write!(
                f,
                " width={} height={} position=({}, {})",
                size.x, size.y, position.x, position.y
            ),
            Self::WindowMoved { position } => {
                write!(f, " position=({}, {})", position.x, position.y)
            }
            Self::KeyPressed { key, repeat, .. } => write!(f, " key={key:?} repeat={repeat}"),
            Self::KeyReleased { key, .. } => write!(f, " key={key:?}"),
            Self::TextInput { codepoint, .. } => {
                write!(f, " codepoint=U+{:04X}", *codepoint as u32)
            }
            Self::MouseMoved { position, delta } | Self::MouseScrolled { position, delta } => {
                write!(
                    f,
                    " x={} y={} dx={} dy={}",
                    position.x, position.y, delta.x, delta.y
                )
            }
            Self::MouseButtonPressed {
                button, position, ..
            }
            | Self::MouseButtonReleased {
                button, position, ..
            } => write!(
                f,
                " x={} y={} button={}",
                position.x,
                position.y,
                button.id()
            ),
        }
    }
}

/// Zero, one or two events produced from one native event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPair {
    primary: Option<Event>,
    secondary: Option<Event>,
}

impl EventPair {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn one(event: Event) -> Self {
        Self {
            primary: Some(event),
            secondary: None,
        }
    }

    pub fn two(primary: Event, secondary: Event) -> Self {
        Self {
            primary: Some(primary),
            secondary: Some(secondary),
        }
    }

    pub fn primary(&self) -> Option<&Event> {
        self.primary.as_ref()
    }

    pub fn secondary(&self) -> Option<&Event> {
        self.secondary.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none()
    }

    pub fn len(&self) -> usize {
        self.primary.is_some() as usize + self.secondary.is_some() as usize
    }
}

impl IntoIterator for EventPair {
    type Item = Event;
    type IntoIter = std::iter::Flatten<std::array::IntoIter<Option<Event>, 2>>;

    fn into_iter(self) -> Self::IntoIter {
        [self.primary, self.secondary].into_iter().flatten()
    }
}

/// Stateful translator from native window events
///
/// Tracks the cursor position (mouse button and wheel events carry none
/// natively) and the current modifier set.
#[derive(Debug, Clone, Default)]
pub struct EventTranslator {
    cursor: Option<Vec2>,
    modifiers: Modifiers,
    window_position: IVec2,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translator for a window currently at `position`
    ///
    /// Resize events carry this position until the window is moved.
    pub fn with_position(position: IVec2) -> Self {
        Self {
            window_position: position,
            ..Self::default()
        }
    }

    /// Last known cursor position inside the window
    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Translate one native window event
    pub fn translate(&mut self, event: &WindowEvent) -> EventPair {
        match event {
            WindowEvent::CloseRequested => EventPair::one(Event::WindowClose),
            WindowEvent::Resized(size) => EventPair::one(Event::WindowResize {
                size: UVec2::new(size.width, size.height),
                position: self.window_position,
            }),
            WindowEvent::Moved(position) => {
                self.window_position = IVec2::new(position.x, position.y);
                EventPair::one(Event::WindowMoved {
                    position: self.window_position,
                })
            }
            WindowEvent::Focused(true) => EventPair::one(Event::WindowFocus),
            WindowEvent::Focused(false) => EventPair::one(Event::WindowLostFocus),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state().into();
                EventPair::empty()
            }
            WindowEvent::KeyboardInput { event, .. } => self.translate_key(
                event.physical_key,
                event.state,
                event.repeat,
                event.text.as_deref(),
            ),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(Vec2::new(position.x as f32, position.y as f32))
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                EventPair::empty()
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_button(*state, (*button).into())
            }
            WindowEvent::MouseWheel { delta, .. } => self.scroll(*delta),
            _ => EventPair::empty(),
        }
    }

    /// Translate a keyboard event from its parts
    ///
    /// Keys without a physical key code are dropped. Text is forwarded as a
    /// secondary `TextInput` carrying the first non-control codepoint.
    pub fn translate_key(
        &mut self,
        key: PhysicalKey,
        state: ElementState,
        repeat: bool,
        text: Option<&str>,
    ) -> EventPair {
        let PhysicalKey::Code(key) = key else {
            return EventPair::empty();
        };
        let modifiers = self.modifiers;

        match state {
            ElementState::Pressed => {
                let pressed = Event::KeyPressed {
                    key,
                    modifiers,
                    repeat,
                };
                match text.and_then(|t| t.chars().find(|c| !c.is_control())) {
                    Some(codepoint) => EventPair::two(
                        pressed,
                        Event::TextInput {
                            codepoint,
                            modifiers,
                        },
                    ),
                    None => EventPair::one(pressed),
                }
            }
            ElementState::Released => EventPair::one(Event::KeyReleased { key, modifiers }),
        }
    }

    /// Cursor moved to `position`; the delta is zero for the first sample
    pub fn cursor_moved(&mut self, position: Vec2) -> EventPair {
        let delta = self.cursor.map(|last| position - last).unwrap_or(Vec2::ZERO);
        self.cursor = Some(position);
        EventPair::one(Event::MouseMoved { position, delta })
    }

    pub fn mouse_button(&mut self, state: ElementState, button: MouseButton) -> EventPair {
        let position = self.cursor.unwrap_or(Vec2::ZERO);
        let modifiers = self.modifiers;
        EventPair::one(match state {
            ElementState::Pressed => Event::MouseButtonPressed {
                button,
                position,
                modifiers,
            },
            ElementState::Released => Event::MouseButtonReleased {
                button,
                position,
                modifiers,
            },
        })
    }

    /// Wheel movement; zero deltas produce no event
    pub fn scroll(&mut self, delta: MouseScrollDelta) -> EventPair {
        let delta = match delta {
            MouseScrollDelta::LineDelta(x, y) => Vec2::new(x, y),
            MouseScrollDelta::PixelDelta(pos) => {
                Vec2::new(pos.x as f32, pos.y as f32) / PIXELS_PER_SCROLL_LINE
            }
        };
        if delta == Vec2::ZERO {
            return EventPair::empty();
        }
        EventPair::one(Event::MouseScrolled {
            position: self.cursor.unwrap_or(Vec2::ZERO),
            delta,
        })
    }
}
