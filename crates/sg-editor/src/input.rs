//! Input abstraction layer.
//!
//! Normalizes pointer and keyboard events into a single `InputEvent` enum
//! consumed by tools. Coordinates are canvas coordinates.

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    /// Ctrl on Windows/Linux, ⌘ on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64, modifiers: Modifiers },
    PointerMove { x: f64, y: f64, modifiers: Modifiers },
    PointerUp { x: f64, y: f64, modifiers: Modifiers },
    /// `key` is the `KeyboardEvent.key` value (`"z"`, `"Enter"`, ...).
    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::PointerUp {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: impl Into<String>) -> Self {
        Self::Key {
            key: key.into(),
            modifiers: Modifiers::NONE,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. } => Some((*x, *y)),
            Self::Key { .. } => None,
        }
    }
}
