//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. The map lives
//! in Rust so the browser bridge and tests resolve keys identically.

use crate::input::Modifiers;
use crate::tools::ToolKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Tool(ToolKind),
    Undo,
    Redo,
    /// Delete the selected shape.
    Delete,
    BringToFront,
    SendToBack,
    /// Commit or discard the in-progress bezier/polyline.
    FinishPath,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.command();

        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "]" => Some(ShortcutAction::BringToFront),
                "[" => Some(ShortcutAction::SendToBack),
                _ => None,
            };
        }

        if modifiers.alt {
            return None;
        }

        let tool = |kind| Some(ShortcutAction::Tool(kind));
        match key {
            "v" | "V" => tool(ToolKind::Select),
            "r" | "R" => tool(ToolKind::Rectangle),
            "c" | "C" => tool(ToolKind::Circle),
            "e" | "E" => tool(ToolKind::Ellipse),
            "l" | "L" => tool(ToolKind::Line),
            "b" | "B" => tool(ToolKind::Bezier),
            "p" | "P" => tool(ToolKind::Polyline),
            "i" | "I" => tool(ToolKind::Image),
            "x" | "X" => tool(ToolKind::Delete),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Enter" | "Escape" => Some(ShortcutAction::FinishPath),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const META: Modifiers = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };
    const META_SHIFT: Modifiers = Modifiers {
        meta: true,
        shift: true,
        ..Modifiers::NONE
    };

    #[test]
    fn resolve_tool_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("v", Modifiers::NONE),
            Some(ShortcutAction::Tool(ToolKind::Select))
        );
        assert_eq!(
            ShortcutMap::resolve("B", Modifiers::NONE),
            Some(ShortcutAction::Tool(ToolKind::Bezier))
        );
        assert_eq!(
            ShortcutMap::resolve("x", Modifiers::NONE),
            Some(ShortcutAction::Tool(ToolKind::Delete))
        );
    }

    #[test]
    fn resolve_undo_redo() {
        assert_eq!(ShortcutMap::resolve("z", META), Some(ShortcutAction::Undo));
        assert_eq!(
            ShortcutMap::resolve("z", Modifiers::CTRL),
            Some(ShortcutAction::Undo)
        );
        assert_eq!(ShortcutMap::resolve("z", META_SHIFT), Some(ShortcutAction::Redo));
        assert_eq!(
            ShortcutMap::resolve("y", Modifiers::CTRL),
            Some(ShortcutAction::Redo)
        );
    }

    #[test]
    fn resolve_z_order() {
        assert_eq!(
            ShortcutMap::resolve("]", META),
            Some(ShortcutAction::BringToFront)
        );
        assert_eq!(ShortcutMap::resolve("[", META), Some(ShortcutAction::SendToBack));
    }

    #[test]
    fn resolve_finish_and_delete() {
        assert_eq!(
            ShortcutMap::resolve("Enter", Modifiers::NONE),
            Some(ShortcutAction::FinishPath)
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", Modifiers::NONE),
            Some(ShortcutAction::FinishPath)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", Modifiers::NONE),
            Some(ShortcutAction::Delete)
        );
    }

    #[test]
    fn modifier_precedence() {
        // Ctrl+V is not the select tool.
        assert_eq!(ShortcutMap::resolve("v", Modifiers::CTRL), None);
        assert_eq!(ShortcutMap::resolve("q", Modifiers::NONE), None);
    }
}
