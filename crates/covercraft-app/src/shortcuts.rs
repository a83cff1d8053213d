//! Keyboard shortcut registry and documentation.

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Z", true, false, "Undo"),
            Shortcut::new("Z", true, true, "Redo"),
            Shortcut::new("Y", true, false, "Redo"),
            Shortcut::new("E", true, false, "Export cover as PNG"),
            Shortcut::new("T", false, false, "Add text layer"),
            Shortcut::new("Delete", false, false, "Delete selected layer"),
            Shortcut::new("Backspace", false, false, "Delete selected layer"),
            Shortcut::new("Escape", false, false, "Deselect / cancel text edit"),
            Shortcut::new("Enter", false, false, "Commit text edit"),
            Shortcut::new(
                "Shift+Drag",
                false,
                false,
                "Uniform scale while resizing",
            ),
            Shortcut::new(
                "Shift+Rotate",
                false,
                false,
                "Snap rotation to 15 degree steps",
            ),
            Shortcut::new("Double-click", false, false, "Edit layer text"),
        ]
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_with_modifiers() {
        let shortcut = Shortcut::new("Z", true, true, "Redo");
        assert_eq!(shortcut.format(), "Ctrl+Shift+Z");
        let plain = Shortcut::new("T", false, false, "Add text layer");
        assert_eq!(plain.format(), "T");
    }

    #[test]
    fn test_registry_covers_history_keys() {
        let all = ShortcutRegistry::all();
        assert!(all.iter().any(|s| s.key == "Z" && s.ctrl && !s.shift));
        assert!(all.iter().any(|s| s.key == "Y" && s.ctrl));
        assert!(all.iter().any(|s| s.key == "Delete"));
    }
}
