//! Centralized keyboard shortcuts registry.
//!
//! Single source of truth for the wizard's shortcuts, consumed by the footer
//! hints, the help dialog and the `formflow keys` listing.

use std::fmt::Write;

use crossterm::event::{KeyCode, KeyModifiers};

/// A keyboard shortcut definition
#[derive(Debug, Clone)]
pub struct Shortcut {
    /// Primary key for this shortcut
    pub key: KeyCode,
    /// Modifiers held with the primary key
    pub modifiers: KeyModifiers,
    /// Alternative key, same modifiers
    pub alt_key: Option<KeyCode>,
    pub description: &'static str,
    pub category: ShortcutCategory,
    pub context: ShortcutContext,
    /// Shown in the footer hint line
    pub in_footer: bool,
}

/// Categories for organizing shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutCategory {
    General,
    Navigation,
    Actions,
}

/// Contexts where shortcuts are active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutContext {
    /// Filling in a step
    Wizard,
    /// Resume-or-discard prompt on mount
    DraftPrompt,
    /// Unsaved-changes confirmation
    LeaveConfirm,
    /// Terminal success view
    Success,
}

impl ShortcutCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            ShortcutCategory::General => "General",
            ShortcutCategory::Navigation => "Navigation",
            ShortcutCategory::Actions => "Actions",
        }
    }

    /// All categories in display order
    pub fn all() -> &'static [ShortcutCategory] {
        &[
            ShortcutCategory::General,
            ShortcutCategory::Navigation,
            ShortcutCategory::Actions,
        ]
    }
}

impl ShortcutContext {
    pub fn display_name(&self) -> &'static str {
        match self {
            ShortcutContext::Wizard => "Wizard",
            ShortcutContext::DraftPrompt => "Draft Prompt",
            ShortcutContext::LeaveConfirm => "Leave Confirmation",
            ShortcutContext::Success => "Success",
        }
    }

    /// All contexts in display order
    pub fn all() -> &'static [ShortcutContext] {
        &[
            ShortcutContext::Wizard,
            ShortcutContext::DraftPrompt,
            ShortcutContext::LeaveConfirm,
            ShortcutContext::Success,
        ]
    }
}

impl Shortcut {
    /// Format key for display (e.g., "Ctrl+s", "Tab", "↑/↓")
    pub fn key_display(&self) -> String {
        let prefix = format_modifiers(self.modifiers);
        let primary = format_keycode(&self.key);
        match &self.alt_key {
            Some(alt) => format!("{prefix}{primary}/{prefix}{}", format_keycode(alt)),
            None => format!("{prefix}{primary}"),
        }
    }

    /// Format key for help dialog (left-padded to 12 chars)
    pub fn key_display_padded(&self) -> String {
        format!("{:<12}", self.key_display())
    }
}

fn format_modifiers(modifiers: KeyModifiers) -> String {
    let mut prefix = String::new();
    if modifiers.contains(KeyModifiers::CONTROL) {
        prefix.push_str("Ctrl+");
    }
    if modifiers.contains(KeyModifiers::ALT) {
        prefix.push_str("Alt+");
    }
    prefix
}

/// Format a KeyCode for display
fn format_keycode(key: &KeyCode) -> String {
    match key {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        _ => format!("{key:?}"),
    }
}

const NONE: KeyModifiers = KeyModifiers::NONE;
const CTRL: KeyModifiers = KeyModifiers::CONTROL;
const ALT: KeyModifiers = KeyModifiers::ALT;

/// Static registry of all keyboard shortcuts
pub static SHORTCUTS: &[Shortcut] = &[
    // === Wizard ===
    Shortcut {
        key: KeyCode::Enter,
        modifiers: NONE,
        alt_key: None,
        description: "Next step / Submit",
        category: ShortcutCategory::Actions,
        context: ShortcutContext::Wizard,
        in_footer: true,
    },
    Shortcut {
        key: KeyCode::Char('n'),
        modifiers: CTRL,
        alt_key: None,
        description: "Next step / Submit (inside multi-line fields)",
        category: ShortcutCategory::Actions,
        context: ShortcutContext::Wizard,
        in_footer: false,
    },
    Shortcut {
        key: KeyCode::Esc,
        modifiers: NONE,
        alt_key: None,
        description: "Previous step",
        category: ShortcutCategory::Navigation,
        context: ShortcutContext::Wizard,
        in_footer: true,
    },
    Shortcut {
        key: KeyCode::Tab,
        modifiers: NONE,
        alt_key: Some(KeyCode::BackTab),
        description: "Next / previous field",
        category: ShortcutCategory::Navigation,
        context: ShortcutContext::Wizard,
        in_footer: true,
    },
    Shortcut {
        key: KeyCode::Char('s'),
        modifiers: CTRL,
        alt_key: None,
        description: "Skip optional step",
        category: ShortcutCategory::Actions,
        context: ShortcutContext::Wizard,
        in_footer: true,
    },
    Shortcut {
        key: KeyCode::Char('1'),
        modifiers: ALT,
        alt_key: Some(KeyCode::Char('9')),
        description: "Jump to a visited step",
        category: ShortcutCategory::Navigation,
        context: ShortcutContext::Wizard,
        in_footer: false,
    },
    Shortcut {
        key: KeyCode::Up,
        modifiers: NONE,
        alt_key: Some(KeyCode::Down),
        description: "Change selection",
        category: ShortcutCategory::Navigation,
        context: ShortcutContext::Wizard,
        in_footer: false,
    },
    Shortcut {
        key: KeyCode::Char(' '),
        modifiers: NONE,
        alt_key: None,
        description: "Toggle yes/no",
        category: ShortcutCategory::Actions,
        context: ShortcutContext::Wizard,
        in_footer: false,
    },
    Shortcut {
        key: KeyCode::F(1),
        modifiers: NONE,
        alt_key: None,
        description: "Toggle help",
        category: ShortcutCategory::General,
        context: ShortcutContext::Wizard,
        in_footer: true,
    },
    Shortcut {
        key: KeyCode::Char('q'),
        modifiers: CTRL,
        alt_key: Some(KeyCode::Char('c')),
        description: "Quit",
        category: ShortcutCategory::General,
        context: ShortcutContext::Wizard,
        in_footer: true,
    },
    // === Draft Prompt ===
    Shortcut {
        key: KeyCode::Up,
        modifiers: NONE,
        alt_key: Some(KeyCode::Down),
        description: "Navigate",
        category: ShortcutCategory::Navigation,
        context: ShortcutContext::DraftPrompt,
        in_footer: true,
    },
    Shortcut {
        key: KeyCode::Enter,
        modifiers: NONE,
        alt_key: None,
        description: "Select",
        category: ShortcutCategory::Actions,
        context: ShortcutContext::DraftPrompt,
        in_footer: true,
    },
    Shortcut {
        key: KeyCode::Char('r'),
        modifiers: NONE,
        alt_key: None,
        description: "Resume draft",
        category: ShortcutCategory::Actions,
        context: ShortcutContext::DraftPrompt,
        in_footer: false,
    },
    Shortcut {
        key: KeyCode::Char('s'),
        modifiers: NONE,
        alt_key: None,
        description: "Start fresh",
        category: ShortcutCategory::Actions,
        context: ShortcutContext::DraftPrompt,
        in_footer: false,
    },
    // === Leave Confirm ===
    Shortcut {
        key: KeyCode::Char('y'),
        modifiers: NONE,
        alt_key: None,
        description: "Leave (draft is kept)",
        category: ShortcutCategory::Actions,
        context: ShortcutContext::LeaveConfirm,
        in_footer: true,
    },
    Shortcut {
        key: KeyCode::Char('n'),
        modifiers: NONE,
        alt_key: Some(KeyCode::Esc),
        description: "Stay",
        category: ShortcutCategory::Actions,
        context: ShortcutContext::LeaveConfirm,
        in_footer: true,
    },
    // === Success ===
    Shortcut {
        key: KeyCode::Left,
        modifiers: NONE,
        alt_key: Some(KeyCode::Right),
        description: "Choose action",
        category: ShortcutCategory::Navigation,
        context: ShortcutContext::Success,
        in_footer: true,
    },
    Shortcut {
        key: KeyCode::Enter,
        modifiers: NONE,
        alt_key: None,
        description: "Confirm",
        category: ShortcutCategory::Actions,
        context: ShortcutContext::Success,
        in_footer: true,
    },
    Shortcut {
        key: KeyCode::Char('q'),
        modifiers: NONE,
        alt_key: None,
        description: "Quit",
        category: ShortcutCategory::General,
        context: ShortcutContext::Success,
        in_footer: true,
    },
];

/// Get all shortcuts for a given context
pub fn shortcuts_for_context(context: ShortcutContext) -> impl Iterator<Item = &'static Shortcut> {
    SHORTCUTS.iter().filter(move |s| s.context == context)
}

/// Footer entries for a context, in registry order
pub fn footer_shortcuts(context: ShortcutContext) -> impl Iterator<Item = &'static Shortcut> {
    shortcuts_for_context(context).filter(|s| s.in_footer)
}

/// Get shortcuts grouped by category for a given context
pub fn shortcuts_by_category_for_context(
    context: ShortcutContext,
) -> Vec<(ShortcutCategory, Vec<&'static Shortcut>)> {
    let mut result = Vec::new();
    for category in ShortcutCategory::all() {
        let shortcuts: Vec<&Shortcut> = SHORTCUTS
            .iter()
            .filter(|s| s.context == context && s.category == *category)
            .collect();
        if !shortcuts.is_empty() {
            result.push((*category, shortcuts));
        }
    }
    result
}

/// Plain-text table of every shortcut, grouped by context then category
pub fn listing() -> String {
    let mut out = String::new();
    for context in ShortcutContext::all() {
        let _ = writeln!(out, "{}", context.display_name());
        for (category, shortcuts) in shortcuts_by_category_for_context(*context) {
            let _ = writeln!(out, "  {}", category.display_name());
            for shortcut in shortcuts {
                let _ = writeln!(
                    out,
                    "    {}{}",
                    shortcut.key_display_padded(),
                    shortcut.description
                );
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_shortcuts_have_descriptions() {
        for shortcut in SHORTCUTS {
            assert!(
                !shortcut.description.is_empty(),
                "Shortcut {:?} has empty description",
                shortcut.key
            );
        }
    }

    #[test]
    fn test_every_context_has_shortcuts() {
        for context in ShortcutContext::all() {
            assert!(
                shortcuts_for_context(*context).next().is_some(),
                "{} has no shortcuts",
                context.display_name()
            );
        }
    }

    #[test]
    fn test_key_display_with_modifier_and_alt() {
        let shortcut = Shortcut {
            key: KeyCode::Char('q'),
            modifiers: CTRL,
            alt_key: Some(KeyCode::Char('c')),
            description: "Quit",
            category: ShortcutCategory::General,
            context: ShortcutContext::Wizard,
            in_footer: true,
        };
        assert_eq!(shortcut.key_display(), "Ctrl+q/Ctrl+c");
    }

    #[test]
    fn test_key_display_special_keys() {
        assert_eq!(format_keycode(&KeyCode::Enter), "Enter");
        assert_eq!(format_keycode(&KeyCode::BackTab), "Shift+Tab");
        assert_eq!(format_keycode(&KeyCode::Char(' ')), "Space");
        assert_eq!(format_keycode(&KeyCode::F(1)), "F1");
    }

    #[test]
    fn test_footer_is_subset_of_context() {
        let footer: Vec<_> = footer_shortcuts(ShortcutContext::Wizard).collect();
        assert!(!footer.is_empty());
        assert!(footer.iter().all(|s| s.context == ShortcutContext::Wizard));
        assert!(footer.len() < shortcuts_for_context(ShortcutContext::Wizard).count());
    }

    #[test]
    fn test_shortcuts_by_category_for_wizard() {
        let grouped = shortcuts_by_category_for_context(ShortcutContext::Wizard);
        let categories: Vec<_> = grouped.iter().map(|(cat, _)| *cat).collect();
        assert_eq!(
            categories,
            vec![
                ShortcutCategory::General,
                ShortcutCategory::Navigation,
                ShortcutCategory::Actions
            ]
        );
    }

    #[test]
    fn test_listing_covers_every_context_and_shortcut() {
        let listing = listing();

        for context in ShortcutContext::all() {
            assert!(
                listing.lines().any(|l| l == context.display_name()),
                "missing context {}",
                context.display_name()
            );
        }
        for shortcut in SHORTCUTS {
            assert!(listing.contains(shortcut.description));
        }
        assert!(listing.contains("  Navigation"));
    }
}
