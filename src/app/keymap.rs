//! Keybinding configuration: parse `keybinds.conf`, provide defaults, and map keys to actions.
//!
//! Only normal-mode keys go through the keymap. Search editing and the
//! detail dialog use fixed keys (typing, Enter, Esc, Tab).

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::model::{ROLES, Role};

/// Semantic keyboard actions that can be bound to key combinations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Exit the application.
    Quit,
    /// Focus the search box and start editing it.
    StartSearch,
    /// Move focus to the next stop (search, role chips, results).
    FocusNext,
    /// Move focus to the previous stop.
    FocusPrev,
    /// Activate the focused control: toggle a chip, open a user's details.
    Activate,
    /// Select the previous card.
    MoveUp,
    /// Select the next card.
    MoveDown,
    /// Jump one page of cards up.
    PageUp,
    /// Jump one page of cards down.
    PageDown,
    /// Fetch the directory again.
    Refetch,
    /// Drop every active role filter.
    ClearFilters,
    /// Add or remove one role from the filters.
    ToggleRole(Role),
    /// Make the bundled source fail (or succeed again).
    ToggleErrorSimulation,
    /// Swallow the key without doing anything.
    Ignore,
}

/// Normal-mode key bindings.
///
/// Several keys may map to the same action; a key maps to at most one.
#[derive(Clone, Debug)]
pub struct Keymap {
    /// Modifier and key code to the action it triggers.
    bindings: HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

impl Keymap {
    /// Built-in bindings: vim-style movement, digits 1-6 for the role chips
    /// in display order, `/` to search, `q` to quit.
    pub fn new_defaults() -> Self {
        use KeyCode::*;
        use KeyModifiers as M;
        let mut bindings = HashMap::new();
        bindings.insert((M::NONE, Char('q')), KeyAction::Quit);
        bindings.insert((M::CONTROL, Char('c')), KeyAction::Quit);
        bindings.insert((M::NONE, Esc), KeyAction::Ignore);
        bindings.insert((M::NONE, Char('/')), KeyAction::StartSearch);
        bindings.insert((M::NONE, Tab), KeyAction::FocusNext);
        // Shift+Tab arrives as BackTab, sometimes with SHIFT set
        bindings.insert((M::NONE, BackTab), KeyAction::FocusPrev);
        bindings.insert((M::SHIFT, BackTab), KeyAction::FocusPrev);
        bindings.insert((M::SHIFT, Tab), KeyAction::FocusPrev);
        bindings.insert((M::NONE, Enter), KeyAction::Activate);
        bindings.insert((M::NONE, Char(' ')), KeyAction::Activate);
        bindings.insert((M::NONE, Up), KeyAction::MoveUp);
        bindings.insert((M::NONE, Down), KeyAction::MoveDown);
        bindings.insert((M::NONE, Char('k')), KeyAction::MoveUp);
        bindings.insert((M::NONE, Char('j')), KeyAction::MoveDown);
        bindings.insert((M::NONE, PageUp), KeyAction::PageUp);
        bindings.insert((M::NONE, PageDown), KeyAction::PageDown);
        bindings.insert((M::NONE, Char('r')), KeyAction::Refetch);
        bindings.insert((M::NONE, Char('c')), KeyAction::ClearFilters);
        bindings.insert((M::NONE, Char('e')), KeyAction::ToggleErrorSimulation);
        for (i, role) in ROLES.into_iter().enumerate() {
            let digit = char::from(b'1' + i as u8);
            bindings.insert((M::NONE, Char(digit)), KeyAction::ToggleRole(role));
        }
        Self { bindings }
    }

    /// Load `path`; fall back to the config directory copy, else write defaults to `path`.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        if let Some(existing) = super::config_file_read_path("keybinds.conf") {
            return Self::from_file(&existing).unwrap_or_default();
        }
        let km = Self::default();
        if let Err(e) = km.write_file(path) {
            tracing::debug!(path, error = %e, "could not write default keybinds");
        }
        km
    }

    /// Read and parse `path`; `None` when it cannot be read.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Start from defaults and override with `Action = KeySpec` lines.
    pub fn parse(contents: &str) -> Self {
        let mut map = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((lhs, rhs)) = line.split_once('=') else {
                continue;
            };
            match (parse_action(lhs), parse_key(rhs)) {
                (Some(action), Some(key)) => {
                    map.bindings.insert(key, action);
                }
                _ => tracing::debug!(line, "ignoring unparseable keybinding"),
            }
        }
        map
    }

    /// Write every binding as `Action = KeySpec`, sorted by action name.
    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# user-directory keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+q, Enter, Esc, Tab, BackTab, Up, Down, PageUp, PageDown, Space, /, 1\n\n");

        let mut entries: Vec<(String, String)> = self
            .bindings
            .iter()
            .map(|((mods, code), action)| (format_action(*action), Self::format_key(*mods, *code)))
            .collect();
        entries.sort();
        for (action, key) in entries {
            let _ = writeln!(&mut buf, "{action} = {key}");
        }
        std::fs::write(path, buf)
    }

    /// Action bound to `key` with its exact modifiers, if any.
    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings.get(&(key.modifiers, key.code)).copied()
    }

    /// Keys bound to `action`, formatted for display and sorted.
    pub fn keys_for(&self, action: KeyAction) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|((m, c), _)| Self::format_key(*m, *c))
            .collect();
        keys.sort();
        keys
    }

    /// Human-readable spec like "Ctrl+q" or "BackTab".
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        use KeyCode::*;
        let base = match code {
            Enter => "Enter".to_string(),
            Delete => "Delete".to_string(),
            Esc => "Esc".to_string(),
            Tab => "Tab".to_string(),
            BackTab => "BackTab".to_string(),
            Up => "Up".to_string(),
            Down => "Down".to_string(),
            Left => "Left".to_string(),
            Right => "Right".to_string(),
            PageUp => "PageUp".to_string(),
            PageDown => "PageDown".to_string(),
            Char(' ') => "Space".to_string(),
            Char(c) => c.to_string(),
            _ => format!("{code:?}"),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{base}")
        } else if mods.contains(KeyModifiers::SHIFT) {
            format!("Shift+{base}")
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

/// Parse a KeySpec such as `q`, `Ctrl+r`, `Shift+Tab` or `PageDown`.
fn parse_key(spec: &str) -> Option<(KeyModifiers, KeyCode)> {
    use KeyCode::*;
    let s = spec.trim();
    let (mods, rest) = if let Some(after) = s.strip_prefix("Ctrl+") {
        (KeyModifiers::CONTROL, after)
    } else if let Some(after) = s.strip_prefix("Shift+") {
        (KeyModifiers::SHIFT, after)
    } else {
        (KeyModifiers::NONE, s)
    };
    let code = match rest {
        "Enter" => Enter,
        "Delete" => Delete,
        "Esc" | "Escape" => Esc,
        "Tab" => Tab,
        "BackTab" => BackTab,
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        "Space" => Char(' '),
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Char(c),
                _ => return None,
            }
        }
    };
    Some((mods, code))
}

/// Parse an action name; `Toggle<Role>` (e.g. `ToggleAdmin`) selects a role chip.
fn parse_action(s: &str) -> Option<KeyAction> {
    let s = s.trim();
    if let Some(role) = s.strip_prefix("Toggle").and_then(|r| r.parse::<Role>().ok()) {
        return Some(KeyAction::ToggleRole(role));
    }
    match s {
        "Quit" => Some(KeyAction::Quit),
        "StartSearch" => Some(KeyAction::StartSearch),
        "FocusNext" => Some(KeyAction::FocusNext),
        "FocusPrev" => Some(KeyAction::FocusPrev),
        "Activate" => Some(KeyAction::Activate),
        "MoveUp" => Some(KeyAction::MoveUp),
        "MoveDown" => Some(KeyAction::MoveDown),
        "PageUp" => Some(KeyAction::PageUp),
        "PageDown" => Some(KeyAction::PageDown),
        "Refetch" => Some(KeyAction::Refetch),
        "ClearFilters" => Some(KeyAction::ClearFilters),
        "ToggleErrorSimulation" => Some(KeyAction::ToggleErrorSimulation),
        "Ignore" => Some(KeyAction::Ignore),
        _ => None,
    }
}

/// Config-file name of an action, the inverse of `parse_action`.
pub fn format_action(a: KeyAction) -> String {
    match a {
        KeyAction::Quit => "Quit".to_string(),
        KeyAction::StartSearch => "StartSearch".to_string(),
        KeyAction::FocusNext => "FocusNext".to_string(),
        KeyAction::FocusPrev => "FocusPrev".to_string(),
        KeyAction::Activate => "Activate".to_string(),
        KeyAction::MoveUp => "MoveUp".to_string(),
        KeyAction::MoveDown => "MoveDown".to_string(),
        KeyAction::PageUp => "PageUp".to_string(),
        KeyAction::PageDown => "PageDown".to_string(),
        KeyAction::Refetch => "Refetch".to_string(),
        KeyAction::ClearFilters => "ClearFilters".to_string(),
        KeyAction::ToggleRole(role) => format!("Toggle{}", role.label()),
        KeyAction::ToggleErrorSimulation => "ToggleErrorSimulation".to_string(),
        KeyAction::Ignore => "Ignore".to_string(),
    }
}
