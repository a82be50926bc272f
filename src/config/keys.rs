//! Keybinding configuration types and parsing
//!
//! This module provides types for representing keyboard shortcuts and
//! parsing vim-style key notation (e.g., "C-x", "M-S-w", "<C-Tab>").

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::{Action, InputMode};

/// A key combination (key code + modifiers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyCombo {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Create a KeyCombo from a crossterm KeyEvent
    ///
    /// Normalizes the event to the canonical form used by config parsing:
    /// - uppercase characters become lowercase + SHIFT, so "G" matches Shift+g
    /// - BackTab becomes Tab + SHIFT, so "C-S-<Tab>" matches Ctrl+Shift+Tab
    pub fn from_key_event(event: &KeyEvent) -> Self {
        match event.code {
            KeyCode::Char(c) if c.is_ascii_uppercase() => Self {
                code: KeyCode::Char(c.to_ascii_lowercase()),
                modifiers: event.modifiers | KeyModifiers::SHIFT,
            },
            KeyCode::BackTab => Self {
                code: KeyCode::Tab,
                modifiers: event.modifiers | KeyModifiers::SHIFT,
            },
            _ => Self {
                code: event.code,
                modifiers: event.modifiers,
            },
        }
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, prefix) in [
            (KeyModifiers::CONTROL, "C-"),
            (KeyModifiers::ALT, "M-"),
            (KeyModifiers::SHIFT, "S-"),
        ] {
            if self.modifiers.contains(flag) {
                f.write_str(prefix)?;
            }
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("<Space>"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::F(n) => write!(f, "<F{n}>"),
            code => match NAMED_KEYS.iter().find(|(_, k)| *k == code) {
                Some((name, _)) => write!(f, "<{name}>"),
                None => write!(f, "{code:?}"),
            },
        }
    }
}

/// Bracketed key names; the first spelling of each key is canonical
const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("CR", KeyCode::Enter),
    ("Enter", KeyCode::Enter),
    ("Return", KeyCode::Enter),
    ("Esc", KeyCode::Esc),
    ("Escape", KeyCode::Esc),
    ("Tab", KeyCode::Tab),
    ("BS", KeyCode::Backspace),
    ("Backspace", KeyCode::Backspace),
    ("Del", KeyCode::Delete),
    ("Delete", KeyCode::Delete),
    ("Up", KeyCode::Up),
    ("Down", KeyCode::Down),
    ("Left", KeyCode::Left),
    ("Right", KeyCode::Right),
    ("Home", KeyCode::Home),
    ("End", KeyCode::End),
    ("Space", KeyCode::Char(' ')),
];

fn named_key(name: &str) -> Option<KeyCode> {
    NAMED_KEYS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, code)| *code)
}

/// Context for keybindings (logical grouping of input modes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyContext {
    /// Keys that work everywhere unless a context overrides them
    Global,
    /// Workspace and session lists
    List,
    /// Typing a list filter
    Search,
    /// Typing a new session name
    Rename,
    /// Blocking confirmation dialog
    Dialog,
    /// Quick-switch overlay
    QuickSwitch,
}

impl KeyContext {
    /// Config section name under `[keys]`
    pub fn section(&self) -> &'static str {
        match self {
            KeyContext::Global => "global",
            KeyContext::List => "list",
            KeyContext::Search => "search",
            KeyContext::Rename => "rename",
            KeyContext::Dialog => "dialog",
            KeyContext::QuickSwitch => "quick_switch",
        }
    }

    pub fn from_input_mode(mode: InputMode) -> Self {
        match mode {
            InputMode::Normal => KeyContext::List,
            InputMode::Searching => KeyContext::Search,
            InputMode::Renaming => KeyContext::Rename,
            InputMode::Confirming => KeyContext::Dialog,
            InputMode::QuickSwitching => KeyContext::QuickSwitch,
        }
    }

    /// Whether global bindings apply underneath this context
    ///
    /// Text entry contexts only see their own bindings so typed characters
    /// never trigger list actions. The quick-switch overlay only sees its own
    /// bindings plus the chords themselves, see
    /// [`KeybindingConfig::sync_quick_switch_context`].
    pub fn inherits_global(&self) -> bool {
        !matches!(
            self,
            KeyContext::Search | KeyContext::Rename | KeyContext::QuickSwitch
        )
    }
}

/// Configuration for all keybindings
#[derive(Debug, Clone, Default)]
pub struct KeybindingConfig {
    /// Global keybindings (apply to all contexts unless overridden)
    pub global: HashMap<KeyCombo, Action>,
    /// Context-specific keybindings
    pub context: HashMap<KeyContext, HashMap<KeyCombo, Action>>,
}

impl KeybindingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an action for a key combo in a given context
    /// First checks context-specific bindings, then falls back to global
    pub fn get_action(&self, key: &KeyCombo, context: KeyContext) -> Option<Action> {
        if let Some(action) = self.context.get(&context).and_then(|b| b.get(key)) {
            return Some(*action);
        }
        if context.inherits_global() {
            return self.global.get(key).copied();
        }
        None
    }

    /// First key bound to `action` in `context` (or globally), for hints
    pub fn key_for(&self, action: Action, context: KeyContext) -> Option<KeyCombo> {
        let find = |map: &HashMap<KeyCombo, Action>| {
            let mut keys: Vec<KeyCombo> = map
                .iter()
                .filter(|(_, a)| **a == action)
                .map(|(k, _)| *k)
                .collect();
            // Stable pick regardless of hash order
            keys.sort_by_key(|k| k.to_string());
            keys.into_iter().next()
        };
        self.context
            .get(&context)
            .and_then(find)
            .or_else(|| find(&self.global))
    }

    /// Mirror the global quick-switch chords into the overlay context
    ///
    /// Call after every merge so rebinding a chord globally also rebinds it
    /// while the overlay is open.
    pub fn sync_quick_switch_context(&mut self) {
        let overlay = self.context.entry(KeyContext::QuickSwitch).or_default();
        overlay.retain(|_, action| !action.is_quick_switch());
        for (key, action) in &self.global {
            if action.is_quick_switch() {
                overlay.insert(*key, *action);
            }
        }
    }

    /// Merge user configuration on top of defaults
    pub fn merge(&mut self, other: KeybindingConfig) {
        for (key, action) in other.global {
            self.global.insert(key, action);
        }

        for (ctx, bindings) in other.context {
            let entry = self.context.entry(ctx).or_default();
            for (key, action) in bindings {
                entry.insert(key, action);
            }
        }
    }
}

/// Parse a vim-style key notation string into a KeyCombo
///
/// Supported notation:
/// - `C-x` for Ctrl+x
/// - `M-x` for Alt+x (Meta)
/// - `S-x` for Shift+x
/// - `C-S-x` for Ctrl+Shift+x
/// - `<CR>`, `<Esc>`, `<Tab>`, `<BS>`, `<Del>`, `<Space>`
/// - `<Up>`, `<Down>`, `<Left>`, `<Right>`, `<Home>`, `<End>`
/// - `<F1>` through `<F12>`
/// - modifiers inside or outside brackets: `<C-Tab>` and `C-<Tab>` are the same key
pub fn parse_key_notation(s: &str) -> Result<KeyCombo, KeyParseError> {
    let s = s.trim();

    if s.is_empty() {
        return Err(KeyParseError::Empty);
    }

    if s.starts_with('<') && s.ends_with('>') {
        return parse_special_key(s);
    }

    // "C-<Tab>": modifiers outside, special key inside brackets
    if let Some(open) = s.find('<') {
        let (prefix, special) = s.split_at(open);
        let prefix = prefix.trim_end_matches('-');
        let mut combo = parse_special_key(special)?;
        for part in prefix.split('-').filter(|p| !p.is_empty()) {
            combo.modifiers |= parse_modifier(part)?;
        }
        return Ok(combo);
    }

    // Parse modifier-key combinations like "C-x", "M-S-w"
    let parts: Vec<&str> = s.split('-').collect();

    let mut modifiers = KeyModifiers::NONE;
    let mut key_part = None;

    for (i, part) in parts.iter().enumerate() {
        let is_last = i == parts.len() - 1;
        match *part {
            "C" | "M" | "S" if !is_last => modifiers |= parse_modifier(part)?,
            // A trailing empty part means the key itself is '-' ("C--")
            "" if is_last && i > 0 => key_part = Some("-"),
            "" => {}
            _ => key_part = Some(*part),
        }
    }

    let key_str = key_part.ok_or(KeyParseError::NoKey)?;
    let (code, needs_shift) = parse_key_code(key_str)?;

    if needs_shift {
        modifiers |= KeyModifiers::SHIFT;
    }

    Ok(KeyCombo::new(code, modifiers))
}

fn parse_modifier(part: &str) -> Result<KeyModifiers, KeyParseError> {
    match part {
        "C" => Ok(KeyModifiers::CONTROL),
        "M" | "A" => Ok(KeyModifiers::ALT),
        "S" => Ok(KeyModifiers::SHIFT),
        other => Err(KeyParseError::InvalidModifier(other.to_string())),
    }
}

/// Parse a special key notation like <CR>, <Esc>, <C-Tab>
fn parse_special_key(s: &str) -> Result<KeyCombo, KeyParseError> {
    let inner = s
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
        .ok_or_else(|| KeyParseError::InvalidSpecialKey(s.to_string()))?;

    let parts: Vec<&str> = inner.split('-').collect();
    let (key_name, modifier_parts) = match parts.split_last() {
        Some((last, rest)) => (*last, rest),
        None => return Err(KeyParseError::Empty),
    };

    let mut modifiers = KeyModifiers::NONE;
    for part in modifier_parts {
        modifiers |= parse_modifier(part)?;
    }

    let code = match named_key(key_name) {
        Some(code) => code,
        None => {
            let num: u8 = key_name
                .strip_prefix(|c: char| c.eq_ignore_ascii_case(&'f'))
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| KeyParseError::InvalidSpecialKey(key_name.to_string()))?;
            if num == 0 || num > 12 {
                return Err(KeyParseError::InvalidKey(key_name.to_string()));
            }
            KeyCode::F(num)
        }
    };

    Ok(KeyCombo::new(code, modifiers))
}

/// A bare key: one character (uppercase implies Shift) or a key name
fn parse_key_code(s: &str) -> Result<(KeyCode, bool), KeyParseError> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok((KeyCode::Char(c.to_ascii_lowercase()), c.is_ascii_uppercase()));
    }
    named_key(s)
        .map(|code| (code, false))
        .ok_or_else(|| KeyParseError::InvalidKey(s.to_string()))
}

/// Error type for key parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("empty key notation")]
    Empty,
    #[error("no key specified")]
    NoKey,
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("invalid modifier: {0}")]
    InvalidModifier(String),
    #[error("invalid special key: {0}")]
    InvalidSpecialKey(String),
}

impl FromStr for KeyCombo {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_key_notation(s)
    }
}
