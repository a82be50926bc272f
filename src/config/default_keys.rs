//! Default keybindings
//!
//! This module defines the default keybindings that are used
//! when no user configuration is present.

use std::collections::HashMap;

use super::keys::{KeyCombo, KeyContext, KeybindingConfig};
use crate::input::Action;

/// Helper to insert a keybinding
fn bind(map: &mut HashMap<KeyCombo, Action>, key: &str, action: Action) {
    match key.parse() {
        Ok(combo) => {
            map.insert(combo, action);
        }
        Err(e) => tracing::error!(key, error = %e, "Invalid default keybinding"),
    }
}

/// Create the default keybindings configuration
pub fn default_keybindings() -> KeybindingConfig {
    let mut config = KeybindingConfig::new();

    // ========== Global Keybindings ==========
    let global = &mut config.global;
    bind(global, "C-q", Action::Quit);
    bind(global, "/", Action::FocusSearch);
    bind(global, "C-t", Action::SwapQuickSwitchTargets);

    bind(global, "C-<Tab>", Action::QuickSwitchPrimary);
    bind(global, "C-S-<Tab>", Action::QuickSwitchPrimaryReverse);
    bind(global, "M-<Tab>", Action::QuickSwitchSecondary);
    bind(global, "M-S-<Tab>", Action::QuickSwitchSecondaryReverse);

    bind(global, "j", Action::SelectNext);
    bind(global, "<Down>", Action::SelectNext);
    bind(global, "k", Action::SelectPrev);
    bind(global, "<Up>", Action::SelectPrev);
    bind(global, "<Tab>", Action::SwitchPane);
    bind(global, "<CR>", Action::Open);

    bind(global, "x", Action::ToggleSelect);
    bind(global, "S-<Down>", Action::ExtendSelection);
    bind(global, "J", Action::ExtendSelection);
    bind(global, "C-a", Action::SelectAll);
    bind(global, "<Esc>", Action::ClearSelection);

    bind(global, "n", Action::NewSession);
    bind(global, "d", Action::Archive);
    bind(global, "u", Action::Undo);
    bind(global, "p", Action::TogglePin);
    bind(global, "s", Action::AddToSplit);
    bind(global, "S", Action::RemoveFromSplit);
    bind(global, "C-s", Action::CloseSplit);
    bind(global, "r", Action::Rename);
    bind(global, "m", Action::ToggleMode);

    // ========== Confirmation dialog ==========
    let dialog = config.context.entry(KeyContext::Dialog).or_default();
    bind(dialog, "y", Action::ConfirmYes);
    bind(dialog, "<CR>", Action::Submit);
    bind(dialog, "n", Action::ConfirmNo);
    bind(dialog, "<Esc>", Action::ConfirmNo);
    bind(dialog, "<Tab>", Action::ConfirmToggle);
    bind(dialog, "<Left>", Action::ConfirmToggle);
    bind(dialog, "<Right>", Action::ConfirmToggle);

    // ========== Quick-switch overlay ==========
    let overlay = config.context.entry(KeyContext::QuickSwitch).or_default();
    bind(overlay, "<CR>", Action::Open);
    bind(overlay, "<Esc>", Action::Cancel);

    // ========== Text entry ==========
    for ctx in [KeyContext::Search, KeyContext::Rename] {
        let map = config.context.entry(ctx).or_default();
        bind(map, "<CR>", Action::Submit);
        bind(map, "<Esc>", Action::Cancel);
        bind(map, "<BS>", Action::Backspace);
    }

    config.sync_quick_switch_context();
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_key_notation;

    #[test]
    fn test_every_action_has_a_default_key() {
        let config = default_keybindings();
        for action in Action::ALL {
            let bound = config.global.values().any(|a| a == action)
                || config.context.values().any(|m| m.values().any(|a| a == action));
            assert!(bound, "{action:?} has no default key");
        }
    }

    #[test]
    fn test_dialog_escape_overrides_clear_selection() {
        let config = default_keybindings();
        let esc = parse_key_notation("<Esc>").unwrap();
        assert_eq!(config.get_action(&esc, KeyContext::List), Some(Action::ClearSelection));
        assert_eq!(config.get_action(&esc, KeyContext::Dialog), Some(Action::ConfirmNo));
        assert_eq!(config.get_action(&esc, KeyContext::QuickSwitch), Some(Action::Cancel));
    }

    #[test]
    fn test_overlay_sees_chords_but_not_list_keys() {
        let config = default_keybindings();
        let chord = parse_key_notation("M-S-<Tab>").unwrap();
        assert_eq!(
            config.get_action(&chord, KeyContext::QuickSwitch),
            Some(Action::QuickSwitchSecondaryReverse)
        );
        let d = parse_key_notation("d").unwrap();
        assert_eq!(config.get_action(&d, KeyContext::QuickSwitch), None);
    }
}
