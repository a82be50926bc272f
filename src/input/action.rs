//! Actions that can be bound to keys

use serde::{Deserialize, Serialize};

/// All mappable actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    // ========== Global ==========
    Quit,
    /// Focus the list filter
    FocusSearch,
    /// Swap which list the primary and secondary chords cycle
    SwapQuickSwitchTargets,

    // ========== Quick switch ==========
    QuickSwitchPrimary,
    QuickSwitchPrimaryReverse,
    QuickSwitchSecondary,
    QuickSwitchSecondaryReverse,

    // ========== List navigation ==========
    SelectNext,
    SelectPrev,
    /// Move focus between the workspace and session panes
    SwitchPane,
    /// Open or focus the item under the cursor
    Open,
    Cancel,

    // ========== Selection ==========
    ToggleSelect,
    ExtendSelection,
    SelectAll,
    ClearSelection,

    // ========== Sessions ==========
    NewSession,
    Archive,
    Undo,
    TogglePin,
    AddToSplit,
    RemoveFromSplit,
    CloseSplit,
    Rename,
    ToggleMode,

    // ========== Dialogs ==========
    ConfirmYes,
    ConfirmNo,
    ConfirmToggle,

    // ========== Text entry ==========
    Submit,
    Backspace,
}

impl Action {
    /// Config name, as used under `[keys]`
    pub fn name(&self) -> &'static str {
        match self {
            Action::Quit => "quit",
            Action::FocusSearch => "focus_search",
            Action::SwapQuickSwitchTargets => "swap_quick_switch_targets",
            Action::QuickSwitchPrimary => "quick_switch_primary",
            Action::QuickSwitchPrimaryReverse => "quick_switch_primary_reverse",
            Action::QuickSwitchSecondary => "quick_switch_secondary",
            Action::QuickSwitchSecondaryReverse => "quick_switch_secondary_reverse",
            Action::SelectNext => "select_next",
            Action::SelectPrev => "select_prev",
            Action::SwitchPane => "switch_pane",
            Action::Open => "open",
            Action::Cancel => "cancel",
            Action::ToggleSelect => "toggle_select",
            Action::ExtendSelection => "extend_selection",
            Action::SelectAll => "select_all",
            Action::ClearSelection => "clear_selection",
            Action::NewSession => "new_session",
            Action::Archive => "archive",
            Action::Undo => "undo",
            Action::TogglePin => "toggle_pin",
            Action::AddToSplit => "add_to_split",
            Action::RemoveFromSplit => "remove_from_split",
            Action::CloseSplit => "close_split",
            Action::Rename => "rename",
            Action::ToggleMode => "toggle_mode",
            Action::ConfirmYes => "confirm_yes",
            Action::ConfirmNo => "confirm_no",
            Action::ConfirmToggle => "confirm_toggle",
            Action::Submit => "submit",
            Action::Backspace => "backspace",
        }
    }

    pub const ALL: &'static [Action] = &[
        Action::Quit,
        Action::FocusSearch,
        Action::SwapQuickSwitchTargets,
        Action::QuickSwitchPrimary,
        Action::QuickSwitchPrimaryReverse,
        Action::QuickSwitchSecondary,
        Action::QuickSwitchSecondaryReverse,
        Action::SelectNext,
        Action::SelectPrev,
        Action::SwitchPane,
        Action::Open,
        Action::Cancel,
        Action::ToggleSelect,
        Action::ExtendSelection,
        Action::SelectAll,
        Action::ClearSelection,
        Action::NewSession,
        Action::Archive,
        Action::Undo,
        Action::TogglePin,
        Action::AddToSplit,
        Action::RemoveFromSplit,
        Action::CloseSplit,
        Action::Rename,
        Action::ToggleMode,
        Action::ConfirmYes,
        Action::ConfirmNo,
        Action::ConfirmToggle,
        Action::Submit,
        Action::Backspace,
    ];

    /// Whether this action starts or advances a quick-switch gesture
    pub fn is_quick_switch(&self) -> bool {
        matches!(
            self,
            Action::QuickSwitchPrimary
                | Action::QuickSwitchPrimaryReverse
                | Action::QuickSwitchSecondary
                | Action::QuickSwitchSecondaryReverse
        )
    }
}

/// Parse an action name string into an Action
pub fn parse_action(name: &str) -> Option<Action> {
    Action::ALL.iter().copied().find(|a| a.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_action_name_parses_back() {
        for action in Action::ALL {
            assert_eq!(parse_action(action.name()), Some(*action));
        }
        assert_eq!(parse_action("launch_rockets"), None);
    }

    #[test]
    fn test_quick_switch_actions() {
        assert!(Action::QuickSwitchSecondaryReverse.is_quick_switch());
        assert!(!Action::Archive.is_quick_switch());
    }
}
