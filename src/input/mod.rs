//! Keyboard surface: bindable actions, the shortcut registry and key routing

mod action;
mod registry;
mod router;

use serde::{Deserialize, Serialize};

pub use action::{parse_action, Action};
pub use registry::{ShortcutGuard, ShortcutRegistry};
pub use router::{KeyRouter, RoutedKey};

/// What the keyboard is currently driving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    #[default]
    Normal,
    Searching,
    Renaming,
    Confirming,
    QuickSwitching,
}
