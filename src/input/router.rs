//! Key event to action routing

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode};

use super::action::Action;
use super::registry::ShortcutRegistry;
use super::InputMode;
use crate::config::{KeyCombo, KeyContext, KeybindingConfig};

/// Result of routing one key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutedKey {
    Action(Action),
    /// The modifier holding a quick-switch gesture was let go
    QuickSwitchRelease,
    /// A printable character for text entry
    Text(char),
    Ignored,
}

#[derive(Debug, Clone)]
pub struct KeyRouter {
    bindings: KeybindingConfig,
    registry: ShortcutRegistry,
}

impl KeyRouter {
    pub fn new(bindings: KeybindingConfig, registry: ShortcutRegistry) -> Self {
        Self { bindings, registry }
    }

    pub fn bindings(&self) -> &KeybindingConfig {
        &self.bindings
    }

    pub fn registry(&self) -> &ShortcutRegistry {
        &self.registry
    }

    /// Route `event` for the current `mode`
    ///
    /// `held` carries the modifiers of the chord that started an in-progress
    /// quick-switch gesture. Their release ends the gesture; so does any key
    /// press that arrives without them, for terminals that never report
    /// releases.
    pub fn route(&self, event: &KeyEvent, mode: InputMode, held: Option<KeyModifiers>) -> RoutedKey {
        let context = KeyContext::from_input_mode(mode);

        if event.kind == KeyEventKind::Release {
            return match (held, event.code) {
                (Some(held), KeyCode::Modifier(code)) if held.intersects(modifier_bit(code)) => {
                    RoutedKey::QuickSwitchRelease
                }
                _ => RoutedKey::Ignored,
            };
        }

        if let KeyCode::Modifier(_) = event.code {
            return RoutedKey::Ignored;
        }

        let combo = KeyCombo::from_key_event(event);
        let action = self.bindings.get_action(&combo, context);

        if let Some(held) = held {
            if !event.modifiers.contains(held) && action.is_none() {
                return RoutedKey::QuickSwitchRelease;
            }
        }

        match action {
            Some(action) if self.registry.is_registered(action) => RoutedKey::Action(action),
            Some(action) => {
                tracing::debug!(?action, "Key bound to an unregistered action");
                RoutedKey::Ignored
            }
            None if matches!(mode, InputMode::Searching | InputMode::Renaming) => {
                match event.code {
                    KeyCode::Char(c)
                        if !event
                            .modifiers
                            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                    {
                        RoutedKey::Text(c)
                    }
                    _ => RoutedKey::Ignored,
                }
            }
            None => RoutedKey::Ignored,
        }
    }
}

fn modifier_bit(code: ModifierKeyCode) -> KeyModifiers {
    match code {
        ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => KeyModifiers::CONTROL,
        ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => KeyModifiers::ALT,
        ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => KeyModifiers::SHIFT,
        ModifierKeyCode::LeftSuper | ModifierKeyCode::RightSuper => KeyModifiers::SUPER,
        ModifierKeyCode::LeftMeta | ModifierKeyCode::RightMeta => KeyModifiers::META,
        ModifierKeyCode::LeftHyper | ModifierKeyCode::RightHyper => KeyModifiers::HYPER,
        _ => KeyModifiers::NONE,
    }
}
