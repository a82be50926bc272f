use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::input::{parse_action, Action};
use crate::quick_switch::{DEFAULT_CANDIDATE_LIMIT, DEFAULT_HOLD_DELAY};
use crate::session::ReassignPolicy;
use crate::undo::DEFAULT_UNDO_WINDOW;

use super::default_keys::default_keybindings;
use super::keys::{parse_key_notation, KeyCombo, KeyContext, KeybindingConfig};

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(4);

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub navigation: NavigationConfig,
    /// Color theme name (`dark` or `light`)
    pub theme: Option<String>,
    /// Keybinding configuration
    pub keybindings: KeybindingConfig,
}

/// Timing and policy knobs for session navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationConfig {
    /// How long an archive stays undoable
    pub undo_window: Duration,
    /// How long the quick-switch chord must be held before the overlay opens
    pub hold_delay: Duration,
    /// Maximum entries in the quick-switch overlay
    pub candidate_limit: usize,
    /// Which session gains focus when the focused one is archived
    pub reassign_policy: ReassignPolicy,
    /// How long notifications stay on screen
    pub toast_duration: Duration,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            undo_window: DEFAULT_UNDO_WINDOW,
            hold_delay: DEFAULT_HOLD_DELAY,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            reassign_policy: ReassignPolicy::default(),
            toast_duration: DEFAULT_TOAST_DURATION,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            navigation: NavigationConfig::default(),
            theme: None,
            keybindings: default_keybindings(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlNavigationConfig {
    pub undo_window_ms: Option<u64>,
    pub hold_delay_ms: Option<u64>,
    pub candidate_limit: Option<usize>,
    pub reassign_policy: Option<ReassignPolicy>,
    pub toast_duration_ms: Option<u64>,
}

/// TOML representation of keybinding configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlKeybindings {
    /// Global keybindings (apply to all contexts)
    #[serde(flatten)]
    pub global: HashMap<String, String>,

    /// List navigation keybindings
    pub list: Option<HashMap<String, String>>,

    /// Search input keybindings
    pub search: Option<HashMap<String, String>>,

    /// Rename input keybindings
    pub rename: Option<HashMap<String, String>>,

    /// Confirmation dialog keybindings
    pub dialog: Option<HashMap<String, String>>,

    /// Quick-switch overlay keybindings
    pub quick_switch: Option<HashMap<String, String>>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub theme: Option<String>,
    pub navigation: Option<TomlNavigationConfig>,
    /// Keybinding configuration
    pub keys: Option<TomlKeybindings>,
}

impl TomlKeybindings {
    /// Convert TOML keybindings to KeybindingConfig
    ///
    /// Bad entries are skipped and reported; the rest still apply.
    fn to_keybinding_config(&self) -> (KeybindingConfig, Vec<ConfigError>) {
        let mut config = KeybindingConfig::new();
        let mut problems = Vec::new();

        for (action_name, key_str) in &self.global {
            if let Some((combo, action)) = parse_binding(action_name, key_str, &mut problems) {
                config.global.insert(combo, action);
            }
        }

        let sections = [
            (KeyContext::List, &self.list),
            (KeyContext::Search, &self.search),
            (KeyContext::Rename, &self.rename),
            (KeyContext::Dialog, &self.dialog),
            (KeyContext::QuickSwitch, &self.quick_switch),
        ];
        for (context, bindings) in sections {
            let Some(bindings) = bindings else { continue };
            let context_map = config.context.entry(context).or_default();
            for (action_name, key_str) in bindings {
                if let Some((combo, action)) = parse_binding(action_name, key_str, &mut problems) {
                    context_map.insert(combo, action);
                }
            }
        }

        (config, problems)
    }
}

fn parse_binding(
    action_name: &str,
    key_str: &str,
    problems: &mut Vec<ConfigError>,
) -> Option<(KeyCombo, Action)> {
    let Some(action) = parse_action(action_name) else {
        problems.push(ConfigError::UnknownAction(action_name.to_string()));
        return None;
    };
    match parse_key_notation(key_str) {
        Ok(combo) => Some((combo, action)),
        Err(source) => {
            problems.push(ConfigError::InvalidKey {
                action: action_name.to_string(),
                notation: key_str.to_string(),
                source,
            });
            None
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults on any error
    ///
    /// Writes the bundled example on first run.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            Self::create_default_config(path);
        }

        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Using default config");
                Config::default()
            }
        }
    }

    /// Strict load: a missing file yields defaults, a malformed one is an error
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let toml_config: TomlConfig = toml::from_str(contents)?;
        let mut config = Config::default();
        config.theme = toml_config.theme;

        if let Some(nav) = toml_config.navigation {
            config.navigation = merge_navigation(config.navigation, nav)?;
        }

        // Merge user keybindings on top of defaults
        if let Some(keys) = toml_config.keys {
            let (user_bindings, problems) = keys.to_keybinding_config();
            for problem in problems {
                tracing::warn!(error = %problem, "Skipping keybinding");
            }
            config.keybindings.merge(user_bindings);
            config.keybindings.sync_quick_switch_context();
        }

        Ok(config)
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(error = %e, "Failed to create config directory");
                return;
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(error = %e, "Failed to write default config");
        }
    }
}

fn merge_navigation(
    mut nav: NavigationConfig,
    toml: TomlNavigationConfig,
) -> Result<NavigationConfig, ConfigError> {
    if let Some(ms) = toml.undo_window_ms {
        if ms == 0 {
            return Err(ConfigError::Invalid {
                field: "undo_window_ms",
                reason: "must be greater than zero".into(),
            });
        }
        nav.undo_window = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.hold_delay_ms {
        nav.hold_delay = Duration::from_millis(ms);
    }
    if let Some(limit) = toml.candidate_limit {
        if limit == 0 {
            return Err(ConfigError::Invalid {
                field: "candidate_limit",
                reason: "must be at least 1".into(),
            });
        }
        nav.candidate_limit = limit;
    }
    if let Some(policy) = toml.reassign_policy {
        nav.reassign_policy = policy;
    }
    if let Some(ms) = toml.toast_duration_ms {
        nav.toast_duration = Duration::from_millis(ms);
    }
    Ok(nav)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses() {
        let config = Config::from_toml_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config.navigation, NavigationConfig::default());
    }

    #[test]
    fn test_navigation_overrides() {
        let config = Config::from_toml_str(
            r#"
            [navigation]
            undo_window_ms = 5000
            hold_delay_ms = 120
            candidate_limit = 3
            reassign_policy = "prefer-next"
            "#,
        )
        .unwrap();

        assert_eq!(config.navigation.undo_window, Duration::from_secs(5));
        assert_eq!(config.navigation.hold_delay, Duration::from_millis(120));
        assert_eq!(config.navigation.candidate_limit, 3);
        assert_eq!(config.navigation.reassign_policy, ReassignPolicy::PreferNext);
        assert_eq!(config.navigation.toast_duration, DEFAULT_TOAST_DURATION);
    }

    #[test]
    fn test_invalid_navigation_values_are_rejected() {
        let err = Config::from_toml_str("[navigation]\ncandidate_limit = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "candidate_limit",
                ..
            }
        ));
        assert!(Config::from_toml_str("[navigation]\nbogus = 1\n").is_err());
    }

    #[test]
    fn test_user_keys_merge_and_bad_entries_are_skipped() {
        let config = Config::from_toml_str(
            r#"
            [keys]
            archive = "C-d"
            quick_switch_primary = "C-<Space>"
            not_an_action = "z"
            undo = "C-nonsense"

            [keys.dialog]
            confirm_yes = "Y"
            "#,
        )
        .unwrap();

        let bindings = &config.keybindings;
        let ctrl_d = parse_key_notation("C-d").unwrap();
        assert_eq!(bindings.get_action(&ctrl_d, KeyContext::List), Some(Action::Archive));

        // The default still works alongside the new binding
        let u = parse_key_notation("u").unwrap();
        assert_eq!(bindings.get_action(&u, KeyContext::List), Some(Action::Undo));

        let chord = parse_key_notation("C-<Space>").unwrap();
        assert_eq!(
            bindings.get_action(&chord, KeyContext::QuickSwitch),
            Some(Action::QuickSwitchPrimary)
        );

        let shift_y = parse_key_notation("Y").unwrap();
        assert_eq!(
            bindings.get_action(&shift_y, KeyContext::Dialog),
            Some(Action::ConfirmYes)
        );
    }

    #[test]
    fn test_load_writes_example_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load(&path);
        assert!(path.exists());
        assert_eq!(config.navigation, NavigationConfig::default());
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[navigation\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
        assert_eq!(Config::load(&path).navigation, NavigationConfig::default());
    }
}
