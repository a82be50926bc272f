//! Runtime-switchable colors for the list UI.
//!
//! Reads go through small accessor functions so widgets never hold the lock
//! across a render.

use std::sync::OnceLock;

use parking_lot::RwLock;
use ratatui::style::Color;

/// Semantic colors used by every widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: String,
    pub is_light: bool,

    pub bg_base: Color,
    /// Dialogs, overlays
    pub bg_elevated: Color,
    /// Cursor row
    pub bg_highlight: Color,
    pub footer_bg: Color,
    pub key_hint_bg: Color,

    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,
    pub text_faint: Color,

    pub accent_primary: Color,
    pub accent_success: Color,
    pub accent_warning: Color,
    pub accent_error: Color,

    pub border_default: Color,
    pub border_focused: Color,
}

impl Theme {
    pub fn default_dark() -> Self {
        Self {
            name: "dark".to_string(),
            is_light: false,
            bg_base: Color::Rgb(16, 16, 18),
            bg_elevated: Color::Rgb(30, 30, 34),
            bg_highlight: Color::Rgb(40, 60, 80),
            footer_bg: Color::Rgb(25, 25, 25),
            key_hint_bg: Color::Rgb(60, 60, 60),
            text_primary: Color::Rgb(220, 220, 220),
            text_secondary: Color::Rgb(170, 170, 170),
            text_muted: Color::Rgb(120, 120, 120),
            text_faint: Color::Rgb(80, 80, 80),
            accent_primary: Color::Cyan,
            accent_success: Color::Green,
            accent_warning: Color::Yellow,
            accent_error: Color::Red,
            border_default: Color::Rgb(70, 70, 70),
            border_focused: Color::Cyan,
        }
    }

    pub fn default_light() -> Self {
        Self {
            name: "light".to_string(),
            is_light: true,
            bg_base: Color::Rgb(250, 250, 250),
            bg_elevated: Color::Rgb(236, 236, 240),
            bg_highlight: Color::Rgb(200, 220, 240),
            footer_bg: Color::Rgb(230, 230, 230),
            key_hint_bg: Color::Rgb(210, 210, 210),
            text_primary: Color::Rgb(30, 30, 30),
            text_secondary: Color::Rgb(70, 70, 70),
            text_muted: Color::Rgb(110, 110, 110),
            text_faint: Color::Rgb(160, 160, 160),
            accent_primary: Color::Blue,
            accent_success: Color::Rgb(0, 130, 60),
            accent_warning: Color::Rgb(180, 120, 0),
            accent_error: Color::Rgb(190, 30, 30),
            border_default: Color::Rgb(190, 190, 190),
            border_focused: Color::Blue,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_dark()
    }
}

static THEME: OnceLock<RwLock<Theme>> = OnceLock::new();

fn theme_lock() -> &'static RwLock<Theme> {
    THEME.get_or_init(|| RwLock::new(Theme::default()))
}

pub fn current_theme() -> parking_lot::RwLockReadGuard<'static, Theme> {
    theme_lock().read()
}

/// Set a new theme. Takes effect on the next render.
pub fn set_theme(theme: Theme) {
    tracing::debug!(theme = %theme.name, "Theme changed");
    *theme_lock().write() = theme;
}

/// Apply a theme by name; unknown names keep the current theme
pub fn init_theme(name: Option<&str>) {
    match name {
        Some("light") => set_theme(Theme::default_light()),
        Some("dark") | None => set_theme(Theme::default_dark()),
        Some(other) => tracing::warn!(theme = other, "Unknown theme; keeping default"),
    }
}

macro_rules! theme_color {
    ($($name:ident),* $(,)?) => {
        $(
            #[inline]
            pub fn $name() -> Color {
                current_theme().$name
            }
        )*
    };
}

theme_color!(
    bg_base,
    bg_elevated,
    bg_highlight,
    footer_bg,
    key_hint_bg,
    text_primary,
    text_secondary,
    text_muted,
    text_faint,
    accent_primary,
    accent_success,
    accent_warning,
    accent_error,
    border_default,
    border_focused,
);
