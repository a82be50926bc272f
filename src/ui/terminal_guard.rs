//! Terminal setup and guaranteed restore.
//!
//! Quick-switch gestures end on modifier release, which terminals only report
//! with the keyboard enhancement protocol. Without it the router falls back to
//! the next unmodified key press.

use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

/// Guard that restores terminal state when dropped.
///
/// Covers normal return, early `?` propagation and, with
/// [`install_panic_hook`], panics.
pub struct TerminalGuard {
    keyboard_enhancement_enabled: bool,
    active: bool,
}

impl TerminalGuard {
    /// Enter raw mode and the alternate screen, requesting key release events
    pub fn enter() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        // Restores raw mode if anything below fails
        let mut guard = Self {
            keyboard_enhancement_enabled: false,
            active: true,
        };
        execute!(stdout, EnterAlternateScreen)?;

        if supports_keyboard_enhancement().unwrap_or(false) {
            let flags = KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES;
            match execute!(stdout, PushKeyboardEnhancementFlags(flags)) {
                Ok(()) => guard.keyboard_enhancement_enabled = true,
                Err(e) => tracing::debug!(error = %e, "Keyboard enhancement unavailable"),
            }
        } else {
            tracing::info!("Terminal does not report key releases; quick switch ends on next key");
        }
        Ok(guard)
    }

    pub fn keyboard_enhancement_enabled(&self) -> bool {
        self.keyboard_enhancement_enabled
    }

    /// Restore the terminal now and disarm Drop
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        if !std::mem::replace(&mut self.active, false) {
            return Ok(());
        }
        restore(self.keyboard_enhancement_enabled)?;
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = restore(self.keyboard_enhancement_enabled) {
                tracing::debug!(error = %e, "Terminal cleanup failed in Drop");
            }
        }
    }
}

/// Leave raw mode and the alternate screen
///
/// Enhancement flags are popped first; the pop must reach the terminal
/// while it is still in raw mode.
fn restore(pop_keyboard_flags: bool) -> io::Result<()> {
    let mut stdout = io::stdout();
    if pop_keyboard_flags {
        if let Err(e) = execute!(stdout, PopKeyboardEnhancementFlags).and_then(|()| stdout.flush()) {
            tracing::debug!(error = %e, "Failed to pop keyboard enhancement flags");
        }
    }
    disable_raw_mode()?;
    execute!(stdout, LeaveAlternateScreen)?;
    stdout.flush()
}

/// Restore the terminal before the panic message is printed
///
/// Call before [`TerminalGuard::enter`].
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = restore(true) {
            tracing::debug!(error = %e, "Terminal restore failed in panic hook");
        }
        original_hook(panic_info);
    }));
}
