pub mod app;
pub mod components;
mod terminal_guard;

pub use app::App;
pub use terminal_guard::{install_panic_hook, TerminalGuard};
