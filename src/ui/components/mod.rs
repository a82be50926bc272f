mod confirmation_dialog;
mod dialog;
mod global_footer;
mod key_hints;
mod quick_switch_overlay;
mod session_list;
mod text_input;
pub mod theme;
mod toasts;
mod workspace_list;

pub use confirmation_dialog::{ConfirmChoice, ConfirmationDialog};
pub use dialog::DialogFrame;
pub use global_footer::GlobalFooter;
pub use key_hints::{hint_line, hints_for, render_key_hints, KeyHintBarStyle};
pub use quick_switch_overlay::QuickSwitchOverlay;
pub use session_list::SessionList;
pub use text_input::TextInputState;
pub use theme::{current_theme, init_theme, set_theme, Theme};
pub use toasts::ToastStack;
pub use workspace_list::WorkspaceList;
