//! Terminal UI components: launcher, session dialog, terminal pane and toasts.

pub mod dialog;
pub mod launcher;
pub mod layout;
pub mod terminal_pane;
pub mod toast;
pub mod toast_widget;

pub use dialog::TerminalDialog;
pub use launcher::Launcher;
pub use toast::{Toast, ToastManager, ToastType};
pub use toast_widget::ToastWidget;
