//! Routing of crossterm input events to the application.

pub mod keyboard;
pub mod mouse;

pub use keyboard::{handle_key_event, handle_paste};
pub use mouse::handle_mouse_event;
