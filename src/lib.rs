//! shellbridge library crate.
//!
//! Hosts an interactive shell running on a remote terminal server inside a
//! terminal UI:
//! - WebSocket transport and the session wire protocol
//! - Session lifecycle: attach, stream, detach
//! - vt100 terminal surface and the dialog/window views

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod event_loop;
pub mod handlers;
pub mod input;
pub mod logging;
pub mod protocol;
pub mod session;
pub mod surface;
pub mod transport;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_utils;
