//! Terminal sessions.
//!
//! A [`Session`] pairs one terminal surface with one transport. The
//! [`SessionBridge`] wires the two together and tears them down; the
//! [`SessionHost`] decides where a session renders and when it lives.

pub mod bridge;
pub mod events;
pub mod host;

use chrono::{DateTime, Local};
use uuid::Uuid;

pub use bridge::{BridgeOptions, BridgePhase, RetryPolicy, SessionBridge};
pub use events::{event_stream, EventSender, SessionEvent, SocketEvent};
pub use host::{RenderContexts, SessionHost, SessionStatus};

/// Identity of one terminal session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    /// Directory the remote shell starts in, resolved once at creation.
    pub working_directory: String,
    pub created_at: DateTime<Local>,
}

impl Session {
    pub fn new(working_directory: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            working_directory: working_directory.into(),
            created_at: Local::now(),
        }
    }

    /// First block of the id, for log lines and the dialog footer.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }

    /// Human readable age, e.g. "42s" or "3m".
    pub fn age(&self) -> String {
        format_age(Local::now().signed_duration_since(self.created_at))
    }
}

fn format_age(elapsed: chrono::Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    }
}
