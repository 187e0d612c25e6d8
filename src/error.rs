//! Error types for terminal sessions.
//!
//! Transport and frame failures never escape a session as panics: the bridge
//! turns them into status banners or drops them with a log line.

use thiserror::Error;

/// Failures observed over the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The socket never reached the open state.
    #[error("Failed to connect to terminal server: {0}")]
    TransportOpenFailure(String),

    /// The socket closed without this side asking it to.
    #[error("Connection closed: {0}")]
    TransportAbnormalClose(String),

    /// A received message did not have the expected JSON shape.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The render target never got a laid-out area.
    #[error("terminal view not ready after {attempts} attempts")]
    AttachmentNotReady { attempts: u32 },
}

/// Why a terminal surface could not bind to its render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AttachError {
    #[error("render target has no area yet")]
    TargetUnavailable,
    #[error("surface is already attached")]
    AlreadyAttached,
    #[error("surface has been disposed")]
    Disposed,
}

/// Errors raised at the socket seam.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("socket is not open")]
    NotOpen,
    #[error("socket writer has shut down")]
    WriterClosed,
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}
