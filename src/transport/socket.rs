//! The seam between a session transport and the network.

use url::Url;

use crate::error::TransportError;
use crate::session::EventSender;

/// A message-oriented, full-duplex socket.
///
/// Implementations never block the caller: `open` starts the handshake and
/// reports progress through `events`, `close` starts the close handshake.
pub trait Socket {
    /// Start connecting to `url`. Every later notification goes to `events`.
    fn open(&mut self, url: Url, events: EventSender);

    /// Queue one text payload for sending.
    fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Start the close handshake, or abandon a pending connect.
    fn close(&mut self);
}
