//! WebSocket implementation of [`Socket`] on top of tokio-tungstenite.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream, StreamExt};
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use super::socket::Socket;
use crate::error::TransportError;
use crate::session::{EventSender, SocketEvent};

/// Longest wait for the server to answer a close frame.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Commands for the socket task.
enum Outgoing {
    Text(String),
    Close,
}

/// A WebSocket whose I/O runs as a task on a tokio runtime.
///
/// The task only posts [`SocketEvent`]s; all state lives with the session
/// that owns the socket. Dropping the socket cancels the task unless a close
/// handshake is already queued, which then runs to completion on its own.
pub struct WsSocket {
    handle: Handle,
    outgoing: Option<UnboundedSender<Outgoing>>,
    cancel: CancellationToken,
    /// Set by the task once the handshake completed.
    opened: Arc<AtomicBool>,
    close_queued: bool,
}

impl WsSocket {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            outgoing: None,
            cancel: CancellationToken::new(),
            opened: Arc::new(AtomicBool::new(false)),
            close_queued: false,
        }
    }
}

impl Socket for WsSocket {
    fn open(&mut self, url: Url, events: EventSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outgoing = Some(tx);
        let task = SocketTask {
            url,
            events,
            outgoing: rx,
            cancel: self.cancel.clone(),
            opened: self.opened.clone(),
        };
        self.handle.spawn(task.run());
    }

    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        let outgoing = self.outgoing.as_ref().ok_or(TransportError::NotOpen)?;
        outgoing
            .send(Outgoing::Text(text))
            .map_err(|_| TransportError::WriterClosed)
    }

    fn close(&mut self) {
        let Some(outgoing) = self.outgoing.take() else {
            self.cancel.cancel();
            return;
        };
        // Before the handshake completes there is nobody to say goodbye to
        if !self.opened.load(Ordering::Acquire) {
            debug!("closed while connecting");
            self.cancel.cancel();
            return;
        }
        if outgoing.send(Outgoing::Close).is_ok() {
            self.close_queued = true;
        } else {
            self.cancel.cancel();
        }
    }
}

impl Drop for WsSocket {
    fn drop(&mut self) {
        if !self.close_queued {
            self.cancel.cancel();
        }
    }
}

type WsWrite = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsRead = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

struct SocketTask {
    url: Url,
    events: EventSender,
    outgoing: UnboundedReceiver<Outgoing>,
    cancel: CancellationToken,
    opened: Arc<AtomicBool>,
}

impl SocketTask {
    async fn run(mut self) {
        let connect = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("connect abandoned");
                return;
            }
            result = connect_async(self.url.as_str()) => result,
        };

        let stream = match connect {
            Ok((stream, _response)) => stream,
            Err(e) => {
                self.events.socket(SocketEvent::Error(e.to_string()));
                return;
            }
        };

        self.opened.store(true, Ordering::Release);
        // The close may have been requested while the handshake was in flight
        if self.cancel.is_cancelled() {
            return;
        }
        self.events.socket(SocketEvent::Opened);

        let (mut write, mut read) = stream.split();
        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => return,

                command = self.outgoing.recv() => match command {
                    Some(Outgoing::Text(text)) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            self.events.socket(SocketEvent::Error(e.to_string()));
                            return;
                        }
                    }
                    Some(Outgoing::Close) | None => break,
                },

                incoming = read.next() => match incoming {
                    Some(Ok(Message::Close(frame))) => {
                        self.events.socket(closed_event(frame));
                        // Keep reading so tungstenite flushes its reply
                        drain(&mut read).await;
                        return;
                    }
                    Some(Ok(message)) => self.deliver(message),
                    Some(Err(e)) => {
                        self.events.socket(SocketEvent::Error(e.to_string()));
                        return;
                    }
                    None => {
                        self.events.socket(SocketEvent::Closed {
                            code: None,
                            reason: String::new(),
                        });
                        return;
                    }
                },
            }
        }

        self.finish_close(write, read).await;
    }

    fn deliver(&self, message: Message) {
        match message {
            Message::Text(text) => {
                self.events.socket(SocketEvent::Message(text));
            }
            Message::Binary(data) => match String::from_utf8(data) {
                Ok(text) => {
                    self.events.socket(SocketEvent::Message(text));
                }
                Err(_) => warn!("dropping non-UTF-8 binary message"),
            },
            // Ping/pong are answered by tungstenite
            _ => {}
        }
    }

    /// Send our close frame and wait for the server's answer.
    async fn finish_close(&self, mut write: WsWrite, mut read: WsRead) {
        if let Err(e) = write.send(Message::Close(None)).await {
            self.events.socket(SocketEvent::Error(e.to_string()));
            return;
        }

        let reply = tokio::time::timeout(CLOSE_TIMEOUT, async {
            while let Some(incoming) = read.next().await {
                match incoming {
                    Ok(Message::Close(frame)) => {
                        drain(&mut read).await;
                        return Ok(closed_event(frame));
                    }
                    Ok(_) => {}
                    Err(e) => return Err(e),
                }
            }
            Ok(SocketEvent::Closed { code: None, reason: String::new() })
        })
        .await;

        let event = match reply {
            Ok(Ok(event)) => event,
            Ok(Err(e)) => SocketEvent::Error(e.to_string()),
            Err(_) => {
                warn!("server did not answer the close frame");
                SocketEvent::Closed { code: None, reason: String::new() }
            }
        };
        self.events.socket(event);
    }
}

fn closed_event(frame: Option<CloseFrame<'_>>) -> SocketEvent {
    match frame {
        Some(frame) => SocketEvent::Closed {
            code: Some(u16::from(frame.code)),
            reason: frame.reason.into_owned(),
        },
        None => SocketEvent::Closed { code: None, reason: String::new() },
    }
}

/// Poll until the stream ends so pending control frames get written.
async fn drain(read: &mut WsRead) {
    let _ = tokio::time::timeout(CLOSE_TIMEOUT, async {
        while let Some(Ok(_)) = read.next().await {}
    })
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{event_stream, SessionEvent};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::oneshot;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

    /// Server that answers every `{"input": x}` with `{"output": x}`.
    async fn echo_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                match msg {
                    Message::Text(text) => {
                        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
                        let reply = serde_json::json!({ "output": value["input"] });
                        ws.send(Message::Text(reply.to_string())).await.unwrap();
                    }
                    // tungstenite answers on the next read; the stream then ends
                    _ => {}
                }
            }
        });
        format!("ws://{}/ws/shell?path=%2F", addr)
    }

    /// Server that reports whether the client sent a close frame before the
    /// connection went away.
    async fn close_watching_server() -> (Url, oneshot::Receiver<bool>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (saw_close_tx, saw_close_rx) = oneshot::channel();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let mut saw_close = false;
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_close() {
                    saw_close = true;
                }
            }
            let _ = saw_close_tx.send(saw_close);
        });
        let url = Url::parse(&format!("ws://{}/ws/shell", addr)).unwrap();
        (url, saw_close_rx)
    }

    async fn next_socket_event(rx: &mut UnboundedReceiver<SessionEvent>) -> SocketEvent {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for socket event")
            .expect("event stream closed");
        match event {
            SessionEvent::Socket(event) => event,
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn round_trip_and_close_against_local_server() {
        let url = Url::parse(&echo_server().await).unwrap();
        let (tx, mut rx) = event_stream();
        let mut socket = WsSocket::new(Handle::current());

        socket.open(url, tx);
        assert_eq!(next_socket_event(&mut rx).await, SocketEvent::Opened);

        socket
            .send_text(r#"{"input":"ls\r"}"#.to_string())
            .unwrap();
        assert_eq!(
            next_socket_event(&mut rx).await,
            SocketEvent::Message(r#"{"output":"ls\r"}"#.to_string())
        );

        socket.close();
        assert!(matches!(
            next_socket_event(&mut rx).await,
            SocketEvent::Closed { .. }
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn close_then_drop_still_sends_the_close_frame() {
        for _ in 0..10 {
            let (url, saw_close) = close_watching_server().await;
            let (tx, mut rx) = event_stream();
            let mut socket = WsSocket::new(Handle::current());
            socket.open(url, tx);
            assert_eq!(next_socket_event(&mut rx).await, SocketEvent::Opened);

            socket.close();
            drop(socket);

            let saw_close = tokio::time::timeout(Duration::from_secs(5), saw_close)
                .await
                .unwrap()
                .unwrap();
            assert!(saw_close, "server never received a close frame");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn close_while_connecting_never_opens() {
        // Accepts TCP but holds the WebSocket handshake back
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
            let _ = tokio_tungstenite::accept_async(stream).await;
        });

        let (tx, mut rx) = event_stream();
        let mut socket = WsSocket::new(Handle::current());
        socket.open(Url::parse(&format!("ws://{}/", addr)).unwrap(), tx);
        tokio::time::sleep(Duration::from_millis(50)).await;
        socket.close();

        // The task gives up without posting anything, dropping its sender
        let next = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(next, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn server_close_is_reported_and_acknowledged() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (clean_tx, clean_rx) = oneshot::channel();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "bye".into(),
            }))
            .await
            .unwrap();
            // A clean handshake ends the stream without an error
            let mut clean = true;
            while let Some(msg) = ws.next().await {
                if msg.is_err() {
                    clean = false;
                }
            }
            let _ = clean_tx.send(clean);
        });

        let (tx, mut rx) = event_stream();
        let mut socket = WsSocket::new(Handle::current());
        socket.open(Url::parse(&format!("ws://{}/", addr)).unwrap(), tx);
        assert_eq!(next_socket_event(&mut rx).await, SocketEvent::Opened);
        assert_eq!(
            next_socket_event(&mut rx).await,
            SocketEvent::Closed {
                code: Some(1000),
                reason: "bye".to_string(),
            }
        );

        let clean = tokio::time::timeout(Duration::from_secs(5), clean_rx)
            .await
            .unwrap()
            .unwrap();
        assert!(clean, "close reply was not flushed");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn refused_connection_reports_an_error() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (tx, mut rx) = event_stream();
        let mut socket = WsSocket::new(Handle::current());
        socket.open(Url::parse(&format!("ws://{}/", addr)).unwrap(), tx);

        assert!(matches!(
            next_socket_event(&mut rx).await,
            SocketEvent::Error(_)
        ));
    }

    #[test]
    fn send_before_open_is_rejected() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut socket = WsSocket::new(runtime.handle().clone());
        assert!(matches!(
            socket.send_text("x".to_string()),
            Err(TransportError::NotOpen)
        ));
    }
}
