//! Feed
//!
//! A `Feed` owns the one socket to the coaching backend, and turns it into
//! a stream of `FeedEvent`s delivered over a `crossbeam::channel`. The
//! channel is the boundary between transport and everything else: the
//! session consumes raw frames from it without knowing where they came
//! from, so a feed can also be assembled from any channel (see
//! `Feed::from_parts`).
//!
//! Note: a connected `Feed` reads the socket from a dedicated thread. That
//! thread only forwards frames; it never decodes or touches session state.

pub mod util;

use std::io;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam::channel::{self, SendTimeoutError};
use thiserror::Error;
use tungstenite::protocol::frame::coding::CloseCode;
use tungstenite::{Message, WebSocket};

/// Event delivered by a feed, in socket order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// The socket is established. Always the first event of a feed.
    Ready,
    /// One inbound message, verbatim.
    Frame(String),
    /// The socket closed. Always the last event of a feed.
    Closed(CloseReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer closed the session.
    Remote { code: u16, reason: String },
    /// The socket failed.
    Transport(String),
    /// Closed from this side.
    Local,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::Remote { code, reason } if reason.is_empty() => {
                write!(f, "closed by peer ({})", code)
            }
            CloseReason::Remote { code, reason } => {
                write!(f, "closed by peer ({}: {})", code, reason)
            }
            CloseReason::Transport(err) => write!(f, "connection lost: {}", err),
            CloseReason::Local => write!(f, "closed locally"),
        }
    }
}

/// Possible errors when opening a feed.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        endpoint: String,
        reason: &'static str,
    },
    #[error("unsupported endpoint scheme {0:?}, only ws:// is supported")]
    UnsupportedScheme(String),
    #[error("connection failed: {0}")]
    Io(#[from] io::Error),
    #[error("websocket handshake failed: {0}")]
    Handshake(#[from] tungstenite::Error),
}

type Closer = Box<dyn FnOnce() + Send>;

/// Owned feed resource. Dropping it releases the socket.
pub struct Feed {
    events: channel::Receiver<FeedEvent>,
    closer: Option<Closer>,
}

impl Feed {
    /// Connects to a `ws://host[:port]/path` endpoint and starts forwarding
    /// its messages. Returns once the websocket handshake has completed;
    /// a `FeedEvent::Ready` is already queued at that point.
    pub fn connect(endpoint: &str) -> Result<Feed, ConnectError> {
        let (request, addrs) = util::resolve(endpoint)?;

        let mut last_err = None;
        let mut stream = None;
        for addr in &addrs {
            match TcpStream::connect_timeout(addr, util::CONNECT_TIMEOUT) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }
        let stream = match (stream, last_err) {
            (Some(s), _) => s,
            (None, Some(e)) => return Err(e.into()),
            (None, None) => {
                return Err(io::Error::new(io::ErrorKind::Other, "no address to connect to").into())
            }
        };
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(util::CONNECT_TIMEOUT))?;
        stream.set_write_timeout(Some(util::CONNECT_TIMEOUT))?;

        let (socket, _response) =
            tungstenite::client::client(request, stream).map_err(|err| match err {
                tungstenite::HandshakeError::Failure(e) => ConnectError::Handshake(e),
                tungstenite::HandshakeError::Interrupted(_) => ConnectError::Io(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "no handshake response from server",
                )),
            })?;
        // From here on the reader wakes up regularly to check for a close.
        socket.get_ref().set_read_timeout(Some(util::POLL_INTERVAL))?;
        socket.get_ref().set_write_timeout(None)?;
        log::info!("feed connected to {}", endpoint);

        let (tx, rx) = Feed::channel();
        // The channel is empty, this cannot block.
        let _ = tx.send(FeedEvent::Ready);

        let closing = Arc::new(AtomicBool::new(false));
        let thread_closing = closing.clone();
        thread::Builder::new()
            .name("feed-reader".to_string())
            .spawn(move || Feed::reader_thread(socket, tx, thread_closing))?;

        // The reader sends the close frame and releases the socket.
        Ok(Feed::from_parts(rx, move || {
            closing.store(true, Ordering::SeqCst);
        }))
    }

    /// Assembles a feed from an event channel and the action that releases
    /// whatever produces into it. `closer` runs at most once.
    pub fn from_parts<F: FnOnce() + Send + 'static>(
        events: channel::Receiver<FeedEvent>,
        closer: F,
    ) -> Feed {
        Feed {
            events,
            closer: Some(Box::new(closer)),
        }
    }

    /// Creates a sender/receiver pair sized for feed traffic, to be used
    /// with `from_parts`.
    pub fn channel() -> (
        channel::Sender<FeedEvent>,
        channel::Receiver<FeedEvent>,
    ) {
        channel::bounded::<FeedEvent>(util::feed_channel_size())
    }

    /// To use `crossbeam::channel::select!`.
    pub fn receiver(&self) -> &channel::Receiver<FeedEvent> {
        &self.events
    }

    pub fn is_open(&self) -> bool {
        self.closer.is_some()
    }

    /// Releases the socket. Returns false if it was already released.
    ///
    /// For a connected feed the reader thread sends the close frame and
    /// then drops the socket, within `util::POLL_INTERVAL` plus `util::CLOSE_TIMEOUT`.
    pub fn close(&mut self) -> bool {
        match self.closer.take() {
            Some(closer) => {
                closer();
                true
            }
            None => false,
        }
    }

    fn reader_thread(
        mut socket: WebSocket<TcpStream>,
        tx: channel::Sender<FeedEvent>,
        closing: Arc<AtomicBool>,
    ) {
        // Set once the peer's close frame arrived. Reading goes on until
        // the socket is done so that tungstenite can flush its reply.
        let mut remote: Option<(CloseReason, Instant)> = None;
        let reason = loop {
            if let Some((reason, since)) = &remote {
                if since.elapsed() > util::CLOSE_TIMEOUT {
                    break reason.clone();
                }
            } else if closing.load(Ordering::SeqCst) {
                break CloseReason::Local;
            }
            match socket.read() {
                Ok(Message::Text(text)) => {
                    if !Feed::forward(&tx, FeedEvent::Frame(text), &closing) {
                        break CloseReason::Local;
                    }
                }
                Ok(Message::Binary(data)) => {
                    log::debug!("binary message ({} bytes) forwarded as text", data.len());
                    let text = String::from_utf8_lossy(&data).into_owned();
                    if !Feed::forward(&tx, FeedEvent::Frame(text), &closing) {
                        break CloseReason::Local;
                    }
                }
                Ok(Message::Close(frame)) => {
                    let reason = match frame {
                        Some(frame) => CloseReason::Remote {
                            code: u16::from(frame.code),
                            reason: frame.reason.into_owned(),
                        },
                        None => CloseReason::Remote {
                            code: u16::from(CloseCode::Status),
                            reason: String::new(),
                        },
                    };
                    remote = Some((reason, Instant::now()));
                }
                Ok(msg) => {
                    log::trace!("ignoring control message {:?}", msg);
                }
                Err(e) if is_timeout(&e) => {}
                Err(tungstenite::Error::ConnectionClosed)
                | Err(tungstenite::Error::AlreadyClosed) => {
                    break match remote {
                        Some((reason, _)) => reason,
                        None => CloseReason::Remote {
                            code: u16::from(CloseCode::Normal),
                            reason: String::new(),
                        },
                    };
                }
                Err(e) => {
                    break match remote {
                        Some((reason, _)) => reason,
                        None if closing.load(Ordering::SeqCst) => CloseReason::Local,
                        None => CloseReason::Transport(e.to_string()),
                    };
                }
            }
        };
        if reason == CloseReason::Local {
            Feed::close_handshake(&mut socket);
        }
        if let Err(e) = socket.get_ref().shutdown(Shutdown::Both) {
            log::trace!("feed shutdown: {}", e);
        }
        log::info!("feed {}", reason);
        Feed::forward(&tx, FeedEvent::Closed(reason), &closing);
    }

    /// Blocks until `event` is queued. Gives up once the receiver is gone
    /// or the feed is closing.
    fn forward(
        tx: &channel::Sender<FeedEvent>,
        mut event: FeedEvent,
        closing: &AtomicBool,
    ) -> bool {
        loop {
            match tx.send_timeout(event, util::POLL_INTERVAL) {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(ev)) if !closing.load(Ordering::SeqCst) => {
                    event = ev;
                }
                Err(_) => return false,
            }
        }
    }

    /// Sends a close frame and waits, at most `CLOSE_TIMEOUT`, for the
    /// peer to answer it.
    fn close_handshake(socket: &mut WebSocket<TcpStream>) {
        if let Err(e) = socket.close(None) {
            if !is_timeout(&e) {
                log::debug!("feed close: {}", e);
                return;
            }
        }
        let deadline = Instant::now() + util::CLOSE_TIMEOUT;
        while Instant::now() < deadline {
            match socket.read() {
                Ok(_) => {}
                Err(e) if is_timeout(&e) => {}
                Err(tungstenite::Error::ConnectionClosed) => return,
                Err(e) => {
                    log::debug!("feed close: {}", e);
                    return;
                }
            }
        }
        log::debug!("feed close: no answer from peer");
    }
}

fn is_timeout(err: &tungstenite::Error) -> bool {
    match err {
        tungstenite::Error::Io(e) => {
            matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
        }
        _ => false,
    }
}

impl Drop for Feed {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feed")
            .field("open", &self.is_open())
            .field("queued", &self.events.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_close_runs_closer_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let (_tx, rx) = Feed::channel();
        let mut feed = Feed::from_parts(rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(feed.is_open());
        assert!(feed.close());
        assert!(!feed.close());
        assert!(!feed.is_open());
        drop(feed);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_closes() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let (_tx, rx) = Feed::channel();
        let feed = Feed::from_parts(rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(feed);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_connect_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let res = Feed::connect(&format!("ws://127.0.0.1:{}/ws", port));
        assert!(matches!(res, Err(ConnectError::Io(_))));
    }

    #[test]
    fn test_connect_silent_server_times_out() {
        // Accepted by the kernel backlog, never answered.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("ws://{}/ws", listener.local_addr().unwrap());
        let start = Instant::now();
        let res = Feed::connect(&endpoint);
        assert!(matches!(res, Err(ConnectError::Io(_))));
        assert!(start.elapsed() < util::CONNECT_TIMEOUT * 2);
        drop(listener);
    }

    #[test]
    fn test_close_reason_display() {
        let r = CloseReason::Remote {
            code: 1000,
            reason: "bye".to_string(),
        };
        assert_eq!(r.to_string(), "closed by peer (1000: bye)");
        assert_eq!(CloseReason::Local.to_string(), "closed locally");
    }
}
