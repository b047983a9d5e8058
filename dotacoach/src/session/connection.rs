//! Connection
//!
//! `Connection` owns at most one `Feed` and the session state built from
//! it. Feed events are applied one at a time, in arrival order, on the
//! thread that calls `handle`/`poll`/`next_event`: a valid frame replaces
//! the snapshot and its alerts in one assignment, a bad frame is reported
//! and dropped, and a closed socket resets the session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError, TryRecvError};
use thiserror::Error;

use super::status::SessionStatus;
use crate::data::{self, DecodeError, Snapshot};
use crate::feed::{CloseReason, ConnectError, Feed, FeedEvent};
use crate::view::{self, ViewModel};

/// Possible errors when opening a connection.
#[derive(Error, Debug)]
pub enum OpenError {
    /// Usage fault: close the current feed before opening another one.
    #[error("a feed is already open on this connection")]
    AlreadyOpen,
    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// What applying a feed event did to the session.
#[derive(Debug)]
pub enum SessionEvent {
    /// Socket established, waiting for match data.
    Connected,
    /// A new snapshot replaced the previous one.
    Snapshot(Arc<Snapshot>),
    /// A frame failed to decode and was dropped. The session is unchanged.
    FrameRejected(DecodeError),
    /// The socket closed and the session was reset.
    Disconnected(CloseReason),
}

/// Frame counters for the current feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_accepted: u64,
    pub frames_rejected: u64,
}

#[derive(Debug, Default)]
pub struct Connection {
    feed: Option<Feed>,
    status: SessionStatus,
    stats: SessionStats,
}

impl Connection {
    pub fn new() -> Connection {
        Connection::default()
    }

    /// Opens the socket to `endpoint`. Transport failures are returned and
    /// leave the connection disconnected.
    ///
    /// The status stays `Disconnected` until the feed's `Ready` event is
    /// applied, which is always the first one `poll`/`next_event` returns
    /// as `SessionEvent::Connected`.
    pub fn open(&mut self, endpoint: &str) -> Result<(), OpenError> {
        if self.is_open() {
            return Err(OpenError::AlreadyOpen);
        }
        let feed = Feed::connect(endpoint)?;
        self.attach(feed)
    }

    /// Takes ownership of an already established feed.
    pub fn attach(&mut self, feed: Feed) -> Result<(), OpenError> {
        if self.is_open() {
            return Err(OpenError::AlreadyOpen);
        }
        self.feed = Some(feed);
        self.status = SessionStatus::Disconnected;
        self.stats = SessionStats::default();
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.feed.is_some()
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// To use `crossbeam::channel::select!`. None when no feed is open.
    pub fn receiver(&self) -> Option<&channel::Receiver<FeedEvent>> {
        self.feed.as_ref().map(|feed| feed.receiver())
    }

    /// Applies one feed event. Returns None when the event had no effect,
    /// i.e. no feed is open or the socket was already reported ready.
    pub fn handle(&mut self, event: FeedEvent) -> Option<SessionEvent> {
        if !self.is_open() {
            return None;
        }
        match event {
            FeedEvent::Ready => match self.status {
                SessionStatus::Disconnected => {
                    self.status = SessionStatus::Connected;
                    Some(SessionEvent::Connected)
                }
                _ => None,
            },
            FeedEvent::Frame(raw) => match data::decode(&raw) {
                Ok(snapshot) => {
                    let alerts = data::derive(&snapshot);
                    let snapshot = Arc::new(snapshot);
                    self.status = SessionStatus::HasData {
                        snapshot: snapshot.clone(),
                        alerts,
                    };
                    self.stats.frames_accepted += 1;
                    Some(SessionEvent::Snapshot(snapshot))
                }
                Err(err) => {
                    log::warn!("dropping frame: {}", err);
                    self.stats.frames_rejected += 1;
                    Some(SessionEvent::FrameRejected(err))
                }
            },
            FeedEvent::Closed(reason) => {
                self.release();
                Some(SessionEvent::Disconnected(reason))
            }
        }
    }

    /// Applies every event queued so far, without blocking.
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        loop {
            let next = match &self.feed {
                Some(feed) => feed.receiver().try_recv(),
                None => break,
            };
            let event = match next {
                Ok(event) => event,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => feed_lost(),
            };
            if let Some(ev) = self.handle(event) {
                events.push(ev);
            }
        }
        events
    }

    /// Waits up to `timeout` for the next event that changes the session.
    pub fn next_event(&mut self, timeout: Duration) -> Option<SessionEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            let next = match &self.feed {
                Some(feed) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    feed.receiver().recv_timeout(remaining)
                }
                None => return None,
            };
            let event = match next {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => feed_lost(),
            };
            if let Some(ev) = self.handle(event) {
                return Some(ev);
            }
        }
    }

    /// Releases the socket, if any, and resets the session. Safe to call
    /// repeatedly; returns whether a socket was released.
    pub fn close(&mut self) -> bool {
        let released = self.release();
        if released {
            log::info!("session closed");
        }
        released
    }

    /// Presentation of the current session state.
    pub fn view(&self) -> ViewModel {
        view::present(&self.status)
    }

    fn release(&mut self) -> bool {
        self.status = SessionStatus::Disconnected;
        match self.feed.take() {
            Some(mut feed) => feed.close(),
            None => false,
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

fn feed_lost() -> FeedEvent {
    FeedEvent::Closed(CloseReason::Transport(
        "feed channel disconnected".to_string(),
    ))
}
