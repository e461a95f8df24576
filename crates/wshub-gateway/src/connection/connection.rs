//! Individual WebSocket connection
//!
//! A [`Connection`] is the registry-owned record for one accepted socket. It
//! holds the transport handle (outbound queue plus close token) and the
//! liveness flag driven by the liveness monitor.

use crate::protocol::ServerMessage;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Frame queued for the socket writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// Serialized JSON text frame
    Text(String),
    /// Liveness probe (WebSocket ping)
    Ping,
}

/// Liveness state as seen by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Responded since the last probe
    Alive,
    /// Probe sent, no pong yet
    PendingProbe,
}

/// Per-connection send failures
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("connection is closed")]
    Closed,

    #[error("outbound queue is full")]
    QueueFull,

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<mpsc::error::TrySendError<OutboundFrame>> for SendError {
    fn from(err: mpsc::error::TrySendError<OutboundFrame>) -> Self {
        match err {
            mpsc::error::TrySendError::Full(_) => Self::QueueFull,
            mpsc::error::TrySendError::Closed(_) => Self::Closed,
        }
    }
}

/// Sending half of a socket: handed to the registry on accept
#[derive(Debug)]
pub struct Transport {
    sender: mpsc::Sender<OutboundFrame>,
    close_token: CancellationToken,
}

/// Receiving half of a socket: drained by the socket's writer task
#[derive(Debug)]
pub struct OutboundQueue {
    /// Frames to write, in send order
    pub receiver: mpsc::Receiver<OutboundFrame>,
    /// Cancelled when the connection must close
    pub close_token: CancellationToken,
}

impl Transport {
    /// Create a transport and its outbound queue with the given capacity
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, OutboundQueue) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let close_token = CancellationToken::new();

        let transport = Self {
            sender,
            close_token: close_token.clone(),
        };
        let queue = OutboundQueue {
            receiver,
            close_token,
        };

        (transport, queue)
    }
}

/// A single registered connection
pub struct Connection {
    /// Unique client id
    id: String,

    /// Transport handle
    transport: Transport,

    /// Whether a pong arrived since the last probe
    alive: AtomicBool,

    /// Frames that could not be queued
    dropped_frames: AtomicU64,

    /// Connection creation time
    connected_at: Instant,
}

impl Connection {
    pub(crate) fn new(id: String, transport: Transport) -> Self {
        Self {
            id,
            transport,
            alive: AtomicBool::new(true),
            dropped_frames: AtomicU64::new(0),
            connected_at: Instant::now(),
        }
    }

    /// Get the client id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the transport is open (not closing and writer still attached)
    pub fn is_open(&self) -> bool {
        !self.transport.close_token.is_cancelled() && !self.transport.sender.is_closed()
    }

    /// Serialize and queue a message
    pub fn send(&self, message: &ServerMessage) -> Result<(), SendError> {
        let json = message.to_json()?;
        self.send_text(json)
    }

    /// Queue an already serialized text frame
    pub fn send_text(&self, text: String) -> Result<(), SendError> {
        self.push(OutboundFrame::Text(text))
    }

    /// Queue a liveness probe
    pub fn probe(&self) -> Result<(), SendError> {
        self.push(OutboundFrame::Ping)
    }

    fn push(&self, frame: OutboundFrame) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::Closed);
        }

        self.transport.sender.try_send(frame).map_err(|e| {
            self.dropped_frames.fetch_add(1, Ordering::Relaxed);
            SendError::from(e)
        })
    }

    /// Ask the socket task to close the transport
    ///
    /// Safe to call more than once.
    pub fn close(&self) {
        self.transport.close_token.cancel();
    }

    /// Current liveness state
    pub fn liveness(&self) -> Liveness {
        if self.alive.load(Ordering::Acquire) {
            Liveness::Alive
        } else {
            Liveness::PendingProbe
        }
    }

    /// Record a probe response; a no-op when already alive
    pub fn record_pong(&self) {
        self.alive.store(true, Ordering::Release);
    }

    /// Move to `PendingProbe`, returning the state before the transition
    pub(crate) fn begin_probe(&self) -> Liveness {
        if self.alive.swap(false, Ordering::AcqRel) {
            Liveness::Alive
        } else {
            Liveness::PendingProbe
        }
    }

    /// Number of frames dropped because the queue was full or closed
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Get connection age
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .field("liveness", &self.liveness())
            .field("connected_at", &self.connected_at)
            .finish()
    }
}
