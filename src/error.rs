//! Unified error types for the switch sequencer.
//!
//! A single `Error` enum that every subsystem can convert into.  Inside the
//! sequencer these never propagate: each one is turned into a log line and
//! the current step stalls.  The binary surfaces them through `anyhow`.
//! All variants are `Copy` so they can be carried inside log events.

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A request could not be handed to the transport stack.
    Transport(TransportError),
    /// The peer registry rejected an update.
    Registry(RegistryError),
    /// The timer queue rejected a schedule.
    Timer(TimerError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::Timer(e) => write!(f, "timer: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Transport submission errors
// ---------------------------------------------------------------------------

/// Failure to *submit* a request.  Results of submitted requests come back
/// asynchronously as snapshots with a [`ResultCode`](crate::resource::ResultCode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The request queue towards the stack is full.
    QueueFull,
    /// The adapter for this transport is not running.
    AdapterDown,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "request queue full"),
            Self::AdapterDown => write!(f, "adapter not running"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Peer registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Peer identifier longer than the fixed-capacity key.
    PeerIdTooLong,
    /// Registry is full and nothing could be evicted.
    Full,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerIdTooLong => write!(f, "peer identifier too long"),
            Self::Full => write!(f, "peer registry full"),
        }
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ---------------------------------------------------------------------------
// Timer errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// Every timer slot is occupied.
    QueueFull,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "timer queue full"),
        }
    }
}

impl From<TimerError> for Error {
    fn from(e: TimerError) -> Self {
        Self::Timer(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Config("I/O error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;
