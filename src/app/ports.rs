//! Port traits: the hexagonal boundary between the sequencer and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ SequencerService (domain)
//! ```
//!
//! Driven adapters (transport stack, log sink, config store, clock)
//! implement these traits.  The [`SequencerService`](super::service::SequencerService)
//! consumes them via generics, so the domain core never touches a socket
//! or a radio directly.
//!
//! ## Delivery model
//!
//! Every [`TransportPort`] call is fire-and-forget.  The `Result` only says
//! whether the request was *submitted*; the outcome arrives later as an
//! independent [`Delivery`](super::inbound::Delivery) on the sequencer's
//! single execution context.

use crate::config::SequencerConfig;
use crate::error::TransportError;
use crate::registry::PeerId;
use crate::resource::{Representation, ResourceHandle, Transport};

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain → resource stack)
// ───────────────────────────────────────────────────────────────

/// Request-side port of the resource stack.
pub trait TransportPort {
    /// Multicast discovery on a transport.  Results arrive as
    /// [`Delivery::Discovered`](super::inbound::Delivery::Discovered).
    fn discover_multicast(&mut self, transport: Transport) -> Result<(), TransportError>;

    /// Unicast discovery scoped to one host (a radio peer identifier).
    fn discover_unicast(
        &mut self,
        transport: Transport,
        peer: &PeerId,
    ) -> Result<(), TransportError>;

    /// Read the resource's current representation.
    fn get(&mut self, handle: &ResourceHandle) -> Result<(), TransportError>;

    /// Subscribe to change notifications until [`cancel_observe`](Self::cancel_observe).
    fn observe(&mut self, handle: &ResourceHandle) -> Result<(), TransportError>;

    /// Stop an observation started with [`observe`](Self::observe).
    fn cancel_observe(&mut self, handle: &ResourceHandle) -> Result<(), TransportError>;

    /// Write attributes to the resource.
    fn put(
        &mut self,
        handle: &ResourceHandle,
        attributes: &Representation,
    ) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → log / text view)
// ───────────────────────────────────────────────────────────────

/// The domain emits one [`AppEvent`](super::events::AppEvent) per
/// user-visible line.  Adapters decide where it goes (serial log, an
/// on-screen text view, a test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Time port (driven adapter: monotonic clock)
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds used to stamp deliveries and fire timers.
pub trait TimePort {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists sequencer configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// values with [`ConfigError::ValidationFailed`] instead of clamping.
pub trait ConfigPort {
    /// Load configuration.
    /// Returns [`SequencerConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SequencerConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SequencerConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed to deserialise.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
