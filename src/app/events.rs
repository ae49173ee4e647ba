//! Outbound application events.
//!
//! The [`SequencerService`](super::service::SequencerService) emits exactly
//! one of these per user-visible log line through the
//! [`EventSink`](super::ports::EventSink) port.  Each event optionally
//! carries the transport it concerns; the sink decides how to render the
//! tag (the log adapter prefixes `IP: ` / `BLE: `).

use core::fmt;

use log::Level;

use crate::error::{RegistryError, TimerError, TransportError};
use crate::fsm::InteractionState;
use crate::registry::{PeerId, PeerName};
use crate::resource::{AttrLookupError, HandleId, ResultCode, Transport};

/// Protocol operation an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Discover,
    Get,
    Observe,
    CancelObserve,
    Put,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Discover => "DISCOVER",
            Self::Get => "GET",
            Self::Observe => "OBSERVE",
            Self::CancelObserve => "CANCEL OBSERVE",
            Self::Put => "PUT",
        })
    }
}

/// Structured events emitted by the sequencer, one per log line.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    // ── Discovery ─────────────────────────────────────────
    /// Discovery was requested (multicast, or unicast to a peer).
    DiscoveryStarted {
        transport: Transport,
        peer: Option<PeerId>,
    },
    /// A discovery completion arrived with `count` candidates.
    ResourcesDiscovered { count: usize },
    /// One discovered candidate, described.
    ResourceListed {
        transport: Transport,
        description: String,
    },
    /// Candidate lacks the target capability.
    CandidateIgnored { transport: Transport, uri: String },
    /// Candidate matches; a GET is being issued.
    SwitchFound { transport: Transport, uri: String },
    /// A new handle replaced the slot's previous one.
    HandleSuperseded {
        transport: Transport,
        previous: String,
        discarded_timers: usize,
    },

    // ── Interaction ───────────────────────────────────────
    GetFailed { transport: Transport, code: ResultCode },
    GotValue { transport: Transport, value: bool },
    ObserveStarted { transport: Transport },
    ObserveFailed { transport: Transport, code: ResultCode },
    ObservedValue { transport: Transport, value: bool },
    ObserveCancelling { transport: Transport },
    Putting { transport: Transport, value: bool },
    PutFailed { transport: Transport, code: ResultCode },
    PutSucceeded { transport: Transport },
    /// A success snapshot without the expected boolean.
    ValueMissing {
        transport: Transport,
        op: Operation,
        attribute: String,
        reason: AttrLookupError,
    },

    // ── Local failures ────────────────────────────────────
    /// A request could not be submitted to the stack.
    RequestFailed {
        transport: Transport,
        op: Operation,
        error: TransportError,
    },
    /// A deferred action could not be scheduled.
    TimerFailed { transport: Transport, error: TimerError },

    // ── Ignored input ─────────────────────────────────────
    /// A timer fired for a handle that is no longer active.
    StaleTimer {
        transport: Transport,
        action: &'static str,
    },
    /// A delivery came from a superseded handle.
    StaleDelivery {
        transport: Transport,
        op: Operation,
        handle: HandleId,
    },
    /// A delivery arrived in a state that does not expect it.
    UnexpectedDelivery {
        transport: Transport,
        op: Operation,
        state: InteractionState,
    },
    /// A current timer fired but the slot has nothing for it to do.
    DeadlineSkipped {
        transport: Transport,
        action: &'static str,
        state: InteractionState,
    },

    // ── Radio peers ───────────────────────────────────────
    PeerFound {
        peer: PeerId,
        name: Option<PeerName>,
    },
    PeerIgnored { peer: PeerId },
    PeerEvicted { peer: PeerId },
    RegistryFailed { error: RegistryError },
}

impl AppEvent {
    /// Transport tag for the log line, if the event concerns one.
    pub fn transport(&self) -> Option<Transport> {
        match self {
            Self::DiscoveryStarted { transport, .. }
            | Self::ResourceListed { transport, .. }
            | Self::CandidateIgnored { transport, .. }
            | Self::SwitchFound { transport, .. }
            | Self::HandleSuperseded { transport, .. }
            | Self::GetFailed { transport, .. }
            | Self::GotValue { transport, .. }
            | Self::ObserveStarted { transport }
            | Self::ObserveFailed { transport, .. }
            | Self::ObservedValue { transport, .. }
            | Self::ObserveCancelling { transport }
            | Self::Putting { transport, .. }
            | Self::PutFailed { transport, .. }
            | Self::PutSucceeded { transport }
            | Self::ValueMissing { transport, .. }
            | Self::RequestFailed { transport, .. }
            | Self::TimerFailed { transport, .. }
            | Self::StaleTimer { transport, .. }
            | Self::StaleDelivery { transport, .. }
            | Self::UnexpectedDelivery { transport, .. }
            | Self::DeadlineSkipped { transport, .. } => Some(*transport),
            Self::ResourcesDiscovered { .. }
            | Self::PeerFound { .. }
            | Self::PeerIgnored { .. }
            | Self::PeerEvicted { .. }
            | Self::RegistryFailed { .. } => None,
        }
    }

    /// Whether the line reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::GetFailed { .. }
                | Self::ObserveFailed { .. }
                | Self::PutFailed { .. }
                | Self::ValueMissing { .. }
                | Self::RequestFailed { .. }
                | Self::TimerFailed { .. }
                | Self::RegistryFailed { .. }
        )
    }

    /// Severity the log adapter renders the line at.
    pub fn level(&self) -> Level {
        if self.is_error() {
            Level::Warn
        } else if matches!(
            self,
            Self::PeerIgnored { .. }
                | Self::StaleDelivery { .. }
                | Self::UnexpectedDelivery { .. }
                | Self::DeadlineSkipped { .. }
        ) {
            Level::Debug
        } else {
            Level::Info
        }
    }
}

impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiscoveryStarted { peer: Some(p), .. } => {
                write!(f, "Discovering resources on host {}...", p)
            }
            Self::DiscoveryStarted { peer: None, .. } => {
                write!(f, "Discovering resources (multicast)...")
            }
            Self::ResourcesDiscovered { count } => {
                write!(f, "Resources discovered! count={}", count)
            }
            Self::ResourceListed { description, .. } => f.write_str(description),
            Self::CandidateIgnored { uri, .. } => {
                write!(f, "Ignoring {}: not a binary switch", uri)
            }
            Self::SwitchFound { uri, .. } => {
                write!(f, "Found light resource {}! Getting values...", uri)
            }
            Self::HandleSuperseded {
                previous,
                discarded_timers,
                ..
            } => write!(
                f,
                "Replacing light resource {} ({} pending timer(s) dropped)",
                previous, discarded_timers
            ),
            Self::GetFailed { code, .. } => write!(f, "GET Callback - stack error: {}", code),
            Self::GotValue { value, .. } => {
                write!(f, "Got value from light resource: value={}", value)
            }
            Self::ObserveStarted { .. } => write!(f, "Observing light value..."),
            Self::ObserveFailed { code, .. } => {
                write!(f, "OBSERVE Callback - stack error: {}", code)
            }
            Self::ObservedValue { value, .. } => write!(f, "OBSERVE Callback: value={}", value),
            Self::ObserveCancelling { .. } => {
                write!(f, "Cancelling observe of the light resource.")
            }
            Self::Putting { value, .. } => {
                write!(f, "Putting value to light resource: value={}", value)
            }
            Self::PutFailed { code, .. } => write!(f, "PUT Callback - stack error: {}", code),
            Self::PutSucceeded { .. } => write!(f, "PUT Callback - Success."),
            Self::ValueMissing {
                op,
                attribute,
                reason: AttrLookupError::NoValues,
                ..
            } => write!(
                f,
                "{} Callback - representation does not contain any values (wanted \"{}\")",
                op, attribute
            ),
            Self::ValueMissing {
                op,
                attribute,
                reason: AttrLookupError::MissingAttribute,
                ..
            } => write!(
                f,
                "{} Callback - values does not contain a value with name \"{}\"",
                op, attribute
            ),
            Self::RequestFailed { op, error, .. } => {
                write!(f, "{} request not submitted: {}", op, error)
            }
            Self::TimerFailed { error, .. } => write!(f, "Could not schedule: {}", error),
            Self::StaleTimer { action, .. } => {
                write!(f, "Skipping {}: resource was replaced", action)
            }
            Self::StaleDelivery { op, handle, .. } => {
                write!(f, "Ignoring {} Callback from replaced handle {}", op, handle)
            }
            Self::UnexpectedDelivery { op, state, .. } => {
                write!(f, "Ignoring {} Callback while {}", op, state)
            }
            Self::DeadlineSkipped { action, state, .. } => {
                write!(f, "Skipping {}: nothing to do while {}", action, state)
            }
            Self::PeerFound { peer, name } => write!(
                f,
                "Peripheral found: name={}, id={}",
                name.as_ref().map_or("Unknown", |n| n.as_str()),
                peer
            ),
            Self::PeerIgnored { peer } => {
                write!(f, "Peripheral {} does not advertise the stack service", peer)
            }
            Self::PeerEvicted { peer } => write!(f, "Forgetting peripheral {}", peer),
            Self::RegistryFailed { error } => write!(f, "Peer registry: {}", error),
        }
    }
}
