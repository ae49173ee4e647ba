//! Inbound deliveries to the sequencer.
//!
//! Every asynchronous callback of the resource stack and every radio scan
//! result is turned into one of these values by an adapter and queued onto
//! the sequencer's single execution context.  Handlers never close over
//! sequencer state; the [`SequencerService`](super::service::SequencerService)
//! owns all slot state and interprets each delivery in arrival order.

use crate::registry::PeerSighting;
use crate::resource::{ResourceHandle, RepresentationSnapshot};

/// Asynchronous results that adapters feed into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Discovery completed with zero or more candidates.
    Discovered(Vec<ResourceHandle>),

    /// Result of a GET.
    Get(RepresentationSnapshot),

    /// One notification of an active observation.
    Observe(RepresentationSnapshot),

    /// Result of a PUT.
    Put(RepresentationSnapshot),

    /// The radio scanner saw an advertising peer.
    PeerSighted(PeerSighting),
}
