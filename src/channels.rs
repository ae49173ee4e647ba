//! Inter-thread channels between the sequencer loop and the stack adapter.
//!
//! Uses `embassy-sync` bounded MPMC channels to bridge the async I/O
//! thread (simulated stack + radio scanner) with the synchronous
//! sequencer loop.  Both sides share these static channels.
//!
//! ```text
//! ┌──────────────┐   Delivery    ┌────────────────┐
//! │  I/O thread  │──────────────▶│ Sequencer loop │
//! │  (async)     │◀──────────────│ (sync)         │
//! └──────────────┘ StackRequest  └────────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::inbound::Delivery;
use crate::registry::PeerId;
use crate::resource::{Representation, ResourceHandle, Transport};

/// Outbound request from the sequencer, executed by the stack.
#[derive(Debug, Clone, PartialEq)]
pub enum StackRequest {
    DiscoverMulticast(Transport),
    DiscoverUnicast(Transport, PeerId),
    Get(ResourceHandle),
    Observe(ResourceHandle),
    CancelObserve(ResourceHandle),
    Put(ResourceHandle, Representation),
}

/// Channel depth for deliveries (observe notifications can burst).
const DELIVERY_DEPTH: usize = 32;

/// Channel depth for requests.
const REQUEST_DEPTH: usize = 16;

/// Deliveries: I/O thread → sequencer loop.
pub static DELIVERY_CHANNEL: Channel<CriticalSectionRawMutex, Delivery, DELIVERY_DEPTH> =
    Channel::new();

/// Requests: sequencer loop → I/O thread.
pub static REQUEST_CHANNEL: Channel<CriticalSectionRawMutex, StackRequest, REQUEST_DEPTH> =
    Channel::new();

/// Queue a delivery for the sequencer loop.  Dropped with a warning when
/// the loop has fallen behind.
pub fn post_delivery(delivery: Delivery) {
    if DELIVERY_CHANNEL.try_send(delivery).is_err() {
        warn!("IO: delivery channel full, dropping delivery");
    }
}

/// Try to receive the next delivery on the sequencer loop.
pub fn try_recv_delivery() -> Option<Delivery> {
    DELIVERY_CHANNEL.try_receive().ok()
}
