//! Per-slot context threaded through every state action.
//!
//! `SlotContext` is the bookkeeping a transport slot carries besides its
//! state: the active handle and its generation, the boolean captured by
//! the GET that opened the cycle, and observation counters.

use crate::resource::ResourceHandle;

#[derive(Debug, Clone, Default)]
pub struct SlotContext {
    // -- Handle --
    /// The single active handle for this transport, if any.
    pub handle: Option<ResourceHandle>,
    /// Bumped every time a new handle is assigned.  Timers compare against
    /// it to detect supersession.
    pub generation: u32,

    // -- Current cycle --
    /// Value read by the GET that began the current cycle.
    pub captured_value: Option<bool>,
    /// An OBSERVE is active on `handle`.
    pub observing: bool,
    /// Notifications received during the current observation.
    pub observe_deliveries: u32,

    // -- Lifetime --
    /// Interaction cycles begun on this slot.
    pub cycles: u32,
    /// PUTs issued on this slot.
    pub puts_issued: u32,
}

impl SlotContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a new handle, returning the one it replaces.
    pub fn replace_handle(&mut self, handle: ResourceHandle) -> Option<ResourceHandle> {
        self.generation = self.generation.wrapping_add(1);
        self.handle.replace(handle)
    }

    /// Whether `id` is the active handle.
    pub fn is_active(&self, id: crate::resource::HandleId) -> bool {
        self.handle.as_ref().is_some_and(|h| h.id == id)
    }
}
