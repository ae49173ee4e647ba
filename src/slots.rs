//! Typed slot map keyed by transport.
//!
//! One [`Slot`] per [`Transport`], stored in a fixed array indexed by
//! `Transport::index()`.  Every delivery is routed through
//! [`SlotMap::get_mut`] with the transport tag it carries, so a delivery
//! for one transport can never reach the other transport's state.

use crate::fsm::context::SlotContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{InteractionState, SlotFsm};
use crate::resource::Transport;

/// Per-transport unit of state: handle, interaction state, cycle data.
pub struct Slot {
    pub transport: Transport,
    pub fsm: SlotFsm,
    pub ctx: SlotContext,
}

impl Slot {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            fsm: SlotFsm::new(build_state_table(), transport),
            ctx: SlotContext::new(),
        }
    }

    pub fn state(&self) -> InteractionState {
        self.fsm.current_state()
    }
}

pub struct SlotMap {
    slots: [Slot; Transport::COUNT],
}

impl Default for SlotMap {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotMap {
    pub fn new() -> Self {
        Self {
            slots: Transport::ALL.map(Slot::new),
        }
    }

    pub fn get(&self, transport: Transport) -> &Slot {
        &self.slots[transport.index()]
    }

    pub fn get_mut(&mut self, transport: Transport) -> &mut Slot {
        &mut self.slots[transport.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }
}
