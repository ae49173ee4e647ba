//! Table-driven per-slot interaction state machine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  StateTable                                          │
//! │  ┌───────────────────┬───────────┬─────────────────┐ │
//! │  │ InteractionState  │ on_enter  │ successors      │ │
//! │  ├───────────────────┼───────────┼─────────────────┤ │
//! │  │ Idle              │ fn(ctx)   │ AwaitingGet     │ │
//! │  │ AwaitingGet       │ fn(ctx)   │ Observing       │ │
//! │  │ Observing         │ -         │ AwaitingPut,Idle│ │
//! │  │ AwaitingPutResult │ fn(ctx)   │ Observing,Idle  │ │
//! │  └───────────────────┴───────────┴─────────────────┘ │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Unlike a tick-driven machine, transitions here are requested by the
//! sequencer in response to deliveries and timers.  The engine checks the
//! request against the successor list of the current state, runs the
//! target's `on_enter`, and logs the move.  The only way around the
//! successor list is [`SlotFsm::reset`], used when a slot's handle is
//! superseded.

pub mod context;
pub mod states;

use core::fmt;

use context::SlotContext;
use log::info;

use crate::resource::Transport;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Interaction state of one transport slot.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InteractionState {
    Idle = 0,
    AwaitingGet = 1,
    Observing = 2,
    AwaitingPutResult = 3,
}

impl InteractionState {
    /// Total number of states, sizing the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to a state.  Out-of-range indices map to
    /// `Idle` (debug builds assert).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::AwaitingGet,
            2 => Self::Observing,
            3 => Self::AwaitingPutResult,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }

    /// Observation deliveries are accepted in these states.
    pub fn accepts_observe(self) -> bool {
        matches!(self, Self::Observing | Self::AwaitingPutResult)
    }
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "Idle",
            Self::AwaitingGet => "AwaitingGet",
            Self::Observing => "Observing",
            Self::AwaitingPutResult => "AwaitingPutResult",
        })
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` actions.
pub type StateActionFn = fn(&mut SlotContext);

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single state.
pub struct StateDescriptor {
    pub id: InteractionState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    /// States reachable from this one through a normal transition.
    pub successors: &'static [InteractionState],
}

/// A transition the table does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub from: InteractionState,
    pub to: InteractionState,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal transition {} -> {}", self.from, self.to)
    }
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct SlotFsm {
    /// Fixed-size table indexed by `InteractionState as usize`.
    table: [StateDescriptor; InteractionState::COUNT],
    current: usize,
    transport: Transport,
    /// Number of transitions taken (resets included).
    transitions: u64,
}

impl SlotFsm {
    /// Construct an FSM for `transport`, starting in `Idle`.
    pub fn new(table: [StateDescriptor; InteractionState::COUNT], transport: Transport) -> Self {
        Self {
            table,
            current: InteractionState::Idle as usize,
            transport,
            transitions: 0,
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> InteractionState {
        InteractionState::from_index(self.current)
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Whether `next` is a legal successor of the current state.
    pub fn can_transition(&self, next: InteractionState) -> bool {
        self.table[self.current].successors.contains(&next)
    }

    /// Move to `next` if the table allows it.
    pub fn transition(
        &mut self,
        next: InteractionState,
        ctx: &mut SlotContext,
    ) -> Result<(), TransitionError> {
        if !self.can_transition(next) {
            return Err(TransitionError {
                from: self.current_state(),
                to: next,
            });
        }
        self.apply(next, ctx);
        Ok(())
    }

    /// Force the slot back to `Idle` regardless of the current state.
    pub fn reset(&mut self, ctx: &mut SlotContext) {
        if self.current != InteractionState::Idle as usize {
            self.apply(InteractionState::Idle, ctx);
        }
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn apply(&mut self, next: InteractionState, ctx: &mut SlotContext) {
        let next_idx = next as usize;

        info!(
            "[{}] slot: {} -> {}",
            self.transport, self.table[self.current].name, self.table[next_idx].name
        );

        self.current = next_idx;
        self.transitions += 1;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
