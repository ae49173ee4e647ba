//! Concrete state actions and table builder.
//!
//! Each state is defined by plain `fn` pointers and a static successor
//! list: no closures, no dynamic dispatch.
//!
//! ```text
//!  IDLE ──[discovered]──▶ AWAITING_GET ──[GET ok + value]──▶ OBSERVING
//!    ▲                                                        │    ▲
//!    │                                              [put deadline] │
//!    │                                                        ▼    │
//!    ├──────────[window closed]────────────── AWAITING_PUT_RESULT ─┘
//!    │                                           [put result, window open]
//!    └──[window closed]── OBSERVING
//!
//!  Any state ──[handle superseded]──▶ IDLE (reset)
//! ```

use super::context::SlotContext;
use super::{InteractionState, StateDescriptor};

const FROM_IDLE: &[InteractionState] = &[InteractionState::AwaitingGet];
const FROM_AWAITING_GET: &[InteractionState] = &[InteractionState::Observing];
const FROM_OBSERVING: &[InteractionState] = &[
    InteractionState::AwaitingPutResult,
    InteractionState::Idle,
];
const FROM_AWAITING_PUT: &[InteractionState] =
    &[InteractionState::Observing, InteractionState::Idle];

/// Build the static state table.
pub fn build_state_table() -> [StateDescriptor; InteractionState::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: InteractionState::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            successors: FROM_IDLE,
        },
        // Index 1: AwaitingGet
        StateDescriptor {
            id: InteractionState::AwaitingGet,
            name: "AwaitingGet",
            on_enter: Some(awaiting_get_enter),
            successors: FROM_AWAITING_GET,
        },
        // Index 2: Observing
        StateDescriptor {
            id: InteractionState::Observing,
            name: "Observing",
            on_enter: None,
            successors: FROM_OBSERVING,
        },
        // Index 3: AwaitingPutResult
        StateDescriptor {
            id: InteractionState::AwaitingPutResult,
            name: "AwaitingPutResult",
            on_enter: Some(awaiting_put_enter),
            successors: FROM_AWAITING_PUT,
        },
    ]
}

fn idle_enter(ctx: &mut SlotContext) {
    ctx.captured_value = None;
    ctx.observing = false;
}

fn awaiting_get_enter(ctx: &mut SlotContext) {
    ctx.cycles = ctx.cycles.saturating_add(1);
    ctx.captured_value = None;
    ctx.observe_deliveries = 0;
}

fn awaiting_put_enter(ctx: &mut SlotContext) {
    ctx.puts_issued = ctx.puts_issued.saturating_add(1);
}
