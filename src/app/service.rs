//! Sequencer service: the hexagonal core.
//!
//! [`SequencerService`] owns both transport slots, the timer queue and the
//! radio peer registry.  It is driven entirely by inbound
//! [`Delivery`] values and by [`tick`](SequencerService::tick); all I/O
//! flows through port traits injected at call sites, so the whole service
//! runs against mock adapters in tests.
//!
//! ```text
//!  Delivery ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!               │       SequencerService        │
//!  tick(now) ──▶│ SlotMap · TimerQueue · Peers  │ ──▶ TransportPort
//!               └──────────────────────────────┘
//! ```
//!
//! One interaction cycle per slot:
//!
//! ```text
//!  discovered ─▶ GET ─ok(v)─▶ OBSERVE ─┬─ +put_delay ──────▶ PUT(!v) ─▶ put result
//!                                      └─ +observe_window ─▶ CANCEL OBSERVE
//! ```

use log::{debug, error, info};

use crate::config::SequencerConfig;
use crate::fsm::InteractionState;
use crate::registry::{PeerRegistry, PeerSighting, SightingOutcome};
use crate::resource::{Representation, RepresentationSnapshot, ResourceHandle, Transport};
use crate::slots::{Slot, SlotMap};
use crate::timers::{TimerAction, TimerQueue};

use super::events::{AppEvent, Operation};
use super::inbound::Delivery;
use super::ports::{ConfigError, EventSink, TransportPort};

// ───────────────────────────────────────────────────────────────
// SequencerService
// ───────────────────────────────────────────────────────────────

pub struct SequencerService {
    config: SequencerConfig,
    slots: SlotMap,
    peers: PeerRegistry,
    timers: TimerQueue,
}

impl SequencerService {
    /// Construct the service.  Nothing is issued until [`start`](Self::start).
    ///
    /// The config is validated first: with a PUT delay outside the
    /// observation window a cycle would close before its write.
    pub fn new(config: SequencerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            slots: SlotMap::new(),
            peers: PeerRegistry::new(),
            timers: TimerQueue::new(),
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Kick off multicast discovery on the IP transport.
    ///
    /// Radio discovery is unicast only and follows peer sightings.
    pub fn start(&mut self, net: &mut impl TransportPort, sink: &mut impl EventSink) {
        info!(
            "SequencerService started (target={}, attr={})",
            self.config.target_resource_type, self.config.target_attribute
        );
        sink.emit(&AppEvent::DiscoveryStarted {
            transport: Transport::Ip,
            peer: None,
        });
        if let Err(error) = net.discover_multicast(Transport::Ip) {
            sink.emit(&AppEvent::RequestFailed {
                transport: Transport::Ip,
                op: Operation::Discover,
                error,
            });
        }
    }

    /// Route one inbound delivery to its handler.
    pub fn handle(
        &mut self,
        delivery: Delivery,
        now_ms: u64,
        net: &mut impl TransportPort,
        sink: &mut impl EventSink,
    ) {
        match delivery {
            Delivery::Discovered(candidates) => self.on_discovered(candidates, net, sink),
            Delivery::Get(snapshot) => self.on_get_result(&snapshot, now_ms, net, sink),
            Delivery::Observe(snapshot) => self.on_observe_result(&snapshot, sink),
            Delivery::Put(snapshot) => self.on_put_result(&snapshot, sink),
            Delivery::PeerSighted(sighting) => self.on_peer_sighted(&sighting, now_ms, net, sink),
        }
    }

    /// Fire every timer due at `now_ms`.  Returns how many fired.
    pub fn tick(
        &mut self,
        now_ms: u64,
        net: &mut impl TransportPort,
        sink: &mut impl EventSink,
    ) -> usize {
        let mut fired = 0;
        while let Some(timer) = self.timers.pop_due(now_ms) {
            fired += 1;
            debug!(
                "[{}] timer {} due t={}ms fired t={}ms",
                timer.transport,
                timer.action.label(),
                timer.deadline_ms,
                now_ms
            );
            match timer.action {
                TimerAction::CancelObserve => {
                    self.on_cancel_observe_deadline(timer.transport, timer.generation, net, sink)
                }
                TimerAction::Put { value } => {
                    self.on_put_deadline(timer.transport, timer.generation, value, net, sink)
                }
            }
        }
        fired
    }

    // ── Discovery ─────────────────────────────────────────────

    /// Assign every candidate declaring the target type to its transport's
    /// slot and issue a GET against it.
    pub fn on_discovered(
        &mut self,
        candidates: Vec<ResourceHandle>,
        net: &mut impl TransportPort,
        sink: &mut impl EventSink,
    ) {
        sink.emit(&AppEvent::ResourcesDiscovered {
            count: candidates.len(),
        });
        for candidate in candidates {
            sink.emit(&AppEvent::ResourceListed {
                transport: candidate.transport,
                description: candidate.to_string(),
            });
            if !candidate.has_type(&self.config.target_resource_type) {
                sink.emit(&AppEvent::CandidateIgnored {
                    transport: candidate.transport,
                    uri: candidate.uri,
                });
                continue;
            }
            self.assign(candidate, net, sink);
        }
    }

    /// Make `handle` the active handle of its slot and begin a cycle.
    fn assign(
        &mut self,
        handle: ResourceHandle,
        net: &mut impl TransportPort,
        sink: &mut impl EventSink,
    ) {
        let transport = handle.transport;
        let slot = self.slots.get_mut(transport);

        // Orphaned observation on the handle being replaced.
        if slot.ctx.observing {
            if let Some(old) = slot.ctx.handle.as_ref() {
                if let Err(error) = net.cancel_observe(old) {
                    sink.emit(&AppEvent::RequestFailed {
                        transport,
                        op: Operation::CancelObserve,
                        error,
                    });
                }
            }
        }

        let uri = handle.uri.clone();
        if let Some(previous) = slot.ctx.replace_handle(handle) {
            let discarded_timers = self.timers.discard_stale(transport, slot.ctx.generation);
            sink.emit(&AppEvent::HandleSuperseded {
                transport,
                previous: format!("{}{} {}", previous.host, previous.uri, previous.id),
                discarded_timers,
            });
            slot.fsm.reset(&mut slot.ctx);
        }

        sink.emit(&AppEvent::SwitchFound { transport, uri });
        if !advance(slot, InteractionState::AwaitingGet) {
            return;
        }
        if let Some(active) = slot.ctx.handle.as_ref() {
            if let Err(error) = net.get(active) {
                sink.emit(&AppEvent::RequestFailed {
                    transport,
                    op: Operation::Get,
                    error,
                });
            }
        }
    }

    // ── Interaction results ───────────────────────────────────

    /// GET completion: on a boolean value start observing and schedule
    /// the delayed PUT and the observation cut-off.
    pub fn on_get_result(
        &mut self,
        snapshot: &RepresentationSnapshot,
        now_ms: u64,
        net: &mut impl TransportPort,
        sink: &mut impl EventSink,
    ) {
        let transport = snapshot.transport;
        let slot = self.slots.get_mut(transport);
        if !accept(slot, snapshot, Operation::Get, sink) {
            return;
        }
        if slot.state() != InteractionState::AwaitingGet {
            sink.emit(&AppEvent::UnexpectedDelivery {
                transport,
                op: Operation::Get,
                state: slot.state(),
            });
            return;
        }
        if snapshot.result.is_error() {
            sink.emit(&AppEvent::GetFailed {
                transport,
                code: snapshot.result,
            });
            return;
        }
        let value = match snapshot.bool_attr(&self.config.target_attribute) {
            Ok(value) => value,
            Err(reason) => {
                sink.emit(&AppEvent::ValueMissing {
                    transport,
                    op: Operation::Get,
                    attribute: self.config.target_attribute.clone(),
                    reason,
                });
                return;
            }
        };
        sink.emit(&AppEvent::GotValue { transport, value });
        slot.ctx.captured_value = Some(value);

        let Some(handle) = slot.ctx.handle.as_ref() else {
            return;
        };
        sink.emit(&AppEvent::ObserveStarted { transport });
        if let Err(error) = net.observe(handle) {
            sink.emit(&AppEvent::RequestFailed {
                transport,
                op: Operation::Observe,
                error,
            });
            return;
        }

        let generation = slot.ctx.generation;
        let deferred = [
            (TimerAction::Put { value: !value }, self.config.put_delay_ms),
            (TimerAction::CancelObserve, self.config.observe_window_ms),
        ];
        for (action, delay_ms) in deferred {
            if let Err(error) = self
                .timers
                .schedule(transport, generation, action, now_ms, delay_ms)
            {
                sink.emit(&AppEvent::TimerFailed { transport, error });
            }
        }

        slot.ctx.observing = true;
        advance(slot, InteractionState::Observing);
    }

    /// One observation notification.  Errors are reported and the
    /// observation carries on.
    pub fn on_observe_result(
        &mut self,
        snapshot: &RepresentationSnapshot,
        sink: &mut impl EventSink,
    ) {
        let transport = snapshot.transport;
        let slot = self.slots.get_mut(transport);
        if !accept(slot, snapshot, Operation::Observe, sink) {
            return;
        }
        if !slot.state().accepts_observe() || !slot.ctx.observing {
            sink.emit(&AppEvent::UnexpectedDelivery {
                transport,
                op: Operation::Observe,
                state: slot.state(),
            });
            return;
        }
        slot.ctx.observe_deliveries = slot.ctx.observe_deliveries.saturating_add(1);

        if snapshot.result.is_error() {
            sink.emit(&AppEvent::ObserveFailed {
                transport,
                code: snapshot.result,
            });
            return;
        }
        match snapshot.bool_attr(&self.config.target_attribute) {
            Ok(value) => sink.emit(&AppEvent::ObservedValue { transport, value }),
            Err(reason) => sink.emit(&AppEvent::ValueMissing {
                transport,
                op: Operation::Observe,
                attribute: self.config.target_attribute.clone(),
                reason,
            }),
        }
    }

    /// PUT completion.  Back to `Observing` while the window is open,
    /// otherwise the cycle is over.
    pub fn on_put_result(&mut self, snapshot: &RepresentationSnapshot, sink: &mut impl EventSink) {
        let transport = snapshot.transport;
        let slot = self.slots.get_mut(transport);
        if !accept(slot, snapshot, Operation::Put, sink) {
            return;
        }
        if slot.state() != InteractionState::AwaitingPutResult {
            sink.emit(&AppEvent::UnexpectedDelivery {
                transport,
                op: Operation::Put,
                state: slot.state(),
            });
            return;
        }
        if snapshot.result.is_error() {
            sink.emit(&AppEvent::PutFailed {
                transport,
                code: snapshot.result,
            });
        } else {
            sink.emit(&AppEvent::PutSucceeded { transport });
        }
        let next = if slot.ctx.observing {
            InteractionState::Observing
        } else {
            InteractionState::Idle
        };
        advance(slot, next);
    }

    // ── Deadlines ─────────────────────────────────────────────

    /// Close the observation window of `transport`.
    pub fn on_cancel_observe_deadline(
        &mut self,
        transport: Transport,
        generation: u32,
        net: &mut impl TransportPort,
        sink: &mut impl EventSink,
    ) {
        let slot = self.slots.get_mut(transport);
        if generation != slot.ctx.generation {
            sink.emit(&AppEvent::StaleTimer {
                transport,
                action: TimerAction::CancelObserve.label(),
            });
            return;
        }
        if !slot.ctx.observing {
            sink.emit(&AppEvent::DeadlineSkipped {
                transport,
                action: TimerAction::CancelObserve.label(),
                state: slot.state(),
            });
            return;
        }
        let Some(handle) = slot.ctx.handle.as_ref() else {
            return;
        };
        sink.emit(&AppEvent::ObserveCancelling { transport });
        if let Err(error) = net.cancel_observe(handle) {
            sink.emit(&AppEvent::RequestFailed {
                transport,
                op: Operation::CancelObserve,
                error,
            });
            return;
        }
        slot.ctx.observing = false;
        // With a PUT still outstanding its result closes the cycle.
        if slot.state() == InteractionState::Observing {
            advance(slot, InteractionState::Idle);
        }
    }

    /// Write `value` (the negated GET read) to the slot's resource.
    pub fn on_put_deadline(
        &mut self,
        transport: Transport,
        generation: u32,
        value: bool,
        net: &mut impl TransportPort,
        sink: &mut impl EventSink,
    ) {
        let slot = self.slots.get_mut(transport);
        if generation != slot.ctx.generation {
            sink.emit(&AppEvent::StaleTimer {
                transport,
                action: TimerAction::Put { value }.label(),
            });
            return;
        }
        if slot.state() != InteractionState::Observing {
            sink.emit(&AppEvent::DeadlineSkipped {
                transport,
                action: TimerAction::Put { value }.label(),
                state: slot.state(),
            });
            return;
        }
        let Some(handle) = slot.ctx.handle.as_ref() else {
            return;
        };
        sink.emit(&AppEvent::Putting { transport, value });
        let attributes = Representation::single_bool(&self.config.target_attribute, value);
        if let Err(error) = net.put(handle, &attributes) {
            sink.emit(&AppEvent::RequestFailed {
                transport,
                op: Operation::Put,
                error,
            });
            return;
        }
        advance(slot, InteractionState::AwaitingPutResult);
    }

    // ── Radio peers ───────────────────────────────────────────

    /// First sighting of a peer advertising the stack service triggers a
    /// unicast discovery scoped to it.
    pub fn on_peer_sighted(
        &mut self,
        sighting: &PeerSighting,
        now_ms: u64,
        net: &mut impl TransportPort,
        sink: &mut impl EventSink,
    ) {
        if !sighting.advertises(&self.config.radio_service_uuid) {
            sink.emit(&AppEvent::PeerIgnored {
                peer: sighting.peer.clone(),
            });
            return;
        }
        match self.peers.record(sighting, now_ms) {
            Ok(SightingOutcome::New { evicted }) => {
                if let Some(peer) = evicted {
                    sink.emit(&AppEvent::PeerEvicted { peer });
                }
                sink.emit(&AppEvent::PeerFound {
                    peer: sighting.peer.clone(),
                    name: sighting.name.clone(),
                });
                sink.emit(&AppEvent::DiscoveryStarted {
                    transport: Transport::Radio,
                    peer: Some(sighting.peer.clone()),
                });
                if let Err(error) = net.discover_unicast(Transport::Radio, &sighting.peer) {
                    sink.emit(&AppEvent::RequestFailed {
                        transport: Transport::Radio,
                        op: Operation::Discover,
                        error,
                    });
                }
            }
            Ok(SightingOutcome::Known) => {
                debug!("Peer {} seen again", sighting.peer);
            }
            Err(error) => sink.emit(&AppEvent::RegistryFailed { error }),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self, transport: Transport) -> InteractionState {
        self.slots.get(transport).state()
    }

    pub fn active_handle(&self, transport: Transport) -> Option<&ResourceHandle> {
        self.slots.get(transport).ctx.handle.as_ref()
    }

    pub fn slot(&self, transport: Transport) -> &Slot {
        self.slots.get(transport)
    }

    /// Timers not yet fired, across both slots.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }
}

// ───────────────────────────────────────────────────────────────
// Helpers
// ───────────────────────────────────────────────────────────────

/// Drop snapshots from anything but the slot's active handle.
fn accept(
    slot: &Slot,
    snapshot: &RepresentationSnapshot,
    op: Operation,
    sink: &mut impl EventSink,
) -> bool {
    if slot.ctx.is_active(snapshot.handle) {
        return true;
    }
    sink.emit(&AppEvent::StaleDelivery {
        transport: slot.transport,
        op,
        handle: snapshot.handle,
    });
    false
}

/// Request a table transition, reporting a rejected one.
fn advance(slot: &mut Slot, next: InteractionState) -> bool {
    match slot.fsm.transition(next, &mut slot.ctx) {
        Ok(()) => true,
        Err(e) => {
            error!("[{}] {}", slot.transport, e);
            false
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
