//! Simulated resource stack and radio scanner.
//!
//! [`SimTransport`] implements [`TransportPort`] by queueing
//! [`StackRequest`]s on `REQUEST_CHANNEL`.  A dedicated I/O thread runs
//! the simulated [`SimWorld`] with `edge-executor` for cooperative
//! scheduling and `async-io-mini` for reactor-driven timers.  Three
//! concurrent futures:
//!
//! 1. **Requests**: truly async via `REQUEST_CHANNEL.receive().await`,
//!    answered after a fixed stack latency
//! 2. **Notify**: pushes one notification per active observation
//! 3. **Scan**: re-advertises every radio peer, as a scanner would
//!
//! ```text
//!  ┌───────────────────────────────────────────────────────┐
//!  │  I/O Thread                                           │
//!  │  ┌─────────────────────────────────────────────────┐  │
//!  │  │  edge_executor::LocalExecutor                   │  │
//!  │  │  ┌──────────┐  ┌──────────────┐  ┌───────────┐  │  │
//!  │  │  │ Requests │  │ Notify       │  │ Scan      │  │  │
//!  │  │  │ wake-on- │  │ 1s ⏱         │  │ 500ms ⏱   │  │  │
//!  │  │  │ send     │  │              │  │           │  │  │
//!  │  │  └──────────┘  └──────────────┘  └───────────┘  │  │
//!  │  └─────────────────────────────────────────────────┘  │
//!  └───────────────────────┬───────────────────────────────┘
//!                          ▼ DELIVERY_CHANNEL
//! ```
//!
//! All stack behaviour lives in [`SimWorld::execute`], which is plain
//! synchronous code and is what the tests exercise.

use core::cell::RefCell;
use core::time::Duration;
use std::rc::Rc;

use log::{debug, info};

use crate::app::inbound::Delivery;
use crate::app::ports::TransportPort;
use crate::channels::{REQUEST_CHANNEL, StackRequest, post_delivery};
use crate::config::DEFAULT_RADIO_SERVICE_UUID;
use crate::error::{RegistryError, TransportError};
use crate::registry::{PeerId, PeerSighting, peer_id, peer_name};
use crate::resource::{
    AttrValue, HandleId, Representation, RepresentationSnapshot, ResourceHandle, ResultCode,
    Transport,
};

/// Time the simulated stack takes to answer a request.
const STACK_LATENCY: Duration = Duration::from_millis(20);

/// Cadence of observation notifications.
const NOTIFY_INTERVAL: Duration = Duration::from_secs(1);

/// Cadence of radio advertisements.
const SCAN_INTERVAL: Duration = Duration::from_millis(500);

// ───────────────────────────────────────────────────────────────
// Transport port
// ───────────────────────────────────────────────────────────────

/// [`TransportPort`] that hands every request to the I/O thread.
#[derive(Default)]
pub struct SimTransport;

impl SimTransport {
    pub fn new() -> Self {
        Self
    }

    fn submit(&mut self, request: StackRequest) -> Result<(), TransportError> {
        REQUEST_CHANNEL
            .try_send(request)
            .map_err(|_| TransportError::QueueFull)
    }
}

impl TransportPort for SimTransport {
    fn discover_multicast(&mut self, transport: Transport) -> Result<(), TransportError> {
        self.submit(StackRequest::DiscoverMulticast(transport))
    }

    fn discover_unicast(&mut self, transport: Transport, peer: &PeerId) -> Result<(), TransportError> {
        self.submit(StackRequest::DiscoverUnicast(transport, peer.clone()))
    }

    fn get(&mut self, handle: &ResourceHandle) -> Result<(), TransportError> {
        self.submit(StackRequest::Get(handle.clone()))
    }

    fn observe(&mut self, handle: &ResourceHandle) -> Result<(), TransportError> {
        self.submit(StackRequest::Observe(handle.clone()))
    }

    fn cancel_observe(&mut self, handle: &ResourceHandle) -> Result<(), TransportError> {
        self.submit(StackRequest::CancelObserve(handle.clone()))
    }

    fn put(
        &mut self,
        handle: &ResourceHandle,
        attributes: &Representation,
    ) -> Result<(), TransportError> {
        self.submit(StackRequest::Put(handle.clone(), attributes.clone()))
    }
}

// ───────────────────────────────────────────────────────────────
// Simulated world
// ───────────────────────────────────────────────────────────────

struct SimResource {
    handle: ResourceHandle,
    values: Representation,
}

struct SimPeer {
    sighting: PeerSighting,
}

/// Resources reachable over both transports, plus the radio peers that
/// host the radio ones.
pub struct SimWorld {
    resources: Vec<SimResource>,
    peers: Vec<SimPeer>,
    observed: Vec<HandleId>,
    next_id: u64,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
            peers: Vec::new(),
            observed: Vec::new(),
            next_id: 1,
        }
    }

    /// Two IP resources (a switch and a thermometer), one radio switch
    /// behind a peer advertising the stack service, and an unrelated peer.
    pub fn demo() -> Result<Self, RegistryError> {
        let mut world = Self::new();
        world.add_resource(
            Transport::Ip,
            "192.168.1.20:5683",
            "/a/light",
            &["oic.r.switch.binary"],
            Representation::single_bool("value", false),
        );
        let mut temperature = Representation::new();
        temperature.insert("temperature", AttrValue::Double(21.5));
        temperature.insert("units", AttrValue::Str("C".into()));
        world.add_resource(
            Transport::Ip,
            "192.168.1.31:5683",
            "/a/temperature",
            &["oic.r.temperature"],
            temperature,
        );

        let bulb = world.add_peer("5C:F3:70:8A:12:9B", Some("Smart Bulb"), &[DEFAULT_RADIO_SERVICE_UUID])?;
        world.add_resource(
            Transport::Radio,
            &bulb,
            "/a/light",
            &["oic.r.switch.binary"],
            Representation::single_bool("value", true),
        );
        world.add_peer(
            "D4:36:39:0E:77:01",
            Some("HR Strap"),
            &["0000180D-0000-1000-8000-00805F9B34FB"],
        )?;
        Ok(world)
    }

    /// Register a resource hosted at `host`.  Radio resources use the peer
    /// identifier as host and are only found by unicast discovery.
    pub fn add_resource(
        &mut self,
        transport: Transport,
        host: &str,
        uri: &str,
        resource_types: &[&str],
        values: Representation,
    ) -> HandleId {
        let id = HandleId(self.next_id);
        self.next_id += 1;
        self.resources.push(SimResource {
            handle: ResourceHandle {
                id,
                transport,
                host: host.into(),
                uri: uri.into(),
                resource_types: resource_types.iter().map(|t| (*t).into()).collect(),
                interfaces: vec!["oic.if.baseline".into(), "oic.if.a".into()],
            },
            values,
        });
        id
    }

    /// Register an advertising radio peer.  Returns its identifier.
    pub fn add_peer(
        &mut self,
        id: &str,
        name: Option<&str>,
        services: &[&str],
    ) -> Result<PeerId, RegistryError> {
        let peer = peer_id(id)?;
        self.peers.push(SimPeer {
            sighting: PeerSighting {
                peer: peer.clone(),
                name: name.map(peer_name),
                services: services.iter().map(|s| (*s).into()).collect(),
            },
        });
        Ok(peer)
    }

    /// Current advertisements of every peer.
    pub fn sightings(&self) -> Vec<PeerSighting> {
        self.peers.iter().map(|p| p.sighting.clone()).collect()
    }

    pub fn is_observed(&self, id: HandleId) -> bool {
        self.observed.contains(&id)
    }

    pub fn value(&self, id: HandleId, name: &str) -> Option<&AttrValue> {
        self.find(id).and_then(|r| r.values.get(name))
    }

    /// Carry out one request, returning the deliveries it produces.
    pub fn execute(&mut self, request: StackRequest) -> Vec<Delivery> {
        match request {
            StackRequest::DiscoverMulticast(transport) => {
                // Radio discovery is unicast only.
                let found = match transport {
                    Transport::Ip => self.handles(|h| h.transport == Transport::Ip),
                    Transport::Radio => Vec::new(),
                };
                vec![Delivery::Discovered(found)]
            }
            StackRequest::DiscoverUnicast(transport, peer) => {
                let found = self.handles(|h| h.transport == transport && h.host == peer.as_str());
                vec![Delivery::Discovered(found)]
            }
            StackRequest::Get(handle) => vec![Delivery::Get(self.snapshot(&handle, ResultCode::OK))],
            StackRequest::Observe(handle) => {
                if self.find(handle.id).is_some() && !self.observed.contains(&handle.id) {
                    self.observed.push(handle.id);
                }
                vec![Delivery::Observe(self.snapshot(&handle, ResultCode::OK))]
            }
            StackRequest::CancelObserve(handle) => {
                self.observed.retain(|id| *id != handle.id);
                Vec::new()
            }
            StackRequest::Put(handle, attributes) => {
                let Some(resource) = self.resources.iter_mut().find(|r| r.handle.id == handle.id)
                else {
                    return vec![Delivery::Put(missing(&handle))];
                };
                resource.values.merge(&attributes);
                let mut out = vec![Delivery::Put(self.snapshot(&handle, ResultCode::RESOURCE_CHANGED))];
                if self.observed.contains(&handle.id) {
                    out.push(Delivery::Observe(self.snapshot(&handle, ResultCode::OK)));
                }
                out
            }
        }
    }

    /// One notification per active observation.
    pub fn notify_observers(&self) -> Vec<Delivery> {
        self.observed
            .iter()
            .filter_map(|id| self.find(*id))
            .map(|r| Delivery::Observe(self.snapshot(&r.handle, ResultCode::OK)))
            .collect()
    }

    fn find(&self, id: HandleId) -> Option<&SimResource> {
        self.resources.iter().find(|r| r.handle.id == id)
    }

    fn handles(&self, keep: impl Fn(&ResourceHandle) -> bool) -> Vec<ResourceHandle> {
        self.resources
            .iter()
            .filter(|r| keep(&r.handle))
            .map(|r| r.handle.clone())
            .collect()
    }

    fn snapshot(&self, handle: &ResourceHandle, result: ResultCode) -> RepresentationSnapshot {
        match self.find(handle.id) {
            Some(r) => RepresentationSnapshot::decode(
                result,
                handle.transport,
                handle.id,
                &r.values.encode_json(),
            ),
            None => missing(handle),
        }
    }
}

fn missing(handle: &ResourceHandle) -> RepresentationSnapshot {
    RepresentationSnapshot::decode(ResultCode::NO_RESOURCE, handle.transport, handle.id, b"")
}

// ───────────────────────────────────────────────────────────────
// Async I/O loop
// ───────────────────────────────────────────────────────────────

type SharedWorld = Rc<RefCell<SimWorld>>;

async fn request_loop(world: SharedWorld) {
    loop {
        let request = REQUEST_CHANNEL.receive().await;
        async_io_mini::Timer::after(STACK_LATENCY).await;
        debug!("SIM: {:?}", request);
        let deliveries = world.borrow_mut().execute(request);
        deliveries.into_iter().for_each(post_delivery);
    }
}

async fn notify_loop(world: SharedWorld) {
    loop {
        async_io_mini::Timer::after(NOTIFY_INTERVAL).await;
        let deliveries = world.borrow().notify_observers();
        deliveries.into_iter().for_each(post_delivery);
    }
}

async fn scan_loop(world: SharedWorld) {
    loop {
        async_io_mini::Timer::after(SCAN_INTERVAL).await;
        let sightings = world.borrow().sightings();
        sightings
            .into_iter()
            .map(Delivery::PeerSighted)
            .for_each(post_delivery);
    }
}

fn run_io_loop(world: SimWorld) {
    let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();
    let world: SharedWorld = Rc::new(RefCell::new(world));

    executor.spawn(request_loop(world.clone())).detach();
    executor.spawn(notify_loop(world.clone())).detach();
    executor.spawn(scan_loop(world.clone())).detach();

    info!("SIM: stack started (async, reactor-driven)");
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
}

/// Spawn the simulated stack on its own thread.  It runs until the
/// process exits.
pub fn spawn(world: SimWorld) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("sim-io".into())
        .spawn(move || run_io_loop(world))
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
