//! Radio peer registry.
//!
//! Tracks peers seen while scanning so each one triggers unicast
//! discovery only once.  Storage is a fixed-capacity index map; when it
//! is full the least-recently-seen peer is evicted.

use heapless::FnvIndexMap;
use log::info;

use crate::error::RegistryError;

/// Maximum number of tracked peers (power of two for the index map).
pub const MAX_PEERS: usize = 16;

/// Peer identifier in UUID text form.
pub type PeerId = heapless::String<36>;

/// Advertised peer name, truncated to fit.
pub type PeerName = heapless::String<32>;

/// Build a [`PeerId`] from text.
pub fn peer_id(text: &str) -> Result<PeerId, RegistryError> {
    let mut id = PeerId::new();
    id.push_str(text).map_err(|_| RegistryError::PeerIdTooLong)?;
    Ok(id)
}

/// Build a [`PeerName`], truncating at a character boundary.
pub fn peer_name(text: &str) -> PeerName {
    let mut name = PeerName::new();
    for ch in text.chars() {
        if name.push(ch).is_err() {
            break;
        }
    }
    name
}

/// One advertisement received by the radio scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSighting {
    pub peer: PeerId,
    pub name: Option<PeerName>,
    /// Service UUIDs the peer advertised, in text form.
    pub services: Vec<String>,
}

impl PeerSighting {
    /// Whether the advertisement carries `service_uuid` (case-insensitive).
    pub fn advertises(&self, service_uuid: &str) -> bool {
        self.services
            .iter()
            .any(|s| s.eq_ignore_ascii_case(service_uuid))
    }
}

#[derive(Debug, Clone)]
pub struct PeerRecord {
    pub name: Option<PeerName>,
    pub first_seen_ms: u64,
    pub last_seen_ms: u64,
    pub sightings: u32,
}

/// Outcome of recording a sighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SightingOutcome {
    /// Never seen before; the caller should start discovery.
    New { evicted: Option<PeerId> },
    /// Already tracked; only `last_seen` was refreshed.
    Known,
}

pub struct PeerRegistry {
    peers: FnvIndexMap<PeerId, PeerRecord, MAX_PEERS>,
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self {
            peers: FnvIndexMap::new(),
        }
    }

    /// Record a sighting at `now_ms`.
    pub fn record(
        &mut self,
        sighting: &PeerSighting,
        now_ms: u64,
    ) -> Result<SightingOutcome, RegistryError> {
        if let Some(record) = self.peers.get_mut(&sighting.peer) {
            record.last_seen_ms = now_ms;
            record.sightings = record.sightings.saturating_add(1);
            if sighting.name.is_some() {
                record.name.clone_from(&sighting.name);
            }
            return Ok(SightingOutcome::Known);
        }

        let evicted = if self.peers.len() == MAX_PEERS {
            let oldest = self.least_recently_seen().ok_or(RegistryError::Full)?;
            self.peers.remove(&oldest);
            info!("PeerRegistry: evicted {}", oldest);
            Some(oldest)
        } else {
            None
        };

        let record = PeerRecord {
            name: sighting.name.clone(),
            first_seen_ms: now_ms,
            last_seen_ms: now_ms,
            sightings: 1,
        };
        self.peers
            .insert(sighting.peer.clone(), record)
            .map_err(|_| RegistryError::Full)?;
        Ok(SightingOutcome::New { evicted })
    }

    pub fn get(&self, peer: &PeerId) -> Option<&PeerRecord> {
        self.peers.get(peer)
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.peers.contains_key(peer)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    fn least_recently_seen(&self) -> Option<PeerId> {
        self.peers
            .iter()
            .min_by_key(|(_, r)| r.last_seen_ms)
            .map(|(k, _)| k.clone())
    }
}
