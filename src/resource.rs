//! Resource data model shared by the sequencer and its adapters.
//!
//! Everything here is plain data: transports, opaque handles, stack
//! result codes, and the decoded representation carried by every
//! get / observe / put callback.
//!
//! ```text
//!   Transport Service ──▶ RepresentationSnapshot { result, transport, handle, values }
//!                                                     │
//!                                     SlotMap[transport] (demultiplexed)
//! ```

use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ───────────────────────────────────────────────────────────────
// Transport identity
// ───────────────────────────────────────────────────────────────

/// One of the two independent media the resource protocol runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Transport {
    /// IP adapter (UDP/CoAP, multicast discovery).
    Ip = 0,
    /// Short-range radio adapter (BLE GATT, unicast discovery per peer).
    Radio = 1,
}

impl Transport {
    /// Number of transports, used to size per-transport arrays.
    pub const COUNT: usize = 2;

    /// All transports in index order.
    pub const ALL: [Transport; Transport::COUNT] = [Transport::Ip, Transport::Radio];

    /// Stable array index for this transport.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Prefix used when a log line is tagged with this transport.
    pub const fn log_prefix(self) -> &'static str {
        match self {
            Self::Ip => "IP",
            Self::Radio => "BLE",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.log_prefix())
    }
}

// ───────────────────────────────────────────────────────────────
// Resource handle
// ───────────────────────────────────────────────────────────────

/// Opaque lookup key assigned by the transport service to each
/// discovered resource.  Every callback snapshot carries the id of the
/// handle it was issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reference to a remote resource, scoped to exactly one transport.
///
/// Handles are never mutated; a later discovery for the same transport
/// produces a new handle that replaces the old one in its slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHandle {
    pub id: HandleId,
    pub transport: Transport,
    /// Host address (`ip:port` or radio peer identifier).
    pub host: String,
    /// Resource path on the host, e.g. `/a/light`.
    pub uri: String,
    /// Declared capability types, e.g. `oic.r.switch.binary`.
    pub resource_types: Vec<String>,
    /// Declared interfaces, e.g. `oic.if.a`.
    pub interfaces: Vec<String>,
}

impl ResourceHandle {
    /// Whether this resource declares the given capability type.
    pub fn has_type(&self, resource_type: &str) -> bool {
        self.resource_types.iter().any(|t| t == resource_type)
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {} types=[{}] ifaces=[{}]",
            self.host,
            self.uri,
            self.id,
            self.resource_types.join(", "),
            self.interfaces.join(", ")
        )
    }
}

// ───────────────────────────────────────────────────────────────
// Stack result codes
// ───────────────────────────────────────────────────────────────

/// Totally ordered result code returned by the transport stack.
///
/// Codes up to and including [`ResultCode::RESOURCE_CHANGED`] are success
/// variants; anything greater is an error.  Unknown numeric values are
/// kept as-is so the threshold comparison still applies to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(pub u8);

impl ResultCode {
    pub const OK: Self = Self(0);
    pub const RESOURCE_CREATED: Self = Self(1);
    pub const RESOURCE_DELETED: Self = Self(2);
    pub const CONTINUE: Self = Self(3);
    pub const RESOURCE_CHANGED: Self = Self(4);
    pub const INVALID_URI: Self = Self(20);
    pub const INVALID_QUERY: Self = Self(21);
    pub const INVALID_IP: Self = Self(22);
    pub const INVALID_PORT: Self = Self(23);
    pub const INVALID_CALLBACK: Self = Self(24);
    pub const INVALID_METHOD: Self = Self(25);
    pub const INVALID_PARAM: Self = Self(26);
    pub const INVALID_OBSERVE_PARAM: Self = Self(27);
    pub const NO_MEMORY: Self = Self(28);
    pub const COMM_ERROR: Self = Self(29);
    pub const TIMEOUT: Self = Self(30);
    pub const ADAPTER_NOT_ENABLED: Self = Self(31);
    pub const NOT_IMPLEMENTED: Self = Self(32);
    pub const NO_RESOURCE: Self = Self(33);
    pub const UNAUTHORIZED_REQ: Self = Self(46);
    pub const ERROR: Self = Self(255);

    /// Success variants are every code `<= RESOURCE_CHANGED`.
    pub fn is_success(self) -> bool {
        self <= Self::RESOURCE_CHANGED
    }

    pub fn is_error(self) -> bool {
        !self.is_success()
    }

    fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::OK => "OK",
            Self::RESOURCE_CREATED => "RESOURCE_CREATED",
            Self::RESOURCE_DELETED => "RESOURCE_DELETED",
            Self::CONTINUE => "CONTINUE",
            Self::RESOURCE_CHANGED => "RESOURCE_CHANGED",
            Self::INVALID_URI => "INVALID_URI",
            Self::INVALID_QUERY => "INVALID_QUERY",
            Self::INVALID_IP => "INVALID_IP",
            Self::INVALID_PORT => "INVALID_PORT",
            Self::INVALID_CALLBACK => "INVALID_CALLBACK",
            Self::INVALID_METHOD => "INVALID_METHOD",
            Self::INVALID_PARAM => "INVALID_PARAM",
            Self::INVALID_OBSERVE_PARAM => "INVALID_OBSERVE_PARAM",
            Self::NO_MEMORY => "NO_MEMORY",
            Self::COMM_ERROR => "COMM_ERROR",
            Self::TIMEOUT => "TIMEOUT",
            Self::ADAPTER_NOT_ENABLED => "ADAPTER_NOT_ENABLED",
            Self::NOT_IMPLEMENTED => "NOTIMPL",
            Self::NO_RESOURCE => "NO_RESOURCE",
            Self::UNAUTHORIZED_REQ => "UNAUTHORIZED_REQ",
            Self::ERROR => "ERROR",
            _ => return None,
        })
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "OC_STACK_{} ({})", name, self.0),
            None => write!(f, "OC_STACK_UNKNOWN ({})", self.0),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Representation values
// ───────────────────────────────────────────────────────────────

/// A single attribute value inside a representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Null,
}

impl AttrValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Attribute name → value map of a resource representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Representation(BTreeMap<String, AttrValue>);

impl Representation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Representation holding exactly one boolean attribute.
    pub fn single_bool(name: &str, value: bool) -> Self {
        let mut rep = Self::new();
        rep.insert(name, AttrValue::Bool(value));
        rep
    }

    pub fn insert(&mut self, name: &str, value: AttrValue) {
        self.0.insert(name.to_owned(), value);
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    /// Boolean attribute `name`, if present and boolean-typed.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(AttrValue::as_bool)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overwrite or add every attribute of `other`.
    pub fn merge(&mut self, other: &Representation) {
        for (name, value) in other.iter() {
            self.insert(name, value.clone());
        }
    }

    /// Decode a JSON object payload.  Returns `None` for an empty payload,
    /// a non-object document, or malformed input.
    pub fn decode_json(payload: &[u8]) -> Option<Self> {
        if payload.is_empty() {
            return None;
        }
        serde_json::from_slice::<Self>(payload).ok()
    }

    pub fn encode_json(&self) -> Vec<u8> {
        // A string-keyed map of plain values always serialises.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

// ───────────────────────────────────────────────────────────────
// Callback snapshot
// ───────────────────────────────────────────────────────────────

/// Decoded payload of a get / observe / put callback.
///
/// Consumed synchronously by the sequencer; never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct RepresentationSnapshot {
    pub result: ResultCode,
    /// Transport the callback arrived on (routing key).
    pub transport: Transport,
    /// Handle the originating request was issued against.
    pub handle: HandleId,
    /// `None` when the stack delivered no value map at all.
    pub values: Option<Representation>,
}

/// Why a boolean attribute could not be read from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrLookupError {
    /// The snapshot carried no value map.
    NoValues,
    /// The map exists but has no boolean under the requested name.
    MissingAttribute,
}

impl RepresentationSnapshot {
    /// Build a snapshot from a raw stack payload.
    pub fn decode(
        result: ResultCode,
        transport: Transport,
        handle: HandleId,
        payload: &[u8],
    ) -> Self {
        Self {
            result,
            transport,
            handle,
            values: Representation::decode_json(payload),
        }
    }

    pub fn bool_attr(&self, name: &str) -> Result<bool, AttrLookupError> {
        let values = self.values.as_ref().ok_or(AttrLookupError::NoValues)?;
        values
            .get_bool(name)
            .ok_or(AttrLookupError::MissingAttribute)
    }
}
