//! Fuzz target: `SequencerService` delivery handling
//!
//! Interprets the input as a script of deliveries and clock steps for
//! both transports, and asserts that the sequencer never panics, never
//! holds more timers than two per transport, and never lets a slot's
//! handle belong to the other transport.
//!
//! cargo fuzz run fuzz_sequencer

#![no_main]

use libfuzzer_sys::fuzz_target;
use ocfswitch::app::events::AppEvent;
use ocfswitch::app::inbound::Delivery;
use ocfswitch::app::ports::{EventSink, TransportPort};
use ocfswitch::app::service::SequencerService;
use ocfswitch::config::SequencerConfig;
use ocfswitch::error::TransportError;
use ocfswitch::registry::PeerId;
use ocfswitch::resource::{
    HandleId, Representation, RepresentationSnapshot, ResourceHandle, ResultCode, Transport,
};

struct NullNet;

impl TransportPort for NullNet {
    fn discover_multicast(&mut self, _: Transport) -> Result<(), TransportError> {
        Ok(())
    }
    fn discover_unicast(&mut self, _: Transport, _: &PeerId) -> Result<(), TransportError> {
        Ok(())
    }
    fn get(&mut self, _: &ResourceHandle) -> Result<(), TransportError> {
        Ok(())
    }
    fn observe(&mut self, _: &ResourceHandle) -> Result<(), TransportError> {
        Ok(())
    }
    fn cancel_observe(&mut self, _: &ResourceHandle) -> Result<(), TransportError> {
        Ok(())
    }
    fn put(&mut self, _: &ResourceHandle, _: &Representation) -> Result<(), TransportError> {
        Ok(())
    }
}

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _: &AppEvent) {}
}

fn handle(id: u8, transport: Transport, switch: bool) -> ResourceHandle {
    ResourceHandle {
        id: HandleId(u64::from(id % 4)),
        transport,
        host: "fuzz".into(),
        uri: "/a/light".into(),
        resource_types: if switch {
            vec!["oic.r.switch.binary".into()]
        } else {
            vec!["oic.r.temperature".into()]
        },
        interfaces: Vec::new(),
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(mut svc) = SequencerService::new(SequencerConfig::default()) else {
        return;
    };
    let (mut net, mut sink) = (NullNet, NullSink);
    let mut now_ms = 0u64;

    for chunk in data.chunks_exact(3) {
        let (op, arg, code) = (chunk[0], chunk[1], chunk[2]);
        let transport = if op & 0x80 == 0 { Transport::Ip } else { Transport::Radio };
        let id = HandleId(u64::from(arg % 4));
        let payload = if arg & 0x10 == 0 { &br#"{"value":true}"#[..] } else { &b"{}"[..] };
        let snap = RepresentationSnapshot::decode(ResultCode(code), transport, id, payload);

        let delivery = match op & 0x07 {
            0 => Delivery::Discovered(vec![handle(arg, transport, code & 1 == 0)]),
            1 => Delivery::Get(snap),
            2 => Delivery::Observe(snap),
            3 => Delivery::Put(snap),
            _ => {
                now_ms += u64::from(arg) * 50;
                svc.tick(now_ms, &mut net, &mut sink);
                continue;
            }
        };
        svc.handle(delivery, now_ms, &mut net, &mut sink);

        assert!(svc.pending_timers() <= 2 * Transport::COUNT);
        for t in Transport::ALL {
            if let Some(h) = svc.active_handle(t) {
                assert_eq!(h.transport, t);
            }
        }
    }
});
