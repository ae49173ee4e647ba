//! Integration tests for discovery filtering and radio peer handling.

use ocfswitch::app::events::AppEvent;
use ocfswitch::app::inbound::Delivery;
use ocfswitch::config::{DEFAULT_RADIO_SERVICE_UUID, SequencerConfig};
use ocfswitch::fsm::InteractionState;
use ocfswitch::registry::{MAX_PEERS, peer_id};
use ocfswitch::resource::{HandleId, Transport};

use crate::mock_transport::{Call, Harness, SWITCH, TEMPERATURE, resource, sighting, switch};

const HEART_RATE: &str = "0000180D-0000-1000-8000-00805F9B34FB";

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_issues_ip_multicast_discovery_only() {
    let mut h = Harness::new();
    h.start();
    assert_eq!(
        h.net.calls.iter().map(|s| s.call.clone()).collect::<Vec<_>>(),
        vec![Call::DiscoverMulticast(Transport::Ip)]
    );
    assert_eq!(h.svc.state(Transport::Ip), InteractionState::Idle);
    assert_eq!(h.svc.state(Transport::Radio), InteractionState::Idle);
}

// ── Capability filtering ──────────────────────────────────────

#[test]
fn temperature_only_candidate_gets_no_get() {
    let mut h = Harness::new();
    h.discover(vec![resource(4, Transport::Ip, &[TEMPERATURE])]);

    assert!(h.net.gets().is_empty());
    assert_eq!(h.svc.state(Transport::Ip), InteractionState::Idle);
    assert!(h.svc.active_handle(Transport::Ip).is_none());
    assert_eq!(
        h.sink.count(|e| matches!(e, AppEvent::CandidateIgnored { .. })),
        1
    );
}

#[test]
fn candidate_declaring_several_types_still_qualifies() {
    let mut h = Harness::new();
    h.discover(vec![resource(
        3,
        Transport::Ip,
        &["oic.wk.d", SWITCH, TEMPERATURE],
    )]);
    assert_eq!(h.net.gets().len(), 1);
    assert_eq!(
        h.svc.active_handle(Transport::Ip).map(|r| r.id),
        Some(HandleId(3))
    );
}

#[test]
fn mixed_batch_issues_one_get_per_qualifying_candidate() {
    let mut h = Harness::new();
    h.discover(vec![
        resource(1, Transport::Ip, &[TEMPERATURE]),
        switch(2, Transport::Ip),
        switch(3, Transport::Radio),
    ]);
    let gets: Vec<Call> = h.net.gets().into_iter().map(|s| s.call.clone()).collect();
    assert_eq!(
        gets,
        vec![
            Call::Get(Transport::Ip, HandleId(2)),
            Call::Get(Transport::Radio, HandleId(3)),
        ]
    );
}

#[test]
fn every_candidate_is_listed_after_a_summary_line() {
    let mut h = Harness::new();
    h.discover(vec![
        resource(1, Transport::Ip, &[TEMPERATURE]),
        switch(2, Transport::Ip),
    ]);
    let lines = h.sink.lines();
    assert_eq!(lines[0], "Resources discovered! count=2");
    assert!(lines[1].starts_with("IP: 192.168.1.11:5683/a/light #1"));
    assert!(lines[1].contains("oic.r.temperature"));
    assert_eq!(lines[2], "IP: Ignoring /a/light: not a binary switch");
    assert!(lines[3].starts_with("IP: 192.168.1.12:5683/a/light #2"));
    assert_eq!(lines[4], "IP: Found light resource /a/light! Getting values...");
    assert_eq!(lines.len(), 5);
}

#[test]
fn empty_discovery_is_a_single_line() {
    let mut h = Harness::new();
    h.deliver(Delivery::Discovered(Vec::new()));
    assert_eq!(h.sink.lines(), vec!["Resources discovered! count=0".to_owned()]);
    assert!(h.net.calls.is_empty());
}

#[test]
fn configured_target_type_is_honoured() {
    let mut h = Harness::with_config(SequencerConfig {
        target_resource_type: TEMPERATURE.into(),
        ..SequencerConfig::default()
    });
    h.discover(vec![switch(1, Transport::Ip), resource(2, Transport::Ip, &[TEMPERATURE])]);
    assert_eq!(h.net.gets().len(), 1);
    assert_eq!(h.net.gets()[0].call, Call::Get(Transport::Ip, HandleId(2)));
}

// ── Radio peers ───────────────────────────────────────────────

#[test]
fn first_sighting_of_service_peer_triggers_unicast_discovery() {
    let mut h = Harness::new();
    let bulb = sighting("5C:F3:70:8A:12:9B", Some("Smart Bulb"), &[DEFAULT_RADIO_SERVICE_UUID]);

    h.deliver(Delivery::PeerSighted(bulb.clone()));
    h.now_ms = 500;
    h.deliver(Delivery::PeerSighted(bulb.clone()));
    h.now_ms = 1_000;
    h.deliver(Delivery::PeerSighted(bulb));

    assert_eq!(
        h.net.calls.iter().map(|s| s.call.clone()).collect::<Vec<_>>(),
        vec![Call::DiscoverUnicast(
            Transport::Radio,
            peer_id("5C:F3:70:8A:12:9B").unwrap()
        )]
    );
    assert_eq!(h.svc.peer_count(), 1);
    assert_eq!(
        h.sink.count(|e| matches!(e, AppEvent::PeerFound { .. })),
        1
    );
    assert!(h
        .sink
        .lines()
        .contains(&"Peripheral found: name=Smart Bulb, id=5C:F3:70:8A:12:9B".to_owned()));
}

#[test]
fn peers_without_the_service_are_never_discovered() {
    let mut h = Harness::new();
    h.deliver(Delivery::PeerSighted(sighting(
        "D4:36:39:0E:77:01",
        Some("HR Strap"),
        &[HEART_RATE],
    )));
    assert!(h.net.calls.is_empty());
    assert_eq!(h.svc.peer_count(), 0);
}

#[test]
fn service_uuid_match_ignores_case() {
    let mut h = Harness::new();
    let lower = DEFAULT_RADIO_SERVICE_UUID.to_ascii_lowercase();
    h.deliver(Delivery::PeerSighted(sighting(
        "5C:F3:70:8A:12:9B",
        None,
        &[HEART_RATE, lower.as_str()],
    )));
    assert_eq!(h.net.calls.len(), 1);
    assert!(h
        .sink
        .lines()
        .contains(&"Peripheral found: name=Unknown, id=5C:F3:70:8A:12:9B".to_owned()));
}

#[test]
fn registry_evicts_least_recently_seen_peer_when_full() {
    let mut h = Harness::new();
    let ids: Vec<String> = (0..=MAX_PEERS).map(|i| format!("AA:BB:CC:DD:EE:{:02X}", i)).collect();

    for (i, id) in ids.iter().take(MAX_PEERS).enumerate() {
        h.now_ms = i as u64 * 10;
        h.deliver(Delivery::PeerSighted(sighting(id, None, &[DEFAULT_RADIO_SERVICE_UUID])));
    }
    // Refresh the oldest so the second one becomes least recently seen.
    h.now_ms = 1_000;
    h.deliver(Delivery::PeerSighted(sighting(&ids[0], None, &[DEFAULT_RADIO_SERVICE_UUID])));
    assert_eq!(h.svc.peer_count(), MAX_PEERS);

    h.now_ms = 2_000;
    h.deliver(Delivery::PeerSighted(sighting(
        &ids[MAX_PEERS],
        None,
        &[DEFAULT_RADIO_SERVICE_UUID],
    )));
    assert_eq!(h.svc.peer_count(), MAX_PEERS);
    assert!(h.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::PeerEvicted { peer } if peer.as_str() == ids[1]
    )));

    // The evicted peer is new again on its next sighting.
    let before = h.net.calls.len();
    h.now_ms = 3_000;
    h.deliver(Delivery::PeerSighted(sighting(&ids[1], None, &[DEFAULT_RADIO_SERVICE_UUID])));
    assert_eq!(h.net.calls.len(), before + 1);
}

#[test]
fn unicast_results_drive_the_radio_slot() {
    let mut h = Harness::new();
    h.deliver(Delivery::PeerSighted(sighting(
        "5C:F3:70:8A:12:9B",
        Some("Smart Bulb"),
        &[DEFAULT_RADIO_SERVICE_UUID],
    )));
    h.discover(vec![switch(7, Transport::Radio)]);
    h.get_value(Transport::Radio, 7, false);

    assert_eq!(h.svc.state(Transport::Radio), InteractionState::Observing);
    assert_eq!(h.svc.state(Transport::Ip), InteractionState::Idle);
    assert!(h.sink.lines().iter().any(|l| l == "BLE: Observing light value..."));
}
