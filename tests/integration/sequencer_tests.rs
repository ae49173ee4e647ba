//! Integration tests for the GET → OBSERVE → PUT cycle on a simulated clock.
//!
//! Time unit: one second of the default config (PUT at +2000 ms,
//! cancel-observe at +5000 ms).

use ocfswitch::app::events::{AppEvent, Operation};
use ocfswitch::app::inbound::Delivery;
use ocfswitch::error::TransportError;
use ocfswitch::fsm::InteractionState;
use ocfswitch::resource::{AttrLookupError, HandleId, Representation, ResultCode, Transport};

use crate::mock_transport::{Call, Harness, Stamped, snapshot, switch};

const IP: Transport = Transport::Ip;
const BLE: Transport = Transport::Radio;

fn observing_ip() -> Harness {
    let mut h = Harness::new();
    h.discover(vec![switch(1, IP)]);
    h.get_value(IP, 1, true);
    h
}

// ── Reference scenario ────────────────────────────────────────

#[test]
fn get_true_observes_now_puts_false_at_2s_cancels_at_5s() {
    let mut h = observing_ip();
    h.advance_to(10_000);

    assert_eq!(
        h.net.calls,
        vec![
            Stamped {
                at_ms: 0,
                call: Call::Get(IP, HandleId(1))
            },
            Stamped {
                at_ms: 0,
                call: Call::Observe(IP, HandleId(1))
            },
            Stamped {
                at_ms: 2_000,
                call: Call::Put(IP, HandleId(1), Representation::single_bool("value", false))
            },
            Stamped {
                at_ms: 5_000,
                call: Call::CancelObserve(IP, HandleId(1))
            },
        ]
    );
}

#[test]
fn cycle_walks_the_state_chain() {
    let mut h = observing_ip();
    assert_eq!(h.svc.state(IP), InteractionState::Observing);

    h.advance_to(2_000);
    assert_eq!(h.svc.state(IP), InteractionState::AwaitingPutResult);

    h.now_ms = 2_040;
    h.put_result(IP, 1, ResultCode::RESOURCE_CHANGED);
    assert_eq!(h.svc.state(IP), InteractionState::Observing);

    h.advance_to(5_000);
    assert_eq!(h.svc.state(IP), InteractionState::Idle);
    assert_eq!(h.svc.pending_timers(), 0);
}

// ── GET outcomes ──────────────────────────────────────────────

#[test]
fn get_error_never_observes_or_puts() {
    let mut h = Harness::new();
    h.discover(vec![switch(1, IP)]);
    h.sink.clear();
    h.deliver(Delivery::Get(snapshot(IP, 1, ResultCode::COMM_ERROR, b"")));
    h.advance_to(30_000);

    assert!(h.net.observes().is_empty());
    assert!(h.net.puts().is_empty());
    assert_eq!(h.svc.state(IP), InteractionState::AwaitingGet);
    assert_eq!(h.sink.events.len(), 1, "exactly one line: {:?}", h.sink.lines());
    assert_eq!(
        h.sink.lines()[0],
        "IP: GET Callback - stack error: OC_STACK_COMM_ERROR (29)"
    );
}

#[test]
fn first_code_past_resource_changed_is_an_error() {
    let mut h = Harness::new();
    h.discover(vec![switch(1, IP)]);
    h.deliver(Delivery::Get(snapshot(IP, 1, ResultCode(5), br#"{"value":true}"#)));
    assert!(h.net.observes().is_empty());

    let mut h = Harness::new();
    h.discover(vec![switch(1, IP)]);
    h.deliver(Delivery::Get(snapshot(
        IP,
        1,
        ResultCode::RESOURCE_CHANGED,
        br#"{"value":true}"#,
    )));
    assert_eq!(h.net.observes().len(), 1);
}

#[test]
fn get_without_value_attribute_stalls_with_one_line() {
    let mut h = Harness::new();
    h.discover(vec![switch(1, IP)]);
    h.sink.clear();
    h.deliver(Delivery::Get(snapshot(IP, 1, ResultCode::OK, br#"{"dim":30}"#)));
    h.advance_to(10_000);

    assert_eq!(h.svc.state(IP), InteractionState::AwaitingGet);
    assert!(h.net.observes().is_empty());
    assert_eq!(h.svc.pending_timers(), 0);
    assert_eq!(
        h.sink.events,
        vec![AppEvent::ValueMissing {
            transport: IP,
            op: Operation::Get,
            attribute: "value".into(),
            reason: AttrLookupError::MissingAttribute,
        }]
    );
}

#[test]
fn get_without_any_values_is_reported_separately() {
    let mut h = Harness::new();
    h.discover(vec![switch(1, IP)]);
    h.sink.clear();
    h.deliver(Delivery::Get(snapshot(IP, 1, ResultCode::OK, b"")));

    assert_eq!(h.sink.events.len(), 1);
    assert!(matches!(
        h.sink.events[0],
        AppEvent::ValueMissing {
            reason: AttrLookupError::NoValues,
            ..
        }
    ));
}

// ── OBSERVE stream ────────────────────────────────────────────

#[test]
fn every_notification_is_logged_in_arrival_order_and_cancel_fires_once() {
    let mut h = observing_ip();
    h.sink.clear();

    let mut expected = Vec::new();
    for i in 0..40u64 {
        h.advance_to(i * 120);
        let value = i % 3 == 0;
        h.observe_value(IP, 1, value);
        expected.push(value);
    }
    h.advance_to(20_000);

    let seen: Vec<bool> = h
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ObservedValue { value, .. } => Some(*value),
            _ => None,
        })
        .collect();
    assert_eq!(seen, expected);

    let cancels = h.net.cancels();
    assert_eq!(cancels.len(), 1);
    assert_eq!(cancels[0].at_ms, 5_000);
}

#[test]
fn put_value_comes_from_get_not_from_observations() {
    let mut h = observing_ip();
    // The stream reports the opposite of the GET read.
    h.observe_value(IP, 1, false);
    h.advance_to(1_000);
    h.observe_value(IP, 1, false);
    h.advance_to(2_000);

    let puts = h.net.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(
        puts[0].call,
        Call::Put(IP, HandleId(1), Representation::single_bool("value", false))
    );
}

#[test]
fn observe_error_is_logged_and_observation_continues() {
    let mut h = observing_ip();
    h.sink.clear();
    h.deliver(Delivery::Observe(snapshot(IP, 1, ResultCode::TIMEOUT, b"")));
    assert_eq!(h.sink.events.len(), 1);
    assert_eq!(h.sink.errors(), 1);
    assert_eq!(h.svc.state(IP), InteractionState::Observing);
    assert!(h.net.cancels().is_empty());

    h.observe_value(IP, 1, true);
    assert!(matches!(
        h.sink.events.last(),
        Some(AppEvent::ObservedValue { value: true, .. })
    ));
}

#[test]
fn notifications_keep_flowing_while_put_is_outstanding() {
    let mut h = observing_ip();
    h.advance_to(2_000);
    assert_eq!(h.svc.state(IP), InteractionState::AwaitingPutResult);

    h.observe_value(IP, 1, false);
    assert!(matches!(
        h.sink.events.last(),
        Some(AppEvent::ObservedValue { value: false, .. })
    ));
    assert_eq!(h.svc.slot(IP).ctx.observe_deliveries, 1);
}

#[test]
fn notification_after_window_closed_is_ignored() {
    let mut h = observing_ip();
    h.advance_to(2_000);
    h.put_result(IP, 1, ResultCode::RESOURCE_CHANGED);
    h.advance_to(5_000);
    assert_eq!(h.svc.state(IP), InteractionState::Idle);

    h.sink.clear();
    h.observe_value(IP, 1, true);
    assert_eq!(
        h.sink.events,
        vec![AppEvent::UnexpectedDelivery {
            transport: IP,
            op: Operation::Observe,
            state: InteractionState::Idle,
        }]
    );
}

// ── PUT outcomes ──────────────────────────────────────────────

#[test]
fn put_error_is_one_line_and_observation_continues() {
    let mut h = observing_ip();
    h.advance_to(2_000);
    h.sink.clear();
    let before = h.net.calls.len();

    h.put_result(IP, 1, ResultCode::UNAUTHORIZED_REQ);
    assert_eq!(h.sink.events.len(), 1);
    assert_eq!(
        h.sink.lines()[0],
        "IP: PUT Callback - stack error: OC_STACK_UNAUTHORIZED_REQ (46)"
    );
    assert_eq!(h.net.calls.len(), before);
    assert_eq!(h.svc.state(IP), InteractionState::Observing);
}

#[test]
fn put_result_after_cancel_closes_the_cycle() {
    let mut h = observing_ip();
    h.advance_to(5_000);
    assert_eq!(h.svc.state(IP), InteractionState::AwaitingPutResult);
    assert_eq!(h.net.cancels().len(), 1);

    h.put_result(IP, 1, ResultCode::OK);
    assert_eq!(h.svc.state(IP), InteractionState::Idle);
}

#[test]
fn put_result_without_outstanding_put_is_ignored() {
    let mut h = observing_ip();
    h.sink.clear();
    h.put_result(IP, 1, ResultCode::OK);
    assert!(matches!(
        h.sink.events[..],
        [AppEvent::UnexpectedDelivery {
            op: Operation::Put,
            state: InteractionState::Observing,
            ..
        }]
    ));
    assert_eq!(h.svc.state(IP), InteractionState::Observing);
}

// ── Transport isolation ───────────────────────────────────────

#[test]
fn ip_deliveries_never_touch_the_radio_slot() {
    let mut h = Harness::new();
    h.discover(vec![switch(1, IP), switch(2, BLE)]);
    let radio_before = h.svc.slot(BLE).ctx.clone();

    h.get_value(IP, 1, true);
    h.observe_value(IP, 1, false);
    h.advance_to(2_000);
    h.put_result(IP, 1, ResultCode::OK);
    h.advance_to(6_000);

    assert_eq!(h.svc.state(BLE), InteractionState::AwaitingGet);
    let radio_after = &h.svc.slot(BLE).ctx;
    assert_eq!(radio_after.captured_value, radio_before.captured_value);
    assert_eq!(radio_after.observe_deliveries, 0);
    assert_eq!(radio_after.generation, radio_before.generation);
    assert_eq!(h.net.for_transport(BLE).len(), 1, "only the radio GET");
}

#[test]
fn radio_delivery_with_ip_handle_id_is_not_routed_to_ip() {
    let mut h = Harness::new();
    h.discover(vec![switch(1, IP), switch(2, BLE)]);
    // Same id as the IP handle but tagged radio: must not advance IP.
    h.get_value(BLE, 1, true);
    assert_eq!(h.svc.state(IP), InteractionState::AwaitingGet);
    assert_eq!(h.svc.state(BLE), InteractionState::AwaitingGet);
    assert!(h.net.observes().is_empty());
}

#[test]
fn slots_run_interleaved_cycles_on_their_own_clocks() {
    let mut h = Harness::new();
    h.discover(vec![switch(1, IP), switch(2, BLE)]);
    h.get_value(IP, 1, false);
    h.advance_to(1_000);
    h.get_value(BLE, 2, true);
    h.advance_to(10_000);

    let ip_put = h.net.for_transport(IP).into_iter().find(|s| matches!(s.call, Call::Put(..)));
    let ble_put = h.net.for_transport(BLE).into_iter().find(|s| matches!(s.call, Call::Put(..)));
    assert_eq!(ip_put.map(|s| s.at_ms), Some(2_000));
    assert_eq!(ble_put.map(|s| s.at_ms), Some(3_000));
    assert_eq!(
        ble_put.map(|s| s.call.clone()),
        Some(Call::Put(BLE, HandleId(2), Representation::single_bool("value", false)))
    );

    let ble_cancel = h.net.cancels().into_iter().find(|s| matches!(s.call, Call::CancelObserve(BLE, _)));
    assert_eq!(ble_cancel.map(|s| s.at_ms), Some(6_000));
}

// ── Submission failures ───────────────────────────────────────

#[test]
fn get_that_cannot_be_submitted_stalls() {
    let mut h = Harness::new();
    h.net.fail_with = Some(TransportError::AdapterDown);
    h.discover(vec![switch(1, IP)]);

    assert_eq!(h.svc.state(IP), InteractionState::AwaitingGet);
    assert_eq!(
        h.sink.count(|e| matches!(
            e,
            AppEvent::RequestFailed {
                op: Operation::Get,
                error: TransportError::AdapterDown,
                ..
            }
        )),
        1
    );
}

#[test]
fn observe_that_cannot_be_submitted_schedules_nothing() {
    let mut h = Harness::new();
    h.discover(vec![switch(1, IP)]);
    h.net.fail_with = Some(TransportError::QueueFull);
    h.get_value(IP, 1, true);
    h.advance_to(10_000);

    assert_eq!(h.svc.pending_timers(), 0);
    assert_eq!(h.svc.state(IP), InteractionState::AwaitingGet);
    assert_eq!(h.sink.errors(), 1);
}

#[test]
fn put_that_cannot_be_submitted_leaves_the_slot_observing() {
    let mut h = observing_ip();
    h.advance_to(1_999);
    h.net.fail_with = Some(TransportError::QueueFull);
    h.advance_to(2_000);
    assert_eq!(h.svc.state(IP), InteractionState::Observing);

    h.net.fail_with = None;
    h.advance_to(5_000);
    assert_eq!(h.svc.state(IP), InteractionState::Idle);
    assert_eq!(h.net.cancels().len(), 1);
}

#[test]
fn put_delay_must_fall_inside_the_observation_window() {
    use ocfswitch::app::ports::ConfigError;
    use ocfswitch::app::service::SequencerService;
    use ocfswitch::config::SequencerConfig;

    let late_put = SequencerConfig {
        put_delay_ms: 6_000,
        observe_window_ms: 5_000,
        ..SequencerConfig::default()
    };
    assert!(matches!(
        SequencerService::new(late_put),
        Err(ConfigError::ValidationFailed(_))
    ));

    // Tightest accepted timing still writes once before the window closes.
    let mut h = Harness::with_config(SequencerConfig {
        put_delay_ms: 4_999,
        observe_window_ms: 5_000,
        ..SequencerConfig::default()
    });
    h.discover(vec![switch(1, Transport::Ip)]);
    h.get_value(Transport::Ip, 1, true);
    h.advance_to(10_000);

    let puts = h.net.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].at_ms, 4_999);
    assert_eq!(h.net.cancels().len(), 1);
    assert_eq!(h.sink.count(|e| matches!(e, AppEvent::DeadlineSkipped { .. })), 0);
}
