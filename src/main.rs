//! ocfswitch: Main Entry Point
//!
//! Hexagonal architecture with a single-threaded sequencer loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimTransport      LogEventSink   JsonFileConfig  Monotonic    │
//! │  (TransportPort)   (EventSink)    (ConfigPort)    (TimePort)   │
//! │        │                                                       │
//! │        ▼ REQUEST_CHANNEL          DELIVERY_CHANNEL ▲           │
//! │  ┌─────────────────────────────┐                   │           │
//! │  │ sim-io thread (async)       │───────────────────┘           │
//! │  └─────────────────────────────┘                               │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           SequencerService (pure logic)                │    │
//! │  │  SlotMap[IP, BLE] · TimerQueue · PeerRegistry          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `ocfswitch [config.json]`.  Logging follows `RUST_LOG`
//! (default `info`).
#![deny(unused_must_use)]

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use ocfswitch::adapters::config_file::JsonFileConfig;
use ocfswitch::adapters::log_sink::LogEventSink;
use ocfswitch::adapters::sim_network::{self, SimTransport, SimWorld};
use ocfswitch::adapters::time::MonotonicClock;
use ocfswitch::app::ports::{ConfigPort, TimePort};
use ocfswitch::app::service::SequencerService;
use ocfswitch::channels::try_recv_delivery;
use ocfswitch::config::SequencerConfig;
use ocfswitch::error::Error;
use ocfswitch::resource::Transport;

/// Config from the JSON file at `path`, or defaults when none is given.
fn load_config(path: Option<String>) -> ocfswitch::error::Result<SequencerConfig> {
    let config = match path {
        Some(path) => JsonFileConfig::new(path).load()?,
        None => SequencerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  ocfswitch v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config (file or defaults) ──────────────────────────
    let config = load_config(std::env::args().nth(1)).context("loading configuration")?;

    // ── 3. Simulated stack on its own thread ──────────────────
    let world = SimWorld::demo().map_err(Error::from)?;
    let _io = sim_network::spawn(world).context("spawning sim-io thread")?;

    // Give the stack time to come up before the first discovery.
    thread::sleep(Duration::from_millis(config.startup_delay_ms));

    // ── 4. Sequencer loop ─────────────────────────────────────
    let clock = MonotonicClock::new();
    let mut net = SimTransport::new();
    let mut sink = LogEventSink::new();
    let loop_interval = Duration::from_millis(config.loop_interval_ms);
    let run_until = clock.now_ms().saturating_add(config.run_duration_ms);
    let mut service = SequencerService::new(config)
        .map_err(Error::from)
        .context("starting sequencer")?;

    service.start(&mut net, &mut sink);

    while clock.now_ms() < run_until {
        while let Some(delivery) = try_recv_delivery() {
            service.handle(delivery, clock.now_ms(), &mut net, &mut sink);
        }
        service.tick(clock.now_ms(), &mut net, &mut sink);
        thread::sleep(loop_interval);
    }

    // ── 5. Summary ────────────────────────────────────────────
    for transport in Transport::ALL {
        let slot = service.slot(transport);
        info!(
            "{}: state={} cycles={} puts={} notifications={} handle={}",
            transport,
            slot.state(),
            slot.ctx.cycles,
            slot.ctx.puts_issued,
            slot.ctx.observe_deliveries,
            slot.ctx
                .handle
                .as_ref()
                .map_or_else(|| "-".to_owned(), |h| h.id.to_string()),
        );
    }
    info!(
        "Done after {}s: {} peer(s), {} line(s) logged",
        clock.uptime_secs(),
        service.peer_count(),
        sink.len()
    );
    Ok(())
}
