//! airpong device entry point (headless LAN build).
//!
//! Wires together the UDP radio stand-in, the session state machine, and a
//! log-based UI pump, then runs the fixed-rate game loop.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()            -- TOML config, defaults on first run
//!  └─ UdpRadio::start()        -- socket + receive thread
//!  └─ SessionStateMachine::new()
//!  └─ UI pump task             -- logs UiEvents (display stand-in)
//!  └─ game loop (blocking)     -- poll_events + tick at a fixed rate
//! ```
//!
//! # Operator stand-in (for beginners)
//!
//! The real device has buttons and a display; this build has neither, so a
//! tiny policy plays the operator: in `host` mode every incoming join
//! request is accepted, and in `join` mode the first discovered host is
//! asked for a match.  While playing, the paddle follows the ball.  The
//! protocol underneath is exactly the one the real device runs.
//!
//! Usage:
//!
//! ```text
//! airpong-device [host|join] [config.toml]
//! ```

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use airpong_core::PeerAddress;
use airpong_device::application::session::{SessionState, SessionStateMachine};
use airpong_device::infrastructure::{
    radio::udp::UdpRadio,
    storage::config::load_config,
    ui_bridge::ui_channel,
};

/// How many ticks `join` mode waits for acknowledgements before picking a
/// host (or re-probing).
const DISCOVERY_WAIT_TICKS: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Host,
    Join,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── CLI arguments ─────────────────────────────────────────────────────────
    let mut args = std::env::args().skip(1);
    let mode = match args.next().as_deref() {
        None | Some("host") => Mode::Host,
        Some("join") => Mode::Join,
        Some(other) => anyhow::bail!("unknown mode {other:?}; expected \"host\" or \"join\""),
    };
    let config_path = args.next().unwrap_or_else(|| "airpong.toml".to_string());

    // ── Configuration ─────────────────────────────────────────────────────────
    let config = load_config(std::path::Path::new(&config_path))
        .with_context(|| format!("loading config from {config_path}"))?;

    // Initialise structured logging; RUST_LOG overrides the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.device.log_level.clone())),
        )
        .init();

    info!("airpong device \"{}\" starting in {mode:?} mode", config.device.name);

    let local: PeerAddress = config
        .device
        .address
        .parse()
        .with_context(|| format!("invalid device address {:?}", config.device.address))?;

    // ── Radio ─────────────────────────────────────────────────────────────────
    let radio = UdpRadio::start(local, config.radio.port).context("starting radio")?;

    // ── UI pump ───────────────────────────────────────────────────────────────
    // Display stand-in: every event the real device would render is logged.
    let (ui_tx, mut ui_rx) = ui_channel();
    tokio::spawn(async move {
        while let Some(event) = ui_rx.recv().await {
            info!("[ui] {event:?}");
        }
    });

    // ── Shutdown flag ─────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    // ── Game loop ─────────────────────────────────────────────────────────────
    // The loop is synchronous and timing-sensitive, so it runs on a blocking
    // thread rather than inside the async scheduler.
    let tick_interval = Duration::from_millis(config.game.tick_ms);
    let machine = SessionStateMachine::new(radio.clone(), ui_tx, tick_interval);
    let loop_running = Arc::clone(&running);
    let game = tokio::task::spawn_blocking(move || {
        game_loop(machine, mode, tick_interval, &loop_running);
    });

    game.await.context("game loop panicked")?;
    radio.shutdown();
    info!("airpong device stopped");
    Ok(())
}

/// The fixed-rate loop: drain link events, act the operator's part, run one
/// tick, sleep off the remainder of the interval.
fn game_loop(
    mut machine: SessionStateMachine,
    mode: Mode,
    tick_interval: Duration,
    running: &AtomicBool,
) {
    match mode {
        Mode::Host => machine.host(),
        Mode::Join => {
            if let Err(e) = machine.start_discovery() {
                warn!("discovery probe failed: {e}");
            }
        }
    }

    let mut ticks_in_state: u32 = 0;
    while running.load(Ordering::Relaxed) {
        let started = Instant::now();

        machine.poll_events();
        operator_policy(&mut machine, mode, &mut ticks_in_state);
        machine.tick();

        ticks_in_state = ticks_in_state.saturating_add(1);
        if let Some(remaining) = tick_interval.checked_sub(started.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    machine.cancel();
}

/// Plays the operator: auto-accept when hosting, pick the first discovered
/// host when joining, and track the ball while playing.
fn operator_policy(machine: &mut SessionStateMachine, mode: Mode, ticks_in_state: &mut u32) {
    match machine.state() {
        SessionState::HostWaiting { pending: Some(peer) } => {
            info!("auto-accepting challenger {peer}");
            machine.accept_join();
            *ticks_in_state = 0;
        }
        SessionState::Discovering if mode == Mode::Join => {
            if *ticks_in_state < DISCOVERY_WAIT_TICKS {
                return;
            }
            *ticks_in_state = 0;
            match machine.discovered().first() {
                Some(&host) => {
                    info!("requesting to join {host}");
                    if let Err(e) = machine.request_join(host) {
                        warn!("join request failed: {e}");
                    }
                }
                None => {
                    if let Err(e) = machine.refresh_discovered() {
                        warn!("re-probe failed: {e}");
                    }
                }
            }
        }
        SessionState::Playing { .. } => {
            if let Some(state) = machine.game_state() {
                let direction = (state.ball.x - state.near_paddle.pos()).signum();
                machine.slide_paddle(direction);
            }
        }
        _ => {}
    }
}
