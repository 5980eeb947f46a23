// ==============================================================================
// main.rs - HEADLESS TREAD SIMULATION HOST
// ------------------------------------------------------------------------------
// Drives one tank over seeded rolling terrain at a fixed 60 Hz:
// - loads TANK_CONFIG (TOML) or falls back to the heavy preset
// - loads cargo, runs a scripted gear schedule, unloads half the cargo midway
// - logs a JSON telemetry line once per simulated second
//
// Env: TANK_CONFIG, SIM_SECONDS (default 20), TERRAIN_SEED (default 42),
//      RUST_LOG, LOG_FORMAT=json. A local .env file is honoured.
// ==============================================================================

use std::str::FromStr;

use rapier2d::prelude::*;
use tokio::time::{Duration, MissedTickBehavior, interval};

use tank_treads::{TankConfig, Terrain, TreadResult, TreadSystem};

const FIXED_DT: f32 = 1.0 / 60.0;
const TICKS_PER_SECOND: u64 = 60;

// (simulated second, gear)
const GEAR_SCRIPT: &[(u64, i32)] = &[(2, 1), (6, 2), (14, 0), (17, -1)];
const UNLOAD_AT_SECOND: u64 = 10;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

fn env_or<T: FromStr + Copy + std::fmt::Debug>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, ?default, "unparseable env var, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Cargo cells stacked on the rear deck, chassis space.
fn cargo_layout(rows: usize, cols: usize) -> Vec<Vector<Real>> {
    (0..rows)
        .flat_map(|r| (0..cols).map(move |c| vector![-2.0 + c as Real * 0.6, 0.9 + r as Real * 0.5]))
        .collect()
}

#[tokio::main]
async fn main() {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "tread-sim failed");
        std::process::exit(1);
    }
}

async fn run() -> TreadResult<()> {
    let config = match std::env::var("TANK_CONFIG") {
        Ok(path) => TankConfig::load(path)?,
        Err(_) => {
            tracing::info!("TANK_CONFIG not set, using heavy preset");
            TankConfig::heavy()
        }
    };
    let seconds: f32 = env_or("SIM_SECONDS", 20.0);
    let seed: u64 = env_or("TERRAIN_SEED", 42);

    let terrain = Terrain::rolling(seed, 400.0, 2.0, 1.5);
    let mut system = TreadSystem::from_config(config, terrain);
    system.initialize()?;

    let mut cargo = cargo_layout(3, 4);
    system.notify_structure_changed(&cargo);

    let total_ticks = (seconds.max(0.0) * TICKS_PER_SECOND as f32).ceil() as u64;
    tracing::info!(seed, seconds, total_ticks, "simulation starting");

    // Fixed timestep: ~60 Hz
    let mut ticker = interval(Duration::from_millis(16));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    for tick in 0..total_ticks {
        ticker.tick().await;

        if tick % TICKS_PER_SECOND == 0 {
            let second = tick / TICKS_PER_SECOND;

            if let Some(&(_, gear)) = GEAR_SCRIPT.iter().find(|(at, _)| *at == second) {
                system.change_gear(gear);
            }
            if second == UNLOAD_AT_SECOND {
                cargo.truncate(cargo.len() / 2);
                system.notify_structure_changed(&cargo);
            }
        }

        system.fixed_tick(FIXED_DT);
        system.tick(FIXED_DT);

        if (tick + 1) % TICKS_PER_SECOND == 0 {
            match serde_json::to_string(&system.telemetry()) {
                Ok(line) => tracing::info!(telemetry = %line, "tick"),
                Err(e) => tracing::warn!(error = %e, "telemetry serialization failed"),
            }
        }
    }

    let chassis = system.chassis();
    tracing::info!(
        ticks = system.tick_count(),
        x = chassis.position().x,
        speed = system.speed(),
        rotation = chassis.rotation(),
        "simulation finished"
    );
    Ok(())
}
