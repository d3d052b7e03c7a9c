//! Sneak Box headless runner
//!
//! Plays the built-in stages with a simple autopilot on a fixed timestep and
//! logs what happens. Set `RUST_LOG=info` (or `debug`) to watch.
//!
//! Usage: `sneak-box [settings.json] [seconds]`

use std::process;

use glam::Vec2;
use sneak_box::consts::{MAX_SUBSTEPS, SIM_DT};
use sneak_box::sim::{EntityKind, GameState, TickInput, stages, tick};
use sneak_box::{AssetRegistry, Settings};

/// Simulated render frame, slower than the sim so substeps are exercised
const FRAME_DT: f32 = 1.0 / 30.0;
const DEFAULT_SECONDS: f32 = 60.0;

fn main() {
    env_logger::init();
    log::info!("Sneak Box (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(DEFAULT_SECONDS);

    let stages = match stages::builtin() {
        Ok(stages) => stages,
        Err(err) => {
            log::error!("Built-in stages failed to load: {err}");
            process::exit(1);
        }
    };

    let mut state = match GameState::new(0x5eed, stages, settings, AssetRegistry::default()) {
        Ok(state) => state,
        Err(err) => {
            log::error!("Failed to start: {err}");
            process::exit(1);
        }
    };

    let mut accumulator = 0.0;
    let frames = (seconds / FRAME_DT) as u32;
    for _ in 0..frames {
        accumulator += FRAME_DT;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = autopilot(&state);
            tick(&mut state, &input, SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
        }
    }

    println!(
        "{} ticks: {} stages cleared, caught {} times, now on '{}' ({} objectives left)",
        state.time_ticks,
        state.stages_cleared,
        state.times_caught,
        state.stage().name,
        state.objectives_remaining()
    );
}

/// Walk straight at the nearest unbroken objective
fn autopilot(state: &GameState) -> TickInput {
    let Some(player) = state.player_entity() else {
        return TickInput::default();
    };
    let from = player.world_position().truncate();

    let target = state
        .entities
        .entities()
        .iter()
        .filter(|e| matches!(e.kind, EntityKind::Objective { broken: false }))
        .map(|e| e.world_position().truncate())
        .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)));

    let Some(target) = target else {
        return TickInput::default();
    };
    let to = target - from;
    let dead_zone = Vec2::splat(0.05);
    TickInput {
        up: to.y > dead_zone.y,
        down: to.y < -dead_zone.y,
        left: to.x < -dead_zone.x,
        right: to.x > dead_zone.x,
        ..Default::default()
    }
}
