//! Fixed timestep simulation tick
//!
//! Advances one stage of the game deterministically: player motion, enemy
//! patrols, enemy vision, then the stage flow (caught, cleared, reload).

use glam::{IVec2, Vec2};

use super::collision::move_and_collide;
use super::entity::{EntityKind, EntityRef, Facing};
use super::state::{GamePhase, GameState};
use super::vision::{VisionCone, enemy_sees_player};
use crate::consts::{CAMOUFLAGE_COLORS, FIXED_ONE};
use crate::error::SimError;
use crate::{halton, to_fixed};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Step the player's camouflage to the next colour (edge-triggered)
    pub cycle_camouflage: bool,
    /// Reload the current stage
    pub restart: bool,
}

impl TickInput {
    /// Unit-length movement direction, +y north
    pub fn direction(&self) -> Vec2 {
        let x = self.right as i32 - self.left as i32;
        let y = self.up as i32 - self.down as i32;
        Vec2::new(x as f32, y as f32).normalize_or_zero()
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.time_ticks += 1;
    state.debug_lines.clear();

    if let Err(err) = step(state, input, dt) {
        log::error!("tick {} skipped: {err}", state.time_ticks);
    }
}

fn step(state: &mut GameState, input: &TickInput, dt: f32) -> Result<(), SimError> {
    if input.restart {
        log::info!("Restarting stage '{}'", state.stage().name);
        return state.load_stage(state.stage_index);
    }

    match state.phase {
        GamePhase::Playing => {}
        GamePhase::Caught { ticks_left: 0 } => return state.load_stage(state.stage_index),
        GamePhase::Cleared { ticks_left: 0 } => {
            let next = state.stage_index + 1;
            return state.load_stage(next);
        }
        GamePhase::Caught { ticks_left } => {
            state.phase = GamePhase::Caught {
                ticks_left: ticks_left - 1,
            };
            return Ok(());
        }
        GamePhase::Cleared { ticks_left } => {
            state.phase = GamePhase::Cleared {
                ticks_left: ticks_left - 1,
            };
            return Ok(());
        }
    }

    if input.cycle_camouflage {
        let next = next_camouflage(state.camouflage);
        state.set_camouflage(next)?;
        log::debug!("Camouflage now {next:?}");
    }

    move_player(state, input, dt)?;

    if state.objectives_remaining() == 0 {
        state.stages_cleared += 1;
        set_phase(state, GamePhase::Cleared {
            ticks_left: state.settings.reset_delay_ticks,
        });
        return Ok(());
    }

    patrol_enemies(state, dt)?;

    if player_spotted(state)? {
        state.times_caught += 1;
        set_phase(state, GamePhase::Caught {
            ticks_left: state.settings.reset_delay_ticks,
        });
    }

    Ok(())
}

fn set_phase(state: &mut GameState, phase: GamePhase) {
    log::info!("Phase {:?} -> {:?} on stage '{}'", state.phase, phase, state.stage().name);
    state.phase = phase;
}

/// None, then each camouflage colour in turn, then back to None
fn next_camouflage(current: Option<u8>) -> Option<u8> {
    match current {
        None => Some(1),
        Some(tag) if tag < CAMOUFLAGE_COLORS => Some(tag + 1),
        Some(_) => None,
    }
}

/// Move the player along x, then y. Fractional motion carries over to the
/// next tick unless that axis was blocked.
fn move_player(state: &mut GameState, input: &TickInput, dt: f32) -> Result<(), SimError> {
    let velocity = input.direction() * state.settings.player_speed * FIXED_ONE as f32;
    let wanted = velocity * dt + state.move_remainder;
    let whole = wanted.trunc();
    let delta = whole.as_ivec2();

    let moved_x = move_and_collide(&mut state.entities, state.player, IVec2::new(delta.x, 0))?;
    let moved_y = move_and_collide(&mut state.entities, state.player, IVec2::new(0, delta.y))?;

    let mut remainder = wanted - whole;
    if moved_x.x != delta.x {
        remainder.x = 0.0;
    }
    if moved_y.y != delta.y {
        remainder.y = 0.0;
    }
    state.move_remainder = remainder;
    Ok(())
}

/// Walk every enemy one step along its facing; a blocked enemy turns to a
/// random other direction.
fn patrol_enemies(state: &mut GameState, dt: f32) -> Result<(), SimError> {
    let speed = to_fixed(state.settings.enemy_speed * dt);
    if speed == 0 {
        return Ok(());
    }

    for enemy in state.enemies() {
        let Some(facing) = facing_of(state, enemy) else {
            continue;
        };
        let delta = facing.step() * speed;
        let moved = move_and_collide(&mut state.entities, enemy, delta)?;
        if moved == delta {
            continue;
        }

        let turn = 1 + state.rng_state.next_u32() % 3;
        let turned = Facing::from_index(facing.index() + turn);
        if let Some(EntityKind::Enemy { facing }) = state.entities.get_mut(enemy).map(|e| &mut e.kind) {
            *facing = turned;
        }
    }
    Ok(())
}

fn facing_of(state: &GameState, enemy: EntityRef) -> Option<Facing> {
    match state.entities.get(enemy)?.kind {
        EntityKind::Enemy { facing } => Some(facing),
        _ => None,
    }
}

fn player_spotted(state: &mut GameState) -> Result<bool, SimError> {
    let cone = VisionCone::from_settings(&state.settings);
    let jitter = if state.settings.vision_jitter {
        halton(state.time_ticks as u32, 2)
    } else {
        0.5
    };

    let mut spotted = false;
    for enemy in state.enemies() {
        let debug = state.settings.debug_rays.then_some(&mut state.debug_lines);
        if enemy_sees_player(&state.entities, enemy, state.player, &cone, jitter, debug)? {
            log::debug!("Player spotted by enemy {}", enemy.index);
            spotted = true;
            if !state.settings.debug_rays {
                break;
            }
        }
    }
    Ok(spotted)
}
