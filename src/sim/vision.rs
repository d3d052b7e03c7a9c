//! Enemy vision cones
//!
//! Each enemy fans a fixed number of rays across its facing. The player is
//! spotted when any ray resolves to the player (mirrors and camouflage
//! included) within range. With jitter on, the fan shifts a little every tick
//! along a Halton sequence so narrow gaps between rays get covered over time.

use glam::Vec3;

use super::entity::{EntityKind, EntityRef, EntityTable, KindMask};
use super::raycast::raycast;
use crate::debug::{DebugLine, colors};
use crate::error::SimError;
use crate::settings::Settings;

/// What enemy sight rays can strike. Objectives and other enemies are
/// looked straight through.
pub const VISION_MASK: KindMask = KindMask::PLAYER
    .union(KindMask::CRATE)
    .union(KindMask::WALL)
    .union(KindMask::GLASS_WALL)
    .union(KindMask::MIRROR_WALL)
    .union(KindMask::COLORED_WALL);

/// Vision cone configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisionCone {
    /// Full cone angle in radians
    pub fov: f32,
    /// Sight distance in tiles, measured along the ray path
    pub range: f32,
    /// Rays per check
    pub rays: u32,
}

impl VisionCone {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            fov: settings.vision_fov,
            range: settings.vision_range,
            rays: settings.vision_rays.max(1),
        }
    }

    /// Ray headings for a cone centred on `facing`.
    ///
    /// `jitter` in [0, 1) offsets every sample within its slice; 0.5 puts
    /// each ray in the middle of its slice.
    pub fn sample_angles(&self, facing: f32, jitter: f32) -> impl Iterator<Item = f32> + '_ {
        let start = facing - self.fov * 0.5;
        (0..self.rays).map(move |i| start + (i as f32 + jitter) / self.rays as f32 * self.fov)
    }
}

/// Check whether `enemy` can see `player` this tick.
///
/// When `debug` is given, every ray is traced and recorded as a line;
/// otherwise the check stops at the first ray that spots the player.
pub fn enemy_sees_player(
    table: &EntityTable,
    enemy: EntityRef,
    player: EntityRef,
    cone: &VisionCone,
    jitter: f32,
    mut debug: Option<&mut Vec<DebugLine>>,
) -> Result<bool, SimError> {
    let eye = table.entity(table.resolve(enemy)?);
    table.resolve(player)?;

    let EntityKind::Enemy { facing } = eye.kind else {
        return Ok(false);
    };
    let origin = eye.world_position();

    let mut spotted = false;
    for angle in cone.sample_angles(facing.angle(), jitter) {
        let direction = Vec3::new(angle.cos(), angle.sin(), 0.0);
        let result = raycast(table, Some(enemy), origin, direction, VISION_MASK);
        let seen = result.hit && result.final_hit == Some(player) && result.distance <= cone.range;
        spotted |= seen;

        match debug.as_deref_mut() {
            Some(lines) => {
                let (end, color) = if seen {
                    (result.hit_position, colors::RAY_SPOTTED)
                } else if result.direct.is_some() && result.t <= cone.range {
                    (result.hit_position, colors::RAY_BLOCKED)
                } else {
                    (origin + direction * cone.range, colors::RAY_OPEN)
                };
                lines.push(DebugLine::new(origin, end, color));
            }
            None if spotted => break,
            None => {}
        }
    }

    Ok(spotted)
}
