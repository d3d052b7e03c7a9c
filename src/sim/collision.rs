//! Collision resolution for boxes on the tile grid
//!
//! The tricky part of Sneak Box: moving one box through static walls and
//! chains of pushable crates. Resolution runs in two passes:
//!
//! 1. `collided_movement` asks how far the mover may travel. Every box the
//!    mover sweeps over contributes a per-axis limit; pushable boxes
//!    recursively ask how far *they* could travel with the remaining motion.
//! 2. The clamped displacement is committed and every box now overlapping
//!    the mover gets its collision response (crates are pushed, objectives
//!    break).
//!
//! While a box is being resolved it is "parked": neither its own scan nor
//! any scan deeper in the push chain can see it.

use glam::IVec2;

use super::entity::{ColliderKind, EntityKind, EntityRef, EntityTable};
use super::geometry::{Rect, clamp_toward_zero, distance_towards};
use crate::consts::MAX_PUSH_DEPTH;
use crate::error::SimError;

/// Move `entity` by `delta`, pushing crates and breaking objectives.
///
/// Returns the displacement that was actually applied. A fully blocked
/// move is a normal outcome and returns zero; only a stale ref is an error.
pub fn move_and_collide(
    table: &mut EntityTable,
    entity: EntityRef,
    delta: IVec2,
) -> Result<IVec2, SimError> {
    let index = table.resolve(entity)?;
    let mut parked = Vec::new();
    Ok(move_index(table, index, delta, &mut parked, 0))
}

/// How far `entity` could move by `delta` right now, without moving anything
pub fn collided_movement(
    table: &EntityTable,
    entity: EntityRef,
    delta: IVec2,
) -> Result<IVec2, SimError> {
    let index = table.resolve(entity)?;
    let mut parked = Vec::new();
    Ok(resolve_movement(table, index, delta, &mut parked, 0))
}

fn move_index(
    table: &mut EntityTable,
    index: usize,
    delta: IVec2,
    parked: &mut Vec<usize>,
    depth: u32,
) -> IVec2 {
    if delta == IVec2::ZERO {
        return IVec2::ZERO;
    }

    let resolved = resolve_movement(table, index, delta, parked, depth);
    if resolved == IVec2::ZERO {
        return IVec2::ZERO;
    }

    if commit(table, index, resolved, parked, depth) {
        resolved
    } else {
        IVec2::ZERO
    }
}

/// Allowed displacement for `index`, the clamp of `delta` by every limit.
///
/// Every box the mover sweeps over contributes a limit, so a long step
/// cannot jump past an obstacle. For a diagonal `delta` the sweep is the
/// bounding box of start and end, which can only limit more than needed.
fn resolve_movement(
    table: &EntityTable,
    index: usize,
    delta: IVec2,
    parked: &mut Vec<usize>,
    depth: u32,
) -> IVec2 {
    let from = table.entity(index).rect();
    let mut allowed = delta;

    parked.push(index);
    for other in 0..table.len() {
        if parked.contains(&other) || !from.sweep_intersects(delta, &table.entity(other).rect()) {
            continue;
        }
        let limit = try_move_into(table, &from, other, delta, parked, depth);
        allowed.x = clamp_toward_zero(allowed.x, limit.x);
        allowed.y = clamp_toward_zero(allowed.y, limit.y);
    }
    parked.pop();

    allowed
}

/// Limit imposed on a mover at `from` by the box at `other`
fn try_move_into(
    table: &EntityTable,
    from: &Rect,
    other: usize,
    delta: IVec2,
    parked: &mut Vec<usize>,
    depth: u32,
) -> IVec2 {
    let target = table.entity(other);
    match target.collider.kind {
        ColliderKind::None => delta,
        ColliderKind::Static => distance_towards(from, &target.rect(), delta),
        ColliderKind::Moveable => {
            let gap = distance_towards(from, &target.rect(), delta);
            if depth >= MAX_PUSH_DEPTH {
                log::warn!("push chain deeper than {MAX_PUSH_DEPTH}, treating entity {other} as fixed");
                return gap;
            }
            // The crate can only go as far as whatever is behind it allows
            let pushed = resolve_movement(table, other, push_remainder(delta, gap), parked, depth + 1);
            gap + pushed
        }
    }
}

/// Motion left over for a pushed box once the pusher has closed the gap
#[inline]
fn push_remainder(delta: IVec2, gap: IVec2) -> IVec2 {
    IVec2::new(
        clamp_toward_zero(delta.x, delta.x - gap.x),
        clamp_toward_zero(delta.y, delta.y - gap.y),
    )
}

/// First static box overlapping `dest`, ignoring parked entities
fn static_overlap(table: &EntityTable, index: usize, dest: &Rect, parked: &[usize]) -> Option<usize> {
    (0..table.len()).find(|&other| {
        let entity = table.entity(other);
        other != index
            && !parked.contains(&other)
            && entity.collider.kind == ColliderKind::Static
            && dest.intersects(&entity.rect())
    })
}

/// Apply `resolved` to `index` and fire collision responses.
///
/// Returns false when the move was refused because it would end inside a
/// static box.
fn commit(
    table: &mut EntityTable,
    index: usize,
    resolved: IVec2,
    parked: &mut Vec<usize>,
    depth: u32,
) -> bool {
    let from = table.entity(index).rect();
    let dest = from.translated(resolved);

    if let Some(blocker) = static_overlap(table, index, &dest, parked) {
        debug_assert!(
            false,
            "entity {index} resolved into static entity {blocker} (delta {resolved})"
        );
        log::error!("entity {index} resolved into static entity {blocker}, dropping move");
        return false;
    }

    parked.push(index);
    for other in 0..table.len() {
        if parked.contains(&other) {
            continue;
        }
        // Boxes passed over on the way only matter when they never block
        let target = table.entity(other);
        let rect = target.rect();
        let touched = dest.intersects(&rect)
            || (target.collider.kind == ColliderKind::None && from.sweep_intersects(resolved, &rect));
        if touched {
            respond(table, index, &from, other, resolved, parked, depth);
        }
    }
    parked.pop();

    table.entity_mut(index).position += resolved.extend(0);
    true
}

/// Collision response of `other` to `mover`, which started at `from`.
///
/// Patrolling enemies push crates but never break objectives themselves.
fn respond(
    table: &mut EntityTable,
    mover: usize,
    from: &Rect,
    other: usize,
    resolved: IVec2,
    parked: &mut Vec<usize>,
    depth: u32,
) {
    let target = table.entity(other);
    match (target.collider.kind, target.kind) {
        (ColliderKind::Moveable, _) => {
            if depth >= MAX_PUSH_DEPTH {
                log::warn!("push response deeper than {MAX_PUSH_DEPTH}, entity {other} left in place");
                return;
            }
            let gap = distance_towards(from, &target.rect(), resolved);
            move_index(table, other, push_remainder(resolved, gap), parked, depth + 1);
        }
        (_, EntityKind::Objective { .. }) => {
            if matches!(table.entity(mover).kind, EntityKind::Enemy { .. }) {
                return;
            }
            if table.entity_mut(other).break_objective() {
                log::info!("Objective {other} broken");
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::entity::{Collider, Entity, Facing, Transparency};
    use glam::IVec3;

    fn at(x: i32, y: i32) -> IVec3 {
        IVec3::new(x * FIXED_ONE, y * FIXED_ONE, ENTITY_LAYER_Z)
    }

    fn spawn(table: &mut EntityTable, kind: EntityKind, x: i32, y: i32) -> EntityRef {
        let collider = match kind {
            EntityKind::Player | EntityKind::Enemy { .. } => Collider::actor(Transparency::Opaque),
            EntityKind::Crate => Collider::tile(ColliderKind::Moveable, Transparency::Opaque),
            EntityKind::Objective { .. } => Collider::tile(ColliderKind::None, Transparency::Opaque),
            _ => Collider::tile(ColliderKind::Static, Transparency::Opaque),
        };
        table.spawn(Entity::new(kind, at(x, y), collider)).unwrap()
    }

    fn pos(table: &EntityTable, entity: EntityRef) -> IVec3 {
        table.get(entity).unwrap().position
    }

    /// Gap between an actor and the tile next to it
    const ACTOR_GAP: i32 = FIXED_ONE - ACTOR_HALF_EXTENT - TILE_HALF_EXTENT;

    #[test]
    fn test_free_move() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        let moved = move_and_collide(&mut table, player, IVec2::new(300, 0)).unwrap();
        assert_eq!(moved, IVec2::new(300, 0));
        assert_eq!(pos(&table, player), at(0, 0) + IVec3::new(300, 0, 0));
    }

    #[test]
    fn test_wall_stops_at_touch() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        spawn(&mut table, EntityKind::Wall, 1, 0);

        let moved = move_and_collide(&mut table, player, IVec2::new(500, 0)).unwrap();
        assert_eq!(moved.x, ACTOR_GAP);

        // Flush against the wall: no further motion
        let moved = move_and_collide(&mut table, player, IVec2::new(500, 0)).unwrap();
        assert_eq!(moved, IVec2::ZERO);
    }

    #[test]
    fn test_wall_stops_negative_direction() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        spawn(&mut table, EntityKind::Wall, 0, -1);

        let moved = move_and_collide(&mut table, player, IVec2::new(0, -500)).unwrap();
        assert_eq!(moved.y, -ACTOR_GAP);
    }

    #[test]
    fn test_long_move_stops_at_far_wall() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        spawn(&mut table, EntityKind::Wall, 2, 0);

        // The destination lies past the wall; the wall still stops the move
        let moved = move_and_collide(&mut table, player, IVec2::new(4 * FIXED_ONE, 0)).unwrap();
        assert_eq!(moved.x, FIXED_ONE + ACTOR_GAP);
        assert_eq!(pos(&table, player), at(0, 0) + IVec3::new(FIXED_ONE + ACTOR_GAP, 0, 0));
    }

    #[test]
    fn test_long_move_stops_at_nearest_blocker() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        let enemy = table
            .spawn(Entity::new(
                EntityKind::Enemy { facing: Facing::West },
                IVec3::new(2100, 0, ENTITY_LAYER_Z),
                Collider::actor(Transparency::Opaque),
            ))
            .unwrap();
        spawn(&mut table, EntityKind::Wall, 3, 0);

        // Only the wall overlaps the destination; the enemy in between wins
        let moved = move_and_collide(&mut table, player, IVec2::new(3000, 0)).unwrap();
        assert_eq!(moved.x, 2100 - 2 * ACTOR_HALF_EXTENT);
        let enemy_rect = table.get(enemy).unwrap().rect();
        assert!(!table.get(player).unwrap().rect().intersects(&enemy_rect));
    }

    #[test]
    fn test_long_move_breaks_objective_passed_over() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        let objective = spawn(&mut table, EntityKind::Objective { broken: false }, 2, 0);

        let moved = move_and_collide(&mut table, player, IVec2::new(4 * FIXED_ONE, 0)).unwrap();
        assert_eq!(moved.x, 4 * FIXED_ONE);
        assert!(table.get(objective).unwrap().is_broken());
    }

    #[test]
    fn test_long_move_pushes_distant_crate() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        let crate_ref = spawn(&mut table, EntityKind::Crate, 3, 0);

        let moved = move_and_collide(&mut table, player, IVec2::new(3000, 0)).unwrap();
        assert_eq!(moved.x, 3000);
        let gap = 2 * FIXED_ONE + ACTOR_GAP;
        assert_eq!(pos(&table, crate_ref).x, 3 * FIXED_ONE + 3000 - gap);
    }

    #[test]
    fn test_push_single_crate() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        let crate_ref = spawn(&mut table, EntityKind::Crate, 1, 0);

        let moved = move_and_collide(&mut table, player, IVec2::new(400, 0)).unwrap();
        assert_eq!(moved.x, 400);
        // The crate moves by whatever is left after the gap closes
        assert_eq!(pos(&table, crate_ref).x, FIXED_ONE + 400 - ACTOR_GAP);
    }

    #[test]
    fn test_push_chain_blocked_by_wall() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        let a = spawn(&mut table, EntityKind::Crate, 1, 0);
        let b = spawn(&mut table, EntityKind::Crate, 2, 0);
        spawn(&mut table, EntityKind::Wall, 3, 0);

        let moved = move_and_collide(&mut table, player, IVec2::new(600, 0)).unwrap();
        assert_eq!(moved.x, ACTOR_GAP);
        assert_eq!(pos(&table, a), at(1, 0));
        assert_eq!(pos(&table, b), at(2, 0));

        let moved = move_and_collide(&mut table, player, IVec2::new(600, 0)).unwrap();
        assert_eq!(moved, IVec2::ZERO);
    }

    #[test]
    fn test_push_chain_with_room() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        let a = spawn(&mut table, EntityKind::Crate, 1, 0);
        let b = spawn(&mut table, EntityKind::Crate, 2, 0);
        spawn(&mut table, EntityKind::Wall, 4, 0);

        // Close the gap, then push a full tile: the chain has one tile of room
        move_and_collide(&mut table, player, IVec2::new(ACTOR_GAP, 0)).unwrap();
        let moved = move_and_collide(&mut table, player, IVec2::new(FIXED_ONE + 200, 0)).unwrap();
        assert_eq!(moved.x, FIXED_ONE);
        assert_eq!(pos(&table, a), at(2, 0));
        assert_eq!(pos(&table, b), at(3, 0));
    }

    #[test]
    fn test_objective_breaks_without_blocking() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        let objective = spawn(&mut table, EntityKind::Objective { broken: false }, 1, 0);

        let moved = move_and_collide(&mut table, player, IVec2::new(600, 0)).unwrap();
        assert_eq!(moved.x, 600);
        let entity = table.get(objective).unwrap();
        assert!(entity.is_broken());
        assert_eq!(entity.collider.transparency, Transparency::Transparent);

        // Walking through it again keeps it broken
        move_and_collide(&mut table, player, IVec2::new(300, 0)).unwrap();
        assert!(table.get(objective).unwrap().is_broken());
    }

    #[test]
    fn test_pushed_crate_breaks_objective() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        spawn(&mut table, EntityKind::Crate, 1, 0);
        let objective = spawn(&mut table, EntityKind::Objective { broken: false }, 2, 0);

        move_and_collide(&mut table, player, IVec2::new(ACTOR_GAP + 100, 0)).unwrap();
        assert!(table.get(objective).unwrap().is_broken());
    }

    #[test]
    fn test_enemy_walks_over_objective() {
        let mut table = EntityTable::default();
        let enemy = spawn(&mut table, EntityKind::Enemy { facing: Facing::East }, 0, 0);
        let objective = spawn(&mut table, EntityKind::Objective { broken: false }, 1, 0);

        let moved = move_and_collide(&mut table, enemy, IVec2::new(600, 0)).unwrap();
        assert_eq!(moved.x, 600);
        assert!(!table.get(objective).unwrap().is_broken());
    }

    #[test]
    fn test_zero_delta_is_noop() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        let objective = spawn(&mut table, EntityKind::Objective { broken: false }, 0, 0);
        let before = table.clone();

        let moved = move_and_collide(&mut table, player, IVec2::ZERO).unwrap();
        assert_eq!(moved, IVec2::ZERO);
        assert_eq!(table.entities(), before.entities());
        assert!(!table.get(objective).unwrap().is_broken());
    }

    #[test]
    fn test_perpendicular_neighbors_do_not_block() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        spawn(&mut table, EntityKind::Wall, 0, 1);
        spawn(&mut table, EntityKind::Wall, 0, -1);

        let moved = move_and_collide(&mut table, player, IVec2::new(700, 0)).unwrap();
        assert_eq!(moved.x, 700);
    }

    #[test]
    fn test_collided_movement_does_not_mutate() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        let crate_ref = spawn(&mut table, EntityKind::Crate, 1, 0);

        let allowed = collided_movement(&table, player, IVec2::new(400, 0)).unwrap();
        assert_eq!(allowed.x, 400);
        assert_eq!(pos(&table, player), at(0, 0));
        assert_eq!(pos(&table, crate_ref), at(1, 0));
    }

    #[test]
    fn test_stale_ref_is_rejected() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        table.clear();
        spawn(&mut table, EntityKind::Wall, 0, 0);

        let err = move_and_collide(&mut table, player, IVec2::new(10, 0)).unwrap_err();
        assert!(matches!(err, SimError::StaleRef(_)));
    }

    #[test]
    fn test_long_chain_is_capped() {
        let mut table = EntityTable::default();
        let player = spawn(&mut table, EntityKind::Player, 0, 0);
        let crates: Vec<_> = (1..=MAX_PUSH_DEPTH as i32 + 4)
            .map(|x| spawn(&mut table, EntityKind::Crate, x, 0))
            .collect();

        move_and_collide(&mut table, player, IVec2::new(ACTOR_GAP, 0)).unwrap();
        let moved = move_and_collide(&mut table, player, IVec2::new(100, 0)).unwrap();
        // The chain beyond the cap acts as a wall
        assert_eq!(moved, IVec2::ZERO);
        for (i, c) in crates.iter().enumerate() {
            assert_eq!(pos(&table, *c), at(i as i32 + 1, 0));
        }
    }
}
