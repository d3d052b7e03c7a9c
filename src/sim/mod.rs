//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Fixed-point positions, stable iteration order (by table slot)
//! - No rendering or platform dependencies

pub mod collision;
pub mod entity;
pub mod geometry;
pub mod level;
pub mod raycast;
pub mod stages;
pub mod state;
pub mod tick;
pub mod vision;

pub use collision::{collided_movement, move_and_collide};
pub use entity::{
    Collider, ColliderKind, Entity, EntityKind, EntityRef, EntityTable, Facing, KindMask, Transparency,
};
pub use geometry::{Aabb, Rect};
pub use level::{Tile, TileMap, spawn_level};
pub use raycast::{RaycastResult, raycast};
pub use state::{GamePhase, GameState, RngState};
pub use tick::{TickInput, tick};
pub use vision::{VISION_MASK, VisionCone, enemy_sees_player};
