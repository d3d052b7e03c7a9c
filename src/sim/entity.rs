//! Entity table and collider model
//!
//! One flat, fixed-capacity table per stage. Entities are appended while the
//! stage loads and are never removed or reordered; the whole table is cleared
//! when the stage resets. References carry the table generation so a ref
//! taken before a reset no longer resolves afterwards.

use bitflags::bitflags;
use glam::{IVec2, IVec3, Vec3};
use serde::{Deserialize, Serialize};

use super::geometry::{Aabb, Rect};
use crate::assets::Appearance;
use crate::consts::*;
use crate::error::SimError;
use crate::to_world;

/// Cardinal facing for patrolling enemies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    North,
    East,
    South,
    West,
}

impl Facing {
    pub const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    pub fn index(self) -> u32 {
        match self {
            Facing::North => 0,
            Facing::East => 1,
            Facing::South => 2,
            Facing::West => 3,
        }
    }

    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index % 4) as usize]
    }

    /// Unit step on the tile plane (+y is north)
    pub fn step(self) -> IVec2 {
        match self {
            Facing::North => IVec2::Y,
            Facing::East => IVec2::X,
            Facing::South => IVec2::NEG_Y,
            Facing::West => IVec2::NEG_X,
        }
    }

    /// Heading in radians, counter-clockwise from +x
    pub fn angle(self) -> f32 {
        use std::f32::consts::{FRAC_PI_2, PI};
        match self {
            Facing::East => 0.0,
            Facing::North => FRAC_PI_2,
            Facing::West => PI,
            Facing::South => -FRAC_PI_2,
        }
    }
}

/// What an entity is. Drives gameplay, not collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Crate,
    Wall,
    GlassWall,
    Objective { broken: bool },
    Enemy { facing: Facing },
    MirrorWall,
    ColoredWall,
}

bitflags! {
    /// Set of entity kinds, used to filter raycast targets
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct KindMask: u16 {
        const PLAYER = 1 << 0;
        const CRATE = 1 << 1;
        const WALL = 1 << 2;
        const GLASS_WALL = 1 << 3;
        const OBJECTIVE = 1 << 4;
        const ENEMY = 1 << 5;
        const MIRROR_WALL = 1 << 6;
        const COLORED_WALL = 1 << 7;
    }
}

impl EntityKind {
    pub fn mask(&self) -> KindMask {
        match self {
            EntityKind::Player => KindMask::PLAYER,
            EntityKind::Crate => KindMask::CRATE,
            EntityKind::Wall => KindMask::WALL,
            EntityKind::GlassWall => KindMask::GLASS_WALL,
            EntityKind::Objective { .. } => KindMask::OBJECTIVE,
            EntityKind::Enemy { .. } => KindMask::ENEMY,
            EntityKind::MirrorWall => KindMask::MIRROR_WALL,
            EntityKind::ColoredWall => KindMask::COLORED_WALL,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Crate => "crate",
            EntityKind::Wall => "wall",
            EntityKind::GlassWall => "glass wall",
            EntityKind::Objective { .. } => "objective",
            EntityKind::Enemy { .. } => "enemy",
            EntityKind::MirrorWall => "mirror wall",
            EntityKind::ColoredWall => "coloured wall",
        }
    }
}

/// How an entity takes part in blocking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColliderKind {
    /// Never blocks; still receives collision response
    None,
    /// Blocks and cannot be pushed
    Static,
    /// Blocks unless it can be pushed out of the way
    Moveable,
}

/// How an entity is treated by the raycaster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transparency {
    Opaque,
    Transparent,
    Mirror,
    Camouflage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collider {
    pub kind: ColliderKind,
    pub transparency: Transparency,
    /// Half extent in fixed-point units
    pub half_extent: IVec3,
    /// Camouflage tag; `None` never matches anything
    pub camouflage: Option<u8>,
}

impl Collider {
    pub fn new(kind: ColliderKind, transparency: Transparency, half_extent: IVec3) -> Self {
        debug_assert!(half_extent.cmpge(IVec3::ZERO).all(), "negative half extent");
        Self {
            kind,
            transparency,
            half_extent,
            camouflage: None,
        }
    }

    /// Full-tile collider
    pub fn tile(kind: ColliderKind, transparency: Transparency) -> Self {
        Self::new(kind, transparency, IVec3::splat(TILE_HALF_EXTENT))
    }

    /// Player/enemy sized collider
    pub fn actor(transparency: Transparency) -> Self {
        Self::new(
            ColliderKind::Static,
            transparency,
            IVec3::new(ACTOR_HALF_EXTENT, ACTOR_HALF_EXTENT, ACTOR_HALF_HEIGHT),
        )
    }

    pub fn with_camouflage(mut self, tag: Option<u8>) -> Self {
        self.camouflage = tag;
        self
    }

    /// True when both colliders carry the same camouflage tag
    pub fn blends_with(&self, other: &Collider) -> bool {
        matches!((self.camouflage, other.camouflage), (Some(a), Some(b)) if a == b)
    }
}

/// One slot of the entity table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    /// Fixed-point position of the box centre
    pub position: IVec3,
    pub collider: Collider,
    /// Render pass-through
    pub appearance: Appearance,
}

impl Entity {
    pub fn new(kind: EntityKind, position: IVec3, collider: Collider) -> Self {
        Self {
            kind,
            position,
            collider,
            appearance: Appearance::default(),
        }
    }

    /// Footprint on the tile plane
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.position.truncate(), self.collider.half_extent.truncate())
    }

    /// World-space box for raycasting
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(self.world_position(), to_world(self.collider.half_extent))
    }

    pub fn world_position(&self) -> Vec3 {
        to_world(self.position)
    }

    pub fn is_broken(&self) -> bool {
        matches!(self.kind, EntityKind::Objective { broken: true })
    }

    /// Mark an objective broken and let rays pass through it.
    ///
    /// Returns true only on the first call for a given objective.
    pub fn break_objective(&mut self) -> bool {
        match &mut self.kind {
            EntityKind::Objective { broken } if !*broken => {
                *broken = true;
                self.collider.transparency = Transparency::Transparent;
                true
            }
            _ => false,
        }
    }
}

/// Stable handle to a table slot, valid until the table is rebuilt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub index: u32,
    pub generation: u32,
}

/// Fixed-capacity, append-only entity storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTable {
    entities: Vec<Entity>,
    capacity: usize,
    generation: u32,
}

impl Default for EntityTable {
    fn default() -> Self {
        Self::with_capacity(MAX_ENTITIES)
    }
}

impl EntityTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity.min(MAX_ENTITIES)),
            capacity,
            generation: 0,
        }
    }

    /// Append an entity
    pub fn spawn(&mut self, entity: Entity) -> Result<EntityRef, SimError> {
        if self.entities.len() >= self.capacity {
            return Err(SimError::TableFull {
                capacity: self.capacity,
            });
        }
        self.entities.push(entity);
        Ok(self.ref_at(self.entities.len() - 1))
    }

    /// Drop every entity and invalidate all outstanding refs
    pub fn clear(&mut self) {
        self.entities.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Slot index for a ref, if it is still live
    pub fn resolve(&self, entity: EntityRef) -> Result<usize, SimError> {
        let index = entity.index as usize;
        if entity.generation != self.generation || index >= self.entities.len() {
            return Err(SimError::StaleRef(entity));
        }
        Ok(index)
    }

    pub fn get(&self, entity: EntityRef) -> Option<&Entity> {
        self.resolve(entity).ok().map(|i| &self.entities[i])
    }

    pub fn get_mut(&mut self, entity: EntityRef) -> Option<&mut Entity> {
        self.resolve(entity).ok().map(move |i| &mut self.entities[i])
    }

    /// Ref for a slot in the current generation
    #[inline]
    pub fn ref_at(&self, index: usize) -> EntityRef {
        EntityRef {
            index: index as u32,
            generation: self.generation,
        }
    }

    #[inline]
    pub fn entity(&self, index: usize) -> &Entity {
        &self.entities[index]
    }

    #[inline]
    pub fn entity_mut(&mut self, index: usize) -> &mut Entity {
        &mut self.entities[index]
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Live refs to every entity matching `mask`, in table order
    pub fn refs_of(&self, mask: KindMask) -> Vec<EntityRef> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(_, e)| mask.contains(e.kind.mask()))
            .map(|(i, _)| self.ref_at(i))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}
