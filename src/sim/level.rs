//! Stage layouts and spawning
//!
//! A stage is a grid of tiles, written either as ASCII art or as a raw RGB
//! pixel buffer (one pixel per tile, decoded by the caller). Row 0 is the top
//! of the map, so north (+y) points up on screen.
//!
//! ASCII legend:
//!
//! | char      | tile                                  |
//! |-----------|---------------------------------------|
//! | `#`       | wall                                  |
//! | `G`       | glass wall (blocks, rays pass)        |
//! | `M`       | mirror wall                           |
//! | `1`..`9`  | coloured wall with that camouflage tag|
//! | `C`       | crate                                 |
//! | `O`       | objective                             |
//! | `P`       | player spawn                          |
//! | `^ > v <` | enemy facing north/east/south/west    |
//! | `.`, ` `  | floor                                 |

use glam::IVec3;
use serde::{Deserialize, Serialize};

use super::entity::{Collider, ColliderKind, Entity, EntityKind, EntityRef, EntityTable, Facing, Transparency};
use crate::assets::AssetRegistry;
use crate::consts::{ENTITY_LAYER_Z, FIXED_ONE};
use crate::error::SimError;

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Floor,
    Wall,
    GlassWall,
    MirrorWall,
    ColoredWall(u8),
    Crate,
    Objective,
    PlayerSpawn,
    EnemySpawn(Facing),
}

impl Tile {
    pub fn from_char(ch: char) -> Option<Self> {
        let tile = match ch {
            '.' | ' ' => Tile::Floor,
            '#' => Tile::Wall,
            'G' => Tile::GlassWall,
            'M' => Tile::MirrorWall,
            'C' => Tile::Crate,
            'O' => Tile::Objective,
            'P' => Tile::PlayerSpawn,
            '^' => Tile::EnemySpawn(Facing::North),
            '>' => Tile::EnemySpawn(Facing::East),
            'v' => Tile::EnemySpawn(Facing::South),
            '<' => Tile::EnemySpawn(Facing::West),
            '1'..='9' => Tile::ColoredWall(ch as u8 - b'0'),
            _ => return None,
        };
        Some(tile)
    }

    /// Tile for a pixel colour. Unknown colours are floor.
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        match rgb {
            [0, 0, 0] => Tile::Wall,
            [88, 57, 39] => Tile::Crate,
            [1, 125, 10] => Tile::Objective,
            [255, 0, 0] => Tile::PlayerSpawn,
            [150, 200, 255] => Tile::GlassWall,
            [200, 200, 200] => Tile::MirrorWall,
            [255, 0, 255] => Tile::EnemySpawn(Facing::North),
            [255, 0, 254] => Tile::EnemySpawn(Facing::East),
            [255, 0, 253] => Tile::EnemySpawn(Facing::South),
            [255, 0, 252] => Tile::EnemySpawn(Facing::West),
            [0, 0, tag @ 1..=9] => Tile::ColoredWall(tag),
            _ => Tile::Floor,
        }
    }

    /// Entity spawned for this tile at grid cell (x, y)
    pub fn entity(&self, x: u32, y: u32) -> Option<Entity> {
        let position = IVec3::new(x as i32 * FIXED_ONE, y as i32 * FIXED_ONE, ENTITY_LAYER_Z);
        let (kind, collider) = match *self {
            Tile::Floor => return None,
            Tile::Wall => (
                EntityKind::Wall,
                Collider::tile(ColliderKind::Static, Transparency::Opaque),
            ),
            Tile::GlassWall => (
                EntityKind::GlassWall,
                Collider::tile(ColliderKind::Static, Transparency::Transparent),
            ),
            Tile::MirrorWall => (
                EntityKind::MirrorWall,
                Collider::tile(ColliderKind::Static, Transparency::Mirror),
            ),
            Tile::ColoredWall(tag) => (
                EntityKind::ColoredWall,
                Collider::tile(ColliderKind::Static, Transparency::Opaque).with_camouflage(Some(tag)),
            ),
            Tile::Crate => (
                EntityKind::Crate,
                Collider::tile(ColliderKind::Moveable, Transparency::Opaque),
            ),
            Tile::Objective => (
                EntityKind::Objective { broken: false },
                Collider::tile(ColliderKind::None, Transparency::Opaque),
            ),
            Tile::PlayerSpawn => (EntityKind::Player, Collider::actor(Transparency::Camouflage)),
            Tile::EnemySpawn(facing) => (EntityKind::Enemy { facing }, Collider::actor(Transparency::Opaque)),
        };
        Some(Entity::new(kind, position, collider))
    }
}

/// A stage layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Row-major, row 0 at the top
    tiles: Vec<Tile>,
}

impl TileMap {
    /// Parse an ASCII stage. Blank leading/trailing lines are ignored.
    pub fn parse(name: &str, text: &str) -> Result<Self, SimError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .skip_while(|line| line.is_empty())
            .collect();
        let rows: Vec<&str> = match rows.iter().rposition(|line| !line.is_empty()) {
            Some(last) => rows[..=last].to_vec(),
            None => Vec::new(),
        };

        let height = rows.len() as u32;
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0) as u32;
        let mut tiles = Vec::with_capacity((width * height) as usize);

        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count() as u32;
            if found != width {
                return Err(SimError::RaggedRow {
                    row: row as u32,
                    expected: width,
                    found,
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let tile = Tile::from_char(ch).ok_or(SimError::UnknownTile {
                    ch,
                    x: col as u32,
                    y: row as u32,
                })?;
                tiles.push(tile);
            }
        }

        let map = Self {
            name: name.to_string(),
            width,
            height,
            tiles,
        };
        map.validate()?;
        Ok(map)
    }

    /// Build a stage from a decoded RGB image, 3 bytes per pixel
    pub fn from_rgb(name: &str, width: u32, height: u32, pixels: &[u8]) -> Result<Self, SimError> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(SimError::PixelBuffer {
                width,
                height,
                expected,
                found: pixels.len(),
            });
        }

        let tiles = pixels
            .chunks_exact(3)
            .map(|px| Tile::from_rgb([px[0], px[1], px[2]]))
            .collect();
        let map = Self {
            name: name.to_string(),
            width,
            height,
            tiles,
        };
        map.validate()?;
        Ok(map)
    }

    /// Exactly one player spawn
    fn validate(&self) -> Result<(), SimError> {
        let mut spawns = self.cells().filter(|(_, _, tile)| *tile == Tile::PlayerSpawn);
        if spawns.next().is_none() {
            return Err(SimError::MissingPlayer);
        }
        if let Some((x, y, _)) = spawns.next() {
            return Err(SimError::DuplicatePlayer { x, y });
        }
        Ok(())
    }

    /// Tile at world grid cell (x, y), y pointing up
    pub fn tile(&self, x: u32, y: u32) -> Option<Tile> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let row = self.height - 1 - y;
        self.tiles.get((row * self.width + x) as usize).copied()
    }

    /// Every cell as (x, y, tile) in world grid coordinates
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, Tile)> + '_ {
        self.tiles.iter().enumerate().map(move |(i, tile)| {
            let i = i as u32;
            let x = i % self.width;
            let y = self.height - 1 - i / self.width;
            (x, y, *tile)
        })
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|t| **t == tile).count()
    }
}

/// Rebuild `table` from `map` and return the player ref.
///
/// Every ref taken from the table before this call becomes stale.
pub fn spawn_level(table: &mut EntityTable, map: &TileMap, assets: &AssetRegistry) -> Result<EntityRef, SimError> {
    table.clear();

    let mut player = None;
    for (x, y, tile) in map.cells() {
        let Some(mut entity) = tile.entity(x, y) else {
            continue;
        };
        entity.appearance = assets.appearance(&entity.kind, entity.collider.camouflage);
        let entity_ref = table.spawn(entity)?;
        if tile == Tile::PlayerSpawn {
            if player.is_some() {
                return Err(SimError::DuplicatePlayer { x, y });
            }
            player = Some(entity_ref);
        }
    }

    let player = player.ok_or(SimError::MissingPlayer)?;
    log::info!(
        "Stage '{}' loaded: {}x{}, {} entities",
        map.name,
        map.width,
        map.height,
        table.len()
    );
    Ok(player)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "
#####
#P.C#
#.>O#
#####
";

    #[test]
    fn test_parse_orientation() {
        let map = TileMap::parse("small", SMALL).unwrap();
        assert_eq!((map.width, map.height), (5, 4));
        // Top row is y = height - 1
        assert_eq!(map.tile(1, 2), Some(Tile::PlayerSpawn));
        assert_eq!(map.tile(3, 2), Some(Tile::Crate));
        assert_eq!(map.tile(2, 1), Some(Tile::EnemySpawn(Facing::East)));
        assert_eq!(map.tile(0, 0), Some(Tile::Wall));
        assert_eq!(map.tile(5, 0), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(TileMap::parse("x", "#P#\n##"), Err(SimError::RaggedRow { row: 1, .. })));
        assert!(matches!(
            TileMap::parse("x", "#P?"),
            Err(SimError::UnknownTile { ch: '?', x: 2, y: 0 })
        ));
        assert!(matches!(TileMap::parse("x", "###"), Err(SimError::MissingPlayer)));
        assert!(matches!(TileMap::parse("x", "P.P"), Err(SimError::DuplicatePlayer { x: 2, .. })));
    }

    #[test]
    fn test_colored_walls_carry_tag() {
        let map = TileMap::parse("x", "P37").unwrap();
        assert_eq!(map.tile(1, 0), Some(Tile::ColoredWall(3)));
        let entity = Tile::ColoredWall(7).entity(2, 0).unwrap();
        assert_eq!(entity.collider.camouflage, Some(7));
    }

    #[test]
    fn test_from_rgb_uses_tile_colours() {
        #[rustfmt::skip]
        let pixels = [
            0, 0, 0,      255, 0, 0,
            88, 57, 39,   1, 125, 10,
        ];
        let map = TileMap::from_rgb("img", 2, 2, &pixels).unwrap();
        assert_eq!(map.tile(0, 1), Some(Tile::Wall));
        assert_eq!(map.tile(1, 1), Some(Tile::PlayerSpawn));
        assert_eq!(map.tile(0, 0), Some(Tile::Crate));
        assert_eq!(map.tile(1, 0), Some(Tile::Objective));

        assert!(matches!(
            TileMap::from_rgb("img", 2, 2, &pixels[..9]),
            Err(SimError::PixelBuffer { expected: 12, found: 9, .. })
        ));
    }

    #[test]
    fn test_spawn_level_builds_table() {
        let map = TileMap::parse("small", SMALL).unwrap();
        let mut table = EntityTable::default();
        let stale = table.spawn(Tile::Wall.entity(0, 0).unwrap()).unwrap();

        let player = spawn_level(&mut table, &map, &AssetRegistry::default()).unwrap();
        assert!(table.get(stale).is_none());

        let entity = table.get(player).unwrap();
        assert_eq!(entity.kind, EntityKind::Player);
        assert_eq!(entity.position, IVec3::new(FIXED_ONE, 2 * FIXED_ONE, ENTITY_LAYER_Z));
        assert_eq!(entity.collider.transparency, Transparency::Camouflage);
        assert_eq!(table.len(), 14 + 4);
        assert_eq!(entity.appearance.color, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_spawn_level_capacity() {
        let map = TileMap::parse("small", SMALL).unwrap();
        let mut table = EntityTable::with_capacity(4);
        assert!(matches!(
            spawn_level(&mut table, &map, &AssetRegistry::default()),
            Err(SimError::TableFull { capacity: 4 })
        ));
    }
}
