//! Sneak Box - a tile-grid stealth puzzle game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (collision resolver, raycaster, gameplay tick)
//! - `settings`: Data-driven tuning loaded from JSON
//! - `assets`: Render handles passed into stage loading
//! - `debug`: Debug overlay line buffers for the renderer
//! - `error`: Error type for programming/loading failures

pub mod assets;
pub mod debug;
pub mod error;
pub mod settings;
pub mod sim;

pub use assets::AssetRegistry;
pub use error::SimError;
pub use settings::{Difficulty, Settings};

use glam::{IVec3, Vec3};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Fixed-point units per tile
    pub const FIXED_ONE: i32 = 1024;
    /// Height of the entity layer above the ground
    pub const ENTITY_LAYER_Z: i32 = FIXED_ONE;

    /// Half extent of a full tile
    pub const TILE_HALF_EXTENT: i32 = FIXED_ONE / 2;
    /// Player and enemy footprint (0.35 tiles)
    pub const ACTOR_HALF_EXTENT: i32 = 358;
    /// Player and enemy height (0.7 tiles)
    pub const ACTOR_HALF_HEIGHT: i32 = 717;

    /// Default entity table capacity
    pub const MAX_ENTITIES: usize = 4096;

    /// Deepest push chain followed before boxes are treated as immovable
    pub const MAX_PUSH_DEPTH: u32 = 16;
    /// Deepest mirror/camouflage recursion before a ray is dropped
    pub const MAX_RAY_DEPTH: u32 = 16;

    /// Minimum parametric distance for a ray hit
    pub const RAY_EPSILON: f32 = 1e-4;
    /// Tolerance when deciding which mirror face a ray struck
    pub const FACE_PRECISION: f32 = 1e-3;

    /// Number of distinct camouflage colours the player can cycle through
    pub const CAMOUFLAGE_COLORS: u8 = 3;
}

/// Convert a fixed-point position to world units
#[inline]
pub fn to_world(pos: IVec3) -> Vec3 {
    pos.as_vec3() / consts::FIXED_ONE as f32
}

/// Convert a world distance to fixed-point units (truncating)
#[inline]
pub fn to_fixed(world: f32) -> i32 {
    (world * consts::FIXED_ONE as f32) as i32
}

/// Halton low-discrepancy sequence, element `i` in base `b`
pub fn halton(mut i: u32, b: u32) -> f32 {
    let mut f = 1.0;
    let mut r = 0.0;
    while i > 0 {
        f /= b as f32;
        r += f * (i % b) as f32;
        i /= b;
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_world_round_trip() {
        let pos = IVec3::new(3 * consts::FIXED_ONE, consts::FIXED_ONE / 2, 0);
        let world = to_world(pos);
        assert!((world.x - 3.0).abs() < 1e-6);
        assert!((world.y - 0.5).abs() < 1e-6);
        assert_eq!(to_fixed(world.x), 3 * consts::FIXED_ONE);
    }

    #[test]
    fn test_halton_base_two() {
        assert_eq!(halton(0, 2), 0.0);
        assert!((halton(1, 2) - 0.5).abs() < 1e-6);
        assert!((halton(2, 2) - 0.25).abs() < 1e-6);
        assert!((halton(3, 2) - 0.75).abs() < 1e-6);
    }
}
