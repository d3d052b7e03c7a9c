//! Game state and core simulation types
//!
//! Everything needed to replay a run lives here and serializes with serde.
//! Debug lines are the only exception.

use glam::Vec2;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind, EntityRef, EntityTable, KindMask};
use super::level::{TileMap, spawn_level};
use crate::assets::{Appearance, AssetRegistry, camouflage_color};
use crate::debug::DebugLine;
use crate::error::SimError;
use crate::settings::Settings;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Spotted by an enemy; the stage restarts when the timer runs out
    Caught { ticks_left: u32 },
    /// Every objective broken; the next stage loads when the timer runs out
    Cleared { ticks_left: u32 },
}

/// RNG state wrapper for serialization
///
/// The generator is rebuilt from the seed and advanced past every earlier
/// draw, so a saved state resumes the exact same sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub draws: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, draws: 0 }
    }

    pub fn to_rng(&self) -> Pcg32 {
        let mut rng = Pcg32::seed_from_u64(self.seed);
        rng.advance(self.draws);
        rng
    }

    pub fn next_u32(&mut self) -> u32 {
        let value = self.to_rng().next_u32();
        self.draws += 1;
        value
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng_state: RngState,
    /// Stages in play order
    pub stages: Vec<TileMap>,
    pub stage_index: usize,
    pub phase: GamePhase,
    pub entities: EntityTable,
    pub player: EntityRef,
    /// Current player camouflage tag
    pub camouflage: Option<u8>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Sub-unit player motion carried to the next tick, in fixed-point units
    pub move_remainder: Vec2,
    pub settings: Settings,
    pub assets: AssetRegistry,
    /// Vision rays from the last tick, when enabled
    #[serde(skip)]
    pub debug_lines: Vec<DebugLine>,
    /// Times the player has been spotted
    pub times_caught: u32,
    /// Stages cleared this run
    pub stages_cleared: u32,
}

impl GameState {
    /// Create a new run on the first stage
    pub fn new(seed: u64, stages: Vec<TileMap>, settings: Settings, assets: AssetRegistry) -> Result<Self, SimError> {
        if stages.is_empty() {
            return Err(SimError::NoStages);
        }

        let mut state = Self {
            seed,
            rng_state: RngState::new(seed),
            stages,
            stage_index: 0,
            phase: GamePhase::Playing,
            entities: EntityTable::with_capacity(settings.entity_capacity),
            player: EntityRef {
                index: 0,
                generation: 0,
            },
            camouflage: None,
            time_ticks: 0,
            move_remainder: Vec2::ZERO,
            settings,
            assets,
            debug_lines: Vec::new(),
            times_caught: 0,
            stages_cleared: 0,
        };

        // Catch a broken stage now rather than mid-run
        for index in 1..state.stages.len() {
            state.load_stage(index)?;
        }
        state.load_stage(0)?;

        Ok(state)
    }

    /// Rebuild the world from stage `index` (wrapping) and resume play
    pub fn load_stage(&mut self, index: usize) -> Result<(), SimError> {
        let index = index % self.stages.len();
        self.player = spawn_level(&mut self.entities, &self.stages[index], &self.assets)?;
        self.stage_index = index;
        self.phase = GamePhase::Playing;
        self.camouflage = None;
        self.move_remainder = Vec2::ZERO;
        self.debug_lines.clear();
        Ok(())
    }

    pub fn stage(&self) -> &TileMap {
        &self.stages[self.stage_index]
    }

    pub fn player_entity(&self) -> Option<&Entity> {
        self.entities.get(self.player)
    }

    /// Objectives not yet broken on the current stage
    pub fn objectives_remaining(&self) -> usize {
        self.entities
            .entities()
            .iter()
            .filter(|e| matches!(e.kind, EntityKind::Objective { broken: false }))
            .count()
    }

    /// Refs to every enemy in table order
    pub fn enemies(&self) -> Vec<EntityRef> {
        self.entities.refs_of(KindMask::ENEMY)
    }

    /// Change the player's camouflage tag and repaint them to match
    pub fn set_camouflage(&mut self, tag: Option<u8>) -> Result<(), SimError> {
        let appearance = self.assets.appearance(&EntityKind::Player, None);
        let player = self
            .entities
            .get_mut(self.player)
            .ok_or(SimError::StaleRef(self.player))?;
        player.collider.camouflage = tag;
        player.appearance = match tag {
            Some(_) => Appearance {
                texture: appearance.texture,
                color: camouflage_color(tag),
            },
            None => appearance,
        };
        self.camouflage = tag;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::stages;

    fn new_state(seed: u64) -> GameState {
        GameState::new(seed, stages::builtin().unwrap(), Settings::default(), AssetRegistry::default()).unwrap()
    }

    #[test]
    fn test_new_starts_on_first_stage() {
        let state = new_state(1);
        assert_eq!(state.stage_index, 0);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.player_entity().unwrap().kind, EntityKind::Player);
        assert!(state.objectives_remaining() > 0);
    }

    #[test]
    fn test_no_stages() {
        let result = GameState::new(1, Vec::new(), Settings::default(), AssetRegistry::default());
        assert!(matches!(result, Err(SimError::NoStages)));
    }

    #[test]
    fn test_capacity_checked_for_every_stage() {
        let settings = Settings {
            entity_capacity: 8,
            ..Settings::default()
        };
        let result = GameState::new(1, stages::builtin().unwrap(), settings, AssetRegistry::default());
        assert!(matches!(result, Err(SimError::TableFull { capacity: 8 })));
    }

    #[test]
    fn test_load_stage_wraps_and_invalidates_refs() {
        let mut state = new_state(1);
        let old_player = state.player;
        let count = state.stages.len();

        state.load_stage(count + 1).unwrap();
        assert_eq!(state.stage_index, 1);
        assert!(state.entities.get(old_player).is_none());
        assert!(state.player_entity().is_some());
    }

    #[test]
    fn test_rng_resumes_after_round_trip() {
        let mut a = RngState::new(42);
        a.next_u32();
        a.next_u32();

        let json = serde_json::to_string(&a).unwrap();
        let mut b: RngState = serde_json::from_str(&json).unwrap();
        assert_eq!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn test_set_camouflage_repaints() {
        let mut state = new_state(1);
        state.set_camouflage(Some(2)).unwrap();
        let player = state.player_entity().unwrap();
        assert_eq!(player.collider.camouflage, Some(2));
        assert_eq!(player.appearance.color, camouflage_color(Some(2)));

        state.set_camouflage(None).unwrap();
        assert_eq!(state.player_entity().unwrap().appearance.color, [0.0, 0.0, 1.0]);
    }
}
