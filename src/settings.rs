//! Game settings and tuning
//!
//! Loaded from a JSON file next to the binary. Missing fields fall back to
//! their defaults so older files keep working.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_ENTITIES;
use crate::error::SimError;

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// How far enemies see, in tiles
    pub fn vision_range(&self) -> f32 {
        match self {
            Difficulty::Easy => 5.0,
            Difficulty::Normal => 8.0,
            Difficulty::Hard => 12.0,
        }
    }

    /// Full vision cone angle in radians
    pub fn vision_fov(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Normal => 1.2,
            Difficulty::Hard => 1.6,
        }
    }

    /// Rays sampled per enemy per tick
    pub fn vision_rays(&self) -> u32 {
        match self {
            Difficulty::Easy => 12,
            Difficulty::Normal => 24,
            Difficulty::Hard => 40,
        }
    }

    /// Enemy patrol speed in tiles/second
    pub fn enemy_speed(&self) -> f32 {
        match self {
            Difficulty::Easy => 1.5,
            Difficulty::Normal => 2.0,
            Difficulty::Hard => 3.0,
        }
    }
}

/// Gameplay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,

    // === Movement ===
    /// Player speed in tiles/second
    pub player_speed: f32,
    /// Enemy patrol speed in tiles/second
    pub enemy_speed: f32,

    // === Vision ===
    /// Full vision cone angle in radians
    pub vision_fov: f32,
    /// Vision range in tiles
    pub vision_range: f32,
    /// Rays sampled per enemy per tick
    pub vision_rays: u32,
    /// Shift sample angles every tick so thin gaps get covered
    pub vision_jitter: bool,

    // === Flow ===
    /// Ticks to hold after being caught or clearing a stage
    pub reset_delay_ticks: u32,
    /// Entity table capacity
    pub entity_capacity: usize,

    // === Debug ===
    /// Emit a debug line for every vision ray
    pub debug_rays: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_difficulty(Difficulty::Normal)
    }
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            player_speed: 10.0,
            enemy_speed: difficulty.enemy_speed(),
            vision_fov: difficulty.vision_fov(),
            vision_range: difficulty.vision_range(),
            vision_rays: difficulty.vision_rays(),
            vision_jitter: true,
            reset_delay_ticks: 45,
            entity_capacity: MAX_ENTITIES,
            debug_rays: false,
        }
    }

    /// Apply a difficulty preset (updates the vision and patrol tuning)
    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.enemy_speed = difficulty.enemy_speed();
        self.vision_fov = difficulty.vision_fov();
        self.vision_range = difficulty.vision_range();
        self.vision_rays = difficulty.vision_rays();
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Using default settings: {err}");
                Self::default()
            }
        }
    }
}
