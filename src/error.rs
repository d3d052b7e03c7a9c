//! Error type for the simulation core
//!
//! Blocked movement and missing line of sight are normal outcomes and never
//! show up here. These are loading failures and programming errors.

use thiserror::Error;

use crate::sim::entity::EntityRef;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("entity table is full (capacity {capacity})")]
    TableFull { capacity: usize },

    #[error("stale entity reference {0:?}")]
    StaleRef(EntityRef),

    #[error("stage has no player spawn")]
    MissingPlayer,

    #[error("stage has a second player spawn at ({x}, {y})")]
    DuplicatePlayer { x: u32, y: u32 },

    #[error("unknown tile {ch:?} at ({x}, {y})")]
    UnknownTile { ch: char, x: u32, y: u32 },

    #[error("row {row} is {found} tiles wide, expected {expected}")]
    RaggedRow { row: u32, expected: u32, found: u32 },

    #[error("pixel buffer holds {found} bytes, expected {expected} for {width}x{height} RGB")]
    PixelBuffer {
        width: u32,
        height: u32,
        expected: usize,
        found: usize,
    },

    #[error("no stages to play")]
    NoStages,

    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Json(#[from] serde_json::Error),
}
