//! Built-in stages
//!
//! Played in order; clearing the last one wraps back to the first.

use super::level::TileMap;
use crate::error::SimError;

/// (name, layout) pairs
pub const BUILTIN_STAGES: &[(&str, &str)] = &[
    ("First Steps", FIRST_STEPS),
    ("Hall of Mirrors", HALL_OF_MIRRORS),
    ("Chameleon", CHAMELEON),
];

/// Push a crate into the guard's line of sight before walking past it.
const FIRST_STEPS: &str = "
###########
#P....#...#
#..C..#.O.#
#.....C...#
#..####...#
#.......<.#
###########
";

/// Glass hides nothing and the corner mirrors watch the whole room.
const HALL_OF_MIRRORS: &str = "
#############
#M....v....M#
#...........#
#..C.GGG.C..#
#...........#
#P...O#O...M#
#############
";

/// Walk along the coloured walls with the matching camouflage.
const CHAMELEON: &str = "
###############
#P..1111111...#
#.....C....O..#
#...22222.....#
#.........2...#
#^....O...2..<#
###############
";

/// Parse every built-in stage
pub fn builtin() -> Result<Vec<TileMap>, SimError> {
    BUILTIN_STAGES
        .iter()
        .map(|(name, layout)| TileMap::parse(name, layout))
        .collect()
}
