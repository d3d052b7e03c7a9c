//! Render handles for entity kinds
//!
//! The simulation never touches GPU resources. Stage loading receives an
//! explicit registry and copies the matching `Appearance` onto each entity;
//! the renderer resolves the texture ids on its side.

use serde::{Deserialize, Serialize};

use crate::sim::entity::{EntityKind, KindMask};

/// Opaque texture handle owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureId(pub u32);

/// How an entity should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    /// Texture, or `None` for a flat coloured cube
    pub texture: Option<TextureId>,
    pub color: [f32; 3],
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            texture: None,
            color: [1.0, 1.0, 1.0],
        }
    }
}

/// Colours for each camouflage tag (index 0 is untagged)
pub const CAMOUFLAGE_PALETTE: [[f32; 3]; 10] = [
    [1.0, 1.0, 1.0],
    [0.85, 0.2, 0.2],
    [0.2, 0.75, 0.3],
    [0.25, 0.4, 0.9],
    [0.9, 0.8, 0.2],
    [0.7, 0.3, 0.8],
    [0.2, 0.8, 0.8],
    [0.95, 0.55, 0.15],
    [0.5, 0.5, 0.5],
    [0.1, 0.1, 0.1],
];

/// Colour for a camouflage tag
pub fn camouflage_color(tag: Option<u8>) -> [f32; 3] {
    let index = tag.map(usize::from).unwrap_or(0);
    CAMOUFLAGE_PALETTE[index.min(CAMOUFLAGE_PALETTE.len() - 1)]
}

/// Kind -> appearance lookup handed to stage loading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRegistry {
    entries: Vec<(KindMask, Appearance)>,
}

impl Default for AssetRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(KindMask::WALL, Appearance {
            texture: Some(TextureId(1)),
            color: [1.0, 1.0, 1.0],
        });
        registry.register(KindMask::CRATE, Appearance {
            texture: Some(TextureId(2)),
            color: [1.0, 1.0, 1.0],
        });
        registry.register(KindMask::OBJECTIVE, Appearance {
            texture: None,
            color: [0.0, 1.0, 0.0],
        });
        registry.register(KindMask::PLAYER, Appearance {
            texture: None,
            color: [0.0, 0.0, 1.0],
        });
        registry.register(KindMask::ENEMY, Appearance {
            texture: None,
            color: [1.0, 0.1, 0.1],
        });
        registry.register(KindMask::GLASS_WALL, Appearance {
            texture: None,
            color: [0.6, 0.8, 1.0],
        });
        registry.register(KindMask::MIRROR_WALL, Appearance {
            texture: None,
            color: [0.85, 0.85, 0.9],
        });
        registry
    }
}

impl AssetRegistry {
    /// A registry with no entries; every kind draws as a white cube
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register an appearance for every kind in `kinds`, replacing earlier entries
    pub fn register(&mut self, kinds: KindMask, appearance: Appearance) {
        self.entries.retain(|(registered, _)| !kinds.contains(*registered));
        self.entries.push((kinds, appearance));
    }

    /// Appearance for an entity kind
    ///
    /// Coloured walls take their colour from the camouflage palette.
    pub fn appearance(&self, kind: &EntityKind, camouflage: Option<u8>) -> Appearance {
        let mask = kind.mask();
        let base = self
            .entries
            .iter()
            .rev()
            .find(|(registered, _)| registered.contains(mask))
            .map(|(_, appearance)| *appearance)
            .unwrap_or_default();

        match kind {
            EntityKind::ColoredWall => Appearance {
                texture: base.texture,
                color: camouflage_color(camouflage),
            },
            _ => base,
        }
    }
}
