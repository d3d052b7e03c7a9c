//! Line-of-sight raycasting with mirrors and camouflage
//!
//! A ray first finds the nearest eligible box. What the ray *appears* to hit
//! is then resolved recursively:
//!
//! - Mirror: reflect off the struck face and keep going. While the bounced
//!   ray is traced the mirror counts as opaque, so coming back to it ends the
//!   ray instead of looping. The caster stays invisible to its own bounces.
//! - Camouflage: trace the same ray again with the entity suppressed. If the
//!   thing behind carries the same camouflage tag, the entity is invisible
//!   and the final hit becomes whatever is behind it.
//!
//! Suppressed and demoted entities live on an override stack that is threaded
//! through the recursion, so the entity table itself is never touched.

use glam::Vec3;

use super::entity::{EntityRef, EntityTable, KindMask, Transparency};
use super::geometry::{Aabb, ray_aabb};
use crate::consts::{FACE_PRECISION, MAX_RAY_DEPTH};

/// Result of a raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastResult {
    /// Whether the ray resolved to something visible
    pub hit: bool,
    /// Parametric distance to the first box struck
    pub t: f32,
    /// Point where the first box was struck
    pub hit_position: Vec3,
    /// Total path length to the final hit, including bounces
    pub distance: f32,
    /// First box the ray struck
    pub direct: Option<EntityRef>,
    /// What the ray resolved to after mirrors and camouflage
    pub final_hit: Option<EntityRef>,
}

impl RaycastResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            t: 0.0,
            hit_position: Vec3::ZERO,
            distance: 0.0,
            direct: None,
            final_hit: None,
        }
    }
}

/// Cast a ray from `origin` along `direction`.
///
/// Only entities whose kind is in `mask` can be struck. `origin_entity` is
/// never struck by its own ray. The direction does not need to be normalised;
/// `t` and `distance` are in world units.
pub fn raycast(
    table: &EntityTable,
    origin_entity: Option<EntityRef>,
    origin: Vec3,
    direction: Vec3,
    mask: KindMask,
) -> RaycastResult {
    let direction = direction.normalize_or_zero();
    if direction == Vec3::ZERO {
        return RaycastResult::miss();
    }

    let exclude = origin_entity.and_then(|entity| match table.resolve(entity) {
        Ok(index) => Some(index),
        Err(err) => {
            log::warn!("raycast origin ignored: {err}");
            None
        }
    });

    let ray = Ray {
        origin,
        direction,
        exclude,
        mask,
    };
    let mut overrides = Overrides::default();
    let trace = trace(table, &ray, &mut overrides, 0);
    debug_assert!(overrides.is_empty());

    RaycastResult {
        hit: trace.hit,
        t: trace.t,
        hit_position: trace.position,
        distance: trace.distance,
        direct: trace.direct.map(|i| table.ref_at(i)),
        final_hit: trace.final_hit.map(|i| table.ref_at(i)),
    }
}

struct Ray {
    origin: Vec3,
    direction: Vec3,
    exclude: Option<usize>,
    mask: KindMask,
}

/// Transparency overrides active for the current call tree
#[derive(Default)]
struct Overrides {
    stack: Vec<(usize, Transparency)>,
}

impl Overrides {
    fn transparency(&self, index: usize, own: Transparency) -> Transparency {
        self.stack
            .iter()
            .rev()
            .find(|(i, _)| *i == index)
            .map(|(_, t)| *t)
            .unwrap_or(own)
    }

    /// Run `f` with `index` treated as `transparency`
    fn with<R>(&mut self, index: usize, transparency: Transparency, f: impl FnOnce(&mut Self) -> R) -> R {
        self.stack.push((index, transparency));
        let result = f(self);
        self.stack.pop();
        result
    }

    fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

/// Internal trace result, in table indices
#[derive(Debug, Clone, Copy)]
struct Trace {
    hit: bool,
    t: f32,
    position: Vec3,
    distance: f32,
    direct: Option<usize>,
    final_hit: Option<usize>,
}

impl Trace {
    fn miss() -> Self {
        Self {
            hit: false,
            t: 0.0,
            position: Vec3::ZERO,
            distance: 0.0,
            direct: None,
            final_hit: None,
        }
    }
}

/// Nearest eligible box along the ray
fn nearest(table: &EntityTable, ray: &Ray, overrides: &Overrides) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (index, entity) in table.entities().iter().enumerate() {
        if Some(index) == ray.exclude || !ray.mask.contains(entity.kind.mask()) {
            continue;
        }
        if overrides.transparency(index, entity.collider.transparency) == Transparency::Transparent {
            continue;
        }
        if let Some(t) = ray_aabb(ray.origin, ray.direction, &entity.bounds()) {
            if best.is_none_or(|(_, best_t)| t < best_t) {
                best = Some((index, t));
            }
        }
    }
    best
}

fn trace(table: &EntityTable, ray: &Ray, overrides: &mut Overrides, depth: u32) -> Trace {
    if depth > MAX_RAY_DEPTH {
        log::warn!("ray recursion exceeded {MAX_RAY_DEPTH}, dropping ray");
        return Trace::miss();
    }

    let Some((direct, t)) = nearest(table, ray, overrides) else {
        return Trace::miss();
    };

    let position = ray.origin + ray.direction * t;
    let mut result = Trace {
        hit: true,
        t,
        position,
        distance: t,
        direct: Some(direct),
        final_hit: Some(direct),
    };

    let entity = table.entity(direct);
    match overrides.transparency(direct, entity.collider.transparency) {
        Transparency::Mirror => {
            let Some(axis) = struck_axis(&entity.bounds(), position, ray.direction) else {
                // Could not tell which face was hit; behave like a wall
                return result;
            };
            let mut reflected = ray.direction;
            reflected[axis] = -reflected[axis];

            let bounce = Ray {
                origin: position,
                direction: reflected,
                exclude: ray.exclude,
                mask: ray.mask,
            };
            let bounced = overrides.with(direct, Transparency::Opaque, |overrides| {
                trace(table, &bounce, overrides, depth + 1)
            });

            if bounced.hit && bounced.final_hit != Some(direct) {
                result.final_hit = bounced.final_hit;
                result.distance = t + bounced.distance;
            } else {
                // Came back to this mirror, or the reflection shows nothing
                result.hit = false;
                result.final_hit = None;
            }
        }
        Transparency::Camouflage => {
            let behind = overrides.with(direct, Transparency::Transparent, |overrides| {
                trace(table, ray, overrides, depth + 1)
            });

            if let Some(back) = behind.final_hit.filter(|_| behind.hit) {
                if entity.collider.blends_with(&table.entity(back).collider) {
                    result.final_hit = Some(back);
                    result.distance = behind.distance;
                }
            }
        }
        Transparency::Opaque | Transparency::Transparent => {}
    }

    result
}

/// Axis of the face a ray travelling along `dir` struck at `point`
fn struck_axis(bounds: &Aabb, point: Vec3, dir: Vec3) -> Option<usize> {
    (0..3).find(|&axis| {
        (dir[axis] > 0.0 && (point[axis] - bounds.min[axis]).abs() < FACE_PRECISION)
            || (dir[axis] < 0.0 && (point[axis] - bounds.max[axis]).abs() < FACE_PRECISION)
    })
}
