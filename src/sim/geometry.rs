//! Axis-aligned box primitives
//!
//! Shared by the collision resolver (fixed-point rectangles on the tile
//! plane) and the raycaster (float boxes in world space).

use glam::{IVec2, Vec3};

use crate::consts::RAY_EPSILON;

/// A box on the tile plane in fixed-point units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub center: IVec2,
    /// Half extent per axis (never negative)
    pub half: IVec2,
}

impl Rect {
    pub fn new(center: IVec2, half: IVec2) -> Self {
        Self { center, half }
    }

    /// Overlap test. Boxes that only share an edge do not intersect.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.center.x - self.half.x < other.center.x + other.half.x
            && self.center.x + self.half.x > other.center.x - other.half.x
            && self.center.y - self.half.y < other.center.y + other.half.y
            && self.center.y + self.half.y > other.center.y - other.half.y
    }

    /// Overlap test against everything this box passes over while moving
    /// by `delta`, start and end included.
    pub fn sweep_intersects(&self, delta: IVec2, other: &Rect) -> bool {
        let start_min = self.center - self.half;
        let start_max = self.center + self.half;
        let min = start_min.min(start_min + delta);
        let max = start_max.max(start_max + delta);
        let other_min = other.center - other.half;
        let other_max = other.center + other.half;
        min.x < other_max.x && max.x > other_min.x && min.y < other_max.y && max.y > other_min.y
    }

    #[inline]
    pub fn translated(&self, delta: IVec2) -> Self {
        Self {
            center: self.center + delta,
            half: self.half,
        }
    }
}

/// Signed per-axis distance `from` can travel along `dir` before its
/// leading edge touches `to`.
///
/// A non-negative axis of `dir` measures `from`'s positive face against
/// `to`'s negative face; a negative axis measures the opposite pair.
pub fn distance_towards(from: &Rect, to: &Rect, dir: IVec2) -> IVec2 {
    let gap = |axis: usize| {
        let span = from.half[axis] + to.half[axis];
        let offset = to.center[axis] - from.center[axis];
        if dir[axis] >= 0 {
            offset - span
        } else {
            offset + span
        }
    };
    IVec2::new(gap(0), gap(1))
}

/// Restrict `current` by `limit` without ever flipping its direction.
///
/// A zero limit stops the axis. A positive limit caps from above, a negative
/// limit caps from below, so a limit pointing away from `current` leaves it
/// untouched.
#[inline]
pub fn clamp_toward_zero(current: i32, limit: i32) -> i32 {
    match limit.signum() {
        0 => 0,
        1 => current.min(limit),
        _ => current.max(limit),
    }
}

/// A world-space box used by the raycaster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Slab-method ray/box test
///
/// Returns the smallest parametric distance along `dir` that is greater than
/// `RAY_EPSILON`. A ray starting on a face and pointing away from the box
/// does not hit it.
pub fn ray_aabb(origin: Vec3, dir: Vec3, aabb: &Aabb) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

        if d.abs() < f32::EPSILON {
            // Parallel to this slab: must already be inside it
            if o < lo || o > hi {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t0 = (lo - o) * inv;
        let mut t1 = (hi - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }

    if t_near > RAY_EPSILON {
        Some(t_near)
    } else if t_far > RAY_EPSILON {
        // Origin inside the box
        Some(t_far)
    } else {
        None
    }
}
