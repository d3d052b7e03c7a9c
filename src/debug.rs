//! Debug overlay lines
//!
//! The simulation records vision rays here; the renderer uploads the slice
//! as a vertex buffer. Nothing in the simulation reads these back.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// A coloured line segment in world space
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct DebugLine {
    pub start: [f32; 3],
    pub end: [f32; 3],
    pub color: [f32; 4],
}

impl DebugLine {
    pub fn new(start: Vec3, end: Vec3, color: [f32; 4]) -> Self {
        Self {
            start: start.to_array(),
            end: end.to_array(),
            color,
        }
    }

    /// Raw bytes for a vertex buffer upload
    pub fn as_bytes(lines: &[DebugLine]) -> &[u8] {
        bytemuck::cast_slice(lines)
    }
}

/// Colors for debug rays
pub mod colors {
    pub const RAY_BLOCKED: [f32; 4] = [1.0, 1.0, 0.2, 0.6];
    pub const RAY_SPOTTED: [f32; 4] = [1.0, 0.1, 0.1, 1.0];
    pub const RAY_OPEN: [f32; 4] = [0.4, 0.4, 0.4, 0.3];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_layout() {
        assert_eq!(std::mem::size_of::<DebugLine>(), 40);
        let lines = [DebugLine::new(Vec3::ZERO, Vec3::X, colors::RAY_OPEN); 3];
        assert_eq!(DebugLine::as_bytes(&lines).len(), 120);
    }
}
