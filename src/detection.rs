//! Ground probe results.
//!
//! The ground probe casts two short rays straight down from the character's
//! feet. Backends perform the casts; this module holds the combined result
//! and the shared hit test used by the headless backend.

use bevy::prelude::*;

/// Result of the two foot probes.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroundProbeResult {
    /// Whether the left foot ray hit Ground.
    pub left: bool,
    /// Whether the right foot ray hit Ground.
    pub right: bool,
}

impl GroundProbeResult {
    /// Create a probe result.
    pub fn new(left: bool, right: bool) -> Self {
        Self { left, right }
    }

    /// Both rays missed.
    pub fn miss() -> Self {
        Self::default()
    }

    /// Grounded when either foot touches.
    #[inline]
    pub fn grounded(&self) -> bool {
        self.left || self.right
    }

    /// Only one foot touches, e.g. standing on a ledge.
    pub fn is_partial(&self) -> bool {
        self.left != self.right
    }
}

/// Axis-aligned box used for short-range sensor queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorBox {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl SensorBox {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Whether a ray cast straight down from `origin` hits this box within
    /// `length`. An origin inside the box counts as an immediate hit.
    pub fn hit_by_downward_ray(&self, origin: Vec2, length: f32) -> bool {
        let (min, max) = (self.min(), self.max());
        if origin.x < min.x || origin.x > max.x {
            return false;
        }
        origin.y >= min.y && origin.y - length <= max.y
    }

    /// Whether two boxes overlap or touch within `margin`.
    pub fn overlaps(&self, other: &SensorBox, margin: f32) -> bool {
        let delta = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents + Vec2::splat(margin);
        delta.x <= reach.x && delta.y <= reach.y
    }
}
