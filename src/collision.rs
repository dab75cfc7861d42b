//! Collision layers and contact events.
//!
//! Level colliders carry a [`LevelLayer`]. Backends translate their native
//! contact notifications into [`ContactStarted`] events, which the contact
//! handler classifies by layer.

use bevy::prelude::*;

/// Named collision layer of a level collider.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[reflect(Component)]
pub enum LevelLayer {
    /// Walkable surfaces. The only layer the ground probe hits.
    Ground,
    /// Damages the character on contact.
    Hazard,
    /// Level exit trigger.
    Finish,
}

impl LevelLayer {
    /// Layer name as used by level data.
    pub fn name(self) -> &'static str {
        match self {
            LevelLayer::Ground => "Ground",
            LevelLayer::Hazard => "Hazard",
            LevelLayer::Finish => "Finish",
        }
    }

    /// Look a layer up by name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Ground" => Some(LevelLayer::Ground),
            "Hazard" => Some(LevelLayer::Hazard),
            "Finish" => Some(LevelLayer::Finish),
            _ => None,
        }
    }

    /// Whether the layer physically blocks the character.
    pub fn is_solid(self) -> bool {
        !matches!(self, LevelLayer::Finish)
    }
}

/// A character began touching another collider this physics step.
///
/// Backends send one event per contact start; ongoing contact sends nothing.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactStarted {
    /// The controller entity.
    pub character: Entity,
    /// The collider it touched.
    pub other: Entity,
}

/// The character entered the Finish trigger.
///
/// Consumed by the scene-transition code of the game; the controller does
/// nothing further.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCompleted {
    pub character: Entity,
    /// The Finish collider that was entered.
    pub finish: Entity,
}
