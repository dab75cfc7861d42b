//! Character state components.
//!
//! [`PlatformerController`] is the shared state record every controller
//! system reads and writes. The marker components mirror parts of it so game
//! code can filter queries with `With<Grounded>` and friends.

use bevy::prelude::*;

use crate::animation::AnimationState;
use crate::config::ControllerConfig;
use crate::damage::DamageSequence;
use crate::detection::GroundProbeResult;
use crate::intent::InputIntent;

/// Direction the character last faced.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// +1.0 for right, -1.0 for left.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Facing implied by a horizontal axis value, or `None` for zero input.
    pub fn from_axis(axis: f32) -> Option<Self> {
        if axis < 0.0 {
            Some(Facing::Left)
        } else if axis > 0.0 {
            Some(Facing::Right)
        } else {
            None
        }
    }
}

/// Core platformer controller component.
///
/// Position lives in the entity's `Transform` and velocity in the physics
/// backend; this component holds everything else the controller decides.
/// Inserting it also inserts default intent, config, damage and presentation
/// components unless they are supplied.
#[derive(Component, Reflect, Debug, Clone, Default, PartialEq)]
#[reflect(Component)]
#[require(InputIntent, ControllerConfig, DamageSequence, AnimationState, PresentationSignals)]
pub struct PlatformerController {
    /// Direction the character faces. Updated from input every frame.
    pub facing: Facing,
    /// Whether either ground probe hit this frame.
    pub grounded: bool,
    /// Whether a damage sequence is in progress.
    pub damaged: bool,
    /// One-physics-step pulse: a jump may start this step.
    pub can_jump: bool,
    /// Raw result of the last ground probe.
    pub probe: GroundProbeResult,
}

impl PlatformerController {
    /// Create a controller facing right, airborne and undamaged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the initial facing.
    pub fn facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    /// Store a new probe sample and derive `grounded` from it.
    pub fn record_probe(&mut self, probe: GroundProbeResult) {
        self.probe = probe;
        self.grounded = probe.grounded();
    }

    /// Update facing from the horizontal axis; zero keeps the last facing.
    pub fn face_towards(&mut self, axis: f32) {
        if let Some(facing) = Facing::from_axis(axis) {
            self.facing = facing;
        }
    }
}

/// Marker component present while the character is grounded.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component present while the character is airborne.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component present while a damage sequence is in progress.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Damaged;

/// Signals for the rendering collaborator, written every visual frame.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct PresentationSignals {
    /// Mirror the sprite horizontally (character faces left).
    pub flip_x: bool,
    /// Damage flash intensity in [0, 1]; 0 when no flash is running.
    pub flash_amount: f32,
}
