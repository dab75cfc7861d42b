//! Animation state selection.
//!
//! The selector is a fixed, ordered list of rules; the first match wins.
//! `Hit` is checked after `Jump` and `Fall`, but those two exclude the damaged
//! case, so a damaged character that is rising or falling shows `Hit`.

use bevy::prelude::*;

use crate::config::ControllerConfig;

/// Discrete animation state derived from physical state every frame.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[reflect(Component)]
pub enum AnimationState {
    Run,
    Jump,
    Fall,
    Hit,
    #[default]
    Idle,
}

impl AnimationState {
    /// Clip name for animation players keyed by string.
    pub fn clip_name(self) -> &'static str {
        match self {
            AnimationState::Run => "Run",
            AnimationState::Jump => "Jump",
            AnimationState::Fall => "Fall",
            AnimationState::Hit => "Hit",
            AnimationState::Idle => "Idle",
        }
    }
}

/// Thresholds used by [`select_animation_state`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationThresholds {
    pub run: f32,
    pub vertical: f32,
}

impl Default for AnimationThresholds {
    fn default() -> Self {
        Self {
            run: 0.1,
            vertical: 0.1,
        }
    }
}

impl From<&ControllerConfig> for AnimationThresholds {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            run: config.run_threshold,
            vertical: config.vertical_threshold,
        }
    }
}

/// Pick the animation state for a velocity and damage flag.
pub fn select_animation_state(
    velocity: Vec2,
    damaged: bool,
    thresholds: AnimationThresholds,
) -> AnimationState {
    if velocity.x.abs() > thresholds.run && velocity.y.abs() < thresholds.vertical {
        AnimationState::Run
    } else if velocity.y > thresholds.vertical && !damaged {
        AnimationState::Jump
    } else if velocity.y < -thresholds.vertical && !damaged {
        AnimationState::Fall
    } else if damaged {
        AnimationState::Hit
    } else {
        AnimationState::Idle
    }
}
