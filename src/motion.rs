//! Jump arbitration and per-step velocity changes.
//!
//! Both run once per fixed physics step. They are plain functions over the
//! controller state so the systems in [`crate::systems`] only move data in
//! and out of the world.

use bevy::prelude::*;

use crate::config::ControllerConfig;
use crate::intent::InputIntent;
use crate::state::PlatformerController;

/// Whether a jump may start this physics step.
///
/// The vertical velocity check keeps a held jump key from retriggering while
/// the previous jump is still rising.
#[inline]
pub fn jump_allowed(grounded: bool, jump_pressed: bool, vertical_velocity: f32, threshold: f32) -> bool {
    grounded && jump_pressed && vertical_velocity <= threshold
}

/// Apply one physics step of motion to `velocity` and return the result.
///
/// Consumes the `can_jump` pulse. After a jump the controller is treated as
/// airborne until the next ground probe.
pub fn step_motion(
    velocity: Vec2,
    controller: &mut PlatformerController,
    intent: &InputIntent,
    config: &ControllerConfig,
) -> Vec2 {
    let mut velocity = velocity;

    if !controller.damaged {
        velocity.x = intent.horizontal * config.speed;
        if controller.grounded {
            velocity.y = 0.0;
        }
    }

    if controller.can_jump {
        velocity.y += config.jump_force;
        controller.can_jump = false;
        controller.grounded = false;
    }

    velocity
}
