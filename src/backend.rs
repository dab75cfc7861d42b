//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement to
//! work with the platformer controller. The controller only needs to read
//! and write a body's velocity and to teleport it; ray casts and contact
//! reporting are done by systems the backend's plugin registers in
//! [`PlatformerSet::Sensors`](crate::PlatformerSet::Sensors) and
//! [`PlatformerSet::Contacts`](crate::PlatformerSet::Contacts).
//!
//! A backend plugin is expected to:
//! - fill [`PlatformerController::probe`](crate::state::PlatformerController)
//!   through [`PlatformerController::record_probe`](crate::state::PlatformerController::record_probe)
//!   by casting both foot rays against [`LevelLayer::Ground`](crate::collision::LevelLayer)
//! - send a [`ContactStarted`](crate::collision::ContactStarted) event for
//!   each new contact between a controller and another collider

use bevy::prelude::*;

/// Trait for physics backend implementations.
///
/// # Example
///
/// See `Rapier2dBackend` (feature `rapier2d`) and
/// [`HeadlessBackend`](crate::headless::HeadlessBackend).
pub trait PlatformerPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec2;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2);

    /// Get the current position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation.xy())
            .unwrap_or(Vec2::ZERO)
    }

    /// Move an entity to `position`, keeping its depth, and stop it.
    fn teleport(world: &mut World, entity: Entity, position: Vec2) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation.x = position.x;
            transform.translation.y = position.y;
        }
        Self::set_velocity(world, entity, Vec2::ZERO);
    }
}
