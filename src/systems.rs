//! Core controller systems.
//!
//! The frame-domain systems (input, state markers, damage timers,
//! presentation) run in `Update`; jump arbitration, motion and contact
//! reactions run in `FixedUpdate`. Systems that touch velocity are exclusive
//! and generic over the physics backend, so the same code drives Rapier and
//! the headless simulation.

use std::time::Duration;

use bevy::ecs::event::EventCursor;
use bevy::prelude::*;

use crate::animation::{select_animation_state, AnimationState, AnimationThresholds};
use crate::backend::PlatformerPhysicsBackend;
use crate::collision::{ContactStarted, LevelCompleted, LevelLayer};
use crate::config::ControllerConfig;
use crate::damage::{DamageSequence, DamageTaken, RespawnAnchor, Respawned};
use crate::intent::{InputBindings, InputIntent};
use crate::motion::{jump_allowed, step_motion};
use crate::state::{Airborne, Damaged, Facing, Grounded, PlatformerController, PresentationSignals};

/// Virtual clock reading used to age damage processes.
///
/// Identical in `FixedUpdate` and `Update` of the same frame.
fn virtual_now(world: &World) -> Duration {
    world
        .get_resource::<Time<Virtual>>()
        .map(|time| time.elapsed())
        .unwrap_or_default()
}

/// Report configs that were added or changed with invalid values.
pub fn validate_configs(q_configs: Query<(Entity, &ControllerConfig), Changed<ControllerConfig>>) {
    for (entity, config) in &q_configs {
        if let Err(err) = config.validate() {
            warn!("Invalid controller config on {entity}: {err}");
        }
    }
}

/// Sample a fresh intent for every entity with input bindings.
///
/// A missing keyboard resource and no connected gamepad give neutral input.
pub fn sample_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    q_gamepads: Query<&Gamepad>,
    mut q_intents: Query<(&InputBindings, &mut InputIntent)>,
) {
    let gamepad = q_gamepads.iter().next();
    for (bindings, mut intent) in &mut q_intents {
        intent.set_if_neq(bindings.sample(keys.as_deref(), gamepad));
    }
}

/// Update facing from the horizontal axis. Zero input keeps the last facing.
pub fn update_facing(mut q_controllers: Query<(&InputIntent, &mut PlatformerController)>) {
    for (intent, mut controller) in &mut q_controllers {
        if Facing::from_axis(intent.horizontal).is_some_and(|facing| facing != controller.facing) {
            controller.face_towards(intent.horizontal);
        }
    }
}

/// Sync state marker components with the controller state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &PlatformerController,
        Has<Grounded>,
        Has<Airborne>,
        Has<Damaged>,
    )>,
) {
    for (entity, controller, has_grounded, has_airborne, has_damaged) in &q_controllers {
        if controller.grounded && !has_grounded {
            commands.entity(entity).insert(Grounded).remove::<Airborne>();
        } else if !controller.grounded && !has_airborne {
            commands.entity(entity).insert(Airborne).remove::<Grounded>();
        }

        if controller.damaged && !has_damaged {
            commands.entity(entity).insert(Damaged);
        } else if !controller.damaged && has_damaged {
            commands.entity(entity).remove::<Damaged>();
        }
    }
}

/// Advance damage processes and perform due respawns.
pub fn advance_damage<B: PlatformerPhysicsBackend>(world: &mut World) {
    let now = virtual_now(world);

    let respawns: Vec<(Entity, Option<Vec2>, usize)> = world
        .query::<(
            Entity,
            &mut PlatformerController,
            &mut DamageSequence,
            Option<&RespawnAnchor>,
        )>()
        .iter_mut(world)
        .filter_map(|(entity, mut controller, mut sequence, anchor)| {
            if !sequence.is_active() {
                return None;
            }
            let was_damaged = controller.damaged;
            let tick = sequence.advance(now, controller.bypass_change_detection());
            if controller.damaged != was_damaged {
                controller.set_changed();
            }
            if let Some(end) = tick.flash_ended {
                debug!("Damage flash on {entity} ended: {end:?}");
            }
            (tick.respawns_due > 0).then(|| (entity, anchor.map(|a| a.0), tick.respawns_due))
        })
        .collect();

    for (entity, anchor, count) in respawns {
        let Some(position) = anchor else {
            warn!("{entity} is due to respawn but has no RespawnAnchor; skipping teleport");
            continue;
        };
        // Countdowns completing together land on the same spot.
        for _ in 0..count {
            B::teleport(world, entity, position);
            world.send_event(Respawned {
                character: entity,
                position,
            });
        }
        info!("Respawned {entity} at {position}");
    }
}

/// Select the animation state from velocity and damage.
///
/// Selecting `Hit` starts a flash ramp if none is running.
pub fn select_animation<B: PlatformerPhysicsBackend>(world: &mut World) {
    let now = virtual_now(world);

    let entities: Vec<(Entity, bool, ControllerConfig)> = world
        .query::<(Entity, &PlatformerController, &ControllerConfig)>()
        .iter(world)
        .map(|(e, controller, config)| (e, controller.damaged, *config))
        .collect();

    for (entity, damaged, config) in entities {
        let velocity = B::get_velocity(world, entity);
        let state = select_animation_state(velocity, damaged, AnimationThresholds::from(&config));

        if state == AnimationState::Hit {
            if let Some(mut sequence) = world.get_mut::<DamageSequence>(entity) {
                sequence.start_flash(now, config.flash_duration);
            }
        }

        if let Some(mut current) = world.get_mut::<AnimationState>(entity) {
            if current.set_if_neq(state) {
                debug!("{entity} animation -> {}", state.clip_name());
            }
        }
    }
}

/// Write the flip and flash signals for the renderer.
pub fn update_presentation_signals(
    mut q_controllers: Query<(&PlatformerController, &DamageSequence, &mut PresentationSignals)>,
) {
    for (controller, sequence, mut signals) in &mut q_controllers {
        signals.set_if_neq(PresentationSignals {
            flip_x: controller.facing == Facing::Left,
            flash_amount: sequence.flash_amount(),
        });
    }
}

/// Mirror the flip signal onto the entity's sprite, if it has one.
pub fn sync_sprite_flip(
    mut q_sprites: Query<(&PresentationSignals, &mut Sprite), Changed<PresentationSignals>>,
) {
    for (signals, mut sprite) in &mut q_sprites {
        if sprite.flip_x != signals.flip_x {
            sprite.flip_x = signals.flip_x;
        }
    }
}

/// Decide whether each controller may jump this physics step.
pub fn arbitrate_jumps<B: PlatformerPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, bool, bool, f32)> = world
        .query::<(
            Entity,
            &PlatformerController,
            Option<&InputIntent>,
            &ControllerConfig,
        )>()
        .iter(world)
        .map(|(e, controller, intent, config)| {
            (
                e,
                controller.grounded,
                intent.is_some_and(|i| i.jump_pressed),
                config.jump_velocity_threshold,
            )
        })
        .collect();

    for (entity, grounded, jump_pressed, threshold) in entities {
        let vertical_velocity = B::get_velocity(world, entity).y;
        let can_jump = jump_allowed(grounded, jump_pressed, vertical_velocity, threshold);
        if let Some(mut controller) = world.get_mut::<PlatformerController>(entity) {
            controller.can_jump = can_jump;
        }
    }
}

/// Apply input, ground snap and the jump impulse to each controller.
pub fn apply_motion<B: PlatformerPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, PlatformerController, InputIntent, ControllerConfig)> = world
        .query::<(
            Entity,
            &PlatformerController,
            Option<&InputIntent>,
            &ControllerConfig,
        )>()
        .iter(world)
        .map(|(e, controller, intent, config)| {
            (e, controller.clone(), intent.copied().unwrap_or_default(), *config)
        })
        .collect();

    for (entity, mut controller, intent, config) in entities {
        let jumping = controller.can_jump;
        let velocity = step_motion(B::get_velocity(world, entity), &mut controller, &intent, &config);
        B::set_velocity(world, entity, velocity);

        if jumping {
            debug!("{entity} jumped, velocity {velocity}");
        }

        if let Some(mut current) = world.get_mut::<PlatformerController>(entity) {
            current.set_if_neq(controller);
        }
    }
}

/// React to contacts reported by the backend this physics step.
///
/// Finish contacts send [`LevelCompleted`]. Hazard contacts start a damage
/// sequence unless one is already running.
pub fn handle_contacts<B: PlatformerPhysicsBackend>(
    world: &mut World,
    mut cursor: Local<EventCursor<ContactStarted>>,
) {
    let Some(events) = world.get_resource::<Events<ContactStarted>>() else {
        return;
    };
    let contacts: Vec<ContactStarted> = cursor.read(events).copied().collect();
    if contacts.is_empty() {
        return;
    }

    let now = virtual_now(world);

    for contact in contacts {
        let Some(layer) = world.get::<LevelLayer>(contact.other).copied() else {
            continue;
        };

        match layer {
            LevelLayer::Finish => {
                info!("{} reached the finish", contact.character);
                world.send_event(LevelCompleted {
                    character: contact.character,
                    finish: contact.other,
                });
            }
            LevelLayer::Hazard => {
                let Ok((mut controller, mut sequence, config)) = world
                    .query::<(&mut PlatformerController, &mut DamageSequence, &ControllerConfig)>()
                    .get_mut(world, contact.character)
                else {
                    continue;
                };

                let Some(knockback) = sequence.begin(now, &mut controller, config) else {
                    debug!("{} already damaged; hazard contact ignored", contact.character);
                    continue;
                };

                B::set_velocity(world, contact.character, knockback);
                world.send_event(DamageTaken {
                    character: contact.character,
                    knockback,
                });
                info!("{} hit a hazard, knockback {knockback}", contact.character);
            }
            LevelLayer::Ground => {}
        }
    }
}
