//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.
//!
//! Rapier integrates the bodies itself, so the backend only adds the foot
//! probes and the translation of Rapier collision events. Running Rapier in
//! the fixed schedule (`RapierPhysicsPlugin::in_fixed_schedule`) keeps its
//! steps aligned with the controller's motion systems.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::backend::PlatformerPhysicsBackend;
use crate::collision::{ContactStarted, LevelLayer};
use crate::config::ControllerConfig;
use crate::detection::GroundProbeResult;
use crate::state::PlatformerController;
use crate::PlatformerSet;

/// Rapier2D physics backend for the platformer controller.
///
/// Velocity is read from and written to Rapier's [`Velocity`] component.
/// Ground probing and contact translation are handled by dedicated Rapier
/// systems that receive `RapierContext` as a system parameter.
pub struct Rapier2dBackend;

impl PlatformerPhysicsBackend for Rapier2dBackend {
    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<GlobalTransform>(entity)
            .map(|t| t.translation().xy())
            .or_else(|| world.get::<Transform>(entity).map(|t| t.translation.xy()))
            .unwrap_or(Vec2::ZERO)
    }
}

/// Plugin that sets up Rapier2D-specific systems for the platformer controller.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, rapier_ground_probe.in_set(PlatformerSet::Sensors));
        app.add_systems(
            FixedUpdate,
            rapier_contact_events.in_set(PlatformerSet::Contacts),
        );
    }
}

/// Cast one foot ray straight down, hitting only Ground colliders.
fn probe_ray(
    context: &RapierContext,
    origin: Vec2,
    length: f32,
    exclude_entity: Entity,
    is_ground: &dyn Fn(Entity) -> bool,
) -> bool {
    let filter = QueryFilter::default()
        .exclude_rigid_body(exclude_entity)
        .predicate(&is_ground);

    context
        .cast_ray(origin, Vec2::NEG_Y, length, true, filter)
        .is_some()
}

/// Rapier-specific ground probe: two rays from the configured foot offsets.
fn rapier_ground_probe(
    rapier_context: ReadRapierContext,
    q_layers: Query<&LevelLayer>,
    mut q_controllers: Query<(
        Entity,
        &GlobalTransform,
        &ControllerConfig,
        &mut PlatformerController,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    let is_ground = |entity: Entity| q_layers.get(entity).is_ok_and(|layer| *layer == LevelLayer::Ground);

    for (entity, transform, config, mut controller) in &mut q_controllers {
        let (left, right) = config.probe_origins(transform.translation().xy());
        let probe = GroundProbeResult::new(
            probe_ray(&context, left, config.probe_length, entity, &is_ground),
            probe_ray(&context, right, config.probe_length, entity, &is_ground),
        );

        if probe.is_partial() && !controller.probe.is_partial() {
            trace!("{entity} is standing on a ledge");
        }
        controller.record_probe(probe);
    }
}

/// Translate Rapier contact starts into [`ContactStarted`] events.
///
/// Only pairs where one side is a controller are reported; the controller is
/// always `character`.
fn rapier_contact_events(
    mut collisions: EventReader<CollisionEvent>,
    q_controllers: Query<(), With<PlatformerController>>,
    mut contacts: EventWriter<ContactStarted>,
) {
    for event in collisions.read() {
        let CollisionEvent::Started(a, b, _) = *event else {
            continue;
        };
        if q_controllers.contains(a) {
            contacts.write(ContactStarted {
                character: a,
                other: b,
            });
        } else if q_controllers.contains(b) {
            contacts.write(ContactStarted {
                character: b,
                other: a,
            });
        }
    }
}

/// Bundle for creating a player character with Rapier2D physics.
///
/// Provides the Rapier components the controller relies on: a dynamic body,
/// a [`Velocity`] the controller writes, locked rotation and collision events
/// so hazard and finish contacts are reported.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use platformer_controller::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 100.0, 0.0),
///         PlatformerController::new(),
///         ControllerConfig::pixel_scaled(32.0),
///         InputBindings::default(),
///         RespawnAnchor(Vec2::new(0.0, 100.0)),
///         Rapier2dPlayerBundle::new(),
///         Collider::cuboid(8.0, 16.0),
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `velocity`: Zero velocity
/// - `locked_axes`: [`LockedAxes::ROTATION_LOCKED`]
/// - `active_events`: [`ActiveEvents::COLLISION_EVENTS`]
/// - `gravity_scale`: 1.0
/// - `friction`: 0.0, so horizontal velocity is set by the controller alone
#[derive(Bundle)]
pub struct Rapier2dPlayerBundle {
    pub rigid_body: RigidBody,
    /// Written by the motion systems every physics step.
    pub velocity: Velocity,
    pub locked_axes: LockedAxes,
    /// Required for hazard and finish contacts to be reported.
    pub active_events: ActiveEvents,
    pub gravity_scale: GravityScale,
    pub friction: Friction,
}

impl Default for Rapier2dPlayerBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier2dPlayerBundle {
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            active_events: ActiveEvents::COLLISION_EVENTS,
            gravity_scale: GravityScale(1.0),
            friction: Friction {
                coefficient: 0.0,
                combine_rule: CoefficientCombineRule::Min,
            },
        }
    }

    /// Set the rigid body type for the character.
    ///
    /// ```ignore
    /// // Scripted character that ignores gravity and collisions response
    /// let bundle = Rapier2dPlayerBundle::new().with_body(RigidBody::KinematicVelocityBased);
    /// ```
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Scale Rapier's gravity for this body.
    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = GravityScale(scale);
        self
    }

    /// Set which axes should be locked for the rigid body.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(TransformPlugin);
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
        app.insert_resource(Time::<Fixed>::from_hz(60.0));
        app
    }

    fn spawn_ground(app: &mut App, layer: LevelLayer) -> Entity {
        // Top surface at y = 0.
        app.world_mut()
            .spawn((
                Transform::from_xyz(0.0, -0.5, 0.0),
                RigidBody::Fixed,
                Collider::cuboid(5.0, 0.5),
                layer,
            ))
            .id()
    }

    fn spawn_prober(app: &mut App, height: f32) -> Entity {
        app.world_mut()
            .spawn((
                Transform::from_xyz(0.0, height, 0.0),
                RigidBody::KinematicPositionBased,
                Collider::cuboid(0.25, 0.5),
                PlatformerController::new(),
            ))
            .id()
    }

    #[test]
    fn rapier_backend_get_position() {
        let mut app = create_test_app();

        let entity = app
            .world_mut()
            .spawn((Transform::from_xyz(100.0, 200.0, 0.0), RigidBody::Dynamic))
            .id();

        app.update();

        let pos = Rapier2dBackend::get_position(app.world(), entity);
        assert!((pos.x - 100.0).abs() < 0.01);
        assert!((pos.y - 200.0).abs() < 0.01);
    }

    #[test]
    fn rapier_backend_velocity() {
        let mut app = create_test_app();

        let entity = app
            .world_mut()
            .spawn((
                Transform::default(),
                RigidBody::Dynamic,
                Velocity::linear(Vec2::new(50.0, 30.0)),
            ))
            .id();

        app.update();

        let vel = Rapier2dBackend::get_velocity(app.world(), entity);
        assert!((vel.x - 50.0).abs() < 0.01);
        assert!((vel.y - 30.0).abs() < 0.01);

        Rapier2dBackend::set_velocity(app.world_mut(), entity, Vec2::new(5.0, 8.0));

        let vel = Rapier2dBackend::get_velocity(app.world(), entity);
        assert!((vel.x - 5.0).abs() < 0.01);
        assert!((vel.y - 8.0).abs() < 0.01);
    }

    #[test]
    fn rapier_teleport_keeps_depth_and_stops() {
        let mut app = create_test_app();

        let entity = app
            .world_mut()
            .spawn((
                Transform::from_xyz(3.0, 4.0, 2.0),
                RigidBody::Dynamic,
                Velocity::linear(Vec2::new(-4.0, 6.0)),
            ))
            .id();

        Rapier2dBackend::teleport(app.world_mut(), entity, Vec2::new(-1.0, 1.0));

        let transform = app.world().get::<Transform>(entity).unwrap();
        assert_eq!(transform.translation, Vec3::new(-1.0, 1.0, 2.0));
        assert_eq!(Rapier2dBackend::get_velocity(app.world(), entity), Vec2::ZERO);
    }

    #[test]
    fn player_bundle_creates_valid_entity() {
        let mut app = create_test_app();

        let entity = app
            .world_mut()
            .spawn((
                Transform::default(),
                Rapier2dPlayerBundle::new(),
                Collider::cuboid(0.25, 0.5),
            ))
            .id();

        app.update();

        let world = app.world();
        assert!(world.get::<RigidBody>(entity).is_some());
        assert!(world.get::<Velocity>(entity).is_some());
        assert_eq!(world.get::<LockedAxes>(entity), Some(&LockedAxes::ROTATION_LOCKED));
        assert_eq!(
            world.get::<ActiveEvents>(entity),
            Some(&ActiveEvents::COLLISION_EVENTS)
        );
    }

    #[test]
    fn probe_hits_ground_layer() {
        let mut app = create_test_app();
        app.add_systems(Update, rapier_ground_probe);

        spawn_ground(&mut app, LevelLayer::Ground);
        // Feet 0.02 above the ground top, inside the probe length.
        let character = spawn_prober(&mut app, 0.52);

        for _ in 0..3 {
            app.update();
        }

        let controller = app.world().get::<PlatformerController>(character).unwrap();
        assert!(controller.grounded);
        assert!(controller.probe.left && controller.probe.right);
    }

    #[test]
    fn probe_ignores_other_layers() {
        let mut app = create_test_app();
        app.add_systems(Update, rapier_ground_probe);

        spawn_ground(&mut app, LevelLayer::Hazard);
        let character = spawn_prober(&mut app, 0.52);

        for _ in 0..3 {
            app.update();
        }

        let controller = app.world().get::<PlatformerController>(character).unwrap();
        assert!(!controller.grounded);
    }

    #[test]
    fn probe_misses_out_of_reach() {
        let mut app = create_test_app();
        app.add_systems(Update, rapier_ground_probe);

        spawn_ground(&mut app, LevelLayer::Ground);
        let character = spawn_prober(&mut app, 1.0);

        for _ in 0..3 {
            app.update();
        }

        let controller = app.world().get::<PlatformerController>(character).unwrap();
        assert!(!controller.grounded);
    }
}
