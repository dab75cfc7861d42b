//! Headless physics backend.
//!
//! A small kinematic simulation over axis-aligned boxes: gravity, landing on
//! top of solid colliders and edge-triggered overlap contacts. It has no
//! side or ceiling resolution. Used for deterministic tests and for running
//! the controller without a physics engine.

use bevy::prelude::*;

use crate::backend::PlatformerPhysicsBackend;
use crate::collision::{ContactStarted, LevelLayer};
use crate::config::ControllerConfig;
use crate::detection::{GroundProbeResult, SensorBox};
use crate::state::PlatformerController;
use crate::PlatformerSet;

/// Contact margin for overlap tests.
const CONTACT_MARGIN: f32 = 0.01;

/// Headless physics backend for the platformer controller.
pub struct HeadlessBackend;

impl PlatformerPhysicsBackend for HeadlessBackend {
    fn plugin() -> impl Plugin {
        HeadlessBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<HeadlessBody>(entity)
            .map(|body| body.velocity)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut body) = world.get_mut::<HeadlessBody>(entity) {
            body.velocity = velocity;
        }
    }
}

/// Moving box simulated by the headless backend.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct HeadlessBody {
    pub velocity: Vec2,
    pub half_extents: Vec2,
    /// Acceleration applied every step.
    pub gravity: Vec2,
    /// Colliders overlapped during the last step.
    #[reflect(ignore)]
    touching: Vec<Entity>,
}

impl Default for HeadlessBody {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            half_extents: Vec2::new(0.25, 0.5),
            gravity: Vec2::new(0.0, -20.0),
            touching: Vec::new(),
        }
    }
}

impl HeadlessBody {
    pub fn new(half_extents: Vec2) -> Self {
        Self {
            half_extents,
            ..default()
        }
    }

    /// Builder: set gravity.
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Colliders touched during the last step.
    pub fn touching(&self) -> &[Entity] {
        &self.touching
    }
}

/// Static box collider. Paired with a [`LevelLayer`] on the same entity.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct HeadlessCollider {
    pub half_extents: Vec2,
}

impl HeadlessCollider {
    pub fn new(half_extents: Vec2) -> Self {
        Self { half_extents }
    }
}

/// Plugin that sets up headless sensor, simulation and contact systems.
pub struct HeadlessBackendPlugin;

impl Plugin for HeadlessBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<HeadlessBody>();
        app.register_type::<HeadlessCollider>();

        app.add_systems(Update, headless_ground_probe.in_set(PlatformerSet::Sensors));
        app.add_systems(
            FixedUpdate,
            headless_integrate.in_set(PlatformerSet::Simulation),
        );
        app.add_systems(
            FixedUpdate,
            headless_contacts.in_set(PlatformerSet::Contacts),
        );
    }
}

/// Cast both foot probes against the given ground boxes.
pub fn probe_ground(config: &ControllerConfig, position: Vec2, grounds: &[SensorBox]) -> GroundProbeResult {
    let (left, right) = config.probe_origins(position);
    let hit = |origin: Vec2| {
        grounds
            .iter()
            .any(|ground| ground.hit_by_downward_ray(origin, config.probe_length))
    };
    GroundProbeResult::new(hit(left), hit(right))
}

/// Resolve a move from `from` to `to` against the tops of `solids`.
///
/// A body that starts above a solid and ends below its top is placed on it
/// and its downward velocity is removed.
pub fn resolve_landing(
    from: Vec2,
    to: Vec2,
    velocity: &mut Vec2,
    half_extents: Vec2,
    solids: &[SensorBox],
) -> Vec2 {
    if velocity.y > 0.0 {
        return to;
    }

    let bottom_before = from.y - half_extents.y;
    let bottom_after = to.y - half_extents.y;
    let mut resolved = to;

    for solid in solids {
        let reach = half_extents.x + solid.half_extents.x;
        if (to.x - solid.center.x).abs() >= reach {
            continue;
        }
        let top = solid.max().y;
        if bottom_before >= top - CONTACT_MARGIN && bottom_after < top {
            resolved.y = resolved.y.max(top + half_extents.y);
            velocity.y = 0.0;
        }
    }

    resolved
}

/// Static colliders. Positions come from `Transform`, so colliders are
/// expected to be top-level entities.
type ColliderQuery<'w, 's> = Query<
    'w,
    's,
    (Entity, &'static Transform, &'static HeadlessCollider, &'static LevelLayer),
    Without<HeadlessBody>,
>;

fn collider_boxes(q_colliders: &ColliderQuery) -> Vec<(Entity, SensorBox, LevelLayer)> {
    q_colliders
        .iter()
        .map(|(entity, transform, collider, layer)| {
            (
                entity,
                SensorBox::new(transform.translation.xy(), collider.half_extents),
                *layer,
            )
        })
        .collect()
}

fn headless_ground_probe(
    q_colliders: ColliderQuery,
    mut q_controllers: Query<(&Transform, &ControllerConfig, &mut PlatformerController), With<HeadlessBody>>,
) {
    let grounds: Vec<SensorBox> = collider_boxes(&q_colliders)
        .into_iter()
        .filter(|(_, _, layer)| *layer == LevelLayer::Ground)
        .map(|(_, sensor, _)| sensor)
        .collect();

    for (transform, config, mut controller) in &mut q_controllers {
        let probe = probe_ground(config, transform.translation.xy(), &grounds);
        controller.record_probe(probe);
    }
}

fn headless_integrate(
    time: Res<Time>,
    q_colliders: ColliderQuery,
    mut q_bodies: Query<(&mut Transform, &mut HeadlessBody)>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }

    let solids: Vec<SensorBox> = collider_boxes(&q_colliders)
        .into_iter()
        .filter(|(_, _, layer)| layer.is_solid())
        .map(|(_, sensor, _)| sensor)
        .collect();

    for (mut transform, mut body) in &mut q_bodies {
        let body = &mut *body;
        body.velocity += body.gravity * dt;

        let from = transform.translation.xy();
        let to = from + body.velocity * dt;
        let resolved = resolve_landing(from, to, &mut body.velocity, body.half_extents, &solids);

        transform.translation.x = resolved.x;
        transform.translation.y = resolved.y;
    }
}

fn headless_contacts(
    q_colliders: ColliderQuery,
    mut q_bodies: Query<(Entity, &Transform, &mut HeadlessBody)>,
    mut contacts: EventWriter<ContactStarted>,
) {
    let colliders = collider_boxes(&q_colliders);

    for (character, transform, mut body) in &mut q_bodies {
        let own = SensorBox::new(transform.translation.xy(), body.half_extents);
        let touching: Vec<Entity> = colliders
            .iter()
            .filter(|(_, sensor, _)| own.overlaps(sensor, CONTACT_MARGIN))
            .map(|(entity, _, _)| *entity)
            .collect();

        for &other in &touching {
            if !body.touching.contains(&other) {
                contacts.write(ContactStarted { character, other });
            }
        }

        if body.touching != touching {
            body.touching = touching;
        }
    }
}
