//! Depth-weighted background scrolling.
//!
//! Each [`ParallaxLayer`] remembers where it started and moves by a fraction
//! of the camera's travel from that point. Layers far behind the reference
//! depth follow the camera almost fully and appear distant; layers near it
//! barely move.

use bevy::prelude::*;

/// Camera clip distances used to normalize layer depth.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct ParallaxCamera {
    /// Clip plane used for layers in front of the reference depth.
    pub near: f32,
    /// Clip plane used for layers behind the reference depth.
    pub far: f32,
}

impl Default for ParallaxCamera {
    fn default() -> Self {
        Self {
            near: 0.3,
            far: 1000.0,
        }
    }
}

/// Marks the entity whose depth layers are measured against (usually the
/// player).
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct ParallaxReference;

/// A background layer. Start position and depth are captured from the
/// entity's `Transform` the first frame it is seen.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct ParallaxLayer {
    start: Option<Vec3>,
}

impl ParallaxLayer {
    /// Layer anchored at an explicit start point instead of its first
    /// transform.
    pub fn anchored_at(start: Vec3) -> Self {
        Self { start: Some(start) }
    }

    pub fn start(&self) -> Option<Vec3> {
        self.start
    }
}

/// How strongly a layer follows the camera.
///
/// `distance` is that layer's depth minus the reference depth. A clip
/// distance that is not positive gives 0 so the layer stays put.
pub fn parallax_factor(distance: f32, camera_depth: f32, camera: &ParallaxCamera) -> f32 {
    let plane = if distance > 0.0 { camera.far } else { camera.near };
    let clip = camera_depth + plane;
    if !clip.is_finite() || clip <= 0.0 {
        return 0.0;
    }
    distance.abs() / clip
}

/// New layer position for the current camera and reference depth.
pub fn parallax_position(
    start: Vec3,
    camera_position: Vec3,
    reference_depth: f32,
    camera: &ParallaxCamera,
) -> Vec3 {
    let travel = camera_position.truncate() - start.truncate();
    let factor = parallax_factor(start.z - reference_depth, camera_position.z, camera);
    (start.truncate() + travel * factor).extend(start.z)
}

/// Capture start positions of newly seen layers.
pub fn init_parallax_layers(mut q_layers: Query<(&Transform, &mut ParallaxLayer)>) {
    for (transform, mut layer) in &mut q_layers {
        if layer.start.is_none() {
            layer.start = Some(transform.translation);
        }
    }
}

/// Move every layer for the current camera position.
pub fn update_parallax_layers(
    q_camera: Query<(&GlobalTransform, &ParallaxCamera)>,
    q_reference: Query<&GlobalTransform, With<ParallaxReference>>,
    mut q_layers: Query<(&mut Transform, &ParallaxLayer)>,
) {
    let Ok((camera_transform, camera)) = q_camera.single() else {
        return;
    };
    let Ok(reference) = q_reference.single() else {
        return;
    };
    let camera_position = camera_transform.translation();
    let reference_depth = reference.translation().z;

    for (mut transform, layer) in &mut q_layers {
        let Some(start) = layer.start else {
            continue;
        };
        transform.translation = parallax_position(start, camera_position, reference_depth, camera);
    }
}

/// Plugin running the parallax update every frame.
pub struct ParallaxPlugin;

impl Plugin for ParallaxPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<ParallaxCamera>();
        app.register_type::<ParallaxReference>();
        app.register_type::<ParallaxLayer>();

        app.add_systems(
            PostUpdate,
            (init_parallax_layers, update_parallax_layers)
                .chain()
                .before(TransformSystem::TransformPropagate),
        );
    }
}
