//! Platform Level Example
//!
//! A playable level built from colored rectangles:
//! - A floor with a gap
//! - A raised platform
//! - A row of hazard blocks that knock the player back
//! - A finish trigger at the far right
//! - Three parallax background layers
//!
//! ## Controls
//! - **A/D** or **Left/Right**: Move horizontally
//! - **Space/W/Up**: Jump
//! - Gamepad left stick and South button work as well
//!
//! The camera follows the player. Touching a hazard respawns the player at
//! the start after half a second.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin, EguiPrimaryContextPass};
use bevy_rapier2d::prelude::*;
use platformer_controller::prelude::*;

// ==================== Constants ====================

/// Pixels per world unit, for both rendering and Rapier.
const PX_PER_M: f32 = 32.0;

const PLAYER_HALF_SIZE: Vec2 = Vec2::new(8.0, 16.0);
const PLAYER_Z: f32 = 1.0;
const CAMERA_Z: f32 = 10.0;

const FLOOR_Y: f32 = -200.0;
const FLOOR_HALF_HEIGHT: f32 = 20.0;

const FINISH_X: f32 = 1400.0;

#[derive(Component)]
struct Player;

fn spawn_position() -> Vec2 {
    Vec2::new(-300.0, FLOOR_Y + FLOOR_HALF_HEIGHT + PLAYER_HALF_SIZE.y + 4.0)
}

// ==================== Main ====================

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Platform Level - Platformer Controller Example".into(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))
        // Physics, stepped with the controller's fixed schedule
        .add_plugins(
            RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(PX_PER_M).in_fixed_schedule(),
        )
        // Platformer controller
        .add_plugins(PlatformerControllerPlugin::<Rapier2dBackend>::default())
        .add_plugins(ParallaxPlugin)
        // Egui for the diagnostics window
        .add_plugins(EguiPlugin::default())
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                camera_follow,
                tint_flash.after(PlatformerSet::Presentation),
                log_level_events,
            ),
        )
        .add_systems(EguiPrimaryContextPass, diagnostics_ui)
        .run();
}

// ==================== Setup ====================

fn setup(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Transform::from_xyz(spawn_position().x, spawn_position().y, CAMERA_Z),
        ParallaxCamera::default(),
    ));

    spawn_background(&mut commands);
    spawn_level(&mut commands);
    spawn_player(&mut commands);

    commands.spawn((
        Text::new("A/D: Move | Space: Jump | Reach the green flag"),
        TextFont {
            font_size: 20.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        Pickable::IGNORE,
    ));
}

fn spawn_background(commands: &mut Commands) {
    // Deeper layers follow the camera more closely and read as farther away.
    let layers = [
        (-2.0, Color::srgb(0.25, 0.3, 0.45), Vec2::new(3000.0, 220.0), -60.0),
        (-5.0, Color::srgb(0.18, 0.2, 0.35), Vec2::new(3000.0, 320.0), 0.0),
        (-8.0, Color::srgb(0.1, 0.12, 0.22), Vec2::new(3000.0, 500.0), 80.0),
    ];

    for (z, color, size, y) in layers {
        commands.spawn((
            Sprite::from_color(color, size),
            Transform::from_xyz(400.0, y, z),
            ParallaxLayer::default(),
        ));
    }
}

fn spawn_level(commands: &mut Commands) {
    let ground = Color::srgb(0.35, 0.35, 0.35);

    // Floor, split by a gap
    spawn_block(
        commands,
        Vec2::new(-100.0, FLOOR_Y),
        Vec2::new(400.0, FLOOR_HALF_HEIGHT),
        ground,
        LevelLayer::Ground,
    );
    spawn_block(
        commands,
        Vec2::new(1000.0, FLOOR_Y),
        Vec2::new(550.0, FLOOR_HALF_HEIGHT),
        ground,
        LevelLayer::Ground,
    );

    // Raised platform over the gap
    spawn_block(
        commands,
        Vec2::new(375.0, FLOOR_Y + 90.0),
        Vec2::new(60.0, 10.0),
        Color::srgb(0.4, 0.5, 0.3),
        LevelLayer::Ground,
    );

    // Hazard row
    for i in 0..4 {
        spawn_block(
            commands,
            Vec2::new(700.0 + 40.0 * i as f32, FLOOR_Y + FLOOR_HALF_HEIGHT + 8.0),
            Vec2::new(8.0, 8.0),
            Color::srgb(0.85, 0.2, 0.2),
            LevelLayer::Hazard,
        );
    }

    // Finish trigger
    commands.spawn((
        Sprite::from_color(Color::srgb(0.2, 0.8, 0.3), Vec2::new(24.0, 96.0)),
        Transform::from_xyz(FINISH_X, FLOOR_Y + FLOOR_HALF_HEIGHT + 48.0, 0.0),
        Collider::cuboid(12.0, 48.0),
        Sensor,
        LevelLayer::Finish,
    ));
}

fn spawn_block(
    commands: &mut Commands,
    position: Vec2,
    half_size: Vec2,
    color: Color,
    layer: LevelLayer,
) {
    commands.spawn((
        Sprite::from_color(color, half_size * 2.0),
        Transform::from_translation(position.extend(0.0)),
        RigidBody::Fixed,
        Collider::cuboid(half_size.x, half_size.y),
        layer,
    ));
}

fn spawn_player(commands: &mut Commands) {
    let spawn_pos = spawn_position();

    commands.spawn((
        Player,
        Name::new("Player"),
        Sprite::from_color(Color::srgb(0.2, 0.6, 0.9), PLAYER_HALF_SIZE * 2.0),
        Transform::from_translation(spawn_pos.extend(PLAYER_Z)),
        // Controller
        PlatformerController::new(),
        // Foot probes at the collider's bottom corners
        ControllerConfig::pixel_scaled(PX_PER_M),
        InputBindings::default(),
        RespawnAnchor(spawn_pos),
        ParallaxReference,
        // Physics
        Rapier2dPlayerBundle::new(),
        Collider::cuboid(PLAYER_HALF_SIZE.x, PLAYER_HALF_SIZE.y),
    ));
}

// ==================== Systems ====================

/// Smoothly follows the player with the camera.
fn camera_follow(
    player_query: Query<&Transform, (With<Player>, Without<Camera2d>)>,
    mut camera_query: Query<&mut Transform, With<Camera2d>>,
) {
    let Ok(player_transform) = player_query.single() else {
        return;
    };

    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    let target = player_transform.translation.xy();
    let current = camera_transform.translation.xy();
    let smoothed = current.lerp(target, 0.1);
    camera_transform.translation.x = smoothed.x;
    camera_transform.translation.y = smoothed.y;
}

/// Blend the player sprite towards white by the flash intensity.
fn tint_flash(
    mut q_player: Query<(&PresentationSignals, &mut Sprite), (With<Player>, Changed<PresentationSignals>)>,
) {
    let base = Color::srgb(0.2, 0.6, 0.9).to_srgba();
    for (signals, mut sprite) in &mut q_player {
        sprite.color = base.mix(&Srgba::WHITE, signals.flash_amount).into();
    }
}

fn log_level_events(
    mut completed: EventReader<LevelCompleted>,
    mut damaged: EventReader<DamageTaken>,
    mut respawned: EventReader<Respawned>,
) {
    for event in completed.read() {
        info!("Level complete! ({} entered {})", event.character, event.finish);
    }
    for event in damaged.read() {
        info!("Ouch: knocked back with {}", event.knockback);
    }
    for event in respawned.read() {
        info!("Back at {}", event.position);
    }
}

/// Read-only diagnostics window for the player.
fn diagnostics_ui(
    mut contexts: EguiContexts,
    q_player: Query<
        (
            &PlatformerController,
            &Transform,
            &Velocity,
            &InputIntent,
            &AnimationState,
            &DamageSequence,
            &PresentationSignals,
        ),
        With<Player>,
    >,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };
    let Ok((controller, transform, velocity, intent, animation, damage, signals)) = q_player.single()
    else {
        return;
    };

    egui::Window::new("Diagnostics")
        .default_pos([1000.0, 40.0])
        .default_width(240.0)
        .collapsible(true)
        .resizable(false)
        .show(ctx, |ui| {
            let state_color = if controller.grounded {
                egui::Color32::from_rgb(100, 200, 100)
            } else {
                egui::Color32::from_rgb(200, 100, 100)
            };
            ui.horizontal(|ui| {
                ui.label("State:");
                ui.colored_label(
                    state_color,
                    if controller.grounded { "GROUNDED" } else { "AIRBORNE" },
                );
            });
            ui.horizontal(|ui| {
                ui.label("Probes (L/R):");
                ui.label(format!("{} / {}", controller.probe.left, controller.probe.right));
            });
            ui.horizontal(|ui| {
                ui.label("Facing:");
                ui.label(format!("{:?}", controller.facing));
            });
            ui.horizontal(|ui| {
                ui.label("Animation:");
                ui.label(animation.clip_name());
            });

            ui.separator();
            ui.horizontal(|ui| {
                ui.label("Position:");
                ui.label(format!(
                    "({:.1}, {:.1})",
                    transform.translation.x, transform.translation.y
                ));
            });
            ui.horizontal(|ui| {
                ui.label("Velocity:");
                ui.label(format!("({:.1}, {:.1})", velocity.linvel.x, velocity.linvel.y));
            });
            ui.horizontal(|ui| {
                ui.label("Intent:");
                ui.label(format!(
                    "axis {:.2}, jump {}",
                    intent.horizontal, intent.jump_pressed
                ));
            });

            ui.separator();
            let damage_color = if controller.damaged {
                egui::Color32::from_rgb(220, 120, 60)
            } else {
                egui::Color32::from_rgb(150, 150, 150)
            };
            ui.horizontal(|ui| {
                ui.label("Damaged:");
                ui.colored_label(damage_color, if controller.damaged { "Yes" } else { "No" });
            });
            ui.horizontal(|ui| {
                ui.label("Flash:");
                ui.label(format!("{:.2}", signals.flash_amount));
            });
            ui.horizontal(|ui| {
                ui.label("Pending respawns:");
                ui.label(damage.pending_respawns().to_string());
            });
        });
}
