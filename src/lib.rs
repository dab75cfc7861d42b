//! # `platformer_controller`
//!
//! A 2D platformer character controller with physics backend abstraction.
//!
//! This crate turns per-frame input intents into velocity changes and keeps
//! the small amount of state a platformer character needs:
//! - Two-ray ground probing against the Ground layer
//! - Single-step jump pulses gated on ground contact and vertical velocity
//! - A damage sequence with knockback, a fading flash and a delayed respawn
//! - Priority-ordered animation state selection
//! - Edge-triggered hazard and finish contacts
//! - Depth-weighted parallax background layers
//!
//! ## Architecture
//!
//! State lives in components on the character entity. Frame-domain systems
//! run in `Update`, physics-domain systems in `FixedUpdate`, ordered through
//! [`PlatformerSet`]. Everything that touches velocity goes through a
//! [`PlatformerPhysicsBackend`](backend::PlatformerPhysicsBackend); a Rapier2D
//! backend ships behind the `rapier2d` feature and a
//! [`HeadlessBackend`](headless::HeadlessBackend) is always available.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use platformer_controller::prelude::*;
//!
//! // Controller plus its tuning; intent, damage and presentation components
//! // are inserted with defaults.
//! let controller = PlatformerController::new();
//! let config = ControllerConfig::player();
//! let bindings = InputBindings::keyboard();
//! let anchor = RespawnAnchor(Vec2::new(0.0, 1.0));
//! ```

use bevy::prelude::*;

pub mod animation;
pub mod backend;
pub mod collision;
pub mod config;
pub mod damage;
pub mod detection;
pub mod headless;
pub mod intent;
pub mod motion;
pub mod parallax;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::animation::AnimationState;
    pub use crate::backend::PlatformerPhysicsBackend;
    pub use crate::collision::{ContactStarted, LevelCompleted, LevelLayer};
    pub use crate::config::{ConfigError, ControllerConfig};
    pub use crate::damage::{DamageSequence, DamageTaken, RespawnAnchor, Respawned};
    pub use crate::detection::GroundProbeResult;
    pub use crate::headless::{HeadlessBackend, HeadlessBody, HeadlessCollider};
    pub use crate::intent::{InputBindings, InputIntent};
    pub use crate::parallax::{ParallaxCamera, ParallaxLayer, ParallaxPlugin, ParallaxReference};
    pub use crate::state::{
        Airborne, Damaged, Facing, Grounded, PlatformerController, PresentationSignals,
    };
    pub use crate::{PlatformerControllerPlugin, PlatformerSet};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{Rapier2dBackend, Rapier2dPlayerBundle};
}

/// System sets for the controller, in execution order within each schedule.
///
/// `Update`: [`Input`](Self::Input) → [`Sensors`](Self::Sensors) →
/// [`State`](Self::State) → [`Damage`](Self::Damage) →
/// [`Presentation`](Self::Presentation).
///
/// `FixedUpdate`: [`Arbitration`](Self::Arbitration) → [`Motion`](Self::Motion)
/// → [`Simulation`](Self::Simulation) → [`Contacts`](Self::Contacts) →
/// [`Reactions`](Self::Reactions).
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlatformerSet {
    /// Sample input into intents and update facing.
    Input,
    /// Backend ground probes.
    Sensors,
    /// Sync marker components with controller state.
    State,
    /// Advance damage timers and perform respawns.
    Damage,
    /// Animation selection and presentation signals.
    Presentation,
    /// Decide the jump pulse.
    Arbitration,
    /// Apply input, ground snap and jump impulse.
    Motion,
    /// Backend integration step, if the backend has one.
    Simulation,
    /// Backend contact translation into [`ContactStarted`](collision::ContactStarted).
    Contacts,
    /// Hazard and finish handling.
    Reactions,
}

/// Main plugin for the platformer controller.
///
/// Generic over a physics backend `B` that provides velocity access and
/// registers its own sensor and contact systems.
///
/// # Examples
///
/// With Rapier2D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use platformer_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
///     .add_plugins(PlatformerControllerPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct PlatformerControllerPlugin<B: backend::PlatformerPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::PlatformerPhysicsBackend> Default for PlatformerControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::PlatformerPhysicsBackend> Plugin for PlatformerControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                PlatformerSet::Input,
                PlatformerSet::Sensors,
                PlatformerSet::State,
                PlatformerSet::Damage,
                PlatformerSet::Presentation,
            )
                .chain(),
        );
        app.configure_sets(
            FixedUpdate,
            (
                PlatformerSet::Arbitration,
                PlatformerSet::Motion,
                PlatformerSet::Simulation,
                PlatformerSet::Contacts,
                PlatformerSet::Reactions,
            )
                .chain(),
        );

        // Register core types
        app.register_type::<state::PlatformerController>();
        app.register_type::<state::Facing>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::Damaged>();
        app.register_type::<state::PresentationSignals>();
        app.register_type::<config::ControllerConfig>();
        app.register_type::<intent::InputIntent>();
        app.register_type::<intent::InputBindings>();
        app.register_type::<detection::GroundProbeResult>();
        app.register_type::<damage::DamageSequence>();
        app.register_type::<damage::RespawnAnchor>();
        app.register_type::<animation::AnimationState>();
        app.register_type::<collision::LevelLayer>();

        app.add_event::<collision::ContactStarted>();
        app.add_event::<collision::LevelCompleted>();
        app.add_event::<damage::DamageTaken>();
        app.add_event::<damage::Respawned>();

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            Update,
            (
                (systems::validate_configs, systems::sample_input, systems::update_facing)
                    .chain()
                    .in_set(PlatformerSet::Input),
                systems::sync_state_markers.in_set(PlatformerSet::State),
                systems::advance_damage::<B>.in_set(PlatformerSet::Damage),
                (
                    systems::select_animation::<B>,
                    systems::update_presentation_signals,
                    systems::sync_sprite_flip,
                )
                    .chain()
                    .in_set(PlatformerSet::Presentation),
            ),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::arbitrate_jumps::<B>.in_set(PlatformerSet::Arbitration),
                systems::apply_motion::<B>.in_set(PlatformerSet::Motion),
                systems::handle_contacts::<B>.in_set(PlatformerSet::Reactions),
            ),
        );
    }
}
