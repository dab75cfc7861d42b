//! Controller configuration components.
//!
//! This module defines the tunables for a platformer character: run speed,
//! jump impulse, knockback, damage timing, ground probe placement and the
//! thresholds used by the jump arbiter and animation selector.

use bevy::prelude::*;
use thiserror::Error;

/// Error returned by [`ControllerConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// A parameter is NaN or infinite.
    #[error("`{field}` must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },
    /// A parameter that must be zero or greater is negative.
    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    /// A parameter that must be strictly positive is zero or negative.
    #[error("`{field}` must be greater than zero, got {value}")]
    NonPositive { field: &'static str, value: f32 },
}

/// Configuration parameters for the platformer controller.
///
/// Values are in world units and seconds. The defaults match a world where one
/// unit is roughly one meter; use [`ControllerConfig::pixel_scaled`] for pixel
/// based worlds.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct ControllerConfig {
    // === Movement Settings ===
    /// Horizontal speed at full input (units/second). Applied instantly.
    pub speed: f32,

    /// Vertical velocity added when a jump starts (units/second).
    pub jump_force: f32,

    // === Damage Settings ===
    /// Horizontal knockback speed on hazard contact. The sign is chosen
    /// opposite the character's facing.
    pub knockback_x: f32,

    /// Upward knockback speed on hazard contact.
    pub knockback_y: f32,

    /// Length of the damage flash ramp in seconds.
    pub flash_duration: f32,

    /// Delay between hazard contact and the forced respawn, in seconds.
    pub respawn_delay: f32,

    // === Ground Probe Settings ===
    /// Left foot probe origin, relative to the character position.
    pub left_probe_offset: Vec2,

    /// Right foot probe origin, relative to the character position.
    pub right_probe_offset: Vec2,

    /// Length of each downward probe ray.
    pub probe_length: f32,

    // === Thresholds ===
    /// A jump may only start while the vertical velocity is at most this.
    pub jump_velocity_threshold: f32,

    /// Horizontal speed above which the character counts as running.
    pub run_threshold: f32,

    /// Vertical speed band used to tell rising, falling and level apart.
    pub vertical_threshold: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Movement settings
            speed: 5.0,
            jump_force: 8.0,

            // Damage settings
            knockback_x: 4.0,
            knockback_y: 6.0,
            flash_duration: 1.0,
            respawn_delay: 0.5,

            // Ground probe settings
            left_probe_offset: Vec2::new(-0.25, -0.5),
            right_probe_offset: Vec2::new(0.25, -0.5),
            probe_length: 0.05,

            // Thresholds
            jump_velocity_threshold: 0.1,
            run_threshold: 0.1,
            vertical_threshold: 0.1,
        }
    }
}

impl ControllerConfig {
    /// Create a config tuned for a responsive player character.
    pub fn player() -> Self {
        Self {
            speed: 6.0,
            jump_force: 9.0,
            ..default()
        }
    }

    /// Scale every distance-based parameter for a world measured in pixels.
    ///
    /// Timing parameters and thresholds stay as they are.
    pub fn pixel_scaled(units_per_meter: f32) -> Self {
        let base = Self::default();
        Self {
            speed: base.speed * units_per_meter,
            jump_force: base.jump_force * units_per_meter,
            knockback_x: base.knockback_x * units_per_meter,
            knockback_y: base.knockback_y * units_per_meter,
            left_probe_offset: base.left_probe_offset * units_per_meter,
            right_probe_offset: base.right_probe_offset * units_per_meter,
            probe_length: base.probe_length * units_per_meter,
            ..base
        }
    }

    /// Builder: set run speed.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Builder: set jump force.
    pub fn with_jump_force(mut self, jump_force: f32) -> Self {
        self.jump_force = jump_force;
        self
    }

    /// Builder: set knockback components.
    pub fn with_knockback(mut self, x: f32, y: f32) -> Self {
        self.knockback_x = x;
        self.knockback_y = y;
        self
    }

    /// Builder: set flash ramp duration.
    pub fn with_flash_duration(mut self, seconds: f32) -> Self {
        self.flash_duration = seconds;
        self
    }

    /// Builder: set respawn delay.
    pub fn with_respawn_delay(mut self, seconds: f32) -> Self {
        self.respawn_delay = seconds;
        self
    }

    /// Builder: set both foot probe offsets.
    pub fn with_probe_offsets(mut self, left: Vec2, right: Vec2) -> Self {
        self.left_probe_offset = left;
        self.right_probe_offset = right;
        self
    }

    /// Builder: set probe ray length.
    pub fn with_probe_length(mut self, length: f32) -> Self {
        self.probe_length = length;
        self
    }

    /// World-space origins of the left and right probes for a character at
    /// `position`.
    #[inline]
    pub fn probe_origins(&self, position: Vec2) -> (Vec2, Vec2) {
        (
            position + self.left_probe_offset,
            position + self.right_probe_offset,
        )
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("speed", self.speed),
            ("jump_force", self.jump_force),
            ("knockback_x", self.knockback_x),
            ("knockback_y", self.knockback_y),
            ("flash_duration", self.flash_duration),
            ("respawn_delay", self.respawn_delay),
            ("probe_length", self.probe_length),
            ("jump_velocity_threshold", self.jump_velocity_threshold),
            ("run_threshold", self.run_threshold),
            ("vertical_threshold", self.vertical_threshold),
            ("left_probe_offset.x", self.left_probe_offset.x),
            ("left_probe_offset.y", self.left_probe_offset.y),
            ("right_probe_offset.x", self.right_probe_offset.x),
            ("right_probe_offset.y", self.right_probe_offset.y),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }

        for (field, value) in [
            ("speed", self.speed),
            ("respawn_delay", self.respawn_delay),
            ("run_threshold", self.run_threshold),
            ("vertical_threshold", self.vertical_threshold),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        // A zero-length ramp or probe never fires.
        for (field, value) in [
            ("flash_duration", self.flash_duration),
            ("probe_length", self.probe_length),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ControllerConfig::default().validate(), Ok(()));
        assert_eq!(ControllerConfig::player().validate(), Ok(()));
        assert_eq!(ControllerConfig::pixel_scaled(32.0).validate(), Ok(()));
    }

    #[test]
    fn default_respawn_delay_is_half_a_second() {
        assert_eq!(ControllerConfig::default().respawn_delay, 0.5);
        assert_eq!(ControllerConfig::default().probe_length, 0.05);
    }

    #[test]
    fn builders_set_fields() {
        let config = ControllerConfig::default()
            .with_speed(5.0)
            .with_jump_force(8.0)
            .with_knockback(3.0, 7.0)
            .with_flash_duration(2.0)
            .with_respawn_delay(0.25)
            .with_probe_length(0.1);

        assert_eq!(config.speed, 5.0);
        assert_eq!(config.jump_force, 8.0);
        assert_eq!(config.knockback_x, 3.0);
        assert_eq!(config.knockback_y, 7.0);
        assert_eq!(config.flash_duration, 2.0);
        assert_eq!(config.respawn_delay, 0.25);
        assert_eq!(config.probe_length, 0.1);
    }

    #[test]
    fn pixel_scaled_scales_distances_only() {
        let base = ControllerConfig::default();
        let scaled = ControllerConfig::pixel_scaled(10.0);

        assert_eq!(scaled.speed, base.speed * 10.0);
        assert_eq!(scaled.probe_length, base.probe_length * 10.0);
        assert_eq!(scaled.left_probe_offset, base.left_probe_offset * 10.0);
        assert_eq!(scaled.respawn_delay, base.respawn_delay);
        assert_eq!(scaled.run_threshold, base.run_threshold);
    }

    #[test]
    fn probe_origins_follow_position() {
        let config = ControllerConfig::default()
            .with_probe_offsets(Vec2::new(-1.0, -2.0), Vec2::new(1.0, -2.0));
        let (left, right) = config.probe_origins(Vec2::new(10.0, 5.0));
        assert_eq!(left, Vec2::new(9.0, 3.0));
        assert_eq!(right, Vec2::new(11.0, 3.0));
    }

    #[test]
    fn validate_rejects_non_finite() {
        let config = ControllerConfig::default().with_speed(f32::NAN);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite { field: "speed", .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_flash_duration() {
        let config = ControllerConfig::default().with_flash_duration(0.0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "flash_duration",
                value: 0.0
            })
        );
    }

    #[test]
    fn validate_rejects_negative_respawn_delay() {
        let config = ControllerConfig::default().with_respawn_delay(-1.0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::Negative {
                field: "respawn_delay",
                value: -1.0
            })
        );
    }

    #[test]
    fn config_error_message_names_field() {
        let err = ConfigError::NonPositive {
            field: "probe_length",
            value: 0.0,
        };
        assert_eq!(err.to_string(), "`probe_length` must be greater than zero, got 0");
    }
}
