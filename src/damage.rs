//! Damage sequence: knockback, flash ramp and delayed respawn.
//!
//! A hazard contact starts two independent timed processes. The respawn
//! countdown teleports the character to its [`RespawnAnchor`] once the delay
//! elapses, no matter what else happens. The flash ramp fades from 1.0 to 0.0
//! and ends early when the character lands; when it ends the character is no
//! longer damaged. Both are plain state objects advanced once per frame.

use std::time::Duration;

use bevy::prelude::*;

use crate::config::ControllerConfig;
use crate::state::{Facing, PlatformerController};

/// Fixed point the character is returned to after taking damage.
///
/// Set by level setup; the controller only reads it.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct RespawnAnchor(pub Vec2);

/// Knockback velocity for a character facing `facing`.
///
/// The horizontal component pushes away from the faced direction; the
/// vertical component is always upward.
pub fn knockback_velocity(facing: Facing, config: &ControllerConfig) -> Vec2 {
    Vec2::new(-facing.sign() * config.knockback_x, config.knockback_y)
}

/// Why a flash ramp ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashEnd {
    /// The character touched ground again.
    Landed,
    /// The full duration elapsed.
    Elapsed,
}

/// Time since `clock`, moving `clock` up to `now`.
fn elapse(clock: &mut Duration, now: Duration) -> Duration {
    let delta = now.saturating_sub(*clock);
    *clock = (*clock).max(now);
    delta
}

/// Linear 1.0 → 0.0 flash ramp.
#[derive(Debug, Clone)]
pub struct FlashRamp {
    timer: Timer,
    airborne_seen: bool,
    /// Clock reading the ramp was last advanced to.
    clock: Duration,
}

impl FlashRamp {
    /// Ramp of `duration` seconds starting at clock reading `now`.
    pub fn new(duration: f32, now: Duration) -> Self {
        Self {
            timer: Timer::from_seconds(duration, TimerMode::Once),
            airborne_seen: false,
            clock: now,
        }
    }

    /// Current intensity.
    pub fn intensity(&self) -> f32 {
        1.0 - self.timer.fraction()
    }

    /// Advance to clock reading `now`. Returns `Some` once the ramp is over.
    ///
    /// Landing only counts after an airborne sample, so the frame the hit
    /// lands on (still standing on the hazard) does not end the ramp.
    pub fn advance(&mut self, now: Duration, grounded: bool) -> Option<FlashEnd> {
        let delta = elapse(&mut self.clock, now);
        if !grounded {
            self.airborne_seen = true;
        } else if self.airborne_seen {
            return Some(FlashEnd::Landed);
        }

        self.timer.tick(delta);
        self.timer.finished().then_some(FlashEnd::Elapsed)
    }
}

/// Countdown to the forced respawn.
#[derive(Debug, Clone)]
pub struct RespawnCountdown {
    timer: Timer,
    clock: Duration,
}

impl RespawnCountdown {
    /// Countdown of `delay` seconds starting at clock reading `now`.
    pub fn new(delay: f32, now: Duration) -> Self {
        Self {
            timer: Timer::from_seconds(delay, TimerMode::Once),
            clock: now,
        }
    }

    /// Advance to clock reading `now`. Returns true when the respawn is due.
    pub fn advance(&mut self, now: Duration) -> bool {
        let delta = elapse(&mut self.clock, now);
        self.timer.tick(delta);
        self.timer.finished()
    }

    pub fn remaining_secs(&self) -> f32 {
        self.timer.remaining_secs()
    }
}

/// What one frame of the damage sequence produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DamageTick {
    /// Number of respawn countdowns that completed this frame.
    pub respawns_due: usize,
    /// Set when the flash ramp ended this frame.
    pub flash_ended: Option<FlashEnd>,
}

/// Timed processes of the damage state machine.
///
/// The damaged flag itself lives in [`PlatformerController`]; this component
/// holds the processes that drive it back to normal. Each process keeps the
/// clock reading it started at, so one started during a physics step does
/// not age until time actually passes.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct DamageSequence {
    #[reflect(ignore)]
    flash: Option<FlashRamp>,
    /// Countdowns are independent: a later hit never cancels or resets an
    /// earlier one.
    #[reflect(ignore)]
    respawns: Vec<RespawnCountdown>,
}

impl DamageSequence {
    /// Enter the damaged state at clock reading `now`.
    ///
    /// Returns the knockback velocity to apply, or `None` when the character
    /// is already damaged and the contact is ignored.
    pub fn begin(
        &mut self,
        now: Duration,
        controller: &mut PlatformerController,
        config: &ControllerConfig,
    ) -> Option<Vec2> {
        if controller.damaged {
            return None;
        }

        controller.damaged = true;
        controller.can_jump = false;
        self.respawns.push(RespawnCountdown::new(config.respawn_delay, now));
        self.start_flash(now, config.flash_duration);

        Some(knockback_velocity(controller.facing, config))
    }

    /// Start the flash ramp unless one is running. Returns true if started.
    pub fn start_flash(&mut self, now: Duration, duration: f32) -> bool {
        if self.flash.is_some() {
            return false;
        }
        self.flash = Some(FlashRamp::new(duration, now));
        true
    }

    /// Advance both processes to clock reading `now`.
    ///
    /// Clears `controller.damaged` the moment the flash ramp ends.
    pub fn advance(&mut self, now: Duration, controller: &mut PlatformerController) -> DamageTick {
        let mut tick = DamageTick::default();

        let before = self.respawns.len();
        self.respawns.retain_mut(|countdown| !countdown.advance(now));
        tick.respawns_due = before - self.respawns.len();

        if let Some(flash) = self.flash.as_mut() {
            if let Some(end) = flash.advance(now, controller.grounded) {
                self.flash = None;
                controller.damaged = false;
                tick.flash_ended = Some(end);
            }
        }

        tick
    }

    /// Flash intensity for the renderer; 0 when no ramp is running.
    pub fn flash_amount(&self) -> f32 {
        self.flash.as_ref().map(FlashRamp::intensity).unwrap_or(0.0)
    }

    /// Whether any process is still running.
    pub fn is_active(&self) -> bool {
        self.flash.is_some() || !self.respawns.is_empty()
    }

    pub fn is_flashing(&self) -> bool {
        self.flash.is_some()
    }

    pub fn pending_respawns(&self) -> usize {
        self.respawns.len()
    }
}

/// Sent when a hazard contact starts a damage sequence.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageTaken {
    pub character: Entity,
    /// Velocity the character was knocked back with.
    pub knockback: Vec2,
}

/// Sent when the character is teleported to its respawn anchor.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct Respawned {
    pub character: Entity,
    pub position: Vec2,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(20);

    fn config() -> ControllerConfig {
        ControllerConfig::default()
            .with_knockback(4.0, 6.0)
            .with_flash_duration(1.0)
            .with_respawn_delay(0.5)
    }

    #[test]
    fn knockback_opposes_facing() {
        let config = config();
        assert_eq!(knockback_velocity(Facing::Right, &config), Vec2::new(-4.0, 6.0));
        assert_eq!(knockback_velocity(Facing::Left, &config), Vec2::new(4.0, 6.0));
    }

    /// Clock reading after `frames` frames.
    fn at(frames: u32) -> Duration {
        FRAME * frames
    }

    #[test]
    fn begin_enters_damaged_state() {
        let mut controller = PlatformerController::new();
        controller.can_jump = true;
        let mut sequence = DamageSequence::default();

        let knockback = sequence.begin(at(0), &mut controller, &config());

        assert_eq!(knockback, Some(Vec2::new(-4.0, 6.0)));
        assert!(controller.damaged);
        assert!(!controller.can_jump);
        assert!(sequence.is_flashing());
        assert_eq!(sequence.pending_respawns(), 1);
        assert_eq!(sequence.flash_amount(), 1.0);
    }

    #[test]
    fn begin_is_ignored_while_damaged() {
        let mut controller = PlatformerController::new();
        let mut sequence = DamageSequence::default();
        sequence.begin(at(0), &mut controller, &config());
        sequence.advance(at(5), &mut controller);
        let remaining = sequence.respawns[0].remaining_secs();

        assert_eq!(sequence.begin(at(5), &mut controller, &config()), None);
        assert_eq!(sequence.pending_respawns(), 1);
        // Timer was not reset.
        assert_eq!(sequence.respawns[0].remaining_secs(), remaining);
    }

    #[test]
    fn advance_in_the_start_frame_does_not_age() {
        let mut controller = PlatformerController::new();
        let mut sequence = DamageSequence::default();
        sequence.begin(at(3), &mut controller, &config());

        sequence.advance(at(3), &mut controller);
        assert_eq!(sequence.flash_amount(), 1.0);
        assert_eq!(sequence.respawns[0].remaining_secs(), 0.5);
    }

    #[test]
    fn flash_ramp_is_linear() {
        let mut flash = FlashRamp::new(1.0, at(10));
        assert_eq!(flash.intensity(), 1.0);

        flash.advance(at(35), false);
        assert!((flash.intensity() - 0.5).abs() < 1e-4);

        flash.advance(at(47) + Duration::from_millis(10), false);
        assert!((flash.intensity() - 0.25).abs() < 1e-4);
    }

    #[test]
    fn flash_ends_after_duration() {
        let mut flash = FlashRamp::new(0.25, at(0));
        for frame in 1..=12 {
            assert_eq!(flash.advance(at(frame), false), None);
        }
        assert_eq!(flash.advance(at(13), false), Some(FlashEnd::Elapsed));
    }

    #[test]
    fn flash_ends_on_landing() {
        let mut flash = FlashRamp::new(1.0, at(0));
        assert_eq!(flash.advance(at(1), false), None);
        assert_eq!(flash.advance(at(2), true), Some(FlashEnd::Landed));
    }

    #[test]
    fn flash_ignores_ground_before_leaving_it() {
        let mut flash = FlashRamp::new(1.0, at(0));
        assert_eq!(flash.advance(at(1), true), None);
        assert_eq!(flash.advance(at(2), true), None);
        assert_eq!(flash.advance(at(3), false), None);
        assert_eq!(flash.advance(at(4), true), Some(FlashEnd::Landed));
    }

    #[test]
    fn stale_readings_do_not_rewind_a_process() {
        let mut countdown = RespawnCountdown::new(0.5, at(10));
        assert!(!countdown.advance(at(4)));
        assert_eq!(countdown.remaining_secs(), 0.5);
        assert!(!countdown.advance(at(34)));
        assert!(countdown.advance(at(35)));
    }

    #[test]
    fn landing_clears_damaged_in_the_same_frame() {
        let mut controller = PlatformerController::new();
        let mut sequence = DamageSequence::default();
        sequence.begin(at(0), &mut controller, &config());

        controller.grounded = false;
        let tick = sequence.advance(at(1), &mut controller);
        assert!(controller.damaged);
        assert_eq!(tick.flash_ended, None);

        controller.grounded = true;
        let tick = sequence.advance(at(2), &mut controller);
        assert!(!controller.damaged);
        assert_eq!(tick.flash_ended, Some(FlashEnd::Landed));
        assert_eq!(sequence.flash_amount(), 0.0);
    }

    #[test]
    fn flash_reaches_half_intensity_halfway() {
        let mut controller = PlatformerController::new();
        let mut sequence = DamageSequence::default();
        sequence.begin(at(0), &mut controller, &config());

        sequence.advance(at(25), &mut controller);
        assert!(controller.damaged);
        assert!((sequence.flash_amount() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn respawn_is_due_after_delay_regardless_of_flash() {
        let mut controller = PlatformerController::new();
        let mut sequence = DamageSequence::default();
        sequence.begin(at(0), &mut controller, &config());

        // Land early: flash ends, respawn still pending.
        controller.grounded = false;
        sequence.advance(at(1), &mut controller);
        controller.grounded = true;
        sequence.advance(at(2), &mut controller);
        assert!(!controller.damaged);
        assert_eq!(sequence.pending_respawns(), 1);

        for frame in 3..25 {
            assert_eq!(sequence.advance(at(frame), &mut controller).respawns_due, 0);
        }
        assert_eq!(sequence.advance(at(25), &mut controller).respawns_due, 1);
        assert_eq!(sequence.pending_respawns(), 0);
    }

    #[test]
    fn later_hit_keeps_earlier_countdown() {
        let mut controller = PlatformerController::new();
        let mut sequence = DamageSequence::default();
        sequence.begin(at(0), &mut controller, &config());

        controller.grounded = false;
        sequence.advance(at(5), &mut controller);
        controller.grounded = true;
        sequence.advance(at(6), &mut controller);
        assert!(!controller.damaged);

        // Second hit during the next physics step, before that frame's
        // advance: a second, independent countdown.
        assert!(sequence.begin(at(7), &mut controller, &config()).is_some());
        assert_eq!(sequence.pending_respawns(), 2);

        sequence.advance(at(7), &mut controller);
        assert_eq!(sequence.flash_amount(), 1.0);
        assert_eq!(sequence.respawns[1].remaining_secs(), 0.5);

        // The first countdown is due at frame 25, the second at frame 32.
        let mut due = Vec::new();
        for frame in 8..=32 {
            if sequence.advance(at(frame), &mut controller).respawns_due > 0 {
                due.push(frame);
            }
        }
        assert_eq!(due, vec![25, 32]);
        assert_eq!(sequence.pending_respawns(), 0);
    }

    #[test]
    fn start_flash_is_idempotent() {
        let mut sequence = DamageSequence::default();
        assert!(sequence.start_flash(at(0), 1.0));
        assert!(!sequence.start_flash(at(1), 1.0));
    }

    #[test]
    fn idle_sequence_restarts_from_current_clock() {
        let mut controller = PlatformerController::new();
        let mut sequence = DamageSequence::default();
        sequence.advance(at(1), &mut controller);

        // Long gap without advancing, then a hit.
        sequence.begin(at(100), &mut controller, &config());
        sequence.advance(at(101), &mut controller);
        assert!((sequence.respawns[0].remaining_secs() - 0.48).abs() < 1e-4);
    }
}
