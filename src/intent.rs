//! Input intent components.
//!
//! Intents are the abstracted per-frame input the controller consumes: a
//! horizontal axis and a jump button state. [`InputBindings`] tells the input
//! sampler where to read them from; entities without bindings keep whatever
//! intent external code writes (AI, scripting, replays, tests).

use bevy::prelude::*;

/// Abstracted input for one visual frame.
///
/// # Example
///
/// ```rust
/// use platformer_controller::prelude::*;
///
/// let mut intent = InputIntent::default();
/// intent.set_horizontal(2.0);
/// assert_eq!(intent.horizontal, 1.0);
///
/// intent.set_jump_pressed(true);
/// assert!(intent.jump_pressed);
///
/// intent.clear();
/// assert!(intent.is_neutral());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct InputIntent {
    /// Horizontal axis (-1.0 = left, 1.0 = right).
    pub horizontal: f32,
    /// Whether the jump action is held this frame.
    pub jump_pressed: bool,
}

impl InputIntent {
    /// Create an intent from raw values, clamping the axis.
    pub fn new(horizontal: f32, jump_pressed: bool) -> Self {
        let mut intent = Self::default();
        intent.set_horizontal(horizontal);
        intent.jump_pressed = jump_pressed;
        intent
    }

    /// Set the horizontal axis. Non-finite input is treated as neutral.
    pub fn set_horizontal(&mut self, axis: f32) {
        self.horizontal = if axis.is_finite() {
            axis.clamp(-1.0, 1.0)
        } else {
            0.0
        };
    }

    /// Set the jump button state.
    pub fn set_jump_pressed(&mut self, pressed: bool) {
        self.jump_pressed = pressed;
    }

    /// Reset to neutral input.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when there is no movement and no jump.
    pub fn is_neutral(&self) -> bool {
        self.horizontal == 0.0 && !self.jump_pressed
    }
}

/// Where the input sampler reads an entity's intent from.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct InputBindings {
    /// Keys that push the axis towards -1.
    pub left: Vec<KeyCode>,
    /// Keys that push the axis towards +1.
    pub right: Vec<KeyCode>,
    /// Keys that count as the jump action.
    pub jump: Vec<KeyCode>,
    /// Whether the first connected gamepad is also read.
    pub use_gamepad: bool,
    /// Stick magnitude below which gamepad input is ignored.
    pub gamepad_dead_zone: f32,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            left: vec![KeyCode::KeyA, KeyCode::ArrowLeft],
            right: vec![KeyCode::KeyD, KeyCode::ArrowRight],
            jump: vec![KeyCode::Space, KeyCode::KeyW, KeyCode::ArrowUp],
            use_gamepad: true,
            gamepad_dead_zone: 0.2,
        }
    }
}

impl InputBindings {
    /// Keyboard-only bindings with the default keys.
    pub fn keyboard() -> Self {
        Self {
            use_gamepad: false,
            ..default()
        }
    }

    /// Builder: replace the jump keys.
    pub fn with_jump_keys(mut self, keys: impl IntoIterator<Item = KeyCode>) -> Self {
        self.jump = keys.into_iter().collect();
        self
    }

    /// Builder: set the gamepad dead zone.
    pub fn with_dead_zone(mut self, dead_zone: f32) -> Self {
        self.gamepad_dead_zone = dead_zone;
        self
    }

    /// Sample an intent from the given sources.
    ///
    /// Either source may be absent; an absent source contributes nothing. A
    /// stick beyond the dead zone wins over keys when its magnitude is larger.
    pub fn sample(
        &self,
        keys: Option<&ButtonInput<KeyCode>>,
        gamepad: Option<&Gamepad>,
    ) -> InputIntent {
        let mut axis = 0.0;
        let mut jump = false;

        if let Some(keys) = keys {
            if keys.any_pressed(self.left.iter().copied()) {
                axis -= 1.0;
            }
            if keys.any_pressed(self.right.iter().copied()) {
                axis += 1.0;
            }
            jump |= keys.any_pressed(self.jump.iter().copied());
        }

        if let Some(gamepad) = gamepad.filter(|_| self.use_gamepad) {
            let stick = gamepad.left_stick().x;
            if stick.abs() > self.gamepad_dead_zone && stick.abs() > f32::abs(axis) {
                axis = stick;
            }
            jump |= gamepad.pressed(GamepadButton::South);
        }

        InputIntent::new(axis, jump)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_with(pressed: &[KeyCode]) -> ButtonInput<KeyCode> {
        let mut keys = ButtonInput::<KeyCode>::default();
        for key in pressed {
            keys.press(*key);
        }
        keys
    }

    #[test]
    fn intent_default_is_neutral() {
        let intent = InputIntent::default();
        assert!(intent.is_neutral());
        assert_eq!(intent.horizontal, 0.0);
        assert!(!intent.jump_pressed);
    }

    #[test]
    fn intent_clamps_axis() {
        let mut intent = InputIntent::default();
        intent.set_horizontal(0.5);
        assert_eq!(intent.horizontal, 0.5);

        intent.set_horizontal(5.0);
        assert_eq!(intent.horizontal, 1.0);

        intent.set_horizontal(-5.0);
        assert_eq!(intent.horizontal, -1.0);
    }

    #[test]
    fn intent_non_finite_axis_is_neutral() {
        let intent = InputIntent::new(f32::NAN, false);
        assert_eq!(intent.horizontal, 0.0);
    }

    #[test]
    fn intent_clear_resets_everything() {
        let mut intent = InputIntent::new(1.0, true);
        intent.clear();
        assert!(intent.is_neutral());
    }

    #[test]
    fn absent_sources_give_neutral_intent() {
        let bindings = InputBindings::default();
        assert!(bindings.sample(None, None).is_neutral());
    }

    #[test]
    fn keyboard_axis_and_jump() {
        let bindings = InputBindings::keyboard();

        let intent = bindings.sample(Some(&keys_with(&[KeyCode::KeyD])), None);
        assert_eq!(intent.horizontal, 1.0);
        assert!(!intent.jump_pressed);

        let intent = bindings.sample(Some(&keys_with(&[KeyCode::ArrowLeft, KeyCode::Space])), None);
        assert_eq!(intent.horizontal, -1.0);
        assert!(intent.jump_pressed);
    }

    #[test]
    fn opposing_keys_cancel() {
        let bindings = InputBindings::keyboard();
        let intent = bindings.sample(Some(&keys_with(&[KeyCode::KeyA, KeyCode::KeyD])), None);
        assert_eq!(intent.horizontal, 0.0);
    }

    #[test]
    fn custom_jump_keys() {
        let bindings = InputBindings::keyboard().with_jump_keys([KeyCode::KeyK]);
        assert!(!bindings.sample(Some(&keys_with(&[KeyCode::Space])), None).jump_pressed);
        assert!(bindings.sample(Some(&keys_with(&[KeyCode::KeyK])), None).jump_pressed);
    }

    fn gamepad_with_stick(x: f32) -> Gamepad {
        let mut gamepad = Gamepad::default();
        gamepad.analog_mut().set(GamepadAxis::LeftStickX, x);
        gamepad
    }

    #[test]
    fn stick_inside_dead_zone_is_ignored() {
        let bindings = InputBindings::default().with_dead_zone(0.5);
        let gamepad = gamepad_with_stick(0.4);
        assert_eq!(bindings.sample(None, Some(&gamepad)).horizontal, 0.0);

        let gamepad = gamepad_with_stick(-0.6);
        assert_eq!(bindings.sample(None, Some(&gamepad)).horizontal, -0.6);
    }

    #[test]
    fn keyboard_only_bindings_ignore_gamepad() {
        let gamepad = gamepad_with_stick(0.9);
        assert!(InputBindings::keyboard().sample(None, Some(&gamepad)).is_neutral());
    }
}
