use log::{debug, info};

use crate::{
    body::{CharacterBody, ContactState},
    events::{EventQueue, GameEvent},
    input::InputGate,
    settings::JumpSettings,
};

/// Jump impulse with a short press buffer.
///
/// A press while airborne is remembered for `jump_buffer` seconds and fires on the first
/// tick that finds the character back on a surface.
pub struct JumpController {
    settings: JumpSettings,
    input_enabled: bool,
    buffer: f32,
    jumped_this_tick: bool,
}

impl JumpController {
    pub fn new(settings: JumpSettings) -> Self {
        Self {
            settings,
            input_enabled: true,
            buffer: 0.0,
            jumped_this_tick: false,
        }
    }

    pub fn settings(&self) -> &JumpSettings {
        &self.settings
    }

    /// Seconds left on a buffered press, zero or less when none is pending.
    pub fn buffered(&self) -> f32 {
        self.buffer
    }

    pub fn receive_jump(
        &mut self,
        contact: &ContactState,
        body: &mut CharacterBody,
        events: &mut EventQueue<GameEvent>,
    ) {
        if !self.input_enabled {
            debug!("jump input ignored while disabled");
            return;
        }
        if contact.on_surface {
            self.jump(body, events);
            return;
        }
        self.buffer = self.settings.jump_buffer;
    }

    pub fn step(
        &mut self,
        dt: f32,
        contact: &ContactState,
        body: &mut CharacterBody,
        events: &mut EventQueue<GameEvent>,
    ) {
        if self.buffer > 0.0 && contact.on_surface && !self.jumped_this_tick {
            self.jump(body, events);
            return;
        }
        self.buffer -= dt;
        self.jumped_this_tick = false;
    }

    /// Launch upward regardless of contact. Also used to leave a rail.
    pub fn jump(&mut self, body: &mut CharacterBody, events: &mut EventQueue<GameEvent>) {
        let force = self.settings.jump_force;
        body.velocity.y = force;
        self.buffer = 0.0;
        self.jumped_this_tick = true;
        info!("jump ({force} m/s)");
        events.push(GameEvent::Jumped { force });
    }

    pub fn reset(&mut self) {
        self.buffer = 0.0;
        self.jumped_this_tick = false;
    }
}

impl InputGate for JumpController {
    fn enable_input(&mut self) {
        self.input_enabled = true;
    }

    fn disable_input(&mut self) {
        self.input_enabled = false;
        self.buffer = 0.0;
    }

    fn input_enabled(&self) -> bool {
        self.input_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::settings::BodySettings;

    const DT: f32 = 1.0 / 60.0;

    fn body() -> CharacterBody {
        CharacterBody::new(BodySettings::default(), Vec3::zeros())
    }

    #[test]
    fn jumps_immediately_from_a_surface() {
        let mut jump = JumpController::new(JumpSettings::default());
        let mut body = body();
        let mut events = EventQueue::new();
        jump.receive_jump(&ContactState::grounded(), &mut body, &mut events);

        assert_eq!(body.velocity.y, jump.settings().jump_force);
        assert_eq!(
            events.as_slice(),
            &[GameEvent::Jumped {
                force: jump.settings().jump_force
            }]
        );
    }

    #[test]
    fn buffered_press_fires_on_landing_within_the_window() {
        let mut jump = JumpController::new(JumpSettings::default());
        let mut body = body();
        let mut events = EventQueue::new();
        jump.receive_jump(&ContactState::airborne(), &mut body, &mut events);
        assert!(events.is_empty());
        assert!(jump.buffered() > 0.0);

        jump.step(DT, &ContactState::airborne(), &mut body, &mut events);
        assert!(events.is_empty());

        jump.step(DT, &ContactState::grounded(), &mut body, &mut events);
        assert_eq!(events.len(), 1);
        assert_eq!(jump.buffered(), 0.0);
    }

    #[test]
    fn buffered_press_expires() {
        let mut jump = JumpController::new(JumpSettings::default());
        let mut body = body();
        let mut events = EventQueue::new();
        jump.receive_jump(&ContactState::airborne(), &mut body, &mut events);

        let ticks = (jump.settings().jump_buffer / DT).ceil() as usize + 1;
        for _ in 0..ticks {
            jump.step(DT, &ContactState::airborne(), &mut body, &mut events);
        }
        jump.step(DT, &ContactState::grounded(), &mut body, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn disabled_input_ignores_presses_but_forced_jump_still_works() {
        let mut jump = JumpController::new(JumpSettings::default());
        let mut body = body();
        let mut events = EventQueue::new();
        jump.receive_jump(&ContactState::airborne(), &mut body, &mut events);
        jump.disable_input();
        assert_eq!(jump.buffered(), 0.0);

        jump.receive_jump(&ContactState::grounded(), &mut body, &mut events);
        assert!(events.is_empty());

        jump.jump(&mut body, &mut events);
        assert_eq!(events.len(), 1);
        assert_eq!(body.velocity.y, jump.settings().jump_force);
    }
}
