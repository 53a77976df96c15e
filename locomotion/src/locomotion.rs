//! Free ground and air movement: acceleration, friction, crouch and slide.
//!
//! Stepped once per fixed tick, after contact sensing of the previous tick. Friction is
//! computed from the velocity at the start of the step, and so is the drive: the two are
//! summed rather than chained.

use log::{debug, info};

use crate::{
    body::{CharacterBody, ContactState},
    events::{EventQueue, GameEvent},
    input::InputGate,
    layers::LayerMask,
    math::{
        Quat, Vec2, Vec3, flatten, look_forward, look_right, normalize_or_zero, planar_speed_sq,
        project_on_plane, up,
    },
    query::RaycastQuery,
    settings::LocomotionSettings,
};

/// Velocity change from exponential damping with rate `k` over `dt`.
///
/// The factor `e^(-k dt) - 1` lies in `(-1, 0]`, so no component ever changes sign.
pub fn friction_delta(velocity: Vec3, k: f32, dt: f32) -> Vec3 {
    velocity * ((-k.max(0.0) * dt.max(0.0)).exp() - 1.0)
}

pub struct LocomotionController {
    settings: LocomotionSettings,
    input_enabled: bool,
    move_input: Vec2,
    crouch_input: bool,
    crouched: bool,
    slide_timer: f32,
    wish_dir: Vec3,
    on_surface: bool,
}

impl LocomotionController {
    pub fn new(settings: LocomotionSettings) -> Self {
        Self {
            settings,
            input_enabled: true,
            move_input: Vec2::zeros(),
            crouch_input: false,
            crouched: false,
            slide_timer: 0.0,
            wish_dir: Vec3::zeros(),
            on_surface: false,
        }
    }

    pub fn settings(&self) -> &LocomotionSettings {
        &self.settings
    }

    /// Latch the planar move axis (`x` right, `y` forward).
    pub fn receive_move(&mut self, axis: Vec2) {
        if !self.input_enabled {
            debug!("move input ignored while disabled");
            return;
        }
        self.move_input = axis;
    }

    /// Latch crouch held (`true`) or released.
    pub fn receive_crouch(&mut self, held: bool) {
        if !self.input_enabled {
            debug!("crouch input ignored while disabled");
            return;
        }
        self.crouch_input = held;
    }

    pub fn is_crouched(&self) -> bool {
        self.crouched
    }

    /// Sliding as of the last step.
    pub fn is_sliding(&self) -> bool {
        self.sliding(self.on_surface)
    }

    pub fn slide_timer(&self) -> f32 {
        self.slide_timer
    }

    /// Normalized drive direction of the last step, zero without input.
    pub fn wish_dir(&self) -> Vec3 {
        self.wish_dir
    }

    fn sliding(&self, on_surface: bool) -> bool {
        self.crouched && self.slide_timer > 0.0 && on_surface
    }

    pub fn step(
        &mut self,
        dt: f32,
        look: &Quat,
        contact: &ContactState,
        body: &mut CharacterBody,
        probe: &impl RaycastQuery,
        events: &mut EventQueue<GameEvent>,
    ) {
        self.on_surface = contact.on_surface;
        let s = self.settings;

        if contact.hit_ground
            && self.crouched
            && planar_speed_sq(&body.velocity) > s.slide_speed_threshold_sq
        {
            self.enter_slide(true, contact, body);
        }

        let velocity = body.velocity;
        let k = if !contact.on_surface {
            s.air_friction
        } else if self.sliding(contact.on_surface) {
            s.slide_friction
        } else {
            s.ground_friction
        };
        let friction = friction_delta(velocity, k, dt);

        let mut add = Vec3::zeros();
        if !self.sliding(contact.on_surface) {
            self.wish_dir = self.compute_wish_dir(look, contact);
            let target = if self.crouched && contact.on_surface {
                s.crouch_speed
            } else {
                s.max_speed
            };
            let accel = if contact.on_surface {
                s.ground_acceleration
            } else {
                s.air_acceleration
            };
            let current = velocity.dot(&self.wish_dir);
            add = self.wish_dir * (target - current).clamp(0.0, accel * dt);
        }
        body.velocity = velocity + friction + add;

        self.process_crouch(contact, body, probe, events);

        if contact.on_ground {
            self.slide_timer -= dt;
        }
    }

    fn compute_wish_dir(&self, look: &Quat, contact: &ContactState) -> Vec3 {
        let wish = look_forward(look) * self.move_input.y + look_right(look) * self.move_input.x;
        if contact.on_slope {
            normalize_or_zero(project_on_plane(wish, &contact.slope_normal))
        } else {
            normalize_or_zero(flatten(wish))
        }
    }

    fn process_crouch(
        &mut self,
        contact: &ContactState,
        body: &mut CharacterBody,
        probe: &impl RaycastQuery,
        events: &mut EventQueue<GameEvent>,
    ) {
        if !self.crouched && self.crouch_input {
            self.crouched = true;
            let height_delta = body.crouch();
            info!("crouch");
            if planar_speed_sq(&body.velocity) > self.settings.slide_speed_threshold_sq
                && contact.on_surface
            {
                self.enter_slide(false, contact, body);
            }
            events.push(GameEvent::CrouchChanged {
                crouched: true,
                height_delta,
            });
        }

        if self.crouched && !self.crouch_input && self.can_stand(body, probe) {
            self.crouched = false;
            let height_delta = body.stand();
            info!("stand");
            events.push(GameEvent::CrouchChanged {
                crouched: false,
                height_delta,
            });
        }
    }

    /// Nothing blocking the space the standing capsule would take above the crouched head.
    fn can_stand(&self, body: &CharacterBody, probe: &impl RaycastQuery) -> bool {
        let head = body.head();
        let clear = !probe.segment_blocked(
            head,
            head + up() * body.stand_clearance(),
            LayerMask::blocking(),
        );
        if !clear {
            debug!("stand blocked by overhead geometry");
        }
        clear
    }

    fn enter_slide(&mut self, landing: bool, contact: &ContactState, body: &mut CharacterBody) {
        let s = self.settings;
        let proportion = if s.max_speed > 0.0 {
            (body.velocity.norm() / s.max_speed).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.slide_timer = s.min_slide_duration * proportion;

        let direction = if contact.on_ground {
            normalize_or_zero(flatten(body.velocity))
        } else {
            normalize_or_zero(body.velocity)
        };
        let force = if landing {
            s.landing_slide_force
        } else {
            s.ground_slide_force
        };
        body.velocity += direction * (force * proportion);
        info!(
            "{} slide for {:.2}s",
            if landing { "landing" } else { "ground" },
            self.slide_timer
        );
    }

    /// Stand up immediately and forget latched input and slide state.
    pub fn reset(&mut self, body: &mut CharacterBody) {
        if self.crouched {
            body.stand();
        }
        self.crouched = false;
        self.slide_timer = 0.0;
        self.move_input = Vec2::zeros();
        self.crouch_input = false;
        self.wish_dir = Vec3::zeros();
    }
}

impl InputGate for LocomotionController {
    fn enable_input(&mut self) {
        self.input_enabled = true;
    }

    fn disable_input(&mut self) {
        self.input_enabled = false;
        self.move_input = Vec2::zeros();
        self.crouch_input = false;
    }

    fn input_enabled(&self) -> bool {
        self.input_enabled
    }
}
