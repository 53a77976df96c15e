//! Rail grinding: locks the character to a rail until it jumps off or runs out of rail.
//!
//! Inactive -> Grinding on a rail enter event (only from Inactive). Grinding -> Exiting on a
//! manual jump, at the end of an open rail, or when the rail disappears. Exiting -> Inactive
//! once the body is further than `exit_distance_threshold` from where it left the rail,
//! which keeps the still-overlapping trigger zone from re-entering immediately.

use log::{debug, info, warn};

use crate::{
    body::CharacterBody,
    error::GrindError,
    events::{EventQueue, GameEvent, RailEvent},
    input::{InputGate, set_gates},
    layers::CollisionLayer,
    math::{Vec3, lerp, move_toward, normalize_or_zero, remap01},
    rail::{RailId, RailSet},
    settings::GrindSettings,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrindState {
    Inactive,
    Grinding,
    Exiting,
}

/// Per-session record, discarded on return to Inactive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrindSession {
    pub rail: RailId,
    /// `+1` travels toward `t = 1`, `-1` toward `t = 0`. Fixed for the session.
    pub direction: f32,
    pub speed: f32,
    /// Where the body left the rail; set when Exiting.
    pub exit_anchor: Option<Vec3>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Inactive,
    Grinding(GrindSession),
    Exiting(GrindSession),
}

pub struct RailGrindController {
    settings: GrindSettings,
    phase: Phase,
}

impl RailGrindController {
    pub fn new(settings: GrindSettings) -> Self {
        Self {
            settings,
            phase: Phase::Inactive,
        }
    }

    pub fn settings(&self) -> &GrindSettings {
        &self.settings
    }

    pub fn state(&self) -> GrindState {
        match self.phase {
            Phase::Inactive => GrindState::Inactive,
            Phase::Grinding(_) => GrindState::Grinding,
            Phase::Exiting(_) => GrindState::Exiting,
        }
    }

    pub fn is_grinding(&self) -> bool {
        matches!(self.phase, Phase::Grinding(_))
    }

    pub fn session(&self) -> Option<&GrindSession> {
        match &self.phase {
            Phase::Inactive => None,
            Phase::Grinding(s) | Phase::Exiting(s) => Some(s),
        }
    }

    pub fn direction(&self) -> Option<f32> {
        self.session().map(|s| s.direction)
    }

    pub fn speed(&self) -> Option<f32> {
        self.session().map(|s| s.speed)
    }

    /// Route a resolved trigger crossing. Only enter events from Inactive start a grind;
    /// exit events are accepted and ignored.
    pub fn on_rail_event(
        &mut self,
        event: RailEvent,
        rails: &RailSet,
        body: &mut CharacterBody,
        gates: &mut [&mut dyn InputGate],
        events: &mut EventQueue<GameEvent>,
    ) -> Result<(), GrindError> {
        match event {
            RailEvent::Entered(rail) => self.enter(rail, rails, body, gates, events),
            RailEvent::Exited(rail) => {
                debug!("rail exit for {:?} ignored", rail);
                Ok(())
            }
        }
    }

    /// Start grinding `rail`: suspend free movement, snap onto the curve and pick a direction.
    pub fn enter(
        &mut self,
        rail_id: RailId,
        rails: &RailSet,
        body: &mut CharacterBody,
        gates: &mut [&mut dyn InputGate],
        events: &mut EventQueue<GameEvent>,
    ) -> Result<(), GrindError> {
        if self.phase != Phase::Inactive {
            return Err(GrindError::NotInactive);
        }
        let rail = rails.get(rail_id).ok_or(GrindError::UnknownRail(rail_id))?;
        if rail.is_degenerate() {
            warn!("refusing to grind degenerate rail {:?}", rail_id);
            return Err(GrindError::DegenerateRail(rail_id));
        }

        set_gates(gates, false);
        body.exclude_layer(CollisionLayer::Rail);
        body.set_gravity(false);

        let nearest = rail.nearest_world(&body.position);
        let sample = rail.evaluate_world(nearest.t);
        body.position = nearest.position + sample.up * self.settings.vertical_offset;

        let direction = if body.velocity.dot(&sample.tangent) >= 0.0 {
            1.0
        } else {
            -1.0
        };
        let speed = body.velocity.norm();

        self.phase = Phase::Grinding(GrindSession {
            rail: rail_id,
            direction,
            speed,
            exit_anchor: None,
        });
        info!(
            "grind started on {:?} at t={:.3} (direction {:+}, speed {:.2})",
            rail_id, nearest.t, direction, speed
        );
        events.push(GameEvent::GrindStarted { rail: rail_id });
        Ok(())
    }

    /// Jump off the rail. Returns `true` when a grind was ended; the caller launches the jump.
    pub fn manual_exit(
        &mut self,
        body: &mut CharacterBody,
        gates: &mut [&mut dyn InputGate],
        events: &mut EventQueue<GameEvent>,
    ) -> bool {
        let Phase::Grinding(session) = self.phase else {
            debug!("jump-off ignored outside a grind");
            return false;
        };
        info!("grind on {:?} ended by jump", session.rail);
        self.end_grind(session, body, gates, events);
        true
    }

    /// Advance one fixed tick.
    ///
    /// Grinding: set the body's velocity along the rail. Exiting: release the session once
    /// the body is clear of the exit anchor. Inactive: nothing.
    pub fn tick(
        &mut self,
        dt: f32,
        rails: &RailSet,
        body: &mut CharacterBody,
        gates: &mut [&mut dyn InputGate],
        events: &mut EventQueue<GameEvent>,
    ) {
        match self.phase {
            Phase::Inactive => {}
            Phase::Exiting(session) => {
                let anchor = session.exit_anchor.unwrap_or(body.position);
                if (body.position - anchor).norm() > self.settings.exit_distance_threshold {
                    body.include_layer(CollisionLayer::Rail);
                    self.phase = Phase::Inactive;
                    debug!("grind session on {:?} released", session.rail);
                }
            }
            Phase::Grinding(mut session) => {
                let Some(rail) = rails.get(session.rail).filter(|r| !r.is_degenerate()) else {
                    warn!("rail {:?} vanished mid-grind", session.rail);
                    self.force_inactive(body, gates, events);
                    return;
                };

                let nearest = rail.nearest_world(&body.position);
                if !rail.curve.closed()
                    && rail.remaining_length(nearest.t, session.direction)
                        < self.settings.end_of_rail_epsilon
                {
                    info!("grind on {:?} reached the end of the rail", session.rail);
                    self.end_grind(session, body, gates, events);
                    return;
                }

                let sample = rail.evaluate_world(nearest.t);
                let target = nearest.position + sample.up * self.settings.vertical_offset;
                let to_target = target - body.position;
                let snap_sq = self.settings.snap_distance * self.settings.snap_distance;
                let blend = if snap_sq > 0.0 {
                    (to_target.norm_squared() / snap_sq).clamp(0.0, 1.0)
                } else {
                    1.0
                };

                let along = sample.tangent * session.direction;
                let target_speed = lerp(
                    self.settings.downward_speed,
                    self.settings.upward_speed,
                    remap01(along.y, -1.0, 1.0),
                );
                session.speed =
                    move_toward(session.speed, target_speed, self.settings.acceleration * dt);

                let heading = along.lerp(&normalize_or_zero(to_target), blend);
                body.velocity = heading * session.speed;
                self.phase = Phase::Grinding(session);
            }
        }
    }

    /// Drop any session at once and hand control back to free movement.
    pub fn force_inactive(
        &mut self,
        body: &mut CharacterBody,
        gates: &mut [&mut dyn InputGate],
        events: &mut EventQueue<GameEvent>,
    ) {
        match self.phase {
            Phase::Inactive => return,
            Phase::Grinding(session) => {
                set_gates(gates, true);
                body.set_gravity(true);
                events.push(GameEvent::GrindEnded { rail: session.rail });
            }
            Phase::Exiting(_) => {}
        }
        body.include_layer(CollisionLayer::Rail);
        self.phase = Phase::Inactive;
    }

    fn end_grind(
        &mut self,
        mut session: GrindSession,
        body: &mut CharacterBody,
        gates: &mut [&mut dyn InputGate],
        events: &mut EventQueue<GameEvent>,
    ) {
        session.exit_anchor = Some(body.position);
        set_gates(gates, true);
        body.set_gravity(true);
        self.phase = Phase::Exiting(session);
        events.push(GameEvent::GrindEnded { rail: session.rail });
    }
}
