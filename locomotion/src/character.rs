//! One player character: body, controllers and the fixed order they run in each tick.

use log::{debug, info};

use crate::{
    body::{CharacterBody, ContactState},
    construction::{Placement, RailConstructionTool, RailVisualSink},
    error::PlacementError,
    events::{EventQueue, GameEvent, RailEvent},
    grind::{GrindState, RailGrindController},
    input::{InputFrame, InputGate},
    jump::JumpController,
    locomotion::LocomotionController,
    math::{Quat, Vec3, look_forward, up},
    rail::RailSet,
    registry::RailRegistry,
    settings::{
        BodySettings, ConstructionSettings, GrindSettings, JumpSettings, LocomotionSettings,
    },
    world::QueryWorld,
};

/// Eye height below the top of the capsule, used as the construction ray origin.
const EYE_BELOW_HEAD: f32 = 0.2;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CharacterSettings {
    pub body: BodySettings,
    pub locomotion: LocomotionSettings,
    pub jump: JumpSettings,
    pub grind: GrindSettings,
    pub construction: ConstructionSettings,
}

/// Shared state a character reads and writes during its tick.
pub struct TickContext<'a> {
    pub world: &'a mut QueryWorld,
    pub rails: &'a mut RailSet,
    pub registry: &'a mut RailRegistry,
    /// Trigger crossings resolved since the last tick; drained by the tick.
    pub rail_events: &'a mut EventQueue<RailEvent>,
    pub visuals: &'a mut dyn RailVisualSink,
}

pub struct Character {
    body: CharacterBody,
    locomotion: LocomotionController,
    jump: JumpController,
    grind: RailGrindController,
    tool: RailConstructionTool,
    look: Quat,
    spawn: Vec3,
    events: EventQueue<GameEvent>,
    last_placement: Option<Result<Placement, PlacementError>>,
}

impl Character {
    pub fn new(settings: CharacterSettings, spawn: Vec3) -> Self {
        Self {
            body: CharacterBody::new(settings.body, spawn),
            locomotion: LocomotionController::new(settings.locomotion),
            jump: JumpController::new(settings.jump),
            grind: RailGrindController::new(settings.grind),
            tool: RailConstructionTool::new(settings.construction),
            look: Quat::identity(),
            spawn,
            events: EventQueue::new(),
            last_placement: None,
        }
    }

    pub fn body(&self) -> &CharacterBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut CharacterBody {
        &mut self.body
    }

    pub fn locomotion(&self) -> &LocomotionController {
        &self.locomotion
    }

    pub fn jump(&self) -> &JumpController {
        &self.jump
    }

    pub fn grind(&self) -> &RailGrindController {
        &self.grind
    }

    pub fn tool(&self) -> &RailConstructionTool {
        &self.tool
    }

    pub fn tool_mut(&mut self) -> &mut RailConstructionTool {
        &mut self.tool
    }

    pub fn look(&self) -> Quat {
        self.look
    }

    /// Look orientation from the (external) camera. Yaw 0 faces -Z.
    pub fn set_look(&mut self, look: Quat) {
        self.look = look;
    }

    pub fn contact(&self) -> ContactState {
        self.body.contact()
    }

    /// Outcome of the most recent fire input, if any.
    pub fn last_placement(&self) -> Option<&Result<Placement, PlacementError>> {
        self.last_placement.as_ref()
    }

    pub fn eye(&self) -> Vec3 {
        self.body.head() - up() * EYE_BELOW_HEAD
    }

    /// Events produced since the last drain.
    pub fn events(&self) -> &EventQueue<GameEvent> {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain().collect()
    }

    /// Run one fixed tick.
    ///
    /// Order: rail events, then input (at most one per action), then either the grind or
    /// free movement drives velocity, then the body moves and re-senses its contact.
    pub fn tick(&mut self, dt: f32, input: InputFrame, ctx: &mut TickContext<'_>) {
        self.resolve_rail_events(ctx);
        self.dispatch_input(input, ctx);

        let contact = self.body.contact();
        if self.grind.state() == GrindState::Grinding {
            let mut gates: [&mut dyn InputGate; 2] = [&mut self.locomotion, &mut self.jump];
            self.grind
                .tick(dt, ctx.rails, &mut self.body, &mut gates, &mut self.events);
        } else {
            self.locomotion.step(
                dt,
                &self.look,
                &contact,
                &mut self.body,
                &*ctx.world,
                &mut self.events,
            );
            self.jump
                .step(dt, &contact, &mut self.body, &mut self.events);
            let mut gates: [&mut dyn InputGate; 2] = [&mut self.locomotion, &mut self.jump];
            self.grind
                .tick(dt, ctx.rails, &mut self.body, &mut gates, &mut self.events);
        }

        self.body.integrate(dt, ctx.world);
        self.body.sense(&*ctx.world);
    }

    fn resolve_rail_events(&mut self, ctx: &mut TickContext<'_>) {
        let pending: Vec<RailEvent> = ctx.rail_events.drain().collect();
        for event in pending {
            let mut gates: [&mut dyn InputGate; 2] = [&mut self.locomotion, &mut self.jump];
            if let Err(err) = self.grind.on_rail_event(
                event,
                ctx.rails,
                &mut self.body,
                &mut gates,
                &mut self.events,
            ) {
                debug!("rail event {:?} not taken: {err}", event);
            }
        }
    }

    fn dispatch_input(&mut self, input: InputFrame, ctx: &mut TickContext<'_>) {
        if input.restart {
            self.restart(self.spawn);
        }
        if let Some(axis) = input.movement {
            self.locomotion.receive_move(axis);
        }
        if let Some(held) = input.crouch {
            self.locomotion.receive_crouch(held);
        }
        if input.jump {
            if self.grind.state() == GrindState::Grinding {
                let mut gates: [&mut dyn InputGate; 2] =
                    [&mut self.locomotion, &mut self.jump];
                if self
                    .grind
                    .manual_exit(&mut self.body, &mut gates, &mut self.events)
                {
                    self.jump.jump(&mut self.body, &mut self.events);
                }
            } else {
                let contact = self.body.contact();
                self.jump
                    .receive_jump(&contact, &mut self.body, &mut self.events);
            }
        }
        if input.fire {
            self.fire(ctx);
        }
    }

    fn fire(&mut self, ctx: &mut TickContext<'_>) {
        let result = self.tool.place_or_extend(
            self.eye(),
            look_forward(&self.look),
            &*ctx.world,
            ctx.rails,
            ctx.registry,
            ctx.visuals,
        );
        if let Ok(placement) = &result {
            let id = placement.rail();
            if let Some(rail) = ctx.rails.get(id) {
                ctx.world.sync_rail(id, rail);
            }
        }
        self.last_placement = Some(result);
    }

    /// Back to `spawn` at rest: any grind ends and the character stands up.
    pub fn restart(&mut self, spawn: Vec3) {
        let mut gates: [&mut dyn InputGate; 2] = [&mut self.locomotion, &mut self.jump];
        self.grind
            .force_inactive(&mut self.body, &mut gates, &mut self.events);
        self.locomotion.reset(&mut self.body);
        self.jump.reset();
        self.body.teleport(spawn);
        self.spawn = spawn;
        info!("restart at ({:.2}, {:.2}, {:.2})", spawn.x, spawn.y, spawn.z);
    }
}
