//! Headless sandbox: one character, a small level and a scripted session at a fixed tick.

mod level;
mod script;
mod triggers;

use locomotion::{
    Character, CharacterSettings, EventQueue, InputQueue, QueryWorld, Rail, RailId,
    RailRegistry, RailSet, RailVisualSink, TickContext,
    constants::RAIL_TRIGGER_RADIUS,
    math::{Quat, Vec3, yaw_look},
};
use log::{debug, info};

use crate::{
    script::{Cue, Script},
    triggers::TriggerSensor,
};

const FIXED_DT: f32 = 1.0 / 60.0;

/// Ticks to keep running after the last scripted cue.
const SETTLE_TICKS: u32 = 60;

/// Stands in for the renderer: reports rebuilt rail meshes.
struct LogVisuals;

impl RailVisualSink for LogVisuals {
    fn rebuild(&mut self, id: RailId, rail: &Rail) {
        info!(
            "rail {:?} mesh: {} knot(s), {:.2} m",
            id,
            rail.curve.knot_count(),
            rail.curve.length()
        );
    }
}

fn look(yaw: f32, pitch: f32) -> Quat {
    yaw_look(yaw) * Quat::from_axis_angle(&Vec3::x_axis(), pitch)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut world = QueryWorld::build(level::statics(), FIXED_DT);
    let mut rails = RailSet::new();
    level::seed_rails(&mut rails);
    for (id, rail) in rails.iter() {
        world.sync_rail(id, rail);
    }
    let mut registry = RailRegistry::new();
    registry.rebuild(&rails);
    info!(
        "level ready: {} static collider(s), {} rail(s)",
        world.collider_count(),
        registry.len()
    );

    let mut rail_events = EventQueue::new();
    let mut visuals = LogVisuals;
    let mut sensor = TriggerSensor::new(RAIL_TRIGGER_RADIUS);
    let mut input = InputQueue::new();
    let mut script = Script::demo();
    let mut character = Character::new(CharacterSettings::default(), level::SPAWN);

    let run_ticks = script.last_tick() + SETTLE_TICKS;
    for tick in 0..run_ticks {
        for cue in script.due(tick) {
            match cue {
                Cue::Input(event) => input.push(event),
                Cue::Look { yaw, pitch } => character.set_look(look(yaw, pitch)),
            }
        }

        sensor.update(
            &character.body().center(),
            &rails,
            &registry,
            &mut rail_events,
        );

        let frame = input.drain_tick();
        let mut ctx = TickContext {
            world: &mut world,
            rails: &mut rails,
            registry: &mut registry,
            rail_events: &mut rail_events,
            visuals: &mut visuals,
        };
        character.tick(FIXED_DT, frame, &mut ctx);

        for event in character.drain_events() {
            info!("[{tick:>4}] {event:?}");
        }
        if tick % 30 == 0 {
            let body = character.body();
            debug!(
                "[{tick:>4}] pos ({:.2}, {:.2}, {:.2}) speed {:.2} grind {:?} zones {}",
                body.position.x,
                body.position.y,
                body.position.z,
                body.velocity.norm(),
                character.grind().state(),
                sensor.inside().count()
            );
        }
    }

    let body = character.body();
    info!(
        "finished after {run_ticks} ticks at ({:.2}, {:.2}, {:.2}) with {} rail(s), script done: {}",
        body.position.x,
        body.position.y,
        body.position.z,
        rails.len(),
        script.is_finished()
    );
}
