//! Trigger volumes around rails, sensed by distance to the curve.

use std::collections::BTreeSet;

use locomotion::{EventQueue, RailEvent, RailRegistry, RailSet, ZoneId, math::Vec3};
use log::debug;

/// Tracks which rail zones a point is inside and reports the edges.
#[derive(Debug)]
pub struct TriggerSensor {
    radius: f32,
    inside: BTreeSet<ZoneId>,
}

impl TriggerSensor {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            inside: BTreeSet::new(),
        }
    }

    pub fn inside(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.inside.iter().copied()
    }

    /// Re-sense `point` against every rail and push resolved enter/exit events.
    pub fn update(
        &mut self,
        point: &Vec3,
        rails: &RailSet,
        registry: &RailRegistry,
        out: &mut EventQueue<RailEvent>,
    ) {
        let current: BTreeSet<ZoneId> = rails
            .iter()
            .filter(|(_, rail)| !rail.is_degenerate())
            .filter(|(_, rail)| rail.nearest_world(point).distance < self.radius)
            .map(|(_, rail)| rail.zone)
            .collect();

        for zone in current.difference(&self.inside) {
            if !registry.resolve_trigger_enter(*zone, out) {
                debug!("entered unregistered zone {:?}", zone);
            }
        }
        for zone in self.inside.difference(&current) {
            if !registry.resolve_trigger_exit(*zone, out) {
                debug!("left unregistered zone {:?}", zone);
            }
        }

        self.inside = current;
    }
}
