use log::debug;
use rapier3d::parry::utils::hashmap::HashMap;

use crate::{
    events::{EventQueue, RailEvent},
    rail::{RailId, RailSet, ZoneId},
};

/// Authoritative mapping from trigger-zone identity to rail.
///
/// Constructed explicitly and handed by reference to whoever needs it: the construction
/// tool (the only writer) and each character's tick (readers).
#[derive(Debug, Default)]
pub struct RailRegistry {
    zones: HashMap<ZoneId, RailId>,
    generation: u64,
}

impl RailRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-scan every rail and swap in a fresh table.
    ///
    /// The new table is built completely before it replaces the old one, so a reader never
    /// sees a half-populated mapping.
    pub fn rebuild(&mut self, rails: &RailSet) {
        let mut zones = HashMap::default();
        for (id, rail) in rails.iter() {
            zones.insert(rail.zone, id);
        }
        self.zones = zones;
        self.generation += 1;
        debug!(
            "rail registry rebuilt: {} zone(s), generation {}",
            self.zones.len(),
            self.generation
        );
    }

    /// Number of completed rebuilds.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn lookup(&self, zone: ZoneId) -> Option<RailId> {
        self.zones.get(&zone).copied()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Emit [`RailEvent::Entered`] for `zone`. Unknown zones are ignored (returns `false`).
    pub fn resolve_trigger_enter(&self, zone: ZoneId, out: &mut EventQueue<RailEvent>) -> bool {
        let Some(rail) = self.lookup(zone) else {
            debug!("trigger enter for unknown zone {:?} ignored", zone);
            return false;
        };
        out.push(RailEvent::Entered(rail));
        true
    }

    /// Emit [`RailEvent::Exited`] for `zone`. Unknown zones are ignored (returns `false`).
    pub fn resolve_trigger_exit(&self, zone: ZoneId, out: &mut EventQueue<RailEvent>) -> bool {
        let Some(rail) = self.lookup(zone) else {
            debug!("trigger exit for unknown zone {:?} ignored", zone);
            return false;
        };
        out.push(RailEvent::Exited(rail));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Curve, Knot};
    use crate::math::{Iso, Vec3};

    fn two_knot_curve() -> Curve {
        Curve::from_knots(
            [
                Knot::mirrored(Vec3::zeros(), Vec3::x()),
                Knot::mirrored(Vec3::new(3.0, 0.0, 0.0), Vec3::x()),
            ],
            false,
        )
    }

    #[test]
    fn rebuild_indexes_every_rail_zone() {
        let mut rails = RailSet::new();
        let a = rails.insert(two_knot_curve(), Iso::identity());
        let b = rails.insert(two_knot_curve(), Iso::identity());

        let mut registry = RailRegistry::new();
        assert!(registry.is_empty());
        registry.rebuild(&rails);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.generation(), 1);
        let zone_a = rails.get(a).map(|r| r.zone).expect("rail a");
        let zone_b = rails.get(b).map(|r| r.zone).expect("rail b");
        assert_eq!(registry.lookup(zone_a), Some(a));
        assert_eq!(registry.lookup(zone_b), Some(b));
    }

    #[test]
    fn resolve_emits_typed_events() {
        let mut rails = RailSet::new();
        let id = rails.insert(two_knot_curve(), Iso::identity());
        let zone = rails.get(id).map(|r| r.zone).expect("rail");
        let mut registry = RailRegistry::new();
        registry.rebuild(&rails);

        let mut out = EventQueue::new();
        assert!(registry.resolve_trigger_enter(zone, &mut out));
        assert!(registry.resolve_trigger_exit(zone, &mut out));
        assert_eq!(
            out.as_slice(),
            &[RailEvent::Entered(id), RailEvent::Exited(id)]
        );
    }

    #[test]
    fn unknown_zone_is_a_quiet_no_op() {
        let registry = RailRegistry::new();
        let mut out = EventQueue::new();
        assert!(!registry.resolve_trigger_enter(ZoneId(42), &mut out));
        assert!(!registry.resolve_trigger_exit(ZoneId(42), &mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn removed_rails_drop_out_on_rebuild() {
        let mut rails = RailSet::new();
        let id = rails.insert(two_knot_curve(), Iso::identity());
        let zone = rails.get(id).map(|r| r.zone).expect("rail");
        let mut registry = RailRegistry::new();
        registry.rebuild(&rails);

        rails.remove(id);
        registry.rebuild(&rails);
        assert_eq!(registry.lookup(zone), None);
        assert_eq!(registry.generation(), 2);
    }
}
