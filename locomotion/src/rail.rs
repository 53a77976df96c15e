use std::collections::BTreeMap;

use crate::{
    curve::{Curve, CurveSample, NearestPoint},
    math::{Iso, Vec3},
};

/// Handle to a rail owned by a [`RailSet`].
///
/// Ids are never reused, so a stale handle simply fails to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RailId(pub u32);

/// Identity of a rail's trigger volume, as reported by the collision layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZoneId(pub u32);

/// A curve placed in the world.
#[derive(Clone, Debug)]
pub struct Rail {
    /// Curve in local space.
    pub curve: Curve,
    /// Local → world transform.
    pub frame: Iso,
    /// Trigger volume wrapping this rail.
    pub zone: ZoneId,
}

impl Rail {
    pub fn is_degenerate(&self) -> bool {
        self.curve.is_degenerate()
    }

    pub fn to_local(&self, world: &Vec3) -> Vec3 {
        self.frame.inverse_transform_point(&(*world).into()).coords
    }

    pub fn to_world(&self, local: &Vec3) -> Vec3 {
        self.frame.transform_point(&(*local).into()).coords
    }

    /// World-space position, tangent and up at `t`.
    pub fn evaluate_world(&self, t: f32) -> CurveSample {
        let local = self.curve.evaluate(t);
        CurveSample {
            position: self.to_world(&local.position),
            tangent: self.frame.rotation * local.tangent,
            up: self.frame.rotation * local.up,
        }
    }

    /// Nearest point to a world-space position. Distances are frame-invariant.
    pub fn nearest_world(&self, world: &Vec3) -> NearestPoint {
        let hit = self.curve.nearest_point(&self.to_local(world));
        NearestPoint {
            position: self.to_world(&hit.position),
            ..hit
        }
    }

    /// World position of knot `index`.
    pub fn knot_world(&self, index: usize) -> Option<Vec3> {
        self.curve
            .knots()
            .get(index)
            .map(|k| self.to_world(&k.position))
    }

    /// Remaining length ahead of `t` when travelling in `direction` (+1 or -1).
    pub fn remaining_length(&self, t: f32, direction: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let ahead = if direction >= 0.0 { 1.0 - t } else { t };
        ahead * self.curve.length()
    }

    /// World-space polyline with roughly `spacing` meters between points.
    pub fn sample_polyline(&self, spacing: f32) -> Vec<Vec3> {
        if self.is_degenerate() {
            return Vec::new();
        }
        // Shave a millimeter so float noise in the cached length does not add a step.
        let steps =
            ((self.curve.length() / spacing.max(1.0e-2) - 1.0e-3).ceil() as usize).max(1);
        (0..=steps)
            .map(|i| self.evaluate_world(i as f32 / steps as f32).position)
            .collect()
    }
}

/// Owning store of every authored rail.
///
/// Iteration order is insertion order (ids are monotonic), which keeps registry rebuilds
/// deterministic.
#[derive(Debug, Default)]
pub struct RailSet {
    rails: BTreeMap<RailId, Rail>,
    next_id: u32,
    next_zone: u32,
}

impl RailSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `curve` placed at `frame`; assigns a fresh id and zone.
    pub fn insert(&mut self, curve: Curve, frame: Iso) -> RailId {
        let id = RailId(self.next_id);
        self.next_id += 1;
        let zone = ZoneId(self.next_zone);
        self.next_zone += 1;

        self.rails.insert(id, Rail { curve, frame, zone });
        id
    }

    pub fn get(&self, id: RailId) -> Option<&Rail> {
        self.rails.get(&id)
    }

    pub fn get_mut(&mut self, id: RailId) -> Option<&mut Rail> {
        self.rails.get_mut(&id)
    }

    /// Destroy a rail. Sessions holding its id terminate on their next tick.
    pub fn remove(&mut self, id: RailId) -> Option<Rail> {
        self.rails.remove(&id)
    }

    pub fn contains(&self, id: RailId) -> bool {
        self.rails.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RailId, &Rail)> {
        self.rails.iter().map(|(id, rail)| (*id, rail))
    }

    pub fn len(&self) -> usize {
        self.rails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rails.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Knot;
    use crate::math::Quat;
    use approx::assert_abs_diff_eq;
    use nalgebra::Translation3;

    fn x_rail(len: f32) -> Curve {
        let third = Vec3::new(len / 3.0, 0.0, 0.0);
        Curve::from_knots(
            [
                Knot::mirrored(Vec3::zeros(), third),
                Knot::mirrored(Vec3::new(len, 0.0, 0.0), third),
            ],
            false,
        )
    }

    #[test]
    fn ids_are_never_reused() {
        let mut set = RailSet::new();
        let a = set.insert(x_rail(4.0), Iso::identity());
        assert!(set.remove(a).is_some());
        let b = set.insert(x_rail(4.0), Iso::identity());

        assert_ne!(a, b);
        assert!(set.get(a).is_none());
        assert!(set.get(b).is_some());
        assert!(!set.contains(a));
    }

    #[test]
    fn world_queries_respect_the_frame() {
        let mut set = RailSet::new();
        // Rotate the +X rail to run along -Z and lift it.
        let frame = Iso::from_parts(
            Translation3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2),
        );
        let id = set.insert(x_rail(10.0), frame);
        let rail = set.get(id).expect("inserted");

        let start = rail.evaluate_world(0.0);
        assert_abs_diff_eq!(start.position, Vec3::new(1.0, 2.0, 3.0), epsilon = 1.0e-5);
        assert_abs_diff_eq!(start.tangent, Vec3::new(0.0, 0.0, -1.0), epsilon = 1.0e-4);
        assert_abs_diff_eq!(start.up, Vec3::y(), epsilon = 1.0e-4);

        let hit = rail.nearest_world(&Vec3::new(1.0, 3.0, -2.0));
        assert_abs_diff_eq!(hit.t, 0.5, epsilon = 1.0e-3);
        assert_abs_diff_eq!(hit.distance, 1.0, epsilon = 1.0e-3);
        assert_abs_diff_eq!(hit.position, Vec3::new(1.0, 2.0, -2.0), epsilon = 1.0e-2);
    }

    #[test]
    fn remaining_length_follows_direction() {
        let mut set = RailSet::new();
        let id = set.insert(x_rail(10.0), Iso::identity());
        let rail = set.get(id).expect("inserted");

        assert_abs_diff_eq!(rail.remaining_length(0.99, 1.0), 0.1, epsilon = 1.0e-3);
        assert_abs_diff_eq!(rail.remaining_length(0.99, -1.0), 9.9, epsilon = 1.0e-3);
    }

    #[test]
    fn polyline_spans_the_rail() {
        let mut set = RailSet::new();
        let id = set.insert(x_rail(10.0), Iso::identity());
        let points = set.get(id).expect("inserted").sample_polyline(1.0);

        assert_eq!(points.len(), 11);
        assert_abs_diff_eq!(points[0], Vec3::zeros(), epsilon = 1.0e-5);
        assert_abs_diff_eq!(points[10], Vec3::new(10.0, 0.0, 0.0), epsilon = 1.0e-4);
    }
}
