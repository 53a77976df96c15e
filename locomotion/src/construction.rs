//! Runtime rail authoring from raycast hits.
//!
//! The first placement seeds a two-knot rail around the hit; each following placement
//! appends one knot whose tangent length adapts to how sharply the rail turns. A rejected
//! placement leaves every rail, the registry and the visuals untouched.

use log::{debug, info};

use crate::{
    constants::DIST_EPS,
    curve::{Curve, Knot},
    error::PlacementError,
    input::InputGate,
    layers::LayerMask,
    math::{Iso, Vec3, flatten, lerp, normalize_or_zero, project_on_plane, remap01},
    query::RaycastQuery,
    rail::{Rail, RailId, RailSet},
    registry::RailRegistry,
    settings::ConstructionSettings,
};

/// Receives "rebuild" notifications after a rail's topology changes.
pub trait RailVisualSink {
    fn rebuild(&mut self, id: RailId, rail: &Rail);
}

/// Sink for headless use.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoVisuals;

impl RailVisualSink for NoVisuals {
    fn rebuild(&mut self, _: RailId, _: &Rail) {}
}

/// Outcome of a successful [`RailConstructionTool::place_or_extend`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Created(RailId),
    Extended { rail: RailId, knot_index: usize },
}

impl Placement {
    pub fn rail(&self) -> RailId {
        match *self {
            Placement::Created(rail) | Placement::Extended { rail, .. } => rail,
        }
    }
}

pub struct RailConstructionTool {
    settings: ConstructionSettings,
    input_enabled: bool,
    active: Option<RailId>,
}

impl RailConstructionTool {
    pub fn new(settings: ConstructionSettings) -> Self {
        Self {
            settings,
            input_enabled: true,
            active: None,
        }
    }

    pub fn settings(&self) -> &ConstructionSettings {
        &self.settings
    }

    /// Rail the next placement extends, if any.
    pub fn active_rail(&self) -> Option<RailId> {
        self.active
    }

    /// Stop extending the active rail; the next placement starts a new one.
    pub fn finish(&mut self) -> Option<RailId> {
        let finished = self.active.take();
        if let Some(id) = finished {
            info!("rail {:?} finished", id);
        }
        finished
    }

    /// Clearance from a surface: floor offset for upward normals, ceiling offset for
    /// downward ones, interpolated in between.
    pub fn surface_offset(&self, normal: &Vec3) -> f32 {
        lerp(
            self.settings.floor_offset,
            self.settings.ceiling_offset,
            remap01(normal.y, 1.0, -1.0).clamp(0.0, 1.0),
        )
    }

    /// Cast from `origin` along `direction` and either seed a new rail at the hit or append a
    /// knot to the active one.
    pub fn place_or_extend(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        query: &impl RaycastQuery,
        rails: &mut RailSet,
        registry: &mut RailRegistry,
        visuals: &mut dyn RailVisualSink,
    ) -> Result<Placement, PlacementError> {
        if !self.input_enabled {
            return Err(PlacementError::InputDisabled);
        }

        let max_distance = self.settings.max_distance;
        let hit = query
            .cast(origin, direction, max_distance, LayerMask::placement_targets())
            .ok_or(PlacementError::NoSurface { max_distance })?;
        let placement = hit.point + hit.normal * self.surface_offset(&hit.normal);

        let result = match self.active {
            None => self.create(direction, &hit.normal, placement, rails),
            Some(id) => self.extend(id, &hit.normal, placement, query, rails),
        };

        match result {
            Ok(outcome) => {
                let id = outcome.rail();
                registry.rebuild(rails);
                if let Some(rail) = rails.get(id) {
                    visuals.rebuild(id, rail);
                }
                Ok(outcome)
            }
            Err(err) => {
                debug!("placement rejected: {err}");
                Err(err)
            }
        }
    }

    fn create(
        &mut self,
        direction: Vec3,
        normal: &Vec3,
        placement: Vec3,
        rails: &mut RailSet,
    ) -> Result<Placement, PlacementError> {
        let forward = flatten(project_on_plane(direction, normal))
            .try_normalize(DIST_EPS)
            .or_else(|| flatten(direction).try_normalize(DIST_EPS))
            .ok_or(PlacementError::DegenerateDirection)?;

        let half = forward * self.settings.seed_half_span;
        let tangent = forward * self.settings.initial_tangent_length;
        let curve = Curve::from_knots(
            [Knot::mirrored(-half, tangent), Knot::mirrored(half, tangent)],
            false,
        );
        let id = rails.insert(curve, Iso::translation(placement.x, placement.y, placement.z));

        self.active = Some(id);
        info!(
            "rail {:?} created at ({:.2}, {:.2}, {:.2})",
            id, placement.x, placement.y, placement.z
        );
        Ok(Placement::Created(id))
    }

    fn extend(
        &mut self,
        id: RailId,
        normal: &Vec3,
        placement: Vec3,
        query: &impl RaycastQuery,
        rails: &mut RailSet,
    ) -> Result<Placement, PlacementError> {
        let Some(rail) = rails.get(id) else {
            self.active = None;
            return Err(PlacementError::RailMissing(id));
        };

        let nearest = rail.nearest_world(&placement);
        if nearest.distance < self.settings.min_distance_from_spline {
            return Err(PlacementError::TooCloseToRail {
                distance: nearest.distance,
                minimum: self.settings.min_distance_from_spline,
            });
        }

        let Some((prev, prev_world)) = rail
            .curve
            .last_knot()
            .zip(rail.knot_world(rail.curve.knot_count().saturating_sub(1)))
        else {
            self.active = None;
            return Err(PlacementError::RailMissing(id));
        };

        let forward = flatten(project_on_plane(placement - prev_world, normal))
            .try_normalize(DIST_EPS)
            .ok_or(PlacementError::DegenerateDirection)?;

        let prev_out = rail.frame.rotation * prev.tangent_out;
        if query.segment_blocked(prev_world + prev_out, placement, LayerMask::blocking()) {
            return Err(PlacementError::Obstructed);
        }

        let similarity = forward.dot(&normalize_or_zero(prev_out));
        let shaped = self
            .settings
            .tangent_shaping
            .sample(remap01(similarity, -1.0, 1.0));
        let length = lerp(
            self.settings.min_tangent_length,
            self.settings.max_tangent_length,
            shaped,
        );

        let local_forward = rail.frame.rotation.inverse() * forward;
        let knot = Knot::continuous(
            rail.to_local(&placement),
            -local_forward * length,
            local_forward * length,
        );

        let Some(rail) = rails.get_mut(id) else {
            self.active = None;
            return Err(PlacementError::RailMissing(id));
        };
        rail.curve.add(knot);
        let knot_index = rail.curve.knot_count() - 1;
        info!(
            "rail {:?} extended to {} knots (tangent {:.2} m)",
            id,
            knot_index + 1,
            length
        );
        Ok(Placement::Extended {
            rail: id,
            knot_index,
        })
    }
}

impl InputGate for RailConstructionTool {
    fn enable_input(&mut self) {
        self.input_enabled = true;
    }

    fn disable_input(&mut self) {
        self.input_enabled = false;
    }

    fn input_enabled(&self) -> bool {
        self.input_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::TangentMode;
    use crate::layers::CollisionLayer;
    use crate::query::{OpenSky, testing::Planes};
    use approx::assert_abs_diff_eq;

    #[derive(Default)]
    struct Recorder(Vec<(RailId, usize)>);

    impl RailVisualSink for Recorder {
        fn rebuild(&mut self, id: RailId, rail: &Rail) {
            self.0.push((id, rail.curve.knot_count()));
        }
    }

    struct Scene {
        tool: RailConstructionTool,
        rails: RailSet,
        registry: RailRegistry,
        visuals: Recorder,
    }

    impl Scene {
        fn new() -> Self {
            Self {
                tool: RailConstructionTool::new(ConstructionSettings::default()),
                rails: RailSet::new(),
                registry: RailRegistry::new(),
                visuals: Recorder::default(),
            }
        }

        /// Shoot 45 degrees down toward -Z from `z`, hitting the floor two meters ahead.
        fn shoot(&mut self, z: f32, world: &impl RaycastQuery) -> Result<Placement, PlacementError> {
            self.tool.place_or_extend(
                Vec3::new(0.0, 2.0, z),
                Vec3::new(0.0, -1.0, -1.0),
                world,
                &mut self.rails,
                &mut self.registry,
                &mut self.visuals,
            )
        }
    }

    #[test]
    fn missing_surface_changes_nothing() {
        let mut scene = Scene::new();
        let err = scene.shoot(0.0, &OpenSky).unwrap_err();
        assert_eq!(
            err,
            PlacementError::NoSurface {
                max_distance: scene.tool.settings().max_distance
            }
        );
        assert!(scene.rails.is_empty());
        assert_eq!(scene.registry.generation(), 0);
        assert!(scene.visuals.0.is_empty());
    }

    #[test]
    fn first_shot_seeds_a_two_knot_rail_above_the_floor() {
        let mut scene = Scene::new();
        let placed = scene.shoot(0.0, &Planes::floor(0.0)).expect("placed");
        let Placement::Created(id) = placed else {
            panic!("expected a new rail, got {placed:?}");
        };

        let rail = scene.rails.get(id).expect("rail");
        assert_abs_diff_eq!(rail.frame.translation.vector, Vec3::new(0.0, 0.5, -2.0), epsilon = 1.0e-5);
        assert_eq!(rail.curve.knot_count(), 2);
        let knots = rail.curve.knots();
        assert_abs_diff_eq!(knots[0].position, Vec3::new(0.0, 0.0, 1.0), epsilon = 1.0e-5);
        assert_abs_diff_eq!(knots[1].position, Vec3::new(0.0, 0.0, -1.0), epsilon = 1.0e-5);
        assert_abs_diff_eq!(knots[1].tangent_out, Vec3::new(0.0, 0.0, -0.5), epsilon = 1.0e-5);
        assert_abs_diff_eq!(knots[1].tangent_in, Vec3::new(0.0, 0.0, 0.5), epsilon = 1.0e-5);
        assert_eq!(knots[0].mode, TangentMode::Mirrored);

        assert_eq!(scene.tool.active_rail(), Some(id));
        assert_eq!(scene.registry.lookup(rail.zone), Some(id));
        assert_eq!(scene.visuals.0, vec![(id, 2)]);
    }

    #[test]
    fn surface_offset_depends_on_the_normal() {
        let tool = RailConstructionTool::new(ConstructionSettings::default());
        let s = *tool.settings();
        assert_abs_diff_eq!(tool.surface_offset(&Vec3::y()), s.floor_offset);
        assert_abs_diff_eq!(tool.surface_offset(&-Vec3::y()), s.ceiling_offset);
        assert_abs_diff_eq!(
            tool.surface_offset(&Vec3::x()),
            0.5 * (s.floor_offset + s.ceiling_offset)
        );
    }

    #[test]
    fn straight_continuation_gets_the_longest_tangent() {
        let mut scene = Scene::new();
        let floor = Planes::floor(0.0);
        let id = scene.shoot(0.0, &floor).expect("seed").rail();

        let placed = scene.shoot(-6.0, &floor).expect("extend");
        assert_eq!(placed, Placement::Extended { rail: id, knot_index: 2 });

        let rail = scene.rails.get(id).expect("rail");
        let knot = rail.curve.knots()[2];
        assert_eq!(knot.mode, TangentMode::Continuous);
        assert_abs_diff_eq!(rail.to_world(&knot.position), Vec3::new(0.0, 0.5, -8.0), epsilon = 1.0e-5);
        let max = scene.tool.settings().max_tangent_length;
        assert_abs_diff_eq!(knot.tangent_out, Vec3::new(0.0, 0.0, -max), epsilon = 1.0e-4);
        assert_abs_diff_eq!(knot.tangent_in, Vec3::new(0.0, 0.0, max), epsilon = 1.0e-4);
        assert_eq!(scene.registry.generation(), 2);
        assert_eq!(scene.visuals.0.last(), Some(&(id, 3)));
    }

    #[test]
    fn sharp_turn_gets_a_shorter_tangent() {
        let mut scene = Scene::new();
        let floor = Planes::floor(0.0);
        let id = scene.shoot(0.0, &floor).expect("seed").rail();

        // Aim at a spot off to the side of the last knot: a right-angle turn.
        scene
            .tool
            .place_or_extend(
                Vec3::new(6.0, 2.0, -3.0),
                Vec3::new(0.0, -1.0, 0.0),
                &floor,
                &mut scene.rails,
                &mut scene.registry,
                &mut scene.visuals,
            )
            .expect("extend");

        let s = *scene.tool.settings();
        let expected = lerp(
            s.min_tangent_length,
            s.max_tangent_length,
            s.tangent_shaping.sample(0.5),
        );
        let knot = scene.rails.get(id).expect("rail").curve.knots()[2];
        assert_abs_diff_eq!(knot.tangent_out.norm(), expected, epsilon = 1.0e-4);
        assert!(expected < s.max_tangent_length);
    }

    #[test]
    fn placement_near_the_rail_is_rejected_without_mutation() {
        let mut scene = Scene::new();
        let floor = Planes::floor(0.0);
        let id = scene.shoot(0.0, &floor).expect("seed").rail();
        let generation = scene.registry.generation();

        let err = scene.shoot(-0.5, &floor).unwrap_err();
        assert!(matches!(err, PlacementError::TooCloseToRail { .. }), "{err:?}");
        assert_eq!(scene.rails.get(id).map(|r| r.curve.knot_count()), Some(2));
        assert_eq!(scene.registry.generation(), generation);
        assert_eq!(scene.visuals.0.len(), 1);
    }

    #[test]
    fn obstructed_segment_is_rejected_without_mutation() {
        let mut scene = Scene::new();
        let id = scene.shoot(0.0, &Planes::floor(0.0)).expect("seed").rail();

        let walled = Planes::floor(0.0).with(Vec3::z(), -5.0, CollisionLayer::Ground, 5);
        assert_eq!(scene.shoot(-6.0, &walled), Err(PlacementError::Obstructed));
        assert_eq!(scene.rails.get(id).map(|r| r.curve.knot_count()), Some(2));
        assert_eq!(scene.tool.active_rail(), Some(id));
    }

    #[test]
    fn finish_starts_a_new_rail_next_time() {
        let mut scene = Scene::new();
        let floor = Planes::floor(0.0);
        let first = scene.shoot(0.0, &floor).expect("seed").rail();
        assert_eq!(scene.tool.finish(), Some(first));
        assert_eq!(scene.tool.finish(), None);

        let second = scene.shoot(-10.0, &floor).expect("seed");
        assert!(matches!(second, Placement::Created(id) if id != first));
        assert_eq!(scene.registry.len(), 2);
    }

    #[test]
    fn vanished_active_rail_resets_the_tool() {
        let mut scene = Scene::new();
        let floor = Planes::floor(0.0);
        let id = scene.shoot(0.0, &floor).expect("seed").rail();
        scene.rails.remove(id);

        assert_eq!(scene.shoot(-6.0, &floor), Err(PlacementError::RailMissing(id)));
        assert_eq!(scene.tool.active_rail(), None);
        assert!(matches!(scene.shoot(-6.0, &floor), Ok(Placement::Created(_))));
    }

    #[test]
    fn disabled_tool_refuses_to_fire() {
        let mut scene = Scene::new();
        scene.tool.disable_input();
        assert_eq!(
            scene.shoot(0.0, &Planes::floor(0.0)),
            Err(PlacementError::InputDisabled)
        );
        scene.tool.enable_input();
        assert!(scene.shoot(0.0, &Planes::floor(0.0)).is_ok());
    }

    #[test]
    fn straight_down_onto_a_floor_has_no_direction() {
        let mut scene = Scene::new();
        let result = scene.tool.place_or_extend(
            Vec3::new(0.0, 2.0, 0.0),
            -Vec3::y(),
            &Planes::floor(0.0),
            &mut scene.rails,
            &mut scene.registry,
            &mut scene.visuals,
        );
        assert_eq!(result, Err(PlacementError::DegenerateDirection));
        assert!(scene.rails.is_empty());
    }
}
