//! Kinematic capsule body moved through the query world with Rapier's character controller.
//!
//! `position` is the bottom of the capsule (the feet). Crouching shrinks the capsule from
//! the top, so its centre drops by half the height difference while the feet stay put.

use rapier3d::{
    control::{CharacterAutostep, CharacterLength, KinematicCharacterController},
    na::Isometry3,
    prelude::{Capsule, Collider, ColliderHandle, QueryFilter},
};

use crate::{
    layers::{CollisionLayer, LayerMask},
    math::{Vec3, flatten, up},
    query::RaycastQuery,
    settings::BodySettings,
    world::QueryWorld,
};

/// Ray origin is lifted this far above the feet so shallow penetration still reports support.
const PROBE_LIFT: f32 = 0.05;

/// Motion the KCC removed below this length is treated as numerical noise.
const BLOCKED_EPS: f32 = 1.0e-3;

/// Surface contact sampled after integration, consumed on the next tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactState {
    /// Standing on walkable ground.
    pub on_ground: bool,
    /// Touching any supporting surface, walkable or not.
    pub on_surface: bool,
    /// On walkable ground that is not flat.
    pub on_slope: bool,
    /// Normal of the supporting surface, `+Y` when airborne.
    pub slope_normal: Vec3,
    /// `on_ground` became true this tick.
    pub hit_ground: bool,
}

impl Default for ContactState {
    fn default() -> Self {
        Self {
            on_ground: false,
            on_surface: false,
            on_slope: false,
            slope_normal: up(),
            hit_ground: false,
        }
    }
}

impl ContactState {
    /// Standing on flat ground.
    pub fn grounded() -> Self {
        Self {
            on_ground: true,
            on_surface: true,
            ..Self::default()
        }
    }

    /// No support at all.
    pub fn airborne() -> Self {
        Self::default()
    }
}

pub struct CharacterBody {
    /// Feet position in world space.
    pub position: Vec3,
    pub velocity: Vec3,
    radius: f32,
    height: f32,
    excluded: LayerMask,
    gravity_enabled: bool,
    grounded: bool,
    contact: ContactState,
    settings: BodySettings,
    kcc: KinematicCharacterController,
    snap_to_ground: Option<CharacterLength>,
}

impl CharacterBody {
    pub fn new(settings: BodySettings, position: Vec3) -> Self {
        let kcc = KinematicCharacterController {
            autostep: Some(CharacterAutostep {
                include_dynamic_bodies: false,
                max_height: CharacterLength::Relative(0.4),
                ..CharacterAutostep::default()
            }),
            offset: CharacterLength::Relative(0.025),
            ..KinematicCharacterController::default()
        };

        Self {
            position,
            velocity: Vec3::zeros(),
            radius: settings.radius,
            height: settings.clamped_standing_height(),
            excluded: LayerMask::empty(),
            gravity_enabled: true,
            grounded: false,
            contact: ContactState::default(),
            settings,
            snap_to_ground: kcc.snap_to_ground,
            kcc,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Full capsule height, caps included.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Half length of the capsule's cylindrical section.
    pub fn half_height(&self) -> f32 {
        (0.5 * self.height - self.radius).max(0.0)
    }

    pub fn center(&self) -> Vec3 {
        self.position + up() * (0.5 * self.height)
    }

    pub fn head(&self) -> Vec3 {
        self.position + up() * self.height
    }

    /// Resize the capsule, keeping the feet in place.
    pub fn set_height(&mut self, height: f32) {
        self.height = height.max(2.0 * self.radius);
    }

    /// Shrink to the crouched height. Returns how much shorter the capsule got.
    pub fn crouch(&mut self) -> f32 {
        let before = self.height;
        self.set_height(self.settings.clamped_crouched_height());
        before - self.height
    }

    /// Grow back to the standing height. Returns how much taller the capsule got.
    pub fn stand(&mut self) -> f32 {
        let before = self.height;
        self.set_height(self.settings.clamped_standing_height());
        self.height - before
    }

    /// Room the standing capsule needs above the current head.
    pub fn stand_clearance(&self) -> f32 {
        (self.settings.clamped_standing_height() - self.height).max(0.0)
    }

    pub fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    /// Gravity also gates ground snapping, so a grind above the floor is not pulled down.
    pub fn set_gravity(&mut self, enabled: bool) {
        self.gravity_enabled = enabled;
        self.kcc.snap_to_ground = if enabled { self.snap_to_ground } else { None };
    }

    pub fn exclude_layer(&mut self, layer: CollisionLayer) {
        self.excluded.insert(layer);
    }

    pub fn include_layer(&mut self, layer: CollisionLayer) {
        self.excluded.remove(layer);
    }

    pub fn is_layer_excluded(&self, layer: CollisionLayer) -> bool {
        self.excluded.contains(layer)
    }

    /// Layers the body currently collides with.
    pub fn collision_mask(&self) -> LayerMask {
        LayerMask::character_solids().without(self.excluded)
    }

    pub fn contact(&self) -> ContactState {
        self.contact
    }

    /// Move to `position` and forget all motion and contact history.
    pub fn teleport(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::zeros();
        self.grounded = false;
        self.contact = ContactState::default();
    }

    /// Apply gravity, then sweep the capsule by `velocity * dt` through `world`.
    ///
    /// Whatever part of the motion the controller removed is also removed from `velocity`,
    /// so the body does not keep pushing into walls or ceilings.
    pub fn integrate(&mut self, dt: f32, world: &QueryWorld) {
        if dt <= 0.0 {
            return;
        }

        if self.gravity_enabled && self.velocity.y > self.settings.terminal_fall_speed {
            self.velocity.y = (self.velocity.y - self.settings.gravity * dt)
                .max(self.settings.terminal_fall_speed);
        }

        let mask = self.collision_mask();
        let predicate = |_: ColliderHandle, collider: &Collider| {
            LayerMask::from_user_data(collider.user_data).intersects(mask)
        };
        let filter = QueryFilter::default().exclude_sensors().predicate(&predicate);
        let query_pipeline = world.query_pipeline(filter);

        let desired = self.velocity * dt;
        let center = self.center();
        let correction = self.kcc.move_shape(
            dt,
            &query_pipeline,
            &Capsule::new_y(self.half_height(), self.radius),
            &Isometry3::translation(center.x, center.y, center.z),
            desired,
            |_| {},
        );

        self.position += correction.translation;
        self.grounded = correction.grounded;

        let blocked = flatten(desired - correction.translation);
        if let Some(normal) = blocked.try_normalize(BLOCKED_EPS) {
            let into = self.velocity.dot(&normal);
            if into > 0.0 {
                self.velocity -= normal * into;
            }
        }
        // Ceiling.
        if self.velocity.y > 0.0 && correction.translation.y < desired.y - BLOCKED_EPS {
            self.velocity.y = 0.0;
        }
        if self.grounded && self.velocity.y < 0.0 {
            self.velocity.y = 0.0;
        }
    }

    /// Probe for support under the feet and refresh [`ContactState`].
    pub fn sense(&mut self, query: &impl RaycastQuery) -> ContactState {
        let was_on_ground = self.contact.on_ground;
        let origin = self.position + up() * PROBE_LIFT;
        let reach = PROBE_LIFT + self.settings.ground_probe_distance;

        let mut contact = ContactState::default();
        if let Some(hit) = query.cast(origin, -up(), reach, self.collision_mask()) {
            contact.on_surface = true;
            contact.slope_normal = hit.normal;
            contact.on_ground = hit.normal.y >= self.settings.max_slope_cos;
            contact.on_slope = contact.on_ground && hit.normal.y < self.settings.flat_ground_cos;
        }
        contact.hit_ground = contact.on_ground && !was_on_ground;

        self.contact = contact;
        contact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::testing::Planes;
    use crate::world::{ColliderShapeDef, WorldStaticDef};
    use approx::assert_abs_diff_eq;
    use rapier3d::na::UnitQuaternion;

    const DT: f32 = 1.0 / 60.0;

    fn flat_world() -> QueryWorld {
        QueryWorld::build(
            [WorldStaticDef::ground(
                1,
                Vec3::zeros(),
                UnitQuaternion::identity(),
                ColliderShapeDef::Plane {
                    offset_along_normal: 0.0,
                },
            )],
            DT,
        )
    }

    #[test]
    fn crouch_resize_keeps_feet_and_drops_centre() {
        let mut body = CharacterBody::new(BodySettings::default(), Vec3::zeros());
        let before = body.center();
        assert_abs_diff_eq!(body.crouch(), 1.0, epsilon = 1.0e-6);
        assert_abs_diff_eq!(body.position, Vec3::zeros());
        assert_abs_diff_eq!(body.center().y, before.y - 0.5, epsilon = 1.0e-6);
        assert_abs_diff_eq!(body.stand_clearance(), 1.0, epsilon = 1.0e-6);
        // Already crouched: nothing left to shrink.
        assert_eq!(body.crouch(), 0.0);
        body.set_height(0.0);
        assert_abs_diff_eq!(body.height(), 2.0 * body.radius());
    }

    #[test]
    fn crouch_and_stand_return_to_the_same_height_on_a_wide_capsule() {
        let settings = BodySettings {
            radius: 0.6,
            ..BodySettings::default()
        };
        let mut body = CharacterBody::new(settings, Vec3::zeros());
        let start = body.height();

        for _ in 0..3 {
            let shrunk = body.crouch();
            assert_abs_diff_eq!(body.height(), 1.2, epsilon = 1.0e-6);
            assert_abs_diff_eq!(body.stand(), shrunk, epsilon = 1.0e-6);
        }
        assert_abs_diff_eq!(body.height(), start);
        assert_eq!(body.stand_clearance(), 0.0);
    }

    #[test]
    fn sensing_classifies_flat_slope_and_wall() {
        let mut body = CharacterBody::new(BodySettings::default(), Vec3::new(0.0, 0.05, 0.0));

        let first = body.sense(&Planes::floor(0.0));
        assert!(first.on_ground && first.on_surface && !first.on_slope);
        assert!(first.hit_ground);
        assert!(!body.sense(&Planes::floor(0.0)).hit_ground);

        let gentle = Planes::default().with(
            Vec3::new(0.0, 1.0, 0.3),
            0.0,
            CollisionLayer::Ground,
            2,
        );
        let slope = body.sense(&gentle);
        assert!(slope.on_ground && slope.on_slope);

        let steep = Planes::default().with(
            Vec3::new(0.0, 1.0, 3.0),
            0.0,
            CollisionLayer::Ground,
            3,
        );
        let wall = body.sense(&steep);
        assert!(wall.on_surface && !wall.on_ground);
    }

    #[test]
    fn excluded_layers_are_not_sensed() {
        let rail_floor = Planes::default().with(Vec3::y(), 0.0, CollisionLayer::Rail, 9);
        let mut body = CharacterBody::new(BodySettings::default(), Vec3::new(0.0, 0.05, 0.0));
        assert!(body.sense(&rail_floor).on_ground);

        body.exclude_layer(CollisionLayer::Rail);
        assert!(!body.collision_mask().contains(CollisionLayer::Rail));
        assert!(!body.sense(&rail_floor).on_surface);

        body.include_layer(CollisionLayer::Rail);
        assert!(body.sense(&rail_floor).on_surface);
    }

    #[test]
    fn falls_under_gravity_and_lands_on_the_floor() {
        let world = flat_world();
        let mut body = CharacterBody::new(BodySettings::default(), Vec3::new(0.0, 2.0, 0.0));

        for _ in 0..120 {
            body.integrate(DT, &world);
            body.sense(&world);
        }

        assert!(body.contact().on_ground);
        assert!(body.position.y.abs() < 0.1, "feet at {}", body.position.y);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn gravity_disabled_keeps_vertical_speed() {
        let world = QueryWorld::build([], DT);
        let mut body = CharacterBody::new(BodySettings::default(), Vec3::new(0.0, 5.0, 0.0));
        body.set_gravity(false);
        body.velocity = Vec3::new(3.0, 0.0, 0.0);

        for _ in 0..60 {
            body.integrate(DT, &world);
        }

        assert_abs_diff_eq!(body.velocity, Vec3::new(3.0, 0.0, 0.0), epsilon = 1.0e-5);
        assert_abs_diff_eq!(body.position.x, 3.0, epsilon = 1.0e-2);
        assert_abs_diff_eq!(body.position.y, 5.0, epsilon = 1.0e-3);
    }

    #[test]
    fn terminal_speed_caps_the_fall() {
        let world = QueryWorld::build([], DT);
        let settings = BodySettings::default();
        let mut body = CharacterBody::new(settings, Vec3::new(0.0, 1000.0, 0.0));
        for _ in 0..600 {
            body.integrate(DT, &world);
        }
        assert_abs_diff_eq!(body.velocity.y, settings.terminal_fall_speed, epsilon = 1.0e-4);
    }
}
