//! Test level: a ground plane, a crate, a wall and one seeded rail.

use locomotion::{
    ColliderShapeDef, Curve, Knot, RailSet, WorldStaticDef,
    math::{Iso, Vec3},
};
use nalgebra::UnitQuaternion;

pub const SPAWN: Vec3 = Vec3::new(0.0, 0.1, 0.0);

pub fn statics() -> Vec<WorldStaticDef> {
    vec![
        WorldStaticDef::ground(
            1,
            Vec3::zeros(),
            UnitQuaternion::identity(),
            ColliderShapeDef::Plane {
                offset_along_normal: 0.0,
            },
        ),
        WorldStaticDef::ground(
            2,
            Vec3::new(5.0, 0.5, 0.0),
            UnitQuaternion::identity(),
            ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(0.5, 0.5, 0.5),
            },
        ),
        WorldStaticDef::ground(
            3,
            Vec3::new(-8.0, 2.0, -10.0),
            UnitQuaternion::identity(),
            ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(0.25, 2.0, 10.0),
            },
        ),
    ]
}

/// A straight rail at hip height running away from the spawn along -Z.
pub fn seed_rails(rails: &mut RailSet) {
    let tangent = Vec3::new(0.0, 0.0, -4.0);
    rails.insert(
        Curve::from_knots(
            [
                Knot::mirrored(Vec3::zeros(), tangent),
                Knot::mirrored(Vec3::new(0.0, 0.0, -20.0), tangent),
            ],
            false,
        ),
        Iso::translation(0.0, 1.0, -4.0),
    );
}
