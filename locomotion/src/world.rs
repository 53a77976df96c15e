//! Rapier-backed query world for level geometry and rail solids.
//!
//! Design goals
//! - Query-focused: scene raycasts and the Rapier `KinematicCharacterController`, no dynamics.
//! - Layered: every collider stores its [`LayerMask`] in `user_data`, and queries filter on it
//!   with a predicate, so grinding can stop colliding with rails without touching the level.
//! - Rails are mutable: their solids are replaced whenever the curve changes.

use std::collections::BTreeMap;

use log::debug;
use rapier3d::{
    na::{Isometry, Translation3, UnitQuaternion},
    prelude::*,
};

use crate::{
    constants::{DIST_EPS, RAIL_SOLID_RADIUS, RAIL_SOLID_SPACING},
    layers::{CollisionLayer, LayerMask, object_from_user_data, pack_user_data},
    math::Vec3,
    query::{RayHit, RaycastQuery},
    rail::{Rail, RailId},
};

/// Object ids at or above this value belong to rail solids (`RAIL_OBJECT_BASE + rail id`).
pub const RAIL_OBJECT_BASE: u32 = 0x8000_0000;

/// Definition of an immutable level collider.
///
/// Conventions
/// - Units are meters.
/// - Rotation is a unit quaternion.
/// - For planes, the normal is pose-derived: `normal = rotation * +Y`, and the plane passes
///   through `translation + normal * offset_along_normal`.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier; also reported back in [`RayHit::object`].
    pub id: u32,
    pub translation: Vector<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub shape: ColliderShapeDef,
    pub layers: LayerMask,
}

impl WorldStaticDef {
    /// Level geometry on the ground layer.
    pub fn ground(
        id: u32,
        translation: Vector<f32>,
        rotation: UnitQuaternion<f32>,
        shape: ColliderShapeDef,
    ) -> Self {
        Self {
            id,
            translation,
            rotation,
            shape,
            layers: LayerMask::single(CollisionLayer::Ground),
        }
    }
}

/// Supported level collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space) offset along its normal (meters).
    Plane { offset_along_normal: f32 },
    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vector<f32> },
    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },
}

fn collider_from_def(def: &WorldStaticDef) -> Collider {
    let builder = match &def.shape {
        ColliderShapeDef::Plane { .. } => {
            ColliderBuilder::new(SharedShape::new(HalfSpace::new(Vector::y_axis())))
        }
        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius),
    };

    let mut collider = builder
        .user_data(pack_user_data(def.layers, def.id))
        .build();

    let offset = match def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => def.rotation * Vector::y() * offset_along_normal,
        _ => Vector::zeros(),
    };
    let iso = Isometry::from_parts(Translation3::from(def.translation + offset), def.rotation);
    collider.set_position(iso);
    collider
}

/// In-memory Rapier structures for scene queries and the KCC.
pub struct QueryWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    params: IntegrationParameters,
    rail_solids: BTreeMap<RailId, Vec<ColliderHandle>>,
}

impl QueryWorld {
    /// Build from level definitions. Input is sorted by `id` so insertion order is stable.
    pub fn build(defs: impl IntoIterator<Item = WorldStaticDef>, dt: f32) -> Self {
        let mut defs: Vec<WorldStaticDef> = defs.into_iter().collect();
        defs.sort_by_key(|d| d.id);

        let mut world = Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::default(),
            params: IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            rail_solids: BTreeMap::new(),
        };

        let handles: Vec<ColliderHandle> = defs
            .iter()
            .map(|def| world.colliders.insert(collider_from_def(def)))
            .collect();
        world.refresh(&handles, &[]);
        world
    }

    fn refresh(&mut self, modified: &[ColliderHandle], removed: &[ColliderHandle]) {
        let mut events = Vec::new();
        self.broad_phase.update(
            &self.params,
            &self.colliders,
            &self.bodies,
            modified,
            removed,
            &mut events,
        );
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Borrowed query pipeline for scene queries and KCC moves.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    /// Replace the solids mirroring `rail` with a capsule chain sampled along its curve.
    pub fn sync_rail(&mut self, id: RailId, rail: &Rail) {
        self.remove_rail(id);

        let points = rail.sample_polyline(RAIL_SOLID_SPACING);
        let layers = LayerMask::single(CollisionLayer::Rail);
        let object = RAIL_OBJECT_BASE.saturating_add(id.0);

        let handles: Vec<ColliderHandle> = points
            .windows(2)
            .filter(|w| (w[1] - w[0]).norm_squared() > DIST_EPS)
            .map(|w| {
                let collider = ColliderBuilder::new(SharedShape::capsule(
                    w[0].into(),
                    w[1].into(),
                    RAIL_SOLID_RADIUS,
                ))
                .user_data(pack_user_data(layers, object))
                .build();
                self.colliders.insert(collider)
            })
            .collect();

        debug!("rail {:?} mirrored as {} solid(s)", id, handles.len());
        self.refresh(&handles, &[]);
        self.rail_solids.insert(id, handles);
    }

    /// Drop the solids of a destroyed rail.
    pub fn remove_rail(&mut self, id: RailId) {
        let Some(handles) = self.rail_solids.remove(&id) else {
            return;
        };
        let mut islands = IslandManager::new();
        for &handle in &handles {
            self.colliders
                .remove(handle, &mut islands, &mut self.bodies, false);
        }
        self.refresh(&[], &handles);
    }

    pub fn rail_solid_count(&self, id: RailId) -> usize {
        self.rail_solids.get(&id).map_or(0, Vec::len)
    }
}

impl RaycastQuery for QueryWorld {
    fn cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        let dir = direction.try_normalize(DIST_EPS)?;
        let predicate = |_: ColliderHandle, collider: &Collider| {
            LayerMask::from_user_data(collider.user_data).intersects(mask)
        };
        let filter = QueryFilter::default().exclude_sensors().predicate(&predicate);
        let pipeline = self.query_pipeline(filter);

        let ray = Ray::new(origin.into(), dir);
        let (handle, hit) = pipeline.cast_ray_and_get_normal(&ray, max_distance.max(0.0), true)?;

        Some(RayHit {
            point: ray.point_at(hit.time_of_impact).coords,
            normal: hit.normal,
            distance: hit.time_of_impact,
            object: self
                .colliders
                .get(handle)
                .map_or(0, |c| object_from_user_data(c.user_data)),
        })
    }
}
