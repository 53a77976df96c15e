use crate::{layers::LayerMask, math::Vec3};

/// A ray hit against world geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    /// Unit surface normal at the hit.
    pub normal: Vec3,
    /// Distance from the ray origin.
    pub distance: f32,
    /// Id of the world object that was hit.
    pub object: u32,
}

/// Scene raycasts filtered by collision layer.
///
/// Implemented by [`crate::world::QueryWorld`]; tests substitute scripted geometry.
pub trait RaycastQuery {
    /// First hit along `direction` (need not be normalized) within `max_distance`.
    fn cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit>;

    /// Whether anything in `mask` lies on the segment `from → to`.
    fn segment_blocked(&self, from: Vec3, to: Vec3, mask: LayerMask) -> bool {
        let delta = to - from;
        let len = delta.norm();
        if len <= crate::constants::DIST_EPS {
            return false;
        }
        self.cast(from, delta / len, len, mask).is_some()
    }
}

/// A world with nothing in it.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenSky;

impl RaycastQuery for OpenSky {
    fn cast(&self, _: Vec3, _: Vec3, _: f32, _: LayerMask) -> Option<RayHit> {
        None
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::layers::CollisionLayer;

    /// Infinite planes tagged with a layer: enough geometry for controller tests.
    #[derive(Clone, Debug, Default)]
    pub struct Planes {
        pub planes: Vec<(Vec3, f32, CollisionLayer, u32)>,
    }

    impl Planes {
        /// Plane `normal · x = offset`.
        pub fn with(mut self, normal: Vec3, offset: f32, layer: CollisionLayer, object: u32) -> Self {
            self.planes.push((normal.normalize(), offset, layer, object));
            self
        }

        pub fn floor(y: f32) -> Self {
            Self::default().with(Vec3::y(), y, CollisionLayer::Ground, 1)
        }
    }

    impl RaycastQuery for Planes {
        fn cast(
            &self,
            origin: Vec3,
            direction: Vec3,
            max_distance: f32,
            mask: LayerMask,
        ) -> Option<RayHit> {
            let dir = direction.try_normalize(1.0e-9)?;
            let mut best: Option<RayHit> = None;
            for &(normal, offset, layer, object) in &self.planes {
                if !mask.contains(layer) {
                    continue;
                }
                let denom = normal.dot(&dir);
                if denom.abs() < 1.0e-9 {
                    continue;
                }
                let toi = (offset - normal.dot(&origin)) / denom;
                if toi < 0.0 || toi > max_distance {
                    continue;
                }
                if best.as_ref().is_none_or(|b| toi < b.distance) {
                    best = Some(RayHit {
                        point: origin + dir * toi,
                        normal: if denom < 0.0 { normal } else { -normal },
                        distance: toi,
                        object,
                    });
                }
            }
            best
        }
    }

    #[test]
    fn planes_hit_the_nearest_surface_facing_the_ray() {
        let world = Planes::floor(0.0).with(Vec3::y(), 5.0, CollisionLayer::Ground, 2);
        let hit = world
            .cast(Vec3::new(0.0, 2.0, 0.0), -Vec3::y(), 10.0, LayerMask::blocking())
            .expect("floor below");
        assert_eq!(hit.object, 1);
        assert!((hit.distance - 2.0).abs() < 1.0e-6);
        assert_eq!(hit.normal, Vec3::y());

        let up = world
            .cast(Vec3::new(0.0, 2.0, 0.0), Vec3::y(), 10.0, LayerMask::blocking())
            .expect("ceiling above");
        assert_eq!(up.object, 2);
        assert_eq!(up.normal, -Vec3::y());
    }

    #[test]
    fn segment_blocked_only_within_the_segment() {
        let world = Planes::default().with(Vec3::x(), 5.0, CollisionLayer::Ground, 3);
        let mask = LayerMask::blocking();
        assert!(world.segment_blocked(Vec3::zeros(), Vec3::new(10.0, 0.0, 0.0), mask));
        assert!(!world.segment_blocked(Vec3::zeros(), Vec3::new(4.0, 0.0, 0.0), mask));
        assert!(!OpenSky.segment_blocked(Vec3::zeros(), Vec3::x(), mask));
    }
}
