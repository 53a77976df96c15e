use nalgebra as na;

use crate::constants::DIST_EPS;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Vec2 = na::Vector2<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// World up.
#[inline]
pub fn up() -> Vec3 {
    Vec3::y()
}

/// Forward axis of a look orientation. Yaw 0 faces -Z.
#[inline]
pub fn look_forward(look: &Quat) -> Vec3 {
    look * Vec3::new(0.0, 0.0, -1.0)
}

/// Right axis of a look orientation.
#[inline]
pub fn look_right(look: &Quat) -> Vec3 {
    look * Vec3::x()
}

/// Yaw-only look orientation about +Y.
pub fn yaw_look(yaw: f32) -> Quat {
    Quat::from_axis_angle(&Vec3::y_axis(), yaw)
}

/// Yaw (about +Y) that faces the planar direction `xz`, or `None` if it is too short.
pub fn yaw_from_xz(xz: Vec2) -> Option<f32> {
    if xz.norm_squared() > DIST_EPS {
        return Some((-xz.x).atan2(-xz.y));
    }

    None
}

/// Drop the vertical component.
#[inline]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Remove the component of `v` along the (unit) plane normal `n`.
#[inline]
pub fn project_on_plane(v: Vec3, n: &Vec3) -> Vec3 {
    v - n * v.dot(n)
}

/// Unit vector or zero when `v` is too short to normalize.
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    v.try_normalize(DIST_EPS).unwrap_or_else(Vec3::zeros)
}

/// Linear remap of `value` from `[in_min, in_max]` to `[0, 1]` (unclamped).
#[inline]
pub fn remap01(value: f32, in_min: f32, in_max: f32) -> f32 {
    let span = in_max - in_min;
    if span.abs() <= DIST_EPS {
        return 0.0;
    }
    (value - in_min) / span
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting.
#[inline]
pub fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta.max(0.0) {
        return target;
    }
    current + delta.signum() * max_delta.max(0.0)
}

/// Planar (XZ) speed squared of a velocity.
#[inline]
pub fn planar_speed_sq(v: &Vec3) -> f32 {
    v.x * v.x + v.z * v.z
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn move_toward_never_overshoots() {
        assert_eq!(move_toward(0.0, 10.0, 3.0), 3.0);
        assert_eq!(move_toward(9.0, 10.0, 3.0), 10.0);
        assert_eq!(move_toward(10.0, 4.0, 2.5), 7.5);
        assert_eq!(move_toward(5.0, 5.0, 0.0), 5.0);
    }

    #[test]
    fn remap01_maps_ends_and_middle() {
        assert_abs_diff_eq!(remap01(-1.0, -1.0, 1.0), 0.0);
        assert_abs_diff_eq!(remap01(0.0, -1.0, 1.0), 0.5);
        assert_abs_diff_eq!(remap01(1.0, -1.0, 1.0), 1.0);
        // Reversed input range flips the mapping.
        assert_abs_diff_eq!(remap01(1.0, 1.0, -1.0), 0.0);
        assert_abs_diff_eq!(remap01(-1.0, 1.0, -1.0), 1.0);
    }

    #[test]
    fn project_on_plane_removes_normal_component() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let p = project_on_plane(v, &Vec3::y());
        assert_abs_diff_eq!(p, Vec3::new(1.0, 0.0, 3.0), epsilon = 1.0e-6);
    }

    #[test]
    fn yaw_zero_looks_down_negative_z() {
        let look = yaw_look(0.0);
        assert_abs_diff_eq!(look_forward(&look), Vec3::new(0.0, 0.0, -1.0), epsilon = 1.0e-6);
        assert_abs_diff_eq!(look_right(&look), Vec3::new(1.0, 0.0, 0.0), epsilon = 1.0e-6);
    }

    #[test]
    fn yaw_from_xz_round_trips_through_yaw_look() {
        let dir = Vec2::new(1.0, 0.0);
        let yaw = yaw_from_xz(dir).expect("non-zero direction");
        let fwd = look_forward(&yaw_look(yaw));
        assert_abs_diff_eq!(fwd, Vec3::new(1.0, 0.0, 0.0), epsilon = 1.0e-5);
        assert!(yaw_from_xz(Vec2::zeros()).is_none());
    }
}
