//! Runtime configuration for each controller.
//!
//! Every struct is `Copy` and defaults to the values in [`crate::constants`]. Controllers
//! take their settings at construction, so two characters may be tuned differently.

use crate::constants::*;

/// Character body and contact sensing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodySettings {
    pub gravity: f32,
    pub terminal_fall_speed: f32,
    pub radius: f32,
    /// Full standing height, caps included.
    pub standing_height: f32,
    /// Full crouched height, caps included.
    pub crouched_height: f32,
    pub ground_probe_distance: f32,
    pub max_slope_cos: f32,
    pub flat_ground_cos: f32,
}

impl Default for BodySettings {
    fn default() -> Self {
        Self {
            gravity: GRAVITY_MPS2,
            terminal_fall_speed: TERMINAL_FALL_SPEED_MPS,
            radius: CAPSULE_RADIUS,
            standing_height: STANDING_HEIGHT,
            crouched_height: CROUCHED_HEIGHT,
            ground_probe_distance: GROUND_PROBE_DISTANCE,
            max_slope_cos: MAX_SLOPE_COS,
            flat_ground_cos: FLAT_GROUND_COS,
        }
    }
}

impl BodySettings {
    /// Standing height, never shorter than the capsule's two caps.
    pub fn clamped_standing_height(&self) -> f32 {
        self.standing_height.max(2.0 * self.radius)
    }

    /// Crouched height, kept between the caps and the standing height.
    pub fn clamped_crouched_height(&self) -> f32 {
        self.crouched_height
            .max(2.0 * self.radius)
            .min(self.clamped_standing_height())
    }

    /// How much shorter the capsule actually gets while crouched.
    pub fn height_difference(&self) -> f32 {
        self.clamped_standing_height() - self.clamped_crouched_height()
    }
}

/// Free ground/air movement, crouch and slide.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocomotionSettings {
    pub max_speed: f32,
    pub crouch_speed: f32,
    pub ground_acceleration: f32,
    pub air_acceleration: f32,
    pub ground_friction: f32,
    pub slide_friction: f32,
    pub air_friction: f32,
    pub min_slide_duration: f32,
    pub ground_slide_force: f32,
    pub landing_slide_force: f32,
    pub slide_speed_threshold_sq: f32,
}

impl Default for LocomotionSettings {
    fn default() -> Self {
        Self {
            max_speed: MAX_SPEED_MPS,
            crouch_speed: CROUCH_SPEED_MPS,
            ground_acceleration: GROUND_ACCELERATION_MPS2,
            air_acceleration: AIR_ACCELERATION_MPS2,
            ground_friction: GROUND_FRICTION,
            slide_friction: SLIDE_FRICTION,
            air_friction: AIR_FRICTION,
            min_slide_duration: MIN_SLIDE_DURATION_S,
            ground_slide_force: GROUND_SLIDE_FORCE,
            landing_slide_force: LANDING_SLIDE_FORCE,
            slide_speed_threshold_sq: SLIDE_SPEED_THRESHOLD_SQ,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpSettings {
    pub jump_force: f32,
    pub jump_buffer: f32,
}

impl Default for JumpSettings {
    fn default() -> Self {
        Self {
            jump_force: JUMP_FORCE_MPS,
            jump_buffer: JUMP_BUFFER_S,
        }
    }
}

/// Rail grinding.
///
/// `end_of_rail_epsilon` and `exit_distance_threshold` are deliberately separate knobs: the
/// first ends a session near the end of an open rail, the second debounces re-entry after
/// any exit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrindSettings {
    pub downward_speed: f32,
    pub upward_speed: f32,
    pub acceleration: f32,
    pub vertical_offset: f32,
    pub snap_distance: f32,
    pub end_of_rail_epsilon: f32,
    pub exit_distance_threshold: f32,
}

impl Default for GrindSettings {
    fn default() -> Self {
        Self {
            downward_speed: DOWNWARD_GRIND_SPEED_MPS,
            upward_speed: UPWARD_GRIND_SPEED_MPS,
            acceleration: GRIND_ACCELERATION_MPS2,
            vertical_offset: GRIND_VERTICAL_OFFSET,
            snap_distance: GRIND_SNAP_DISTANCE,
            end_of_rail_epsilon: END_OF_RAIL_EPSILON,
            exit_distance_threshold: EXIT_DISTANCE_THRESHOLD,
        }
    }
}

/// Monotonic map from `[0, 1]` to `[0, 1]` used to pick tangent lengths.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum ShapingCurve {
    Linear,
    /// `3x² − 2x³`.
    #[default]
    SmoothStep,
    /// `x^k` for `k > 0`.
    Power(f32),
}

impl ShapingCurve {
    pub fn sample(&self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        match *self {
            ShapingCurve::Linear => x,
            ShapingCurve::SmoothStep => x * x * (3.0 - 2.0 * x),
            ShapingCurve::Power(k) => x.powf(k.max(1.0e-3)),
        }
    }
}

/// Rail construction tool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstructionSettings {
    pub max_distance: f32,
    pub floor_offset: f32,
    pub ceiling_offset: f32,
    pub seed_half_span: f32,
    pub initial_tangent_length: f32,
    pub min_tangent_length: f32,
    pub max_tangent_length: f32,
    pub min_distance_from_spline: f32,
    pub tangent_shaping: ShapingCurve,
}

impl Default for ConstructionSettings {
    fn default() -> Self {
        Self {
            max_distance: PLACEMENT_MAX_DISTANCE,
            floor_offset: FLOOR_OFFSET,
            ceiling_offset: CEILING_OFFSET,
            seed_half_span: SEED_HALF_SPAN,
            initial_tangent_length: INITIAL_TANGENT_LENGTH,
            min_tangent_length: MIN_TANGENT_LENGTH,
            max_tangent_length: MAX_TANGENT_LENGTH,
            min_distance_from_spline: MIN_DISTANCE_FROM_SPLINE,
            tangent_shaping: ShapingCurve::default(),
        }
    }
}
