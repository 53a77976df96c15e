/*!
Default tunables for the character body, free locomotion, jumping, grinding and rail
construction.

Notes
- Distances are in meters, speeds in meters per second, time in seconds.
- These are defaults only. Controllers read them through the structs in
  [`crate::settings`], so per-character overrides never touch this file.
*/

// --- Body ---------------------------------------------------------------------------------

/// Gravity magnitude in meters per second squared (positive value, applied along -Y).
pub const GRAVITY_MPS2: f32 = 24.0;

/// Fastest downward speed gravity may produce (negative, meters per second).
pub const TERMINAL_FALL_SPEED_MPS: f32 = -40.0;

/// Radius of the character capsule (meters).
pub const CAPSULE_RADIUS: f32 = 0.35;

/// Full standing height of the character, caps included (meters).
pub const STANDING_HEIGHT: f32 = 2.0;

/// Full crouched height of the character, caps included (meters).
pub const CROUCHED_HEIGHT: f32 = 1.0;

/// How far below the feet we look for support (meters).
pub const GROUND_PROBE_DISTANCE: f32 = 0.15;

/// Surfaces whose normal has a Y component at or above this count as walkable ground.
/// cos(50°).
pub const MAX_SLOPE_COS: f32 = 0.642_787_6;

/// Ground normals with a Y component at or above this are treated as flat, not a slope.
pub const FLAT_GROUND_COS: f32 = 0.999;

// --- Locomotion ---------------------------------------------------------------------------

/// Top planar speed while standing.
pub const MAX_SPEED_MPS: f32 = 12.0;

/// Top planar speed while crouched on a surface.
pub const CROUCH_SPEED_MPS: f32 = 6.0;

/// Acceleration cap while supported by a surface.
pub const GROUND_ACCELERATION_MPS2: f32 = 120.0;

/// Acceleration cap while airborne.
pub const AIR_ACCELERATION_MPS2: f32 = 24.0;

/// Damping rate (1/s) on a surface while not sliding.
pub const GROUND_FRICTION: f32 = 8.0;

/// Damping rate (1/s) while sliding.
pub const SLIDE_FRICTION: f32 = 1.0;

/// Damping rate (1/s) while airborne.
pub const AIR_FRICTION: f32 = 1.0;

/// Slide length at or above max speed. Slower entries scale this down linearly.
pub const MIN_SLIDE_DURATION_S: f32 = 0.5;

/// Impulse added when a slide starts from crouching on the ground.
pub const GROUND_SLIDE_FORCE: f32 = 8.0;

/// Impulse added when landing while already crouched.
pub const LANDING_SLIDE_FORCE: f32 = 4.0;

/// Planar speed squared that counts as "moving" for slide entry (m^2/s^2).
pub const SLIDE_SPEED_THRESHOLD_SQ: f32 = 0.1;

// --- Jump ---------------------------------------------------------------------------------

/// Vertical speed set by a jump.
pub const JUMP_FORCE_MPS: f32 = 12.0;

/// How long an airborne jump press is remembered, waiting for a landing.
pub const JUMP_BUFFER_S: f32 = 0.1;

// --- Grind --------------------------------------------------------------------------------

/// Target grind speed while travelling straight down the rail.
pub const DOWNWARD_GRIND_SPEED_MPS: f32 = 24.0;

/// Target grind speed while travelling straight up the rail.
pub const UPWARD_GRIND_SPEED_MPS: f32 = 16.0;

/// How fast the grind speed eases toward its target (m/s^2).
pub const GRIND_ACCELERATION_MPS2: f32 = 10.0;

/// Height of the character centre above the rail, along the rail's up vector.
pub const GRIND_VERTICAL_OFFSET: f32 = 0.5;

/// Distance at which correction toward the rail fully replaces tangent travel.
pub const GRIND_SNAP_DISTANCE: f32 = 1.0;

/// Remaining rail length under which an open rail ends the session automatically.
pub const END_OF_RAIL_EPSILON: f32 = 0.25;

/// Distance from the exit anchor required before another grind may start.
pub const EXIT_DISTANCE_THRESHOLD: f32 = 1.5;

// --- Rail construction --------------------------------------------------------------------

/// Longest placement raycast.
pub const PLACEMENT_MAX_DISTANCE: f32 = 100.0;

/// Clearance from a floor (hit normal pointing up).
pub const FLOOR_OFFSET: f32 = 0.5;

/// Clearance from a ceiling (hit normal pointing down).
pub const CEILING_OFFSET: f32 = 1.5;

/// Half the distance between the two seed knots of a new rail.
pub const SEED_HALF_SPAN: f32 = 1.0;

/// Tangent half-length of the two seed knots.
pub const INITIAL_TANGENT_LENGTH: f32 = 0.5;

/// Tangent length used for sharp turns.
pub const MIN_TANGENT_LENGTH: f32 = 1.0;

/// Tangent length used for straight continuations.
pub const MAX_TANGENT_LENGTH: f32 = 4.0;

/// New knots closer than this to the existing curve are rejected.
pub const MIN_DISTANCE_FROM_SPLINE: f32 = 1.5;

/// Radius of the solid capsules mirrored into the physics world along a rail.
pub const RAIL_SOLID_RADIUS: f32 = 0.1;

/// Spacing between the curve samples a rail's collision capsules run between (meters).
pub const RAIL_SOLID_SPACING: f32 = 1.0;

/// Radius of a rail's trigger zone around the curve.
pub const RAIL_TRIGGER_RADIUS: f32 = 1.2;

// --- Tolerances ---------------------------------------------------------------------------

/// Practical small distance for comparisons (meters).
pub const DIST_EPS: f32 = 1.0e-6;

/// Curves shorter than this are treated as degenerate.
pub const MIN_CURVE_LENGTH: f32 = 1.0e-4;
