use thiserror::Error;

use crate::rail::RailId;

/// Why the construction tool refused a placement. Nothing is mutated when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PlacementError {
    #[error("no placement surface within {max_distance} m")]
    NoSurface { max_distance: f32 },

    #[error("placement is {distance:.2} m from the rail, minimum is {minimum:.2} m")]
    TooCloseToRail { distance: f32, minimum: f32 },

    #[error("path from the previous knot to the placement is obstructed")]
    Obstructed,

    #[error("placement direction is degenerate")]
    DegenerateDirection,

    #[error("active rail {0:?} no longer exists")]
    RailMissing(RailId),

    #[error("construction input is disabled")]
    InputDisabled,
}

/// Why a grind could not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GrindError {
    #[error("rail {0:?} does not exist")]
    UnknownRail(RailId),

    #[error("rail {0:?} has a degenerate curve")]
    DegenerateRail(RailId),

    #[error("a grind session is already active")]
    NotInactive,
}
