pub mod body;
pub mod character;
pub mod constants;
pub mod construction;
pub mod curve;
pub mod error;
pub mod events;
pub mod grind;
pub mod input;
pub mod jump;
pub mod layers;
pub mod locomotion;
pub mod math;
pub mod query;
pub mod rail;
pub mod registry;
pub mod settings;
pub mod world;

pub use body::{CharacterBody, ContactState};
pub use character::{Character, CharacterSettings, TickContext};
pub use construction::{NoVisuals, Placement, RailConstructionTool, RailVisualSink};
pub use curve::{Curve, CurveSample, Knot, NearestPoint, TangentMode};
pub use error::{GrindError, PlacementError};
pub use events::{EventQueue, GameEvent, RailEvent};
pub use grind::{GrindSession, GrindState, RailGrindController};
pub use input::{InputEvent, InputFrame, InputGate, InputQueue, set_gates};
pub use jump::JumpController;
pub use layers::{CollisionLayer, LayerMask};
pub use locomotion::{LocomotionController, friction_delta};
pub use query::{OpenSky, RayHit, RaycastQuery};
pub use rail::{Rail, RailId, RailSet, ZoneId};
pub use registry::RailRegistry;
pub use settings::{
    BodySettings, ConstructionSettings, GrindSettings, JumpSettings, LocomotionSettings,
    ShapingCurve,
};
pub use world::{ColliderShapeDef, QueryWorld, WorldStaticDef};
