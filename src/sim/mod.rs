//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (by brick slot)
//! - No rendering or platform dependencies

pub mod ai;
pub mod ball;
pub mod collision;
pub mod formation;
pub mod geometry;
pub mod paddle;
pub mod pool;
pub mod presets;
pub mod raycast;
pub mod state;
pub mod tick;

pub use ai::{AiCommand, AiController, AiMode, AiParams, AiView, Difficulty};
pub use ball::{Ball, OscillationTracker, clamp_from_horizontal};
pub use collision::{Collidable, CollisionEngine, Contact, gather_targets};
pub use formation::{
    BrickPosition, FormationGenerator, FormationType, GenerationOptions, count_breakable_bricks,
};
pub use geometry::{CollisionFace, Rect, classify_face, intersects};
pub use paddle::{MoveIntent, Paddle, PaddleResponse, Powerup, respond};
pub use pool::{Brick, BrickHandle, BrickHit, BrickPool, RemovalQueue};
pub use presets::{BrickPreset, PRESETS, PresetGroup};
pub use raycast::{RaycastHit, TargetId, WallSide, cast_ball, cast_walls};
pub use state::{
    BallState, GameEvent, GamePhase, GameState, InputCommand, InputSource, SoundId,
};
pub use tick::{FixedStep, tick};
