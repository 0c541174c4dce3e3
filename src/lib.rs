//! Brick Rally - ball-and-paddle brick breaker simulation core
//!
//! Core modules:
//! - `sim`: Per-frame simulation (collisions, ball physics, AI, formations)
//! - `settings`: Data-driven configuration

pub mod settings;
pub mod sim;

pub use settings::{CollisionMode, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    use std::f32::consts::PI;

    /// Fixed simulation timestep used by the headless runner (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Playfield dimensions (y grows downward)
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    /// Base speed in pixels/s, scaled by the ball's speed ratio
    pub const BALL_BASE_SPEED: f32 = 360.0;
    /// The ball may never travel closer than this to the horizontal axis
    pub const MIN_ANGLE_FROM_HORIZONTAL: f32 = PI / 10.0;

    /// Two angles closer than this are considered equal by the unstick tracker
    pub const OSCILLATION_TOLERANCE: f32 = 1e-3;
    /// Consecutive 2-cycle detections before the ball gets nudged
    pub const OSCILLATION_TRIGGER: u32 = 6;
    /// Random nudge range for the unstick routine (~11.5 degrees)
    pub const UNSTICK_MAX_PERTURBATION: f32 = 0.2;
    pub const UNSTICK_MIN_PERTURBATION: f32 = 0.05;
    pub const UNSTICK_SPEED_BOOST: f32 = 1.05;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 100.0;
    pub const PADDLE_HEIGHT: f32 = 16.0;
    /// Distance from the bottom of the field to the paddle's top edge
    pub const PADDLE_BOTTOM_OFFSET: f32 = 48.0;
    pub const PADDLE_SPEED: f32 = 540.0;

    /// Launch angle off a stationary paddle struck dead centre (-60 degrees)
    pub const PADDLE_BASE_ANGLE: f32 = -PI / 3.0;
    /// Max deflection contributed by paddle velocity (22.5 degrees)
    pub const PADDLE_VELOCITY_DEFLECTION: f32 = PI / 8.0;
    /// Weight of the hit offset when the paddle is moving (15 degrees)
    pub const PADDLE_OFFSET_DEFLECTION: f32 = PI / 12.0;
    /// Deflection range off a stationary paddle (45 degrees)
    pub const PADDLE_STATIONARY_RANGE: f32 = PI / 4.0;
    pub const PADDLE_OFFSET_EXPONENT: f32 = 1.9;
    pub const PADDLE_SPEED_BOOST: f32 = 1.03;
    pub const PADDLE_HORIZONTAL_BONUS: f32 = 0.33;
    pub const PADDLE_MOTION_BONUS: f32 = 0.02;
    pub const PADDLE_SPEED_CAP_BASE: f32 = 1.1;
    pub const PADDLE_SPEED_CAP_HORIZONTAL: f32 = 0.75;

    /// Powerups
    pub const POWERUP_DURATION: f32 = 12.0;
    pub const ENLARGE_FACTOR: f32 = 1.5;
    pub const SHRINK_FACTOR: f32 = 0.7;

    /// Brick geometry
    pub const BRICK_WIDTH: f32 = 52.0;
    pub const BRICK_HEIGHT: f32 = 20.0;
    pub const BRICK_GAP: f32 = 4.0;
    pub const BRICK_TOP_MARGIN: f32 = 60.0;
    pub const BRICK_SIDE_MARGIN: f32 = 20.0;
    /// Bricks never occupy more than this share of the field height
    pub const BRICK_AREA_HEIGHT_SHARE: f32 = 0.5;
    pub const MAX_BRICK_COLUMNS: u32 = 14;
    pub const MAX_BRICK_ROWS: u32 = 12;
    pub const BASE_BRICK_ROWS: u32 = 4;
    pub const BRICK_POOL_CAPACITY: usize = 256;

    /// Raycast tuning
    pub const RAY_SIDE_OFFSET: f32 = 0.8;
    pub const RAY_EPSILON: f32 = 1e-6;
    /// Push-out applied after a raycast contact (no overlap depth is known)
    pub const RAYCAST_PENETRATION: f32 = 0.5;

    /// Scoring and flow
    pub const SCORE_BRICK_DESTROYED: u64 = 10;
    pub const SCORE_BRICK_DAMAGED: u64 = 5;
    pub const STARTING_LIVES: u8 = 3;
    /// Ticks with zero breakable bricks before the level counts as cleared
    pub const LEVEL_CLEAR_DEBOUNCE_TICKS: u32 = 20;
}

/// Normalize angle to (-π, π]
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

/// Unit direction of travel for an angle (y grows downward)
#[inline]
pub fn direction_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}
