//! Game settings
//!
//! Everything the simulation reads at construction time. Loaded from JSON,
//! validated once, then handed to `GameState::new`.

use std::collections::HashMap;
use std::f32::consts::FRAC_PI_2;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::ai::Difficulty;

/// Which collision strategy the tick uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionMode {
    /// Swept three-ray test, no tunneling
    Raycast,
    /// Post-move AABB overlap, first hit wins
    RectOverlap,
}

impl Default for CollisionMode {
    fn default() -> Self {
        if cfg!(feature = "rect-collision") {
            CollisionMode::RectOverlap
        } else {
            CollisionMode::Raycast
        }
    }
}

impl CollisionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionMode::Raycast => "raycast",
            CollisionMode::RectOverlap => "rect",
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Field ===
    pub field_width: f32,
    pub field_height: f32,

    // === Ball ===
    pub ball_radius: f32,
    /// Pixels per second at speed ratio 1.0
    pub ball_base_speed: f32,
    /// Minimum distance of the travel angle from the horizontal axis (radians)
    pub min_angle_from_horizontal: f32,

    // === Paddle ===
    pub paddle_width: f32,
    pub paddle_speed: f32,

    // === Rules ===
    pub starting_lives: u8,
    pub brick_pool_capacity: usize,
    pub collision_mode: CollisionMode,
    pub difficulty: Difficulty,

    /// Fixed RNG seed; `None` draws a fresh one per run
    pub seed: Option<u64>,

    // === Formation tuning ===
    /// Spawn weight overrides keyed by preset id
    pub preset_overrides: HashMap<String, f32>,
    /// Restrict generation to these preset ids
    pub allowed_presets: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,

            ball_radius: BALL_RADIUS,
            ball_base_speed: BALL_BASE_SPEED,
            min_angle_from_horizontal: MIN_ANGLE_FROM_HORIZONTAL,

            paddle_width: PADDLE_WIDTH,
            paddle_speed: PADDLE_SPEED,

            starting_lives: STARTING_LIVES,
            brick_pool_capacity: BRICK_POOL_CAPACITY,
            collision_mode: CollisionMode::default(),
            difficulty: Difficulty::Medium,

            seed: None,

            preset_overrides: HashMap::new(),
            allowed_presets: None,
        }
    }
}

impl Settings {
    /// Check every value the simulation relies on
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.field_width > 0.0 && self.field_height > 0.0,
            "field size must be positive, got {}x{}",
            self.field_width,
            self.field_height
        );
        ensure!(
            self.ball_radius > 0.0 && self.ball_radius * 2.0 < self.field_width.min(self.field_height),
            "ball radius {} does not fit the field",
            self.ball_radius
        );
        ensure!(
            self.ball_base_speed > 0.0,
            "ball base speed must be positive, got {}",
            self.ball_base_speed
        );
        ensure!(
            self.min_angle_from_horizontal > 0.0 && self.min_angle_from_horizontal < FRAC_PI_2,
            "minimum angle from horizontal must be in (0, π/2), got {}",
            self.min_angle_from_horizontal
        );
        ensure!(
            self.paddle_width > 0.0 && self.paddle_width < self.field_width,
            "paddle width {} does not fit the field",
            self.paddle_width
        );
        ensure!(self.paddle_speed > 0.0, "paddle speed must be positive");
        ensure!(self.starting_lives > 0, "starting lives must be at least 1");
        ensure!(self.brick_pool_capacity > 0, "brick pool capacity must be at least 1");
        for (id, weight) in &self.preset_overrides {
            ensure!(
                weight.is_finite() && *weight >= 0.0,
                "override for preset `{id}` must be a non-negative weight, got {weight}"
            );
        }
        Ok(())
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json).context("malformed settings JSON")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Seed for this run (fresh entropy when none is configured)
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random::<u64>)
    }
}
