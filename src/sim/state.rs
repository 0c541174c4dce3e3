//! Game state and session-level rules
//!
//! One `GameState` owns every component of a running session. Nothing is
//! global: the tick function, tests and the runner all get it by reference.

use std::collections::VecDeque;

use anyhow::Result;
use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ai::{AiController, AiView};
use super::ball::Ball;
use super::collision::CollisionEngine;
use super::formation::{BrickPosition, FormationGenerator, FormationType, GenerationOptions};
use super::geometry::Rect;
use super::paddle::{MoveIntent, Paddle, Powerup, stationary_angle};
use super::pool::{BrickHandle, BrickPool};
use super::raycast::TargetId;
use crate::consts::*;
use crate::settings::Settings;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Player in control
    Playing,
    /// AI in control
    Demo,
    /// Frozen; `GameState::resume_phase` says where to go back to
    Paused,
    /// Out of lives
    GameOver,
}

/// Where the ball is
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BallState {
    /// Riding the paddle at a hit offset (0 for a fresh serve)
    Attached { offset: f32 },
    Free,
}

/// Who issued an input command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    Player,
    Ai,
}

/// Abstract input, queued and drained at the start of each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputCommand {
    Move(MoveIntent),
    Fire,
    Pause,
    ToggleDemo,
}

/// Logical sound cues; mixing and panning happen elsewhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundId {
    PaddleHit,
    WallHit,
    BrickHit,
    BrickDestroyed,
    IndestructibleHit,
    LifeLost,
    LevelComplete,
    Serve,
    Powerup,
    GameOver,
}

/// Notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    ScoreChanged { delta: u64, total: u64 },
    LifeLost { remaining: u8 },
    LevelStarted { level: u32, formation: FormationType, bricks: usize },
    LevelComplete { level: u32 },
    GameOver { score: u64, level: u32 },
    /// Position hint in field space (z = 0)
    Sound { id: SoundId, position: Option<Vec3> },
    BrickPlaced { handle: BrickHandle, rect: Rect },
    BrickRemoved { handle: BrickHandle },
    PowerupActivated(Powerup),
    PowerupExpired(Powerup),
}

/// A running session
#[derive(Debug)]
pub struct GameState {
    pub settings: Settings,
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Phase to return to when unpausing
    pub resume_phase: GamePhase,
    /// 1-based
    pub level: u32,
    pub lives: u8,
    pub score: u64,
    /// Simulation tick counter; doubles as the hit box cache key
    pub frame: u64,
    pub ball: Ball,
    pub ball_state: BallState,
    pub paddle: Paddle,
    pub bricks: BrickPool,
    pub collision: CollisionEngine,
    pub ai: AiController,
    pub generator: FormationGenerator,
    pub formation: FormationType,
    /// Consecutive ticks with no breakable brick left
    pub level_clear_ticks: u32,
    pub(crate) inputs: VecDeque<(InputSource, InputCommand)>,
    events: Vec<GameEvent>,
    /// Scratch buffer for the per-tick collision targets
    pub(crate) targets: Vec<(TargetId, Rect)>,
}

impl GameState {
    /// Build a session from validated settings and place level 1
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let seed = settings.resolve_seed();

        let ball = Ball::with_min_angle(
            settings.ball_radius,
            settings.ball_base_speed,
            settings.min_angle_from_horizontal,
        )?;

        let paddle = Paddle::new(
            settings.field_width,
            settings.field_height,
            settings.paddle_width,
            settings.paddle_speed,
        );
        let generator = FormationGenerator::new(GenerationOptions {
            allowed_presets: settings.allowed_presets.clone(),
            overrides: settings.preset_overrides.clone(),
        });

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            resume_phase: GamePhase::Playing,
            level: 1,
            lives: settings.starting_lives,
            score: 0,
            frame: 0,
            ball,
            ball_state: BallState::Attached { offset: 0.0 },
            paddle,
            bricks: BrickPool::with_capacity(settings.brick_pool_capacity),
            collision: CollisionEngine::new(
                settings.collision_mode,
                settings.field_width,
                settings.field_height,
            ),
            ai: AiController::new(settings.difficulty),
            generator,
            formation: FormationType::for_level(1),
            level_clear_ticks: 0,
            inputs: VecDeque::new(),
            events: Vec::new(),
            targets: Vec::new(),
            settings,
        };

        log::info!(
            "New session: seed {}, {} collision, AI {}",
            seed,
            state.collision.mode.as_str(),
            state.ai.difficulty().as_str()
        );
        state.start_level(1);
        Ok(state)
    }

    /// Queue a command for the next tick
    pub fn push_input(&mut self, source: InputSource, command: InputCommand) {
        self.inputs.push_back((source, command));
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub(crate) fn play_sound(&mut self, id: SoundId, position: Vec2) {
        self.emit(GameEvent::Sound {
            id,
            position: Some(position.extend(0.0)),
        });
    }

    /// The AI is (or will be, once unpaused) driving the paddle
    pub fn is_demo(&self) -> bool {
        self.phase == GamePhase::Demo
            || (self.phase == GamePhase::Paused && self.resume_phase == GamePhase::Demo)
    }

    /// Simulation is advancing
    pub fn is_running(&self) -> bool {
        matches!(self.phase, GamePhase::Playing | GamePhase::Demo)
    }

    pub(crate) fn add_score(&mut self, delta: u64) {
        if delta == 0 {
            return;
        }
        self.score += delta;
        self.emit(GameEvent::ScoreChanged {
            delta,
            total: self.score,
        });
    }

    /// Map generated positions to field rectangles and check bricks out
    ///
    /// The formation is centred horizontally. Positions without a preset are
    /// skipped, as is everything past pool capacity. Returns the number
    /// of bricks placed.
    pub fn place_level(&mut self, positions: &[BrickPosition]) -> usize {
        let Some(span) = positions
            .iter()
            .map(|p| p.column)
            .fold(None, |acc: Option<f32>, c| Some(acc.map_or(c, |a| a.max(c))))
        else {
            return 0;
        };

        let step_x = BRICK_WIDTH + BRICK_GAP;
        let step_y = BRICK_HEIGHT + BRICK_GAP;
        let total_width = (span + 1.0) * step_x - BRICK_GAP;
        let left = (self.settings.field_width - total_width) / 2.0;

        let mut placed = 0;
        for position in positions {
            let Some(preset) = position.preset() else {
                continue;
            };
            let rect = Rect::new(
                left + position.column * step_x,
                BRICK_TOP_MARGIN + position.row * step_y,
                BRICK_WIDTH,
                BRICK_HEIGHT,
            );
            let Some(handle) = self.bricks.checkout(rect, preset) else {
                continue;
            };
            self.emit(GameEvent::BrickPlaced { handle, rect });
            placed += 1;
        }
        placed
    }

    /// Clear the field and lay out `level`
    pub fn start_level(&mut self, level: u32) {
        for handle in self.bricks.clear() {
            self.emit(GameEvent::BrickRemoved { handle });
        }

        self.level = level;
        self.formation = FormationType::for_level(level);
        self.level_clear_ticks = 0;

        let positions = self.generator.generate_level(
            level,
            self.settings.field_width,
            self.settings.field_height,
            self.formation,
            &mut self.rng,
        );
        let bricks = self.place_level(&positions);
        if bricks < positions.len() {
            log::debug!(
                "Placed {} of {} generated bricks",
                bricks,
                positions.len()
            );
        }

        if let Some(active) = self.paddle.powerup {
            self.paddle.clear_powerup();
            self.emit(GameEvent::PowerupExpired(active.kind));
        }
        self.serve();

        log::info!(
            "Level {} started: {:?}, {} bricks ({} breakable)",
            level,
            self.formation,
            bricks,
            self.bricks.breakable_remaining()
        );
        self.emit(GameEvent::LevelStarted {
            level,
            formation: self.formation,
            bricks,
        });
    }

    /// Put a fresh ball on the paddle centre
    pub fn serve(&mut self) {
        self.ball.stop();
        self.ball.is_active = true;
        self.ball.speed_ratio = 1.0;
        self.ball_state = BallState::Attached { offset: 0.0 };
        self.attach_ball();
    }

    /// Keep an attached ball sitting on the paddle
    pub fn attach_ball(&mut self) {
        if let BallState::Attached { offset } = self.ball_state {
            self.ball.pos = Vec2::new(
                self.paddle.x + offset * self.paddle.width / 2.0,
                self.paddle.y - self.ball.radius - 1.0,
            );
        }
    }

    /// Release an attached ball
    ///
    /// Uses the stationary-paddle angle for the attach offset, which is the
    /// base launch angle for a centred serve.
    pub fn launch_ball(&mut self) {
        let BallState::Attached { offset } = self.ball_state else {
            return;
        };
        self.attach_ball();
        self.ball.launch(stationary_angle(offset));
        self.ball_state = BallState::Free;
        self.play_sound(SoundId::Serve, self.ball.pos);
    }

    /// Catch the ball on a sticky paddle
    pub(crate) fn stick_ball(&mut self, offset: f32) {
        self.ball.stop();
        self.ball_state = BallState::Attached { offset };
        self.attach_ball();
    }

    /// Ball went out the bottom
    pub fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        let position = self.ball.pos;
        self.emit(GameEvent::LifeLost {
            remaining: self.lives,
        });
        self.play_sound(SoundId::LifeLost, position);

        if let Some(active) = self.paddle.powerup {
            self.paddle.clear_powerup();
            self.emit(GameEvent::PowerupExpired(active.kind));
        }

        if self.lives == 0 {
            self.ball.stop();
            self.ball.is_active = false;
            self.phase = GamePhase::GameOver;
            self.resume_phase = GamePhase::GameOver;
            log::info!("Game over: score {} on level {}", self.score, self.level);
            self.emit(GameEvent::GameOver {
                score: self.score,
                level: self.level,
            });
            self.play_sound(SoundId::GameOver, position);
            return;
        }

        log::debug!("Life lost, {} remaining", self.lives);
        self.serve();
    }

    /// Start over from level 1 in the given phase
    pub fn restart(&mut self, phase: GamePhase) {
        self.lives = self.settings.starting_lives;
        self.score = 0;
        self.phase = phase;
        self.resume_phase = phase;
        self.paddle = Paddle::new(
            self.settings.field_width,
            self.settings.field_height,
            self.settings.paddle_width,
            self.settings.paddle_speed,
        );
        self.ai.reset();
        self.inputs.clear();
        self.start_level(1);
    }

    /// Snapshot of what the AI gets to see
    pub fn ai_view(&self) -> AiView {
        AiView {
            ball_pos: self.ball.pos,
            ball_angle: self.ball.angle(),
            ball_radius: self.ball.radius,
            ball_moving: self.ball.is_moving,
            paddle_x: self.paddle.x,
            paddle_y: self.paddle.y,
            paddle_width: self.paddle.width,
            field_width: self.settings.field_width,
        }
    }
}
