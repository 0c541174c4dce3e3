//! Computer-controlled paddle for demo mode
//!
//! Each frame picks a behavior from the ball's state (serving, tracking a
//! descending ball, repositioning while it climbs) unless a deliberate
//! mistake is in progress. Difficulty only changes the numbers.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::paddle::MoveIntent;
use crate::direction_from_angle;

/// AI skill presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn params(&self) -> AiParams {
        match self {
            Difficulty::Easy => AiParams {
                reaction_time: (0.25, 0.45),
                accuracy: 0.6,
                mistake_probability: 0.15,
                mistake_duration: (0.3, 0.7),
                decision_interval: 0.5,
                serve_delay: 2.0,
                smoothing_time: 0.6,
            },
            Difficulty::Medium => AiParams {
                reaction_time: (0.15, 0.3),
                accuracy: 0.8,
                mistake_probability: 0.07,
                mistake_duration: (0.2, 0.5),
                decision_interval: 0.4,
                serve_delay: 1.5,
                smoothing_time: 0.4,
            },
            Difficulty::Hard => AiParams {
                reaction_time: (0.05, 0.15),
                accuracy: 0.95,
                mistake_probability: 0.02,
                mistake_duration: (0.1, 0.25),
                decision_interval: 0.3,
                serve_delay: 1.0,
                smoothing_time: 0.25,
            },
        }
    }
}

/// Per-difficulty tunables (times in seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiParams {
    pub reaction_time: (f32, f32),
    /// 1.0 aims perfectly
    pub accuracy: f32,
    /// Chance per decision cycle of starting a mistake
    pub mistake_probability: f32,
    pub mistake_duration: (f32, f32),
    pub decision_interval: f32,
    pub serve_delay: f32,
    pub smoothing_time: f32,
}

/// Share of the paddle width treated as "close enough"
const DEADZONE_FACTOR: f32 = 0.15;
/// Chance a mistake is standing still rather than running the wrong way
const MISTAKE_STILL_CHANCE: f64 = 0.3;
const WANDER_INTERVAL: (f32, f32) = (0.3, 1.1);
const RECENTER_CHANCE: f32 = 0.6;
const REPOSITION_STOP_CHANCE: f32 = 0.3;
const MAX_PREDICTION_BOUNCES: usize = 32;

/// What the AI sees each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiView {
    pub ball_pos: glam::Vec2,
    pub ball_angle: f32,
    pub ball_radius: f32,
    pub ball_moving: bool,
    /// Paddle centre
    pub paddle_x: f32,
    /// Paddle top edge
    pub paddle_y: f32,
    pub paddle_width: f32,
    pub field_width: f32,
}

/// Abstract commands for the next tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiCommand {
    pub intent: MoveIntent,
    pub fire: bool,
}

/// Behavior chosen on the last update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiMode {
    Serving,
    Tracking,
    Repositioning,
    Mistake,
}

/// Demo-mode paddle driver
#[derive(Debug, Clone)]
pub struct AiController {
    difficulty: Difficulty,
    params: AiParams,
    reaction_timer: f32,
    decision_timer: f32,
    mistake_timer: f32,
    simulating_mistake: bool,
    mistake_intent: MoveIntent,
    serve_timer: f32,
    wander_timer: f32,
    smoothing_timer: f32,
    target_x: Option<f32>,
    intent: MoveIntent,
    mode: AiMode,
}

impl AiController {
    pub fn new(difficulty: Difficulty) -> Self {
        Self::with_params(difficulty, difficulty.params())
    }

    pub fn with_params(difficulty: Difficulty, params: AiParams) -> Self {
        Self {
            difficulty,
            params,
            reaction_timer: 0.0,
            decision_timer: params.decision_interval,
            mistake_timer: 0.0,
            simulating_mistake: false,
            mistake_intent: MoveIntent::Stop,
            serve_timer: 0.0,
            wander_timer: 0.0,
            smoothing_timer: 0.0,
            target_x: None,
            intent: MoveIntent::Stop,
            mode: AiMode::Serving,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn params(&self) -> &AiParams {
        &self.params
    }

    /// Swap difficulty; all live state starts over
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        log::info!("AI difficulty: {}", difficulty.as_str());
        *self = Self::new(difficulty);
    }

    /// Reset timers (demo start or restart)
    pub fn reset(&mut self) {
        *self = Self::with_params(self.difficulty, self.params);
    }

    pub fn target_x(&self) -> Option<f32> {
        self.target_x
    }

    pub fn mode(&self) -> AiMode {
        self.mode
    }

    pub fn is_simulating_mistake(&self) -> bool {
        self.simulating_mistake
    }

    /// Decide this frame's commands
    pub fn update(&mut self, view: &AiView, dt: f32, rng: &mut impl Rng) -> AiCommand {
        let dt = dt.max(0.0);

        if !view.ball_moving {
            let fire = self.serve(view, dt, rng);
            return self.command(fire);
        }
        self.serve_timer = 0.0;

        if self.simulating_mistake {
            self.mistake_timer -= dt;
            if self.mistake_timer > 0.0 {
                self.mode = AiMode::Mistake;
                self.intent = self.mistake_intent;
                return self.command(false);
            }
            self.simulating_mistake = false;
        }

        self.decision_timer -= dt;
        if self.decision_timer <= 0.0 {
            self.decision_timer = self.params.decision_interval;
            if rng.random::<f32>() < self.params.mistake_probability {
                self.start_mistake(rng);
                return self.command(false);
            }
        }

        if direction_from_angle(view.ball_angle).y > 0.0 {
            self.track(view, dt, rng);
        } else {
            self.reposition(view, dt, rng);
        }
        self.command(false)
    }

    fn command(&self, fire: bool) -> AiCommand {
        AiCommand {
            intent: self.intent,
            fire,
        }
    }

    /// Ball resting on the paddle: wander a bit, then fire
    fn serve(&mut self, view: &AiView, dt: f32, rng: &mut impl Rng) -> bool {
        self.mode = AiMode::Serving;
        self.simulating_mistake = false;
        self.target_x = None;

        let center = view.field_width / 2.0;
        let drift = view.paddle_x - center;
        self.wander_timer -= dt;
        if drift.abs() > view.field_width / 3.0 {
            self.intent = if drift > 0.0 {
                MoveIntent::Left
            } else {
                MoveIntent::Right
            };
        } else if self.wander_timer <= 0.0 {
            self.wander_timer = sample(rng, WANDER_INTERVAL);
            self.intent = match rng.random_range(0..3) {
                0 => MoveIntent::Left,
                1 => MoveIntent::Right,
                _ => MoveIntent::Stop,
            };
        }

        self.serve_timer += dt;
        if self.serve_timer >= self.params.serve_delay {
            self.serve_timer = 0.0;
            self.intent = MoveIntent::Stop;
            return true;
        }
        false
    }

    fn start_mistake(&mut self, rng: &mut impl Rng) {
        self.simulating_mistake = true;
        self.mistake_timer = sample(rng, self.params.mistake_duration);
        self.mistake_intent = if rng.random_bool(MISTAKE_STILL_CHANCE) {
            MoveIntent::Stop
        } else if rng.random_bool(0.5) {
            MoveIntent::Left
        } else {
            MoveIntent::Right
        };
        self.mode = AiMode::Mistake;
        self.intent = self.mistake_intent;
        log::debug!(
            "AI mistake: {:?} for {:.2}s",
            self.mistake_intent,
            self.mistake_timer
        );
    }

    /// Ball coming down: aim for the predicted landing point
    fn track(&mut self, view: &AiView, dt: f32, rng: &mut impl Rng) {
        if self.mode != AiMode::Tracking {
            // Fresh descent: wait out a reaction delay before aiming
            self.reaction_timer = sample(rng, self.params.reaction_time);
            self.target_x = None;
        }
        self.mode = AiMode::Tracking;

        self.reaction_timer -= dt;
        if self.reaction_timer <= 0.0 {
            self.reaction_timer = sample(rng, self.params.reaction_time);
            if let Some(landing) = predict_landing_x(view) {
                let spread = (1.0 - self.params.accuracy).max(0.0) * view.paddle_width;
                let error = if spread > 0.0 {
                    rng.random_range(-spread..=spread)
                } else {
                    0.0
                };
                self.target_x = Some(landing + error);
            }
        }

        if let Some(target) = self.target_x {
            self.intent = steer(view, target);
        }
    }

    /// Ball climbing: occasionally drift back toward the middle or stop
    fn reposition(&mut self, view: &AiView, dt: f32, rng: &mut impl Rng) {
        self.mode = AiMode::Repositioning;
        self.target_x = None;

        let center = view.field_width / 2.0;
        self.smoothing_timer += dt;
        if self.smoothing_timer >= self.params.smoothing_time {
            self.smoothing_timer = 0.0;
            let far_off = (view.paddle_x - center).abs() > view.field_width * 0.25;
            if far_off && rng.random::<f32>() < RECENTER_CHANCE {
                self.intent = steer(view, center);
            } else if rng.random::<f32>() < REPOSITION_STOP_CHANCE {
                self.intent = MoveIntent::Stop;
            }
        } else if self.intent != MoveIntent::Stop && steer(view, center) == MoveIntent::Stop {
            // Arrived back at the middle
            self.intent = MoveIntent::Stop;
        }
    }
}

fn sample(rng: &mut impl Rng, (lo, hi): (f32, f32)) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Move toward `target_x` unless already within the deadzone
fn steer(view: &AiView, target_x: f32) -> MoveIntent {
    let diff = target_x - view.paddle_x;
    if diff.abs() <= view.paddle_width * DEADZONE_FACTOR {
        MoveIntent::Stop
    } else if diff > 0.0 {
        MoveIntent::Right
    } else {
        MoveIntent::Left
    }
}

/// Where the ball will cross the paddle's height, folding wall bounces
pub fn predict_landing_x(view: &AiView) -> Option<f32> {
    let dir = direction_from_angle(view.ball_angle);
    if dir.y <= 1e-4 {
        return None;
    }
    let intercept_y = view.paddle_y - view.ball_radius;
    let t = (intercept_y - view.ball_pos.y) / dir.y;
    if t < 0.0 {
        return None;
    }

    let min_x = view.ball_radius;
    let max_x = (view.field_width - view.ball_radius).max(min_x);
    let mut x = view.ball_pos.x + dir.x * t;
    for _ in 0..MAX_PREDICTION_BOUNCES {
        if x < min_x {
            x = 2.0 * min_x - x;
        } else if x > max_x {
            x = 2.0 * max_x - x;
        } else {
            break;
        }
    }
    Some(x.clamp(min_x, max_x))
}
