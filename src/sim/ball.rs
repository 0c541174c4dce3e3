//! Ball state and movement
//!
//! The ball stores a travel angle and a speed ratio instead of a velocity
//! vector. Every angle assignment goes through `clamp_from_horizontal`, so a
//! perfectly horizontal (and therefore endless) trajectory is impossible.

use std::f32::consts::{FRAC_PI_2, PI};

use anyhow::{Result, ensure};
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Collidable;
use super::geometry::{CollisionFace, Rect};
use crate::consts::*;
use crate::{direction_from_angle, normalize_angle};

/// Snap an angle away from the horizontal axis
///
/// The result lies in (-π, π] and is at least `min_angle` away from 0 and
/// ±π. Angles inside the forbidden band are moved to its edge, keeping
/// their quadrant.
pub fn clamp_from_horizontal(angle: f32, min_angle: f32) -> f32 {
    let a = normalize_angle(angle);
    let upward = a < 0.0;
    let magnitude = a.abs();

    let clamped = if magnitude < min_angle {
        min_angle
    } else if PI - magnitude < min_angle {
        PI - min_angle
    } else {
        magnitude
    };

    if upward { -clamped } else { clamped }
}

/// Distance of an angle from the nearest multiple of π
pub fn distance_from_horizontal(angle: f32) -> f32 {
    let magnitude = normalize_angle(angle).abs();
    magnitude.min(PI - magnitude)
}

/// Detects a ball ping-ponging between two angles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OscillationTracker {
    /// Most recent angles, oldest first
    recent: Vec<f32>,
    /// Consecutive 2-cycle detections
    repeats: u32,
}

impl OscillationTracker {
    /// Record a bounce angle; true once the 2-cycle has persisted long enough
    pub fn record(&mut self, angle: f32) -> bool {
        self.recent.push(angle);
        if self.recent.len() > 3 {
            self.recent.remove(0);
        }

        if let &[two_back, previous, newest] = self.recent.as_slice() {
            let same = |a: f32, b: f32| (a - b).abs() < OSCILLATION_TOLERANCE;
            if same(newest, two_back) && !same(newest, previous) {
                self.repeats += 1;
            } else {
                self.repeats = 0;
            }
        }

        self.repeats >= OSCILLATION_TRIGGER
    }

    pub fn repeats(&self) -> u32 {
        self.repeats
    }

    pub fn reset(&mut self) {
        self.recent.clear();
        self.repeats = 0;
    }
}

/// The ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    /// Centre position
    pub pos: Vec2,
    /// Direction of travel (radians, y down)
    angle: f32,
    /// Multiplier over `base_speed`
    pub speed_ratio: f32,
    pub radius: f32,
    pub base_speed: f32,
    pub is_moving: bool,
    pub is_active: bool,
    min_angle: f32,
    #[serde(skip)]
    oscillation: OscillationTracker,
    #[serde(skip)]
    hit_box: Rect,
    #[serde(skip)]
    hit_box_frame: Option<u64>,
}

impl Ball {
    pub fn new(radius: f32, base_speed: f32) -> Self {
        Self {
            pos: Vec2::ZERO,
            angle: PADDLE_BASE_ANGLE,
            speed_ratio: 1.0,
            radius,
            base_speed,
            is_moving: false,
            is_active: true,
            min_angle: MIN_ANGLE_FROM_HORIZONTAL,
            oscillation: OscillationTracker::default(),
            hit_box: Rect::ZERO,
            hit_box_frame: None,
        }
    }

    /// Ball with a custom minimum angle from horizontal, in (0, π/2)
    pub fn with_min_angle(radius: f32, base_speed: f32, min_angle: f32) -> Result<Self> {
        ensure!(
            min_angle > 0.0 && min_angle < FRAC_PI_2,
            "minimum angle from horizontal must be in (0, π/2), got {min_angle}"
        );
        let mut ball = Self::new(radius, base_speed);
        ball.min_angle = min_angle;
        ball.set_angle(ball.angle);
        Ok(ball)
    }

    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn min_angle(&self) -> f32 {
        self.min_angle
    }

    /// Assign the travel angle (always clamped away from horizontal)
    pub fn set_angle(&mut self, radians: f32) {
        self.angle = clamp_from_horizontal(radians, self.min_angle);
    }

    /// Unit direction of travel
    pub fn direction(&self) -> Vec2 {
        direction_from_angle(self.angle)
    }

    /// Current speed in pixels per second
    pub fn speed(&self) -> f32 {
        self.base_speed * self.speed_ratio
    }

    pub fn velocity(&self) -> Vec2 {
        self.direction() * self.speed()
    }

    /// Distance the ball would cover in `dt`
    pub fn travel_distance(&self, dt: f32) -> f32 {
        if !self.is_moving || dt <= 0.0 {
            return 0.0;
        }
        self.speed() * dt
    }

    /// Integrate position over `dt`
    pub fn update_position(&mut self, dt: f32) {
        if !self.is_moving || dt <= 0.0 {
            return;
        }
        self.pos += self.velocity() * dt;
    }

    /// Advance exactly `distance` along the current direction
    pub fn advance(&mut self, distance: f32) {
        self.pos += self.direction() * distance;
    }

    /// Mirror the travel angle off a struck face
    ///
    /// Only reflects when the ball is actually moving into the face, so a
    /// contact reported twice never flips the ball back inward.
    pub fn reflect_off(&mut self, face: CollisionFace) {
        let dir = self.direction();
        match face {
            CollisionFace::None => {}
            CollisionFace::Left if dir.x > 0.0 => self.set_angle(PI - self.angle),
            CollisionFace::Right if dir.x < 0.0 => self.set_angle(PI - self.angle),
            CollisionFace::Top if dir.y > 0.0 => self.set_angle(-self.angle),
            CollisionFace::Bottom if dir.y < 0.0 => self.set_angle(-self.angle),
            CollisionFace::Left | CollisionFace::Right | CollisionFace::Top | CollisionFace::Bottom => {}
        }
    }

    /// Put the ball in motion at the given angle
    pub fn launch(&mut self, angle: f32) {
        self.set_angle(angle);
        self.is_moving = true;
        self.oscillation.reset();
    }

    /// Halt the ball in place (serve, sticky paddle, life lost)
    pub fn stop(&mut self) {
        self.is_moving = false;
        self.oscillation.reset();
    }

    /// Feed the current angle to the unstick tracker after a bounce
    ///
    /// Returns true when a perturbation was applied.
    pub fn track_oscillation(&mut self, rng: &mut impl Rng) -> bool {
        if !self.is_moving {
            self.oscillation.reset();
            return false;
        }
        if !self.oscillation.record(self.angle) {
            return false;
        }

        let previous = self.angle;
        let magnitude = rng.random_range(UNSTICK_MIN_PERTURBATION..=UNSTICK_MAX_PERTURBATION);
        let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        self.set_angle(previous + sign * magnitude);
        // Clamp can swallow the nudge right at the threshold; go the other way
        if (self.angle - previous).abs() < OSCILLATION_TOLERANCE {
            self.set_angle(previous - sign * magnitude);
        }
        self.speed_ratio *= UNSTICK_SPEED_BOOST;
        self.oscillation.reset();

        log::debug!(
            "Ball unstuck: angle {:.3} -> {:.3}, speed ratio {:.3}",
            previous,
            self.angle,
            self.speed_ratio
        );
        true
    }

    pub fn oscillation(&self) -> &OscillationTracker {
        &self.oscillation
    }
}

impl Collidable for Ball {
    fn hit_box(&self) -> Rect {
        self.hit_box
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn update_state(&mut self, frame: u64) {
        if self.hit_box_frame != Some(frame) {
            self.hit_box = Rect::around_circle(self.pos, self.radius);
            self.hit_box_frame = Some(frame);
        }
    }
}
