//! The paddle and its bounce response
//!
//! Rebound angle depends on where the ball struck the paddle and whether the
//! paddle is being driven left or right at the time, not on the ball's
//! incoming angle.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use super::collision::Collidable;
use super::geometry::Rect;
use crate::consts::*;

/// Abstract movement command for the paddle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveIntent {
    Left,
    Right,
    Stop,
}

/// Paddle power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Powerup {
    /// Ball sticks to the paddle until fired
    Sticky,
    Enlarge,
    Shrink,
}

impl Powerup {
    pub fn width_factor(self) -> f32 {
        match self {
            Powerup::Sticky => 1.0,
            Powerup::Enlarge => ENLARGE_FACTOR,
            Powerup::Shrink => SHRINK_FACTOR,
        }
    }
}

/// A power-up currently held by the paddle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivePowerup {
    pub kind: Powerup,
    /// Seconds left before it wears off
    pub remaining: f32,
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    /// Horizontal centre
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub base_width: f32,
    pub height: f32,
    /// Pixels per second while a movement intent is held
    pub speed: f32,
    pub moving_left: bool,
    pub moving_right: bool,
    pub powerup: Option<ActivePowerup>,
    #[serde(skip)]
    hit_box: Rect,
    #[serde(skip)]
    hit_box_frame: Option<u64>,
}

impl Paddle {
    /// Paddle centred near the bottom of the field
    pub fn new(field_width: f32, field_height: f32, width: f32, speed: f32) -> Self {
        Self {
            x: field_width / 2.0,
            y: field_height - PADDLE_BOTTOM_OFFSET,
            width,
            base_width: width,
            height: PADDLE_HEIGHT,
            speed,
            moving_left: false,
            moving_right: false,
            powerup: None,
            hit_box: Rect::ZERO,
            hit_box_frame: None,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x - self.width / 2.0, self.y, self.width, self.height)
    }

    pub fn set_intent(&mut self, intent: MoveIntent) {
        match intent {
            MoveIntent::Left => {
                self.moving_left = true;
                self.moving_right = false;
            }
            MoveIntent::Right => {
                self.moving_left = false;
                self.moving_right = true;
            }
            MoveIntent::Stop => {
                self.moving_left = false;
                self.moving_right = false;
            }
        }
    }

    /// -1, 0 or 1 from the held movement flags
    pub fn velocity_sign(&self) -> f32 {
        match (self.moving_left, self.moving_right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    /// Horizontal velocity in pixels per second
    pub fn velocity(&self) -> f32 {
        self.velocity_sign() * self.speed
    }

    pub fn is_sticky(&self) -> bool {
        matches!(self.powerup, Some(ActivePowerup { kind: Powerup::Sticky, .. }))
    }

    /// Hit position relative to the centre: -1 at the left edge, +1 at the right
    pub fn hit_offset(&self, ball_x: f32) -> f32 {
        if self.width <= 0.0 {
            return 0.0;
        }
        ((ball_x - self.x) / (self.width / 2.0)).clamp(-1.0, 1.0)
    }

    /// Move according to the held intent, staying inside the field
    ///
    /// Returns the power-up that expired during this step, if any.
    pub fn update(&mut self, dt: f32, field_width: f32) -> Option<Powerup> {
        if dt > 0.0 {
            self.x += self.velocity() * dt;
        }
        self.clamp_to_field(field_width);

        let active = self.powerup.as_mut()?;
        active.remaining -= dt.max(0.0);
        if active.remaining > 0.0 {
            return None;
        }
        let expired = active.kind;
        self.powerup = None;
        self.width = self.base_width;
        self.clamp_to_field(field_width);
        Some(expired)
    }

    /// Grant a power-up, replacing whatever was active
    pub fn apply_powerup(&mut self, kind: Powerup, field_width: f32) {
        self.powerup = Some(ActivePowerup {
            kind,
            remaining: POWERUP_DURATION,
        });
        self.width = self.base_width * kind.width_factor();
        self.clamp_to_field(field_width);
    }

    pub fn clear_powerup(&mut self) {
        self.powerup = None;
        self.width = self.base_width;
    }

    fn clamp_to_field(&mut self, field_width: f32) {
        let half = self.width / 2.0;
        self.x = self.x.clamp(half, (field_width - half).max(half));
    }
}

impl Collidable for Paddle {
    fn hit_box(&self) -> Rect {
        self.hit_box
    }

    fn is_active(&self) -> bool {
        true
    }

    fn update_state(&mut self, frame: u64) {
        if self.hit_box_frame != Some(frame) {
            self.hit_box = self.rect();
            self.hit_box_frame = Some(frame);
        }
    }
}

/// What happens to a ball striking the paddle's top face
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaddleResponse {
    Bounce { angle: f32, speed_ratio: f32 },
    /// Sticky paddle: the ball rides along at this hit offset
    Stick { offset: f32 },
}

/// Launch angle off a stationary paddle
///
/// A power curve on the hit offset, so the edges deflect much more than
/// the middle. Dead centre gives the base launch angle.
pub fn stationary_angle(offset: f32) -> f32 {
    let offset = offset.clamp(-1.0, 1.0);
    let curve = offset.signum() * offset.abs().powf(PADDLE_OFFSET_EXPONENT);
    PADDLE_BASE_ANGLE + curve * PADDLE_STATIONARY_RANGE
}

/// Launch angle off a moving paddle
///
/// `velocity` is the paddle's normalized velocity in [-1, 1]. The half of
/// the paddle that was struck picks a right-leaning or left-leaning steep
/// angle; velocity and offset then push it around additively.
pub fn moving_angle(offset: f32, velocity: f32) -> f32 {
    let offset = offset.clamp(-1.0, 1.0);
    let velocity = velocity.clamp(-1.0, 1.0);
    let deflection = velocity * PADDLE_VELOCITY_DEFLECTION + offset * PADDLE_OFFSET_DEFLECTION;

    let steep = if offset >= 0.0 {
        PADDLE_BASE_ANGLE
    } else {
        -PI - PADDLE_BASE_ANGLE
    };
    steep + deflection
}

/// Speed ratio after a paddle bounce leaving at `angle`
///
/// Flatter bounces gain more speed. The cap only limits growth: a ball
/// already above it keeps its speed.
pub fn boosted_speed_ratio(speed_ratio: f32, angle: f32, velocity: f32) -> f32 {
    let horizontality = angle.cos().abs();
    let factor = PADDLE_SPEED_BOOST * (1.0 + PADDLE_HORIZONTAL_BONUS * horizontality)
        + PADDLE_MOTION_BONUS * velocity.abs().min(1.0);
    let cap = PADDLE_SPEED_CAP_BASE + PADDLE_SPEED_CAP_HORIZONTAL * horizontality;

    if speed_ratio >= cap {
        speed_ratio
    } else {
        (speed_ratio * factor).min(cap)
    }
}

/// Compute the rebound for a ball at `ball_x` striking the paddle
pub fn respond(paddle: &Paddle, ball_x: f32, speed_ratio: f32) -> PaddleResponse {
    let offset = paddle.hit_offset(ball_x);
    if paddle.is_sticky() {
        return PaddleResponse::Stick { offset };
    }

    let velocity = paddle.velocity_sign();
    let angle = if velocity != 0.0 {
        moving_angle(offset, velocity)
    } else {
        stationary_angle(offset)
    };

    PaddleResponse::Bounce {
        angle,
        speed_ratio: boosted_speed_ratio(speed_ratio, angle, velocity),
    }
}
