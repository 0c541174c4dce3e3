//! Collision detection for the ball
//!
//! Two strategies behind one entry point: the swept raycast (default) and a
//! cheaper post-move rectangle overlap test. They follow the same rules but
//! don't produce identical trajectories: the raycast only knows the contact
//! point, so it pushes out by a fixed amount, while the overlap test pushes
//! out by the measured overlap.

use glam::Vec2;

use super::ball::Ball;
use super::geometry::{CollisionFace, Rect, classify_face_with_depth, intersects};
use super::raycast::{RaycastHit, TargetId, WallSide, cast_ball, cast_walls, resolve_hits};
use crate::consts::RAYCAST_PENETRATION;
use crate::settings::CollisionMode;

/// Something with a per-frame hit box
pub trait Collidable {
    /// Hit box computed by the last `update_state`
    fn hit_box(&self) -> Rect;
    fn is_active(&self) -> bool;
    /// Refresh cached state for `frame`; repeated calls within a frame are free
    fn update_state(&mut self, frame: u64);
}

/// A resolved contact ready for the response step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub target: TargetId,
    pub face: CollisionFace,
    /// Ball centre at contact
    pub point: Vec2,
    /// Outward normal of the struck face
    pub normal: Vec2,
    /// How far to push the ball back out along `normal`
    pub penetration: f32,
}

impl Contact {
    fn from_hit(hit: RaycastHit) -> Option<Self> {
        if !hit.collided {
            return None;
        }
        Some(Self {
            target: hit.target?,
            face: hit.face,
            point: hit.point,
            normal: hit.normal,
            penetration: RAYCAST_PENETRATION,
        })
    }
}

/// Moves the ball one frame and reports the first contact
#[derive(Debug, Clone, Copy)]
pub struct CollisionEngine {
    pub mode: CollisionMode,
    pub field_width: f32,
    pub field_height: f32,
}

impl CollisionEngine {
    pub fn new(mode: CollisionMode, field_width: f32, field_height: f32) -> Self {
        Self {
            mode,
            field_width,
            field_height,
        }
    }

    /// Advance the ball by `dt` and return the contact it made, if any
    ///
    /// In raycast mode the ball stops at the contact point; in overlap mode
    /// it moves the full distance and the contact describes the overlap.
    /// `targets` must be ordered bricks first, then the paddle.
    pub fn step_ball(&self, ball: &mut Ball, targets: &[(TargetId, Rect)], dt: f32) -> Option<Contact> {
        if !ball.is_moving || !ball.is_active || dt <= 0.0 {
            return None;
        }
        match self.mode {
            CollisionMode::Raycast => self.step_raycast(ball, targets, dt),
            CollisionMode::RectOverlap => self.step_overlap(ball, targets, dt),
        }
    }

    fn step_raycast(&self, ball: &mut Ball, targets: &[(TargetId, Rect)], dt: f32) -> Option<Contact> {
        let travel = ball.travel_distance(dt);
        let dir = ball.direction();

        let object = cast_ball(ball.pos, dir, travel, ball.radius, targets);
        let wall = cast_walls(
            ball.pos,
            dir,
            travel,
            ball.radius,
            self.field_width,
            self.field_height,
        );
        let hit = resolve_hits(object, wall);

        match Contact::from_hit(hit) {
            Some(contact) => {
                ball.pos = contact.point;
                Some(contact)
            }
            None => {
                ball.advance(travel);
                None
            }
        }
    }

    fn step_overlap(&self, ball: &mut Ball, targets: &[(TargetId, Rect)], dt: f32) -> Option<Contact> {
        ball.update_position(dt);
        let ball_rect = Rect::around_circle(ball.pos, ball.radius);

        for (id, rect) in targets {
            if let Some(overlap) = intersects(&ball_rect, rect) {
                let (face, depth) = classify_face_with_depth(&overlap, rect);
                if face == CollisionFace::None {
                    continue;
                }
                return Some(Contact {
                    target: *id,
                    face,
                    point: ball.pos,
                    normal: face.outward_normal(),
                    penetration: depth,
                });
            }
        }

        self.overlap_walls(ball)
    }

    fn overlap_walls(&self, ball: &Ball) -> Option<Contact> {
        let r = ball.radius;
        let p = ball.pos;
        let walls = [
            (WallSide::Left, CollisionFace::Right, r - p.x),
            (WallSide::Right, CollisionFace::Left, p.x + r - self.field_width),
            (WallSide::Top, CollisionFace::Bottom, r - p.y),
            (WallSide::Bottom, CollisionFace::Top, p.y + r - self.field_height),
        ];
        walls
            .into_iter()
            .find(|(_, _, depth)| *depth > 0.0)
            .map(|(side, face, depth)| Contact {
                target: TargetId::Wall(side),
                face,
                point: p,
                normal: face.outward_normal(),
                penetration: depth,
            })
    }
}

/// Collect hit boxes of active collidables, refreshing them for `frame`
pub fn gather_targets<'a, C, I>(items: I, frame: u64, out: &mut Vec<(TargetId, Rect)>)
where
    C: Collidable + 'a,
    I: IntoIterator<Item = (TargetId, &'a mut C)>,
{
    for (id, item) in items {
        if !item.is_active() {
            continue;
        }
        item.update_state(frame);
        out.push((id, item.hit_box()));
    }
}
