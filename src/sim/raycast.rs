//! Swept collision test for the ball
//!
//! Instead of checking overlap after the ball has moved (which lets a fast
//! ball skip through a thin brick), cast rays along the ball's path for the
//! whole frame and report the nearest thing they hit. Targets are inflated
//! by the ball radius so each ray is a point-vs-rectangle slab test.

use glam::Vec2;

use super::geometry::{CollisionFace, Rect};
use super::pool::BrickHandle;
use crate::consts::{RAY_EPSILON, RAY_SIDE_OFFSET};

/// Anything the ball can bounce off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetId {
    Brick(BrickHandle),
    Paddle,
    Wall(WallSide),
}

/// The four field boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WallSide {
    Left,
    Right,
    Top,
    Bottom,
}

/// Result of a swept collision query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub collided: bool,
    /// Distance travelled along the ray before contact
    pub distance: f32,
    /// Ball centre at the moment of contact
    pub point: Vec2,
    /// Outward normal of the struck face
    pub normal: Vec2,
    pub target: Option<TargetId>,
    pub face: CollisionFace,
}

impl RaycastHit {
    pub fn none() -> Self {
        Self {
            collided: false,
            distance: f32::MAX,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            target: None,
            face: CollisionFace::None,
        }
    }

    /// Keep whichever of the two hits is nearer (ties keep `self`)
    pub fn nearer(self, other: RaycastHit) -> RaycastHit {
        if other.collided && (!self.collided || other.distance < self.distance) {
            other
        } else {
            self
        }
    }
}

/// Slab test of a single ray against an (already inflated) rectangle
///
/// Returns the entry distance and the face entered through. A ray starting
/// inside the rectangle reports nothing.
pub fn ray_vs_rect(origin: Vec2, dir: Vec2, max_distance: f32, rect: &Rect) -> Option<(f32, CollisionFace)> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;
    let mut face = CollisionFace::None;

    // X slab
    if dir.x.abs() < RAY_EPSILON {
        if origin.x <= rect.left() || origin.x >= rect.right() {
            return None;
        }
    } else {
        let t1 = (rect.left() - origin.x) / dir.x;
        let t2 = (rect.right() - origin.x) / dir.x;
        let (t_min, t_max) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
        if t_min > t_near {
            t_near = t_min;
            face = if dir.x > 0.0 {
                CollisionFace::Left
            } else {
                CollisionFace::Right
            };
        }
        t_far = t_far.min(t_max);
    }

    // Y slab
    if dir.y.abs() < RAY_EPSILON {
        if origin.y <= rect.top() || origin.y >= rect.bottom() {
            return None;
        }
    } else {
        let t1 = (rect.top() - origin.y) / dir.y;
        let t2 = (rect.bottom() - origin.y) / dir.y;
        let (t_min, t_max) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
        if t_min > t_near {
            t_near = t_min;
            face = if dir.y > 0.0 {
                CollisionFace::Top
            } else {
                CollisionFace::Bottom
            };
        }
        t_far = t_far.min(t_max);
    }

    if t_near > t_far || t_far < 0.0 {
        return None;
    }
    // Origin already inside: don't keep re-detecting the same target
    if t_near < 0.0 {
        return None;
    }
    if t_near > max_distance || face == CollisionFace::None {
        return None;
    }
    Some((t_near, face))
}

/// Sweep the ball (three parallel rays) against every target
///
/// `targets` carry the hit rectangle already computed for this frame.
pub fn cast_ball(
    center: Vec2,
    dir: Vec2,
    max_distance: f32,
    radius: f32,
    targets: &[(TargetId, Rect)],
) -> RaycastHit {
    if dir.length_squared() < RAY_EPSILON || max_distance <= 0.0 || !max_distance.is_finite() {
        return RaycastHit::none();
    }
    let dir = dir.normalize();
    let perp = Vec2::new(-dir.y, dir.x) * (radius * RAY_SIDE_OFFSET);

    let mut best = RaycastHit::none();
    for origin in [center, center + perp, center - perp] {
        for (id, rect) in targets {
            let expanded = rect.inflate(radius);
            if let Some((t, face)) = ray_vs_rect(origin, dir, max_distance, &expanded) {
                best = best.nearer(RaycastHit {
                    collided: true,
                    distance: t,
                    point: center + dir * t,
                    normal: face.outward_normal(),
                    target: Some(*id),
                    face,
                });
            }
        }
    }
    best
}

/// Distance to whichever field boundary the ball is heading for
///
/// Only walls in the direction of travel are considered. Faces name the
/// wall's side: a ball moving up strikes the bottom face of the top wall.
pub fn cast_walls(
    center: Vec2,
    dir: Vec2,
    max_distance: f32,
    radius: f32,
    field_width: f32,
    field_height: f32,
) -> RaycastHit {
    if dir.length_squared() < RAY_EPSILON || max_distance <= 0.0 || !max_distance.is_finite() {
        return RaycastHit::none();
    }
    let dir = dir.normalize();

    let mut candidates: [Option<(f32, WallSide, CollisionFace)>; 2] = [None, None];
    if dir.x > RAY_EPSILON {
        let remaining = field_width - radius - center.x;
        candidates[0] = Some((remaining / dir.x, WallSide::Right, CollisionFace::Left));
    } else if dir.x < -RAY_EPSILON {
        let remaining = center.x - radius;
        candidates[0] = Some((remaining / -dir.x, WallSide::Left, CollisionFace::Right));
    }
    if dir.y < -RAY_EPSILON {
        let remaining = center.y - radius;
        candidates[1] = Some((remaining / -dir.y, WallSide::Top, CollisionFace::Bottom));
    } else if dir.y > RAY_EPSILON {
        let remaining = field_height - radius - center.y;
        candidates[1] = Some((remaining / dir.y, WallSide::Bottom, CollisionFace::Top));
    }

    let mut best = RaycastHit::none();
    for (t, side, face) in candidates.into_iter().flatten() {
        // Already past the edge: bounce immediately
        let t = t.max(0.0);
        if t > max_distance {
            continue;
        }
        best = best.nearer(RaycastHit {
            collided: true,
            distance: t,
            point: center + dir * t,
            normal: face.outward_normal(),
            target: Some(TargetId::Wall(side)),
            face,
        });
    }
    best
}

/// Pick between an object hit and a wall hit; ties go to the wall
pub fn resolve_hits(object: RaycastHit, wall: RaycastHit) -> RaycastHit {
    match (object.collided, wall.collided) {
        (false, _) => wall,
        (true, false) => object,
        (true, true) => {
            if wall.distance <= object.distance {
                wall
            } else {
                object
            }
        }
    }
}
