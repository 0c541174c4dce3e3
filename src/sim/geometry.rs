//! Axis-aligned rectangle helpers
//!
//! Overlap computation and collision-face classification shared by both
//! collision strategies. Coordinates are screen-style: `y` grows downward,
//! so a rectangle's "top" is its smallest `y`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect { x: 0.0, y: 0.0, w: 0.0, h: 0.0 };

    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Square bounding box of a circle
    pub fn around_circle(center: Vec2, radius: f32) -> Self {
        Self::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0)
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Grow the rectangle by `amount` on every side
    pub fn inflate(&self, amount: f32) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.w + amount * 2.0,
            self.h + amount * 2.0,
        )
    }
}

/// Which edge of a target was struck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollisionFace {
    #[default]
    None,
    Top,
    Bottom,
    Left,
    Right,
}

impl CollisionFace {
    /// Unit normal pointing out of the struck face
    pub fn outward_normal(self) -> Vec2 {
        match self {
            CollisionFace::None => Vec2::ZERO,
            CollisionFace::Top => Vec2::new(0.0, -1.0),
            CollisionFace::Bottom => Vec2::new(0.0, 1.0),
            CollisionFace::Left => Vec2::new(-1.0, 0.0),
            CollisionFace::Right => Vec2::new(1.0, 0.0),
        }
    }
}

/// Overlap of `source` with `target`, expressed relative to the target's
/// top-left corner. Touching edges do not count as overlap.
pub fn intersects(source: &Rect, target: &Rect) -> Option<Rect> {
    let left = source.left().max(target.left());
    let right = source.right().min(target.right());
    let top = source.top().max(target.top());
    let bottom = source.bottom().min(target.bottom());

    if right <= left || bottom <= top {
        return None;
    }

    Some(Rect::new(
        left - target.x,
        top - target.y,
        right - left,
        bottom - top,
    ))
}

/// Penetration depth through each edge of `target` for a target-local overlap
///
/// Order matches the tie-break priority: left, right, top, bottom.
pub fn edge_penetrations(overlap: &Rect, target: &Rect) -> [(CollisionFace, f32); 4] {
    [
        (CollisionFace::Left, overlap.right()),
        (CollisionFace::Right, target.w - overlap.left()),
        (CollisionFace::Top, overlap.bottom()),
        (CollisionFace::Bottom, target.h - overlap.top()),
    ]
}

/// Face of minimum penetration, with its depth
///
/// Equal depths resolve in the order Left, Right, Top, Bottom.
pub fn classify_face_with_depth(overlap: &Rect, target: &Rect) -> (CollisionFace, f32) {
    if overlap.is_empty() {
        return (CollisionFace::None, 0.0);
    }

    let mut best = (CollisionFace::None, f32::MAX);
    for (face, depth) in edge_penetrations(overlap, target) {
        // strict `<` keeps the earlier face on ties
        if depth < best.1 {
            best = (face, depth);
        }
    }
    best
}

/// Face of minimum penetration
pub fn classify_face(overlap: &Rect, target: &Rect) -> CollisionFace {
    classify_face_with_depth(overlap, target).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn target() -> Rect {
        Rect::new(100.0, 100.0, 60.0, 20.0)
    }

    #[test]
    fn test_intersects_local_space() {
        let source = Rect::new(90.0, 105.0, 16.0, 16.0);
        let overlap = intersects(&source, &target()).unwrap();
        assert_eq!(overlap, Rect::new(0.0, 5.0, 6.0, 15.0));
    }

    #[test]
    fn test_intersects_disjoint_and_touching() {
        assert!(intersects(&Rect::new(0.0, 0.0, 10.0, 10.0), &target()).is_none());
        // Touching the left edge exactly
        assert!(intersects(&Rect::new(84.0, 100.0, 16.0, 16.0), &target()).is_none());
    }

    #[test]
    fn test_classify_each_face() {
        let t = target();
        let cases = [
            (Rect::new(86.0, 102.0, 16.0, 16.0), CollisionFace::Left),
            (Rect::new(158.0, 102.0, 16.0, 16.0), CollisionFace::Right),
            (Rect::new(120.0, 86.0, 16.0, 16.0), CollisionFace::Top),
            (Rect::new(120.0, 117.0, 16.0, 16.0), CollisionFace::Bottom),
        ];
        for (source, expected) in cases {
            let overlap = intersects(&source, &t).unwrap();
            assert_eq!(classify_face(&overlap, &t), expected, "source {source:?}");
        }
    }

    #[test]
    fn test_tie_prefers_left_then_top() {
        // Square target, corner overlap of equal depth on left and top
        let t = Rect::new(0.0, 0.0, 40.0, 40.0);
        let overlap = Rect::new(0.0, 0.0, 4.0, 4.0);
        assert_eq!(classify_face(&overlap, &t), CollisionFace::Left);

        // Equal top and bottom, left/right deeper
        let overlap = Rect::new(0.0, 10.0, 40.0, 20.0);
        let t = Rect::new(0.0, 0.0, 40.0, 40.0);
        assert_eq!(classify_face(&overlap, &t), CollisionFace::Top);
    }

    #[test]
    fn test_empty_overlap_is_none() {
        assert_eq!(classify_face(&Rect::ZERO, &target()), CollisionFace::None);
    }

    proptest! {
        #[test]
        fn prop_face_is_minimum_penetration(
            sx in 40.0f32..220.0,
            sy in 40.0f32..180.0,
            sw in 2.0f32..80.0,
            sh in 2.0f32..80.0,
        ) {
            let t = target();
            let source = Rect::new(sx, sy, sw, sh);
            if let Some(overlap) = intersects(&source, &t) {
                let (face, depth) = classify_face_with_depth(&overlap, &t);
                let min = edge_penetrations(&overlap, &t)
                    .iter()
                    .map(|(_, d)| *d)
                    .fold(f32::MAX, f32::min);
                prop_assert!(face != CollisionFace::None);
                prop_assert_eq!(depth, min);
            }
        }
    }
}
