//! Collision detection for rectangles and circles
//!
//! Everything here is pure and stateless. Normals point from `b` toward `a`,
//! i.e. along the direction `a` has to move to separate, and `overlap` is the
//! length of that minimum translation vector. Degenerate geometry (coincident
//! centers, a circle center inside a rectangle) takes a fixed fallback branch
//! so results are never NaN.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::vector::EPSILON;

/// Axis-aligned rectangle, `pos` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::from_pos_size(center - size * 0.5, size)
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

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Strict overlap test, touching edges do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        check_aabb(self, other)
    }

    /// Grow on every side by `margin`
    pub fn expand(&self, margin: f32) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.w + margin * 2.0,
            self.h + margin * 2.0,
        )
    }

    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.left(), self.right()),
            p.y.clamp(self.top(), self.bottom()),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub const fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Result of a collision check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Whether the shapes overlap
    pub collided: bool,
    /// Penetration depth along `normal`
    pub overlap: f32,
    /// Unit separation direction for the first shape
    pub normal: Vec2,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            collided: false,
            overlap: 0.0,
            normal: Vec2::ZERO,
        }
    }

    fn hit(overlap: f32, normal: Vec2) -> Self {
        Self {
            collided: true,
            overlap,
            normal,
        }
    }

    /// Minimum translation vector for the first shape
    #[inline]
    pub fn mtv(&self) -> Vec2 {
        self.normal * self.overlap
    }
}

/// Fast boolean AABB overlap
#[inline]
pub fn check_aabb(a: &Rect, b: &Rect) -> bool {
    a.left() < b.right() && a.right() > b.left() && a.top() < b.bottom() && a.bottom() > b.top()
}

/// AABB overlap with the minimum translation vector for `a`.
///
/// The separation axis is the one with the smaller overlap; equal overlaps
/// resolve horizontally.
pub fn check_aabb_detailed(a: &Rect, b: &Rect) -> CollisionResult {
    if !check_aabb(a, b) {
        return CollisionResult::miss();
    }

    // Penetration depth each way; the shallower side wins per axis
    let (push_left, push_right) = (a.right() - b.left(), b.right() - a.left());
    let (push_up, push_down) = (a.bottom() - b.top(), b.bottom() - a.top());
    let (overlap_x, nx) = if push_left <= push_right {
        (push_left, -1.0)
    } else {
        (push_right, 1.0)
    };
    let (overlap_y, ny) = if push_up <= push_down {
        (push_up, -1.0)
    } else {
        (push_down, 1.0)
    };

    if overlap_x <= overlap_y {
        CollisionResult::hit(overlap_x, Vec2::new(nx, 0.0))
    } else {
        CollisionResult::hit(overlap_y, Vec2::new(0.0, ny))
    }
}

#[inline]
pub fn check_circle(a: &Circle, b: &Circle) -> bool {
    let r = a.radius + b.radius;
    a.center.distance_squared(b.center) < r * r
}

/// Circle overlap; coincident centers separate along +x
pub fn check_circle_detailed(a: &Circle, b: &Circle) -> CollisionResult {
    if !check_circle(a, b) {
        return CollisionResult::miss();
    }

    let delta = a.center - b.center;
    let dist = delta.length();
    let overlap = a.radius + b.radius - dist;

    if dist < EPSILON {
        return CollisionResult::hit(overlap, Vec2::X);
    }
    CollisionResult::hit(overlap, delta / dist)
}

#[inline]
pub fn check_circle_aabb(circle: &Circle, rect: &Rect) -> bool {
    let closest = rect.clamp_point(circle.center);
    circle.center.distance_squared(closest) < circle.radius * circle.radius
}

/// Circle against rectangle, normal pushes the circle out.
///
/// A center inside the rectangle exits through the nearest edge; ties go to
/// left, then right, then top, then bottom.
pub fn check_circle_aabb_detailed(circle: &Circle, rect: &Rect) -> CollisionResult {
    let c = circle.center;
    let closest = rect.clamp_point(c);
    let delta = c - closest;
    let dist_sq = delta.length_squared();

    if dist_sq < EPSILON * EPSILON {
        // Center is inside (or on the border of) the rectangle
        let edges = [
            (c.x - rect.left(), Vec2::NEG_X),
            (rect.right() - c.x, Vec2::X),
            (c.y - rect.top(), Vec2::NEG_Y),
            (rect.bottom() - c.y, Vec2::Y),
        ];
        let mut best = edges[0];
        for edge in &edges[1..] {
            if edge.0 < best.0 {
                best = *edge;
            }
        }
        return CollisionResult::hit(best.0 + circle.radius, best.1);
    }

    if dist_sq >= circle.radius * circle.radius {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    CollisionResult::hit(circle.radius - dist, delta / dist)
}

/// Closest point to `p` on segment `a`-`b` (returns `a` for a zero-length segment)
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

#[inline]
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    p.distance(closest_point_on_segment(p, a, b))
}

/// Proper or touching intersection of segments `p1`-`p2` and `q1`-`q2`.
///
/// Collinear overlapping segments count as intersecting.
pub fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let d1 = cross(q2 - q1, p1 - q1);
    let d2 = cross(q2 - q1, p2 - q1);
    let d3 = cross(p2 - p1, q1 - p1);
    let d4 = cross(p2 - p1, q2 - p1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

#[inline]
fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

#[inline]
fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}
