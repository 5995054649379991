//! Race course: a closed waypoint polyline with a width and a lap count
//!
//! Waypoint 0 is the start/finish line and should sit on a straight.
//! Segment `i` runs from waypoint `i` to waypoint `i + 1` (wrapping), so a
//! track with N waypoints has N segments.

use glam::Vec2;

use super::collision::{Rect, closest_point_on_segment, segments_intersect};
use super::vector::VecExt;
use crate::error::LevelError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
    pub length: f32,
}

impl Segment {
    pub fn direction(&self) -> Vec2 {
        (self.end - self.start).safe_normalize()
    }

    /// Projected progress of `p` along the segment (0 at start, 1 at end, unclamped)
    pub fn progress(&self, p: Vec2) -> f32 {
        let ab = self.end - self.start;
        let len_sq = ab.length_squared();
        if len_sq <= 0.0 {
            return 1.0;
        }
        (p - self.start).dot(ab) / len_sq
    }
}

/// Nearest point on the polyline to some query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackProjection {
    pub segment: usize,
    pub point: Vec2,
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub struct Track {
    waypoints: Vec<Vec2>,
    width: f32,
    laps: u32,
    segments: Vec<Segment>,
    total_length: f32,
    bounds: Rect,
    gate: (Vec2, Vec2),
    start_direction: Vec2,
}

impl Track {
    pub fn new(waypoints: Vec<Vec2>, width: f32, laps: u32) -> Result<Self, LevelError> {
        if waypoints.len() < 2 {
            return Err(LevelError::TooFewWaypoints(waypoints.len()));
        }
        if width <= 0.0 || !width.is_finite() {
            return Err(LevelError::InvalidTrackWidth(width));
        }
        if laps == 0 {
            return Err(LevelError::NoLaps);
        }
        if waypoints.iter().any(|w| !w.is_finite()) {
            return Err(LevelError::NonFinite("waypoint"));
        }

        let n = waypoints.len();
        let segments: Vec<Segment> = (0..n)
            .map(|i| {
                let start = waypoints[i];
                let end = waypoints[(i + 1) % n];
                Segment {
                    start,
                    end,
                    length: start.distance(end),
                }
            })
            .collect();
        let total_length = segments.iter().map(|s| s.length).sum();

        let mut min = waypoints[0];
        let mut max = waypoints[0];
        for w in &waypoints {
            min = min.min(*w);
            max = max.max(*w);
        }
        let half = width * 0.5;
        let bounds = Rect::from_pos_size(min - Vec2::splat(half), max - min + Vec2::splat(width));

        let start_direction = match segments[0].direction() {
            d if d == Vec2::ZERO => Vec2::X,
            d => d,
        };
        let across = start_direction.perp_ccw() * half;
        let gate = (waypoints[0] - across, waypoints[0] + across);

        Ok(Self {
            waypoints,
            width,
            laps,
            segments,
            total_length,
            bounds,
            gate,
            start_direction,
        })
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn laps(&self) -> u32 {
        self.laps
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> &Segment {
        &self.segments[index % self.segments.len()]
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    /// Bounding box of the course including its width
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Start/finish gate: a segment across the track at waypoint 0
    pub fn start_gate(&self) -> (Vec2, Vec2) {
        self.gate
    }

    pub fn start_direction(&self) -> Vec2 {
        self.start_direction
    }

    #[inline]
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.waypoints.len()
    }

    pub fn project(&self, p: Vec2) -> TrackProjection {
        let mut best = TrackProjection {
            segment: 0,
            point: self.waypoints[0],
            distance: f32::INFINITY,
        };
        for (i, seg) in self.segments.iter().enumerate() {
            let point = closest_point_on_segment(p, seg.start, seg.end);
            let distance = p.distance(point);
            if distance < best.distance {
                best = TrackProjection {
                    segment: i,
                    point,
                    distance,
                };
            }
        }
        best
    }

    /// Perpendicular distance from the centerline
    pub fn distance_from_track(&self, p: Vec2) -> f32 {
        self.project(p).distance
    }

    /// Inside the drivable band, with `margin` of slack taken off each edge
    pub fn is_on_track(&self, p: Vec2, margin: f32) -> bool {
        self.distance_from_track(p) <= self.width * 0.5 - margin
    }

    pub fn nearest_waypoint(&self, p: Vec2) -> usize {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (i, w) in self.waypoints.iter().enumerate() {
            let d = p.distance_squared(*w);
            if d < best_dist {
                best = i;
                best_dist = d;
            }
        }
        best
    }

    /// Movement `from` → `to` crosses the start/finish gate heading forward
    pub fn crosses_start_gate(&self, from: Vec2, to: Vec2) -> bool {
        let movement = to - from;
        movement.dot(self.start_direction) > 0.0
            && segments_intersect(from, to, self.gate.0, self.gate.1)
    }

    /// Starting grid behind the line, two abreast: (position, heading)
    pub fn grid_positions(&self, count: usize, spacing: f32) -> Vec<(Vec2, f32)> {
        let dir = self.start_direction;
        let side = dir.perp_ccw();
        let heading = dir.angle();
        let lane = (self.width * 0.25).min(spacing);
        (0..count)
            .map(|i| {
                let row = (i / 2) as f32 + 1.0;
                let offset = if i % 2 == 0 { -lane } else { lane };
                (self.waypoints[0] - dir * row * spacing + side * offset, heading)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Track {
        Track::new(
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1000.0, 0.0),
                Vec2::new(1000.0, 1000.0),
                Vec2::new(0.0, 1000.0),
            ],
            120.0,
            3,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(
            Track::new(vec![Vec2::ZERO], 100.0, 1),
            Err(LevelError::TooFewWaypoints(1))
        ));
        assert!(matches!(
            Track::new(vec![Vec2::ZERO, Vec2::X], 0.0, 1),
            Err(LevelError::InvalidTrackWidth(_))
        ));
        assert!(matches!(
            Track::new(vec![Vec2::ZERO, Vec2::X], 10.0, 0),
            Err(LevelError::NoLaps)
        ));
        assert!(Track::new(vec![Vec2::ZERO, Vec2::new(f32::NAN, 0.0)], 10.0, 1).is_err());
    }

    #[test]
    fn test_derived_geometry() {
        let t = square();
        assert_eq!(t.segments().len(), 4);
        assert!((t.total_length() - 4000.0).abs() < 1e-3);
        assert_eq!(t.bounds(), Rect::new(-60.0, -60.0, 1120.0, 1120.0));
        assert_eq!(t.start_direction(), Vec2::X);
        let (a, b) = t.start_gate();
        assert_eq!(a, Vec2::new(0.0, -60.0));
        assert_eq!(b, Vec2::new(0.0, 60.0));
    }

    #[test]
    fn test_distance_and_on_track() {
        let t = square();
        assert!((t.distance_from_track(Vec2::new(500.0, 30.0)) - 30.0).abs() < 1e-4);
        assert!(t.is_on_track(Vec2::new(500.0, 30.0), 10.0));
        assert!(!t.is_on_track(Vec2::new(500.0, 55.0), 10.0));
        assert_eq!(t.project(Vec2::new(1030.0, 400.0)).segment, 1);
        assert_eq!(t.nearest_waypoint(Vec2::new(900.0, 950.0)), 2);
    }

    #[test]
    fn test_gate_crossing_direction() {
        let t = square();
        assert!(t.crosses_start_gate(Vec2::new(-5.0, 10.0), Vec2::new(5.0, 10.0)));
        // Reversing over the line does not count
        assert!(!t.crosses_start_gate(Vec2::new(5.0, 10.0), Vec2::new(-5.0, 10.0)));
        // Outside the gate width
        assert!(!t.crosses_start_gate(Vec2::new(-5.0, 200.0), Vec2::new(5.0, 200.0)));
    }

    #[test]
    fn test_segment_progress() {
        let t = square();
        let seg = t.segment(0);
        assert!((seg.progress(Vec2::new(700.0, 40.0)) - 0.7).abs() < 1e-6);
        assert!(seg.progress(Vec2::new(-100.0, 0.0)) < 0.0);
    }

    #[test]
    fn test_grid_is_behind_line() {
        // Start line in the middle of the top straight
        let t = Track::new(
            vec![
                Vec2::new(500.0, 0.0),
                Vec2::new(1000.0, 0.0),
                Vec2::new(1000.0, 1000.0),
                Vec2::new(0.0, 1000.0),
                Vec2::new(0.0, 0.0),
            ],
            120.0,
            3,
        )
        .unwrap();
        let grid = t.grid_positions(4, 50.0);
        assert_eq!(grid.len(), 4);
        for (pos, heading) in grid {
            assert!(pos.x < 500.0);
            assert!(t.is_on_track(pos, 0.0));
            assert_eq!(heading, 0.0);
        }
    }

    #[test]
    fn test_two_waypoint_track() {
        let t = Track::new(vec![Vec2::ZERO, Vec2::new(500.0, 0.0)], 80.0, 1).unwrap();
        assert_eq!(t.segments().len(), 2);
        assert_eq!(t.next_index(1), 0);
        assert_eq!(t.segment(1).direction(), Vec2::NEG_X);
    }
}
