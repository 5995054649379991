//! Drawing helpers for scene entities
//!
//! Everything here draws in world space; the caller has already pushed the
//! camera transform.

use glam::Vec2;
use std::f32::consts::{PI, TAU};

use super::{Color, Surface, colors};
use crate::sim::collision::Rect;
use crate::sim::track::Track;

/// Interpolate color based on speed (slow=blue, medium=green, fast=red/orange)
pub fn speed_color(speed: f32, max_speed: f32, alpha: f32) -> Color {
    let t = if max_speed > 0.0 {
        (speed.abs() / max_speed).clamp(0.0, 1.0)
    } else {
        0.0
    };

    // Color gradient: blue (slow) -> cyan -> green -> yellow -> red (fast)
    let (r, g, b) = if t < 0.25 {
        let u = t / 0.25;
        (0.2, 0.4 + 0.4 * u, 1.0)
    } else if t < 0.5 {
        let u = (t - 0.25) / 0.25;
        (0.2, 0.8, 1.0 - 0.6 * u)
    } else if t < 0.75 {
        let u = (t - 0.5) / 0.25;
        (0.2 + 0.8 * u, 0.8, 0.4 - 0.2 * u)
    } else {
        let u = (t - 0.75) / 0.25;
        (1.0, 0.8 - 0.5 * u, 0.2)
    };

    [r, g, b, alpha]
}

pub fn fill_rect(surface: &mut dyn Surface, rect: &Rect, color: Color) {
    surface.set_fill_color(color);
    surface.fill_rect(rect.x, rect.y, rect.w, rect.h);
}

pub fn fill_circle(surface: &mut dyn Surface, center: Vec2, radius: f32, color: Color) {
    surface.set_fill_color(color);
    surface.begin_path();
    surface.arc(center.x, center.y, radius, 0.0, TAU);
    surface.fill();
}

/// Filled polygon from a point list (ignored below three points)
pub fn fill_polygon(surface: &mut dyn Surface, points: &[Vec2], color: Color) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    if rest.len() < 2 {
        return;
    }
    surface.set_fill_color(color);
    surface.begin_path();
    surface.move_to(first.x, first.y);
    for p in rest {
        surface.line_to(p.x, p.y);
    }
    surface.close_path();
    surface.fill();
}

/// Five-pointed star centered on `center`
pub fn star(surface: &mut dyn Surface, center: Vec2, radius: f32, spin: f32) {
    let points: Vec<Vec2> = (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { radius } else { radius * 0.45 };
            let a = spin - PI * 0.5 + i as f32 * PI / 5.0;
            center + Vec2::new(a.cos(), a.sin()) * r
        })
        .collect();
    fill_polygon(surface, &points, colors::STAR);
}

/// Side-on truck: body box, cab and two wheels, rotated about its center
pub fn side_truck(surface: &mut dyn Surface, center: Vec2, size: Vec2, rotation: f32, facing: f32, color: Color) {
    surface.save();
    surface.translate(center.x, center.y);
    if rotation != 0.0 {
        surface.rotate(rotation);
    }
    if facing < 0.0 {
        surface.scale(-1.0, 1.0);
    }

    let half = size * 0.5;
    let wheel_r = size.y * 0.3;
    surface.set_fill_color(color);
    surface.fill_rect(-half.x, -half.y * 0.4, size.x, size.y * 0.7 - wheel_r * 0.5);
    // Cab on the leading end
    surface.fill_rect(half.x * 0.1, -half.y, half.x * 0.7, half.y * 0.7);

    for x in [-half.x * 0.6, half.x * 0.6] {
        fill_circle(surface, Vec2::new(x, half.y - wheel_r), wheel_r, colors::WHEEL);
    }
    surface.restore();
}

/// Top-down truck: a rounded body pointing along `rotation`
pub fn top_truck(surface: &mut dyn Surface, center: Vec2, radius: f32, rotation: f32, color: Color) {
    surface.save();
    surface.translate(center.x, center.y);
    surface.rotate(rotation);

    surface.set_fill_color(colors::WHEEL);
    for (x, y) in [(-0.7, -0.8), (0.5, -0.8), (-0.7, 0.55), (0.5, 0.55)] {
        surface.fill_rect(x * radius, y * radius, radius * 0.45, radius * 0.25);
    }
    surface.set_fill_color(color);
    surface.fill_rect(-radius, -radius * 0.6, radius * 2.0, radius * 1.2);
    // Windshield marks the nose
    surface.set_fill_color(colors::TRACK_EDGE);
    surface.fill_rect(radius * 0.3, -radius * 0.45, radius * 0.3, radius * 0.9);
    surface.restore();
}

/// Ramp triangle; `facing_right` means it climbs toward +x
pub fn ramp(surface: &mut dyn Surface, x: f32, base_y: f32, width: f32, height: f32, facing_right: bool) {
    let peak_x = if facing_right { x + width } else { x };
    let points = [
        Vec2::new(x, base_y),
        Vec2::new(x + width, base_y),
        Vec2::new(peak_x, base_y - height),
    ];
    fill_polygon(surface, &points, colors::RAMP);
}

/// Track band: thick edge stroke, then the surface, then the start line
pub fn track(surface: &mut dyn Surface, track: &Track) {
    let waypoints = track.waypoints();
    let Some(first) = waypoints.first() else {
        return;
    };

    for (color, width) in [
        (colors::TRACK_EDGE, track.width() + 8.0),
        (colors::TRACK, track.width()),
    ] {
        surface.set_stroke(color, width);
        surface.begin_path();
        surface.move_to(first.x, first.y);
        for w in &waypoints[1..] {
            surface.line_to(w.x, w.y);
        }
        surface.close_path();
        surface.stroke();
    }

    // Joints, so corners aren't notched
    for w in waypoints {
        fill_circle(surface, *w, track.width() * 0.5, colors::TRACK);
    }

    let (a, b) = track.start_gate();
    surface.set_stroke(colors::START_LINE, 6.0);
    surface.begin_path();
    surface.move_to(a.x, a.y);
    surface.line_to(b.x, b.y);
    surface.stroke();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{DrawCommand, RecordingSurface};

    #[test]
    fn test_speed_color_ends() {
        let slow = speed_color(0.0, 100.0, 1.0);
        let fast = speed_color(100.0, 100.0, 0.5);
        assert_eq!(slow, [0.2, 0.4, 1.0, 1.0]);
        assert_eq!(fast[0], 1.0);
        assert_eq!(fast[3], 0.5);
        // Zero max speed is treated as stationary
        assert_eq!(speed_color(50.0, 0.0, 1.0), slow);
    }

    #[test]
    fn test_truck_drawing_is_balanced() {
        let mut surface = RecordingSurface::new();
        side_truck(&mut surface, Vec2::ZERO, Vec2::new(80.0, 40.0), 0.3, -1.0, colors::PLAYER);
        top_truck(&mut surface, Vec2::ZERO, 18.0, 1.0, colors::OPPONENT);
        assert!(surface.is_balanced());
        assert_eq!(surface.count(|c| matches!(c, DrawCommand::Rotate(_))), 2);
    }

    #[test]
    fn test_degenerate_polygon_draws_nothing() {
        let mut surface = RecordingSurface::new();
        fill_polygon(&mut surface, &[Vec2::ZERO, Vec2::X], colors::RAMP);
        assert!(surface.commands.is_empty());
    }

    #[test]
    fn test_star_has_ten_points() {
        let mut surface = RecordingSurface::new();
        star(&mut surface, Vec2::ZERO, 16.0, 0.0);
        assert_eq!(surface.count(|c| matches!(c, DrawCommand::LineTo(..))), 9);
        assert_eq!(surface.count(|c| matches!(c, DrawCommand::MoveTo(..))), 1);
    }
}
