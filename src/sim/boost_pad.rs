//! Boost pads with a per-truck cooldown

use std::collections::HashMap;

use glam::Vec2;

use super::collision::{Circle, Rect, check_circle_aabb};
use super::truck::TruckId;

#[derive(Debug, Clone)]
pub struct BoostPad {
    pub id: u32,
    pub rect: Rect,
    pub cooldown: f32,
    /// Seconds until each truck may use this pad again; entries are removed at zero
    cooldowns: HashMap<TruckId, f32>,
}

impl BoostPad {
    pub fn new(id: u32, rect: Rect, cooldown: f32) -> Self {
        Self {
            id,
            rect,
            cooldown: cooldown.max(0.0),
            cooldowns: HashMap::new(),
        }
    }

    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        for remaining in self.cooldowns.values_mut() {
            *remaining = (*remaining - dt).max(0.0);
        }
        self.cooldowns.retain(|_, remaining| *remaining > 0.0);
    }

    /// Trigger the pad for `truck`. False while that truck is cooling down.
    pub fn try_activate(&mut self, truck: TruckId) -> bool {
        if self.is_cooling_down(truck) {
            return false;
        }
        if self.cooldown > 0.0 {
            self.cooldowns.insert(truck, self.cooldown);
        }
        true
    }

    pub fn is_cooling_down(&self, truck: TruckId) -> bool {
        self.cooldowns.get(&truck).is_some_and(|r| *r > 0.0)
    }

    pub fn remaining_cooldown(&self, truck: TruckId) -> f32 {
        self.cooldowns.get(&truck).copied().unwrap_or(0.0)
    }

    pub fn overlaps(&self, center: Vec2, radius: f32) -> bool {
        check_circle_aabb(&Circle::new(center, radius), &self.rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_cycle() {
        let mut pad = BoostPad::new(1, Rect::new(0.0, 0.0, 40.0, 40.0), 2.0);
        assert!(pad.try_activate(7));
        assert!(!pad.try_activate(7));

        for _ in 0..3 {
            pad.update(0.5);
            assert!(!pad.try_activate(7));
        }
        pad.update(0.5);
        assert!(pad.try_activate(7));
    }

    #[test]
    fn test_cooldowns_are_per_truck() {
        let mut pad = BoostPad::new(1, Rect::new(0.0, 0.0, 40.0, 40.0), 2.0);
        assert!(pad.try_activate(1));
        assert!(pad.try_activate(2));
        assert!(!pad.try_activate(1));
        assert!(pad.is_cooling_down(2));
        assert!(!pad.is_cooling_down(3));
    }

    #[test]
    fn test_cooldown_never_negative() {
        let mut pad = BoostPad::new(1, Rect::new(0.0, 0.0, 40.0, 40.0), 1.0);
        pad.try_activate(4);
        pad.update(0.7);
        assert!((pad.remaining_cooldown(4) - 0.3).abs() < 1e-6);
        pad.update(5.0);
        assert_eq!(pad.remaining_cooldown(4), 0.0);
        assert!(pad.try_activate(4));
    }

    #[test]
    fn test_overlap() {
        let pad = BoostPad::new(1, Rect::new(0.0, 0.0, 40.0, 40.0), 1.0);
        assert!(pad.overlaps(Vec2::new(50.0, 20.0), 15.0));
        assert!(!pad.overlaps(Vec2::new(80.0, 20.0), 15.0));
    }
}
