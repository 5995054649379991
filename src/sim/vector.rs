//! Zero-safe vector helpers on top of `glam::Vec2`
//!
//! Degenerate operations (division by zero, normalizing a zero vector)
//! yield `Vec2::ZERO` instead of NaN or infinity.

use glam::Vec2;

/// Lengths below this are treated as zero
pub const EPSILON: f32 = 1e-6;

pub trait VecExt: Sized {
    /// Component-wise scalar division, zero vector when `s` is zero
    fn safe_div(self, s: f32) -> Self;
    /// Unit vector, or zero for (near) zero input
    fn safe_normalize(self) -> Self;
    /// Interpolation exact at both ends: `t = 0` gives `self`, `t = 1` gives `other`
    fn lerp_exact(self, other: Self, t: f32) -> Self;
    /// Heading angle in radians (atan2 of y over x)
    fn angle(self) -> f32;
    /// Vector rotated 90° counter-clockwise
    fn perp_ccw(self) -> Self;
    fn from_angle_len(angle: f32, len: f32) -> Self;
}

impl VecExt for Vec2 {
    #[inline]
    fn safe_div(self, s: f32) -> Self {
        if s.abs() < EPSILON || !s.is_finite() {
            Vec2::ZERO
        } else {
            self / s
        }
    }

    #[inline]
    fn safe_normalize(self) -> Self {
        let len = self.length();
        if len < EPSILON || !len.is_finite() {
            Vec2::ZERO
        } else {
            self / len
        }
    }

    #[inline]
    fn lerp_exact(self, other: Self, t: f32) -> Self {
        self * (1.0 - t) + other * t
    }

    #[inline]
    fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    #[inline]
    fn perp_ccw(self) -> Self {
        Vec2::new(-self.y, self.x)
    }

    #[inline]
    fn from_angle_len(angle: f32, len: f32) -> Self {
        Vec2::new(angle.cos() * len, angle.sin() * len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_divide_by_zero_is_zero() {
        assert_eq!(Vec2::new(3.0, -4.0).safe_div(0.0), Vec2::ZERO);
        assert_eq!(Vec2::new(3.0, -4.0).safe_div(2.0), Vec2::new(1.5, -2.0));
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vec2::ZERO.safe_normalize(), Vec2::ZERO);
        let n = Vec2::new(3.0, 4.0).safe_normalize();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_perp_and_angle() {
        let v = Vec2::X.perp_ccw();
        assert_eq!(v, Vec2::Y);
        assert!((Vec2::Y.angle() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn lerp_hits_endpoints_exactly(
            ax in -1.0e4f32..1.0e4, ay in -1.0e4f32..1.0e4,
            bx in -1.0e4f32..1.0e4, by in -1.0e4f32..1.0e4,
        ) {
            let a = Vec2::new(ax, ay);
            let b = Vec2::new(bx, by);
            prop_assert_eq!(a.lerp_exact(b, 0.0), a);
            prop_assert_eq!(a.lerp_exact(b, 1.0), b);
        }

        #[test]
        fn safe_normalize_never_nan(x in -1.0e3f32..1.0e3, y in -1.0e3f32..1.0e3) {
            let n = Vec2::new(x, y).safe_normalize();
            prop_assert!(n.x.is_finite() && n.y.is_finite());
        }
    }
}
