//! Block poses
//!
//! A pose is the pair of visual attributes an entrance animation drives:
//! opacity and a vertical offset from the block's laid-out position.

use serde::{Deserialize, Serialize};

/// Default downward offset of a hidden block, in logical units
pub const DEFAULT_OFFSET_Y: f32 = 20.0;

/// Animatable presentation state of a block
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Opacity (0.0 to 1.0)
    pub opacity: f32,
    /// Vertical translation from the resting position (positive = lower)
    pub offset_y: f32,
}

impl Pose {
    /// Hidden and lowered by the default offset
    pub const INITIAL: Pose = Pose {
        opacity: 0.0,
        offset_y: DEFAULT_OFFSET_Y,
    };

    /// Fully visible at the laid-out position
    pub const REST: Pose = Pose {
        opacity: 1.0,
        offset_y: 0.0,
    };

    pub const fn new(opacity: f32, offset_y: f32) -> Self {
        Self { opacity, offset_y }
    }

    /// Hidden pose lowered by `offset_y`
    pub const fn hidden(offset_y: f32) -> Self {
        Self {
            opacity: 0.0,
            offset_y,
        }
    }

    /// Interpolate toward `other`; `t` is clamped to 0..=1
    pub fn lerp(&self, other: &Pose, t: f32) -> Pose {
        let t = t.clamp(0.0, 1.0);
        Pose {
            opacity: self.opacity + (other.opacity - self.opacity) * t,
            offset_y: self.offset_y + (other.offset_y - self.offset_y) * t,
        }
    }

    pub fn is_rest(&self) -> bool {
        *self == Pose::REST
    }
}

impl Default for Pose {
    fn default() -> Self {
        Pose::REST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_midpoint() {
        let mid = Pose::INITIAL.lerp(&Pose::REST, 0.5);
        assert_eq!(mid, Pose::new(0.5, 10.0));
    }

    #[test]
    fn test_lerp_clamps() {
        assert_eq!(Pose::INITIAL.lerp(&Pose::REST, 1.5), Pose::REST);
        assert_eq!(Pose::INITIAL.lerp(&Pose::REST, -1.0), Pose::INITIAL);
    }

    #[test]
    fn test_hidden_custom_offset() {
        let p = Pose::hidden(48.0);
        assert_eq!(p.opacity, 0.0);
        assert_eq!(p.offset_y, 48.0);
        assert!(!p.is_rest());
        assert!(Pose::default().is_rest());
    }
}
