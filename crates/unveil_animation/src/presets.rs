//! Entrance presets
//!
//! Named entrance shapes that can be picked from configuration instead of
//! spelling out offset and easing by hand.

use crate::easing::Easing;
use crate::entrance::EntranceConfig;
use crate::pose::DEFAULT_OFFSET_Y;
use serde::{Deserialize, Serialize};

/// Pre-built entrance shapes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrancePreset {
    /// Fade in while rising 20 units
    #[default]
    FadeUp,
    /// Fade in without moving
    Fade,
    /// Longer rise with a sharper settle
    Rise,
}

impl EntrancePreset {
    pub fn config(self, duration_ms: u32) -> EntranceConfig {
        match self {
            EntrancePreset::FadeUp => EntranceConfig::new(duration_ms)
                .with_offset(DEFAULT_OFFSET_Y)
                .with_easing(Easing::EaseOut),
            EntrancePreset::Fade => EntranceConfig::new(duration_ms)
                .with_offset(0.0)
                .with_easing(Easing::EaseOut),
            EntrancePreset::Rise => EntranceConfig::new(duration_ms)
                .with_offset(DEFAULT_OFFSET_Y * 2.0)
                .with_easing(Easing::EaseOutCubic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Pose;

    #[test]
    fn test_fade_up_matches_default() {
        assert_eq!(EntrancePreset::FadeUp.config(600), EntranceConfig::default());
    }

    #[test]
    fn test_fade_starts_in_place() {
        let config = EntrancePreset::Fade.config(300);
        assert_eq!(config.initial_pose(), Pose::new(0.0, 0.0));
        assert_eq!(config.duration_ms, 300);
    }
}
