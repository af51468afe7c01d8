//! Entrance animations
//!
//! One [`EntranceAnimation`] per block. It waits for a trigger, holds the
//! initial pose through its delay, interpolates to the rest pose over the
//! configured duration and then stays settled for good.
//!
//! ```text
//!            trigger + delay elapsed            duration elapsed
//!  Pending ─────────────────────────► Running ──────────────────► Settled
//! ```
//!
//! All times are page-clock milliseconds supplied by the caller, so the
//! whole lifecycle is deterministic under test.

use crate::easing::Easing;
use crate::pose::{Pose, DEFAULT_OFFSET_Y};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use unveil_core::PhaseMachine;

/// Default entrance duration
pub const DEFAULT_DURATION_MS: u32 = 600;

/// Lifecycle phase of an entrance animation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationPhase {
    Pending,
    Running,
    Settled,
}

impl fmt::Display for AnimationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnimationPhase::Pending => "pending",
            AnimationPhase::Running => "running",
            AnimationPhase::Settled => "settled",
        })
    }
}

/// Events driving the phase machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseEvent {
    Start,
    Finish,
}

/// What caused an entrance to be triggered
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// First render, for above-the-fold content
    Mount,
    /// The block entered the viewport
    Visibility,
    /// Visibility could not be observed; the block is treated as visible
    Fallback,
}

/// Timing and shape of an entrance
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntranceConfig {
    pub duration_ms: u32,
    /// Starting downward offset
    pub offset_y: f32,
    pub easing: Easing,
}

impl EntranceConfig {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            ..Default::default()
        }
    }

    pub fn with_offset(mut self, offset_y: f32) -> Self {
        self.offset_y = offset_y;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Pose held before the animation starts
    pub fn initial_pose(&self) -> Pose {
        Pose::hidden(self.offset_y)
    }
}

impl Default for EntranceConfig {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            offset_y: DEFAULT_OFFSET_Y,
            easing: Easing::EaseOut,
        }
    }
}

/// A phase transition and the page time it is scheduled for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseChange {
    pub phase: AnimationPhase,
    pub at_ms: u64,
}

#[derive(Clone, Copy, Debug)]
struct Trigger {
    at_ms: u64,
    source: TriggerSource,
}

/// Per-block entrance state
pub struct EntranceAnimation {
    config: EntranceConfig,
    delay_ms: u32,
    machine: PhaseMachine<AnimationPhase, PhaseEvent>,
    trigger: Option<Trigger>,
    started_at: Option<u64>,
    settled_at: Option<u64>,
}

pub type PhaseChanges = SmallVec<[PhaseChange; 2]>;

impl EntranceAnimation {
    pub fn new(config: EntranceConfig, delay_ms: u32) -> Self {
        let machine = PhaseMachine::builder(AnimationPhase::Pending)
            .on(AnimationPhase::Pending, PhaseEvent::Start, AnimationPhase::Running)
            .on(AnimationPhase::Running, PhaseEvent::Finish, AnimationPhase::Settled)
            .build();

        Self {
            config,
            delay_ms,
            machine,
            trigger: None,
            started_at: None,
            settled_at: None,
        }
    }

    /// Arm the animation. Returns false if it was already triggered, in
    /// which case nothing changes.
    pub fn trigger(&mut self, now_ms: u64, source: TriggerSource) -> bool {
        if self.trigger.is_some() {
            return false;
        }
        self.trigger = Some(Trigger {
            at_ms: now_ms,
            source,
        });
        true
    }

    /// Move phases forward to `now_ms`. Transitions are stamped with their
    /// scheduled time, not with `now_ms`, so coarse ticks do not skew them.
    pub fn advance(&mut self, now_ms: u64) -> PhaseChanges {
        let mut changes = PhaseChanges::new();
        let Some(start) = self.scheduled_start_ms() else {
            return changes;
        };

        if self.machine.is_in(AnimationPhase::Pending) && now_ms >= start {
            self.machine.send(PhaseEvent::Start);
            self.started_at = Some(start);
            changes.push(PhaseChange {
                phase: AnimationPhase::Running,
                at_ms: start,
            });
        }

        let end = start + self.config.duration_ms as u64;
        if self.machine.is_in(AnimationPhase::Running) && now_ms >= end {
            self.machine.send(PhaseEvent::Finish);
            self.settled_at = Some(end);
            changes.push(PhaseChange {
                phase: AnimationPhase::Settled,
                at_ms: end,
            });
        }

        changes
    }

    /// Jump straight to the rest pose, skipping the delay and interpolation.
    /// Used when motion is reduced or no animation driver is available.
    /// The phase still passes through Running so observers see the usual order.
    pub fn settle_immediately(&mut self, now_ms: u64) -> PhaseChanges {
        let mut changes = PhaseChanges::new();
        if self.trigger.is_none() {
            return changes;
        }

        if self.machine.is_in(AnimationPhase::Pending) {
            self.machine.send(PhaseEvent::Start);
            self.started_at = Some(now_ms);
            changes.push(PhaseChange {
                phase: AnimationPhase::Running,
                at_ms: now_ms,
            });
        }
        if self.machine.is_in(AnimationPhase::Running) {
            self.machine.send(PhaseEvent::Finish);
            self.settled_at = Some(now_ms);
            changes.push(PhaseChange {
                phase: AnimationPhase::Settled,
                at_ms: now_ms,
            });
        }

        changes
    }

    pub fn phase(&self) -> AnimationPhase {
        self.machine.current()
    }

    pub fn is_triggered(&self) -> bool {
        self.trigger.is_some()
    }

    pub fn trigger_source(&self) -> Option<TriggerSource> {
        self.trigger.map(|t| t.source)
    }

    pub fn triggered_at_ms(&self) -> Option<u64> {
        self.trigger.map(|t| t.at_ms)
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn config(&self) -> &EntranceConfig {
        &self.config
    }

    /// Trigger time plus delay, once triggered
    pub fn scheduled_start_ms(&self) -> Option<u64> {
        self.trigger.map(|t| t.at_ms + self.delay_ms as u64)
    }

    /// Time the Running phase actually began
    pub fn started_at_ms(&self) -> Option<u64> {
        self.started_at
    }

    pub fn settled_at_ms(&self) -> Option<u64> {
        self.settled_at
    }

    /// Current pose at `now_ms`
    pub fn pose(&self, now_ms: u64) -> Pose {
        let initial = self.config.initial_pose();
        match self.phase() {
            AnimationPhase::Pending => initial,
            AnimationPhase::Settled => Pose::REST,
            AnimationPhase::Running => {
                let start = self.started_at.unwrap_or(now_ms);
                let duration = self.config.duration_ms.max(1) as f32;
                let progress = now_ms.saturating_sub(start) as f32 / duration;
                initial.lerp(&Pose::REST, self.config.easing.apply(progress))
            }
        }
    }

    pub fn history(&self) -> &[(AnimationPhase, PhaseEvent, AnimationPhase)] {
        self.machine.history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> EntranceConfig {
        EntranceConfig::default().with_easing(Easing::Linear)
    }

    #[test]
    fn test_untriggered_stays_pending() {
        let mut anim = EntranceAnimation::new(linear(), 0);
        assert!(anim.advance(10_000).is_empty());
        assert_eq!(anim.phase(), AnimationPhase::Pending);
        assert_eq!(anim.pose(10_000), Pose::INITIAL);
    }

    #[test]
    fn test_delay_then_run_then_settle() {
        let mut anim = EntranceAnimation::new(linear(), 100);
        assert!(anim.trigger(1_000, TriggerSource::Visibility));

        assert!(anim.advance(1_050).is_empty());
        assert_eq!(anim.phase(), AnimationPhase::Pending);

        let changes = anim.advance(1_116);
        assert_eq!(
            changes.as_slice(),
            &[PhaseChange {
                phase: AnimationPhase::Running,
                at_ms: 1_100
            }]
        );

        // Halfway through the 600ms run
        let mid = anim.pose(1_400);
        assert!((mid.opacity - 0.5).abs() < 1e-4);
        assert!((mid.offset_y - 10.0).abs() < 1e-3);

        let changes = anim.advance(1_712);
        assert_eq!(
            changes.as_slice(),
            &[PhaseChange {
                phase: AnimationPhase::Settled,
                at_ms: 1_700
            }]
        );
        assert_eq!(anim.pose(1_712), Pose::REST);
        assert_eq!(anim.settled_at_ms(), Some(1_700));
    }

    #[test]
    fn test_coarse_tick_emits_both_changes_in_order() {
        let mut anim = EntranceAnimation::new(linear(), 0);
        anim.trigger(0, TriggerSource::Mount);

        let changes = anim.advance(5_000);
        let phases: Vec<_> = changes.iter().map(|c| c.phase).collect();
        assert_eq!(phases, vec![AnimationPhase::Running, AnimationPhase::Settled]);
        assert_eq!(changes[1].at_ms, 600);
    }

    #[test]
    fn test_duplicate_trigger_is_ignored() {
        let mut anim = EntranceAnimation::new(linear(), 0);
        assert!(anim.trigger(0, TriggerSource::Visibility));
        anim.advance(700);

        assert!(!anim.trigger(2_000, TriggerSource::Visibility));
        assert!(anim.advance(3_000).is_empty());
        assert_eq!(anim.phase(), AnimationPhase::Settled);
        assert_eq!(anim.triggered_at_ms(), Some(0));
        assert_eq!(anim.history().len(), 2);
    }

    #[test]
    fn test_settle_immediately_skips_delay() {
        let mut anim = EntranceAnimation::new(linear(), 300);
        anim.trigger(50, TriggerSource::Fallback);

        let changes = anim.settle_immediately(50);
        assert_eq!(changes.len(), 2);
        assert_eq!(anim.phase(), AnimationPhase::Settled);
        assert_eq!(anim.pose(50), Pose::REST);
        assert_eq!(anim.settled_at_ms(), Some(50));
        assert_eq!(
            anim.history(),
            &[
                (AnimationPhase::Pending, PhaseEvent::Start, AnimationPhase::Running),
                (AnimationPhase::Running, PhaseEvent::Finish, AnimationPhase::Settled),
            ]
        );
    }

    #[test]
    fn test_settle_immediately_requires_trigger() {
        let mut anim = EntranceAnimation::new(linear(), 0);
        assert!(anim.settle_immediately(0).is_empty());
        assert_eq!(anim.phase(), AnimationPhase::Pending);
    }

    #[test]
    fn test_ease_out_pose_leads_linear() {
        let mut eased = EntranceAnimation::new(EntranceConfig::default(), 0);
        let mut plain = EntranceAnimation::new(linear(), 0);
        eased.trigger(0, TriggerSource::Mount);
        plain.trigger(0, TriggerSource::Mount);
        eased.advance(0);
        plain.advance(0);

        assert!(eased.pose(150).opacity > plain.pose(150).opacity);
    }
}
