//! Entrance scheduler
//!
//! Owns the page clock and every live entrance animation. Blocks hold an
//! [`EntranceHandle`]; dropping the handle removes the entry, so a block
//! destroyed before its delay elapses can never start animating.
//!
//! Everything runs on one thread. The scheduler is a cheap clonable handle
//! around shared state, and the only suspension points are the delays
//! measured against the page clock.

use crate::entrance::{
    AnimationPhase, EntranceAnimation, EntranceConfig, PhaseChange, PhaseEvent, TriggerSource,
};
use crate::pose::Pose;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use std::cell::{RefCell, RefMut};
use std::rc::{Rc, Weak};

new_key_type! {
    pub struct EntranceId;
}

/// User preference for motion
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionPolicy {
    #[default]
    Animate,
    /// Skip interpolation; blocks appear at rest as soon as they trigger
    Reduced,
}

/// Whether the host can drive timed animation at all
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    #[default]
    Available,
    /// Non-visual target or no frame clock
    Unavailable,
}

/// A phase change attributed to an entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledChange {
    pub id: EntranceId,
    pub change: PhaseChange,
}

struct SchedulerState {
    entries: SlotMap<EntranceId, EntranceAnimation>,
    now_ms: u64,
    policy: MotionPolicy,
    driver: DriverStatus,
    /// Changes produced outside `advance` (immediate settles, zero delays)
    outbox: Vec<ScheduledChange>,
}

impl SchedulerState {
    fn animates(&self) -> bool {
        self.policy == MotionPolicy::Animate && self.driver == DriverStatus::Available
    }

    fn release(&mut self, id: EntranceId) {
        if let Some(entry) = self.entries.remove(id) {
            if entry.phase() != AnimationPhase::Settled {
                tracing::debug!(?id, phase = %entry.phase(), "entrance cancelled");
            }
        }
        self.outbox.retain(|c| c.id != id);
    }
}

struct Shared {
    state: RefCell<SchedulerState>,
    /// Handles dropped while `state` was borrowed
    deferred: RefCell<Vec<EntranceId>>,
}

impl Shared {
    /// Borrow the state mutably, first releasing every deferred handle
    fn state_mut(&self) -> RefMut<'_, SchedulerState> {
        let mut state = self.state.borrow_mut();
        for id in self.deferred.borrow_mut().drain(..) {
            state.release(id);
        }
        state
    }
}

/// The scheduler that ticks all entrance animations
#[derive(Clone)]
pub struct EntranceScheduler {
    shared: Rc<Shared>,
}

impl EntranceScheduler {
    pub fn new() -> Self {
        Self::with_policy(MotionPolicy::Animate, DriverStatus::Available)
    }

    pub fn with_policy(policy: MotionPolicy, driver: DriverStatus) -> Self {
        if driver == DriverStatus::Unavailable {
            tracing::warn!("no animation driver; entrances will settle immediately");
        }
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(SchedulerState {
                    entries: SlotMap::with_key(),
                    now_ms: 0,
                    policy,
                    driver,
                    outbox: Vec::new(),
                }),
                deferred: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Register a block's entrance. The entry lives as long as the handle.
    pub fn register(&self, config: EntranceConfig, delay_ms: u32) -> EntranceHandle {
        let id = self
            .shared
            .state_mut()
            .entries
            .insert(EntranceAnimation::new(config, delay_ms));
        tracing::trace!(?id, delay_ms, "entrance registered");
        EntranceHandle {
            id,
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Advance the page clock by `dt_ms` and collect every phase change,
    /// ordered by scheduled time.
    pub fn advance(&self, dt_ms: u64) -> Vec<ScheduledChange> {
        let mut state = self.shared.state_mut();
        state.now_ms = state.now_ms.saturating_add(dt_ms);
        let now = state.now_ms;

        let mut changes = std::mem::take(&mut state.outbox);
        for (id, entry) in state.entries.iter_mut() {
            for change in entry.advance(now) {
                tracing::debug!(?id, phase = %change.phase, at_ms = change.at_ms, "entrance phase");
                changes.push(ScheduledChange { id, change });
            }
        }

        changes.sort_by_key(|c| c.change.at_ms);
        changes
    }

    /// Take changes produced by triggers since the last `advance`
    pub fn drain_changes(&self) -> Vec<ScheduledChange> {
        std::mem::take(&mut self.shared.state_mut().outbox)
    }

    pub fn now_ms(&self) -> u64 {
        self.shared.state.borrow().now_ms
    }

    pub fn policy(&self) -> MotionPolicy {
        self.shared.state.borrow().policy
    }

    pub fn driver(&self) -> DriverStatus {
        self.shared.state.borrow().driver
    }

    /// True when entrances interpolate; false when they snap to rest
    pub fn animates(&self) -> bool {
        self.shared.state.borrow().animates()
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.shared.state_mut().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries that have not settled yet
    pub fn active_count(&self) -> usize {
        self.shared
            .state_mut()
            .entries
            .values()
            .filter(|e| e.phase() != AnimationPhase::Settled)
            .count()
    }

    /// True while any triggered entry is still pending or running
    pub fn has_active_animations(&self) -> bool {
        self.shared
            .state_mut()
            .entries
            .values()
            .any(|e| e.is_triggered() && e.phase() != AnimationPhase::Settled)
    }
}

impl Default for EntranceScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped registration of one entrance. Dropping it cancels the entry.
///
/// Queries on a handle whose scheduler is gone report the rest pose, so a
/// dangling block is shown rather than hidden.
pub struct EntranceHandle {
    id: EntranceId,
    shared: Weak<Shared>,
}

impl EntranceHandle {
    pub fn id(&self) -> EntranceId {
        self.id
    }

    /// Trigger the entrance at the current page time. Returns false when
    /// it was already triggered or the scheduler is gone.
    pub fn trigger(&self, source: TriggerSource) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let mut state = shared.state_mut();
        let now = state.now_ms;
        let animates = state.animates();

        let SchedulerState {
            entries, outbox, ..
        } = &mut *state;
        let Some(entry) = entries.get_mut(self.id) else {
            return false;
        };
        if !entry.trigger(now, source) {
            tracing::trace!(id = ?self.id, ?source, "duplicate trigger ignored");
            return false;
        }

        tracing::debug!(id = ?self.id, ?source, now_ms = now, delay_ms = entry.delay_ms(), "entrance triggered");

        // Zero-delay entries start on this tick rather than the next one
        let changes = if animates {
            entry.advance(now)
        } else {
            entry.settle_immediately(now)
        };
        outbox.extend(changes.into_iter().map(|change| ScheduledChange { id: self.id, change }));
        true
    }

    pub fn phase(&self) -> AnimationPhase {
        self.with_entry(|e| e.phase()).unwrap_or(AnimationPhase::Settled)
    }

    pub fn pose(&self) -> Pose {
        let Some(shared) = self.shared.upgrade() else {
            return Pose::REST;
        };
        let state = shared.state.borrow();
        state
            .entries
            .get(self.id)
            .map(|e| e.pose(state.now_ms))
            .unwrap_or(Pose::REST)
    }

    pub fn is_triggered(&self) -> bool {
        self.with_entry(|e| e.is_triggered()).unwrap_or(false)
    }

    pub fn trigger_source(&self) -> Option<TriggerSource> {
        self.with_entry(|e| e.trigger_source()).flatten()
    }

    pub fn delay_ms(&self) -> u32 {
        self.with_entry(|e| e.delay_ms()).unwrap_or(0)
    }

    pub fn scheduled_start_ms(&self) -> Option<u64> {
        self.with_entry(|e| e.scheduled_start_ms()).flatten()
    }

    pub fn started_at_ms(&self) -> Option<u64> {
        self.with_entry(|e| e.started_at_ms()).flatten()
    }

    pub fn settled_at_ms(&self) -> Option<u64> {
        self.with_entry(|e| e.settled_at_ms()).flatten()
    }

    pub fn history(&self) -> Vec<(AnimationPhase, PhaseEvent, AnimationPhase)> {
        self.with_entry(|e| e.history().to_vec()).unwrap_or_default()
    }

    fn with_entry<R>(&self, f: impl FnOnce(&EntranceAnimation) -> R) -> Option<R> {
        let shared = self.shared.upgrade()?;
        let state = shared.state.borrow();
        state.entries.get(self.id).map(f)
    }
}

impl Drop for EntranceHandle {
    fn drop(&mut self) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let borrowed = shared.state.try_borrow_mut();
        match borrowed {
            Ok(mut state) => state.release(self.id),
            Err(_) => {
                tracing::debug!(id = ?self.id, "scheduler busy; release deferred");
                shared.deferred.borrow_mut().push(self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;

    fn config() -> EntranceConfig {
        EntranceConfig::default().with_easing(Easing::Linear)
    }

    #[test]
    fn test_zero_delay_starts_on_trigger_tick() {
        let scheduler = EntranceScheduler::new();
        let handle = scheduler.register(config(), 0);

        assert!(handle.trigger(TriggerSource::Mount));
        assert_eq!(handle.phase(), AnimationPhase::Running);

        let changes = scheduler.drain_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change.phase, AnimationPhase::Running);
        assert_eq!(changes[0].change.at_ms, 0);
    }

    #[test]
    fn test_advance_runs_clock() {
        let scheduler = EntranceScheduler::new();
        let handle = scheduler.register(config(), 100);
        handle.trigger(TriggerSource::Mount);

        scheduler.advance(50);
        assert_eq!(handle.phase(), AnimationPhase::Pending);
        scheduler.advance(50);
        assert_eq!(handle.phase(), AnimationPhase::Running);
        assert_eq!(handle.started_at_ms(), Some(100));

        scheduler.advance(300);
        assert!((handle.pose().opacity - 0.5).abs() < 1e-4);

        scheduler.advance(300);
        assert_eq!(handle.phase(), AnimationPhase::Settled);
        assert_eq!(handle.settled_at_ms(), Some(700));
        assert!(!scheduler.has_active_animations());
    }

    #[test]
    fn test_dropped_handle_never_runs() {
        let scheduler = EntranceScheduler::new();
        let handle = scheduler.register(config(), 200);
        handle.trigger(TriggerSource::Visibility);
        let id = handle.id();
        assert_eq!(scheduler.len(), 1);

        drop(handle);
        assert!(scheduler.is_empty());

        let changes = scheduler.advance(1_000);
        assert!(changes.iter().all(|c| c.id != id));
    }

    #[test]
    fn test_reduced_motion_settles_on_trigger() {
        let scheduler = EntranceScheduler::with_policy(MotionPolicy::Reduced, DriverStatus::Available);
        let handle = scheduler.register(config(), 300);
        assert_eq!(handle.pose(), Pose::INITIAL);

        handle.trigger(TriggerSource::Visibility);
        assert_eq!(handle.phase(), AnimationPhase::Settled);
        assert_eq!(handle.pose(), Pose::REST);
    }

    #[test]
    fn test_missing_driver_settles_on_trigger() {
        let scheduler = EntranceScheduler::with_policy(MotionPolicy::Animate, DriverStatus::Unavailable);
        assert!(!scheduler.animates());

        let handle = scheduler.register(config(), 0);
        handle.trigger(TriggerSource::Mount);
        assert_eq!(handle.phase(), AnimationPhase::Settled);
    }

    #[test]
    fn test_handle_outliving_scheduler_reports_rest() {
        let scheduler = EntranceScheduler::new();
        let handle = scheduler.register(config(), 0);
        drop(scheduler);

        assert_eq!(handle.pose(), Pose::REST);
        assert_eq!(handle.phase(), AnimationPhase::Settled);
        assert!(!handle.trigger(TriggerSource::Mount));
    }

    #[test]
    fn test_changes_sorted_by_time() {
        let scheduler = EntranceScheduler::new();
        let late = scheduler.register(config(), 300);
        let early = scheduler.register(config(), 100);
        late.trigger(TriggerSource::Visibility);
        early.trigger(TriggerSource::Visibility);

        let changes = scheduler.advance(400);
        let ids: Vec<_> = changes
            .iter()
            .filter(|c| c.change.phase == AnimationPhase::Running)
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![early.id(), late.id()]);
    }

    #[test]
    fn test_handle_dropped_while_busy_is_released_later() {
        let scheduler = EntranceScheduler::new();
        let keep = scheduler.register(config(), 0);
        let handle = scheduler.register(config(), 100);
        handle.trigger(TriggerSource::Visibility);
        let id = handle.id();

        {
            let _busy = scheduler.shared.state.borrow();
            drop(handle);
        }
        assert_eq!(scheduler.shared.deferred.borrow().as_slice(), &[id]);

        let changes = scheduler.advance(1_000);
        assert!(changes.iter().all(|c| c.id != id));
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.shared.deferred.borrow().is_empty());
        drop(keep);
        assert!(scheduler.is_empty());
    }
}
