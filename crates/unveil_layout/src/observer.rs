//! Scroll-visibility observer
//!
//! Watches block regions against the viewport and reports, once per
//! block, the first time the region becomes visible. A region that fires is
//! detached immediately, so scrolling it out and back in again produces no
//! further notifications.
//!
//! Registrations are scoped: [`VisibilityObserver::observe`] hands back an
//! [`ObservedRegion`] and dropping it releases the registration, whether or
//! not it ever fired.

use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use std::cell::{Cell, RefCell, RefMut};
use std::rc::{Rc, Weak};
use thiserror::Error;
use unveil_core::Rect;

new_key_type! {
    pub struct RegionId;
}

/// Whether the host environment can observe visibility
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObserverSupport {
    #[default]
    Supported,
    Unsupported,
}

/// Errors raised when attaching a region
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObserverError {
    #[error("visibility observation is not supported in this environment")]
    Unsupported,

    #[error("visibility threshold {0} is outside 0.0..=1.0")]
    InvalidThreshold(f32),
}

/// Per-region observation options
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObserveOptions {
    /// Fraction of the region that must be visible. 0.0 means any
    /// nonzero overlap.
    pub threshold: f32,
    /// Grows (positive) or shrinks (negative) the viewport before testing
    pub margin: f32,
}

impl ObserveOptions {
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Check the threshold lies in 0.0..=1.0
    pub fn validate(&self) -> Result<(), ObserverError> {
        if (0.0..=1.0).contains(&self.threshold) {
            Ok(())
        } else {
            Err(ObserverError::InvalidThreshold(self.threshold))
        }
    }

    fn is_satisfied(&self, ratio: f32) -> bool {
        if self.threshold <= 0.0 {
            ratio > 0.0
        } else {
            ratio >= self.threshold
        }
    }
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            margin: 0.0,
        }
    }
}

/// One-shot notification that a region became visible
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entered {
    pub region: RegionId,
    /// Caller-supplied target (the block id)
    pub target: u64,
    /// Visible fraction at the time of firing
    pub ratio: f32,
}

struct Registration {
    target: u64,
    region: Rect,
    options: ObserveOptions,
    entered: Rc<Cell<bool>>,
}

struct ObserverState {
    regions: SlotMap<RegionId, Registration>,
    support: ObserverSupport,
}

impl ObserverState {
    fn release(&mut self, id: RegionId) {
        if self.regions.remove(id).is_some() {
            tracing::trace!(?id, "region released before entering view");
        }
    }
}

struct Shared {
    state: RefCell<ObserverState>,
    /// Regions dropped while `state` was borrowed
    deferred: RefCell<Vec<RegionId>>,
}

impl Shared {
    /// Borrow the state mutably, first releasing every deferred region
    fn state_mut(&self) -> RefMut<'_, ObserverState> {
        let mut state = self.state.borrow_mut();
        for id in self.deferred.borrow_mut().drain(..) {
            state.release(id);
        }
        state
    }
}

/// Fraction of `region` that lies inside `root`.
///
/// Degenerate regions (zero height or width) count as fully visible when
/// their origin lies inside the root, and invisible otherwise.
pub fn visible_ratio(region: &Rect, root: &Rect) -> f32 {
    if region.is_empty() {
        return if root.contains(region.origin) { 1.0 } else { 0.0 };
    }
    match region.intersection(root) {
        Some(overlap) => (overlap.area() / region.area()).clamp(0.0, 1.0),
        None => 0.0,
    }
}

/// Tracks first-time visibility for a set of regions
#[derive(Clone)]
pub struct VisibilityObserver {
    shared: Rc<Shared>,
}

impl VisibilityObserver {
    pub fn new(support: ObserverSupport) -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(ObserverState {
                    regions: SlotMap::with_key(),
                    support,
                }),
                deferred: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn support(&self) -> ObserverSupport {
        self.shared.state.borrow().support
    }

    /// Start watching `region` for `target`.
    pub fn observe(
        &self,
        target: u64,
        region: Rect,
        options: ObserveOptions,
    ) -> Result<ObservedRegion, ObserverError> {
        options.validate()?;
        let mut state = self.shared.state_mut();
        if state.support == ObserverSupport::Unsupported {
            return Err(ObserverError::Unsupported);
        }

        let entered = Rc::new(Cell::new(false));
        let id = state.regions.insert(Registration {
            target,
            region,
            options,
            entered: entered.clone(),
        });
        tracing::trace!(?id, block = target, ?region, "region observed");

        Ok(ObservedRegion {
            id,
            entered,
            shared: Rc::downgrade(&self.shared),
        })
    }

    /// Run one observation pass against the viewport. Every region that is
    /// visible for the first time is reported and detached.
    pub fn check(&self, viewport: &Viewport) -> Vec<Entered> {
        let mut state = self.shared.state_mut();
        let mut fired = Vec::new();

        for (id, reg) in state.regions.iter() {
            let root = viewport.visible_rect().inflate(reg.options.margin);
            let ratio = visible_ratio(&reg.region, &root);
            if reg.options.is_satisfied(ratio) {
                fired.push(Entered {
                    region: id,
                    target: reg.target,
                    ratio,
                });
            }
        }

        for entered in &fired {
            if let Some(reg) = state.regions.remove(entered.region) {
                reg.entered.set(true);
                tracing::debug!(block = entered.target, ratio = entered.ratio, "region entered view; detached");
            }
        }

        fired
    }

    /// Regions still being watched
    pub fn registered_count(&self) -> usize {
        self.shared.state_mut().regions.len()
    }
}

impl Default for VisibilityObserver {
    fn default() -> Self {
        Self::new(ObserverSupport::Supported)
    }
}

/// Scoped registration of one region. Holds the region's visibility state.
pub struct ObservedRegion {
    id: RegionId,
    entered: Rc<Cell<bool>>,
    shared: Weak<Shared>,
}

impl ObservedRegion {
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// True once the region has been seen. Never goes back to false.
    pub fn has_entered_view(&self) -> bool {
        self.entered.get()
    }

    /// True while the observer is still watching this region
    pub fn is_attached(&self) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let attached = shared.state.borrow().regions.contains_key(self.id);
        attached
    }

    /// Update the watched region after relayout. No-op once detached.
    pub fn set_region(&self, region: Rect) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let mut state = shared.state_mut();
        if let Some(reg) = state.regions.get_mut(self.id) {
            reg.region = region;
        }
    }
}

impl Drop for ObservedRegion {
    fn drop(&mut self) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let borrowed = shared.state.try_borrow_mut();
        match borrowed {
            Ok(mut state) => state.release(self.id),
            Err(_) => {
                tracing::debug!(id = ?self.id, "observer busy; release deferred");
                shared.deferred.borrow_mut().push(self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        let mut viewport = Viewport::new(1000.0, 600.0);
        viewport.set_content_height(3_000.0);
        viewport
    }

    #[test]
    fn test_region_in_initial_view_fires_on_first_pass() {
        let observer = VisibilityObserver::default();
        let region = observer
            .observe(1, Rect::new(0.0, 100.0, 400.0, 200.0), ObserveOptions::default())
            .unwrap();

        let fired = observer.check(&viewport());
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].target, 1);
        assert_eq!(fired[0].ratio, 1.0);
        assert!(region.has_entered_view());
        assert!(!region.is_attached());
    }

    #[test]
    fn test_fires_once_across_scroll_out_and_back() {
        let observer = VisibilityObserver::default();
        let region = observer
            .observe(1, Rect::new(0.0, 1_000.0, 400.0, 200.0), ObserveOptions::default())
            .unwrap();
        let mut viewport = viewport();

        assert!(observer.check(&viewport).is_empty());
        assert!(!region.has_entered_view());

        viewport.scroll_to(800.0);
        assert_eq!(observer.check(&viewport).len(), 1);

        viewport.scroll_to(0.0);
        assert!(observer.check(&viewport).is_empty());
        viewport.scroll_to(800.0);
        assert!(observer.check(&viewport).is_empty());
        assert!(region.has_entered_view());
    }

    #[test]
    fn test_threshold_requires_fraction() {
        let observer = VisibilityObserver::default();
        let options = ObserveOptions::default().with_threshold(0.5);
        let _region = observer
            .observe(1, Rect::new(0.0, 500.0, 400.0, 200.0), options)
            .unwrap();
        let mut viewport = viewport();

        // 100 of 200 units visible → exactly half
        viewport.scroll_to(0.0);
        let root = viewport.visible_rect();
        assert_eq!(visible_ratio(&Rect::new(0.0, 500.0, 400.0, 200.0), &root), 0.5);
        assert_eq!(observer.check(&viewport).len(), 1);
    }

    #[test]
    fn test_threshold_not_met() {
        let observer = VisibilityObserver::default();
        let options = ObserveOptions::default().with_threshold(0.75);
        let region = observer
            .observe(1, Rect::new(0.0, 500.0, 400.0, 200.0), options)
            .unwrap();

        assert!(observer.check(&viewport()).is_empty());
        assert!(region.is_attached());
    }

    #[test]
    fn test_touching_edge_is_not_visible() {
        let observer = VisibilityObserver::default();
        let _region = observer
            .observe(1, Rect::new(0.0, 600.0, 400.0, 200.0), ObserveOptions::default())
            .unwrap();
        assert!(observer.check(&viewport()).is_empty());
    }

    #[test]
    fn test_margin_extends_viewport() {
        let observer = VisibilityObserver::default();
        let options = ObserveOptions::default().with_margin(100.0);
        let _region = observer
            .observe(1, Rect::new(0.0, 650.0, 400.0, 200.0), options)
            .unwrap();
        assert_eq!(observer.check(&viewport()).len(), 1);
    }

    #[test]
    fn test_drop_releases_registration() {
        let observer = VisibilityObserver::default();
        let region = observer
            .observe(1, Rect::new(0.0, 2_000.0, 400.0, 200.0), ObserveOptions::default())
            .unwrap();
        assert_eq!(observer.registered_count(), 1);

        drop(region);
        assert_eq!(observer.registered_count(), 0);

        let mut viewport = viewport();
        viewport.scroll_to(2_000.0);
        assert!(observer.check(&viewport).is_empty());
    }

    #[test]
    fn test_unsupported_environment() {
        let observer = VisibilityObserver::new(ObserverSupport::Unsupported);
        let result = observer.observe(1, Rect::ZERO, ObserveOptions::default());
        assert_eq!(result.err(), Some(ObserverError::Unsupported));
    }

    #[test]
    fn test_invalid_threshold() {
        let observer = VisibilityObserver::default();
        let result = observer.observe(1, Rect::ZERO, ObserveOptions::default().with_threshold(1.5));
        assert_eq!(result.err(), Some(ObserverError::InvalidThreshold(1.5)));
    }

    #[test]
    fn test_set_region_moves_watch() {
        let observer = VisibilityObserver::default();
        let region = observer
            .observe(1, Rect::new(0.0, 2_000.0, 400.0, 200.0), ObserveOptions::default())
            .unwrap();
        assert!(observer.check(&viewport()).is_empty());

        region.set_region(Rect::new(0.0, 10.0, 400.0, 200.0));
        assert_eq!(observer.check(&viewport()).len(), 1);
    }

    #[test]
    fn test_region_dropped_while_busy_never_fires() {
        let observer = VisibilityObserver::default();
        let region = observer
            .observe(9, Rect::new(0.0, 100.0, 100.0, 100.0), ObserveOptions::default())
            .unwrap();
        let id = region.id();

        {
            let _busy = observer.shared.state.borrow();
            drop(region);
        }
        assert_eq!(observer.shared.deferred.borrow().as_slice(), &[id]);

        assert!(observer.check(&viewport()).is_empty());
        assert_eq!(observer.registered_count(), 0);
        assert!(observer.shared.deferred.borrow().is_empty());
    }
}
