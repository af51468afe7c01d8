//! Content blocks
//!
//! A block is one visually distinct unit (a card, a heading group) with its
//! own entrance. It owns both of its registrations: the entrance handle in
//! the scheduler and, for in-view blocks, the observed region. Dropping the
//! block releases both.

use crate::observer::{ObserveOptions, ObservedRegion, VisibilityObserver};
use serde::{Deserialize, Serialize};
use unveil_animation::{
    AnimationPhase, EntranceConfig, EntranceHandle, EntranceScheduler, Pose, TriggerSource,
};
use unveil_core::Rect;

/// Block identifier, unique within a page. Zero is reserved for the page.
pub type BlockId = u64;

/// When a block's entrance is triggered
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Immediately on first render
    OnMount,
    /// The first time the block becomes visible
    OnFirstView,
}

/// Everything needed to mount a block
#[derive(Clone, Debug)]
pub struct BlockSpec {
    pub id: BlockId,
    /// Stable key, e.g. `key_insights.pricing-strategy`
    pub key: String,
    /// Position within its group
    pub index: usize,
    pub trigger_mode: TriggerMode,
    /// Total delay after the trigger, stagger included
    pub delay_ms: u32,
    pub region: Rect,
}

/// Services a block registers with while mounting
#[derive(Clone, Copy)]
pub struct MountContext<'a> {
    pub scheduler: &'a EntranceScheduler,
    pub observer: &'a VisibilityObserver,
    pub entrance: EntranceConfig,
    pub observe: ObserveOptions,
}

enum Visibility {
    /// Mounted visible; never observed
    Immediate,
    Observed(ObservedRegion),
    /// Observation failed; treated as already visible
    Fallback,
}

pub struct ContentBlock {
    id: BlockId,
    key: String,
    index: usize,
    trigger_mode: TriggerMode,
    region: Rect,
    entrance: EntranceHandle,
    visibility: Visibility,
}

impl ContentBlock {
    /// Mount a block and wire up its trigger.
    ///
    /// On-mount blocks are triggered right away. On-first-view blocks are
    /// registered with the observer; if that fails they are triggered as
    /// though they were already visible.
    pub fn mount(spec: BlockSpec, ctx: MountContext<'_>) -> Self {
        let entrance = ctx.scheduler.register(ctx.entrance, spec.delay_ms);

        let visibility = match spec.trigger_mode {
            TriggerMode::OnMount => {
                entrance.trigger(TriggerSource::Mount);
                Visibility::Immediate
            }
            TriggerMode::OnFirstView => match ctx.observer.observe(spec.id, spec.region, ctx.observe) {
                Ok(region) => Visibility::Observed(region),
                Err(err) => {
                    tracing::warn!(key = %spec.key, error = %err, "cannot observe block; showing it immediately");
                    entrance.trigger(TriggerSource::Fallback);
                    Visibility::Fallback
                }
            },
        };

        Self {
            id: spec.id,
            key: spec.key,
            index: spec.index,
            trigger_mode: spec.trigger_mode,
            region: spec.region,
            entrance,
            visibility,
        }
    }

    /// Mount an above-the-fold block that animates straight away
    pub fn on_mount(spec: BlockSpec, ctx: MountContext<'_>) -> Self {
        Self::mount(
            BlockSpec {
                trigger_mode: TriggerMode::OnMount,
                ..spec
            },
            ctx,
        )
    }

    /// Mount a block that animates the first time it is scrolled into view
    pub fn on_first_view(spec: BlockSpec, ctx: MountContext<'_>) -> Self {
        Self::mount(
            BlockSpec {
                trigger_mode: TriggerMode::OnFirstView,
                ..spec
            },
            ctx,
        )
    }

    /// Deliver an `entered` notification. Repeated deliveries are no-ops.
    pub fn notify_entered(&self) -> bool {
        self.entrance.trigger(TriggerSource::Visibility)
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn trigger_mode(&self) -> TriggerMode {
        self.trigger_mode
    }

    pub fn region(&self) -> Rect {
        self.region
    }

    /// Move the block after relayout
    pub fn set_region(&mut self, region: Rect) {
        self.region = region;
        if let Visibility::Observed(observed) = &self.visibility {
            observed.set_region(region);
        }
    }

    pub fn has_entered_view(&self) -> bool {
        match &self.visibility {
            Visibility::Immediate | Visibility::Fallback => true,
            Visibility::Observed(region) => region.has_entered_view(),
        }
    }

    pub fn phase(&self) -> AnimationPhase {
        self.entrance.phase()
    }

    /// Current pose for the presentation layer
    pub fn pose(&self) -> Pose {
        self.entrance.pose()
    }

    pub fn delay_ms(&self) -> u32 {
        self.entrance.delay_ms()
    }

    pub fn entrance(&self) -> &EntranceHandle {
        &self.entrance
    }
}
