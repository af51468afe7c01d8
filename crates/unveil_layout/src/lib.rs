//! Unveil Layout
//!
//! Turns section plans into laid-out blocks on a scrollable page and wires
//! each block to its trigger: mount for above-the-fold content, first
//! visibility for everything else.
//!
//! ```text
//!  Page ── Section ── heading / StaggerGroup / closing ── ContentBlock
//!   │                                                      │       │
//!   ├─ Viewport                                  EntranceHandle  ObservedRegion
//!   ├─ VisibilityObserver ─────────────────────────────────────────┘
//!   └─ EntranceScheduler ───────────────────────────────┘
//! ```

pub mod block;
pub mod observer;
pub mod page;
pub mod section;
pub mod viewport;

pub use block::{BlockId, BlockSpec, ContentBlock, MountContext, TriggerMode};
pub use observer::{
    visible_ratio, Entered, ObserveOptions, ObservedRegion, ObserverError, ObserverSupport,
    RegionId, VisibilityObserver,
};
pub use page::{BlockChange, BlockChangeKind, BlockSnapshot, Page, PageOptions, PageSnapshot};
pub use section::{
    BlockPlan, Section, SectionKind, SectionLayout, SectionMetrics, SectionPlan, StaggerGroup,
    UnknownSection,
};
pub use viewport::Viewport;
