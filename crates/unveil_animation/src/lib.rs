//! Unveil Animation System
//!
//! Entrance animations for content blocks: a block waits hidden, is
//! triggered once (on mount or on first view), holds through its stagger
//! delay and then eases to its resting pose.
//!
//! # Features
//!
//! - **Entrance state machine**: Pending → Running → Settled, never reversed
//! - **Stagger policy**: index-ordered delays for lists of blocks
//! - **Scheduler**: one page clock, scoped handles that cancel on drop
//! - **Reduced motion**: blocks snap to rest when motion is off or no driver exists

pub mod easing;
pub mod entrance;
pub mod pose;
pub mod presets;
pub mod scheduler;
pub mod stagger;

pub use easing::Easing;
pub use entrance::{
    AnimationPhase, EntranceAnimation, EntranceConfig, PhaseChange, PhaseEvent, TriggerSource,
    DEFAULT_DURATION_MS,
};
pub use pose::{Pose, DEFAULT_OFFSET_Y};
pub use presets::EntrancePreset;
pub use scheduler::{
    DriverStatus, EntranceHandle, EntranceId, EntranceScheduler, MotionPolicy, ScheduledChange,
};
pub use stagger::{StaggerConfig, DEFAULT_STAGGER_MS};
