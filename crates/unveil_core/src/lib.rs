//! Unveil Core
//!
//! Foundational primitives shared by the entrance-animation crates:
//!
//! - **Geometry**: points, sizes and rects in page coordinates
//! - **Events**: page and block events with a small dispatcher
//! - **Phase machines**: flat state machines with transition history

pub mod events;
pub mod fsm;
pub mod geometry;

pub use events::{event_types, Event, EventData, EventDispatcher, EventType, PAGE_TARGET};
pub use fsm::{PhaseMachine, PhaseMachineBuilder};
pub use geometry::{Point, Rect, Size};
