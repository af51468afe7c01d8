//! Event dispatch system
//!
//! Page-level events (scroll, resize, unmount) flow in from the host, and
//! block-level notifications (entered view, animation started/settled) flow
//! out to whoever registered for them.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Event type identifier
pub type EventType = u32;

/// Common event types
pub mod event_types {
    use super::EventType;

    pub const SCROLL: EventType = 30;
    /// Absolute scroll position (programmatic jump, anchor navigation)
    pub const SCROLL_TO: EventType = 31;
    pub const RESIZE: EventType = 40;

    /// Remove a section from the page
    pub const UNMOUNT: EventType = 61;

    // Entrance notifications
    pub const ENTERED_VIEW: EventType = 90;
    pub const ANIMATION_START: EventType = 91;
    pub const ANIMATION_SETTLE: EventType = 92;
}

/// Target id used for page-wide events that are not addressed to a block
pub const PAGE_TARGET: u64 = 0;

/// An event with associated data
#[derive(Clone, Debug)]
pub struct Event {
    pub event_type: EventType,
    /// Block id, or [`PAGE_TARGET`]
    pub target: u64,
    pub data: EventData,
    /// Page clock in milliseconds
    pub timestamp: u64,
}

impl Event {
    pub fn new(event_type: EventType, target: u64, data: EventData, timestamp: u64) -> Self {
        Self {
            event_type,
            target,
            data,
            timestamp,
        }
    }

    /// Relative scroll of the page
    pub fn scroll(delta_y: f32, timestamp: u64) -> Self {
        Self::new(
            event_types::SCROLL,
            PAGE_TARGET,
            EventData::Scroll {
                delta_x: 0.0,
                delta_y,
            },
            timestamp,
        )
    }

    /// Absolute scroll of the page
    pub fn scroll_to(y: f32, timestamp: u64) -> Self {
        Self::new(
            event_types::SCROLL_TO,
            PAGE_TARGET,
            EventData::ScrollTo { y },
            timestamp,
        )
    }

    pub fn resize(width: f32, height: f32, timestamp: u64) -> Self {
        Self::new(
            event_types::RESIZE,
            PAGE_TARGET,
            EventData::Resize { width, height },
            timestamp,
        )
    }

    /// Unmount a section by name
    pub fn unmount(section: impl Into<String>, timestamp: u64) -> Self {
        Self::new(
            event_types::UNMOUNT,
            PAGE_TARGET,
            EventData::Section {
                name: section.into(),
            },
            timestamp,
        )
    }
}

/// Event-specific data
#[derive(Clone, Debug, PartialEq)]
pub enum EventData {
    Scroll { delta_x: f32, delta_y: f32 },
    ScrollTo { y: f32 },
    Resize { width: f32, height: f32 },
    Section { name: String },
    /// Scheduled time of an entrance milestone (start or settle)
    Timing { at_ms: u64 },
    None,
}

/// Event handler callback
pub type EventHandler = Box<dyn Fn(&Event)>;

/// Routes events to handlers registered per `(target, event type)`, plus
/// handlers that listen to an event type on every target.
pub struct EventDispatcher {
    handlers: FxHashMap<(u64, EventType), SmallVec<[EventHandler; 1]>>,
    any_target: FxHashMap<EventType, SmallVec<[EventHandler; 1]>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: FxHashMap::default(),
            any_target: FxHashMap::default(),
        }
    }

    /// Register an event handler for a target and event type
    pub fn register<F>(&mut self, target: u64, event_type: EventType, handler: F)
    where
        F: Fn(&Event) + 'static,
    {
        self.handlers
            .entry((target, event_type))
            .or_default()
            .push(Box::new(handler));
    }

    /// Register an event handler for an event type on any target
    pub fn register_any<F>(&mut self, event_type: EventType, handler: F)
    where
        F: Fn(&Event) + 'static,
    {
        self.any_target
            .entry(event_type)
            .or_default()
            .push(Box::new(handler));
    }

    /// Drop every handler registered for `target`
    pub fn unregister_target(&mut self, target: u64) {
        self.handlers.retain(|(t, _), _| *t != target);
    }

    /// Dispatch an event. Target-specific handlers run first.
    pub fn dispatch(&self, event: &Event) {
        let targeted = self.handlers.get(&(event.target, event.event_type));
        let broadcast = self.any_target.get(&event.event_type);

        for handler in targeted.into_iter().chain(broadcast).flatten() {
            handler(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.any_target.is_empty()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
