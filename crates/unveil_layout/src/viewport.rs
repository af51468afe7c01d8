//! Scrollable viewport over the page
//!
//! Tracks the visible window of the page: its size, the vertical scroll
//! offset and the total content height the offset is clamped against.

use serde::{Deserialize, Serialize};
use unveil_core::Rect;

/// The visible window onto the page
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Distance scrolled from the top of the page (0 = top edge)
    pub scroll_y: f32,
    /// Total page height
    pub content_height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scroll_y: 0.0,
            content_height: height,
        }
    }

    /// Largest reachable scroll offset
    pub fn max_scroll_y(&self) -> f32 {
        (self.content_height - self.height).max(0.0)
    }

    /// Scroll to an absolute offset, clamped to the page. Returns true if
    /// the offset changed. Non-finite offsets are ignored.
    pub fn scroll_to(&mut self, y: f32) -> bool {
        if !y.is_finite() {
            tracing::debug!(y, "non-finite scroll ignored");
            return false;
        }
        let clamped = y.clamp(0.0, self.max_scroll_y());
        let changed = (clamped - self.scroll_y).abs() > f32::EPSILON;
        if changed {
            tracing::trace!(from = self.scroll_y, to = clamped, "viewport scrolled");
        }
        self.scroll_y = clamped;
        changed
    }

    pub fn scroll_by(&mut self, delta_y: f32) -> bool {
        self.scroll_to(self.scroll_y + delta_y)
    }

    /// Resize the window, keeping the offset within the new bounds
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.scroll_to(self.scroll_y);
    }

    pub fn set_content_height(&mut self, content_height: f32) {
        self.content_height = content_height.max(self.height);
        self.scroll_to(self.scroll_y);
    }

    /// Visible region in page coordinates
    pub fn visible_rect(&self) -> Rect {
        Rect::new(0.0, self.scroll_y, self.width, self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}
