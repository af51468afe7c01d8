//! Headless runtime for deterministic page execution.
//!
//! Drives a mounted [`Page`] with a fixed frame clock instead of a display
//! refresh, logging every block milestone along the way.

use anyhow::{bail, Result};
use unveil_layout::{BlockChange, Page};

/// Configuration for deterministic headless frame execution.
#[derive(Debug, Clone, Copy)]
pub struct HeadlessRunConfig {
    /// Logical milliseconds between frames.
    pub tick_ms: u64,
    /// Upper bound on frames for open-ended runs.
    pub max_frames: u32,
}

impl Default for HeadlessRunConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            max_frames: 3_600,
        }
    }
}

/// Deterministic frame loop around one page.
pub struct HeadlessRuntime {
    page: Page,
    cfg: HeadlessRunConfig,
    elapsed_frames: u64,
    log: Vec<BlockChange>,
}

impl HeadlessRuntime {
    pub fn new(page: Page, cfg: HeadlessRunConfig) -> Result<Self> {
        if cfg.tick_ms == 0 {
            bail!("headless tick_ms must be > 0");
        }
        if cfg.max_frames == 0 {
            bail!("headless max_frames must be > 0");
        }
        Ok(Self {
            page,
            cfg,
            elapsed_frames: 0,
            log: Vec::new(),
        })
    }

    /// Run `frames` full ticks.
    pub fn tick(&mut self, frames: u32) {
        for _ in 0..frames {
            self.frame(self.cfg.tick_ms);
        }
    }

    /// Let `ms` of page time pass. The last frame is shortened so the
    /// clock lands exactly on the target.
    pub fn wait(&mut self, ms: u64) {
        let mut remaining = ms;
        while remaining > 0 {
            let step = remaining.min(self.cfg.tick_ms);
            self.frame(step);
            remaining -= step;
        }
    }

    /// Tick until no triggered block is still animating. Returns false if
    /// the frame budget ran out first.
    pub fn run_until_settled(&mut self) -> bool {
        self.flush();
        for _ in 0..self.cfg.max_frames {
            if !self.page.is_animating() {
                return true;
            }
            self.frame(self.cfg.tick_ms);
        }
        !self.page.is_animating()
    }

    /// Scroll down by `px_per_frame` every frame until the bottom of the
    /// page is reached and every entrance has settled.
    pub fn scroll_through(&mut self, px_per_frame: f32) -> bool {
        self.flush();
        for _ in 0..self.cfg.max_frames {
            let viewport = self.page.viewport();
            let at_bottom = viewport.scroll_y >= viewport.max_scroll_y();
            if at_bottom && !self.page.is_animating() {
                return true;
            }
            self.page.scroll_by(px_per_frame);
            self.frame(self.cfg.tick_ms);
        }
        false
    }

    /// Collect milestones produced outside a frame (scrolls, resizes)
    /// without moving the clock.
    pub fn flush(&mut self) {
        let changes = self.page.advance(0);
        self.log.extend(changes);
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn config(&self) -> HeadlessRunConfig {
        self.cfg
    }

    pub fn elapsed_frames(&self) -> u64 {
        self.elapsed_frames
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.page.now_ms()
    }

    /// Every milestone seen so far, in the order it was reported
    pub fn log(&self) -> &[BlockChange] {
        &self.log
    }

    pub fn into_log(self) -> Vec<BlockChange> {
        self.log
    }

    fn frame(&mut self, dt_ms: u64) {
        self.elapsed_frames = self.elapsed_frames.saturating_add(1);
        let changes = self.page.advance(dt_ms);
        for change in &changes {
            tracing::trace!(key = %change.key, kind = ?change.kind, at_ms = change.at_ms, "milestone");
        }
        self.log.extend(changes);
    }
}
