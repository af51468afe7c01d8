//! Stagger policy for lists of blocks
//!
//! Sibling blocks rendered together get increasing delays so they cascade
//! instead of appearing at once. The delay is a monotonic function of the
//! block's index, so blocks never overtake each other.

use serde::{Deserialize, Serialize};

/// Default gap between consecutive items
pub const DEFAULT_STAGGER_MS: u32 = 100;

/// Configuration for stagger delays
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaggerConfig {
    /// Delay applied to the whole group before the first item
    pub base_delay_ms: u32,
    /// Delay between each item's start
    pub interval_ms: u32,
    /// Items past this index share the delay of the item at `limit`
    pub limit: Option<usize>,
}

impl StaggerConfig {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            base_delay_ms: 0,
            interval_ms,
            limit: None,
        }
    }

    pub fn with_base_delay(mut self, base_delay_ms: u32) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Cap the stagger at the first N items
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Delay for the item at `index`
    pub fn delay_for_index(&self, index: usize) -> u32 {
        let capped = match self.limit {
            Some(limit) => index.min(limit),
            None => index,
        };

        let stagger = u32::try_from(capped)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.interval_ms);
        self.base_delay_ms.saturating_add(stagger)
    }

    /// Delays for a whole group, in index order
    pub fn delays(&self, total: usize) -> Vec<u32> {
        (0..total).map(|i| self.delay_for_index(i)).collect()
    }
}

impl Default for StaggerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STAGGER_MS)
    }
}
