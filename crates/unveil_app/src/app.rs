//! Unveil application
//!
//! Ties configuration and content together and mounts report pages.

use crate::config::UnveilConfig;
use crate::content::ContentCatalog;
use crate::error::Result;
use crate::headless_runtime::{HeadlessRunConfig, HeadlessRuntime};
use unveil_layout::{BlockChange, Page, SectionPlan};

/// A configured report, ready to mount
#[derive(Debug, Clone)]
pub struct UnveilApp {
    config: UnveilConfig,
    catalog: ContentCatalog,
}

impl UnveilApp {
    /// Build from configuration. Content comes from `content.path` when
    /// set, the built-in report otherwise.
    pub fn new(config: UnveilConfig) -> Result<Self> {
        config.validate()?;
        let catalog = match &config.content.path {
            Some(path) => ContentCatalog::load(path)?,
            None => ContentCatalog::builtin(),
        };
        Ok(Self { config, catalog })
    }

    /// Build with explicit content
    pub fn with_catalog(config: UnveilConfig, catalog: ContentCatalog) -> Result<Self> {
        config.validate()?;
        catalog.validate()?;
        Ok(Self { config, catalog })
    }

    pub fn config(&self) -> &UnveilConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    pub fn plans(&self) -> Vec<SectionPlan> {
        self.catalog.plans(self.config.stagger())
    }

    /// Mount a fresh page
    pub fn mount(&self) -> Page {
        Page::mount(self.config.page_options(), self.plans())
    }

    /// Mount a fresh page inside a headless runtime
    pub fn headless(&self, cfg: HeadlessRunConfig) -> anyhow::Result<HeadlessRuntime> {
        HeadlessRuntime::new(self.mount(), cfg)
    }

    /// Every milestone seen by a reader who scrolls from top to bottom at
    /// `px_per_frame`, then waits for the last entrance to settle
    pub fn timeline(&self, cfg: HeadlessRunConfig, px_per_frame: f32) -> anyhow::Result<Vec<BlockChange>> {
        let mut runtime = self.headless(cfg)?;
        if !runtime.scroll_through(px_per_frame) {
            tracing::warn!(
                frames = cfg.max_frames,
                "frame budget exhausted before the page settled"
            );
        }
        Ok(runtime.into_log())
    }
}

impl Default for UnveilApp {
    fn default() -> Self {
        Self {
            config: UnveilConfig::default(),
            catalog: ContentCatalog::builtin(),
        }
    }
}
