//! Unveil Application Layer
//!
//! Configuration, report content and headless diagnostics on top of the
//! layout and animation crates.
//!
//! # Example
//!
//! ```
//! use unveil_app::{HeadlessRunConfig, UnveilApp, UnveilConfig};
//!
//! let app = UnveilApp::new(UnveilConfig::default()).unwrap();
//! let mut runtime = app.headless(HeadlessRunConfig::default()).unwrap();
//! runtime.page_mut().scroll_to(900.0);
//! assert!(runtime.run_until_settled());
//! ```

mod app;
pub mod config;
pub mod content;
mod error;
pub mod headless_assert;
pub mod headless_report;
pub mod headless_runner;
pub mod headless_runtime;
pub mod headless_scenario;

pub use app::UnveilApp;
pub use config::{UnveilConfig, CONFIG_FILE};
pub use content::{Category, ContentCatalog, ContentRecord, SectionContent};
pub use error::{Result, UnveilError};
pub use headless_report::{BlockSummary, HeadlessReport, ReportStatus};
pub use headless_runner::{run_loaded_scenario, run_scenario, RunOutcome};
pub use headless_runtime::{HeadlessRunConfig, HeadlessRuntime};
pub use headless_scenario::{HeadlessScenario, ScenarioStep};
