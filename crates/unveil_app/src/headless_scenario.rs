//! Scenario definition for headless page diagnostics.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use unveil_animation::AnimationPhase;

/// Sequence of headless diagnostic steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessScenario {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<ScenarioStep>,
}

impl HeadlessScenario {
    /// Load a scenario from JSON text.
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("Failed to parse scenario JSON")
    }

    /// Load a scenario from file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&raw)
    }

    /// True if any step inspects page state
    pub fn has_assertions(&self) -> bool {
        self.steps.iter().any(ScenarioStep::is_assertion)
    }
}

/// One scenario step. Blocks are addressed by key (`section.id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioStep {
    Wait { ms: u64 },
    Tick { frames: u32 },
    ScrollTo { y: f32 },
    ScrollBy { dy: f32 },
    Resize { width: f32, height: f32 },
    Unmount { section: String },
    AssertPhase { block: String, phase: AnimationPhase },
    AssertEntered { block: String, entered: bool },
    AssertOpacity { block: String, min: f32, max: f32 },
}

impl ScenarioStep {
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            ScenarioStep::AssertPhase { .. }
                | ScenarioStep::AssertEntered { .. }
                | ScenarioStep::AssertOpacity { .. }
        )
    }
}
