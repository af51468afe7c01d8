//! Report output model for headless page runs.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Component, Path};
use unveil_animation::AnimationPhase;
use unveil_layout::{BlockChange, PageSnapshot};

/// Report status for a headless run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Passed,
    Failed,
}

/// Block counts at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub total: usize,
    pub entered: usize,
    pub pending: usize,
    pub running: usize,
    pub settled: usize,
}

impl BlockSummary {
    pub fn from_snapshot(snapshot: &PageSnapshot) -> Self {
        snapshot.blocks.iter().fold(Self::default(), |mut acc, block| {
            acc.total += 1;
            acc.entered += block.entered_view as usize;
            match block.phase {
                AnimationPhase::Pending => acc.pending += 1,
                AnimationPhase::Running => acc.running += 1,
                AnimationPhase::Settled => acc.settled += 1,
            }
            acc
        })
    }
}

/// Machine-readable result of a headless run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    pub status: ReportStatus,
    pub failed_step_index: Option<usize>,
    pub assertion: Option<String>,
    pub message: Option<String>,
    pub elapsed_frames: u64,
    pub elapsed_ms: u64,
    pub blocks: BlockSummary,
    /// Every milestone in report order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timeline: Vec<BlockChange>,
}

impl HeadlessReport {
    pub fn passed(elapsed_frames: u64, elapsed_ms: u64, blocks: BlockSummary) -> Self {
        Self {
            scenario: None,
            status: ReportStatus::Passed,
            failed_step_index: None,
            assertion: None,
            message: None,
            elapsed_frames,
            elapsed_ms,
            blocks,
            timeline: Vec::new(),
        }
    }

    pub fn failed(
        assertion: &str,
        failed_step_index: usize,
        message: String,
        elapsed_frames: u64,
        elapsed_ms: u64,
        blocks: BlockSummary,
    ) -> Self {
        Self {
            scenario: None,
            status: ReportStatus::Failed,
            failed_step_index: Some(failed_step_index),
            assertion: Some(assertion.to_string()),
            message: Some(message),
            elapsed_frames,
            elapsed_ms,
            blocks,
            timeline: Vec::new(),
        }
    }

    pub fn with_scenario(mut self, name: Option<String>) -> Self {
        self.scenario = name;
        self
    }

    pub fn with_timeline(mut self, timeline: Vec<BlockChange>) -> Self {
        self.timeline = timeline;
        self
    }

    pub fn is_passed(&self) -> bool {
        self.status == ReportStatus::Passed
    }

    /// Write the report as JSON. Only relative paths inside the working
    /// directory are accepted.
    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        if path.is_absolute() || path.has_root() {
            bail!("report path must be relative and must not start with a separator");
        }
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            bail!("report path cannot contain '..' or drive prefixes");
        }
        let payload = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        std::fs::write(path, payload).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn write_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}
