//! Scenario runner that drives a page through headless diagnostics steps.

use crate::headless_assert::{
    evaluate_assert_entered, evaluate_assert_opacity, evaluate_assert_phase, AssertionResult,
};
use crate::headless_report::{BlockSummary, HeadlessReport};
use crate::headless_runtime::HeadlessRuntime;
use crate::error::UnveilError;
use crate::headless_scenario::{HeadlessScenario, ScenarioStep};
use anyhow::Result;
use unveil_layout::SectionKind;

/// Final outcome of a scenario run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Passed { report: HeadlessReport },
    Failed { report: HeadlessReport },
}

impl RunOutcome {
    pub fn report(&self) -> &HeadlessReport {
        match self {
            RunOutcome::Passed { report } => report,
            RunOutcome::Failed { report } => report,
        }
    }

    pub fn into_report(self) -> HeadlessReport {
        match self {
            RunOutcome::Passed { report } | RunOutcome::Failed { report } => report,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }
}

/// Execute scenario JSON against a runtime.
pub fn run_scenario(runtime: &mut HeadlessRuntime, input: &str) -> Result<RunOutcome> {
    let scenario = HeadlessScenario::from_json(input)?;
    run_loaded_scenario(runtime, &scenario)
}

/// Execute a pre-loaded scenario. Steps run in order and the first failing
/// assertion ends the run. An unknown section in an `unmount` step is an
/// error rather than a failed assertion.
pub fn run_loaded_scenario(
    runtime: &mut HeadlessRuntime,
    scenario: &HeadlessScenario,
) -> Result<RunOutcome> {
    for (step_index, step) in scenario.steps.iter().enumerate() {
        tracing::debug!(step_index, ?step, "scenario step");
        let assertion = match step {
            ScenarioStep::Wait { ms } => {
                runtime.wait(*ms);
                None
            }
            ScenarioStep::Tick { frames } => {
                runtime.tick(*frames);
                None
            }
            ScenarioStep::ScrollTo { y } => {
                runtime.page_mut().scroll_to(*y);
                runtime.flush();
                None
            }
            ScenarioStep::ScrollBy { dy } => {
                runtime.page_mut().scroll_by(*dy);
                runtime.flush();
                None
            }
            ScenarioStep::Resize { width, height } => {
                runtime.page_mut().resize(*width, *height);
                runtime.flush();
                None
            }
            ScenarioStep::Unmount { section } => {
                let kind = section.parse::<SectionKind>().map_err(UnveilError::from)?;
                if !runtime.page_mut().unmount_section(kind) {
                    tracing::warn!(%kind, "section already unmounted");
                }
                runtime.flush();
                None
            }
            ScenarioStep::AssertPhase { block, phase } => {
                let snapshot = runtime.page().snapshot();
                Some(("assert_phase", evaluate_assert_phase(block, *phase, &snapshot)))
            }
            ScenarioStep::AssertEntered { block, entered } => {
                let snapshot = runtime.page().snapshot();
                Some((
                    "assert_entered",
                    evaluate_assert_entered(block, *entered, &snapshot),
                ))
            }
            ScenarioStep::AssertOpacity { block, min, max } => {
                let snapshot = runtime.page().snapshot();
                Some((
                    "assert_opacity",
                    evaluate_assert_opacity(block, *min, *max, &snapshot),
                ))
            }
        };

        if let Some((name, AssertionResult::Failed { message, .. })) = assertion {
            tracing::info!(step_index, assertion = name, reason = %message, "scenario failed");
            let report = HeadlessReport::failed(
                name,
                step_index,
                message,
                runtime.elapsed_frames(),
                runtime.elapsed_ms(),
                summary(runtime),
            )
            .with_scenario(scenario.name.clone())
            .with_timeline(runtime.log().to_vec());
            return Ok(RunOutcome::Failed { report });
        }
    }

    let report = HeadlessReport::passed(
        runtime.elapsed_frames(),
        runtime.elapsed_ms(),
        summary(runtime),
    )
    .with_scenario(scenario.name.clone())
    .with_timeline(runtime.log().to_vec());
    Ok(RunOutcome::Passed { report })
}

fn summary(runtime: &HeadlessRuntime) -> BlockSummary {
    BlockSummary::from_snapshot(&runtime.page().snapshot())
}
