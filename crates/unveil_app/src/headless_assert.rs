//! Assertion helpers for headless page diagnostics.

use unveil_animation::AnimationPhase;
use unveil_layout::{BlockSnapshot, PageSnapshot};

/// Assertion result with structured failure details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionResult {
    Passed,
    Failed { code: String, message: String },
}

impl AssertionResult {
    fn failed(code: &str, message: String) -> Self {
        AssertionResult::Failed {
            code: code.to_string(),
            message,
        }
    }
}

fn find<'a>(key: &str, snapshot: &'a PageSnapshot) -> Result<&'a BlockSnapshot, AssertionResult> {
    snapshot
        .block(key)
        .ok_or_else(|| AssertionResult::failed("missing_block", format!("{key}: block not mounted")))
}

pub fn evaluate_assert_phase(
    key: &str,
    expected: AnimationPhase,
    snapshot: &PageSnapshot,
) -> AssertionResult {
    let block = match find(key, snapshot) {
        Ok(block) => block,
        Err(failed) => return failed,
    };
    if block.phase == expected {
        AssertionResult::Passed
    } else {
        AssertionResult::failed(
            "phase_mismatch",
            format!("{key}: expected {expected}, got {} at {}ms", block.phase, snapshot.now_ms),
        )
    }
}

pub fn evaluate_assert_entered(key: &str, expected: bool, snapshot: &PageSnapshot) -> AssertionResult {
    let block = match find(key, snapshot) {
        Ok(block) => block,
        Err(failed) => return failed,
    };
    if block.entered_view == expected {
        AssertionResult::Passed
    } else {
        AssertionResult::failed(
            "entered_mismatch",
            format!("{key}: expected entered_view={expected}, got {}", block.entered_view),
        )
    }
}

pub fn evaluate_assert_opacity(
    key: &str,
    min: f32,
    max: f32,
    snapshot: &PageSnapshot,
) -> AssertionResult {
    let block = match find(key, snapshot) {
        Ok(block) => block,
        Err(failed) => return failed,
    };
    let opacity = block.pose.opacity;
    if (min..=max).contains(&opacity) {
        AssertionResult::Passed
    } else {
        AssertionResult::failed(
            "opacity_out_of_range",
            format!("{key}: opacity {opacity:.3} outside {min}..={max}"),
        )
    }
}
