//! Project scaffolding

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use unveil_animation::AnimationPhase;
use unveil_app::{ContentCatalog, HeadlessScenario, ScenarioStep, UnveilConfig, CONFIG_FILE};

pub const CONTENT_FILE: &str = "content.toml";
pub const SCENARIO_FILE: &str = "scenario.json";

/// Write `unveil.toml` and a sample scenario into `path`. With
/// `with_content` the built-in report is exported to `content.toml` and
/// the config points at it.
pub fn init_project(path: &Path, force: bool, with_content: bool) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let config_path = path.join(CONFIG_FILE);
    if config_path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    let mut written = Vec::new();
    let mut config = UnveilConfig::default();

    if with_content {
        let content_path = path.join(CONTENT_FILE);
        let text = toml::to_string_pretty(&ContentCatalog::builtin())
            .context("Failed to serialize content")?;
        fs::write(&content_path, text)?;
        config.content.path = Some(PathBuf::from(CONTENT_FILE));
        written.push(content_path);
    }

    fs::write(&config_path, config.to_toml()?)?;
    written.push(config_path);

    let scenario_path = path.join(SCENARIO_FILE);
    let scenario = serde_json::to_string_pretty(&sample_scenario())?;
    fs::write(&scenario_path, scenario)?;
    written.push(scenario_path);

    Ok(written)
}

/// Hero settles on its own, then a scroll reveals the summary cards
pub fn sample_scenario() -> HeadlessScenario {
    let block = |key: &str| key.to_string();
    HeadlessScenario {
        name: Some("summary reveal".into()),
        steps: vec![
            ScenarioStep::Wait { ms: 1_000 },
            ScenarioStep::AssertPhase {
                block: block("hero.highlights"),
                phase: AnimationPhase::Settled,
            },
            ScenarioStep::AssertEntered {
                block: block("executive_summary.heading"),
                entered: false,
            },
            ScenarioStep::ScrollTo { y: 900.0 },
            ScenarioStep::AssertEntered {
                block: block("executive_summary.heading"),
                entered: true,
            },
            ScenarioStep::AssertEntered {
                block: block("executive_summary.recommendation"),
                entered: false,
            },
            ScenarioStep::Wait { ms: 1_000 },
            ScenarioStep::AssertPhase {
                block: block("executive_summary.channel-strategy"),
                phase: AnimationPhase::Settled,
            },
            ScenarioStep::AssertOpacity {
                block: block("executive_summary.channel-strategy"),
                min: 1.0,
                max: 1.0,
            },
        ],
    }
}
