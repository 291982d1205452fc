pub mod config;
pub mod deploy;
pub mod list;
pub mod phase;
pub mod prompt;
pub mod validate;

use anyhow::Context;
use appdeck_core::config::Config;
use appdeck_core::phase::{PhaseLadder, PhaseTracker, YamlPhaseStore};
use std::path::Path;

pub(crate) fn load_config(root: &Path) -> anyhow::Result<Config> {
    Config::load(root).context("failed to load config")
}

pub(crate) fn open_tracker(
    root: &Path,
    config: &Config,
) -> anyhow::Result<PhaseTracker<YamlPhaseStore>> {
    let ladder = PhaseLadder::from_config(&config.phases).context("invalid phases.order")?;
    let store = YamlPhaseStore::open(root).context("failed to load phase metadata")?;
    Ok(PhaseTracker::new(ladder, store))
}
