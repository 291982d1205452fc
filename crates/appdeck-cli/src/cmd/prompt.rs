use crate::output::print_json;
use appdeck_core::locator::AppLocator;
use appdeck_core::pipeline::{Outcome, Pipeline};
use appdeck_core::prompt::PromptGenerator;
use appdeck_core::validator::StructureValidator;
use std::path::Path;

pub fn run(root: &Path, app: &str, phase: Option<&str>, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let tracker = super::open_tracker(root, &config)?;
    let generator = PromptGenerator::from_config(&config.prompts);
    let locator = AppLocator::new(root);
    let validator = StructureValidator::new(config.validation.clone());

    let outcome = Pipeline::new(&locator, &validator).prompt(app, phase, &tracker, &generator);

    match outcome {
        Outcome::Prompted { payload } => {
            if json {
                print_json(&payload)?;
            } else {
                print!("{}", payload.render());
            }
            Ok(())
        }
        Outcome::Failed(failure) => {
            if json {
                print_json(&failure)?;
            }
            anyhow::bail!("{failure}")
        }
        Outcome::Deployed { .. } => anyhow::bail!("unexpected deploy outcome from prompt"),
    }
}
