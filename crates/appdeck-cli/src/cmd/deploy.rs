use crate::output::print_json;
use appdeck_core::locator::AppLocator;
use appdeck_core::pipeline::{Outcome, Pipeline};
use appdeck_core::validator::StructureValidator;
use std::path::Path;

pub fn run(
    root: &Path,
    app: &str,
    endpoint: Option<String>,
    token: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = super::load_config(root)?;
    if endpoint.is_some() {
        config.deploy.endpoint = endpoint;
    }
    if token.is_some() {
        config.deploy.token = token;
    }

    let locator = AppLocator::new(root);
    let validator = StructureValidator::new(config.validation.clone());
    let outcome = Pipeline::new(&locator, &validator).deploy(app, &config.deploy);

    if json {
        print_json(&outcome)?;
    }

    match outcome {
        Outcome::Deployed { identity, live_url } => {
            if !json {
                println!("Deployed {identity}");
                println!("Live: {live_url}");
            }
            Ok(())
        }
        Outcome::Failed(failure) => anyhow::bail!("{failure}"),
        Outcome::Prompted { .. } => anyhow::bail!("unexpected prompt outcome from deploy"),
    }
}
