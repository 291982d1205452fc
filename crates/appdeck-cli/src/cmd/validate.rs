use crate::output::print_json;
use appdeck_core::locator::AppLocator;
use appdeck_core::pipeline::Pipeline;
use appdeck_core::validator::StructureValidator;
use std::path::Path;

pub fn run(root: &Path, app: &str, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let locator = AppLocator::new(root);
    let validator = StructureValidator::new(config.validation);

    let (source, result) = match Pipeline::new(&locator, &validator).inspect(app) {
        Ok(checked) => checked,
        Err(failure) => anyhow::bail!("{failure}"),
    };

    if json {
        let value = serde_json::json!({
            "app": source.identity,
            "valid": result.valid,
            "violations": result.violations,
        });
        print_json(&value)?;
    } else if result.valid {
        println!("{}: ok ({} rules passed)", source.identity, validator.rules().len());
    } else {
        for v in &result.violations {
            println!("{v}");
        }
    }

    if !result.valid {
        anyhow::bail!(
            "{} has {} structural violation(s)",
            source.identity,
            result.violations.len()
        );
    }
    Ok(())
}
