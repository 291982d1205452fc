use crate::output::{print_json, print_table};
use anyhow::Context;
use appdeck_core::locator::AppLocator;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let tracker = super::open_tracker(root, &config)?;
    let apps = AppLocator::new(root)
        .list()
        .context("failed to scan apps directory")?;

    // An unknown stored phase is shown verbatim rather than failing the listing.
    let rows: Vec<(String, String, String)> = apps
        .iter()
        .map(|id| {
            let phase = match tracker.current_phase(id, None) {
                Ok(p) => p.name,
                Err(_) => tracker
                    .store()
                    .record(id)
                    .map(|r| format!("{} (unknown)", r.phase))
                    .unwrap_or_else(|| "?".to_string()),
            };
            (id.category.clone(), id.name.clone(), phase)
        })
        .collect();

    if json {
        let items: Vec<serde_json::Value> = rows
            .iter()
            .map(|(category, name, phase)| {
                serde_json::json!({
                    "category": category,
                    "name": name,
                    "phase": phase,
                })
            })
            .collect();
        print_json(&items)?;
        return Ok(());
    }

    if rows.is_empty() {
        println!("No apps found under {}.", appdeck_core::paths::APPS_DIR);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = rows
        .into_iter()
        .map(|(category, name, phase)| vec![category, name, phase])
        .collect();
    print_table(&["CATEGORY", "NAME", "PHASE"], &rows);
    Ok(())
}
