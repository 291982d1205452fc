use crate::output::print_json;
use anyhow::Context;
use appdeck_core::locator::AppLocator;
use appdeck_core::phase::PhaseStore;
use clap::Subcommand;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum PhaseSubcommand {
    /// Show an app's current phase and transition history
    Show {
        /// App name, or category/name
        app: String,
    },

    /// Move an app one step forward in the phase order
    Advance {
        /// App name, or category/name
        app: String,
    },

    /// Set an app's phase explicitly (may move backwards)
    Set {
        /// App name, or category/name
        app: String,
        /// Target phase
        phase: String,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: PhaseSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        PhaseSubcommand::Show { app } => show(root, &app, json),
        PhaseSubcommand::Advance { app } => advance(root, &app, json),
        PhaseSubcommand::Set { app, phase } => set(root, &app, &phase, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, app: &str, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let tracker = super::open_tracker(root, &config)?;
    let identity = AppLocator::new(root).lookup(app)?;
    let current = tracker.current_phase(&identity, None)?;
    let record = tracker.store().record(&identity);
    let next = tracker.ladder().next(&current);

    if json {
        let value = serde_json::json!({
            "app": identity,
            "phase": current.name,
            "next": next.as_ref().map(|p| p.name.as_str()),
            "recorded": record.is_some(),
            "history": record.map(|r| r.history.as_slice()).unwrap_or_default(),
        });
        print_json(&value)?;
        return Ok(());
    }

    println!("App:    {identity}");
    match &next {
        Some(n) => println!("Phase:  {current} (next: {n})"),
        None => println!("Phase:  {current} (terminal)"),
    }
    match record {
        Some(r) if !r.history.is_empty() => {
            println!("\nHistory:");
            for entry in &r.history {
                println!(
                    "  {}  {}",
                    entry.entered.format("%Y-%m-%d %H:%M:%S UTC"),
                    entry.phase
                );
            }
        }
        _ => println!("\nNo recorded transitions; using the initial phase."),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// advance / set
// ---------------------------------------------------------------------------

fn advance(root: &Path, app: &str, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let mut tracker = super::open_tracker(root, &config)?;
    let identity = AppLocator::new(root).lookup(app)?;
    let from = tracker.current_phase(&identity, None)?;
    let to = tracker
        .advance(&identity)
        .with_context(|| format!("cannot advance {identity}"))?;

    report(&identity.to_string(), &from.name, &to.name, json)
}

fn set(root: &Path, app: &str, phase: &str, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let mut tracker = super::open_tracker(root, &config)?;
    let identity = AppLocator::new(root).lookup(app)?;
    let from = tracker
        .store()
        .get(&identity)?
        .unwrap_or_else(|| tracker.ladder().lowest().name);
    let to = tracker
        .set(&identity, phase)
        .with_context(|| format!("cannot set phase of {identity}"))?;

    report(&identity.to_string(), &from, &to.name, json)
}

fn report(app: &str, from: &str, to: &str, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(&serde_json::json!({ "app": app, "from": from, "to": to }))?;
    } else {
        println!("{app}: {from} -> {to}");
    }
    Ok(())
}
