use crate::config::PhaseConfig;
use crate::error::{DeckError, Result};
use crate::paths;
use crate::types::AppIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// One stage of an app's lifecycle. Ordered by position in its ladder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub ordinal: usize,
}

impl Ord for Phase {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal
            .cmp(&other.ordinal)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for Phase {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ---------------------------------------------------------------------------
// PhaseLadder
// ---------------------------------------------------------------------------

/// The configured, ordered enumeration of phases.
#[derive(Debug, Clone)]
pub struct PhaseLadder {
    names: Vec<String>,
}

impl PhaseLadder {
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(DeckError::InvalidPhaseOrder(
                "at least one phase is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for name in &names {
            if name.trim().is_empty() {
                return Err(DeckError::InvalidPhaseOrder(
                    "phase names must not be blank".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(DeckError::InvalidPhaseOrder(format!(
                    "phase '{name}' is listed more than once"
                )));
            }
        }
        Ok(Self { names })
    }

    pub fn from_config(cfg: &PhaseConfig) -> Result<Self> {
        Self::new(cfg.order.clone())
    }

    pub fn all(&self) -> Vec<Phase> {
        self.names
            .iter()
            .enumerate()
            .map(|(ordinal, name)| Phase {
                name: name.clone(),
                ordinal,
            })
            .collect()
    }

    pub fn lowest(&self) -> Phase {
        Phase {
            name: self.names[0].clone(),
            ordinal: 0,
        }
    }

    pub fn get(&self, name: &str) -> Result<Phase> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|ordinal| Phase {
                name: name.to_string(),
                ordinal,
            })
            .ok_or_else(|| DeckError::UnknownPhase(name.to_string()))
    }

    pub fn next(&self, phase: &Phase) -> Option<Phase> {
        let ordinal = phase.ordinal + 1;
        self.names.get(ordinal).map(|name| Phase {
            name: name.clone(),
            ordinal,
        })
    }

    pub fn is_terminal(&self, phase: &Phase) -> bool {
        phase.ordinal + 1 >= self.names.len()
    }
}

// ---------------------------------------------------------------------------
// PhaseStore
// ---------------------------------------------------------------------------

/// Key-value persistence for the current phase of each app.
pub trait PhaseStore {
    fn get(&self, identity: &AppIdentity) -> Result<Option<String>>;
    fn set(&mut self, identity: &AppIdentity, phase: &Phase) -> Result<()>;
}

/// In-process store, used when nothing should touch disk.
#[derive(Debug, Default)]
pub struct MemoryPhaseStore {
    phases: HashMap<String, String>,
    writes: usize,
}

impl MemoryPhaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, identity: &AppIdentity, phase: &str) -> Self {
        self.phases.insert(identity.key(), phase.to_string());
        self
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl PhaseStore for MemoryPhaseStore {
    fn get(&self, identity: &AppIdentity) -> Result<Option<String>> {
        Ok(self.phases.get(&identity.key()).cloned())
    }

    fn set(&mut self, identity: &AppIdentity, phase: &Phase) -> Result<()> {
        self.phases.insert(identity.key(), phase.name.clone());
        self.writes += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// YamlPhaseStore
// ---------------------------------------------------------------------------

const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseEntry {
    pub phase: String,
    pub entered: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppPhaseRecord {
    pub phase: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<PhaseEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PhaseFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    apps: BTreeMap<String, AppPhaseRecord>,
}

fn default_version() -> u32 {
    1
}

impl Default for PhaseFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            apps: BTreeMap::new(),
        }
    }
}

/// `.appdeck/phases.yaml`. Read once on open; each `set` rewrites the file
/// atomically.
#[derive(Debug)]
pub struct YamlPhaseStore {
    path: PathBuf,
    file: PhaseFile,
}

impl YamlPhaseStore {
    pub fn open(root: &Path) -> Result<Self> {
        Self::open_path(paths::phases_path(root))
    }

    pub fn open_path(path: PathBuf) -> Result<Self> {
        let file = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            if data.trim().is_empty() {
                PhaseFile::default()
            } else {
                serde_yaml::from_str(&data)?
            }
        } else {
            PhaseFile::default()
        };
        Ok(Self { path, file })
    }

    pub fn record(&self, identity: &AppIdentity) -> Option<&AppPhaseRecord> {
        self.file.apps.get(&identity.key())
    }

    fn save(&self) -> Result<()> {
        let data = serde_yaml::to_string(&self.file)?;
        crate::io::atomic_write(&self.path, data.as_bytes())
    }
}

impl PhaseStore for YamlPhaseStore {
    fn get(&self, identity: &AppIdentity) -> Result<Option<String>> {
        Ok(self.record(identity).map(|r| r.phase.clone()))
    }

    fn set(&mut self, identity: &AppIdentity, phase: &Phase) -> Result<()> {
        let now = Utc::now();
        let record = self
            .file
            .apps
            .entry(identity.key())
            .or_insert_with(|| AppPhaseRecord {
                phase: phase.name.clone(),
                updated_at: now,
                history: Vec::new(),
            });
        record.phase = phase.name.clone();
        record.updated_at = now;
        record.history.push(PhaseEntry {
            phase: phase.name.clone(),
            entered: now,
        });
        if record.history.len() > HISTORY_LIMIT {
            let excess = record.history.len() - HISTORY_LIMIT;
            record.history.drain(..excess);
        }
        self.save()
    }
}

// ---------------------------------------------------------------------------
// PhaseTracker
// ---------------------------------------------------------------------------

/// Interprets stored phase names against the ladder.
pub struct PhaseTracker<S: PhaseStore> {
    ladder: PhaseLadder,
    store: S,
}

impl<S: PhaseStore> PhaseTracker<S> {
    pub fn new(ladder: PhaseLadder, store: S) -> Self {
        Self { ladder, store }
    }

    pub fn ladder(&self) -> &PhaseLadder {
        &self.ladder
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The phase to act in. An override wins and is never written back.
    pub fn current_phase(&self, identity: &AppIdentity, override_phase: Option<&str>) -> Result<Phase> {
        if let Some(name) = override_phase {
            return self.ladder.get(name);
        }
        match self.store.get(identity)? {
            Some(name) => self.ladder.get(&name),
            None => Ok(self.ladder.lowest()),
        }
    }

    /// Moves one step up the ladder and persists it.
    pub fn advance(&mut self, identity: &AppIdentity) -> Result<Phase> {
        let current = self.current_phase(identity, None)?;
        let next = self
            .ladder
            .next(&current)
            .ok_or_else(|| DeckError::TerminalPhase(current.name.clone()))?;
        self.store.set(identity, &next)?;
        tracing::info!(app = %identity, from = %current, to = %next, "advanced phase");
        Ok(next)
    }

    /// Explicit override: writes any phase on the ladder, backwards included.
    pub fn set(&mut self, identity: &AppIdentity, name: &str) -> Result<Phase> {
        let phase = self.ladder.get(name)?;
        self.store.set(identity, &phase)?;
        tracing::info!(app = %identity, to = %phase, "set phase");
        Ok(phase)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ladder() -> PhaseLadder {
        PhaseLadder::from_config(&PhaseConfig::default()).unwrap()
    }

    fn widget() -> AppIdentity {
        AppIdentity::new("widgets", "my-widget").unwrap()
    }

    #[test]
    fn ladder_rejects_bad_orders() {
        assert!(PhaseLadder::new(vec![]).is_err());
        assert!(PhaseLadder::new(vec!["a".into(), "a".into()]).is_err());
        assert!(PhaseLadder::new(vec!["a".into(), " ".into()]).is_err());
    }

    #[test]
    fn ladder_supports_numbered_sequences() {
        let l = PhaseLadder::new((1..=5).map(|n| n.to_string()).collect()).unwrap();
        let p = l.get("3").unwrap();
        assert_eq!(p.ordinal, 2);
        assert_eq!(l.next(&p).unwrap().name, "4");
        assert!(l.is_terminal(&l.get("5").unwrap()));
    }

    #[test]
    fn phases_order_by_ordinal() {
        let l = ladder();
        assert!(l.get("draft").unwrap() < l.get("reviewed").unwrap());
        assert!(l.get("reviewed").unwrap() < l.get("live").unwrap());
    }

    #[test]
    fn default_is_lowest_phase() {
        let tracker = PhaseTracker::new(ladder(), MemoryPhaseStore::new());
        assert_eq!(tracker.current_phase(&widget(), None).unwrap().name, "draft");
    }

    #[test]
    fn override_takes_precedence_and_does_not_write() {
        let store = MemoryPhaseStore::new().with(&widget(), "draft");
        let tracker = PhaseTracker::new(ladder(), store);
        let p = tracker.current_phase(&widget(), Some("live")).unwrap();
        assert_eq!(p.name, "live");
        assert_eq!(tracker.store().writes(), 0);
        assert_eq!(tracker.current_phase(&widget(), None).unwrap().name, "draft");
    }

    #[test]
    fn unknown_override_fails() {
        let tracker = PhaseTracker::new(ladder(), MemoryPhaseStore::new());
        assert!(matches!(
            tracker.current_phase(&widget(), Some("shipped")),
            Err(DeckError::UnknownPhase(_))
        ));
    }

    #[test]
    fn advance_is_monotonic() {
        let mut tracker = PhaseTracker::new(ladder(), MemoryPhaseStore::new());
        let before = tracker.current_phase(&widget(), None).unwrap();
        let after = tracker.advance(&widget()).unwrap();
        assert!(after.ordinal > before.ordinal);
        let again = tracker.advance(&widget()).unwrap();
        assert!(again > after);
        assert_eq!(again.name, "live");
    }

    #[test]
    fn advance_at_terminal_fails_without_writing() {
        let store = MemoryPhaseStore::new().with(&widget(), "live");
        let mut tracker = PhaseTracker::new(ladder(), store);
        assert!(matches!(
            tracker.advance(&widget()),
            Err(DeckError::TerminalPhase(ref p)) if p == "live"
        ));
        assert_eq!(tracker.store().writes(), 0);
        assert_eq!(tracker.current_phase(&widget(), None).unwrap().name, "live");
    }

    #[test]
    fn explicit_set_may_move_backwards() {
        let store = MemoryPhaseStore::new().with(&widget(), "live");
        let mut tracker = PhaseTracker::new(ladder(), store);
        let p = tracker.set(&widget(), "draft").unwrap();
        assert_eq!(p.ordinal, 0);
        assert_eq!(tracker.current_phase(&widget(), None).unwrap().name, "draft");
    }

    #[test]
    fn stored_phase_outside_ladder_is_unknown() {
        let store = MemoryPhaseStore::new().with(&widget(), "archived");
        let tracker = PhaseTracker::new(ladder(), store);
        assert!(matches!(
            tracker.current_phase(&widget(), None),
            Err(DeckError::UnknownPhase(_))
        ));
    }

    #[test]
    fn yaml_store_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let mut tracker = PhaseTracker::new(ladder(), YamlPhaseStore::open(dir.path()).unwrap());
        tracker.advance(&widget()).unwrap();

        let reopened = YamlPhaseStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get(&widget()).unwrap().as_deref(), Some("reviewed"));
        let record = reopened.record(&widget()).unwrap();
        assert_eq!(record.history.len(), 1);
        assert_eq!(record.history[0].phase, "reviewed");
    }

    #[test]
    fn yaml_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = YamlPhaseStore::open(dir.path()).unwrap();
        assert!(store.get(&widget()).unwrap().is_none());
        assert!(!dir.path().join(".appdeck/phases.yaml").exists());
    }

    #[test]
    fn yaml_store_trims_history() {
        let dir = TempDir::new().unwrap();
        let l = ladder();
        let all = l.all();
        let mut store = YamlPhaseStore::open(dir.path()).unwrap();
        for i in 0..(HISTORY_LIMIT + 5) {
            store.set(&widget(), &all[i % all.len()]).unwrap();
        }
        assert_eq!(store.record(&widget()).unwrap().history.len(), HISTORY_LIMIT);
    }
}
