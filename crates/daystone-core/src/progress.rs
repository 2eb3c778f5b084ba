use crate::events::{EventBus, StoreEvent};
use crate::store::{keys, write_json, Store};
use crate::types::{MediaKind, MediaRef, ProgressKey, ProjectId, SaveStatus};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

// ---------------------------------------------------------------------------
// Project / ProjectBook
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub milestones: Vec<String>,
}

impl Project {
    /// Blank milestone names are dropped, matching the entry form.
    pub fn new(name: impl Into<String>, milestones: Vec<String>) -> Self {
        Self {
            id: ProjectId::new(),
            name: name.into(),
            milestones: milestones
                .into_iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }
}

/// In-memory projection of the project list.
#[derive(Debug, Clone, Default)]
pub struct ProjectBook {
    projects: Vec<Project>,
}

impl ProjectBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(store: &dyn Store) -> Self {
        let Some(value) = store.get(keys::PROJECTS) else {
            return Self::default();
        };
        let Ok(items) = serde_json::from_value::<Vec<serde_json::Value>>(value) else {
            return Self::default();
        };
        let projects = items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<Project>(item).ok())
            .collect();
        Self { projects }
    }

    pub fn save(&self, store: &mut dyn Store, bus: &EventBus) -> SaveStatus {
        let status = write_json(store, keys::PROJECTS, &self.projects);
        if status.saved() {
            bus.publish(StoreEvent::ProjectsChanged);
        }
        status
    }

    pub fn add(&mut self, project: Project) -> ProjectId {
        let id = project.id;
        self.projects.push(project);
        id
    }

    pub fn remove(&mut self, id: ProjectId) -> bool {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        self.projects.len() < before
    }

    pub fn get(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// The milestone name a progress key points at, if the key is still valid.
    pub fn milestone(&self, key: &ProgressKey) -> Option<&str> {
        self.get(key.project)?
            .milestones
            .get(key.milestone)
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Footstone
// ---------------------------------------------------------------------------

/// A named checkpoint within a milestone. Plans and updates accumulate on the
/// newest footstone of a chain; older footstones stay in storage but only the
/// chain tail is current.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footstone {
    pub name: String,
    #[serde(default)]
    pub plans: Vec<MediaRef>,
    #[serde(default)]
    pub updates: Vec<MediaRef>,
}

impl Footstone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plans: Vec::new(),
            updates: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProgressTracker
// ---------------------------------------------------------------------------

/// Footstone chains and "started" flags, keyed by (project, milestone).
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    chains: HashMap<ProgressKey, Vec<Footstone>>,
    started: HashSet<ProgressKey>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain keys that no longer parse (identity drift after a project list
    /// rebuild) are dropped silently.
    pub fn load(store: &dyn Store) -> Self {
        let mut chains = HashMap::new();
        if let Some(value) = store.get(keys::FOOTSTONES) {
            if let Ok(stored) = serde_json::from_value::<HashMap<String, Vec<Footstone>>>(value) {
                for (key, chain) in stored {
                    match key.parse::<ProgressKey>() {
                        Ok(key) => {
                            chains.insert(key, chain);
                        }
                        Err(_) => debug!(%key, "dropping footstone chain with a stale key"),
                    }
                }
            }
        }

        let mut started = HashSet::new();
        if let Some(value) = store.get(keys::STARTED) {
            if let Ok(stored) = serde_json::from_value::<Vec<String>>(value) {
                started = stored
                    .into_iter()
                    .filter_map(|key| key.parse::<ProgressKey>().ok())
                    .collect();
            }
        }

        Self { chains, started }
    }

    pub fn save(&self, store: &mut dyn Store, bus: &EventBus) -> SaveStatus {
        let chains: HashMap<String, &Vec<Footstone>> = self
            .chains
            .iter()
            .map(|(key, chain)| (key.to_string(), chain))
            .collect();
        let status = write_json(store, keys::FOOTSTONES, &chains);
        if status.saved() {
            bus.publish(StoreEvent::FootstonesChanged);
        }

        let started: Vec<String> = self.started.iter().map(ProgressKey::to_string).collect();
        status.and(write_json(store, keys::STARTED, &started))
    }

    /// The chain tail, the only footstone that accepts media.
    pub fn current_footstone(&self, key: &ProgressKey) -> Option<&Footstone> {
        self.chains.get(key).and_then(|chain| chain.last())
    }

    /// Whether a chain already exists, so the caller can warn that a new
    /// footstone irreversibly retires the current one.
    pub fn has_existing(&self, key: &ProgressKey) -> bool {
        self.chains.get(key).is_some_and(|chain| !chain.is_empty())
    }

    /// Append a fresh footstone. The previous chain tail becomes permanently
    /// non-current; there is no undo.
    pub fn create_footstone(&mut self, key: ProgressKey, name: impl Into<String>) {
        self.chains
            .entry(key)
            .or_default()
            .push(Footstone::new(name));
    }

    /// Append media to the current footstone, creating one named
    /// `fallback_name` when the chain is empty so media is never dropped.
    pub fn append_media(
        &mut self,
        key: ProgressKey,
        media: MediaRef,
        kind: MediaKind,
        fallback_name: &str,
    ) {
        let chain = self.chains.entry(key).or_default();
        if chain.is_empty() {
            chain.push(Footstone::new(fallback_name));
        }
        // Chain is non-empty here.
        if let Some(current) = chain.last_mut() {
            match kind {
                MediaKind::Plan => current.plans.push(media),
                MediaKind::Update => current.updates.push(media),
            }
        }
    }

    /// The most recent plan on the current footstone ("watch last plan").
    pub fn last_plan_media(&self, key: &ProgressKey) -> Option<&MediaRef> {
        self.current_footstone(key)?.plans.last()
    }

    // -----------------------------------------------------------------------
    // Started flags
    // -----------------------------------------------------------------------

    pub fn started(&self, key: &ProgressKey) -> bool {
        self.started.contains(key)
    }

    pub fn mark_started(&mut self, key: ProgressKey) {
        self.started.insert(key);
    }

    /// Caller-driven invalidation: only an explicit milestone reselection
    /// clears the flag.
    pub fn clear_started(&mut self, key: &ProgressKey) {
        self.started.remove(key);
    }
}

// ---------------------------------------------------------------------------
// PlanCache
// ---------------------------------------------------------------------------

/// Standalone latest-plan-per-key cache, kept alongside the chains so the
/// "watch last plan" flow works even while a chain is being rebuilt.
#[derive(Debug, Clone, Default)]
pub struct PlanCache {
    latest: HashMap<ProgressKey, MediaRef>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(store: &dyn Store) -> Self {
        let Some(value) = store.get(keys::PLAN_VIDEOS) else {
            return Self::default();
        };
        let Ok(stored) = serde_json::from_value::<HashMap<String, MediaRef>>(value) else {
            return Self::default();
        };
        let latest = stored
            .into_iter()
            .filter_map(|(key, media)| Some((key.parse::<ProgressKey>().ok()?, media)))
            .collect();
        Self { latest }
    }

    pub fn save(&self, store: &mut dyn Store) -> SaveStatus {
        let latest: HashMap<String, &MediaRef> = self
            .latest
            .iter()
            .map(|(key, media)| (key.to_string(), media))
            .collect();
        write_json(store, keys::PLAN_VIDEOS, &latest)
    }

    pub fn set(&mut self, key: ProgressKey, media: MediaRef) {
        self.latest.insert(key, media);
    }

    pub fn get(&self, key: &ProgressKey) -> Option<&MediaRef> {
        self.latest.get(key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
