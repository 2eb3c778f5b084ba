use crate::progress::{ProgressTracker, ProjectBook};
use crate::store::{keys, write_json, Store};
use crate::types::{ProgressKey, ProjectId, SaveStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// FocusState
// ---------------------------------------------------------------------------

/// The active project and, once the user picks one, the active milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusState {
    pub project: ProjectId,
    pub milestone: Option<usize>,
}

impl FocusState {
    pub fn progress_key(&self) -> Option<ProgressKey> {
        self.milestone
            .map(|milestone| ProgressKey::new(self.project, milestone))
    }
}

/// Persisted form: carries a name snapshot so the selection can survive a
/// project list rebuild that reassigned ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredFocus {
    project: ProjectId,
    milestone: Option<usize>,
    name: String,
}

// ---------------------------------------------------------------------------
// Focus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Focus {
    active: Option<FocusState>,
}

impl Focus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate the selection. When the stored id no longer exists, fall
    /// back to a name match (keeping only the project; the milestone index
    /// is meaningless against a rebuilt list); when that fails too, the
    /// selection clears silently.
    pub fn load(store: &dyn Store, projects: &ProjectBook) -> Self {
        let Some(value) = store.get(keys::ACTIVE_FOCUS) else {
            return Self::default();
        };
        let Ok(stored) = serde_json::from_value::<StoredFocus>(value) else {
            return Self::default();
        };
        if projects.get(stored.project).is_some() {
            return Self {
                active: Some(FocusState {
                    project: stored.project,
                    milestone: stored.milestone,
                }),
            };
        }
        if let Some(found) = projects.find_by_name(&stored.name) {
            debug!(name = %stored.name, "re-binding focus to a rebuilt project by name");
            return Self {
                active: Some(FocusState {
                    project: found.id,
                    milestone: None,
                }),
            };
        }
        debug!("dropping focus on a project that no longer exists");
        Self::default()
    }

    pub fn save(&self, store: &mut dyn Store, projects: &ProjectBook) -> SaveStatus {
        let stored = self.active.map(|state| StoredFocus {
            project: state.project,
            milestone: state.milestone,
            name: projects
                .get(state.project)
                .map(|p| p.name.clone())
                .unwrap_or_default(),
        });
        write_json(store, keys::ACTIVE_FOCUS, &stored)
    }

    pub fn current(&self) -> Option<FocusState> {
        self.active
    }

    pub fn progress_key(&self) -> Option<ProgressKey> {
        self.active.and_then(|state| state.progress_key())
    }

    pub fn select_project(&mut self, project: ProjectId) {
        self.active = Some(FocusState {
            project,
            milestone: None,
        });
    }

    /// Select a milestone. This re-arms the "start project" flow for the key:
    /// explicit reselection is the one thing that clears a started flag.
    pub fn select_milestone(
        &mut self,
        project: ProjectId,
        milestone: usize,
        tracker: &mut ProgressTracker,
    ) {
        self.active = Some(FocusState {
            project,
            milestone: Some(milestone),
        });
        tracker.clear_started(&ProgressKey::new(project, milestone));
    }

    /// "Move on": no project is active.
    pub fn clear(&mut self) {
        self.active = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::progress::Project;
    use crate::store::MemoryStore;

    fn book_with(name: &str) -> (ProjectBook, ProjectId) {
        let mut book = ProjectBook::new();
        let id = book.add(Project::new(name, vec!["one".into(), "two".into()]));
        (book, id)
    }

    #[test]
    fn select_milestone_clears_started_flag() {
        let (_, id) = book_with("Treehouse");
        let key = ProgressKey::new(id, 1);

        let mut tracker = ProgressTracker::new();
        tracker.mark_started(key);

        let mut focus = Focus::new();
        focus.select_milestone(id, 1, &mut tracker);
        assert!(!tracker.started(&key));
        assert_eq!(focus.progress_key(), Some(key));
    }

    #[test]
    fn select_project_leaves_milestone_unset() {
        let (_, id) = book_with("Treehouse");
        let mut focus = Focus::new();
        focus.select_project(id);
        assert_eq!(focus.current().unwrap().milestone, None);
        assert!(focus.progress_key().is_none());
    }

    #[test]
    fn roundtrip_keeps_selection() {
        let (book, id) = book_with("Treehouse");
        let mut store = MemoryStore::new();
        let mut tracker = ProgressTracker::new();

        let mut focus = Focus::new();
        focus.select_milestone(id, 0, &mut tracker);
        assert!(focus.save(&mut store, &book).saved());

        let loaded = Focus::load(&store, &book);
        assert_eq!(loaded.progress_key(), Some(ProgressKey::new(id, 0)));
    }

    #[test]
    fn rebuilt_project_rebinds_by_name_without_milestone() {
        let (book, id) = book_with("Treehouse");
        let mut store = MemoryStore::new();
        let mut tracker = ProgressTracker::new();

        let mut focus = Focus::new();
        focus.select_milestone(id, 1, &mut tracker);
        focus.save(&mut store, &book);

        // The list is rebuilt elsewhere: same name, new id.
        let bus = EventBus::default();
        let mut rebuilt = ProjectBook::new();
        let new_id = rebuilt.add(Project::new("Treehouse", vec!["one".into()]));
        rebuilt.save(&mut store, &bus);

        let loaded = Focus::load(&store, &rebuilt);
        let state = loaded.current().unwrap();
        assert_eq!(state.project, new_id);
        assert_eq!(state.milestone, None);
    }

    #[test]
    fn vanished_project_clears_selection() {
        let (book, id) = book_with("Treehouse");
        let mut store = MemoryStore::new();

        let mut focus = Focus::new();
        focus.select_project(id);
        focus.save(&mut store, &book);

        let empty = ProjectBook::new();
        let loaded = Focus::load(&store, &empty);
        assert!(loaded.current().is_none());
    }

    #[test]
    fn cleared_focus_roundtrips_as_none() {
        let (book, id) = book_with("Treehouse");
        let mut store = MemoryStore::new();

        let mut focus = Focus::new();
        focus.select_project(id);
        focus.clear();
        focus.save(&mut store, &book);

        let loaded = Focus::load(&store, &book);
        assert!(loaded.current().is_none());
    }
}
