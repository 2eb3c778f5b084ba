use daystone_core::events::EventBus;
use daystone_core::progress::{PlanCache, ProgressTracker, ProjectBook};
use daystone_core::store::Store;
use daystone_core::types::{MediaKind, MediaRef, ProgressKey, SaveStatus};

// ---------------------------------------------------------------------------
// ProgressSink
// ---------------------------------------------------------------------------

/// Where completed recordings land. Split out as a trait so the session
/// manager can be exercised without a store behind it.
pub trait ProgressSink {
    fn record_update(&mut self, key: &ProgressKey, media: MediaRef) -> SaveStatus;

    fn record_plan(&mut self, key: &ProgressKey, media: MediaRef) -> SaveStatus;
}

// ---------------------------------------------------------------------------
// MilestoneSink
// ---------------------------------------------------------------------------

/// The canonical sink: appends to the footstone chain of the target
/// milestone, mirrors plans into the plan cache, and flushes through the
/// store. When the chain is empty the auto-created footstone borrows the
/// project's display name.
pub struct MilestoneSink<'a, S: Store> {
    pub projects: &'a ProjectBook,
    pub tracker: &'a mut ProgressTracker,
    pub plans: &'a mut PlanCache,
    pub store: &'a mut S,
    pub bus: &'a EventBus,
}

impl<S: Store> MilestoneSink<'_, S> {
    fn fallback_name(&self, key: &ProgressKey) -> String {
        self.projects
            .get(key.project)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "Untitled project".to_string())
    }
}

impl<S: Store> ProgressSink for MilestoneSink<'_, S> {
    fn record_update(&mut self, key: &ProgressKey, media: MediaRef) -> SaveStatus {
        let fallback = self.fallback_name(key);
        self.tracker
            .append_media(*key, media, MediaKind::Update, &fallback);
        self.tracker.save(self.store, self.bus)
    }

    fn record_plan(&mut self, key: &ProgressKey, media: MediaRef) -> SaveStatus {
        let fallback = self.fallback_name(key);
        self.tracker
            .append_media(*key, media.clone(), MediaKind::Plan, &fallback);
        self.plans.set(*key, media);
        self.tracker
            .save(self.store, self.bus)
            .and(self.plans.save(self.store))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use daystone_core::progress::Project;
    use daystone_core::store::MemoryStore;

    fn media(uri: &str) -> MediaRef {
        MediaRef::new(uri).unwrap()
    }

    fn setup() -> (ProjectBook, ProgressKey) {
        let mut projects = ProjectBook::new();
        let id = projects.add(Project::new("Treehouse", vec!["frame".into()]));
        (projects, ProgressKey::new(id, 0))
    }

    #[test]
    fn update_lands_on_chain_only() {
        let (projects, key) = setup();
        let mut tracker = ProgressTracker::new();
        let mut plans = PlanCache::new();
        let mut store = MemoryStore::new();
        let bus = EventBus::default();

        let mut sink = MilestoneSink {
            projects: &projects,
            tracker: &mut tracker,
            plans: &mut plans,
            store: &mut store,
            bus: &bus,
        };
        let status = sink.record_update(&key, media("file:///u.mp4"));
        assert!(status.saved());

        assert_eq!(
            tracker.current_footstone(&key).unwrap().updates,
            vec![media("file:///u.mp4")]
        );
        assert!(plans.get(&key).is_none());
    }

    #[test]
    fn plan_lands_on_chain_and_cache() {
        let (projects, key) = setup();
        let mut tracker = ProgressTracker::new();
        let mut plans = PlanCache::new();
        let mut store = MemoryStore::new();
        let bus = EventBus::default();

        let mut sink = MilestoneSink {
            projects: &projects,
            tracker: &mut tracker,
            plans: &mut plans,
            store: &mut store,
            bus: &bus,
        };
        let status = sink.record_plan(&key, media("file:///p.mp4"));
        assert!(status.saved());

        assert_eq!(
            tracker.current_footstone(&key).unwrap().plans,
            vec![media("file:///p.mp4")]
        );
        assert_eq!(plans.get(&key), Some(&media("file:///p.mp4")));
        assert_eq!(tracker.last_plan_media(&key), Some(&media("file:///p.mp4")));
    }

    #[test]
    fn empty_chain_footstone_borrows_project_name() {
        let (projects, key) = setup();
        let mut tracker = ProgressTracker::new();
        let mut plans = PlanCache::new();
        let mut store = MemoryStore::new();
        let bus = EventBus::default();

        let mut sink = MilestoneSink {
            projects: &projects,
            tracker: &mut tracker,
            plans: &mut plans,
            store: &mut store,
            bus: &bus,
        };
        sink.record_update(&key, media("file:///u.mp4"));
        assert_eq!(tracker.current_footstone(&key).unwrap().name, "Treehouse");
    }
}
