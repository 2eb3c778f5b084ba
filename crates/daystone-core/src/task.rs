use crate::events::{EventBus, StoreEvent};
use crate::store::{keys, write_json, Store};
use crate::types::{SaveStatus, TaskId};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ---------------------------------------------------------------------------
// Recurrence
// ---------------------------------------------------------------------------

/// How a task repeats from its anchor date. `Daily` predates the current
/// picker and is only kept so old data keeps evaluating; unrecognized stored
/// values fall back to `Once`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Recurrence {
    Once,
    Weekly,
    Monthly,
    Daily,
}

impl Recurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::Once => "Once",
            Recurrence::Weekly => "Weekly",
            Recurrence::Monthly => "Monthly",
            Recurrence::Daily => "Daily",
        }
    }
}

impl From<String> for Recurrence {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Weekly" => Recurrence::Weekly,
            "Monthly" => Recurrence::Monthly,
            "Daily" => Recurrence::Daily,
            _ => Recurrence::Once,
        }
    }
}

impl From<Recurrence> for String {
    fn from(r: Recurrence) -> Self {
        r.as_str().to_string()
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Household,
    Hobby,
    Education,
    Personal,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Household => "Household",
            Category::Hobby => "Hobby",
            Category::Education => "Education",
            Category::Personal => "Personal",
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Household" => Category::Household,
            "Hobby" => Category::Hobby,
            "Education" => Category::Education,
            _ => Category::Personal,
        }
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Assigned at creation; records written before ids existed get a fresh
    /// one on load.
    #[serde(default)]
    pub id: TaskId,
    pub name: String,
    /// ISO `yyyy-mm-dd`, kept as entered. An unparseable date makes the task
    /// evaluate inactive everywhere instead of poisoning the whole list.
    pub anchor_date: String,
    #[serde(default = "default_recurrence")]
    pub recurrence: Recurrence,
    #[serde(default = "default_category")]
    pub category: Category,
}

fn default_recurrence() -> Recurrence {
    Recurrence::Once
}

fn default_category() -> Category {
    Category::Personal
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        anchor_date: impl Into<String>,
        recurrence: Recurrence,
        category: Category,
    ) -> Self {
        Self {
            id: TaskId::new(),
            name: name.into(),
            anchor_date: anchor_date.into(),
            recurrence,
            category,
        }
    }

    pub fn anchor(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.anchor_date.trim(), "%Y-%m-%d").ok()
    }
}

// ---------------------------------------------------------------------------
// Recurrence evaluation
// ---------------------------------------------------------------------------

/// Whether `task` is scheduled on `date`.
///
/// `Weekly` fires on the anchor weekday, `Monthly` on the anchor day-of-month,
/// both only on or after the anchor. A monthly anchor on the 29th–31st never
/// fires in a month without that day; no clamping to the last day is done.
/// `Once` fires on the anchor day exactly, and a malformed anchor date is
/// inactive everywhere.
pub fn is_active_on(task: &Task, date: NaiveDate) -> bool {
    let Some(anchor) = task.anchor() else {
        return false;
    };
    let same_or_after = date >= anchor;
    match task.recurrence {
        Recurrence::Weekly => same_or_after && date.weekday() == anchor.weekday(),
        Recurrence::Monthly => same_or_after && date.day() == anchor.day(),
        Recurrence::Daily => same_or_after,
        Recurrence::Once => date == anchor,
    }
}

// ---------------------------------------------------------------------------
// TaskBook
// ---------------------------------------------------------------------------

/// In-memory projection of the task list, rehydrated from the store and
/// re-read whenever a `TasksChanged` event arrives.
#[derive(Debug, Clone, Default)]
pub struct TaskBook {
    tasks: Vec<Task>,
}

impl TaskBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that fail to parse are dropped, not surfaced.
    pub fn load(store: &dyn Store) -> Self {
        let Some(value) = store.get(keys::TASKS) else {
            return Self::default();
        };
        let Ok(items) = serde_json::from_value::<Vec<serde_json::Value>>(value) else {
            debug!("stored task list is not an array; starting empty");
            return Self::default();
        };
        let tasks = items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<Task>(item).ok())
            .collect();
        Self { tasks }
    }

    pub fn save(&self, store: &mut dyn Store, bus: &EventBus) -> SaveStatus {
        let status = write_json(store, keys::TASKS, &self.tasks);
        if status.saved() {
            bus.publish(StoreEvent::TasksChanged);
        }
        status
    }

    pub fn add(&mut self, task: Task) -> TaskId {
        let id = task.id;
        self.tasks.push(task);
        id
    }

    pub fn remove(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() < before
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks scheduled on `date`, in list order.
    pub fn active_on(&self, date: NaiveDate) -> Vec<&Task> {
        self.tasks.iter().filter(|t| is_active_on(t, date)).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn unknown_recurrence_becomes_once() {
        let r: Recurrence = serde_json::from_value(json!("Fortnightly")).unwrap();
        assert_eq!(r, Recurrence::Once);
        let c: Category = serde_json::from_value(json!("Gardening")).unwrap();
        assert_eq!(c, Category::Personal);
    }

    #[test]
    fn once_fires_on_anchor_day_only() {
        let task = Task::new("Dentist", "2024-03-15", Recurrence::Once, Category::Personal);
        assert!(is_active_on(&task, date("2024-03-15")));
        assert!(!is_active_on(&task, date("2024-03-14")));
        assert!(!is_active_on(&task, date("2024-03-16")));
    }

    #[test]
    fn weekly_fires_on_anchor_weekday_on_or_after() {
        // 2024-01-01 is a Monday.
        let task = Task::new("Water plants", "2024-01-01", Recurrence::Weekly, Category::Household);
        assert!(is_active_on(&task, date("2024-01-01")));
        assert!(is_active_on(&task, date("2024-01-08")));
        assert!(!is_active_on(&task, date("2024-01-09")));
        // Earlier Mondays don't count.
        assert!(!is_active_on(&task, date("2023-12-25")));
    }

    #[test]
    fn monthly_fires_on_anchor_day_of_month() {
        let task = Task::new("Rent", "2024-01-05", Recurrence::Monthly, Category::Household);
        assert!(is_active_on(&task, date("2024-01-05")));
        assert!(is_active_on(&task, date("2024-02-05")));
        assert!(!is_active_on(&task, date("2024-02-06")));
        assert!(!is_active_on(&task, date("2023-12-05")));
    }

    #[test]
    fn monthly_day_31_never_fires_in_february() {
        let task = Task::new("Backup", "2024-01-31", Recurrence::Monthly, Category::Education);
        let mut day = date("2024-02-01");
        while day < date("2024-03-01") {
            assert!(!is_active_on(&task, day), "unexpected hit on {day}");
            day = day.succ_opt().unwrap();
        }
        // But it fires again in March.
        assert!(is_active_on(&task, date("2024-03-31")));
    }

    #[test]
    fn daily_fires_every_day_on_or_after() {
        let task = Task::new("Stretch", "2024-06-10", Recurrence::Daily, Category::Personal);
        assert!(!is_active_on(&task, date("2024-06-09")));
        assert!(is_active_on(&task, date("2024-06-10")));
        assert!(is_active_on(&task, date("2025-02-01")));
    }

    #[test]
    fn malformed_anchor_is_inactive() {
        let task = Task::new("Broken", "someday", Recurrence::Daily, Category::Personal);
        assert!(!is_active_on(&task, date("2024-06-10")));
        let task = Task::new("Blank", "", Recurrence::Weekly, Category::Personal);
        assert!(!is_active_on(&task, date("2024-06-10")));
    }

    #[test]
    fn book_add_remove() {
        let mut book = TaskBook::new();
        let id = book.add(Task::new("A", "2024-01-01", Recurrence::Once, Category::Personal));
        assert!(book.contains(id));
        assert!(book.remove(id));
        assert!(!book.remove(id));
        assert!(book.is_empty());
    }

    #[test]
    fn book_roundtrip_through_store() {
        let mut store = MemoryStore::new();
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let mut book = TaskBook::new();
        let id = book.add(Task::new("Water plants", "2024-01-01", Recurrence::Weekly, Category::Household));
        assert!(book.save(&mut store, &bus).saved());
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::TasksChanged);

        let loaded = TaskBook::load(&store);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get(id).unwrap().name, "Water plants");
        assert_eq!(loaded.get(id).unwrap().recurrence, Recurrence::Weekly);
    }

    #[test]
    fn load_drops_malformed_records() {
        let mut store = MemoryStore::new();
        store
            .set(
                keys::TASKS,
                json!([
                    {"name": "Good", "anchor_date": "2024-01-01"},
                    {"missing": "name"},
                    42
                ]),
            )
            .unwrap();
        let book = TaskBook::load(&store);
        assert_eq!(book.len(), 1);
        let task = book.iter().next().unwrap();
        assert_eq!(task.name, "Good");
        // Legacy record without an id got a fresh one.
        assert_eq!(task.recurrence, Recurrence::Once);
        assert_eq!(task.category, Category::Personal);
    }

    #[test]
    fn active_on_keeps_list_order() {
        let mut book = TaskBook::new();
        book.add(Task::new("First", "2024-01-01", Recurrence::Daily, Category::Personal));
        book.add(Task::new("Never", "2099-01-01", Recurrence::Daily, Category::Personal));
        book.add(Task::new("Second", "2024-01-01", Recurrence::Daily, Category::Hobby));
        let active = book.active_on(date("2024-05-01"));
        let names: Vec<&str> = active.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }
}
