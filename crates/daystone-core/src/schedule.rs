use crate::clock::Clock;
use crate::notes::SlotNotes;
use crate::store::{keys, write_json, Store};
use crate::task::{Recurrence, Task, TaskBook};
use crate::types::{SaveStatus, Slot, TaskId, SLOT_COUNT};
use tracing::debug;

// ---------------------------------------------------------------------------
// AssignOutcome
// ---------------------------------------------------------------------------

/// Result of [`SlotBoard::assign`]. A duplicate assignment is a recoverable
/// no-op, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    Assigned,
    /// The task already occupies another slot; nothing changed.
    AlreadyActive(Slot),
}

// ---------------------------------------------------------------------------
// SlotBoard
// ---------------------------------------------------------------------------

/// The fixed set of "today" slots and the note logs they own. At most one
/// slot holds any given task; assigning, clearing and finishing all keep that
/// invariant and reset the affected slots' notes.
#[derive(Debug, Default)]
pub struct SlotBoard {
    slots: [Option<TaskId>; SLOT_COUNT],
    notes: SlotNotes,
}

impl SlotBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate slots and notes. References to tasks no longer in `book` are
    /// dropped silently, and if the stored state disagrees with the
    /// one-slot-per-task invariant the first occupant wins.
    pub fn load(store: &dyn Store, book: &TaskBook) -> Self {
        let mut slots = [None; SLOT_COUNT];
        if let Some(value) = store.get(keys::SLOTS) {
            if let Ok(stored) = serde_json::from_value::<Vec<Option<TaskId>>>(value) {
                for (i, id) in stored.into_iter().take(SLOT_COUNT).enumerate() {
                    let Some(id) = id else { continue };
                    if !book.contains(id) {
                        debug!(%id, "dropping slot reference to a vanished task");
                        continue;
                    }
                    if slots.contains(&Some(id)) {
                        debug!(%id, "dropping duplicate slot reference");
                        continue;
                    }
                    slots[i] = Some(id);
                }
            }
        }
        Self {
            slots,
            notes: SlotNotes::load(store),
        }
    }

    pub fn save(&self, store: &mut dyn Store) -> SaveStatus {
        write_json(store, keys::SLOTS, &self.slots.as_slice()).and(self.notes.save(store))
    }

    pub fn task_in(&self, slot: Slot) -> Option<TaskId> {
        self.slots[slot.index()]
    }

    pub fn slot_of(&self, id: TaskId) -> Option<Slot> {
        Slot::all()
            .into_iter()
            .find(|s| self.slots[s.index()] == Some(id))
    }

    pub fn notes(&self) -> &SlotNotes {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut SlotNotes {
        &mut self.notes
    }

    /// Tasks scheduled for today, in task-list order. The pool the caller
    /// offers when filling a slot.
    pub fn eligible_today<'a>(&self, book: &'a TaskBook, clock: &dyn Clock) -> Vec<&'a Task> {
        book.active_on(clock.today())
    }

    /// Put `id` into `slot`. Rejected when the task already occupies another
    /// slot. On success the slot's previous notes are cleared.
    pub fn assign(&mut self, slot: Slot, id: TaskId) -> AssignOutcome {
        if let Some(held) = self.slot_of(id) {
            if held != slot {
                return AssignOutcome::AlreadyActive(held);
            }
        }
        self.slots[slot.index()] = Some(id);
        self.notes.clear(slot);
        AssignOutcome::Assigned
    }

    pub fn clear(&mut self, slot: Slot) {
        self.slots[slot.index()] = None;
        self.notes.clear(slot);
    }

    /// Finish the task in `slot`. A `Once` task leaves the book entirely;
    /// recurring tasks stay in the book since they come due again. Either
    /// way every slot holding the task is vacated and its notes cleared, so
    /// a finished task cannot remain active anywhere.
    pub fn finish(&mut self, slot: Slot, book: &mut TaskBook) -> Option<TaskId> {
        let id = self.slots[slot.index()]?;
        if book.get(id).map(|t| t.recurrence) == Some(Recurrence::Once) {
            book.remove(id);
        }
        for s in Slot::all() {
            if self.slots[s.index()] == Some(id) {
                self.slots[s.index()] = None;
                self.notes.clear(s);
            }
        }
        Some(id)
    }

    /// Drop references to tasks that vanished from the book under us (the
    /// list was mutated elsewhere and re-read after a `TasksChanged` event).
    pub fn reconcile(&mut self, book: &TaskBook) {
        for s in Slot::all() {
            if let Some(id) = self.slots[s.index()] {
                if !book.contains(id) {
                    debug!(%id, slot = %s, "vacating slot for a removed task");
                    self.slots[s.index()] = None;
                    self.notes.clear(s);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
