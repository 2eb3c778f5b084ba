use crate::store::{keys, write_json, Store};
use crate::types::{MediaRef, SaveStatus, Slot, SLOT_COUNT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NoteEntry
// ---------------------------------------------------------------------------

/// One annotation on an active slot: free text, a voice memo reference, or
/// both. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<MediaRef>,
    pub at: DateTime<Utc>,
}

impl NoteEntry {
    /// A text note. Whitespace-only input means the user cancelled; `None`.
    pub fn text(text: &str, at: DateTime<Utc>) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            text: Some(trimmed.to_string()),
            voice: None,
            at,
        })
    }

    pub fn voice(voice: MediaRef, at: DateTime<Utc>) -> Self {
        Self {
            text: None,
            voice: Some(voice),
            at,
        }
    }

    fn is_blank(&self) -> bool {
        self.text.as_deref().map_or(true, |t| t.trim().is_empty()) && self.voice.is_none()
    }
}

// ---------------------------------------------------------------------------
// SlotNotes
// ---------------------------------------------------------------------------

/// Append-only note lists, one per slot. Stored in insertion order; rendering
/// newest-first is a view concern, so `display` sorts a borrowed copy and the
/// stored lists are never reordered.
#[derive(Debug, Clone, Default)]
pub struct SlotNotes {
    lists: [Vec<NoteEntry>; SLOT_COUNT],
}

impl SlotNotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(store: &dyn Store) -> Self {
        if let Some(value) = store.get(keys::SLOT_NOTES) {
            if let Ok(stored) = serde_json::from_value::<Vec<Vec<NoteEntry>>>(value) {
                let mut lists: [Vec<NoteEntry>; SLOT_COUNT] = Default::default();
                for (i, list) in stored.into_iter().take(SLOT_COUNT).enumerate() {
                    lists[i] = list.into_iter().filter(|e| !e.is_blank()).collect();
                }
                return Self { lists };
            }
        }
        // Legacy shape: one plain string per slot, no timestamps.
        if let Some(value) = store.get(keys::SLOT_NOTE_TEXTS) {
            if let Ok(texts) = serde_json::from_value::<Vec<String>>(value) {
                let mut lists: [Vec<NoteEntry>; SLOT_COUNT] = Default::default();
                for (i, text) in texts.into_iter().take(SLOT_COUNT).enumerate() {
                    if let Some(entry) = NoteEntry::text(&text, DateTime::UNIX_EPOCH) {
                        lists[i] = vec![entry];
                    }
                }
                return Self { lists };
            }
        }
        Self::default()
    }

    pub fn save(&self, store: &mut dyn Store) -> SaveStatus {
        write_json(store, keys::SLOT_NOTES, &self.lists)
    }

    /// Returns `true` if the note was appended; a cancelled (blank) entry is
    /// dropped without error.
    pub fn append_text(&mut self, slot: Slot, text: &str, at: DateTime<Utc>) -> bool {
        match NoteEntry::text(text, at) {
            Some(entry) => {
                self.lists[slot.index()].push(entry);
                true
            }
            None => false,
        }
    }

    pub fn append_voice(&mut self, slot: Slot, voice: MediaRef, at: DateTime<Utc>) {
        self.lists[slot.index()].push(NoteEntry::voice(voice, at));
    }

    pub fn clear(&mut self, slot: Slot) {
        self.lists[slot.index()].clear();
    }

    /// Insertion order, as stored.
    pub fn entries(&self, slot: Slot) -> &[NoteEntry] {
        &self.lists[slot.index()]
    }

    /// Newest first, for rendering. Ties keep insertion order.
    pub fn display(&self, slot: Slot) -> Vec<&NoteEntry> {
        let mut view: Vec<&NoteEntry> = self.lists[slot.index()].iter().collect();
        view.sort_by(|a, b| b.at.cmp(&a.at));
        view
    }

    pub fn is_empty(&self, slot: Slot) -> bool {
        self.lists[slot.index()].is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration;
    use serde_json::json;

    fn at(offset_secs: i64) -> DateTime<Utc> {
        "2024-04-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap() + Duration::seconds(offset_secs)
    }

    fn slot(i: usize) -> Slot {
        Slot::new(i).unwrap()
    }

    #[test]
    fn blank_text_is_dropped_silently() {
        let mut notes = SlotNotes::new();
        assert!(!notes.append_text(slot(0), "   ", at(0)));
        assert!(!notes.append_text(slot(0), "", at(0)));
        assert!(notes.is_empty(slot(0)));
    }

    #[test]
    fn text_is_trimmed() {
        let mut notes = SlotNotes::new();
        assert!(notes.append_text(slot(1), "  buy soil  ", at(0)));
        assert_eq!(notes.entries(slot(1))[0].text.as_deref(), Some("buy soil"));
    }

    #[test]
    fn storage_order_is_insertion_order_regardless_of_display() {
        let mut notes = SlotNotes::new();
        // Insert out of chronological order.
        notes.append_text(slot(0), "second", at(10));
        notes.append_text(slot(0), "first", at(0));
        notes.append_text(slot(0), "third", at(20));

        let stored: Vec<&str> = notes
            .entries(slot(0))
            .iter()
            .map(|e| e.text.as_deref().unwrap())
            .collect();
        assert_eq!(stored, vec!["second", "first", "third"]);

        let displayed: Vec<&str> = notes
            .display(slot(0))
            .iter()
            .map(|e| e.text.as_deref().unwrap())
            .collect();
        assert_eq!(displayed, vec!["third", "second", "first"]);

        // Display must not reorder storage.
        let stored_again: Vec<&str> = notes
            .entries(slot(0))
            .iter()
            .map(|e| e.text.as_deref().unwrap())
            .collect();
        assert_eq!(stored_again, vec!["second", "first", "third"]);
    }

    #[test]
    fn voice_notes_append() {
        let mut notes = SlotNotes::new();
        let memo = MediaRef::new("file:///memo.m4a").unwrap();
        notes.append_voice(slot(2), memo.clone(), at(0));
        assert_eq!(notes.entries(slot(2))[0].voice.as_ref(), Some(&memo));
        assert!(notes.entries(slot(2))[0].text.is_none());
    }

    #[test]
    fn clear_empties_one_slot_only() {
        let mut notes = SlotNotes::new();
        notes.append_text(slot(0), "keep", at(0));
        notes.append_text(slot(1), "drop", at(0));
        notes.clear(slot(1));
        assert!(!notes.is_empty(slot(0)));
        assert!(notes.is_empty(slot(1)));
    }

    #[test]
    fn roundtrip_through_store() {
        let mut store = MemoryStore::new();
        let mut notes = SlotNotes::new();
        notes.append_text(slot(0), "watered", at(0));
        notes.append_voice(slot(0), MediaRef::new("file:///memo.m4a").unwrap(), at(5));
        assert!(notes.save(&mut store).saved());

        let loaded = SlotNotes::load(&store);
        assert_eq!(loaded.entries(slot(0)).len(), 2);
        assert_eq!(loaded.entries(slot(0)), notes.entries(slot(0)));
    }

    #[test]
    fn legacy_plain_text_notes_are_lifted() {
        let mut store = MemoryStore::new();
        store
            .set(keys::SLOT_NOTE_TEXTS, json!(["old note", "", "  "]))
            .unwrap();
        let notes = SlotNotes::load(&store);
        assert_eq!(notes.entries(slot(0))[0].text.as_deref(), Some("old note"));
        assert!(notes.is_empty(slot(1)));
        assert!(notes.is_empty(slot(2)));
    }

    #[test]
    fn note_list_shape_wins_over_legacy() {
        let mut store = MemoryStore::new();
        store.set(keys::SLOT_NOTE_TEXTS, json!(["legacy"])).unwrap();
        let mut notes = SlotNotes::new();
        notes.append_text(slot(0), "current", at(0));
        assert!(notes.save(&mut store).saved());

        let loaded = SlotNotes::load(&store);
        assert_eq!(loaded.entries(slot(0))[0].text.as_deref(), Some("current"));
    }
}
