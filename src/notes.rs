use std::{collections::BTreeSet, path::PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{error::StoreError, json_file::JsonFile};

pub const DEFAULT_NOTE_CATEGORY: &str = "General";

fn default_category() -> String {
    DEFAULT_NOTE_CATEGORY.to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub created: NaiveDateTime,
}

impl Note {
    /// the id is the creation time in unix seconds
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        category: Option<String>,
        created: NaiveDateTime,
    ) -> Self {
        Self {
            id: created.and_utc().timestamp().to_string(),
            title: title.into(),
            content: content.into(),
            category: category
                .filter(|category| !category.trim().is_empty())
                .unwrap_or_else(default_category),
            created,
        }
    }
}

/// notes kept in a pretty printed json array, saved after every change
#[derive(Debug)]
pub struct NoteStore {
    file: JsonFile,
    notes: Vec<Note>,
}

impl NoteStore {
    /// a missing file opens empty. so does a broken one, after logging it.
    #[must_use]
    pub fn open(path: PathBuf) -> Self {
        let file = JsonFile::new(path).pretty();
        let notes = match file.read() {
            Ok(notes) => {
                log::info!("loaded {} notes from {}", notes.len(), file.path().display());
                notes
            }
            Err(e) => {
                log::error!("error loading notes: {e}");
                Vec::new()
            }
        };
        Self { file, notes }
    }

    #[must_use]
    pub fn notes(&self, category: Option<&str>) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|note| category.map_or(true, |category| note.category == category))
            .collect()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// sorted, and always offers the default category
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut categories: BTreeSet<String> =
            self.notes.iter().map(|note| note.category.clone()).collect();
        categories.insert(default_category());
        categories.into_iter().collect()
    }

    /// ids are second resolution, a clash gets a numeric suffix
    pub fn add(&mut self, mut note: Note) -> &Note {
        if self.get(&note.id).is_some() {
            let base = note.id.clone();
            let mut n = 1;
            while self.get(&format!("{base}-{n}")).is_some() {
                n += 1;
            }
            note.id = format!("{base}-{n}");
        }
        log::info!("added note {}", note.id);
        self.notes.push(note);
        self.save();
        &self.notes[self.notes.len() - 1]
    }

    /// replaces the note with the same id
    pub fn update(&mut self, note: Note) -> bool {
        let Some(existing) = self.notes.iter_mut().find(|existing| existing.id == note.id) else {
            return false;
        };
        *existing = note;
        self.save();
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);
        if self.notes.len() == before {
            return false;
        }
        log::info!("removed note {id}");
        self.save();
        true
    }

    pub fn try_save(&self) -> Result<(), StoreError> {
        self.file.write(&self.notes)
    }

    fn save(&self) {
        match self.try_save() {
            Ok(()) => log::info!(
                "saved {} notes to {}",
                self.notes.len(),
                self.file.path().display()
            ),
            Err(e) => log::error!("error saving notes: {e}"),
        }
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("valid datetime")
    }

    #[test]
    fn add__should_persist_to_file() {
        // Given
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.json");
        let mut store = NoteStore::open(path.clone());

        // When
        store.add(Note::new("Groceries", "milk", Some("Home".to_string()), at(9, 0)));
        let reopened = NoteStore::open(path);

        // Then
        let notes = reopened.notes(None);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Groceries");
        assert_eq!(notes[0].category, "Home");
        assert_eq!(notes[0].created, at(9, 0));
    }

    #[test]
    fn save__should_write_iso_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.json");
        let mut store = NoteStore::open(path.clone());

        store.add(Note::new("a", "b", None, at(9, 0)));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).expect("read")).expect("json");
        assert_eq!(raw[0]["created"], "2024-01-01T09:00:00");
        assert_eq!(raw[0]["category"], "General");
        assert_eq!(raw[0]["id"], "1704099600");
    }

    #[test]
    fn add__should_disambiguate_same_second_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = NoteStore::open(dir.path().join("notes.json"));

        let first = store.add(Note::new("a", "", None, at(9, 0))).id.clone();
        let second = store.add(Note::new("b", "", None, at(9, 0))).id.clone();

        assert_ne!(first, second);
        assert_eq!(second, format!("{first}-1"));
    }

    #[test]
    fn update_and_remove__should_report_unknown_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = NoteStore::open(dir.path().join("notes.json"));
        let mut note = store.add(Note::new("a", "", None, at(9, 0))).clone();

        note.content = "edited".to_string();
        assert!(store.update(note.clone()));
        assert_eq!(store.get(&note.id).map(|n| n.content.as_str()), Some("edited"));

        assert!(store.remove(&note.id));
        assert!(!store.remove(&note.id));
        assert!(!store.update(note));
    }

    #[test]
    fn categories__should_be_sorted_and_include_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = NoteStore::open(dir.path().join("notes.json"));
        store.add(Note::new("a", "", Some("Work".to_string()), at(9, 0)));
        store.add(Note::new("b", "", Some("Home".to_string()), at(9, 1)));
        store.add(Note::new("c", "", Some("Work".to_string()), at(9, 2)));

        assert_eq!(store.categories(), vec!["General", "Home", "Work"]);
        assert_eq!(store.notes(Some("Work")).len(), 2);
    }

    #[test]
    fn open__should_start_empty_for_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "nonsense").expect("write");

        assert!(NoteStore::open(path).notes(None).is_empty());
    }
}
