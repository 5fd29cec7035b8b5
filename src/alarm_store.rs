use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::{alarm::Alarm, error::StoreError, json_file::JsonFile};

/// the alarm collection on disk, one json array
#[derive(Debug, Clone)]
pub struct AlarmStore {
    file: JsonFile,
}

impl AlarmStore {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// never fails: a missing file is an empty collection and a broken one is
    /// logged and treated the same way
    #[must_use]
    pub fn load(&self, now: NaiveDateTime) -> Vec<Alarm> {
        match self.try_load(now) {
            Ok(alarms) => {
                log::debug!(
                    "loaded {} alarms from {}",
                    alarms.len(),
                    self.path().display()
                );
                alarms
            }
            Err(e) => {
                log::error!("error loading alarms: {e}");
                Vec::new()
            }
        }
    }

    /// alarms without an id get one derived from `now`
    pub fn try_load(&self, now: NaiveDateTime) -> Result<Vec<Alarm>, StoreError> {
        let mut alarms: Vec<Alarm> = self.file.read()?;
        for alarm in alarms.iter_mut().filter(|alarm| alarm.id.is_empty()) {
            alarm.id = Alarm::make_id(alarm.time, now);
        }
        Ok(alarms)
    }

    /// best effort, the caller's copy stays authoritative if this fails
    pub fn save(&self, alarms: &[Alarm]) {
        match self.try_save(alarms) {
            Ok(()) => log::debug!("saved {} alarms to {}", alarms.len(), self.path().display()),
            Err(e) => log::error!("error saving alarms: {e}"),
        }
    }

    pub fn try_save(&self, alarms: &[Alarm]) -> Result<(), StoreError> {
        self.file.write(alarms)
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid datetime")
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    #[test]
    fn load__should_return_empty_when_file_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AlarmStore::new(dir.path().join("alarms.json"));

        assert!(store.load(now()).is_empty());
    }

    #[test]
    fn load__should_return_empty_when_file_corrupt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("alarms.json");
        std::fs::write(&path, "{ not json").expect("write");

        let store = AlarmStore::new(path);

        assert!(store.load(now()).is_empty());
        assert!(store.try_load(now()).is_err());
    }

    #[test]
    fn save__should_round_trip_every_field() {
        // Given
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AlarmStore::new(dir.path().join("alarms.json"));
        let alarms = vec![
            Alarm::new(time(8, 0), now()).with_label("Gym"),
            Alarm::new(time(22, 45), now())
                .with_auto_dismiss(false, 300)
                .with_enabled(false),
        ];

        // When
        store.save(&alarms);
        let loaded = store.load(now());

        // Then
        assert_eq!(loaded, alarms);
    }

    #[test]
    fn save__should_write_documented_format() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AlarmStore::new(dir.path().join("alarms.json"));

        store.save(&[Alarm::new(time(7, 5), now()).with_label("Early")]);

        let raw = std::fs::read_to_string(store.path()).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(
            value,
            serde_json::json!([{
                "id": "07:05_20240101120000",
                "time": "07:05",
                "auto_dismiss": true,
                "duration": 60,
                "enabled": true,
                "label": "Early"
            }])
        );
    }

    #[test]
    fn try_load__should_assign_missing_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("alarms.json");
        std::fs::write(&path, r#"[{"time": "06:30", "label": "old"}]"#).expect("write");

        let alarms = AlarmStore::new(path).try_load(now()).expect("load");

        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].id, "06:30_20240101120000");
    }

    #[test]
    fn save__should_not_panic_when_path_unwritable() {
        let dir = tempfile::tempdir().expect("tempdir");
        // a directory where the file should be
        let store = AlarmStore::new(dir.path().to_path_buf());

        store.save(&[Alarm::new(time(7, 5), now())]);

        assert!(store.try_save(&[]).is_err());
    }
}
