//! File-backed store for the timer list and calendar marker

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{
    clock::CalendarMarker,
    error::Result,
    state::SavedState,
    timer::TimerRecord,
};

pub const TIMERS_FILE: &str = "timers.json";
pub const MARKERS_FILE: &str = "days.txt";

/// Reads and writes `timers.json` (JSON array of timer records) and
/// `days.txt` (`"<day> <week>"`) inside one data directory
#[derive(Debug, Clone)]
pub struct StateStore {
    timers_path: PathBuf,
    markers_path: PathBuf,
}

impl StateStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            timers_path: data_dir.join(TIMERS_FILE),
            markers_path: data_dir.join(MARKERS_FILE),
        }
    }

    pub fn timers_path(&self) -> &Path {
        &self.timers_path
    }

    pub fn markers_path(&self) -> &Path {
        &self.markers_path
    }

    /// Load the saved state. Missing files mean an empty state; a malformed
    /// record is skipped, but a timer file that is not a JSON array is an error.
    pub fn load(&self) -> Result<SavedState> {
        Ok(SavedState {
            timers: self.load_timers()?,
            markers: self.load_markers(),
        })
    }

    fn load_timers(&self) -> Result<Vec<TimerRecord>> {
        let Some(contents) = read_optional(&self.timers_path)? else {
            info!("No timer file at {}, starting empty", self.timers_path.display());
            return Ok(Vec::new());
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        let values: Vec<Value> = serde_json::from_str(&contents)?;
        Ok(decode_records(values))
    }

    fn load_markers(&self) -> Option<CalendarMarker> {
        let contents = match read_optional(&self.markers_path) {
            Ok(Some(contents)) => contents,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read {}: {}", self.markers_path.display(), e);
                return None;
            }
        };
        if contents.trim().is_empty() {
            return None;
        }
        match contents.parse() {
            Ok(marker) => Some(marker),
            Err(e) => {
                warn!("Ignoring calendar marker in {}: {}", self.markers_path.display(), e);
                None
            }
        }
    }

    /// Write both files, creating the data directory if needed
    pub fn save(&self, state: &SavedState) -> Result<()> {
        if let Some(parent) = self.timers_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&state.timers)?;
        write_replacing(&self.timers_path, json.as_bytes())?;
        if let Some(marker) = state.markers {
            write_replacing(&self.markers_path, marker.to_string().as_bytes())?;
        }
        debug!(
            "Saved {} timers to {}",
            state.timers.len(),
            self.timers_path.display()
        );
        Ok(())
    }
}

/// Decode each value on its own so one bad record doesn't sink the rest
pub fn decode_records(values: Vec<Value>) -> Vec<TimerRecord> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match TimerRecord::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping timer record #{}: {}", index, e);
                None
            }
        })
        .collect()
}

fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

// Written to a uniquely named sibling temp file, then renamed over `path`
fn write_replacing(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::TimerError,
        timer::{Break, Color, Recurrence, Weekday},
    };
    use serde_json::json;

    fn record(name: &str) -> TimerRecord {
        TimerRecord {
            name: name.to_string(),
            duration: 1500,
            time_passed: 42,
            recurrence: Recurrence::Weekly,
            color: Color::new(0.5, 0.25, 0.0),
            days: [Weekday::Sunday, Weekday::Wednesday].into_iter().collect(),
            breaks: vec![Break::singular(300, 30)],
        }
    }

    #[test]
    fn missing_files_load_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::new(dir.path().join("nested"));
        assert_eq!(store.load().unwrap(), SavedState::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::new(dir.path().join("data"));
        let state = SavedState {
            timers: vec![record("Focus"), record("Read")],
            markers: Some(CalendarMarker::new(290, 41)),
        };
        store.save(&state).unwrap();

        assert_eq!(fs::read_to_string(store.markers_path()).unwrap(), "290 41");
        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::new(dir.path());
        let contents = json!([
            serde_json::to_value(record("Good")).unwrap(),
            {"name": "No duration", "timePassed": 0, "type": "daily", "color": [0, 0, 1], "days": []},
            {"name": "Old format", "duration": 60, "timePassed": 5, "type": "daily", "color": [0, 0, 1], "days": ["Monday"]}
        ]);
        fs::write(store.timers_path(), contents.to_string()).unwrap();

        let loaded = store.load().unwrap();
        let names: Vec<_> = loaded.timers.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Good", "Old format"]);
        assert!(loaded.timers[1].breaks.is_empty());
    }

    #[test]
    fn non_array_timer_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::new(dir.path());
        fs::write(store.timers_path(), "{\"name\": \"Focus\"}").unwrap();
        assert!(matches!(store.load(), Err(TimerError::Json(_))));
    }

    #[test]
    fn empty_or_garbled_marker_file_means_no_marker() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::new(dir.path());
        fs::write(store.timers_path(), "").unwrap();
        fs::write(store.markers_path(), "").unwrap();
        assert_eq!(store.load().unwrap().markers, None);

        fs::write(store.markers_path(), "monday").unwrap();
        assert_eq!(store.load().unwrap().markers, None);

        fs::write(store.markers_path(), "17 3").unwrap();
        assert_eq!(store.load().unwrap().markers, Some(CalendarMarker::new(17, 3)));
    }

    #[test]
    fn overlapping_saves_all_succeed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StateStore::new(dir.path());
        let state = SavedState {
            timers: vec![record("Focus")],
            markers: Some(CalendarMarker::new(3, 1)),
        };

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        store.save(&state).unwrap();
                    }
                });
            }
        });

        assert_eq!(store.load().unwrap(), state);
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name != TIMERS_FILE && name != MARKERS_FILE)
            .collect();
        assert!(leftovers.is_empty(), "stray files: {:?}", leftovers);
    }
}
