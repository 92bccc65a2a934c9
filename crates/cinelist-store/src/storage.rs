use cinelist_models::WatchlistEntry;
use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use crate::error::{StorageError, StorageResult};

/// Current layout of the persisted slot
pub const STORAGE_VERSION: u32 = 1;

/// Durable slot holding the serialized watchlist.
///
/// Every `save` replaces the whole slot. Implementations never merge.
pub trait WatchlistStorage: Send + Sync {
    /// Read the stored collection. An empty slot is `Ok(vec![])`, not an error.
    fn load(&self) -> StorageResult<Vec<WatchlistEntry>>;

    /// Overwrite the slot with `entries`
    fn save(&self, entries: &[WatchlistEntry]) -> StorageResult<()>;

    /// Remove the slot entirely
    fn clear(&self) -> StorageResult<()>;

    /// Human-readable location, used in log messages
    fn describe(&self) -> String;
}

#[derive(Serialize)]
struct StoredWatchlist<'a> {
    version: u32,
    entries: &'a [WatchlistEntry],
}

/// Encode entries into the versioned envelope `{"version": 1, "entries": [...]}`
pub fn encode_entries(entries: &[WatchlistEntry]) -> StorageResult<String> {
    let stored = StoredWatchlist {
        version: STORAGE_VERSION,
        entries,
    };
    serde_json::to_string_pretty(&stored)
        .map_err(|e| StorageError::Unavailable(format!("failed to serialize watchlist: {}", e)))
}

/// Decode a stored slot.
///
/// Accepts the versioned envelope and the older bare array. Empty content is
/// treated as an empty slot; whitespace alone is not valid JSON.
pub fn decode_entries(content: &str) -> StorageResult<Vec<WatchlistEntry>> {
    if content.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(content)
        .map_err(|e| StorageError::corrupt(format!("invalid JSON: {}", e)))?;

    let raw_entries = match value {
        Value::Array(_) => value,
        Value::Object(mut object) => {
            let version = object
                .get("version")
                .and_then(Value::as_u64)
                .ok_or_else(|| StorageError::corrupt("missing or non-numeric version"))?;
            if version != u64::from(STORAGE_VERSION) {
                return Err(StorageError::corrupt(format!("unsupported version {}", version)));
            }
            object
                .remove("entries")
                .ok_or_else(|| StorageError::corrupt("missing entries"))?
        }
        other => {
            return Err(StorageError::corrupt(format!(
                "expected an array or a versioned object, found {}",
                json_kind(&other)
            )));
        }
    };

    let entries: Vec<WatchlistEntry> = serde_json::from_value(raw_entries)
        .map_err(|e| StorageError::corrupt(format!("invalid entry: {}", e)))?;

    for entry in &entries {
        entry.movie.validate().map_err(StorageError::CorruptData)?;
    }

    Ok(entries)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Watchlist persisted as a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl WatchlistStorage for JsonFileStorage {
    fn load(&self) -> StorageResult<Vec<WatchlistEntry>> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Watchlist file {} does not exist, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(StorageError::unavailable_at(&self.path, e)),
        };

        let content = String::from_utf8(content)
            .map_err(|e| StorageError::corrupt(format!("not UTF-8: {}", e)))?;
        let entries = decode_entries(&content)?;
        info!("Loaded watchlist: {} entries from {}", entries.len(), self.path.display());
        Ok(entries)
    }

    fn save(&self, entries: &[WatchlistEntry]) -> StorageResult<()> {
        let json = encode_entries(entries)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::unavailable_at(parent, e))?;
        }

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, json).map_err(|e| StorageError::unavailable_at(&temp_path, e))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| StorageError::unavailable_at(&self.path, e))?;

        debug!("Watchlist saved: {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::unavailable_at(&self.path, e)),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Default)]
struct MemorySlot {
    content: Option<String>,
    fail_writes: bool,
    writes: usize,
}

/// In-process slot with no durability.
///
/// Clones share the same slot, so a test can keep a handle to inspect what
/// the store wrote or to make subsequent writes fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<MemorySlot>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw slot content, as if written by an earlier session
    pub fn with_content(content: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.lock().content = Some(content.into());
        storage
    }

    /// Raw slot content, `None` when nothing is stored
    pub fn content(&self) -> Option<String> {
        self.lock().content.clone()
    }

    /// Make every following `save`/`clear` fail with `Unavailable`
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Number of successful saves
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, MemorySlot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WatchlistStorage for MemoryStorage {
    fn load(&self) -> StorageResult<Vec<WatchlistEntry>> {
        match &self.lock().content {
            Some(content) => decode_entries(content),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, entries: &[WatchlistEntry]) -> StorageResult<()> {
        let mut slot = self.lock();
        if slot.fail_writes {
            return Err(StorageError::Unavailable("memory slot rejected the write".to_string()));
        }
        slot.content = Some(encode_entries(entries)?);
        slot.writes += 1;
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let mut slot = self.lock();
        if slot.fail_writes {
            return Err(StorageError::Unavailable("memory slot rejected the write".to_string()));
        }
        slot.content = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cinelist_models::MovieSummary;
    use tempfile::TempDir;

    fn create_entry(id: u64, title: &str) -> WatchlistEntry {
        let mut movie = MovieSummary::new(id, title);
        movie.overview = format!("{} overview", title);
        movie.poster_path = Some(format!("/{}.jpg", id));
        movie.release_date = "2021-06-01".to_string();
        movie.vote_average = 7.4;
        movie.vote_count = 1200;
        movie.genre_ids = vec![18, 35];
        WatchlistEntry::new(movie, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, id as u32).unwrap())
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested").join("watchlist.json"));
        let entries = vec![create_entry(1, "Heat"), create_entry(2, "Ronin")];

        storage.save(&entries).unwrap();
        let loaded = JsonFileStorage::new(storage.path()).load().unwrap();

        assert_eq!(loaded, entries);
    }

    #[test]
    fn test_file_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("watchlist.json"));
        assert!(storage.load().unwrap().is_empty());
        assert!(!storage.exists());
    }

    #[test]
    fn test_file_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("watchlist.json"));

        storage.save(&[create_entry(1, "Heat"), create_entry(2, "Ronin")]).unwrap();
        storage.save(&[create_entry(3, "Thief")]).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id(), 3);
        assert!(!dir.path().join("watchlist.json.tmp").exists());
    }

    #[test]
    fn test_file_corrupt_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("watchlist.json");
        std::fs::write(&path, "\"just a string\"").unwrap();

        let err = JsonFileStorage::new(&path).load().unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_file_clear() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("watchlist.json"));
        storage.save(&[create_entry(1, "Heat")]).unwrap();

        storage.clear().unwrap();
        assert!(!storage.exists());
        // Clearing an absent slot is fine
        storage.clear().unwrap();
    }

    #[test]
    fn test_file_save_into_unwritable_location() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let storage = JsonFileStorage::new(blocker.join("watchlist.json"));
        let err = storage.save(&[create_entry(1, "Heat")]).unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }

    #[test]
    fn test_encode_writes_version() {
        let json = encode_entries(&[create_entry(5, "Alien")]).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["entries"][0]["id"], 5);
        assert_eq!(value["entries"][0]["addedAt"], "2024-01-01T10:00:05Z");
    }

    #[test]
    fn test_decode_legacy_array() {
        let legacy = r#"[
            {"id": 11, "title": "Star Wars", "overview": "", "poster_path": null,
             "backdrop_path": null, "release_date": "1977-05-25", "vote_average": 8.2,
             "vote_count": 20000, "genre_ids": [12, 28], "addedAt": "2024-02-10T08:30:00.000Z"}
        ]"#;

        let entries = decode_entries(legacy).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id(), 11);
        assert_eq!(entries[0].movie.genre_ids, vec![12, 28]);
    }

    #[test]
    fn test_decode_empty_is_empty() {
        assert!(decode_entries("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_shapes() {
        let cases = [
            "  \n",
            "not json at all",
            "\"a bare string\"",
            "42",
            "null",
            r#"{"entries": []}"#,
            r#"{"version": 2, "entries": []}"#,
            r#"{"version": 1}"#,
            r#"{"version": 1, "entries": {"id": 1}}"#,
            r#"[{"title": "No id", "addedAt": "2024-01-01T00:00:00Z"}]"#,
            r#"[{"id": 1, "title": "No timestamp"}]"#,
            r#"[{"id": 1, "title": "Negative", "vote_average": -1.0, "addedAt": "2024-01-01T00:00:00Z"}]"#,
        ];

        for case in cases {
            let result = decode_entries(case);
            assert!(
                matches!(result, Err(StorageError::CorruptData(_))),
                "expected corrupt data for {}",
                case
            );
        }
    }

    #[test]
    fn test_memory_storage_shared_slot() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();

        storage.save(&[create_entry(1, "Heat")]).unwrap();
        assert_eq!(handle.write_count(), 1);
        assert_eq!(handle.load().unwrap().len(), 1);

        handle.set_fail_writes(true);
        assert!(storage.save(&[]).is_err());
        assert!(storage.clear().is_err());
        assert_eq!(handle.write_count(), 1);

        handle.set_fail_writes(false);
        storage.clear().unwrap();
        assert!(handle.content().is_none());
    }
}
