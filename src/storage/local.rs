use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode stored value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Change notification for one key. `new_value` is `None` after a removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
}

/// String key/value store backed by one file per key.
///
/// Clones share the directory and the event channel, so every handle sees
/// the writes made through any other.
#[derive(Clone)]
pub struct LocalStorage {
    inner: Arc<StorageInner>,
}

struct StorageInner {
    dir: PathBuf,
    events: broadcast::Sender<StorageEvent>,
}

impl LocalStorage {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        debug!("Opened local storage at {}", dir.display());
        Ok(Self {
            inner: Arc::new(StorageInner { dir, events }),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    /// Write through a temp file and rename, so readers never see half a value
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, value).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        self.notify(key, Some(value.to_string()));
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(StorageError::Io { path, source }),
        }

        self.notify(key, None);
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.events.subscribe()
    }

    fn notify(&self, key: &str, new_value: Option<String>) {
        // No listeners is fine
        let _ = self.inner.events.send(StorageEvent {
            key: key.to_string(),
            new_value,
        });
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.inner.dir.join(format!("{}.json", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage() -> (TempDir, LocalStorage) {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::open(dir.path().join("store")).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_set_get_remove() {
        let (_dir, storage) = storage();

        assert_eq!(storage.get_item("polypro-watchlist").unwrap(), None);
        storage.set_item("polypro-watchlist", r#"["1","2"]"#).unwrap();
        assert_eq!(
            storage.get_item("polypro-watchlist").unwrap().as_deref(),
            Some(r#"["1","2"]"#)
        );

        storage.remove_item("polypro-watchlist").unwrap();
        assert_eq!(storage.get_item("polypro-watchlist").unwrap(), None);
        // removing twice is not an error
        storage.remove_item("polypro-watchlist").unwrap();
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let (_dir, storage) = storage();
        storage.set_item("k", "v").unwrap();

        let names: Vec<String> = fs::read_dir(storage.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["k.json".to_string()]);
    }

    #[test]
    fn test_rejects_bad_keys() {
        let (_dir, storage) = storage();
        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(storage.set_item(key, "x"), Err(StorageError::InvalidKey(_))));
        }
    }

    #[test]
    fn test_events_reach_other_handles() {
        let (_dir, storage) = storage();
        let other_tab = storage.clone();
        let mut events = other_tab.subscribe();

        storage.set_item("polypro-watchlist", "[]").unwrap();
        storage.remove_item("polypro-watchlist").unwrap();

        assert_eq!(
            events.try_recv().unwrap(),
            StorageEvent {
                key: "polypro-watchlist".to_string(),
                new_value: Some("[]".to_string()),
            }
        );
        assert_eq!(events.try_recv().unwrap().new_value, None);
    }
}
