//! JSON-file-backed task store
//!
//! The collection lives in memory and is rewritten to its backing file
//! after every mutation, so the file always mirrors the latest state.
//! The file holds a single pretty-printed JSON array of tasks and is
//! reloaded verbatim at process start.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::types::{Priority, Task};

/// File name of the task store inside the data directory
pub const STORE_FILE: &str = "tasks.json";

/// Errors raised by the task store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file {path} is not a valid task collection")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode task collection")]
    Encode(#[source] serde_json::Error),

    #[error("failed to write store file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// User-supplied fields of a task, everything except id and completion
#[derive(Debug, Clone)]
pub struct TaskFields {
    pub name: String,
    pub deadline: String,
    pub priority: Priority,
    pub subject: String,
}

/// In-memory task collection mirrored to a JSON file
pub struct TaskStore {
    tasks: Vec<Task>,
    path: PathBuf,
}

impl TaskStore {
    /// Load the store from its backing file.
    ///
    /// An absent file yields an empty store; malformed content is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let tasks = read_tasks(&path)?;
        debug!(count = tasks.len(), path = %path.display(), "Loaded tasks");
        Ok(Self { tasks, path })
    }

    /// Re-read the backing file, replacing the in-memory collection.
    /// Used when the file changed on disk outside this process.
    pub fn reload(&mut self) -> Result<usize, StoreError> {
        self.tasks = read_tasks(&self.path)?;
        Ok(self.tasks.len())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Create a task with `id = now_ms`, bumped past collisions, and
    /// `completed = false`. Appends and persists.
    pub fn create(&mut self, fields: TaskFields, now_ms: i64) -> Result<Task, StoreError> {
        let task = Task {
            id: self.unique_id(now_ms),
            name: fields.name,
            deadline: fields.deadline,
            priority: fields.priority,
            subject: fields.subject,
            completed: false,
        };
        self.tasks.push(task.clone());
        self.save()?;
        Ok(task)
    }

    /// Remove the task with the given id. Returns `false` when absent,
    /// leaving the collection and the file untouched.
    pub fn delete(&mut self, id: i64) -> Result<bool, StoreError> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Flip the completed flag, returning the new state, or `None` when
    /// the id is absent.
    pub fn toggle(&mut self, id: i64) -> Result<Option<bool>, StoreError> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        task.completed = !task.completed;
        let completed = task.completed;
        self.save()?;
        Ok(Some(completed))
    }

    /// Replace a task with fresh fields: delete plus recreate in one
    /// persisted step. The replacement gets a new id and starts
    /// uncompleted. Returns `None` when the id is absent.
    pub fn replace(
        &mut self,
        id: i64,
        fields: TaskFields,
        now_ms: i64,
    ) -> Result<Option<Task>, StoreError> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Ok(None);
        }
        let task = Task {
            id: self.unique_id(now_ms),
            name: fields.name,
            deadline: fields.deadline,
            priority: fields.priority,
            subject: fields.subject,
            completed: false,
        };
        self.tasks.push(task.clone());
        self.save()?;
        Ok(Some(task))
    }

    /// Smallest id >= now_ms not already taken. Two creations in the same
    /// millisecond must not share an id.
    fn unique_id(&self, now_ms: i64) -> i64 {
        let mut id = now_ms;
        while self.tasks.iter().any(|t| t.id == id) {
            id += 1;
        }
        id
    }

    fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.tasks).map_err(StoreError::Encode)?;
        std::fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(count = self.tasks.len(), path = %self.path.display(), "Tasks saved");
        Ok(())
    }
}

fn read_tasks(path: &Path) -> Result<Vec<Task>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_fields(name: &str, deadline: &str, subject: &str) -> TaskFields {
        TaskFields {
            name: name.to_string(),
            deadline: deadline.to_string(),
            priority: Priority::Medium,
            subject: subject.to_string(),
        }
    }

    fn temp_store() -> (TempDir, TaskStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = TaskStore::load(temp_dir.path().join(STORE_FILE)).unwrap();
        (temp_dir, store)
    }

    // ========== load tests ==========

    #[test]
    fn test_load_absent_file_is_empty() {
        let (_temp_dir, store) = temp_store();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_invalid_json_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(STORE_FILE);
        std::fs::write(&path, "not valid json").unwrap();

        let result = TaskStore::load(&path);
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_load_existing_collection() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(STORE_FILE);

        let mut store = TaskStore::load(&path).unwrap();
        store
            .create(make_fields("Essay", "2025-02-01", "History"), 1000)
            .unwrap();
        store
            .create(make_fields("Problem set", "2025-02-03", "Math"), 2000)
            .unwrap();

        let reopened = TaskStore::load(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.tasks(), store.tasks());
    }

    // ========== create tests ==========

    #[test]
    fn test_create_then_get() {
        let (_temp_dir, mut store) = temp_store();
        let task = store
            .create(make_fields("Essay", "2025-02-01", "History"), 1000)
            .unwrap();

        let found = store.get(task.id).unwrap();
        assert_eq!(found, &task);
        assert!(!found.completed);
        assert_eq!(found.name, "Essay");
        assert_eq!(found.subject, "History");
    }

    #[test]
    fn test_create_assigns_timestamp_id() {
        let (_temp_dir, mut store) = temp_store();
        let task = store
            .create(make_fields("Essay", "2025-02-01", "History"), 1700000000000)
            .unwrap();
        assert_eq!(task.id, 1700000000000);
    }

    #[test]
    fn test_create_bumps_colliding_ids() {
        let (_temp_dir, mut store) = temp_store();
        let first = store
            .create(make_fields("A", "2025-02-01", "Math"), 1000)
            .unwrap();
        let second = store
            .create(make_fields("B", "2025-02-01", "Math"), 1000)
            .unwrap();

        assert_eq!(first.id, 1000);
        assert_eq!(second.id, 1001);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_create_persists_immediately() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(STORE_FILE);
        let mut store = TaskStore::load(&path).unwrap();
        store
            .create(make_fields("Essay", "2025-02-01", "History"), 1000)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let on_disk: Vec<Task> = serde_json::from_str(&content).unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk[0].name, "Essay");
    }

    // ========== delete tests ==========

    #[test]
    fn test_delete_removes_exactly_one() {
        let (_temp_dir, mut store) = temp_store();
        let a = store
            .create(make_fields("A", "2025-02-01", "Math"), 1000)
            .unwrap();
        store
            .create(make_fields("B", "2025-02-02", "Bio"), 2000)
            .unwrap();

        let deleted = store.delete(a.id).unwrap();
        assert!(deleted);
        assert_eq!(store.len(), 1);
        assert!(store.get(a.id).is_none());
    }

    #[test]
    fn test_delete_absent_id_is_noop() {
        let (_temp_dir, mut store) = temp_store();
        store
            .create(make_fields("A", "2025-02-01", "Math"), 1000)
            .unwrap();

        let deleted = store.delete(9999).unwrap();
        assert!(!deleted);
        assert_eq!(store.len(), 1);
    }

    // ========== toggle tests ==========

    #[test]
    fn test_toggle_flips_completed() {
        let (_temp_dir, mut store) = temp_store();
        let task = store
            .create(make_fields("A", "2025-02-01", "Math"), 1000)
            .unwrap();

        assert_eq!(store.toggle(task.id).unwrap(), Some(true));
        assert!(store.get(task.id).unwrap().completed);
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let (_temp_dir, mut store) = temp_store();
        let task = store
            .create(make_fields("A", "2025-02-01", "Math"), 1000)
            .unwrap();

        store.toggle(task.id).unwrap();
        store.toggle(task.id).unwrap();
        assert!(!store.get(task.id).unwrap().completed);
    }

    #[test]
    fn test_toggle_absent_id_is_noop() {
        let (_temp_dir, mut store) = temp_store();
        assert_eq!(store.toggle(42).unwrap(), None);
    }

    // ========== replace tests ==========

    #[test]
    fn test_replace_reassigns_id_and_resets_completion() {
        let (_temp_dir, mut store) = temp_store();
        let task = store
            .create(make_fields("Essay", "2025-02-01", "History"), 1000)
            .unwrap();
        store.toggle(task.id).unwrap();

        let replaced = store
            .replace(task.id, make_fields("Essay v2", "2025-02-05", "History"), 5000)
            .unwrap()
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(replaced.id, 5000);
        assert_eq!(replaced.name, "Essay v2");
        assert_eq!(replaced.deadline, "2025-02-05");
        assert!(!replaced.completed);
        assert!(store.get(task.id).is_none());
    }

    #[test]
    fn test_replace_absent_id_changes_nothing() {
        let (_temp_dir, mut store) = temp_store();
        store
            .create(make_fields("A", "2025-02-01", "Math"), 1000)
            .unwrap();

        let replaced = store
            .replace(9999, make_fields("B", "2025-02-02", "Bio"), 5000)
            .unwrap();
        assert!(replaced.is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.tasks()[0].name, "A");
    }

    // ========== reload tests ==========

    #[test]
    fn test_reload_picks_up_external_changes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(STORE_FILE);
        let mut store = TaskStore::load(&path).unwrap();
        store
            .create(make_fields("A", "2025-02-01", "Math"), 1000)
            .unwrap();

        // Simulate another process rewriting the file
        let external = vec![Task {
            id: 7000,
            name: "External".to_string(),
            deadline: "2025-03-01".to_string(),
            priority: Priority::High,
            subject: "Bio".to_string(),
            completed: true,
        }];
        std::fs::write(&path, serde_json::to_string_pretty(&external).unwrap()).unwrap();

        let count = store.reload().unwrap();
        assert_eq!(count, 1);
        assert_eq!(store.get(7000).unwrap().name, "External");
    }

    #[test]
    fn test_reload_after_file_removed_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(STORE_FILE);
        let mut store = TaskStore::load(&path).unwrap();
        store
            .create(make_fields("A", "2025-02-01", "Math"), 1000)
            .unwrap();

        std::fs::remove_file(&path).unwrap();
        assert_eq!(store.reload().unwrap(), 0);
        assert!(store.is_empty());
    }

    // ========== export format tests ==========

    #[test]
    fn test_store_file_roundtrip_is_lossless() {
        let (_temp_dir, mut store) = temp_store();
        store
            .create(make_fields("A", "2025-02-01", "Math"), 1000)
            .unwrap();
        store
            .create(make_fields("B", "2025-02-02", "Bio"), 2000)
            .unwrap();
        store.toggle(1000).unwrap();

        let json = serde_json::to_string_pretty(store.tasks()).unwrap();
        let parsed: Vec<Task> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, store.tasks());
    }
}
