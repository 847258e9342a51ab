//! # Rule Store Gateway
//!
//! Thin read/write access to wherever rules are persisted. The engine only
//! ever calls `is_installed` and `list_all`; the write side belongs to the
//! administrative surface.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};
use super::rule::RuleRow;

/// Persistent rule table
///
/// `operation` is the natural key, compared case-insensitively; `upsert`
/// replaces action and magnitude of an existing row in place, keeping its
/// position.
pub trait RuleStore: Send + Sync + std::fmt::Debug {
    /// Whether the rule feature is present at all
    fn is_installed(&self) -> bool;

    /// Full scan in store order
    fn list_all(&self) -> StoreResult<Vec<RuleRow>>;

    /// Insert a row or replace the row with the same operation
    fn upsert(&self, row: &RuleRow) -> StoreResult<()>;

    /// Remove every row
    fn clear_all(&self) -> StoreResult<()>;
}

fn upsert_into(rows: &mut Vec<RuleRow>, row: &RuleRow) {
    match rows.iter_mut().find(|r| r.same_operation(&row.operation)) {
        Some(existing) => {
            existing.action = row.action.clone();
            existing.magnitude = row.magnitude;
        }
        None => rows.push(row.clone()),
    }
}

/// In-memory rule store
#[derive(Debug)]
pub struct MemRuleStore {
    rows: RwLock<Vec<RuleRow>>,
    installed: AtomicBool,
    outage: Mutex<Option<String>>,
}

impl Default for MemRuleStore {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            installed: AtomicBool::new(true),
            outage: Mutex::new(None),
        }
    }
}

impl MemRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with rows, in the given order
    pub fn with_rows(rows: impl IntoIterator<Item = RuleRow>) -> Self {
        let store = Self::default();
        if let Ok(mut guard) = store.rows.write() {
            guard.extend(rows);
        }
        store
    }

    /// Mark the rule feature as installed or removed
    pub fn set_installed(&self, installed: bool) {
        self.installed.store(installed, Ordering::SeqCst);
    }

    /// Make every read fail with `reason` until cleared with `None`
    pub fn set_outage(&self, reason: Option<&str>) {
        if let Ok(mut outage) = self.outage.lock() {
            *outage = reason.map(str::to_string);
        }
    }

    fn check_outage(&self) -> StoreResult<()> {
        let outage = self
            .outage
            .lock()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))?;
        match outage.as_ref() {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RuleStore for MemRuleStore {
    fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    fn list_all(&self) -> StoreResult<Vec<RuleRow>> {
        if !self.is_installed() {
            return Err(StoreError::NotInstalled);
        }
        self.check_outage()?;
        self.rows
            .read()
            .map(|rows| rows.clone())
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))
    }

    fn upsert(&self, row: &RuleRow) -> StoreResult<()> {
        if !self.is_installed() {
            return Err(StoreError::NotInstalled);
        }
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))?;
        upsert_into(&mut rows, row);
        Ok(())
    }

    fn clear_all(&self) -> StoreResult<()> {
        if !self.is_installed() {
            return Err(StoreError::NotInstalled);
        }
        self.rows
            .write()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))?
            .clear();
        Ok(())
    }
}

/// Current on-disk format version
const FILE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct RuleFile {
    version: u32,
    checksum: u32,
    rules: Vec<RuleRow>,
}

fn checksum_rows(rows: &[RuleRow]) -> StoreResult<u32> {
    let canonical = serde_json::to_vec(rows)
        .map_err(|e| StoreError::Internal(format!("Failed to serialize rules: {}", e)))?;
    Ok(crc32fast::hash(&canonical))
}

/// JSON file rule store
///
/// An absent file is an empty rule set. The store counts as installed as
/// long as the directory holding the file exists.
#[derive(Debug)]
pub struct FileRuleStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileRuleStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_rows(&self) -> StoreResult<Vec<RuleRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::Io(format!("Failed to read rule store: {}", e)))?;

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let file: RuleFile = serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupted(format!("Failed to parse rule store: {}", e)))?;

        if file.version != FILE_FORMAT_VERSION {
            return Err(StoreError::Corrupted(format!(
                "unsupported format version {}",
                file.version
            )));
        }

        let expected = checksum_rows(&file.rules)?;
        if expected != file.checksum {
            return Err(StoreError::Corrupted(format!(
                "checksum mismatch: stored {:#010x}, computed {:#010x}",
                file.checksum, expected
            )));
        }

        Ok(file.rules)
    }

    fn save_rows(&self, rows: Vec<RuleRow>) -> StoreResult<()> {
        let file = RuleFile {
            version: FILE_FORMAT_VERSION,
            checksum: checksum_rows(&rows)?,
            rules: rows,
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| StoreError::Internal(format!("Failed to serialize rules: {}", e)))?;

        // Write-then-rename so a reader never sees a half-written file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .map_err(|e| StoreError::Io(format!("Failed to write rule store: {}", e)))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::Io(format!("Failed to replace rule store: {}", e))
        })
    }
}

impl RuleStore for FileRuleStore {
    fn is_installed(&self) -> bool {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.is_dir(),
            _ => true,
        }
    }

    fn list_all(&self) -> StoreResult<Vec<RuleRow>> {
        if !self.is_installed() {
            return Err(StoreError::NotInstalled);
        }
        self.load_rows()
    }

    fn upsert(&self, row: &RuleRow) -> StoreResult<()> {
        if !self.is_installed() {
            return Err(StoreError::NotInstalled);
        }
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))?;
        let mut rows = self.load_rows()?;
        upsert_into(&mut rows, row);
        self.save_rows(rows)
    }

    fn clear_all(&self) -> StoreResult<()> {
        if !self.is_installed() {
            return Err(StoreError::NotInstalled);
        }
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))?;
        self.save_rows(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mem_upsert_replaces_in_place() {
        let store = MemRuleStore::with_rows([
            RuleRow::new("SELECT", "fail", 0),
            RuleRow::new("COMMIT", "delay", 1),
        ]);

        store.upsert(&RuleRow::new("select", "delay", 3)).unwrap();

        let rows = store.list_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], RuleRow::new("SELECT", "delay", 3));
        assert_eq!(rows[1].operation, "COMMIT");
    }

    #[test]
    fn test_mem_uninstalled_rejects_reads() {
        let store = MemRuleStore::new();
        store.set_installed(false);
        assert!(!store.is_installed());
        assert!(matches!(store.list_all(), Err(StoreError::NotInstalled)));
    }

    #[test]
    fn test_mem_outage() {
        let store = MemRuleStore::new();
        store.set_outage(Some("connection reset"));
        assert!(matches!(store.list_all(), Err(StoreError::Unavailable(_))));
        store.set_outage(None);
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_file_absent_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileRuleStore::new(dir.path().join("rules.json"));
        assert!(store.is_installed());
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_file_roundtrip_preserves_order() {
        let dir = TempDir::new().unwrap();
        let store = FileRuleStore::new(dir.path().join("rules.json"));

        store.upsert(&RuleRow::new("DROP TABLE", "fail", 0)).unwrap();
        store.upsert(&RuleRow::new("COMMIT", "delay", 2)).unwrap();
        store.upsert(&RuleRow::new("drop table", "terminate", 0)).unwrap();

        let reopened = FileRuleStore::new(dir.path().join("rules.json"));
        let rows = reopened.list_all().unwrap();
        assert_eq!(
            rows,
            vec![
                RuleRow::new("DROP TABLE", "terminate", 0),
                RuleRow::new("COMMIT", "delay", 2),
            ]
        );
    }

    #[test]
    fn test_file_detects_tampering() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.json");
        let store = FileRuleStore::new(&path);
        store.upsert(&RuleRow::new("COMMIT", "delay", 2)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        fs::write(&path, content.replace("\"delay\"", "\"crash\"")).unwrap();

        assert!(matches!(store.list_all(), Err(StoreError::Corrupted(_))));
    }

    #[test]
    fn test_file_missing_directory_is_not_installed() {
        let dir = TempDir::new().unwrap();
        let store = FileRuleStore::new(dir.path().join("missing").join("rules.json"));
        assert!(!store.is_installed());
        assert!(matches!(store.list_all(), Err(StoreError::NotInstalled)));
    }

    #[test]
    fn test_file_clear_all() {
        let dir = TempDir::new().unwrap();
        let store = FileRuleStore::new(dir.path().join("rules.json"));
        store.upsert(&RuleRow::new("SELECT", "fail", 0)).unwrap();
        store.clear_all().unwrap();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_file_failed_replace_leaves_no_tmp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.json");
        // A non-empty directory in the way makes the rename fail
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupant"), "x").unwrap();

        let store = FileRuleStore::new(&path);
        let err = store
            .save_rows(vec![RuleRow::new("SELECT", "fail", 0)])
            .unwrap_err();

        assert!(matches!(err, StoreError::Io(_)));
        assert!(!path.with_extension("json.tmp").exists());
    }
}
