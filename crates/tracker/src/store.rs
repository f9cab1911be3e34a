//! History and baseline persistence
//!
//! Two stores back the regression analyzer:
//! - [`HistoryStore`]: an append-only log of data points per test, capped
//!   at a retention limit (oldest entries dropped first)
//! - [`BaselineStore`]: one reference data point per test
//!
//! [`FileStore`] keeps both as JSON files in a single directory:
//!
//! ```text
//! performance-history/
//!   <sanitized-test-name>_history.json   # array, oldest first
//!   baseline-metrics.json                # { test name -> data point }
//! ```
//!
//! Every write replaces the whole file through a temp file in the same
//! directory, so readers never observe a partial write. Unparseable files
//! are logged and read as empty; they are replaced by the next successful
//! write.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use perftrack_common::config::{TrackerConfig, DEFAULT_HISTORY_LIMIT};
use perftrack_common::{sanitize_name, Error, PerformanceDataPoint, Result};

/// File name of the shared baseline mapping
pub const BASELINE_FILE: &str = "baseline-metrics.json";

/// Suffix of per-test history files
pub const HISTORY_SUFFIX: &str = "_history.json";

/// Chronological log of data points per test name.
///
/// Histories are keyed by the sanitized test name, so names that sanitize
/// alike (`"Home Page"`, `"Home-Page"`) share one history.
pub trait HistoryStore {
    /// Append a point, keeping only the most recent entries
    fn append(&self, test_name: &str, point: PerformanceDataPoint) -> Result<()>;

    /// Full retained history, oldest first; empty when none exists
    fn all(&self, test_name: &str) -> Result<Vec<PerformanceDataPoint>>;

    /// The last `min(count, len)` entries, oldest first
    fn recent(&self, test_name: &str, count: usize) -> Result<Vec<PerformanceDataPoint>> {
        let mut history = self.all(test_name)?;
        let start = history.len().saturating_sub(count);
        Ok(history.split_off(start))
    }
}

/// One reference data point per test name
pub trait BaselineStore {
    fn get(&self, test_name: &str) -> Result<Option<PerformanceDataPoint>>;

    /// Store `point` only if no baseline exists yet. Returns whether it wrote.
    fn set_if_absent(&self, test_name: &str, point: PerformanceDataPoint) -> Result<bool>;

    /// Replace the baseline unconditionally, stamping it with the current time
    fn force_set(&self, test_name: &str, point: PerformanceDataPoint) -> Result<()>;
}

/// Drop entries from the front until at most `limit` remain
fn retain_recent(history: &mut Vec<PerformanceDataPoint>, limit: usize) {
    if history.len() > limit {
        let excess = history.len() - limit;
        history.drain(..excess);
    }
}

/// Directory-backed history and baseline store
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    history_limit: usize,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| Error::storage(&root, e))?;

        debug!("Opened performance store at {}", root.display());

        Ok(Self {
            root,
            history_limit: DEFAULT_HISTORY_LIMIT,
        })
    }

    /// Open the store described by a tracker configuration
    pub fn from_config(config: &TrackerConfig) -> Result<Self> {
        Ok(Self::open(&config.data_dir)?.with_history_limit(config.history_limit))
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Path of the history file for a test
    pub fn history_path(&self, test_name: &str) -> PathBuf {
        self.root
            .join(format!("{}{}", sanitize_name(test_name), HISTORY_SUFFIX))
    }

    /// Path of the shared baseline file
    pub fn baseline_path(&self) -> PathBuf {
        self.root.join(BASELINE_FILE)
    }

    /// Names of all tests with a history file, sorted.
    ///
    /// The name is taken from the newest recorded point; a file without
    /// readable entries contributes its sanitized stem.
    pub fn tracked_tests(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in walkdir::WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let file_name = entry.file_name().to_string_lossy();
            let Some(stem) = file_name.strip_suffix(HISTORY_SUFFIX) else {
                continue;
            };

            let history: Vec<PerformanceDataPoint> =
                self.read_json(entry.path(), "history")?.unwrap_or_default();
            let name = history
                .last()
                .map(|point| point.test_name.clone())
                .unwrap_or_else(|| stem.to_string());
            names.push(name);
        }

        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Read and parse a JSON file.
    ///
    /// `Ok(None)` when the file is missing or unparseable (including bytes
    /// that are not UTF-8); an I/O failure other than "not found" is a
    /// storage error.
    fn read_json<T: DeserializeOwned>(&self, path: &Path, what: &str) -> Result<Option<T>> {
        let content = match std::fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::storage(path, e)),
        };

        // Undecodable bytes count as corrupt content, not an I/O failure
        match serde_json::from_slice(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(
                    "Ignoring corrupt {} file {}: {}; starting fresh",
                    what,
                    path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Serialize `value` and atomically replace `path` with it
    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;

        std::fs::create_dir_all(&self.root).map_err(|e| Error::storage(path, e))?;

        let mut tmp = NamedTempFile::new_in(&self.root).map_err(|e| Error::storage(path, e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| Error::storage(path, e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| Error::storage(path, e))?;
        tmp.persist(path).map_err(|e| Error::storage(path, e.error))?;

        debug!("Wrote {} ({} bytes)", path.display(), json.len());
        Ok(())
    }

    fn load_baselines(&self) -> Result<BTreeMap<String, PerformanceDataPoint>> {
        Ok(self
            .read_json(&self.baseline_path(), "baseline")?
            .unwrap_or_default())
    }
}

impl HistoryStore for FileStore {
    fn append(&self, test_name: &str, point: PerformanceDataPoint) -> Result<()> {
        let path = self.history_path(test_name);
        let mut history: Vec<PerformanceDataPoint> =
            self.read_json(&path, "history")?.unwrap_or_default();

        history.push(point);
        retain_recent(&mut history, self.history_limit);

        self.write_json(&path, &history)?;
        debug!("History for '{}' now holds {} point(s)", test_name, history.len());
        Ok(())
    }

    fn all(&self, test_name: &str) -> Result<Vec<PerformanceDataPoint>> {
        Ok(self
            .read_json(&self.history_path(test_name), "history")?
            .unwrap_or_default())
    }
}

impl BaselineStore for FileStore {
    fn get(&self, test_name: &str) -> Result<Option<PerformanceDataPoint>> {
        Ok(self.load_baselines()?.remove(test_name))
    }

    fn set_if_absent(&self, test_name: &str, point: PerformanceDataPoint) -> Result<bool> {
        let mut baselines = self.load_baselines()?;
        if baselines.contains_key(test_name) {
            return Ok(false);
        }

        baselines.insert(test_name.to_string(), point);
        self.write_json(&self.baseline_path(), &baselines)?;
        info!("Baseline established for '{}'", test_name);
        Ok(true)
    }

    fn force_set(&self, test_name: &str, mut point: PerformanceDataPoint) -> Result<()> {
        point.touch();

        let mut baselines = self.load_baselines()?;
        baselines.insert(test_name.to_string(), point);
        self.write_json(&self.baseline_path(), &baselines)?;
        info!("New baseline set for '{}'", test_name);
        Ok(())
    }
}

/// In-process store with the same semantics as [`FileStore`]
#[derive(Debug)]
pub struct MemoryStore {
    /// Keyed by sanitized test name
    history: Mutex<HashMap<String, Vec<PerformanceDataPoint>>>,
    baselines: Mutex<BTreeMap<String, PerformanceDataPoint>>,
    history_limit: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            history: Mutex::new(HashMap::new()),
            baselines: Mutex::new(BTreeMap::new()),
            history_limit: limit.max(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore for MemoryStore {
    fn append(&self, test_name: &str, point: PerformanceDataPoint) -> Result<()> {
        let mut history = self.history.lock();
        let entries = history.entry(sanitize_name(test_name)).or_default();
        entries.push(point);
        retain_recent(entries, self.history_limit);
        Ok(())
    }

    fn all(&self, test_name: &str) -> Result<Vec<PerformanceDataPoint>> {
        Ok(self
            .history
            .lock()
            .get(&sanitize_name(test_name))
            .cloned()
            .unwrap_or_default())
    }
}

impl BaselineStore for MemoryStore {
    fn get(&self, test_name: &str) -> Result<Option<PerformanceDataPoint>> {
        Ok(self.baselines.lock().get(test_name).cloned())
    }

    fn set_if_absent(&self, test_name: &str, point: PerformanceDataPoint) -> Result<bool> {
        let mut baselines = self.baselines.lock();
        if baselines.contains_key(test_name) {
            return Ok(false);
        }
        baselines.insert(test_name.to_string(), point);
        Ok(true)
    }

    fn force_set(&self, test_name: &str, mut point: PerformanceDataPoint) -> Result<()> {
        point.touch();
        self.baselines.lock().insert(test_name.to_string(), point);
        Ok(())
    }
}
