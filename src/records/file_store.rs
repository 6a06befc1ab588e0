//! @ai:module:intent Filesystem-backed record store (one latest file and timestamped history per tuple)
//! @ai:module:layer infrastructure
//! @ai:module:public_api FileRecordStore
//! @ai:module:stateless false

use crate::error::{Error, Result};
use crate::records::store::RecordStore;
use crate::records::types::{Condition, Metric, MetricRecord};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const LATEST_SUFFIX: &str = "_latest.json";

/// @ai:intent Record store persisted under `<root>/<baseline|vpn>/`
///
/// Layout per (target, metric): `<target>__<metric>_latest.json` holds the
/// latest pointer, `<target>__<metric>_<timestamp>.json` one history entry each.
pub struct FileRecordStore {
    root: PathBuf,
}

impl FileRecordStore {
    /// @ai:intent Open (and create) a store rooted at a directory
    /// @ai:effects fs:write
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        for condition in Condition::ALL {
            std::fs::create_dir_all(root.join(condition.dir_name()))?;
        }

        Ok(Self { root })
    }

    fn condition_dir(&self, condition: Condition) -> PathBuf {
        self.root.join(condition.dir_name())
    }

    /// @ai:intent File-name prefix shared by all files of one tuple
    /// @ai:effects pure
    fn prefix(target: &str, metric: Metric) -> String {
        let safe_target: String = target
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
            .collect();
        format!("{}__{}_", safe_target, metric.key())
    }

    fn latest_path(&self, condition: Condition, target: &str, metric: Metric) -> PathBuf {
        self.condition_dir(condition)
            .join(format!("{}latest.json", Self::prefix(target, metric)))
    }

    /// @ai:intent Pick an unused history path for a record
    /// @ai:effects fs:read
    fn history_path(&self, record: &MetricRecord) -> PathBuf {
        let dir = self.condition_dir(record.condition);
        let stem = format!(
            "{}{}",
            Self::prefix(&record.target, record.metric),
            record.captured_at.format("%Y%m%dT%H%M%S%.9f")
        );

        let mut path = dir.join(format!("{}.json", stem));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("{}-{}.json", stem, n));
            n += 1;
        }
        path
    }

    /// @ai:intent Write a file via temp file + rename so readers never see a torn record
    /// @ai:effects fs:write
    fn write_atomic(dir: &Path, path: &Path, content: &str) -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn read_record(path: &Path) -> Result<MetricRecord> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// @ai:intent JSON files directly inside a condition directory
    /// @ai:effects fs:read
    fn json_files(&self, condition: Condition) -> Vec<PathBuf> {
        WalkDir::new(self.condition_dir(condition))
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().map(|ext| ext == "json").unwrap_or(false))
            .map(|e| e.path().to_path_buf())
            .collect()
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

impl RecordStore for FileRecordStore {
    fn put(&mut self, record: MetricRecord) -> Result<()> {
        let dir = self.condition_dir(record.condition);
        let content = serde_json::to_string_pretty(&record)?;

        let history_path = self.history_path(&record);
        std::fs::write(&history_path, &content)?;

        let latest_path = self.latest_path(record.condition, &record.target, record.metric);
        Self::write_atomic(&dir, &latest_path, &content)?;

        tracing::debug!(
            "Stored {} {}/{} -> {}",
            record.condition,
            record.target,
            record.metric,
            history_path.display()
        );
        Ok(())
    }

    fn get_latest(&self, condition: Condition, target: &str, metric: Metric) -> Result<MetricRecord> {
        let path = self.latest_path(condition, target, metric);

        if !path.exists() {
            return Err(Error::MissingRecord {
                condition,
                target: target.to_string(),
                metric,
            });
        }

        let record = Self::read_record(&path)?;
        // prefix sanitizing can alias distinct targets
        if record.target != target {
            return Err(Error::MissingRecord {
                condition,
                target: target.to_string(),
                metric,
            });
        }

        Ok(record)
    }

    fn history(&self, condition: Condition, target: &str, metric: Metric) -> Result<Vec<MetricRecord>> {
        let prefix = Self::prefix(target, metric);

        let mut records = Vec::new();
        for path in self.json_files(condition) {
            let name = file_name(&path);
            if !name.starts_with(&prefix) || name.ends_with(LATEST_SUFFIX) {
                continue;
            }

            let record = Self::read_record(&path)?;
            // prefix sanitizing can alias distinct targets
            if record.target == target && record.metric == metric {
                records.push(record);
            }
        }

        records.sort_by_key(|r| r.captured_at);
        Ok(records)
    }

    fn list_targets(&self, condition: Condition) -> Result<BTreeSet<String>> {
        let mut targets = BTreeSet::new();

        for path in self.json_files(condition) {
            let name = file_name(&path);
            if !name.ends_with(LATEST_SUFFIX) {
                continue;
            }

            match Self::read_record(&path) {
                Ok(record) => {
                    targets.insert(record.target);
                }
                Err(e) => {
                    // keep counting the target; the comparison reports the read error
                    tracing::warn!("Unreadable record {}: {}", path.display(), e);
                    if let Some((target, _)) = name.rsplit_once("__") {
                        targets.insert(target.to_string());
                    }
                }
            }
        }

        Ok(targets)
    }
}
