//! @ai:module:intent Tuple-keyed record store with latest pointer and append-only history
//! @ai:module:layer domain
//! @ai:module:public_api RecordStore, MemoryRecordStore, RecordKey
//! @ai:module:stateless false

use crate::error::{Error, Result};
use crate::records::types::{Condition, Metric, MetricRecord};
use std::collections::{BTreeMap, BTreeSet};

/// @ai:intent Key identifying one latest pointer
pub type RecordKey = (Condition, String, Metric);

/// @ai:intent Storage contract consumed by the comparison engine
pub trait RecordStore: Send + Sync {
    /// @ai:intent Append to history and overwrite the latest pointer for the record's tuple
    fn put(&mut self, record: MetricRecord) -> Result<()>;

    /// @ai:intent Fetch the latest record for a tuple
    /// @ai:post Err(Error::MissingRecord) when nothing was ever put for the tuple
    fn get_latest(&self, condition: Condition, target: &str, metric: Metric) -> Result<MetricRecord>;

    /// @ai:intent All records ever put for a tuple, oldest first
    fn history(&self, condition: Condition, target: &str, metric: Metric) -> Result<Vec<MetricRecord>>;

    /// @ai:intent Targets with at least one latest record under a condition
    fn list_targets(&self, condition: Condition) -> Result<BTreeSet<String>>;
}

/// @ai:intent In-memory store, used for one-shot analysis and tests
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    latest: BTreeMap<RecordKey, MetricRecord>,
    history: BTreeMap<RecordKey, Vec<MetricRecord>>,
}

impl MemoryRecordStore {
    /// @ai:intent Create an empty store
    /// @ai:effects pure
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Number of latest records under a condition
    /// @ai:effects pure
    pub fn count(&self, condition: Condition) -> usize {
        self.latest.keys().filter(|(c, _, _)| *c == condition).count()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    fn key(condition: Condition, target: &str, metric: Metric) -> RecordKey {
        (condition, target.to_string(), metric)
    }
}

impl RecordStore for MemoryRecordStore {
    fn put(&mut self, record: MetricRecord) -> Result<()> {
        let key = Self::key(record.condition, &record.target, record.metric);
        self.history.entry(key.clone()).or_default().push(record.clone());
        self.latest.insert(key, record);
        Ok(())
    }

    fn get_latest(&self, condition: Condition, target: &str, metric: Metric) -> Result<MetricRecord> {
        self.latest
            .get(&Self::key(condition, target, metric))
            .cloned()
            .ok_or_else(|| Error::MissingRecord {
                condition,
                target: target.to_string(),
                metric,
            })
    }

    fn history(&self, condition: Condition, target: &str, metric: Metric) -> Result<Vec<MetricRecord>> {
        Ok(self
            .history
            .get(&Self::key(condition, target, metric))
            .cloned()
            .unwrap_or_default())
    }

    fn list_targets(&self, condition: Condition) -> Result<BTreeSet<String>> {
        Ok(self
            .latest
            .keys()
            .filter(|(c, _, _)| *c == condition)
            .map(|(_, target, _)| target.clone())
            .collect())
    }
}

/// @ai:intent Latest record that also carries a value
/// @ai:effects state:read
pub fn latest_value<S: RecordStore + ?Sized>(
    store: &S,
    condition: Condition,
    target: &str,
    metric: Metric,
) -> Result<(MetricRecord, f64)> {
    let record = store.get_latest(condition, target, metric)?;

    match record.value {
        Some(value) => Ok((record, value)),
        None => Err(Error::MissingValue {
            condition,
            target: target.to_string(),
            metric,
        }),
    }
}
