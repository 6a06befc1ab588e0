//! @ai:module:intent Metric records, their stores and collector ingestion
//! @ai:module:layer domain
//! @ai:module:public_api MetricRecord, Condition, Metric, RecordStore, MemoryRecordStore, FileRecordStore, CollectorLoader

pub mod file_store;
pub mod ingest;
pub mod store;
pub mod types;

pub use file_store::FileRecordStore;
pub use ingest::{parse_collector_record, CollectorKind, CollectorLoader, IngestReport, RejectedFile};
pub use store::{latest_value, MemoryRecordStore, RecordKey, RecordStore};
pub use types::{Condition, Metric, MetricRecord};
