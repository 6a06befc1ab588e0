//! @ai:module:intent Baseline vs tunneled network performance comparison library
//! @ai:module:layer application
//! @ai:module:public_api config, error, records, analysis, report

pub mod analysis;
pub mod config;
pub mod error;
pub mod records;
pub mod report;

pub use analysis::{
    AggregateResult, BenchmarkProfile, ComparisonAggregator, ComparisonAggregatorTrait,
    ComparisonResult, ComparisonStatus, Delta, Rating,
};
pub use config::AnalyzerConfig;
pub use error::{Error, Result};
pub use records::{
    CollectorLoader, Condition, FileRecordStore, MemoryRecordStore, Metric, MetricRecord,
    RecordStore,
};
pub use report::{RenderedReport, ReportGenerator};
