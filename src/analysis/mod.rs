//! @ai:module:intent Delta computation, rating classification and comparison aggregation
//! @ai:module:layer application
//! @ai:module:public_api Delta, Rating, BenchmarkProfile, ComparisonAggregator, ComparisonResult, AggregateResult

pub mod aggregator;
pub mod delta;
pub mod rating;
pub mod types;

pub use aggregator::{ComparisonAggregator, ComparisonAggregatorTrait, DEFAULT_TARGETS};
pub use delta::{compute_delta, efficiency, percent_delta, round2, Delta};
pub use rating::{
    classify, BenchmarkProfile, Direction, LatencyAxis, MetricCategory, Rating, ThresholdTable,
};
pub use types::{
    rate_delta, AggregateResult, AggregationIssue, ComparisonResult, ComparisonStatus,
    DnsResolutionObservation, OverallAssessment,
};
