//! @ai:module:intent Per-target baseline vs tunneled comparison over a record store snapshot
//! @ai:module:layer application
//! @ai:module:public_api ComparisonAggregator, ComparisonAggregatorTrait, DEFAULT_TARGETS
//! @ai:module:stateless true

use crate::analysis::delta::compute_delta;
use crate::analysis::rating::{classify, BenchmarkProfile, LatencyAxis, MetricCategory, Rating};
use crate::analysis::types::{
    AggregateResult, AggregationIssue, ComparisonResult, DnsResolutionObservation,
    OverallAssessment,
};
use crate::error::Result;
use crate::records::{latest_value, Condition, Metric, MetricRecord, RecordStore};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Canonical target order used when no targets are configured.
pub const DEFAULT_TARGETS: [&str; 3] = ["gateway", "google_dns", "cloudflare_dns"];

/// @ai:intent Trait for comparison aggregation
pub trait ComparisonAggregatorTrait: Send + Sync {
    /// @ai:intent Compare every (target, metric) pair and summarize the run
    fn aggregate(&self, store: &dyn RecordStore, targets: &[String], metrics: &[Metric]) -> AggregateResult;
}

/// @ai:intent Aggregates comparisons under one benchmark profile
pub struct ComparisonAggregator {
    profile: BenchmarkProfile,
}

impl ComparisonAggregator {
    /// @ai:intent Create an aggregator for a profile
    /// @ai:effects pure
    pub fn new(profile: BenchmarkProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> BenchmarkProfile {
        self.profile
    }

    /// @ai:intent Aggregate with an explicit generation time
    /// @ai:effects state:read
    pub fn aggregate_at(
        &self,
        store: &dyn RecordStore,
        targets: &[String],
        metrics: &[Metric],
        now: DateTime<Utc>,
    ) -> AggregateResult {
        let mut issues = Vec::new();

        let latency_metrics: Vec<Metric> = Metric::LATENCY
            .into_iter()
            .filter(|m| metrics.contains(m))
            .collect();

        let mut latency = Vec::with_capacity(targets.len() * latency_metrics.len());
        for target in targets {
            for metric in &latency_metrics {
                latency.push(self.compare_or_record(store, target, *metric, &mut issues));
            }
        }

        let bandwidth = if metrics.contains(&Metric::BandwidthBps) {
            self.compare_bandwidth(store, &mut issues)
        } else {
            Vec::new()
        };

        let dns = if metrics.contains(&Metric::DnsResolutionSeconds) {
            dns_observation(store)
        } else {
            None
        };

        let assessment = self.assess(&latency, &bandwidth);

        let baseline_tests = count_targets(store, Condition::Baseline);
        let vpn_tests = count_targets(store, Condition::Tunneled);

        tracing::info!(
            "Aggregated {} latency and {} bandwidth comparisons ({} incomplete, profile {})",
            latency.len(),
            bandwidth.len(),
            latency
                .iter()
                .chain(bandwidth.iter())
                .filter(|c| !c.is_complete())
                .count(),
            self.profile
        );

        AggregateResult {
            timestamp: now.format("%Y%m%d_%H%M%S").to_string(),
            generated: now.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            profile: self.profile,
            baseline_tests,
            vpn_tests,
            targets: targets.to_vec(),
            latency,
            bandwidth,
            dns,
            assessment,
            issues,
        }
    }

    /// @ai:intent Compare one pair; hard failures are recorded as issues and the pair is marked incomplete
    /// @ai:effects state:read
    fn compare_or_record(
        &self,
        store: &dyn RecordStore,
        target: &str,
        metric: Metric,
        issues: &mut Vec<AggregationIssue>,
    ) -> ComparisonResult {
        match self.compare(store, target, metric) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Comparison failed for {}/{}: {}", target, metric, e);
                issues.push(AggregationIssue {
                    target: target.to_string(),
                    metric,
                    message: e.to_string(),
                });
                ComparisonResult::incomplete(target, metric, None, None, Vec::new())
            }
        }
    }

    /// @ai:intent Compare the latest baseline and tunneled records for one (target, metric)
    /// @ai:post Missing or empty records yield an Incomplete result, not an error
    /// @ai:effects state:read
    pub fn compare(&self, store: &dyn RecordStore, target: &str, metric: Metric) -> Result<ComparisonResult> {
        let baseline = lookup(store, Condition::Baseline, target, metric)?;
        let tunneled = lookup(store, Condition::Tunneled, target, metric)?;

        match (baseline, tunneled) {
            (Some(b), Some(t)) => {
                let delta = compute_delta(&b, &t)?;
                Ok(ComparisonResult::from_delta(
                    target,
                    metric,
                    delta,
                    self.profile,
                    t.interface_label.clone(),
                ))
            }
            (b, t) => {
                let mut missing = Vec::new();
                if b.is_none() {
                    missing.push(Condition::Baseline);
                }
                if t.is_none() {
                    missing.push(Condition::Tunneled);
                }

                tracing::debug!("Incomplete comparison for {}/{}: missing {:?}", target, metric, missing);
                Ok(ComparisonResult::incomplete(
                    target,
                    metric,
                    b.and_then(|r| r.value),
                    t.and_then(|r| r.value),
                    missing,
                ))
            }
        }
    }

    /// @ai:intent Compare every bandwidth target seen under either condition
    /// @ai:effects state:read
    fn compare_bandwidth(&self, store: &dyn RecordStore, issues: &mut Vec<AggregationIssue>) -> Vec<ComparisonResult> {
        let mut candidates = BTreeSet::new();
        for condition in Condition::ALL {
            match store.list_targets(condition) {
                Ok(targets) => candidates.extend(targets),
                Err(e) => tracing::warn!("Could not list {} targets: {}", condition, e),
            }
        }

        candidates
            .into_iter()
            .filter(|target| {
                Condition::ALL
                    .iter()
                    .any(|c| store.get_latest(*c, target, Metric::BandwidthBps).is_ok())
            })
            .map(|target| self.compare_or_record(store, &target, Metric::BandwidthBps, issues))
            .collect()
    }

    /// @ai:intent Mean avg-ping overhead and mean bandwidth efficiency, rated on the worse of the two
    /// @ai:effects pure
    fn assess(&self, latency: &[ComparisonResult], bandwidth: &[ComparisonResult]) -> OverallAssessment {
        let avg_latency_overhead = mean(
            latency
                .iter()
                .filter(|c| c.metric == Metric::AvgLatencyMs && c.is_complete())
                .filter_map(|c| c.rated_value(self.profile)),
        );

        let avg_bandwidth_efficiency = mean(
            bandwidth
                .iter()
                .filter(|c| c.is_complete())
                .filter_map(|c| c.efficiency),
        );

        let rating = match (avg_latency_overhead, avg_bandwidth_efficiency) {
            (Some(lat), Some(bw)) => {
                classify(MetricCategory::LatencyOverhead, Some(lat), self.profile).worst(classify(
                    MetricCategory::BandwidthEfficiency,
                    Some(bw),
                    self.profile,
                ))
            }
            _ => Rating::Unrated,
        };

        let latency_unit = match self.profile.latency_axis() {
            LatencyAxis::OverheadPercent => "%",
            LatencyAxis::OverheadMs => "ms",
        };

        OverallAssessment {
            avg_latency_overhead,
            latency_unit: latency_unit.to_string(),
            avg_bandwidth_efficiency,
            rating,
        }
    }
}

impl ComparisonAggregatorTrait for ComparisonAggregator {
    fn aggregate(&self, store: &dyn RecordStore, targets: &[String], metrics: &[Metric]) -> AggregateResult {
        self.aggregate_at(store, targets, metrics, Utc::now())
    }
}

impl Default for ComparisonAggregator {
    fn default() -> Self {
        Self::new(BenchmarkProfile::default())
    }
}

/// @ai:intent Latest record with a value, Ok(None) when unavailable
/// @ai:effects state:read
fn lookup(store: &dyn RecordStore, condition: Condition, target: &str, metric: Metric) -> Result<Option<MetricRecord>> {
    match latest_value(store, condition, target, metric) {
        Ok((record, _)) => Ok(Some(record)),
        Err(e) if e.is_unavailable() => Ok(None),
        Err(e) => Err(e),
    }
}

/// @ai:intent Most recent tunneled DNS timing, if any was recorded
/// @ai:effects state:read
fn dns_observation(store: &dyn RecordStore) -> Option<DnsResolutionObservation> {
    let targets = match store.list_targets(Condition::Tunneled) {
        Ok(targets) => targets,
        Err(e) => {
            tracing::warn!("Could not list tunneled targets: {}", e);
            return None;
        }
    };

    targets
        .iter()
        .filter_map(|t| {
            store
                .get_latest(Condition::Tunneled, t, Metric::DnsResolutionSeconds)
                .ok()
        })
        .max_by_key(|r| r.captured_at)
        .map(|r| DnsResolutionObservation {
            domain: r.target,
            resolution_time_seconds: r.value,
            captured_at: r.captured_at,
            interface_label: r.interface_label,
        })
}

fn count_targets(store: &dyn RecordStore, condition: Condition) -> usize {
    store.list_targets(condition).map(|t| t.len()).unwrap_or(0)
}

/// @ai:intent Arithmetic mean, None for an empty iterator
/// @ai:effects pure
fn mean<I: Iterator<Item = f64>>(iter: I) -> Option<f64> {
    let (sum, count) = iter.fold((0.0, 0u32), |(s, c), v| (s + v, c + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::ComparisonStatus;
    use crate::records::{FileRecordStore, MemoryRecordStore};
    use chrono::TimeZone;

    fn targets() -> Vec<String> {
        DEFAULT_TARGETS.iter().map(|t| t.to_string()).collect()
    }

    fn put(store: &mut MemoryRecordStore, condition: Condition, target: &str, metric: Metric, value: Option<f64>) {
        store
            .put(MetricRecord::new(condition, target, metric, value, Utc::now()))
            .unwrap();
    }

    fn put_ping(store: &mut MemoryRecordStore, condition: Condition, target: &str, avg: f64) {
        put(store, condition, target, Metric::MinLatencyMs, Some(avg * 0.8));
        put(store, condition, target, Metric::AvgLatencyMs, Some(avg));
        put(store, condition, target, Metric::MaxLatencyMs, Some(avg * 1.5));
        put(store, condition, target, Metric::PacketLossPercent, Some(0.0));
    }

    #[test]
    fn test_aggregate_preserves_canonical_order() {
        let mut store = MemoryRecordStore::new();
        for target in DEFAULT_TARGETS.iter().rev() {
            put_ping(&mut store, Condition::Baseline, target, 5.0);
            put_ping(&mut store, Condition::Tunneled, target, 5.4);
        }

        let result = ComparisonAggregator::new(BenchmarkProfile::Local).aggregate(&store, &targets(), &Metric::ALL);

        assert_eq!(result.latency.len(), 12);
        let order: Vec<_> = result.latency.iter().step_by(4).map(|c| c.target.as_str()).collect();
        assert_eq!(order, DEFAULT_TARGETS.to_vec());
        assert_eq!(result.latency[1].metric, Metric::AvgLatencyMs);
        assert_eq!(result.baseline_tests, 3);
        assert_eq!(result.vpn_tests, 3);
    }

    #[test]
    fn test_missing_baseline_marks_only_that_target_incomplete() {
        let mut store = MemoryRecordStore::new();
        put_ping(&mut store, Condition::Baseline, "gateway", 5.0);
        put_ping(&mut store, Condition::Tunneled, "gateway", 5.4);
        put_ping(&mut store, Condition::Baseline, "google_dns", 10.0);
        put_ping(&mut store, Condition::Tunneled, "google_dns", 12.6);
        put_ping(&mut store, Condition::Tunneled, "cloudflare_dns", 9.0);

        let result = ComparisonAggregator::new(BenchmarkProfile::Local).aggregate(&store, &targets(), &Metric::LATENCY);

        let cloudflare = result.find("cloudflare_dns", Metric::AvgLatencyMs).unwrap();
        assert_eq!(cloudflare.status, ComparisonStatus::Incomplete);
        assert_eq!(cloudflare.missing, vec![Condition::Baseline]);
        assert_eq!(cloudflare.rating, Rating::Unrated);

        let gateway = result.find("gateway", Metric::AvgLatencyMs).unwrap();
        assert!(gateway.is_complete());
        assert_eq!(gateway.rating, Rating::Excellent);

        let google = result.find("google_dns", Metric::AvgLatencyMs).unwrap();
        assert_eq!(google.rating, Rating::Poor);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_zero_baseline_is_unrated() {
        let mut store = MemoryRecordStore::new();
        put(&mut store, Condition::Baseline, "gateway", Metric::AvgLatencyMs, Some(0.0));
        put(&mut store, Condition::Tunneled, "gateway", Metric::AvgLatencyMs, Some(2.0));

        let aggregator = ComparisonAggregator::new(BenchmarkProfile::Local);
        let result = aggregator.compare(&store, "gateway", Metric::AvgLatencyMs).unwrap();

        assert!(result.is_complete());
        assert_eq!(result.percent_delta, None);
        assert_eq!(result.rating, Rating::Unrated);
    }

    #[test]
    fn test_null_value_is_incomplete() {
        let mut store = MemoryRecordStore::new();
        put(&mut store, Condition::Baseline, "gateway", Metric::AvgLatencyMs, Some(5.0));
        put(&mut store, Condition::Tunneled, "gateway", Metric::AvgLatencyMs, None);

        let result = ComparisonAggregator::new(BenchmarkProfile::Local)
            .compare(&store, "gateway", Metric::AvgLatencyMs)
            .unwrap();

        assert_eq!(result.status, ComparisonStatus::Incomplete);
        assert_eq!(result.missing, vec![Condition::Tunneled]);
        assert_eq!(result.baseline_value, Some(5.0));
    }

    #[test]
    fn test_bandwidth_and_assessment() {
        let mut store = MemoryRecordStore::new();
        put_ping(&mut store, Condition::Baseline, "gateway", 5.0);
        put_ping(&mut store, Condition::Tunneled, "gateway", 5.4);
        put(&mut store, Condition::Baseline, "server_upload", Metric::BandwidthBps, Some(500e6));
        put(&mut store, Condition::Tunneled, "server_upload", Metric::BandwidthBps, Some(475e6));
        put(&mut store, Condition::Tunneled, "server_download", Metric::BandwidthBps, Some(400e6));

        let result = ComparisonAggregator::new(BenchmarkProfile::Local).aggregate(&store, &targets(), &Metric::ALL);

        assert_eq!(result.bandwidth.len(), 2);
        let upload = result.bandwidth.iter().find(|c| c.target == "server_upload").unwrap();
        assert!((upload.efficiency.unwrap() - 95.0).abs() < 1e-9);
        assert_eq!(upload.rating, Rating::Excellent);
        let download = result.bandwidth.iter().find(|c| c.target == "server_download").unwrap();
        assert!(!download.is_complete());

        assert!((result.assessment.avg_latency_overhead.unwrap() - 8.0).abs() < 1e-9);
        assert_eq!(result.assessment.rating, Rating::Excellent);
    }

    #[test]
    fn test_assessment_without_bandwidth_is_unrated() {
        let mut store = MemoryRecordStore::new();
        put_ping(&mut store, Condition::Baseline, "gateway", 5.0);
        put_ping(&mut store, Condition::Tunneled, "gateway", 5.4);

        let result = ComparisonAggregator::new(BenchmarkProfile::Local).aggregate(&store, &targets(), &Metric::ALL);

        assert!(result.bandwidth.is_empty());
        assert_eq!(result.assessment.avg_bandwidth_efficiency, None);
        assert_eq!(result.assessment.rating, Rating::Unrated);
    }

    #[test]
    fn test_dns_is_standalone_observation() {
        let mut store = MemoryRecordStore::new();
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        store
            .put(MetricRecord::new(Condition::Tunneled, "example.com", Metric::DnsResolutionSeconds, Some(0.02), at))
            .unwrap();
        store
            .put(MetricRecord::new(
                Condition::Tunneled,
                "example.org",
                Metric::DnsResolutionSeconds,
                Some(0.05),
                at + chrono::Duration::seconds(30),
            ))
            .unwrap();

        let result = ComparisonAggregator::new(BenchmarkProfile::Local).aggregate(&store, &targets(), &Metric::ALL);

        let dns = result.dns.unwrap();
        assert_eq!(dns.domain, "example.org");
        assert_eq!(dns.resolution_time_seconds, Some(0.05));
        assert!(result.bandwidth.is_empty());
    }

    #[test]
    fn test_timestamps_come_from_generation_time() {
        let store = MemoryRecordStore::new();
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap();
        let result = ComparisonAggregator::default().aggregate_at(&store, &targets(), &Metric::ALL, now);

        assert_eq!(result.timestamp, "20250301_101500");
        assert_eq!(result.generated, "2025-03-01 10:15:00 UTC");
        assert_eq!(result.latency.len(), 12);
        assert!(result.latency.iter().all(|c| c.missing.len() == 2));
    }

    #[test]
    fn test_corrupt_store_file_is_recorded_as_issue() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut store = FileRecordStore::open(temp.path()).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        for (condition, target, value) in [
            (Condition::Baseline, "gateway", 5.0),
            (Condition::Tunneled, "gateway", 5.4),
            (Condition::Baseline, "google_dns", 10.0),
            (Condition::Tunneled, "google_dns", 11.0),
        ] {
            store
                .put(MetricRecord::new(condition, target, Metric::AvgLatencyMs, Some(value), at))
                .unwrap();
        }
        store
            .put(MetricRecord::new(Condition::Tunneled, "example.com", Metric::DnsResolutionSeconds, Some(0.02), at))
            .unwrap();

        std::fs::write(
            temp.path().join("vpn").join("google_dns__avg_ping_ms_latest.json"),
            "garbage",
        )
        .unwrap();

        let result = ComparisonAggregator::new(BenchmarkProfile::Local).aggregate_at(
            &store,
            &targets(),
            &[Metric::AvgLatencyMs],
            at,
        );

        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].target, "google_dns");
        assert_eq!(result.find("gateway", Metric::AvgLatencyMs).unwrap().status, ComparisonStatus::Complete);
        assert_eq!(result.find("google_dns", Metric::AvgLatencyMs).unwrap().status, ComparisonStatus::Incomplete);
        assert_eq!(result.baseline_tests, 2);
        assert_eq!(result.vpn_tests, 3);
        assert_eq!(result.dns.unwrap().domain, "example.com");
    }
}
