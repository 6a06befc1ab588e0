//! @ai:module:intent Comparison result types produced by the aggregator
//! @ai:module:layer domain
//! @ai:module:public_api ComparisonResult, ComparisonStatus, DnsResolutionObservation, OverallAssessment, AggregateResult
//! @ai:module:stateless true

use crate::analysis::delta::Delta;
use crate::analysis::rating::{classify, BenchmarkProfile, LatencyAxis, MetricCategory, Rating};
use crate::records::{Condition, Metric};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// @ai:intent Whether both sides of a comparison were available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonStatus {
    Complete,
    Incomplete,
}

/// @ai:intent Baseline vs tunneled comparison for one (target, metric)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub target: String,
    pub metric: Metric,
    pub baseline_value: Option<f64>,
    pub tunneled_value: Option<f64>,
    pub absolute_delta: Option<f64>,
    /// None when incomplete or the baseline is zero ("N/A")
    pub percent_delta: Option<f64>,
    pub efficiency: Option<f64>,
    pub rating: Rating,
    pub status: ComparisonStatus,
    /// Conditions whose record was missing or empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_label: Option<String>,
}

impl ComparisonResult {
    /// @ai:intent Build a complete result; the rating is derived, never passed in
    /// @ai:effects pure
    pub fn from_delta(
        target: &str,
        metric: Metric,
        delta: Delta,
        profile: BenchmarkProfile,
        interface_label: Option<String>,
    ) -> Self {
        Self {
            target: target.to_string(),
            metric,
            baseline_value: Some(delta.baseline),
            tunneled_value: Some(delta.tunneled),
            absolute_delta: Some(delta.absolute),
            percent_delta: delta.percent,
            efficiency: delta.efficiency,
            rating: rate_delta(metric, &delta, profile),
            status: ComparisonStatus::Complete,
            missing: Vec::new(),
            interface_label,
        }
    }

    /// @ai:intent Build an Incomplete result carrying whichever side was present
    /// @ai:effects pure
    pub fn incomplete(
        target: &str,
        metric: Metric,
        baseline_value: Option<f64>,
        tunneled_value: Option<f64>,
        missing: Vec<Condition>,
    ) -> Self {
        Self {
            target: target.to_string(),
            metric,
            baseline_value,
            tunneled_value,
            absolute_delta: None,
            percent_delta: None,
            efficiency: None,
            rating: Rating::Unrated,
            status: ComparisonStatus::Incomplete,
            missing,
            interface_label: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == ComparisonStatus::Complete
    }

    /// @ai:intent Value this comparison is rated on under the given profile
    /// @ai:effects pure
    pub fn rated_value(&self, profile: BenchmarkProfile) -> Option<f64> {
        match MetricCategory::for_metric(self.metric)? {
            MetricCategory::LatencyOverhead => match profile.latency_axis() {
                LatencyAxis::OverheadPercent => self.percent_delta,
                LatencyAxis::OverheadMs => self.absolute_delta,
            },
            MetricCategory::PacketLoss => self.tunneled_value,
            MetricCategory::BandwidthEfficiency => self.efficiency,
        }
    }
}

/// @ai:intent Rate a delta: latency on the profile's axis, loss on the tunneled value,
///            bandwidth on efficiency
/// @ai:effects pure
pub fn rate_delta(metric: Metric, delta: &Delta, profile: BenchmarkProfile) -> Rating {
    let Some(category) = MetricCategory::for_metric(metric) else {
        return Rating::Unrated;
    };

    let value = match category {
        MetricCategory::LatencyOverhead => match profile.latency_axis() {
            LatencyAxis::OverheadPercent => delta.percent,
            LatencyAxis::OverheadMs => Some(delta.absolute),
        },
        MetricCategory::PacketLoss => Some(delta.tunneled),
        MetricCategory::BandwidthEfficiency => delta.efficiency,
    };

    classify(category, value, profile)
}

/// @ai:intent Standalone DNS timing measured under the tunneled condition only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsResolutionObservation {
    pub domain: String,
    pub resolution_time_seconds: Option<f64>,
    pub captured_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_label: Option<String>,
}

/// @ai:intent Cross-target summary of latency overhead and bandwidth efficiency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallAssessment {
    /// Mean avg-ping overhead: percent (Local) or ms (Geographic)
    pub avg_latency_overhead: Option<f64>,
    pub latency_unit: String,
    pub avg_bandwidth_efficiency: Option<f64>,
    pub rating: Rating,
}

/// @ai:intent A comparison that failed hard (e.g. unreadable record) without aborting the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationIssue {
    pub target: String,
    pub metric: Metric,
    pub message: String,
}

/// @ai:intent Everything one analysis invocation produced, input to every renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Run identifier, `%Y%m%d_%H%M%S`
    pub timestamp: String,
    /// Human-readable generation time
    pub generated: String,
    pub profile: BenchmarkProfile,
    pub baseline_tests: usize,
    pub vpn_tests: usize,
    /// Targets in report order
    pub targets: Vec<String>,
    pub latency: Vec<ComparisonResult>,
    pub bandwidth: Vec<ComparisonResult>,
    pub dns: Option<DnsResolutionObservation>,
    pub assessment: OverallAssessment,
    #[serde(default)]
    pub issues: Vec<AggregationIssue>,
}

impl AggregateResult {
    /// @ai:intent Latency comparison for one (target, metric)
    /// @ai:effects pure
    pub fn find(&self, target: &str, metric: Metric) -> Option<&ComparisonResult> {
        self.latency
            .iter()
            .find(|c| c.target == target && c.metric == metric)
    }

    /// @ai:intent Latency comparisons of one target, in metric order
    /// @ai:effects pure
    pub fn for_target<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a ComparisonResult> + 'a {
        self.latency.iter().filter(move |c| c.target == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(baseline: f64, tunneled: f64) -> Delta {
        Delta {
            baseline,
            tunneled,
            absolute: tunneled - baseline,
            percent: Some((tunneled - baseline) / baseline * 100.0),
            efficiency: Some(tunneled / baseline * 100.0),
        }
    }

    #[test]
    fn test_rating_is_derived_from_metric_and_profile() {
        let d = delta(10.0, 12.6);
        let local = ComparisonResult::from_delta("gateway", Metric::AvgLatencyMs, d, BenchmarkProfile::Local, None);
        let geo = ComparisonResult::from_delta("gateway", Metric::AvgLatencyMs, d, BenchmarkProfile::Geographic, None);

        assert_eq!(local.rating, Rating::Poor);
        assert_eq!(geo.rating, Rating::Excellent);
        assert_eq!(geo.rated_value(BenchmarkProfile::Geographic), geo.absolute_delta);
    }

    #[test]
    fn test_packet_loss_rated_on_tunneled_value() {
        let d = delta(0.0, 0.4);
        assert_eq!(rate_delta(Metric::PacketLossPercent, &d, BenchmarkProfile::Local), Rating::Good);
    }

    #[test]
    fn test_incomplete_is_unrated() {
        let result = ComparisonResult::incomplete(
            "cloudflare_dns",
            Metric::AvgLatencyMs,
            None,
            Some(9.0),
            vec![Condition::Baseline],
        );
        assert!(!result.is_complete());
        assert_eq!(result.rating, Rating::Unrated);
        assert_eq!(result.tunneled_value, Some(9.0));
    }
}
