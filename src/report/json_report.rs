//! @ai:module:intent Structured (JSON) summary of a comparison run
//! @ai:module:layer infrastructure
//! @ai:module:public_api JsonReporter, JsonReporterTrait
//! @ai:module:stateless true

use crate::analysis::{round2, AggregateResult, ComparisonStatus, Rating};
use crate::records::Metric;
use crate::report::format::to_mbps;
use anyhow::Result;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::path::Path;

/// @ai:intent Trait for JSON report generation
pub trait JsonReporterTrait: Send + Sync {
    /// @ai:intent Render the structured summary
    fn render(&self, results: &AggregateResult) -> Result<String>;

    /// @ai:intent Render and write the structured summary to a file
    fn generate(&self, results: &AggregateResult, output_path: &Path) -> Result<()> {
        std::fs::write(output_path, self.render(results)?)?;
        Ok(())
    }
}

/// @ai:intent Generates the machine-readable summary
pub struct JsonReporter;

impl JsonReporter {
    /// @ai:intent Create a new JSON reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct StructuredSummary<'a> {
    test_summary: TestSummary<'a>,
    results: TargetResults<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bandwidth: Vec<BandwidthEntry<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dns_resolution: Option<DnsEntry<'a>>,
}

#[derive(Serialize)]
struct TestSummary<'a> {
    timestamp: &'a str,
    generated: &'a str,
    profile: &'static str,
    baseline_tests: usize,
    vpn_tests: usize,
}

#[derive(Serialize)]
struct TargetEntry {
    baseline_avg_ms: Option<f64>,
    vpn_avg_ms: Option<f64>,
    overhead_ms: Option<f64>,
    overhead_percent: Option<f64>,
    rating: Rating,
    status: ComparisonStatus,
}

/// Keyed by target, in report order.
struct TargetResults<'a>(Vec<(&'a str, TargetEntry)>);

impl Serialize for TargetResults<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (target, entry) in &self.0 {
            map.serialize_entry(target, entry)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct BandwidthEntry<'a> {
    test: &'a str,
    baseline_mbps: Option<f64>,
    vpn_mbps: Option<f64>,
    efficiency_percent: Option<f64>,
    bandwidth_loss_percent: Option<f64>,
    rating: Rating,
    status: ComparisonStatus,
}

#[derive(Serialize)]
struct DnsEntry<'a> {
    domain: &'a str,
    resolution_time_seconds: Option<f64>,
}

fn rounded(value: Option<f64>) -> Option<f64> {
    value.map(round2)
}

/// @ai:intent Build the serializable view; values rounded to 2 decimals
/// @ai:effects pure
fn summarize(results: &AggregateResult) -> StructuredSummary<'_> {
    let targets = results
        .targets
        .iter()
        .filter_map(|target| {
            let avg = results.find(target, Metric::AvgLatencyMs)?;
            Some((
                target.as_str(),
                TargetEntry {
                    baseline_avg_ms: rounded(avg.baseline_value),
                    vpn_avg_ms: rounded(avg.tunneled_value),
                    overhead_ms: rounded(avg.absolute_delta),
                    overhead_percent: rounded(avg.percent_delta),
                    rating: avg.rating,
                    status: avg.status,
                },
            ))
        })
        .collect();

    let bandwidth = results
        .bandwidth
        .iter()
        .map(|c| BandwidthEntry {
            test: &c.target,
            baseline_mbps: rounded(c.baseline_value.map(to_mbps)),
            vpn_mbps: rounded(c.tunneled_value.map(to_mbps)),
            efficiency_percent: rounded(c.efficiency),
            bandwidth_loss_percent: rounded(c.efficiency.map(|e| 100.0 - e)),
            rating: c.rating,
            status: c.status,
        })
        .collect();

    let dns_resolution = results.dns.as_ref().map(|d| DnsEntry {
        domain: &d.domain,
        resolution_time_seconds: d.resolution_time_seconds.map(|s| (s * 1e4).round() / 1e4),
    });

    StructuredSummary {
        test_summary: TestSummary {
            timestamp: &results.timestamp,
            generated: &results.generated,
            profile: results.profile.as_str(),
            baseline_tests: results.baseline_tests,
            vpn_tests: results.vpn_tests,
        },
        results: TargetResults(targets),
        bandwidth,
        dns_resolution,
    }
}

impl JsonReporterTrait for JsonReporter {
    /// @ai:intent Render the structured summary as pretty JSON
    /// @ai:effects pure
    fn render(&self, results: &AggregateResult) -> Result<String> {
        Ok(serde_json::to_string_pretty(&summarize(results))?)
    }
}
