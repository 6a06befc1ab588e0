//! @ai:module:intent Tabular (markdown) comparison document
//! @ai:module:layer infrastructure
//! @ai:module:public_api MarkdownReporter, MarkdownReporterTrait
//! @ai:module:stateless true

use crate::analysis::{AggregateResult, ComparisonResult, MetricCategory};
use crate::records::{Condition, Metric};
use crate::report::format;
use anyhow::Result;
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// @ai:intent Trait for Markdown report generation
pub trait MarkdownReporterTrait: Send + Sync {
    /// @ai:intent Render the tabular comparison
    fn render(&self, results: &AggregateResult) -> Result<String>;

    /// @ai:intent Render and write the tabular comparison to a file
    fn generate(&self, results: &AggregateResult, output_path: &Path) -> Result<()> {
        std::fs::write(output_path, self.render(results)?)?;
        Ok(())
    }
}

/// @ai:intent Generates the human-readable comparison tables
pub struct MarkdownReporter;

impl MarkdownReporter {
    /// @ai:intent Create a new Markdown reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Difference cell: absolute delta plus percent, or N/A
    /// @ai:effects pure
    fn format_difference(comparison: &ComparisonResult) -> String {
        if !comparison.is_complete() {
            return format::NOT_AVAILABLE.to_string();
        }

        let unit = comparison.metric.unit();
        format!(
            "{} ({})",
            format::signed(comparison.absolute_delta, unit),
            format::signed(comparison.percent_delta, "%")
        )
    }

    fn describe_missing(missing: &[Condition]) -> String {
        let names: Vec<_> = missing.iter().map(|c| c.as_str()).collect();
        if names.is_empty() {
            "record unreadable".to_string()
        } else {
            format!("missing {} record", names.join(" and "))
        }
    }

    /// @ai:intent Generate header section
    /// @ai:effects pure
    fn generate_summary(results: &AggregateResult) -> String {
        let mut output = String::new();

        writeln!(output, "# Tunnel Performance Comparison").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "**Generated:** {}", results.generated).unwrap();
        writeln!(output, "**Profile:** {}", results.profile.description()).unwrap();
        writeln!(
            output,
            "**Tests:** {} baseline, {} tunneled",
            results.baseline_tests, results.vpn_tests
        )
        .unwrap();
        writeln!(output).unwrap();

        output
    }

    /// @ai:intent One section per target: MinPing/AvgPing/MaxPing/PacketLoss x Baseline/Tunneled/Difference
    /// @ai:effects pure
    fn generate_target_section(results: &AggregateResult, target: &str) -> String {
        let mut output = String::new();
        let rows: Vec<_> = results.for_target(target).collect();

        writeln!(output, "## {}", format::title(target)).unwrap();
        writeln!(output).unwrap();

        if rows.is_empty() {
            writeln!(output, "_No latency metrics requested._").unwrap();
            writeln!(output).unwrap();
            return output;
        }

        writeln!(output, "| Metric | Baseline | Tunneled | Difference |").unwrap();
        writeln!(output, "|--------|----------|----------|------------|").unwrap();

        for row in &rows {
            writeln!(
                output,
                "| {} | {} | {} | {} |",
                row.metric.label(),
                format::metric_value(row.metric, row.baseline_value),
                format::metric_value(row.metric, row.tunneled_value),
                Self::format_difference(row)
            )
            .unwrap();
        }
        writeln!(output).unwrap();

        if let Some(avg) = rows.iter().find(|r| r.metric == Metric::AvgLatencyMs) {
            if avg.is_complete() {
                writeln!(
                    output,
                    "**Rating:** {} (avg ping overhead {}, {})",
                    avg.rating,
                    format::signed(avg.absolute_delta, "ms"),
                    format::signed(avg.percent_delta, "%")
                )
                .unwrap();
            } else {
                writeln!(
                    output,
                    "**Rating:** {} (data unavailable: {})",
                    avg.rating,
                    Self::describe_missing(&avg.missing)
                )
                .unwrap();
            }
        }

        if let Some(loss) = rows.iter().find(|r| r.metric == Metric::PacketLossPercent && r.is_complete()) {
            writeln!(output, "**Packet loss rating:** {}", loss.rating).unwrap();
        }

        if let Some(interface) = rows.iter().find_map(|r| r.interface_label.as_deref()) {
            writeln!(output, "**Tunnel interface:** {}", interface).unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    /// @ai:intent Generate bandwidth section
    /// @ai:effects pure
    fn generate_bandwidth_section(results: &AggregateResult) -> String {
        let mut output = String::new();

        writeln!(output, "## Bandwidth").unwrap();
        writeln!(output).unwrap();

        if results.bandwidth.is_empty() {
            writeln!(output, "No bandwidth data available.").unwrap();
            writeln!(output).unwrap();
            return output;
        }

        writeln!(output, "| Test | Baseline | Tunneled | Efficiency | Rating |").unwrap();
        writeln!(output, "|------|----------|----------|------------|--------|").unwrap();

        for c in &results.bandwidth {
            writeln!(
                output,
                "| {} | {} | {} | {} | {} |",
                format::title(&c.target),
                format::metric_value(c.metric, c.baseline_value),
                format::metric_value(c.metric, c.tunneled_value),
                format::value(c.efficiency, "%"),
                c.rating
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    /// @ai:intent Generate DNS observation section
    /// @ai:effects pure
    fn generate_dns_section(results: &AggregateResult) -> String {
        let mut output = String::new();

        writeln!(output, "## DNS Resolution").unwrap();
        writeln!(output).unwrap();

        match &results.dns {
            Some(dns) => {
                let ms = dns.resolution_time_seconds.map(|s| s * 1000.0);
                writeln!(
                    output,
                    "Resolving `{}` through the tunnel took {}.",
                    dns.domain,
                    format::value(ms, "ms")
                )
                .unwrap();
            }
            None => {
                writeln!(output, "No DNS resolution data available.").unwrap();
            }
        }

        writeln!(output).unwrap();
        output
    }

    /// @ai:intent Generate overall assessment section
    /// @ai:effects pure
    fn generate_assessment_section(results: &AggregateResult) -> String {
        let mut output = String::new();
        let assessment = &results.assessment;

        writeln!(output, "## Overall Assessment").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "- Average latency overhead: {}",
            format::signed(assessment.avg_latency_overhead, &assessment.latency_unit)
        )
        .unwrap();
        writeln!(
            output,
            "- Average bandwidth efficiency: {}",
            format::value(assessment.avg_bandwidth_efficiency, "%")
        )
        .unwrap();

        if assessment.avg_latency_overhead.is_some() && assessment.avg_bandwidth_efficiency.is_some() {
            writeln!(output, "- Overall rating: {}", assessment.rating).unwrap();
        } else {
            writeln!(output, "- Overall rating: insufficient data for overall assessment").unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    /// @ai:intent Generate threshold legend for the active profile
    /// @ai:effects pure
    fn generate_threshold_section(results: &AggregateResult) -> String {
        let mut output = String::new();

        writeln!(output, "## Thresholds ({})", results.profile.description()).unwrap();
        writeln!(output).unwrap();

        for category in MetricCategory::ALL {
            let bands: Vec<_> = results
                .profile
                .table(category)
                .describe()
                .into_iter()
                .map(|(rating, band)| format!("{} {}", rating, band))
                .collect();
            writeln!(output, "- {}: {}", category.label(), bands.join(", ")).unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    /// @ai:intent List comparisons that failed on unreadable input
    /// @ai:effects pure
    fn generate_issue_section(results: &AggregateResult) -> String {
        let mut output = String::new();

        if results.issues.is_empty() {
            return output;
        }

        writeln!(output, "## Issues").unwrap();
        writeln!(output).unwrap();
        for issue in &results.issues {
            writeln!(output, "- {} / {}: {}", issue.target, issue.metric.label(), issue.message).unwrap();
        }
        writeln!(output).unwrap();
        output
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownReporterTrait for MarkdownReporter {
    /// @ai:intent Render the full comparison document
    /// @ai:effects pure
    fn render(&self, results: &AggregateResult) -> Result<String> {
        let mut content = String::new();

        content.push_str(&Self::generate_summary(results));
        for target in &results.targets {
            content.push_str(&Self::generate_target_section(results, target));
        }
        content.push_str(&Self::generate_bandwidth_section(results));
        content.push_str(&Self::generate_dns_section(results));
        content.push_str(&Self::generate_assessment_section(results));
        content.push_str(&Self::generate_threshold_section(results));
        content.push_str(&Self::generate_issue_section(results));

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{BenchmarkProfile, ComparisonAggregator};
    use crate::records::{MemoryRecordStore, MetricRecord, RecordStore};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn results() -> AggregateResult {
        let mut store = MemoryRecordStore::new();
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let rows = [
            (Condition::Baseline, Metric::MinLatencyMs, 4.0),
            (Condition::Baseline, Metric::AvgLatencyMs, 5.0),
            (Condition::Baseline, Metric::MaxLatencyMs, 7.0),
            (Condition::Baseline, Metric::PacketLossPercent, 0.0),
            (Condition::Tunneled, Metric::MinLatencyMs, 4.5),
            (Condition::Tunneled, Metric::AvgLatencyMs, 5.4),
            (Condition::Tunneled, Metric::MaxLatencyMs, 8.0),
            (Condition::Tunneled, Metric::PacketLossPercent, 0.0),
        ];
        for (condition, metric, value) in rows {
            store
                .put(MetricRecord::new(condition, "gateway", metric, Some(value), at))
                .unwrap();
        }
        store
            .put(MetricRecord::new(Condition::Tunneled, "cloudflare_dns", Metric::AvgLatencyMs, Some(9.0), at))
            .unwrap();

        let targets = vec!["gateway".to_string(), "cloudflare_dns".to_string()];
        ComparisonAggregator::new(BenchmarkProfile::Local).aggregate_at(&store, &targets, &Metric::ALL, at)
    }

    #[test]
    fn test_target_table() {
        let results = results();
        let section = MarkdownReporter::generate_target_section(&results, "gateway");

        let expected = "\
## Gateway

| Metric | Baseline | Tunneled | Difference |
|--------|----------|----------|------------|
| Min Ping | 4.00ms | 4.50ms | +0.50ms (+12.50%) |
| Avg Ping | 5.00ms | 5.40ms | +0.40ms (+8.00%) |
| Max Ping | 7.00ms | 8.00ms | +1.00ms (+14.29%) |
| Packet Loss | 0.00% | 0.00% | +0.00% (N/A) |

**Rating:** EXCELLENT (avg ping overhead +0.40ms, +8.00%)
**Packet loss rating:** EXCELLENT

";
        assert_eq!(section, expected);
    }

    #[test]
    fn test_incomplete_target_states_data_unavailable() {
        let results = results();
        let section = MarkdownReporter::generate_target_section(&results, "cloudflare_dns");

        assert!(section.contains("## Cloudflare Dns"));
        assert!(section.contains("| Avg Ping | N/A | 9.00ms | N/A |"));
        assert!(section.contains("data unavailable: missing baseline record"));
    }

    #[test]
    fn test_full_document_sections() {
        let content = MarkdownReporter::new().render(&results()).unwrap();

        assert!(content.starts_with("# Tunnel Performance Comparison"));
        assert!(content.contains("**Tests:** 1 baseline, 2 tunneled"));
        assert!(content.contains("No bandwidth data available."));
        assert!(content.contains("No DNS resolution data available."));
        assert!(content.contains("insufficient data for overall assessment"));
        assert!(content.contains("- Latency overhead: EXCELLENT < 10%, GOOD < 25%, POOR >= 25%"));
        assert!(!content.contains("## Issues"));
    }
}
