//! @ai:module:intent Advisory recommendations text driven by the gateway latency rating
//! @ai:module:layer infrastructure
//! @ai:module:public_api RecommendationsReporter, RecommendationsReporterTrait, MTU_SWEEP, KEEPALIVE_SWEEP
//! @ai:module:stateless true

use crate::analysis::{AggregateResult, Rating};
use crate::records::Metric;
use crate::report::format;
use anyhow::Result;
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// Target whose avg-ping rating drives the advice.
pub const ADVISORY_TARGET: &str = "gateway";

/// MTU values worth sweeping when tuning the tunnel interface.
pub const MTU_SWEEP: [u16; 5] = [1420, 1440, 1460, 1480, 1500];

/// PersistentKeepalive values (seconds) worth sweeping.
pub const KEEPALIVE_SWEEP: [u16; 5] = [15, 20, 25, 30, 60];

/// @ai:intent Trait for recommendations generation
pub trait RecommendationsReporterTrait: Send + Sync {
    /// @ai:intent Render the recommendations document
    fn render(&self, results: &AggregateResult) -> Result<String>;

    /// @ai:intent Render and write the recommendations document to a file
    fn generate(&self, results: &AggregateResult, output_path: &Path) -> Result<()> {
        std::fs::write(output_path, self.render(results)?)?;
        Ok(())
    }
}

/// @ai:intent Generates the plain-text recommendations document
pub struct RecommendationsReporter;

impl RecommendationsReporter {
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Verdict lines for a gateway rating
    /// @ai:effects pure
    fn verdict(rating: Rating) -> &'static [&'static str] {
        match rating {
            Rating::Excellent => &[
                "Tunnel overhead is minimal. The configuration is production-ready.",
                "No tuning is required; keep monitoring for regressions.",
            ],
            Rating::Good => &[
                "Tunnel overhead is moderate. Performance is good for most workloads.",
                "Consider MTU optimization to recover the remaining overhead.",
            ],
            Rating::Acceptable => &[
                "Tunnel overhead is noticeable.",
                "Tune the interface MTU and PersistentKeepalive before relying on this link.",
            ],
            Rating::Poor => &[
                "Tunnel overhead is high.",
                "Investigate routing, endpoint placement and the tunnel configuration.",
                "Check for MTU fragmentation and CPU saturation on both peers.",
            ],
            Rating::Unrated => &[
                "Insufficient data to rate the gateway path.",
                "Collect both baseline and tunneled ping results, then re-run the analysis.",
            ],
        }
    }
}

impl Default for RecommendationsReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationsReporterTrait for RecommendationsReporter {
    /// @ai:intent Verdict from the gateway rating followed by the static tuning tips
    /// @ai:post Tips section is present regardless of rating
    /// @ai:effects pure
    fn render(&self, results: &AggregateResult) -> Result<String> {
        let mut output = String::new();
        let gateway = results.find(ADVISORY_TARGET, Metric::AvgLatencyMs);
        let rating = gateway.map(|c| c.rating).unwrap_or(Rating::Unrated);

        writeln!(output, "Tunnel Performance Recommendations")?;
        writeln!(output, "==================================")?;
        writeln!(output)?;
        writeln!(output, "Generated: {}", results.generated)?;
        writeln!(output, "Profile: {}", results.profile.description())?;
        writeln!(output)?;

        writeln!(output, "Gateway latency rating: {}", rating)?;
        if let Some(c) = gateway.filter(|c| c.is_complete()) {
            writeln!(
                output,
                "Gateway avg ping overhead: {} ({})",
                format::signed(c.absolute_delta, "ms"),
                format::signed(c.percent_delta, "%")
            )?;
        }
        writeln!(output)?;

        for line in Self::verdict(rating) {
            writeln!(output, "{}", line)?;
        }
        writeln!(output)?;

        let sweep = |values: &[u16]| {
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };

        writeln!(output, "Optimization Tips")?;
        writeln!(output, "-----------------")?;
        writeln!(output, "1. MTU sweep: test MTU values {}", sweep(&MTU_SWEEP))?;
        writeln!(output, "   and keep the largest value without fragmentation.")?;
        writeln!(
            output,
            "2. Keepalive sweep: test PersistentKeepalive values {} seconds",
            sweep(&KEEPALIVE_SWEEP)
        )?;
        writeln!(output, "   when peers sit behind NAT.")?;
        writeln!(output, "3. Re-run the baseline and tunneled tests after every change")?;
        writeln!(output, "   and compare the reports side by side.")?;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{BenchmarkProfile, ComparisonAggregator};
    use crate::records::{Condition, MemoryRecordStore, MetricRecord, RecordStore};
    use chrono::{TimeZone, Utc};

    fn results_with_gateway(baseline: Option<f64>, tunneled: f64) -> AggregateResult {
        let mut store = MemoryRecordStore::new();
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        if let Some(b) = baseline {
            store
                .put(MetricRecord::new(Condition::Baseline, "gateway", Metric::AvgLatencyMs, Some(b), at))
                .unwrap();
        }
        store
            .put(MetricRecord::new(Condition::Tunneled, "gateway", Metric::AvgLatencyMs, Some(tunneled), at))
            .unwrap();

        ComparisonAggregator::new(BenchmarkProfile::Local).aggregate_at(
            &store,
            &["gateway".to_string()],
            &Metric::LATENCY,
            at,
        )
    }

    #[test]
    fn test_excellent_affirms_production_ready() {
        let text = RecommendationsReporter::new()
            .render(&results_with_gateway(Some(5.0), 5.4))
            .unwrap();
        assert!(text.contains("Gateway latency rating: EXCELLENT"));
        assert!(text.contains("production-ready"));
        assert!(text.contains("+0.40ms (+8.00%)"));
    }

    #[test]
    fn test_good_suggests_mtu() {
        let text = RecommendationsReporter::new()
            .render(&results_with_gateway(Some(10.0), 11.5))
            .unwrap();
        assert!(text.contains("Gateway latency rating: GOOD"));
        assert!(text.contains("MTU optimization"));
    }

    #[test]
    fn test_poor_suggests_routing_investigation() {
        let text = RecommendationsReporter::new()
            .render(&results_with_gateway(Some(10.0), 12.6))
            .unwrap();
        assert!(text.contains("Investigate routing"));
    }

    #[test]
    fn test_tips_always_present() {
        for results in [results_with_gateway(Some(5.0), 5.4), results_with_gateway(None, 9.0)] {
            let text = RecommendationsReporter::new().render(&results).unwrap();
            assert!(text.contains("1420, 1440, 1460, 1480, 1500"));
            assert!(text.contains("15, 20, 25, 30, 60 seconds"));
        }
    }

    #[test]
    fn test_missing_gateway_is_insufficient_data() {
        let text = RecommendationsReporter::new()
            .render(&results_with_gateway(None, 9.0))
            .unwrap();
        assert!(text.contains("Gateway latency rating: UNRATED"));
        assert!(text.contains("Insufficient data"));
        assert!(!text.contains("Gateway avg ping overhead"));
    }
}
