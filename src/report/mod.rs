//! @ai:module:intent Report generation for comparison results
//! @ai:module:layer infrastructure
//! @ai:module:public_api ReportGenerator, RenderedReport, JsonReporter, MarkdownReporter, RecommendationsReporter, ChartGenerator

pub mod charts;
pub mod format;
pub mod json_report;
pub mod markdown_report;
pub mod recommendations;

pub use charts::{bandwidth_points, latency_points, BandwidthPoint, ChartGenerator, ChartGeneratorTrait, LatencyPoint};
pub use json_report::{JsonReporter, JsonReporterTrait};
pub use markdown_report::{MarkdownReporter, MarkdownReporterTrait};
pub use recommendations::{
    RecommendationsReporter, RecommendationsReporterTrait, KEEPALIVE_SWEEP, MTU_SWEEP,
};

use crate::analysis::AggregateResult;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// @ai:intent The three text artifacts of one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub structured_summary: String,
    pub tabular_comparison: String,
    pub recommendations: String,
}

/// @ai:intent Combined report generator
pub struct ReportGenerator {
    json: JsonReporter,
    markdown: MarkdownReporter,
    recommendations: RecommendationsReporter,
    charts: Option<ChartGenerator>,
}

impl ReportGenerator {
    /// @ai:intent Create a report generator that also draws charts
    /// @ai:effects pure
    pub fn new() -> Self {
        Self::with_charts(true)
    }

    /// @ai:effects pure
    pub fn with_charts(charts: bool) -> Self {
        Self {
            json: JsonReporter::new(),
            markdown: MarkdownReporter::new(),
            recommendations: RecommendationsReporter::new(),
            charts: charts.then(ChartGenerator::new),
        }
    }

    /// @ai:intent Render all text artifacts without touching the filesystem
    /// @ai:effects pure
    pub fn render(&self, results: &AggregateResult) -> Result<RenderedReport> {
        Ok(RenderedReport {
            structured_summary: self.json.render(results)?,
            tabular_comparison: self.markdown.render(results)?,
            recommendations: self.recommendations.render(results)?,
        })
    }

    /// @ai:intent Write every artifact into output_dir, named by the run timestamp
    /// @ai:post Returns the written paths
    /// @ai:effects fs:write
    pub fn generate_all(&self, results: &AggregateResult, output_dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let rendered = self.render(results)?;
        let ts = &results.timestamp;

        let artifacts = [
            (format!("performance_summary_{}.json", ts), &rendered.structured_summary),
            (format!("comparison_{}.md", ts), &rendered.tabular_comparison),
            (format!("recommendations_{}.txt", ts), &rendered.recommendations),
        ];

        let mut written = Vec::with_capacity(artifacts.len() + 2);
        for (name, content) in artifacts {
            let path = output_dir.join(name);
            std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
            written.push(path);
        }

        if let Some(charts) = &self.charts {
            match charts.generate_all(results, output_dir) {
                Ok(files) => written.extend(files.into_iter().map(|f| output_dir.join(f))),
                Err(e) => tracing::warn!("Chart generation failed: {:#}", e),
            }
        }

        tracing::info!("Reports generated in {}", output_dir.display());
        Ok(written)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{BenchmarkProfile, ComparisonAggregator};
    use crate::records::{Condition, MemoryRecordStore, Metric, MetricRecord, RecordStore};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn results() -> AggregateResult {
        let mut store = MemoryRecordStore::new();
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        store
            .put(MetricRecord::new(Condition::Baseline, "gateway", Metric::AvgLatencyMs, Some(5.0), at))
            .unwrap();
        store
            .put(MetricRecord::new(Condition::Tunneled, "gateway", Metric::AvgLatencyMs, Some(5.4), at))
            .unwrap();
        ComparisonAggregator::new(BenchmarkProfile::Local).aggregate_at(
            &store,
            &["gateway".to_string()],
            &Metric::ALL,
            at,
        )
    }

    #[test]
    fn test_render_produces_three_artifacts() {
        let rendered = ReportGenerator::with_charts(false).render(&results()).unwrap();

        assert!(rendered.structured_summary.contains("\"gateway\""));
        assert!(rendered.tabular_comparison.contains("## Gateway"));
        assert!(rendered.recommendations.contains("production-ready"));
    }

    #[test]
    fn test_generate_all_writes_timestamped_files() {
        let temp = TempDir::new().unwrap();

        let written = ReportGenerator::with_charts(false)
            .generate_all(&results(), temp.path())
            .unwrap();

        assert_eq!(written.len(), 3);
        assert!(temp.path().join("performance_summary_20250301_100000.json").exists());
        assert!(temp.path().join("comparison_20250301_100000.md").exists());
        assert!(temp.path().join("recommendations_20250301_100000.txt").exists());
    }
}
