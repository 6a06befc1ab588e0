//! @ai:module:intent PNG charts for latency overhead and bandwidth efficiency
//! @ai:module:layer infrastructure
//! @ai:module:public_api ChartGenerator, ChartGeneratorTrait, LatencyPoint, BandwidthPoint
//! @ai:module:stateless true

use crate::analysis::{AggregateResult, LatencyAxis, Rating};
use crate::records::Metric;
use crate::report::format::{title, to_mbps};
use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;

const BAR_WIDTH: f64 = 0.35;

/// @ai:intent Trait for chart generation
pub trait ChartGeneratorTrait: Send + Sync {
    /// @ai:intent Generate all charts with data, returning the written file names
    fn generate_all(&self, results: &AggregateResult, output_dir: &Path) -> Result<Vec<String>>;
}

/// One target's avg ping, baseline vs tunneled.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyPoint {
    pub label: String,
    pub baseline_ms: f64,
    pub tunneled_ms: f64,
    /// Overhead on the profile's rating axis (percent or ms)
    pub overhead: f64,
    pub rating: Rating,
}

/// One bandwidth test, baseline vs tunneled.
#[derive(Debug, Clone, PartialEq)]
pub struct BandwidthPoint {
    pub label: String,
    pub baseline_mbps: f64,
    pub tunneled_mbps: f64,
    pub efficiency: f64,
    pub rating: Rating,
}

/// @ai:intent Complete avg-ping comparisons in target order
/// @ai:effects pure
pub fn latency_points(results: &AggregateResult) -> Vec<LatencyPoint> {
    results
        .targets
        .iter()
        .filter_map(|target| results.find(target, Metric::AvgLatencyMs))
        .filter(|c| c.is_complete())
        .filter_map(|c| {
            Some(LatencyPoint {
                label: title(&c.target),
                baseline_ms: c.baseline_value?,
                tunneled_ms: c.tunneled_value?,
                overhead: c.rated_value(results.profile)?,
                rating: c.rating,
            })
        })
        .collect()
}

/// @ai:intent Complete bandwidth comparisons
/// @ai:effects pure
pub fn bandwidth_points(results: &AggregateResult) -> Vec<BandwidthPoint> {
    results
        .bandwidth
        .iter()
        .filter(|c| c.is_complete())
        .filter_map(|c| {
            Some(BandwidthPoint {
                label: title(&c.target),
                baseline_mbps: to_mbps(c.baseline_value?),
                tunneled_mbps: to_mbps(c.tunneled_value?),
                efficiency: c.efficiency?,
                rating: c.rating,
            })
        })
        .collect()
}

/// @ai:intent Y range covering zero and every value, padded above
/// @ai:effects pure
fn value_range<I: IntoIterator<Item = f64>>(values: I) -> std::ops::Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = ((hi - lo) * 0.15).max(1.0);
    let bottom = if lo < 0.0 { lo - pad } else { 0.0 };
    bottom..hi + pad
}

fn rating_color(rating: Rating) -> RGBColor {
    match rating {
        Rating::Excellent => RGBColor(46, 160, 67),
        Rating::Good => RGBColor(31, 119, 180),
        Rating::Acceptable => RGBColor(255, 160, 40),
        Rating::Poor => RGBColor(214, 39, 40),
        Rating::Unrated => RGBColor(150, 150, 150),
    }
}

/// Label for an f64 x position that sits on a bar group.
fn group_label(labels: &[String], x: f64) -> String {
    let i = x.round();
    if (x - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    labels.get(i as usize).cloned().unwrap_or_default()
}

/// @ai:intent Generates charts from comparison results
pub struct ChartGenerator;

impl ChartGenerator {
    /// @ai:intent Create a new chart generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Grouped avg-ping bars above, overhead bars colored by rating below
    /// @ai:pre points is not empty
    /// @ai:effects fs:write
    fn generate_latency_chart(&self, points: &[LatencyPoint], axis: LatencyAxis, output_path: &Path) -> Result<()> {
        let root = BitMapBackend::new(output_path, (900, 700)).into_drawing_area();
        root.fill(&WHITE)?;
        let (upper, lower) = root.split_vertically(380);

        let labels: Vec<String> = points.iter().map(|p| p.label.clone()).collect();
        let x_range = -0.6f64..points.len() as f64 - 0.4;

        let mut chart = ChartBuilder::on(&upper)
            .caption("Average Ping: Baseline vs Tunneled", ("sans-serif", 26))
            .margin(15)
            .x_label_area_size(35)
            .y_label_area_size(55)
            .build_cartesian_2d(
                x_range.clone(),
                value_range(points.iter().flat_map(|p| [p.baseline_ms, p.tunneled_ms])),
            )?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(points.len() * 2 + 1)
            .x_label_formatter(&|x| group_label(&labels, *x))
            .y_desc("Latency (ms)")
            .draw()?;

        chart
            .draw_series(points.iter().enumerate().map(|(i, p)| {
                let x = i as f64;
                Rectangle::new([(x - BAR_WIDTH, 0.0), (x, p.baseline_ms)], BLUE.mix(0.7).filled())
            }))?
            .label("Baseline")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], BLUE.mix(0.7).filled()));

        chart
            .draw_series(points.iter().enumerate().map(|(i, p)| {
                let x = i as f64;
                Rectangle::new([(x, 0.0), (x + BAR_WIDTH, p.tunneled_ms)], RED.mix(0.7).filled())
            }))?
            .label("Tunneled")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], RED.mix(0.7).filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        let overhead_desc = match axis {
            LatencyAxis::OverheadPercent => "Overhead (%)",
            LatencyAxis::OverheadMs => "Overhead (ms)",
        };

        let mut overhead = ChartBuilder::on(&lower)
            .caption("Tunnel Overhead by Target", ("sans-serif", 22))
            .margin(15)
            .x_label_area_size(35)
            .y_label_area_size(55)
            .build_cartesian_2d(x_range, value_range(points.iter().map(|p| p.overhead)))?;

        overhead
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(points.len() * 2 + 1)
            .x_label_formatter(&|x| group_label(&labels, *x))
            .y_desc(overhead_desc)
            .draw()?;

        overhead.draw_series(points.iter().enumerate().map(|(i, p)| {
            let x = i as f64;
            Rectangle::new(
                [(x - BAR_WIDTH, 0.0), (x + BAR_WIDTH, p.overhead)],
                rating_color(p.rating).mix(0.85).filled(),
            )
        }))?;

        root.present()?;
        Ok(())
    }

    /// @ai:intent Grouped throughput bars per bandwidth test
    /// @ai:pre points is not empty
    /// @ai:effects fs:write
    fn generate_bandwidth_chart(&self, points: &[BandwidthPoint], output_path: &Path) -> Result<()> {
        let root = BitMapBackend::new(output_path, (900, 500)).into_drawing_area();
        root.fill(&WHITE)?;

        let labels: Vec<String> = points
            .iter()
            .map(|p| format!("{} ({:.0}%)", p.label, p.efficiency))
            .collect();

        let mut chart = ChartBuilder::on(&root)
            .caption("Bandwidth: Baseline vs Tunneled", ("sans-serif", 26))
            .margin(15)
            .x_label_area_size(35)
            .y_label_area_size(60)
            .build_cartesian_2d(
                -0.6f64..points.len() as f64 - 0.4,
                value_range(points.iter().flat_map(|p| [p.baseline_mbps, p.tunneled_mbps])),
            )?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(points.len() * 2 + 1)
            .x_label_formatter(&|x| group_label(&labels, *x))
            .y_desc("Throughput (Mbps)")
            .draw()?;

        chart
            .draw_series(points.iter().enumerate().map(|(i, p)| {
                let x = i as f64;
                Rectangle::new([(x - BAR_WIDTH, 0.0), (x, p.baseline_mbps)], BLUE.mix(0.7).filled())
            }))?
            .label("Baseline")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], BLUE.mix(0.7).filled()));

        chart
            .draw_series(points.iter().enumerate().map(|(i, p)| {
                let x = i as f64;
                Rectangle::new(
                    [(x, 0.0), (x + BAR_WIDTH, p.tunneled_mbps)],
                    rating_color(p.rating).mix(0.7).filled(),
                )
            }))?
            .label("Tunneled (colored by rating)")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], GREEN.mix(0.7).filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

impl Default for ChartGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartGeneratorTrait for ChartGenerator {
    /// @ai:intent Generate the latency and bandwidth charts; empty datasets are skipped
    /// @ai:effects fs:write
    fn generate_all(&self, results: &AggregateResult, output_dir: &Path) -> Result<Vec<String>> {
        std::fs::create_dir_all(output_dir)?;

        let mut generated = Vec::new();

        let latency = latency_points(results);
        if latency.is_empty() {
            tracing::info!("No complete latency comparisons, skipping latency chart");
        } else {
            let name = format!("latency_analysis_{}.png", results.timestamp);
            self.generate_latency_chart(&latency, results.profile.latency_axis(), &output_dir.join(&name))?;
            generated.push(name);
        }

        let bandwidth = bandwidth_points(results);
        if bandwidth.is_empty() {
            tracing::info!("No complete bandwidth comparisons, skipping bandwidth chart");
        } else {
            let name = format!("bandwidth_analysis_{}.png", results.timestamp);
            self.generate_bandwidth_chart(&bandwidth, &output_dir.join(&name))?;
            generated.push(name);
        }

        Ok(generated)
    }
}
