//! @ai:module:intent Threshold tables and rating classification per benchmark profile
//! @ai:module:layer domain
//! @ai:module:public_api Rating, BenchmarkProfile, MetricCategory, ThresholdTable, classify
//! @ai:module:stateless true

use crate::error::Error;
use crate::records::Metric;
use serde::{Deserialize, Serialize};

/// @ai:intent Qualitative tier assigned to a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Excellent,
    Good,
    Acceptable,
    Poor,
    /// No data to rate (division undefined or missing record); distinct from Poor
    Unrated,
}

impl Rating {
    /// @ai:intent Convert rating to string representation
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Excellent => "EXCELLENT",
            Rating::Good => "GOOD",
            Rating::Acceptable => "ACCEPTABLE",
            Rating::Poor => "POOR",
            Rating::Unrated => "UNRATED",
        }
    }

    /// @ai:intent Severity rank, 0 is best; None for Unrated
    /// @ai:effects pure
    pub fn severity(&self) -> Option<u8> {
        match self {
            Rating::Excellent => Some(0),
            Rating::Good => Some(1),
            Rating::Acceptable => Some(2),
            Rating::Poor => Some(3),
            Rating::Unrated => None,
        }
    }

    /// @ai:intent The worse of two ratings; Unrated wins since nothing can be concluded
    /// @ai:effects pure
    pub fn worst(self, other: Rating) -> Rating {
        match (self.severity(), other.severity()) {
            (Some(a), Some(b)) => {
                if a >= b {
                    self
                } else {
                    other
                }
            }
            _ => Rating::Unrated,
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Named threshold set selected once per analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkProfile {
    /// Tunnel endpoints on the same network
    #[default]
    Local,
    /// Long-haul path (Chicago to New York class distances)
    Geographic,
}

impl BenchmarkProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            BenchmarkProfile::Local => "local",
            BenchmarkProfile::Geographic => "geographic",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BenchmarkProfile::Local => "Local network",
            BenchmarkProfile::Geographic => "Geographic (Chicago-NY)",
        }
    }

    /// @ai:intent Which latency value the profile rates: relative percent or absolute ms
    /// @ai:effects pure
    pub fn latency_axis(&self) -> LatencyAxis {
        match self {
            BenchmarkProfile::Local => LatencyAxis::OverheadPercent,
            BenchmarkProfile::Geographic => LatencyAxis::OverheadMs,
        }
    }

    /// @ai:intent Threshold table for a category under this profile
    /// @ai:effects pure
    pub fn table(&self, category: MetricCategory) -> &'static ThresholdTable {
        match (category, self) {
            (MetricCategory::LatencyOverhead, BenchmarkProfile::Local) => &LOCAL_LATENCY,
            (MetricCategory::LatencyOverhead, BenchmarkProfile::Geographic) => &GEOGRAPHIC_LATENCY,
            (MetricCategory::BandwidthEfficiency, BenchmarkProfile::Local) => &LOCAL_BANDWIDTH,
            (MetricCategory::BandwidthEfficiency, BenchmarkProfile::Geographic) => &GEOGRAPHIC_BANDWIDTH,
            (MetricCategory::PacketLoss, _) => &PACKET_LOSS,
        }
    }
}

impl std::fmt::Display for BenchmarkProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BenchmarkProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(BenchmarkProfile::Local),
            "geographic" | "geo" => Ok(BenchmarkProfile::Geographic),
            other => Err(Error::UnknownProfile(other.to_string())),
        }
    }
}

/// @ai:intent Latency comparison axis of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyAxis {
    OverheadPercent,
    OverheadMs,
}

/// @ai:intent Logical category a threshold table applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    LatencyOverhead,
    BandwidthEfficiency,
    PacketLoss,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 3] = [
        MetricCategory::LatencyOverhead,
        MetricCategory::BandwidthEfficiency,
        MetricCategory::PacketLoss,
    ];

    /// @ai:intent Category a metric is rated under, if any
    /// @ai:effects pure
    pub fn for_metric(metric: Metric) -> Option<Self> {
        match metric {
            Metric::MinLatencyMs | Metric::AvgLatencyMs | Metric::MaxLatencyMs => {
                Some(MetricCategory::LatencyOverhead)
            }
            Metric::PacketLossPercent => Some(MetricCategory::PacketLoss),
            Metric::BandwidthBps => Some(MetricCategory::BandwidthEfficiency),
            Metric::DnsResolutionSeconds => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricCategory::LatencyOverhead => "Latency overhead",
            MetricCategory::BandwidthEfficiency => "Bandwidth efficiency",
            MetricCategory::PacketLoss => "Packet loss",
        }
    }
}

/// @ai:intent Comparison direction of a threshold table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// A band matches when `value < bound`
    LowerIsBetter,
    /// A band matches when `value > bound`
    HigherIsBetter,
}

/// @ai:intent Ordered {bound, rating} bands, best band first; unmatched values are Poor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdTable {
    pub direction: Direction,
    pub unit: &'static str,
    pub bands: &'static [(f64, Rating)],
}

impl ThresholdTable {
    /// @ai:intent Rate a value; bounds are strict so boundary values fall into the worse band
    /// @ai:effects pure
    pub fn rate(&self, value: f64) -> Rating {
        if !value.is_finite() {
            return Rating::Unrated;
        }

        self.bands
            .iter()
            .find(|(bound, _)| match self.direction {
                Direction::LowerIsBetter => value < *bound,
                Direction::HigherIsBetter => value > *bound,
            })
            .map(|(_, rating)| *rating)
            .unwrap_or(Rating::Poor)
    }

    /// @ai:intent Human-readable band descriptions, best first, ending with the Poor band
    /// @ai:effects pure
    pub fn describe(&self) -> Vec<(Rating, String)> {
        let (pass, fail) = match self.direction {
            Direction::LowerIsBetter => ("<", ">="),
            Direction::HigherIsBetter => (">", "<="),
        };

        let mut rows: Vec<_> = self
            .bands
            .iter()
            .map(|(bound, rating)| (*rating, format!("{} {}{}", pass, bound, self.unit)))
            .collect();

        if let Some((last, _)) = self.bands.last() {
            rows.push((Rating::Poor, format!("{} {}{}", fail, last, self.unit)));
        }
        rows
    }
}

static LOCAL_LATENCY: ThresholdTable = ThresholdTable {
    direction: Direction::LowerIsBetter,
    unit: "%",
    bands: &[(10.0, Rating::Excellent), (25.0, Rating::Good)],
};

static GEOGRAPHIC_LATENCY: ThresholdTable = ThresholdTable {
    direction: Direction::LowerIsBetter,
    unit: "ms",
    bands: &[
        (10.0, Rating::Excellent),
        (20.0, Rating::Good),
        (50.0, Rating::Acceptable),
    ],
};

static LOCAL_BANDWIDTH: ThresholdTable = ThresholdTable {
    direction: Direction::HigherIsBetter,
    unit: "%",
    bands: &[
        (90.0, Rating::Excellent),
        (80.0, Rating::Good),
        (60.0, Rating::Acceptable),
    ],
};

static GEOGRAPHIC_BANDWIDTH: ThresholdTable = ThresholdTable {
    direction: Direction::HigherIsBetter,
    unit: "%",
    bands: &[
        (80.0, Rating::Excellent),
        (60.0, Rating::Good),
        (40.0, Rating::Acceptable),
    ],
};

static PACKET_LOSS: ThresholdTable = ThresholdTable {
    direction: Direction::LowerIsBetter,
    unit: "%",
    bands: &[
        (0.1, Rating::Excellent),
        (0.5, Rating::Good),
        (1.0, Rating::Acceptable),
    ],
};

/// @ai:intent Classify a value against the profile's table for its category
/// @ai:post None classifies as Unrated, never Poor
/// @ai:effects pure
pub fn classify(category: MetricCategory, value: Option<f64>, profile: BenchmarkProfile) -> Rating {
    match value {
        Some(v) => profile.table(category).rate(v),
        None => Rating::Unrated,
    }
}
