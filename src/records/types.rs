//! @ai:module:intent Metric record definitions shared by stores and analysis
//! @ai:module:layer domain
//! @ai:module:public_api Condition, Metric, MetricRecord
//! @ai:module:stateless true

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// @ai:intent Measurement condition: without or with the tunnel active
/// @ai:effects pure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Baseline,
    Tunneled,
}

impl Condition {
    pub const ALL: [Condition; 2] = [Condition::Baseline, Condition::Tunneled];

    /// @ai:intent Convert condition to string representation
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Baseline => "baseline",
            Condition::Tunneled => "tunneled",
        }
    }

    /// @ai:intent Directory name used by collectors for this condition
    /// @ai:effects pure
    pub fn dir_name(&self) -> &'static str {
        match self {
            Condition::Baseline => "baseline",
            Condition::Tunneled => "vpn",
        }
    }

    /// @ai:intent Parse a condition from either its name or its directory name
    /// @ai:effects pure
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "baseline" => Some(Condition::Baseline),
            "tunneled" | "vpn" => Some(Condition::Tunneled),
            _ => None,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Kind of metric captured by a collector probe
/// @ai:effects pure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    MinLatencyMs,
    AvgLatencyMs,
    MaxLatencyMs,
    PacketLossPercent,
    BandwidthBps,
    DnsResolutionSeconds,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::MinLatencyMs,
        Metric::AvgLatencyMs,
        Metric::MaxLatencyMs,
        Metric::PacketLossPercent,
        Metric::BandwidthBps,
        Metric::DnsResolutionSeconds,
    ];

    /// Metrics produced by one ping probe, in table order.
    pub const LATENCY: [Metric; 4] = [
        Metric::MinLatencyMs,
        Metric::AvgLatencyMs,
        Metric::MaxLatencyMs,
        Metric::PacketLossPercent,
    ];

    /// @ai:intent Collector field name for this metric
    /// @ai:effects pure
    pub fn key(&self) -> &'static str {
        match self {
            Metric::MinLatencyMs => "min_ping_ms",
            Metric::AvgLatencyMs => "avg_ping_ms",
            Metric::MaxLatencyMs => "max_ping_ms",
            Metric::PacketLossPercent => "packet_loss_percent",
            Metric::BandwidthBps => "bandwidth_bps",
            Metric::DnsResolutionSeconds => "resolution_time_seconds",
        }
    }

    /// @ai:intent Human-readable row label
    /// @ai:effects pure
    pub fn label(&self) -> &'static str {
        match self {
            Metric::MinLatencyMs => "Min Ping",
            Metric::AvgLatencyMs => "Avg Ping",
            Metric::MaxLatencyMs => "Max Ping",
            Metric::PacketLossPercent => "Packet Loss",
            Metric::BandwidthBps => "Bandwidth",
            Metric::DnsResolutionSeconds => "DNS Resolution",
        }
    }

    /// @ai:intent Unit suffix used when displaying values of this metric
    /// @ai:effects pure
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::MinLatencyMs | Metric::AvgLatencyMs | Metric::MaxLatencyMs => "ms",
            Metric::PacketLossPercent => "%",
            Metric::BandwidthBps => "bps",
            Metric::DnsResolutionSeconds => "s",
        }
    }

    /// @ai:intent Parse a metric from its collector field name
    /// @ai:effects pure
    pub fn from_key(key: &str) -> Option<Self> {
        Metric::ALL.into_iter().find(|m| m.key() == key)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// @ai:intent One observation of one metric for one target under one condition
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub condition: Condition,
    pub target: String,
    pub metric: Metric,
    /// None when the underlying probe failed
    pub value: Option<f64>,
    pub captured_at: DateTime<Utc>,
    /// Tunnel interface name, only present on tunneled records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_label: Option<String>,
}

impl MetricRecord {
    /// @ai:intent Create a record captured at the given instant
    /// @ai:effects pure
    pub fn new(
        condition: Condition,
        target: impl Into<String>,
        metric: Metric,
        value: Option<f64>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            condition,
            target: target.into(),
            metric,
            value,
            captured_at,
            interface_label: None,
        }
    }

    /// @ai:intent Attach a tunnel interface label (ignored for baseline records)
    /// @ai:effects pure
    pub fn with_interface(mut self, interface: Option<String>) -> Self {
        if self.condition == Condition::Tunneled {
            self.interface_label = interface;
        }
        self
    }

    /// @ai:intent True when both records describe the same probe run of the same tuple
    /// @ai:effects pure
    pub fn same_measurement(&self, other: &MetricRecord) -> bool {
        let same_value = match (self.value, other.value) {
            (Some(a), Some(b)) => (a - b).abs() <= f64::EPSILON * a.abs().max(b.abs()).max(1.0),
            (None, None) => true,
            _ => false,
        };

        self.condition == other.condition
            && self.target == other.target
            && self.metric == other.metric
            && self.captured_at == other.captured_at
            && self.interface_label == other.interface_label
            && same_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_parse_accepts_dir_names() {
        assert_eq!(Condition::parse("vpn"), Some(Condition::Tunneled));
        assert_eq!(Condition::parse("Baseline"), Some(Condition::Baseline));
        assert_eq!(Condition::parse("wan"), None);
    }

    #[test]
    fn test_metric_key_round_trip() {
        for metric in Metric::LATENCY {
            assert_eq!(Metric::from_key(metric.key()), Some(metric));
        }
        assert_eq!(Metric::from_key("jitter_ms"), None);
    }

    #[test]
    fn test_interface_label_only_on_tunneled() {
        let now = Utc::now();
        let baseline = MetricRecord::new(Condition::Baseline, "gateway", Metric::AvgLatencyMs, Some(1.0), now)
            .with_interface(Some("wg0".to_string()));
        let tunneled = MetricRecord::new(Condition::Tunneled, "gateway", Metric::AvgLatencyMs, Some(1.0), now)
            .with_interface(Some("wg0".to_string()));

        assert_eq!(baseline.interface_label, None);
        assert_eq!(tunneled.interface_label.as_deref(), Some("wg0"));
    }
}
