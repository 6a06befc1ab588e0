//! @ai:module:intent Display formatting shared by the text renderers
//! @ai:module:layer infrastructure
//! @ai:module:stateless true

use crate::analysis::round2;
use crate::records::Metric;

pub const NOT_AVAILABLE: &str = "N/A";

/// @ai:intent Format a value with unit, "N/A" when absent
/// @ai:effects pure
pub fn value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.2}{}", round2(v), unit),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// @ai:intent Format a signed value with unit, "N/A" when absent
/// @ai:effects pure
pub fn signed(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => {
            let v = round2(v);
            if v >= 0.0 {
                format!("+{:.2}{}", v, unit)
            } else {
                format!("{:.2}{}", v, unit)
            }
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

/// @ai:intent Value of a metric in its display unit (bandwidth shown in Mbps)
/// @ai:effects pure
pub fn metric_value(metric: Metric, raw: Option<f64>) -> String {
    match metric {
        Metric::BandwidthBps => value(raw.map(to_mbps), " Mbps"),
        other => value(raw, other.unit()),
    }
}

pub fn to_mbps(bps: f64) -> f64 {
    bps / 1e6
}

/// @ai:intent "google_dns" -> "Google Dns"
/// @ai:effects pure
pub fn title(target: &str) -> String {
    target
        .split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_formats() {
        assert_eq!(signed(Some(0.40000000000000036), "ms"), "+0.40ms");
        assert_eq!(signed(Some(-5.3), "%"), "-5.30%");
        assert_eq!(signed(None, "%"), "N/A");
        assert_eq!(signed(Some(-0.001), "ms"), "+0.00ms");
        assert_eq!(value(Some(-0.004), "ms"), "0.00ms");
    }

    #[test]
    fn test_bandwidth_in_mbps() {
        assert_eq!(metric_value(Metric::BandwidthBps, Some(475e6)), "475.00 Mbps");
        assert_eq!(metric_value(Metric::AvgLatencyMs, Some(5.4)), "5.40ms");
    }

    #[test]
    fn test_title() {
        assert_eq!(title("google_dns"), "Google Dns");
        assert_eq!(title("gateway"), "Gateway");
        assert_eq!(title("server_upload"), "Server Upload");
    }
}
