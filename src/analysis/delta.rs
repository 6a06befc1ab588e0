//! @ai:module:intent Absolute, percentage and efficiency deltas between baseline and tunneled records
//! @ai:module:layer domain
//! @ai:module:public_api Delta, compute_delta, percent_delta, efficiency, round2
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::records::{Condition, Metric, MetricRecord};
use serde::{Deserialize, Serialize};

/// @ai:intent Difference between a baseline and a tunneled observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub baseline: f64,
    pub tunneled: f64,
    /// tunneled - baseline
    pub absolute: f64,
    /// None when the baseline is zero
    pub percent: Option<f64>,
    /// Share of baseline throughput retained; bandwidth only
    pub efficiency: Option<f64>,
}

/// @ai:intent Compute the delta for a matched pair of records
/// @ai:pre baseline and tunneled share target and metric
/// @ai:post Err(MissingValue) when either record carries no value
/// @ai:effects pure
pub fn compute_delta(baseline: &MetricRecord, tunneled: &MetricRecord) -> Result<Delta> {
    debug_assert_eq!(baseline.target, tunneled.target);
    debug_assert_eq!(baseline.metric, tunneled.metric);

    let value_of = |record: &MetricRecord, condition: Condition| {
        record.value.ok_or_else(|| Error::MissingValue {
            condition,
            target: record.target.clone(),
            metric: record.metric,
        })
    };

    let base = value_of(baseline, Condition::Baseline)?;
    let tun = value_of(tunneled, Condition::Tunneled)?;
    let absolute = tun - base;

    let percent = match percent_delta(absolute, base, &baseline.target, baseline.metric) {
        Ok(p) => Some(p),
        Err(e) => {
            tracing::debug!("{}", e);
            None
        }
    };

    let efficiency = if baseline.metric == Metric::BandwidthBps {
        efficiency(base, tun)
    } else {
        None
    };

    Ok(Delta {
        baseline: base,
        tunneled: tun,
        absolute,
        percent,
        efficiency,
    })
}

/// @ai:intent absolute / baseline * 100
/// @ai:post Err(DivisionUndefined) when baseline is zero
/// @ai:effects pure
pub fn percent_delta(absolute: f64, baseline: f64, target: &str, metric: Metric) -> Result<f64> {
    if baseline == 0.0 {
        return Err(Error::DivisionUndefined {
            target: target.to_string(),
            metric,
        });
    }
    Ok(absolute / baseline * 100.0)
}

/// @ai:intent tunneled / baseline * 100, None when baseline is zero
/// @ai:effects pure
pub fn efficiency(baseline: f64, tunneled: f64) -> Option<f64> {
    if baseline == 0.0 {
        None
    } else {
        Some(tunneled / baseline * 100.0)
    }
}

/// @ai:intent Round for display and serialized output; internal math stays unrounded
/// @ai:effects pure
/// @ai:post Never returns -0.0
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // -0.0 would display as "-0.00" and sign-check as non-negative
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pair(metric: Metric, baseline: Option<f64>, tunneled: Option<f64>) -> (MetricRecord, MetricRecord) {
        let now = Utc::now();
        (
            MetricRecord::new(Condition::Baseline, "gateway", metric, baseline, now),
            MetricRecord::new(Condition::Tunneled, "gateway", metric, tunneled, now),
        )
    }

    #[test]
    fn test_small_overhead() {
        let (b, t) = pair(Metric::AvgLatencyMs, Some(5.0), Some(5.4));
        let delta = compute_delta(&b, &t).unwrap();

        assert!((delta.absolute - 0.4).abs() < 1e-9);
        assert!((delta.percent.unwrap() - 8.0).abs() < 1e-9);
        assert_eq!(round2(delta.absolute), 0.4);
        assert_eq!(delta.efficiency, None);
    }

    #[test]
    fn test_reconstruction_holds() {
        for (base, tun) in [(1.0, 3.5), (10.0, 12.6), (250.0, 199.0), (0.3, 0.1)] {
            let (b, t) = pair(Metric::MaxLatencyMs, Some(base), Some(tun));
            let delta = compute_delta(&b, &t).unwrap();

            assert!((delta.baseline + delta.absolute - delta.tunneled).abs() < 1e-9);
            assert!((delta.percent.unwrap() - delta.absolute / base * 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_baseline_has_no_percent() {
        let (b, t) = pair(Metric::AvgLatencyMs, Some(0.0), Some(3.0));
        let delta = compute_delta(&b, &t).unwrap();

        assert_eq!(delta.percent, None);
        assert_eq!(delta.absolute, 3.0);
        assert!(matches!(
            percent_delta(3.0, 0.0, "gateway", Metric::AvgLatencyMs),
            Err(Error::DivisionUndefined { .. })
        ));
    }

    #[test]
    fn test_bandwidth_efficiency() {
        let (b, t) = pair(Metric::BandwidthBps, Some(500e6), Some(475e6));
        let delta = compute_delta(&b, &t).unwrap();

        assert!((delta.efficiency.unwrap() - 95.0).abs() < 1e-9);
        assert!((delta.percent.unwrap() + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_null_value_is_missing() {
        let (b, t) = pair(Metric::AvgLatencyMs, Some(5.0), None);
        let err = compute_delta(&b, &t).unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(26.000000000000004), 26.0);
        assert_eq!(round2(1.236), 1.24);
        assert_eq!(round2(-0.404), -0.4);
        assert!(round2(-0.001).is_sign_positive());
    }
}
