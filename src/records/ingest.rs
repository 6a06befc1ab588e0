//! @ai:module:intent Convert collector JSON outputs into typed metric records
//! @ai:module:layer infrastructure
//! @ai:module:public_api CollectorLoader, IngestReport, RejectedFile, parse_collector_record
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::records::store::RecordStore;
use crate::records::types::{Condition, Metric, MetricRecord};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// @ai:intent Shape of one collector output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorKind {
    Ping,
    Bandwidth,
    Dns,
}

impl CollectorKind {
    /// @ai:intent Detect the collector kind from the keys present
    /// @ai:effects pure
    fn detect(obj: &Map<String, Value>) -> Self {
        if obj.contains_key("domain") {
            CollectorKind::Dns
        } else if obj.contains_key("bandwidth_bps") || obj.contains_key("bandwidth_mbps") {
            CollectorKind::Bandwidth
        } else {
            CollectorKind::Ping
        }
    }
}

/// @ai:intent Parse one collector JSON document into metric records
/// @ai:pre `fallback_name` is the file stem without the test-type suffix
/// @ai:post Err(MalformedInput) when a value is present but not numeric
/// @ai:effects pure
pub fn parse_collector_record(
    source_name: &str,
    condition: Condition,
    fallback_name: &str,
    content: &str,
) -> Result<Vec<MetricRecord>> {
    let value: Value = serde_json::from_str(content).map_err(|e| Error::MalformedInput {
        source_name: source_name.to_string(),
        field: "<document>".to_string(),
        message: format!("is not valid JSON ({})", e),
    })?;

    let obj = value.as_object().ok_or_else(|| Error::MalformedInput {
        source_name: source_name.to_string(),
        field: "<document>".to_string(),
        message: "is not a JSON object".to_string(),
    })?;

    let captured_at = parse_timestamp(obj.get("timestamp"), source_name);
    let interface = string_field(obj, "interface");

    let records = match CollectorKind::detect(obj) {
        CollectorKind::Ping => {
            let test_name = string_field(obj, "test_name").unwrap_or_else(|| fallback_name.to_string());
            let target = test_name.strip_prefix("ping_").unwrap_or(&test_name).to_string();

            Metric::LATENCY
                .iter()
                .map(|metric| {
                    let value = numeric_field(obj, metric.key(), source_name)?;
                    Ok(MetricRecord::new(condition, target.clone(), *metric, value, captured_at)
                        .with_interface(interface.clone()))
                })
                .collect::<Result<Vec<_>>>()?
        }
        CollectorKind::Bandwidth => {
            let target = string_field(obj, "target").unwrap_or_else(|| "server".to_string());
            let direction = string_field(obj, "direction").unwrap_or_else(|| "unknown".to_string());

            let bps = match numeric_field(obj, "bandwidth_bps", source_name)? {
                Some(bps) => Some(bps),
                None => numeric_field(obj, "bandwidth_mbps", source_name)?.map(|mbps| mbps * 1e6),
            };

            vec![MetricRecord::new(
                condition,
                format!("{}_{}", target, direction),
                Metric::BandwidthBps,
                bps,
                captured_at,
            )
            .with_interface(interface)]
        }
        CollectorKind::Dns => {
            let domain = string_field(obj, "domain").ok_or_else(|| Error::MalformedInput {
                source_name: source_name.to_string(),
                field: "domain".to_string(),
                message: "is not a string".to_string(),
            })?;
            let seconds = numeric_field(obj, Metric::DnsResolutionSeconds.key(), source_name)?;

            vec![MetricRecord::new(
                condition,
                domain,
                Metric::DnsResolutionSeconds,
                seconds,
                captured_at,
            )
            .with_interface(interface)]
        }
    };

    Ok(records)
}

/// @ai:intent Read an optional numeric field; null and absent both mean "no value"
/// @ai:effects pure
fn numeric_field(obj: &Map<String, Value>, field: &str, source_name: &str) -> Result<Option<f64>> {
    let malformed = |message: String| Error::MalformedInput {
        source_name: source_name.to_string(),
        field: field.to_string(),
        message,
    };

    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| malformed(format!("is out of range ({})", n))),
        // collectors scraping tool output sometimes quote numbers
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(malformed(format!("is not a number ({:?})", s))),
        },
        Some(other) => Err(malformed(format!("is not a number ({})", other))),
    }
}

fn string_field(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// @ai:intent Parse collector timestamps, falling back to now
/// @ai:effects time
fn parse_timestamp(value: Option<&Value>, source_name: &str) -> DateTime<Utc> {
    let Some(raw) = value.and_then(Value::as_str) else {
        return Utc::now();
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Utc);
    }

    for format in ["%Y%m%d_%H%M%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Utc.from_utc_datetime(&naive);
        }
    }

    tracing::warn!("Unrecognized timestamp {:?} in {}, using ingest time", raw, source_name);
    Utc::now()
}

/// @ai:intent A collector file that could not be ingested
#[derive(Debug, Clone)]
pub struct RejectedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// @ai:intent Outcome of loading a collector results directory
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Collector files loaded per condition
    pub files: BTreeMap<Condition, usize>,
    pub records: usize,
    /// Records already present in the store from an earlier load
    pub unchanged: usize,
    pub rejected: Vec<RejectedFile>,
}

impl IngestReport {
    pub fn tests(&self, condition: Condition) -> usize {
        self.files.get(&condition).copied().unwrap_or(0)
    }

    pub fn has_malformed(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// @ai:intent Loads `<results>/<baseline|vpn>/<test>_<test_type>.txt` collector files
pub struct CollectorLoader {
    test_type: String,
}

impl CollectorLoader {
    /// @ai:intent Create a loader for one test type ("latest" or a timestamp label)
    /// @ai:effects pure
    pub fn new(test_type: impl Into<String>) -> Self {
        Self {
            test_type: test_type.into(),
        }
    }

    /// @ai:intent Collector files in a condition directory, sorted by name
    /// @ai:effects fs:read
    fn find_files(&self, dir: &Path) -> Vec<(PathBuf, String)> {
        let suffix = format!("_{}", self.test_type);

        let mut files: Vec<_> = WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().map(|ext| ext == "txt").unwrap_or(false))
            .filter_map(|e| {
                let stem = e.path().file_stem()?.to_str()?;
                let name = stem.strip_suffix(&suffix)?.to_string();
                Some((e.path().to_path_buf(), name))
            })
            .collect();

        files.sort();
        files
    }

    /// @ai:intent Load all collector files into a store; bad files are reported, not fatal
    /// @ai:effects fs:read, state:write
    pub fn load_into<S: RecordStore + ?Sized>(&self, results_dir: &Path, store: &mut S) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        for condition in Condition::ALL {
            let dir = results_dir.join(condition.dir_name());

            if !dir.exists() {
                tracing::warn!("No {} results directory at {}", condition, dir.display());
                continue;
            }

            for (path, name) in self.find_files(&dir) {
                let parsed = std::fs::read_to_string(&path)
                    .map_err(Error::from)
                    .and_then(|content| {
                        let content = content.trim();
                        if content.is_empty() {
                            return Ok(Vec::new());
                        }
                        parse_collector_record(&path.display().to_string(), condition, &name, content)
                    });

                match parsed {
                    Ok(records) if records.is_empty() => {
                        tracing::debug!("Skipping empty collector file {}", path.display());
                    }
                    Ok(records) => {
                        report.records += records.len();
                        *report.files.entry(condition).or_default() += 1;
                        for record in records {
                            if already_stored(&*store, &record) {
                                report.unchanged += 1;
                                continue;
                            }
                            store.put(record)?;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Could not load {}: {}", path.display(), e);
                        report.rejected.push(RejectedFile {
                            path,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        tracing::info!(
            "Loaded {} baseline and {} tunneled tests ({} records, {} already stored, {} rejected)",
            report.tests(Condition::Baseline),
            report.tests(Condition::Tunneled),
            report.records,
            report.unchanged,
            report.rejected.len()
        );
        Ok(report)
    }
}

/// @ai:intent Whether the store's latest record for the tuple is this same probe run
/// @ai:effects state:read
fn already_stored<S: RecordStore + ?Sized>(store: &S, record: &MetricRecord) -> bool {
    store
        .get_latest(record.condition, &record.target, record.metric)
        .map(|latest| latest.same_measurement(record))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{FileRecordStore, MemoryRecordStore};
    use tempfile::TempDir;

    const PING: &str = r#"{
        "test_name": "ping_google_dns",
        "target": "8.8.8.8",
        "timestamp": "20250301_101500",
        "min_ping_ms": 4.1,
        "avg_ping_ms": 5.4,
        "max_ping_ms": 7.9,
        "packet_loss_percent": 0,
        "interface": "wg0"
    }"#;

    #[test]
    fn test_ping_fans_out_into_four_records() {
        let records = parse_collector_record("ping.txt", Condition::Tunneled, "ping_x", PING).unwrap();

        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.target == "google_dns"));
        assert_eq!(records[1].metric, Metric::AvgLatencyMs);
        assert_eq!(records[1].value, Some(5.4));
        assert_eq!(records[3].value, Some(0.0));
        assert_eq!(records[0].interface_label.as_deref(), Some("wg0"));
        assert_eq!(records[0].captured_at.format("%Y%m%d_%H%M%S").to_string(), "20250301_101500");
    }

    #[test]
    fn test_null_value_is_absent_not_malformed() {
        let content = r#"{"test_name": "ping_gateway", "avg_ping_ms": null, "min_ping_ms": "3.5"}"#;
        let records = parse_collector_record("p", Condition::Baseline, "ping_gateway", content).unwrap();

        assert_eq!(records[0].value, Some(3.5));
        assert_eq!(records[1].value, None);
        assert_eq!(records[0].interface_label, None);
    }

    #[test]
    fn test_non_numeric_value_is_malformed() {
        let content = r#"{"test_name": "ping_gateway", "avg_ping_ms": "timeout"}"#;
        let err = parse_collector_record("p", Condition::Baseline, "ping_gateway", content).unwrap_err();

        match err {
            Error::MalformedInput { field, .. } => assert_eq!(field, "avg_ping_ms"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bandwidth_prefers_bps_and_falls_back_to_mbps() {
        let with_bps = r#"{"target": "server", "direction": "upload", "bandwidth_bps": 475000000, "bandwidth_mbps": 1}"#;
        let records = parse_collector_record("b", Condition::Tunneled, "iperf_upload", with_bps).unwrap();
        assert_eq!(records[0].target, "server_upload");
        assert_eq!(records[0].value, Some(475_000_000.0));

        let mbps_only = r#"{"target": "server", "direction": "download", "bandwidth_mbps": 500}"#;
        let records = parse_collector_record("b", Condition::Baseline, "iperf_download", mbps_only).unwrap();
        assert_eq!(records[0].value, Some(500_000_000.0));
    }

    #[test]
    fn test_dns_record() {
        let content = r#"{"domain": "example.com", "resolution_time_seconds": 0.023}"#;
        let records = parse_collector_record("d", Condition::Tunneled, "dns_test", content).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].metric, Metric::DnsResolutionSeconds);
        assert_eq!(records[0].target, "example.com");
    }

    #[test]
    fn test_load_dir_keeps_good_files_and_reports_bad_ones() {
        let temp = TempDir::new().unwrap();
        let baseline = temp.path().join("baseline");
        let vpn = temp.path().join("vpn");
        std::fs::create_dir_all(&baseline).unwrap();
        std::fs::create_dir_all(&vpn).unwrap();

        std::fs::write(baseline.join("ping_google_dns_latest.txt"), PING).unwrap();
        std::fs::write(baseline.join("ping_google_dns_20250301_101500.txt"), PING).unwrap();
        std::fs::write(vpn.join("ping_google_dns_latest.txt"), PING).unwrap();
        std::fs::write(vpn.join("ping_gateway_latest.txt"), r#"{"avg_ping_ms": [1]}"#).unwrap();
        std::fs::write(vpn.join("empty_latest.txt"), "  ").unwrap();

        let mut store = MemoryRecordStore::new();
        let report = CollectorLoader::new("latest").load_into(temp.path(), &mut store).unwrap();

        assert_eq!(report.tests(Condition::Baseline), 1);
        assert_eq!(report.tests(Condition::Tunneled), 1);
        assert_eq!(report.records, 8);
        assert_eq!(report.rejected.len(), 1);
        assert!(report.has_malformed());
        assert_eq!(store.count(Condition::Tunneled), 4);
    }

    #[test]
    fn test_reloading_same_run_does_not_duplicate_history() {
        let temp = TempDir::new().unwrap();
        let results = temp.path().join("results");
        let baseline = results.join("baseline");
        std::fs::create_dir_all(&baseline).unwrap();
        std::fs::write(baseline.join("ping_google_dns_latest.txt"), PING).unwrap();

        let mut store = FileRecordStore::open(temp.path().join("store")).unwrap();
        let loader = CollectorLoader::new("latest");

        let first = loader.load_into(&results, &mut store).unwrap();
        assert_eq!(first.unchanged, 0);

        for _ in 0..2 {
            let again = loader.load_into(&results, &mut store).unwrap();
            assert_eq!(again.records, 4);
            assert_eq!(again.unchanged, 4);
        }

        let history = store
            .history(Condition::Baseline, "google_dns", Metric::AvgLatencyMs)
            .unwrap();
        assert_eq!(history.len(), 1);

        // A new collector run with a later timestamp is appended
        let next_run = PING.replace("20250301_101500", "20250301_111500");
        std::fs::write(baseline.join("ping_google_dns_latest.txt"), next_run).unwrap();
        let report = loader.load_into(&results, &mut store).unwrap();
        assert_eq!(report.unchanged, 0);

        let history = store
            .history(Condition::Baseline, "google_dns", Metric::AvgLatencyMs)
            .unwrap();
        assert_eq!(history.len(), 2);
    }
}
