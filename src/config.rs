//! @ai:module:intent Configuration structs for the analyzer
//! @ai:module:layer infrastructure
//! @ai:module:public_api AnalyzerConfig, PathConfig, AnalysisConfig
//! @ai:module:stateless true

use crate::analysis::{BenchmarkProfile, DEFAULT_TARGETS};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "wg-perf.toml";

/// @ai:intent Main configuration for the analyzer
/// @ai:effects pure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub paths: PathConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// @ai:intent Path configuration for input/output directories
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Collector output root holding `baseline/` and `vpn/`
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default = "default_analysis_dir")]
    pub analysis_dir: PathBuf,
    /// Persistent record store root
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
}

/// @ai:intent Analysis configuration
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub profile: BenchmarkProfile,
    /// Report order of latency targets
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,
    /// Collector file suffix: `latest` or a run timestamp
    #[serde(default = "default_test_type")]
    pub test_type: String,
    #[serde(default = "default_charts")]
    pub charts: bool,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            analysis_dir: default_analysis_dir(),
            store_dir: default_store_dir(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            profile: BenchmarkProfile::default(),
            targets: default_targets(),
            test_type: default_test_type(),
            charts: default_charts(),
        }
    }
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_analysis_dir() -> PathBuf {
    PathBuf::from("analysis")
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("store")
}

fn default_targets() -> Vec<String> {
    DEFAULT_TARGETS.iter().map(|t| t.to_string()).collect()
}

fn default_test_type() -> String {
    "latest".to_string()
}

fn default_charts() -> bool {
    true
}

impl AnalyzerConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// @ai:intent Load the file when it exists, defaults otherwise
    /// @ai:effects fs:read
    pub fn load_or_default(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
