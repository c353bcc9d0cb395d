use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file structure for citool.
///
/// Holds defaults for both modes so repeated runs need fewer flags. Command line
/// flags always win over values loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// CircleCI API and download settings
    #[serde(default)]
    pub circleci: CircleCiConfig,

    /// Analysis parameters
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CircleCiConfig {
    /// CircleCI personal API token
    pub token: Option<String>,

    /// Base URL of the CircleCI v1.1 API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// VCS type used in project URLs (`github` or `bitbucket`)
    #[serde(default = "default_vcs_type")]
    pub vcs_type: String,

    /// Directory downloaded pages are written to and discovered from
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Attempts per page before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Which reports to produce and how to shape the trend graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnalysisConfig {
    /// Per-job aggregated success rate
    #[serde(default = "default_true")]
    pub print_success_rate: bool,

    /// Per-job average duration
    #[serde(default = "default_true")]
    pub print_duration: bool,

    /// Per-job duration trend graph
    #[serde(default = "default_true")]
    pub print_duration_graph: bool,

    /// Per-job success trend graph
    #[serde(default)]
    pub print_success_graph: bool,

    /// Moving average window applied to series longer than it
    #[serde(default = "default_window")]
    pub window: usize,

    #[serde(default = "default_max_graph_width")]
    pub max_graph_width: usize,

    #[serde(default = "default_max_graph_height")]
    pub max_graph_height: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
    Csv,
}

impl Default for CircleCiConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
            vcs_type: default_vcs_type(),
            download_dir: default_download_dir(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            print_success_rate: true,
            print_duration: true,
            print_duration_graph: true,
            print_success_graph: false,
            window: default_window(),
            max_graph_width: default_max_graph_width(),
            max_graph_height: default_max_graph_height(),
        }
    }
}

fn default_base_url() -> String {
    "https://circleci.com/api/v1.1/".to_string()
}

fn default_vcs_type() -> String {
    "github".to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./circleci_data")
}

fn default_max_retries() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_window() -> usize {
    10
}

fn default_max_graph_width() -> usize {
    100
}

fn default_max_graph_height() -> usize {
    20
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./citool.toml
    /// 3. ./citool.json
    /// 4. ./citool.yaml
    /// 5. ./citool.yml
    /// 6. `<user config dir>/citool/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = ["citool.toml", "citool.json", "citool.yaml", "citool.yml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        let user_config = dirs::config_dir().map(|dir| dir.join("citool").join("config.toml"));
        if let Some(path) = user_config.filter(|path| path.exists()) {
            return Self::load_from_path(&path);
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        let config: Self = match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects values no run could use.
    pub fn validate(&self) -> Result<()> {
        if self.analysis.window == 0 {
            anyhow::bail!("Invalid configuration: analysis window must be at least 1");
        }
        if self.analysis.max_graph_width == 0 || self.analysis.max_graph_height == 0 {
            anyhow::bail!("Invalid configuration: graph dimensions must be positive");
        }
        if self.circleci.max_retries == 0 {
            anyhow::bail!("Invalid configuration: max-retries must be at least 1");
        }
        Ok(())
    }
}
