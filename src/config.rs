//! Configuration management for the UN reports harvester

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::services::fetcher::OutputFormat;

/// UN Digital Library search: reports, latest first, 100 per page, HTML brief format.
pub const DEFAULT_CATALOG_URL: &str = "https://digitallibrary.un.org/search?ln=en&p=year:2025&rm=&sf=latest+first&so=d&rg=100&c=Resource+Type&c=UN+Bodies&of=hb&fti=0&fct__1=Reports";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    /// Search URL in the HTML result format (`of=hb`)
    pub base_url: String,
    /// Host root visited before the real request
    pub home_url: String,
    /// Default format of the `fetch` command
    pub format: String,
    pub timeout_secs: u64,
    pub warm_up: bool,
    pub warm_up_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub all_reports_file: String,
    pub classified_file: String,
    /// `csv` or `json`
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClassifierConfig {
    pub symbol_marker: String,
    pub label: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RegistryConfig {
    pub url: String,
    pub output_file: PathBuf,
    pub excluded_entity: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DocumentsConfig {
    pub root: PathBuf,
    pub output_file: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    pub site_root: String,
    pub output_file: PathBuf,
    pub scrape_pages: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default"))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (e.g. UNREPORTS_CATALOG__TIMEOUT_SECS=60)
            .add_source(
                Environment::with_prefix("UNREPORTS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // Override catalog URL from CATALOG_URL env var if present
            .set_override_option("catalog.base_url", env::var("CATALOG_URL").ok())?
            .build()?;

        config.try_deserialize()
    }

}

impl OutputConfig {
    /// Path of the full report export
    pub fn all_reports_path(&self) -> PathBuf {
        self.dir.join(&self.all_reports_file)
    }

    /// Path of the classified subset export
    pub fn classified_path(&self) -> PathBuf {
        self.dir.join(&self.classified_file)
    }
}

impl CatalogConfig {
    /// Default format for raw catalog fetches
    pub fn fetch_format(&self) -> Result<OutputFormat, ConfigError> {
        self.format.parse().map_err(ConfigError::Message)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            home_url: "https://digitallibrary.un.org/".to_string(),
            format: "marcxml".to_string(),
            timeout_secs: 30,
            warm_up: true,
            warm_up_delay_ms: 2000,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            all_reports_file: "latest_un_reports_2025.csv".to_string(),
            classified_file: "latest_sg_reports_2025.csv".to_string(),
            format: "csv".to_string(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            symbol_marker: "A/".to_string(),
            label: "Secretary-General".to_string(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: "https://docs.google.com/spreadsheets/d/1OZw5VdCeYwju4Y19W9nuQJXF-u0f5BhYIZpeEdmBDyY/export?format=csv&gid=431089069".to_string(),
            output_file: PathBuf::from("data/input/entities.csv"),
            excluded_entity: "Other".to_string(),
        }
    }
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("docs"),
            output_file: PathBuf::from("data/output/reports.json"),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: "https://www.un-ilibrary.org/rss/content/all/most_recent_items?fmt=rss".to_string(),
            site_root: "https://www.un-ilibrary.org".to_string(),
            output_file: PathBuf::from("data/output/un_ilibrary_latest_reports.json"),
            scrape_pages: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
