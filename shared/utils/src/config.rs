use config::{Config, Environment, File};
use crosstab_models::SubsetLabels;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use validator::{Validate, ValidationError};

use crate::error::{CrosstabError, CrosstabResult};
use crate::loader::{ColumnAliases, DuplicatePolicy, PartitionRule, SheetRefs};
use crate::validation::validate_model;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate]
    pub server: ServerConfig,
    #[validate]
    pub reports: ReportSettings,
    #[validate]
    pub columns: ColumnAliases,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1, message = "Host must not be empty"))]
    pub host: String,
    #[validate(range(min = 1, message = "Port must be non-zero"))]
    pub port: u16,
    #[validate(range(min = 1024, message = "Request size limit is too small"))]
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunEnvironment {
    Dev,
    Prod,
}

impl fmt::Display for RunEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dev => write!(f, "dev"),
            Self::Prod => write!(f, "prod"),
        }
    }
}

/// Settings for a report generation run.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReportSettings {
    /// Root for every file the service reads or writes
    #[validate(length(min = 1, message = "Base directory must not be empty"))]
    pub base_directory: String,
    pub environment: RunEnvironment,
    #[validate(custom = "validate_subset_labels")]
    pub subsets: SubsetLabels,
    #[validate]
    pub sheets: SheetRefs,
    pub partition: PartitionRule,
    pub duplicate_policy: DuplicatePolicy,
    /// Stocks workbook (relative to `base_directory`) used when a request
    /// does not upload one
    pub default_stocks_file: Option<String>,
    /// Skip the approval callback in dev
    pub auto_approve: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Append to this file instead of stdout
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

fn validate_subset_labels(labels: &SubsetLabels) -> Result<(), ValidationError> {
    if labels.a.trim().is_empty() || labels.b.trim().is_empty() {
        return Err(ValidationError::new("subset_label_empty"));
    }
    if labels.a == labels.b {
        return Err(ValidationError::new("subset_labels_identical"));
    }
    Ok(())
}

impl ReportSettings {
    pub fn results_dir(&self) -> PathBuf {
        PathBuf::from(&self.base_directory).join("results")
    }

    pub fn default_stocks_path(&self) -> Option<PathBuf> {
        self.default_stocks_file
            .as_ref()
            .map(|file| PathBuf::from(&self.base_directory).join(file))
    }

    /// Every setting as a (name, value) pair, in declaration order.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("base_directory", self.base_directory.clone()),
            ("environment", self.environment.to_string()),
            ("subset_a", self.subsets.a.clone()),
            ("subset_b", self.subsets.b.clone()),
            ("sheet_bom_a", self.sheets.bom_a.clone()),
            ("sheet_bom_b", self.sheets.bom_b.clone()),
            ("sheet_consumption", self.sheets.consumption.clone()),
            ("partition", self.partition.to_string()),
            ("duplicate_policy", self.duplicate_policy.to_string()),
            (
                "default_stocks_file",
                self.default_stocks_file.clone().unwrap_or_else(|| "-".to_string()),
            ),
            ("auto_approve", self.auto_approve.to_string()),
        ]
    }
}

impl AppConfig {
    pub fn load() -> CrosstabResult<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Start with built-in defaults
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific config
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with CROSSTAB prefix
            .add_source(Environment::with_prefix("CROSSTAB").separator("__"));

        let config: AppConfig = config.build()?.try_deserialize()?;
        validate_model(&config)?;
        Ok(config)
    }

    /// Runs the caller's approval step over the report settings. Production
    /// runs and `auto_approve` configurations skip it.
    pub fn confirm<F>(&self, approve: F) -> CrosstabResult<()>
    where
        F: FnOnce(&[(&'static str, String)]) -> bool,
    {
        if self.reports.auto_approve || self.reports.environment == RunEnvironment::Prod {
            return Ok(());
        }

        if approve(&self.reports.describe()) {
            Ok(())
        } else {
            Err(CrosstabError::configuration("Run cancelled: settings were not approved"))
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                max_request_size: 64 * 1024 * 1024, // 64MB
            },
            reports: ReportSettings {
                base_directory: ".".to_string(),
                environment: RunEnvironment::Dev,
                subsets: SubsetLabels::default(),
                sheets: SheetRefs::default(),
                partition: PartitionRule::default(),
                duplicate_policy: DuplicatePolicy::default(),
                default_stocks_file: None,
                auto_approve: false,
            },
            columns: ColumnAliases::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Json,
                file_path: None,
            },
        }
    }
}
