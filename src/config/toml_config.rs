use crate::domain::model::{DEFAULT_SHEET, HEALTHCARE_PROVIDER};
use crate::utils::error::{FigureError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Entity value that turns the covered-entity filter off.
pub const ALL_ENTITIES: &str = "all";

/// Optional `figures.toml` with the defaults shared by every generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub paths: PathsConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Breach report read by the chart generators.
    pub data: String,
    pub figures_dir: String,
    pub samples_dir: String,
    pub tables_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data: "data/breach_report.xlsx".to_string(),
            figures_dir: "figures".to_string(),
            samples_dir: "samples".to_string(),
            tables_dir: "tables".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub sheet: String,
    /// Covered-entity type kept by the trend charts; `all` keeps everything.
    pub entity: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            sheet: DEFAULT_SHEET.to_string(),
            entity: HEALTHCARE_PROVIDER.to_string(),
        }
    }
}

impl FigureConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FigureError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Reads `path` when it exists, otherwise falls back to the defaults.
    pub fn load_optional<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.is_file() {
            tracing::debug!("Reading configuration from {}", path.display());
            Self::from_file(path)
        } else {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FigureError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FigureError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// The entity filter, or `None` when every entity type is kept.
    pub fn entity_filter(&self) -> Option<String> {
        entity_filter(&self.report.entity)
    }
}

pub fn entity_filter(entity: &str) -> Option<String> {
    if entity.eq_ignore_ascii_case(ALL_ENTITIES) {
        None
    } else {
        Some(entity.to_string())
    }
}

impl Validate for FigureConfig {
    fn validate(&self) -> Result<()> {
        validate_path("paths.data", &self.paths.data)?;
        validate_file_extension(
            "paths.data",
            &self.paths.data,
            &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv"],
        )?;
        validate_path("paths.figures_dir", &self.paths.figures_dir)?;
        validate_path("paths.samples_dir", &self.paths.samples_dir)?;
        validate_path("paths.tables_dir", &self.paths.tables_dir)?;
        validate_non_empty_string("report.sheet", &self.report.sheet)?;
        validate_non_empty_string("report.entity", &self.report.entity)?;
        Ok(())
    }
}
