use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum CrosstabError {
    #[error("Load error in sheet '{sheet}': {message}")]
    Load { sheet: String, message: String },

    #[error("Load error in sheet '{sheet}': missing required column '{column}'")]
    MissingColumn { sheet: String, column: String },

    #[error("Load error in sheet '{sheet}', row {row}, column '{column}': {message}")]
    InvalidValue {
        sheet: String,
        row: usize,
        column: String,
        message: String,
    },

    #[error("Duplicate BOM entry in sheet '{sheet}': model '{model}', component '{component}' on rows {rows:?}")]
    DuplicateBomEntry {
        sheet: String,
        model: String,
        component: String,
        rows: Vec<usize>,
    },

    #[error("Unknown model: '{model}' has no BOM rows")]
    UnknownModel { model: String },

    #[error("Write error for '{path}': {message}")]
    Write { path: String, message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl CrosstabError {
    pub fn load(sheet: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            sheet: sheet.into(),
            message: message.into(),
        }
    }

    pub fn missing_column(sheet: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            sheet: sheet.into(),
            column: column.into(),
        }
    }

    pub fn invalid_value(
        sheet: impl Into<String>,
        row: usize,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            sheet: sheet.into(),
            row,
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn unknown_model(model: impl Into<String>) -> Self {
        Self::UnknownModel {
            model: model.into(),
        }
    }

    pub fn write(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for every variant raised while reading the source workbook.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::Load { .. }
                | Self::MissingColumn { .. }
                | Self::InvalidValue { .. }
                | Self::DuplicateBomEntry { .. }
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Load { .. } => "LOAD_ERROR",
            Self::MissingColumn { .. } => "LOAD_ERROR",
            Self::InvalidValue { .. } => "LOAD_ERROR",
            Self::DuplicateBomEntry { .. } => "DUPLICATE_BOM_ENTRY",
            Self::UnknownModel { .. } => "UNKNOWN_MODEL",
            Self::Write { .. } => "WRITE_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Load { .. } => 422,
            Self::MissingColumn { .. } => 422,
            Self::InvalidValue { .. } => 422,
            Self::DuplicateBomEntry { .. } => 422,
            Self::UnknownModel { .. } => 422,
            Self::Write { .. } => 500,
            Self::Validation { .. } => 400,
            Self::Configuration { .. } => 500,
            Self::NotFound { .. } => 404,
            Self::Internal { .. } => 500,
        }
    }
}

pub type CrosstabResult<T> = Result<T, CrosstabError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<CrosstabError> for ErrorResponse {
    fn from(error: CrosstabError) -> Self {
        let details = match &error {
            CrosstabError::DuplicateBomEntry { rows, .. } => Some(serde_json::json!({ "rows": rows })),
            CrosstabError::InvalidValue { row, column, .. } => {
                Some(serde_json::json!({ "row": row, "column": column }))
            }
            _ => None,
        };

        Self {
            error: error.to_string(),
            code: error.error_code().to_string(),
            message: error.to_string(),
            details,
        }
    }
}

// Conversion from common error types
impl From<calamine::XlsxError> for CrosstabError {
    fn from(error: calamine::XlsxError) -> Self {
        Self::load("<workbook>", error.to_string())
    }
}

impl From<csv::Error> for CrosstabError {
    fn from(error: csv::Error) -> Self {
        Self::load("<csv>", error.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for CrosstabError {
    fn from(error: rust_xlsxwriter::XlsxError) -> Self {
        Self::write("<workbook>", error.to_string())
    }
}

impl From<zip::result::ZipError> for CrosstabError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::write("<archive>", error.to_string())
    }
}

impl From<config::ConfigError> for CrosstabError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}

impl From<serde_json::Error> for CrosstabError {
    fn from(error: serde_json::Error) -> Self {
        Self::internal(error.to_string())
    }
}

impl From<std::io::Error> for CrosstabError {
    fn from(error: std::io::Error) -> Self {
        Self::write("<io>", error.to_string())
    }
}
