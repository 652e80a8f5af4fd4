use thiserror::Error;

#[derive(Error, Debug)]
pub enum FigureError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    WorkbookError(#[from] calamine::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Column '{column}' not found in {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error("Worksheet '{sheet}' not found in {source_name}")]
    MissingSheet { sheet: String, source_name: String },

    #[error("Invalid {bound} date format '{value}'. Please use YYYY-MM-DD format.")]
    InvalidDate { bound: String, value: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Rendering failed: {message}")]
    RenderError { message: String },

    #[error("DICOM error: {message}")]
    DicomError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Processing,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FigureError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FigureError::CsvError(_)
            | FigureError::WorkbookError(_)
            | FigureError::FileNotFound { .. }
            | FigureError::MissingColumn { .. }
            | FigureError::MissingSheet { .. } => ErrorCategory::Input,
            FigureError::InvalidDate { .. }
            | FigureError::ConfigValidationError { .. }
            | FigureError::InvalidConfigValueError { .. }
            | FigureError::MissingConfigError { .. } => ErrorCategory::Configuration,
            FigureError::ProcessingError { .. } | FigureError::ValidationError { .. } => {
                ErrorCategory::Processing
            }
            FigureError::IoError(_)
            | FigureError::SerializationError(_)
            | FigureError::ImageError(_)
            | FigureError::RenderError { .. }
            | FigureError::DicomError { .. } => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Output => match self {
                FigureError::IoError(_) => ErrorSeverity::Critical,
                _ => ErrorSeverity::High,
            },
        }
    }

    /// Process exit code for a failed command.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FigureError::FileNotFound { path } => format!("Error: File not found: {}", path),
            FigureError::MissingColumn { column, .. } => {
                format!("Error: '{}' column not found in the input file.", column)
            }
            FigureError::MissingSheet { sheet, .. } => {
                format!("Error: worksheet '{}' not found in the input file.", sheet)
            }
            FigureError::InvalidDate { .. } => format!("Error: {}", self),
            FigureError::WorkbookError(e) => format!("Could not read the spreadsheet: {}", e),
            _ => format!("Error generating output: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => {
                "Check the input path, the sheet name and that the report has the expected columns"
            }
            ErrorCategory::Configuration => {
                "Check the command-line flags and the values in the TOML configuration file"
            }
            ErrorCategory::Processing => {
                "Widen the filters (entity type, date range) so that some records remain"
            }
            ErrorCategory::Output => {
                "Check that the output directory is writable and has free space"
            }
        }
    }
}

/// Converts a plotting backend failure into a render error.
pub fn render_error<E: std::fmt::Display>(err: E) -> FigureError {
    FigureError::RenderError {
        message: err.to_string(),
    }
}

/// Converts a DICOM toolkit failure into a DICOM error.
pub fn dicom_error<E: std::fmt::Display>(err: E) -> FigureError {
    FigureError::DicomError {
        message: err.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, FigureError>;
