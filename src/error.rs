//! Errors for swisscv
//!
//! Every error carries an `E<nnn>` code. The hundreds digit names the stage
//! that failed, and the process exit code is that digit times ten, so
//! scripts can tell a bad config (10) from broken reference data (30).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Stage of a run an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Io,
    ReferenceData,
    Generation,
    Export,
    Internal,
}

impl ErrorCategory {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCategory::Config => 10,
            ErrorCategory::Io => 20,
            ErrorCategory::ReferenceData => 30,
            ErrorCategory::Generation => 40,
            ErrorCategory::Export => 50,
            ErrorCategory::Internal => 90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    DataNotFound = 300,
    DataFormat = 301,
    EmptyPool = 302,
    UnknownCanton = 303,

    PersonaInvalid = 400,
    SummaryGeneration = 410,

    ExportFailed = 500,

    InternalError = 900,
}

impl ErrorCode {
    pub fn number(self) -> u16 {
        self as u16
    }

    pub fn category(self) -> ErrorCategory {
        match self.number() / 100 {
            1 => ErrorCategory::Config,
            2 => ErrorCategory::Io,
            3 => ErrorCategory::ReferenceData,
            4 => ErrorCategory::Generation,
            5 => ErrorCategory::Export,
            _ => ErrorCategory::Internal,
        }
    }

    pub fn exit_code(self) -> i32 {
        self.category().exit_code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.number())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// An explicit `--config` path, or `SWISSCV_CONFIG`, points nowhere
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// A setting is out of range; `field` is the dotted TOML key
    #[error("Invalid configuration: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot read {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Cannot serialize configuration: {0}")]
    Toml(#[from] toml::ser::Error),

    /// A required table is missing and the bundled dataset is disabled
    #[error("Reference data '{source_name}' not found at {path}")]
    DataNotFound { source_name: String, path: PathBuf },

    /// A malformed file, or a malformed row in strict mode
    #[error("Malformed reference data '{source_name}': {message}")]
    DataFormat { source_name: String, message: String },

    #[error("No cantons available to sample from: {0}")]
    EmptyPool(String),

    #[error("Unknown canton code '{code}'")]
    UnknownCanton { code: String },

    /// Sampled fields broke a persona invariant (age bounds, empty name, ...)
    #[error("Invalid persona: {0}")]
    PersonaInvalid(String),

    #[error("Summary generation failed: {0}")]
    SummaryGeneration(String),

    #[error("Export to {format} failed: {message}")]
    ExportFailed { format: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        use ErrorCode as C;
        match self {
            Error::ConfigNotFound { .. } => C::ConfigNotFound,
            Error::ConfigParse { .. } | Error::Toml(_) => C::ConfigParseError,
            Error::ConfigValidation { .. } | Error::Config(_) => C::ConfigValidation,
            Error::IoRead { .. } => C::IoRead,
            Error::IoWrite { .. } => C::IoWrite,
            Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => C::IoNotFound,
            Error::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => C::IoPermission,
            Error::Io(_) => C::IoRead,
            Error::DataNotFound { .. } => C::DataNotFound,
            Error::DataFormat { .. } => C::DataFormat,
            Error::EmptyPool(_) => C::EmptyPool,
            Error::UnknownCanton { .. } => C::UnknownCanton,
            Error::PersonaInvalid(_) => C::PersonaInvalid,
            Error::SummaryGeneration(_) => C::SummaryGeneration,
            Error::ExportFailed { .. } | Error::Json(_) => C::ExportFailed,
            Error::Internal(_) => C::InternalError,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }

    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    /// Reference data problems hit every persona in a batch the same way,
    /// so a batch stops on them instead of skipping one seed.
    pub fn aborts_batch(&self) -> bool {
        self.category() == ErrorCategory::ReferenceData
    }

    /// What the user can do about it, if anything
    pub fn suggestion(&self) -> Option<&'static str> {
        let hint = match self {
            Error::ConfigNotFound { .. } => {
                "Create one with 'swisscv config init', or drop --config to use the defaults."
            }
            Error::ConfigParse { .. } => "The file is not valid TOML. Compare it with 'swisscv config show'.",
            Error::ConfigValidation { .. } | Error::Config(_) => {
                "Fix the named setting, then run 'swisscv config validate'."
            }
            Error::DataNotFound { .. } => {
                "Point [data].dir at a directory containing cantons.json, or enable bundled_fallback."
            }
            Error::DataFormat { .. } => "Run 'swisscv data validate' to locate the malformed file or row.",
            Error::EmptyPool(_) => "Every canton row was rejected or has zero population. Check cantons.json.",
            Error::UnknownCanton { .. } => {
                "Use a two-letter canton code such as ZH, GE or TI. 'swisscv data info' lists them."
            }
            Error::IoWrite { .. } | Error::ExportFailed { .. } => {
                "Check that the output directory is writable."
            }
            _ => return None,
        };
        Some(hint)
    }

    /// Red code and message, then a yellow hint line when there is one
    pub fn format_for_terminal(&self) -> String {
        let hint = self
            .suggestion()
            .map(|hint| format!("\n\x1b[33mHint\x1b[0m: {}\n", hint))
            .unwrap_or_default();
        format!("\x1b[31mError [{}]\x1b[0m: {}\n{}", self.code(), self, hint)
    }

    pub fn format_for_log(&self) -> String {
        match self {
            Error::ConfigValidation {
                field: Some(field), ..
            } => format!("[{}] {} ({})", self.code(), self, field),
            _ => format!("[{}] {}", self.code(), self),
        }
    }

    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn data_not_found(source_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Error::DataNotFound {
            source_name: source_name.into(),
            path: path.into(),
        }
    }

    pub fn data_format(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::DataFormat {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn export_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ExportFailed {
            format: format.into(),
            message: message.into(),
        }
    }
}
