//! Error types for tuning-efficiency.
//!
//! Every failure is fatal: the run stops at the first error and nothing is
//! written to the output directory.

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, EfficiencyError>;

/// Conversion error types
#[derive(Error, Debug)]
pub enum EfficiencyError {
    /// Inconsistent or unsupported configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// No frequency-table row matches a problem size
    #[error("frequency information not found for size: {size}")]
    FrequencyNotFound {
        /// Problem size as printed in the logic file
        size: String,
    },

    /// Two frequency-table rows share the same size key
    #[error("duplicate frequency row for size {size} (lines {first_line} and {line})")]
    DuplicateFrequencyRow {
        /// Problem size key
        size: String,
        /// Line of the first occurrence
        first_line: usize,
        /// Line of the duplicate
        line: usize,
    },

    /// Hardware spec document does not have the expected shape
    #[error("invalid hardware spec: {0}")]
    SpecFormat(String),

    /// Logic file does not have the expected positional layout
    #[error("invalid logic file {}: {message}", path.display())]
    LogicFormat {
        /// Logic file path
        path: PathBuf,
        /// What was wrong
        message: String,
    },

    /// A frequency-table field could not be parsed
    #[error("{}:{line}: column {column}: {message}", path.display())]
    CsvParse {
        /// CSV file path
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Column name
        column: String,
        /// What was wrong
        message: String,
    },

    /// A required frequency-table column is missing
    #[error("{}: missing column {column}", path.display())]
    MissingColumn {
        /// CSV file path
        path: PathBuf,
        /// Column name
        column: String,
    },

    /// Frequency, ALU rate or CU count is not positive
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// File could not be read or written
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// CSV reader failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl EfficiencyError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Numeric process status for this error
    pub fn code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::FrequencyNotFound { .. } => 3,
            Self::DuplicateFrequencyRow { .. }
            | Self::SpecFormat(_)
            | Self::LogicFormat { .. }
            | Self::CsvParse { .. }
            | Self::MissingColumn { .. }
            | Self::Csv(_) => 4,
            Self::InvalidInput(_) => 5,
            Self::Io { .. } => 7,
        }
    }

    /// Get exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }
}
