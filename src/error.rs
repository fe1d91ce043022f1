use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Run-level failures. Row-level problems (bad dates, non-numeric values)
/// never show up here; they are dropped or coerced to missing instead.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Please complete all fields and upload both files (missing: {})", .0.join(", "))]
    MissingInput(Vec<&'static str>),

    #[error("Failed to open workbook {}: {source}", .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Workbook {} has no sheet named \"{sheet}\"", .path.display())]
    MissingSheet { path: PathBuf, sheet: &'static str },

    #[error("{table} sheet is missing required column(s): {}", .columns.join(", "))]
    MissingColumns {
        table: &'static str,
        columns: Vec<String>,
    },

    #[error("Weekly sheet already has a \"{column}\" column")]
    ReservedColumn { column: &'static str },

    #[error("Weekly sheet has no rows with a valid date")]
    NoValidDates,

    #[error("Frequency sheet has more than one row for {0}")]
    DuplicateFrequencyDate(NaiveDate),

    #[error("Date {0} cannot be shifted")]
    DateOutOfRange(NaiveDate),

    #[error("Unknown region \"{0}\" (expected US or AU)")]
    InvalidRegion(String),

    #[error("Failed to build workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    /// 2 for problems with what the user supplied, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            ReportError::MissingInput(_) | ReportError::InvalidRegion(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
