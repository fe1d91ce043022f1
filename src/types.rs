use crate::error::ReportError;
use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

pub const DATA_SHEET: &str = "Data";

pub const DATE_COL: &str = "Date";
pub const IMPRESSIONS_COL: &str = "Impressions";
pub const CTR_COL: &str = "Click Rate (CTR)";
pub const FREQUENCY_SOURCE_COL: &str = "Unique Reach: Average Impression Frequency";
pub const FREQUENCY_COL: &str = "Frequency";
pub const REACH_COL: &str = "Reach";

/// A single spreadsheet cell, detached from the reader that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Plain textual form of the stored value, without display formatting.
    /// Used for column sizing.
    pub fn raw_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl From<Option<f64>> for CellValue {
    fn from(v: Option<f64>) -> Self {
        v.map(CellValue::Number).unwrap_or(CellValue::Empty)
    }
}

/// Header row plus data rows of one worksheet, as read.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub headers: Vec<String>,
    /// (1-based sheet row number, cells). Rows are padded to the header width.
    pub rows: Vec<(usize, Vec<CellValue>)>,
}

impl RawSheet {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

/// Client market convention controlling the date-window shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Region {
    #[value(name = "US")]
    Us,
    #[value(name = "AU")]
    Au,
}

impl Region {
    /// Days the weekly export runs ahead of the reporting day.
    pub fn shift_days(self) -> u64 {
        match self {
            Region::Us => 1,
            Region::Au => 0,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Us => write!(f, "US"),
            Region::Au => write!(f, "AU"),
        }
    }
}

impl FromStr for Region {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "US" => Ok(Region::Us),
            "AU" => Ok(Region::Au),
            _ => Err(ReportError::InvalidRegion(s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyRecord {
    pub date: NaiveDate,
    /// Every column of the source row, in header order. The Date slot holds
    /// the parsed date.
    pub cells: Vec<CellValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyTable {
    pub headers: Vec<String>,
    pub date_col: usize,
    pub impressions_col: usize,
    pub ctr_col: usize,
    pub records: Vec<WeeklyRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyRecord {
    pub date: NaiveDate,
    pub frequency: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    /// Weekly cells with Impressions already coerced to numeric.
    pub cells: Vec<CellValue>,
    pub frequency: Option<f64>,
    pub reach: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    /// Weekly headers followed by Frequency and Reach.
    pub headers: Vec<String>,
    pub date_col: usize,
    pub ctr_col: usize,
    pub records: Vec<MergedRecord>,
}

impl MergedTable {
    pub fn reach_col(&self) -> usize {
        self.headers.len() - 1
    }

    /// Full output row: weekly cells then Frequency and Reach.
    pub fn row_cells(record: &MergedRecord) -> Vec<CellValue> {
        let mut cells = record.cells.clone();
        cells.push(record.frequency.into());
        cells.push(record.reach.into());
        cells
    }
}

/// Reporting window after the region shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizeReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub dropped_rows: usize,
}

/// Everything a single run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub client: String,
    pub range: DateRange,
    pub filename: String,
    pub table: MergedTable,
    pub weekly_load: NormalizeReport,
    pub frequency_load: NormalizeReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_parses_case_insensitively() {
        assert_eq!("us".parse::<Region>().unwrap(), Region::Us);
        assert_eq!(" AU ".parse::<Region>().unwrap(), Region::Au);
        assert!(matches!(
            "NZ".parse::<Region>(),
            Err(ReportError::InvalidRegion(r)) if r == "NZ"
        ));
    }

    #[test]
    fn only_us_is_shifted() {
        assert_eq!(Region::Us.shift_days(), 1);
        assert_eq!(Region::Au.shift_days(), 0);
    }

    #[test]
    fn missing_numbers_become_empty_cells() {
        assert_eq!(CellValue::from(None), CellValue::Empty);
        assert_eq!(CellValue::from(Some(2.5)), CellValue::Number(2.5));
    }
}
