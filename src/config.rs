// Command-line arguments and the validated request they turn into.
//
// Everything the pipeline needs is collected into an immutable
// `ReportRequest`; the pipeline itself never looks at the CLI.
use crate::error::{ReportError, Result};
use crate::types::Region;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "weekly-report",
    version,
    about = "Merge a weekly impressions export with a frequency export into a Reach report"
)]
pub struct Cli {
    /// Client name (e.g. "Wray's").
    #[arg(long)]
    pub client: Option<String>,

    /// Report number (e.g. 8). Only used in the output filename.
    #[arg(long)]
    pub report_number: Option<String>,

    /// Client region. US data is stamped a day ahead and is shifted back.
    #[arg(long, value_enum, ignore_case = true, default_value_t = Region::Us)]
    pub region: Region,

    /// Weekly data pull workbook (.xlsx, sheet "Data").
    #[arg(long)]
    pub weekly: Option<PathBuf>,

    /// Frequency workbook (.xlsx, sheet "Data").
    #[arg(long)]
    pub frequency: Option<PathBuf>,

    /// Directory the report workbook is written to.
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Show at most this many rows in the console preview.
    #[arg(long)]
    pub preview_rows: Option<usize>,

    /// Prompt for anything not given on the command line, and offer to run again.
    #[arg(short, long)]
    pub interactive: bool,

    /// More log output (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// One run's worth of inputs, all present and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub client: String,
    pub report_number: String,
    pub region: Region,
    pub weekly_path: PathBuf,
    pub frequency_path: PathBuf,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn existing_file(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| p.is_file())
}

impl ReportRequest {
    /// Validate raw inputs. Every absent field is named in the error; nothing
    /// is read from the workbooks until all four inputs are present.
    pub fn new(
        client: Option<String>,
        report_number: Option<String>,
        region: Region,
        weekly_path: Option<PathBuf>,
        frequency_path: Option<PathBuf>,
    ) -> Result<Self> {
        let client = present(client);
        let report_number = present(report_number);
        let weekly_path = existing_file(weekly_path);
        let frequency_path = existing_file(frequency_path);

        match (client, report_number, weekly_path, frequency_path) {
            (Some(client), Some(report_number), Some(weekly_path), Some(frequency_path)) => {
                Ok(ReportRequest {
                    client,
                    report_number,
                    region,
                    weekly_path,
                    frequency_path,
                })
            }
            (client, report_number, weekly_path, frequency_path) => {
                let missing = [
                    ("client name", client.is_none()),
                    ("report number", report_number.is_none()),
                    ("weekly file", weekly_path.is_none()),
                    ("frequency file", frequency_path.is_none()),
                ]
                .into_iter()
                .filter(|(_, absent)| *absent)
                .map(|(name, _)| name)
                .collect();
                Err(ReportError::MissingInput(missing))
            }
        }
    }

    pub fn from_cli(cli: &Cli) -> Result<Self> {
        ReportRequest::new(
            cli.client.clone(),
            cli.report_number.clone(),
            cli.region,
            cli.weekly.clone(),
            cli.frequency.clone(),
        )
    }
}
