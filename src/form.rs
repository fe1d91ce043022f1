// Interactive prompts for `--interactive`.
//
// This is only a front end: it gathers raw answers and hands them to
// `ReportRequest::new`, which does all of the validation.
use crate::config::{Cli, ReportRequest};
use crate::error::Result;
use crate::types::Region;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Print `label` and read one trimmed line. EOF reads as an empty answer.
fn ask<R: BufRead>(input: &mut R, label: &str) -> String {
    print!("{label}: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    input.read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn ask_region<R: BufRead>(input: &mut R, default: Region) -> Region {
    loop {
        let answer = ask(input, &format!("Client region (US/AU) [{default}]"));
        if answer.is_empty() {
            return default;
        }
        match answer.parse::<Region>() {
            Ok(region) => return region,
            Err(e) => println!("{e}"),
        }
    }
}

/// Collect one run's inputs, prompting for whatever the command line left
/// out. The region is always asked, defaulting to `--region`.
pub fn collect_request<R: BufRead>(input: &mut R, cli: &Cli) -> Result<ReportRequest> {
    let client = cli
        .client
        .clone()
        .or_else(|| Some(ask(input, "Client name (e.g. Wray's)")));
    let report_number = cli
        .report_number
        .clone()
        .or_else(|| Some(ask(input, "Report number (e.g. 8)")));
    let region = ask_region(input, cli.region);
    let weekly = cli
        .weekly
        .clone()
        .or_else(|| Some(PathBuf::from(ask(input, "Weekly data pull (.xlsx)"))));
    let frequency = cli
        .frequency
        .clone()
        .or_else(|| Some(PathBuf::from(ask(input, "Frequency file (.xlsx)"))));
    ReportRequest::new(client, report_number, region, weekly, frequency)
}

/// Ask whether to generate another report.
///
/// Returns `true` for `Y`, `false` for `N` or end of input.
pub fn prompt_again<R: BufRead>(input: &mut R) -> bool {
    loop {
        print!("Generate another report (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        match input.read_line(&mut buf) {
            Ok(0) | Err(_) => return false,
            Ok(_) => {}
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}
