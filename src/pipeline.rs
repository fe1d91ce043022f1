// One report run: read both workbooks, normalize, shift the window, merge.
//
// `build_report` is pure over in-memory sheets; `run` only adds the workbook
// reads in front of it. Nothing is retained between runs.
use crate::config::ReportRequest;
use crate::error::Result;
use crate::loader::{load_frequency, load_weekly, read_data_sheet};
use crate::merge::merge;
use crate::output::output_filename;
use crate::types::{DateRange, RawSheet, Report};
use tracing::info_span;

pub fn build_report(request: &ReportRequest, weekly: RawSheet, frequency: RawSheet) -> Result<Report> {
    let (weekly, weekly_load) = load_weekly(weekly)?;
    let range = DateRange::from_dates(weekly.records.iter().map(|r| r.date), request.region)?;
    let (frequency, frequency_load) = load_frequency(frequency)?;
    let table = merge(weekly, &frequency)?;
    let filename = output_filename(&request.report_number, &request.client, &range.label);
    Ok(Report {
        client: request.client.clone(),
        range,
        filename,
        table,
        weekly_load,
        frequency_load,
    })
}

pub fn run(request: &ReportRequest) -> Result<Report> {
    let _span = info_span!("report", client = %request.client, region = %request.region).entered();
    let weekly = read_data_sheet(&request.weekly_path)?;
    let frequency = read_data_sheet(&request.frequency_path)?;
    build_report(request, weekly, frequency)
}
