use crate::error::{ReportError, Result};
use crate::types::{
    CellValue, FrequencyRecord, MergedRecord, MergedTable, WeeklyTable, FREQUENCY_COL, REACH_COL,
};
use crate::util::to_numeric;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::info;

/// Reach = Impressions / Frequency. Missing when either side is missing,
/// when Frequency is zero, or when the quotient is not finite.
pub fn compute_reach(impressions: Option<f64>, frequency: Option<f64>) -> Option<f64> {
    let (imp, freq) = (impressions?, frequency?);
    if freq == 0.0 {
        return None;
    }
    Some(imp / freq).filter(|r| r.is_finite())
}

/// Index frequency values by date. A date appearing twice would fan the
/// weekly rows out in a join, so it is rejected.
fn index_by_date(frequency: &[FrequencyRecord]) -> Result<HashMap<NaiveDate, Option<f64>>> {
    let mut by_date = HashMap::with_capacity(frequency.len());
    for rec in frequency {
        if by_date.insert(rec.date, rec.frequency).is_some() {
            return Err(ReportError::DuplicateFrequencyDate(rec.date));
        }
    }
    Ok(by_date)
}

/// Left-join weekly rows to frequency values on date and derive Reach.
/// Weekly row order is preserved and every weekly row appears exactly once.
pub fn merge(weekly: WeeklyTable, frequency: &[FrequencyRecord]) -> Result<MergedTable> {
    let by_date = index_by_date(frequency)?;

    let mut matched = 0usize;
    let mut missing_reach = 0usize;
    let records: Vec<MergedRecord> = weekly
        .records
        .into_iter()
        .map(|rec| {
            let mut cells = rec.cells;
            let impressions = to_numeric(&cells[weekly.impressions_col]);
            cells[weekly.impressions_col] = CellValue::from(impressions);

            let freq = by_date.get(&rec.date).copied();
            if freq.is_some() {
                matched += 1;
            }
            let frequency = freq.flatten();
            let reach = compute_reach(impressions, frequency);
            if reach.is_none() {
                missing_reach += 1;
            }
            MergedRecord {
                cells,
                frequency,
                reach,
            }
        })
        .collect();

    info!(
        rows = records.len(),
        matched,
        missing_reach,
        "merged weekly and frequency tables"
    );

    let mut headers = weekly.headers;
    headers.push(FREQUENCY_COL.to_string());
    headers.push(REACH_COL.to_string());
    Ok(MergedTable {
        headers,
        date_col: weekly.date_col,
        ctr_col: weekly.ctr_col,
        records,
    })
}
