use crate::error::{ReportError, Result};
use crate::types::{
    CellValue, FrequencyRecord, NormalizeReport, RawSheet, WeeklyRecord, WeeklyTable, CTR_COL,
    DATA_SHEET, DATE_COL, FREQUENCY_COL, FREQUENCY_SOURCE_COL, IMPRESSIONS_COL, REACH_COL,
};
use crate::util::{parse_date_cell, to_numeric};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, info};

/// Read the "Data" sheet of a workbook. The first row is the header row.
pub fn read_data_sheet(path: &Path) -> Result<RawSheet> {
    let mut workbook = open_workbook_auto(path).map_err(|source| ReportError::Workbook {
        path: path.to_path_buf(),
        source,
    })?;
    if !workbook.sheet_names().iter().any(|s| s == DATA_SHEET) {
        return Err(ReportError::MissingSheet {
            path: path.to_path_buf(),
            sheet: DATA_SHEET,
        });
    }
    let range = workbook
        .worksheet_range(DATA_SHEET)
        .map_err(|source| ReportError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

    // Row numbers are reported relative to the sheet, not the used range.
    let first_row = range.start().map(|(r, _)| r as usize + 1).unwrap_or(1);
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(header_text).collect(),
        None => Vec::new(),
    };
    let width = headers.len();
    let rows = rows
        .enumerate()
        .map(|(i, row)| {
            let mut cells: Vec<CellValue> = row.iter().map(cell_value).collect();
            cells.resize(width, CellValue::Empty);
            (first_row + i + 1, cells)
        })
        .collect::<Vec<_>>();

    info!(path = %path.display(), rows = rows.len(), columns = width, "read sheet");
    Ok(RawSheet { headers, rows })
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        // `as_datetime` honours the workbook's 1900/1904 date system.
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) if dt.is_datetime() => CellValue::DateTime(ndt),
            _ => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Check that every required column exists, reporting all that don't.
pub fn require_columns(sheet: &RawSheet, table: &'static str, required: &[&str]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| sheet.column(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReportError::MissingColumns {
            table,
            columns: missing,
        })
    }
}

fn locate(sheet: &RawSheet, table: &'static str, name: &str) -> Result<usize> {
    sheet.column(name).ok_or_else(|| ReportError::MissingColumns {
        table,
        columns: vec![name.to_string()],
    })
}

/// Parse the Date column of every row and drop rows whose date cannot be
/// parsed. Surviving rows carry the parsed date in the Date slot.
pub fn normalize_dates(
    rows: Vec<(usize, Vec<CellValue>)>,
    date_col: usize,
) -> (Vec<(NaiveDate, Vec<CellValue>)>, NormalizeReport) {
    let total_rows = rows.len();
    let mut kept = Vec::with_capacity(total_rows);
    for (row_no, mut cells) in rows {
        match cells.get(date_col).and_then(parse_date_cell) {
            Some(date) => {
                cells[date_col] = CellValue::Date(date);
                kept.push((date, cells));
            }
            None => debug!(row = row_no, "dropping row without a valid date"),
        }
    }
    let report = NormalizeReport {
        total_rows,
        kept_rows: kept.len(),
        dropped_rows: total_rows - kept.len(),
    };
    (kept, report)
}

/// Validate the weekly sheet and normalize its dates.
pub fn load_weekly(sheet: RawSheet) -> Result<(WeeklyTable, NormalizeReport)> {
    require_columns(&sheet, "Weekly", &[DATE_COL, IMPRESSIONS_COL, CTR_COL])?;
    for reserved in [FREQUENCY_COL, REACH_COL] {
        if sheet.column(reserved).is_some() {
            return Err(ReportError::ReservedColumn { column: reserved });
        }
    }
    let date_col = locate(&sheet, "Weekly", DATE_COL)?;
    let impressions_col = locate(&sheet, "Weekly", IMPRESSIONS_COL)?;
    let ctr_col = locate(&sheet, "Weekly", CTR_COL)?;

    let (kept, report) = normalize_dates(sheet.rows, date_col);
    info!(
        kept = report.kept_rows,
        dropped = report.dropped_rows,
        "normalized weekly dates"
    );
    let records = kept
        .into_iter()
        .map(|(date, cells)| WeeklyRecord { date, cells })
        .collect();
    Ok((
        WeeklyTable {
            headers: sheet.headers,
            date_col,
            impressions_col,
            ctr_col,
            records,
        },
        report,
    ))
}

/// Validate the frequency sheet, normalize its dates and reduce it to
/// (Date, Frequency) pairs. Unparseable frequencies become missing.
pub fn load_frequency(sheet: RawSheet) -> Result<(Vec<FrequencyRecord>, NormalizeReport)> {
    require_columns(&sheet, "Frequency", &[DATE_COL, FREQUENCY_SOURCE_COL])?;
    let date_col = locate(&sheet, "Frequency", DATE_COL)?;
    let freq_col = locate(&sheet, "Frequency", FREQUENCY_SOURCE_COL)?;

    let (kept, report) = normalize_dates(sheet.rows, date_col);
    info!(
        kept = report.kept_rows,
        dropped = report.dropped_rows,
        "normalized frequency dates"
    );
    let records = kept
        .into_iter()
        .map(|(date, cells)| FrequencyRecord {
            date,
            frequency: to_numeric(&cells[freq_col]),
        })
        .collect();
    Ok((records, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn date_cells_follow_the_workbook_date_system() {
        let jan5 = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let in_1900 = Data::DateTime(ExcelDateTime::new(45296.0, ExcelDateTimeType::DateTime, false));
        let in_1904 = Data::DateTime(ExcelDateTime::new(43834.0, ExcelDateTimeType::DateTime, true));
        assert_eq!(cell_value(&in_1900), CellValue::DateTime(jan5));
        assert_eq!(cell_value(&in_1904), CellValue::DateTime(jan5));

        let duration = Data::DateTime(ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false));
        assert_eq!(cell_value(&duration), CellValue::Number(1.5));
    }

    fn sheet(headers: &[&str], rows: Vec<Vec<CellValue>>) -> RawSheet {
        RawSheet {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows.into_iter().enumerate().map(|(i, r)| (i + 2, r)).collect(),
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekly_rows_without_dates_are_dropped() {
        let weekly = sheet(
            &["Date", "Impressions", "Click Rate (CTR)", "Campaign"],
            vec![
                vec![text("2024-01-05"), CellValue::Number(1000.0), CellValue::Number(0.012), text("A")],
                vec![text("Total"), CellValue::Number(9000.0), CellValue::Empty, text("")],
                vec![CellValue::Empty, CellValue::Number(5.0), CellValue::Empty, text("B")],
                vec![CellValue::Number(45297.0), text("n/a"), CellValue::Number(0.02), text("C")],
            ],
        );
        let (table, report) = load_weekly(weekly).unwrap();
        assert_eq!(
            report,
            NormalizeReport { total_rows: 4, kept_rows: 2, dropped_rows: 2 }
        );
        let dates: Vec<_> = table.records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![ymd(2024, 1, 5), ymd(2024, 1, 6)]);
        assert_eq!(table.records[1].cells[0], CellValue::Date(ymd(2024, 1, 6)));
        // Impressions are untouched until the merge.
        assert_eq!(table.records[1].cells[1], text("n/a"));
        assert_eq!((table.date_col, table.impressions_col, table.ctr_col), (0, 1, 2));
    }

    #[test]
    fn normalizing_twice_keeps_every_row() {
        let rows = vec![
            (2, vec![text("1/5/2024")]),
            (3, vec![text("garbage")]),
            (4, vec![CellValue::Number(45300.0)]),
        ];
        let (once, _) = normalize_dates(rows, 0);
        let again_input: Vec<_> = once.iter().map(|(_, c)| (0, c.clone())).collect();
        let (twice, report) = normalize_dates(again_input, 0);
        assert_eq!(report.dropped_rows, 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_weekly_columns_are_reported_together() {
        let weekly = sheet(&["Date", "Clicks"], vec![]);
        match load_weekly(weekly) {
            Err(ReportError::MissingColumns { table, columns }) => {
                assert_eq!(table, "Weekly");
                assert_eq!(columns, vec!["Impressions", "Click Rate (CTR)"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn weekly_may_not_carry_output_columns() {
        let weekly = sheet(&["Date", "Impressions", "Click Rate (CTR)", "Reach"], vec![]);
        assert!(matches!(
            load_weekly(weekly),
            Err(ReportError::ReservedColumn { column: "Reach" })
        ));
    }

    #[test]
    fn headers_match_after_trimming() {
        let weekly = sheet(&[" Date ", "Impressions", "Click Rate (CTR) "], vec![]);
        assert!(load_weekly(weekly).is_ok());
    }

    #[test]
    fn frequency_is_renamed_and_coerced() {
        let freq = sheet(
            &["Date", "Advertiser", "Unique Reach: Average Impression Frequency"],
            vec![
                vec![text("2024-01-05"), text("Acme"), CellValue::Number(4.0)],
                vec![text("2024-01-06"), text("Acme"), text("-")],
                vec![text("bad"), text("Acme"), CellValue::Number(3.0)],
                vec![text("2024-01-07"), text("Acme"), text("2.5")],
            ],
        );
        let (records, report) = load_frequency(freq).unwrap();
        assert_eq!(report.dropped_rows, 1);
        assert_eq!(
            records,
            vec![
                FrequencyRecord { date: ymd(2024, 1, 5), frequency: Some(4.0) },
                FrequencyRecord { date: ymd(2024, 1, 6), frequency: None },
                FrequencyRecord { date: ymd(2024, 1, 7), frequency: Some(2.5) },
            ]
        );
    }

    #[test]
    fn frequency_without_metric_column_is_a_schema_error() {
        let freq = sheet(&["Date", "Frequency"], vec![]);
        match load_frequency(freq) {
            Err(ReportError::MissingColumns { table, columns }) => {
                assert_eq!(table, "Frequency");
                assert_eq!(columns, vec![FREQUENCY_SOURCE_COL]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
