use crate::error::{ReportError, Result};
use crate::types::{CellValue, MergedTable, Report, DATA_SHEET};
use crate::util::{format_int, format_number, format_plain};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style};
use tracing::info;

const DATE_FORMAT: &str = "yyyy/mm/dd";
const CTR_FORMAT: &str = "0.00%";
const REACH_FORMAT: &str = "#,##0";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const WIDTH_PADDING: usize = 2;

pub fn output_filename(report_number: &str, client: &str, date_range: &str) -> String {
    format!("({}) {} {}.xlsx", report_number, client, date_range)
}

/// Where the workbook lands on disk. Path separators in the name would
/// point outside `dir`, so they are replaced.
pub fn output_path(dir: &Path, filename: &str) -> PathBuf {
    dir.join(filename.replace(['/', '\\'], "-"))
}

#[derive(Clone, Copy, PartialEq)]
enum ColumnKind {
    Date,
    Ctr,
    Reach,
    Other,
}

fn column_kind(table: &MergedTable, col: usize) -> ColumnKind {
    if col == table.date_col {
        ColumnKind::Date
    } else if col == table.ctr_col {
        ColumnKind::Ctr
    } else if col == table.reach_col() {
        ColumnKind::Reach
    } else {
        ColumnKind::Other
    }
}

/// Preview text of one cell, mirroring the number formats of the workbook.
fn display_cell(kind: ColumnKind, cell: &CellValue) -> String {
    match (kind, cell) {
        (_, CellValue::Empty) => String::new(),
        (ColumnKind::Date, CellValue::Date(d)) => d.format("%Y/%m/%d").to_string(),
        (ColumnKind::Ctr, CellValue::Number(n)) => format!("{}%", format_number(n * 100.0, 2)),
        (ColumnKind::Reach, CellValue::Number(n)) => format_number(*n, 0),
        (_, CellValue::Number(n)) => format_plain(*n),
        (_, other) => other.raw_text(),
    }
}

/// Render the merged table as a Markdown-style grid. `max_rows` limits the
/// number of data rows shown.
pub fn render_preview(table: &MergedTable, max_rows: Option<usize>) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.headers.iter().cloned());
    let shown = max_rows.unwrap_or(table.records.len());
    for rec in table.records.iter().take(shown) {
        let row = MergedTable::row_cells(rec)
            .iter()
            .enumerate()
            .map(|(col, cell)| display_cell(column_kind(table, col), cell))
            .collect::<Vec<_>>();
        builder.push_record(row);
    }
    let mut grid = builder.build();
    grid.with(Style::markdown());
    grid.to_string()
}

pub fn print_preview(report: &Report, max_rows: Option<usize>) {
    println!(
        "Processing dataset... ({} weekly rows loaded, {} kept; {} frequency rows loaded, {} kept)",
        format_int(report.weekly_load.total_rows),
        format_int(report.weekly_load.kept_rows),
        format_int(report.frequency_load.total_rows),
        format_int(report.frequency_load.kept_rows)
    );
    println!(
        "Reporting window: {} to {}",
        report.range.start.format("%Y/%m/%d"),
        report.range.end.format("%Y/%m/%d")
    );
    println!("\nPreview - {} ({})\n", report.client, report.range.label);
    if report.table.records.is_empty() {
        println!("(no rows)\n");
        return;
    }
    println!("{}\n", render_preview(&report.table, max_rows));
    let total = report.table.records.len();
    if let Some(n) = max_rows.filter(|n| *n < total) {
        println!("(showing {} of {} rows)", format_int(n), format_int(total));
    }
    let with_reach = report.table.records.iter().filter(|r| r.reach.is_some()).count();
    println!(
        "{} weekly rows ({} skipped for unparseable dates), {} with Reach.\n",
        format_int(report.weekly_load.kept_rows),
        format_int(report.weekly_load.dropped_rows),
        format_int(with_reach)
    );
}

/// Number of characters of the widest value in each column, header included.
pub fn column_widths(table: &MergedTable) -> Vec<usize> {
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for rec in &table.records {
        for (col, cell) in MergedTable::row_cells(rec).iter().enumerate() {
            if let Some(w) = widths.get_mut(col) {
                *w = (*w).max(cell.raw_text().chars().count());
            }
        }
    }
    widths
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    format: Option<&Format>,
    datetime_format: &Format,
) -> Result<()> {
    match (cell, format) {
        (CellValue::Empty, _) => {}
        (CellValue::Number(n), Some(f)) => {
            sheet.write_number_with_format(row, col, *n, f)?;
        }
        (CellValue::Number(n), None) => {
            sheet.write_number(row, col, *n)?;
        }
        (CellValue::Text(s), Some(f)) => {
            sheet.write_string_with_format(row, col, s, f)?;
        }
        (CellValue::Text(s), None) => {
            sheet.write_string(row, col, s)?;
        }
        (CellValue::Bool(b), _) => {
            sheet.write_boolean(row, col, *b)?;
        }
        (CellValue::Date(d), f) => {
            let f = f.unwrap_or(datetime_format);
            sheet.write_date_with_format(row, col, d, f)?;
        }
        (CellValue::DateTime(dt), f) => {
            let f = f.unwrap_or(datetime_format);
            sheet.write_datetime_with_format(row, col, dt, f)?;
        }
    }
    Ok(())
}

/// Build the output workbook in memory: a single "Data" sheet holding the
/// merged table with date, percentage and grouped-number formats applied.
pub fn render_workbook(table: &MergedTable) -> Result<Vec<u8>> {
    let header_format = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center);
    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let ctr_format = Format::new().set_num_format(CTR_FORMAT);
    let reach_format = Format::new().set_num_format(REACH_FORMAT);
    let datetime_format = Format::new().set_num_format(DATETIME_FORMAT);

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(DATA_SHEET)?;

    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    for (i, rec) in table.records.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, cell) in MergedTable::row_cells(rec).iter().enumerate() {
            let format = match column_kind(table, col) {
                ColumnKind::Date => Some(&date_format),
                ColumnKind::Ctr => Some(&ctr_format),
                ColumnKind::Reach => Some(&reach_format),
                ColumnKind::Other => None,
            };
            write_cell(sheet, row, col as u16, cell, format, &datetime_format)?;
        }
    }

    for (col, width) in column_widths(table).into_iter().enumerate() {
        sheet.set_column_width(col as u16, (width + WIDTH_PADDING) as f64)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Render the workbook and write it to `<dir>/<report.filename>`.
pub fn write_report(report: &Report, dir: &Path) -> Result<PathBuf> {
    let bytes = render_workbook(&report.table)?;
    let path = output_path(dir, &report.filename);
    std::fs::write(&path, bytes).map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "wrote workbook");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MergedRecord;
    use chrono::NaiveDate;

    fn table() -> MergedTable {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        MergedTable {
            headers: ["Date", "Impressions", "Click Rate (CTR)", "Campaign", "Frequency", "Reach"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            date_col: 0,
            ctr_col: 2,
            records: vec![
                MergedRecord {
                    cells: vec![
                        CellValue::Date(date),
                        CellValue::Number(1234567.0),
                        CellValue::Number(0.01234),
                        CellValue::Text("Spring Launch Prospecting".into()),
                    ],
                    frequency: Some(4.0),
                    reach: Some(308641.75),
                },
                MergedRecord {
                    cells: vec![
                        CellValue::Date(date),
                        CellValue::Empty,
                        CellValue::Text("n/a".into()),
                        CellValue::Empty,
                    ],
                    frequency: None,
                    reach: None,
                },
            ],
        }
    }

    #[test]
    fn filename_layout() {
        assert_eq!(output_filename("8", "Acme", "Jan 5 - 11"), "(8) Acme Jan 5 - 11.xlsx");
        assert_eq!(
            output_path(Path::new("out"), "(8) AC/DC Jan 5 - 11.xlsx"),
            Path::new("out").join("(8) AC-DC Jan 5 - 11.xlsx")
        );
    }

    #[test]
    fn preview_applies_display_formats() {
        let text = render_preview(&table(), None);
        assert!(text.contains("2024/01/05"), "{text}");
        assert!(text.contains("1.23%"), "{text}");
        assert!(text.contains("308,642"), "{text}");
        assert!(text.contains("1234567"), "{text}");
        assert!(text.contains("n/a"), "{text}");
    }

    #[test]
    fn preview_respects_row_limit() {
        let text = render_preview(&table(), Some(1));
        assert!(!text.contains("n/a"), "{text}");
    }

    #[test]
    fn widths_cover_header_and_values() {
        let widths = column_widths(&table());
        assert_eq!(widths[0], "2024-01-05".len());
        assert_eq!(widths[1], "Impressions".len());
        assert_eq!(widths[2], "Click Rate (CTR)".len());
        assert_eq!(widths[3], "Spring Launch Prospecting".len());
        assert_eq!(widths[5], "308641.75".len());
    }

    #[test]
    fn workbook_renders_to_a_zip_buffer() {
        let bytes = render_workbook(&table()).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
