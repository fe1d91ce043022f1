// Reporting window: observed min/max date, shifted per region, plus the
// "Jan 5 - 11" style label used in the preview title and the filename.
use crate::error::{ReportError, Result};
use crate::types::{DateRange, Region};
use chrono::{Datelike, Days, NaiveDate};
use tracing::info;

impl DateRange {
    /// Build the window from the parsed weekly dates.
    ///
    /// The US weekly export stamps each row one day ahead of the reporting
    /// day, so both ends move back a day for US clients. An empty set of dates
    /// is fatal: there is no window to report on.
    pub fn from_dates<I>(dates: I, region: Region) -> Result<DateRange>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut bounds: Option<(NaiveDate, NaiveDate)> = None;
        for d in dates {
            bounds = Some(match bounds {
                None => (d, d),
                Some((lo, hi)) => (lo.min(d), hi.max(d)),
            });
        }
        let (raw_start, raw_end) = bounds.ok_or(ReportError::NoValidDates)?;

        let shift = Days::new(region.shift_days());
        let start = raw_start
            .checked_sub_days(shift)
            .ok_or(ReportError::DateOutOfRange(raw_start))?;
        let end = raw_end
            .checked_sub_days(shift)
            .ok_or(ReportError::DateOutOfRange(raw_end))?;

        let label = format_label(start, end);
        info!(%region, %raw_start, %raw_end, %start, %end, label = %label, "date window");
        Ok(DateRange { start, end, label })
    }
}

/// "Jan 5 - 11" within one month, "Jan 28 - Feb 3" across months.
pub fn format_label(start: NaiveDate, end: NaiveDate) -> String {
    if start.year() == end.year() && start.month() == end.month() {
        format!("{} - {}", start.format("%b %-d"), end.format("%-d"))
    } else {
        format!("{} - {}", start.format("%b %-d"), end.format("%b %-d"))
    }
}
