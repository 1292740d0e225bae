use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, TimeZone};

/// Day of month on which a billing cycle starts.
pub const CYCLE_ANCHOR_DAY: u32 = 28;

/// Start of the billing cycle containing `reference`, at local midnight in
/// the reference's own time zone.
///
/// After the 28th the cycle started on the 28th of the same month; on or
/// before the 28th it started on the 28th of the previous month.
pub fn cycle_start<Tz: TimeZone>(reference: &DateTime<Tz>) -> DateTime<Tz> {
    let date = cycle_start_date(reference.date_naive());
    local_midnight(&reference.timezone(), date)
}

fn cycle_start_date(date: NaiveDate) -> NaiveDate {
    let day = date.day();
    if day > CYCLE_ANCHOR_DAY {
        return date - TimeDelta::days(i64::from(day - CYCLE_ANCHOR_DAY));
    }

    // Every month has at least 28 days, so stepping back from the last day
    // of the previous month always lands on its 28th.
    let prev_month_end = date - TimeDelta::days(i64::from(day));
    prev_month_end - TimeDelta::days(i64::from(prev_month_end.day() - CYCLE_ANCHOR_DAY))
}

/// Midnight of `date` in `tz`. Falls back to the UTC reading when local
/// midnight is skipped by a DST transition.
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}
