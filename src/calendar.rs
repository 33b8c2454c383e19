use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc, Weekday};

pub fn is_monday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Mon
}

pub fn is_friday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Fri
}

pub fn is_monday_or_friday(date: NaiveDate) -> bool {
    is_monday(date) || is_friday(date)
}

/// Whole days from the filing timestamp to midnight UTC of `start`,
/// truncated toward zero. Negative when the request was filed late.
pub fn days_between(created_at: DateTime<Utc>, start: NaiveDate) -> i64 {
    let start_at = start.and_time(NaiveTime::MIN).and_utc();
    (start_at - created_at).num_days()
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn previous_month_start(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_sub_months(Months::new(1))
        .unwrap_or(NaiveDate::MIN)
}

pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .unwrap_or(NaiveDate::MAX)
}

/// `today` minus `days`, clamped to the earliest representable date.
pub fn days_before(today: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| today.checked_sub_signed(delta))
        .unwrap_or(NaiveDate::MIN)
}

pub fn months_back(today: NaiveDate, months: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

/// First Monday or Friday on or after `today`.
pub fn next_monday_or_friday(today: NaiveDate) -> NaiveDate {
    let mut candidate = today;
    for _ in 0..7 {
        if is_monday_or_friday(candidate) {
            return candidate;
        }
        candidate += Duration::days(1);
    }
    candidate
}
