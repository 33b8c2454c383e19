use chrono::{Duration, NaiveDate, NaiveTime};

use crate::models::{AbsenceRecord, LeaveStatus};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Single-day absence filed `notice_days` before it starts, at 09:00 UTC.
pub fn absence(employee_id: &str, start: NaiveDate, notice_days: i64) -> AbsenceRecord {
    let filed = (start - Duration::days(notice_days))
        .and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
        .and_utc();
    AbsenceRecord {
        employee_id: employee_id.to_string(),
        employee_name: format!("Employee {employee_id}"),
        start_date: start,
        end_date: start,
        created_at: filed,
        status: LeaveStatus::Approved,
    }
}
