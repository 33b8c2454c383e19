use std::collections::HashMap;

use anyhow::{anyhow, ensure};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;

use crate::models::{AbsenceRecord, LeaveStatus};

/// A leave request as it arrives from an export, before any date parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveRow {
    pub employee_id: String,
    pub employee_name: String,
    pub start_date: String,
    pub end_date: String,
    pub created_at: String,
    pub status: String,
    #[serde(default)]
    pub employee_email: Option<String>,
    #[serde(default)]
    pub source_key: Option<String>,
}

#[derive(Debug, Default)]
pub struct NormalizedRecords {
    pub records: Vec<AbsenceRecord>,
    pub skipped: usize,
}

/// All of one employee's records, in their original relative order.
#[derive(Debug, Clone)]
pub struct EmployeeGroup<'a> {
    pub employee_id: &'a str,
    pub employee_name: &'a str,
    pub records: Vec<&'a AbsenceRecord>,
}

pub fn parse_row(row: &LeaveRow) -> anyhow::Result<AbsenceRecord> {
    let employee_id = row.employee_id.trim();
    ensure!(!employee_id.is_empty(), "missing employee_id");
    let start_date = parse_date(&row.start_date)
        .ok_or_else(|| anyhow!("unparsable start_date {:?}", row.start_date))?;
    let end_date = parse_date(&row.end_date)
        .ok_or_else(|| anyhow!("unparsable end_date {:?}", row.end_date))?;
    ensure!(
        end_date >= start_date,
        "end_date {end_date} precedes start_date {start_date}"
    );
    let created_at = parse_timestamp(&row.created_at)
        .ok_or_else(|| anyhow!("unparsable created_at {:?}", row.created_at))?;
    let status = LeaveStatus::parse(&row.status)
        .ok_or_else(|| anyhow!("unknown status {:?}", row.status))?;

    Ok(AbsenceRecord {
        employee_id: employee_id.to_string(),
        employee_name: row.employee_name.trim().to_string(),
        start_date,
        end_date,
        created_at,
        status,
    })
}

/// Parses every row, skipping (and logging) the ones that are malformed.
pub fn normalize_rows(rows: &[LeaveRow]) -> NormalizedRecords {
    let mut normalized = NormalizedRecords::default();

    for (index, row) in rows.iter().enumerate() {
        match parse_row(row) {
            Ok(record) => normalized.records.push(record),
            Err(err) => {
                tracing::warn!(row = index + 1, employee_id = %row.employee_id, %err, "skipping leave row");
                normalized.skipped += 1;
            }
        }
    }

    normalized
}

pub fn group_by_employee(records: &[AbsenceRecord]) -> Vec<EmployeeGroup<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<EmployeeGroup<'_>> = Vec::new();

    for record in records {
        let slot = *index.entry(record.employee_id.as_str()).or_insert_with(|| {
            groups.push(EmployeeGroup {
                employee_id: &record.employee_id,
                employee_name: &record.employee_name,
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record);
    }

    groups
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(value).map(|ts| ts.date_naive()))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}
