use chrono::NaiveDate;

use crate::calendar;
use crate::config::AnalyzerConfig;
use crate::models::{AbsenceRecord, PatternKind, PatternResult, RiskLevel};
use crate::normalize::{group_by_employee, EmployeeGroup};

pub fn risk_level(frequency: usize, config: &AnalyzerConfig) -> RiskLevel {
    if frequency >= config.high_risk_frequency {
        RiskLevel::High
    } else if frequency >= config.medium_risk_frequency {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn is_short_notice(record: &AbsenceRecord, config: &AnalyzerConfig) -> bool {
    calendar::days_between(record.created_at, record.start_date) <= config.short_notice_max_days
}

/// Scans each employee for Monday/Friday clustering and short-notice bursts.
///
/// Results are ordered High, Medium, Low; within a level they keep employee
/// first-seen order and Monday, Friday, short-notice order.
pub fn detect_patterns(records: &[AbsenceRecord], config: &AnalyzerConfig) -> Vec<PatternResult> {
    let mut results: Vec<PatternResult> = group_by_employee(records)
        .iter()
        .filter(|group| group.records.len() >= config.min_records_for_pattern)
        .flat_map(|group| employee_patterns(group, config))
        .collect();

    results.sort_by_key(|result| result.risk_level);
    results
}

fn employee_patterns(group: &EmployeeGroup<'_>, config: &AnalyzerConfig) -> Vec<PatternResult> {
    let mut newest_first = group.records.clone();
    newest_first.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    let total = newest_first.len();

    let checks: [(PatternKind, usize, fn(&AbsenceRecord, &AnalyzerConfig) -> bool); 3] = [
        (PatternKind::MondayCluster, config.cluster_trigger, |r, _| {
            calendar::is_monday(r.start_date)
        }),
        (PatternKind::FridayCluster, config.cluster_trigger, |r, _| {
            calendar::is_friday(r.start_date)
        }),
        (PatternKind::ShortNotice, config.short_notice_trigger, is_short_notice),
    ];

    let mut results = Vec::new();
    for (kind, trigger, qualifies) in checks {
        let matching: Vec<NaiveDate> = newest_first
            .iter()
            .filter(|record| qualifies(record, config))
            .map(|record| record.start_date)
            .collect();

        let Some(&last_occurrence) = matching.first() else {
            continue;
        };
        let frequency = matching.len();
        if frequency < trigger {
            continue;
        }

        results.push(PatternResult {
            employee_id: group.employee_id.to_string(),
            employee_name: group.employee_name.to_string(),
            pattern_kind: kind,
            frequency,
            risk_level: risk_level(frequency, config),
            detail_text: detail_text(kind, frequency, total, config),
            last_occurrence,
        });
    }

    tracing::debug!(
        employee_id = group.employee_id,
        records = total,
        patterns = results.len(),
        "scanned employee absences"
    );
    results
}

fn detail_text(kind: PatternKind, frequency: usize, total: usize, config: &AnalyzerConfig) -> String {
    match kind {
        PatternKind::MondayCluster => {
            format!("{frequency} of {total} absences started on a Monday")
        }
        PatternKind::FridayCluster => {
            format!("{frequency} of {total} absences started on a Friday")
        }
        PatternKind::ShortNotice => format!(
            "{frequency} of {total} requests were filed {} day(s) or less before the leave started",
            config.short_notice_max_days
        ),
    }
}
