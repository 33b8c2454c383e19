use std::collections::HashSet;

use chrono::NaiveDate;

use crate::calendar;
use crate::config::AnalyzerConfig;
use crate::models::{AbsenceRecord, AlertType, Severity, TrendAlert, TrendDirection};

/// Month-over-month counts the trend checks are evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthWindows {
    pub current_month_count: usize,
    pub last_month_count: usize,
    pub unique_absent_this_month: usize,
    pub weekend_starts: usize,
    pub weekend_employees: usize,
}

impl MonthWindows {
    pub fn collect(records: &[AbsenceRecord], today: NaiveDate) -> Self {
        let this_month = calendar::month_start(today);
        let next_month = calendar::next_month_start(today);
        let last_month = calendar::previous_month_start(today);

        let mut windows = Self::default();
        let mut absent_this_month: HashSet<&str> = HashSet::new();
        let mut weekend_employees: HashSet<&str> = HashSet::new();

        for record in records {
            let start = record.start_date;
            if start >= this_month && start < next_month {
                windows.current_month_count += 1;
                absent_this_month.insert(&record.employee_id);
            } else if start >= last_month && start < this_month {
                windows.last_month_count += 1;
            }

            if start >= last_month && calendar::is_monday_or_friday(start) {
                windows.weekend_starts += 1;
                weekend_employees.insert(&record.employee_id);
            }
        }

        windows.unique_absent_this_month = absent_this_month.len();
        windows.weekend_employees = weekend_employees.len();
        windows
    }
}

/// Team-level alerts, most severe first. Equal severities keep the order
/// coverage, spike, weekend pattern, improvement.
pub fn analyze_team_trends(
    records: &[AbsenceRecord],
    team_size: usize,
    today: NaiveDate,
    config: &AnalyzerConfig,
) -> Vec<TrendAlert> {
    let windows = MonthWindows::collect(records, today);
    tracing::debug!(?windows, team_size, "collected month windows");

    let mut alerts: Vec<TrendAlert> = [
        coverage_alert(&windows, team_size, config),
        spike_alert(&windows, config),
        weekend_pattern_alert(&windows, config),
        improvement_alert(&windows, config),
    ]
    .into_iter()
    .flatten()
    .collect();

    alerts.sort_by_key(|alert| alert.severity.rank());
    alerts
}

pub fn coverage_percent(team_size: usize, unique_absent: usize) -> f64 {
    if team_size == 0 {
        return 100.0;
    }
    team_size.saturating_sub(unique_absent) as f64 / team_size as f64 * 100.0
}

fn coverage_alert(
    windows: &MonthWindows,
    team_size: usize,
    config: &AnalyzerConfig,
) -> Option<TrendAlert> {
    if team_size < config.coverage_min_team {
        return None;
    }
    let coverage = coverage_percent(team_size, windows.unique_absent_this_month);
    if coverage >= config.coverage_warning_percent {
        return None;
    }

    let severity = if coverage < config.coverage_critical_percent {
        Severity::Critical
    } else {
        Severity::Warning
    };
    let available = team_size.saturating_sub(windows.unique_absent_this_month);

    Some(TrendAlert {
        alert_type: AlertType::Coverage,
        title: "Team coverage at risk".to_string(),
        description: format!(
            "Only {coverage:.0}% of the team ({available} of {team_size}) has no absence this month"
        ),
        severity,
        affected_count: windows.unique_absent_this_month,
        trend: TrendDirection::Down,
        action_required: true,
        suggested_action: "Review overlapping leave and arrange cover before approving more requests"
            .to_string(),
    })
}

fn spike_alert(windows: &MonthWindows, config: &AnalyzerConfig) -> Option<TrendAlert> {
    let current = windows.current_month_count;
    let last = windows.last_month_count as f64;
    if current < config.spike_min_count || current as f64 <= last * config.spike_warning_ratio {
        return None;
    }

    let severity = if current as f64 > last * config.spike_critical_ratio {
        Severity::Critical
    } else {
        Severity::Warning
    };

    Some(TrendAlert {
        alert_type: AlertType::Spike,
        title: "Absence spike this month".to_string(),
        description: format!(
            "{current} absences this month compared with {} last month",
            windows.last_month_count
        ),
        severity,
        affected_count: current,
        trend: TrendDirection::Up,
        action_required: true,
        suggested_action: "Check in with the team for workload or wellbeing pressures".to_string(),
    })
}

fn weekend_pattern_alert(windows: &MonthWindows, config: &AnalyzerConfig) -> Option<TrendAlert> {
    if windows.weekend_starts < config.weekend_pattern_min_count {
        return None;
    }

    Some(TrendAlert {
        alert_type: AlertType::Pattern,
        title: "Weekend extension pattern".to_string(),
        description: format!(
            "{} absences since last month started on a Monday or Friday",
            windows.weekend_starts
        ),
        severity: Severity::Warning,
        affected_count: windows.weekend_employees,
        trend: TrendDirection::Stable,
        action_required: true,
        suggested_action: "Discuss flexible scheduling options in upcoming 1:1s".to_string(),
    })
}

fn improvement_alert(windows: &MonthWindows, config: &AnalyzerConfig) -> Option<TrendAlert> {
    let current = windows.current_month_count;
    let last = windows.last_month_count;
    if last < config.improvement_min_last_month
        || current as f64 >= last as f64 * config.improvement_ratio
    {
        return None;
    }

    Some(TrendAlert {
        alert_type: AlertType::Threshold,
        title: "Absences trending down".to_string(),
        description: format!("{current} absences this month, down from {last} last month"),
        severity: Severity::Info,
        affected_count: current,
        trend: TrendDirection::Down,
        action_required: false,
        suggested_action: "Recognise the team and keep current practices in place".to_string(),
    })
}
