use std::fmt::Write;

use chrono::NaiveDate;

use crate::insights::TeamInsights;

pub fn build_report(team_label: &str, since: NaiveDate, insights: &TeamInsights) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Team Absence Insights");
    let _ = writeln!(
        output,
        "Generated for {} on {} ({} absences since {}, team of {})",
        team_label, insights.generated_for, insights.record_count, since, insights.team_size
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Team Alerts");

    if insights.alerts.is_empty() {
        let _ = writeln!(output, "No team-level alerts for this period.");
    } else {
        for alert in insights.alerts.iter() {
            let _ = writeln!(
                output,
                "- [{}] {}: {} (affects {}). {}",
                alert.severity.label(),
                alert.title,
                alert.description,
                alert.affected_count,
                alert.suggested_action
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Absence Patterns");

    if insights.patterns.is_empty() {
        let _ = writeln!(output, "No recurring absence patterns detected.");
    } else {
        for pattern in insights.patterns.iter() {
            let _ = writeln!(
                output,
                "- {} ({} risk) {}: {}, most recently {}",
                pattern.employee_name,
                pattern.risk_level.label(),
                pattern.pattern_kind.label(),
                pattern.detail_text,
                pattern.last_occurrence
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## No-Show Watchlist");

    if insights.predictions.is_empty() {
        let _ = writeln!(output, "No team members flagged for an upcoming no-show.");
    } else {
        for prediction in insights.predictions.iter() {
            let _ = writeln!(
                output,
                "- {} on {}: {:.0}% likely ({}). {}",
                prediction.employee_name,
                prediction.predicted_date,
                prediction.probability * 100.0,
                prediction.factors.join(", "),
                prediction.recommendation
            );
        }
    }

    output
}

/// Short console summary used by `analyze`.
pub fn summary_lines(insights: &TeamInsights, limit: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for alert in insights.alerts.iter() {
        lines.push(format!(
            "alert [{}] {}: {}",
            alert.severity.label(),
            alert.title,
            alert.description
        ));
    }
    for pattern in insights.patterns.iter().take(limit) {
        lines.push(format!(
            "pattern {} ({}, {} risk): {}",
            pattern.employee_name,
            pattern.pattern_kind.label(),
            pattern.risk_level.label(),
            pattern.detail_text
        ));
    }
    for prediction in insights.predictions.iter().take(limit) {
        lines.push(format!(
            "watch {} on {} at {:.0}%: {}",
            prediction.employee_name,
            prediction.predicted_date,
            prediction.probability * 100.0,
            prediction.recommendation
        ));
    }

    lines
}
