use chrono::NaiveDate;

use crate::calendar;
use crate::config::AnalyzerConfig;
use crate::models::{AbsenceRecord, NoShowPrediction};
use crate::normalize::{group_by_employee, EmployeeGroup};
use crate::patterns::is_short_notice;

pub const SHORT_NOTICE_FACTOR: &str = "Short-notice history";
pub const WEEKEND_EXTENSION_FACTOR: &str = "Weekend extension pattern";
pub const HIGH_FREQUENCY_FACTOR: &str = "High frequency";
pub const RECENT_SPIKE_FACTOR: &str = "Recent spike";

pub const PROACTIVE_RECOMMENDATION: &str = "Consider a proactive 1:1 to discuss support needs";
pub const MONITOR_RECOMMENDATION: &str = "Monitor and maintain regular check-ins";

/// Probability and triggered factors for one employee, before the emit gate.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskScore {
    pub probability: f64,
    pub factors: Vec<&'static str>,
}

pub fn score_employee(
    records: &[&AbsenceRecord],
    today: NaiveDate,
    config: &AnalyzerConfig,
) -> RiskScore {
    let recent_cutoff = calendar::days_before(today, config.recent_window_days);

    let short_notice = records.iter().filter(|r| is_short_notice(r, config)).count();
    let monday_friday = records
        .iter()
        .filter(|r| calendar::is_monday_or_friday(r.start_date))
        .count();
    let recent = records
        .iter()
        .filter(|r| r.start_date >= recent_cutoff)
        .count();

    let rules = [
        (
            short_notice >= config.short_notice_trigger,
            config.short_notice_increment,
            SHORT_NOTICE_FACTOR,
        ),
        (
            monday_friday >= config.cluster_trigger,
            config.weekend_extension_increment,
            WEEKEND_EXTENSION_FACTOR,
        ),
        (
            records.len() >= config.high_frequency_records,
            config.high_frequency_increment,
            HIGH_FREQUENCY_FACTOR,
        ),
        (
            recent >= config.recent_spike_records,
            config.recent_spike_increment,
            RECENT_SPIKE_FACTOR,
        ),
    ];

    let mut probability = config.base_probability;
    let mut factors = Vec::new();
    for (triggered, increment, label) in rules {
        if triggered {
            probability += increment;
            factors.push(label);
        }
    }

    RiskScore {
        probability: round_probability(probability.min(config.probability_cap)),
        factors,
    }
}

/// Flags employees likely to miss an upcoming Monday or Friday.
///
/// Sorted by probability, highest first.
pub fn predict_no_shows(
    records: &[AbsenceRecord],
    today: NaiveDate,
    config: &AnalyzerConfig,
) -> Vec<NoShowPrediction> {
    let predicted_date = calendar::next_monday_or_friday(today);

    let mut predictions: Vec<NoShowPrediction> = group_by_employee(records)
        .iter()
        .filter_map(|group| predict_for(group, predicted_date, today, config))
        .collect();

    predictions.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    predictions
}

fn predict_for(
    group: &EmployeeGroup<'_>,
    predicted_date: NaiveDate,
    today: NaiveDate,
    config: &AnalyzerConfig,
) -> Option<NoShowPrediction> {
    let score = score_employee(&group.records, today, config);
    if score.probability < config.min_emit_probability || score.factors.len() < config.min_factors
    {
        return None;
    }

    tracing::debug!(
        employee_id = group.employee_id,
        probability = score.probability,
        factors = score.factors.len(),
        "no-show risk flagged"
    );

    let recommendation = if score.probability > config.proactive_probability {
        PROACTIVE_RECOMMENDATION
    } else {
        MONITOR_RECOMMENDATION
    };

    Some(NoShowPrediction {
        employee_id: group.employee_id.to_string(),
        employee_name: group.employee_name.to_string(),
        predicted_date,
        probability: score.probability,
        factors: score.factors.iter().map(|f| f.to_string()).collect(),
        recommendation: recommendation.to_string(),
    })
}

/// Rounds to whole percentage points so sums such as 0.2 + 0.15 + 0.15 + 0.1
/// compare equal to the 0.6 threshold.
fn round_probability(value: f64) -> f64 {
    ((value * 100.0).round() / 100.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{absence, date};

    // Today is Friday 2026-10-16.
    fn today() -> NaiveDate {
        date(2026, 10, 16)
    }

    fn refs(records: &[AbsenceRecord]) -> Vec<&AbsenceRecord> {
        records.iter().collect()
    }

    #[test]
    fn below_threshold_employee_keeps_base_probability() {
        // 2 short-notice, 2 Monday/Friday, 3 records, none recent.
        let records = vec![
            absence("e1", date(2026, 6, 1), 1),  // Monday, short notice
            absence("e1", date(2026, 6, 10), 0), // Wednesday, short notice
            absence("e1", date(2026, 7, 3), 20), // Friday
        ];
        let score = score_employee(&refs(&records), today(), &AnalyzerConfig::default());
        assert_eq!(score.probability, 0.2);
        assert!(score.factors.is_empty());
        assert!(predict_no_shows(&records, today(), &AnalyzerConfig::default()).is_empty());
    }

    #[test]
    fn single_large_factor_never_emits() {
        let records = vec![
            absence("e1", date(2026, 6, 1), 20),
            absence("e1", date(2026, 6, 5), 20),
            absence("e1", date(2026, 6, 8), 20),
        ];
        let score = score_employee(&refs(&records), today(), &AnalyzerConfig::default());
        assert_eq!(score.probability, 0.4);
        assert_eq!(score.factors, vec![WEEKEND_EXTENSION_FACTOR]);
        assert!(predict_no_shows(&records, today(), &AnalyzerConfig::default()).is_empty());
    }

    #[test]
    fn two_factors_emit_with_monitor_recommendation() {
        // Three Monday/Friday starts, two of them within 30 days.
        let records = vec![
            absence("e1", date(2026, 6, 1), 20),
            absence("e1", date(2026, 10, 2), 20),
            absence("e1", date(2026, 10, 12), 20),
        ];
        let predictions = predict_no_shows(&records, today(), &AnalyzerConfig::default());
        assert_eq!(predictions.len(), 1);
        let prediction = &predictions[0];
        assert_eq!(prediction.probability, 0.5);
        assert_eq!(
            prediction.factors,
            vec![WEEKEND_EXTENSION_FACTOR.to_string(), RECENT_SPIKE_FACTOR.to_string()]
        );
        assert_eq!(prediction.recommendation, MONITOR_RECOMMENDATION);
        // Friday today is itself a valid prediction date.
        assert_eq!(prediction.predicted_date, today());
    }

    #[test]
    fn sixty_percent_stays_on_monitor() {
        // Short notice + high frequency + recent, on midweek days only.
        let records: Vec<AbsenceRecord> = [
            date(2026, 5, 5),
            date(2026, 6, 9),
            date(2026, 7, 14),
            date(2026, 8, 11),
            date(2026, 10, 6),
            date(2026, 10, 14),
        ]
        .into_iter()
        .map(|start| absence("e1", start, 1))
        .collect();
        let predictions = predict_no_shows(&records, today(), &AnalyzerConfig::default());
        assert_eq!(predictions[0].probability, 0.6);
        assert_eq!(predictions[0].recommendation, MONITOR_RECOMMENDATION);
    }

    #[test]
    fn all_factors_cap_at_ninety_percent() {
        let records: Vec<AbsenceRecord> = [
            date(2026, 6, 1),
            date(2026, 6, 5),
            date(2026, 7, 6),
            date(2026, 8, 7),
            date(2026, 10, 2),
            date(2026, 10, 12),
        ]
        .into_iter()
        .map(|start| absence("e1", start, 0))
        .collect();
        let score = score_employee(&refs(&records), today(), &AnalyzerConfig::default());
        assert_eq!(score.factors.len(), 4);
        assert_eq!(score.probability, 0.8);

        let config = AnalyzerConfig {
            base_probability: 0.4,
            ..AnalyzerConfig::default()
        };
        let score = score_employee(&refs(&records), today(), &config);
        assert_eq!(score.probability, 0.9);
        let predictions = predict_no_shows(&records, today(), &config);
        assert_eq!(predictions[0].recommendation, PROACTIVE_RECOMMENDATION);
    }

    #[test]
    fn predictions_sorted_by_probability_and_bounded() {
        let mut records = vec![
            absence("mid", date(2026, 6, 1), 20),
            absence("mid", date(2026, 10, 2), 20),
            absence("mid", date(2026, 10, 12), 20),
        ];
        records.extend(
            [
                date(2026, 6, 1),
                date(2026, 6, 5),
                date(2026, 7, 6),
                date(2026, 8, 7),
                date(2026, 10, 2),
                date(2026, 10, 12),
            ]
            .into_iter()
            .map(|start| absence("top", start, 0)),
        );

        let predictions = predict_no_shows(&records, today(), &AnalyzerConfig::default());
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].employee_id, "top");
        assert!(predictions
            .windows(2)
            .all(|w| w[0].probability >= w[1].probability));
        assert!(predictions
            .iter()
            .all(|p| (0.0..=0.9).contains(&p.probability) && p.factors.len() >= 2));
    }

    #[test]
    fn recent_window_includes_its_first_day() {
        let config = AnalyzerConfig::default();

        // 2026-09-16 is exactly 30 days before today.
        let records = vec![
            absence("e1", date(2026, 9, 16), 20),
            absence("e1", date(2026, 10, 14), 20),
        ];
        let score = score_employee(&refs(&records), today(), &config);
        assert_eq!(score.factors, vec![RECENT_SPIKE_FACTOR]);

        // 2026-09-15 is 31 days back and falls outside.
        let records = vec![
            absence("e1", date(2026, 9, 15), 20),
            absence("e1", date(2026, 10, 14), 20),
        ];
        let score = score_employee(&refs(&records), today(), &config);
        assert!(score.factors.is_empty());
    }

    #[test]
    fn short_notice_edge_is_one_full_day() {
        let config = AnalyzerConfig::default();
        let filed_days_before = |start: NaiveDate, days: i64| {
            let mut record = absence("e1", start, 0);
            record.created_at = (start - chrono::Duration::days(days))
                .and_time(chrono::NaiveTime::MIN)
                .and_utc();
            record
        };
        let starts = [date(2026, 6, 9), date(2026, 7, 14), date(2026, 8, 11)];

        let one_day: Vec<AbsenceRecord> =
            starts.iter().map(|&start| filed_days_before(start, 1)).collect();
        assert_eq!(calendar::days_between(one_day[0].created_at, one_day[0].start_date), 1);
        assert!(one_day.iter().all(|r| is_short_notice(r, &config)));
        let score = score_employee(&refs(&one_day), today(), &config);
        assert_eq!(score.factors, vec![SHORT_NOTICE_FACTOR]);

        let two_days: Vec<AbsenceRecord> =
            starts.iter().map(|&start| filed_days_before(start, 2)).collect();
        assert_eq!(calendar::days_between(two_days[0].created_at, two_days[0].start_date), 2);
        assert!(two_days.iter().all(|r| !is_short_notice(r, &config)));
        let score = score_employee(&refs(&two_days), today(), &config);
        assert!(score.factors.is_empty());
    }

    #[test]
    fn oversized_recent_window_does_not_panic() {
        let config: AnalyzerConfig =
            serde_json::from_str(r#"{ "recent_window_days": 1000000000 }"#).unwrap();
        let records = vec![
            absence("e1", date(2026, 6, 1), 20),
            absence("e1", date(2026, 6, 5), 20),
            absence("e1", date(2026, 6, 8), 20),
        ];
        let predictions = predict_no_shows(&records, today(), &config);
        // Every record is recent under an unbounded window.
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].probability, 0.5);
    }

    #[test]
    fn predicted_date_scans_forward_from_today() {
        let records = vec![
            absence("e1", date(2026, 6, 1), 20),
            absence("e1", date(2026, 10, 2), 20),
            absence("e1", date(2026, 10, 12), 20),
        ];
        // Saturday 2026-10-17 rolls to Monday 2026-10-19.
        let predictions =
            predict_no_shows(&records, date(2026, 10, 17), &AnalyzerConfig::default());
        assert_eq!(predictions[0].predicted_date, date(2026, 10, 19));
    }

    #[test]
    fn no_records_no_predictions() {
        assert!(predict_no_shows(&[], today(), &AnalyzerConfig::default()).is_empty());
    }
}
