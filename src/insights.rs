use chrono::NaiveDate;
use serde::Serialize;

use crate::config::AnalyzerConfig;
use crate::models::{AbsenceRecord, NoShowPrediction, PatternResult, TrendAlert};
use crate::{patterns, risk, trends};

/// The three classified lists produced for one manager's team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamInsights {
    pub generated_for: NaiveDate,
    pub team_size: usize,
    pub record_count: usize,
    pub patterns: Vec<PatternResult>,
    pub predictions: Vec<NoShowPrediction>,
    pub alerts: Vec<TrendAlert>,
}

impl TeamInsights {
    pub fn compute(
        records: &[AbsenceRecord],
        team_size: usize,
        today: NaiveDate,
        config: &AnalyzerConfig,
    ) -> Self {
        let insights = Self {
            generated_for: today,
            team_size,
            record_count: records.len(),
            patterns: patterns::detect_patterns(records, config),
            predictions: risk::predict_no_shows(records, today, config),
            alerts: trends::analyze_team_trends(records, team_size, today, config),
        };

        tracing::info!(
            records = insights.record_count,
            team_size,
            patterns = insights.patterns.len(),
            predictions = insights.predictions.len(),
            alerts = insights.alerts.len(),
            "team absence analysis complete"
        );
        insights
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.predictions.is_empty() && self.alerts.is_empty()
    }
}
