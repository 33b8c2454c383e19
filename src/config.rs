use std::path::Path;

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

/// Ten years; longer lookbacks are outside any leave history we fetch.
pub const MAX_RECENT_WINDOW_DAYS: i64 = 3650;

/// Every tunable threshold used by the pattern, risk and trend analyzers.
///
/// Loaded from JSON; keys that are omitted keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Employees with fewer records are not scanned for patterns.
    pub min_records_for_pattern: usize,
    /// Monday or Friday starts needed to report a cluster.
    pub cluster_trigger: usize,
    pub short_notice_trigger: usize,
    /// A request filed this many days (or fewer) before it starts is short notice.
    pub short_notice_max_days: i64,
    pub medium_risk_frequency: usize,
    pub high_risk_frequency: usize,

    pub base_probability: f64,
    pub short_notice_increment: f64,
    pub weekend_extension_increment: f64,
    pub high_frequency_records: usize,
    pub high_frequency_increment: f64,
    pub recent_window_days: i64,
    pub recent_spike_records: usize,
    pub recent_spike_increment: f64,
    pub probability_cap: f64,
    pub min_emit_probability: f64,
    pub min_factors: usize,
    /// Above this probability the recommendation escalates to a 1:1.
    pub proactive_probability: f64,

    pub coverage_min_team: usize,
    pub coverage_warning_percent: f64,
    pub coverage_critical_percent: f64,
    pub spike_min_count: usize,
    pub spike_warning_ratio: f64,
    pub spike_critical_ratio: f64,
    pub weekend_pattern_min_count: usize,
    pub improvement_min_last_month: usize,
    pub improvement_ratio: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_records_for_pattern: 2,
            cluster_trigger: 3,
            short_notice_trigger: 3,
            short_notice_max_days: 1,
            medium_risk_frequency: 4,
            high_risk_frequency: 5,
            base_probability: 0.20,
            short_notice_increment: 0.15,
            weekend_extension_increment: 0.20,
            high_frequency_records: 6,
            high_frequency_increment: 0.15,
            recent_window_days: 30,
            recent_spike_records: 2,
            recent_spike_increment: 0.10,
            probability_cap: 0.90,
            min_emit_probability: 0.40,
            min_factors: 2,
            proactive_probability: 0.60,
            coverage_min_team: 3,
            coverage_warning_percent: 70.0,
            coverage_critical_percent: 50.0,
            spike_min_count: 3,
            spike_warning_ratio: 1.3,
            spike_critical_ratio: 1.5,
            weekend_pattern_min_count: 5,
            improvement_min_last_month: 3,
            improvement_ratio: 0.7,
        }
    }
}

impl AnalyzerConfig {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid analyzer config in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.cluster_trigger <= self.medium_risk_frequency
                && self.short_notice_trigger <= self.medium_risk_frequency,
            "pattern triggers must not exceed medium_risk_frequency"
        );
        ensure!(
            self.medium_risk_frequency <= self.high_risk_frequency,
            "medium_risk_frequency ({}) exceeds high_risk_frequency ({})",
            self.medium_risk_frequency,
            self.high_risk_frequency
        );
        ensure!(
            (0.0..=1.0).contains(&self.probability_cap),
            "probability_cap must be within [0, 1], got {}",
            self.probability_cap
        );
        ensure!(
            (0.0..=1.0).contains(&self.base_probability),
            "base_probability must be within [0, 1], got {}",
            self.base_probability
        );
        ensure!(
            self.coverage_critical_percent < self.coverage_warning_percent,
            "coverage_critical_percent must be below coverage_warning_percent"
        );
        ensure!(
            self.spike_warning_ratio <= self.spike_critical_ratio,
            "spike_critical_ratio must be at least spike_warning_ratio"
        );
        ensure!(
            (0..=MAX_RECENT_WINDOW_DAYS).contains(&self.recent_window_days),
            "recent_window_days must be within [0, {MAX_RECENT_WINDOW_DAYS}], got {}",
            self.recent_window_days
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AnalyzerConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config: AnalyzerConfig =
            serde_json::from_str(r#"{ "cluster_trigger": 2, "spike_warning_ratio": 1.2 }"#)
                .unwrap();
        assert_eq!(config.cluster_trigger, 2);
        assert_eq!(config.spike_warning_ratio, 1.2);
        assert_eq!(config.high_risk_frequency, 5);
        assert_eq!(config.probability_cap, 0.9);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed = serde_json::from_str::<AnalyzerConfig>(r#"{ "cluster_trigerr": 2 }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn inverted_bands_fail_validation() {
        let config = AnalyzerConfig {
            medium_risk_frequency: 6,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalyzerConfig {
            coverage_critical_percent: 80.0,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalyzerConfig {
            probability_cap: 1.5,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn recent_window_must_be_bounded() {
        let config: AnalyzerConfig =
            serde_json::from_str(r#"{ "recent_window_days": 1000000000 }"#).unwrap();
        assert!(config.validate().is_err());

        let config = AnalyzerConfig {
            recent_window_days: -1,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalyzerConfig {
            recent_window_days: MAX_RECENT_WINDOW_DAYS,
            ..AnalyzerConfig::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn demo_thresholds_parse() {
        let config: AnalyzerConfig =
            serde_json::from_str(include_str!("../demos/thresholds.json")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.high_frequency_records, 5);
        assert_eq!(config.coverage_warning_percent, 75.0);
    }
}
