//! Pattern, no-show risk and trend heuristics over a manager's team leave.

pub mod calendar;
pub mod config;
pub mod db;
pub mod insights;
pub mod models;
pub mod normalize;
pub mod patterns;
pub mod report;
pub mod risk;
pub mod trends;

#[cfg(test)]
mod test_support;

pub use config::AnalyzerConfig;
pub use insights::TeamInsights;
