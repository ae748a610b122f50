//! Tunable engine heuristics
//!
//! Several inputs to the scoring pipeline are placeholder heuristics rather
//! than measured quantities. They live here as named, overridable policy
//! values so they can be swapped without touching the core algorithms:
//! - expected reading density (completeness denominator)
//! - assumed battery health when no telemetry is available
//! - conflict bucketing window and the naive source-selection strategy

use crate::types::Reading;

/// Assumed readings per day used as the completeness denominator.
/// A single constant for all metric types; the product has not decided
/// whether density should vary per metric.
pub const DEFAULT_EXPECTED_READINGS_PER_DAY: f64 = 10.0;

/// Battery health reported when the device exposes no battery telemetry.
/// An assumption, not a measurement.
pub const DEFAULT_BATTERY_HEALTH: f64 = 85.0;

/// Width of the fixed conflict-detection buckets in minutes
pub const DEFAULT_CONFLICT_WINDOW_MINUTES: i64 = 30;

/// Confidence attached to the suggested source of a conflict
pub const DEFAULT_SOURCE_CONFIDENCE: f64 = 0.7;

/// Strategy for picking which source to trust in a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSelection {
    /// Keep whichever source reported first within the window.
    /// A naive placeholder, not a learned ranking.
    FirstReported,
}

/// Overridable heuristics consumed by the scoring pipeline
#[derive(Debug, Clone)]
pub struct EnginePolicy {
    /// Completeness denominator: expected readings per day, all metrics
    pub expected_readings_per_day: f64,
    /// Battery health placeholder when no telemetry exists (0-100)
    pub assumed_battery_health: f64,
    /// Conflict bucket width in minutes
    pub conflict_window_minutes: i64,
    /// Confidence attached to a conflict's suggested source (0-1)
    pub suggested_source_confidence: f64,
    /// How the suggested source of a conflict is chosen
    pub source_selection: SourceSelection,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            expected_readings_per_day: DEFAULT_EXPECTED_READINGS_PER_DAY,
            assumed_battery_health: DEFAULT_BATTERY_HEALTH,
            conflict_window_minutes: DEFAULT_CONFLICT_WINDOW_MINUTES,
            suggested_source_confidence: DEFAULT_SOURCE_CONFIDENCE,
            source_selection: SourceSelection::FirstReported,
        }
    }
}

impl EnginePolicy {
    /// Pick the source to trust among a conflicting group.
    /// Readings arrive sorted oldest to newest within the group.
    pub fn suggest_source<'a>(&self, group: &'a [&Reading]) -> Option<&'a str> {
        match self.source_selection {
            SourceSelection::FirstReported => group.first().map(|r| r.source.as_str()),
        }
    }

    /// Fixed rationale string matching the selection strategy
    pub fn selection_rationale(&self) -> &'static str {
        match self.source_selection {
            SourceSelection::FirstReported => {
                "most reliable device based on historical accuracy"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_reading(source: &str) -> Reading {
        Reading {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            metric_type: "heart_rate".to_string(),
            value: 72.0,
            unit: "bpm".to_string(),
            timestamp: Utc::now(),
            source: source.to_string(),
        }
    }

    #[test]
    fn test_first_reported_selection() {
        let policy = EnginePolicy::default();
        let a = make_reading("apple_watch");
        let b = make_reading("manual");
        let group = vec![&a, &b];

        assert_eq!(policy.suggest_source(&group), Some("apple_watch"));
        assert_eq!(policy.suggest_source(&[]), None);
    }

    #[test]
    fn test_defaults() {
        let policy = EnginePolicy::default();
        assert_eq!(policy.expected_readings_per_day, 10.0);
        assert_eq!(policy.conflict_window_minutes, 30);
        assert_eq!(policy.suggested_source_confidence, 0.7);
    }
}
