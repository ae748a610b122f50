//! Outlier classification for individual readings
//!
//! One reading is classified against three checks, first match wins:
//! 1. Impossible: outside the metric's physically possible bounds
//! 2. Highly unlikely: possible but outside the plausible bounds
//! 3. Statistically inconsistent: z-score against the reading's own
//!    trailing history, only once enough history exists
//!
//! Metric types absent from the range tables skip checks 1 and 2 and are
//! treated as always plausible.

use crate::ranges;
use crate::stats;
use crate::types::{
    AnomalyKind, AnomalyRecord, ExpectedRange, Reading, Severity, Suggestion, SuggestionKind,
};

/// Minimum trailing history before the statistical check applies
pub const MIN_STATISTICAL_HISTORY: usize = 10;

/// Z-score above which a reading is statistically inconsistent
pub const Z_SCORE_THRESHOLD: f64 = 3.0;

/// Z-score above which an inconsistent reading escalates to high severity
pub const Z_SCORE_HIGH_SEVERITY: f64 = 4.0;

/// Bounds-only verdict, used where the statistical check must not apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsViolation {
    Impossible,
    HighlyUnlikely,
}

/// Classifier for flagging implausible or inconsistent readings
pub struct OutlierClassifier;

impl OutlierClassifier {
    /// Classify one reading against its metric bounds and trailing history.
    ///
    /// `trailing` holds prior same-metric readings sorted oldest to newest.
    /// Returns `None` when the reading raises no flag.
    pub fn classify(reading: &Reading, trailing: &[Reading]) -> Option<AnomalyRecord> {
        if let Some(violation) = Self::check_bounds(&reading.metric_type, reading.value) {
            let bounds = ranges::bounds_for(&reading.metric_type)?;
            return Some(match violation {
                BoundsViolation::Impossible => make_record(
                    reading,
                    AnomalyKind::Impossible,
                    Severity::Critical,
                    format!(
                        "{} of {} {} is outside the physically possible range ({} to {})",
                        reading.metric_type,
                        reading.value,
                        reading.unit,
                        bounds.impossible.0,
                        bounds.impossible.1
                    ),
                    bounds.expected_range(),
                ),
                BoundsViolation::HighlyUnlikely => make_record(
                    reading,
                    AnomalyKind::HighlyUnlikely,
                    Severity::High,
                    format!(
                        "{} of {} {} is possible but far outside the plausible range ({} to {})",
                        reading.metric_type,
                        reading.value,
                        reading.unit,
                        bounds.unlikely.0,
                        bounds.unlikely.1
                    ),
                    bounds.expected_range(),
                ),
            });
        }

        Self::check_statistical(reading, trailing)
    }

    /// Bounds-only checks 1 and 2, used by plausibility and accuracy scoring.
    /// Unknown metric types are always plausible.
    pub fn check_bounds(metric_type: &str, value: f64) -> Option<BoundsViolation> {
        let bounds = ranges::bounds_for(metric_type)?;
        if value < bounds.impossible.0 || value > bounds.impossible.1 {
            return Some(BoundsViolation::Impossible);
        }
        if value < bounds.unlikely.0 || value > bounds.unlikely.1 {
            return Some(BoundsViolation::HighlyUnlikely);
        }
        None
    }

    /// Z-score check against the trailing history. Requires at least
    /// `MIN_STATISTICAL_HISTORY` points; a constant history (zero spread)
    /// never raises a flag.
    fn check_statistical(reading: &Reading, trailing: &[Reading]) -> Option<AnomalyRecord> {
        if trailing.len() < MIN_STATISTICAL_HISTORY {
            return None;
        }

        let values: Vec<f64> = trailing.iter().map(|r| r.value).collect();
        let mu = stats::mean(&values)?;
        let sigma = stats::population_std_dev(&values)?;
        if sigma == 0.0 {
            return None;
        }

        let z = (reading.value - mu).abs() / sigma;
        if z <= Z_SCORE_THRESHOLD {
            return None;
        }

        let severity = if z > Z_SCORE_HIGH_SEVERITY {
            Severity::High
        } else {
            Severity::Medium
        };

        Some(make_record(
            reading,
            AnomalyKind::Inconsistent,
            severity,
            format!(
                "{} of {} {} deviates {:.1} standard deviations from the recent average of {:.1}",
                reading.metric_type, reading.value, reading.unit, z, mu
            ),
            ExpectedRange {
                min: mu - 2.0 * sigma,
                max: mu + 2.0 * sigma,
                typical: mu,
            },
        ))
    }
}

fn make_record(
    reading: &Reading,
    kind: AnomalyKind,
    severity: Severity,
    description: String,
    expected_range: ExpectedRange,
) -> AnomalyRecord {
    AnomalyRecord {
        reading_id: reading.id,
        metric_type: reading.metric_type.clone(),
        value: reading.value,
        unit: reading.unit.clone(),
        timestamp: reading.timestamp,
        source: reading.source.clone(),
        kind,
        severity,
        description,
        expected_range,
        suggestions: suggestions_for(kind),
    }
}

/// Templated suggestions per anomaly kind, most confident first
fn suggestions_for(kind: AnomalyKind) -> Vec<Suggestion> {
    match kind {
        AnomalyKind::Impossible => vec![
            Suggestion {
                kind: SuggestionKind::ReenterValue,
                description: "Re-enter this value; it cannot be a real measurement".to_string(),
                confidence: 0.9,
            },
            Suggestion {
                kind: SuggestionKind::CheckCalibration,
                description: "Check the device calibration".to_string(),
                confidence: 0.7,
            },
        ],
        AnomalyKind::HighlyUnlikely => vec![
            Suggestion {
                kind: SuggestionKind::VerifyReading,
                description: "Verify this reading with a second measurement".to_string(),
                confidence: 0.8,
            },
            Suggestion {
                kind: SuggestionKind::CheckCalibration,
                description: "Check the device calibration".to_string(),
                confidence: 0.6,
            },
        ],
        AnomalyKind::Inconsistent => vec![
            Suggestion {
                kind: SuggestionKind::ReviewHistory,
                description: "Compare against recent readings for this metric".to_string(),
                confidence: 0.7,
            },
            Suggestion {
                kind: SuggestionKind::VerifyReading,
                description: "Verify this reading with a second measurement".to_string(),
                confidence: 0.5,
            },
        ],
        AnomalyKind::MissingContext => vec![Suggestion {
            kind: SuggestionKind::ReviewHistory,
            description: "Collect more readings before trusting this metric".to_string(),
            confidence: 0.5,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn make_reading(metric: &str, value: f64) -> Reading {
        Reading {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            metric_type: metric.to_string(),
            value,
            unit: "bpm".to_string(),
            timestamp: Utc::now(),
            source: "apple_watch".to_string(),
        }
    }

    fn make_history(metric: &str, values: &[f64]) -> Vec<Reading> {
        let start = Utc::now() - Duration::hours(values.len() as i64);
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let mut reading = make_reading(metric, v);
                reading.timestamp = start + Duration::hours(i as i64);
                reading
            })
            .collect()
    }

    #[test]
    fn test_impossible_value_is_critical() {
        let reading = make_reading("heart_rate", 5.0);
        let record = OutlierClassifier::classify(&reading, &[]).unwrap();

        assert_eq!(record.kind, AnomalyKind::Impossible);
        assert_eq!(record.severity, Severity::Critical);
        assert_eq!(record.suggestions[0].kind, SuggestionKind::ReenterValue);
        assert_eq!(record.suggestions[0].confidence, 0.9);
        assert_eq!(record.suggestions[1].confidence, 0.7);
        // Expected range comes from the static typical table, not history
        assert_eq!(record.expected_range.min, 60.0);
        assert_eq!(record.expected_range.max, 100.0);
    }

    #[test]
    fn test_unlikely_value_is_high() {
        let reading = make_reading("heart_rate", 250.0);
        let record = OutlierClassifier::classify(&reading, &[]).unwrap();

        assert_eq!(record.kind, AnomalyKind::HighlyUnlikely);
        assert_eq!(record.severity, Severity::High);
    }

    #[test]
    fn test_plausible_value_without_history_passes() {
        let reading = make_reading("heart_rate", 72.0);
        assert!(OutlierClassifier::classify(&reading, &[]).is_none());
    }

    #[test]
    fn test_statistical_check_needs_ten_points() {
        // Nine points of stable history: no statistical flag no matter
        // how far the new value deviates within plausible bounds
        let trailing = make_history("heart_rate", &[70.0; 9]);
        let reading = make_reading("heart_rate", 180.0);
        assert!(OutlierClassifier::classify(&reading, &trailing).is_none());
    }

    #[test]
    fn test_statistical_outlier_medium_then_high() {
        // History around 70 with modest spread; sigma ~= 2.87
        let trailing = make_history(
            "heart_rate",
            &[66.0, 68.0, 70.0, 72.0, 74.0, 66.0, 68.0, 70.0, 72.0, 74.0],
        );
        let values: Vec<f64> = trailing.iter().map(|r| r.value).collect();
        let mu = values.iter().sum::<f64>() / values.len() as f64;
        let sigma =
            (values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64).sqrt();

        // Between 3 and 4 sigma: medium
        let medium = make_reading("heart_rate", mu + 3.5 * sigma);
        let record = OutlierClassifier::classify(&medium, &trailing).unwrap();
        assert_eq!(record.kind, AnomalyKind::Inconsistent);
        assert_eq!(record.severity, Severity::Medium);
        // Expected range is mu +/- 2 sigma from history
        assert!((record.expected_range.typical - mu).abs() < 1e-9);
        assert!((record.expected_range.max - (mu + 2.0 * sigma)).abs() < 1e-9);

        // Above 4 sigma: high
        let high = make_reading("heart_rate", mu + 4.5 * sigma);
        let record = OutlierClassifier::classify(&high, &trailing).unwrap();
        assert_eq!(record.severity, Severity::High);
    }

    #[test]
    fn test_constant_history_never_flags() {
        // Zero spread would divide by zero; must short-circuit instead
        let trailing = make_history("heart_rate", &[70.0; 12]);
        let reading = make_reading("heart_rate", 90.0);
        assert!(OutlierClassifier::classify(&reading, &trailing).is_none());
    }

    #[test]
    fn test_unknown_metric_is_always_plausible() {
        let reading = make_reading("mood", 9_000.0);
        assert!(OutlierClassifier::classify(&reading, &[]).is_none());
        assert!(OutlierClassifier::check_bounds("mood", 9_000.0).is_none());
    }

    #[test]
    fn test_bounds_priority_impossible_before_unlikely() {
        assert_eq!(
            OutlierClassifier::check_bounds("heart_rate", 5.0),
            Some(BoundsViolation::Impossible)
        );
        assert_eq!(
            OutlierClassifier::check_bounds("heart_rate", 250.0),
            Some(BoundsViolation::HighlyUnlikely)
        );
        assert_eq!(OutlierClassifier::check_bounds("heart_rate", 72.0), None);
    }
}
