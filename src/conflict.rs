//! Cross-source conflict detection
//!
//! Readings are bucketed into fixed-size time windows; any same-metric group
//! of two or more readings within a bucket is a candidate. The group becomes
//! a conflict when the spread between its values exceeds 20% of the largest
//! value.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};

use crate::policy::EnginePolicy;
use crate::types::{Conflict, ConflictSeverity, ConflictSource, ConflictSpread, Reading};

/// Percent variation above which a candidate group is a conflict
pub const CONFLICT_PCT_THRESHOLD: f64 = 20.0;

/// Confidence attached to non-suggested sources in a conflict
const NON_SUGGESTED_CONFIDENCE: f64 = 0.5;

/// Detector for cross-source disagreements within short time windows
pub struct ConflictDetector;

impl ConflictDetector {
    /// Detect conflicts across the reading set, bucketed into windows of
    /// `policy.conflict_window_minutes`. Output is ordered by window start,
    /// then metric type.
    pub fn detect(readings: &[Reading], policy: &EnginePolicy) -> Vec<Conflict> {
        let window_secs = policy.conflict_window_minutes * 60;
        if window_secs <= 0 {
            return Vec::new();
        }

        // Key by (bucket index, metric type); BTreeMap gives deterministic
        // output ordering.
        let mut groups: BTreeMap<(i64, &str), Vec<&Reading>> = BTreeMap::new();
        for reading in readings {
            let bucket = reading.timestamp.timestamp().div_euclid(window_secs);
            groups
                .entry((bucket, reading.metric_type.as_str()))
                .or_default()
                .push(reading);
        }

        groups
            .into_iter()
            .filter(|(_, group)| group.len() >= 2)
            .filter_map(|((bucket, metric_type), mut group)| {
                group.sort_by_key(|r| r.timestamp);
                Self::evaluate_group(bucket * window_secs, metric_type, &group, policy)
            })
            .collect()
    }

    fn evaluate_group(
        window_start_secs: i64,
        metric_type: &str,
        group: &[&Reading],
        policy: &EnginePolicy,
    ) -> Option<Conflict> {
        let max = group.iter().map(|r| r.value).fold(f64::MIN, f64::max);
        let min = group.iter().map(|r| r.value).fold(f64::MAX, f64::min);
        if max <= 0.0 {
            return None;
        }

        let max_diff = max - min;
        let pct_variation = 100.0 * max_diff / max;
        if pct_variation <= CONFLICT_PCT_THRESHOLD {
            return None;
        }

        let severity = if pct_variation > 50.0 {
            ConflictSeverity::Critical
        } else if pct_variation > 30.0 {
            ConflictSeverity::Major
        } else {
            ConflictSeverity::Moderate
        };

        let suggested_source = policy.suggest_source(group)?.to_string();
        let sources = group
            .iter()
            .map(|r| ConflictSource {
                source: r.source.clone(),
                value: r.value,
                confidence: if r.source == suggested_source {
                    policy.suggested_source_confidence
                } else {
                    NON_SUGGESTED_CONFIDENCE
                },
            })
            .collect();

        Some(Conflict {
            window_start: window_start(window_start_secs),
            metric_type: metric_type.to_string(),
            sources,
            spread: ConflictSpread {
                max_diff,
                pct_variation,
                severity,
            },
            suggested_source,
            rationale: policy.selection_rationale().to_string(),
            // No auto-resolution path exists; every conflict needs a human
            requires_review: true,
        })
    }
}

fn window_start(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn make_reading(
        source: &str,
        metric: &str,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> Reading {
        Reading {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            metric_type: metric.to_string(),
            value,
            unit: "count".to_string(),
            timestamp,
            source: source.to_string(),
        }
    }

    fn bucket_start() -> DateTime<Utc> {
        // Aligned to a 30-minute boundary so both readings share a bucket
        Utc.with_ymd_and_hms(2026, 3, 10, 14, 0, 0).unwrap()
    }

    #[test]
    fn test_divergent_window_is_flagged_moderate() {
        let t = bucket_start();
        let readings = vec![
            make_reading("apple_watch", "steps", 5_000.0, t + Duration::minutes(5)),
            make_reading("fitbit", "steps", 6_500.0, t + Duration::minutes(20)),
        ];

        let conflicts = ConflictDetector::detect(&readings, &EnginePolicy::default());
        assert_eq!(conflicts.len(), 1);

        let conflict = &conflicts[0];
        assert_eq!(conflict.metric_type, "steps");
        assert_eq!(conflict.spread.max_diff, 1_500.0);
        // 1500 / 6500 = 23.1%
        assert!((conflict.spread.pct_variation - 23.076923).abs() < 1e-3);
        assert_eq!(conflict.spread.severity, ConflictSeverity::Moderate);
        assert!(conflict.requires_review);
        assert_eq!(conflict.suggested_source, "apple_watch");
        assert_eq!(conflict.sources[0].confidence, 0.7);
        assert_eq!(conflict.sources[1].confidence, 0.5);
    }

    #[test]
    fn test_agreement_below_threshold_is_not_a_conflict() {
        let t = bucket_start();
        let readings = vec![
            make_reading("apple_watch", "steps", 5_000.0, t + Duration::minutes(5)),
            make_reading("fitbit", "steps", 5_500.0, t + Duration::minutes(20)),
        ];
        // 500 / 5500 = 9.1%
        assert!(ConflictDetector::detect(&readings, &EnginePolicy::default()).is_empty());
    }

    #[test]
    fn test_severity_escalates_with_spread() {
        let t = bucket_start();
        let policy = EnginePolicy::default();

        // 40% variation: major
        let readings = vec![
            make_reading("a", "steps", 6_000.0, t),
            make_reading("b", "steps", 10_000.0, t + Duration::minutes(10)),
        ];
        let conflicts = ConflictDetector::detect(&readings, &policy);
        assert_eq!(conflicts[0].spread.severity, ConflictSeverity::Major);

        // 60% variation: critical
        let readings = vec![
            make_reading("a", "steps", 4_000.0, t),
            make_reading("b", "steps", 10_000.0, t + Duration::minutes(10)),
        ];
        let conflicts = ConflictDetector::detect(&readings, &policy);
        assert_eq!(conflicts[0].spread.severity, ConflictSeverity::Critical);
    }

    #[test]
    fn test_readings_in_different_windows_do_not_conflict() {
        let t = bucket_start();
        let readings = vec![
            make_reading("a", "steps", 5_000.0, t + Duration::minutes(5)),
            make_reading("b", "steps", 10_000.0, t + Duration::minutes(45)),
        ];
        assert!(ConflictDetector::detect(&readings, &EnginePolicy::default()).is_empty());
    }

    #[test]
    fn test_different_metrics_never_conflict() {
        let t = bucket_start();
        let readings = vec![
            make_reading("a", "steps", 5_000.0, t + Duration::minutes(5)),
            make_reading("b", "heart_rate", 72.0, t + Duration::minutes(10)),
        ];
        assert!(ConflictDetector::detect(&readings, &EnginePolicy::default()).is_empty());
    }

    #[test]
    fn test_same_source_can_conflict_with_itself() {
        let t = bucket_start();
        let readings = vec![
            make_reading("manual", "weight", 70.0, t + Duration::minutes(2)),
            make_reading("manual", "weight", 95.0, t + Duration::minutes(12)),
        ];
        let conflicts = ConflictDetector::detect(&readings, &EnginePolicy::default());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].suggested_source, "manual");
    }

    #[test]
    fn test_window_start_is_bucket_aligned() {
        let t = bucket_start();
        let readings = vec![
            make_reading("a", "steps", 5_000.0, t + Duration::minutes(5)),
            make_reading("b", "steps", 9_000.0, t + Duration::minutes(25)),
        ];
        let conflicts = ConflictDetector::detect(&readings, &EnginePolicy::default());
        assert_eq!(conflicts[0].window_start, t);
    }
}
