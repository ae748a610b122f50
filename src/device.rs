//! Per-device reliability assessment
//!
//! Groups readings by contributing source and produces one reliability
//! profile per device: four sub-scores, a per-metric breakdown, detected
//! issues, and a trend over 24h/7d/30d sub-windows.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::outlier::{BoundsViolation, OutlierClassifier};
use crate::policy::EnginePolicy;
use crate::quality::QualityScorer;
use crate::ranges;
use crate::types::{
    AnalysisWindow, DeviceIssue, DeviceIssueKind, DeviceProfile, MetricReliability, Reading,
    ReliabilityScores, ReliabilityTrend, Severity, TrendDirection,
};

/// Overall score below which a device is flagged for calibration
pub const CALIBRATION_THRESHOLD: f64 = 60.0;

/// Dead zone around zero delta within which a trend counts as stable
pub const TREND_DEAD_ZONE: f64 = 1.0;

/// Trend comparison window in days (24h score vs. 30d score)
pub const TREND_WINDOW_DAYS: u32 = 30;

/// Assessor producing per-device reliability profiles
pub struct DeviceAssessor;

impl DeviceAssessor {
    /// Assess every distinct source in the reading set.
    ///
    /// All recency math is relative to `window.end`, so identical inputs
    /// produce identical profiles. Output is sorted by overall reliability
    /// descending, ties broken by source id for stability.
    pub fn assess(
        readings: &[Reading],
        window: &AnalysisWindow,
        policy: &EnginePolicy,
    ) -> Vec<DeviceProfile> {
        let mut by_source: BTreeMap<&str, Vec<&Reading>> = BTreeMap::new();
        for reading in readings {
            by_source
                .entry(reading.source.as_str())
                .or_default()
                .push(reading);
        }

        let mut profiles: Vec<DeviceProfile> = by_source
            .into_iter()
            .map(|(source, device_readings)| {
                Self::profile_device(source, &device_readings, window, policy)
            })
            .collect();

        profiles.sort_by(|a, b| {
            b.reliability
                .overall
                .total_cmp(&a.reliability.overall)
                .then_with(|| a.source_id.cmp(&b.source_id))
        });
        profiles
    }

    fn profile_device(
        source: &str,
        device_readings: &[&Reading],
        window: &AnalysisWindow,
        policy: &EnginePolicy,
    ) -> DeviceProfile {
        let as_of = window.end;
        let reliability = Self::reliability_scores(device_readings, as_of, policy);
        let (device_class, display_name) = ranges::device_info(source);

        let mut issues = Vec::new();
        if reliability.overall < CALIBRATION_THRESHOLD {
            issues.push(DeviceIssue {
                kind: DeviceIssueKind::CalibrationNeeded,
                severity: Severity::High,
                description: format!(
                    "{} reliability has dropped to {:.0} out of 100",
                    display_name, reliability.overall
                ),
                recommendation: format!(
                    "Recalibrate or re-pair {} and verify its next readings",
                    display_name
                ),
                first_detected_at: as_of,
            });
        }

        DeviceProfile {
            source_id: source.to_string(),
            display_name: display_name.to_string(),
            device_class,
            per_metric: Self::per_metric(device_readings, window, policy),
            trend: Self::trend(device_readings, as_of, policy),
            reliability,
            issues,
        }
    }

    /// Four sub-scores and their mean for one device's readings
    fn reliability_scores(
        device_readings: &[&Reading],
        as_of: DateTime<Utc>,
        policy: &EnginePolicy,
    ) -> ReliabilityScores {
        let owned: Vec<Reading> = device_readings.iter().map(|r| (*r).clone()).collect();
        let consistency = QualityScorer::consistency(&owned);
        let sync_reliability = Self::sync_reliability(device_readings, as_of);
        let accuracy = Self::accuracy(device_readings);
        let battery_health = policy.assumed_battery_health;

        ReliabilityScores {
            overall: (consistency + sync_reliability + accuracy + battery_health) / 4.0,
            consistency,
            sync_reliability,
            accuracy,
            battery_health,
        }
    }

    /// Recency-density heuristic: readings in the trailing 24h, ten points
    /// each, capped at 100
    fn sync_reliability(device_readings: &[&Reading], as_of: DateTime<Utc>) -> f64 {
        let cutoff = as_of - Duration::hours(24);
        let recent = device_readings
            .iter()
            .filter(|r| r.timestamp > cutoff && r.timestamp <= as_of)
            .count();
        (recent as f64 * 10.0).min(100.0)
    }

    /// Share of readings inside plausible bounds. Only highly-unlikely
    /// flags count against accuracy; statistical outliers are natural
    /// variance and would double-penalize consistency.
    fn accuracy(device_readings: &[&Reading]) -> f64 {
        if device_readings.is_empty() {
            return 0.0;
        }
        let unlikely = device_readings
            .iter()
            .filter(|r| {
                OutlierClassifier::check_bounds(&r.metric_type, r.value)
                    == Some(BoundsViolation::HighlyUnlikely)
            })
            .count();
        100.0 * (1.0 - unlikely as f64 / device_readings.len() as f64)
    }

    /// Per-metric quality breakdown within one device
    fn per_metric(
        device_readings: &[&Reading],
        window: &AnalysisWindow,
        policy: &EnginePolicy,
    ) -> Vec<MetricReliability> {
        let mut by_metric: BTreeMap<&str, Vec<Reading>> = BTreeMap::new();
        for reading in device_readings {
            by_metric
                .entry(reading.metric_type.as_str())
                .or_default()
                .push((*reading).clone());
        }

        by_metric
            .into_iter()
            .map(|(metric_type, metric_readings)| {
                let quality = QualityScorer::score(&metric_readings, window, policy);
                let unlikely = metric_readings
                    .iter()
                    .filter(|r| {
                        OutlierClassifier::check_bounds(&r.metric_type, r.value)
                            == Some(BoundsViolation::HighlyUnlikely)
                    })
                    .count();
                let last_seen_at = metric_readings
                    .iter()
                    .map(|r| r.timestamp)
                    .max()
                    .unwrap_or(window.end);

                MetricReliability {
                    metric_type: metric_type.to_string(),
                    quality_score: quality.overall,
                    outlier_rate_pct: 100.0 * unlikely as f64 / metric_readings.len() as f64,
                    missing_data_rate_pct: 100.0 - quality.completeness,
                    last_seen_at,
                }
            })
            .collect()
    }

    /// Reliability movement: the trailing-24h score against the trailing-30d
    /// baseline, with a dead zone so noise reads as stable. When the last
    /// day is silent the trailing-7d score stands in; a device silent for a
    /// whole week scores zero recent reliability.
    fn trend(
        device_readings: &[&Reading],
        as_of: DateTime<Utc>,
        policy: &EnginePolicy,
    ) -> ReliabilityTrend {
        let score_24h = Self::sub_window_overall(device_readings, as_of, 1, policy);
        let score_7d = Self::sub_window_overall(device_readings, as_of, 7, policy);
        let score_30d = Self::sub_window_overall(device_readings, as_of, 30, policy);

        let recent = score_24h.or(score_7d).unwrap_or(0.0);
        let delta = recent - score_30d.unwrap_or(0.0);
        let direction = if delta > TREND_DEAD_ZONE {
            TrendDirection::Improving
        } else if delta < -TREND_DEAD_ZONE {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        };

        ReliabilityTrend {
            window_days: TREND_WINDOW_DAYS,
            delta,
            direction,
        }
    }

    /// Overall reliability restricted to readings from the trailing
    /// sub-window; `None` when the sub-window holds no readings
    fn sub_window_overall(
        device_readings: &[&Reading],
        as_of: DateTime<Utc>,
        days: i64,
        policy: &EnginePolicy,
    ) -> Option<f64> {
        let cutoff = as_of - Duration::days(days);
        let subset: Vec<&Reading> = device_readings
            .iter()
            .filter(|r| r.timestamp > cutoff && r.timestamp <= as_of)
            .copied()
            .collect();
        if subset.is_empty() {
            return None;
        }
        Some(Self::reliability_scores(&subset, as_of, policy).overall)
    }
}
