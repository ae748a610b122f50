//! Report aggregation
//!
//! Composes the classifier, quality scorer, device assessor, and conflict
//! detector into one coherent report, then derives prioritized textual
//! recommendations and templated insights from the merged results.

use chrono::Utc;

use crate::conflict::ConflictDetector;
use crate::device::{DeviceAssessor, CALIBRATION_THRESHOLD};
use crate::outlier::OutlierClassifier;
use crate::policy::EnginePolicy;
use crate::quality::QualityScorer;
use crate::ranges;
use crate::types::{
    AnalysisWindow, AnomalyRecord, Conflict, DeviceProfile, Insights, QualityScore, Reading,
    Recommendations, Report, Severity,
};
use crate::ENGINE_VERSION;

/// Builder composing per-component results into one report
pub struct ReportBuilder;

impl ReportBuilder {
    /// Generate a full quality report for one user over one window.
    ///
    /// Pure composition: the quality scorer runs once over the whole
    /// window, the classifier once per reading with its own trailing
    /// history, the device assessor and conflict detector once over the
    /// whole window. `generated_at` is the only clock read.
    pub fn generate(
        user_id: &str,
        readings: &[Reading],
        window: &AnalysisWindow,
        policy: &EnginePolicy,
    ) -> Report {
        // The store makes no ordering promise; trailing-history slices and
        // conflict grouping both need time order.
        let mut sorted: Vec<Reading> = readings.to_vec();
        sorted.sort_by_key(|r| r.timestamp);

        let overall_quality = QualityScorer::score(&sorted, window, policy);
        let anomalies = Self::classify_all(&sorted);
        let devices = DeviceAssessor::assess(&sorted, window, policy);
        let conflicts = ConflictDetector::detect(&sorted, policy);

        let recommendations = Self::recommendations(&anomalies, &devices, &conflicts);
        let insights = Self::insights(&sorted, &overall_quality, &devices);

        Report {
            user_id: user_id.to_string(),
            generated_at: Utc::now(),
            window: *window,
            engine_version: ENGINE_VERSION.to_string(),
            overall_quality,
            anomalies,
            devices,
            conflicts,
            recommendations,
            insights,
        }
    }

    /// Classify each reading against the same-metric readings before it,
    /// then sort by severity descending (timestamp breaks ties).
    fn classify_all(sorted: &[Reading]) -> Vec<AnomalyRecord> {
        let mut anomalies = Vec::new();
        for (i, reading) in sorted.iter().enumerate() {
            let trailing: Vec<Reading> = sorted[..i]
                .iter()
                .filter(|r| r.metric_type == reading.metric_type)
                .cloned()
                .collect();
            if let Some(record) = OutlierClassifier::classify(reading, &trailing) {
                anomalies.push(record);
            }
        }

        anomalies.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
        });
        anomalies
    }

    /// Priority rules: critical anomalies and conflicts demand immediate
    /// action, unreliable devices need short-term attention, and routine
    /// monitoring is always the long-term habit.
    fn recommendations(
        anomalies: &[AnomalyRecord],
        devices: &[DeviceProfile],
        conflicts: &[Conflict],
    ) -> Recommendations {
        let mut recs = Recommendations::default();

        let critical = anomalies
            .iter()
            .filter(|a| a.severity == Severity::Critical)
            .count();
        if critical > 0 {
            recs.immediate.push(format!(
                "Review and correct {} reading(s) flagged as physiologically impossible",
                critical
            ));
        }
        if !conflicts.is_empty() {
            recs.immediate.push(format!(
                "Resolve {} time window(s) where sources disagree about the same metric",
                conflicts.len()
            ));
        }

        for device in devices {
            if device.reliability.overall < CALIBRATION_THRESHOLD {
                recs.short_term.push(format!(
                    "Recalibrate or check {} (reliability {:.0}/100)",
                    device.display_name, device.reliability.overall
                ));
            }
        }

        recs.long_term
            .push("Regular data-quality monitoring maintains accuracy over time".to_string());
        recs
    }

    /// Templated narrative; intentionally descriptive rather than
    /// diagnostic.
    fn insights(
        sorted: &[Reading],
        overall: &QualityScore,
        devices: &[DeviceProfile],
    ) -> Insights {
        let mut insights = Insights::default();

        insights.integrity_trends.push(format!(
            "Overall data quality is {} at {:.0}/100",
            overall.tier.as_str(),
            overall.overall
        ));
        let unknown = sorted
            .iter()
            .filter(|r| ranges::bounds_for(&r.metric_type).is_none())
            .count();
        if unknown > 0 {
            insights.integrity_trends.push(format!(
                "{} reading(s) use metric types without reference ranges and were excluded \
                 from plausibility and freshness checks",
                unknown
            ));
        }

        if let Some(best) = devices.first() {
            insights.device_performance.push(format!(
                "{} is currently the most reliable source ({:.0}/100)",
                best.display_name, best.reliability.overall
            ));
        }
        let reliable = devices
            .iter()
            .filter(|d| d.reliability.overall >= CALIBRATION_THRESHOLD)
            .count();
        if !devices.is_empty() {
            insights.device_performance.push(format!(
                "{} of {} device(s) are reporting reliably",
                reliable,
                devices.len()
            ));
        }

        if !sorted.is_empty() {
            insights.behavior_patterns.push(format!(
                "{} reading(s) across {} metric type(s) in this window",
                sorted.len(),
                count_metric_types(sorted)
            ));
        }

        insights
    }
}

fn count_metric_types(readings: &[Reading]) -> usize {
    let mut types: Vec<&str> = readings.iter().map(|r| r.metric_type.as_str()).collect();
    types.sort_unstable();
    types.dedup();
    types.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn fixed_end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn make_reading(
        source: &str,
        metric: &str,
        value: f64,
        age_hours: i64,
        end: DateTime<Utc>,
    ) -> Reading {
        Reading {
            id: Uuid::from_u128(((age_hours as u128) << 64) | value.to_bits() as u128),
            user_id: "user-1".to_string(),
            metric_type: metric.to_string(),
            value,
            unit: "bpm".to_string(),
            timestamp: end - Duration::hours(age_hours),
            source: source.to_string(),
        }
    }

    fn sample_readings(end: DateTime<Utc>) -> Vec<Reading> {
        let mut readings: Vec<Reading> = (0..14)
            .map(|i| make_reading("apple_watch", "heart_rate", 68.0 + (i % 5) as f64, i * 4, end))
            .collect();
        // One impossible reading and a conflicting steps window
        readings.push(make_reading("manual", "heart_rate", 5.0, 2, end));
        let mut steps_a = make_reading("apple_watch", "steps", 5_000.0, 1, end);
        steps_a.timestamp = end - Duration::minutes(58);
        let mut steps_b = make_reading("fitbit", "steps", 9_000.0, 1, end);
        steps_b.timestamp = end - Duration::minutes(40);
        readings.push(steps_a);
        readings.push(steps_b);
        readings
    }

    #[test]
    fn test_report_composes_all_components() {
        let end = fixed_end();
        let window = AnalysisWindow::ending_at(end, 7);
        let readings = sample_readings(end);

        let report =
            ReportBuilder::generate("user-1", &readings, &window, &EnginePolicy::default());

        assert_eq!(report.user_id, "user-1");
        assert_eq!(report.engine_version, env!("CARGO_PKG_VERSION"));
        assert!(!report.anomalies.is_empty());
        assert_eq!(report.devices.len(), 3);
        assert_eq!(report.conflicts.len(), 1);
        assert!(report.overall_quality.overall > 0.0);
    }

    #[test]
    fn test_anomalies_sorted_by_severity_descending() {
        let end = fixed_end();
        let window = AnalysisWindow::ending_at(end, 7);
        let mut readings = sample_readings(end);
        // Add a highly-unlikely reading so two severities are present
        readings.push(make_reading("manual", "heart_rate", 250.0, 3, end));

        let report =
            ReportBuilder::generate("user-1", &readings, &window, &EnginePolicy::default());

        for pair in report.anomalies.windows(2) {
            assert!(pair[0].severity >= pair[1].severity);
        }
        assert_eq!(report.anomalies[0].severity, Severity::Critical);
    }

    #[test]
    fn test_devices_sorted_by_reliability_descending() {
        let end = fixed_end();
        let window = AnalysisWindow::ending_at(end, 7);
        let report = ReportBuilder::generate(
            "user-1",
            &sample_readings(end),
            &window,
            &EnginePolicy::default(),
        );

        for pair in report.devices.windows(2) {
            assert!(pair[0].reliability.overall >= pair[1].reliability.overall);
        }
    }

    #[test]
    fn test_recommendation_priority_rules() {
        let end = fixed_end();
        let window = AnalysisWindow::ending_at(end, 7);
        let report = ReportBuilder::generate(
            "user-1",
            &sample_readings(end),
            &window,
            &EnginePolicy::default(),
        );

        // Critical anomaly and a conflict both land in immediate
        assert_eq!(report.recommendations.immediate.len(), 2);
        // The static long-term entry is always present
        assert_eq!(report.recommendations.long_term.len(), 1);
    }

    #[test]
    fn test_empty_history_degrades_gracefully() {
        let end = fixed_end();
        let window = AnalysisWindow::ending_at(end, 7);
        let report =
            ReportBuilder::generate("user-1", &[], &window, &EnginePolicy::default());

        assert_eq!(report.overall_quality, QualityScore::empty());
        assert!(report.anomalies.is_empty());
        assert!(report.devices.is_empty());
        assert!(report.conflicts.is_empty());
        assert_eq!(report.recommendations.long_term.len(), 1);
    }

    #[test]
    fn test_report_is_deterministic_apart_from_generated_at() {
        let end = fixed_end();
        let window = AnalysisWindow::ending_at(end, 7);
        let readings = sample_readings(end);
        let policy = EnginePolicy::default();

        let a = ReportBuilder::generate("user-1", &readings, &window, &policy);
        let mut b = ReportBuilder::generate("user-1", &readings, &window, &policy);
        b.generated_at = a.generated_at;
        assert_eq!(a, b);

        // Input order must not matter either
        let mut shuffled = readings.clone();
        shuffled.reverse();
        let mut c = ReportBuilder::generate("user-1", &shuffled, &window, &policy);
        c.generated_at = a.generated_at;
        assert_eq!(a, c);
    }

    #[test]
    fn test_unknown_metric_limitation_surfaces_in_insights() {
        let end = fixed_end();
        let window = AnalysisWindow::ending_at(end, 7);
        let readings = vec![make_reading("manual", "mood", 7.0, 1, end)];

        let report =
            ReportBuilder::generate("user-1", &readings, &window, &EnginePolicy::default());
        assert!(report
            .insights
            .integrity_trends
            .iter()
            .any(|line| line.contains("without reference ranges")));
    }
}
