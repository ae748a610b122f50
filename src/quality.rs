//! Quality scoring
//!
//! Turns a set of readings into four component scores and an overall 0-100
//! score with a reliability tier:
//! - consistency: inverse coefficient of variation per metric type
//! - plausibility: share of readings inside plausible bounds
//! - completeness: reading density vs. the expected daily density
//! - timeliness: reading age vs. metric-specific freshness expectations

use std::collections::BTreeMap;

use crate::outlier::OutlierClassifier;
use crate::policy::EnginePolicy;
use crate::ranges;
use crate::stats;
use crate::types::{AnalysisWindow, QualityScore, Reading, ReliabilityTier, ScoreBadge};

/// Minimum same-metric points before consistency considers a metric type
pub const MIN_CONSISTENCY_POINTS: usize = 3;

/// Calculator for component-wise quality scores
pub struct QualityScorer;

impl QualityScorer {
    /// Score a set of readings over an analysis window.
    ///
    /// An empty set degrades to all-zero components with a poor tier and
    /// zero confidence; it never fails.
    pub fn score(
        readings: &[Reading],
        window: &AnalysisWindow,
        policy: &EnginePolicy,
    ) -> QualityScore {
        if readings.is_empty() {
            return QualityScore::empty();
        }

        let consistency = Self::consistency(readings);
        let plausibility = Self::plausibility(readings);
        let completeness = Self::completeness(readings.len(), window, policy);
        let timeliness = Self::timeliness(readings, window);

        let overall = ((consistency + plausibility + completeness + timeliness) / 4.0).round();
        QualityScore {
            overall,
            consistency,
            plausibility,
            completeness,
            timeliness,
            tier: ReliabilityTier::from_score(overall),
            confidence: (0.5 + overall / 200.0).min(0.95),
        }
    }

    /// Inverse relative variability, averaged over metric types with enough
    /// points. Types with fewer than `MIN_CONSISTENCY_POINTS` readings or a
    /// zero mean are skipped; with no qualifying type there is no observed
    /// inconsistency and the component stays at 100.
    pub(crate) fn consistency(readings: &[Reading]) -> f64 {
        // BTreeMap keeps iteration deterministic across runs
        let mut by_metric: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for reading in readings {
            by_metric
                .entry(reading.metric_type.as_str())
                .or_default()
                .push(reading.value);
        }

        let scores: Vec<f64> = by_metric
            .values()
            .filter(|values| values.len() >= MIN_CONSISTENCY_POINTS)
            .filter_map(|values| stats::coefficient_of_variation(values))
            .map(|cv| (100.0 - 100.0 * cv).max(0.0))
            .collect();

        match stats::mean(&scores) {
            Some(avg) => avg,
            None => 100.0,
        }
    }

    /// Share of readings inside plausible bounds (percent). Only the two
    /// bounds checks count; statistical outliers are natural variance.
    pub(crate) fn plausibility(readings: &[Reading]) -> f64 {
        let passing = readings
            .iter()
            .filter(|r| OutlierClassifier::check_bounds(&r.metric_type, r.value).is_none())
            .count();
        100.0 * passing as f64 / readings.len() as f64
    }

    /// Reading density against the policy's expected readings per day
    pub(crate) fn completeness(
        actual_count: usize,
        window: &AnalysisWindow,
        policy: &EnginePolicy,
    ) -> f64 {
        let expected = window.days() * policy.expected_readings_per_day;
        if expected <= 0.0 {
            return 100.0;
        }
        (100.0 * actual_count as f64 / expected).min(100.0)
    }

    /// Per-reading freshness against the metric's max age, averaged.
    /// Ages are measured from the window end so identical inputs always
    /// score identically. Metric types without a freshness expectation are
    /// excluded rather than penalized.
    pub(crate) fn timeliness(readings: &[Reading], window: &AnalysisWindow) -> f64 {
        let scores: Vec<f64> = readings
            .iter()
            .filter_map(|reading| {
                let bounds = ranges::bounds_for(&reading.metric_type)?;
                let age_hours =
                    (window.end - reading.timestamp).num_seconds().max(0) as f64 / 3600.0;
                Some((100.0 - 100.0 * age_hours / bounds.max_age_hours).max(0.0))
            })
            .collect();

        match stats::mean(&scores) {
            Some(avg) => avg,
            None => 100.0,
        }
    }
}

/// Presentation attributes for a 0-100 score. Thresholds match the
/// reliability tier boundaries exactly, partitioning the whole scale.
pub fn describe_score(score: f64) -> ScoreBadge {
    match ReliabilityTier::from_score(score) {
        ReliabilityTier::Excellent => ScoreBadge {
            icon: "🟢".to_string(),
            color: "green".to_string(),
            label: "Excellent".to_string(),
            description: "Readings are consistent, plausible, and current".to_string(),
        },
        ReliabilityTier::Good => ScoreBadge {
            icon: "🔵".to_string(),
            color: "blue".to_string(),
            label: "Good".to_string(),
            description: "Data quality is solid with minor gaps".to_string(),
        },
        ReliabilityTier::Fair => ScoreBadge {
            icon: "🟡".to_string(),
            color: "yellow".to_string(),
            label: "Fair".to_string(),
            description: "Data quality has noticeable gaps or variability".to_string(),
        },
        ReliabilityTier::Poor => ScoreBadge {
            icon: "🔴".to_string(),
            color: "red".to_string(),
            label: "Poor".to_string(),
            description: "Data is too sparse or unreliable to trust".to_string(),
        },
    }
}
