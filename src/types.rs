//! Core types for the Vitalgauge engine
//!
//! This module defines the data structures that flow through each stage of the
//! engine: raw readings, anomaly records, quality scores, device profiles,
//! conflicts, and the top-level report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single timestamped health reading from one source.
///
/// Readings are immutable inputs; the engine never mutates them, it only
/// derives new structures from a snapshot of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Unique reading identifier
    pub id: Uuid,
    /// Owning user identifier
    pub user_id: String,
    /// Metric type, e.g. "heart_rate", "steps", "weight"
    pub metric_type: String,
    /// Measured value in `unit`
    pub value: f64,
    /// Unit of measure, e.g. "bpm", "kg"
    pub unit: String,
    /// When the measurement was taken (UTC)
    pub timestamp: DateTime<Utc>,
    /// Contributing device/channel, e.g. "apple_watch", "manual"
    pub source: String,
}

/// Anomaly classification for a single reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Physiologically impossible value
    Impossible,
    /// Possible but far outside the plausible range
    HighlyUnlikely,
    /// Statistically inconsistent with the reading's own trailing history
    Inconsistent,
    /// Not enough context to judge the reading
    MissingContext,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::Impossible => "impossible",
            AnomalyKind::HighlyUnlikely => "highly_unlikely",
            AnomalyKind::Inconsistent => "inconsistent",
            AnomalyKind::MissingContext => "missing_context",
        }
    }
}

/// Severity of an anomaly or device issue.
///
/// Variants are declared lowest-first so the derived `Ord` gives a stable
/// ordinal ordering; sorting descending puts `Critical` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Range a reading was expected to fall within
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedRange {
    pub min: f64,
    pub max: f64,
    pub typical: f64,
}

/// Kind of corrective suggestion attached to an anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    ReenterValue,
    CheckCalibration,
    VerifyReading,
    ReviewHistory,
}

/// Templated corrective suggestion with a fixed confidence weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub description: String,
    /// Confidence that the suggestion addresses the anomaly (0-1)
    pub confidence: f64,
}

/// A reading flagged as anomalous, with context for explanation.
///
/// Produced fresh per analysis call; never persisted by the engine.
/// Invariant: `kind == Impossible` implies `severity == Critical`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    /// Identifier of the flagged reading
    pub reading_id: Uuid,
    pub metric_type: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub kind: AnomalyKind,
    pub severity: Severity,
    /// Human-readable explanation of the flag
    pub description: String,
    /// The range the value was expected to fall within
    pub expected_range: ExpectedRange,
    /// Templated corrective suggestions, most confident first
    pub suggestions: Vec<Suggestion>,
}

/// Coarse reliability bucket derived from an overall 0-100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliabilityTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ReliabilityTier {
    /// Tier boundaries: >=90 excellent, >=75 good, >=60 fair, else poor
    pub fn from_score(overall: f64) -> Self {
        if overall >= 90.0 {
            ReliabilityTier::Excellent
        } else if overall >= 75.0 {
            ReliabilityTier::Good
        } else if overall >= 60.0 {
            ReliabilityTier::Fair
        } else {
            ReliabilityTier::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReliabilityTier::Excellent => "excellent",
            ReliabilityTier::Good => "good",
            ReliabilityTier::Fair => "fair",
            ReliabilityTier::Poor => "poor",
        }
    }
}

/// Component-wise data quality score for a set of readings.
///
/// Invariant: `overall` is the rounded mean of the four components and
/// `tier` is a deterministic function of `overall`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// Rounded mean of the four components (0-100)
    pub overall: f64,
    /// Inverse of relative variability within each metric type (0-100)
    pub consistency: f64,
    /// Fraction of readings within physiologically reasonable bounds (0-100)
    pub plausibility: f64,
    /// Actual reading density vs. expected density (0-100)
    pub completeness: f64,
    /// Recency of readings vs. metric-specific freshness expectations (0-100)
    pub timeliness: f64,
    pub tier: ReliabilityTier,
    /// Confidence in the score itself (0-1)
    pub confidence: f64,
}

impl QualityScore {
    /// Score for an empty reading set: all zeros, poor tier, no confidence
    pub fn empty() -> Self {
        Self {
            overall: 0.0,
            consistency: 0.0,
            plausibility: 0.0,
            completeness: 0.0,
            timeliness: 0.0,
            tier: ReliabilityTier::Poor,
            confidence: 0.0,
        }
    }
}

/// Device category resolved from a source identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Wearable,
    SmartScale,
    BloodPressureCuff,
    GlucoseMeter,
    SmartphoneApp,
    ManualEntry,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Wearable => "wearable",
            DeviceClass::SmartScale => "smart_scale",
            DeviceClass::BloodPressureCuff => "blood_pressure_cuff",
            DeviceClass::GlucoseMeter => "glucose_meter",
            DeviceClass::SmartphoneApp => "smartphone_app",
            DeviceClass::ManualEntry => "manual_entry",
        }
    }
}

/// Per-device reliability sub-scores (each 0-100)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityScores {
    /// Mean of the four sub-scores
    pub overall: f64,
    pub consistency: f64,
    pub sync_reliability: f64,
    pub accuracy: f64,
    /// Placeholder constant when no battery telemetry is available
    pub battery_health: f64,
}

/// Per-metric breakdown within a device profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReliability {
    pub metric_type: String,
    /// Quality score restricted to this device/metric pair (0-100)
    pub quality_score: f64,
    /// Share of this device's readings flagged highly unlikely (percent)
    pub outlier_rate_pct: f64,
    /// Shortfall against the expected reading density (percent)
    pub missing_data_rate_pct: f64,
    pub last_seen_at: DateTime<Utc>,
}

/// Kind of detected device issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceIssueKind {
    CalibrationNeeded,
}

/// A detected problem with a device, plus what to do about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceIssue {
    pub kind: DeviceIssueKind,
    pub severity: Severity,
    pub description: String,
    pub recommendation: String,
    pub first_detected_at: DateTime<Utc>,
}

/// Direction of a device's reliability trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
}

/// Reliability movement over the trend window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityTrend {
    /// Length of the comparison window in days
    pub window_days: u32,
    /// Score change over the window (positive = improving)
    pub delta: f64,
    pub direction: TrendDirection,
}

/// Reliability profile for one contributing device/source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Raw source identifier from the readings
    pub source_id: String,
    /// Human-friendly device name
    pub display_name: String,
    pub device_class: DeviceClass,
    pub reliability: ReliabilityScores,
    pub per_metric: Vec<MetricReliability>,
    pub issues: Vec<DeviceIssue>,
    pub trend: ReliabilityTrend,
}

/// One source's contribution to a conflicting window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictSource {
    pub source: String,
    pub value: f64,
    /// Confidence that this source is the one to trust (0-1)
    pub confidence: f64,
}

/// Severity of a cross-source disagreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Minor,
    Moderate,
    Major,
    Critical,
}

impl ConflictSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictSeverity::Minor => "minor",
            ConflictSeverity::Moderate => "moderate",
            ConflictSeverity::Major => "major",
            ConflictSeverity::Critical => "critical",
        }
    }
}

/// How far apart the conflicting values are
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictSpread {
    /// Difference between the largest and smallest value
    pub max_diff: f64,
    /// `max_diff` as a percentage of the largest value
    pub pct_variation: f64,
    pub severity: ConflictSeverity,
}

/// Disagreement between same-metric readings within one time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Start of the fixed-size bucket the readings fell into (UTC)
    pub window_start: DateTime<Utc>,
    pub metric_type: String,
    pub sources: Vec<ConflictSource>,
    pub spread: ConflictSpread,
    /// Source the resolution policy would keep
    pub suggested_source: String,
    /// Why that source was suggested
    pub rationale: String,
    pub requires_review: bool,
}

/// Analysis window boundaries (UTC, `start` inclusive, `end` exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AnalysisWindow {
    /// Window length in whole-or-fractional days, never below zero
    pub fn days(&self) -> f64 {
        let seconds = (self.end - self.start).num_seconds().max(0) as f64;
        seconds / 86_400.0
    }

    /// Window ending at `end` and reaching back `days` days
    pub fn ending_at(end: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: end - chrono::Duration::days(days),
            end,
        }
    }
}

/// Prioritized, textual follow-up actions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub immediate: Vec<String>,
    pub short_term: Vec<String>,
    pub long_term: Vec<String>,
}

/// Narrative observations; templated, not diagnostic
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub integrity_trends: Vec<String>,
    pub device_performance: Vec<String>,
    pub behavior_patterns: Vec<String>,
}

/// Top-level quality report for one user and window.
///
/// Constructed once per request and never mutated after return.
/// `generated_at` is the only clock-dependent field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub user_id: String,
    pub generated_at: DateTime<Utc>,
    pub window: AnalysisWindow,
    /// Engine version that produced this report
    pub engine_version: String,
    pub overall_quality: QualityScore,
    /// Sorted by severity descending
    pub anomalies: Vec<AnomalyRecord>,
    /// Sorted by `reliability.overall` descending
    pub devices: Vec<DeviceProfile>,
    pub conflicts: Vec<Conflict>,
    pub recommendations: Recommendations,
    pub insights: Insights,
}

/// Presentation attributes for a 0-100 score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBadge {
    pub icon: String,
    pub color: String,
    pub label: String,
    pub description: String,
}

/// Outcome of synchronous single-reading validation at ingestion time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingValidation {
    /// False when any issue is critical
    pub is_valid: bool,
    /// Quality scored over the reading plus its short trailing history
    pub quality: QualityScore,
    pub issues: Vec<AnomalyRecord>,
    pub recommendations: Vec<String>,
}
