//! Engine facade
//!
//! This module provides the public API of Vitalgauge: report generation
//! over a reading history, synchronous single-reading validation at
//! ingestion time, and score presentation. Reading storage is an external
//! collaborator behind the `ReadingStore` trait.

use chrono::{DateTime, Utc};

use crate::error::EngineError;
use crate::outlier::OutlierClassifier;
use crate::policy::EnginePolicy;
use crate::quality::QualityScorer;
use crate::report::ReportBuilder;
use crate::types::{
    AnalysisWindow, AnomalyRecord, Reading, ReadingValidation, Report, ScoreBadge, Severity,
};

/// Default report window in days
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Trailing same-metric readings consulted during single-reading validation
pub const VALIDATION_HISTORY_LEN: usize = 30;

/// Window length used to score quality during single-reading validation
const VALIDATION_WINDOW_DAYS: i64 = 7;

/// Read interface to the external reading storage.
///
/// Implementations may return readings in any order; the engine sorts
/// internally where order matters.
pub trait ReadingStore {
    /// Fetch a user's readings, optionally restricted to `since` and later
    fn get_readings(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Reading>, EngineError>;
}

/// In-memory reading store for tests, examples, and the CLI
#[derive(Debug, Default)]
pub struct MemoryStore {
    readings: Vec<Reading>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_readings(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    pub fn add(&mut self, reading: Reading) {
        self.readings.push(reading);
    }
}

impl ReadingStore for MemoryStore {
    fn get_readings(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Reading>, EngineError> {
        Ok(self
            .readings
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| since.map_or(true, |cutoff| r.timestamp >= cutoff))
            .cloned()
            .collect())
    }
}

/// Data quality and device reliability engine.
///
/// Holds no mutable state between calls; every analysis runs over a fresh
/// snapshot of readings and returns independent derived objects.
pub struct QualityEngine<S: ReadingStore> {
    store: S,
    policy: EnginePolicy,
}

impl<S: ReadingStore> QualityEngine<S> {
    /// Create an engine over a reading store with default policy
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: EnginePolicy::default(),
        }
    }

    /// Create an engine with a custom policy
    pub fn with_policy(store: S, policy: EnginePolicy) -> Self {
        Self { store, policy }
    }

    /// Generate a quality report over the trailing `window_days`, ending now
    pub fn generate_report(&self, user_id: &str, window_days: i64) -> Result<Report, EngineError> {
        self.report_for_window(user_id, AnalysisWindow::ending_at(Utc::now(), window_days))
    }

    /// Generate a quality report for an explicit window. Identical reading
    /// sets and windows yield identical reports apart from `generated_at`.
    pub fn report_for_window(
        &self,
        user_id: &str,
        window: AnalysisWindow,
    ) -> Result<Report, EngineError> {
        if window.end <= window.start {
            return Err(EngineError::InvalidWindow(format!(
                "window end {} is not after start {}",
                window.end, window.start
            )));
        }

        let readings: Vec<Reading> = self
            .store
            .get_readings(user_id, Some(window.start))?
            .into_iter()
            .filter(|r| r.timestamp < window.end)
            .collect();
        check_well_formed(&readings)?;

        Ok(ReportBuilder::generate(user_id, &readings, &window, &self.policy))
    }

    /// Validate one reading synchronously at ingestion time.
    ///
    /// Runs the classifier and a reading-scoped quality score against the
    /// last `VALIDATION_HISTORY_LEN` same-metric readings. The reading is
    /// invalid only when an issue is critical.
    pub fn validate_reading(&self, reading: &Reading) -> Result<ReadingValidation, EngineError> {
        reject_malformed(reading)?;

        let mut trailing: Vec<Reading> = self
            .store
            .get_readings(&reading.user_id, None)?
            .into_iter()
            .filter(|r| r.metric_type == reading.metric_type && r.timestamp <= reading.timestamp)
            .collect();
        check_well_formed(&trailing)?;
        trailing.sort_by_key(|r| r.timestamp);
        if trailing.len() > VALIDATION_HISTORY_LEN {
            trailing.drain(..trailing.len() - VALIDATION_HISTORY_LEN);
        }

        let issues: Vec<AnomalyRecord> = OutlierClassifier::classify(reading, &trailing)
            .into_iter()
            .collect();

        let mut scored = trailing;
        scored.push(reading.clone());
        let window = AnalysisWindow::ending_at(reading.timestamp, VALIDATION_WINDOW_DAYS);
        let quality = QualityScorer::score(&scored, &window, &self.policy);

        let recommendations = issues
            .iter()
            .flat_map(|issue| issue.suggestions.iter())
            .map(|s| s.description.clone())
            .collect();

        Ok(ReadingValidation {
            is_valid: issues.iter().all(|i| i.severity != Severity::Critical),
            quality,
            issues,
            recommendations,
        })
    }

    /// Presentation attributes for a 0-100 score
    pub fn describe_score(&self, score: f64) -> ScoreBadge {
        crate::quality::describe_score(score)
    }
}

/// Reject a reading whose value cannot be scored. NaN and infinite values
/// are contract violations; they are never coerced to zero.
fn reject_malformed(reading: &Reading) -> Result<(), EngineError> {
    if reading.value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::MalformedReading {
            reading_id: reading.id.to_string(),
            reason: format!("value {} is not a finite number", reading.value),
        })
    }
}

fn check_well_formed(readings: &[Reading]) -> Result<(), EngineError> {
    readings.iter().try_for_each(reject_malformed)
}
